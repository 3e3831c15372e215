use crate::foundation::core::DeviationBucket;

pub type BarPathResult<T> = Result<T, BarPathError>;

#[derive(thiserror::Error, Debug)]
pub enum BarPathError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("trajectory rejected: {0}")]
    TrajectoryRejected(String),

    #[error("degenerate fit: {0}")]
    DegenerateFit(String),

    #[error("empty bucket: no samples fell in {0}")]
    EmptyBucket(DeviationBucket),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("cancelled before the output video was complete")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BarPathError {
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn trajectory_rejected(msg: impl Into<String>) -> Self {
        Self::TrajectoryRejected(msg.into())
    }

    pub fn degenerate_fit(msg: impl Into<String>) -> Self {
        Self::DegenerateFit(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}
