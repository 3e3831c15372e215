use std::fmt;

pub use kurbo::{Point, Rect};

use crate::foundation::error::{BarPathError, BarPathResult};

/// Ordinal of a decoded frame, counted from the first frame after the tracker seed frame.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32,
}

impl Fps {
    pub fn new(num: u32, den: u32) -> BarPathResult<Self> {
        if den == 0 {
            return Err(BarPathError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(BarPathError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// One frame's tracked barbell centre in source pixel coordinates (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrajectoryPoint {
    pub x: i32,
    pub y: i32,
    pub frame_idx: FrameIndex,
}

impl TrajectoryPoint {
    pub fn new(x: i32, y: i32, frame_idx: u64) -> Self {
        Self {
            x,
            y,
            frame_idx: FrameIndex(frame_idx),
        }
    }

    /// Mirror around the vertical centre line of a frame `frame_width` pixels wide.
    pub fn mirrored(self, frame_width: u32) -> Self {
        Self {
            x: frame_width as i32 - 1 - self.x,
            ..self
        }
    }
}

/// Axis-aligned box in source pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Integer centre, rounding toward the top-left like the tracker contract expects.
    pub fn center(self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Straight-alpha RGBA8 colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_cpu(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

/// Which half of the repetition a point belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    Descent,
    Ascent,
}

/// The six named ranges of the reference path, in reporting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DeviationBucket {
    AscentStart,
    AscentMiddle,
    AscentEnd,
    DescentStart,
    DescentMiddle,
    DescentEnd,
}

impl DeviationBucket {
    pub const ALL: [DeviationBucket; 6] = [
        DeviationBucket::AscentStart,
        DeviationBucket::AscentMiddle,
        DeviationBucket::AscentEnd,
        DeviationBucket::DescentStart,
        DeviationBucket::DescentMiddle,
        DeviationBucket::DescentEnd,
    ];

    pub fn index(self) -> usize {
        match self {
            DeviationBucket::AscentStart => 0,
            DeviationBucket::AscentMiddle => 1,
            DeviationBucket::AscentEnd => 2,
            DeviationBucket::DescentStart => 3,
            DeviationBucket::DescentMiddle => 4,
            DeviationBucket::DescentEnd => 5,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            DeviationBucket::AscentStart
            | DeviationBucket::AscentMiddle
            | DeviationBucket::AscentEnd => Phase::Ascent,
            _ => Phase::Descent,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeviationBucket::AscentStart => "ascent-start",
            DeviationBucket::AscentMiddle => "ascent-middle",
            DeviationBucket::AscentEnd => "ascent-end",
            DeviationBucket::DescentStart => "descent-start",
            DeviationBucket::DescentMiddle => "descent-middle",
            DeviationBucket::DescentEnd => "descent-end",
        }
    }
}

impl fmt::Display for DeviationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A composited frame, top-down row order.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}
