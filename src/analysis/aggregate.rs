use crate::{
    analysis::{
        geometry::{CanvasLayout, ReferencePath},
        scan::DistanceSample,
    },
    foundation::{
        core::{DeviationBucket, Phase},
        error::{BarPathError, BarPathResult},
        math::{mean, std_dev},
    },
};

/// Inclusive integer row range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowRange {
    pub start: i64,
    pub end: i64,
}

impl RowRange {
    pub fn len(&self) -> i64 {
        (self.end - self.start + 1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, row: i64) -> bool {
        row >= self.start && row <= self.end
    }
}

/// Split `[min, max]` into three consecutive ranges; remainder rows go to the earliest ranges.
pub fn split_into_three(min: i64, max: i64) -> [RowRange; 3] {
    let span = max - min + 1;
    let part = span / 3;
    let mut remainder = span % 3;
    let mut start = min;
    let mut out = [RowRange { start: 0, end: -1 }; 3];
    for slot in &mut out {
        let mut end = start + part - 1;
        if remainder > 0 {
            end += 1;
            remainder -= 1;
        }
        *slot = RowRange { start, end };
        start = end + 1;
    }
    out
}

/// Keep the values within `sigma` population standard deviations of the mean.
pub fn remove_outliers(data: &[f64], sigma: f64) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let m = mean(data);
    let sd = std_dev(data, m);
    data.iter()
        .copied()
        .filter(|v| (v - m).abs() <= sigma * sd)
        .collect()
}

/// Mean after one round of outlier rejection; `None` when there is nothing to average.
pub fn filtered_mean(data: &[f64], sigma: f64) -> Option<f64> {
    let kept = remove_outliers(data, sigma);
    if kept.is_empty() {
        None
    } else {
        Some(mean(&kept))
    }
}

/// The six bucket averages, in [`DeviationBucket::ALL`] order, as percentages of the canvas size.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviationReport(pub [f64; 6]);

impl DeviationReport {
    pub fn get(&self, bucket: DeviationBucket) -> f64 {
        self.0[bucket.index()]
    }

    pub fn as_array(&self) -> [f64; 6] {
        self.0
    }
}

/// Layer-row predicate for each bucket.
#[derive(Clone, Copy, Debug)]
enum Membership {
    HalfOpen(f64, f64),
    Closed(f64, f64),
    Rows(RowRange),
}

impl Membership {
    fn contains(self, row: i32) -> bool {
        let r = f64::from(row);
        match self {
            Membership::HalfOpen(lo, hi) => r >= lo && r < hi,
            Membership::Closed(lo, hi) => r >= lo && r <= hi,
            Membership::Rows(range) => range.contains(i64::from(row)),
        }
    }
}

fn membership(bucket: DeviationBucket, path: &ReferencePath, thirds: &[RowRange; 3]) -> Membership {
    let [a0, a1, _] = &path.arcs;
    match bucket {
        DeviationBucket::AscentStart => Membership::HalfOpen(a0.min_y(), a0.max_y()),
        DeviationBucket::AscentMiddle => Membership::HalfOpen(a1.min_y(), a1.max_y()),
        DeviationBucket::AscentEnd => Membership::Closed(path.line.min_y, path.line.max_y),
        // Layer rows grow upward: the lowest third is where the descent ends.
        DeviationBucket::DescentStart => Membership::Rows(thirds[2]),
        DeviationBucket::DescentMiddle => Membership::Rows(thirds[1]),
        DeviationBucket::DescentEnd => Membership::Rows(thirds[0]),
    }
}

/// Percentages collected for one bucket, before outlier rejection.
pub fn bucket_percentages(
    bucket: DeviationBucket,
    samples: &[DistanceSample],
    path: &ReferencePath,
    layout: &CanvasLayout,
) -> Vec<f64> {
    let d = path.descent_arc();
    let thirds = split_into_three(d.min_y().floor() as i64, d.max_y().floor() as i64);
    let member = membership(bucket, path, &thirds);
    let canvas = f64::from(layout.canvas_size);

    samples
        .iter()
        .filter_map(|s| {
            let distance = s.distance?;
            member
                .contains(layout.flip_row(s.y))
                .then(|| f64::from(distance) / canvas * 100.0)
        })
        .collect()
}

/// Average deviation per bucket. Ascent buckets draw from `ascent` samples, descent buckets
/// from `descent` samples.
#[tracing::instrument(skip_all)]
pub fn aggregate_deviation(
    ascent: &[DistanceSample],
    descent: &[DistanceSample],
    path: &ReferencePath,
    layout: &CanvasLayout,
    sigma: f64,
) -> BarPathResult<DeviationReport> {
    let mut out = [0.0; 6];
    for bucket in DeviationBucket::ALL {
        let samples = match bucket.phase() {
            Phase::Ascent => ascent,
            Phase::Descent => descent,
        };
        let values = bucket_percentages(bucket, samples, path, layout);
        tracing::debug!(%bucket, samples = values.len(), "bucket collected");
        out[bucket.index()] =
            filtered_mean(&values, sigma).ok_or(BarPathError::EmptyBucket(bucket))?;
    }
    Ok(DeviationReport(out))
}
