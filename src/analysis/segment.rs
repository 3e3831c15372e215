use crate::foundation::{
    core::TrajectoryPoint,
    error::{BarPathError, BarPathResult},
};

/// The four axis extrema of a trajectory. Ties keep the earliest point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extrema {
    pub min_x: TrajectoryPoint,
    pub max_x: TrajectoryPoint,
    pub min_y: TrajectoryPoint,
    pub max_y: TrajectoryPoint,
}

impl Extrema {
    pub fn of(points: &[TrajectoryPoint]) -> Option<Self> {
        let first = *points.first()?;
        let mut e = Extrema {
            min_x: first,
            max_x: first,
            min_y: first,
            max_y: first,
        };
        for &p in points {
            if p.y > e.max_y.y {
                e.max_y = p;
            }
            if p.x > e.max_x.x {
                e.max_x = p;
            }
            if p.x < e.min_x.x {
                e.min_x = p;
            }
            if p.y < e.min_y.y {
                e.min_y = p;
            }
        }
        Some(e)
    }

    pub fn vertical_extent(&self) -> i32 {
        self.max_y.y - self.min_y.y
    }

    pub fn horizontal_extent(&self) -> i32 {
        self.max_x.x - self.min_x.x
    }

    /// The rep's bottom: the point with the largest y.
    pub fn bottom(&self) -> TrajectoryPoint {
        self.max_y
    }
}

/// A trajectory split into one descent and one ascent cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentedTrajectory {
    pub descent: Vec<TrajectoryPoint>,
    pub ascent: Vec<TrajectoryPoint>,
    pub extrema: Extrema,
}

/// Split a frame-ordered trajectory at its bottom point.
///
/// Points up to and including the bottom frame are descent; the rest are ascent, truncated at
/// the first point reaching the ascent's own highest position so a second rep is ignored.
pub fn segment_trajectory(points: &[TrajectoryPoint]) -> BarPathResult<SegmentedTrajectory> {
    let extrema = Extrema::of(points)
        .ok_or_else(|| BarPathError::validation("cannot segment an empty trajectory"))?;
    let bottom_frame = extrema.bottom().frame_idx;

    let (descent, raw_ascent): (Vec<_>, Vec<_>) =
        points.iter().copied().partition(|p| p.frame_idx <= bottom_frame);

    let ascent = match raw_ascent.iter().min_by_key(|p| p.y) {
        Some(top) => {
            let top_frame = top.frame_idx;
            let end = raw_ascent
                .iter()
                .position(|p| p.frame_idx >= top_frame)
                .map_or(raw_ascent.len(), |i| i + 1);
            raw_ascent[..end].to_vec()
        }
        None => Vec::new(),
    };

    Ok(SegmentedTrajectory {
        descent,
        ascent,
        extrema,
    })
}

/// Whether the trajectory had to be mirrored to match the template's orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Native,
    Mirrored,
}

impl Orientation {
    /// The template descends toward -x; a descent drifting toward +x needs mirroring.
    pub fn detect(descent: &[TrajectoryPoint]) -> Self {
        match (descent.first(), descent.last()) {
            (Some(first), Some(last)) if first.x < last.x => Orientation::Mirrored,
            _ => Orientation::Native,
        }
    }

    pub fn is_mirrored(self) -> bool {
        self == Orientation::Mirrored
    }
}

impl SegmentedTrajectory {
    /// Bring the trajectory into template orientation, mirroring every point around the frame
    /// centre if needed.
    pub fn normalized(self, frame_width: u32) -> (Self, Orientation) {
        let orientation = Orientation::detect(&self.descent);
        if !orientation.is_mirrored() {
            return (self, orientation);
        }

        let mirror = |pts: Vec<TrajectoryPoint>| -> Vec<TrajectoryPoint> {
            pts.into_iter().map(|p| p.mirrored(frame_width)).collect()
        };
        let e = self.extrema;
        let mirrored = SegmentedTrajectory {
            descent: mirror(self.descent),
            ascent: mirror(self.ascent),
            extrema: Extrema {
                min_x: e.max_x.mirrored(frame_width),
                max_x: e.min_x.mirrored(frame_width),
                min_y: e.min_y.mirrored(frame_width),
                max_y: e.max_y.mirrored(frame_width),
            },
        };
        (mirrored, orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<TrajectoryPoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| TrajectoryPoint::new(x, y, i as u64))
            .collect()
    }

    #[test]
    fn extrema_keep_first_of_ties() {
        let p = pts(&[(5, 10), (3, 50), (9, 50), (3, 5)]);
        let e = Extrema::of(&p).unwrap();
        assert_eq!(e.max_y.frame_idx.0, 1);
        assert_eq!(e.min_x.frame_idx.0, 1);
        assert_eq!(e.max_x.x, 9);
        assert_eq!(e.min_y.y, 5);
        assert_eq!(e.vertical_extent(), 45);
        assert_eq!(e.horizontal_extent(), 6);
    }

    #[test]
    fn bottom_frame_belongs_to_descent() {
        let p = pts(&[(50, 0), (45, 20), (40, 40), (44, 20), (48, 2)]);
        let s = segment_trajectory(&p).unwrap();
        assert_eq!(s.descent.len(), 3);
        assert_eq!(s.descent.last().unwrap().y, 40);
        assert_eq!(s.ascent.len(), 2);
        assert_eq!(s.ascent.last().unwrap().y, 2);
    }

    #[test]
    fn ascent_is_truncated_at_first_top() {
        // Second rep starts after reaching y=2 at frame 4.
        let p = pts(&[
            (50, 0),
            (40, 40),
            (44, 20),
            (48, 2),
            (48, 2),
            (46, 15),
            (44, 30),
        ]);
        let s = segment_trajectory(&p).unwrap();
        let frames: Vec<u64> = s.ascent.iter().map(|p| p.frame_idx.0).collect();
        assert_eq!(frames, vec![2, 3]);
    }

    #[test]
    fn bottom_as_last_point_yields_empty_ascent() {
        let p = pts(&[(50, 0), (45, 20), (40, 40)]);
        let s = segment_trajectory(&p).unwrap();
        assert_eq!(s.descent.len(), 3);
        assert!(s.ascent.is_empty());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(segment_trajectory(&[]).is_err());
    }

    #[test]
    fn rightward_descent_is_mirrored() {
        let p = pts(&[(10, 0), (20, 40), (12, 2)]);
        let (s, o) = segment_trajectory(&p).unwrap().normalized(100);
        assert_eq!(o, Orientation::Mirrored);
        assert_eq!(s.descent[0].x, 89);
        assert_eq!(s.descent[1].x, 79);
        assert_eq!(s.extrema.min_x.x, 79);
        assert_eq!(s.extrema.max_x.x, 89);
        assert_eq!(s.extrema.bottom().x, 79);

        let (s2, o2) = segment_trajectory(&pts(&[(30, 0), (20, 40)]))
            .unwrap()
            .normalized(100);
        assert_eq!(o2, Orientation::Native);
        assert_eq!(s2.descent[0].x, 30);
    }
}
