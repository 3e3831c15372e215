use crate::{
    analysis::segment::Extrema,
    config::{AnalysisConfig, BenchTemplate, TemplatePoint},
    foundation::{
        core::{Point, Rect, TrajectoryPoint},
        error::{BarPathError, BarPathResult},
    },
};

const COLLINEAR_EPS: f64 = 1e-9;

/// Circle through three fitting points. `bbox` bounds the three points, not the circle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceArc {
    pub center: Point,
    pub radius: f64,
    pub bbox: Rect,
}

impl ReferenceArc {
    pub fn min_y(&self) -> f64 {
        self.bbox.y0
    }

    pub fn max_y(&self) -> f64 {
        self.bbox.y1
    }
}

/// Vertical segment at `x` spanning `[min_y, max_y]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceLine {
    pub x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Circumscribed circle of three points.
///
/// Returns [`BarPathError::DegenerateFit`] when the points are collinear.
pub fn arc_from_points(p1: Point, p2: Point, p3: Point) -> BarPathResult<ReferenceArc> {
    let (x1, y1) = (p1.x, p1.y);
    let (x2, y2) = (p2.x, p2.y);
    let (x3, y3) = (p3.x, p3.y);

    let d = 2.0 * (x1 * (y2 - y3) + x2 * (y3 - y1) + x3 * (y1 - y2));
    if !d.is_finite() || d.abs() < COLLINEAR_EPS {
        return Err(BarPathError::degenerate_fit(format!(
            "points ({x1}, {y1}), ({x2}, {y2}), ({x3}, {y3}) are collinear"
        )));
    }

    let s1 = x1 * x1 + y1 * y1;
    let s2 = x2 * x2 + y2 * y2;
    let s3 = x3 * x3 + y3 * y3;
    let h = (s1 * (y2 - y3) + s2 * (y3 - y1) + s3 * (y1 - y2)) / d;
    let k = (s1 * (x3 - x2) + s2 * (x1 - x3) + s3 * (x2 - x1)) / d;
    let center = Point::new(h, k);

    Ok(ReferenceArc {
        center,
        radius: center.distance(p1),
        bbox: Rect::from_points(p1, p2).union_pt(p3),
    })
}

pub fn line_from_points(p1: Point, p2: Point) -> ReferenceLine {
    ReferenceLine {
        x: p1.x,
        min_y: p1.y.min(p2.y),
        max_y: p1.y.max(p2.y),
    }
}

/// Where the observed trajectory sits on the render canvas.
///
/// Canvas-local coordinates are top-down like the source video. Layer space, where the
/// reference geometry lives, is y-up: canvas row `r` is layer row `window_size - 1 - r`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasLayout {
    /// Source pixel that maps to canvas-local (0, 0).
    pub origin_x: i32,
    pub origin_y: i32,
    /// `max_y - min_y` of the observed trajectory.
    pub raw_extent: i32,
    /// `raw_extent` rounded up to an even number.
    pub canvas_size: u32,
    /// Side of the square render surfaces.
    pub window_size: u32,
    pub padding: u32,
    /// Pixels per template unit.
    pub scale: f64,
}

impl CanvasLayout {
    pub fn new(extrema: &Extrema, cfg: &AnalysisConfig) -> BarPathResult<Self> {
        let raw_extent = extrema.vertical_extent();
        if raw_extent <= 0 {
            return Err(BarPathError::trajectory_rejected(
                "trajectory has no vertical extent",
            ));
        }
        let raw = raw_extent as u32;
        let canvas_size = raw + raw % 2;
        let padding = cfg.canvas_padding;
        Ok(Self {
            origin_x: extrema.bottom().x - padding as i32,
            origin_y: extrema.min_y.y - padding as i32,
            raw_extent,
            canvas_size,
            window_size: canvas_size + 2 * padding,
            padding,
            scale: f64::from(raw_extent) / cfg.template.height_units,
        })
    }

    pub fn to_local(&self, p: TrajectoryPoint) -> (i32, i32) {
        (p.x - self.origin_x, p.y - self.origin_y)
    }

    /// Flip a canvas-local row into layer space (and back; the flip is an involution).
    pub fn flip_row(&self, row: i32) -> i32 {
        self.window_size as i32 - 1 - row
    }

    /// Layer-space position of the template origin (the rep's bottom).
    pub fn template_origin(&self) -> Point {
        let bottom_local_row = self.raw_extent + self.padding as i32;
        Point::new(
            f64::from(self.padding),
            f64::from(self.flip_row(bottom_local_row)),
        )
    }

    pub fn place(&self, t: TemplatePoint) -> Point {
        let o = self.template_origin();
        Point::new(o.x + t.x * self.scale, o.y + t.y * self.scale)
    }
}

/// Three arcs and one line in layer space: arcs 0 and 1 plus the line form the ascent, arc 2
/// the descent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferencePath {
    pub arcs: [ReferenceArc; 3],
    pub line: ReferenceLine,
}

impl ReferencePath {
    #[tracing::instrument(skip(template))]
    pub fn fit(template: &BenchTemplate, layout: &CanvasLayout) -> BarPathResult<Self> {
        let arc = |pts: &[TemplatePoint; 3]| {
            arc_from_points(layout.place(pts[0]), layout.place(pts[1]), layout.place(pts[2]))
        };
        let path = Self {
            arcs: [
                arc(&template.ascent_start)?,
                arc(&template.ascent_middle)?,
                arc(&template.descent)?,
            ],
            line: line_from_points(
                layout.place(template.ascent_line[0]),
                layout.place(template.ascent_line[1]),
            ),
        };
        tracing::debug!(?path, "fitted reference path");
        Ok(path)
    }

    pub fn descent_arc(&self) -> &ReferenceArc {
        &self.arcs[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::segment::Extrema;

    fn assert_equidistant(arc: &ReferenceArc, pts: [Point; 3]) {
        for p in pts {
            assert!(
                (arc.center.distance(p) - arc.radius).abs() < 1e-9,
                "{p:?} not on circle {arc:?}"
            );
        }
    }

    #[test]
    fn circumcenter_is_equidistant() {
        let cases = [
            [Point::new(0.0, 0.0), Point::new(6.0, 9.0), Point::new(13.0, 15.0)],
            [Point::new(13.0, 15.0), Point::new(14.5, 16.0), Point::new(15.0, 17.0)],
            [Point::new(-4.0, 2.5), Point::new(100.0, -3.0), Point::new(7.0, 88.0)],
        ];
        for pts in cases {
            let arc = arc_from_points(pts[0], pts[1], pts[2]).unwrap();
            assert_equidistant(&arc, pts);
        }
    }

    #[test]
    fn unit_circle_has_known_center() {
        let arc = arc_from_points(
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
        )
        .unwrap();
        assert!(arc.center.distance(Point::ORIGIN) < 1e-12);
        assert!((arc.radius - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bbox_bounds_the_points_not_the_circle() {
        let arc = arc_from_points(
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
        )
        .unwrap();
        assert_eq!(arc.bbox, Rect::new(-1.0, 0.0, 1.0, 1.0));
        assert_eq!(arc.min_y(), 0.0);
        assert_eq!(arc.max_y(), 1.0);
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let err = arc_from_points(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        )
        .unwrap_err();
        assert!(matches!(err, BarPathError::DegenerateFit(_)));
    }

    #[test]
    fn line_orders_its_span() {
        let l = line_from_points(Point::new(15.0, 28.0), Point::new(99.0, 17.0));
        assert_eq!(l.x, 15.0);
        assert_eq!((l.min_y, l.max_y), (17.0, 28.0));
    }

    #[test]
    fn layout_rounds_canvas_to_even_and_places_origin() {
        let pts = [
            TrajectoryPoint::new(300, 100, 0),
            TrajectoryPoint::new(250, 235, 1),
            TrajectoryPoint::new(320, 110, 2),
        ];
        let e = Extrema::of(&pts).unwrap();
        let layout = CanvasLayout::new(&e, &AnalysisConfig::default()).unwrap();
        assert_eq!(layout.raw_extent, 135);
        assert_eq!(layout.canvas_size, 136);
        assert_eq!(layout.window_size, 156);
        assert_eq!((layout.origin_x, layout.origin_y), (240, 90));
        assert!((layout.scale - 5.0).abs() < 1e-12);

        // The bottom point lands on the template origin.
        let (bx, by) = layout.to_local(pts[1]);
        let origin = layout.template_origin();
        assert_eq!(f64::from(bx), origin.x);
        assert_eq!(f64::from(layout.flip_row(by)), origin.y);
        assert_eq!(layout.flip_row(layout.flip_row(17)), 17);
    }

    #[test]
    fn default_template_fits_ordered_spans() {
        let pts = [
            TrajectoryPoint::new(300, 100, 0),
            TrajectoryPoint::new(250, 370, 1),
        ];
        let e = Extrema::of(&pts).unwrap();
        let cfg = AnalysisConfig::default();
        let layout = CanvasLayout::new(&e, &cfg).unwrap();
        let path = ReferencePath::fit(&cfg.template, &layout).unwrap();

        let [a0, a1, d] = path.arcs;
        assert!(a0.max_y() <= a1.min_y() + 1e-9);
        assert!(a1.max_y() <= path.line.min_y + 1e-9);
        assert!(path.line.max_y > path.line.min_y);
        assert!((d.max_y() - d.min_y() - 270.0).abs() < 1e-9);
    }
}
