use image::RgbaImage;

use crate::{analysis::geometry::CanvasLayout, foundation::core::TrajectoryPoint};

/// Signed horizontal offset from a canvas-local point to the nearest drawn reference pixel on
/// its row. `None` when the point is off the layer or its row is blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DistanceSample {
    pub x: i32,
    pub y: i32,
    pub distance: Option<i32>,
}

fn is_blank(p: &image::Rgba<u8>) -> bool {
    p.0 == [0, 0, 0, 0]
}

/// Walk outward from `(x, y)`, left before right at each step. Left hits are negative.
pub fn scan_row(image: &RgbaImage, x: i32, y: i32) -> Option<i32> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let (x, y) = (i64::from(x), i64::from(y));
    if y < 0 || y >= h {
        return None;
    }
    let blank_at = |px: i64| is_blank(image.get_pixel(px as u32, y as u32));

    let mut d = 0i64;
    while x - d >= 0 || x + d < w {
        if x - d >= 0 && x - d < w && !blank_at(x - d) {
            return Some(-d as i32);
        }
        if x + d >= 0 && x + d < w && !blank_at(x + d) {
            return Some(d as i32);
        }
        d += 1;
    }
    None
}

/// Measure every point against a read-back (top-down) reference layer.
pub fn measure_distances(
    layer: &RgbaImage,
    points: &[TrajectoryPoint],
    layout: &CanvasLayout,
) -> Vec<DistanceSample> {
    let (w, h) = (layer.width() as i32, layer.height() as i32);
    points
        .iter()
        .map(|&p| {
            let (x, y) = layout.to_local(p);
            let distance = if x < 0 || y < 0 || x >= w || y >= h {
                None
            } else {
                scan_row(layer, x, y)
            };
            DistanceSample { x, y, distance }
        })
        .collect()
}
