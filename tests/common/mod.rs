#![allow(dead_code)]

use std::f64::consts::TAU;

use barpath::{
    Fps, FrameSequence, TrajectoryPoint,
    analysis::arc_from_points,
    foundation::core::Point,
};
use image::RgbaImage;

pub const FRAME_W: u32 = 520;
pub const FRAME_H: u32 = 420;
/// Side of the tracked marker; odd so it mirrors onto itself.
pub const MARKER: i32 = 9;

/// Template units to frame pixels for a 270 px rep whose bottom sits at (300, 400).
fn frame_pt(tx: f64, ty: f64) -> Point {
    Point::new(300.0 + tx * 10.0, 400.0 - ty * 10.0)
}

/// `n + 1` points along the circle through three template points, from the first to the last.
fn arc(p: [(f64, f64); 3], n: usize) -> Vec<(f64, f64)> {
    let [a, b, c] = p.map(|(x, y)| frame_pt(x, y));
    let fit = arc_from_points(a, b, c).unwrap();
    let angle = |q: Point| (q.y - fit.center.y).atan2(q.x - fit.center.x);
    let a0 = angle(a);
    let span = (angle(c) - a0).rem_euclid(TAU);
    let via = (angle(b) - a0).rem_euclid(TAU);
    let sweep = if via <= span { span } else { span - TAU };
    (0..=n)
        .map(|i| {
            let t = a0 + sweep * i as f64 / n as f64;
            (
                fit.center.x + fit.radius * t.cos(),
                fit.center.y + fit.radius * t.sin(),
            )
        })
        .collect()
}

/// Marker centres for one rep traced along the reference path, followed by a short drift to
/// the right that widens the trajectory without joining the ascent.
pub fn rep_centres() -> Vec<(i32, i32)> {
    let mut pts = arc([(13.0, 27.0), (4.0, 16.0), (0.0, 0.0)], 24);
    pts.extend(arc([(0.0, 0.0), (6.0, 9.0), (13.0, 15.0)], 16).into_iter().skip(1));
    pts.extend(arc([(13.0, 15.0), (14.5, 16.0), (15.0, 17.0)], 6).into_iter().skip(1));
    let line_top = frame_pt(15.0, 27.0);
    let line_bottom = frame_pt(15.0, 17.0);
    pts.extend((1..=10).map(|i| {
        let t = f64::from(i) / 10.0;
        (line_bottom.x, line_bottom.y + (line_top.y - line_bottom.y) * t)
    }));
    pts.extend((1..=6).map(|i| (450.0 + 10.0 * f64::from(i) / 3.0, 130.0 + 70.0 * f64::from(i) / 6.0)));

    pts.into_iter()
        .map(|(x, y)| (x.round() as i32, y.round() as i32))
        .collect()
}

pub fn rep_trajectory() -> Vec<TrajectoryPoint> {
    rep_centres()
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| TrajectoryPoint::new(x, y, i as u64))
        .collect()
}

pub fn mirror_all(points: &[TrajectoryPoint], frame_width: u32) -> Vec<TrajectoryPoint> {
    points.iter().map(|p| p.mirrored(frame_width)).collect()
}

/// A black frame with a white square marker centred on `(cx, cy)`.
pub fn marker_frame(cx: i32, cy: i32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(FRAME_W, FRAME_H, image::Rgba([0, 0, 0, 255]));
    let half = MARKER / 2;
    for y in cy - half..=cy + half {
        for x in cx - half..=cx + half {
            if x >= 0 && y >= 0 && (x as u32) < FRAME_W && (y as u32) < FRAME_H {
                img.put_pixel(x as u32, y as u32, image::Rgba([255, 255, 255, 255]));
            }
        }
    }
    img
}

/// Seed frame followed by one frame per marker centre.
pub fn rep_video(mirror: bool) -> FrameSequence {
    let centres: Vec<(i32, i32)> = rep_centres()
        .into_iter()
        .map(|(x, y)| if mirror { (FRAME_W as i32 - 1 - x, y) } else { (x, y) })
        .collect();
    let mut frames = vec![marker_frame(centres[0].0, centres[0].1)];
    frames.extend(centres.iter().map(|&(x, y)| marker_frame(x, y)));
    FrameSequence::new(frames, Fps::new(30, 1).unwrap()).unwrap()
}

/// Box around the first marker with a two pixel margin.
pub fn seed_box(mirror: bool) -> barpath::BoundingBox {
    let (x, y) = rep_centres()[0];
    let x = if mirror { FRAME_W as i32 - 1 - x } else { x };
    let margin = MARKER / 2 + 2;
    barpath::BoundingBox::new(x - margin, y - margin, 2 * margin + 1, 2 * margin + 1)
}
