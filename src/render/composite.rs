use crate::foundation::{
    error::{BarPathError, BarPathResult},
    math::mul_div255_u8,
};

pub type PremulRgba8 = [u8; 4];

/// Axis-aligned pixel rectangle, half-open on both axes, in surface row order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scissor {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Scissor {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    /// Build from signed/fractional bounds, clamped to a `width`x`height` surface.
    pub fn clamped(x0: f64, y0: f64, x1: f64, y1: f64, width: u32, height: u32) -> Self {
        let clamp = |v: f64, max: u32| -> u32 {
            if v.is_nan() {
                0
            } else {
                v.floor().clamp(0.0, f64::from(max)) as u32
            }
        };
        let x0 = clamp(x0, width);
        let y0 = clamp(y0, height);
        Self {
            x0,
            y0,
            x1: clamp(x1, width).max(x0),
            y1: clamp(y1, height).max(y0),
        }
    }

    /// Full-width band of rows `[y0, y1)`.
    pub fn rows(y0: i64, y1: i64, width: u32, height: u32) -> Self {
        Self::clamped(0.0, y0 as f64, f64::from(width), y1 as f64, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> BarPathResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BarPathError::evaluation(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// `over_in_place` restricted to the pixels inside `clip`.
pub fn over_in_place_clipped(
    dst: &mut [u8],
    src: &[u8],
    width: u32,
    clip: Scissor,
) -> BarPathResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BarPathError::evaluation(
            "over_in_place_clipped expects equal-length rgba8 buffers",
        ));
    }
    let stride = width as usize * 4;
    if stride == 0 || !dst.len().is_multiple_of(stride) {
        return Err(BarPathError::evaluation(
            "over_in_place_clipped buffer is not a whole number of rows",
        ));
    }
    let height = (dst.len() / stride) as u32;
    if clip.x1 > width || clip.y1 > height {
        return Err(BarPathError::evaluation("scissor exceeds surface bounds"));
    }
    if clip.is_empty() {
        return Ok(());
    }

    let (c0, c1) = (clip.x0 as usize * 4, clip.x1 as usize * 4);
    for row in clip.y0 as usize..clip.y1 as usize {
        let span = row * stride + c0..row * stride + c1;
        over_in_place(&mut dst[span.clone()], &src[span])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn over_src_alpha_0_is_noop() {
        let dst = [10, 20, 30, 40];
        assert_eq!(over(dst, [0, 0, 0, 0]), dst);
    }

    #[test]
    fn over_src_opaque_replaces_dst() {
        let dst = [0, 0, 0, 255];
        let src = [255, 0, 0, 255];
        assert_eq!(over(dst, src), src);
    }

    #[test]
    fn over_dst_transparent_returns_src() {
        let src = [100, 110, 120, 200];
        assert_eq!(over([0, 0, 0, 0], src), src);
    }

    #[test]
    fn half_alpha_over_opaque_blends() {
        // Premultiplied white @ 50% over opaque black.
        assert_eq!(over([0, 0, 0, 255], [128, 128, 128, 128]), [128, 128, 128, 255]);
    }

    #[test]
    fn clipped_over_touches_only_scissor() {
        let (w, h) = (4u32, 3u32);
        let mut dst = vec![0u8; (w * h * 4) as usize];
        let src = vec![255u8; dst.len()];
        let clip = Scissor {
            x0: 1,
            y0: 1,
            x1: 3,
            y1: 2,
        };
        over_in_place_clipped(&mut dst, &src, w, clip).unwrap();

        for y in 0..h {
            for x in 0..w {
                let i = ((y * w + x) * 4) as usize;
                let expect = if clip.contains(x, y) { 255 } else { 0 };
                assert_eq!(dst[i + 3], expect, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn scissor_clamps_to_surface() {
        let s = Scissor::clamped(-5.0, 2.7, 500.0, -1.0, 20, 10);
        assert_eq!((s.x0, s.y0, s.x1, s.y1), (0, 2, 20, 2));
        assert!(s.is_empty());

        let r = Scissor::rows(3, 99, 8, 6);
        assert_eq!((r.x0, r.y0, r.x1, r.y1), (0, 3, 8, 6));
    }
}
