use image::RgbaImage;

use crate::{
    foundation::{
        core::{FrameRGBA, Point},
        error::{BarPathError, BarPathResult},
    },
    render::composite::{PremulRgba8, Scissor, over_in_place_clipped},
};

/// A square-or-not RGBA8 premultiplied render target.
///
/// Rows are stored in layer order: row 0 is the bottom of the picture. [`Surface::read_back`]
/// returns the usual top-down image.
pub struct Surface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    pub fn new(width: u32, height: u32) -> BarPathResult<Self> {
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| BarPathError::evaluation("surface width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| BarPathError::evaluation("surface height exceeds u16"))?;
        if width_u16 == 0 || height_u16 == 0 {
            return Err(BarPathError::evaluation("surface must be non-empty"));
        }
        Ok(Self {
            width: width_u16,
            height: height_u16,
            pixmap: vello_cpu::Pixmap::new(width_u16, height_u16),
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    pub fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Pixel at layer position `(x, row)`; `None` outside the surface.
    pub fn pixel(&self, x: u32, row: u32) -> Option<PremulRgba8> {
        if x >= self.width() || row >= self.height() {
            return None;
        }
        let i = (row as usize * self.width() as usize + x as usize) * 4;
        let d = self.data();
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }

    /// Rasterize whatever `draw` emits and composite it over the current contents, limited to
    /// `clip` when given.
    pub fn paint(
        &mut self,
        clip: Option<Scissor>,
        draw: impl FnOnce(&mut vello_cpu::RenderContext),
    ) -> BarPathResult<()> {
        let clip = clip.unwrap_or_else(|| Scissor::full(self.width(), self.height()));
        if clip.is_empty() {
            return Ok(());
        }

        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        draw(&mut ctx);
        ctx.flush();
        let mut scratch = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut scratch);

        over_in_place_clipped(
            self.pixmap.data_as_u8_slice_mut(),
            scratch.data_as_u8_slice(),
            u32::from(self.width),
            clip,
        )
    }

    /// Composite `src` over this surface, limited to `clip` when given.
    pub fn draw_surface(&mut self, src: &Surface, clip: Option<Scissor>) -> BarPathResult<()> {
        if src.width != self.width || src.height != self.height {
            return Err(BarPathError::evaluation(format!(
                "surface size mismatch: {}x{} over {}x{}",
                src.width, src.height, self.width, self.height
            )));
        }
        let clip = clip.unwrap_or_else(|| Scissor::full(self.width(), self.height()));
        over_in_place_clipped(
            self.pixmap.data_as_u8_slice_mut(),
            src.data(),
            u32::from(self.width),
            clip,
        )
    }

    /// Copy the `width`x`height` region of `frame` starting at `(origin_x, origin_y)` into this
    /// surface, flipping it into layer row order.
    ///
    /// With `mirror`, the frame is read as if flipped horizontally first. Source pixels outside
    /// the frame leave the destination untouched. Frame pixels are straight alpha.
    pub fn blit_frame(
        &mut self,
        frame: &RgbaImage,
        origin_x: i32,
        origin_y: i32,
        mirror: bool,
    ) {
        let (fw, fh) = (frame.width() as i64, frame.height() as i64);
        let (w, h) = (self.width() as i64, self.height() as i64);
        let stride = w as usize * 4;
        let dst = self.pixmap.data_as_u8_slice_mut();

        for local_row in 0..h {
            let sy = i64::from(origin_y) + local_row;
            if sy < 0 || sy >= fh {
                continue;
            }
            let layer_row = (h - 1 - local_row) as usize;
            for x in 0..w {
                let mx = i64::from(origin_x) + x;
                if mx < 0 || mx >= fw {
                    continue;
                }
                let sx = if mirror { fw - 1 - mx } else { mx };
                let px = frame.get_pixel(sx as u32, sy as u32).0;
                let i = layer_row * stride + x as usize * 4;
                dst[i..i + 4].copy_from_slice(&premul_rgba8(px));
            }
        }
    }

    /// Top-down straight-alpha copy of the surface.
    pub fn read_back(&self) -> RgbaImage {
        let (w, h) = (self.width(), self.height());
        let stride = w as usize * 4;
        let src = self.data();
        let mut out = Vec::with_capacity(src.len());
        for row in src.chunks_exact(stride).rev() {
            for px in row.chunks_exact(4) {
                out.extend_from_slice(&unpremul_rgba8([px[0], px[1], px[2], px[3]]));
            }
        }
        // Length is exactly w * h * 4.
        RgbaImage::from_raw(w, h, out).unwrap_or_else(|| RgbaImage::new(w, h))
    }

    /// Top-down premultiplied frame, the form the encoder consumes.
    pub fn read_back_frame(&self) -> FrameRGBA {
        let stride = self.width() as usize * 4;
        let data = self
            .data()
            .chunks_exact(stride)
            .rev()
            .flatten()
            .copied()
            .collect();
        FrameRGBA {
            width: self.width(),
            height: self.height(),
            data,
            premultiplied: true,
        }
    }
}

pub(crate) fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn premul_rgba8([r, g, b, a]: [u8; 4]) -> PremulRgba8 {
    let af = u16::from(a) + 1;
    let premul = |c: u8| -> u8 { ((u16::from(c) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn unpremul_rgba8([r, g, b, a]: PremulRgba8) -> [u8; 4] {
    match a {
        0 => [0, 0, 0, 0],
        255 => [r, g, b, a],
        _ => {
            let a32 = u32::from(a);
            let un = |c: u8| -> u8 { ((u32::from(c) * 255 + a32 / 2) / a32).min(255) as u8 };
            [un(r), un(g), un(b), a]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_surface_is_rejected() {
        assert!(Surface::new(70_000, 4).is_err());
        assert!(Surface::new(0, 4).is_err());
    }

    #[test]
    fn read_back_flips_rows() {
        let mut s = Surface::new(2, 3).unwrap();
        // Layer row 0 (the bottom) gets a red pixel.
        s.data_mut()[0..4].copy_from_slice(&[255, 0, 0, 255]);
        let img = s.read_back();
        assert_eq!(img.get_pixel(0, 2).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);

        let frame = s.read_back_frame();
        assert_eq!(&frame.data[(2 * 2) * 4..(2 * 2) * 4 + 4], &[255, 0, 0, 255]);
    }

    #[test]
    fn blit_frame_crops_flips_and_mirrors() {
        let mut frame = RgbaImage::new(4, 4);
        frame.put_pixel(1, 1, image::Rgba([10, 20, 30, 255]));

        let mut s = Surface::new(3, 3).unwrap();
        s.blit_frame(&frame, 1, 1, false);
        // Local (0, 0) is the top row, stored as layer row 2.
        assert_eq!(s.pixel(0, 2), Some([10, 20, 30, 255]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0, 0]));

        let mut m = Surface::new(3, 3).unwrap();
        m.blit_frame(&frame, 1, 1, true);
        // Mirrored column of x=1 in a 4-wide frame is x=2, i.e. local x=1.
        assert_eq!(m.pixel(1, 2), Some([10, 20, 30, 255]));
    }

    #[test]
    fn blit_outside_frame_leaves_transparent() {
        let frame = RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]));
        let mut s = Surface::new(4, 4).unwrap();
        s.blit_frame(&frame, -2, -2, false);
        assert_eq!(s.pixel(0, 3), Some([0, 0, 0, 0]));
        assert_eq!(s.pixel(2, 1), Some([255, 255, 255, 255]));
        assert_eq!(s.pixel(3, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn paint_respects_scissor() {
        let mut s = Surface::new(8, 8).unwrap();
        let clip = Scissor {
            x0: 0,
            y0: 0,
            x1: 8,
            y1: 4,
        };
        s.paint(Some(clip), |ctx| {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 0, 0, 255));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 8.0, 8.0));
        })
        .unwrap();
        assert_eq!(s.pixel(3, 2).map(|p| p[3]), Some(255));
        assert_eq!(s.pixel(3, 5).map(|p| p[3]), Some(0));
    }

    #[test]
    fn premul_round_trip_is_close() {
        let p = premul_rgba8([200, 100, 50, 128]);
        let u = unpremul_rgba8(p);
        for i in 0..3 {
            assert!((i32::from(u[i]) - i32::from([200, 100, 50][i])).abs() <= 2);
        }
    }
}
