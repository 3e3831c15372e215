use std::collections::HashMap;

use image::RgbaImage;

use crate::{
    analysis::geometry::CanvasLayout,
    compositor::state::{CompositorState, RenderedPoint, Reveal},
    config::OverlayStyle,
    foundation::{
        core::{FrameRGBA, Phase, Point, TrajectoryPoint},
        error::BarPathResult,
    },
    render::{
        composite::Scissor,
        raster::{ReferenceLayers, stamp_dot},
        surface::Surface,
    },
};

/// Everything the per-frame compositor owns for one run: the reference layers, the
/// cumulative trail, the output target and the reveal state.
#[derive(Debug)]
pub struct CompositorContext {
    layout: CanvasLayout,
    layers: ReferenceLayers,
    trail: Surface,
    target: Surface,
    state: CompositorState,
    points: HashMap<u64, RenderedPoint>,
    style: OverlayStyle,
    mirror: bool,
}

impl CompositorContext {
    /// `descent` and `ascent` are in the same (possibly mirrored) frame space as `layout`;
    /// `mirror` tells the compositor to mirror the video underlay to match.
    pub fn new(
        layout: CanvasLayout,
        layers: ReferenceLayers,
        descent: &[TrajectoryPoint],
        ascent: &[TrajectoryPoint],
        style: OverlayStyle,
        mirror: bool,
    ) -> BarPathResult<Self> {
        let size = layout.window_size;
        let mut points = HashMap::with_capacity(descent.len() + ascent.len());
        for (pts, phase) in [(descent, Phase::Descent), (ascent, Phase::Ascent)] {
            for &p in pts {
                let (x, y) = layout.to_local(p);
                points
                    .entry(p.frame_idx.0)
                    .or_insert(RenderedPoint { x, y, phase });
            }
        }

        Ok(Self {
            layout,
            layers,
            trail: Surface::new(size, size)?,
            target: Surface::new(size, size)?,
            state: CompositorState::Idle,
            points,
            style,
            mirror,
        })
    }

    pub fn layout(&self) -> &CanvasLayout {
        &self.layout
    }

    pub fn state(&self) -> CompositorState {
        self.state
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirror
    }

    pub fn trail(&self) -> &Surface {
        &self.trail
    }

    pub fn target(&self) -> &Surface {
        &self.target
    }

    /// The drawable point for `frame_idx`; points outside the canvas are ignored.
    pub fn point_for(&self, frame_idx: u64) -> Option<RenderedPoint> {
        let w = self.layout.window_size as i32;
        self.points
            .get(&frame_idx)
            .copied()
            .filter(|p| p.x >= 0 && p.y >= 0 && p.x < w && p.y < w)
    }

    /// Advance the state machine by one frame and composite it.
    ///
    /// Trail dots are only stamped while `recording`. Returns the top-down premultiplied
    /// frame.
    pub fn compose(
        &mut self,
        frame_idx: u64,
        video: &RgbaImage,
        recording: bool,
    ) -> BarPathResult<FrameRGBA> {
        let point = self.point_for(frame_idx);
        self.state = self.state.advance(point.as_ref());

        if recording && let Some(p) = point {
            let color = match p.phase {
                Phase::Descent => self.style.trail_descent_color,
                Phase::Ascent => self.style.trail_ascent_color,
            };
            let center = Point::new(
                f64::from(p.x) + 0.5,
                f64::from(self.layout.flip_row(p.y)) + 0.5,
            );
            let radius = self.layout.scale * self.style.trail_radius_factor;
            stamp_dot(&mut self.trail, center, radius, color)?;
        }

        self.target.clear();
        self.target
            .blit_frame(video, self.layout.origin_x, self.layout.origin_y, self.mirror);

        let w = self.layout.window_size;
        match self.state.reveal() {
            None => {}
            Some(Reveal::Descent { row }) => {
                // Canvas rows [0, row) are layer rows [w - row, w).
                let clip = Scissor::rows(i64::from(w) - i64::from(row), i64::from(w), w, w);
                self.target.draw_surface(&self.layers.descent, Some(clip))?;
            }
            Some(Reveal::Ascent { row }) => {
                self.target.draw_surface(&self.layers.descent, None)?;
                // Canvas rows from row - scale/2 down to the bottom.
                let top = f64::from(w) - f64::from(row) + self.layout.scale / 2.0;
                let clip = Scissor::clamped(0.0, 0.0, f64::from(w), top, w, w);
                self.target.draw_surface(&self.layers.ascent, Some(clip))?;
            }
        }

        self.target.draw_surface(&self.trail, None)?;
        Ok(self.target.read_back_frame())
    }
}
