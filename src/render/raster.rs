use crate::{
    analysis::geometry::{CanvasLayout, ReferenceArc, ReferenceLine, ReferencePath},
    config::OverlayStyle,
    foundation::{
        core::{Point, Rgba8},
        error::BarPathResult,
    },
    render::{
        composite::Scissor,
        surface::{Surface, point_to_cpu},
    },
};

/// The two reference layers, each `window_size` square and transparent where nothing was drawn.
#[derive(Debug)]
pub struct ReferenceLayers {
    pub ascent: Surface,
    pub descent: Surface,
}

#[tracing::instrument(skip_all, fields(window = layout.window_size))]
pub fn rasterize_reference(
    path: &ReferencePath,
    layout: &CanvasLayout,
    style: &OverlayStyle,
) -> BarPathResult<ReferenceLayers> {
    let size = layout.window_size;
    let mut ascent = Surface::new(size, size)?;
    let mut descent = Surface::new(size, size)?;

    let [a0, a1, d] = &path.arcs;
    draw_ring(&mut ascent, a0, layout.scale, style.ring_half_width, style.ascent_color)?;
    draw_ring(&mut ascent, a1, layout.scale, style.ring_half_width, style.ascent_color)?;
    draw_line(&mut ascent, &path.line, style.line_width, style.ascent_color)?;
    draw_ring(&mut descent, d, layout.scale, style.ring_half_width, style.descent_color)?;

    tracing::debug!("reference layers rasterized");
    Ok(ReferenceLayers { ascent, descent })
}

/// Stroke the full circle of `arc`, kept only inside the arc's point box grown by `scale / 2`
/// toward +x and +y.
pub fn draw_ring(
    surface: &mut Surface,
    arc: &ReferenceArc,
    scale: f64,
    half_width: f64,
    color: Rgba8,
) -> BarPathResult<()> {
    let b = arc.bbox;
    let clip = Scissor::clamped(
        b.x0,
        b.y0,
        b.x1 + scale / 2.0,
        b.y1 + scale / 2.0,
        surface.width(),
        surface.height(),
    );

    surface.paint(Some(clip), |ctx| {
        let circle = vello_cpu::kurbo::Circle::new(point_to_cpu(arc.center), arc.radius);
        let mut p = vello_cpu::kurbo::BezPath::new();
        for el in vello_cpu::kurbo::Shape::path_elements(&circle, 0.1) {
            p.push(el);
        }
        ctx.set_paint(color.to_cpu());
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(2.0 * half_width));
        ctx.stroke_path(&p);
    })
}

/// Butt-capped vertical bar of `width` pixels centred on the line.
pub fn draw_line(
    surface: &mut Surface,
    line: &ReferenceLine,
    width: f64,
    color: Rgba8,
) -> BarPathResult<()> {
    let half = width / 2.0;
    surface.paint(None, |ctx| {
        ctx.set_paint(color.to_cpu());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            line.x - half,
            line.min_y,
            line.x + half,
            line.max_y,
        ));
    })
}

/// Filled dot at a layer-space position. Only the dot's neighbourhood is composited.
pub fn stamp_dot(
    surface: &mut Surface,
    center: Point,
    radius: f64,
    color: Rgba8,
) -> BarPathResult<()> {
    let reach = radius + 1.0;
    let clip = Scissor::clamped(
        center.x - reach,
        center.y - reach,
        center.x + reach + 1.0,
        center.y + reach + 1.0,
        surface.width(),
        surface.height(),
    );
    surface.paint(Some(clip), |ctx| {
        let circle = vello_cpu::kurbo::Circle::new(point_to_cpu(center), radius);
        let mut p = vello_cpu::kurbo::BezPath::new();
        for el in vello_cpu::kurbo::Shape::path_elements(&circle, 0.1) {
            p.push(el);
        }
        ctx.set_paint(color.to_cpu());
        ctx.fill_path(&p);
    })
}
