use std::path::Path;

use crate::foundation::{
    core::Rgba8,
    error::{BarPathError, BarPathResult},
};

/// A control point of the reference path in template units (x right, y up from the chest).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TemplatePoint {
    pub x: f64,
    pub y: f64,
}

impl TemplatePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fitting control points for one movement template.
///
/// Each arc is fitted through three points; the line is the vertical through its first point.
/// `height_units` is the template's nominal rep height: the observed vertical extent divided by
/// it gives the template-unit-to-pixel scale.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenchTemplate {
    pub ascent_start: [TemplatePoint; 3],
    pub ascent_middle: [TemplatePoint; 3],
    pub ascent_line: [TemplatePoint; 2],
    pub descent: [TemplatePoint; 3],
    pub height_units: f64,
}

impl Default for BenchTemplate {
    fn default() -> Self {
        Self {
            ascent_start: [
                TemplatePoint::new(0.0, 0.0),
                TemplatePoint::new(6.0, 9.0),
                TemplatePoint::new(13.0, 15.0),
            ],
            ascent_middle: [
                TemplatePoint::new(13.0, 15.0),
                TemplatePoint::new(14.5, 16.0),
                TemplatePoint::new(15.0, 17.0),
            ],
            ascent_line: [TemplatePoint::new(15.0, 17.0), TemplatePoint::new(15.0, 28.0)],
            descent: [
                TemplatePoint::new(0.0, 0.0),
                TemplatePoint::new(4.0, 16.0),
                TemplatePoint::new(13.0, 27.0),
            ],
            height_units: 27.0,
        }
    }
}

/// Colours and stroke sizes used for the reference layers and the observed-path trail.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub ascent_color: Rgba8,
    pub descent_color: Rgba8,
    pub trail_ascent_color: Rgba8,
    pub trail_descent_color: Rgba8,
    /// Half of the ring stroke width used for reference arcs, in pixels.
    pub ring_half_width: f64,
    /// Stroke width of the vertical reference line, in pixels.
    pub line_width: f64,
    /// Trail dot radius as a fraction of the template scale.
    pub trail_radius_factor: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            ascent_color: Rgba8::opaque(0x00, 0x83, 0x47),
            descent_color: Rgba8::opaque(0x83, 0x22, 0x1C),
            trail_ascent_color: Rgba8::opaque(0x00, 0xFF, 0x89),
            trail_descent_color: Rgba8::opaque(0xFF, 0x3B, 0x2F),
            ring_half_width: 3.0,
            line_width: 6.0,
            trail_radius_factor: 1.0 / 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub template: BenchTemplate,
    pub style: OverlayStyle,
    /// Samples further than this many standard deviations from a bucket mean are discarded.
    pub outlier_sigma: f64,
    /// Blank margin around the trajectory on every side of the render canvas, in pixels.
    pub canvas_padding: u32,
    /// Minimum horizontal and vertical trajectory extent, in pixels.
    pub min_extent_px: i32,
    /// Maximum ratio between the larger and the smaller trajectory extent.
    pub max_aspect_ratio: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            template: BenchTemplate::default(),
            style: OverlayStyle::default(),
            outlier_sigma: 20.0,
            canvas_padding: 10,
            min_extent_px: 30,
            max_aspect_ratio: 1.75,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> BarPathResult<()> {
        fn positive(name: &str, v: f64) -> BarPathResult<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(BarPathError::validation(format!(
                    "{name} must be a positive finite number (got {v})"
                )))
            }
        }

        positive("template.height_units", self.template.height_units)?;
        positive("style.ring_half_width", self.style.ring_half_width)?;
        positive("style.line_width", self.style.line_width)?;
        positive("style.trail_radius_factor", self.style.trail_radius_factor)?;
        positive("outlier_sigma", self.outlier_sigma)?;
        if !(self.max_aspect_ratio.is_finite() && self.max_aspect_ratio >= 1.0) {
            return Err(BarPathError::validation(
                "max_aspect_ratio must be finite and >= 1",
            ));
        }
        if self.min_extent_px < 1 {
            return Err(BarPathError::validation("min_extent_px must be >= 1"));
        }

        let t = &self.template;
        let all_points = t
            .ascent_start
            .iter()
            .chain(&t.ascent_middle)
            .chain(&t.ascent_line)
            .chain(&t.descent);
        for p in all_points {
            if !(p.x.is_finite() && p.y.is_finite()) {
                return Err(BarPathError::validation(
                    "template control points must be finite",
                ));
            }
        }
        Ok(())
    }

    pub fn from_json_path(path: &Path) -> BarPathResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|e| BarPathError::validation(format!("config json parse failed: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AnalysisConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{ "outlier_sigma": 3.5 }"#).unwrap();
        assert_eq!(cfg.outlier_sigma, 3.5);
        assert_eq!(cfg.template, BenchTemplate::default());
        assert_eq!(cfg.canvas_padding, 10);
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut cfg = AnalysisConfig {
            outlier_sigma: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg.outlier_sigma = 20.0;
        cfg.max_aspect_ratio = 0.5;
        assert!(cfg.validate().is_err());

        cfg.max_aspect_ratio = 1.75;
        cfg.template.descent[1].x = f64::NAN;
        assert!(cfg.validate().is_err());
    }
}
