use crate::foundation::core::Phase;

/// A tracked point in canvas-local coordinates (top-down rows), ready to be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderedPoint {
    pub x: i32,
    pub y: i32,
    pub phase: Phase,
}

/// The last reveal applied to the reference layers; `row` is a canvas-local row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reveal {
    Descent { row: i32 },
    Ascent { row: i32 },
}

/// Per-frame reveal state of the reference layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositorState {
    /// Nothing revealed yet.
    #[default]
    Idle,
    /// Descent layer revealed above `row`.
    Descending { row: i32 },
    /// Descent layer fully shown, ascent layer revealed from `row` downward.
    Ascending { row: i32 },
    /// No point on this frame; `last` is redrawn unchanged.
    Holding { last: Reveal },
}

impl CompositorState {
    /// State for the next frame given that frame's point, if any.
    pub fn advance(self, point: Option<&RenderedPoint>) -> Self {
        match (point, self) {
            (Some(p), _) => match p.phase {
                Phase::Descent => CompositorState::Descending { row: p.y },
                Phase::Ascent => CompositorState::Ascending { row: p.y },
            },
            (None, CompositorState::Idle) => CompositorState::Idle,
            (None, CompositorState::Descending { row }) => CompositorState::Holding {
                last: Reveal::Descent { row },
            },
            (None, CompositorState::Ascending { row }) => CompositorState::Holding {
                last: Reveal::Ascent { row },
            },
            (None, held @ CompositorState::Holding { .. }) => held,
        }
    }

    pub fn reveal(self) -> Option<Reveal> {
        match self {
            CompositorState::Idle => None,
            CompositorState::Descending { row } => Some(Reveal::Descent { row }),
            CompositorState::Ascending { row } => Some(Reveal::Ascent { row }),
            CompositorState::Holding { last } => Some(last),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(y: i32, phase: Phase) -> RenderedPoint {
        RenderedPoint { x: 0, y, phase }
    }

    #[test]
    fn walks_through_a_rep() {
        let mut s = CompositorState::default();
        s = s.advance(None);
        assert_eq!(s, CompositorState::Idle);
        assert_eq!(s.reveal(), None);

        s = s.advance(Some(&p(10, Phase::Descent)));
        assert_eq!(s, CompositorState::Descending { row: 10 });

        s = s.advance(None);
        assert_eq!(
            s,
            CompositorState::Holding {
                last: Reveal::Descent { row: 10 }
            }
        );
        s = s.advance(None);
        assert_eq!(s.reveal(), Some(Reveal::Descent { row: 10 }));

        s = s.advance(Some(&p(40, Phase::Ascent)));
        assert_eq!(s, CompositorState::Ascending { row: 40 });
        s = s.advance(None);
        assert_eq!(s.reveal(), Some(Reveal::Ascent { row: 40 }));
    }
}
