//! Per-frame overlay compositing: reveal state machine, owned surfaces and the render loop.

pub mod context;
pub mod run;
pub mod state;

pub use context::CompositorContext;
pub use run::{PreviewSink, RenderOutcome, StopSignal, render_video};
pub use state::{CompositorState, RenderedPoint, Reveal};
