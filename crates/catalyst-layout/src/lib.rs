#![forbid(unsafe_code)]

//! Headless force-directed layout for knowledge graphs.
//!
//! `catalyst-layout` is runtime-agnostic and does no I/O: a [`LayoutSession`]
//! is pure in-memory numeric simulation, driven by a caller-controlled clock
//! (typically once per display refresh). Per tick it superposes link springs,
//! many-body repulsion, mean centering, and collision resolution, cooled by a
//! decaying alpha in the d3-force style. Drag gestures are expressed as
//! `pin`/`unpin` calls interleaved between ticks.
//!
//! All randomness is seeded and explicit, so identical inputs and call
//! sequences reproduce bit-identical position sequences.

pub mod error;
pub mod graph;
pub mod session;

pub use error::{Error, Result};
pub use graph::{Graph, LayoutResult, Link, Node, Point};
pub use session::{DroppedLink, LayoutSession, SessionOptions};

/// One-shot headless entry point: runs a fresh session to convergence and
/// returns the final positions. Interactive callers should hold a
/// [`LayoutSession`] instead and tick it themselves.
pub fn layout(graph: &Graph, width: f64, height: f64, opts: &SessionOptions) -> Result<LayoutResult> {
    let mut session = LayoutSession::new(graph, width, height, opts.clone())?;
    session.run();
    Ok(LayoutResult {
        positions: session.positions(),
        ticks: session.ticks(),
    })
}
