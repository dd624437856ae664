#![forbid(unsafe_code)]

//! `catalyst` is a headless pipeline for turning model-produced analysis
//! responses into laid-out, renderable knowledge graphs.
//!
//! The crate root re-exports the semantic model (`catalyst-core`). Layout and
//! SVG output live behind the `render` feature so embedders that only need
//! the data types stay lean.
//!
//! # Features
//!
//! - `render`: enable force layout + SVG snapshots (`catalyst::render`)

pub use catalyst_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use catalyst_render::model::{Bounds, GraphLayout, LayoutLink, LayoutNode};
    pub use catalyst_render::svg::{SvgRenderOptions, category_color, render_graph_svg};
    pub use catalyst_render::{LayoutOptions, layout_graph};

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Parse(#[from] catalyst_core::Error),
        #[error(transparent)]
        Render(#[from] catalyst_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Parses an analysis response payload and lays out its knowledge graph.
    pub fn layout_response(text: &str, options: &LayoutOptions) -> Result<GraphLayout> {
        let response = catalyst_core::AnalysisResponse::from_json(text)?;
        Ok(layout_graph(&response, options)?)
    }

    /// One-call helper: payload JSON in, standalone SVG out.
    pub fn layout_response_svg(
        text: &str,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<String> {
        let layout = layout_response(text, layout_options)?;
        Ok(render_graph_svg(&layout, svg_options))
    }
}
