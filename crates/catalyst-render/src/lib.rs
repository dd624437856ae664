#![forbid(unsafe_code)]

//! Headless layout + SVG snapshots for Catalyst analysis responses.
//!
//! This crate joins the semantic model (`catalyst-core`) with the force
//! engine (`catalyst-layout`): it runs a session to convergence and emits a
//! serializable [`model::GraphLayout`], plus a deterministic standalone SVG
//! for previews and golden tests. Interactive rendering (drag, zoom, charts)
//! belongs to the embedding view, which should hold a `LayoutSession` of its
//! own and read per-tick snapshots.

pub mod model;
pub mod svg;

use catalyst_core::AnalysisResponse;
use catalyst_layout::{Graph, LayoutSession, Link, Node, SessionOptions};
use model::{Bounds, GraphLayout, LayoutLink, LayoutNode};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] catalyst_layout::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Canvas size the layout is centered on.
    pub width: f64,
    pub height: f64,
    pub session: SessionOptions,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            session: SessionOptions::default(),
        }
    }
}

/// Lays out a parsed analysis response: builds the entity/relationship graph,
/// runs a session to convergence, and joins positions back with the static
/// label/category/description fields.
///
/// Relationships with unresolved endpoints are excluded from the output,
/// mirroring the engine's own defensive drop.
pub fn layout_graph(response: &AnalysisResponse, options: &LayoutOptions) -> Result<GraphLayout> {
    let graph = Graph {
        nodes: response
            .nodes
            .iter()
            .map(|n| Node::new(n.id.as_str()))
            .collect(),
        links: response
            .links
            .iter()
            .map(|l| Link::new(l.source.as_str(), l.target.as_str()))
            .collect(),
    };

    let mut session =
        LayoutSession::new(&graph, options.width, options.height, options.session.clone())?;
    session.run();
    let positions = session.positions();
    let dropped: Vec<(&str, &str)> = session
        .dropped_links()
        .iter()
        .map(|d| (d.source.as_str(), d.target.as_str()))
        .collect();

    let mut nodes: Vec<LayoutNode> = Vec::with_capacity(response.nodes.len());
    for n in &response.nodes {
        // Every validated entity has a position; the fallback only guards
        // against future drift between the two crates.
        let p = positions
            .get(&n.id)
            .copied()
            .unwrap_or(catalyst_layout::Point {
                x: options.width / 2.0,
                y: options.height / 2.0,
            });
        nodes.push(LayoutNode {
            id: n.id.clone(),
            label: n.label.clone(),
            category: n.category,
            description: n.description.clone(),
            x: p.x,
            y: p.y,
        });
    }

    let links: Vec<LayoutLink> = response
        .links
        .iter()
        .filter(|l| !dropped.contains(&(l.source.as_str(), l.target.as_str())))
        .map(|l| LayoutLink {
            source: l.source.clone(),
            target: l.target.clone(),
            relationship: l.relationship.clone(),
        })
        .collect();

    let bounds = Bounds::from_points(nodes.iter().map(|n| (n.x, n.y)));

    Ok(GraphLayout {
        nodes,
        links,
        bounds,
    })
}
