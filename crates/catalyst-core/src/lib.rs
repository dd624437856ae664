#![forbid(unsafe_code)]

//! Semantic model for Catalyst analysis responses (headless).
//!
//! An "analysis response" is the structured JSON payload produced by the hosted
//! multimodal model: an executive summary, a knowledge graph (concept nodes and
//! directed relationships), feasibility metrics, and timeline phases. This
//! crate owns the Rust shape of that payload plus the invariants the rest of
//! the pipeline relies on (unique, non-empty node ids).
//!
//! Transport, authentication, and retry policy live with the analysis
//! provider and are out of scope here.

pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{
    AnalysisResponse, Category, ConceptLink, ConceptNode, FeasibilityMetric, ProjectPhase,
};
