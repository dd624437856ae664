use crate::error::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Category assigned to a concept node by the analysis model.
///
/// The wire value is the lowercase name (`"core"`, `"risk"`, ...), matching the
/// closed enum the response schema constrains the model to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Core,
    Risk,
    Opportunity,
    Action,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Core => "core",
            Category::Risk => "risk",
            Category::Opportunity => "opportunity",
            Category::Action => "action",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concept extracted from the user's input: a stakeholder, risk, action item, etc.
///
/// `id` is the join key for relationships and must be unique within a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub category: Category,
    pub description: String,
}

/// A directed, labeled relationship between two concept nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptLink {
    /// Id of the source node.
    pub source: String,
    /// Id of the target node.
    pub target: String,
    pub relationship: String,
}

/// A feasibility/impact metric scored by the analysis model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityMetric {
    pub name: String,
    /// Score from 0 to 100. The model is schema-constrained but not trusted;
    /// use [`FeasibilityMetric::clamped_score`] when charting.
    pub score: f64,
    pub reasoning: String,
}

impl FeasibilityMetric {
    pub fn clamped_score(&self) -> f64 {
        if self.score.is_finite() {
            self.score.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }
}

/// A projected project phase with an estimated duration and complexity (1-10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPhase {
    pub phase: String,
    pub duration_weeks: f64,
    pub complexity: f64,
}

/// The full structured payload returned by the analysis provider.
///
/// The provider owns transport and schema validation; this type is the trusted
/// in-process shape. Link endpoint resolution is deliberately *not* validated
/// here — the layout engine excludes unresolved links itself so that a single
/// malformed element never breaks the whole visualization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub summary: String,
    #[serde(default)]
    pub nodes: Vec<ConceptNode>,
    #[serde(default)]
    pub links: Vec<ConceptLink>,
    #[serde(default)]
    pub metrics: Vec<FeasibilityMetric>,
    #[serde(default)]
    pub timeline: Vec<ProjectPhase>,
    /// Only populated by the deep-thinking analysis mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risks_analysis: Option<String>,
}

impl AnalysisResponse {
    /// Parses and validates a response payload.
    pub fn from_json(text: &str) -> Result<Self> {
        let response: Self = serde_json::from_str(text)?;
        response.validate()?;
        Ok(response)
    }

    /// Checks the node-id uniqueness invariant.
    pub fn validate(&self) -> Result<()> {
        let mut seen: IndexSet<&str> = IndexSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(Error::EmptyNodeId);
            }
            if !seen.insert(node.id.as_str()) {
                return Err(Error::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }
        Ok(())
    }
}
