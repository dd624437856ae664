use catalyst_core::Category;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }
}

/// A concept node joined with its converged position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    pub label: String,
    pub category: Category,
    pub description: String,
    pub x: f64,
    pub y: f64,
}

/// A drawable relationship (both endpoints resolved).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutLink {
    pub source: String,
    pub target: String,
    pub relationship: String,
}

/// Converged knowledge-graph layout, ready for a view layer or SVG export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLayout {
    pub nodes: Vec<LayoutNode>,
    pub links: Vec<LayoutLink>,
    pub bounds: Option<Bounds>,
}
