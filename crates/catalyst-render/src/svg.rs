use crate::model::{Bounds, GraphLayout};
use catalyst_core::Category;
use std::fmt::Write as _;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Extra space around the computed viewBox, enough for node circles and
    /// their side labels.
    pub viewbox_padding: f64,
    /// Optional graph id used to namespace marker ids when several SVGs are
    /// inlined in one document.
    pub graph_id: Option<String>,
    /// When true, label each link with its relationship at the midpoint.
    pub include_link_labels: bool,
    /// When true, draw the category legend in the top-left corner.
    pub include_legend: bool,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            viewbox_padding: 40.0,
            graph_id: None,
            include_link_labels: true,
            include_legend: false,
        }
    }
}

/// Fill color per node category (the visualizer's palette).
pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Core => "#3b82f6",
        Category::Risk => "#ef4444",
        Category::Opportunity => "#10b981",
        Category::Action => "#f59e0b",
    }
}

/// Renders a converged layout as a standalone SVG snapshot.
///
/// Output is deterministic: nodes and links are emitted in sorted order, and
/// coordinates go through a stable decimal formatter, so the result is
/// suitable for golden tests.
pub fn render_graph_svg(layout: &GraphLayout, options: &SvgRenderOptions) -> String {
    let mut nodes = layout.nodes.clone();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut links = layout.links.clone();
    links.sort_by(|a, b| {
        (a.source.as_str(), a.target.as_str(), a.relationship.as_str()).cmp(&(
            b.source.as_str(),
            b.target.as_str(),
            b.relationship.as_str(),
        ))
    });

    let bounds = layout.bounds.unwrap_or(Bounds {
        min_x: 0.0,
        min_y: 0.0,
        max_x: 100.0,
        max_y: 100.0,
    });
    let pad = options.viewbox_padding.max(0.0);
    let vb_min_x = bounds.min_x - pad;
    let vb_min_y = bounds.min_y - pad;
    let vb_w = (bounds.max_x - bounds.min_x) + pad * 2.0;
    let vb_h = (bounds.max_y - bounds.min_y) + pad * 2.0;

    let marker_id = match options.graph_id.as_deref() {
        Some(id) if !id.trim().is_empty() => format!("arrow-{}", sanitize_id(id)),
        _ => "arrow".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        fmt(vb_min_x),
        fmt(vb_min_y),
        fmt(vb_w.max(1.0)),
        fmt(vb_h.max(1.0))
    );
    out.push_str(
        r#"<style>
.link { stroke: #4b5563; stroke-opacity: 0.6; stroke-width: 1.5; }
.link-label { fill: #9ca3af; font-family: ui-sans-serif, system-ui, sans-serif; font-size: 10px; text-anchor: middle; }
.node-circle { stroke: #fff; stroke-width: 1.5; }
.node-label { fill: #e5e7eb; font-family: ui-sans-serif, system-ui, sans-serif; font-size: 12px; font-weight: 500; }
.legend-label { fill: #e5e7eb; font-family: ui-sans-serif, system-ui, sans-serif; font-size: 11px; }
</style>
"#,
    );

    // Arrowhead for directed relationships; refX places the tip just outside
    // the 12px node circle.
    let _ = writeln!(
        &mut out,
        r##"<defs><marker id="{marker_id}" viewBox="0 -5 10 10" refX="25" refY="0" markerWidth="6" markerHeight="6" orient="auto"><path fill="#6b7280" d="M0,-5L10,0L0,5"/></marker></defs>"##
    );

    let mut node_pos: std::collections::BTreeMap<&str, (f64, f64)> = std::collections::BTreeMap::new();
    for n in &nodes {
        node_pos.insert(n.id.as_str(), (n.x, n.y));
    }

    out.push_str("<g class=\"links\">\n");
    for l in &links {
        let (Some(&(x1, y1)), Some(&(x2, y2))) = (
            node_pos.get(l.source.as_str()),
            node_pos.get(l.target.as_str()),
        ) else {
            continue;
        };
        let _ = writeln!(
            &mut out,
            r#"<line class="link" x1="{}" y1="{}" x2="{}" y2="{}" marker-end="url(#{marker_id})"/>"#,
            fmt(x1),
            fmt(y1),
            fmt(x2),
            fmt(y2)
        );
        if options.include_link_labels && !l.relationship.is_empty() {
            let _ = writeln!(
                &mut out,
                r#"<text class="link-label" x="{}" y="{}">{}</text>"#,
                fmt((x1 + x2) / 2.0),
                fmt((y1 + y2) / 2.0),
                escape_text(&l.relationship)
            );
        }
    }
    out.push_str("</g>\n");

    out.push_str("<g class=\"nodes\">\n");
    for n in &nodes {
        let _ = writeln!(
            &mut out,
            r#"<g transform="translate({},{})" data-id="{}">"#,
            fmt(n.x),
            fmt(n.y),
            escape_text(&n.id)
        );
        let _ = writeln!(
            &mut out,
            r#"<circle class="node-circle" r="12" fill="{}"/>"#,
            category_color(n.category)
        );
        let _ = writeln!(
            &mut out,
            r#"<text class="node-label" x="15" y="4">{}</text>"#,
            escape_text(&n.label)
        );
        out.push_str("</g>\n");
    }
    out.push_str("</g>\n");

    if options.include_legend {
        let entries = [
            Category::Core,
            Category::Risk,
            Category::Opportunity,
            Category::Action,
        ];
        out.push_str("<g class=\"legend\">\n");
        for (i, category) in entries.iter().enumerate() {
            let x = vb_min_x + 16.0 + (i as f64) * 110.0;
            let y = vb_min_y + 20.0;
            let _ = writeln!(
                &mut out,
                r#"<circle cx="{}" cy="{}" r="6" fill="{}"/><text class="legend-label" x="{}" y="{}">{}</text>"#,
                fmt(x),
                fmt(y),
                category_color(*category),
                fmt(x + 12.0),
                fmt(y + 4.0),
                category
            );
        }
        out.push_str("</g>\n");
    }

    out.push_str("</svg>\n");
    out
}

/// Conservative id token for SVG marker namespacing.
fn sanitize_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_';
        out.push(if ok { ch } else { '-' });
    }
    if out.is_empty() { "g".to_string() } else { out }
}

fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn fmt(v: f64) -> String {
    // Round-trippable decimal form, avoiding `-0` and tiny float noise from
    // our own calculations.
    if !v.is_finite() {
        return "0".to_string();
    }

    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GraphLayout, LayoutLink, LayoutNode};

    fn tiny_layout() -> GraphLayout {
        let nodes = vec![
            LayoutNode {
                id: "a".to_string(),
                label: "Alpha & Co".to_string(),
                category: Category::Core,
                description: String::new(),
                x: 100.0,
                y: 100.0,
            },
            LayoutNode {
                id: "b".to_string(),
                label: "Beta".to_string(),
                category: Category::Risk,
                description: String::new(),
                x: 220.0,
                y: 100.0,
            },
        ];
        let links = vec![LayoutLink {
            source: "a".to_string(),
            target: "b".to_string(),
            relationship: "blocks".to_string(),
        }];
        let bounds = Bounds::from_points(nodes.iter().map(|n| (n.x, n.y)));
        GraphLayout {
            nodes,
            links,
            bounds,
        }
    }

    #[test]
    fn renders_nodes_links_and_marker() {
        let svg = render_graph_svg(&tiny_layout(), &SvgRenderOptions::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"<marker id="arrow""#));
        assert!(svg.contains(r##"fill="#3b82f6""##));
        assert!(svg.contains(r##"fill="#ef4444""##));
        assert!(svg.contains(">blocks</text>"));
        assert!(svg.contains("Alpha &amp; Co"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn graph_id_namespaces_the_marker() {
        let options = SvgRenderOptions {
            graph_id: Some("run 1".to_string()),
            ..Default::default()
        };
        let svg = render_graph_svg(&tiny_layout(), &options);
        assert!(svg.contains(r##"<marker id="arrow-run-1""##));
        assert!(svg.contains(r##"marker-end="url(#arrow-run-1)""##));
    }

    #[test]
    fn output_is_deterministic() {
        let layout = tiny_layout();
        let options = SvgRenderOptions::default();
        assert_eq!(
            render_graph_svg(&layout, &options),
            render_graph_svg(&layout, &options)
        );
    }

    #[test]
    fn legend_lists_all_categories() {
        let options = SvgRenderOptions {
            include_legend: true,
            ..Default::default()
        };
        let svg = render_graph_svg(&tiny_layout(), &options);
        for label in ["core", "risk", "opportunity", "action"] {
            assert!(svg.contains(&format!(">{label}</text>")), "missing {label}");
        }
    }

    #[test]
    fn fmt_rounds_float_noise() {
        assert_eq!(fmt(120.00000001), "120");
        assert_eq!(fmt(-0.0000000001), "0");
        assert_eq!(fmt(1.5), "1.5");
        assert_eq!(fmt(f64::NAN), "0");
    }
}
