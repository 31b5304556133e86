//! SVG serialization of a positioned diagram.

use crate::diagram::layout::{Connector, DiagramElement, DiagramLayout, NodeBox};
use crate::diagram::style::DiagramStyle;
use std::fmt::Write;

/// Serializes `layout` into a standalone SVG document.
///
/// Elements are written in layout order, so each subtree's fragment is
/// contiguous: box, label, then connector + child fragment per child.
pub fn render_svg(layout: &DiagramLayout, style: &DiagramStyle) -> String {
    let mut svg = String::new();
    // Writing into a `String` cannot fail.
    let _ = write!(
        svg,
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">",
        layout.canvas.width, layout.canvas.height
    );

    for element in &layout.elements {
        match element {
            DiagramElement::Node(node) => write_node(&mut svg, node, style),
            DiagramElement::Connector(connector) => write_connector(&mut svg, connector, style),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn write_node(svg: &mut String, node: &NodeBox, style: &DiagramStyle) {
    let label = escape_xml(&node.label);
    let mid_y = node.top_y + node.height / 2.0;
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" stroke=\"{}\" />",
        node.left(),
        node.top_y,
        node.width,
        node.height,
        style.node_fill,
        style.node_stroke
    );
    let _ = write!(
        svg,
        "<text x=\"{cx}\" y=\"{mid_y}\" font-size=\"{}\" text-anchor=\"middle\" alignment-baseline=\"middle\"><tspan x=\"{cx}\" dy=\"0\">{label}</tspan></text>",
        style.font_size,
        cx = node.center_x,
    );
}

fn write_connector(svg: &mut String, connector: &Connector, style: &DiagramStyle) {
    let (x1, y1) = connector.from;
    let (qx, qy) = connector.control;
    let (x2, y2) = connector.to;
    let _ = write!(
        svg,
        "<path d=\"M{x1},{y1} Q{qx},{qy} {x2},{y2}\" stroke=\"{}\" stroke-width=\"{}\" fill=\"transparent\" />",
        style.connector_stroke, style.connector_stroke_width
    );
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
