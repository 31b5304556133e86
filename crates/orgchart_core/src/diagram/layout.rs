//! Recursive top-down placement of department boxes and connectors.
//!
//! # Invariants
//! - Elements are emitted depth-first, left-to-right: a node, then for each
//!   child its connector followed by the child's own elements.
//! - Sibling spacing uses the parent's box width for every child; each child
//!   box is still sized from its own label.

use crate::diagram::style::DiagramStyle;
use crate::hierarchy::shape::TreeShape;
use crate::model::department::{DepartmentId, DepartmentTree};

/// Canvas dimensions in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    /// Sizes the canvas from tree shape statistics.
    pub fn for_shape(shape: &TreeShape, style: &DiagramStyle) -> Self {
        Self {
            width: shape.max_fanout() as f64 * style.column_width,
            height: shape.number_of_levels() as f64 * style.row_height,
        }
    }
}

/// A labeled department box.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub id: DepartmentId,
    pub label: String,
    pub center_x: f64,
    pub top_y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeBox {
    pub fn left(&self) -> f64 {
        self.center_x - self.width / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.top_y + self.height
    }
}

/// Quadratic curve from a parent's bottom-center to a child's top-center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    pub from: (f64, f64),
    pub control: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagramElement {
    Node(NodeBox),
    Connector(Connector),
}

/// Positioned diagram ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramLayout {
    pub canvas: CanvasSize,
    pub elements: Vec<DiagramElement>,
}

impl DiagramLayout {
    pub fn nodes(&self) -> impl Iterator<Item = &NodeBox> {
        self.elements.iter().filter_map(|element| match element {
            DiagramElement::Node(node) => Some(node),
            DiagramElement::Connector(_) => None,
        })
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.elements.iter().filter_map(|element| match element {
            DiagramElement::Connector(connector) => Some(connector),
            DiagramElement::Node(_) => None,
        })
    }
}

/// Lays out `tree` on a canvas sized from `shape`, root centered at the top.
pub fn layout_tree(tree: &DepartmentTree, shape: &TreeShape, style: &DiagramStyle) -> DiagramLayout {
    let canvas = CanvasSize::for_shape(shape, style);
    let mut elements = Vec::new();
    place_node(
        tree,
        canvas.width / 2.0,
        style.root_top,
        style,
        &mut elements,
    );
    DiagramLayout { canvas, elements }
}

fn place_node(
    node: &DepartmentTree,
    center_x: f64,
    top_y: f64,
    style: &DiagramStyle,
    out: &mut Vec<DiagramElement>,
) {
    let width = style.node_width(&node.name);
    let bottom = top_y + style.node_height;
    out.push(DiagramElement::Node(NodeBox {
        id: node.id.clone(),
        label: node.name.clone(),
        center_x,
        top_y,
        width,
        height: style.node_height,
    }));

    if node.is_leaf() {
        return;
    }

    let step = width + style.horizontal_gap;
    let span = node.children.len() as f64 * step - style.horizontal_gap;
    let child_top = bottom + style.connector_height;
    let control_y = bottom + style.vertical_gap / 2.0;

    let mut child_x = center_x - span / 2.0 + width / 2.0;
    for child in &node.children {
        out.push(DiagramElement::Connector(Connector {
            from: (center_x, bottom),
            control: ((center_x + child_x) / 2.0, control_y),
            to: (child_x, child_top),
        }));
        place_node(child, child_x, child_top, style, out);
        child_x += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::department::DepartmentNode;

    fn tree(name: &str, children: Vec<DepartmentTree>) -> DepartmentTree {
        let node = DepartmentNode::new(DepartmentId::parse(name).unwrap(), name, None).unwrap();
        DepartmentTree::from_node(&node, children)
    }

    fn sample() -> DepartmentTree {
        tree(
            "a",
            vec![tree("b", vec![tree("d", vec![])]), tree("c", vec![])],
        )
    }

    #[test]
    fn canvas_follows_shape() {
        let tree = sample();
        let shape = TreeShape::of(&tree);
        let layout = layout_tree(&tree, &shape, &DiagramStyle::default());
        assert_eq!(layout.canvas.width, 2.0 * 350.0);
        assert_eq!(layout.canvas.height, 3.0 * 130.0);
    }

    #[test]
    fn children_are_centered_under_parent() {
        let tree = sample();
        let layout = layout_tree(&tree, &TreeShape::of(&tree), &DiagramStyle::default());
        let nodes: Vec<&NodeBox> = layout.nodes().collect();
        let labels: Vec<&str> = nodes.iter().map(|node| node.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "D", "C"]);

        // Root at canvas center; two children 230 apart around it.
        assert_eq!(nodes[0].center_x, 350.0);
        assert_eq!(nodes[0].top_y, 50.0);
        assert_eq!(nodes[0].left(), 260.0);
        assert_eq!(nodes[1].center_x, 235.0);
        assert_eq!(nodes[3].center_x, 465.0);
        assert_eq!(nodes[1].top_y, 170.0);
        // Single child sits straight below its parent.
        assert_eq!(nodes[2].center_x, 235.0);
        assert_eq!(nodes[2].top_y, 290.0);
    }

    #[test]
    fn connectors_curve_from_parent_bottom_to_child_top() {
        let tree = sample();
        let layout = layout_tree(&tree, &TreeShape::of(&tree), &DiagramStyle::default());
        let connectors: Vec<&Connector> = layout.connectors().collect();
        assert_eq!(connectors.len(), 3);
        assert_eq!(connectors[0].from, (350.0, 130.0));
        assert_eq!(connectors[0].control, (292.5, 155.0));
        assert_eq!(connectors[0].to, (235.0, 170.0));
        assert!(matches!(layout.elements[1], DiagramElement::Connector(_)));
    }

    #[test]
    fn sibling_spacing_reuses_parent_width() {
        let wide = "W".repeat(50);
        let tree = tree(&wide, vec![tree("x", vec![]), tree("y", vec![])]);
        let layout = layout_tree(&tree, &TreeShape::of(&tree), &DiagramStyle::default());
        let nodes: Vec<&NodeBox> = layout.nodes().collect();
        assert_eq!(nodes[0].width, 300.0);
        assert_eq!(nodes[2].center_x - nodes[1].center_x, 350.0);
        assert_eq!(nodes[1].width, 180.0);
    }
}
