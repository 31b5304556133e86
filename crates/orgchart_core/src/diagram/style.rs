//! Fixed visual constants of the org chart style.

/// Geometry and colors used by layout and SVG output.
///
/// Canvas size comes from tree shape, not from font metrics:
/// `width = max_fanout * column_width`, `height = levels * row_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramStyle {
    pub column_width: f64,
    pub row_height: f64,
    pub node_height: f64,
    pub connector_height: f64,
    pub min_node_width: f64,
    /// Horizontal allowance per label character.
    pub char_width: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    /// Top edge of the root box.
    pub root_top: f64,
    pub font_size: u32,
    pub node_fill: &'static str,
    pub node_stroke: &'static str,
    pub connector_stroke: &'static str,
    pub connector_stroke_width: u32,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self {
            column_width: 350.0,
            row_height: 130.0,
            node_height: 80.0,
            connector_height: 40.0,
            min_node_width: 180.0,
            char_width: 6.0,
            horizontal_gap: 50.0,
            vertical_gap: 50.0,
            root_top: 50.0,
            font_size: 12,
            node_fill: "#EFEFEF",
            node_stroke: "#333333",
            connector_stroke: "#FFD700",
            connector_stroke_width: 2,
        }
    }
}

impl DiagramStyle {
    /// Box width for a label: grows per character above a fixed minimum.
    pub fn node_width(&self, label: &str) -> f64 {
        (label.chars().count() as f64 * self.char_width).max(self.min_node_width)
    }
}
