use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Visualization kind of a dashboard panel.
///
/// Unrecognized kinds deserialize to `Other` so newly introduced chart
/// types degrade to the default sizing instead of failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PanelKind {
    Bar,
    Line,
    Area,
    Pie,
    Donut,
    Scatter,
    Histogram,
    Heatmap,
    Table,
    Kpi,
    Insights,
    #[serde(other)]
    Other,
}

/// Placement of a panel on the 12-column grid.
///
/// `x` is the column offset, `y` the row offset; `w` and `h` are the
/// spans in columns and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// True iff the two rectangles share any cell.
    pub fn overlaps(&self, other: &GridRect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// One dashboard panel as produced by the analysis pipeline.
///
/// The pipeline emits panels without placement; `grid` is filled in by
/// the layout engine before the dashboard is shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Panel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PanelKind,
    #[serde(default)]
    pub title: String,
    /// Rendered figure specification, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figure: Option<serde_json::Value>,
    /// Raw tabular data for table and KPI panels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, rename = "gridLayout", skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridRect>,
}

impl Panel {
    pub fn new(id: impl Into<String>, kind: PanelKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            figure: None,
            data: None,
            grid: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_deserializes_to_other() {
        let panel: Panel =
            serde_json::from_str(r#"{"id": "p1", "type": "sankey", "title": "Flows"}"#).unwrap();
        assert_eq!(panel.kind, PanelKind::Other);
    }

    #[test]
    fn test_grid_rect_overlap() {
        let a = GridRect::new(0, 0, 4, 2);
        let b = GridRect::new(3, 1, 4, 2);
        let c = GridRect::new(4, 0, 4, 2);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_panel_wire_shape() {
        let mut panel = Panel::new("p1", PanelKind::Pie, "Share");
        panel.grid = Some(GridRect::new(0, 0, 4, 2));
        let value = serde_json::to_value(&panel).unwrap();
        assert_eq!(value["type"], "pie");
        assert_eq!(value["gridLayout"]["w"], 4);
    }
}
