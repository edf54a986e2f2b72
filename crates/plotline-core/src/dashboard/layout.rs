//! Deterministic dashboard layout on a 12-column grid.
//!
//! Panels arrive from the pipeline without placement. `arrange` packs
//! them into three bands: KPI cards on the top row, type-sized
//! visualizations flowing left to right below, and full-width insights
//! panels at the bottom. The same input always produces the same
//! placements.

use super::{GridRect, Panel, PanelKind};

/// Total columns in the dashboard grid.
pub const GRID_COLUMNS: u32 = 12;
/// Column span of one KPI card.
pub const KPI_WIDTH: u32 = 3;
/// KPI cards beyond this count are dropped from the top band.
pub const MAX_KPIS: usize = 4;
/// Column span given to the first visualization on crowded dashboards.
pub const LEAD_VISUAL_WIDTH: u32 = 8;

/// (columns, rows) occupied by a visualization of the given kind.
fn visual_size(kind: PanelKind) -> (u32, u32) {
    match kind {
        PanelKind::Pie | PanelKind::Donut | PanelKind::Histogram | PanelKind::Bar => (4, 2),
        PanelKind::Heatmap | PanelKind::Table => (6, 2),
        _ => (4, 2),
    }
}

/// Packs panels into the grid and returns them with placements filled in.
///
/// Band order is fixed: KPIs (capped at [`MAX_KPIS`]), then
/// visualizations, then insights. Within a band the input order is
/// preserved. When more than two visualizations are present the first
/// one is widened to [`LEAD_VISUAL_WIDTH`] columns to anchor the page.
pub fn arrange(panels: &[Panel]) -> Vec<Panel> {
    let mut kpis: Vec<Panel> = Vec::new();
    let mut insights: Vec<Panel> = Vec::new();
    let mut visuals: Vec<Panel> = Vec::new();

    for panel in panels {
        match panel.kind {
            PanelKind::Kpi => kpis.push(panel.clone()),
            PanelKind::Insights => insights.push(panel.clone()),
            _ => visuals.push(panel.clone()),
        }
    }
    kpis.truncate(MAX_KPIS);

    let mut arranged = Vec::with_capacity(kpis.len() + visuals.len() + insights.len());
    let mut row: u32 = 0;

    for (i, mut kpi) in kpis.into_iter().enumerate() {
        kpi.grid = Some(GridRect::new(i as u32 * KPI_WIDTH, 0, KPI_WIDTH, 1));
        arranged.push(kpi);
    }
    if !arranged.is_empty() {
        row = 1;
    }

    let widen_lead = visuals.len() > 2;
    let mut col: u32 = 0;
    let mut row_tallest: u32 = 0;
    for (i, mut visual) in visuals.into_iter().enumerate() {
        let (mut w, h) = visual_size(visual.kind);
        if i == 0 && widen_lead {
            w = LEAD_VISUAL_WIDTH;
        }
        if col + w > GRID_COLUMNS {
            col = 0;
            row += row_tallest;
            row_tallest = 0;
        }
        visual.grid = Some(GridRect::new(col, row, w, h));
        arranged.push(visual);
        col += w;
        row_tallest = row_tallest.max(h);
        if col >= GRID_COLUMNS {
            col = 0;
            row += row_tallest;
            row_tallest = 0;
        }
    }
    if col > 0 {
        row += row_tallest;
    }

    for mut insight in insights {
        insight.grid = Some(GridRect::new(0, row, GRID_COLUMNS, 1));
        arranged.push(insight);
        row += 1;
    }

    arranged
}
