//! Dashboard domain: panels and the grid layout engine.
//!
//! # Module Structure
//!
//! - `panel`: `Panel`, `PanelKind`, and `GridRect`
//! - `layout`: the pure `arrange` packing function

mod layout;
mod panel;

pub use layout::{arrange, GRID_COLUMNS, KPI_WIDTH, LEAD_VISUAL_WIDTH, MAX_KPIS};
pub use panel::{GridRect, Panel, PanelKind};
