// Presentation adapters: shape results for the chart and table collaborators.

pub mod charts;
pub mod table;

pub use charts::{refresh_charts, ChartRegistry, ChartSpec, RenderedChart};
pub use table::DataGrid;
