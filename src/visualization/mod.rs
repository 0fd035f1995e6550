//! Visualization module

pub mod roc_plot;

pub use roc_plot::{RocPlot, RocPlotConfig};
