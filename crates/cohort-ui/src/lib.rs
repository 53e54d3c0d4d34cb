//! Terminal UI layer for the cohort dashboard.
//!
//! Provides themes, the header and key-hint components, the metrics table,
//! chart and explore views, the cohort filter panel, the plain-text report,
//! and the dashboard event loop built on top of [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod components;
pub mod explore_view;
pub mod filter_panel;
pub mod report;
pub mod table_view;
pub mod themes;

pub use cohort_core as core;
