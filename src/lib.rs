pub mod api;
pub mod app;
pub mod calendar;
pub mod config;
pub mod stats;
pub mod theme;
pub mod ui;
