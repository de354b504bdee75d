//! taskdeck: a terminal client for task-management workspaces.
//!
//! Views share one in-memory [`cache::DataCache`] so a list fetched by one
//! panel is reused by the others until it goes stale, and every write is
//! broadcast to the views watching that key.

pub mod app;
pub mod cache;
pub mod client;
pub mod commands;
pub mod config;
pub mod event;
pub mod keys;
pub mod logging;
pub mod query;
pub mod tasks;
pub mod ui;
