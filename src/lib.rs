//! Personal task-management service: a REST API over SQLite plus a typed
//! client with kanban board state.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
