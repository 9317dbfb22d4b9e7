//! Metadata-driven admin back office: browse, filter, paginate and edit
//! relational tables through server-rendered pages and a JSON API.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod render;
pub mod services;
pub mod types;
pub mod validation;

pub use app::{router, AppState};
