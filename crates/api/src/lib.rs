pub mod app;
pub mod auth;
pub mod checkin;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod state;

pub use state::AppState;
