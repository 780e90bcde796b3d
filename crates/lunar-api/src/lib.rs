pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod normalize;
pub mod prompt;
pub mod routes;
pub mod state;
