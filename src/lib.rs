pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod stats;
pub mod store;
