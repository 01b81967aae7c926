pub mod analysis;
pub mod auth;
pub mod extract;
pub mod rest;
pub mod state;
pub mod symptoms;

#[cfg(test)]
pub(crate) mod testing;

// Re-export the router builder for the binary that starts the server.
pub use rest::{api_router, ApiDoc};
