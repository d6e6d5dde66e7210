//! Server wiring: configuration, the collection loop, reload handling
//! and the health responder.

pub mod config;
pub mod health;
pub mod monitor;
pub mod reload;
pub mod state;

#[cfg(test)]
mod tests;
