// Public API for integration tests and embedding the engine in other transports

pub mod auth;
pub mod broadcast;
pub mod config;
pub mod game;
pub mod phrases;
pub mod protocol;
pub mod registry;
pub mod state;
pub mod store;
pub mod types;
pub mod ws;
