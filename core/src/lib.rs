//! Choreography controller for a swarm of remotely observable ants.
//!
//! The `engine` module holds the controller; everything else is a
//! building block it composes.

pub mod clock;
pub mod color;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod position;
pub mod registry;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod substrate;
pub mod types;
