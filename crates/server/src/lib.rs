//! blobd game server library.

pub mod collision;
pub mod command;
pub mod config;
pub mod entity;
pub mod server;
pub mod snapshot;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{Engine, Frame, TargetedFrame, run, run_engine_loop};
