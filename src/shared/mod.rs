// src/shared/mod.rs

pub mod clock;
pub mod config;
pub mod error;
pub mod shared_structs;
pub mod telemetry;
