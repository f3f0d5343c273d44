// src/lib.rs
pub mod config;
pub mod locator;
pub mod relay;
pub mod server;
