// src/locator/mod.rs
mod resolver;

pub use resolver::{Locator, ResolvedBackend};
