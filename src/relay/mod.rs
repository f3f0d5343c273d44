//
// src/relay/mod.rs
//
mod forward;
mod relay;
mod static_files;

pub use forward::Forwarder;
pub use relay::{Relay, RelayError};
pub use static_files::StaticFiles;
