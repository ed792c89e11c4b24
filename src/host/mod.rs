//! Host-facing command contract and the stdin/stdout bridge.

pub mod contract;
pub mod handler;
pub mod stdio;

pub use handler::{HostHandler, build_collaborators};
pub use stdio::{run_bridge, run_stdio_bridge};
