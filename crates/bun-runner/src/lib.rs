//! bun host for the melte toolchain.
//!
//! Language sub-transformers, the component compiler, hot-reload
//! instrumentation and the final transpiler are JavaScript tools. They run
//! in persistent bun processes that speak line-delimited JSON over stdio.

mod protocol;
mod runner;
mod toolchain;
mod worker;

pub use runner::{BunError, BunRunner, HostConfig};
pub use toolchain::BunToolchain;
