//! Shared utilities

pub mod config;
pub mod dumpbin;
pub mod fs;
pub mod process;

pub use config::Config;
pub use dumpbin::{DumpMode, Dumpbin};
