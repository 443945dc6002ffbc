//! Infrastructure adapters for the filesystem, git, config, clipboard, and logging.

pub mod clipboard;
pub mod config;
pub mod fs;
pub mod git;
pub mod logging;
