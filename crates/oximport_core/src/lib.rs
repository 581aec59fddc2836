//! Core utilities for oximport tools.
//!
//! This crate provides shared functionality for analyzing module imports in
//! JavaScript/TypeScript projects, including:
//! - Classifying dynamic `import()` arguments as static or runtime-computed
//! - Scanning files for module requests and dynamic-import call sites
//! - Collecting source files from a project tree
//! - Configuration utilities (git root finding)

mod classifier;
mod collector;
mod config;
mod constants;
mod scanner;
mod types;

// Re-export public API
pub use classifier::classify;
pub use collector::{CollectorConfig, collect_files};
pub use config::{find_git_root, find_git_root_from};
pub use constants::JS_TS_EXTENSIONS;
pub use scanner::{scan_file, scan_source, source_type_for};
pub use types::{CallSite, Classification, FileScan, ModuleRequest, RequestOrigin};
