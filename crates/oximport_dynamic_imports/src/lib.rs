//! Dynamic-import path analysis for JavaScript/TypeScript projects.
//!
//! This crate scans a source tree for dynamic `import()` calls and classifies
//! each call site's argument: a plain string literal is statically
//! analyzable, while computed paths (template interpolation, concatenation,
//! variables) cannot be resolved by build tooling and are reported as
//! findings.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use oximport_dynamic_imports::{Config, OutputFormat, run_dynamic_import_check};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config {
//!     root: Some(std::path::PathBuf::from("/path/to/project")),
//!     entry_glob: None,
//!     format: OutputFormat::Text,
//! };
//!
//! let result = run_dynamic_import_check(cfg.clone())?;
//!
//! if !result.findings.is_empty() {
//!     // Use buffered output for better performance
//!     let mut stdout = BufWriter::new(std::io::stdout());
//!     oximport_dynamic_imports::print_findings_tree(&mut stdout, &result, &cfg)?;
//!     stdout.flush()?;
//! }
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
mod reporter;
mod types;

// Re-export public API
pub use checker::run_dynamic_import_check;
pub use config::{Config, OutputFormat};
pub use reporter::{print_clean_message, print_findings_tree, print_json};
pub use types::{CheckResult, FileReport, Finding};
