use oximport_core::{CallSite, ModuleRequest};
use serde::Serialize;

/// A dynamic `import()` call whose path cannot be statically analyzed.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// File path relative to the project root.
    pub file: String,
    pub line: u32,
    pub column: u32,
    /// Source text of the computed argument expression.
    pub source_text: String,
}

/// Everything the scan learned about one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// File path relative to the project root.
    pub file: String,
    pub requests: Vec<ModuleRequest>,
    pub call_sites: Vec<CallSite>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub reports: Vec<FileReport>,
    pub findings: Vec<Finding>,
    pub files_analyzed: usize,
}

impl CheckResult {
    pub fn total_requests(&self) -> usize {
        self.reports.iter().map(|r| r.requests.len()).sum()
    }

    pub fn total_call_sites(&self) -> usize {
        self.reports.iter().map(|r| r.call_sites.len()).sum()
    }
}
