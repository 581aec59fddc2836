use anyhow::{Result, anyhow};
use dashmap::DashMap;
use log::{debug, info, warn};
use oximport_core::{CollectorConfig, FileScan, collect_files, scan_file};
use rayon::prelude::*;
use std::{path::PathBuf, sync::Arc};

use crate::{
    config::Config,
    types::{CheckResult, FileReport, Finding},
};

pub fn run_dynamic_import_check(mut cfg: Config) -> Result<CheckResult> {
    info!("Starting dynamic import check");

    cfg.initialize()?;
    let root = cfg.root()?.clone();

    debug!("Collecting source files with glob: {:?}", cfg.entry_glob);
    let mut files = collect_files(&CollectorConfig {
        root: root.clone(),
        entry_glob: cfg.entry_glob.clone(),
    })?;
    if files.is_empty() {
        warn!("No source files found under {}", root.display());
        return Err(anyhow!("No source files found under {}", root.display()));
    }
    // Report order is file order
    files.sort();
    info!("Found {} source files", files.len());

    // Thread-safe scan cache shared across rayon workers
    let scan_cache: Arc<DashMap<PathBuf, FileScan>> = Arc::new(DashMap::new());

    info!("Scanning {} files in parallel", files.len());
    let reports: Vec<FileReport> = files
        .par_iter()
        .filter_map(|file| {
            debug!("Scanning: {}", file.display());
            let scan_cache = Arc::clone(&scan_cache);

            let scan = match scan_file(file, &scan_cache) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Error scanning {}: {}", file.display(), e);
                    return None;
                }
            };

            // Root-relative paths read better and make reports portable
            let rel_file =
                file.strip_prefix(&root).unwrap_or(file).to_string_lossy().to_string();

            Some(FileReport { file: rel_file, requests: scan.requests, call_sites: scan.call_sites })
        })
        .collect();

    let findings: Vec<Finding> = reports
        .iter()
        .flat_map(|report| {
            report.call_sites.iter().filter(|site| !site.classification.is_static()).map(
                move |site| Finding {
                    file: report.file.clone(),
                    line: site.line,
                    column: site.column,
                    source_text: site.source_text.clone(),
                },
            )
        })
        .collect();

    info!(
        "Dynamic import check complete. Found {} computed-path call sites",
        findings.len()
    );
    debug!("Scan cache holds {} files", scan_cache.len());

    Ok(CheckResult { reports, findings, files_analyzed: scan_cache.len() })
}
