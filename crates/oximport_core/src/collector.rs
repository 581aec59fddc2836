use anyhow::Result;
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::PathBuf;

use crate::constants::JS_TS_EXTENSIONS;

pub struct CollectorConfig {
    pub root: PathBuf,
    pub entry_glob: Option<String>,
}

/// Collect the JS/TS source files to scan under the root.
///
/// The walk honors gitignore rules and skips test files. With an entry glob,
/// only files whose root-relative path contains the pattern are kept;
/// otherwise every JS/TS file under the root is a candidate.
pub fn collect_files(cfg: &CollectorConfig) -> Result<Vec<PathBuf>> {
    debug!("Collecting source files");
    let mut files: Vec<PathBuf> = Vec::new();
    let root = &cfg.root;
    debug!("Walking directory tree from root: {}", root.display());
    let walker = WalkBuilder::new(root).hidden(false).ignore(true).git_ignore(true).build();

    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        // Skip test files (*.test.*, *.spec.*)
        let path_str = p.to_string_lossy();
        if path_str.contains(".test.") || path_str.contains(".spec.") {
            trace!("Skipping test file: {}", path_str);
            continue;
        }

        let Some(ext) = p.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !JS_TS_EXTENSIONS.contains(&ext) {
            continue;
        }

        if let Some(gl) = &cfg.entry_glob {
            if let Ok(rel_path) = p.strip_prefix(root) {
                let rel_str = rel_path.to_string_lossy();
                if rel_str.contains(gl) {
                    trace!("Matched source file with glob '{}': {}", gl, rel_str);
                    files.push(p.to_path_buf());
                }
            }
        } else {
            trace!("Found source file: {}", p.display());
            files.push(p.to_path_buf());
        }
    }
    debug!("Collected {} source files", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_collects_all_js_ts_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/index.ts", "// entry");
        create_test_file(root, "lib/util.js", "// util");
        create_test_file(root, "README.md", "# readme");

        let cfg = CollectorConfig { root: root.to_path_buf(), entry_glob: None };
        let files = collect_files(&cfg).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_skips_test_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "src/index.ts", "// entry");
        create_test_file(root, "src/index.test.ts", "// test");
        create_test_file(root, "src/index.spec.ts", "// spec");

        let cfg = CollectorConfig { root: root.to_path_buf(), entry_glob: None };
        let files = collect_files(&cfg).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().ends_with("index.ts"));
    }

    #[test]
    fn test_entry_glob_filters_by_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "apps/web/main.tsx", "// web");
        create_test_file(root, "apps/api/main.ts", "// api");

        let cfg =
            CollectorConfig { root: root.to_path_buf(), entry_glob: Some("apps/web".to_string()) };
        let files = collect_files(&cfg).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].to_string_lossy().contains("web"));
    }

    #[test]
    fn test_empty_root() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = CollectorConfig { root: temp_dir.path().to_path_buf(), entry_glob: None };
        let files = collect_files(&cfg).unwrap();
        assert!(files.is_empty());
    }
}
