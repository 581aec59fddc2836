use std::{
    collections::BTreeMap,
    env,
    io::{self, Write},
    path::{Component, Path, PathBuf},
};

use colored::Colorize;
use log::{debug, trace};

use crate::{config::Config, types::CheckResult};

/// Relativize a path to the current working directory for clickable links
fn relativize_to_cwd(root: &Path, relative_to_root: &str) -> String {
    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(_) => {
            debug!("Failed to get current directory");
            return relative_to_root.to_string();
        }
    };
    trace!("Relativizing '{}' from root {:?} to cwd {:?}", relative_to_root, root, cwd);

    let abs_path = root.join(relative_to_root);
    match make_relative(&abs_path, &cwd) {
        Some(rel_path) => rel_path.to_string_lossy().to_string(),
        None => relative_to_root.to_string(),
    }
}

/// Create a relative path from `base` to `target`
fn make_relative(target: &Path, base: &Path) -> Option<PathBuf> {
    let target_components: Vec<Component> = target.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    // Paths on different roots cannot be relativized
    if target_components.first() != base_components.first() {
        return None;
    }

    let common = target_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(t, b)| t == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base_components.len() {
        result.push("..");
    }
    for component in &target_components[common..] {
        match component {
            Component::Normal(p) => result.push(p),
            Component::ParentDir => result.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if result.as_os_str().is_empty() { Some(PathBuf::from(".")) } else { Some(result) }
}

pub fn print_clean_message<W: Write>(writer: &mut W, result: &CheckResult) -> io::Result<()> {
    debug!("No computed dynamic import paths detected");
    writeln!(
        writer,
        "{} All dynamic import paths are statically analyzable ({} call sites across {} files).",
        "✓".green().bold(),
        result.total_call_sites(),
        result.files_analyzed
    )?;
    writer.flush()?;
    Ok(())
}

pub fn print_findings_tree<W: Write>(
    writer: &mut W,
    result: &CheckResult,
    cfg: &Config,
) -> io::Result<()> {
    debug!("Printing findings tree for {} findings", result.findings.len());
    // Group findings by file; findings within a file are already in line order
    let mut by_file: BTreeMap<&str, Vec<&crate::types::Finding>> = BTreeMap::new();
    for f in &result.findings {
        by_file.entry(f.file.as_str()).or_default().push(f);
    }

    writeln!(
        writer,
        "{} Dynamic import paths that cannot be statically analyzed\n",
        "⚠".yellow().bold()
    )?;

    for (file, file_findings) in &by_file {
        trace!("Processing file: {} with {} findings", file, file_findings.len());

        let display_path = match cfg.root.as_ref() {
            Some(root) => relativize_to_cwd(root, file),
            None => file.to_string(),
        };
        writeln!(writer, "{}", display_path.bright_white().bold())?;

        for (idx, finding) in file_findings.iter().enumerate() {
            let is_last = idx == file_findings.len() - 1;
            let prefix = if is_last { "└──" } else { "├──" };

            // Collapse multi-line argument expressions for one-line display
            let display_arg = finding
                .source_text
                .replace('\n', " ")
                .replace('\r', "")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");

            writeln!(
                writer,
                "{}  import({}) {}",
                prefix.dimmed(),
                display_arg,
                format!("(line {}, col {})", finding.line, finding.column).red()
            )?;
        }

        writeln!(writer)?;
    }

    print_summary(writer, result)?;
    writer.flush()?;
    Ok(())
}

fn print_summary<W: Write>(writer: &mut W, result: &CheckResult) -> io::Result<()> {
    let total_sites = result.total_call_sites();
    let computed = result.findings.len();
    let affected_files =
        result.reports.iter().filter(|r| r.call_sites.iter().any(|s| !s.classification.is_static())).count();

    writeln!(writer, "{}", "─".repeat(60).dimmed())?;
    writeln!(writer, "{}", "Summary".bold())?;
    writeln!(writer, "  Files analyzed: {}", result.files_analyzed)?;
    writeln!(writer, "  Module requests: {}", result.total_requests())?;
    writeln!(
        writer,
        "  Dynamic import() call sites: {} ({} static, {} computed)",
        total_sites,
        (total_sites - computed).to_string().green(),
        computed.to_string().red().bold()
    )?;
    writeln!(writer, "  Affected files: {}", affected_files.to_string().yellow().bold())?;

    Ok(())
}

pub fn print_json<W: Write>(writer: &mut W, result: &CheckResult) -> io::Result<()> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(writer, "{}", json)?;
    writer.flush()?;
    Ok(())
}
