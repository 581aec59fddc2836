use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use oximport_dynamic_imports::{Config, OutputFormat};
use std::io::{BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "oximport")]
#[command(about = "Static analysis of module imports in JavaScript/TypeScript projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report dynamic import() calls with runtime-computed paths
    DynamicImports(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::DynamicImports(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Running dynamic import check (using {} threads)", num_threads);
            debug!("Config: root={:?}, entry_glob={:?}", cfg.root, cfg.entry_glob);

            let result = oximport_dynamic_imports::run_dynamic_import_check(cfg.clone())?;
            debug!("Found {} findings", result.findings.len());

            let elapsed_ms = start.elapsed().as_millis();

            if cfg.format == OutputFormat::Json {
                oximport_dynamic_imports::print_json(&mut stdout, &result)?;
            } else if result.findings.is_empty() {
                info!("No computed dynamic import paths detected");
                oximport_dynamic_imports::print_clean_message(&mut stdout, &result)?;
                writeln!(
                    stdout,
                    "\n{} Finished in {}ms on {} files (using {} threads).",
                    "●".bright_blue(),
                    elapsed_ms.to_string().cyan(),
                    result.files_analyzed.to_string().cyan(),
                    num_threads.to_string().cyan()
                )?;
            } else {
                oximport_dynamic_imports::print_findings_tree(&mut stdout, &result, &cfg)?;
                writeln!(
                    stdout,
                    "\n{} Finished in {}ms on {} files (using {} threads).",
                    "●".bright_blue(),
                    elapsed_ms.to_string().cyan(),
                    result.files_analyzed.to_string().cyan(),
                    num_threads.to_string().cyan()
                )?;
            }
            stdout.flush()?;

            if !result.findings.is_empty() {
                // Non-zero exit to fail CI
                std::process::exit(1);
            }

            Ok(())
        }
    }
}
