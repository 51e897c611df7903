mod commands;
mod logging;
mod progress;
mod render;

use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use commands::{Cli, Commands, ScanArgs};
use dotenv::dotenv;
use intake_core::scanner::write_csv_file;
use intake_core::{
    AppConfig, Error, IntakeEngine, PatternCompiler, ScanResult, SelectionAggregator,
    SelectionSet,
};
use progress::CliReporter;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    dotenv().ok();

    let args = Cli::parse();
    let _guard = logging::init_logger(args.verbose);

    let config = match intake_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Scan { scan, excluded_csv }) => {
            run_scan(config, &scan, excluded_csv.as_deref())
        }
        Some(Commands::Collect {
            scan,
            select,
            none,
            json,
        }) => run_collect(config, &scan, &select, none, json),
        Some(Commands::Patterns { file }) => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let rules = PatternCompiler::new().compile(&content);
            render::print_rules(&rules);
            Ok(())
        }
        Some(Commands::PrintConfig) => {
            let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
            println!("{}", rendered);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }

    Ok(())
}

fn apply_overrides(mut config: AppConfig, scan: &ScanArgs) -> AppConfig {
    if let Some(ext) = &scan.ext {
        config = config.with_extensions(ext);
    }
    if let Some(max_size) = scan.max_size {
        config = config.with_max_file_size(max_size);
    }
    if scan.include_hidden {
        config = config.with_include_hidden(true);
    }
    config
}

/// Run the scan and turn the "nothing admitted" outcome into a readable
/// report before failing.
fn scan_paths(config: AppConfig, scan: &ScanArgs) -> Result<ScanResult> {
    let engine = IntakeEngine::new(apply_overrides(config, scan))?;
    let reporter = CliReporter::new();

    match engine.scan_paths(&scan.paths, &reporter) {
        Ok(result) => Ok(result),
        Err(Error::NoAdmittedFiles { excluded }) => {
            render::print_exclusions(&excluded);
            Err(Error::NoAdmittedFiles { excluded }.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_scan(
    config: AppConfig,
    scan: &ScanArgs,
    excluded_csv: Option<&std::path::Path>,
) -> Result<()> {
    let result = scan_paths(config, scan)?;

    info!(
        "Session {} started {}: {} items scanned in {:.2}s",
        result.session_id,
        result.started_at.to_rfc3339(),
        result.items_scanned,
        result.scan_duration.as_secs_f64(),
    );

    render::print_forest(&result.forest);
    println!();
    render::print_exclusions(&result.excluded);
    render::print_unsupported(&result.unsupported_patterns);

    if let Some(path) = excluded_csv {
        write_csv_file(&result.excluded, path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Exclusion log written to {}", path.display());
    }

    Ok(())
}

fn run_collect(
    config: AppConfig,
    scan: &ScanArgs,
    select: &[String],
    none: bool,
    json: bool,
) -> Result<()> {
    let result = scan_paths(config, scan)?;

    let selection = if none {
        SelectionSet::new()
    } else if select.is_empty() {
        SelectionSet::all(&result.forest)
    } else {
        let mut selection = SelectionSet::new();
        for path in select {
            if result.forest.find(path).is_none() {
                warn!("Selected folder {} is not in the scanned tree", path);
            }
            selection.insert(path);
        }
        selection
    };

    if !selection.has_content(&result.forest) {
        warn!("Please select at least one folder to upload");
    }

    let manifest = SelectionAggregator::aggregate(&result.forest, &selection)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        render::print_manifest(&manifest);
    }

    Ok(())
}
