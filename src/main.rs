mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Commands, ServeArgs, SplitArgs};
use invoice_splitter::web::{self, AppState};
use invoice_splitter::{DocumentSplitter, MarkerRule, PdfFetcher, SplitConfig, SplitReport};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Analyze(args)) => handle_analyze_command(args).await,
        Some(Commands::Serve(args)) => handle_serve_command(args).await,
        None => handle_split_command(&cli.split).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so stdout only carries
/// reports.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_split_command(args: &SplitArgs) -> anyhow::Result<()> {
    // Validate rule and inputs
    let rule = MarkerRule::from_options(&args.rule.to_options())?;
    let sources = PdfFetcher::validate_sources(&args.inputs)?;
    if sources.is_empty() {
        bail!("No PDF files found in the given inputs");
    }

    info!("Starting split of {} documents using {}", sources.len(), rule);

    // Load every input before anything is written
    let several = sources.len() > 1;
    let mut jobs = Vec::with_capacity(sources.len());
    for (idx, path) in sources.iter().enumerate() {
        info!("Loading document {}/{}: {}", idx + 1, sources.len(), path.display());
        let source = PdfFetcher::fetch_document(path).await?;
        let config = split_config_for(args, path, several);
        jobs.push((source, config));
    }

    if args.dry_run {
        let mut total_invoices = 0;
        for (source, _) in &jobs {
            let report = DocumentSplitter::plan(source, &rule)?;
            print_groups(&report);
            total_invoices += report.groups.len();
        }
        info!("Dry run: {} invoices detected, nothing written", total_invoices);
        return Ok(());
    }

    let results = DocumentSplitter::split_batch(&jobs, &rule)
        .await
        .context("Failed to split documents, no output was kept")?;

    for result in &results {
        info!("{}:", result.report.source);
        for (output_file, group) in result.output_files.iter().zip(&result.report.groups) {
            info!("  - {} ({})", output_file.display(), group);
        }
        if let Some(zip_file) = &result.zip_file {
            info!("  - {} (archive)", zip_file.display());
        }
        if let Some(manifest_file) = &result.manifest_file {
            info!("  - {} (manifest)", manifest_file.display());
        }
    }

    let total_invoices: usize = results.iter().map(|r| r.report.groups.len()).sum();
    info!("Split completed: {} invoice files created", total_invoices);
    Ok(())
}

/// Output settings for one input. With several inputs each one writes into
/// its own subdirectory.
fn split_config_for(args: &SplitArgs, path: &Path, several: bool) -> SplitConfig {
    let stem = PdfFetcher::source_stem(path);
    let output_dir = if several {
        args.output_dir.join(&stem)
    } else {
        args.output_dir.clone()
    };

    SplitConfig {
        output_dir,
        file_prefix: args.prefix.clone(),
        zip_path: args
            .zip
            .as_deref()
            .map(|zip| archive_path_for(zip, &stem, several)),
        write_files: !args.zip_only,
        include_manifest: args.manifest,
        force: args.force,
    }
}

/// With several inputs every document gets its own archive next to the
/// requested one, named after the input.
fn archive_path_for(zip: &Path, stem: &str, several: bool) -> PathBuf {
    if !several {
        return zip.to_path_buf();
    }

    let file_name = zip
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoices.zip".to_string());
    zip.with_file_name(format!("{}_{}", stem, file_name))
}

fn print_groups(report: &SplitReport) {
    println!(
        "{}: {} pages, {} invoices",
        report.source,
        report.total_pages,
        report.groups.len()
    );
    for (idx, group) in report.groups.iter().enumerate() {
        println!("  Invoice {}: {}", idx + 1, group);
    }
}

async fn handle_analyze_command(args: &AnalyzeArgs) -> anyhow::Result<()> {
    let rule = MarkerRule::from_options(&args.rule.to_options())?;
    let sources = PdfFetcher::validate_sources(&args.inputs)?;
    info!("Starting analysis of {} documents", sources.len());

    let mut reports = Vec::with_capacity(sources.len());

    for path in &sources {
        let source = PdfFetcher::fetch_document(path).await?;
        let report = DocumentSplitter::plan(&source, &rule)?;

        println!("\n=== Analysis for '{}' ===", report.source);
        println!("Rule: {}", rule);
        println!("Total pages: {}", report.total_pages);
        println!("Invoices found: {}", report.groups.len());
        for (idx, group) in report.groups.iter().enumerate() {
            println!("  Invoice {}: {} ({} pages)", idx + 1, group, group.len());
        }

        if args.detailed {
            println!("\nPage Details:");
            for page in &report.pages {
                let marker = match (page.boundary, page.matched) {
                    (true, true) => "starts invoice (marker found)",
                    (true, false) => "starts invoice (first page)",
                    (false, _) => "continues invoice",
                };
                println!("  Page {}: {} chars, {}", page.index + 1, page.text_chars, marker);
            }
        }

        reports.push(report);
    }

    if let Some(json_path) = &args.json {
        let json_content = serde_json::to_string_pretty(&reports)
            .context("Failed to serialize analysis results")?;

        tokio::fs::write(json_path, json_content)
            .await
            .context("Failed to write JSON analysis file")?;

        info!("Analysis results written to: {}", json_path.display());
    }

    Ok(())
}

async fn handle_serve_command(args: &ServeArgs) -> anyhow::Result<()> {
    let options = args.rule.to_options();
    // Reject a bad default rule at startup rather than on every upload.
    MarkerRule::from_options(&options)?;

    let state = AppState::new(options, args.max_upload_mb.saturating_mul(1024 * 1024));
    web::run(SocketAddr::new(args.host, args.port), state).await
}
