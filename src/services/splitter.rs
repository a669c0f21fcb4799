use crate::error::{InvoiceSplitterError, Result};
use crate::services::detector::BoundaryDetector;
use crate::services::packager::ZipPackager;
use crate::services::ranges::RangeBuilder;
use crate::services::rule::MarkerRule;
use crate::services::source::SourceDocument;
use crate::types::{InvoiceGroup, OutputDocument, SplitConfig, SplitReport, SplitResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Paths created while persisting, removed again if a later write fails.
#[derive(Debug, Default)]
struct WrittenOutputs {
    files: Vec<PathBuf>,
    directories: Vec<PathBuf>,
}

pub struct DocumentSplitter;

impl DocumentSplitter {
    /// Detects the invoice groups of `source` without materializing them.
    pub fn plan(source: &SourceDocument, rule: &MarkerRule) -> Result<SplitReport> {
        info!("Detecting invoices in '{}' using {}", source.name(), rule);

        let pages = source.pages();
        let page_reports = BoundaryDetector::page_reports(&pages, rule)?;
        let boundaries = BoundaryDetector::boundaries(&page_reports);
        let groups = RangeBuilder::build_ranges(&boundaries, pages.len())?;

        Ok(SplitReport {
            source: source.name().to_string(),
            total_pages: pages.len(),
            boundaries,
            groups,
            pages: page_reports,
        })
    }

    /// Extracts every group into an in-memory document. Any page failure
    /// aborts the whole split.
    pub fn materialize(
        source: &SourceDocument,
        groups: &[InvoiceGroup],
        prefix: Option<&str>,
    ) -> Result<Vec<OutputDocument>> {
        let mut documents = Vec::with_capacity(groups.len());

        for (idx, group) in groups.iter().enumerate() {
            let number = idx + 1;
            let bytes = source.extract_range(group)?;
            let file_name = Self::generate_output_filename(prefix, number, groups.len());

            debug!(
                "Materialized invoice {} ({}, {} bytes)",
                number,
                group,
                bytes.len()
            );

            documents.push(OutputDocument {
                number,
                file_name,
                group: *group,
                bytes,
            });
        }

        Ok(documents)
    }

    /// Detects and materializes in one step, without touching the file system.
    pub fn split_in_memory(
        source: &SourceDocument,
        rule: &MarkerRule,
        prefix: Option<&str>,
    ) -> Result<(SplitReport, Vec<OutputDocument>)> {
        let report = Self::plan(source, rule)?;
        let documents = Self::materialize(source, &report.groups, prefix)?;
        Ok((report, documents))
    }

    pub async fn split_document(
        source: &SourceDocument,
        rule: &MarkerRule,
        config: &SplitConfig,
    ) -> Result<SplitResult> {
        let (report, documents) =
            Self::split_in_memory(source, rule, config.file_prefix.as_deref())?;

        info!(
            "Splitting '{}' ({} pages) into {} invoices",
            report.source,
            report.total_pages,
            documents.len()
        );

        let mut written = WrittenOutputs::default();
        let result = match Self::persist(&report, &documents, config, &mut written).await {
            Ok(result) => result,
            Err(e) => {
                Self::remove_written(&written).await;
                return Err(e);
            }
        };

        Self::prune_stale_outputs(config, &result.output_files).await;

        info!(
            "Successfully split '{}' into {} files",
            report.source,
            result.output_files.len()
        );
        Ok(result)
    }

    /// Splits several documents as one unit. Every document is materialized
    /// before the first write, and a failed write removes the outputs of
    /// every document in the batch.
    pub async fn split_batch(
        jobs: &[(SourceDocument, SplitConfig)],
        rule: &MarkerRule,
    ) -> Result<Vec<SplitResult>> {
        // Detect and materialize everything up front
        let mut planned = Vec::with_capacity(jobs.len());
        for (source, config) in jobs {
            planned.push(Self::split_in_memory(source, rule, config.file_prefix.as_deref())?);
        }

        info!(
            "Materialized {} invoices from {} documents",
            planned.iter().map(|(_, documents)| documents.len()).sum::<usize>(),
            planned.len()
        );

        // Write all outputs, rolling back the whole batch on failure
        let mut written = WrittenOutputs::default();
        let mut results = Vec::with_capacity(jobs.len());
        for ((report, documents), (_, config)) in planned.iter().zip(jobs) {
            match Self::persist(report, documents, config, &mut written).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(
                        "Writing outputs of '{}' failed, removing {} files written by this batch",
                        report.source,
                        written.files.len()
                    );
                    Self::remove_written(&written).await;
                    return Err(e);
                }
            }
        }

        for ((_, config), result) in jobs.iter().zip(&results) {
            Self::prune_stale_outputs(config, &result.output_files).await;
        }

        Ok(results)
    }

    async fn persist(
        report: &SplitReport,
        documents: &[OutputDocument],
        config: &SplitConfig,
        written: &mut WrittenOutputs,
    ) -> Result<SplitResult> {
        let mut output_files = Vec::new();

        // Ensure output directory exists
        if (config.write_files || config.include_manifest)
            && Self::ensure_output_directory(&config.output_dir, config.force).await?
        {
            written.directories.push(config.output_dir.clone());
        }

        // Write individual invoices
        if config.write_files {
            for document in documents {
                let path = config.output_dir.join(&document.file_name);
                Self::write_file(&path, &document.bytes).await?;
                written.files.push(path.clone());
                output_files.push(path);
            }
        }

        // Package archive
        let zip_file = match &config.zip_path {
            Some(zip_path) => {
                if let Some(parent) = zip_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    if !parent.exists() {
                        fs::create_dir_all(parent).await?;
                        written.directories.push(parent.to_path_buf());
                    }
                }
                let archive = ZipPackager::package(documents)?;
                Self::write_file(zip_path, &archive).await?;
                written.files.push(zip_path.clone());
                Some(zip_path.clone())
            }
            None => None,
        };

        // Generate manifest
        let manifest_file = if config.include_manifest {
            let path = config.output_dir.join(MANIFEST_FILE_NAME);
            Self::write_manifest(&path, report, &output_files, zip_file.as_deref()).await?;
            written.files.push(path.clone());
            Some(path)
        } else {
            None
        };

        Ok(SplitResult {
            report: report.clone(),
            output_files,
            zip_file,
            manifest_file,
        })
    }

    /// Returns `true` when the directory had to be created.
    async fn ensure_output_directory(output_dir: &Path, force: bool) -> Result<bool> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).await.map_err(|e| {
                InvoiceSplitterError::OutputDirectory {
                    reason: format!("Failed to create output directory: {}", e),
                }
            })?;
            info!("Created output directory: {}", output_dir.display());
            return Ok(true);
        }

        if !output_dir.is_dir() {
            return Err(InvoiceSplitterError::OutputDirectory {
                reason: format!("{} is not a directory", output_dir.display()),
            });
        }

        if !force {
            let mut entries = fs::read_dir(output_dir).await.map_err(|e| {
                InvoiceSplitterError::OutputDirectory {
                    reason: format!("Cannot read output directory: {}", e),
                }
            })?;

            if entries.next_entry().await?.is_some() {
                return Err(InvoiceSplitterError::OutputDirectory {
                    reason: format!(
                        "{} is not empty. Use --force to overwrite.",
                        output_dir.display()
                    ),
                });
            }
        }

        Ok(false)
    }

    async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes).await.map_err(|e| {
            InvoiceSplitterError::OutputDirectory {
                reason: format!("Failed to write {}: {}", path.display(), e),
            }
        })
    }

    async fn remove_written(written: &WrittenOutputs) {
        for path in &written.files {
            if let Err(e) = fs::remove_file(path).await {
                warn!("Could not remove partial output {}: {}", path.display(), e);
            }
        }
        // Innermost first; a directory holding anything else stays.
        for dir in written.directories.iter().rev() {
            if fs::remove_dir(dir).await.is_err() {
                debug!("Kept output directory {}", dir.display());
            }
        }
    }

    /// With `--force`, invoice files left over from an earlier, larger split
    /// are removed so the directory only holds the current split.
    async fn prune_stale_outputs(config: &SplitConfig, current: &[PathBuf]) {
        if !config.force || !config.write_files {
            return;
        }

        let mut entries = match fs::read_dir(&config.output_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not scan {} for stale invoices: {}", config.output_dir.display(), e);
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if !Self::is_output_filename(config.file_prefix.as_deref(), &name) || current.contains(&path) {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => info!("Removed stale invoice file: {}", path.display()),
                Err(e) => warn!("Could not remove stale invoice {}: {}", path.display(), e),
            }
        }
    }

    /// Whether `name` has the shape `generate_output_filename` produces.
    fn is_output_filename(prefix: Option<&str>, name: &str) -> bool {
        let stem = match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix("_invoice_")),
            None => name.strip_prefix("invoice_"),
        };

        stem.and_then(|rest| rest.strip_suffix(".pdf"))
            .map(|digits| digits.len() >= 3 && digits.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(false)
    }

    async fn write_manifest(
        path: &Path,
        report: &SplitReport,
        output_files: &[PathBuf],
        zip_file: Option<&Path>,
    ) -> Result<()> {
        let file_name = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        let manifest = serde_json::json!({
            "created_at": chrono::Utc::now().to_rfc3339(),
            "source": report.source,
            "total_pages": report.total_pages,
            "total_invoices": report.groups.len(),
            "invoices": report.groups.iter().enumerate().map(|(idx, group)| {
                serde_json::json!({
                    "number": idx + 1,
                    "start_page": group.start + 1,
                    "end_page": group.end,
                    "page_count": group.len(),
                    "file": output_files.get(idx).map(|p| file_name(p)),
                })
            }).collect::<Vec<_>>(),
            "zip": zip_file.map(file_name),
            "pages": report.pages,
        });

        let json_content = serde_json::to_string_pretty(&manifest)?;
        Self::write_file(path, json_content.as_bytes()).await?;

        info!("Generated manifest: {}", path.display());
        Ok(())
    }

    /// `invoice_001.pdf`, `invoice_002.pdf`, ...; the index is padded to at
    /// least three digits, more when the total needs it.
    pub fn generate_output_filename(prefix: Option<&str>, number: usize, total: usize) -> String {
        let width = std::cmp::max(3, total.to_string().len());
        match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => format!("{}_invoice_{:0width$}.pdf", prefix, number, width = width),
            None => format!("invoice_{:0width$}.pdf", number, width = width),
        }
    }
}
