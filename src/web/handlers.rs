use crate::error::{InvoiceSplitterError, Result};
use crate::services::{DocumentSplitter, MarkerRule, SourceDocument, ZipPackager};
use crate::types::RuleOptions;
use crate::web::html::{self, FormValues};
use crate::web::AppState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::path::Path;
use tracing::{error, info, warn};

struct Upload {
    file_name: String,
    bytes: Vec<u8>,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(html::index_page(&state.default_form(), None))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn split(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (form, upload) = match read_form(multipart).await {
        Ok(parsed) => parsed,
        Err(message) => {
            warn!("Rejected upload: {}", message);
            return (
                StatusCode::BAD_REQUEST,
                Html(html::index_page(&state.default_form(), Some(&message))),
            )
                .into_response();
        }
    };

    let Some(upload) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            Html(html::index_page(&form, Some("Please upload a PDF file"))),
        )
            .into_response();
    };

    let rule = match rule_from_form(&form) {
        Ok(rule) => rule,
        Err(e) => return error_page(&form, &e),
    };

    info!(
        "Splitting upload '{}' ({:.2} KB)",
        upload.file_name,
        upload.bytes.len() as f64 / 1024.0
    );

    let job = tokio::task::spawn_blocking(move || split_upload(upload, &rule)).await;

    match job {
        Ok(Ok(page)) => Html(page).into_response(),
        Ok(Err(e)) => error_page(&form, &e),
        Err(e) => {
            error!("Split task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(html::index_page(&form, Some("Unexpected error while splitting"))),
            )
                .into_response()
        }
    }
}

fn split_upload(upload: Upload, rule: &MarkerRule) -> Result<String> {
    let stem = Path::new(&upload.file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();

    let source = SourceDocument::from_bytes(upload.file_name, &upload.bytes)?;
    let (report, documents) = DocumentSplitter::split_in_memory(&source, rule, Some(&stem))?;
    let archive = ZipPackager::package(&documents)?;

    info!("Split '{}' into {} invoices", report.source, documents.len());
    Ok(html::result_page(&stem, &report, &documents, &archive))
}

fn error_page(form: &FormValues, err: &InvoiceSplitterError) -> Response {
    let status = if err.is_user_error() {
        warn!("Split failed: {}", err);
        StatusCode::BAD_REQUEST
    } else {
        error!("Split failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Html(html::index_page(form, Some(&err.to_string())))).into_response()
}

/// The regex checkbox selects which field applies. Without it, both fields
/// are taken as given so that conflicting input is reported.
pub(crate) fn rule_from_form(form: &FormValues) -> Result<MarkerRule> {
    let markers: Vec<String> = form
        .markers
        .lines()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    let regex = Some(form.regex.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let scan_limit = match form.scan_chars.trim() {
        "" => None,
        raw => Some(raw.parse::<usize>().map_err(|_| InvoiceSplitterError::Config {
            reason: format!("scan limit must be a positive number, got {:?}", raw),
        })?),
    };

    let options = if form.use_regex {
        RuleOptions {
            markers: Vec::new(),
            regex: Some(regex.unwrap_or_default()),
            case_sensitive: !form.ignore_case,
            scan_limit,
        }
    } else {
        RuleOptions {
            markers,
            regex,
            case_sensitive: !form.ignore_case,
            scan_limit,
        }
    };

    MarkerRule::from_options(&options)
}

async fn read_form(mut multipart: Multipart) -> std::result::Result<(FormValues, Option<Upload>), String> {
    let mut form = FormValues::default();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Failed to read upload: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let file_name = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "upload.pdf".to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read file '{}': {}", file_name, e))?;

            if !bytes.is_empty() {
                upload = Some(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| format!("Failed to read field '{}': {}", name, e))?;

        match name.as_str() {
            "markers" => form.markers = value,
            "regex" => form.regex = value,
            "use_regex" => form.use_regex = true,
            "ignore_case" => form.ignore_case = true,
            "scan_chars" => form.scan_chars = value,
            _ => {}
        }
    }

    Ok((form, upload))
}
