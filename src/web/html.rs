use crate::services::packager::ZipPackager;
use crate::types::{OutputDocument, SplitReport};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Values of the upload form, echoed back when the page is re-rendered.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub markers: String,
    pub regex: String,
    pub use_regex: bool,
    pub ignore_case: bool,
    pub scan_chars: String,
}

const STYLE: &str = "body{font-family:sans-serif;max-width:56rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem;font-weight:bold}\
textarea,input[type=text],input[type=number]{width:100%;box-sizing:border-box}\
.error{background:#fde8e8;border:1px solid #e0a0a0;padding:.75rem;margin:1rem 0}\
table{border-collapse:collapse;width:100%;margin-top:1rem}\
td,th{border-bottom:1px solid #ddd;padding:.4rem;text-align:left}\
.primary{display:inline-block;margin:1rem 0;padding:.6rem 1rem;background:#2557a7;color:#fff;text-decoration:none}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

pub fn index_page(form: &FormValues, error: Option<&str>) -> String {
    let mut body = String::new();
    body.push_str("<h1>PDF Invoice Splitter</h1>\n");
    body.push_str("<p>Split a PDF file containing multiple invoices into individual PDF files.</p>\n");

    if let Some(message) = error {
        body.push_str(&format!("<div class=\"error\">Error: {}</div>\n", escape(message)));
    }

    body.push_str(&format!(
        "<form method=\"post\" action=\"/split\" enctype=\"multipart/form-data\">\n\
         <label for=\"file\">PDF file</label>\n\
         <input type=\"file\" id=\"file\" name=\"file\" accept=\"application/pdf,.pdf\" required>\n\
         <label for=\"markers\">Markers (one per line)</label>\n\
         <textarea id=\"markers\" name=\"markers\" rows=\"6\">{markers}</textarea>\n\
         <label><input type=\"checkbox\" name=\"use_regex\"{use_regex}> Use regex pattern instead</label>\n\
         <input type=\"text\" name=\"regex\" placeholder=\"Faktura\\s+br\\.\\s*\\d+\" value=\"{regex}\">\n\
         <label><input type=\"checkbox\" name=\"ignore_case\"{ignore_case}> Ignore case</label>\n\
         <label for=\"scan_chars\">Only search the first N characters of each page</label>\n\
         <input type=\"number\" id=\"scan_chars\" name=\"scan_chars\" min=\"1\" value=\"{scan_chars}\">\n\
         <p><button type=\"submit\">Split PDF</button></p>\n\
         </form>\n",
        markers = escape(&form.markers),
        use_regex = checked(form.use_regex),
        regex = escape(&form.regex),
        ignore_case = checked(form.ignore_case),
        scan_chars = escape(&form.scan_chars),
    ));

    body.push_str(
        "<h2>How to use</h2>\n<ol>\n\
         <li>Upload a PDF file containing multiple invoices (searchable text, not scans).</li>\n\
         <li>Adjust the markers that appear on the first page of every invoice, or use a regex.</li>\n\
         <li>Download the individual invoices or the complete ZIP archive.</li>\n</ol>\n",
    );

    layout("PDF Invoice Splitter", &body)
}

pub fn result_page(stem: &str, report: &SplitReport, documents: &[OutputDocument], archive: &[u8]) -> String {
    let mut body = String::new();
    let zip_name = ZipPackager::archive_name(stem);
    let zip_href = data_uri("application/zip", archive);

    body.push_str("<h1>PDF Invoice Splitter</h1>\n");
    body.push_str(&format!(
        "<p>Created {} invoice files from <strong>{}</strong> ({} pages).</p>\n",
        documents.len(),
        escape(&report.source),
        report.total_pages
    ));
    body.push_str(&format!(
        "<a class=\"primary\" download=\"{}\" href=\"{}\">Download all invoices (ZIP)</a>\n",
        escape(&zip_name),
        zip_href
    ));

    body.push_str("<table>\n<tr><th>Invoice #</th><th>File</th><th>Pages</th><th>Size (KB)</th></tr>\n");
    for document in documents {
        body.push_str(&format!(
            "<tr><td>{}</td><td><a download=\"{name}\" href=\"{href}\">{name}</a></td><td>{}</td><td>{:.2}</td></tr>\n",
            document.number,
            document.group,
            document.bytes.len() as f64 / 1024.0,
            name = escape(&document.file_name),
            href = data_uri("application/pdf", &document.bytes),
        ));
    }
    body.push_str("</table>\n<p><a href=\"/\">Split another file</a></p>\n");

    layout("Invoices ready", &body)
}

fn checked(on: bool) -> &'static str {
    if on {
        " checked"
    } else {
        ""
    }
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"R&D\"</b>"), "&lt;b&gt;&quot;R&amp;D&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_index_page_shows_error_and_values() {
        let form = FormValues {
            regex: "(unclosed".to_string(),
            use_regex: true,
            ..Default::default()
        };

        let page = index_page(&form, Some("bad <pattern>"));
        assert!(page.contains("Error: bad &lt;pattern&gt;"));
        assert!(page.contains("value=\"(unclosed\""));
        assert!(page.contains("name=\"use_regex\" checked"));
    }

    #[test]
    fn test_result_page_lists_every_invoice() {
        use crate::types::InvoiceGroup;

        let groups = vec![InvoiceGroup { start: 0, end: 2 }, InvoiceGroup { start: 2, end: 3 }];
        let report = SplitReport {
            source: "march.pdf".to_string(),
            total_pages: 3,
            boundaries: vec![0, 2],
            groups: groups.clone(),
            pages: Vec::new(),
        };
        let documents: Vec<OutputDocument> = groups
            .iter()
            .enumerate()
            .map(|(idx, group)| OutputDocument {
                number: idx + 1,
                file_name: format!("march_invoice_00{}.pdf", idx + 1),
                group: *group,
                bytes: b"%PDF".to_vec(),
            })
            .collect();

        let page = result_page("march", &report, &documents, b"PK");
        assert!(page.contains("Created 2 invoice files from <strong>march.pdf</strong> (3 pages)."));
        assert!(page.contains("download=\"march_invoices.zip\" href=\"data:application/zip;base64,UEs=\""));
        assert!(page.contains("<td>pages 1-2</td>"));
        assert!(page.contains("<td>page 3</td>"));
        assert!(page.contains("download=\"march_invoice_002.pdf\""));
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("application/pdf", b"%PDF"), "data:application/pdf;base64,JVBERg==");
    }
}
