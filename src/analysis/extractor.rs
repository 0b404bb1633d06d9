//! Text extraction from uploaded documents.
//!
//! PDFs go through pdftotext (Poppler) page by page, Word documents are read
//! straight out of their zip container, plain text is decoded as UTF-8.

use std::io::{Cursor, Read};
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::TempDir;
use thiserror::Error;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Kind of source an analysis request was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Docx,
    PlainText,
    /// Text supplied directly in a request body.
    RawString,
}

impl SourceKind {
    /// Map a declared MIME type (parameters ignored) to a source kind.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match essence(mime_type).as_str() {
            MIME_PDF => Some(Self::Pdf),
            MIME_DOCX => Some(Self::Docx),
            MIME_TEXT => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::PlainText => "plaintext",
            Self::RawString => "raw",
        }
    }
}

/// Strip MIME parameters (`text/plain; charset=utf-8` -> `text/plain`).
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix, stderr
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Text extractor for in-memory uploads.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract plain text from a file buffer based on its declared MIME type.
    pub fn extract(&self, bytes: &[u8], mime_type: &str) -> Result<String, ExtractionError> {
        match SourceKind::from_mime(mime_type) {
            Some(SourceKind::Pdf) => self.extract_pdf(bytes),
            Some(SourceKind::Docx) => extract_docx(bytes),
            Some(SourceKind::PlainText) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            _ => Err(ExtractionError::UnsupportedFileType(mime_type.to_string())),
        }
    }

    /// Extract a PDF page by page, joining pages with a newline.
    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let temp_dir = TempDir::new()?;
        let pdf_path = temp_dir.path().join("upload.pdf");
        std::fs::write(&pdf_path, bytes)?;

        let page_count = match self.get_pdf_page_count(&pdf_path) {
            Some(count) if count > 0 => count,
            _ => {
                tracing::debug!("pdfinfo gave no page count, extracting whole document");
                return self.run_pdftotext(&pdf_path, None);
            }
        };

        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            pages.push(self.run_pdftotext(&pdf_path, Some(page))?);
        }
        Ok(pages.join("\n"))
    }

    /// Run pdftotext on the whole file or a single page.
    fn run_pdftotext(&self, file_path: &Path, page: Option<u32>) -> Result<String, ExtractionError> {
        let mut cmd = Command::new("pdftotext");
        cmd.args(["-enc", "UTF-8"]);
        if let Some(page) = page {
            let page_str = page.to_string();
            cmd.args(["-f", &page_str, "-l", &page_str]);
        }
        let output = cmd.arg(file_path).arg("-").output();

        let prefix = match page {
            Some(p) => format!("pdftotext failed on page {}", p),
            None => "pdftotext failed".to_string(),
        };
        handle_cmd_output(output, "pdftotext (install poppler-utils)", &prefix)
    }

    /// Get the page count of a PDF.
    fn get_pdf_page_count(&self, file_path: &Path) -> Option<u32> {
        let output = Command::new("pdfinfo").arg(file_path).output().ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .lines()
            .find(|line| line.starts_with("Pages:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|s| s.parse().ok())
    }

    /// Check if required tools are available.
    pub fn check_tools() -> Vec<(String, bool)> {
        ["pdftotext", "pdfinfo"]
            .iter()
            .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
            .collect()
    }
}

/// Pull the text runs out of `word/document.xml`.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::ExtractionFailed(format!("not a Word document: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::ExtractionFailed(format!("missing document body: {}", e)))?
        .read_to_string(&mut xml)?;

    Ok(docx_xml_to_text(&xml))
}

// <w:t> runs, paragraph ends, tabs and breaks. <w:tbl>, <w:tc> etc. never match.
static DOCX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|</w:p>|<w:tab/>|<w:br/>|<w:cr/>")
        .expect("static regex")
});

fn docx_xml_to_text(xml: &str) -> String {
    let mut text = String::new();
    for cap in DOCX_TOKEN.captures_iter(xml) {
        match cap.get(1) {
            Some(run) => text.push_str(&decode_entities(run.as_str())),
            None => match &cap[0] {
                "</w:p>" => text.push('\n'),
                "<w:tab/>" => text.push('\t'),
                _ => text.push('\n'),
            },
        }
    }
    text.trim_end().to_string()
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
