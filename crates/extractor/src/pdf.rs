//! PDF reading module
//!
//! The extractor only sees [`PdfOpener`] and [`PdfDocument`]; the lopdf-backed
//! implementation lives here.

use crate::errors::ExtractionError;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// An opened, read-only PDF
pub trait PdfDocument {
    /// Number of pages
    fn page_count(&self) -> u32;

    /// Best-effort text of a 1-based page
    fn page_text(&self, number: u32) -> Result<String, ExtractionError>;
}

/// Opens PDF files
pub trait PdfOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, ExtractionError>;
}

/// Opener backed by lopdf
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfOpener;

impl PdfOpener for LopdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, ExtractionError> {
        // The handle is released when this function returns, parsed or not.
        let file = File::open(path)?;
        let doc = lopdf::Document::load_from(BufReader::new(file)).map_err(|e| {
            ExtractionError::Open {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Box::new(LopdfDocument::new(doc)))
    }
}

/// lopdf document wrapper
pub struct LopdfDocument {
    doc: lopdf::Document,
    page_count: u32,
}

impl LopdfDocument {
    pub fn new(doc: lopdf::Document) -> Self {
        let page_count = doc.get_pages().len() as u32;
        debug!(page_count, version = %doc.version, "PDF loaded");
        Self { doc, page_count }
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_text(&self, number: u32) -> Result<String, ExtractionError> {
        if number == 0 || number > self.page_count {
            return Err(ExtractionError::Page {
                page: number,
                message: format!("page out of range (document has {})", self.page_count),
            });
        }

        self.doc
            .extract_text(&[number])
            .map_err(|e| ExtractionError::Page {
                page: number,
                message: e.to_string(),
            })
    }
}

/// Clean extracted page text
///
/// Normalizes line endings, drops BOMs and trailing whitespace, and trims
/// blank lines at both ends. Line structure inside the page is kept.
pub fn clean_page_text(text: &str) -> String {
    let normalized = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{FEFF}', "");

    normalized
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}
