//! Extraction processor
//!
//! Opens a PDF, walks its pages in order and joins their text under
//! `--- PAGE N ---` headers.

use crate::errors::ExtractionError;
use crate::pdf::{clean_page_text, PdfDocument, PdfOpener};
use importkit_common::metrics;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Text of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

/// Text of a whole document, in page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub page_count: u32,
    pub pages: Vec<PageText>,
}

impl ExtractedText {
    /// Join all pages, each preceded by its delimiter header
    pub fn render(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            out.push_str(&page_header(page.number));
            out.push('\n');
            out.push_str(&page.text);
            out.push_str("\n\n");
        }
        out
    }
}

/// Delimiter line placed before each page
pub fn page_header(number: u32) -> String {
    format!("--- PAGE {} ---", number)
}

/// Extraction processor
pub struct Extractor {
    opener: Arc<dyn PdfOpener>,
}

impl Extractor {
    pub fn new(opener: Arc<dyn PdfOpener>) -> Self {
        Self { opener }
    }

    /// Extract every page of the PDF at `path`
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError> {
        let start = Instant::now();
        let result = self.extract_inner(path);

        match &result {
            Ok(extracted) => {
                info!(
                    page_count = extracted.page_count,
                    pages = extracted.pages.len(),
                    chars = extracted.pages.iter().map(|p| p.text.len()).sum::<usize>(),
                    "Extraction complete"
                );
                metrics::record_extraction(
                    start.elapsed().as_secs_f64(),
                    extracted.pages.len(),
                    true,
                );
            }
            Err(e) => {
                warn!(error = %e, "Extraction failed");
                metrics::record_extraction(start.elapsed().as_secs_f64(), 0, false);
            }
        }

        result
    }

    fn extract_inner(&self, path: &Path) -> Result<ExtractedText, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::NotFound {
                path: path.display().to_string(),
            });
        }

        let document = self.opener.open(path)?;
        let page_count = document.page_count();
        info!(page_count, "PDF opened");

        let pages = Self::pages(document.as_ref()).collect::<Result<Vec<_>, _>>()?;

        Ok(ExtractedText { page_count, pages })
    }

    /// Lazy pass over the pages; a page is only read when the iterator reaches it
    pub fn pages<'a>(
        document: &'a dyn PdfDocument,
    ) -> impl Iterator<Item = Result<PageText, ExtractionError>> + 'a {
        (1..=document.page_count()).map(move |number| {
            document.page_text(number).map(|raw| {
                let text = clean_page_text(&raw);
                debug!(page = number, chars = text.len(), "Page extracted");
                PageText { number, text }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::LopdfOpener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory document; `None` entries fail when read
    struct StubDocument {
        pages: Vec<Option<String>>,
        reads: Arc<Mutex<Vec<u32>>>,
    }

    impl PdfDocument for StubDocument {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn page_text(&self, number: u32) -> Result<String, ExtractionError> {
            self.reads.lock().unwrap().push(number);
            self.pages[(number - 1) as usize]
                .clone()
                .ok_or_else(|| ExtractionError::Page {
                    page: number,
                    message: "unsupported font encoding".to_string(),
                })
        }
    }

    struct StubOpener {
        pages: Vec<Option<String>>,
        opens: AtomicUsize,
        reads: Arc<Mutex<Vec<u32>>>,
    }

    impl StubOpener {
        fn new(pages: Vec<Option<&str>>) -> Arc<Self> {
            Arc::new(Self {
                pages: pages.into_iter().map(|p| p.map(String::from)).collect(),
                opens: AtomicUsize::new(0),
                reads: Arc::new(Mutex::new(Vec::new())),
            })
        }
    }

    impl PdfOpener for StubOpener {
        fn open(&self, _path: &Path) -> Result<Box<dyn PdfDocument>, ExtractionError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubDocument {
                pages: self.pages.clone(),
                reads: self.reads.clone(),
            }))
        }
    }

    fn existing_file() -> tempfile::NamedTempFile {
        tempfile::Builder::new().suffix(".pdf").tempfile().unwrap()
    }

    #[test]
    fn test_page_headers_in_order() {
        let file = existing_file();
        let opener = StubOpener::new(vec![Some("T"); 4]);
        let extractor = Extractor::new(opener.clone());

        let extracted = extractor.extract(file.path()).unwrap();
        let rendered = extracted.render();

        assert_eq!(extracted.page_count, 4);
        let positions: Vec<usize> = (1..=4)
            .map(|n| rendered.find(&page_header(n)).expect("header missing"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(rendered.matches("--- PAGE ").count(), 4);
        assert_eq!(rendered.matches("\nT\n").count(), 4);
    }

    #[test]
    fn test_each_page_text_once_in_order() {
        let file = existing_file();
        let opener = StubOpener::new(vec![Some("alpha"), Some("beta"), Some("gamma")]);
        let extractor = Extractor::new(opener);

        let rendered = extractor.extract(file.path()).unwrap().render();

        assert_eq!(
            rendered,
            "--- PAGE 1 ---\nalpha\n\n--- PAGE 2 ---\nbeta\n\n--- PAGE 3 ---\ngamma\n\n"
        );
    }

    #[test]
    fn test_missing_path_skips_capability() {
        let dir = tempfile::tempdir().unwrap();
        let opener = StubOpener::new(vec![Some("never")]);
        let extractor = Extractor::new(opener.clone());

        let err = extractor.extract(&dir.path().join("documento.pdf")).unwrap_err();

        assert!(matches!(err, ExtractionError::NotFound { ref path } if path.ends_with("documento.pdf")));
        assert_eq!(opener.opens.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_page_failure_is_single_error() {
        let file = existing_file();
        let opener = StubOpener::new(vec![Some("ok"), None, Some("unreached")]);
        let extractor = Extractor::new(opener.clone());

        let err = extractor.extract(file.path()).unwrap_err();

        assert!(matches!(err, ExtractionError::Page { page: 2, .. }));
        assert!(err.to_string().contains("unsupported font encoding"));
        assert_eq!(*opener.reads.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_empty_document() {
        let file = existing_file();
        let extractor = Extractor::new(StubOpener::new(Vec::new()));

        let extracted = extractor.extract(file.path()).unwrap();

        assert_eq!(extracted.page_count, 0);
        assert_eq!(extracted.render(), "");
    }

    #[test]
    fn test_lopdf_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        crate::pdf::tests::write_pdf(&path, &["Locatarios", "Proprietarios"]);

        let rendered = Extractor::new(Arc::new(LopdfOpener))
            .extract(&path)
            .unwrap()
            .render();

        let first = rendered.find("--- PAGE 1 ---").unwrap();
        let second = rendered.find("--- PAGE 2 ---").unwrap();
        let loc = rendered.find("Locatarios").unwrap();
        let prop = rendered.find("Proprietarios").unwrap();
        assert!(first < loc && loc < second && second < prop);
    }
}
