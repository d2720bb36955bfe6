
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::{DocQaError, Result};

/// The full extracted text of one uploaded document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    text: String,
}

impl Document {
    #[inline]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Join page texts in page order; pages without text contribute nothing
    #[inline]
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            text: pages.into_iter().flatten().collect(),
        }
    }

    /// Load a document from disk: PDF files by extension, anything else as UTF-8 text
    #[inline]
    pub fn load(path: &Path) -> Result<Self> {
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        let document = if is_pdf {
            let bytes = fs::read(path).map_err(|e| {
                DocQaError::Document(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Self::from_pdf_bytes(&bytes)
                .map_err(|e| DocQaError::Document(format!("{}: {}", path.display(), e)))?
        } else {
            let text = fs::read_to_string(path).map_err(|e| {
                DocQaError::Document(format!("Failed to read {}: {}", path.display(), e))
            })?;
            Self::from_text(text)
        };

        info!(
            "Loaded {} ({} characters)",
            path.display(),
            document.char_len()
        );
        Ok(document)
    }

    /// Extract the text of every page of a PDF
    #[inline]
    pub fn from_pdf_bytes(bytes: &[u8]) -> Result<Self> {
        let pdf = lopdf::Document::load_mem(bytes)
            .map_err(|e| DocQaError::Document(format!("Failed to load PDF: {}", e)))?;

        let pages = pdf.get_pages();
        debug!("Extracting text from {} PDF pages", pages.len());

        let page_texts = pages.keys().map(|&page_number| {
            match pdf.extract_text(&[page_number]) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(
                        "Failed to extract text from page {}, skipping: {}",
                        page_number, e
                    );
                    None
                }
            }
        });

        Ok(Self::from_pages(page_texts))
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    #[inline]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
