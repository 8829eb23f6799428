// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents using the `lopdf`
// crate. Rendering is delegated to `render.rs`; this module only answers
// structural questions such as the page count, and tells damaged files
// apart from password-protected ones.

use std::path::Path;

use lopdf::Document;
use pagelift_core::error::PageliftError;
use tracing::{debug, info, instrument};

/// Reads structural information from an existing PDF file.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    ///
    /// Fails with [`PageliftError::EncryptedPdf`] for password-protected files
    /// and [`PageliftError::Pdf`] for anything else lopdf cannot parse.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PageliftError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let label = path_ref.display().to_string();
        let document =
            Document::load(path_ref).map_err(|err| classify_load_error(&label, &err))?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[cfg(test)]
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub(crate) fn from_bytes(data: &[u8]) -> Result<Self, PageliftError> {
        let document =
            Document::load_mem(data).map_err(|err| classify_load_error("<memory>", &err))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }
}

/// Map a lopdf load failure to the error taxonomy, separating password
/// problems from damaged files.
fn classify_load_error(label: &str, err: &lopdf::Error) -> PageliftError {
    let message = err.to_string();
    let lower = message.to_ascii_lowercase();
    if lower.contains("encrypt") || lower.contains("password") || lower.contains("decrypt") {
        PageliftError::EncryptedPdf(format!("{label}: {message}"))
    } else {
        PageliftError::Pdf(format!("failed to open {label}: {message}"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{Object, Stream, dictionary};

    /// Build an in-memory PDF with `n` blank A4 pages.
    pub(crate) fn pdf_with_pages(n: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::with_capacity(n);
        for _ in 0..n {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => n as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn counts_pages_from_memory() {
        let reader = PdfReader::from_bytes(&pdf_with_pages(3)).unwrap();
        assert_eq!(reader.page_count(), 3);
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let result = PdfReader::from_bytes(b"definitely not a pdf");
        assert!(matches!(result, Err(PageliftError::Pdf(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(PdfReader::open("/nonexistent/scan.pdf").is_err());
    }
}
