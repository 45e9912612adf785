use tracing::{info, warn};

use crate::recognizer::OcrBackend;
use crate::types::EnhancedImage;

/// Stands in for a page whose OCR failed, so the analysis can still proceed
/// from the image alone.
pub const OCR_UNAVAILABLE: &str = "text extraction unavailable";

/// Joins consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Per-page OCR output for one bill, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pages: Vec<PageText>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageText {
    Recognized(String),
    Unavailable,
}

impl PageText {
    pub fn as_str(&self) -> &str {
        match self {
            PageText::Recognized(text) => text,
            PageText::Unavailable => OCR_UNAVAILABLE,
        }
    }
}

impl ExtractedText {
    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }

    pub fn degraded_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p, PageText::Unavailable))
            .count()
    }

    /// All pages joined by a blank line, in input order.
    pub fn joined(&self) -> String {
        self.pages
            .iter()
            .map(PageText::as_str)
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR)
    }
}

/// Runs every page of a bill through one OCR session. Engine failures never
/// escape: a failed page, or every page when the session cannot start, is
/// replaced by [`OCR_UNAVAILABLE`].
pub struct TextExtractor<B: OcrBackend> {
    backend: B,
}

impl<B: OcrBackend> TextExtractor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn extract(&self, images: &[EnhancedImage]) -> ExtractedText {
        if images.is_empty() {
            return ExtractedText { pages: Vec::new() };
        }

        let mut session = match self.backend.start_session() {
            Ok(session) => session,
            Err(e) => {
                warn!("OCR engine unavailable, continuing with images only: {e}");
                return ExtractedText {
                    pages: vec![PageText::Unavailable; images.len()],
                };
            }
        };

        let pages = images
            .iter()
            .enumerate()
            .map(|(idx, image)| match session.recognize(&image.data) {
                Ok(text) => PageText::Recognized(tidy(&text)),
                Err(e) => {
                    warn!(page = idx + 1, "OCR failed for page: {e}");
                    PageText::Unavailable
                }
            })
            .collect::<Vec<_>>();
        drop(session);

        let extracted = ExtractedText { pages };
        info!(
            pages = images.len(),
            degraded = extracted.degraded_pages(),
            "OCR extraction finished"
        );
        extracted
    }
}

/// Drops trailing whitespace and blank lines, so the only blank lines in the
/// joined text are the page separators.
fn tidy(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{OcrError, ScriptedRecognizer};

    fn pages(n: usize) -> Vec<EnhancedImage> {
        (0..n)
            .map(|i| EnhancedImage {
                width: 1,
                height: 1,
                data: vec![i as u8],
                mime_type: "image/jpeg",
            })
            .collect()
    }

    #[test]
    fn joins_pages_in_order_with_blank_lines() {
        let ex = TextExtractor::new(ScriptedRecognizer::texts(["PAGE ONE", "PAGE TWO", "PAGE THREE"]));
        let text = ex.extract(&pages(3)).joined();
        assert_eq!(text, "PAGE ONE\n\nPAGE TWO\n\nPAGE THREE");
        assert_eq!(text.matches(PAGE_SEPARATOR).count(), 2);
    }

    #[test]
    fn failed_page_keeps_its_position() {
        let ex = TextExtractor::new(ScriptedRecognizer::new([
            Ok("FIRST".to_string()),
            Err(OcrError::Engine("timeout".into())),
            Ok("THIRD".to_string()),
        ]));
        let out = ex.extract(&pages(3));
        assert_eq!(out.degraded_pages(), 1);
        assert_eq!(out.joined(), format!("FIRST\n\n{OCR_UNAVAILABLE}\n\nTHIRD"));
    }

    #[test]
    fn unavailable_engine_degrades_every_page() {
        let ex = TextExtractor::new(ScriptedRecognizer::unavailable());
        let out = ex.extract(&pages(2));
        assert_eq!(out.pages(), &[PageText::Unavailable, PageText::Unavailable]);
        assert_eq!(out.joined().matches(PAGE_SEPARATOR).count(), 1);
    }

    #[test]
    fn one_session_per_bill_and_released() {
        let ex = TextExtractor::new(ScriptedRecognizer::new([
            Err(OcrError::Engine("bad page".into())),
            Ok("ok".to_string()),
        ]));
        ex.extract(&pages(2));
        assert_eq!(ex.backend().sessions_started(), 1);
        assert_eq!(ex.backend().open_sessions(), 0);
    }

    #[test]
    fn engine_blank_lines_do_not_add_separators() {
        let ex = TextExtractor::new(ScriptedRecognizer::texts(["A  \n\nB\n\n", "\nC\n"]));
        assert_eq!(ex.extract(&pages(2)).joined(), "A\nB\n\nC");
    }

    #[test]
    fn no_pages_no_session() {
        let ex = TextExtractor::new(ScriptedRecognizer::texts(["unused"]));
        assert_eq!(ex.extract(&[]).joined(), "");
        assert_eq!(ex.backend().sessions_started(), 0);
    }
}
