use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use billcheck_core::OcrSettings;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available: build with the `tesseract` feature")]
    NotAvailable,
}

/// An OCR engine that can open recognition sessions.
///
/// A session is the expensive part (language data loaded, parameters set), so
/// callers open one per bill and feed it every page. Dropping the session
/// releases the engine.
pub trait OcrBackend: Send + Sync {
    fn start_session(&self) -> Result<Box<dyn OcrSession + '_>, OcrError>;
}

pub trait OcrSession {
    /// Recognize one encoded image (JPEG/PNG bytes).
    fn recognize(&mut self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

// ── Scripted backend (always available, used for tests) ──────────────────────

/// Replays a fixed list of per-page outcomes in order, without needing
/// Tesseract installed. Pages past the end of the script recognize as empty
/// text. Tracks how many sessions are currently open.
#[derive(Debug, Default)]
pub struct ScriptedRecognizer {
    pages: Mutex<VecDeque<Result<String, OcrError>>>,
    fail_start: bool,
    open_sessions: AtomicUsize,
    sessions_started: AtomicUsize,
}

impl ScriptedRecognizer {
    pub fn new<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = Result<String, OcrError>>,
    {
        Self {
            pages: Mutex::new(pages.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Every page succeeds with the given text.
    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(t.into())))
    }

    /// A backend whose sessions never start.
    pub fn unavailable() -> Self {
        Self { fail_start: true, ..Self::default() }
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn sessions_started(&self) -> usize {
        self.sessions_started.load(Ordering::SeqCst)
    }
}

impl OcrBackend for ScriptedRecognizer {
    fn start_session(&self) -> Result<Box<dyn OcrSession + '_>, OcrError> {
        if self.fail_start {
            return Err(OcrError::NotAvailable);
        }
        self.sessions_started.fetch_add(1, Ordering::SeqCst);
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession { owner: self }))
    }
}

struct ScriptedSession<'a> {
    owner: &'a ScriptedRecognizer,
}

impl OcrSession for ScriptedSession<'_> {
    fn recognize(&mut self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        let mut pages = self
            .owner
            .pages
            .lock()
            .map_err(|_| OcrError::Engine("script lock poisoned".into()))?;
        pages.pop_front().unwrap_or_else(|| Ok(String::new()))
    }
}

impl Drop for ScriptedSession<'_> {
    fn drop(&mut self) {
        self.owner.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

/// Builds the configured backend: Tesseract when compiled in, otherwise a
/// backend that reports [`OcrError::NotAvailable`] so every page degrades.
pub fn default_backend(settings: &OcrSettings) -> Box<dyn OcrBackend> {
    #[cfg(feature = "tesseract")]
    {
        Box::new(tesseract_backend::TesseractRecognizer::new(settings.clone()))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        let _ = settings;
        Box::new(ScriptedRecognizer::unavailable())
    }
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn start_session(&self) -> Result<Box<dyn OcrSession + '_>, OcrError> {
        (**self).start_session()
    }
}

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError, OcrSession};
    use billcheck_core::OcrSettings;
    use leptess::{LepTess, Variable};

    pub struct TesseractRecognizer {
        settings: OcrSettings,
    }

    impl TesseractRecognizer {
        pub fn new(settings: OcrSettings) -> Self {
            Self { settings }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn start_session(&self) -> Result<Box<dyn OcrSession + '_>, OcrError> {
            let data_path = self
                .settings
                .data_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned());
            let mut lt = LepTess::new(data_path.as_deref(), &self.settings.languages)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(
                Variable::TesseditPagesegMode,
                &self.settings.page_seg_mode.to_string(),
            )
            .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_variable(Variable::TesseditCharWhitelist, &self.settings.char_whitelist)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            Ok(Box::new(TesseractSession { lt }))
        }
    }

    /// Owns the engine handle; dropping it terminates the Tesseract instance.
    struct TesseractSession {
        lt: LepTess,
    }

    impl OcrSession for TesseractSession {
        fn recognize(&mut self, image_bytes: &[u8]) -> Result<String, OcrError> {
            self.lt
                .set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            self.lt
                .get_utf8_text()
                .map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
