pub mod enhance;
pub mod extract;
pub mod recognizer;
pub mod types;

pub use enhance::{enhance_pixels, EnhanceError, ImageEnhancer};
pub use extract::{ExtractedText, PageText, TextExtractor, OCR_UNAVAILABLE};
pub use recognizer::{default_backend, OcrBackend, OcrError, OcrSession, ScriptedRecognizer};
pub use types::{EnhancedImage, RawImage};
