use std::fmt;
use std::sync::Arc;

use billcheck_core::AnalysisResult;
use billcheck_ocr::{
    EnhancedImage, ExtractedText, ImageEnhancer, OcrBackend, RawImage, TextExtractor,
};
use tracing::info;

use crate::error::AnalysisError;
use crate::inference::InferenceClient;
use crate::invoker::AnalysisInvoker;
use crate::prompt::{parse_jurisdiction, PromptAssembler};

/// Progress milestones reported to the caller, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    EnhancingImages,
    ExtractingText,
    Validating,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::EnhancingImages => "Optimizing image quality...",
            Stage::ExtractingText => "Extracting text from bill (OCR)...",
            Stage::Validating => "Validating with AI expert...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Orchestrates: enhance (concurrently) → OCR (one session) → assemble →
/// invoke. Holds no per-request state, so one analyzer can serve many
/// independent requests. Image filtering and OCR run on the blocking pool.
pub struct BillAnalyzer<B: OcrBackend> {
    enhancer: ImageEnhancer,
    extractor: Arc<TextExtractor<B>>,
    invoker: AnalysisInvoker,
}

impl<B: OcrBackend + 'static> BillAnalyzer<B> {
    pub fn new(enhancer: ImageEnhancer, ocr: B, client: Arc<dyn InferenceClient>) -> Self {
        Self {
            enhancer,
            extractor: Arc::new(TextExtractor::new(ocr)),
            invoker: AnalysisInvoker::new(client),
        }
    }

    pub fn extractor(&self) -> &TextExtractor<B> {
        &self.extractor
    }

    /// Analyze every photo of one bill for a buyer in `jurisdiction`.
    ///
    /// OCR failures degrade to image-only analysis; any other failure ends the
    /// request with a classified error.
    pub async fn analyze<F>(
        &self,
        images: &[RawImage],
        jurisdiction: &str,
        mut progress: F,
    ) -> Result<AnalysisResult, AnalysisError>
    where
        F: FnMut(Stage),
    {
        if images.is_empty() {
            return Err(AnalysisError::Validation("No images provided for analysis.".into()));
        }
        let jurisdiction = parse_jurisdiction(jurisdiction)?;
        info!(pages = images.len(), %jurisdiction, "starting bill analysis");

        progress(Stage::EnhancingImages);
        let enhanced = self.enhance_all(images).await?;

        progress(Stage::ExtractingText);
        let (enhanced, text) = self.extract_text(enhanced).await?;

        progress(Stage::Validating);
        let request = PromptAssembler::assemble_for(jurisdiction, &text.joined(), &enhanced);
        drop(enhanced);
        self.invoker.invoke(request).await
    }

    /// Each image is independent, so they are filtered in parallel on the
    /// blocking pool. Results come back in input order.
    async fn enhance_all(&self, images: &[RawImage]) -> Result<Vec<EnhancedImage>, AnalysisError> {
        let handles: Vec<_> = images
            .iter()
            .cloned()
            .map(|raw| {
                let enhancer = self.enhancer;
                tokio::task::spawn_blocking(move || enhancer.enhance(&raw))
            })
            .collect();

        let mut enhanced = Vec::with_capacity(handles.len());
        for handle in handles {
            let image = handle
                .await
                .map_err(|e| AnalysisError::Other(format!("enhancement task failed: {e}")))??;
            enhanced.push(image);
        }
        Ok(enhanced)
    }

    /// The whole OCR session lives on one blocking thread, from start to drop.
    async fn extract_text(
        &self,
        enhanced: Vec<EnhancedImage>,
    ) -> Result<(Vec<EnhancedImage>, ExtractedText), AnalysisError> {
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || {
            let text = extractor.extract(&enhanced);
            (enhanced, text)
        })
        .await
        .map_err(|e| AnalysisError::Other(format!("text extraction task failed: {e}")))
    }
}
