use billcheck_ocr::EnhanceError;
use thiserror::Error;

use crate::inference::InferenceError;

/// Which public operation failed; selects the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    BillAnalysis,
    HsnLookup,
    Geolocation,
}

/// Every failure a caller can see. `Display` carries the diagnostic for logs;
/// [`AnalysisError::user_message`] is what belongs in front of a person.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("image could not be decoded: {0}")]
    ImageDecode(String),
    #[error("enhanced image could not be encoded: {0}")]
    ImageEncode(String),
    #[error("response did not match the expected shape: {0}")]
    ResponseParse(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("service error: {0}")]
    Service(String),
    #[error("analysis failed: {0}")]
    Other(String),
}

impl From<EnhanceError> for AnalysisError {
    fn from(e: EnhanceError) -> Self {
        match e {
            EnhanceError::Decode(err) => AnalysisError::ImageDecode(err.to_string()),
            EnhanceError::Encode(msg) => AnalysisError::ImageEncode(msg),
        }
    }
}

impl From<InferenceError> for AnalysisError {
    fn from(e: InferenceError) -> Self {
        match e {
            InferenceError::Network(msg) => AnalysisError::Network(msg),
            InferenceError::Service { .. } | InferenceError::Protocol(_) => {
                AnalysisError::Service(e.to_string())
            }
            InferenceError::EmptyResponse => AnalysisError::ResponseParse(e.to_string()),
            InferenceError::Rejected { .. } => AnalysisError::Other(e.to_string()),
        }
    }
}

impl AnalysisError {
    /// Short, actionable text for the given operation. Never includes the
    /// underlying diagnostic.
    pub fn user_message(&self, op: Operation) -> String {
        match (self, op) {
            (AnalysisError::Validation(msg), _) => msg.clone(),
            (AnalysisError::ImageDecode(_), _) => {
                "One of the images could not be read. Please upload a JPEG or PNG photo.".into()
            }
            (AnalysisError::ImageEncode(_), _) => {
                "The image could not be prepared for analysis. Please try a different photo.".into()
            }
            (AnalysisError::ResponseParse(_), Operation::BillAnalysis) => {
                "Could not read the bill from the image. Please try again with a clearer, well-lit image.".into()
            }
            (AnalysisError::ResponseParse(_), Operation::HsnLookup) => {
                "The service couldn't understand the item. Please try a more specific name.".into()
            }
            (AnalysisError::Network(_), Operation::HsnLookup) => {
                "Service unavailable due to a network error. Please try again later.".into()
            }
            (AnalysisError::Network(_), Operation::BillAnalysis) => {
                "Network error. Please check your connection and try again.".into()
            }
            (AnalysisError::Service(_), Operation::BillAnalysis) => {
                "An API error occurred during analysis. The service may be busy.".into()
            }
            (_, Operation::Geolocation) => {
                "Could not determine state from your location via the API.".into()
            }
            (_, Operation::HsnLookup) => {
                "Could not retrieve HSN/SAC information for this item.".into()
            }
            (_, Operation::BillAnalysis) => {
                "The bill could not be analyzed. Please try again.".into()
            }
        }
    }
}
