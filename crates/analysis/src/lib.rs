pub mod error;
pub mod gemini;
pub mod geolocation;
pub mod hsn;
pub mod inference;
pub mod invoker;
pub mod pipeline;
pub mod prompt;
pub mod schema;

pub use error::{AnalysisError, Operation};
pub use gemini::Gemini;
pub use geolocation::GeolocationResolver;
pub use hsn::{sanitize_item_name, HsnLookup};
pub use inference::{
    GenerateRequest, InferenceClient, InferenceError, InferenceFuture, MockInference, Segment,
};
pub use invoker::{AnalysisInvoker, Structured};
pub use pipeline::{BillAnalyzer, Stage};
pub use prompt::{AnalysisRequest, PromptAssembler};
