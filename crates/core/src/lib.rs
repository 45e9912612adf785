pub mod bill;
pub mod config;
pub mod hsn;
pub mod jurisdiction;
pub mod money;

pub use bill::{AnalysisResult, AnalysisSnapshot, BillItem, OverallStatus, ShapeViolation, ValidationStatus};
pub use config::{ConfigError, EnhanceSettings, InferenceSettings, OcrSettings, Settings};
pub use hsn::HsnResult;
pub use jurisdiction::{Jurisdiction, UnknownJurisdiction};
pub use money::Rupees;
