use serde::{Deserialize, Serialize};

/// HSN/SAC classification for a single item with its typical GST rates.
/// Rates are kept as the strings the engine reports, e.g. `"18%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsnResult {
    pub code: String,
    pub description: String,
    pub igst: String,
    pub cgst: String,
    pub sgst: String,
    pub details: String,
}
