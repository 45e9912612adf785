use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Rupees;

/// Per-item verdict assigned by the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Correct,
    IncorrectCalculation,
    IncorrectTaxSlab,
    Suspicious,
    MissingInfo,
    Unknown,
}

impl ValidationStatus {
    pub const ALL: [ValidationStatus; 6] = [
        ValidationStatus::Correct,
        ValidationStatus::IncorrectCalculation,
        ValidationStatus::IncorrectTaxSlab,
        ValidationStatus::Suspicious,
        ValidationStatus::MissingInfo,
        ValidationStatus::Unknown,
    ];

    /// Wire value, e.g. `INCORRECT_TAX_SLAB`.
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Correct => "CORRECT",
            ValidationStatus::IncorrectCalculation => "INCORRECT_CALCULATION",
            ValidationStatus::IncorrectTaxSlab => "INCORRECT_TAX_SLAB",
            ValidationStatus::Suspicious => "SUSPICIOUS",
            ValidationStatus::MissingInfo => "MISSING_INFO",
            ValidationStatus::Unknown => "UNKNOWN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValidationStatus::Correct => "Correct",
            ValidationStatus::IncorrectCalculation => "Incorrect calculation",
            ValidationStatus::IncorrectTaxSlab => "Incorrect tax slab",
            ValidationStatus::Suspicious => "Suspicious",
            ValidationStatus::MissingInfo => "Missing info",
            ValidationStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Verified,
    IssuesFound,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Verified => "VERIFIED",
            OverallStatus::IssuesFound => "ISSUES_FOUND",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub item_name: String,
    pub quantity: Decimal,
    pub price: Rupees,
    pub total: Rupees,
    pub tax_amount: Rupees,
    pub status: ValidationStatus,
    /// Formatted as "Rule: …. Action: …" when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl BillItem {
    /// Splits the suggestion into its rule and action halves.
    pub fn rule_and_action(&self) -> Option<(&str, &str)> {
        let s = self.suggestion.as_deref()?.trim();
        let rest = s.strip_prefix("Rule:")?;
        let idx = rest.find("Action:")?;
        let rule = rest[..idx].trim().trim_end_matches('.').trim();
        let action = rest[idx + "Action:".len()..].trim();
        Some((rule, action))
    }
}

/// The itemized, tax-checked report for one bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub overall_status: OverallStatus,
    pub store_name: String,
    pub bill_date: String,
    pub total_tax: Rupees,
    pub total_amount: Rupees,
    pub items: Vec<BillItem>,
}

/// A structural rule the deserialized shape alone cannot express.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeViolation {
    #[error("negative value in '{0}'")]
    Negative(String),
    #[error("no line items reported alongside ISSUES_FOUND")]
    IssuesWithoutItems,
}

impl AnalysisResult {
    pub fn is_verified(&self) -> bool {
        self.overall_status == OverallStatus::Verified
    }

    /// Items whose status is anything other than CORRECT.
    pub fn flagged_items(&self) -> impl Iterator<Item = &BillItem> {
        self.items
            .iter()
            .filter(|item| item.status != ValidationStatus::Correct)
    }

    pub fn check_shape(&self) -> Result<(), ShapeViolation> {
        if self.total_tax.is_negative() {
            return Err(ShapeViolation::Negative("totalTax".into()));
        }
        if self.total_amount.is_negative() {
            return Err(ShapeViolation::Negative("totalAmount".into()));
        }
        for (idx, item) in self.items.iter().enumerate() {
            let negative = [
                ("quantity", item.quantity.is_sign_negative() && !item.quantity.is_zero()),
                ("price", item.price.is_negative()),
                ("total", item.total.is_negative()),
                ("taxAmount", item.tax_amount.is_negative()),
            ];
            if let Some((field, _)) = negative.iter().find(|(_, neg)| *neg) {
                return Err(ShapeViolation::Negative(format!("items[{idx}].{field}")));
            }
        }
        if self.items.is_empty() && self.overall_status == OverallStatus::IssuesFound {
            return Err(ShapeViolation::IssuesWithoutItems);
        }
        Ok(())
    }

    /// Best-effort parse of `bill_date` using formats common on Indian receipts
    /// (day first).
    pub fn parsed_bill_date(&self) -> Option<NaiveDate> {
        // Two-digit years first: `%Y` would happily read "24" as year 24.
        const FORMATS: [&str; 8] = [
            "%d/%m/%y", "%d-%m-%y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d",
            "%d %b %Y", "%d-%b-%Y",
        ];
        let raw = self.bill_date.trim();
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }
}

/// A timestamped copy of a finished analysis, for callers that keep history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl AnalysisSnapshot {
    pub fn capture(result: AnalysisResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            result,
        }
    }
}
