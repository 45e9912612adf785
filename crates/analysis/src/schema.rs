//! Response schemas sent alongside structured requests. The matching Rust
//! types in `billcheck-core` enforce the same shape when the reply is parsed:
//! a field listed as required here has no serde default there.

use billcheck_core::ValidationStatus;
use serde_json::{json, Value};

pub fn bill_analysis() -> Value {
    let statuses: Vec<&str> = ValidationStatus::ALL.iter().map(|s| s.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "overallStatus": { "type": "STRING", "enum": ["VERIFIED", "ISSUES_FOUND"] },
            "storeName": { "type": "STRING" },
            "billDate": { "type": "STRING" },
            "totalTax": { "type": "NUMBER" },
            "totalAmount": { "type": "NUMBER" },
            "items": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "itemName": { "type": "STRING" },
                        "quantity": { "type": "NUMBER" },
                        "price": { "type": "NUMBER" },
                        "total": { "type": "NUMBER" },
                        "taxAmount": { "type": "NUMBER" },
                        "status": { "type": "STRING", "enum": statuses },
                        "suggestion": {
                            "type": "STRING",
                            "description": "Format as \"Rule: [The rule]. Action: [The suggested action].\""
                        }
                    },
                    "required": ["itemName", "quantity", "price", "total", "taxAmount", "status"]
                }
            }
        },
        "required": ["overallStatus", "storeName", "billDate", "totalTax", "totalAmount", "items"]
    })
}

pub fn hsn_lookup() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "code": {
                "type": "STRING",
                "description": "The most relevant 4 or 8-digit HSN/SAC code."
            },
            "description": {
                "type": "STRING",
                "description": "Official description for this HSN/SAC code."
            },
            "igst": {
                "type": "STRING",
                "description": "The typical IGST rate as a percentage, e.g., '18%'."
            },
            "cgst": {
                "type": "STRING",
                "description": "The typical CGST rate as a percentage, e.g., '9%'."
            },
            "sgst": {
                "type": "STRING",
                "description": "The typical SGST rate as a percentage, e.g., '9%'."
            },
            "details": {
                "type": "STRING",
                "description": "Brief, important details: common exemptions, special conditions, or whether the rate changes often. If none, state 'No specific exemptions or conditions.'."
            }
        },
        "required": ["code", "description", "igst", "cgst", "sgst", "details"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use billcheck_core::{AnalysisResult, HsnResult, OverallStatus, Rupees};

    fn required(schema: &Value) -> Vec<String> {
        schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn analysis_required_fields_match_serialized_type() {
        let sample = AnalysisResult {
            overall_status: OverallStatus::Verified,
            store_name: "S".into(),
            bill_date: "D".into(),
            total_tax: Rupees::zero(),
            total_amount: Rupees::zero(),
            items: vec![],
        };
        let value = serde_json::to_value(&sample).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        let mut req = required(&bill_analysis());
        keys.sort();
        req.sort();
        assert_eq!(keys, req);
    }

    #[test]
    fn status_enum_lists_every_variant() {
        let schema = bill_analysis();
        let statuses = schema["properties"]["items"]["items"]["properties"]["status"]["enum"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(statuses, ValidationStatus::ALL.len());
    }

    #[test]
    fn hsn_requires_all_six_fields() {
        let sample = HsnResult {
            code: String::new(),
            description: String::new(),
            igst: String::new(),
            cgst: String::new(),
            sgst: String::new(),
            details: String::new(),
        };
        let value = serde_json::to_value(&sample).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        let mut req = required(&hsn_lookup());
        keys.sort();
        req.sort();
        assert_eq!(keys, req);
    }
}
