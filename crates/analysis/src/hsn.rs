use std::sync::{Arc, OnceLock};

use billcheck_core::HsnResult;
use regex::Regex;
use tracing::info;

use crate::error::AnalysisError;
use crate::inference::{InferenceClient, Segment};
use crate::invoker::generate_structured;

pub const MIN_QUERY_CHARS: usize = 3;

fn re_prompt_syntax() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"[`<>{}]").expect("invalid regex"))
}

/// Removes characters that could break out of the quoted item name.
pub fn sanitize_item_name(input: &str) -> String {
    re_prompt_syntax().replace_all(input, "").trim().to_string()
}

/// Looks up the HSN/SAC code and GST rates for one free-text item.
#[derive(Clone)]
pub struct HsnLookup {
    client: Arc<dyn InferenceClient>,
}

impl HsnLookup {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    pub async fn lookup(&self, item_name: &str) -> Result<HsnResult, AnalysisError> {
        if item_name.trim().chars().count() < MIN_QUERY_CHARS {
            return Err(AnalysisError::Validation(format!(
                "Please enter at least {MIN_QUERY_CHARS} characters."
            )));
        }
        let item = sanitize_item_name(item_name);
        if item.is_empty() {
            return Err(AnalysisError::Validation("Invalid item name provided.".into()));
        }

        let result: HsnResult =
            generate_structured(self.client.as_ref(), vec![Segment::Text(prompt(&item))]).await?;
        info!(item = %item, code = %result.code, "HSN lookup complete");
        Ok(result)
    }
}

fn prompt(item: &str) -> String {
    format!(
        "You are an Indian GST tax expert. For the item \"{item}\", provide its most relevant HSN or SAC code and associated tax details. Find the most common HSN code, its official description, the typical IGST, CGST, and SGST rates, and a brief note on any common exemptions or special conditions. Return the data in the specified JSON format."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{InferenceError, MockInference};
    use crate::schema;

    const REPLY: &str = r#"{"code":"0902","description":"Tea, whether or not flavoured","igst":"5%","cgst":"2.5%","sgst":"2.5%","details":"No specific exemptions or conditions."}"#;

    #[tokio::test]
    async fn short_query_rejected_without_network() {
        let mock = Arc::new(MockInference::replying(REPLY));
        let err = HsnLookup::new(mock.clone()).lookup(" ab ").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn injected_markup_is_stripped() {
        let mock = Arc::new(MockInference::replying(REPLY));
        HsnLookup::new(mock.clone())
            .lookup("<script>bad</script>")
            .await
            .unwrap();
        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        let text = sent[0].text();
        for c in ['`', '<', '>', '{', '}'] {
            assert!(!text.contains(c), "found {c:?} in prompt");
        }
        assert!(text.contains("\"scriptbad/script\""));
        assert_eq!(sent[0].response_schema, Some(schema::hsn_lookup()));
    }

    #[tokio::test]
    async fn only_markup_is_invalid() {
        let mock = Arc::new(MockInference::replying(REPLY));
        let err = HsnLookup::new(mock.clone()).lookup("{<>}").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn conforming_reply_is_returned() {
        let mock = Arc::new(MockInference::replying(REPLY));
        let result = HsnLookup::new(mock).lookup("green tea").await.unwrap();
        assert_eq!(
            result,
            HsnResult {
                code: "0902".into(),
                description: "Tea, whether or not flavoured".into(),
                igst: "5%".into(),
                cgst: "2.5%".into(),
                sgst: "2.5%".into(),
                details: "No specific exemptions or conditions.".into(),
            }
        );
    }

    #[tokio::test]
    async fn incomplete_reply_is_parse_error() {
        let mock = Arc::new(MockInference::replying(r#"{"code":"0902","igst":"5%"}"#));
        let err = HsnLookup::new(mock).lookup("green tea").await.unwrap_err();
        assert!(matches!(err, AnalysisError::ResponseParse(_)));
    }

    #[tokio::test]
    async fn prose_reply_is_parse_error() {
        let mock = Arc::new(MockInference::replying("HSN 0902 applies to tea, taxed at 5%."));
        let err = HsnLookup::new(mock).lookup("green tea").await.unwrap_err();
        assert!(matches!(err, AnalysisError::ResponseParse(_)));
    }

    #[tokio::test]
    async fn network_failure_is_classified() {
        let mock = Arc::new(MockInference::failing(InferenceError::Network("dns".into())));
        let err = HsnLookup::new(mock.clone()).lookup("green tea").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Network(_)));
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn sanitize_trims_after_stripping() {
        assert_eq!(sanitize_item_name("  `{rice}`  "), "rice");
        assert_eq!(sanitize_item_name("Dal <b>Tadka</b>"), "Dal bTadka/b");
    }
}
