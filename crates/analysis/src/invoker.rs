use std::sync::Arc;

use billcheck_core::{AnalysisResult, HsnResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::inference::{GenerateRequest, InferenceClient, Segment};
use crate::prompt::AnalysisRequest;
use crate::schema;

/// A reply type with a declared schema. Deserialization enforces presence and
/// types; `check` covers the rules serde cannot express.
pub trait Structured: DeserializeOwned {
    fn schema() -> Value;

    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Structured for AnalysisResult {
    fn schema() -> Value {
        schema::bill_analysis()
    }

    fn check(&self) -> Result<(), String> {
        self.check_shape().map_err(|e| e.to_string())
    }
}

impl Structured for HsnResult {
    fn schema() -> Value {
        schema::hsn_lookup()
    }
}

/// One schema-constrained round trip: send, then parse strictly. Either the
/// whole value is valid or the caller gets an error.
pub(crate) async fn generate_structured<T: Structured>(
    client: &dyn InferenceClient,
    segments: Vec<Segment>,
) -> Result<T, AnalysisError> {
    let reply = client
        .generate(GenerateRequest::structured(segments, T::schema()))
        .await
        .map_err(|e| {
            warn!("inference call failed: {e}");
            AnalysisError::from(e)
        })?;
    parse_structured(&reply)
}

pub(crate) fn parse_structured<T: Structured>(reply: &str) -> Result<T, AnalysisError> {
    let value: T = serde_json::from_str(reply.trim()).map_err(|e| {
        warn!("reply did not match schema: {e}");
        AnalysisError::ResponseParse(e.to_string())
    })?;
    value.check().map_err(|e| {
        warn!("reply failed shape check: {e}");
        AnalysisError::ResponseParse(e)
    })?;
    Ok(value)
}

/// Sends an assembled bill request and returns a fully valid
/// [`AnalysisResult`]. No retry.
#[derive(Clone)]
pub struct AnalysisInvoker {
    client: Arc<dyn InferenceClient>,
}

impl AnalysisInvoker {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    pub async fn invoke(&self, request: AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let jurisdiction = request.jurisdiction;
        let result: AnalysisResult =
            generate_structured(self.client.as_ref(), request.into_segments()).await?;
        info!(
            %jurisdiction,
            status = %result.overall_status,
            items = result.items.len(),
            "bill analysis complete"
        );
        Ok(result)
    }
}
