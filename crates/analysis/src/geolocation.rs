use std::sync::Arc;

use billcheck_core::Jurisdiction;
use tracing::info;

use crate::error::AnalysisError;
use crate::inference::{GenerateRequest, InferenceClient, Segment};

/// Asks the engine which state or union territory a coordinate falls in.
///
/// The engine is told to answer with one name from [`Jurisdiction::ALL`] and
/// nothing else, but the answer is returned unchecked: parse it with
/// `Jurisdiction::from_str` before relying on it.
#[derive(Clone)]
pub struct GeolocationResolver {
    client: Arc<dyn InferenceClient>,
}

impl GeolocationResolver {
    pub fn new(client: Arc<dyn InferenceClient>) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, latitude: f64, longitude: f64) -> Result<String, AnalysisError> {
        if !(latitude.is_finite() && (-90.0..=90.0).contains(&latitude)) {
            return Err(AnalysisError::Validation(format!("Invalid latitude: {latitude}")));
        }
        if !(longitude.is_finite() && (-180.0..=180.0).contains(&longitude)) {
            return Err(AnalysisError::Validation(format!("Invalid longitude: {longitude}")));
        }

        let reply = self
            .client
            .generate(GenerateRequest::plain(vec![Segment::Text(prompt(latitude, longitude))]))
            .await?;
        let name = reply.trim().to_string();
        if name.is_empty() {
            return Err(AnalysisError::ResponseParse("empty jurisdiction name".into()));
        }
        info!(latitude, longitude, answer = %name, "resolved coordinates");
        Ok(name)
    }
}

fn prompt(latitude: f64, longitude: f64) -> String {
    let names = Jurisdiction::ALL
        .iter()
        .map(|j| j.name())
        .collect::<Vec<_>>()
        .join("', '");
    format!(
        "Based on the geographic coordinates latitude={latitude} and longitude={longitude}, identify the corresponding state or union territory within India.

Your response MUST be one of the following exact string values: ['{names}'].

Do not provide any other text, explanation, or formatting. Just the name of the state or union territory."
    )
}
