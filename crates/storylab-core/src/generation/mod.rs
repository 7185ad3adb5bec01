pub mod demo;
pub mod http;

pub use demo::DemoBackend;
pub use http::HttpBackend;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::ArtifactKind;
use crate::error::GenerationError;

/// Kind-specific request fields, sent to the endpoint as a flat JSON object
pub type Parameters = BTreeMap<String, String>;

/// A request for one artifact. Fields are fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    kind: ArtifactKind,
    parameters: Parameters,
}

impl GenerationRequest {
    pub fn new<I, K, V>(kind: ArtifactKind, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind,
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.parameters.get(field).map(String::as_str)
    }

    /// Check every required field of the kind is present and not blank
    pub fn validate(&self) -> Result<(), GenerationError> {
        let missing = self
            .kind
            .required_fields()
            .iter()
            .any(|field| self.get(field).map_or(true, |v| v.trim().is_empty()));

        if missing {
            return Err(GenerationError::Validation(
                self.kind.validation_message().to_string(),
            ));
        }
        Ok(())
    }
}

/// What the endpoint sent back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    pub timestamp: String,
    /// Remaining string fields of the response (structure, mood, type, ...)
    pub echoed_parameters: Parameters,
}

/// Remote text generation. Implementations must be cheap to share across tasks.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GenerationError>;
}

/// Map a decoded response body onto a result for `kind`.
///
/// The content field named by the kind and `timestamp` must both be strings;
/// other string fields are kept as echoed parameters and everything else is dropped.
pub fn parse_response(kind: ArtifactKind, body: Value) -> Result<GenerationResult, GenerationError> {
    let Value::Object(mut fields) = body else {
        return Err(GenerationError::MalformedPayload(
            "expected a JSON object".to_string(),
        ));
    };

    let content = take_string(&mut fields, kind.content_field())?;
    let timestamp = take_string(&mut fields, "timestamp")?;

    let echoed_parameters = fields
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            _ => None,
        })
        .collect();

    Ok(GenerationResult {
        content,
        timestamp,
        echoed_parameters,
    })
}

fn take_string(
    fields: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<String, GenerationError> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(GenerationError::MalformedPayload(format!(
            "field `{key}` is not a string"
        ))),
        None => Err(GenerationError::MalformedPayload(format!(
            "missing field `{key}`"
        ))),
    }
}
