//! Model and provider references.

use crate::error::{Error, Result};

/// A reference to a specific model offered by a provider.
///
/// Accepts either the compact `"provider:model"` string form or the expanded
/// `{provider, model}` record form on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModelReference {
    /// Provider tag, e.g. `openai`, `ollama`, `azure-openai`, `gemini`.
    pub provider_id: String,
    /// Opaque model identifier understood by the provider.
    pub model_id: String,
}

impl ModelReference {
    /// Parse `"provider:model"`. Returns a validation error if either half is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the string has no `:` separator, or if the
    /// provider or model half is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let (provider_id, model_id) = raw
            .split_once(':')
            .ok_or_else(|| Error::validation(format!("model reference '{raw}' missing provider prefix")))?;
        if provider_id.is_empty() {
            return Err(Error::validation("model reference has empty provider id"));
        }
        if model_id.is_empty() {
            return Err(Error::validation("model reference has empty model id"));
        }
        Ok(Self {
            provider_id: provider_id.to_owned(),
            model_id: model_id.to_owned(),
        })
    }
}

impl std::fmt::Display for ModelReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider_id, self.model_id)
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ModelReferenceShape {
    Compact(String),
    Record {
        provider: String,
        model: String,
    },
}

impl<'de> serde::Deserialize<'de> for ModelReference {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match ModelReferenceShape::deserialize(deserializer)? {
            ModelReferenceShape::Compact(s) => {
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
            ModelReferenceShape::Record { provider, model } => Ok(Self {
                provider_id: provider,
                model_id: model,
            }),
        }
    }
}

/// Configuration for a registered embedding or rerank provider.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProviderDescriptor {
    /// Unique provider id, matched by [`ModelReference::provider_id`].
    pub id: String,
    /// Provider type tag (`openai`, `ollama`, `azure-openai`, `gemini`, ...), used by
    /// base-URL normalization rules distinct from `id` for aliasing purposes.
    #[serde(rename = "type")]
    pub kind: String,
    /// Unnormalized API host, as configured by the caller.
    pub api_host: String,
    /// Credential sent with each request, if any.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Provider-specific extra fields, passed through untouched.
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ProviderDescriptor {
    /// Normalize [`Self::api_host`] into a base URL per the adapter's resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceUnavailable`] if the normalized URL is empty.
    pub fn normalized_base_url(&self) -> Result<String> {
        let mut url = self.api_host.trim().trim_end_matches('/').to_owned();

        if let Some(stripped) = url.strip_suffix('#') {
            let mut path = stripped.trim_end_matches('/');
            const SUFFIXES: &[&str] = &[
                "chat/completions",
                "responses",
                "messages",
                "generateContent",
                "streamGenerateContent",
            ];
            for suffix in SUFFIXES {
                if let Some(p) = path.strip_suffix(suffix) {
                    path = p;
                    break;
                }
            }
            url = path
                .trim_end_matches('/')
                .trim_end_matches(':')
                .to_owned();
        }

        match self.kind.as_str() {
            "gemini" => url.push_str("/openai"),
            "azure-openai" => url.push_str("/v1"),
            _ => {}
        }

        if self.id == "ollama" {
            if let Some(stripped) = url.strip_suffix("/api") {
                url = stripped.to_owned();
            }
        }

        if url.is_empty() {
            return Err(Error::service_unavailable(format!(
                "provider '{}' has an empty base URL after normalization",
                self.id
            )));
        }

        Ok(url)
    }
}
