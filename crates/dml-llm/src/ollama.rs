//! Local Ollama backend.
//!
//! Uses the non-streaming `/api/generate` endpoint with `format: "json"`, which
//! constrains the model to emit a JSON document in the `response` field.

use serde::{Deserialize, Serialize};

use dml_core::CodeSnippet;

use crate::error::LlmError;
use crate::http::check_response;
use crate::{LlmClassifier, prompt};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl LlmClassifier {
    pub(crate) async fn generate_ollama(
        &self,
        base_url: &str,
        model: &str,
        snippet: &CodeSnippet,
    ) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model,
            prompt: prompt::full_prompt(snippet),
            stream: false,
            format: "json",
        };
        let resp = self
            .http
            .post(format!("{base_url}/api/generate"))
            .json(&request)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let body: GenerateResponse = resp.json().await?;
        Ok(body.response)
    }
}
