//! Google Gemini backend over the `generateContent` REST endpoint.

use serde::{Deserialize, Serialize};

use dml_core::CodeSnippet;

use crate::error::LlmError;
use crate::http::check_response;
use crate::{LlmClassifier, prompt};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: [Content; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl LlmClassifier {
    pub(crate) async fn generate_gemini(
        &self,
        api_url: &str,
        api_key: &str,
        model: &str,
        snippet: &CodeSnippet,
    ) -> Result<String, LlmError> {
        let url = format!(
            "{api_url}/v1beta/models/{}:generateContent",
            urlencoding::encode(model)
        );
        let request = GenerateContentRequest {
            contents: [Content {
                parts: vec![Part {
                    text: prompt::full_prompt(snippet),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let body: GenerateContentResponse = resp.json().await?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}
