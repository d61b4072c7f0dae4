//! OpenAI-compatible chat completions backend.

use serde::{Deserialize, Serialize};

use dml_core::CodeSnippet;

use crate::error::LlmError;
use crate::http::check_response;
use crate::{LlmClassifier, prompt};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmClassifier {
    pub(crate) async fn complete_chat(
        &self,
        api_url: &str,
        api_key: &str,
        model: &str,
        snippet: &CodeSnippet,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt::INSTRUCTIONS.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt::snippet_block(snippet),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };
        let resp = self
            .http
            .post(api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let body: ChatResponse = resp.json().await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}
