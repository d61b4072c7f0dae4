//! Status-code checks shared by the model clients.

use crate::error::LlmError;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`LlmError::RateLimited`] with the
///   `Retry-After` value (default 60 s).
/// - **Non-success status** → [`LlmError::Api`] with status code and body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status == 429 {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(LlmError::RateLimited { retry_after_secs });
    }
    if !status.is_success() {
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, headers: &[(&str, &str)], body: &'static str) -> reqwest::Response {
        let mut builder = ::http::Response::builder().status(status);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        reqwest::Response::from(builder.body(body).unwrap())
    }

    #[tokio::test]
    async fn too_many_requests_uses_retry_after() {
        let err = check_response(mock_response(429, &[("Retry-After", "7")], ""))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { retry_after_secs: 7 }));
    }

    #[tokio::test]
    async fn too_many_requests_defaults_to_sixty_seconds() {
        let err = check_response(mock_response(429, &[], "")).await.unwrap_err();
        assert!(matches!(err, LlmError::RateLimited { retry_after_secs: 60 }));
    }

    #[tokio::test]
    async fn bad_request_carries_body() {
        let err = check_response(mock_response(400, &[], "model not found"))
            .await
            .unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "model not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
