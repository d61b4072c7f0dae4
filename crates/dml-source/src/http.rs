//! Shared HTTP response helpers for the GitHub client.
//!
//! Centralizes status-code checks (rate limiting with `Retry-After`
//! parsing, non-success → [`SourceError::Api`]) so the client stays focused on
//! request construction and response mapping.

use crate::error::SourceError;

/// Fallback wait when the API does not say how long to back off.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`SourceError::RateLimited`].
/// - **403 Forbidden** with `x-ratelimit-remaining: 0` or a rate-limit
///   message in the body (GitHub's primary and secondary limits) →
///   [`SourceError::RateLimited`].
/// - **Non-success status** → [`SourceError::Api`] with status code and
///   response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = resp.status();
    if status == 429 {
        return Err(SourceError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if status.is_success() {
        return Ok(resp);
    }

    let quota_exhausted = status == 403 && quota_exhausted(&resp);
    let retry_after = parse_retry_after(&resp);
    let message = resp.text().await.unwrap_or_default();

    if status == 403 && (quota_exhausted || message.to_ascii_lowercase().contains("rate limit")) {
        return Err(SourceError::RateLimited {
            retry_after_secs: retry_after,
        });
    }
    Err(SourceError::Api {
        status: status.as_u16(),
        message,
    })
}

fn quota_exhausted(resp: &reqwest::Response) -> bool {
    resp.headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
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

    #[test]
    fn parse_retry_after_from_header() {
        let resp = mock_response(429, &[("Retry-After", "120")], "");
        assert_eq!(parse_retry_after(&resp), 120);
    }

    #[test]
    fn parse_retry_after_missing_header() {
        let resp = mock_response(429, &[], "");
        assert_eq!(parse_retry_after(&resp), 60);
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let resp = mock_response(429, &[("Retry-After", "30")], "");
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(
            err,
            SourceError::RateLimited {
                retry_after_secs: 30
            }
        ));
    }

    #[tokio::test]
    async fn forbidden_with_exhausted_quota_is_rate_limited() {
        let resp = mock_response(403, &[("x-ratelimit-remaining", "0")], "{}");
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(err, SourceError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn forbidden_secondary_limit_is_rate_limited() {
        let resp = mock_response(
            403,
            &[("x-ratelimit-remaining", "12")],
            r#"{"message": "You have exceeded a secondary rate limit."}"#,
        );
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(err, SourceError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn plain_forbidden_is_api_error() {
        let resp = mock_response(403, &[], r#"{"message": "Resource not accessible"}"#);
        let err = check_response(resp).await.unwrap_err();
        assert!(matches!(err, SourceError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn server_error_is_api_error() {
        let resp = mock_response(500, &[], "boom");
        let err = check_response(resp).await.unwrap_err();
        match err {
            SourceError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn success_passes_through() {
        let resp = mock_response(200, &[], "{}");
        assert!(check_response(resp).await.is_ok());
    }
}
