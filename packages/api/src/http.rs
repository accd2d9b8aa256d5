//! Helpers shared by the hosted HTTP clients.

use serde::Deserialize;

/// The different error shapes returned by the hosted services.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Pull a human-readable message out of an error response body.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .msg
        .or(parsed.message)
        .or(parsed.error_description)
        .or(parsed.error)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

/// Consume a non-success response into `(status, message)`.
pub(crate) async fn read_failure(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, error_message(status, &body))
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        let grant = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(error_message(400, grant), "Invalid login credentials");
        assert_eq!(
            error_message(422, r#"{"msg":"User already registered"}"#),
            "User already registered"
        );
        let no_rows = r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(
            error_message(404, no_rows),
            "JSON object requested, multiple (or no) rows returned"
        );
        assert_eq!(error_message(502, "Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message(500, ""), "request failed with status 500");
    }
}
