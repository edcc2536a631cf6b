use serde::{Deserialize, Serialize};

/// Body the HMS backend returns for acknowledgement-style calls
/// (`POST .../read`, `POST .../read-all`).
///
/// Every field is optional on the wire: some endpoints answer with an empty
/// object, some with `{ "success": true }`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AckResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// Flat error bodies (`{ "success": false, "message": "..." }`) are also seen
/// in the wild, next to the nested `error` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Nested(ApiErrorResponse),
    Flat {
        #[serde(default)]
        code: Option<String>,
        message: String,
    },
}

impl ErrorBody {
    pub fn into_parts(self) -> (Option<String>, String) {
        match self {
            ErrorBody::Nested(resp) => (resp.error.code, resp.error.message),
            ErrorBody::Flat { code, message } => (code, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ack_counts_as_success() {
        let ack: AckResponse = serde_json::from_str("{}").unwrap();
        assert!(ack.success);
        assert!(ack.message.is_none());
    }

    #[test]
    fn nested_error_body() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"success":false,"error":{"code":"E5001","message":"notification not found"}}"#,
        )
        .unwrap();
        let (code, message) = body.into_parts();
        assert_eq!(code.as_deref(), Some("E5001"));
        assert_eq!(message, "notification not found");
    }

    #[test]
    fn flat_error_body() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"success":false,"message":"token expired"}"#).unwrap();
        let (code, message) = body.into_parts();
        assert!(code.is_none());
        assert_eq!(message, "token expired");
    }
}
