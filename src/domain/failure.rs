use crate::domain::notification::Notification;
use serde_json::Value;
use std::fmt;

// Field-keyed validation messages, kept in the order the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, Vec<String>)>);

impl FieldErrors {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Error body of a non-2xx response, classified once at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    FieldErrors(FieldErrors),
    Generic { raw: Option<String> },
}

impl ErrorPayload {
    /// A non-empty JSON object whose values are all strings or string arrays is a
    /// field-error payload. Anything else, nested objects included, stays generic.
    pub fn classify(body: &str) -> Self {
        let body = body.trim();
        if body.is_empty() {
            return ErrorPayload::Generic { raw: None };
        }

        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(object)) => {
                let mut fields = Vec::with_capacity(object.len());
                for (field, value) in object {
                    match field_messages(value) {
                        Some(messages) => fields.push((field, messages)),
                        None => {
                            return ErrorPayload::Generic {
                                raw: Some(body.to_string()),
                            };
                        }
                    }
                }

                // `{}` names no field, so it is reported as a generic failure.
                let fields = FieldErrors(fields);
                if fields.is_empty() {
                    return ErrorPayload::Generic {
                        raw: Some(body.to_string()),
                    };
                }
                ErrorPayload::FieldErrors(fields)
            }
            // A JSON string body carries its text, not its quotes.
            Ok(Value::String(text)) if !text.is_empty() => {
                ErrorPayload::Generic { raw: Some(text) }
            }
            _ => ErrorPayload::Generic {
                raw: Some(body.to_string()),
            },
        }
    }
}

fn field_messages(value: Value) -> Option<Vec<String>> {
    match value {
        Value::String(message) => Some(vec![message]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(message) => Some(message),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Connect,
    Timeout,
    Malformed,
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportKind::Connect => "network error",
            TransportKind::Timeout => "request timed out",
            TransportKind::Malformed => "malformed response",
            TransportKind::Other => "transport error",
        })
    }
}

/// Error result of one invocation. Carries the original status and payload so
/// callers can branch on it independently of the notifications it produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("{kind}: {message}")]
    Transport { kind: TransportKind, message: String },
    #[error("server responded {status} {status_text}")]
    Server {
        status: u16,
        status_text: String,
        payload: ErrorPayload,
    },
}

impl Failure {
    pub fn malformed(message: impl Into<String>) -> Self {
        Failure::Transport {
            kind: TransportKind::Malformed,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Failure::Server { status, .. } => Some(*status),
            Failure::Transport { .. } => None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Failure::Server {
                payload: ErrorPayload::FieldErrors(fields),
                ..
            } => Some(fields),
            _ => None,
        }
    }

    // Session teardown on these is the caller's call, not the pipeline's.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Notifications describing this failure: one per field for field errors,
    /// exactly one otherwise.
    pub fn notifications(&self) -> Vec<Notification> {
        match self {
            Failure::Server {
                payload: ErrorPayload::FieldErrors(fields),
                ..
            } => fields
                .iter()
                .map(|(field, messages)| {
                    Notification::destructive(format!("Error in {field}"), messages.join(", "))
                })
                .collect(),
            Failure::Server {
                status,
                status_text,
                payload: ErrorPayload::Generic { raw },
            } => {
                let detail = raw.as_deref().unwrap_or(status_text);
                let description = format!("{status} {detail}").trim_end().to_string();
                vec![Notification::destructive("Error", description)]
            }
            Failure::Transport { kind, message } => {
                vec![Notification::destructive("Error", format!("{kind}: {message}"))]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::Severity;

    fn server_failure(status: u16, status_text: &str, body: &str) -> Failure {
        Failure::Server {
            status,
            status_text: status_text.to_string(),
            payload: ErrorPayload::classify(body),
        }
    }

    #[test]
    fn when_every_value_is_a_string_or_list_then_payload_is_field_errors() {
        let payload =
            ErrorPayload::classify(r#"{"password": ["Required", "Too short"], "email": "Invalid"}"#);

        let ErrorPayload::FieldErrors(fields) = payload else {
            panic!("expected field errors");
        };
        let order: Vec<&str> = fields.iter().map(|(field, _)| field).collect();
        assert_eq!(order, vec!["password", "email"]);
        assert_eq!(fields.get("email"), Some(&["Invalid".to_string()][..]));
    }

    #[test]
    fn when_payload_has_a_nested_object_then_it_falls_back_to_generic() {
        let body = r#"{"user": {"email": ["taken"]}}"#;

        assert_eq!(
            ErrorPayload::classify(body),
            ErrorPayload::Generic {
                raw: Some(body.to_string())
            }
        );
    }

    #[test]
    fn when_payload_is_empty_object_or_array_then_it_is_generic() {
        assert!(matches!(ErrorPayload::classify("{}"), ErrorPayload::Generic { .. }));
        assert!(matches!(
            ErrorPayload::classify(r#"["a", "b"]"#),
            ErrorPayload::Generic { .. }
        ));
    }

    #[test]
    fn when_body_is_blank_then_raw_is_absent() {
        assert_eq!(
            ErrorPayload::classify("  \n"),
            ErrorPayload::Generic { raw: None }
        );
    }

    #[test]
    fn when_body_is_a_json_string_then_raw_is_unquoted() {
        assert_eq!(
            ErrorPayload::classify(r#""maintenance window""#),
            ErrorPayload::Generic {
                raw: Some("maintenance window".to_string())
            }
        );
    }

    #[test]
    fn field_errors_fan_out_one_notification_per_field() {
        let failure = server_failure(
            400,
            "Bad Request",
            r#"{"email": ["Enter a valid email."], "password": ["Required", "Too short"]}"#,
        );

        let notifications = failure.notifications();

        assert_eq!(
            notifications,
            vec![
                Notification::destructive("Error in email", "Enter a valid email."),
                Notification::destructive("Error in password", "Required, Too short"),
            ]
        );
    }

    #[test]
    fn generic_failure_uses_status_and_raw_payload() {
        let failure = server_failure(502, "Bad Gateway", "upstream down");

        let notifications = failure.notifications();

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "Error");
        assert_eq!(notifications[0].description, "502 upstream down");
        assert_eq!(notifications[0].severity, Severity::Destructive);
    }

    #[test]
    fn generic_failure_without_payload_uses_status_text() {
        let failure = server_failure(500, "Internal Server Error", "");

        assert_eq!(
            failure.notifications(),
            vec![Notification::destructive("Error", "500 Internal Server Error")]
        );
    }

    #[test]
    fn transport_failure_yields_single_generic_notification() {
        let failure = Failure::Transport {
            kind: TransportKind::Connect,
            message: "connection refused".to_string(),
        };

        assert_eq!(
            failure.notifications(),
            vec![Notification::destructive(
                "Error",
                "network error: connection refused"
            )]
        );
        assert_eq!(failure.status(), None);
    }

    #[test]
    fn unauthorized_covers_401_and_403_only() {
        assert!(server_failure(401, "Unauthorized", "").is_unauthorized());
        assert!(server_failure(403, "Forbidden", "").is_unauthorized());
        assert!(!server_failure(422, "Unprocessable Entity", "").is_unauthorized());
    }
}
