//! Core `QuestionService` trait and `ApiQuestionService` implementation.
//!
//! `ApiQuestionService` talks to the interview backend's REST API: it trades
//! the candidate's answer for the next question (and an optional code
//! starter) and sends the best-effort end-of-session notice.  All connection
//! details come from [`ServiceConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ServiceConfig;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to the question service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// HTTP transport or connection error.
    #[error("interview service request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("interview service request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse interview service response: {0}")]
    Parse(String),

    /// The service reported a failure with a human-readable message.
    #[error("{0}")]
    Rejected(String),

    /// The service answered without a usable question.
    #[error("interview service returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// The next step of the interview as produced by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Question text to read to the candidate.
    pub question: String,
    /// Optional starter code to install in the editor.
    pub code: Option<String>,
}

// ---------------------------------------------------------------------------
// QuestionService trait
// ---------------------------------------------------------------------------

/// Async boundary to the remote question generator.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn QuestionService>`).
///
/// The controller calls [`next_question`](Self::next_question) at most once
/// per analysis episode; retries are candidate-initiated resubmissions,
/// never automatic.
#[async_trait]
pub trait QuestionService: Send + Sync {
    /// Exchange `answer` for the next question of session `session_id`.
    ///
    /// The very first call of a session passes an empty answer as the
    /// session-start signal.
    async fn next_question(&self, session_id: &str, answer: &str)
        -> Result<Prompt, ServiceError>;

    /// Notify the service that the session ended.  Best-effort; failures
    /// must not block local teardown.
    async fn end_session(&self, session_id: &str) -> Result<(), ServiceError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<PromptData>,
}

#[derive(Debug, Deserialize)]
struct PromptData {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Extract a [`Prompt`] from a response body.
///
/// Pure so the wire contract is testable without a server: `ok` is the HTTP
/// success flag; a failure carries the envelope's `message` when present.
fn parse_envelope(ok: bool, body: &str) -> Result<Prompt, ServiceError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| ServiceError::Parse(e.to_string()))?;

    if !ok {
        let message = envelope
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "interview service rejected the request".to_string());
        return Err(ServiceError::Rejected(message));
    }

    let data = envelope.data.ok_or(ServiceError::EmptyResponse)?;
    let question = data
        .question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(ServiceError::EmptyResponse)?;

    let code = data.code.filter(|c| !c.trim().is_empty());

    Ok(Prompt { question, code })
}

// ---------------------------------------------------------------------------
// ApiQuestionService
// ---------------------------------------------------------------------------

/// Calls the interview backend over HTTP.
///
/// Endpoints:
/// * `POST {base_url}/api/v1/ask-to-gemini/{session_id}` with body
///   `{"answer": ...}` — next question.
/// * `POST {base_url}/api/v1/end/{session_id}` — end-of-session notice.
pub struct ApiQuestionService {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl ApiQuestionService {
    /// Build an `ApiQuestionService` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &ServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl QuestionService for ApiQuestionService {
    async fn next_question(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<Prompt, ServiceError> {
        let url = format!(
            "{}/api/v1/ask-to-gemini/{}",
            self.config.base_url, session_id
        );

        let body = serde_json::json!({ "answer": answer });

        let response = self.client.post(&url).json(&body).send().await?;
        let ok = response.status().is_success();
        let text = response.text().await?;

        parse_envelope(ok, &text)
    }

    async fn end_session(&self, session_id: &str) -> Result<(), ServiceError> {
        let url = format!("{}/api/v1/end/{}", self.config.base_url, session_id);

        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::Rejected(format!(
                "end-session returned HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockQuestionService  (test-only)
// ---------------------------------------------------------------------------

/// A test double that replays scripted responses and records every call.
#[cfg(test)]
pub struct MockQuestionService {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<Prompt, ServiceError>>>,
    pub calls: std::sync::Mutex<Vec<(String, String)>>,
    pub endings: std::sync::Mutex<Vec<String>>,
    /// When set, `next_question` waits for a permit before answering, so
    /// tests can hold a request in flight.
    gate: Option<std::sync::Arc<tokio::sync::Semaphore>>,
}

#[cfg(test)]
impl MockQuestionService {
    pub fn new(responses: Vec<Result<Prompt, ServiceError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            calls: std::sync::Mutex::new(Vec::new()),
            endings: std::sync::Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Create a mock whose `next_question` blocks until the returned
    /// semaphore receives a permit.
    pub fn gated(
        responses: Vec<Result<Prompt, ServiceError>>,
    ) -> (Self, std::sync::Arc<tokio::sync::Semaphore>) {
        let gate = std::sync::Arc::new(tokio::sync::Semaphore::new(0));
        let mut mock = Self::new(responses);
        mock.gate = Some(std::sync::Arc::clone(&gate));
        (mock, gate)
    }

    pub fn question(text: &str) -> Result<Prompt, ServiceError> {
        Ok(Prompt {
            question: text.to_string(),
            code: None,
        })
    }

    pub fn question_with_code(text: &str, code: &str) -> Result<Prompt, ServiceError> {
        Ok(Prompt {
            question: text.to_string(),
            code: Some(code.to_string()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl QuestionService for MockQuestionService {
    async fn next_question(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<Prompt, ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((session_id.to_string(), answer.to_string()));

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|_| {
                ServiceError::Request("gate closed".into())
            })?;
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ServiceError::EmptyResponse))
    }

    async fn end_session(&self, session_id: &str) -> Result<(), ServiceError> {
        self.endings.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> ServiceConfig {
        ServiceConfig {
            base_url: "http://localhost:8080".into(),
            timeout_secs: 30,
        }
    }

    // ---- parse_envelope ----------------------------------------------------

    #[test]
    fn parses_question_without_code() {
        let body = r#"{"status":200,"message":"ok","data":{"question":"Tell me about yourself"}}"#;
        let prompt = parse_envelope(true, body).unwrap();
        assert_eq!(prompt.question, "Tell me about yourself");
        assert!(prompt.code.is_none());
    }

    #[test]
    fn parses_question_with_code_starter() {
        let body = r#"{"data":{"question":"Fix this function","code":"def f(): pass"}}"#;
        let prompt = parse_envelope(true, body).unwrap();
        assert_eq!(prompt.question, "Fix this function");
        assert_eq!(prompt.code.as_deref(), Some("def f(): pass"));
    }

    #[test]
    fn blank_code_field_is_treated_as_absent() {
        let body = r#"{"data":{"question":"Next question","code":"   "}}"#;
        let prompt = parse_envelope(true, body).unwrap();
        assert!(prompt.code.is_none());
    }

    #[test]
    fn failure_carries_server_message() {
        let body = r#"{"status":429,"message":"rate limited"}"#;
        let err = parse_envelope(false, body).unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(ref m) if m == "rate limited"));
    }

    #[test]
    fn failure_without_message_gets_a_default() {
        let body = r#"{"status":500}"#;
        let err = parse_envelope(false, body).unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
    }

    #[test]
    fn missing_data_is_empty_response() {
        let body = r#"{"status":200,"message":"ok"}"#;
        let err = parse_envelope(true, body).unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResponse));
    }

    #[test]
    fn blank_question_is_empty_response() {
        let body = r#"{"data":{"question":"  "}}"#;
        let err = parse_envelope(true, body).unwrap_err();
        assert!(matches!(err, ServiceError::EmptyResponse));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = parse_envelope(true, "not json").unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }

    // ---- ApiQuestionService construction -----------------------------------

    #[test]
    fn from_config_builds_without_panic() {
        let _service = ApiQuestionService::from_config(&make_config());
    }

    /// Verify that `ApiQuestionService` is usable as `dyn QuestionService`.
    #[test]
    fn service_is_object_safe() {
        let service: Box<dyn QuestionService> =
            Box::new(ApiQuestionService::from_config(&make_config()));
        drop(service);
    }

    // ---- MockQuestionService ----------------------------------------------

    #[tokio::test]
    async fn mock_replays_scripted_responses_in_order() {
        let mock = MockQuestionService::new(vec![
            MockQuestionService::question("first"),
            Err(ServiceError::Rejected("rate limited".into())),
        ]);

        let prompt = mock.next_question("sid", "").await.unwrap();
        assert_eq!(prompt.question, "first");

        let err = mock.next_question("sid", "answer").await.unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));

        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.calls.lock().unwrap()[1].1, "answer");
    }

    #[tokio::test]
    async fn mock_records_end_session() {
        let mock = MockQuestionService::new(vec![]);
        mock.end_session("sid").await.unwrap();
        assert_eq!(mock.endings.lock().unwrap().as_slice(), ["sid"]);
    }
}
