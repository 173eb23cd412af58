use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Everything that can go wrong talking to the chat service.
///
/// The controller collapses all of these into one user-facing message; the
/// variants exist for logs.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not reach chat service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("chat service returned status {0}")]
    Status(StatusCode),

    #[error("chat service returned a malformed body: {0}")]
    MalformedBody(String),

    #[error("chat request ended before a reply arrived: {0}")]
    Interrupted(String),
}

/// Which response key carries the assistant's reply.
///
/// Deployments of the service disagree, so the backend reads the preferred
/// key first and falls back to the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyField {
    #[default]
    Reply,
    Response,
}

impl ReplyField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyField::Reply => "reply",
            ReplyField::Response => "response",
        }
    }

    pub fn other(&self) -> ReplyField {
        match self {
            ReplyField::Reply => ReplyField::Response,
            ReplyField::Response => ReplyField::Reply,
        }
    }
}

impl FromStr for ReplyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reply" => Ok(ReplyField::Reply),
            "response" => Ok(ReplyField::Response),
            other => Err(format!("unknown reply field '{}', expected 'reply' or 'response'", other)),
        }
    }
}

/// One request/response round trip with the assistant.
///
/// `Ok(None)` means the service answered successfully but the body carried no
/// usable reply text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, message: &str) -> Result<Option<String>, TransportError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// `POST /api/chat` over HTTP.
#[derive(Clone)]
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
    reply_field: ReplyField,
}

impl HttpChatBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            reply_field: ReplyField::default(),
        }
    }

    pub fn with_reply_field(mut self, reply_field: ReplyField) -> Self {
        self.reply_field = reply_field;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, message: &str) -> Result<Option<String>, TransportError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("content-type", "application/json")
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let body = response.text().await?;
        extract_reply(&body, self.reply_field)
    }
}

/// Pull the reply text out of a response body.
fn extract_reply(body: &str, preferred: ReplyField) -> Result<Option<String>, TransportError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| TransportError::MalformedBody(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| TransportError::MalformedBody("expected a JSON object".to_string()))?;

    let text = [preferred, preferred.other()]
        .iter()
        .filter_map(|field| object.get(field.as_str()).and_then(Value::as_str))
        .find(|text| !text.trim().is_empty())
        .map(str::to_string);

    Ok(text)
}
