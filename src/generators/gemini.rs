use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{GenerateError, Generated, TextGenerator};

const GEMINI_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/";

// Provider error bodies can be arbitrarily large; logs only need the head.
const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Serialize)]
struct GeminiPart<'text> {
    text: &'text str,
}

#[derive(Serialize)]
struct GeminiContent<'text> {
    role: &'static str,
    parts: Vec<GeminiPart<'text>>,
}

#[derive(Serialize)]
struct GeminiRequest<'text> {
    contents: Vec<GeminiContent<'text>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

/// Client for the Gemini `generateContent` REST endpoint.
///
/// One instance holds one authenticated `reqwest` client and is shared
/// across all requests for the process lifetime.
pub struct GeminiGenerator {
    api_key: String,
    client: Client,
}

impl GeminiGenerator {
    #[inline]
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }

    // The key rides in the query string, so this URL must never be logged.
    fn url(&self, model: &str) -> String {
        format!("{GEMINI_BASE_URL}{model}:generateContent?key={}", self.api_key)
    }

    fn classify_status(
        status: StatusCode,
        model: &str,
        body: &str,
    ) -> GenerateError {
        let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GenerateError::InvalidApiKey
            }
            StatusCode::BAD_REQUEST => GenerateError::BadRequest(excerpt),
            StatusCode::NOT_FOUND => {
                GenerateError::ModelNotFound(model.to_owned())
            }
            StatusCode::TOO_MANY_REQUESTS => GenerateError::RateLimitExceeded,
            StatusCode::SERVICE_UNAVAILABLE => GenerateError::ModelOverloaded,
            status if status.is_server_error() => {
                GenerateError::ServerError(status.as_u16())
            }
            status => GenerateError::UnexpectedResponse(format!(
                "status {status}: {excerpt}"
            )),
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    #[inline]
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<Generated, GenerateError> {
        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.url(model))
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    GenerateError::Timeout
                } else {
                    GenerateError::NetworkError(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, model, &body));
        }

        let parsed: GeminiResponse = response.json().await.map_err(|err| {
            GenerateError::UnexpectedResponse(err.to_string())
        })?;

        // A 200 with no candidate or no text is how the API reports a
        // moderation block, not an error.
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            Ok(Generated::Empty)
        } else {
            Ok(Generated::Text(text))
        }
    }
}
