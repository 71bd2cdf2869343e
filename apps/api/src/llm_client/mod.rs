/// Generation client — the single point of entry for all calls to the
/// remote text-generation endpoint.
///
/// ARCHITECTURAL RULE: no other module may talk to the generation
/// endpoint directly. Question generation and feedback both go through
/// `TextGenerator::generate`.
///
/// The endpoint speaks newline-delimited JSON: each line carries a
/// partial `response` fragment and a `done` flag; fragments are
/// concatenated until `done=true`.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// The model requested from the generation endpoint.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "mistral";
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed stream line: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("generation returned no usable lines")]
    Empty,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// One line of the streamed response body.
#[derive(Debug, Deserialize)]
struct StreamLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Seam between the session driver and the remote generation endpoint.
/// Carried in `AppState` as `Arc<dyn TextGenerator>` so driver tests can
/// script responses without a live endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// HTTP client for the generation endpoint.
/// Retries on 429/5xx and transport errors with exponential backoff.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    url: String,
}

impl GenerationClient {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            url,
        }
    }

    async fn call(&self, prompt: &str) -> Result<String, GenerationError> {
        let request_body = GenerationRequest {
            model: MODEL,
            prompt,
        };

        let mut last_error: Option<GenerationError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Generation call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self.client.post(&self.url).json(&request_body).send().await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(GenerationError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Generation endpoint returned {}: {}", status, body);
                last_error = Some(GenerationError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GenerationError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let full = read_stream(response).await?;
            debug!("Generation call succeeded: {} chars streamed", full.len());
            return Ok(full);
        }

        Err(last_error.unwrap_or(GenerationError::Empty))
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.call(prompt).await
    }
}

/// Drains the NDJSON body line by line, concatenating `response`
/// fragments until a line with `done=true` (or end of stream).
async fn read_stream(mut response: reqwest::Response) -> Result<String, GenerationError> {
    let mut full = String::new();
    let mut pending = String::new();
    let mut done = false;

    while !done {
        let Some(chunk) = response.chunk().await? else {
            break;
        };
        pending.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = pending.find('\n') {
            let line: String = pending.drain(..=pos).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if apply_line(&mut full, line)? {
                done = true;
                break;
            }
        }
    }

    // A final fragment without a trailing newline still counts.
    if !done {
        let line = pending.trim();
        if !line.is_empty() {
            apply_line(&mut full, line)?;
        }
    }

    Ok(full)
}

/// Parses one stream line, appends its fragment to `full`, and reports
/// whether the stream is finished.
fn apply_line(full: &mut String, line: &str) -> Result<bool, GenerationError> {
    let parsed: StreamLine = serde_json::from_str(line)?;
    full.push_str(&parsed.response);
    Ok(parsed.done)
}
