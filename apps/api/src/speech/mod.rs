//! Speech Bridge — outbound text→speech and inbound speech→text.
//!
//! Both operations are blocking remote calls with no retry. Synthesis
//! failures are reported to the caller; everything on the recognition
//! path soft-fails into `Transcript::Failed` so an interview in flight
//! always keeps moving.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod audio;

use self::audio::AudioError;

const TTS_URL: &str = "https://api.deepgram.com/v1/speak?model=aura-asteria-en";
const STT_URL: &str = "https://api.deepgram.com/v1/listen?language=en&model=nova-2";

/// Placeholder rendered for an answer whose transcription failed.
pub const TRANSCRIPTION_FAILED: &str = "Transcription failed.";

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("audio task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Outcome of one answer recording.
///
/// Failure is a value, not an error: the session continues regardless,
/// and the fixed placeholder text is produced only when rendering — a
/// legitimately spoken phrase can never be mistaken for a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    Recognized(String),
    Failed,
}

impl Transcript {
    pub fn as_text(&self) -> &str {
        match self {
            Transcript::Recognized(text) => text,
            Transcript::Failed => TRANSCRIPTION_FAILED,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Transcript::Failed)
    }
}

/// Seam between the session driver and the remote audio API plus local
/// devices. Carried in `AppState` as `Arc<dyn SpeechBridge>` so driver
/// tests can script transcripts without devices or network.
#[async_trait]
pub trait SpeechBridge: Send + Sync {
    /// Voices `text` through the synthesis endpoint and plays it on the
    /// local output device, returning once playback completes.
    async fn speak(&self, text: &str) -> Result<(), SynthesisError>;

    /// Records `duration` of audio from the default input device and
    /// transcribes it via the recognition endpoint.
    async fn listen(&self, duration: Duration) -> Transcript;
}

// Recognition response, navigated as
// results.channels[0].alternatives[0].transcript.

#[derive(Debug, Deserialize)]
struct SttResponse {
    results: SttResults,
}

#[derive(Debug, Deserialize)]
struct SttResults {
    channels: Vec<SttChannel>,
}

#[derive(Debug, Deserialize)]
struct SttChannel {
    alternatives: Vec<SttAlternative>,
}

#[derive(Debug, Deserialize)]
struct SttAlternative {
    transcript: String,
}

/// Extracts the first alternative transcript of the first channel of the
/// first result, if the body parses at all.
fn parse_transcript(body: &str) -> Option<String> {
    let response: SttResponse = serde_json::from_str(body).ok()?;
    let channel = response.results.channels.into_iter().next()?;
    let alternative = channel.alternatives.into_iter().next()?;
    Some(alternative.transcript)
}

/// Speech bridge backed by the Deepgram HTTP API and local audio devices.
#[derive(Clone)]
pub struct DeepgramClient {
    client: Client,
    api_key: String,
}

impl DeepgramClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.api_key)
    }
}

#[async_trait]
impl SpeechBridge for DeepgramClient {
    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        let response = self
            .client
            .post(TTS_URL)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "text/plain")
            .body(text.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let data = response.bytes().await?;
        debug!("Synthesized {} bytes of audio", data.len());

        // Playback blocks until the clip finishes.
        tokio::task::spawn_blocking(move || audio::play_encoded(data)).await??;
        Ok(())
    }

    async fn listen(&self, duration: Duration) -> Transcript {
        let wav = match tokio::task::spawn_blocking(move || audio::record_wav(duration)).await {
            Ok(Ok(wav)) => wav,
            Ok(Err(e)) => {
                warn!("Recording failed: {e}");
                return Transcript::Failed;
            }
            Err(e) => {
                warn!("Recording task failed: {e}");
                return Transcript::Failed;
            }
        };

        let response = self
            .client
            .post(STT_URL)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "audio/wav")
            .body(wav)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!("Recognition call failed: {e}");
                return Transcript::Failed;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Recognition endpoint returned {status}");
            return Transcript::Failed;
        }

        match response.text().await.ok().as_deref().and_then(parse_transcript) {
            Some(transcript) => Transcript::Recognized(transcript),
            None => {
                warn!("Recognition response had no transcript");
                Transcript::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_as_text_uses_placeholder_on_failure() {
        assert_eq!(
            Transcript::Recognized("I wrote Rust".to_string()).as_text(),
            "I wrote Rust"
        );
        assert_eq!(Transcript::Failed.as_text(), "Transcription failed.");
        assert!(Transcript::Failed.is_failed());
    }

    #[test]
    fn test_parse_transcript_navigates_first_alternative() {
        let body = r#"{
            "results": {
                "channels": [
                    {"alternatives": [
                        {"transcript": "tell me about yourself"},
                        {"transcript": "second best"}
                    ]},
                    {"alternatives": [{"transcript": "other channel"}]}
                ]
            }
        }"#;
        assert_eq!(
            parse_transcript(body).as_deref(),
            Some("tell me about yourself")
        );
    }

    #[test]
    fn test_parse_transcript_handles_empty_channels() {
        let body = r#"{"results": {"channels": []}}"#;
        assert_eq!(parse_transcript(body), None);

        let body = r#"{"results": {"channels": [{"alternatives": []}]}}"#;
        assert_eq!(parse_transcript(body), None);
    }

    #[test]
    fn test_parse_transcript_rejects_malformed_body() {
        assert_eq!(parse_transcript("not json"), None);
        assert_eq!(parse_transcript("{}"), None);
    }
}
