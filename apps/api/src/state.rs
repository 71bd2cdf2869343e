use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::llm_client::TextGenerator;
use crate::session::Interview;
use crate::speech::SpeechBridge;

/// Live interviews keyed by id, dropped with the process.
///
/// The map lock is held for the whole of each driver step: the
/// microphone and speaker are exclusive devices, so interview steps are
/// serialized by construction.
pub type InterviewStore = Arc<Mutex<HashMap<Uuid, Interview>>>;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Client for the remote generation endpoint — questions and feedback.
    pub llm: Arc<dyn TextGenerator>,
    /// Text→speech and speech→text bridge, including local devices.
    pub speech: Arc<dyn SpeechBridge>,
    pub interviews: InterviewStore,
}
