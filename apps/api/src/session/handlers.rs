use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::document;
use crate::errors::AppError;
use crate::session::{driver, Domain, Interview, SessionPhase};
use crate::state::AppState;

/// Rendered interview state: everything the client needs to display one
/// run, with failed transcripts already flattened to placeholder text.
#[derive(Debug, Serialize)]
pub struct InterviewView {
    pub id: Uuid,
    pub file_name: String,
    pub domain: Domain,
    pub phase: SessionPhase,
    pub created_at: DateTime<Utc>,
    pub total_questions: Option<usize>,
    pub exchanges: Vec<ExchangeView>,
    pub feedback: Option<String>,
}

/// One asked question with its recorded answer, numbered from 1.
#[derive(Debug, Serialize)]
pub struct ExchangeView {
    pub number: usize,
    pub question: String,
    pub answer: String,
}

fn render(interview: &Interview) -> InterviewView {
    let session = interview.session.as_ref();

    InterviewView {
        id: interview.id,
        file_name: interview.file_name.clone(),
        domain: interview.domain,
        phase: interview.phase(),
        created_at: interview.created_at,
        total_questions: session.map(|s| s.questions().len()),
        exchanges: session
            .map(|s| {
                s.questions()
                    .iter()
                    .zip(s.answers())
                    .enumerate()
                    .map(|(i, (question, answer))| ExchangeView {
                        number: i + 1,
                        question: question.clone(),
                        answer: answer.as_text().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        feedback: session.and_then(|s| s.feedback().map(String::from)),
    }
}

/// POST /api/v1/interviews
///
/// Multipart upload: a `resume` PDF file plus a `domain` text field.
/// Extracts the resume text and creates the interview in its idle state.
pub async fn handle_create_interview(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<InterviewView>, AppError> {
    let mut resume: Option<(String, bytes::Bytes)> = None;
    let mut domain: Option<Domain> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read resume upload: {e}")))?;
                resume = Some((file_name, data));
            }
            Some("domain") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read domain field: {e}")))?;
                let parsed = raw.trim().parse::<Domain>().map_err(|_| {
                    AppError::Validation(format!(
                        "Unknown domain '{}'. Choose one of: {}",
                        raw.trim(),
                        Domain::ALL
                            .iter()
                            .map(|d| d.label())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?;
                domain = Some(parsed);
            }
            _ => {}
        }
    }

    let (file_name, data) =
        resume.ok_or_else(|| AppError::Validation("Missing 'resume' file field".to_string()))?;
    let domain =
        domain.ok_or_else(|| AppError::Validation("Missing 'domain' field".to_string()))?;

    let resume_text = document::extract_text(&data)?;
    info!(
        "Extracted {} chars of resume text from '{}'",
        resume_text.len(),
        file_name
    );

    let interview = Interview::new(file_name, resume_text, domain);
    let view = render(&interview);
    state.interviews.lock().await.insert(interview.id, interview);

    Ok(Json(view))
}

/// POST /api/v1/interviews/:id/questions
///
/// The "generate" trigger: derives the question list from the resume and
/// asks the opening question immediately. Re-triggering replaces any
/// session already in flight.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    let mut interviews = state.interviews.lock().await;
    let interview = interviews
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;

    driver::begin_session(interview, state.llm.as_ref(), state.speech.as_ref()).await?;
    Ok(Json(render(interview)))
}

/// POST /api/v1/interviews/:id/advance
///
/// One explicit advance signal: asks the next question, records its
/// answer, and on the final answer attaches feedback.
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    let mut interviews = state.interviews.lock().await;
    let interview = interviews
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;

    driver::advance(interview, state.llm.as_ref(), state.speech.as_ref()).await?;
    Ok(Json(render(interview)))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewView>, AppError> {
    let interviews = state.interviews.lock().await;
    let interview = interviews
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;

    Ok(Json(render(interview)))
}
