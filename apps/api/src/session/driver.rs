//! Session Driver — question/answer sequencing and completion.
//!
//! Flow: begin_session → ask question 0 immediately → one advance per
//! explicit user signal → feedback request on completion.
//!
//! Every step runs to completion on the handler that received the
//! trigger: voicing the question, the fixed recording window, and the
//! transcription all block the interaction. Only generation failures
//! propagate; speech failures degrade so a started interview always
//! reaches the end.

use std::time::Duration;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::{build_feedback_prompt, build_question_prompt, split_question_lines};
use crate::llm_client::TextGenerator;
use crate::session::{Interview, Session};
use crate::speech::{SpeechBridge, Transcript};

/// Fixed answer recording window, in seconds.
pub const ANSWER_SECONDS: u64 = 15;

/// Stored as feedback when the feedback call fails; completion is never
/// rolled back.
pub const FEEDBACK_FAILED: &str = "Feedback request failed.";

/// Generates the question list for an interview and asks the opening
/// question straight away — the one step that needs no user signal.
///
/// A mid-flight re-trigger replaces the session wholesale; answers from
/// the previous run are dropped, never merged.
pub async fn begin_session(
    interview: &mut Interview,
    llm: &dyn TextGenerator,
    speech: &dyn SpeechBridge,
) -> Result<(), AppError> {
    let prompt = build_question_prompt(&interview.resume_text, interview.domain);
    let raw = llm.generate(&prompt).await.map_err(AppError::Generation)?;

    let mut session = Session::new(split_question_lines(&raw))?;
    info!(
        "Generated {} questions for interview {} ({})",
        session.questions().len(),
        interview.id,
        interview.domain
    );

    ask_current(&mut session, speech).await;
    interview.session = Some(session);
    Ok(())
}

/// Handles one explicit advance signal: asks the question at the cursor,
/// collects its answer, and on the final answer requests feedback.
pub async fn advance(
    interview: &mut Interview,
    llm: &dyn TextGenerator,
    speech: &dyn SpeechBridge,
) -> Result<(), AppError> {
    let session = interview.session.as_mut().ok_or_else(|| {
        AppError::Validation("No questions generated yet. Generate questions first.".to_string())
    })?;

    if session.is_complete() {
        return Err(AppError::Validation(
            "Interview already complete. Upload a resume to start a new one.".to_string(),
        ));
    }

    ask_current(session, speech).await;

    if session.is_complete() {
        finish(session, llm).await?;
    }
    Ok(())
}

/// Voices the question at the cursor, records the answer window, and
/// stores whatever transcription produced.
///
/// A synthesis failure skips playback but not the recording: the
/// candidate still gets their answer window for the on-screen question.
async fn ask_current(session: &mut Session, speech: &dyn SpeechBridge) {
    let Some(question) = session.current_question().map(str::to_string) else {
        return;
    };
    let number = session.current_index() + 1;

    info!("Asking question {number}: {question}");
    if let Err(e) = speech.speak(&question).await {
        warn!("Synthesis failed for question {number}, skipping playback: {e}");
    }

    let transcript = speech.listen(Duration::from_secs(ANSWER_SECONDS)).await;
    if transcript.is_failed() {
        warn!("Answer {number} transcription failed, recording placeholder");
    }
    session.record_answer(transcript);
}

/// Requests narrative feedback over the full Q/A history. A failed call
/// stores the fixed failure string instead of aborting.
async fn finish(session: &mut Session, llm: &dyn TextGenerator) -> Result<(), AppError> {
    let answers: Vec<&str> = session.answers().iter().map(Transcript::as_text).collect();
    let prompt = build_feedback_prompt(session.questions(), &answers)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    match llm.generate(&prompt).await {
        Ok(text) => session.set_feedback(text.trim().to_string()),
        Err(e) => {
            warn!("Feedback call failed: {e}");
            session.set_feedback(FEEDBACK_FAILED.to_string());
        }
    }

    info!(
        "Interview complete: {} questions answered",
        session.answers().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm_client::GenerationError;
    use crate::session::{Domain, SessionPhase, OPENING_QUESTION};
    use crate::speech::SynthesisError;

    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GenerationError::Empty))
        }
    }

    struct ScriptedSpeech {
        transcripts: Mutex<VecDeque<Transcript>>,
        spoken: Mutex<Vec<String>>,
        fail_speak: bool,
    }

    impl ScriptedSpeech {
        fn new(transcripts: Vec<Transcript>) -> Self {
            Self {
                transcripts: Mutex::new(transcripts.into()),
                spoken: Mutex::new(Vec::new()),
                fail_speak: false,
            }
        }

        fn recognized(texts: &[&str]) -> Self {
            Self::new(
                texts
                    .iter()
                    .map(|t| Transcript::Recognized(t.to_string()))
                    .collect(),
            )
        }
    }

    #[async_trait]
    impl SpeechBridge for ScriptedSpeech {
        async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
            self.spoken.lock().unwrap().push(text.to_string());
            if self.fail_speak {
                return Err(SynthesisError::Api {
                    status: 500,
                    message: "synthesis down".to_string(),
                });
            }
            Ok(())
        }

        async fn listen(&self, _duration: Duration) -> Transcript {
            self.transcripts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Transcript::Failed)
        }
    }

    fn interview() -> Interview {
        Interview::new(
            "resume.pdf".to_string(),
            "Shipped a Rust payments service.".to_string(),
            Domain::It,
        )
    }

    fn assert_in_step(interview: &Interview) {
        let session = interview.session.as_ref().unwrap();
        assert_eq!(session.answers().len(), session.current_index());
    }

    #[tokio::test]
    async fn test_begin_asks_opening_question_without_a_signal() {
        let llm = ScriptedGenerator::new(vec![Ok("Q1\nQ2".to_string())]);
        let speech = ScriptedSpeech::recognized(&["I am a Rust engineer"]);
        let mut interview = interview();

        begin_session(&mut interview, &llm, &speech).await.unwrap();

        let session = interview.session.as_ref().unwrap();
        assert_eq!(session.questions()[0], OPENING_QUESTION);
        assert_eq!(session.questions().len(), 3);
        assert!(session.opening_asked());
        assert_eq!(session.current_index(), 1);
        assert_eq!(speech.spoken.lock().unwrap().clone(), [OPENING_QUESTION]);
        assert_in_step(&interview);
    }

    #[tokio::test]
    async fn test_begin_fails_when_generation_returns_nothing_usable() {
        let llm = ScriptedGenerator::new(vec![Ok("\n   \n".to_string())]);
        let speech = ScriptedSpeech::recognized(&[]);
        let mut interview = interview();

        let result = begin_session(&mut interview, &llm, &speech).await;
        assert!(matches!(
            result,
            Err(AppError::Generation(GenerationError::Empty))
        ));
        assert!(interview.session.is_none());
        assert_eq!(interview.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_begin_fails_when_generation_call_errors() {
        let llm = ScriptedGenerator::new(vec![Err(GenerationError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })]);
        let speech = ScriptedSpeech::recognized(&[]);
        let mut interview = interview();

        let result = begin_session(&mut interview, &llm, &speech).await;
        assert!(matches!(result, Err(AppError::Generation(_))));
        assert!(interview.session.is_none());
    }

    #[tokio::test]
    async fn test_three_advances_complete_a_three_question_interview() {
        let llm = ScriptedGenerator::new(vec![
            Ok("Q1\nQ2\nQ3".to_string()),
            Ok("Solid answers overall.".to_string()),
        ]);
        let speech = ScriptedSpeech::recognized(&["intro", "a", "b", "c"]);
        let mut interview = interview();

        begin_session(&mut interview, &llm, &speech).await.unwrap();
        assert_in_step(&interview);

        for _ in 0..3 {
            assert_eq!(interview.phase(), SessionPhase::InProgress);
            advance(&mut interview, &llm, &speech).await.unwrap();
            assert_in_step(&interview);
        }

        assert_eq!(interview.phase(), SessionPhase::Done);
        let session = interview.session.as_ref().unwrap();
        let answers: Vec<&str> = session.answers().iter().map(Transcript::as_text).collect();
        assert_eq!(answers, ["intro", "a", "b", "c"]);
        assert_eq!(session.feedback(), Some("Solid answers overall."));

        // All four questions were voiced in order.
        let spoken = speech.spoken.lock().unwrap().clone();
        assert_eq!(spoken, [OPENING_QUESTION, "Q1", "Q2", "Q3"]);
    }

    #[tokio::test]
    async fn test_failed_transcription_records_placeholder_and_session_continues() {
        let llm = ScriptedGenerator::new(vec![
            Ok("Q1\nQ2".to_string()),
            Ok("feedback".to_string()),
        ]);
        let speech = ScriptedSpeech::new(vec![
            Transcript::Recognized("intro".to_string()),
            Transcript::Failed,
            Transcript::Recognized("last".to_string()),
        ]);
        let mut interview = interview();

        begin_session(&mut interview, &llm, &speech).await.unwrap();
        advance(&mut interview, &llm, &speech).await.unwrap();

        {
            let session = interview.session.as_ref().unwrap();
            assert_eq!(session.answers()[1], Transcript::Failed);
            assert_eq!(session.answers()[1].as_text(), "Transcription failed.");
        }

        // The next explicit signal still advances the cursor.
        advance(&mut interview, &llm, &speech).await.unwrap();
        assert_eq!(interview.phase(), SessionPhase::Done);
    }

    #[tokio::test]
    async fn test_synthesis_failure_skips_playback_but_not_the_answer() {
        let llm = ScriptedGenerator::new(vec![Ok("Q1".to_string())]);
        let mut speech = ScriptedSpeech::recognized(&["intro"]);
        speech.fail_speak = true;
        let mut interview = interview();

        begin_session(&mut interview, &llm, &speech).await.unwrap();

        let session = interview.session.as_ref().unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.answers()[0].as_text(), "intro");
    }

    #[tokio::test]
    async fn test_failed_feedback_call_stores_fixed_string() {
        let llm = ScriptedGenerator::new(vec![
            Ok("Q1".to_string()),
            Err(GenerationError::Api {
                status: 500,
                message: "down".to_string(),
            }),
        ]);
        let speech = ScriptedSpeech::recognized(&["intro", "a"]);
        let mut interview = interview();

        begin_session(&mut interview, &llm, &speech).await.unwrap();
        advance(&mut interview, &llm, &speech).await.unwrap();

        assert_eq!(interview.phase(), SessionPhase::Done);
        let session = interview.session.as_ref().unwrap();
        assert_eq!(session.feedback(), Some(FEEDBACK_FAILED));
    }

    #[tokio::test]
    async fn test_advance_without_a_session_is_rejected() {
        let llm = ScriptedGenerator::new(vec![]);
        let speech = ScriptedSpeech::recognized(&[]);
        let mut interview = interview();

        let result = advance(&mut interview, &llm, &speech).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_advance_after_completion_is_rejected() {
        let llm = ScriptedGenerator::new(vec![
            Ok("Q1".to_string()),
            Ok("feedback".to_string()),
        ]);
        let speech = ScriptedSpeech::recognized(&["intro", "a", "never used"]);
        let mut interview = interview();

        begin_session(&mut interview, &llm, &speech).await.unwrap();
        advance(&mut interview, &llm, &speech).await.unwrap();
        assert_eq!(interview.phase(), SessionPhase::Done);

        let result = advance(&mut interview, &llm, &speech).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_regeneration_replaces_the_session_wholesale() {
        let llm = ScriptedGenerator::new(vec![
            Ok("Q1\nQ2".to_string()),
            Ok("R1\nR2\nR3".to_string()),
        ]);
        let speech = ScriptedSpeech::recognized(&["first run", "second run"]);
        let mut interview = interview();

        begin_session(&mut interview, &llm, &speech).await.unwrap();
        begin_session(&mut interview, &llm, &speech).await.unwrap();

        let session = interview.session.as_ref().unwrap();
        assert_eq!(session.questions().len(), 4); // opener + R1..R3
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.answers()[0].as_text(), "second run");
    }
}
