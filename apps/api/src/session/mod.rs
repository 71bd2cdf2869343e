//! Interview session state — the only stateful component in the service.
//!
//! An `Interview` is created at upload time and holds the extracted
//! resume text plus the chosen domain. A `Session` exists only once
//! question generation has succeeded; it owns the fixed question list,
//! the answers collected so far, and the cursor between them.
//!
//! Invariants, between steps: `answers.len() == current_index` and
//! `current_index <= questions.len()`.

pub mod driver;
pub mod handlers;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::GenerationError;
use crate::speech::Transcript;

/// Fixed synthetic opening question, prepended ahead of whatever the
/// generation endpoint produced.
pub const OPENING_QUESTION: &str = "Tell me about yourself.";

/// Interview subject area, chosen once per interview and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "IT")]
    It,
    #[serde(rename = "EEE Core")]
    EeeCore,
    #[serde(rename = "ECE Core")]
    EceCore,
    #[serde(rename = "CSE Core")]
    CseCore,
    #[serde(rename = "MECH Core")]
    MechCore,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::It,
        Domain::EeeCore,
        Domain::EceCore,
        Domain::CseCore,
        Domain::MechCore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Domain::It => "IT",
            Domain::EeeCore => "EEE Core",
            Domain::EceCore => "ECE Core",
            Domain::CseCore => "CSE Core",
            Domain::MechCore => "MECH Core",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
#[error("unknown domain '{0}'")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .iter()
            .copied()
            .find(|d| d.label() == s)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// Coarse lifecycle phase, derived from the session for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    InProgress,
    Done,
}

/// One interview resource: the uploaded resume plus, once questions are
/// generated, the live session. Dropped with the process — nothing is
/// persisted beyond one run.
#[derive(Debug)]
pub struct Interview {
    pub id: Uuid,
    pub file_name: String,
    pub resume_text: String,
    pub domain: Domain,
    pub created_at: DateTime<Utc>,
    pub session: Option<Session>,
}

impl Interview {
    pub fn new(file_name: String, resume_text: String, domain: Domain) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name,
            resume_text,
            domain,
            created_at: Utc::now(),
            session: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.session {
            None => SessionPhase::Idle,
            Some(s) if s.is_complete() => SessionPhase::Done,
            Some(_) => SessionPhase::InProgress,
        }
    }
}

/// The stateful record of one interview run: questions, answers, and the
/// current position. Mutated only by the driver.
#[derive(Debug)]
pub struct Session {
    questions: Vec<String>,
    current_index: usize,
    answers: Vec<Transcript>,
    opening_asked: bool,
    feedback: Option<String>,
}

impl Session {
    /// Builds a session from the generated question lines, prepending
    /// the fixed opening question. Zero usable lines fail generation.
    pub fn new(generated: Vec<String>) -> Result<Self, GenerationError> {
        if generated.is_empty() {
            return Err(GenerationError::Empty);
        }

        let mut questions = Vec::with_capacity(generated.len() + 1);
        questions.push(OPENING_QUESTION.to_string());
        questions.extend(generated);

        Ok(Self {
            questions,
            current_index: 0,
            answers: Vec::new(),
            opening_asked: false,
            feedback: None,
        })
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[Transcript] {
        &self.answers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn opening_asked(&self) -> bool {
        self.opening_asked
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// The next question to ask, if any remain.
    pub fn current_question(&self) -> Option<&str> {
        self.questions.get(self.current_index).map(String::as_str)
    }

    /// Every question has been asked and answered.
    pub fn is_complete(&self) -> bool {
        self.current_index == self.questions.len()
    }

    /// Stores the answer for the question at the cursor and advances it.
    pub(crate) fn record_answer(&mut self, transcript: Transcript) {
        self.answers.push(transcript);
        self.current_index += 1;
        self.opening_asked = true;
        debug_assert_eq!(self.answers.len(), self.current_index);
    }

    pub(crate) fn set_feedback(&mut self, text: String) {
        self.feedback = Some(text);
    }
}
