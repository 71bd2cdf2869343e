//! Prompt Builder — pure formatting of generation-endpoint prompts.
//!
//! Two operations: the question prompt sent once per interview, and the
//! feedback prompt built over the full Q/A history at completion. Both
//! are deterministic given identical inputs; no I/O happens here.

use thiserror::Error;

use crate::session::Domain;

pub mod prompts;

use self::prompts::{FEEDBACK_PROMPT_CLOSING, FEEDBACK_PROMPT_INTRO, QUESTION_PROMPT_TEMPLATE};

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("question/answer length mismatch: {questions} questions vs {answers} answers")]
    LengthMismatch { questions: usize, answers: usize },
}

/// Builds the question generation prompt for a resume and domain.
pub fn build_question_prompt(resume_text: &str, domain: Domain) -> String {
    QUESTION_PROMPT_TEMPLATE
        .replace("{domain}", &domain.to_string())
        .replace("{resume_text}", resume_text)
}

/// Builds the feedback prompt by interleaving questions and answers as
/// `Q: …\nA: …` blocks in index order, then appending the closing
/// instruction. Fails if the two sequences differ in length.
pub fn build_feedback_prompt(questions: &[String], answers: &[&str]) -> Result<String, PromptError> {
    if questions.len() != answers.len() {
        return Err(PromptError::LengthMismatch {
            questions: questions.len(),
            answers: answers.len(),
        });
    }

    let mut prompt = String::from(FEEDBACK_PROMPT_INTRO);
    for (question, answer) in questions.iter().zip(answers) {
        prompt.push_str(&format!("Q: {question}\nA: {answer}\n\n"));
    }
    prompt.push_str(FEEDBACK_PROMPT_CLOSING);
    Ok(prompt)
}

/// Splits raw generation output into trimmed, non-empty question lines.
pub fn split_question_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
