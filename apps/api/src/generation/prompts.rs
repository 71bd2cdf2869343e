// All prompt constants for the interview generation module.

/// Question generation prompt template.
/// Replace: {domain}, {resume_text}
pub const QUESTION_PROMPT_TEMPLATE: &str = "\
Generate 20 interview questions for a candidate's mock interview in the {domain} domain. \
The questions should be based on the following resume text:

{resume_text}

Please provide 20 questions that align with the candidate's experience and the selected domain.";

/// Opening line of the feedback prompt, followed by one `Q:`/`A:` block per exchange.
pub const FEEDBACK_PROMPT_INTRO: &str =
    "Here are the questions and the corresponding responses from the mock interview:\n\n";

/// Closing instruction appended after the interleaved exchanges.
pub const FEEDBACK_PROMPT_CLOSING: &str =
    "Please provide feedback and areas of improvement for the user.";
