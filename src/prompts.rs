//! Prompt text for the scoring and composition oracles.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tuning the rating scale or the SMS
//!    instructions means editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the assembled prompts without
//!    spinning up a real completion service, so prompt regressions are easy
//!    to catch.

/// Instruction template for the composition oracle. `{job}` is replaced with
/// the posting's flattened field block.
///
/// The draft must not contain an application link: the link is appended
/// afterwards under program control so it is always present and undistorted.
const SMS_INSTRUCTION: &str = "Given the following job and its applicability based on my resume.

{job}

You are an assistant tasked with notifying me about new job openings that are suitable.
Write me an SMS message notifying me about the job and my applicability. Keep it short.
Just draft the message. Do not include links to apply.";

/// Build the evaluation prompt for the scoring oracle.
///
/// The contract asked of the oracle: a rating out of 10 for the posting with
/// respect to the résumé, kept short. The reply is stored verbatim — nothing
/// downstream parses it.
pub fn scoring_prompt(resume_text: &str, posting_fields: &str) -> String {
    format!(
        "Given the following resume:\n{resume_text}\n\
         Evaluate the applicability of the resume provided for the job below. \
         Show only an applicability score out of 10 for the job with respect \
         to the provided resume. Keep it short.\n{posting_fields}"
    )
}

/// Build the SMS drafting prompt for the composition oracle.
pub fn sms_prompt(posting_fields: &str) -> String {
    SMS_INSTRUCTION.replace("{job}", posting_fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoring_prompt_embeds_both_texts() {
        let prompt = scoring_prompt("Rust engineer, five years", "Subject : Backend Engineer");
        assert!(prompt.contains("Rust engineer, five years"));
        assert!(prompt.contains("Subject : Backend Engineer"));
        assert!(prompt.contains("score out of 10"));
    }

    #[test]
    fn sms_prompt_replaces_the_placeholder() {
        let prompt = sms_prompt("Subject : Backend Engineer");
        assert!(prompt.contains("Subject : Backend Engineer"));
        assert!(!prompt.contains("{job}"));
        assert!(prompt.contains("Do not include links"));
    }
}
