//! Interactive confirmation

use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Failure to get an answer from the user
#[derive(Debug, Error)]
pub enum PromptError {
    /// Standard input was closed before an answer was given
    #[error("no answer to confirmation prompt (stdin closed); use --force to skip prompts")]
    Closed,

    /// Reading the answer failed
    #[error("failed to read answer: {0}")]
    Io(#[from] io::Error),
}

/// Asks yes/no questions before destructive steps
pub trait Confirm {
    /// Ask `question`; an empty answer means `default_yes`
    fn confirm(&mut self, question: &str, default_yes: bool) -> Result<bool, PromptError>;
}

/// Interpret a typed answer
///
/// `y` and `yes` (any case) accept; an empty answer takes the default;
/// anything else declines.
pub fn parse_answer(answer: &str, default_yes: bool) -> bool {
    let answer = answer.trim();
    if answer.is_empty() {
        return default_yes;
    }
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Prompts on stderr and reads the answer from stdin
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, question: &str, default_yes: bool) -> Result<bool, PromptError> {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        let mut stderr = io::stderr();
        write!(stderr, "{} {} ", question, hint)?;
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(PromptError::Closed);
        }
        Ok(parse_answer(&line, default_yes))
    }
}

/// Replays canned answers and records the questions asked
#[cfg(test)]
pub struct ScriptedConfirm {
    answers: std::collections::VecDeque<bool>,
    pub asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedConfirm {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            asked: Vec::new(),
        }
    }
}

#[cfg(test)]
impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, question: &str, _default_yes: bool) -> Result<bool, PromptError> {
        self.asked.push(question.to_string());
        self.answers.pop_front().ok_or(PromptError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y", false));
        assert!(parse_answer("YES\n", false));
        assert!(parse_answer(" Yes ", false));
        assert!(!parse_answer("no", true));
        assert!(!parse_answer("yep", true));
        assert!(parse_answer("", true));
        assert!(!parse_answer("\n", false));
    }

    #[test]
    fn test_prompt_errors_mention_the_cause() {
        let e = PromptError::from(io::Error::other("broken pipe"));
        assert_eq!(e.to_string(), "failed to read answer: broken pipe");
        assert!(PromptError::Closed.to_string().contains("--force"));
    }
}
