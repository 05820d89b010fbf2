//! Prompt fading schedule.
//!
//! The first two sessions at a level reveal the answer immediately
//! (errorless teaching). From the third session on the word is spoken
//! right away but the visual prompt only appears after a constant time
//! delay, so the learner gets a window to answer independently.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sessions up to and including this number use immediate prompting
pub const IMMEDIATE_PROMPT_SESSIONS: u32 = 2;

pub const PROMPT_DELAY: Duration = Duration::from_millis(3000);
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);
pub const FEEDBACK_DURATION: Duration = Duration::from_millis(2000);
pub const TRY_AGAIN_DURATION: Duration = Duration::from_millis(1500);

/// Credit for an assisted answer once prompting has faded
pub const FADED_ASSIST_WEIGHT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptType {
    Immediate,
    Delay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptConfig {
    pub prompt_type: PromptType,
    pub delay: Duration,
}

impl PromptConfig {
    pub fn for_session(session_number: u32) -> Self {
        Self::with_delay(session_number, PROMPT_DELAY)
    }

    /// Same schedule with a configurable constant delay
    pub fn with_delay(session_number: u32, delay: Duration) -> Self {
        if session_number <= IMMEDIATE_PROMPT_SESSIONS {
            Self {
                prompt_type: PromptType::Immediate,
                delay: Duration::ZERO,
            }
        } else {
            Self {
                prompt_type: PromptType::Delay,
                delay,
            }
        }
    }

    pub fn is_immediate(&self) -> bool {
        self.prompt_type == PromptType::Immediate
    }
}

/// Weight applied to assisted answers when scoring a session
pub fn assist_weight(session_number: u32) -> f64 {
    if session_number <= IMMEDIATE_PROMPT_SESSIONS {
        1.0
    } else {
        FADED_ASSIST_WEIGHT
    }
}
