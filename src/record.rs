use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompting::{assist_weight, PromptConfig, PromptType};
use crate::util::percent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ResponseType {
    Correct,
    Assisted,
    NoAnswer,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Baseline,
    #[default]
    Intervention,
}

/// Session accuracy in percent, crediting assisted answers by the fading weight
pub fn session_accuracy(session_number: u32, correct: u32, assisted: u32, total: u32) -> f64 {
    let credited = correct as f64 + assisted as f64 * assist_weight(session_number);
    percent(credited, total as f64)
}

fn default_level() -> u8 {
    1
}

/// One finished session, as appended to a participant's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_number: u32,
    pub date: DateTime<Utc>,
    #[serde(default = "default_level")]
    pub level: u8,
    pub correct_answers: u32,
    pub assisted_answers: u32,
    pub no_answers: u32,
    pub total_questions: u32,
    pub accuracy: f64,
    pub time_to_respond: Vec<f64>,
    pub words_asked: Vec<String>,
    pub response_types: Vec<ResponseType>,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub prompt_type: Option<PromptType>,
}

/// Tallies produced by a finished session runner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOutcome {
    pub correct: u32,
    pub assisted: u32,
    pub no_answer: u32,
    pub total: u32,
    pub response_times: Vec<f64>,
    pub words_asked: Vec<String>,
    pub response_types: Vec<ResponseType>,
    pub coins: u32,
}

impl SessionRecord {
    pub fn new(session_number: u32, level: u8, phase: Phase, outcome: SessionOutcome) -> Self {
        Self::at(session_number, level, phase, outcome, Utc::now())
    }

    pub fn at(
        session_number: u32,
        level: u8,
        phase: Phase,
        outcome: SessionOutcome,
        date: DateTime<Utc>,
    ) -> Self {
        let prompt_type = match phase {
            Phase::Baseline => None,
            Phase::Intervention => Some(PromptConfig::for_session(session_number).prompt_type),
        };
        Self {
            session_number,
            date,
            level,
            correct_answers: outcome.correct,
            assisted_answers: outcome.assisted,
            no_answers: outcome.no_answer,
            total_questions: outcome.total,
            accuracy: session_accuracy(
                session_number,
                outcome.correct,
                outcome.assisted,
                outcome.total,
            ),
            time_to_respond: outcome.response_times,
            words_asked: outcome.words_asked,
            response_types: outcome.response_types,
            phase,
            prompt_type,
        }
    }

    /// Accuracy derived from the counts, ignoring the cached field
    pub fn computed_accuracy(&self) -> f64 {
        session_accuracy(
            self.session_number,
            self.correct_answers,
            self.assisted_answers,
            self.total_questions,
        )
    }

    /// Re-derive the cached accuracy; stored data may predate the weighting rule
    pub fn normalized(mut self) -> Self {
        self.accuracy = self.computed_accuracy();
        self
    }

    /// Prompt type for scoring; older records without one fall back to the schedule
    pub fn effective_prompt_type(&self) -> Option<PromptType> {
        match self.phase {
            Phase::Baseline => None,
            Phase::Intervention => self
                .prompt_type
                .or(Some(PromptConfig::for_session(self.session_number).prompt_type)),
        }
    }

    pub fn is_intervention(&self) -> bool {
        self.phase == Phase::Intervention
    }

    pub fn mean_response_time(&self) -> Option<f64> {
        crate::util::mean(&self.time_to_respond)
    }
}

/// Next session number for a level and phase: numbering restarts per level
pub fn next_session_number(history: &[SessionRecord], level: u8, phase: Phase) -> u32 {
    history
        .iter()
        .filter(|s| s.level == level && s.phase == phase)
        .count() as u32
        + 1
}
