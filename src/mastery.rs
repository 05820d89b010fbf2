//! Mastery criteria over a participant's session history.
//!
//! Only intervention sessions count. Sessions are split by prompt type;
//! mastery is judged on the delayed-prompt (independent) sessions alone:
//!
//! - the last two delayed sessions each scored at least 90%, or
//! - the last three delayed sessions average at least 80%.
//!
//! Once the criteria hold for some prefix of the history the result is
//! latched, so later sessions never take mastery away.

use crate::prompting::PromptType;
use crate::record::SessionRecord;
use crate::util::mean;

pub const CONSECUTIVE_THRESHOLD: f64 = 90.0;
pub const CONSECUTIVE_WINDOW: usize = 2;
pub const AVERAGE_THRESHOLD: f64 = 80.0;
pub const AVERAGE_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Last two delayed sessions at or above 90%
    Consecutive,
    /// Mean of last three delayed sessions at or above 80%
    Average,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasteryReport {
    pub achieved: bool,
    /// Session number of the delayed session that first met the criteria
    pub achieved_at: Option<u32>,
    pub criterion: Option<Criterion>,
    /// Whether the criteria hold on the current tail of the history
    pub criteria_met_now: bool,
    /// Mean accuracy over every intervention session
    pub accuracy: f64,
    /// Mean accuracy over immediate-prompt sessions
    pub prompted_accuracy: f64,
    /// Mean accuracy over the last three delayed-prompt sessions
    pub unprompted_accuracy: f64,
    pub prompted_sessions: usize,
    pub unprompted_sessions: usize,
}

/// Check the criteria against the tail of a delayed-session accuracy series
pub fn criteria_met(delayed: &[f64]) -> Option<Criterion> {
    if delayed.len() >= CONSECUTIVE_WINDOW
        && delayed[delayed.len() - CONSECUTIVE_WINDOW..]
            .iter()
            .all(|a| *a >= CONSECUTIVE_THRESHOLD)
    {
        return Some(Criterion::Consecutive);
    }
    if delayed.len() >= AVERAGE_WINDOW {
        let tail = &delayed[delayed.len() - AVERAGE_WINDOW..];
        if mean(tail).unwrap_or(0.0) >= AVERAGE_THRESHOLD {
            return Some(Criterion::Average);
        }
    }
    None
}

/// Evaluate mastery over an ordered history (oldest first)
pub fn evaluate(history: &[SessionRecord]) -> MasteryReport {
    let intervention: Vec<&SessionRecord> =
        history.iter().filter(|s| s.is_intervention()).collect();
    if intervention.is_empty() {
        return MasteryReport::default();
    }

    let (prompted, unprompted): (Vec<&SessionRecord>, Vec<&SessionRecord>) = intervention
        .iter()
        .copied()
        .partition(|s| s.effective_prompt_type() == Some(PromptType::Immediate));

    let all: Vec<f64> = intervention.iter().map(|s| s.accuracy).collect();
    let prompted_acc: Vec<f64> = prompted.iter().map(|s| s.accuracy).collect();
    let delayed: Vec<f64> = unprompted.iter().map(|s| s.accuracy).collect();
    let recent = &delayed[delayed.len().saturating_sub(AVERAGE_WINDOW)..];

    let mut report = MasteryReport {
        accuracy: mean(&all).unwrap_or(0.0),
        prompted_accuracy: mean(&prompted_acc).unwrap_or(0.0),
        unprompted_accuracy: mean(recent).unwrap_or(0.0),
        prompted_sessions: prompted.len(),
        unprompted_sessions: unprompted.len(),
        criteria_met_now: criteria_met(&delayed).is_some(),
        ..Default::default()
    };

    for end in 1..=delayed.len() {
        if let Some(criterion) = criteria_met(&delayed[..end]) {
            report.achieved = true;
            report.achieved_at = Some(unprompted[end - 1].session_number);
            report.criterion = Some(criterion);
            break;
        }
    }

    report
}

/// Evaluate mastery for one level's sessions only
pub fn evaluate_level(history: &[SessionRecord], level: u8) -> MasteryReport {
    let at_level: Vec<SessionRecord> = history
        .iter()
        .filter(|s| s.level == level)
        .cloned()
        .collect();
    evaluate(&at_level)
}
