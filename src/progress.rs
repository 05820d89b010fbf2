use crate::record::SessionRecord;
use crate::session::COINS_UNPROMPTED;
use crate::util::{mean, std_dev};

/// Running totals shown in the header bar
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSummary {
    pub total_score: u32,
    pub words_practiced: u32,
    pub sessions_completed: usize,
    pub mean_response_secs: Option<f64>,
    pub response_secs_std_dev: Option<f64>,
}

impl ProgressSummary {
    pub fn from_history(history: &[SessionRecord]) -> Self {
        let answered: Vec<f64> = history
            .iter()
            .flat_map(|s| s.time_to_respond.iter().copied())
            .collect();
        Self {
            total_score: history
                .iter()
                .map(|s| s.correct_answers * COINS_UNPROMPTED)
                .sum(),
            words_practiced: history.iter().map(|s| s.total_questions).sum(),
            sessions_completed: history.len(),
            mean_response_secs: mean(&answered),
            response_secs_std_dev: std_dev(&answered),
        }
    }
}
