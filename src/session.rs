//! One quiz session: a fixed set of questions driven by elapsed-time ticks.
//!
//! Per question the runner moves through
//! `AwaitingPromptDelay -> PromptShown -> Answered -> (next question)`.
//! Immediate-prompt sessions start in `PromptShown`; baseline sessions sit in
//! `Unprompted` with no timer until the learner picks the right word.
//! Time only moves through [`SessionRunner::on_tick`], so dropping a runner
//! cancels every pending timer with it.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

use crate::prompting::{
    PromptConfig, FEEDBACK_DURATION, PROMPT_DELAY, RESPONSE_TIMEOUT, TRY_AGAIN_DURATION,
};
use crate::record::{Phase, ResponseType, SessionOutcome, SessionRecord};

pub const QUESTIONS_PER_SESSION: usize = 10;
pub const DISTRACTORS_PER_QUESTION: usize = 3;
pub const COINS_UNPROMPTED: u32 = 10;
pub const COINS_ASSISTED: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub word: String,
    pub options: Vec<String>,
}

/// Draw `count` target words from `pool`, each with up to three distractors from the same pool
pub fn build_questions<R: Rng + ?Sized>(pool: &[String], count: usize, rng: &mut R) -> Vec<Question> {
    pool.choose_multiple(rng, count)
        .map(|word| {
            let others: Vec<&String> = pool.iter().filter(|w| *w != word).collect();
            let mut options: Vec<String> = others
                .choose_multiple(rng, DISTRACTORS_PER_QUESTION)
                .map(|w| (*w).clone())
                .collect();
            options.push(word.clone());
            options.shuffle(rng);
            Question {
                word: word.clone(),
                options,
            }
        })
        .collect()
}

/// Timing knobs, defaulting to the protocol constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionTiming {
    pub response_timeout: Duration,
    pub prompt_delay: Duration,
    pub feedback: Duration,
    pub try_again: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            response_timeout: RESPONSE_TIMEOUT,
            prompt_delay: PROMPT_DELAY,
            feedback: FEEDBACK_DURATION,
            try_again: TRY_AGAIN_DURATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestionState {
    /// Baseline probe: no prompt and no timer
    Unprompted,
    AwaitingPromptDelay { remaining: Duration },
    PromptShown,
    Answered {
        response: ResponseType,
        remaining: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerResult {
    Correct,
    Assisted,
    TryAgain,
    /// Selection arrived while the question was not accepting answers
    Ignored,
}

/// Side effects the caller should carry out (speech, redraws)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Speak(String),
    PromptShown,
    TimedOut,
    Advanced(usize),
    Completed,
}

#[derive(Debug)]
pub struct SessionRunner {
    session_number: u32,
    level: u8,
    phase: Phase,
    prompt: PromptConfig,
    timing: SessionTiming,
    questions: Vec<Question>,
    current: usize,
    state: QuestionState,
    elapsed: Duration,
    try_again_remaining: Option<Duration>,
    outcome: SessionOutcome,
    finished: bool,
    events: Vec<SessionEvent>,
}

impl SessionRunner {
    pub fn new(
        session_number: u32,
        level: u8,
        phase: Phase,
        questions: Vec<Question>,
        timing: SessionTiming,
    ) -> Self {
        let mut runner = Self {
            session_number,
            level,
            phase,
            prompt: PromptConfig::with_delay(session_number, timing.prompt_delay),
            timing,
            questions,
            current: 0,
            state: QuestionState::Unprompted,
            elapsed: Duration::ZERO,
            try_again_remaining: None,
            outcome: SessionOutcome::default(),
            finished: false,
            events: Vec::new(),
        };
        if runner.questions.is_empty() {
            runner.finished = true;
            runner.events.push(SessionEvent::Completed);
        } else {
            runner.start_question();
        }
        runner
    }

    fn is_baseline(&self) -> bool {
        self.phase == Phase::Baseline
    }

    fn start_question(&mut self) {
        self.elapsed = Duration::ZERO;
        self.try_again_remaining = None;
        self.state = if self.is_baseline() {
            QuestionState::Unprompted
        } else if self.prompt.is_immediate() || self.prompt.delay.is_zero() {
            QuestionState::PromptShown
        } else {
            QuestionState::AwaitingPromptDelay {
                remaining: self.prompt.delay,
            }
        };
        if !self.is_baseline() {
            let word = self.questions[self.current].word.clone();
            self.events.push(SessionEvent::Speak(word));
        }
    }

    /// Advance the clocks by `dt`
    pub fn on_tick(&mut self, dt: Duration) {
        if self.finished {
            return;
        }

        if let Some(remaining) = self.try_again_remaining {
            self.try_again_remaining = remaining.checked_sub(dt).filter(|r| !r.is_zero());
        }

        match self.state {
            QuestionState::Unprompted => {}
            QuestionState::AwaitingPromptDelay { .. } | QuestionState::PromptShown => {
                self.elapsed += dt;
                if let QuestionState::AwaitingPromptDelay { remaining } = self.state {
                    match remaining.checked_sub(dt).filter(|r| !r.is_zero()) {
                        Some(left) => {
                            self.state = QuestionState::AwaitingPromptDelay { remaining: left }
                        }
                        None => {
                            self.state = QuestionState::PromptShown;
                            self.events.push(SessionEvent::PromptShown);
                        }
                    }
                }
                if self.elapsed >= self.timing.response_timeout {
                    self.record(
                        ResponseType::NoAnswer,
                        self.timing.response_timeout.as_secs_f64(),
                    );
                    self.events.push(SessionEvent::TimedOut);
                }
            }
            QuestionState::Answered {
                response,
                remaining,
            } => match remaining.checked_sub(dt).filter(|r| !r.is_zero()) {
                Some(left) => {
                    self.state = QuestionState::Answered {
                        response,
                        remaining: left,
                    }
                }
                None => self.advance(),
            },
        }
    }

    /// Learner picked `choice` for the current question
    pub fn answer(&mut self, choice: &str) -> AnswerResult {
        if self.finished || matches!(self.state, QuestionState::Answered { .. }) {
            return AnswerResult::Ignored;
        }
        if choice != self.questions[self.current].word {
            self.try_again_remaining = Some(self.timing.try_again);
            return AnswerResult::TryAgain;
        }

        let response = if self.state == QuestionState::PromptShown {
            ResponseType::Assisted
        } else {
            ResponseType::Correct
        };
        let response_secs = if self.is_baseline() {
            0.0
        } else {
            self.elapsed.as_secs_f64()
        };
        self.record(response, response_secs);
        match response {
            ResponseType::Assisted => AnswerResult::Assisted,
            _ => AnswerResult::Correct,
        }
    }

    /// Select by position in the option list (0-based)
    pub fn answer_index(&mut self, index: usize) -> AnswerResult {
        match self.current_question().and_then(|q| q.options.get(index)) {
            Some(choice) => {
                let choice = choice.clone();
                self.answer(&choice)
            }
            None => AnswerResult::Ignored,
        }
    }

    fn record(&mut self, response: ResponseType, response_secs: f64) {
        match response {
            ResponseType::Correct => {
                self.outcome.correct += 1;
                self.outcome.coins += COINS_UNPROMPTED;
            }
            ResponseType::Assisted => {
                self.outcome.assisted += 1;
                self.outcome.coins += COINS_ASSISTED;
            }
            ResponseType::NoAnswer => self.outcome.no_answer += 1,
        }
        self.outcome.response_times.push(response_secs);
        self.outcome.response_types.push(response);
        self.try_again_remaining = None;
        self.state = QuestionState::Answered {
            response,
            remaining: self.timing.feedback,
        };
    }

    fn advance(&mut self) {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.start_question();
            self.events.push(SessionEvent::Advanced(self.current));
        } else {
            self.finished = true;
            self.events.push(SessionEvent::Completed);
        }
    }

    /// Pending side effects, oldest first
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            None
        } else {
            self.questions.get(self.current)
        }
    }

    pub fn question_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn state(&self) -> QuestionState {
        self.state
    }

    pub fn prompt_config(&self) -> PromptConfig {
        self.prompt
    }

    pub fn session_number(&self) -> u32 {
        self.session_number
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whole seconds left on the response timer, `None` in baseline
    pub fn seconds_left(&self) -> Option<u64> {
        if self.is_baseline() {
            return None;
        }
        let left = self.timing.response_timeout.saturating_sub(self.elapsed);
        Some((left.as_millis() as u64).div_ceil(1000))
    }

    pub fn prompt_delay_remaining(&self) -> Option<Duration> {
        match self.state {
            QuestionState::AwaitingPromptDelay { remaining } => Some(remaining),
            _ => None,
        }
    }

    /// Whether the target word should be on screen
    pub fn word_visible(&self) -> bool {
        !matches!(self.state, QuestionState::AwaitingPromptDelay { .. })
    }

    pub fn showing_try_again(&self) -> bool {
        self.try_again_remaining.is_some()
    }

    pub fn coins(&self) -> u32 {
        self.outcome.coins
    }

    pub fn answered_count(&self) -> usize {
        self.outcome.response_types.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Tallies so far, with every question's word listed
    pub fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            total: self.questions.len() as u32,
            words_asked: self.questions.iter().map(|q| q.word.clone()).collect(),
            ..self.outcome.clone()
        }
    }

    pub fn into_record(self) -> SessionRecord {
        let outcome = self.outcome();
        SessionRecord::new(self.session_number, self.level, self.phase, outcome)
    }
}
