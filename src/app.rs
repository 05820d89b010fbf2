use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::config::Config;
use crate::export::{default_file_name, export_to_path, ExportError, ExportFormat};
use crate::mastery::{evaluate_level, MasteryReport};
use crate::participant::{ParticipantConfig, GRADE_LEVELS, READING_LEVELS};
use crate::progress::ProgressSummary;
use crate::record::{next_session_number, Phase, SessionRecord};
use crate::session::{build_questions, AnswerResult, SessionEvent, SessionRunner};
use crate::speech::Speaker;
use crate::store::{KeyValueStore, ParticipantStore, StoreError};
use crate::words::{
    sight_words, TargetWordList, WordListError, BUILTIN_LEVELS, CUSTOM_LEVEL, QUICK_ADD_SUGGESTIONS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Playing,
    History,
    WordManager,
    ParticipantSetup,
    SwitchParticipant,
}

#[derive(Debug, Error)]
pub enum StartError {
    #[error("set up target words first: {0}")]
    TargetWords(#[from] WordListError),
    #[error("level {level} is locked until level {requires} is mastered")]
    Locked { level: u8, requires: u8 },
}

/// Draft state of the target-word editor
#[derive(Debug, Clone, Default)]
pub struct WordEditor {
    pub draft: TargetWordList,
    pub input: String,
    pub selected: usize,
}

pub struct App {
    pub config: Config,
    pub screen: Screen,
    pub level: u8,
    pub history: Vec<SessionRecord>,
    pub target_words: TargetWordList,
    pub participant_config: Option<ParticipantConfig>,
    pub session: Option<SessionRunner>,
    pub word_editor: WordEditor,
    pub setup_draft: ParticipantConfig,
    pub participant_input: String,
    pub history_scroll: usize,
    pub status: Option<String>,
    pub should_quit: bool,
    store: ParticipantStore<Box<dyn KeyValueStore>>,
    /// Finished sessions the store refused; retried with the next append
    unsaved: Vec<SessionRecord>,
    speaker: Box<dyn Speaker>,
    rng: StdRng,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("participant", &self.participant())
            .field("screen", &self.screen)
            .field("level", &self.level)
            .field("sessions", &self.history.len())
            .finish()
    }
}

impl App {
    pub fn new(config: Config, store: Box<dyn KeyValueStore>, speaker: Box<dyn Speaker>) -> Self {
        Self::with_rng(config, store, speaker, StdRng::from_entropy())
    }

    /// Deterministic question order for tests and replays
    pub fn with_rng(
        config: Config,
        store: Box<dyn KeyValueStore>,
        speaker: Box<dyn Speaker>,
        rng: StdRng,
    ) -> Self {
        let store = ParticipantStore::new(store, &config.participant_id);
        let mut app = Self {
            level: config.level,
            config,
            screen: Screen::Home,
            history: Vec::new(),
            target_words: TargetWordList::new(),
            participant_config: None,
            session: None,
            word_editor: WordEditor::default(),
            setup_draft: ParticipantConfig::default(),
            participant_input: String::new(),
            history_scroll: 0,
            status: None,
            should_quit: false,
            store,
            unsaved: Vec::new(),
            speaker,
            rng,
        };
        app.reload_participant();
        app
    }

    pub fn participant(&self) -> &str {
        self.store.participant()
    }

    fn reload_participant(&mut self) {
        self.history = self.store.load_sessions();
        self.target_words = self.store.load_target_words();
        self.participant_config = self.store.load_participant_config();
        self.history_scroll = 0;
        info!(
            "loaded participant {}: {} sessions, {} target words",
            self.participant(),
            self.history.len(),
            self.target_words.len()
        );
    }

    pub fn switch_participant(&mut self, id: &str) {
        self.session = None;
        if !self.unsaved.is_empty() {
            let unsaved = std::mem::take(&mut self.unsaved);
            if let Err(e) = self.store.append_sessions(&unsaved) {
                warn!(
                    "dropping {} unsaved session(s) of {}: {e}",
                    unsaved.len(),
                    self.participant()
                );
            }
        }
        self.store.switch_participant(id);
        self.config.participant_id = self.participant().to_string();
        self.reload_participant();
        self.status = Some(format!("Participant {}", self.participant()));
        self.screen = Screen::Home;
    }

    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary::from_history(&self.history)
    }

    pub fn mastery(&self) -> MasteryReport {
        evaluate_level(&self.history, self.level)
    }

    /// Level that must be mastered before `level` opens, if any
    pub fn required_level(level: u8) -> Option<u8> {
        match level {
            CUSTOM_LEVEL => BUILTIN_LEVELS.last().copied(),
            1 => None,
            n => Some(n - 1),
        }
    }

    /// Level 1 is always open; every other level needs its predecessor mastered
    pub fn level_unlocked(&self, level: u8) -> bool {
        Self::required_level(level)
            .map_or(true, |required| evaluate_level(&self.history, required).achieved)
    }

    pub fn next_session_number(&self, phase: Phase) -> u32 {
        let level = match phase {
            Phase::Baseline => CUSTOM_LEVEL,
            Phase::Intervention => self.level,
        };
        next_session_number(&self.history, level, phase)
    }

    /// Start an intervention session at `level` (0 = custom target words)
    pub fn start_session(&mut self, level: u8) -> Result<(), StartError> {
        if level == CUSTOM_LEVEL {
            if let Err(e) = self.target_words.ensure_ready() {
                self.open_word_manager();
                self.status = Some(format!("Please set up target words first ({e})"));
                return Err(e.into());
            }
        }
        if !self.level_unlocked(level) {
            let requires = Self::required_level(level).unwrap_or(level);
            self.status = Some(format!("Level {level} is locked. Master level {requires} first."));
            return Err(StartError::Locked { level, requires });
        }
        let pool: Vec<String> = if level == CUSTOM_LEVEL {
            self.target_words.words().to_vec()
        } else {
            sight_words(level).iter().map(|w| w.to_string()).collect()
        };
        self.level = level;
        self.config.level = level;
        let number = self.next_session_number(Phase::Intervention);
        self.begin(level, Phase::Intervention, number, &pool);
        Ok(())
    }

    /// Untimed, unprompted probe over the target words
    pub fn start_baseline(&mut self) -> Result<(), StartError> {
        if let Err(e) = self.target_words.ensure_ready() {
            self.open_word_manager();
            self.status = Some(format!("Baseline needs target words ({e})"));
            return Err(e.into());
        }
        let pool = self.target_words.words().to_vec();
        let number = self.next_session_number(Phase::Baseline);
        self.begin(CUSTOM_LEVEL, Phase::Baseline, number, &pool);
        Ok(())
    }

    fn begin(&mut self, level: u8, phase: Phase, number: u32, pool: &[String]) {
        let questions = build_questions(pool, self.config.session_length(), &mut self.rng);
        info!(
            "starting {phase} session {number} at level {level} with {} questions",
            questions.len()
        );
        self.session = Some(SessionRunner::new(
            number,
            level,
            phase,
            questions,
            self.config.timing(),
        ));
        self.status = None;
        self.screen = Screen::Playing;
        self.dispatch_session_events();
    }

    pub fn on_tick(&mut self, dt: Duration) {
        if let Some(runner) = self.session.as_mut() {
            runner.on_tick(dt);
            self.dispatch_session_events();
        }
    }

    pub fn answer_option(&mut self, index: usize) -> AnswerResult {
        let result = match self.session.as_mut() {
            Some(runner) => runner.answer_index(index),
            None => AnswerResult::Ignored,
        };
        self.dispatch_session_events();
        result
    }

    fn dispatch_session_events(&mut self) {
        let Some(runner) = self.session.as_mut() else {
            return;
        };
        let mut completed = false;
        for event in runner.drain_events() {
            match event {
                SessionEvent::Speak(word) => self.speaker.speak(&word),
                SessionEvent::Completed => completed = true,
                SessionEvent::PromptShown | SessionEvent::TimedOut | SessionEvent::Advanced(_) => {}
            }
        }
        if completed {
            self.finish_session();
        }
    }

    fn finish_session(&mut self) {
        let Some(runner) = self.session.take() else {
            return;
        };
        let record = runner.into_record();
        let summary = format!(
            "Session {} finished: {:.0}% accuracy ({} correct, {} assisted, {} no answer)",
            record.session_number,
            record.accuracy,
            record.correct_answers,
            record.assisted_answers,
            record.no_answers
        );
        self.unsaved.push(record.clone());
        let summary = match self.store.append_sessions(&self.unsaved) {
            Ok(history) => {
                self.unsaved.clear();
                self.history = history;
                summary
            }
            Err(e) => {
                warn!("failed to save session, {} pending: {e}", self.unsaved.len());
                self.history.push(record);
                format!("{summary}, but not written to storage yet ({e})")
            }
        };
        let mastery = self.mastery();
        self.status = Some(if mastery.achieved {
            format!("{summary}. Mastery reached at level {}!", self.level)
        } else {
            summary
        });
        self.history_scroll = 0;
        self.screen = Screen::History;
    }

    /// Abort the running session; nothing is recorded
    pub fn cancel_session(&mut self) {
        if self.session.take().is_some() {
            info!("session cancelled");
            self.status = Some("Session cancelled".to_string());
        }
        self.screen = Screen::History;
    }

    pub fn open_word_manager(&mut self) {
        self.word_editor = WordEditor {
            draft: self.target_words.clone(),
            ..WordEditor::default()
        };
        self.screen = Screen::WordManager;
    }

    pub fn add_word_from_input(&mut self) {
        let input = std::mem::take(&mut self.word_editor.input);
        match self.word_editor.draft.add(&input) {
            Ok(()) => self.status = None,
            Err(WordListError::Empty) => {}
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Add the first suggestion not already on the draft list
    pub fn quick_add_suggestion(&mut self) -> Option<&'static str> {
        let next = QUICK_ADD_SUGGESTIONS
            .iter()
            .find(|w| !self.word_editor.draft.contains(w))
            .copied()?;
        let _ = self.word_editor.draft.add(next);
        Some(next)
    }

    pub fn remove_selected_word(&mut self) {
        let editor = &mut self.word_editor;
        editor.draft.remove(editor.selected);
        if editor.selected >= editor.draft.len() {
            editor.selected = editor.draft.len().saturating_sub(1);
        }
    }

    pub fn save_words(&mut self) -> Result<(), StoreError> {
        let draft = self.word_editor.draft.clone();
        if let Err(e) = self.store.save_target_words(&draft) {
            self.status = Some(format!("Please add at least 10 words ({e})"));
            return Err(e);
        }
        self.target_words = draft;
        self.status = Some(format!("Saved {} target words", self.target_words.len()));
        self.screen = Screen::Home;
        Ok(())
    }

    pub fn open_participant_setup(&mut self) {
        self.setup_draft = self.participant_config.unwrap_or_default();
        self.screen = Screen::ParticipantSetup;
    }

    pub fn adjust_grade(&mut self, delta: i8) {
        self.setup_draft.grade_level = step_within(self.setup_draft.grade_level, delta, &GRADE_LEVELS);
    }

    pub fn adjust_reading(&mut self, delta: i8) {
        self.setup_draft.reading_level =
            step_within(self.setup_draft.reading_level, delta, &READING_LEVELS);
    }

    pub fn save_participant_setup(&mut self) -> Result<(), StoreError> {
        let draft = self.setup_draft;
        if let Err(e) = self.store.save_participant_config(&draft) {
            self.status = Some(e.to_string());
            return Err(e);
        }
        self.participant_config = Some(draft);
        self.status = Some(format!(
            "Saved grade {} / reading level {}",
            draft.grade_level, draft.reading_level
        ));
        self.screen = Screen::Home;
        Ok(())
    }

    /// Write the history to the export directory and report where it went
    pub fn export_history(&mut self, format: ExportFormat) -> Result<PathBuf, ExportError> {
        let dir = AppDirs::export_dir().unwrap_or_else(|| PathBuf::from("."));
        let path = dir.join(default_file_name(self.participant(), format));
        self.export_history_to(&path, format)?;
        Ok(path)
    }

    pub fn export_history_to(
        &mut self,
        path: &std::path::Path,
        format: ExportFormat,
    ) -> Result<(), ExportError> {
        match export_to_path(path, format, self.participant(), &self.history) {
            Ok(()) => {
                info!("exported {} sessions to {}", self.history.len(), path.display());
                self.status = Some(format!("Exported to {}", path.display()));
                Ok(())
            }
            Err(e) => {
                warn!("export failed: {e}");
                self.status = Some(format!("Export failed: {e}"));
                Err(e)
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Home => self.on_home_key(key),
            Screen::Playing => match key.code {
                KeyCode::Esc => self.cancel_session(),
                KeyCode::Char(c @ '1'..='4') => {
                    self.answer_option(c as usize - '1' as usize);
                }
                _ => {}
            },
            Screen::History => match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('n') | KeyCode::Enter => {
                    self.screen = Screen::Home
                }
                KeyCode::Up => self.history_scroll = self.history_scroll.saturating_sub(1),
                KeyCode::Down => self.history_scroll += 1,
                KeyCode::Home => self.history_scroll = 0,
                KeyCode::Char('e') => {
                    let _ = self.export_history(ExportFormat::Csv);
                }
                KeyCode::Char('j') => {
                    let _ = self.export_history(ExportFormat::Json);
                }
                _ => {}
            },
            Screen::WordManager => self.on_word_manager_key(key),
            Screen::ParticipantSetup => match key.code {
                KeyCode::Esc => self.screen = Screen::Home,
                KeyCode::Left => self.adjust_grade(-1),
                KeyCode::Right => self.adjust_grade(1),
                KeyCode::Down => self.adjust_reading(-1),
                KeyCode::Up => self.adjust_reading(1),
                KeyCode::Enter => {
                    let _ = self.save_participant_setup();
                }
                _ => {}
            },
            Screen::SwitchParticipant => match key.code {
                KeyCode::Esc => self.screen = Screen::Home,
                KeyCode::Enter => {
                    let id = std::mem::take(&mut self.participant_input);
                    self.switch_participant(&id);
                }
                KeyCode::Backspace => {
                    self.participant_input.pop();
                }
                KeyCode::Char(c) if !c.is_whitespace() => self.participant_input.push(c),
                _ => {}
            },
        }
    }

    fn on_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c @ '0'..='3') => {
                let _ = self.start_session(c as u8 - b'0');
            }
            KeyCode::Char('b') => {
                let _ = self.start_baseline();
            }
            KeyCode::Char('w') => self.open_word_manager(),
            KeyCode::Char('c') => self.open_participant_setup(),
            KeyCode::Char('h') => self.screen = Screen::History,
            KeyCode::Char('p') => {
                self.participant_input = self.participant().to_string();
                self.screen = Screen::SwitchParticipant;
            }
            _ => {}
        }
    }

    fn on_word_manager_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            let _ = self.save_words();
            return;
        }
        match key.code {
            KeyCode::Esc => self.screen = Screen::Home,
            KeyCode::Enter => self.add_word_from_input(),
            KeyCode::Backspace => {
                self.word_editor.input.pop();
            }
            KeyCode::Delete => self.remove_selected_word(),
            KeyCode::Tab => {
                self.quick_add_suggestion();
            }
            KeyCode::Up => {
                self.word_editor.selected = self.word_editor.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.word_editor.selected + 1 < self.word_editor.draft.len() {
                    self.word_editor.selected += 1;
                }
            }
            KeyCode::Char(c) if !c.is_whitespace() => self.word_editor.input.push(c),
            _ => {}
        }
    }
}

fn step_within(value: u8, delta: i8, range: &std::ops::RangeInclusive<u8>) -> u8 {
    let next = value as i16 + delta as i16;
    next.clamp(*range.start() as i16, *range.end() as i16) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SessionOutcome;
    use crate::speech::SilentSpeaker;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;
    use std::cell::Cell;
    use std::rc::Rc;

    fn app() -> App {
        App::with_rng(
            Config {
                participant_id: "P1".into(),
                ..Config::default()
            },
            Box::new(MemoryStore::new()),
            Box::new(SilentSpeaker),
            StdRng::seed_from_u64(3),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Four perfect sessions: two immediate, then two delayed at 100%
    fn master(app: &mut App, level: u8) {
        for n in 1..=4 {
            app.history.push(SessionRecord::new(
                n,
                level,
                Phase::Intervention,
                SessionOutcome {
                    correct: 10,
                    total: 10,
                    ..Default::default()
                },
            ));
        }
    }

    /// Key-value store whose writes fail while the flag is set
    struct FailingWrites {
        inner: MemoryStore,
        fail: Rc<Cell<bool>>,
    }

    impl KeyValueStore for FailingWrites {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }
        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail.get() {
                return Err(StoreError::Json(serde_json::from_str::<u8>("x").unwrap_err()));
            }
            self.inner.set(key, value)
        }
        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.keys()
        }
    }

    fn play_out(app: &mut App) {
        for _ in 0..5000 {
            if app.session.is_none() {
                return;
            }
            app.on_tick(Duration::from_millis(100));
        }
        panic!("session did not finish");
    }

    #[test]
    fn custom_level_requires_ten_target_words() {
        let mut app = app();
        assert_matches!(app.start_session(0), Err(StartError::TargetWords(_)));
        assert_eq!(app.screen, Screen::WordManager);
        assert!(app.session.is_none());
    }

    #[test]
    fn baseline_requires_ten_target_words() {
        let mut app = app();
        assert_matches!(app.start_baseline(), Err(StartError::TargetWords(_)));
        assert_eq!(app.screen, Screen::WordManager);
    }

    #[test]
    fn unanswered_session_is_recorded_as_no_answers() {
        let mut app = app();
        app.start_session(1).unwrap();
        assert_eq!(app.screen, Screen::Playing);
        play_out(&mut app);
        assert_eq!(app.screen, Screen::History);
        assert_eq!(app.history.len(), 1);
        let rec = &app.history[0];
        assert_eq!(rec.no_answers, 10);
        assert_eq!(rec.accuracy, 0.0);
        assert_eq!(app.next_session_number(Phase::Intervention), 2);
    }

    #[test]
    fn cancelled_session_records_nothing() {
        let mut app = app();
        app.start_session(1).unwrap();
        app.on_key(key(KeyCode::Esc));
        assert!(app.session.is_none());
        assert!(app.history.is_empty());
        assert_eq!(app.screen, Screen::History);
    }

    #[test]
    fn word_manager_flow_enables_custom_sessions() {
        let mut app = app();
        app.on_key(key(KeyCode::Char('w')));
        assert_eq!(app.screen, Screen::WordManager);
        for c in "friend".chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
        app.on_key(key(KeyCode::Enter));
        assert!(app.word_editor.draft.contains("friend"));

        assert!(app.save_words().is_err());
        for _ in 0..9 {
            app.on_key(key(KeyCode::Tab));
        }
        app.on_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.screen, Screen::Home);
        assert_eq!(app.target_words.len(), 10);

        assert_matches!(
            app.start_session(0),
            Err(StartError::Locked { level: 0, requires: 3 })
        );
        master(&mut app, 3);
        app.start_session(0).unwrap();
        let q = app.session.as_ref().unwrap().current_question().unwrap();
        assert!(app.target_words.contains(&q.word));
    }

    #[test]
    fn participant_setup_clamps_and_validates() {
        let mut app = app();
        app.open_participant_setup();
        for _ in 0..10 {
            app.adjust_grade(1);
        }
        assert_eq!(app.setup_draft.grade_level, 8);
        app.setup_draft.reading_level = 8;
        assert!(app.save_participant_setup().is_err());
        app.adjust_reading(-6);
        assert_eq!(app.setup_draft.reading_level, 2);
        app.save_participant_setup().unwrap();
        assert_eq!(app.participant_config, ParticipantConfig::new(8, 2).ok());
    }

    #[test]
    fn switching_participant_isolates_history() {
        let mut app = app();
        app.start_session(1).unwrap();
        play_out(&mut app);
        assert_eq!(app.history.len(), 1);

        app.switch_participant("P2");
        assert_eq!(app.participant(), "P2");
        assert!(app.history.is_empty());

        app.switch_participant("P1");
        assert_eq!(app.history.len(), 1);
    }

    #[test]
    fn home_keys_start_sessions_and_quit() {
        let mut app = app();
        app.on_key(key(KeyCode::Char('3')));
        assert_eq!(app.screen, Screen::Home);
        assert!(app.session.is_none());
        master(&mut app, 2);
        app.on_key(key(KeyCode::Char('3')));
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.level, 3);
        app.on_key(key(KeyCode::Esc));
        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Home);
        app.on_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn levels_unlock_in_a_chain() {
        let mut app = app();
        assert!(app.level_unlocked(1));
        assert!(!app.level_unlocked(2));
        assert!(!app.level_unlocked(3));
        assert!(!app.level_unlocked(CUSTOM_LEVEL));

        assert_matches!(
            app.start_session(3),
            Err(StartError::Locked { level: 3, requires: 2 })
        );
        assert!(app.session.is_none());
        assert!(app.status.as_deref().unwrap_or("").contains("Master level 2"));

        master(&mut app, 1);
        assert!(app.level_unlocked(2));
        assert!(!app.level_unlocked(3));
        app.start_session(2).unwrap();
        assert_eq!(app.screen, Screen::Playing);
        app.cancel_session();

        master(&mut app, 2);
        master(&mut app, 3);
        assert!(app.level_unlocked(3));
        assert!(app.level_unlocked(CUSTOM_LEVEL));
    }

    #[test]
    fn zero_question_config_still_asks_one_question() {
        let mut app = App::with_rng(
            Config {
                questions_per_session: 0,
                ..Config::default()
            },
            Box::new(MemoryStore::new()),
            Box::new(SilentSpeaker),
            StdRng::seed_from_u64(3),
        );
        app.start_session(1).unwrap();
        assert_eq!(app.screen, Screen::Playing);
        assert!(app.history.is_empty());
        play_out(&mut app);
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.history[0].total_questions, 1);
    }

    #[test]
    fn unsaved_session_is_written_with_the_next_one() {
        let fail = Rc::new(Cell::new(true));
        let mut app = App::with_rng(
            Config {
                participant_id: "P1".into(),
                ..Config::default()
            },
            Box::new(FailingWrites {
                inner: MemoryStore::new(),
                fail: Rc::clone(&fail),
            }),
            Box::new(SilentSpeaker),
            StdRng::seed_from_u64(3),
        );

        app.start_session(1).unwrap();
        play_out(&mut app);
        assert_eq!(app.history.len(), 1);
        assert!(app.status.as_deref().unwrap_or("").contains("not written"));
        assert!(app.store.load_sessions().is_empty());

        fail.set(false);
        app.start_session(1).unwrap();
        play_out(&mut app);
        let stored = app.store.load_sessions();
        assert_eq!(
            stored.iter().map(|s| s.session_number).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert_eq!(app.history.len(), 2);
        assert!(app.unsaved.is_empty());
    }

    #[test]
    fn step_within_clamps() {
        assert_eq!(step_within(5, -1, &GRADE_LEVELS), 5);
        assert_eq!(step_within(7, 1, &GRADE_LEVELS), 8);
        assert_eq!(step_within(1, -3, &READING_LEVELS), 1);
    }
}
