use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GRADE_LEVELS: std::ops::RangeInclusive<u8> = 5..=8;
pub const READING_LEVELS: std::ops::RangeInclusive<u8> = 1..=8;

/// Participant key used when none was given
pub const DEFAULT_PARTICIPANT: &str = "default";

#[derive(Debug, Error, PartialEq)]
pub enum ParticipantError {
    #[error("grade level {0} is outside 5-8")]
    GradeOutOfRange(u8),
    #[error("reading level {0} is outside 1-8")]
    ReadingOutOfRange(u8),
    #[error("reading level {reading} should be below grade level {grade} to show disparity")]
    NoDisparity { grade: u8, reading: u8 },
}

/// Normalize a user-supplied participant id: trimmed, `default` when blank
pub fn participant_key(id: &str) -> &str {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        DEFAULT_PARTICIPANT
    } else {
        trimmed
    }
}

/// Grade/reading placement for one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantConfig {
    pub grade_level: u8,
    pub reading_level: u8,
}

impl Default for ParticipantConfig {
    fn default() -> Self {
        Self {
            grade_level: 5,
            reading_level: 3,
        }
    }
}

/// Where a session's words come from, ordered from easiest to hardest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSource {
    AtReadingLevel(u8),
    Halfway(u8),
    AtGradeLevel(u8),
    Custom,
}

impl ParticipantConfig {
    pub fn new(grade_level: u8, reading_level: u8) -> Result<Self, ParticipantError> {
        let cfg = Self {
            grade_level,
            reading_level,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ParticipantError> {
        if !GRADE_LEVELS.contains(&self.grade_level) {
            return Err(ParticipantError::GradeOutOfRange(self.grade_level));
        }
        if !READING_LEVELS.contains(&self.reading_level) {
            return Err(ParticipantError::ReadingOutOfRange(self.reading_level));
        }
        if self.reading_level >= self.grade_level {
            return Err(ParticipantError::NoDisparity {
                grade: self.grade_level,
                reading: self.reading_level,
            });
        }
        Ok(())
    }

    pub fn halfway_level(&self) -> u8 {
        (self.reading_level + self.grade_level) / 2
    }

    pub fn word_sources(&self) -> [WordSource; 4] {
        [
            WordSource::AtReadingLevel(self.reading_level),
            WordSource::Halfway(self.halfway_level()),
            WordSource::AtGradeLevel(self.grade_level),
            WordSource::Custom,
        ]
    }
}

impl std::fmt::Display for WordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WordSource::AtReadingLevel(l) => write!(f, "Grade {l} words (at reading level)"),
            WordSource::Halfway(l) => write!(f, "Grade {l} words (halfway)"),
            WordSource::AtGradeLevel(l) => write!(f, "Grade {l} words (at grade level)"),
            WordSource::Custom => write!(f, "Custom intervention words"),
        }
    }
}
