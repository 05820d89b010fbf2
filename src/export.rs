use itertools::Itertools;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::SessionRecord;
use crate::util::round1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One flat CSV line per session
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    participant: &'a str,
    session_number: u32,
    date: String,
    level: u8,
    phase: String,
    prompt_type: String,
    correct: u32,
    assisted: u32,
    no_answer: u32,
    total: u32,
    accuracy: f64,
    mean_response_secs: String,
    words_asked: String,
    response_types: String,
    response_times: String,
}

impl<'a> CsvRow<'a> {
    fn new(participant: &'a str, s: &SessionRecord) -> Self {
        Self {
            participant,
            session_number: s.session_number,
            date: s.date.to_rfc3339(),
            level: s.level,
            phase: s.phase.to_string(),
            prompt_type: s
                .effective_prompt_type()
                .map(|p| p.to_string())
                .unwrap_or_default(),
            correct: s.correct_answers,
            assisted: s.assisted_answers,
            no_answer: s.no_answers,
            total: s.total_questions,
            accuracy: round1(s.accuracy),
            mean_response_secs: s
                .mean_response_time()
                .map(|t| format!("{:.1}", t))
                .unwrap_or_default(),
            words_asked: s.words_asked.join(";"),
            response_types: s.response_types.iter().join(";"),
            response_times: s
                .time_to_respond
                .iter()
                .map(|t| format!("{:.1}", t))
                .join(";"),
        }
    }
}

pub fn write_csv<W: Write>(
    writer: W,
    participant: &str,
    sessions: &[SessionRecord],
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for s in sessions {
        wtr.serialize(CsvRow::new(participant, s))?;
    }
    if sessions.is_empty() {
        wtr.write_record([
            "participant",
            "session_number",
            "date",
            "level",
            "phase",
            "prompt_type",
            "correct",
            "assisted",
            "no_answer",
            "total",
            "accuracy",
            "mean_response_secs",
            "words_asked",
            "response_types",
            "response_times",
        ])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    participant_id: &'a str,
    exported_at: String,
    sessions: &'a [SessionRecord],
}

pub fn write_json<W: Write>(
    writer: W,
    participant: &str,
    sessions: &[SessionRecord],
) -> Result<(), ExportError> {
    let doc = JsonExport {
        participant_id: participant,
        exported_at: chrono::Utc::now().to_rfc3339(),
        sessions,
    };
    serde_json::to_writer_pretty(writer, &doc)?;
    Ok(())
}

/// `<participant>_sessions_<YYYY-MM-DD>.<ext>`
pub fn default_file_name(participant: &str, format: ExportFormat) -> String {
    format!(
        "{}_sessions_{}.{}",
        participant,
        chrono::Local::now().format("%Y-%m-%d"),
        format.extension()
    )
}

/// Write a participant's history to `path`, creating parent directories
pub fn export_to_path(
    path: &Path,
    format: ExportFormat,
    participant: &str,
    sessions: &[SessionRecord],
) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    match format {
        ExportFormat::Csv => write_csv(file, participant, sessions),
        ExportFormat::Json => write_json(file, participant, sessions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Phase, ResponseType, SessionOutcome};
    use tempfile::tempdir;

    fn sample() -> Vec<SessionRecord> {
        vec![SessionRecord::new(
            3,
            1,
            Phase::Intervention,
            SessionOutcome {
                correct: 1,
                assisted: 1,
                no_answer: 0,
                total: 2,
                response_times: vec![1.0, 4.0],
                words_asked: vec!["the".into(), "and".into()],
                response_types: vec![ResponseType::Correct, ResponseType::Assisted],
                coins: 15,
            },
        )]
    }

    #[test]
    fn csv_has_header_and_flattened_lists() {
        let mut out = Vec::new();
        write_csv(&mut out, "P1", &sample()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("participant,session_number,date"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("P1,3,"));
        assert!(row.contains(",intervention,delay,1,1,0,2,52.5,2.5,the;and,correct;assisted,1.0;4.0"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn csv_of_empty_history_is_header_only() {
        let mut out = Vec::new();
        write_csv(&mut out, "P1", &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn json_export_wraps_sessions() {
        let mut out = Vec::new();
        write_json(&mut out, "P1", &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["participantId"], "P1");
        assert_eq!(value["sessions"][0]["wordsAsked"][1], "and");
    }

    #[test]
    fn export_to_path_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("out.json");
        export_to_path(&path, ExportFormat::Json, "P1", &sample()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn default_file_name_uses_extension() {
        let name = default_file_name("P2", ExportFormat::Csv);
        assert!(name.starts_with("P2_sessions_"));
        assert!(name.ends_with(".csv"));
    }
}
