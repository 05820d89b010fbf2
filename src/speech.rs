use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Audio prompt output. Best effort: failures never reach the quiz.
pub trait Speaker {
    fn speak(&mut self, word: &str);
}

/// Speaker that stays quiet (muted sessions, tests, no TTS installed)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&mut self, word: &str) {
        debug!("muted prompt: {word}");
    }
}

/// Spawns an external text-to-speech program with the word as last argument
#[derive(Debug)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    child: Option<std::process::Child>,
}

impl CommandSpeaker {
    /// Parse a command line such as `espeak -s 120`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            child: None,
        })
    }

    /// First TTS program found on this platform
    pub fn detect() -> Option<Self> {
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &["say"]
        } else {
            &["espeak-ng", "espeak", "spd-say"]
        };
        candidates
            .iter()
            .find(|c| on_path(c))
            .and_then(|c| Self::from_command_line(c))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Stop the previous utterance so prompts never pile up
    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, word: &str) {
        self.cancel();
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(word)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match spawned {
            Ok(child) => self.child = Some(child),
            Err(e) => warn!("failed to run {}: {e}", self.program),
        }
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn on_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

/// Pick a speaker from settings: muted, explicit command, or autodetected
pub fn speaker_from_settings(mute: bool, command: Option<&str>) -> Box<dyn Speaker> {
    if mute {
        return Box::new(SilentSpeaker);
    }
    let speaker = match command {
        Some(cmd) => CommandSpeaker::from_command_line(cmd),
        None => CommandSpeaker::detect(),
    };
    match speaker {
        Some(s) => {
            debug!("speaking prompts with {}", s.program());
            Box::new(s)
        }
        None => {
            warn!("no text-to-speech program found; audio prompts disabled");
            Box::new(SilentSpeaker)
        }
    }
}

/// Records every utterance; clones share one log, so a boxed copy can be inspected later
#[derive(Debug, Default, Clone)]
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, word: &str) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(word.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_line() {
        let s = CommandSpeaker::from_command_line("espeak -s 120").unwrap();
        assert_eq!(s.program, "espeak");
        assert_eq!(s.args, vec!["-s".to_string(), "120".to_string()]);
        assert!(CommandSpeaker::from_command_line("   ").is_none());
    }

    #[test]
    fn missing_program_is_not_fatal() {
        let mut s =
            CommandSpeaker::from_command_line("definitely-not-a-tts-binary-xyz").unwrap();
        s.speak("the");
        assert!(s.child.is_none());
    }

    #[test]
    fn recording_speaker_keeps_order() {
        let log = RecordingSpeaker::default();
        let mut s: Box<dyn Speaker> = Box::new(log.clone());
        s.speak("the");
        s.speak("and");
        assert_eq!(log.spoken(), vec!["the", "and"]);
    }

    #[test]
    fn muted_settings_give_silent_speaker() {
        let mut s = speaker_from_settings(true, Some("espeak"));
        s.speak("quiet");
    }
}
