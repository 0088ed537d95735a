//! Audio cue sinks.
//!
//! The session engine announces the last seconds of every interval through a
//! `CueSink`. Sinks are fire-and-forget: a failed cue is reported back to the
//! engine, which logs it and keeps timing.

use crate::{Error, Result};
use std::process::{Child, Command, Stdio};

/// Voice parameters passed with every cue
#[derive(Clone, Debug, PartialEq)]
pub struct CueSettings {
    pub locale: String,
    pub rate: f32,
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            locale: "ko-KR".into(),
            rate: 1.3,
        }
    }
}

/// Destination for spoken countdown cues
pub trait CueSink {
    /// Start speaking `text`; must not block until playback ends
    fn speak(&mut self, text: &str, locale: &str, rate: f32) -> Result<()>;

    /// Stop every cue that is still playing
    fn cancel_all(&mut self);
}

impl<C: CueSink + ?Sized> CueSink for Box<C> {
    fn speak(&mut self, text: &str, locale: &str, rate: f32) -> Result<()> {
        (**self).speak(text, locale, rate)
    }

    fn cancel_all(&mut self) {
        (**self).cancel_all()
    }
}

/// Sink that drops every cue
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentCueSink;

impl CueSink for SilentCueSink {
    fn speak(&mut self, _text: &str, _locale: &str, _rate: f32) -> Result<()> {
        Ok(())
    }

    fn cancel_all(&mut self) {}
}

/// Sink that hands each cue to an external text-to-speech program
///
/// Arguments may contain the placeholders `{text}`, `{locale}` and `{rate}`.
/// Spawned processes are tracked so `cancel_all` can kill the ones still
/// speaking.
pub struct CommandCueSink {
    program: String,
    args: Vec<String>,
    children: Vec<Child>,
}

impl CommandCueSink {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            children: Vec::new(),
        }
    }

    fn render_args(&self, text: &str, locale: &str, rate: f32) -> Vec<String> {
        let rate = rate.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{text}", text)
                    .replace("{locale}", locale)
                    .replace("{rate}", &rate)
            })
            .collect()
    }

    /// Forget children that already exited
    fn reap(&mut self) {
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }

    /// Number of cue processes still running
    pub fn in_flight(&mut self) -> usize {
        self.reap();
        self.children.len()
    }
}

impl CueSink for CommandCueSink {
    fn speak(&mut self, text: &str, locale: &str, rate: f32) -> Result<()> {
        self.reap();

        let child = Command::new(&self.program)
            .args(self.render_args(text, locale, rate))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Cue(format!("Failed to run {}: {}", self.program, e)))?;

        self.children.push(child);
        Ok(())
    }

    fn cancel_all(&mut self) {
        for mut child in self.children.drain(..) {
            if let Err(e) = child.kill() {
                tracing::debug!("Cue process already finished: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl Drop for CommandCueSink {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CueSettings::default();
        assert_eq!(settings.locale, "ko-KR");
        assert!((settings.rate - 1.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_placeholders_are_substituted() {
        let sink = CommandCueSink::new(
            "spd-say",
            vec!["-l".into(), "{locale}".into(), "-r".into(), "{rate}".into(), "{text}".into()],
        );
        let args = sink.render_args("3", "en-US", 1.5);
        assert_eq!(args, vec!["-l", "en-US", "-r", "1.5", "3"]);
    }

    #[test]
    fn test_missing_program_is_cue_error() {
        let mut sink = CommandCueSink::new("calis-no-such-tts-program", vec!["{text}".into()]);
        let result = sink.speak("5", "en-US", 1.0);
        assert!(matches!(result, Err(Error::Cue(_))));
        assert_eq!(sink.in_flight(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_all_kills_in_flight_cues() {
        let mut sink = CommandCueSink::new("sleep", vec!["5".into()]);
        sink.speak("ignored", "en-US", 1.0).unwrap();
        assert_eq!(sink.in_flight(), 1);

        sink.cancel_all();
        assert_eq!(sink.in_flight(), 0);
    }
}
