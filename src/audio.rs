//! Audio dispatch
//!
//! The game never plays sound itself. It hands named cues to an optional
//! `AudioSink`; with no sink attached every cue is silently dropped.

use crate::settings::Settings;
use crate::sim::SoundCue;

/// Anything that can play a named sound effect or music cue
pub trait AudioSink {
    /// Fire-and-forget playback of `event` (e.g. "shoot", "bgm_start")
    fn play(&mut self, event: &str);
}

/// Sink that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogAudio {
    pub played: Vec<String>,
}

impl AudioSink for LogAudio {
    fn play(&mut self, event: &str) {
        log::debug!("audio: {}", event);
        self.played.push(event.to_string());
    }
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Option<Box<dyn AudioSink>>,
    sfx_enabled: bool,
    music_enabled: bool,
    muted: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioManager {
    pub fn new(sink: Option<Box<dyn AudioSink>>) -> Self {
        if sink.is_none() {
            log::info!("No audio sink attached - audio disabled");
        }
        Self {
            sink,
            sfx_enabled: true,
            music_enabled: true,
            muted: false,
        }
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn AudioSink>>) {
        self.sink = sink;
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sfx_enabled = settings.sfx_enabled;
        self.music_enabled = settings.music_enabled;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Music cues are gated by the music toggle, the rest by the sfx toggle
    fn enabled_for(&self, cue: SoundCue) -> bool {
        if self.muted {
            return false;
        }
        match cue {
            SoundCue::BgmStart | SoundCue::BgmPause | SoundCue::BgmResume => self.music_enabled,
            _ => self.sfx_enabled,
        }
    }

    pub fn play(&mut self, cue: SoundCue) {
        if !self.enabled_for(cue) {
            return;
        }
        if let Some(sink) = &mut self.sink {
            sink.play(cue.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Shared(Rc<RefCell<Vec<String>>>);

    impl AudioSink for Shared {
        fn play(&mut self, event: &str) {
            self.0.borrow_mut().push(event.to_string());
        }
    }

    #[test]
    fn test_without_sink_is_silent() {
        let mut audio = AudioManager::default();
        audio.play(SoundCue::Shoot);
    }

    #[test]
    fn test_settings_gate_cues() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut audio = AudioManager::new(Some(Box::new(Shared(log.clone()))));
        let settings = Settings {
            music_enabled: false,
            ..Settings::default()
        };
        audio.apply_settings(&settings);
        audio.play(SoundCue::BgmStart);
        audio.play(SoundCue::Match);
        assert_eq!(*log.borrow(), vec!["match".to_string()]);

        audio.toggle_mute();
        audio.play(SoundCue::Match);
        assert_eq!(log.borrow().len(), 1);
    }
}
