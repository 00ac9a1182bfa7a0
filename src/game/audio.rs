// game/audio.rs

use super::progression::ProgressionError;
use super::store::KeyValueStore;
use bevy::prelude::Resource;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Storage key of the audio settings blob
pub const AUDIO_NAMESPACE: &str = "eggPartyAudioSettings";

/// Volume change of one key press
pub const VOLUME_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Music,
    Effects,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub bgm: f32,
    pub sfx: f32,
}

impl Default for Volume {
    fn default() -> Self {
        Self { bgm: 0.8, sfx: 0.9 }
    }
}

/// Mixer preferences, stored as `{ "volume": { "bgm": .., "sfx": .. }, "isMuted": .. }`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    #[serde(default)]
    pub volume: Volume,
    #[serde(rename = "isMuted", default)]
    pub muted: bool,
}

impl AudioSettings {
    pub fn volume(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Music => self.volume.bgm,
            Channel::Effects => self.volume.sfx,
        }
    }

    /// Set a channel volume, clamped to `0.0..=1.0`. Returns the stored value.
    pub fn set_volume(&mut self, channel: Channel, value: f32) -> f32 {
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
        match channel {
            Channel::Music => self.volume.bgm = value,
            Channel::Effects => self.volume.sfx = value,
        }
        value
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Gain actually applied to a channel
    pub fn gain(&self, channel: Channel) -> f32 {
        if self.muted { 0.0 } else { self.volume(channel) }
    }

    fn sanitized(mut self) -> Self {
        self.set_volume(Channel::Music, self.volume.bgm);
        self.set_volume(Channel::Effects, self.volume.sfx);
        self
    }
}

/// Audio settings together with the store they persist to
#[derive(Resource)]
pub struct AudioPreferences {
    settings: AudioSettings,
    store: Box<dyn KeyValueStore>,
}

impl AudioPreferences {
    /// Missing, unreadable or corrupt settings fall back to the defaults
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let settings = match store.get(AUDIO_NAMESPACE) {
            Ok(Some(raw)) => serde_json::from_str::<AudioSettings>(&raw)
                .map(AudioSettings::sanitized)
                .unwrap_or_else(|e| {
                    warn!("Discarding corrupt audio settings: {}", e);
                    AudioSettings::default()
                }),
            Ok(None) => AudioSettings::default(),
            Err(e) => {
                warn!("{}", e);
                AudioSettings::default()
            }
        };
        Self { settings, store }
    }

    pub fn settings(&self) -> AudioSettings {
        self.settings
    }

    /// Flip mute and save. The new state applies even if the save fails.
    pub fn toggle_mute(&mut self) -> Result<bool, ProgressionError> {
        let muted = self.settings.toggle_mute();
        info!("Audio {}", if muted { "muted" } else { "unmuted" });
        self.save()?;
        Ok(muted)
    }

    /// Shift both channels by `delta` and save
    pub fn nudge_volume(&mut self, delta: f32) -> Result<AudioSettings, ProgressionError> {
        for channel in [Channel::Music, Channel::Effects] {
            let current = self.settings.volume(channel);
            self.settings.set_volume(channel, current + delta);
        }
        info!(
            "Volume: music {:.1}, effects {:.1}",
            self.settings.volume.bgm, self.settings.volume.sfx
        );
        self.save()?;
        Ok(self.settings)
    }

    fn save(&mut self) -> Result<(), ProgressionError> {
        let json = serde_json::to_string(&self.settings)
            .map_err(|e| ProgressionError::PersistenceWriteFailure(e.to_string()))?;
        self.store.set(AUDIO_NAMESPACE, &json)
    }
}
