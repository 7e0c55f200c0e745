//! Sounds placed in the scene

use serde::{Deserialize, Serialize};
use void_core::Handle;

use crate::animation::AnimationTrack;
use crate::provenance::Provenance;

pub type SoundHandle = Handle<Sound>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SoundSettings {
    pub volume: f32,
    pub playback_rate: f32,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    pub autoplay: bool,
    pub spatial: bool,
    pub max_distance: f32,
    /// Where the audio came from when it is not embedded
    pub url: Option<String>,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            playback_rate: 1.0,
            loop_playback: false,
            autoplay: false,
            spatial: false,
            max_distance: 100.0,
            url: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sound {
    /// Sounds are addressed by name only
    pub name: String,
    pub settings: SoundSettings,
    /// Encoded audio bytes (ogg, mp3, wav)
    pub buffer: Option<Vec<u8>>,
    pub animations: Vec<AnimationTrack>,
    pub provenance: Provenance,
}

impl Sound {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: SoundSettings::default(),
            buffer: None,
            animations: Vec::new(),
            provenance: Provenance::Native,
        }
    }

    pub fn with_buffer(mut self, buffer: Vec<u8>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }
}
