use serde::{Deserialize, Serialize};

use crate::core::numbering::NumberingSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShadowQuality {
    Off,
    #[default]
    Flat,
    Rounded,
}

fn default_grid_size() -> u32 {
    16
}

/// Per-plan options stored under `Settings`. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    #[serde(rename = "GridSize")]
    pub grid_size: u32,
    #[serde(rename = "NumberingSequence")]
    pub numbering_sequence: NumberingSequence,
    #[serde(rename = "NumberingIgnoreTopLevel")]
    pub numbering_ignore_top_level: bool,
    #[serde(rename = "PulsingSelection")]
    pub pulsing_selection: bool,
    #[serde(rename = "SaveSoundsPlaying")]
    pub save_sounds_playing: bool,
    #[serde(rename = "ShadowQuality")]
    pub shadow_quality: ShadowQuality,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            numbering_sequence: NumberingSequence::default(),
            numbering_ignore_top_level: false,
            pulsing_selection: true,
            save_sounds_playing: false,
            shadow_quality: ShadowQuality::default(),
        }
    }
}

impl PlanSettings {
    /// Grid size in world units; zero is treated as the default.
    pub fn grid(&self) -> f32 {
        if self.grid_size == 0 {
            log::warn!("GridSize 0 is not usable, using {}", default_grid_size());
            default_grid_size() as f32
        } else {
            self.grid_size as f32
        }
    }
}
