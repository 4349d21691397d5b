use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::MAX_BLUR_STRENGTH;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be positive, got {value}")]
    InvalidDimension { field: &'static str, value: u32 },
    #[error("background_blur_strength must be at most {max}, got {value}")]
    BlurStrengthTooLarge { value: u32, max: u32 },
}

/// Visual treatment for a hidden face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyMode {
    #[serde(rename = "square_2d", alias = "square")]
    Square,
    #[serde(rename = "blur_3d", alias = "blur")]
    Blur,
}

impl PrivacyMode {
    pub const ALL: &[PrivacyMode] = &[PrivacyMode::Square, PrivacyMode::Blur];
}

impl std::fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrivacyMode::Square => write!(f, "square_2d"),
            PrivacyMode::Blur => write!(f, "blur_3d"),
        }
    }
}

impl std::str::FromStr for PrivacyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square_2d" | "square" => Ok(PrivacyMode::Square),
            "blur_3d" | "blur" => Ok(PrivacyMode::Blur),
            other => Err(format!(
                "privacy mode must be 'square_2d' or 'blur_3d', got '{other}'"
            )),
        }
    }
}

/// Which detected faces get hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThirdPartyMode {
    HideOthers,
    HideOwner,
    HideAll,
}

impl ThirdPartyMode {
    pub const ALL: &[ThirdPartyMode] = &[
        ThirdPartyMode::HideOthers,
        ThirdPartyMode::HideOwner,
        ThirdPartyMode::HideAll,
    ];
}

impl std::fmt::Display for ThirdPartyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThirdPartyMode::HideOthers => write!(f, "hide_others"),
            ThirdPartyMode::HideOwner => write!(f, "hide_owner"),
            ThirdPartyMode::HideAll => write!(f, "hide_all"),
        }
    }
}

impl std::str::FromStr for ThirdPartyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hide_others" => Ok(ThirdPartyMode::HideOthers),
            "hide_owner" => Ok(ThirdPartyMode::HideOwner),
            "hide_all" => Ok(ThirdPartyMode::HideAll),
            other => Err(format!(
                "third-party mode must be one of hide_others, hide_owner, hide_all, got '{other}'"
            )),
        }
    }
}

/// Privacy policy applied to every frame.
///
/// Replaced as a whole value, never edited in place while the pipeline
/// reads it (see [`SettingsStore`](super::settings_store::SettingsStore)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub camera_index: u32,
    /// Rank of the owner among a frame's detections, 0-based.
    pub owner_face_index: usize,
    pub privacy_mode: PrivacyMode,
    pub third_party_mode: ThirdPartyMode,
    pub enable_background_blur: bool,
    pub enable_background_replace: bool,
    /// Kernel size; even values are bumped to the next odd one when used.
    pub background_blur_strength: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub output_fps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_index: 0,
            owner_face_index: 0,
            privacy_mode: PrivacyMode::Blur,
            third_party_mode: ThirdPartyMode::HideOthers,
            enable_background_blur: false,
            enable_background_replace: false,
            background_blur_strength: 25,
            output_width: 1280,
            output_height: 720,
            output_fps: 30,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let dimensions = [
            ("output_width", self.output_width),
            ("output_height", self.output_height),
            ("output_fps", self.output_fps),
        ];
        for (field, value) in dimensions {
            if value == 0 {
                return Err(SettingsError::InvalidDimension { field, value });
            }
        }
        if self.background_blur_strength > MAX_BLUR_STRENGTH {
            return Err(SettingsError::BlurStrengthTooLarge {
                value: self.background_blur_strength,
                max: MAX_BLUR_STRENGTH,
            });
        }
        Ok(())
    }

    /// Background blur kernel size, forced odd.
    pub fn effective_blur_strength(&self) -> usize {
        (self.background_blur_strength as usize) | 1
    }

    /// True when the background masker has work to do for this policy.
    pub fn background_enabled(&self) -> bool {
        self.enable_background_blur || self.enable_background_replace
    }
}
