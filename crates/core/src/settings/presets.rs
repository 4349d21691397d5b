use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::app_settings::{PrivacyMode, Settings, SettingsError, ThirdPartyMode};
use crate::shared::constants::{PRESETS_DIR_NAME, PRESETS_FILE_NAME};

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("failed to access presets file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed presets file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("preset '{name}' has invalid settings: {source}")]
    InvalidSettings {
        name: String,
        #[source]
        source: SettingsError,
    },
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// A named, persisted policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    pub name: String,
    pub settings: Settings,
}

/// Presets written out when no presets file exists yet.
pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "Maximum anonymity".to_string(),
            settings: Settings {
                privacy_mode: PrivacyMode::Blur,
                third_party_mode: ThirdPartyMode::HideAll,
                enable_background_blur: true,
                ..Settings::default()
            },
        },
        Preset {
            name: "Light censor".to_string(),
            settings: Settings {
                privacy_mode: PrivacyMode::Square,
                third_party_mode: ThirdPartyMode::HideOthers,
                enable_background_blur: false,
                ..Settings::default()
            },
        },
    ]
}

/// `<config dir>/SmartPrivacyCam/presets.json`.
pub fn default_presets_path() -> Result<PathBuf, PresetError> {
    dirs::config_dir()
        .map(|d| d.join(PRESETS_DIR_NAME).join(PRESETS_FILE_NAME))
        .ok_or(PresetError::NoConfigDir)
}

/// Loads presets from `path`.
///
/// A missing file is not an error: the built-in defaults are written to
/// `path` and returned. Anything else that goes wrong fails the whole load.
pub fn load_presets(path: &Path) -> Result<Vec<Preset>, PresetError> {
    if !path.exists() {
        let presets = default_presets();
        save_presets(path, &presets)?;
        log::info!("Created default presets at {}", path.display());
        return Ok(presets);
    }

    let json = fs::read_to_string(path).map_err(|source| PresetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let presets: Vec<Preset> =
        serde_json::from_str(&json).map_err(|source| PresetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    for preset in &presets {
        preset
            .settings
            .validate()
            .map_err(|source| PresetError::InvalidSettings {
                name: preset.name.clone(),
                source,
            })?;
    }

    Ok(presets)
}

pub fn save_presets(path: &Path, presets: &[Preset]) -> Result<(), PresetError> {
    let io_err = |source| PresetError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(presets).map_err(|source| PresetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(io_err)
}

pub fn find_preset<'a>(presets: &'a [Preset], name: &str) -> Option<&'a Preset> {
    presets.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("presets.json");

        let presets = load_presets(&path).unwrap();

        assert_eq!(presets, default_presets());
        assert!(path.exists());
        // Second load reads what was written.
        assert_eq!(load_presets(&path).unwrap(), presets);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        let presets = vec![Preset {
            name: "Edge".to_string(),
            settings: Settings {
                camera_index: 7,
                owner_face_index: 2,
                privacy_mode: PrivacyMode::Square,
                third_party_mode: ThirdPartyMode::HideOwner,
                enable_background_blur: true,
                enable_background_replace: true,
                background_blur_strength: 2,
                output_width: 1,
                output_height: 1,
                output_fps: 1,
            },
        }];

        save_presets(&path, &presets).unwrap();
        let loaded = load_presets(&path).unwrap();

        assert_eq!(loaded, presets);
        assert_eq!(loaded[0].settings.effective_blur_strength(), 3);
    }

    #[test]
    fn test_persisted_form_uses_settings_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        save_presets(&path, &default_presets()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let first = &raw[0];
        assert_eq!(first["name"], "Maximum anonymity");
        assert_eq!(first["settings"]["third_party_mode"], "hide_all");
        assert_eq!(first["settings"]["enable_background_blur"], true);
    }

    #[test]
    fn test_malformed_json_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        fs::write(&path, "[{\"name\": \"broken\"").unwrap();

        assert!(matches!(load_presets(&path), Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_unknown_mode_fails_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        fs::write(
            &path,
            r#"[
                {"name": "ok", "settings": {}},
                {"name": "bad", "settings": {"privacy_mode": "pixelate"}}
            ]"#,
        )
        .unwrap();

        assert!(matches!(load_presets(&path), Err(PresetError::Parse { .. })));
    }

    #[test]
    fn test_invalid_dimensions_fail_with_preset_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        fs::write(
            &path,
            r#"[{"name": "tiny", "settings": {"output_fps": 0}}]"#,
        )
        .unwrap();

        match load_presets(&path) {
            Err(PresetError::InvalidSettings { name, .. }) => assert_eq!(name, "tiny"),
            other => panic!("expected InvalidSettings, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_blur_strength_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.json");
        fs::write(
            &path,
            r#"[{"name": "smear", "settings": {"background_blur_strength": 4000000000}}]"#,
        )
        .unwrap();

        match load_presets(&path) {
            Err(PresetError::InvalidSettings { name, source }) => {
                assert_eq!(name, "smear");
                assert!(matches!(source, SettingsError::BlurStrengthTooLarge { .. }));
            }
            other => panic!("expected InvalidSettings, got {other:?}"),
        }
    }

    #[test]
    fn test_find_preset_by_name() {
        let presets = default_presets();
        assert!(find_preset(&presets, "Light censor").is_some());
        assert!(find_preset(&presets, "Nope").is_none());
    }
}
