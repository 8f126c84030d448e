//! Stage-wide parameters with TOML preset support.
//!
//! [`StageParameters`] holds every global setting of a stage: rendering
//! quality, camera, clipping, fog, lighting and hover behavior. It
//! serializes to/from TOML for presets, and `set_parameters` patches are
//! checked against [`STAGE_PARAMS`] before being merged.

mod camera;
mod quality;

use std::path::Path;

pub use camera::CameraType;
pub use quality::Quality;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::StageError;
use crate::params::{ChangeClass, ParamKind, ParamSpec};

/// Light grey used for the default point and ambient light.
const LIGHT_GREY: [f32; 3] = [0.867, 0.867, 0.867];

/// Global stage parameters. Uses `#[serde(default)]` so partial TOML
/// presets work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Stage")]
#[serde(default)]
pub struct StageParameters {
    /// Draw raycasted impostors where a representation supports them.
    #[schemars(title = "Impostor")]
    pub impostor: bool,
    /// Geometry detail level.
    #[schemars(title = "Quality")]
    pub quality: Quality,
    /// Antialiasing sample level; -1 disables, 0 samples only when idle.
    #[schemars(title = "Sampling", range(min = -1, max = 5))]
    pub sample_level: i32,
    /// RGB background color.
    #[schemars(title = "Background")]
    pub background_color: [f32; 3],
    /// Rotation speed of the camera controls.
    #[schemars(title = "Rotate Speed", range(min = 0.0, max = 10.0), extend("step" = 0.1))]
    pub rotate_speed: f32,
    /// Zoom speed of the camera controls.
    #[schemars(title = "Zoom Speed", range(min = 0.0, max = 10.0), extend("step" = 0.1))]
    pub zoom_speed: f32,
    /// Pan speed of the camera controls.
    #[schemars(title = "Pan Speed", range(min = 0.0, max = 10.0), extend("step" = 0.1))]
    pub pan_speed: f32,
    /// Near clipping plane, percent of the scene bounding box.
    #[schemars(title = "Clip Near", range(min = 0.0, max = 100.0), extend("step" = 1.0))]
    pub clip_near: f32,
    /// Far clipping plane, percent of the scene bounding box.
    #[schemars(title = "Clip Far", range(min = 0.0, max = 100.0), extend("step" = 1.0))]
    pub clip_far: f32,
    /// Camera clipping distance in angstroms.
    #[schemars(title = "Clip Distance", range(min = 0.0, max = 200.0))]
    pub clip_dist: f32,
    /// Fog start, percent of the scene bounding box.
    #[schemars(title = "Fog Near", range(min = 0.0, max = 100.0), extend("step" = 1.0))]
    pub fog_near: f32,
    /// Full fog, percent of the scene bounding box.
    #[schemars(title = "Fog Far", range(min = 0.0, max = 100.0), extend("step" = 1.0))]
    pub fog_far: f32,
    /// Camera projection.
    #[schemars(title = "Camera")]
    pub camera_type: CameraType,
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 15.0, max = 120.0), extend("step" = 1.0))]
    pub camera_fov: f32,
    /// RGB point light color.
    #[schemars(skip)]
    pub light_color: [f32; 3],
    /// Point light intensity.
    #[schemars(title = "Light Intensity", range(min = 0.0, max = 10.0), extend("step" = 0.01))]
    pub light_intensity: f32,
    /// RGB ambient light color.
    #[schemars(skip)]
    pub ambient_color: [f32; 3],
    /// Ambient light intensity.
    #[schemars(title = "Ambient Intensity", range(min = 0.0, max = 10.0), extend("step" = 0.01))]
    pub ambient_intensity: f32,
    /// Milliseconds the pointer must rest before `hovered` fires; -1
    /// disables hovering.
    #[schemars(title = "Hover Timeout", range(min = -1, max = 10000))]
    pub hover_timeout: i64,
}

impl Default for StageParameters {
    fn default() -> Self {
        Self {
            impostor: true,
            quality: Quality::Medium,
            sample_level: 0,
            background_color: [0.0, 0.0, 0.0],
            rotate_speed: 2.0,
            zoom_speed: 1.2,
            pan_speed: 0.8,
            clip_near: 0.0,
            clip_far: 100.0,
            clip_dist: 10.0,
            fog_near: 50.0,
            fog_far: 100.0,
            camera_type: CameraType::Perspective,
            camera_fov: 40.0,
            light_color: LIGHT_GREY,
            light_intensity: 1.0,
            ambient_color: LIGHT_GREY,
            ambient_intensity: 0.2,
            hover_timeout: 500,
        }
    }
}

const fn number(min: f64, max: f64) -> ParamKind {
    ParamKind::Number { min, max }
}

/// Declared table for [`StageParameters`] patches.
pub const STAGE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("impostor", ParamKind::Bool, ChangeClass::Rebuild),
    ParamSpec::new("quality", ParamKind::Select(&Quality::ALL), ChangeClass::Rebuild),
    ParamSpec::new(
        "sample_level",
        ParamKind::Integer { min: -1, max: 5 },
        ChangeClass::None,
    ),
    ParamSpec::new("background_color", ParamKind::Color, ChangeClass::None),
    ParamSpec::new("rotate_speed", number(0.0, 10.0), ChangeClass::None),
    ParamSpec::new("zoom_speed", number(0.0, 10.0), ChangeClass::None),
    ParamSpec::new("pan_speed", number(0.0, 10.0), ChangeClass::None),
    ParamSpec::new("clip_near", number(0.0, 100.0), ChangeClass::None),
    ParamSpec::new("clip_far", number(0.0, 100.0), ChangeClass::None),
    ParamSpec::new("clip_dist", number(0.0, 200.0), ChangeClass::None),
    ParamSpec::new("fog_near", number(0.0, 100.0), ChangeClass::None),
    ParamSpec::new("fog_far", number(0.0, 100.0), ChangeClass::None),
    ParamSpec::new(
        "camera_type",
        ParamKind::Select(&CameraType::ALL),
        ChangeClass::None,
    ),
    ParamSpec::new("camera_fov", number(15.0, 120.0), ChangeClass::None),
    ParamSpec::new("light_color", ParamKind::Color, ChangeClass::None),
    ParamSpec::new("light_intensity", number(0.0, 10.0), ChangeClass::None),
    ParamSpec::new("ambient_color", ParamKind::Color, ChangeClass::None),
    ParamSpec::new("ambient_intensity", number(0.0, 10.0), ChangeClass::None),
    ParamSpec::new(
        "hover_timeout",
        ParamKind::Integer { min: -1, max: 10_000 },
        ChangeClass::None,
    ),
];

impl StageParameters {
    /// Generate JSON Schema describing the UI-exposed parameters.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(StageParameters)
    }

    /// Load parameters from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, StageError> {
        let content = std::fs::read_to_string(path).map_err(StageError::Io)?;
        toml::from_str(&content)
            .map_err(|e| StageError::OptionsParse(e.to_string()))
    }

    /// Save parameters to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), StageError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StageError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StageError::Io)?;
        }
        std::fs::write(path, content).map_err(StageError::Io)
    }

    /// List available preset names (TOML file stems) in a directory.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) =
                        path.file_stem().and_then(|s| s.to_str())
                    {
                        names.push(stem.to_owned());
                    }
                }
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let params = StageParameters::default();
        let toml_str = toml::to_string_pretty(&params).unwrap();
        let parsed: StageParameters = toml::from_str(&toml_str).unwrap();
        assert_eq!(params, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
quality = "high"
hover_timeout = -1
"#;
        let params: StageParameters = toml::from_str(toml_str).unwrap();
        assert_eq!(params.quality, Quality::High);
        assert_eq!(params.hover_timeout, -1);
        // Everything else should be default
        assert!(params.impostor);
        assert_eq!(params.camera_fov, 40.0);
        assert_eq!(params.clip_dist, 10.0);
    }

    #[test]
    fn presets_are_saved_and_listed() {
        let dir = std::env::temp_dir()
            .join(format!("molstage-presets-{}", std::process::id()));
        let params = StageParameters {
            fog_near: 10.0,
            ..StageParameters::default()
        };
        params.save(&dir.join("foggy.toml")).unwrap();
        params.save(&dir.join("another.toml")).unwrap();
        assert_eq!(StageParameters::list_presets(&dir), vec!["another", "foggy"]);
        let loaded = StageParameters::load(&dir.join("foggy.toml")).unwrap();
        assert_eq!(loaded.fog_near, 10.0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = std::env::temp_dir()
            .join(format!("molstage-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "quality = 3").unwrap();
        assert!(matches!(
            StageParameters::load(&path),
            Err(StageError::OptionsParse(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn every_field_has_a_spec() {
        let value = serde_json::to_value(StageParameters::default()).unwrap();
        for key in value.as_object().unwrap().keys() {
            assert!(
                STAGE_PARAMS.iter().any(|s| s.name == key),
                "missing spec for {key}"
            );
        }
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(StageParameters::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();
        assert!(props.contains_key("quality"));
        assert!(props.contains_key("hover_timeout"));
        assert!(!props.contains_key("light_color"));
    }
}
