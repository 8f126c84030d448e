use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Camera projection.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    /// Perspective projection.
    #[default]
    Perspective,
    /// Orthographic projection.
    Orthographic,
}

impl CameraType {
    /// Serialized names.
    pub const ALL: [&'static str; 2] = ["perspective", "orthographic"];
}
