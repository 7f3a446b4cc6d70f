//! Export of the live parameters and camera pose, and replay as an override.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{scene::CameraPose, AppConfig, Parameters, Result};

/// Flat mapping of parameter name to value plus a nested `camera` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub parameters: Parameters,
    pub camera: CameraPose,
}

impl Snapshot {
    pub fn capture(parameters: &Parameters, camera: &CameraPose) -> Self {
        Self {
            parameters: *parameters,
            camera: *camera,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replays this snapshot on top of `base`.
    pub fn apply_to(&self, base: &AppConfig) -> Result<AppConfig> {
        base.with_override(serde_json::to_value(self)?)
    }
}

/// Deep-merges `overrides` into `base`.
///
/// Objects merge key by key; any other override value replaces the base
/// value wholesale. No versioning or migration is applied.
pub fn merge_override(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge_override(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}
