//! Conversion options

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_LINK_PATTERN, DEFAULT_GRAVITY, DEFAULT_POS_SCALE_FACTOR, IDENTITY_EPSILON,
};
use crate::kinematics::{ConvertError, MovableJoint};
use crate::transform::TranslationMode;

/// Options for a single assembly-to-MJCF conversion.
///
/// Every field has a default, so configuration files only list overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Output directory (replaced as a whole on success)
    pub output_dir: PathBuf,
    /// Directory the assembly was loaded from; never replaced by the output
    #[serde(skip)]
    pub project_dir: Option<PathBuf>,
    /// Model name (defaults to the top-level assembly label)
    pub model_name: Option<String>,
    /// Regular expression matched at the start of label names
    pub base_link_pattern: String,
    /// Linear scale applied to every emitted position and to mesh assets
    pub pos_scale_factor: f64,
    /// Gravity vector for the `<option>` block
    pub gravity: [f64; 3],
    /// How relative body translations are computed
    pub translation_mode: TranslationMode,
    /// Emit prismatic joints as `slide` instead of rejecting them
    pub allow_prismatic: bool,
    /// Emit joint friction as `frictionloss` instead of dropping it
    pub emit_friction: bool,
    /// Add a floor plane, its material and a light
    pub floor: bool,
    /// Tolerance for treating a transform as the identity
    pub identity_epsilon: f64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("mjcf_output"),
            project_dir: None,
            model_name: None,
            base_link_pattern: DEFAULT_BASE_LINK_PATTERN.to_string(),
            pos_scale_factor: DEFAULT_POS_SCALE_FACTOR,
            gravity: DEFAULT_GRAVITY,
            translation_mode: TranslationMode::default(),
            allow_prismatic: false,
            emit_friction: false,
            floor: true,
            identity_epsilon: IDENTITY_EPSILON,
        }
    }
}

impl ConvertOptions {
    /// Whether joints of `kind` can be written to the output model
    pub fn supports(&self, kind: MovableJoint) -> bool {
        match kind {
            MovableJoint::Revolute => true,
            MovableJoint::Prismatic => self.allow_prismatic,
        }
    }

    /// Reject options that would produce a degenerate model
    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.pos_scale_factor.is_finite() || self.pos_scale_factor <= 0.0 {
            return Err(ConvertError::Config(format!(
                "pos_scale_factor must be a positive finite number, got {}",
                self.pos_scale_factor
            )));
        }
        if !self.identity_epsilon.is_finite() || self.identity_epsilon < 0.0 {
            return Err(ConvertError::Config(format!(
                "identity_epsilon must be a non-negative finite number, got {}",
                self.identity_epsilon
            )));
        }
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(ConvertError::Config(format!(
                "gravity must be finite, got {:?}",
                self.gravity
            )));
        }
        Ok(())
    }

    /// Parse options from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConvertError> {
        ron::from_str(text).map_err(|e| ConvertError::Config(e.to_string()))
    }

    /// Load options from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let text =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConvertError::Io(e.to_string()))?;
        Self::from_ron(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let options =
            ConvertOptions::from_ron("(pos_scale_factor: 0.001, allow_prismatic: true)").unwrap();
        assert_eq!(options.pos_scale_factor, 0.001);
        assert!(options.allow_prismatic);
        assert_eq!(options.base_link_pattern, "base");
        assert_eq!(options.translation_mode, TranslationMode::WorldDelta);
        assert!(options.floor);
    }

    #[test]
    fn test_supports() {
        let options = ConvertOptions::default();
        assert!(options.supports(MovableJoint::Revolute));
        assert!(!options.supports(MovableJoint::Prismatic));
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        assert!(ConvertOptions::default().validate().is_ok());

        for scale in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let options = ConvertOptions {
                pos_scale_factor: scale,
                ..ConvertOptions::default()
            };
            assert!(matches!(options.validate(), Err(ConvertError::Config(_))));
        }

        let options = ConvertOptions {
            identity_epsilon: -1e-9,
            ..ConvertOptions::default()
        };
        assert!(matches!(options.validate(), Err(ConvertError::Config(_))));

        let options = ConvertOptions {
            gravity: [0.0, f64::NAN, -9.81],
            ..ConvertOptions::default()
        };
        assert!(matches!(options.validate(), Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_bad_config() {
        assert!(matches!(
            ConvertOptions::from_ron("(pos_scale_factor: \"big\")"),
            Err(ConvertError::Config(_))
        ));
    }
}
