use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HairError, Result};

/// Tunables for strand placement and the spring-damper integration.
///
/// Every field has a default, so a TOML file only needs to name the keys it
/// overrides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rest length of every strand.
    pub hair_length: f32,
    /// Placement attempt budget. Rejected attempts are not retried.
    pub max_num_spawns: usize,
    /// A triangle is eligible only if all three vertex colors average below this.
    pub color_threshold: f32,
    /// Minimum distance between two accepted strand roots.
    pub min_separation: f32,
    /// Spring stiffness pulling each tip toward its anchor.
    pub k_anchor: f32,
    /// Velocity damping coefficient.
    pub damping: f32,
    /// Precompute three ribbon anchor directions per strand.
    pub ribbon: bool,
    /// Distance of the ribbon anchor points from the rest tip.
    pub ribbon_spread: f32,
    /// Fixed RNG seed for reproducible placement.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hair_length: 0.5,
            max_num_spawns: 400,
            color_threshold: 0.5,
            min_separation: 0.05,
            k_anchor: 4.0,
            damping: 1.5,
            ribbon: false,
            ribbon_spread: 0.25,
            seed: None,
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}: {cfg:?}", path.as_ref().display());
        Ok(cfg)
    }

    /// Checks that every value lies in its valid range.
    ///
    /// ### Returns
    /// - `Ok(())` if the configuration is usable.
    /// - `Err(HairError::InvalidConfig)` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("hair_length", self.hair_length),
            ("color_threshold", self.color_threshold),
            ("min_separation", self.min_separation),
            ("k_anchor", self.k_anchor),
            ("damping", self.damping),
            ("ribbon_spread", self.ribbon_spread),
        ];
        if let Some((key, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(HairError::InvalidConfig(format!("{key} must be finite")));
        }

        if self.hair_length <= 0.0 {
            return Err(HairError::InvalidConfig(
                "hair_length must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.color_threshold) {
            return Err(HairError::InvalidConfig(
                "color_threshold must lie in [0, 1]".into(),
            ));
        }
        if self.min_separation < 0.0 {
            return Err(HairError::InvalidConfig(
                "min_separation must not be negative".into(),
            ));
        }
        if self.k_anchor < 0.0 || self.damping < 0.0 {
            return Err(HairError::InvalidConfig(
                "k_anchor and damping must not be negative".into(),
            ));
        }
        Ok(())
    }
}
