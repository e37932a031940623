//! # Run Configuration
//!
//! One [`PhspConfig`] is loaded from TOML at startup and handed to every
//! component. Every field has a default, so an empty file (or no file) gives
//! the reference constants:
//!
//! ```toml
//! [decode]
//! layout = "short"
//!
//! [run]
//! budget = 0                # 0 = until end of stream
//! consumers = ["spectrum"]
//!
//! [spectrum]
//! energy_min = 0.0
//! energy_max = 10.0
//! bin_width = 0.1
//! bin_count = 100
//!
//! [field]
//! half_size = 5.0
//! plane_z = 100.0
//! budget = 1000000
//!
//! [voxel]
//! size = 0.2
//! mu_constant = 0.07
//! mu_inverse_energy = 0.1
//!
//! [jaw]
//! plane_z = 100.0
//!
//! [dump]
//! count = 100
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::decoder::RecordLayout;
use crate::error::{PhspError, PhspResult};

/// Record stream settings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    /// On-disk record layout.
    pub layout: RecordLayout,
}

/// Consumers that a run can feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerKind {
    /// Print the first records.
    Dump,
    /// Per-species histograms and averages.
    Spectrum,
    /// Field fluence at a fixed plane.
    Fluence,
    /// Voxel attenuation scoring.
    Voxel,
}

impl ConsumerKind {
    /// Parses a consumer name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "dump" => Some(Self::Dump),
            "spectrum" => Some(Self::Spectrum),
            "fluence" => Some(Self::Fluence),
            "voxel" => Some(Self::Voxel),
            _ => None,
        }
    }
}

/// Pipeline settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Records to decode at most, 0 for the whole stream.
    pub budget: u64,
    /// Consumers fed when none is selected on the command line.
    pub consumers: Vec<ConsumerKind>,
}

impl RunConfig {
    /// Budget as an option.
    #[must_use]
    pub const fn record_budget(&self) -> Option<u64> {
        if self.budget == 0 {
            None
        } else {
            Some(self.budget)
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget: 0,
            consumers: vec![ConsumerKind::Spectrum],
        }
    }
}

/// Energy histogram settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpectrumConfig {
    /// Lower edge of the first bin (MeV).
    pub energy_min: f32,
    /// Energies at or above this are not binned (MeV).
    pub energy_max: f32,
    /// Bin width (MeV), single precision.
    pub bin_width: f32,
    /// Number of bins.
    pub bin_count: usize,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            energy_min: 0.0,
            energy_max: 10.0,
            bin_width: 0.1,
            bin_count: 100,
        }
    }
}

/// Square field used for the fluence ratio.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    /// Half the field side (cm).
    pub half_size: f32,
    /// Longitudinal plane of the field (cm).
    pub plane_z: f32,
    /// Nominal number of records attempted; the ratio's denominator.
    pub budget: u64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            half_size: 5.0,
            plane_z: 100.0,
            budget: 1_000_000,
        }
    }
}

/// Voxel scoring settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoxelConfig {
    /// Voxel edge (cm).
    pub size: f64,
    /// Energy-independent term of `μ(E)` (1/cm).
    pub mu_constant: f64,
    /// Coefficient of `1/E` in `μ(E)` (MeV/cm).
    pub mu_inverse_energy: f64,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            size: 0.2,
            mu_constant: 0.07,
            mu_inverse_energy: 0.1,
        }
    }
}

/// Jaw collimator settings not carried by the jaw table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JawConfig {
    /// Longitudinal plane of the jaws (cm).
    pub plane_z: f32,
}

impl Default for JawConfig {
    fn default() -> Self {
        Self { plane_z: 100.0 }
    }
}

/// Record dump settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpConfig {
    /// Records to print.
    pub count: u64,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self { count: 100 }
    }
}

/// Process-wide configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhspConfig {
    /// Record stream settings.
    pub decode: DecodeConfig,
    /// Pipeline settings.
    pub run: RunConfig,
    /// Energy histogram settings.
    pub spectrum: SpectrumConfig,
    /// Field fluence settings.
    pub field: FieldConfig,
    /// Voxel scoring settings.
    pub voxel: VoxelConfig,
    /// Jaw settings.
    pub jaw: JawConfig,
    /// Record dump settings.
    pub dump: DumpConfig,
}

impl PhspConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`PhspError::InvalidConfig`] on a syntax error, an unknown key
    /// or a value rejected by [`PhspConfig::validate`].
    pub fn from_toml_str(text: &str) -> PhspResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| PhspError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`PhspError::InputUnavailable`] if the file cannot be read,
    /// otherwise as [`PhspConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> PhspResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PhspError::input_unavailable(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Checks values that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`PhspError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> PhspResult<()> {
        let s = &self.spectrum;
        if !is_positive(f64::from(s.bin_width)) {
            return Err(invalid("spectrum.bin_width must be positive"));
        }
        if s.bin_count == 0 {
            return Err(invalid("spectrum.bin_count must be at least 1"));
        }
        if s.energy_max.is_nan() || s.energy_max <= s.energy_min {
            return Err(invalid("spectrum.energy_max must exceed spectrum.energy_min"));
        }
        if self.field.half_size.is_nan() || self.field.half_size < 0.0 {
            return Err(invalid("field.half_size must not be negative"));
        }
        if self.field.budget == 0 {
            return Err(invalid("field.budget must be at least 1"));
        }
        if !is_positive(self.voxel.size) {
            return Err(invalid("voxel.size must be positive"));
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(message: &str) -> PhspError {
    PhspError::InvalidConfig(message.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_reference_constants() {
        let config = PhspConfig::from_toml_str("").unwrap();
        assert_eq!(config, PhspConfig::default());
        assert_eq!(config.decode.layout, RecordLayout::Short);
        assert_eq!(config.spectrum.bin_count, 100);
        assert_eq!(config.spectrum.bin_width, 0.1);
        assert_eq!(config.field.budget, 1_000_000);
        assert_eq!(config.field.half_size, 5.0);
        assert_eq!(config.voxel.size, 0.2);
        assert_eq!(config.voxel.mu_constant, 0.07);
        assert_eq!(config.voxel.mu_inverse_energy, 0.1);
        assert_eq!(config.run.record_budget(), None);
        assert_eq!(config.dump.count, 100);
    }

    #[test]
    fn test_partial_document() {
        let config = PhspConfig::from_toml_str(
            r#"
            [decode]
            layout = "full"

            [run]
            budget = 500
            consumers = ["fluence", "voxel"]

            [jaw]
            plane_z = 35.0
            "#,
        )
        .unwrap();
        assert_eq!(config.decode.layout, RecordLayout::Full);
        assert_eq!(config.run.record_budget(), Some(500));
        assert_eq!(config.run.consumers, vec![ConsumerKind::Fluence, ConsumerKind::Voxel]);
        assert_eq!(config.jaw.plane_z, 35.0);
        assert_eq!(config.spectrum, SpectrumConfig::default());
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            PhspConfig::from_toml_str("[voxel]\nedge = 1.0"),
            Err(PhspError::InvalidConfig(_))
        ));
        assert!(matches!(
            PhspConfig::from_toml_str("[spectrum]\nbin_width = 0.0"),
            Err(PhspError::InvalidConfig(_))
        ));
        assert!(matches!(
            PhspConfig::from_toml_str("[spectrum]\nenergy_max = -1.0"),
            Err(PhspError::InvalidConfig(_))
        ));
        assert!(matches!(
            PhspConfig::from_toml_str("[field]\nbudget = 0"),
            Err(PhspError::InvalidConfig(_))
        ));
        assert!(matches!(
            PhspConfig::from_toml_str("[decode]\nlayout = \"packed\""),
            Err(PhspError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_consumer_names() {
        assert_eq!(ConsumerKind::parse("voxel"), Some(ConsumerKind::Voxel));
        assert_eq!(ConsumerKind::parse("dose"), None);
    }
}
