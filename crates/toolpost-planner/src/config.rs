//! Planner configuration
//!
//! The configuration surface of the three planners. Validation happens
//! here, once, before any line is processed; the planners themselves are
//! infallible.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default pause instruction injected at threshold crossings
pub const DEFAULT_PAUSE_CODE: &str = "M226";

/// Default preheat lead time, seconds
pub const DEFAULT_LEAD_TIME_SECS: f64 = 30.0;

/// Pause trigger quantity and its thresholds
///
/// Length and mass are mutually exclusive by construction; there is no way
/// to configure both at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Pause at cumulative extruded lengths, mm
    Length(Vec<f64>),
    /// Pause at cumulative extruded masses, grams
    Mass(Vec<f64>),
}

impl ThresholdMode {
    /// The configured threshold values
    pub fn values(&self) -> &[f64] {
        match self {
            Self::Length(v) | Self::Mass(v) => v,
        }
    }

    /// Unit label for reporting
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Length(_) => "mm",
            Self::Mass(_) => "g",
        }
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.values().is_empty() {
            return Err(ConfigError::MissingThresholds);
        }
        for &value in self.values() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidThreshold { value });
            }
        }
        Ok(())
    }
}

/// Preheat planner configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreheatConfig {
    /// Minimum seconds between the injected warmup and the tool change
    pub lead_time_secs: f64,
}

impl Default for PreheatConfig {
    fn default() -> Self {
        Self {
            lead_time_secs: DEFAULT_LEAD_TIME_SECS,
        }
    }
}

impl PreheatConfig {
    /// Check the configuration before planning starts
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.lead_time_secs.is_finite() || self.lead_time_secs <= 0.0 {
            return Err(ConfigError::InvalidLeadTime {
                seconds: self.lead_time_secs,
            });
        }
        Ok(())
    }
}

/// Pause planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseConfig {
    /// Tool the thresholds apply to; defaults to the first tool used in
    /// the stream, or 0 when none is selected
    pub tool: Option<i32>,
    /// Filament diameter override, mm
    pub diameter_mm: Option<f64>,
    /// Filament density override, g/cm³
    pub density_g_cm3: Option<f64>,
    /// Threshold quantity and values
    pub mode: ThresholdMode,
    /// Instruction text inserted at each crossing
    pub pause_code: String,
}

impl PauseConfig {
    /// Configuration with defaults for everything but the thresholds
    pub fn new(mode: ThresholdMode) -> Self {
        Self {
            tool: None,
            diameter_mm: None,
            density_g_cm3: None,
            mode,
            pause_code: DEFAULT_PAUSE_CODE.to_string(),
        }
    }

    /// Check the configuration before planning starts
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.mode.validate()?;
        if let Some(diameter_mm) = self.diameter_mm {
            if !diameter_mm.is_finite() || diameter_mm <= 0.0 {
                return Err(ConfigError::InvalidDiameter { diameter_mm });
            }
        }
        if let Some(density_g_cm3) = self.density_g_cm3 {
            if !density_g_cm3.is_finite() || density_g_cm3 <= 0.0 {
                return Err(ConfigError::InvalidDensity { density_g_cm3 });
            }
        }
        if self.pause_code.trim().is_empty() {
            return Err(ConfigError::EmptyPauseCode);
        }
        Ok(())
    }

    /// Thresholds in ascending crossing order
    pub fn sorted_thresholds(&self) -> Vec<f64> {
        let mut thresholds = self.mode.values().to_vec();
        thresholds.sort_by(|a, b| a.total_cmp(b));
        thresholds
    }
}
