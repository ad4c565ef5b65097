//! # Settings Module
//!
//! ## Purpose
//! Holds every numerical and physical parameter consumed by the mean-field solver and
//! persists them as JSON. The settings object is created once and handed to
//! [`crate::MeanField::microkinetic_model::MicroKineticModel`]; there is no process-wide
//! configuration state.
//!
//! ## Key Features
//! - **Serializable**: `SolverSettings` round-trips through `serde_json`
//! - **Defaults**: a missing configuration file yields `SolverSettings::default()`
//! - **Validation**: out-of-range ratios, unknown precision modes and non-physical
//!   temperatures are rejected with `KineticsError::ConfigurationError`
//! - **Batch updates**: numeric parameters can be changed by key in a single call
//!
//! ## Configuration Format
//! ```json
//! {
//!   "temperature": 450.0,
//!   "unitcell_area": 9.0e-20,
//!   "active_ratio": 1.0,
//!   "sticking_factor": 1.0,
//!   "precision": "double",
//!   "rate_algorithm": "TST",
//!   "tolerance": 1e-8,
//!   "step_tolerance": 1e-10,
//!   "max_iterations": 100,
//!   "coarse_iterations": 5,
//!   "damping": 1.0,
//!   "max_damping_retries": 4,
//!   "divergence_window": 3,
//!   "barrier_epsilon": 1e-10,
//!   "perturbation_size": 1e-5,
//!   "rds": 2,
//!   "parallel_sensitivity": false
//! }
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use KiSurf::settings::SettingsManager;
//! let mut manager = SettingsManager::with_config_file("kisurf_settings.json")?;
//! manager.update_parameters(HashMap::from([("temperature", 500.0)]))?;
//! let settings = manager.settings().clone();
//! ```

use crate::MeanField::numeric_kernel::PrecisionMode;
use crate::errors::KineticsError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Physical model used to turn barriers into rate constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateAlgorithm {
    /// transition-state theory for every step
    TST,
    /// collision theory for steps with gas-phase mass transfer, TST for the rest
    CT,
}

impl FromStr for RateAlgorithm {
    type Err = KineticsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TST" => Ok(RateAlgorithm::TST),
            "CT" => Ok(RateAlgorithm::CT),
            other => Err(KineticsError::ConfigurationError(format!(
                "unknown rate algorithm '{}', expected TST or CT",
                other
            ))),
        }
    }
}

/// Parameters of a microkinetic calculation.
///
/// # Fields
/// * `temperature` - K
/// * `unitcell_area` - area of the surface unit cell, m²
/// * `active_ratio` - active-site area / unit-cell area, must be <= 1
/// * `sticking_factor` - collision-theory sticking coefficient, must be <= 1
/// * `precision` - arithmetic backend of the steady-state solver
/// * `tolerance` - residual 2-norm at which Newton stops
/// * `step_tolerance` - relative Newton step at which Newton stops
/// * `barrier_epsilon` - barriers below this value are treated as zero when deciding whether an
///   adsorption/desorption step is thermally equilibrated. This is a numerical approximation,
///   not a physical criterion.
/// * `perturbation_size` - energy shift (eV) used by the sensitivity analysis
/// * `rds` - rate-determining step for the quasi-equilibrium reduction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub temperature: f64,
    pub unitcell_area: f64,
    pub active_ratio: f64,
    pub sticking_factor: f64,
    pub precision: PrecisionMode,
    pub rate_algorithm: RateAlgorithm,
    pub tolerance: f64,
    pub step_tolerance: f64,
    pub max_iterations: usize,
    pub coarse_iterations: usize,
    pub damping: f64,
    pub max_damping_retries: usize,
    pub divergence_window: usize,
    pub barrier_epsilon: f64,
    pub perturbation_size: f64,
    pub rds: Option<usize>,
    pub parallel_sensitivity: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            temperature: 298.15,
            unitcell_area: 9.0e-20,
            active_ratio: 1.0,
            sticking_factor: 1.0,
            precision: PrecisionMode::Double,
            rate_algorithm: RateAlgorithm::CT,
            tolerance: 1e-8,
            step_tolerance: 1e-10,
            max_iterations: 100,
            coarse_iterations: 5,
            damping: 1.0,
            max_damping_retries: 4,
            divergence_window: 3,
            barrier_epsilon: 1e-10,
            perturbation_size: 1e-5,
            rds: None,
            parallel_sensitivity: false,
        }
    }
}

impl SolverSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from a JSON string and validates them.
    pub fn from_json(json: &str) -> Result<Self, KineticsError> {
        let settings: SolverSettings = serde_json::from_str(json).map_err(|e| {
            KineticsError::ConfigurationError(format!("invalid settings document: {}", e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, KineticsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects settings that cannot describe a physical system or a working solver.
    pub fn validate(&self) -> Result<(), KineticsError> {
        let fail = |msg: String| Err(KineticsError::ConfigurationError(msg));
        if !(self.temperature > 0.0) {
            return fail(format!("temperature must be positive, got {}", self.temperature));
        }
        if !(self.unitcell_area > 0.0) {
            return fail(format!(
                "unit cell area must be positive, got {}",
                self.unitcell_area
            ));
        }
        if !(self.active_ratio > 0.0 && self.active_ratio <= 1.0) {
            return fail(format!(
                "active ratio must lie in (0, 1], got {}",
                self.active_ratio
            ));
        }
        if !(self.sticking_factor > 0.0 && self.sticking_factor <= 1.0) {
            return fail(format!(
                "sticking factor must lie in (0, 1], got {}",
                self.sticking_factor
            ));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return fail(format!("damping must lie in (0, 1], got {}", self.damping));
        }
        if self.max_iterations == 0 {
            return fail("max_iterations must be at least 1".to_string());
        }
        if !(self.perturbation_size > 0.0) {
            return fail("perturbation size must be positive".to_string());
        }
        if self.barrier_epsilon < 0.0 {
            return fail("barrier epsilon must not be negative".to_string());
        }
        Ok(())
    }

    /// Updates a single numeric parameter by its JSON key.
    pub fn set_parameter(&mut self, key: &str, value: f64) -> Result<(), KineticsError> {
        match key {
            "temperature" => self.temperature = value,
            "unitcell_area" => self.unitcell_area = value,
            "active_ratio" => self.active_ratio = value,
            "sticking_factor" => self.sticking_factor = value,
            "tolerance" => self.tolerance = value,
            "step_tolerance" => self.step_tolerance = value,
            "max_iterations" => self.max_iterations = count(key, value)?,
            "coarse_iterations" => self.coarse_iterations = count(key, value)?,
            "damping" => self.damping = value,
            "max_damping_retries" => self.max_damping_retries = count(key, value)?,
            "divergence_window" => self.divergence_window = count(key, value)?,
            "barrier_epsilon" => self.barrier_epsilon = value,
            "perturbation_size" => self.perturbation_size = value,
            "rds" => self.rds = Some(count(key, value)?),
            _ => {
                return Err(KineticsError::ConfigurationError(format!(
                    "unknown parameter: {}",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// Non-negative integral value of a count-like parameter.
fn count(key: &str, value: f64) -> Result<usize, KineticsError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > usize::MAX as f64 {
        return Err(KineticsError::ConfigurationError(format!(
            "{} must be a non-negative integer, got {}",
            key, value
        )));
    }
    Ok(value as usize)
}

/// Loads, validates, updates and persists [`SolverSettings`].
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings: SolverSettings,
    config_file: String,
}

impl SettingsManager {
    /// Settings stored in `kisurf_settings.json` of the working directory, or defaults.
    pub fn new() -> Result<Self, KineticsError> {
        Self::with_config_file("kisurf_settings.json")
    }

    pub fn with_config_file(config_file: &str) -> Result<Self, KineticsError> {
        let settings = Self::load_config(config_file)?;
        Ok(Self {
            settings,
            config_file: config_file.to_string(),
        })
    }

    /// A missing file is not an error; an unreadable or invalid one is.
    fn load_config(config_file: &str) -> Result<SolverSettings, KineticsError> {
        if Path::new(config_file).exists() {
            let content = fs::read_to_string(config_file)?;
            if content.trim().is_empty() {
                return Ok(SolverSettings::default());
            }
            SolverSettings::from_json(&content)
        } else {
            log::info!(
                "settings file {} not found, default settings are used",
                config_file
            );
            Ok(SolverSettings::default())
        }
    }

    pub fn save_config(&self) -> Result<(), KineticsError> {
        let content = self.settings.to_json()?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Replaces the settings after validation and saves them.
    pub fn set_settings(&mut self, settings: SolverSettings) -> Result<(), KineticsError> {
        settings.validate()?;
        self.settings = settings;
        self.save_config()
    }

    /// Applies all updates or none of them.
    pub fn update_parameters(&mut self, updates: HashMap<&str, f64>) -> Result<(), KineticsError> {
        let mut candidate = self.settings.clone();
        for (key, value) in updates {
            candidate.set_parameter(key, value)?;
        }
        candidate.validate()?;
        self.settings = candidate;
        self.save_config()
    }

    pub fn set_precision(&mut self, mode: &str) -> Result<(), KineticsError> {
        self.settings.precision = PrecisionMode::from_str(mode)?;
        self.save_config()
    }

    pub fn reset_to_defaults(&mut self) -> Result<(), KineticsError> {
        self.settings = SolverSettings::default();
        self.save_config()
    }
}
