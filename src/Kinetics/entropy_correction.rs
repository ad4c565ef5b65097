//! Free-energy corrections of gas-phase species.
//!
//! Used only by adsorption/desorption steps that are treated as thermally equilibrated:
//! the reaction free energy entering detailed balance is shifted by the correction of every
//! gas in the initial and final states.
use crate::Kinetics::rate_constants::KB;
use crate::errors::KineticsError;

pub const KB_J: f64 = 1.380649e-23;
pub const H_J: f64 = 6.62607015e-34;
pub const AMU_KG: f64 = 1.66053906660e-27;
pub const BAR_PA: f64 = 1.0e5;

/// Energy shift (eV) of a gas species at given mass (amu), pressure (bar) and temperature (K).
pub trait EntropyCorrector: Send + Sync {
    fn entropy_correction(
        &self,
        species: &str,
        mass: f64,
        pressure: f64,
        temperature: f64,
    ) -> Result<f64, KineticsError>;

    fn name(&self) -> &str;
}

/// No correction at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorrection;

impl EntropyCorrector for NoCorrection {
    fn entropy_correction(&self, _: &str, _: f64, _: f64, _: f64) -> Result<f64, KineticsError> {
        Ok(0.0)
    }
    fn name(&self) -> &str {
        "none"
    }
}

/// `-T*S_trans` of an ideal gas, Sackur–Tetrode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslationalEntropy;

impl EntropyCorrector for TranslationalEntropy {
    fn entropy_correction(
        &self,
        species: &str,
        mass: f64,
        pressure: f64,
        temperature: f64,
    ) -> Result<f64, KineticsError> {
        if !(mass > 0.0) || !(pressure > 0.0) || !(temperature > 0.0) {
            return Err(KineticsError::ParameterError(format!(
                "translational entropy of {} needs positive mass, pressure and temperature (m = {}, p = {}, T = {})",
                species, mass, pressure, temperature
            )));
        }
        let m = mass * AMU_KG;
        let p = pressure * BAR_PA;
        let thermal = 2.0 * std::f64::consts::PI * m * KB_J * temperature / (H_J * H_J);
        let volume_per_molecule = KB_J * temperature / p;
        let s_over_k = (volume_per_molecule * thermal.powf(1.5)).ln() + 2.5;
        Ok(-KB * temperature * s_over_k)
    }
    fn name(&self) -> &str {
        "translational"
    }
}
