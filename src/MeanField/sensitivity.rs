//! # Sensitivity Analysis
//!
//! ## Purpose
//! Degree of rate control (XRC) of every elementary step and degree of thermodynamic rate
//! control (XTRC) of every intermediate, both for the turnover frequency of one gas.
//!
//! ## Definitions
//! With `r` the baseline turnover frequency and `r'` the one after a perturbation of size `ε`
//! (eV):
//! - `XRC_i = kT·ln(r'/r)/ε` where both barriers of step `i` are lowered by `ε`, so its
//!   equilibrium constant is unchanged;
//! - `XTRC_n = -kT·ln(r'/r)/ε` where the formation energy of intermediate `n` (adsorbate or
//!   transition state) is raised by `ε`.
//!
//! Every perturbed point is a full steady-state solve seeded with the baseline coverages.
//! Rate-theory branches stay those of the baseline, so a perturbation never switches a step
//! between collision and transition-state theory.
//!
//! ## Parallelism
//! The perturbed solves share only immutable data. With `parallel_sensitivity` they run on the
//! rayon thread pool; results are collected in index order either way.
use crate::Kinetics::energetics::RelativeEnergySet;
use crate::Kinetics::rate_constants::{KB, RateConstantCalculator};
use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesRef};
use crate::MeanField::coverage_equations::CoverageEquations;
use crate::MeanField::numeric_kernel::NumericKernel;
use crate::MeanField::steady_state_solver::SteadyStateSolver;
use crate::errors::KineticsError;
use crate::settings::SolverSettings;
use log::info;
use rayon::prelude::*;

/// Everything needed to re-solve the steady state at perturbed energies.
pub struct SensitivityAnalyzer<'a, K: NumericKernel + Clone> {
    kernel: K,
    network: &'a ReactionNetwork,
    equations: &'a CoverageEquations,
    calculator: &'a RateConstantCalculator,
    energies: &'a RelativeEnergySet,
    settings: &'a SolverSettings,
    /// steady-state coverages of the unperturbed system
    baseline: Vec<f64>,
    pressures: Vec<f64>,
    concentrations: Vec<f64>,
}

impl<'a, K: NumericKernel + Clone> SensitivityAnalyzer<'a, K> {
    pub fn new(
        kernel: K,
        network: &'a ReactionNetwork,
        equations: &'a CoverageEquations,
        calculator: &'a RateConstantCalculator,
        energies: &'a RelativeEnergySet,
        settings: &'a SolverSettings,
        baseline: Vec<f64>,
    ) -> Result<Self, KineticsError> {
        if baseline.len() != equations.adsorbate_count() {
            return Err(KineticsError::dimension(
                equations.adsorbate_count(),
                baseline.len(),
                "baseline coverages",
            ));
        }
        if !(settings.perturbation_size > 0.0) {
            return Err(KineticsError::ParameterError(format!(
                "perturbation size must be positive, got {}",
                settings.perturbation_size
            )));
        }
        Ok(Self {
            kernel,
            network,
            equations,
            calculator,
            energies,
            settings,
            baseline,
            pressures: network.pressures(),
            concentrations: network.concentrations(),
        })
    }

    /// Steady-state turnover frequency of `gas` at the given energies.
    pub fn turnover_frequency(
        &self,
        energies: &RelativeEnergySet,
        gas: usize,
    ) -> Result<f64, KineticsError> {
        let rates = self.calculator.compute(energies)?;
        let solver = SteadyStateSolver::new(
            self.kernel.clone(),
            self.equations,
            &rates,
            &self.pressures,
            &self.concentrations,
            self.settings,
        )?;
        let steady = solver.solve(&self.baseline)?;
        let base = self
            .equations
            .base_values::<f64>(&rates, &self.pressures, &self.concentrations)?;
        let values = self.equations.at_coverages(&base, &steady.coverages)?;
        self.equations.tof(&values, gas)
    }

    /// `kT·ln(r'/r)/ε`
    fn log_derivative(&self, perturbed: f64, reference: f64) -> Result<f64, KineticsError> {
        let ratio = perturbed / reference;
        if !(ratio > 0.0) || !ratio.is_finite() {
            return Err(KineticsError::ParameterError(format!(
                "turnover frequency changed sign or vanished under perturbation ({:e} -> {:e})",
                reference, perturbed
            )));
        }
        Ok(KB * self.settings.temperature * ratio.ln() / self.settings.perturbation_size)
    }

    fn map_indices<F>(&self, count: usize, f: F) -> Result<Vec<f64>, KineticsError>
    where
        F: Fn(usize) -> Result<f64, KineticsError> + Sync + Send,
    {
        if self.settings.parallel_sensitivity {
            (0..count).into_par_iter().map(f).collect()
        } else {
            (0..count).map(f).collect()
        }
    }

    /// Degree of rate control of reaction `i`.
    pub fn single_xrc(&self, gas: usize, reaction: usize, reference: f64) -> Result<f64, KineticsError> {
        if reaction >= self.network.reaction_count() {
            return Err(KineticsError::ConfigurationError(format!(
                "reaction index {} out of range ({} reactions)",
                reaction,
                self.network.reaction_count()
            )));
        }
        let eps = self.settings.perturbation_size;
        info!("XRC: lowering barriers of reaction {} by {} eV", reaction, eps);
        let perturbed = self.energies.with_lowered_barriers(reaction, eps);
        let r = self.turnover_frequency(&perturbed, gas)?;
        self.log_derivative(r, reference)
    }

    /// Degrees of rate control of every reaction for the turnover frequency of `gas`.
    pub fn xrc(&self, gas: usize) -> Result<Vec<f64>, KineticsError> {
        let reference = self.turnover_frequency(self.energies, gas)?;
        info!(
            "XRC of {}: reference turnover frequency {:e}",
            self.network.gases[gas].name, reference
        );
        self.map_indices(self.network.reaction_count(), |i| {
            self.single_xrc(gas, i, reference)
        })
    }

    /// Degree of thermodynamic rate control of one intermediate.
    pub fn single_xtrc(
        &self,
        gas: usize,
        species: SpeciesRef,
        reference: f64,
    ) -> Result<f64, KineticsError> {
        let eps = self.settings.perturbation_size;
        info!(
            "XTRC: raising formation energy of {} by {} eV",
            self.network.name_of(species),
            eps
        );
        let perturbed = self.energies.with_shifted_species(self.network, species, eps);
        let r = self.turnover_frequency(&perturbed, gas)?;
        Ok(-self.log_derivative(r, reference)?)
    }

    /// Degrees of thermodynamic rate control, ordered as [`ReactionNetwork::intermediates`].
    pub fn xtrc(&self, gas: usize) -> Result<Vec<f64>, KineticsError> {
        let reference = self.turnover_frequency(self.energies, gas)?;
        let intermediates = self.network.intermediates();
        self.map_indices(intermediates.len(), |n| {
            self.single_xtrc(gas, intermediates[n], reference)
        })
    }
}
