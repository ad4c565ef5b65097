//! # Microkinetic Model Session
//!
//! ## Purpose
//! Owns one reaction network together with its settings, relative energies and entropy
//! corrector, and runs the whole mean-field pipeline on demand:
//! rate constants -> coverage equations -> steady state -> rates, TOFs and sensitivities,
//! or alternatively the quasi-equilibrium closed form.
//!
//! ## Caching
//! Rate constants and coverage equations are derived lazily and kept until something they
//! depend on changes. Changing the temperature, the energies, a pressure, the settings or the
//! corrector drops them together with the last steady state.
//!
//! ## Precision
//! The arithmetic of every solve follows `settings.precision`; the choice is made per call,
//! there is no global backend switch.
//!
//! ## Example
//! ```rust,ignore
//! let mut model = MicroKineticModel::new(network, energies, settings)?;
//! let steady = model.steady_state(Some(&[0.9, 0.1]))?;
//! let tof = model.tof("CO2_g")?;
//! model.print_report()?;
//! ```
use crate::Kinetics::energetics::RelativeEnergySet;
use crate::Kinetics::entropy_correction::{EntropyCorrector, NoCorrection};
use crate::Kinetics::kmc_bridge::{
    LatticeConfiguration, SiteMap, StochasticBackend, build_processes,
};
use crate::Kinetics::rate_constants::{KB, RateConstantCalculator, RateConstantSet, RateTheory};
use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesRef};
use crate::MeanField::coverage_equations::CoverageEquations;
use crate::MeanField::numeric_kernel::{DoubleDoubleKernel, F64Kernel, NumericKernel, PrecisionMode};
use crate::MeanField::polynomial::SymbolValues;
use crate::MeanField::quasi_equilibrium::{QuasiEquilibriumReducer, QuasiEquilibriumResult};
use crate::MeanField::sensitivity::SensitivityAnalyzer;
use crate::MeanField::steady_state_solver::{SteadyStateResult, SteadyStateSolver};
use crate::errors::KineticsError;
use crate::settings::SolverSettings;
use log::{info, warn};
use prettytable::{Cell, Row, Table, row};
use std::sync::Arc;

/// Data derived from network, energies and settings.
#[derive(Clone)]
struct Derived {
    calculator: RateConstantCalculator,
    rates: RateConstantSet,
    equations: CoverageEquations,
}

pub struct MicroKineticModel {
    network: ReactionNetwork,
    settings: SolverSettings,
    energies: RelativeEnergySet,
    corrector: Arc<dyn EntropyCorrector>,
    derived: Option<Derived>,
    steady_state: Option<SteadyStateResult>,
}

impl MicroKineticModel {
    pub fn new(
        network: ReactionNetwork,
        energies: RelativeEnergySet,
        settings: SolverSettings,
    ) -> Result<Self, KineticsError> {
        settings.validate()?;
        if energies.len() != network.reaction_count() {
            return Err(KineticsError::dimension(
                network.reaction_count(),
                energies.len(),
                "relative energies",
            ));
        }
        Ok(Self {
            network,
            settings,
            energies,
            corrector: Arc::new(NoCorrection),
            derived: None,
            steady_state: None,
        })
    }

    /// Relative energies computed from the formation energies stored in the network.
    pub fn from_formation_energies(
        network: ReactionNetwork,
        settings: SolverSettings,
    ) -> Result<Self, KineticsError> {
        let energies = RelativeEnergySet::from_formation_energies(&network)?;
        Self::new(network, energies, settings)
    }

    pub fn with_corrector(mut self, corrector: Arc<dyn EntropyCorrector>) -> Self {
        self.corrector = corrector;
        self.invalidate();
        self
    }

    pub fn network(&self) -> &ReactionNetwork {
        &self.network
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    pub fn energies(&self) -> &RelativeEnergySet {
        &self.energies
    }

    /// last converged steady state, if it is still valid
    pub fn last_steady_state(&self) -> Option<&SteadyStateResult> {
        self.steady_state.as_ref()
    }

    fn invalidate(&mut self) {
        self.derived = None;
        self.steady_state = None;
    }

    pub fn set_settings(&mut self, settings: SolverSettings) -> Result<(), KineticsError> {
        settings.validate()?;
        self.settings = settings;
        self.invalidate();
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<(), KineticsError> {
        let mut settings = self.settings.clone();
        settings.temperature = temperature;
        self.set_settings(settings)
    }

    pub fn set_energies(&mut self, energies: RelativeEnergySet) -> Result<(), KineticsError> {
        if energies.len() != self.network.reaction_count() {
            return Err(KineticsError::dimension(
                self.network.reaction_count(),
                energies.len(),
                "relative energies",
            ));
        }
        self.energies = energies;
        self.invalidate();
        Ok(())
    }

    /// Collision-theory rate constants depend on pressure, so everything is rebuilt.
    pub fn set_pressure(&mut self, gas: &str, pressure: f64) -> Result<(), KineticsError> {
        self.network.set_pressure(gas, pressure)?;
        self.invalidate();
        Ok(())
    }

    fn ensure_derived(&mut self) -> Result<(), KineticsError> {
        if self.derived.is_none() {
            let calculator = RateConstantCalculator::new(
                &self.network,
                &self.energies,
                &self.settings,
                self.corrector.clone(),
            )?;
            let rates = calculator.compute(&self.energies)?;
            let equations = CoverageEquations::build(&self.network, &calculator.collision_gases())?;
            info!(
                "rate constants and coverage equations built for {} reactions at T = {} K",
                rates.len(),
                self.settings.temperature
            );
            self.derived = Some(Derived {
                calculator,
                rates,
                equations,
            });
        }
        Ok(())
    }

    fn derived(&self) -> Result<&Derived, KineticsError> {
        self.derived.as_ref().ok_or_else(|| {
            KineticsError::MissingDataError("rate constants have not been computed".to_string())
        })
    }

    pub fn rate_constants(&mut self) -> Result<RateConstantSet, KineticsError> {
        self.ensure_derived()?;
        Ok(self.derived()?.rates.clone())
    }

    pub fn coverage_equations(&mut self) -> Result<&CoverageEquations, KineticsError> {
        self.ensure_derived()?;
        Ok(&self.derived()?.equations)
    }

    /// Boltzmann-distributed coverages from formation energies.
    ///
    /// One partition sum runs over all adsorbates (and, with `include_empty_sites`, over the
    /// free sites of every site type).
    pub fn boltzmann_coverages(&self, include_empty_sites: bool) -> Result<Vec<f64>, KineticsError> {
        let kt = KB * self.settings.temperature;
        let energy = |species: SpeciesRef| -> Result<f64, KineticsError> {
            self.network.formation_energy(species).ok_or_else(|| {
                KineticsError::MissingDataError(format!(
                    "no formation energy for {}, Boltzmann coverages unavailable",
                    self.network.name_of(species)
                ))
            })
        };
        let mut energies = Vec::with_capacity(self.network.adsorbates.len());
        for a in 0..self.network.adsorbates.len() {
            energies.push(energy(SpeciesRef::Adsorbate(a))?);
        }
        let mut pool = energies.clone();
        if include_empty_sites {
            for s in 0..self.network.sites.len() {
                pool.push(energy(SpeciesRef::FreeSite(s))?);
            }
        }
        // shifted by the minimum so the exponentials cannot overflow
        let lowest = pool.iter().cloned().fold(f64::INFINITY, f64::min);
        let sum: f64 = pool.iter().map(|g| (-(g - lowest) / kt).exp()).sum();
        Ok(energies
            .iter()
            .map(|g| (-(g - lowest) / kt).exp() / sum)
            .collect())
    }

    fn solve_with<K: NumericKernel>(
        &self,
        kernel: K,
        seed: &[f64],
    ) -> Result<SteadyStateResult, KineticsError> {
        let derived = self.derived()?;
        SteadyStateSolver::new(
            kernel,
            &derived.equations,
            &derived.rates,
            &self.network.pressures(),
            &self.network.concentrations(),
            &self.settings,
        )?
        .solve(seed)
    }

    /// Steady-state coverages. Without a seed the solve starts from the empty surface;
    /// [`Self::boltzmann_coverages`] gives an alternative seed when formation energies are known.
    pub fn steady_state(&mut self, seed: Option<&[f64]>) -> Result<SteadyStateResult, KineticsError> {
        self.ensure_derived()?;
        let seed = match seed {
            Some(s) => s.to_vec(),
            None => vec![0.0; self.network.adsorbates.len()],
        };
        info!(
            "steady state in {:?} precision from seed {:?}",
            self.settings.precision, seed
        );
        let result = match self.settings.precision {
            PrecisionMode::Double => self.solve_with(F64Kernel, &seed),
            PrecisionMode::DoubleDouble => self.solve_with(DoubleDoubleKernel, &seed),
        };
        match result {
            Ok(steady) => {
                self.steady_state = Some(steady.clone());
                Ok(steady)
            }
            Err(e) => {
                warn!("steady-state solve failed: {}", e);
                self.steady_state = None;
                Err(e)
            }
        }
    }

    fn steady_values(&self) -> Result<SymbolValues<f64>, KineticsError> {
        let steady = self.steady_state.as_ref().ok_or_else(|| {
            KineticsError::MissingDataError("no steady state has been solved".to_string())
        })?;
        let derived = self.derived()?;
        let base = derived.equations.base_values::<f64>(
            &derived.rates,
            &self.network.pressures(),
            &self.network.concentrations(),
        )?;
        derived.equations.at_coverages(&base, &steady.coverages)
    }

    /// Forward and reverse rates of every reaction at the last steady state.
    pub fn rates(&self) -> Result<(Vec<f64>, Vec<f64>), KineticsError> {
        let values = self.steady_values()?;
        Ok(self.derived()?.equations.rates(&values))
    }

    pub fn net_rates(&self) -> Result<Vec<f64>, KineticsError> {
        let values = self.steady_values()?;
        Ok(self.derived()?.equations.net_rates(&values))
    }

    /// `r_reverse / r_forward` of every reaction
    pub fn reversibilities(&self) -> Result<Vec<f64>, KineticsError> {
        let values = self.steady_values()?;
        Ok(self.derived()?.equations.reversibilities(&values))
    }

    /// Turnover frequency of a gas at the last steady state; negative for reactants.
    pub fn tof(&self, gas: &str) -> Result<f64, KineticsError> {
        let g = self.network.gas_index(gas)?;
        let values = self.steady_values()?;
        self.derived()?.equations.tof(&values, g)
    }

    /// Turnover frequencies of all gases in network order.
    pub fn tofs(&self) -> Result<Vec<f64>, KineticsError> {
        let values = self.steady_values()?;
        let equations = &self.derived()?.equations;
        (0..self.network.gases.len())
            .map(|g| equations.tof(&values, g))
            .collect()
    }

    /// Closed-form rate with every step but `settings.rds` equilibrated.
    pub fn quasi_equilibrium(&mut self) -> Result<QuasiEquilibriumResult, KineticsError> {
        let rds = self.settings.rds.ok_or_else(|| {
            KineticsError::ConfigurationError(
                "quasi-equilibrium needs a rate-determining step index".to_string(),
            )
        })?;
        self.ensure_derived()?;
        let derived = self.derived()?;
        QuasiEquilibriumReducer::new(&self.network, &derived.equations).reduce(rds)
    }

    /// Quasi-equilibrium rate of the rate-determining step and the coverages behind it.
    pub fn quasi_equilibrium_rate(&mut self) -> Result<(f64, Vec<f64>), KineticsError> {
        let qe = self.quasi_equilibrium()?;
        let derived = self.derived()?;
        let values = derived.equations.base_values::<f64>(
            &derived.rates,
            &self.network.pressures(),
            &self.network.concentrations(),
        )?;
        Ok((qe.tof(&values), qe.coverages_at(&values)))
    }

    fn baseline(&self) -> Result<Vec<f64>, KineticsError> {
        self.steady_state
            .as_ref()
            .map(|s| s.coverages.clone())
            .ok_or_else(|| {
                KineticsError::MissingDataError(
                    "sensitivity analysis needs a solved steady state".to_string(),
                )
            })
    }

    fn analyze<K, F>(&self, kernel: K, run: F) -> Result<Vec<f64>, KineticsError>
    where
        K: NumericKernel + Clone,
        F: Fn(&SensitivityAnalyzer<'_, K>) -> Result<Vec<f64>, KineticsError>,
    {
        let derived = self.derived()?;
        let analyzer = SensitivityAnalyzer::new(
            kernel,
            &self.network,
            &derived.equations,
            &derived.calculator,
            &self.energies,
            &self.settings,
            self.baseline()?,
        )?;
        run(&analyzer)
    }

    /// Degree of rate control of every reaction for the TOF of `gas`.
    pub fn xrc(&mut self, gas: &str) -> Result<Vec<f64>, KineticsError> {
        self.ensure_derived()?;
        let g = self.network.gas_index(gas)?;
        match self.settings.precision {
            PrecisionMode::Double => self.analyze(F64Kernel, |a| a.xrc(g)),
            PrecisionMode::DoubleDouble => self.analyze(DoubleDoubleKernel, |a| a.xrc(g)),
        }
    }

    /// Degree of thermodynamic rate control of every intermediate for the TOF of `gas`.
    pub fn xtrc(&mut self, gas: &str) -> Result<Vec<f64>, KineticsError> {
        self.ensure_derived()?;
        let g = self.network.gas_index(gas)?;
        match self.settings.precision {
            PrecisionMode::Double => self.analyze(F64Kernel, |a| a.xtrc(g)),
            PrecisionMode::DoubleDouble => self.analyze(DoubleDoubleKernel, |a| a.xtrc(g)),
        }
    }

    /// Passes processes, the lattice filled from the last steady state (empty lattice
    /// if there is none) and the site map to an external kMC engine.
    pub fn run_stochastic(
        &mut self,
        backend: &mut dyn StochasticBackend,
        site_map: &SiteMap,
    ) -> Result<(), KineticsError> {
        self.ensure_derived()?;
        let processes = build_processes(&self.network, &self.derived()?.rates)?;
        let coverages = match &self.steady_state {
            Some(s) => s.coverages.clone(),
            None => vec![0.0; self.network.adsorbates.len()],
        };
        let configuration = LatticeConfiguration::from_coverages(&self.network, &coverages, site_map)?;
        info!("handing {} processes to backend {}", processes.len(), backend.name());
        backend.run(&processes, &configuration, site_map)
    }

    ////////////////////////////////////////////////////////////////////////
    //                           REPORTS
    ////////////////////////////////////////////////////////////////////////

    pub fn rate_constants_table(&mut self) -> Result<Table, KineticsError> {
        self.ensure_derived()?;
        let derived = self.derived()?;
        let mut table = Table::new();
        table.add_row(row!["Reaction", "Theory", "kf", "kr", "K"]);
        let k = derived.rates.equilibrium_constants();
        for (i, reaction) in self.network.reactions.iter().enumerate() {
            table.add_row(Row::new(vec![
                Cell::new(&reaction.expression),
                Cell::new(derived.calculator.branches[i].label()),
                Cell::new(&format!("{:.6e}", derived.rates.kf[i])),
                Cell::new(&format!("{:.6e}", derived.rates.kr[i])),
                Cell::new(&format!("{:.6e}", k[i])),
            ]));
        }
        Ok(table)
    }

    pub fn coverages_table(&self) -> Result<Table, KineticsError> {
        let values = self.steady_values()?;
        let mut table = Table::new();
        table.add_row(row!["Species", "Coverage"]);
        for (a, theta) in values.coverages.iter().enumerate() {
            table.add_row(row![self.network.adsorbates[a].name, format!("{:.10e}", theta)]);
        }
        for (s, free) in values.free_sites.iter().enumerate() {
            table.add_row(row![
                format!("*_{}", self.network.sites[s].name),
                format!("{:.10e}", free)
            ]);
        }
        Ok(table)
    }

    pub fn tof_table(&self) -> Result<Table, KineticsError> {
        let tofs = self.tofs()?;
        let mut table = Table::new();
        table.add_row(row!["Gas", "TOF (1/s)"]);
        for (gas, tof) in self.network.gases.iter().zip(tofs.iter()) {
            table.add_row(row![gas.name, format!("{:.6e}", tof)]);
        }
        Ok(table)
    }

    /// Two-column table of labelled coefficients, e.g. XRC per reaction.
    pub fn sensitivity_table(title: &str, labels: &[String], values: &[f64]) -> Table {
        let mut table = Table::new();
        table.add_row(row!["", title]);
        for (label, value) in labels.iter().zip(values.iter()) {
            table.add_row(row![label, format!("{:.6}", value)]);
        }
        table
    }

    /// Prints rate constants and, when a steady state is available, coverages and TOFs.
    pub fn print_report(&mut self) -> Result<(), KineticsError> {
        println!("____________________RATE CONSTANTS_________________________");
        self.rate_constants_table()?.printstd();
        if self.steady_state.is_some() {
            println!("____________________COVERAGES_________________________");
            self.coverages_table()?.printstd();
            println!("____________________TURNOVER FREQUENCIES_________________________");
            self.tof_table()?.printstd();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kinetics::kmc_bridge::DryRunBackend;
    use crate::Kinetics::reaction_network::SpeciesDefinition;
    use crate::settings::RateAlgorithm;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    const EXPRESSIONS: [&str; 3] = [
        "CO_g + *_s -> CO_s",
        "O2_g + 2*_s -> 2O_s",
        "CO_s + O_s <-> CO-O_s + *_s -> CO2_g + 2*_s",
    ];

    fn settings() -> SolverSettings {
        SolverSettings {
            temperature: 450.0,
            rate_algorithm: RateAlgorithm::TST,
            ..SolverSettings::default()
        }
    }

    fn co_oxidation(with_energies: bool) -> MicroKineticModel {
        let e = |d: SpeciesDefinition, g: f64| {
            if with_energies {
                d.with_formation_energy(g)
            } else {
                d
            }
        };
        let defs = HashMap::from([
            ("CO_g".to_string(), e(SpeciesDefinition::gas(1.0), 0.0)),
            ("O2_g".to_string(), e(SpeciesDefinition::gas(1.0 / 3.0), 0.0)),
            ("CO2_g".to_string(), e(SpeciesDefinition::gas(0.0), -2.074)),
            ("s".to_string(), SpeciesDefinition::site(1.0)),
            ("CO_s".to_string(), e(SpeciesDefinition::default(), -0.758)),
            ("O_s".to_string(), e(SpeciesDefinition::default(), -1.32)),
            ("CO-O_s".to_string(), e(SpeciesDefinition::default(), -0.828)),
        ]);
        let network = ReactionNetwork::new(&EXPRESSIONS, &defs).unwrap();
        let energies =
            RelativeEnergySet::from_barriers(vec![0.0, 0.0, 1.25], vec![-0.758, -2.64, 0.324])
                .unwrap();
        MicroKineticModel::new(network, energies, settings()).unwrap()
    }

    #[test]
    fn test_steady_state_rates_and_tofs() {
        let mut model = co_oxidation(false);
        let steady = model.steady_state(Some(&[0.9, 0.1])).unwrap();
        assert_relative_eq!(steady.coverages[0], 0.9993009023315728, epsilon = 1e-6);
        assert_relative_eq!(steady.coverages[1], 0.0006990944289937246, epsilon = 1e-6);

        let tofs = model.tofs().unwrap();
        assert_relative_eq!(tofs[2], 6.559739597348503e-05, max_relative = 1e-6);
        assert_relative_eq!(tofs[0], -tofs[2], max_relative = 1e-6);
        assert_relative_eq!(tofs[1], -0.5 * tofs[2], max_relative = 1e-6);
        assert_relative_eq!(model.tof("CO2_g").unwrap(), tofs[2]);
        assert!(model.tof("N2_g").is_err());

        let (forward, reverse) = model.rates().unwrap();
        let net = model.net_rates().unwrap();
        for i in 0..3 {
            assert_relative_eq!(net[i], forward[i] - reverse[i]);
        }
        // nothing desorbs as CO2 back: the last step is irreversible
        assert_eq!(model.reversibilities().unwrap()[2], 0.0);
        assert!(model.coverages_table().unwrap().to_string().contains("CO_s"));
        assert!(model.tof_table().unwrap().to_string().contains("CO2_g"));
    }

    #[test]
    fn test_double_double_session() {
        let mut model = co_oxidation(false);
        let mut s = settings();
        s.precision = PrecisionMode::DoubleDouble;
        model.set_settings(s).unwrap();
        let steady = model.steady_state(Some(&[0.9, 0.1])).unwrap();
        assert_relative_eq!(steady.coverages[0], 0.9993009023315728, epsilon = 1e-6);
        assert_relative_eq!(steady.coverages[1], 0.0006990944289937246, epsilon = 1e-6);
    }

    #[test]
    fn test_changes_invalidate_derived_data() {
        let mut model = co_oxidation(false);
        let k450 = model.rate_constants().unwrap();
        model.steady_state(Some(&[0.9, 0.1])).unwrap();
        assert!(model.last_steady_state().is_some());

        model.set_temperature(500.0).unwrap();
        assert!(model.last_steady_state().is_none());
        assert!(matches!(model.tofs(), Err(KineticsError::MissingDataError(_))));
        let k500 = model.rate_constants().unwrap();
        assert!(k500.kf[2] > k450.kf[2]);

        let lowered = model.energies().with_lowered_barriers(2, 0.1);
        model.set_energies(lowered).unwrap();
        let k_lowered = model.rate_constants().unwrap();
        assert_relative_eq!(
            k_lowered.kf[2] / k500.kf[2],
            (0.1 / (KB * 500.0)).exp(),
            max_relative = 1e-10
        );
        assert!(model.set_temperature(-1.0).is_err());
        assert!(
            model
                .set_energies(RelativeEnergySet::from_barriers(vec![0.0], vec![0.0]).unwrap())
                .is_err()
        );
    }

    #[test]
    fn test_boltzmann_seed() {
        let model = co_oxidation(true);
        let with_empty = model.boltzmann_coverages(true).unwrap();
        assert_relative_eq!(with_empty[0], 5.080145739525158e-07, max_relative = 1e-6);
        assert_relative_eq!(with_empty[1], 0.9999994919854245, max_relative = 1e-9);
        let without = model.boltzmann_coverages(false).unwrap();
        assert_relative_eq!(without[0] + without[1], 1.0, epsilon = 1e-14);
        assert!(without[0] > with_empty[0]);


        let bare = co_oxidation(false);
        assert!(matches!(
            bare.boltzmann_coverages(true),
            Err(KineticsError::MissingDataError(_))
        ));
    }

    #[test]
    fn test_default_seed_is_the_empty_surface() {
        // formation energies must not steer the default start towards the O-poisoned state
        for with_energies in [false, true] {
            let mut model = co_oxidation(with_energies);
            let steady = model.steady_state(None).unwrap();
            assert!(steady.converged);
            assert_eq!(steady.damping_retries, 0);
            assert_relative_eq!(steady.coverages[0], 0.9993009023315728, epsilon = 1e-6);
            assert_relative_eq!(steady.coverages[1], 0.0006990944289937246, epsilon = 1e-6);
            assert_relative_eq!(
                model.tof("CO2_g").unwrap(),
                6.559739597348503e-05,
                max_relative = 1e-6
            );
        }
    }

    #[test]
    fn test_formation_energy_session() {
        let defs = HashMap::from([
            ("CO_g".to_string(), SpeciesDefinition::gas(1.0).with_formation_energy(0.0)),
            ("O2_g".to_string(), SpeciesDefinition::gas(1.0 / 3.0).with_formation_energy(0.0)),
            ("CO2_g".to_string(), SpeciesDefinition::gas(0.0).with_formation_energy(-2.074)),
            ("s".to_string(), SpeciesDefinition::site(1.0)),
            ("CO_s".to_string(), SpeciesDefinition::default().with_formation_energy(-0.758)),
            ("O_s".to_string(), SpeciesDefinition::default().with_formation_energy(-1.32)),
            ("CO-O_s".to_string(), SpeciesDefinition::default().with_formation_energy(-0.828)),
        ]);
        let network = ReactionNetwork::new(&EXPRESSIONS, &defs).unwrap();
        let model = MicroKineticModel::from_formation_energies(network, settings()).unwrap();
        assert_relative_eq!(model.energies().Gaf[2], 1.25, epsilon = 1e-12);
        assert_relative_eq!(model.energies().dG[2], 0.004, epsilon = 1e-12);
    }

    #[test]
    fn test_quasi_equilibrium_from_settings() {
        let mut model = co_oxidation(false);
        assert!(matches!(
            model.quasi_equilibrium(),
            Err(KineticsError::ConfigurationError(_))
        ));
        let mut s = settings();
        s.rds = Some(2);
        model.set_settings(s).unwrap();
        let qe = model.quasi_equilibrium().unwrap();
        assert_eq!(qe.rds, 2);
        let (rate, coverages) = model.quasi_equilibrium_rate().unwrap();
        assert!(rate > 0.0);
        assert_relative_eq!(coverages.iter().sum::<f64>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sensitivities_need_steady_state() {
        let mut model = co_oxidation(false);
        assert!(matches!(
            model.xrc("CO2_g"),
            Err(KineticsError::MissingDataError(_))
        ));
        model.steady_state(Some(&[0.9, 0.1])).unwrap();
        let xrc = model.xrc("CO2_g").unwrap();
        assert_relative_eq!(xrc[1], 0.9986, epsilon = 1e-4);
        let xtrc = model.xtrc("CO2_g").unwrap();
        assert_eq!(xtrc.len(), 3);
        let labels: Vec<String> = model.network().reactions.iter().map(|r| r.expression.clone()).collect();
        let table = MicroKineticModel::sensitivity_table("XRC", &labels, &xrc);
        assert!(table.to_string().contains("0.998"));
    }

    #[test]
    fn test_stochastic_boundary_and_report() {
        let mut model = co_oxidation(false);
        let site_map = SiteMap::uniform(model.network(), "s", 16).unwrap();
        let mut backend = DryRunBackend::default();
        model.run_stochastic(&mut backend, &site_map).unwrap();
        model.steady_state(Some(&[0.9, 0.1])).unwrap();
        model.run_stochastic(&mut backend, &site_map).unwrap();
        assert_eq!(backend.runs, 2);
        let table = model.rate_constants_table().unwrap().to_string();
        assert!(table.contains("PurelySurface"));
        model.print_report().unwrap();
    }
}
