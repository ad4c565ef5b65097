//! # Rate Constants
//!
//! ## Purpose
//! Converts relative energies of elementary reactions into forward and reverse rate
//! constants with transition-state theory (TST) or collision theory (CT).
//!
//! ## Theory selection
//! The formula is chosen per side of every reaction once, when the calculator is built, and
//! stored as a [`RateBranch`]:
//!
//! | Branch | forward | reverse |
//! |--------|---------|---------|
//! | `GasInitial` | CT with the initial-state gas | TST |
//! | `GasFinal` | TST | CT with the final-state gas |
//! | `GasExchange` | CT | CT |
//! | `ThermallyEquilibratedAdsorption` | CT | detailed balance |
//! | `ThermallyEquilibratedDesorption` | detailed balance | CT |
//! | `PurelySurface` | TST | TST |
//!
//! A step whose opposite barrier is below `barrier_epsilon` is an adsorption/desorption at
//! thermal equilibrium: the entropy correction of its gases shifts `dG`, and the second
//! rate constant follows from `k_other = k_known / exp(-dG/(kB*T))`. With the `TST`
//! algorithm every step is `PurelySurface`.
//!
//! A side evaluated with collision theory carries the gas pressure inside its rate
//! constant, so the coverage equations leave that gas factor out of the rate monomial
//! (see [`RateTheory::collision_gases`]).
//!
//! ## Formulas
//! - TST: `k = kB*T/h * exp(-Ga/(kB*T))`
//! - CT: `k = S * ratio * exp(-Ea/(kB*T)) * p * A / sqrt(2*pi*m*kB_J*T)`
use crate::Kinetics::energetics::RelativeEnergySet;
use crate::Kinetics::entropy_correction::{AMU_KG, BAR_PA, EntropyCorrector, KB_J};
use crate::Kinetics::reaction_network::{
    ElementaryReaction, ReactionNetwork, SpeciesRef, StoichTerm,
};
use crate::settings::{RateAlgorithm, SolverSettings};
use crate::errors::KineticsError;
use enum_dispatch::enum_dispatch;
use log::debug;
use std::sync::Arc;

/// Boltzmann constant, eV/K
pub const KB: f64 = 8.6173324e-5;
/// Planck constant, eV*s
pub const H: f64 = 4.135667662e-15;

/// Transition-state-theory rate constant, 1/s.
pub fn tst_rate(ga: f64, temperature: f64) -> f64 {
    let kt = KB * temperature;
    kt / H * (-ga / kt).exp()
}

/// Collision-theory rate constant, 1/s.
///
/// * `ea` - barrier, eV
/// * `unitcell_area` - m²
/// * `pressure` - Pa
/// * `mass` - kg
pub fn collision_rate(
    ea: f64,
    unitcell_area: f64,
    active_ratio: f64,
    pressure: f64,
    mass: f64,
    temperature: f64,
    sticking_factor: f64,
) -> Result<f64, KineticsError> {
    if active_ratio > 1.0 {
        return Err(KineticsError::ParameterError(format!(
            "active ratio {} is larger than 1",
            active_ratio
        )));
    }
    if sticking_factor > 1.0 {
        return Err(KineticsError::ParameterError(format!(
            "sticking factor {} is larger than 1",
            sticking_factor
        )));
    }
    if !(mass > 0.0) {
        return Err(KineticsError::ParameterError(format!(
            "molecular mass must be positive, got {}",
            mass
        )));
    }
    let flux_denominator = (2.0 * std::f64::consts::PI * mass * KB_J * temperature).sqrt();
    Ok(sticking_factor * active_ratio * (-ea / (KB * temperature)).exp() * pressure * unitcell_area
        / flux_denominator)
}

/// Gas species whose pressure feeds a collision-theory rate constant.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionGas {
    pub gas: usize,
    pub name: String,
    /// bar
    pub pressure: f64,
    /// amu
    pub mass: f64,
}

impl CollisionGas {
    fn from_network(network: &ReactionNetwork, gas: usize) -> Result<Self, KineticsError> {
        let species = &network.gases[gas];
        let mass = species.mass.ok_or_else(|| {
            KineticsError::MissingDataError(format!(
                "collision theory needs the mass of {}",
                species.name
            ))
        })?;
        Ok(Self {
            gas,
            name: species.name.clone(),
            pressure: species.pressure.unwrap_or(0.0),
            mass,
        })
    }

    fn collision_rate(&self, ea: f64, input: &RateInput) -> Result<f64, KineticsError> {
        collision_rate(
            ea,
            input.unitcell_area,
            input.active_ratio,
            self.pressure * BAR_PA,
            self.mass * AMU_KG,
            input.temperature,
            input.sticking_factor,
        )
    }
}

fn gas_terms(
    network: &ReactionNetwork,
    terms: &[&StoichTerm],
) -> Result<Vec<(usize, CollisionGas)>, KineticsError> {
    terms
        .iter()
        .filter_map(|t| match t.species {
            SpeciesRef::Gas(g) => Some(CollisionGas::from_network(network, g).map(|c| (t.coefficient, c))),
            _ => None,
        })
        .collect()
}

/// Gases of both end states, with coefficients, for the entropy-corrected `dG`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GasCorrectionTerms {
    pub initial: Vec<(usize, CollisionGas)>,
    pub final_state: Vec<(usize, CollisionGas)>,
}

impl GasCorrectionTerms {
    fn from_reaction(
        network: &ReactionNetwork,
        reaction: &ElementaryReaction,
    ) -> Result<Self, KineticsError> {
        Ok(Self {
            initial: gas_terms(network, &reaction.initial_gases())?,
            final_state: gas_terms(network, &reaction.final_gases())?,
        })
    }

    /// `dG + sum_FS n*delta - sum_IS n*delta`
    fn corrected_dg(&self, input: &RateInput) -> Result<f64, KineticsError> {
        let mut dg = input.dG;
        for (n, gas) in self.final_state.iter() {
            dg += *n as f64
                * input.corrector.entropy_correction(
                    &gas.name,
                    gas.mass,
                    gas.pressure,
                    input.temperature,
                )?;
        }
        for (n, gas) in self.initial.iter() {
            dg -= *n as f64
                * input.corrector.entropy_correction(
                    &gas.name,
                    gas.mass,
                    gas.pressure,
                    input.temperature,
                )?;
        }
        Ok(dg)
    }
}

/// Energies and conditions of one reaction.
#[allow(non_snake_case)]
pub struct RateInput<'a> {
    pub Gaf: f64,
    pub Gar: f64,
    pub dG: f64,
    pub temperature: f64,
    pub unitcell_area: f64,
    pub active_ratio: f64,
    pub sticking_factor: f64,
    pub corrector: &'a dyn EntropyCorrector,
}

#[enum_dispatch]
pub trait RateTheory {
    /// (kf, kr)
    fn rate_constants(&self, input: &RateInput) -> Result<(f64, f64), KineticsError>;
    /// gases whose pressure is already inside kf and kr respectively
    fn collision_gases(&self) -> (Option<usize>, Option<usize>);
    fn label(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasInitial {
    pub gas: CollisionGas,
}

impl RateTheory for GasInitial {
    fn rate_constants(&self, input: &RateInput) -> Result<(f64, f64), KineticsError> {
        Ok((
            self.gas.collision_rate(input.Gaf, input)?,
            tst_rate(input.Gar, input.temperature),
        ))
    }
    fn collision_gases(&self) -> (Option<usize>, Option<usize>) {
        (Some(self.gas.gas), None)
    }
    fn label(&self) -> &'static str {
        "GasInitial"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasFinal {
    pub gas: CollisionGas,
}

impl RateTheory for GasFinal {
    fn rate_constants(&self, input: &RateInput) -> Result<(f64, f64), KineticsError> {
        Ok((
            tst_rate(input.Gaf, input.temperature),
            self.gas.collision_rate(input.Gar, input)?,
        ))
    }
    fn collision_gases(&self) -> (Option<usize>, Option<usize>) {
        (None, Some(self.gas.gas))
    }
    fn label(&self) -> &'static str {
        "GasFinal"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasExchange {
    pub initial: CollisionGas,
    pub final_gas: CollisionGas,
}

impl RateTheory for GasExchange {
    fn rate_constants(&self, input: &RateInput) -> Result<(f64, f64), KineticsError> {
        Ok((
            self.initial.collision_rate(input.Gaf, input)?,
            self.final_gas.collision_rate(input.Gar, input)?,
        ))
    }
    fn collision_gases(&self) -> (Option<usize>, Option<usize>) {
        (Some(self.initial.gas), Some(self.final_gas.gas))
    }
    fn label(&self) -> &'static str {
        "GasExchange"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermallyEquilibratedAdsorption {
    pub gas: CollisionGas,
    pub corrections: GasCorrectionTerms,
}

impl RateTheory for ThermallyEquilibratedAdsorption {
    fn rate_constants(&self, input: &RateInput) -> Result<(f64, f64), KineticsError> {
        let kf = self.gas.collision_rate(input.Gaf, input)?;
        let dg = self.corrections.corrected_dg(input)?;
        let kr = kf / (-dg / (KB * input.temperature)).exp();
        Ok((kf, kr))
    }
    fn collision_gases(&self) -> (Option<usize>, Option<usize>) {
        (Some(self.gas.gas), None)
    }
    fn label(&self) -> &'static str {
        "ThermallyEquilibratedAdsorption"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermallyEquilibratedDesorption {
    pub gas: CollisionGas,
    pub corrections: GasCorrectionTerms,
}

impl RateTheory for ThermallyEquilibratedDesorption {
    fn rate_constants(&self, input: &RateInput) -> Result<(f64, f64), KineticsError> {
        let kr = self.gas.collision_rate(input.Gar, input)?;
        let dg = self.corrections.corrected_dg(input)?;
        let kf = kr * (-dg / (KB * input.temperature)).exp();
        Ok((kf, kr))
    }
    fn collision_gases(&self) -> (Option<usize>, Option<usize>) {
        (None, Some(self.gas.gas))
    }
    fn label(&self) -> &'static str {
        "ThermallyEquilibratedDesorption"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurelySurface;

impl RateTheory for PurelySurface {
    fn rate_constants(&self, input: &RateInput) -> Result<(f64, f64), KineticsError> {
        Ok((
            tst_rate(input.Gaf, input.temperature),
            tst_rate(input.Gar, input.temperature),
        ))
    }
    fn collision_gases(&self) -> (Option<usize>, Option<usize>) {
        (None, None)
    }
    fn label(&self) -> &'static str {
        "PurelySurface"
    }
}

/// Theory used for one elementary reaction.
#[enum_dispatch(RateTheory)]
#[derive(Debug, Clone, PartialEq)]
pub enum RateBranch {
    GasInitial(GasInitial),
    GasFinal(GasFinal),
    GasExchange(GasExchange),
    ThermallyEquilibratedAdsorption(ThermallyEquilibratedAdsorption),
    ThermallyEquilibratedDesorption(ThermallyEquilibratedDesorption),
    PurelySurface(PurelySurface),
}

fn first_gas(terms: Vec<&StoichTerm>) -> Option<usize> {
    terms.iter().find_map(|t| match t.species {
        SpeciesRef::Gas(g) => Some(g),
        _ => None,
    })
}

/// Picks the branch of a reaction from its phase composition and barriers.
#[allow(non_snake_case)]
pub fn resolve_branch(
    network: &ReactionNetwork,
    reaction: &ElementaryReaction,
    Gaf: f64,
    Gar: f64,
    algorithm: RateAlgorithm,
    barrier_epsilon: f64,
) -> Result<RateBranch, KineticsError> {
    if algorithm == RateAlgorithm::TST {
        return Ok(PurelySurface.into());
    }
    let initial_gas = first_gas(reaction.initial_gases());
    let final_gas = first_gas(reaction.final_gases());
    let branch: RateBranch = match (initial_gas, final_gas) {
        (Some(gi), Some(gf)) => GasExchange {
            initial: CollisionGas::from_network(network, gi)?,
            final_gas: CollisionGas::from_network(network, gf)?,
        }
        .into(),
        (Some(g), None) => {
            let gas = CollisionGas::from_network(network, g)?;
            if Gar < barrier_epsilon {
                ThermallyEquilibratedAdsorption {
                    gas,
                    corrections: GasCorrectionTerms::from_reaction(network, reaction)?,
                }
                .into()
            } else {
                GasInitial { gas }.into()
            }
        }
        (None, Some(g)) => {
            let gas = CollisionGas::from_network(network, g)?;
            if Gaf < barrier_epsilon {
                ThermallyEquilibratedDesorption {
                    gas,
                    corrections: GasCorrectionTerms::from_reaction(network, reaction)?,
                }
                .into()
            } else {
                GasFinal { gas }.into()
            }
        }
        (None, None) => PurelySurface.into(),
    };
    debug!(
        "reaction {} '{}': {}",
        reaction.index,
        reaction.expression,
        branch.label()
    );
    Ok(branch)
}

/// Forward and reverse rate constants of every reaction, in network order.
#[derive(Debug, Clone, PartialEq)]
pub struct RateConstantSet {
    pub kf: Vec<f64>,
    pub kr: Vec<f64>,
}

impl RateConstantSet {
    pub fn new(kf: Vec<f64>, kr: Vec<f64>) -> Result<Self, KineticsError> {
        if kf.len() != kr.len() {
            return Err(KineticsError::dimension(kf.len(), kr.len(), "reverse rate constants"));
        }
        Ok(Self { kf, kr })
    }

    pub fn len(&self) -> usize {
        self.kf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kf.is_empty()
    }

    /// `K_i = kf_i / kr_i`
    pub fn equilibrium_constants(&self) -> Vec<f64> {
        self.kf
            .iter()
            .zip(self.kr.iter())
            .map(|(kf, kr)| kf / kr)
            .collect()
    }
}

/// Rate constants of a network under fixed conditions; branches are resolved on construction.
#[derive(Clone)]
pub struct RateConstantCalculator {
    pub branches: Vec<RateBranch>,
    pub temperature: f64,
    pub unitcell_area: f64,
    pub active_ratio: f64,
    pub sticking_factor: f64,
    pub corrector: Arc<dyn EntropyCorrector>,
}

impl RateConstantCalculator {
    pub fn new(
        network: &ReactionNetwork,
        energies: &RelativeEnergySet,
        settings: &SolverSettings,
        corrector: Arc<dyn EntropyCorrector>,
    ) -> Result<Self, KineticsError> {
        if energies.len() != network.reaction_count() {
            return Err(KineticsError::dimension(
                network.reaction_count(),
                energies.len(),
                "relative energies",
            ));
        }
        if settings.active_ratio > 1.0 || settings.sticking_factor > 1.0 {
            return Err(KineticsError::ParameterError(format!(
                "active ratio {} and sticking factor {} must not exceed 1",
                settings.active_ratio, settings.sticking_factor
            )));
        }
        let branches = network
            .reactions
            .iter()
            .map(|r| {
                resolve_branch(
                    network,
                    r,
                    energies.Gaf[r.index],
                    energies.Gar[r.index],
                    settings.rate_algorithm,
                    settings.barrier_epsilon,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            branches,
            temperature: settings.temperature,
            unitcell_area: settings.unitcell_area,
            active_ratio: settings.active_ratio,
            sticking_factor: settings.sticking_factor,
            corrector,
        })
    }

    /// Rate constants of reaction `i` under the stored branch.
    pub fn rates_for_reaction(
        &self,
        i: usize,
        energies: &RelativeEnergySet,
    ) -> Result<(f64, f64), KineticsError> {
        if i >= self.branches.len() || i >= energies.len() {
            return Err(KineticsError::ConfigurationError(format!(
                "reaction index {} out of range: {} reactions, {} energy entries",
                i,
                self.branches.len(),
                energies.len()
            )));
        }
        let input = RateInput {
            Gaf: energies.Gaf[i],
            Gar: energies.Gar[i],
            dG: energies.dG[i],
            temperature: self.temperature,
            unitcell_area: self.unitcell_area,
            active_ratio: self.active_ratio,
            sticking_factor: self.sticking_factor,
            corrector: self.corrector.as_ref(),
        };
        self.branches[i].rate_constants(&input)
    }

    pub fn compute(&self, energies: &RelativeEnergySet) -> Result<RateConstantSet, KineticsError> {
        if energies.len() != self.branches.len() {
            return Err(KineticsError::dimension(
                self.branches.len(),
                energies.len(),
                "relative energies",
            ));
        }
        let mut kf = Vec::with_capacity(energies.len());
        let mut kr = Vec::with_capacity(energies.len());
        for i in 0..energies.len() {
            let (f, r) = self.rates_for_reaction(i, energies)?;
            kf.push(f);
            kr.push(r);
        }
        RateConstantSet::new(kf, kr)
    }

    pub fn collision_gases(&self) -> Vec<(Option<usize>, Option<usize>)> {
        self.branches.iter().map(|b| b.collision_gases()).collect()
    }
}
