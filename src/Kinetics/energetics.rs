//! Relative energies of elementary reactions.
//!
//! Every reaction `i` carries a forward barrier `Gaf[i]`, a reverse barrier `Gar[i]` and a
//! reaction free energy `dG[i] = Gaf[i] - Gar[i]` (all in eV). They are either given
//! directly or derived from the formation energies of the species in the network.
use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesRef, StoichTerm};
use crate::errors::KineticsError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct RelativeEnergySet {
    pub Gaf: Vec<f64>,
    pub Gar: Vec<f64>,
    pub dG: Vec<f64>,
}

/// tolerance of the `dG = Gaf - Gar` consistency check
const CONSISTENCY_TOLERANCE: f64 = 1e-8;

#[allow(non_snake_case)]
impl RelativeEnergySet {
    /// All three vectors must have the same length. Non-negative barriers and
    /// `dG = Gaf - Gar` are checked in debug builds only.
    pub fn new(Gaf: Vec<f64>, Gar: Vec<f64>, dG: Vec<f64>) -> Result<Self, KineticsError> {
        if Gar.len() != Gaf.len() {
            return Err(KineticsError::dimension(Gaf.len(), Gar.len(), "reverse barriers"));
        }
        if dG.len() != Gaf.len() {
            return Err(KineticsError::dimension(Gaf.len(), dG.len(), "reaction energies"));
        }
        let set = Self { Gaf, Gar, dG };
        if cfg!(debug_assertions) {
            set.check_consistency()?;
        }
        Ok(set)
    }

    /// From barriers `Ga` and reaction energies `dG`: `Gar = Ga - dG`.
    pub fn from_barriers(Ga: Vec<f64>, dG: Vec<f64>) -> Result<Self, KineticsError> {
        if dG.len() != Ga.len() {
            return Err(KineticsError::dimension(Ga.len(), dG.len(), "reaction energies"));
        }
        let Gar = Ga.iter().zip(dG.iter()).map(|(ga, dg)| ga - dg).collect();
        Self::new(Ga, Gar, dG)
    }

    pub fn check_consistency(&self) -> Result<(), KineticsError> {
        for i in 0..self.len() {
            if self.Gaf[i] < 0.0 || self.Gar[i] < 0.0 {
                return Err(KineticsError::ParameterError(format!(
                    "negative barrier in reaction {}: Gaf = {}, Gar = {}",
                    i, self.Gaf[i], self.Gar[i]
                )));
            }
            if (self.Gaf[i] - self.Gar[i] - self.dG[i]).abs() > CONSISTENCY_TOLERANCE {
                return Err(KineticsError::ParameterError(format!(
                    "reaction {}: dG = {} differs from Gaf - Gar = {}",
                    i,
                    self.dG[i],
                    self.Gaf[i] - self.Gar[i]
                )));
            }
        }
        Ok(())
    }

    /// Derives relative energies from absolute formation energies.
    ///
    /// Without a transition state the barrier is `max(dG, 0)`; with one it is
    /// `G_TS - G_IS`, raised to `max(dG, 0)` when the TS lies below either end state.
    pub fn from_formation_energies(network: &ReactionNetwork) -> Result<Self, KineticsError> {
        let state_energy = |state: &[StoichTerm]| -> Result<f64, KineticsError> {
            let mut g = 0.0;
            for term in state {
                let energy = network.formation_energy(term.species).ok_or_else(|| {
                    KineticsError::MissingDataError(format!(
                        "no formation energy for {}",
                        term.name
                    ))
                })?;
                g += term.coefficient as f64 * energy;
            }
            Ok(g)
        };
        let (mut gaf, mut gar, mut dg) = (Vec::new(), Vec::new(), Vec::new());
        for reaction in network.reactions.iter() {
            let g_is = state_energy(&reaction.initial)?;
            let g_fs = state_energy(&reaction.final_state)?;
            let d = g_fs - g_is;
            let forward = match &reaction.transition {
                Some(ts) => (state_energy(ts)? - g_is).max(d).max(0.0),
                None => d.max(0.0),
            };
            gaf.push(forward);
            gar.push(forward - d);
            dg.push(d);
        }
        Self::new(gaf, gar, dg)
    }

    pub fn len(&self) -> usize {
        self.Gaf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.Gaf.is_empty()
    }

    /// Lowers both barriers of reaction `i` by `epsilon`; `dG` is unchanged.
    pub fn with_lowered_barriers(&self, i: usize, epsilon: f64) -> Self {
        let mut shifted = self.clone();
        shifted.Gaf[i] -= epsilon;
        shifted.Gar[i] -= epsilon;
        shifted
    }

    /// Relative energies after raising the formation energy of an intermediate by `epsilon`.
    ///
    /// For steps with a transition state the shift enters through the TS and end-state
    /// coefficients. For steps without one the barrierless side is kept barrierless: the
    /// TS coincides with the initial state when `dG < 0` and with the final state otherwise.
    pub fn with_shifted_species(
        &self,
        network: &ReactionNetwork,
        species: SpeciesRef,
        epsilon: f64,
    ) -> Self {
        let mut shifted = self.clone();
        for (i, reaction) in network.reactions.iter().enumerate() {
            let (n_is, n_fs) = reaction.stoichiometry(species);
            let (n_is, n_fs) = (n_is as f64, n_fs as f64);
            let n_ts = if reaction.has_transition_state() {
                reaction.transition_count(species) as f64
            } else if self.dG[i] < 0.0 {
                n_is
            } else {
                n_fs
            };
            shifted.Gaf[i] += epsilon * (n_ts - n_is);
            shifted.Gar[i] += epsilon * (n_ts - n_fs);
            shifted.dG[i] += epsilon * (n_fs - n_is);
        }
        shifted
    }
}
