//! # Reaction Network
//!
//! ## Purpose
//! Typed, immutable representation of a catalytic reaction network: gas and liquid species,
//! adsorbates, transition states, surface sites and the elementary steps connecting them.
//! Every other part of the crate reads the network; nothing mutates it after construction.
//!
//! ## Reaction syntax
//! ```text
//! CO_g + *_s -> CO_s
//! O2_g + 2*_s -> 2O_s
//! CO_s + O_s <-> CO-O_2s -> CO2_g + 2*_s
//! ```
//! - suffix `_g` marks a gas, `_l` a liquid, `_<site>` an adsorbate on `<site>`
//! - `*_<site>` is a free site
//! - a name containing `-` is a transition state; `_2s` means it spans two `s` sites
//! - a leading integer is the stoichiometric coefficient
//! - two states are separated by `->`, three states by `<->` and `->`
//!
//! Species and sites are numbered by first appearance. The index of an elementary reaction
//! in the network is the only key aligning energies, rate constants and rates.
//!
//! ## Species data
//! Phase data comes from [`SpeciesDefinition`] records keyed by species name (sites by site
//! name): pressure (bar) for gases, concentration for liquids, total site density for sites,
//! optional formation energy (eV) and optional molecular mass (amu).

use crate::Kinetics::molmass::calculate_molar_mass;
use crate::errors::KineticsError;
use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Phase data of one species or site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesDefinition {
    /// partial pressure, bar
    pub pressure: Option<f64>,
    pub concentration: Option<f64>,
    /// total site density, sites only
    pub total: Option<f64>,
    /// eV
    pub formation_energy: Option<f64>,
    /// amu
    pub mass: Option<f64>,
}

impl SpeciesDefinition {
    pub fn gas(pressure: f64) -> Self {
        Self {
            pressure: Some(pressure),
            ..Default::default()
        }
    }
    pub fn liquid(concentration: f64) -> Self {
        Self {
            concentration: Some(concentration),
            ..Default::default()
        }
    }
    pub fn site(total: f64) -> Self {
        Self {
            total: Some(total),
            ..Default::default()
        }
    }
    pub fn with_formation_energy(mut self, energy: f64) -> Self {
        self.formation_energy = Some(energy);
        self
    }
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }
}

/// Reference to a species by phase and index inside that phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpeciesRef {
    Gas(usize),
    Liquid(usize),
    Adsorbate(usize),
    TransitionState(usize),
    FreeSite(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Gas,
    Liquid,
    Adsorbate,
    TransitionState,
    Site,
}

/// One `n*species` term of a reaction state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoichTerm {
    pub coefficient: usize,
    pub name: String,
    pub species: SpeciesRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementaryReaction {
    pub index: usize,
    pub expression: String,
    pub initial: Vec<StoichTerm>,
    pub transition: Option<Vec<StoichTerm>>,
    pub final_state: Vec<StoichTerm>,
}

impl ElementaryReaction {
    pub fn has_transition_state(&self) -> bool {
        self.transition.is_some()
    }

    fn count_in(state: &[StoichTerm], species: SpeciesRef) -> usize {
        state
            .iter()
            .filter(|t| t.species == species)
            .map(|t| t.coefficient)
            .sum()
    }

    /// stoichiometric coefficients of `species` in the initial and final states
    pub fn stoichiometry(&self, species: SpeciesRef) -> (usize, usize) {
        (
            Self::count_in(&self.initial, species),
            Self::count_in(&self.final_state, species),
        )
    }

    pub fn transition_count(&self, species: SpeciesRef) -> usize {
        self.transition
            .as_ref()
            .map(|ts| Self::count_in(ts, species))
            .unwrap_or(0)
    }

    /// final minus initial coefficient
    pub fn net_stoichiometry(&self, species: SpeciesRef) -> f64 {
        let (n_is, n_fs) = self.stoichiometry(species);
        n_fs as f64 - n_is as f64
    }

    pub fn initial_gases(&self) -> Vec<&StoichTerm> {
        self.initial
            .iter()
            .filter(|t| matches!(t.species, SpeciesRef::Gas(_)))
            .collect()
    }

    pub fn final_gases(&self) -> Vec<&StoichTerm> {
        self.final_state
            .iter()
            .filter(|t| matches!(t.species, SpeciesRef::Gas(_)))
            .collect()
    }

    /// all distinct species appearing in any state
    pub fn species(&self) -> Vec<SpeciesRef> {
        let mut all: Vec<SpeciesRef> = Vec::new();
        let ts = self.transition.iter().flatten();
        for term in self.initial.iter().chain(ts).chain(self.final_state.iter()) {
            if !all.contains(&term.species) {
                all.push(term.species);
            }
        }
        all
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub phase: Phase,
    /// site index for adsorbates and transition states
    pub site: Option<usize>,
    pub formation_energy: Option<f64>,
    pub pressure: Option<f64>,
    pub concentration: Option<f64>,
    pub mass: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub total: f64,
    /// adsorbate indices bound to this site
    pub adsorbates: Vec<usize>,
    pub formation_energy: Option<f64>,
}

/// Parsed reaction network with phase data attached.
#[derive(Debug, Clone)]
pub struct ReactionNetwork {
    pub reactions: Vec<ElementaryReaction>,
    pub gases: Vec<Species>,
    pub liquids: Vec<Species>,
    pub adsorbates: Vec<Species>,
    pub transition_states: Vec<Species>,
    pub sites: Vec<Site>,
}

/// parsed but not yet indexed term
struct RawTerm {
    coefficient: usize,
    name: String,
    phase: Phase,
    site: Option<String>,
}

/// `2O_s` -> coefficient and species name
static TERM_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
static ARROW_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Compiles a pattern on first use and shares it afterwards.
fn cached<'a>(
    cell: &'a OnceLock<Result<Regex, regex::Error>>,
    pattern: &str,
    expression: &str,
) -> Result<&'a Regex, KineticsError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| KineticsError::parse(expression, e.to_string()))
}

fn classify(term: &str, expression: &str) -> Result<RawTerm, KineticsError> {
    let term_re = cached(&TERM_RE, r"^(\d*)\s*(\S+)$", expression)?;
    let caps = term_re
        .captures(term)
        .ok_or_else(|| KineticsError::parse(expression, format!("bad term '{}'", term)))?;
    let coefficient = match &caps[1] {
        "" => 1,
        digits => digits
            .parse::<usize>()
            .map_err(|e| KineticsError::parse(expression, e.to_string()))?,
    };
    if coefficient == 0 {
        return Err(KineticsError::parse(expression, "zero stoichiometric coefficient"));
    }
    let name = caps[2].to_string();
    let (body, suffix) = name.rsplit_once('_').ok_or_else(|| {
        KineticsError::parse(expression, format!("species '{}' has no phase suffix", name))
    })?;
    if body.is_empty() || suffix.is_empty() {
        return Err(KineticsError::parse(
            expression,
            format!("species '{}' has an empty name or suffix", name),
        ));
    }
    let raw = if body == "*" {
        RawTerm {
            coefficient,
            name: name.clone(),
            phase: Phase::Site,
            site: Some(suffix.to_string()),
        }
    } else if suffix == "g" {
        RawTerm {
            coefficient,
            name: name.clone(),
            phase: Phase::Gas,
            site: None,
        }
    } else if suffix == "l" {
        RawTerm {
            coefficient,
            name: name.clone(),
            phase: Phase::Liquid,
            site: None,
        }
    } else {
        // "2s" -> site "s"
        let site: String = suffix.trim_start_matches(|c: char| c.is_ascii_digit()).to_string();
        if site.is_empty() {
            return Err(KineticsError::parse(
                expression,
                format!("species '{}' has no site name", name),
            ));
        }
        let phase = if body.contains('-') {
            Phase::TransitionState
        } else {
            Phase::Adsorbate
        };
        RawTerm {
            coefficient,
            name: name.clone(),
            phase,
            site: Some(site),
        }
    };
    Ok(raw)
}

/// Splits an expression into its two or three states.
fn split_states(expression: &str) -> Result<Vec<Vec<RawTerm>>, KineticsError> {
    let arrow = cached(&ARROW_RE, r"<->|->", expression)?;
    let arrows: Vec<&str> = arrow.find_iter(expression).map(|m| m.as_str()).collect();
    let parts: Vec<&str> = arrow.split(expression).collect();
    let valid = match arrows.as_slice() {
        ["->"] => true,
        ["<->", "->"] => true,
        _ => false,
    };
    if !valid {
        return Err(KineticsError::parse(
            expression,
            "expected 'IS -> FS' or 'IS <-> TS -> FS'",
        ));
    }
    let mut states = Vec::new();
    for part in parts {
        let mut terms = Vec::new();
        for term in part.split('+') {
            let term = term.trim();
            if term.is_empty() {
                return Err(KineticsError::parse(expression, "empty term"));
            }
            terms.push(classify(term, expression)?);
        }
        states.push(terms);
    }
    if states.len() == 3 && states[1].iter().all(|t| t.phase != Phase::TransitionState) {
        return Err(KineticsError::parse(
            expression,
            "middle state must contain a transition state",
        ));
    }
    Ok(states)
}

impl ReactionNetwork {
    /// Parses the reaction expressions and attaches phase data.
    ///
    /// Gas pressures and liquid concentrations are required; a site without a total defaults
    /// to 1.0. Gas masses are taken from the definitions or computed from the formula.
    pub fn new(
        expressions: &[&str],
        definitions: &HashMap<String, SpeciesDefinition>,
    ) -> Result<Self, KineticsError> {
        if expressions.is_empty() {
            return Err(KineticsError::MissingDataError(
                "reaction network without elementary reactions".to_string(),
            ));
        }
        let mut network = ReactionNetwork {
            reactions: Vec::new(),
            gases: Vec::new(),
            liquids: Vec::new(),
            adsorbates: Vec::new(),
            transition_states: Vec::new(),
            sites: Vec::new(),
        };
        for (index, expression) in expressions.iter().enumerate() {
            let states = split_states(expression)?;
            let mut indexed: Vec<Vec<StoichTerm>> = Vec::new();
            for state in states {
                let mut terms = Vec::new();
                for raw in state {
                    let species = network.register(&raw, definitions)?;
                    terms.push(StoichTerm {
                        coefficient: raw.coefficient,
                        name: raw.name,
                        species,
                    });
                }
                indexed.push(terms);
            }
            let final_state = indexed.pop().unwrap_or_default();
            let transition = if indexed.len() == 2 { indexed.pop() } else { None };
            let initial = indexed.pop().unwrap_or_default();
            network.reactions.push(ElementaryReaction {
                index,
                expression: expression.to_string(),
                initial,
                transition,
                final_state,
            });
        }
        network.attach_phase_data(definitions)?;
        info!(
            "reaction network: {} reactions, {} adsorbates, {} gases, {} sites",
            network.reactions.len(),
            network.adsorbates.len(),
            network.gases.len(),
            network.sites.len()
        );
        Ok(network)
    }

    fn site_index(&mut self, site: &str) -> usize {
        if let Some(i) = self.sites.iter().position(|s| s.name == site) {
            return i;
        }
        self.sites.push(Site {
            name: site.to_string(),
            total: 1.0,
            adsorbates: Vec::new(),
            formation_energy: None,
        });
        self.sites.len() - 1
    }

    fn register(
        &mut self,
        raw: &RawTerm,
        definitions: &HashMap<String, SpeciesDefinition>,
    ) -> Result<SpeciesRef, KineticsError> {
        let site = raw.site.as_deref().map(|s| self.site_index(s));
        let new_species = |phase: Phase| {
            let def = definitions.get(&raw.name).cloned().unwrap_or_default();
            Species {
                name: raw.name.clone(),
                phase,
                site,
                formation_energy: def.formation_energy,
                pressure: def.pressure,
                concentration: def.concentration,
                mass: def.mass,
            }
        };
        let reference = match raw.phase {
            Phase::Site => SpeciesRef::FreeSite(site.unwrap_or(0)),
            Phase::Gas => match self.gases.iter().position(|s| s.name == raw.name) {
                Some(i) => SpeciesRef::Gas(i),
                None => {
                    self.gases.push(new_species(Phase::Gas));
                    SpeciesRef::Gas(self.gases.len() - 1)
                }
            },
            Phase::Liquid => match self.liquids.iter().position(|s| s.name == raw.name) {
                Some(i) => SpeciesRef::Liquid(i),
                None => {
                    self.liquids.push(new_species(Phase::Liquid));
                    SpeciesRef::Liquid(self.liquids.len() - 1)
                }
            },
            Phase::Adsorbate => match self.adsorbates.iter().position(|s| s.name == raw.name) {
                Some(i) => SpeciesRef::Adsorbate(i),
                None => {
                    self.adsorbates.push(new_species(Phase::Adsorbate));
                    let index = self.adsorbates.len() - 1;
                    if let Some(s) = site {
                        self.sites[s].adsorbates.push(index);
                    }
                    SpeciesRef::Adsorbate(index)
                }
            },
            Phase::TransitionState => {
                match self.transition_states.iter().position(|s| s.name == raw.name) {
                    Some(i) => SpeciesRef::TransitionState(i),
                    None => {
                        self.transition_states.push(new_species(Phase::TransitionState));
                        SpeciesRef::TransitionState(self.transition_states.len() - 1)
                    }
                }
            }
        };
        Ok(reference)
    }

    fn attach_phase_data(
        &mut self,
        definitions: &HashMap<String, SpeciesDefinition>,
    ) -> Result<(), KineticsError> {
        for gas in self.gases.iter_mut() {
            if gas.pressure.is_none() {
                return Err(KineticsError::MissingDataError(format!(
                    "no pressure given for gas {}",
                    gas.name
                )));
            }
            if gas.mass.is_none() {
                let formula = gas.name.trim_end_matches("_g");
                match calculate_molar_mass(formula) {
                    Ok((mass, _)) => gas.mass = Some(mass),
                    Err(e) => warn!("mass of {} not known: {}", gas.name, e),
                }
            }
        }
        for liquid in self.liquids.iter() {
            if liquid.concentration.is_none() {
                return Err(KineticsError::MissingDataError(format!(
                    "no concentration given for liquid {}",
                    liquid.name
                )));
            }
        }
        for site in self.sites.iter_mut() {
            match definitions.get(&site.name) {
                Some(def) => {
                    site.total = def.total.unwrap_or(1.0);
                    site.formation_energy = def.formation_energy;
                }
                None => warn!("no definition for site {}, total set to 1.0", site.name),
            }
            if !(site.total > 0.0) {
                return Err(KineticsError::ParameterError(format!(
                    "total of site {} must be positive",
                    site.name
                )));
            }
        }
        Ok(())
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    pub fn adsorbate_names(&self) -> Vec<String> {
        self.adsorbates.iter().map(|s| s.name.clone()).collect()
    }

    pub fn gas_names(&self) -> Vec<String> {
        self.gases.iter().map(|s| s.name.clone()).collect()
    }

    pub fn transition_state_names(&self) -> Vec<String> {
        self.transition_states.iter().map(|s| s.name.clone()).collect()
    }

    pub fn site_names(&self) -> Vec<String> {
        self.sites.iter().map(|s| s.name.clone()).collect()
    }

    pub fn name_of(&self, species: SpeciesRef) -> String {
        match species {
            SpeciesRef::Gas(i) => self.gases[i].name.clone(),
            SpeciesRef::Liquid(i) => self.liquids[i].name.clone(),
            SpeciesRef::Adsorbate(i) => self.adsorbates[i].name.clone(),
            SpeciesRef::TransitionState(i) => self.transition_states[i].name.clone(),
            SpeciesRef::FreeSite(i) => format!("*_{}", self.sites[i].name),
        }
    }

    pub fn find(&self, name: &str) -> Option<SpeciesRef> {
        let position = |list: &Vec<Species>| list.iter().position(|s| s.name == name);
        if let Some(i) = position(&self.gases) {
            return Some(SpeciesRef::Gas(i));
        }
        if let Some(i) = position(&self.liquids) {
            return Some(SpeciesRef::Liquid(i));
        }
        if let Some(i) = position(&self.adsorbates) {
            return Some(SpeciesRef::Adsorbate(i));
        }
        if let Some(i) = position(&self.transition_states) {
            return Some(SpeciesRef::TransitionState(i));
        }
        self.sites
            .iter()
            .position(|s| format!("*_{}", s.name) == name)
            .map(SpeciesRef::FreeSite)
    }

    pub fn gas_index(&self, name: &str) -> Result<usize, KineticsError> {
        self.gases
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| KineticsError::MissingDataError(format!("no gas named {}", name)))
    }

    pub fn adsorbate_site(&self, adsorbate: usize) -> usize {
        self.adsorbates[adsorbate].site.unwrap_or(0)
    }

    pub fn pressures(&self) -> Vec<f64> {
        self.gases.iter().map(|g| g.pressure.unwrap_or(0.0)).collect()
    }

    pub fn concentrations(&self) -> Vec<f64> {
        self.liquids
            .iter()
            .map(|l| l.concentration.unwrap_or(0.0))
            .collect()
    }

    pub fn site_totals(&self) -> Vec<f64> {
        self.sites.iter().map(|s| s.total).collect()
    }

    /// adsorbates followed by transition states: the intermediates of the network
    pub fn intermediates(&self) -> Vec<SpeciesRef> {
        (0..self.adsorbates.len())
            .map(SpeciesRef::Adsorbate)
            .chain((0..self.transition_states.len()).map(SpeciesRef::TransitionState))
            .collect()
    }

    /// Formation energy of a species; free sites use the site's energy, default 0.
    pub fn formation_energy(&self, species: SpeciesRef) -> Option<f64> {
        match species {
            SpeciesRef::Gas(i) => self.gases[i].formation_energy,
            SpeciesRef::Liquid(i) => self.liquids[i].formation_energy,
            SpeciesRef::Adsorbate(i) => self.adsorbates[i].formation_energy,
            SpeciesRef::TransitionState(i) => self.transition_states[i].formation_energy,
            SpeciesRef::FreeSite(i) => Some(self.sites[i].formation_energy.unwrap_or(0.0)),
        }
    }

    /// true when every species of every IS/FS (and TS, if present) has a formation energy
    pub fn has_formation_energies(&self) -> bool {
        self.reactions
            .iter()
            .all(|r| r.species().iter().all(|s| self.formation_energy(*s).is_some()))
    }

    /// Changes the pressure of a gas in place.
    pub fn set_pressure(&mut self, gas: &str, pressure: f64) -> Result<(), KineticsError> {
        let i = self.gas_index(gas)?;
        if pressure < 0.0 {
            return Err(KineticsError::ParameterError(format!(
                "negative pressure for {}",
                gas
            )));
        }
        self.gases[i].pressure = Some(pressure);
        Ok(())
    }

    /// Stoichiometry matrices (reactions x gases) of initial and final states.
    pub fn gas_stoichiometry_matrix(&self) -> Vec<Vec<f64>> {
        self.reactions
            .iter()
            .map(|r| {
                (0..self.gases.len())
                    .map(|g| r.net_stoichiometry(SpeciesRef::Gas(g)))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co_oxidation_definitions() -> HashMap<String, SpeciesDefinition> {
        HashMap::from([
            ("CO_g".to_string(), SpeciesDefinition::gas(1.0)),
            ("O2_g".to_string(), SpeciesDefinition::gas(1.0 / 3.0)),
            ("CO2_g".to_string(), SpeciesDefinition::gas(0.0)),
            ("s".to_string(), SpeciesDefinition::site(1.0)),
        ])
    }

    #[test]
    fn test_parse_co_oxidation() {
        let network = ReactionNetwork::new(
            &[
                "CO_g + *_s -> CO_s",
                "O2_g + 2*_s -> 2O_s",
                "CO_s + O_s <-> CO-O_2s -> CO2_g + 2*_s",
            ],
            &co_oxidation_definitions(),
        )
        .unwrap();
        assert_eq!(network.adsorbate_names(), vec!["CO_s", "O_s"]);
        assert_eq!(network.gas_names(), vec!["CO_g", "O2_g", "CO2_g"]);
        assert_eq!(network.transition_state_names(), vec!["CO-O_2s"]);
        assert_eq!(network.site_names(), vec!["s"]);
        assert_eq!(network.sites[0].adsorbates, vec![0, 1]);

        let r1 = &network.reactions[1];
        assert_eq!(r1.stoichiometry(SpeciesRef::FreeSite(0)), (2, 0));
        assert_eq!(r1.stoichiometry(SpeciesRef::Adsorbate(1)), (0, 2));
        assert!(!r1.has_transition_state());

        let r2 = &network.reactions[2];
        assert!(r2.has_transition_state());
        assert_eq!(r2.transition_count(SpeciesRef::TransitionState(0)), 1);
        assert_eq!(r2.net_stoichiometry(SpeciesRef::Gas(2)), 1.0);
        assert_eq!(network.transition_states[0].site, Some(0));

        let masses: Vec<f64> = network.gases.iter().map(|g| g.mass.unwrap()).collect();
        assert!((masses[0] - 28.01).abs() < 1e-2);
        assert!((masses[2] - 44.009).abs() < 1e-2);
        assert_eq!(network.find("*_s"), Some(SpeciesRef::FreeSite(0)));
        assert_eq!(network.find("O_s"), Some(SpeciesRef::Adsorbate(1)));
        assert_eq!(network.find("X_s"), None);
    }

    #[test]
    fn test_transition_state_with_free_site() {
        let network = ReactionNetwork::new(
            &["CO_s + O_s <-> CO-O_s + *_s -> CO2_g + 2*_s"],
            &co_oxidation_definitions(),
        )
        .unwrap();
        let r = &network.reactions[0];
        assert_eq!(r.transition_count(SpeciesRef::FreeSite(0)), 1);
        assert_eq!(network.name_of(SpeciesRef::TransitionState(0)), "CO-O_s");
    }

    #[test]
    fn test_missing_pressure_and_bad_syntax() {
        let defs = HashMap::from([("s".to_string(), SpeciesDefinition::site(1.0))]);
        let result = ReactionNetwork::new(&["CO_g + *_s -> CO_s"], &defs);
        assert!(matches!(result, Err(KineticsError::MissingDataError(_))));

        let defs = co_oxidation_definitions();
        for bad in [
            "CO_g + *_s = CO_s",
            "CO_g + *_s -> CO_s -> CO2_g",
            "CO_g + -> CO_s",
            "CO + *_s -> CO_s",
            "CO_s + O_s <-> CO_O_s -> CO2_g + 2*_s",
            "0CO_g + *_s -> CO_s",
        ] {
            let result = ReactionNetwork::new(&[bad], &defs);
            assert!(
                matches!(result, Err(KineticsError::ParseError { .. })),
                "{} should not parse",
                bad
            );
        }
        assert!(ReactionNetwork::new(&[], &defs).is_err());
    }

    #[test]
    fn test_patterns_are_compiled_once() {
        let defs = co_oxidation_definitions();
        ReactionNetwork::new(&["CO_g + *_s -> CO_s"], &defs).unwrap();
        let first = cached(&TERM_RE, r"^(\d*)\s*(\S+)$", "").unwrap() as *const Regex;
        ReactionNetwork::new(&["O2_g + 2*_s -> 2O_s"], &defs).unwrap();
        let second = cached(&TERM_RE, r"^(\d*)\s*(\S+)$", "").unwrap() as *const Regex;
        assert_eq!(first, second);
        let arrow = cached(&ARROW_RE, r"<->|->", "").unwrap();
        assert_eq!(arrow.find_iter("A_s <-> A-B_s -> B_g").count(), 2);
    }

    #[test]
    fn test_site_defaults_and_set_pressure() {
        let defs = HashMap::from([("A_g".to_string(), SpeciesDefinition::gas(2.0).with_mass(10.0))]);
        let mut network = ReactionNetwork::new(&["A_g + *_t -> A_t"], &defs).unwrap();
        assert_eq!(network.sites[0].total, 1.0);
        assert_eq!(network.gases[0].mass, Some(10.0));
        network.set_pressure("A_g", 0.5).unwrap();
        assert_eq!(network.pressures(), vec![0.5]);
        assert!(network.set_pressure("B_g", 0.5).is_err());
        assert!(network.set_pressure("A_g", -0.5).is_err());
        assert_eq!(network.gas_stoichiometry_matrix(), vec![vec![-1.0]]);
        assert!(!network.has_formation_energies());
    }
}
