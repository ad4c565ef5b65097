//! # Stochastic Simulation Boundary
//!
//! ## Purpose
//! Hands a reaction network over to an external kinetic Monte Carlo engine. The mean-field
//! core only prepares the input: a list of elementary processes with their rate constants,
//! an initial lattice configuration and the site type of every lattice position. The engine
//! is injected through [`StochasticBackend`]; its output is not consumed here.
//!
//! ## Processes
//! Every reaction yields a forward and a reverse process. The local configuration of a
//! process lists surface species one per lattice site (free sites as `*_<site>`), gases are
//! kept apart as exchanged with the reservoir. Processes with a zero rate constant are
//! dropped since they can never fire.
use crate::Kinetics::rate_constants::RateConstantSet;
use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesRef, StoichTerm};
use crate::errors::KineticsError;
use log::info;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

/// One elementary event of the lattice simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmcProcess {
    pub reaction: usize,
    pub direction: Direction,
    pub rate_constant: f64,
    /// surface species before the event, one entry per site
    pub initial: Vec<String>,
    /// surface species after the event, one entry per site
    pub final_state: Vec<String>,
    pub gases_consumed: Vec<String>,
    pub gases_produced: Vec<String>,
}

impl KmcProcess {
    pub fn label(&self) -> String {
        let arrow = match self.direction {
            Direction::Forward => "->",
            Direction::Reverse => "<-",
        };
        format!(
            "{} {} {}",
            self.initial.join(" + "),
            arrow,
            self.final_state.join(" + ")
        )
    }
}

/// Occupant of every lattice position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfiguration {
    pub occupants: Vec<String>,
}

/// Site type (network site name) of every lattice position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMap {
    pub site_types: Vec<String>,
}

impl SiteMap {
    /// A lattice of `n` positions of one site type.
    pub fn uniform(network: &ReactionNetwork, site: &str, n: usize) -> Result<Self, KineticsError> {
        if !network.sites.iter().any(|s| s.name == site) {
            return Err(KineticsError::MissingDataError(format!(
                "no site type named {}",
                site
            )));
        }
        Ok(Self {
            site_types: vec![site.to_string(); n],
        })
    }
}

impl LatticeConfiguration {
    /// Fills the lattice in order so that the fraction of every adsorbate matches its coverage.
    /// Remaining positions are free sites.
    pub fn from_coverages(
        network: &ReactionNetwork,
        coverages: &[f64],
        site_map: &SiteMap,
    ) -> Result<Self, KineticsError> {
        if coverages.len() != network.adsorbates.len() {
            return Err(KineticsError::dimension(
                network.adsorbates.len(),
                coverages.len(),
                "coverages",
            ));
        }
        let mut occupants = Vec::with_capacity(site_map.site_types.len());
        for (s, site) in network.sites.iter().enumerate() {
            let positions: Vec<usize> = site_map
                .site_types
                .iter()
                .enumerate()
                .filter(|(_, t)| **t == site.name)
                .map(|(p, _)| p)
                .collect();
            let n = positions.len() as f64;
            let mut placed: Vec<String> = Vec::with_capacity(positions.len());
            for (a, adsorbate) in network.adsorbates.iter().enumerate() {
                if network.adsorbate_site(a) != s {
                    continue;
                }
                let count = (coverages[a] / site.total * n).round().max(0.0) as usize;
                for _ in 0..count {
                    if placed.len() < positions.len() {
                        placed.push(adsorbate.name.clone());
                    }
                }
            }
            while placed.len() < positions.len() {
                placed.push(format!("*_{}", site.name));
            }
            occupants.push((positions, placed));
        }
        let mut lattice = vec![String::new(); site_map.site_types.len()];
        for (positions, placed) in occupants {
            for (p, name) in positions.into_iter().zip(placed) {
                lattice[p] = name;
            }
        }
        let configuration = Self { occupants: lattice };
        configuration.validate(network, site_map)?;
        Ok(configuration)
    }

    /// Every position must hold a species of the matching site type.
    pub fn validate(&self, network: &ReactionNetwork, site_map: &SiteMap) -> Result<(), KineticsError> {
        if self.occupants.len() != site_map.site_types.len() {
            return Err(KineticsError::dimension(
                site_map.site_types.len(),
                self.occupants.len(),
                "lattice configuration",
            ));
        }
        for (occupant, site_type) in self.occupants.iter().zip(site_map.site_types.iter()) {
            let site = match network.find(occupant) {
                Some(SpeciesRef::Adsorbate(a)) => network.adsorbate_site(a),
                Some(SpeciesRef::FreeSite(s)) => s,
                _ => {
                    return Err(KineticsError::ConfigurationError(format!(
                        "{} cannot occupy a lattice site",
                        occupant
                    )));
                }
            };
            if network.sites[site].name != *site_type {
                return Err(KineticsError::ConfigurationError(format!(
                    "{} placed on a site of type {}",
                    occupant, site_type
                )));
            }
        }
        Ok(())
    }
}

fn surface_species(network: &ReactionNetwork, terms: &[StoichTerm]) -> Vec<String> {
    let mut species = Vec::new();
    for term in terms {
        if matches!(
            term.species,
            SpeciesRef::Adsorbate(_) | SpeciesRef::FreeSite(_)
        ) {
            for _ in 0..term.coefficient {
                species.push(network.name_of(term.species));
            }
        }
    }
    species
}

fn gas_species(terms: &[StoichTerm]) -> Vec<String> {
    let mut species = Vec::new();
    for term in terms {
        if matches!(term.species, SpeciesRef::Gas(_) | SpeciesRef::Liquid(_)) {
            for _ in 0..term.coefficient {
                species.push(term.name.clone());
            }
        }
    }
    species
}

/// Forward and reverse processes of every reaction with a non-zero rate constant.
pub fn build_processes(
    network: &ReactionNetwork,
    rates: &RateConstantSet,
) -> Result<Vec<KmcProcess>, KineticsError> {
    if rates.len() != network.reaction_count() {
        return Err(KineticsError::dimension(
            network.reaction_count(),
            rates.len(),
            "rate constants",
        ));
    }
    let mut processes = Vec::with_capacity(2 * rates.len());
    for (i, reaction) in network.reactions.iter().enumerate() {
        let is_surface = surface_species(network, &reaction.initial);
        let fs_surface = surface_species(network, &reaction.final_state);
        if is_surface.len() != fs_surface.len() {
            return Err(KineticsError::ConfigurationError(format!(
                "reaction '{}' does not conserve lattice sites ({} -> {})",
                reaction.expression,
                is_surface.len(),
                fs_surface.len()
            )));
        }
        let is_gas = gas_species(&reaction.initial);
        let fs_gas = gas_species(&reaction.final_state);
        if rates.kf[i] > 0.0 {
            processes.push(KmcProcess {
                reaction: i,
                direction: Direction::Forward,
                rate_constant: rates.kf[i],
                initial: is_surface.clone(),
                final_state: fs_surface.clone(),
                gases_consumed: is_gas.clone(),
                gases_produced: fs_gas.clone(),
            });
        }
        if rates.kr[i] > 0.0 {
            processes.push(KmcProcess {
                reaction: i,
                direction: Direction::Reverse,
                rate_constant: rates.kr[i],
                initial: fs_surface,
                final_state: is_surface,
                gases_consumed: fs_gas,
                gases_produced: is_gas,
            });
        }
    }
    info!("{} kMC processes built from {} reactions", processes.len(), rates.len());
    Ok(processes)
}

pub fn processes_table(processes: &[KmcProcess]) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("reaction"),
        Cell::new("process"),
        Cell::new("k"),
    ]));
    for p in processes {
        table.add_row(Row::new(vec![
            Cell::new(&p.reaction.to_string()),
            Cell::new(&p.label()),
            Cell::new(&format!("{:.6e}", p.rate_constant)),
        ]));
    }
    table
}

/// External lattice kinetic Monte Carlo engine.
pub trait StochasticBackend {
    /// One-shot run; whatever the engine produces stays on its side of the boundary.
    fn run(
        &mut self,
        processes: &[KmcProcess],
        configuration: &LatticeConfiguration,
        site_map: &SiteMap,
    ) -> Result<(), KineticsError>;

    fn name(&self) -> &str;
}

/// Backend that only reports what would be simulated.
#[derive(Debug, Default)]
pub struct DryRunBackend {
    pub runs: usize,
}

impl StochasticBackend for DryRunBackend {
    fn run(
        &mut self,
        processes: &[KmcProcess],
        configuration: &LatticeConfiguration,
        site_map: &SiteMap,
    ) -> Result<(), KineticsError> {
        if configuration.occupants.len() != site_map.site_types.len() {
            return Err(KineticsError::dimension(
                site_map.site_types.len(),
                configuration.occupants.len(),
                "lattice configuration",
            ));
        }
        self.runs += 1;
        info!(
            "dry run: {} processes on a lattice of {} sites",
            processes.len(),
            site_map.site_types.len()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
