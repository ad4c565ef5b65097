use crate::Kinetics::energetics::RelativeEnergySet;
use crate::Kinetics::entropy_correction::TranslationalEntropy;
use crate::Kinetics::kmc_bridge::{DryRunBackend, SiteMap, build_processes, processes_table};
use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesDefinition};
use crate::MeanField::microkinetic_model::MicroKineticModel;
use crate::errors::KineticsError;
use crate::settings::{RateAlgorithm, SettingsManager, SolverSettings};
use std::collections::HashMap;
use std::sync::Arc;

const CO_OXIDATION: [&str; 3] = [
    "CO_g + *_s -> CO_s",
    "O2_g + 2*_s -> 2O_s",
    "CO_s + O_s <-> CO-O_s + *_s -> CO2_g + 2*_s",
];

/// CO oxidation on one site type; formation energies in eV
fn co_oxidation_network() -> Result<ReactionNetwork, KineticsError> {
    let definitions = HashMap::from([
        ("CO_g".to_string(), SpeciesDefinition::gas(1.0).with_formation_energy(0.0)),
        ("O2_g".to_string(), SpeciesDefinition::gas(1.0 / 3.0).with_formation_energy(0.0)),
        ("CO2_g".to_string(), SpeciesDefinition::gas(0.0).with_formation_energy(-2.074)),
        ("s".to_string(), SpeciesDefinition::site(1.0)),
        ("CO_s".to_string(), SpeciesDefinition::default().with_formation_energy(-0.758)),
        ("O_s".to_string(), SpeciesDefinition::default().with_formation_energy(-1.32)),
        ("CO-O_s".to_string(), SpeciesDefinition::default().with_formation_energy(-0.828)),
    ]);
    ReactionNetwork::new(&CO_OXIDATION, &definitions)
}

fn tst_settings() -> SolverSettings {
    SolverSettings {
        temperature: 450.0,
        rate_algorithm: RateAlgorithm::TST,
        rds: Some(2),
        ..SolverSettings::default()
    }
}

pub fn co_oxidation_examples(task: usize) -> Result<(), KineticsError> {
    match task {
        0 => {
            // STEADY STATE WITH TRANSITION-STATE THEORY
            let energies =
                RelativeEnergySet::from_barriers(vec![0.0, 0.0, 1.25], vec![-0.758, -2.64, 0.324])?;
            let mut model = MicroKineticModel::new(co_oxidation_network()?, energies, tst_settings())?;
            let steady = model.steady_state(Some(&[0.9, 0.1]))?;
            println!(
                "converged: {} after {} iterations, residual norm {:e}",
                steady.converged, steady.iterations, steady.residual_norm
            );
            model.print_report()?;
            println!("reversibilities: {:?}", model.reversibilities()?);
        }
        1 => {
            // COLLISION THEORY, ENERGIES FROM FORMATION ENERGIES, DEFAULT SEED
            let settings = SolverSettings {
                rate_algorithm: RateAlgorithm::CT,
                ..tst_settings()
            };
            let mut model = MicroKineticModel::from_formation_energies(co_oxidation_network()?, settings)?
                .with_corrector(Arc::new(TranslationalEntropy));
            println!("Boltzmann coverages: {:?}", model.boltzmann_coverages(true)?);
            model.steady_state(None)?;
            model.print_report()?;
        }
        2 => {
            // QUASI-EQUILIBRIUM WITH STEP 2 RATE DETERMINING
            let energies =
                RelativeEnergySet::from_barriers(vec![0.0, 0.0, 1.25], vec![-0.758, -2.64, 0.324])?;
            let mut model = MicroKineticModel::new(co_oxidation_network()?, energies, tst_settings())?;
            let qe = model.quasi_equilibrium()?;
            println!("{}", qe.display_with(model.network()));
            println!("symbolic rate: {}", qe.to_expr(model.network()));
            let (rate, coverages) = model.quasi_equilibrium_rate()?;
            println!("rate = {:e} 1/s, coverages = {:?}", rate, coverages);
        }
        3 => {
            // DEGREES OF RATE CONTROL
            let energies =
                RelativeEnergySet::from_barriers(vec![0.0, 0.0, 1.25], vec![-0.758, -2.64, 0.324])?;
            let settings = SolverSettings {
                parallel_sensitivity: true,
                ..tst_settings()
            };
            let mut model = MicroKineticModel::new(co_oxidation_network()?, energies, settings)?;
            model.steady_state(Some(&[0.9, 0.1]))?;
            let xrc = model.xrc("CO2_g")?;
            let labels: Vec<String> = model
                .network()
                .reactions
                .iter()
                .map(|r| r.expression.clone())
                .collect();
            MicroKineticModel::sensitivity_table("XRC(CO2_g)", &labels, &xrc).printstd();
            let xtrc = model.xtrc("CO2_g")?;
            let labels: Vec<String> = model
                .network()
                .intermediates()
                .into_iter()
                .map(|s| model.network().name_of(s))
                .collect();
            MicroKineticModel::sensitivity_table("XTRC(CO2_g)", &labels, &xtrc).printstd();
        }
        4 => {
            // SETTINGS FILE AND KINETIC MONTE CARLO HAND-OFF
            let mut manager = SettingsManager::with_config_file("kisurf_settings.json")?;
            manager.update_parameters(HashMap::from([("temperature", 450.0), ("rds", 2.0)]))?;
            let energies =
                RelativeEnergySet::from_barriers(vec![0.0, 0.0, 1.25], vec![-0.758, -2.64, 0.324])?;
            let mut model =
                MicroKineticModel::new(co_oxidation_network()?, energies, manager.settings().clone())?;
            let rates = model.rate_constants()?;
            let processes = build_processes(model.network(), &rates)?;
            processes_table(&processes).printstd();
            let site_map = SiteMap::uniform(model.network(), "s", 400)?;
            let mut backend = DryRunBackend::default();
            model.run_stochastic(&mut backend, &site_map)?;
        }
        _ => {
            println!("no example with number {}", task);
        }
    }
    Ok(())
}
