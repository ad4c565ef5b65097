/// Module to calculate the atomic composition and molar mass of a chemical formula.
/// Used to get the molecular mass of gases entering collision-theory rate constants.
///
///  # Examples
/// ```
/// use KiSurf::Kinetics::molmass::calculate_molar_mass;
/// let (molar_mass, element_composition) = calculate_molar_mass("CO2").unwrap();
/// println!("Element counts: {:?}", element_composition);
/// println!("Molar mass: {:?} g/mol", molar_mass);
/// ```
pub mod molmass;
/// Reaction network of a catalytic surface: parsing of elementary reaction expressions such as
/// `CO_s + O_s <-> CO-O_2s -> CO2_g + 2*_s`, species (gases, liquids, adsorbates, transition
/// states), site types and their metadata.
///
/// # Examples
/// ```
/// use KiSurf::Kinetics::reaction_network::{ReactionNetwork, SpeciesDefinition};
/// use std::collections::HashMap;
/// let defs = HashMap::from([
///     ("CO_g".to_string(), SpeciesDefinition::gas(1.0)),
///     ("s".to_string(), SpeciesDefinition::site(1.0)),
/// ]);
/// let network = ReactionNetwork::new(&["CO_g + *_s -> CO_s"], &defs).unwrap();
/// assert_eq!(network.adsorbate_names(), vec!["CO_s"]);
/// ```
pub mod reaction_network;
/// Relative energies (forward/reverse barriers and reaction free energies), given directly or
/// derived from formation energies, and the perturbations used by sensitivity analysis.
pub mod energetics;
/// Free-energy corrections of gas-phase species for thermally equilibrated adsorption and
/// desorption steps.
pub mod entropy_correction;
/// Rate constants of elementary steps: transition-state theory, collision theory and the
/// detailed-balance branches, selected once per reaction.
pub mod rate_constants;
/// Boundary to an external kinetic Monte Carlo engine.
pub mod kmc_bridge;
