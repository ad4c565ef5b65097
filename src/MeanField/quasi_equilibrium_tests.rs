#[cfg(test)]
mod tests {
    use crate::Kinetics::energetics::RelativeEnergySet;
    use crate::Kinetics::entropy_correction::NoCorrection;
    use crate::Kinetics::rate_constants::{RateConstantCalculator, RateConstantSet};
    use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesDefinition};
    use crate::MeanField::coverage_equations::CoverageEquations;
    use crate::MeanField::numeric_kernel::F64Kernel;
    use crate::MeanField::polynomial::Symbol;
    use crate::MeanField::quasi_equilibrium::QuasiEquilibriumReducer;
    use crate::MeanField::steady_state_solver::SteadyStateSolver;
    use crate::errors::KineticsError;
    use crate::settings::{RateAlgorithm, SolverSettings};
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn settings(temperature: f64) -> SolverSettings {
        SolverSettings {
            temperature,
            rate_algorithm: RateAlgorithm::TST,
            ..SolverSettings::default()
        }
    }

    fn build(
        expressions: &[&str],
        definitions: HashMap<String, SpeciesDefinition>,
        ga: Vec<f64>,
        dg: Vec<f64>,
        temperature: f64,
    ) -> (ReactionNetwork, CoverageEquations, RateConstantSet) {
        let network = ReactionNetwork::new(expressions, &definitions).unwrap();
        let energies = RelativeEnergySet::from_barriers(ga, dg).unwrap();
        let calculator = RateConstantCalculator::new(
            &network,
            &energies,
            &settings(temperature),
            Arc::new(NoCorrection),
        )
        .unwrap();
        let rates = calculator.compute(&energies).unwrap();
        let equations = CoverageEquations::build(&network, &calculator.collision_gases()).unwrap();
        (network, equations, rates)
    }

    fn co_oxidation() -> (ReactionNetwork, CoverageEquations, RateConstantSet) {
        build(
            &[
                "CO_g + *_s -> CO_s",
                "O2_g + 2*_s -> 2O_s",
                "CO_s + O_s <-> CO-O_s + *_s -> CO2_g + 2*_s",
            ],
            HashMap::from([
                ("CO_g".to_string(), SpeciesDefinition::gas(1.0)),
                ("O2_g".to_string(), SpeciesDefinition::gas(1.0 / 3.0)),
                ("CO2_g".to_string(), SpeciesDefinition::gas(0.0)),
                ("s".to_string(), SpeciesDefinition::site(1.0)),
            ]),
            vec![0.0, 0.0, 1.25],
            vec![-0.758, -2.64, 0.324],
            450.0,
        )
    }

    fn langmuir_hinshelwood() -> (ReactionNetwork, CoverageEquations, RateConstantSet) {
        build(
            &["A_g + *_s -> A_s", "A_s -> B_s", "B_s <-> B-C_s -> C_g + *_s"],
            HashMap::from([
                ("A_g".to_string(), SpeciesDefinition::gas(1.0).with_mass(30.0)),
                ("C_g".to_string(), SpeciesDefinition::gas(0.0).with_mass(30.0)),
                ("s".to_string(), SpeciesDefinition::site(1.0)),
            ]),
            vec![0.0, 0.3, 1.1],
            vec![-0.5, -0.1, -0.2],
            500.0,
        )
    }

    fn generic_definitions() -> HashMap<String, SpeciesDefinition> {
        HashMap::from([
            ("W_g".to_string(), SpeciesDefinition::gas(0.4).with_mass(20.0)),
            ("Z_g".to_string(), SpeciesDefinition::gas(0.7).with_mass(20.0)),
            ("s".to_string(), SpeciesDefinition::site(1.0)),
        ])
    }

    #[test]
    fn test_co_oxidation_closed_form() {
        let (network, equations, rates) = co_oxidation();
        let result = QuasiEquilibriumReducer::new(&network, &equations)
            .reduce(2)
            .unwrap();
        // θ(CO) = K0 p(CO) θ*, θ(O) = sqrt(K1 p(O2)) θ*
        let co = &result.coverages[0];
        assert_eq!(co.exponent_of(Symbol::EquilibriumConstant(0)), 1.0);
        assert_eq!(co.exponent_of(Symbol::Pressure(0)), 1.0);
        assert_eq!(co.exponent_of(Symbol::FreeSite(0)), 1.0);
        let o = &result.coverages[1];
        assert_eq!(o.exponent_of(Symbol::EquilibriumConstant(1)), 0.5);
        assert_eq!(o.exponent_of(Symbol::Pressure(1)), 0.5);
        assert_eq!(o.exponent_of(Symbol::FreeSite(0)), 1.0);

        // kf2 K0 p(CO) sqrt(K1 p(O2)) θ*^2 - kr2 p(CO2) θ*^2
        assert_eq!(result.rate.terms.len(), 2);
        for term in result.rate.terms.iter() {
            assert!(!term.factors.iter().any(|(s, _)| matches!(s, Symbol::Coverage(_))));
            assert_eq!(term.exponent_of(Symbol::FreeSite(0)), 2.0);
        }
        let forward = result
            .rate
            .terms
            .iter()
            .find(|t| t.contains(Symbol::Kf(2)))
            .unwrap();
        assert_eq!(forward.exponent_of(Symbol::EquilibriumConstant(0)), 1.0);
        assert_eq!(forward.exponent_of(Symbol::EquilibriumConstant(1)), 0.5);

        // symbolic form carries only constants and pressures
        let expr = result.to_expr(&network);
        let mut variables = expr.all_arguments_are_variables();
        variables.sort();
        variables.dedup();
        assert!(!variables.is_empty());
        for v in variables.iter() {
            assert!(
                v.starts_with("kf_") || v.starts_with("kr_") || v.starts_with("K_") || v.starts_with("p_"),
                "unexpected variable {}",
                v
            );
        }
        let values = equations
            .base_values::<f64>(&rates, &network.pressures(), &[])
            .unwrap();
        let lookup = |name: &str| -> f64 {
            let pressures = network.pressures();
            match name {
                "kf_2" => rates.kf[2],
                "kr_2" => rates.kr[2],
                "K_0" => rates.kf[0] / rates.kr[0],
                "K_1" => rates.kf[1] / rates.kr[1],
                "p_CO_g" => pressures[0],
                "p_O2_g" => pressures[1],
                "p_CO2_g" => pressures[2],
                other => panic!("unknown variable {}", other),
            }
        };
        let names: Vec<&str> = variables.iter().map(|s| s.as_str()).collect();
        let arguments: Vec<f64> = names.iter().map(|n| lookup(n)).collect();
        let symbolic = expr.lambdify_owned(names)(arguments);
        assert_relative_eq!(symbolic, result.tof(&values), max_relative = 1e-9);
        assert!(result.display_with(&network).contains("θ(*_s)"));
    }

    #[test]
    fn test_agrees_with_steady_state_when_rds_is_slow() {
        let (network, equations, rates) = langmuir_hinshelwood();
        let values = equations
            .base_values::<f64>(&rates, &network.pressures(), &[])
            .unwrap();
        let qe = QuasiEquilibriumReducer::new(&network, &equations)
            .reduce(2)
            .unwrap();
        let qe_tof = qe.tof(&values);
        assert_relative_eq!(qe_tof, 77.55473494887617, max_relative = 1e-8);

        let steady = SteadyStateSolver::new(
            F64Kernel,
            &equations,
            &rates,
            &network.pressures(),
            &[],
            &settings(500.0),
        )
        .unwrap()
        .solve(&[0.3, 0.3])
        .unwrap();
        let at_steady = equations.at_coverages(&values, &steady.coverages).unwrap();
        let c = network.gas_index("C_g").unwrap();
        let tof = equations.tof(&at_steady, c).unwrap();
        assert_relative_eq!(qe_tof, tof, max_relative = 1e-5);
        let qe_coverages = qe.coverages_at(&values);
        assert_relative_eq!(qe_coverages[0], steady.coverages[0], max_relative = 1e-5);
        assert_relative_eq!(qe_coverages[1], steady.coverages[1], max_relative = 1e-5);
    }

    #[test]
    fn test_cyclic_reactions_are_contracted() {
        let network = ReactionNetwork::new(
            &["X_s + Y_s -> Z_g + 2*_s", "X_s -> Y_s", "W_g + *_s -> X_s"],
            &generic_definitions(),
        )
        .unwrap();
        let equations = CoverageEquations::build(&network, &[(None, None); 3]).unwrap();
        let result = QuasiEquilibriumReducer::new(&network, &equations)
            .reduce(2)
            .unwrap();
        let z = Symbol::Pressure(network.gas_index("Z_g").unwrap());
        // X = sqrt(p(Z) / (K0 K1)) θ*
        let x = &result.coverages[0];
        assert_relative_eq!(x.exponent_of(Symbol::EquilibriumConstant(0)), -0.5);
        assert_relative_eq!(x.exponent_of(Symbol::EquilibriumConstant(1)), -0.5);
        assert_relative_eq!(x.exponent_of(z), 0.5);
        assert_relative_eq!(x.exponent_of(Symbol::FreeSite(0)), 1.0);
        // Y = sqrt(p(Z) K1 / K0) θ*
        let y = &result.coverages[1];
        assert_relative_eq!(y.exponent_of(Symbol::EquilibriumConstant(0)), -0.5);
        assert_relative_eq!(y.exponent_of(Symbol::EquilibriumConstant(1)), 0.5);
        assert_relative_eq!(y.exponent_of(z), 0.5);
        assert_relative_eq!(y.exponent_of(Symbol::FreeSite(0)), 1.0);
        assert_eq!(result.site_balances[0].terms.len(), 3);
        assert_eq!(result.balance_degree(0), Some(1));

        // numerically the equilibrium conditions hold
        let rates = RateConstantSet::new(vec![2.0, 3.0, 1.0], vec![5.0, 0.5, 1.0]).unwrap();
        let values = equations
            .base_values::<f64>(&rates, &network.pressures(), &[])
            .unwrap();
        let theta = result.coverages_at(&values);
        let v = equations.at_coverages(&values, &theta).unwrap();
        let net = equations.net_rates(&v);
        assert!(net[0].abs() < 1e-12);
        assert!(net[1].abs() < 1e-12);
        assert_relative_eq!(
            theta.iter().sum::<f64>() + v.free_sites[0],
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_unresolvable_network() {
        let network = ReactionNetwork::new(
            &["X_s + Y_s -> Z_g + 2*_s", "W_g + *_s -> X_s"],
            &generic_definitions(),
        )
        .unwrap();
        let equations = CoverageEquations::build(&network, &[(None, None); 2]).unwrap();
        let result = QuasiEquilibriumReducer::new(&network, &equations).reduce(1);
        assert!(matches!(
            result,
            Err(KineticsError::AlgebraicReductionError(_))
        ));
    }

    /// `n` adsorbed A combine into one B, so that θ(B) ~ θ*^n
    fn association(n: usize) -> (ReactionNetwork, CoverageEquations, RateConstantSet) {
        let association = format!("{}A_s -> B_s", n);
        let network = ReactionNetwork::new(
            &["W_g + *_s -> A_s", association.as_str(), "B_s -> Z_g + *_s"],
            &generic_definitions(),
        )
        .unwrap();
        let equations = CoverageEquations::build(&network, &[(None, None); 3]).unwrap();
        // K0 p(W) = 1, K1 = 4, slow desorption of B
        let rates = RateConstantSet::new(vec![50.0, 40.0, 1e-4], vec![20.0, 10.0, 2e-5]).unwrap();
        (network, equations, rates)
    }

    fn steady_state_of(
        network: &ReactionNetwork,
        equations: &CoverageEquations,
        rates: &RateConstantSet,
    ) -> (Vec<f64>, f64) {
        let steady = SteadyStateSolver::new(
            F64Kernel,
            equations,
            rates,
            &network.pressures(),
            &[],
            &settings(500.0),
        )
        .unwrap()
        .solve(&[0.3, 0.3])
        .unwrap();
        let free = equations.free_sites(&steady.coverages)[0];
        (steady.coverages, free)
    }

    #[test]
    fn test_quadratic_site_balance() {
        let (network, equations, rates) = association(2);
        let result = QuasiEquilibriumReducer::new(&network, &equations)
            .reduce(2)
            .unwrap();
        assert_eq!(result.coverages[1].exponent_of(Symbol::FreeSite(0)), 2.0);
        assert_eq!(result.balance_degree(0), Some(2));
        let values = equations
            .base_values::<f64>(&rates, &network.pressures(), &[])
            .unwrap();
        // θ* + θ* + 4 θ*^2 = 1
        let free = result.free_sites(&values)[0];
        assert_relative_eq!(free, (5f64.sqrt() - 1.0) / 4.0, epsilon = 1e-15);
        let coverages = result.coverages_at(&values);
        assert_relative_eq!(free + coverages[0] + coverages[1], 1.0, epsilon = 1e-14);

        let (steady, steady_free) = steady_state_of(&network, &equations, &rates);
        assert_relative_eq!(free, steady_free, max_relative = 1e-4);
        assert_relative_eq!(coverages[0], steady[0], max_relative = 1e-4);
        assert_relative_eq!(coverages[1], steady[1], max_relative = 1e-4);
        let at_steady = equations.at_coverages(&values, &steady).unwrap();
        let z = network.gas_index("Z_g").unwrap();
        let tof = equations.tof(&at_steady, z).unwrap();
        assert_relative_eq!(result.tof(&values), tof, max_relative = 1e-4);

        // the closed form of θ* carries over to the symbolic rate
        let expr = result.to_expr(&network);
        let mut variables = expr.all_arguments_are_variables();
        variables.sort();
        variables.dedup();
        assert!(!variables.iter().any(|v| v.starts_with("theta")));
        let pressures = network.pressures();
        let arguments: Vec<f64> = variables
            .iter()
            .map(|v| match v.as_str() {
                "kf_2" => rates.kf[2],
                "kr_2" => rates.kr[2],
                "K_0" => rates.kf[0] / rates.kr[0],
                "K_1" => rates.kf[1] / rates.kr[1],
                "p_W_g" => pressures[network.gas_index("W_g").unwrap()],
                "p_Z_g" => pressures[network.gas_index("Z_g").unwrap()],
                other => panic!("unknown variable {}", other),
            })
            .collect();
        let names: Vec<&str> = variables.iter().map(|s| s.as_str()).collect();
        let symbolic = expr.lambdify_owned(names)(arguments);
        assert_relative_eq!(symbolic, result.tof(&values), max_relative = 1e-9);
    }

    #[test]
    fn test_cubic_site_balance_is_solved_numerically() {
        let (network, equations, rates) = association(3);
        let result = QuasiEquilibriumReducer::new(&network, &equations)
            .reduce(2)
            .unwrap();
        assert_eq!(result.balance_degree(0), None);
        let values = equations
            .base_values::<f64>(&rates, &network.pressures(), &[])
            .unwrap();
        let free = result.free_sites(&values)[0];
        // θ* + θ* + 4 θ*^3 = 1
        assert_relative_eq!(2.0 * free + 4.0 * free.powi(3), 1.0, epsilon = 1e-14);
        assert_relative_eq!(free, 0.38545849852962405, epsilon = 1e-12);
        let (steady, steady_free) = steady_state_of(&network, &equations, &rates);
        assert_relative_eq!(free, steady_free, max_relative = 1e-4);
        let coverages = result.coverages_at(&values);
        assert_relative_eq!(coverages[1], steady[1], max_relative = 1e-4);
        // no closed form: the free-site fraction stays a variable of the expression
        let variables = result.to_expr(&network).all_arguments_are_variables();
        assert!(variables.iter().any(|v| v == "theta_free_s"));
        let balance = result.site_balance_expr(&network, 0).all_arguments_are_variables();
        assert!(balance.iter().any(|v| v == "theta_free_s"));
    }

    #[test]
    fn test_coverage_on_foreign_free_sites_is_rejected() {
        let mut definitions = generic_definitions();
        definitions.insert("t".to_string(), SpeciesDefinition::site(1.0));
        let network = ReactionNetwork::new(
            &["W_g + *_s -> A_s", "A_s + *_t -> B_t", "B_t -> Z_g + *_t"],
            &definitions,
        )
        .unwrap();
        let equations = CoverageEquations::build(&network, &[(None, None); 3]).unwrap();
        match QuasiEquilibriumReducer::new(&network, &equations).reduce(2) {
            Err(KineticsError::AlgebraicReductionError(message)) => {
                assert!(message.contains("B_t"))
            }
            other => panic!("expected a reduction error, got {:?}", other),
        }
    }

    #[test]
    fn test_rds_out_of_range() {
        let (network, equations, _) = co_oxidation();
        assert!(matches!(
            QuasiEquilibriumReducer::new(&network, &equations).reduce(3),
            Err(KineticsError::ConfigurationError(_))
        ));
    }
}
