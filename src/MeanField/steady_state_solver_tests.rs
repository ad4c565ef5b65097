#[cfg(test)]
mod tests {
    use crate::Kinetics::energetics::RelativeEnergySet;
    use crate::Kinetics::entropy_correction::NoCorrection;
    use crate::Kinetics::rate_constants::{RateConstantCalculator, RateConstantSet};
    use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesDefinition};
    use crate::MeanField::coverage_equations::CoverageEquations;
    use crate::MeanField::numeric_kernel::{DoubleDoubleKernel, F64Kernel};
    use crate::MeanField::steady_state_solver::{ConvergenceReason, SteadyStateSolver};
    use crate::errors::KineticsError;
    use crate::settings::{RateAlgorithm, SolverSettings};
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    const REFERENCE: [f64; 2] = [0.9993009023315728, 0.0006990944289937246];

    fn settings(temperature: f64) -> SolverSettings {
        SolverSettings {
            temperature,
            rate_algorithm: RateAlgorithm::TST,
            ..SolverSettings::default()
        }
    }

    fn co_oxidation() -> (ReactionNetwork, RateConstantSet, CoverageEquations) {
        let defs = HashMap::from([
            ("CO_g".to_string(), SpeciesDefinition::gas(1.0)),
            ("O2_g".to_string(), SpeciesDefinition::gas(1.0 / 3.0)),
            ("CO2_g".to_string(), SpeciesDefinition::gas(0.0)),
            ("s".to_string(), SpeciesDefinition::site(1.0)),
        ]);
        let network = ReactionNetwork::new(
            &[
                "CO_g + *_s -> CO_s",
                "O2_g + 2*_s -> 2O_s",
                "CO_s + O_s <-> CO-O_s + *_s -> CO2_g + 2*_s",
            ],
            &defs,
        )
        .unwrap();
        let energies =
            RelativeEnergySet::from_barriers(vec![0.0, 0.0, 1.25], vec![-0.758, -2.64, 0.324])
                .unwrap();
        let calculator =
            RateConstantCalculator::new(&network, &energies, &settings(450.0), Arc::new(NoCorrection))
                .unwrap();
        let rates = calculator.compute(&energies).unwrap();
        let equations = CoverageEquations::build(&network, &calculator.collision_gases()).unwrap();
        (network, rates, equations)
    }

    #[test]
    fn test_co_oxidation_reference_fixed_point() {
        let (network, rates, equations) = co_oxidation();
        let solver = SteadyStateSolver::new(
            F64Kernel,
            &equations,
            &rates,
            &network.pressures(),
            &[],
            &settings(450.0),
        )
        .unwrap();
        for seed in [[0.9, 0.1], [0.99, 0.0], [0.5, 0.5], [0.0, 0.0], [0.3, 0.3]] {
            let result = solver.solve(&seed).unwrap();
            assert!(result.converged);
            assert_relative_eq!(result.coverages[0], REFERENCE[0], epsilon = 1e-6);
            assert_relative_eq!(result.coverages[1], REFERENCE[1], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_residual_history_is_monotone() {
        let (network, rates, equations) = co_oxidation();
        let solver = SteadyStateSolver::new(
            F64Kernel,
            &equations,
            &rates,
            &network.pressures(),
            &[],
            &settings(450.0),
        )
        .unwrap();
        for seed in [[0.9, 0.1], [0.0, 0.0], [0.2, 0.3]] {
            let result = solver.solve(&seed).unwrap();
            assert!(result.history.len() >= 2);
            for pair in result.history.windows(2) {
                assert!(
                    pair[1] <= pair[0],
                    "residual rose from {} to {}",
                    pair[0],
                    pair[1]
                );
            }
            assert_eq!(result.damping_retries, 0);
        }
    }

    fn mild_rates() -> RateConstantSet {
        RateConstantSet::new(vec![2.0, 1.0, 3.0], vec![1.0, 0.5, 0.1]).unwrap()
    }

    /// the full Newton step from an oxygen-covered surface overshoots and the line search
    /// has to shorten it
    fn retrying_settings() -> SolverSettings {
        let mut s = settings(450.0);
        s.coarse_iterations = 0;
        s.divergence_window = 1;
        s.damping = 1.0;
        s.tolerance = 1e-12;
        s
    }

    #[test]
    fn test_damping_retry_recovers() {
        let (network, _, equations) = co_oxidation();
        let rates = mild_rates();
        let result = SteadyStateSolver::new(
            F64Kernel,
            &equations,
            &rates,
            &network.pressures(),
            &[],
            &retrying_settings(),
        )
        .unwrap()
        .solve(&[0.0, 1.0])
        .unwrap();
        assert!(result.converged);
        assert!(result.damping_retries > 0);
        assert_relative_eq!(result.coverages[0], 0.6126339466056445, epsilon = 1e-9);
        assert_relative_eq!(result.coverages[1], 0.04223614020070886, epsilon = 1e-9);
        for pair in result.history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_exhausted_damping_retries_fail() {
        let (network, _, equations) = co_oxidation();
        let rates = mild_rates();
        let mut s = retrying_settings();
        s.max_damping_retries = 0;
        let solver =
            SteadyStateSolver::new(F64Kernel, &equations, &rates, &network.pressures(), &[], &s)
                .unwrap();
        match solver.solve(&[0.0, 1.0]) {
            Err(KineticsError::ConvergenceError {
                reason,
                coverages,
                iterations,
                ..
            }) => {
                assert_eq!(reason, "no descent after 0 damping retries");
                assert_eq!(iterations, 1);
                // the first step was cut to half of 0.995 times the distance to the bound
                assert_relative_eq!(coverages[0], 0.4975 / 3.0, epsilon = 1e-12);
                assert_relative_eq!(coverages[1], 0.5025, epsilon = 1e-12);
            }
            other => panic!("expected a convergence error, got {:?}", other),
        }
    }

    #[test]
    fn test_coverages_stay_physical() {
        let (network, rates, equations) = co_oxidation();
        let mut s = settings(450.0);
        s.coarse_iterations = 0;
        let solver =
            SteadyStateSolver::new(F64Kernel, &equations, &rates, &network.pressures(), &[], &s)
                .unwrap();
        // seeds outside the simplex are projected first
        for seed in [[1.2, 0.3], [-0.5, 0.5], [0.9, 0.1]] {
            let result = solver.solve(&seed).unwrap();
            assert!(result.coverages.iter().all(|t| *t >= 0.0));
            assert!(result.coverages.iter().sum::<f64>() <= 1.0 + 1e-12);
            assert!(equations.free_sites(&result.coverages)[0] >= 0.0);
        }
    }

    #[test]
    fn test_double_double_agrees_with_f64() {
        let (network, rates, equations) = co_oxidation();
        let mut s = settings(450.0);
        s.tolerance = 1e-25;
        let dd = SteadyStateSolver::new(
            DoubleDoubleKernel,
            &equations,
            &rates,
            &network.pressures(),
            &[],
            &s,
        )
        .unwrap()
        .solve(&[0.9, 0.1])
        .unwrap();
        let f = SteadyStateSolver::new(F64Kernel, &equations, &rates, &network.pressures(), &[], &s)
            .unwrap()
            .solve(&[0.9, 0.1])
            .unwrap();
        assert_eq!(dd.reason, ConvergenceReason::StepSize);
        for i in 0..2 {
            assert_relative_eq!(dd.coverages[i], f.coverages[i], epsilon = 1e-12);
            assert_relative_eq!(dd.coverages[i], REFERENCE[i], epsilon = 1e-6);
        }
        // the rounding floor of f64 is about 1e-4 here, double-double goes far below it
        assert!(dd.residual_norm < 1e-15);
        assert!(f.residual_norm > dd.residual_norm);
    }

    #[test]
    fn test_max_iterations_is_reported() {
        let (network, rates, equations) = co_oxidation();
        let mut s = settings(450.0);
        s.coarse_iterations = 0;
        s.max_iterations = 1;
        let solver =
            SteadyStateSolver::new(F64Kernel, &equations, &rates, &network.pressures(), &[], &s)
                .unwrap();
        match solver.solve(&[0.9, 0.1]) {
            Err(KineticsError::ConvergenceError {
                coverages,
                iterations,
                ..
            }) => {
                assert_eq!(iterations, 1);
                assert_eq!(coverages.len(), 2);
                assert!(coverages[0] > 0.9);
            }
            other => panic!("expected a convergence error, got {:?}", other),
        }
    }

    #[test]
    fn test_converges_on_residual_for_mild_system() {
        let (network, _, equations) = co_oxidation();
        let rates = mild_rates();
        let mut s = settings(450.0);
        s.tolerance = 1e-12;
        let result = SteadyStateSolver::new(
            F64Kernel,
            &equations,
            &rates,
            &network.pressures(),
            &[],
            &s,
        )
        .unwrap()
        .solve(&[0.2, 0.2])
        .unwrap();
        let base = equations
            .base_values::<f64>(&rates, &network.pressures(), &[])
            .unwrap();
        let residual = equations.residual(&equations.at_coverages(&base, &result.coverages).unwrap());
        assert!(residual.iter().all(|r| r.abs() < 1e-10));
    }

    #[test]
    fn test_seed_dimension_checked() {
        let (network, rates, equations) = co_oxidation();
        let solver = SteadyStateSolver::new(
            F64Kernel,
            &equations,
            &rates,
            &network.pressures(),
            &[],
            &settings(450.0),
        )
        .unwrap();
        assert!(matches!(
            solver.solve(&[0.5]),
            Err(KineticsError::DimensionMismatchError { .. })
        ));
        assert!(solver.solve(&[f64::NAN, 0.1]).is_err());
    }
}
