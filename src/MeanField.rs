//! # Mean-Field Microkinetics
//!
//! Coverage equations of a surface reaction network and their solution under the mean-field
//! approximation: steady state by damped Newton iteration, quasi-equilibrium closed forms and
//! degrees of rate control.

/// Scalar types (`f64`, double-double) and the linear-algebra kernel the solvers run on.
pub mod numeric_kernel;
/// Expression trees of the coverage equations: signed sums of monomials over symbols such as
/// rate constants, coverages and pressures, with evaluation, differentiation and substitution.
pub mod polynomial;
/// Rate monomials, `dθ/dt` polynomials and the analytical Jacobian of a network.
pub mod coverage_equations;
/// Steady-state coverages: coarse pseudo-transient pre-pass followed by damped Newton.
pub mod steady_state_solver;
/// Analytical elimination of coverages with all but the rate-determining step equilibrated.
pub mod quasi_equilibrium;
/// Degree of rate control and degree of thermodynamic rate control.
pub mod sensitivity;
/// Session that owns a network and runs the whole pipeline, with table reports.
pub mod microkinetic_model;
mod quasi_equilibrium_tests;
mod steady_state_solver_tests;
