/// Worked examples on CO oxidation over a single site type: steady state, quasi-equilibrium,
/// degrees of rate control, settings files and the kinetic Monte Carlo boundary.
pub mod co_oxidation_examples;
