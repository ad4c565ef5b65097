//! # KiSurf
//!
//! Mean-field microkinetic modelling of heterogeneous catalytic reaction networks.
//!
//! A network of elementary surface reactions is parsed into species and sites, rate constants
//! are obtained from transition-state or collision theory, and the coverage equations are
//! solved for the steady state. Quasi-equilibrium closed forms and degrees of rate control are
//! derived from the same equations.
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Kinetics;
#[allow(non_snake_case)]
pub mod MeanField;
pub mod errors;
pub mod settings;
