//! # Steady-State Solver
//!
//! ## Purpose
//! Finds coverages `θ` with `dθ/dt = 0` for the polynomial system assembled by
//! [`CoverageEquations`]. All arithmetic goes through a [`NumericKernel`], so the same code
//! runs in `f64` and in double-double precision.
//!
//! ## Algorithm
//! 1. **Coarse pre-pass**: a few pseudo-transient steps `(I/dt - J) Δ = r` starting with
//!    `dt = 1/||J||∞`. The time step grows while the residual drops and is halved otherwise.
//!    This carries an arbitrary seed into the basin of attraction of Newton's method, which
//!    diverges from poor seeds when rate constants span many orders of magnitude.
//! 2. **Damped Newton**: `J Δ = -r`, `θ <- θ + αΔ`. The step length is capped so that no
//!    coverage turns negative and no site is overfilled. A backtracking line search halves
//!    `α` until the merit does not increase, so the merit history never rises. The merit is
//!    the residual scaled by the gross rate of each equation: the plain residual of a stiff
//!    system carries rounding noise of order `eps·||J||∞` that hides any progress near the
//!    solution.
//! 3. **Recovery**: when the line search has to shorten the step in `divergence_window`
//!    consecutive iterations, or finds no descent at all, the damping factor is halved and
//!    Newton continues from the current point, which is the best one seen. Steps taken at
//!    full damped length double the damping again up to its configured value. More than
//!    `max_damping_retries` consecutive reductions fail the solve.
//!
//! Convergence is declared when the residual norm falls below `tolerance` or when the full
//! Newton correction is smaller than `step_tolerance·(1 + ||θ||)`. The second criterion is
//! what terminates stiff problems in `f64`, where the residual floor can be far above any
//! useful absolute tolerance. It is also checked when the line search finds no descent, which
//! is how the solve ends on the rounding plateau.
//!
//! ## Failure
//! Exceeding `max_iterations` or the damping retries returns
//! [`KineticsError::ConvergenceError`] carrying the last coverages, the iteration count and
//! the residual norm.
use crate::Kinetics::rate_constants::RateConstantSet;
use crate::MeanField::coverage_equations::CoverageEquations;
use crate::MeanField::numeric_kernel::{NumericKernel, Real};
use crate::MeanField::polynomial::SymbolValues;
use crate::errors::KineticsError;
use crate::settings::SolverSettings;
use log::{info, warn};
use nalgebra::{DMatrix, DVector};

/// halvings of the step length in one line search
const LINE_SEARCH_STEPS: usize = 30;
/// fraction of the distance to the bound a step may cover
const BOUND_FRACTION: f64 = 0.995;
/// below this step length the bound is handled by projection
const MIN_BOUNDED_STEP: f64 = 1e-8;
const MAX_TIME_STEP_GROWTH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceReason {
    /// residual norm below tolerance
    Residual,
    /// Newton correction below step tolerance
    StepSize,
}

#[derive(Debug, Clone)]
pub struct SteadyStateResult {
    pub coverages: Vec<f64>,
    pub converged: bool,
    pub reason: ConvergenceReason,
    pub iterations: usize,
    pub residual_norm: f64,
    /// scaled residual norm at the start of Newton and after every accepted step
    pub history: Vec<f64>,
    pub damping_retries: usize,
}

pub struct SteadyStateSolver<'a, K: NumericKernel> {
    pub kernel: K,
    equations: &'a CoverageEquations,
    base: SymbolValues<K::Scalar>,
    pub tolerance: f64,
    pub step_tolerance: f64,
    pub max_iterations: usize,
    pub coarse_iterations: usize,
    pub damping: f64,
    pub max_damping_retries: usize,
    pub divergence_window: usize,
}

impl<'a, K: NumericKernel> SteadyStateSolver<'a, K> {
    pub fn new(
        kernel: K,
        equations: &'a CoverageEquations,
        rates: &RateConstantSet,
        pressures: &[f64],
        concentrations: &[f64],
        settings: &SolverSettings,
    ) -> Result<Self, KineticsError> {
        let base = equations.base_values(rates, pressures, concentrations)?;
        Ok(Self {
            kernel,
            equations,
            base,
            tolerance: settings.tolerance,
            step_tolerance: settings.step_tolerance,
            max_iterations: settings.max_iterations,
            coarse_iterations: settings.coarse_iterations,
            damping: settings.damping,
            max_damping_retries: settings.max_damping_retries,
            divergence_window: settings.divergence_window,
        })
    }

    fn residual(&self, theta: &[K::Scalar]) -> Result<Vec<K::Scalar>, KineticsError> {
        let values = self.equations.at_coverages(&self.base, theta)?;
        Ok(self.equations.residual(&values))
    }

    fn residual_norm(&self, theta: &[K::Scalar]) -> Result<K::Scalar, KineticsError> {
        Ok(self.kernel.norm(&self.residual(theta)?))
    }

    /// 2-norm of the residual scaled by the gross rate of every equation. Unlike the plain
    /// residual it stays resolvable near a stiff steady state, where the plain norm is
    /// dominated by rounding of `kf * θ*` with `θ*` close to zero.
    fn merit(&self, theta: &[K::Scalar]) -> Result<K::Scalar, KineticsError> {
        let values = self.equations.at_coverages(&self.base, theta)?;
        Ok(self.kernel.norm(&self.equations.scaled_residual(&values)))
    }

    fn jacobian(&self, theta: &[K::Scalar]) -> Result<DMatrix<K::Scalar>, KineticsError> {
        let values = self.equations.at_coverages(&self.base, theta)?;
        self.kernel.matrix(&self.equations.jacobian_at(&values))
    }

    /// Largest step length keeping coverages non-negative and sites not overfilled.
    fn step_bound(&self, theta: &[K::Scalar], delta: &[K::Scalar]) -> K::Scalar {
        let zero = K::Scalar::zero();
        let mut bound: Option<K::Scalar> = None;
        let mut tighten = |candidate: K::Scalar| {
            bound = Some(match bound {
                Some(b) => b.min(candidate),
                None => candidate,
            });
        };
        for (t, d) in theta.iter().zip(delta.iter()) {
            if *d < zero {
                tighten(*t / -*d);
            }
        }
        let free = self.equations.free_sites(theta);
        let mut growth = vec![zero; free.len()];
        for (a, site) in self.equations.adsorbate_sites.iter().enumerate() {
            growth[*site] = growth[*site] + delta[a];
        }
        for (f, g) in free.iter().zip(growth.iter()) {
            if *g > zero {
                tighten(*f / *g);
            }
        }
        bound.unwrap_or_else(|| self.kernel.mpf(f64::MAX))
    }

    /// Clamps negative coverages and rescales overfilled sites.
    fn project(&self, theta: &mut [K::Scalar]) {
        let zero = K::Scalar::zero();
        for t in theta.iter_mut() {
            *t = t.max(zero);
        }
        let mut occupied = vec![zero; self.equations.site_totals.len()];
        for (a, site) in self.equations.adsorbate_sites.iter().enumerate() {
            occupied[*site] = occupied[*site] + theta[a];
        }
        for (a, site) in self.equations.adsorbate_sites.iter().enumerate() {
            let total = self.kernel.mpf(self.equations.site_totals[*site]);
            if occupied[*site] > total {
                theta[a] = theta[a] * total / occupied[*site];
            }
        }
    }

    /// Step length inside the bounds, or `None` when the bound leaves no room and the step
    /// has to be projected.
    fn bounded_step(&self, theta: &[K::Scalar], delta: &[K::Scalar], cap: f64) -> Option<K::Scalar> {
        let limit = self.step_bound(theta, delta) * self.kernel.mpf(BOUND_FRACTION);
        if limit < self.kernel.mpf(MIN_BOUNDED_STEP) {
            None
        } else {
            Some(limit.min(self.kernel.mpf(cap)))
        }
    }

    fn advance(
        &self,
        theta: &[K::Scalar],
        delta: &[K::Scalar],
        alpha: K::Scalar,
        projected: bool,
    ) -> Vec<K::Scalar> {
        let mut next: Vec<K::Scalar> = theta
            .iter()
            .zip(delta.iter())
            .map(|(t, d)| *t + alpha * *d)
            .collect();
        if projected {
            self.project(&mut next);
        }
        next
    }

    fn to_f64(theta: &[K::Scalar]) -> Vec<f64> {
        theta.iter().map(|t| t.to_f64()).collect()
    }

    fn check_seed(&self, seed: &[f64]) -> Result<Vec<K::Scalar>, KineticsError> {
        if seed.len() != self.equations.adsorbate_count() {
            return Err(KineticsError::dimension(
                self.equations.adsorbate_count(),
                seed.len(),
                "initial coverages",
            ));
        }
        if seed.iter().any(|x| !x.is_finite()) {
            return Err(KineticsError::ParameterError(
                "initial coverages must be finite".to_string(),
            ));
        }
        let mut theta: Vec<K::Scalar> = seed.iter().map(|x| self.kernel.mpf(*x)).collect();
        self.project(&mut theta);
        Ok(theta)
    }

    /// Pseudo-transient relaxation from `seed`; returns the relaxed coverages.
    pub fn coarse_pass(&self, seed: &[f64]) -> Result<Vec<K::Scalar>, KineticsError> {
        let mut theta = self.check_seed(seed)?;
        if self.coarse_iterations == 0 {
            return Ok(theta);
        }
        let n = theta.len();
        let one = K::Scalar::one();
        let mut r = self.residual(&theta)?;
        let mut norm = self.kernel.norm(&r);
        let j_norm = self.kernel.infinity_norm(&self.jacobian(&theta)?);
        if j_norm == K::Scalar::zero() {
            return Ok(theta);
        }
        let mut dt = one / j_norm;
        for k in 0..self.coarse_iterations {
            if norm == K::Scalar::zero() {
                break;
            }
            let j = self.jacobian(&theta)?;
            let a = DMatrix::from_fn(n, n, |p, q| {
                let diagonal = if p == q { one / dt } else { K::Scalar::zero() };
                diagonal - j[(p, q)]
            });
            let delta = self.kernel.solve(&a, &DVector::from_vec(r.clone()))?;
            let delta: Vec<K::Scalar> = delta.iter().copied().collect();
            let (alpha, projected) = match self.bounded_step(&theta, &delta, 1.0) {
                Some(alpha) => (alpha, false),
                None => (one, true),
            };
            theta = self.advance(&theta, &delta, alpha, projected);
            let next_r = self.residual(&theta)?;
            let next_norm = self.kernel.norm(&next_r);
            info!(
                "coarse step {}: dt = {:e}, residual norm = {:e}",
                k,
                dt.to_f64(),
                next_norm.to_f64()
            );
            dt = if next_norm < norm {
                let growth = if next_norm == K::Scalar::zero() {
                    self.kernel.mpf(MAX_TIME_STEP_GROWTH)
                } else {
                    (norm / next_norm).min(self.kernel.mpf(MAX_TIME_STEP_GROWTH))
                };
                dt * growth
            } else {
                dt * self.kernel.mpf(0.5)
            };
            r = next_r;
            norm = next_norm;
        }
        Ok(theta)
    }

    /// Coarse pre-pass followed by damped Newton iteration.
    pub fn solve(&self, seed: &[f64]) -> Result<SteadyStateResult, KineticsError> {
        let mut theta = self.coarse_pass(seed)?;
        let tolerance = self.kernel.mpf(self.tolerance);
        let step_tolerance = self.kernel.mpf(self.step_tolerance);
        let one = K::Scalar::one();
        let window = self.divergence_window.max(1);

        let mut norm = self.residual_norm(&theta)?;
        let mut merit = self.merit(&theta)?;
        let mut history = vec![merit.to_f64()];
        let mut damping = self.damping;
        let mut retries = 0;
        // retries since the last step taken at full damped length
        let mut pending = 0;
        let mut shortened = 0;

        for iteration in 0..self.max_iterations {
            if norm <= tolerance {
                info!("converged on residual after {} iterations", iteration);
                return Ok(self.result(theta, norm, ConvergenceReason::Residual, iteration, history, retries));
            }
            let j = self.jacobian(&theta)?;
            let r = self.residual(&theta)?;
            let rhs = DVector::from_iterator(r.len(), r.iter().map(|x| -*x));
            let delta: Vec<K::Scalar> = self.kernel.solve(&j, &rhs)?.iter().copied().collect();
            let correction = self.kernel.norm(&delta);
            let small_correction = |theta: &[K::Scalar]| {
                correction <= step_tolerance * (one + self.kernel.norm(theta))
            };

            let (mut alpha, projected) = match self.bounded_step(&theta, &delta, damping) {
                Some(alpha) => (alpha, false),
                None => (self.kernel.mpf(damping), true),
            };
            let mut accepted = None;
            let mut cut = false;
            for _ in 0..LINE_SEARCH_STEPS {
                let candidate = self.advance(&theta, &delta, alpha, projected);
                let candidate_merit = self.merit(&candidate)?;
                if candidate_merit <= merit {
                    accepted = Some((candidate, candidate_merit));
                    break;
                }
                alpha = alpha * self.kernel.mpf(0.5);
                cut = true;
            }

            let Some((next, next_merit)) = accepted else {
                if small_correction(&theta) {
                    info!("converged on step size after {} iterations", iteration);
                    return Ok(self.result(theta, norm, ConvergenceReason::StepSize, iteration, history, retries));
                }
                retries += 1;
                pending += 1;
                if pending > self.max_damping_retries {
                    return Err(self.no_descent(&theta, iteration + 1, norm));
                }
                damping *= 0.5;
                warn!(
                    "iteration {}: no descent, damping reduced to {} (retry {})",
                    iteration, damping, retries
                );
                continue;
            };

            theta = next;
            merit = next_merit;
            norm = self.residual_norm(&theta)?;
            history.push(merit.to_f64());
            info!(
                "Newton iteration {}: alpha = {:e}, residual norm = {:e}",
                iteration,
                alpha.to_f64(),
                norm.to_f64()
            );
            if cut {
                shortened += 1;
                if shortened >= window {
                    shortened = 0;
                    retries += 1;
                    pending += 1;
                    if pending > self.max_damping_retries {
                        return Err(self.no_descent(&theta, iteration + 1, norm));
                    }
                    damping *= 0.5;
                    warn!(
                        "iteration {}: full steps keep raising the residual, damping reduced to {} (retry {})",
                        iteration, damping, retries
                    );
                }
            } else {
                shortened = 0;
                pending = 0;
                damping = (damping * 2.0).min(self.damping);
            }
            if small_correction(&theta) {
                info!("converged on step size after {} iterations", iteration + 1);
                return Ok(self.result(theta, norm, ConvergenceReason::StepSize, iteration + 1, history, retries));
            }
        }
        Err(KineticsError::ConvergenceError {
            reason: "maximum number of iterations exceeded".to_string(),
            coverages: Self::to_f64(&theta),
            iterations: self.max_iterations,
            residual_norm: norm.to_f64(),
        })
    }

    fn no_descent(&self, theta: &[K::Scalar], iterations: usize, norm: K::Scalar) -> KineticsError {
        KineticsError::ConvergenceError {
            reason: format!("no descent after {} damping retries", self.max_damping_retries),
            coverages: Self::to_f64(theta),
            iterations,
            residual_norm: norm.to_f64(),
        }
    }

    fn result(
        &self,
        theta: Vec<K::Scalar>,
        residual_norm: K::Scalar,
        reason: ConvergenceReason,
        iterations: usize,
        history: Vec<f64>,
        damping_retries: usize,
    ) -> SteadyStateResult {
        SteadyStateResult {
            coverages: Self::to_f64(&theta),
            converged: true,
            reason,
            iterations,
            residual_norm: residual_norm.to_f64(),
            history,
            damping_retries,
        }
    }
}
