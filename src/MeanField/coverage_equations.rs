//! # Coverage Equations
//!
//! ## Purpose
//! Assembles the mean-field rate equations of a reaction network as explicit polynomials
//! and differentiates them analytically.
//!
//! For reaction `i` the forward rate is `kf_i * prod(x^n)` over the initial state and the
//! reverse rate is `kr_i * prod(x^n)` over the final state, where `x` is a coverage, a free
//! site fraction, a pressure or a concentration. Transition states do not enter rate
//! monomials. When a side is evaluated with collision theory the gas pressure is already
//! part of the rate constant and is left out of the monomial.
//!
//! For every adsorbate `a`:
//! ```text
//! dθ_a/dt = sum_i (n_FS(a,i) - n_IS(a,i)) * (rf_i - rr_i)
//! ```
//! and the Jacobian entry `(a, b)` is the derivative of that polynomial with respect to
//! `θ_b`, free-site factors of the site of `b` contributing through the site balance.
use crate::Kinetics::rate_constants::RateConstantSet;
use crate::Kinetics::reaction_network::{ReactionNetwork, SpeciesRef, StoichTerm};
use crate::MeanField::numeric_kernel::Real;
use crate::MeanField::polynomial::{Monomial, Polynomial, Symbol, SymbolValues};
use crate::errors::KineticsError;
use log::debug;

#[derive(Debug, Clone)]
pub struct CoverageEquations {
    /// forward rate monomial of every reaction, including `kf_i`
    pub forward: Vec<Monomial>,
    /// reverse rate monomial of every reaction, including `kr_i`
    pub reverse: Vec<Monomial>,
    /// one polynomial per adsorbate, in adsorbate order
    pub dtheta_dt: Vec<Polynomial>,
    /// `jacobian[a][b] = d(dθ_a/dt)/dθ_b`
    pub jacobian: Vec<Vec<Polynomial>>,
    pub adsorbate_sites: Vec<usize>,
    pub site_totals: Vec<f64>,
    /// net gas stoichiometry, reactions x gases
    pub gas_stoichiometry: Vec<Vec<f64>>,
    n_gases: usize,
    n_liquids: usize,
}

fn side_monomial(rate: Symbol, terms: &[StoichTerm], collision_gas: Option<usize>) -> Monomial {
    let mut m = Monomial::new(1.0, vec![(rate, 1.0)]);
    for term in terms {
        let n = term.coefficient as f64;
        let symbol = match term.species {
            SpeciesRef::Gas(g) if Some(g) == collision_gas => continue,
            SpeciesRef::Gas(g) => Symbol::Pressure(g),
            SpeciesRef::Liquid(l) => Symbol::Concentration(l),
            SpeciesRef::Adsorbate(a) => Symbol::Coverage(a),
            SpeciesRef::FreeSite(s) => Symbol::FreeSite(s),
            SpeciesRef::TransitionState(_) => continue,
        };
        m.multiply_factor(symbol, n);
    }
    m
}

impl CoverageEquations {
    /// Builds rate monomials, rate equations and the analytical Jacobian.
    ///
    /// `collision_gases[i]` names the gases whose pressure is part of `kf_i` and `kr_i`.
    pub fn build(
        network: &ReactionNetwork,
        collision_gases: &[(Option<usize>, Option<usize>)],
    ) -> Result<Self, KineticsError> {
        if collision_gases.len() != network.reaction_count() {
            return Err(KineticsError::dimension(
                network.reaction_count(),
                collision_gases.len(),
                "rate branches",
            ));
        }
        let mut forward = Vec::with_capacity(network.reaction_count());
        let mut reverse = Vec::with_capacity(network.reaction_count());
        for (reaction, (forward_gas, reverse_gas)) in
            network.reactions.iter().zip(collision_gases.iter())
        {
            let i = reaction.index;
            forward.push(side_monomial(Symbol::Kf(i), &reaction.initial, *forward_gas));
            reverse.push(side_monomial(Symbol::Kr(i), &reaction.final_state, *reverse_gas));
        }

        let adsorbate_sites: Vec<usize> = (0..network.adsorbates.len())
            .map(|a| network.adsorbate_site(a))
            .collect();
        let mut dtheta_dt = Vec::with_capacity(adsorbate_sites.len());
        for a in 0..adsorbate_sites.len() {
            let mut p = Polynomial::zero();
            for reaction in network.reactions.iter() {
                let nu = reaction.net_stoichiometry(SpeciesRef::Adsorbate(a));
                if nu == 0.0 {
                    continue;
                }
                p.add_term(&forward[reaction.index], nu);
                p.add_term(&reverse[reaction.index], -nu);
            }
            p.collect_terms();
            debug!(
                "d{}/dt = {}",
                network.adsorbates[a].name,
                p.display_with(network)
            );
            dtheta_dt.push(p);
        }

        let jacobian = dtheta_dt
            .iter()
            .map(|p| {
                adsorbate_sites
                    .iter()
                    .enumerate()
                    .map(|(b, site)| p.derivative(b, *site))
                    .collect()
            })
            .collect();

        Ok(Self {
            forward,
            reverse,
            dtheta_dt,
            jacobian,
            adsorbate_sites,
            site_totals: network.site_totals(),
            gas_stoichiometry: network.gas_stoichiometry_matrix(),
            n_gases: network.gases.len(),
            n_liquids: network.liquids.len(),
        })
    }

    pub fn adsorbate_count(&self) -> usize {
        self.adsorbate_sites.len()
    }

    pub fn reaction_count(&self) -> usize {
        self.forward.len()
    }

    /// `total_s - sum(θ on s)`, never below zero
    pub fn free_sites<R: Real>(&self, coverages: &[R]) -> Vec<R> {
        let mut free: Vec<R> = self.site_totals.iter().map(|t| R::from_f64(*t)).collect();
        for (a, site) in self.adsorbate_sites.iter().enumerate() {
            free[*site] = free[*site] - coverages[a];
        }
        free.into_iter().map(|f| f.max(R::zero())).collect()
    }

    /// Symbol values without coverages, in the working precision.
    pub fn base_values<R: Real>(
        &self,
        rates: &RateConstantSet,
        pressures: &[f64],
        concentrations: &[f64],
    ) -> Result<SymbolValues<R>, KineticsError> {
        if rates.len() != self.reaction_count() {
            return Err(KineticsError::dimension(
                self.reaction_count(),
                rates.len(),
                "rate constants",
            ));
        }
        if pressures.len() != self.n_gases {
            return Err(KineticsError::dimension(self.n_gases, pressures.len(), "pressures"));
        }
        if concentrations.len() != self.n_liquids {
            return Err(KineticsError::dimension(
                self.n_liquids,
                concentrations.len(),
                "concentrations",
            ));
        }
        let convert = |v: &[f64]| v.iter().map(|x| R::from_f64(*x)).collect::<Vec<R>>();
        Ok(SymbolValues {
            kf: convert(&rates.kf),
            kr: convert(&rates.kr),
            coverages: Vec::new(),
            free_sites: Vec::new(),
            pressures: convert(pressures),
            concentrations: convert(concentrations),
            equilibrium_constants: rates
                .equilibrium_constants()
                .iter()
                .map(|k| R::from_f64(*k))
                .collect(),
        })
    }

    /// Copies `base` and sets coverages and free sites.
    pub fn at_coverages<R: Real>(
        &self,
        base: &SymbolValues<R>,
        coverages: &[R],
    ) -> Result<SymbolValues<R>, KineticsError> {
        if coverages.len() != self.adsorbate_count() {
            return Err(KineticsError::dimension(
                self.adsorbate_count(),
                coverages.len(),
                "coverages",
            ));
        }
        let mut values = base.clone();
        values.coverages = coverages.to_vec();
        values.free_sites = self.free_sites(coverages);
        Ok(values)
    }

    /// `dθ/dt` at the coverages held in `values`.
    pub fn residual<R: Real>(&self, values: &SymbolValues<R>) -> Vec<R> {
        self.dtheta_dt.iter().map(|p| p.evaluate(values)).collect()
    }

    /// Residual of every adsorbate divided by its gross rate, the sum of the magnitudes of
    /// all production and consumption terms. Equations without any flux are left unscaled.
    pub fn scaled_residual<R: Real>(&self, values: &SymbolValues<R>) -> Vec<R> {
        self.dtheta_dt
            .iter()
            .map(|p| {
                let gross = p.absolute_sum(values);
                let r = p.evaluate(values);
                if gross > R::zero() { r / gross } else { r }
            })
            .collect()
    }

    pub fn jacobian_at<R: Real>(&self, values: &SymbolValues<R>) -> Vec<Vec<R>> {
        self.jacobian
            .iter()
            .map(|row| row.iter().map(|p| p.evaluate(values)).collect())
            .collect()
    }

    /// forward and reverse rates of every reaction
    pub fn rates<R: Real>(&self, values: &SymbolValues<R>) -> (Vec<R>, Vec<R>) {
        (
            self.forward.iter().map(|m| m.evaluate(values)).collect(),
            self.reverse.iter().map(|m| m.evaluate(values)).collect(),
        )
    }

    pub fn net_rates<R: Real>(&self, values: &SymbolValues<R>) -> Vec<R> {
        let (rf, rr) = self.rates(values);
        rf.into_iter().zip(rr).map(|(f, r)| f - r).collect()
    }

    /// `rr/rf` of every reaction; zero when the forward rate vanishes
    pub fn reversibilities<R: Real>(&self, values: &SymbolValues<R>) -> Vec<R> {
        let (rf, rr) = self.rates(values);
        rf.into_iter()
            .zip(rr)
            .map(|(f, r)| if f == R::zero() { R::zero() } else { r / f })
            .collect()
    }

    /// Turnover frequency of a gas: its net production summed over all reactions.
    pub fn tof<R: Real>(&self, values: &SymbolValues<R>, gas: usize) -> Result<R, KineticsError> {
        if gas >= self.n_gases {
            return Err(KineticsError::MissingDataError(format!(
                "gas index {} out of range ({} gases)",
                gas, self.n_gases
            )));
        }
        let net = self.net_rates(values);
        Ok(net
            .iter()
            .zip(self.gas_stoichiometry.iter())
            .fold(R::zero(), |acc, (r, nu)| acc + *r * R::from_f64(nu[gas])))
    }
}
