//! # Quasi-Equilibrium Reduction
//!
//! ## Purpose
//! Derives a closed-form turnover frequency by assuming every reaction except one
//! rate-determining step (RDS) is at equilibrium.
//!
//! ## Method
//! An equilibrated reaction `i` satisfies `rf_i = rr_i`, i.e.
//! `K_i = prod(x^ν_x)` where `ν_x` is the exponent of `x` in the reverse rate monomial minus
//! its exponent in the forward rate monomial. A reaction with exactly one adsorbate whose
//! coverage is not yet known is solved for that coverage:
//! ```text
//! θ_t = K^(1/ν_t) * prod_{x != t} x^(-ν_x/ν_t)
//! ```
//! with already known coverages substituted, so every coverage ends up as a monomial in the
//! free-site fraction of its site and the equilibrium constants, pressures and
//! concentrations.
//!
//! Pending reactions live in a queue. A reaction with two or more unknown coverages goes to
//! the back; a reaction with none is dropped. When the whole queue has been scanned without
//! progress the remaining reactions are contracted into one node (summed `ν`, multiplied
//! `K`), which is placed at the head while the original nodes stay queued. A contraction that
//! does not resolve anything, or that repeats, ends the reduction with
//! [`KineticsError::AlgebraicReductionError`].
//!
//! Every coverage is then a monomial `C_a θ*_s^n_a` in the free-site fraction of its own site,
//! and the site balance
//! ```text
//! θ*_s + sum(C_a θ*_s^n_a) = total_s
//! ```
//! fixes `θ*_s`. With all `n_a = 1` the solution is `total_s / (1 + sum(C_a))`, with exponents
//! 1 and 2 it is the positive root of a quadratic, and otherwise it is found numerically:
//! the left side increases with `θ*_s`, so the root in `[0, total_s]` is unique. Substituting
//! into the RDS net rate gives the turnover frequency in terms of rate constants, equilibrium
//! constants, pressures and concentrations only.
use crate::Kinetics::reaction_network::ReactionNetwork;
use crate::MeanField::coverage_equations::CoverageEquations;
use crate::MeanField::polynomial::{Monomial, Polynomial, Symbol, SymbolValues};
use crate::errors::KineticsError;
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::info;
use std::collections::{BTreeMap, HashSet, VecDeque};

/// tolerance on the free-site exponent of a coverage expression
const EXPONENT_TOLERANCE: f64 = 1e-12;
const MAX_BALANCE_ITERATIONS: usize = 200;

/// Root in `[0, total]` of `sum(C x^n) = total` for `C >= 0`, `n > 0`, one term being `x`.
fn solve_site_balance(terms: &[(f64, f64)], total: f64) -> f64 {
    let mut linear = 0.0;
    let mut quadratic = 0.0;
    let mut closed_form = true;
    for (c, n) in terms.iter() {
        if (n - 1.0).abs() < EXPONENT_TOLERANCE {
            linear += c;
        } else if (n - 2.0).abs() < EXPONENT_TOLERANCE {
            quadratic += c;
        } else {
            closed_form = false;
        }
    }
    if closed_form {
        return if quadratic == 0.0 {
            total / linear
        } else {
            2.0 * total / (linear + (linear * linear + 4.0 * quadratic * total).sqrt())
        };
    }
    // safeguarded Newton: bisection whenever the Newton point leaves the bracket
    let balance = |x: f64| terms.iter().map(|(c, n)| c * x.powf(*n)).sum::<f64>() - total;
    let slope = |x: f64| terms.iter().map(|(c, n)| c * n * x.powf(n - 1.0)).sum::<f64>();
    let (mut lo, mut hi) = (0.0, total);
    let mut x = total / linear.max(1.0);
    for _ in 0..MAX_BALANCE_ITERATIONS {
        let value = balance(x);
        if value == 0.0 {
            return x;
        }
        if value > 0.0 {
            hi = x;
        } else {
            lo = x;
        }
        let d = slope(x);
        let newton = x - value / d;
        let next = if d > 0.0 && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
        if (next - x).abs() <= f64::EPSILON * total {
            return next;
        }
        x = next;
    }
    x
}

/// One equilibrated reaction, or a contraction of several.
#[derive(Debug, Clone)]
struct EquilibriumNode {
    reactions: Vec<usize>,
    /// net exponent of every activity symbol
    net: BTreeMap<Symbol, f64>,
    /// product of the equilibrium constants
    constant: Monomial,
}

impl EquilibriumNode {
    fn from_reaction(equations: &CoverageEquations, i: usize) -> Self {
        let mut net = BTreeMap::new();
        for (symbol, exponent) in equations.reverse[i].factors.iter() {
            if !matches!(symbol, Symbol::Kr(_)) {
                *net.entry(*symbol).or_insert(0.0) += exponent;
            }
        }
        for (symbol, exponent) in equations.forward[i].factors.iter() {
            if !matches!(symbol, Symbol::Kf(_)) {
                *net.entry(*symbol).or_insert(0.0) -= exponent;
            }
        }
        net.retain(|_, e| *e != 0.0);
        Self {
            reactions: vec![i],
            net,
            constant: Monomial::new(1.0, vec![(Symbol::EquilibriumConstant(i), 1.0)]),
        }
    }

    fn contract(nodes: &[EquilibriumNode]) -> Self {
        let mut merged = EquilibriumNode {
            reactions: Vec::new(),
            net: BTreeMap::new(),
            constant: Monomial::constant(1.0),
        };
        for node in nodes {
            merged.reactions.extend(node.reactions.iter().copied());
            for (symbol, exponent) in node.net.iter() {
                *merged.net.entry(*symbol).or_insert(0.0) += exponent;
            }
            merged.constant = merged.constant.multiply(&node.constant);
        }
        merged.reactions.sort_unstable();
        merged.reactions.dedup();
        merged.net.retain(|_, e| *e != 0.0);
        merged
    }

    fn unknown_coverages(&self, known: &[Option<Monomial>]) -> Vec<usize> {
        self.net
            .keys()
            .filter_map(|s| match s {
                Symbol::Coverage(a) if known[*a].is_none() => Some(*a),
                _ => None,
            })
            .collect()
    }

    /// Coverage of `target` from the equilibrium condition, known coverages substituted.
    fn solve_for(&self, target: usize, known: &[Option<Monomial>]) -> Monomial {
        let nu_t = self.net[&Symbol::Coverage(target)];
        let mut result = self.constant.power(1.0 / nu_t);
        for (symbol, nu) in self.net.iter() {
            if *symbol == Symbol::Coverage(target) {
                continue;
            }
            let exponent = -nu / nu_t;
            match symbol {
                Symbol::Coverage(a) => {
                    if let Some(expression) = &known[*a] {
                        result = result.multiply(&expression.power(exponent));
                    }
                }
                _ => result.multiply_factor(*symbol, exponent),
            }
        }
        result
    }
}

/// Closed-form quasi-equilibrium solution.
#[derive(Debug, Clone)]
pub struct QuasiEquilibriumResult {
    pub rds: usize,
    /// coverage of every adsorbate as a monomial in its free-site fraction
    pub coverages: Vec<Monomial>,
    /// occupancy `θ*_s + sum(θ_a)` of every site as a polynomial in its free-site fraction
    pub site_balances: Vec<Polynomial>,
    pub site_totals: Vec<f64>,
    /// net rate of the RDS in terms of free-site fractions
    pub rate: Polynomial,
}

impl QuasiEquilibriumResult {
    /// `(C, n)` of every term `C θ*^n` of a site balance
    fn balance_coefficients(&self, site: usize) -> Vec<(Monomial, f64)> {
        self.site_balances[site]
            .terms
            .iter()
            .map(|term| {
                let mut c = term.clone();
                c.factors.retain(|(s, _)| *s != Symbol::FreeSite(site));
                (c, term.exponent_of(Symbol::FreeSite(site)))
            })
            .collect()
    }

    /// Highest free-site exponent of a site when the balance is a linear or quadratic
    /// polynomial, `None` otherwise.
    pub fn balance_degree(&self, site: usize) -> Option<u32> {
        let mut degree = 1;
        for (_, n) in self.balance_coefficients(site) {
            if (n - 2.0).abs() < EXPONENT_TOLERANCE {
                degree = 2;
            } else if (n - 1.0).abs() >= EXPONENT_TOLERANCE {
                return None;
            }
        }
        Some(degree)
    }

    /// Free-site fraction of every site from its balance.
    pub fn free_sites(&self, values: &SymbolValues<f64>) -> Vec<f64> {
        (0..self.site_balances.len())
            .map(|site| {
                let terms: Vec<(f64, f64)> = self
                    .balance_coefficients(site)
                    .iter()
                    .map(|(c, n)| (c.evaluate(values), *n))
                    .collect();
                solve_site_balance(&terms, self.site_totals[site])
            })
            .collect()
    }

    fn with_free_sites(&self, values: &SymbolValues<f64>) -> SymbolValues<f64> {
        let mut v = values.clone();
        v.free_sites = self.free_sites(values);
        v
    }

    pub fn coverages_at(&self, values: &SymbolValues<f64>) -> Vec<f64> {
        let v = self.with_free_sites(values);
        self.coverages.iter().map(|m| m.evaluate(&v)).collect()
    }

    /// Turnover frequency: net rate of the rate-determining step.
    pub fn tof(&self, values: &SymbolValues<f64>) -> f64 {
        self.rate.evaluate(&self.with_free_sites(values))
    }

    /// Site balance `θ*_s + sum(θ_a)` as an expression; it equals the site total.
    pub fn site_balance_expr(&self, network: &ReactionNetwork, site: usize) -> Expr {
        self.site_balances[site].to_expr(network)
    }

    /// Closed form of a free-site fraction, or its variable when the balance is of higher
    /// degree and has to be solved together with [`Self::site_balance_expr`].
    fn free_site_expr(&self, network: &ReactionNetwork, site: usize) -> Expr {
        let total = self.site_totals[site];
        let Some(degree) = self.balance_degree(site) else {
            return Expr::Var(Symbol::FreeSite(site).variable_name(network));
        };
        let mut linear = Polynomial::zero();
        let mut quadratic = Polynomial::zero();
        for (c, n) in self.balance_coefficients(site) {
            if (n - 2.0).abs() < EXPONENT_TOLERANCE {
                quadratic.add_term(&c, 1.0);
            } else {
                linear.add_term(&c, 1.0);
            }
        }
        let b = linear.to_expr(network);
        if degree == 1 {
            return Expr::Const(total) / b;
        }
        let a = quadratic.to_expr(network);
        let discriminant = b.clone() * b.clone() + Expr::Const(4.0 * total) * a;
        Expr::Const(2.0 * total)
            / (b + Expr::Pow(Box::new(discriminant), Box::new(Expr::Const(0.5))))
    }

    /// Symbolic turnover frequency over `kf_i`, `kr_i`, `K_i`, `p_<gas>` and `c_<liquid>`.
    pub fn to_expr(&self, network: &ReactionNetwork) -> Expr {
        let mut total: Option<Expr> = None;
        for term in self.rate.terms.iter() {
            let mut rest = term.clone();
            rest.factors.retain(|(s, _)| !matches!(s, Symbol::FreeSite(_)));
            let mut expr = rest.to_expr(network);
            for (symbol, exponent) in term.factors.iter() {
                if let Symbol::FreeSite(site) = symbol {
                    let f = self.free_site_expr(network, *site);
                    expr = if *exponent == 1.0 {
                        expr * f
                    } else {
                        expr * Expr::Pow(Box::new(f), Box::new(Expr::Const(*exponent)))
                    };
                }
            }
            total = Some(match total {
                Some(acc) => acc + expr,
                None => expr,
            });
        }
        total.unwrap_or(Expr::Const(0.0))
    }

    pub fn display_with(&self, network: &ReactionNetwork) -> String {
        let mut lines = vec![format!("r{} = {}", self.rds, self.rate.display_with(network))];
        for (a, m) in self.coverages.iter().enumerate() {
            lines.push(format!(
                "{} = {}",
                Symbol::Coverage(a).display_name(network),
                m.display_with(network)
            ));
        }
        for (s, balance) in self.site_balances.iter().enumerate() {
            lines.push(format!(
                "{} = {}",
                balance.display_with(network),
                self.site_totals[s]
            ));
        }
        lines.join("\n")
    }
}

pub struct QuasiEquilibriumReducer<'a> {
    network: &'a ReactionNetwork,
    equations: &'a CoverageEquations,
}

impl<'a> QuasiEquilibriumReducer<'a> {
    pub fn new(network: &'a ReactionNetwork, equations: &'a CoverageEquations) -> Self {
        Self { network, equations }
    }

    pub fn reduce(&self, rds: usize) -> Result<QuasiEquilibriumResult, KineticsError> {
        let n_reactions = self.equations.reaction_count();
        if rds >= n_reactions {
            return Err(KineticsError::ConfigurationError(format!(
                "rate-determining step {} out of range ({} reactions)",
                rds, n_reactions
            )));
        }
        let coverages = self.eliminate(rds)?;
        let site_balances = self.site_balance(&coverages)?;

        let mut rate = Polynomial::zero();
        rate.add_term(&self.equations.forward[rds], 1.0);
        rate.add_term(&self.equations.reverse[rds], -1.0);
        for (a, expression) in coverages.iter().enumerate() {
            rate = rate.substitute(Symbol::Coverage(a), expression);
        }
        info!(
            "quasi-equilibrium rate of step {}: {}",
            rds,
            rate.display_with(self.network)
        );
        Ok(QuasiEquilibriumResult {
            rds,
            coverages,
            site_balances,
            site_totals: self.equations.site_totals.clone(),
            rate,
        })
    }

    /// Expresses every coverage through free-site fractions.
    fn eliminate(&self, rds: usize) -> Result<Vec<Monomial>, KineticsError> {
        let n_adsorbates = self.equations.adsorbate_count();
        let mut known: Vec<Option<Monomial>> = vec![None; n_adsorbates];
        let mut queue: VecDeque<EquilibriumNode> = (0..self.equations.reaction_count())
            .filter(|i| *i != rds)
            .map(|i| EquilibriumNode::from_reaction(self.equations, i))
            .collect();
        let mut contracted: HashSet<Vec<usize>> = HashSet::new();
        let mut stalled = 0;

        while let Some(node) = queue.pop_front() {
            let unknown = node.unknown_coverages(&known);
            match unknown.as_slice() {
                [] => {
                    stalled = 0;
                }
                [target] => {
                    let expression = node.solve_for(*target, &known);
                    info!(
                        "reactions {:?} give {} = {}",
                        node.reactions,
                        Symbol::Coverage(*target).display_name(self.network),
                        expression.display_with(self.network)
                    );
                    known[*target] = Some(expression);
                    stalled = 0;
                }
                _ => {
                    queue.push_back(node);
                    stalled += 1;
                }
            }
            if !queue.is_empty() && stalled >= queue.len() {
                let nodes: Vec<EquilibriumNode> = queue.iter().cloned().collect();
                let merged = EquilibriumNode::contract(&nodes);
                if merged.unknown_coverages(&known).len() != 1
                    || !contracted.insert(merged.reactions.clone())
                {
                    return Err(KineticsError::AlgebraicReductionError(format!(
                        "reactions {:?} cannot be resolved: {} unknown coverages after contraction",
                        merged.reactions,
                        merged.unknown_coverages(&known).len()
                    )));
                }
                info!("contracting reactions {:?}", merged.reactions);
                queue.push_front(merged);
                stalled = 0;
            }
        }

        known
            .into_iter()
            .enumerate()
            .map(|(a, m)| {
                m.ok_or_else(|| {
                    KineticsError::AlgebraicReductionError(format!(
                        "coverage of {} is not fixed by any equilibrated reaction",
                        self.network.adsorbates[a].name
                    ))
                })
            })
            .collect()
    }

    /// Builds `θ*_s + sum(θ_a)` per site.
    fn site_balance(&self, coverages: &[Monomial]) -> Result<Vec<Polynomial>, KineticsError> {
        let n_sites = self.equations.site_totals.len();
        let mut balances: Vec<Polynomial> = (0..n_sites)
            .map(|s| Polynomial::from_terms(vec![Monomial::new(1.0, vec![(Symbol::FreeSite(s), 1.0)])]))
            .collect();
        for (a, expression) in coverages.iter().enumerate() {
            let site = self.equations.adsorbate_sites[a];
            let exponent = expression.exponent_of(Symbol::FreeSite(site));
            let foreign = expression
                .factors
                .iter()
                .any(|(s, _)| matches!(s, Symbol::FreeSite(other) if *other != site));
            if exponent < EXPONENT_TOLERANCE || foreign {
                return Err(KineticsError::AlgebraicReductionError(format!(
                    "coverage of {} must grow with the free sites of its own site only: {}",
                    self.network.adsorbates[a].name,
                    expression.display_with(self.network)
                )));
            }
            balances[site].add_term(expression, 1.0);
        }
        for (s, balance) in balances.iter_mut().enumerate() {
            balance.collect_terms();
            info!(
                "site balance: {} = {}",
                balance.display_with(self.network),
                self.equations.site_totals[s]
            );
        }
        Ok(balances)
    }
}
