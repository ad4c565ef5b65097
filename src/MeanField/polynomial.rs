//! Sparse polynomials over the symbols of a reaction network.
//!
//! A [`Monomial`] is a coefficient times a product of symbols raised to real powers; a
//! [`Polynomial`] is a sum of monomials. Free-site fractions are kept as symbols of their own
//! and differentiated through the site balance `theta_* = total - sum(theta_a)`, so a
//! derivative with respect to an adsorbate coverage picks up `-1` from every free-site
//! factor of that adsorbate's site.
use crate::Kinetics::reaction_network::ReactionNetwork;
use crate::MeanField::numeric_kernel::Real;
use RustedSciThe::symbolic::symbolic_engine::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Kf(usize),
    Kr(usize),
    /// adsorbate coverage
    Coverage(usize),
    /// free-site fraction of a site
    FreeSite(usize),
    Pressure(usize),
    Concentration(usize),
    EquilibriumConstant(usize),
}

impl Symbol {
    /// Variable name usable in a symbolic expression, e.g. `kf_2`, `p_CO_g`, `theta_CO_s`.
    pub fn variable_name(&self, network: &ReactionNetwork) -> String {
        let clean = |s: &str| s.replace(['-', '*'], "_");
        match *self {
            Symbol::Kf(i) => format!("kf_{}", i),
            Symbol::Kr(i) => format!("kr_{}", i),
            Symbol::EquilibriumConstant(i) => format!("K_{}", i),
            Symbol::Coverage(a) => format!("theta_{}", clean(&network.adsorbates[a].name)),
            Symbol::FreeSite(s) => format!("theta_free_{}", clean(&network.sites[s].name)),
            Symbol::Pressure(g) => format!("p_{}", clean(&network.gases[g].name)),
            Symbol::Concentration(l) => format!("c_{}", clean(&network.liquids[l].name)),
        }
    }

    /// Human-readable name, e.g. `θ(CO_s)`.
    pub fn display_name(&self, network: &ReactionNetwork) -> String {
        match *self {
            Symbol::Kf(i) => format!("kf{}", i),
            Symbol::Kr(i) => format!("kr{}", i),
            Symbol::EquilibriumConstant(i) => format!("K{}", i),
            Symbol::Coverage(a) => format!("θ({})", network.adsorbates[a].name),
            Symbol::FreeSite(s) => format!("θ(*_{})", network.sites[s].name),
            Symbol::Pressure(g) => format!("p({})", network.gases[g].name),
            Symbol::Concentration(l) => format!("c({})", network.liquids[l].name),
        }
    }
}

/// Numeric values of all symbols in the working precision.
#[derive(Debug, Clone)]
pub struct SymbolValues<R: Real> {
    pub kf: Vec<R>,
    pub kr: Vec<R>,
    pub coverages: Vec<R>,
    pub free_sites: Vec<R>,
    pub pressures: Vec<R>,
    pub concentrations: Vec<R>,
    pub equilibrium_constants: Vec<R>,
}

impl<R: Real> SymbolValues<R> {
    pub fn value(&self, symbol: Symbol) -> R {
        match symbol {
            Symbol::Kf(i) => self.kf[i],
            Symbol::Kr(i) => self.kr[i],
            Symbol::Coverage(a) => self.coverages[a],
            Symbol::FreeSite(s) => self.free_sites[s],
            Symbol::Pressure(g) => self.pressures[g],
            Symbol::Concentration(l) => self.concentrations[l],
            Symbol::EquilibriumConstant(i) => self.equilibrium_constants[i],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monomial {
    pub coefficient: f64,
    /// sorted by symbol, exponents never zero
    pub factors: Vec<(Symbol, f64)>,
}

impl Monomial {
    pub fn constant(coefficient: f64) -> Self {
        Self {
            coefficient,
            factors: Vec::new(),
        }
    }

    pub fn new(coefficient: f64, factors: Vec<(Symbol, f64)>) -> Self {
        let mut m = Self::constant(coefficient);
        for (symbol, exponent) in factors {
            m.multiply_factor(symbol, exponent);
        }
        m
    }

    /// multiplies by `symbol^exponent` in place
    pub fn multiply_factor(&mut self, symbol: Symbol, exponent: f64) {
        match self.factors.binary_search_by(|(s, _)| s.cmp(&symbol)) {
            Ok(pos) => {
                self.factors[pos].1 += exponent;
                if self.factors[pos].1 == 0.0 {
                    self.factors.remove(pos);
                }
            }
            Err(pos) => {
                if exponent != 0.0 {
                    self.factors.insert(pos, (symbol, exponent));
                }
            }
        }
    }

    pub fn multiply(&self, other: &Monomial) -> Monomial {
        let mut product = self.clone();
        product.coefficient *= other.coefficient;
        for (symbol, exponent) in other.factors.iter() {
            product.multiply_factor(*symbol, *exponent);
        }
        product
    }

    /// `self^power`
    pub fn power(&self, power: f64) -> Monomial {
        Monomial {
            coefficient: self.coefficient.powf(power),
            factors: self
                .factors
                .iter()
                .map(|(s, e)| (*s, e * power))
                .filter(|(_, e)| *e != 0.0)
                .collect(),
        }
    }

    pub fn exponent_of(&self, symbol: Symbol) -> f64 {
        self.factors
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, e)| *e)
            .unwrap_or(0.0)
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.factors.iter().any(|(s, _)| *s == symbol)
    }

    pub fn evaluate<R: Real>(&self, values: &SymbolValues<R>) -> R {
        let mut result = R::from_f64(self.coefficient);
        for (symbol, exponent) in self.factors.iter() {
            result = result * values.value(*symbol).powf(*exponent);
        }
        result
    }

    /// Derivative with respect to the coverage of `adsorbate` bound to `site`.
    pub fn derivative(&self, adsorbate: usize, site: usize) -> Polynomial {
        let mut terms = Vec::new();
        for (k, (symbol, exponent)) in self.factors.iter().enumerate() {
            let sign = match *symbol {
                Symbol::Coverage(a) if a == adsorbate => 1.0,
                Symbol::FreeSite(s) if s == site => -1.0,
                _ => continue,
            };
            let mut term = self.clone();
            term.coefficient *= sign * exponent;
            term.factors[k].1 -= 1.0;
            if term.factors[k].1 == 0.0 {
                term.factors.remove(k);
            }
            terms.push(term);
        }
        Polynomial::from_terms(terms)
    }

    /// Replaces `symbol` by a monomial, keeping the exponent.
    pub fn substitute(&self, symbol: Symbol, replacement: &Monomial) -> Monomial {
        let exponent = self.exponent_of(symbol);
        if exponent == 0.0 {
            return self.clone();
        }
        let mut rest = self.clone();
        rest.factors.retain(|(s, _)| *s != symbol);
        rest.multiply(&replacement.power(exponent))
    }

    fn same_factors(&self, other: &Monomial) -> bool {
        self.factors == other.factors
    }

    pub fn to_expr(&self, network: &ReactionNetwork) -> Expr {
        let mut expr = Expr::Const(self.coefficient);
        for (symbol, exponent) in self.factors.iter() {
            let var = Expr::Var(symbol.variable_name(network));
            let factor = if *exponent == 1.0 {
                var
            } else {
                Expr::Pow(Box::new(var), Box::new(Expr::Const(*exponent)))
            };
            expr = expr * factor;
        }
        expr
    }

    pub fn display_with(&self, network: &ReactionNetwork) -> String {
        let mut parts = Vec::new();
        if self.coefficient != 1.0 || self.factors.is_empty() {
            parts.push(format!("{}", self.coefficient));
        }
        for (symbol, exponent) in self.factors.iter() {
            let name = symbol.display_name(network);
            if *exponent == 1.0 {
                parts.push(name);
            } else {
                parts.push(format!("{}^{}", name, exponent));
            }
        }
        parts.join("*")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polynomial {
    pub terms: Vec<Monomial>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self { terms: Vec::new() }
    }

    /// Builds a polynomial and merges like terms.
    pub fn from_terms(terms: Vec<Monomial>) -> Self {
        let mut p = Self { terms };
        p.collect_terms();
        p
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Adds `sign * monomial`.
    pub fn add_term(&mut self, monomial: &Monomial, sign: f64) {
        let mut term = monomial.clone();
        term.coefficient *= sign;
        self.terms.push(term);
    }

    /// merges terms with identical factors and drops zero coefficients
    pub fn collect_terms(&mut self) {
        let mut merged: Vec<Monomial> = Vec::with_capacity(self.terms.len());
        for term in self.terms.drain(..) {
            match merged.iter_mut().find(|m| m.same_factors(&term)) {
                Some(existing) => existing.coefficient += term.coefficient,
                None => merged.push(term),
            }
        }
        merged.retain(|m| m.coefficient != 0.0);
        self.terms = merged;
    }

    pub fn evaluate<R: Real>(&self, values: &SymbolValues<R>) -> R {
        self.terms
            .iter()
            .fold(R::zero(), |acc, m| acc + m.evaluate(values))
    }

    /// Sum of the absolute values of the terms.
    pub fn absolute_sum<R: Real>(&self, values: &SymbolValues<R>) -> R {
        self.terms
            .iter()
            .fold(R::zero(), |acc, m| acc + m.evaluate(values).abs())
    }

    pub fn derivative(&self, adsorbate: usize, site: usize) -> Polynomial {
        let terms = self
            .terms
            .iter()
            .flat_map(|m| m.derivative(adsorbate, site).terms)
            .collect();
        Polynomial::from_terms(terms)
    }

    pub fn substitute(&self, symbol: Symbol, replacement: &Monomial) -> Polynomial {
        Polynomial::from_terms(
            self.terms
                .iter()
                .map(|m| m.substitute(symbol, replacement))
                .collect(),
        )
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.terms.iter().any(|m| m.contains(symbol))
    }

    pub fn to_expr(&self, network: &ReactionNetwork) -> Expr {
        let mut iter = self.terms.iter();
        match iter.next() {
            None => Expr::Const(0.0),
            Some(first) => iter.fold(first.to_expr(network), |acc, m| acc + m.to_expr(network)),
        }
    }

    pub fn display_with(&self, network: &ReactionNetwork) -> String {
        if self.terms.is_empty() {
            return "0".to_string();
        }
        self.terms
            .iter()
            .map(|m| m.display_with(network))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}
