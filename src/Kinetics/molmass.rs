//! Atomic composition and molar mass of a chemical formula.
//!
//! Used to obtain molecular masses of gas-phase species for collision theory when the
//! species definitions do not carry an explicit mass: the formula is the species name
//! without its phase suffix, e.g. `CO2_g` -> `CO2`.
use crate::errors::KineticsError;
use std::collections::HashMap;

/// chemical element and its standard atomic mass, g/mol
pub struct Element {
    name: &'static str,
    atomic_mass: f64,
}

const fn el(name: &'static str, atomic_mass: f64) -> Element {
    Element { name, atomic_mass }
}

const ELEMENTS: &[Element] = &[
    el("H", 1.008), el("He", 4.0026), el("Li", 6.94), el("Be", 9.0122),
    el("B", 10.81), el("C", 12.011), el("N", 14.007), el("O", 15.999),
    el("F", 18.998), el("Ne", 20.18), el("Na", 22.99), el("Mg", 24.305),
    el("Al", 26.98), el("Si", 28.085), el("P", 30.974), el("S", 32.065),
    el("Cl", 35.45), el("Ar", 39.948), el("K", 39.102), el("Ca", 40.08),
    el("Sc", 44.9559), el("Ti", 47.867), el("V", 50.9415), el("Cr", 51.9961),
    el("Mn", 54.938), el("Fe", 55.845), el("Co", 58.933), el("Ni", 58.69),
    el("Cu", 63.546), el("Zn", 65.38), el("Ga", 69.723), el("Ge", 72.64),
    el("As", 74.9216), el("Se", 78.96), el("Br", 79.904), el("Kr", 83.798),
    el("Rb", 85.4678), el("Sr", 87.62), el("Y", 88.9059), el("Zr", 91.224),
    el("Nb", 92.9064), el("Mo", 95.94), el("Tc", 98.0), el("Ru", 101.07),
    el("Rh", 102.906), el("Pd", 106.42), el("Ag", 107.868), el("I", 126.904),
    el("Xe", 131.293), el("Ir", 192.217), el("Pt", 195.084), el("Au", 196.967),
    el("Hg", 200.59),
];

fn atomic_mass(symbol: &str) -> Option<f64> {
    ELEMENTS
        .iter()
        .find(|e| e.name == symbol)
        .map(|e| e.atomic_mass)
}

fn filter_phases_marks(formula: &str) -> String {
    let mut formula = formula.replace(' ', "");
    for phase in ["(C)", "(c)", "(L)", "(l)", "(G)", "(g)", "(S)", "(s)"] {
        formula = formula.replace(phase, "");
    }
    formula
}

fn read_number(chars: &[char], i: &mut usize) -> usize {
    let start = *i;
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
    }
    if start == *i {
        1
    } else {
        chars[start..*i]
            .iter()
            .collect::<String>()
            .parse()
            .unwrap_or(1)
    }
}

/// Parses a formula such as `Ca(NO3)2` into element counts. Nested brackets are allowed.
pub fn parse_formula(formula: &str) -> Result<HashMap<String, usize>, KineticsError> {
    let cleaned = filter_phases_marks(formula);
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.is_empty() {
        return Err(KineticsError::parse(formula, "empty formula"));
    }
    // one map per open bracket
    let mut stack: Vec<HashMap<String, usize>> = vec![HashMap::new()];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '(' || c == '[' {
            stack.push(HashMap::new());
            i += 1;
        } else if c == ')' || c == ']' {
            i += 1;
            let multiplier = read_number(&chars, &mut i);
            let group = stack
                .pop()
                .filter(|_| !stack.is_empty())
                .ok_or_else(|| KineticsError::parse(formula, "unbalanced brackets"))?;
            let top = stack
                .last_mut()
                .ok_or_else(|| KineticsError::parse(formula, "unbalanced brackets"))?;
            for (element, count) in group {
                *top.entry(element).or_insert(0) += count * multiplier;
            }
        } else if c.is_ascii_uppercase() {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            let mut symbol: String = chars[start..i].iter().collect();
            // "Cx" with unknown x: fall back to the one-letter element
            if atomic_mass(&symbol).is_none() && symbol.len() > 1 {
                i = start + 1;
                symbol = chars[start].to_string();
            }
            if atomic_mass(&symbol).is_none() {
                return Err(KineticsError::parse(
                    formula,
                    format!("unknown element {}", symbol),
                ));
            }
            let count = read_number(&chars, &mut i);
            if let Some(top) = stack.last_mut() {
                *top.entry(symbol).or_insert(0) += count;
            }
        } else {
            return Err(KineticsError::parse(
                formula,
                format!("unexpected character '{}'", c),
            ));
        }
    }
    if stack.len() != 1 {
        return Err(KineticsError::parse(formula, "unbalanced brackets"));
    }
    Ok(stack.pop().unwrap_or_default())
}

/// Molar mass (g/mol, numerically equal to the molecular mass in amu) and composition.
pub fn calculate_molar_mass(formula: &str) -> Result<(f64, HashMap<String, usize>), KineticsError> {
    let counts = parse_formula(formula)?;
    let mut molar_mass = 0.0;
    for (element, count) in counts.iter() {
        // every key was checked by the parser
        molar_mass += atomic_mass(element).unwrap_or(0.0) * *count as f64;
    }
    Ok((molar_mass, counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formula() {
        let expected = HashMap::from([("C".to_string(), 1), ("O".to_string(), 2)]);
        assert_eq!(parse_formula("CO2").unwrap(), expected);

        let expected = HashMap::from([
            ("Na".to_string(), 1),
            ("N".to_string(), 2),
            ("O".to_string(), 6),
        ]);
        assert_eq!(parse_formula("Na(NO3)2").unwrap(), expected);

        let expected = HashMap::from([("H".to_string(), 2), ("O".to_string(), 1)]);
        assert_eq!(parse_formula("H2O(g)").unwrap(), expected);

        let expected = HashMap::from([
            ("C".to_string(), 1),
            ("H".to_string(), 6),
            ("O".to_string(), 2),
        ]);
        assert_eq!(parse_formula("C(H3(O))2").unwrap(), expected);
    }

    #[test]
    fn test_co_is_not_cobalt() {
        let counts = parse_formula("CO").unwrap();
        assert_eq!(counts.get("C"), Some(&1));
        assert_eq!(counts.get("O"), Some(&1));
        let counts = parse_formula("Co").unwrap();
        assert_eq!(counts.get("Co"), Some(&1));
    }

    #[test]
    fn test_calculate_molar_mass() {
        let (mass, _) = calculate_molar_mass("CO").unwrap();
        assert!((mass - 28.01).abs() < 1e-2);
        let (mass, _) = calculate_molar_mass("O2").unwrap();
        assert!((mass - 31.998).abs() < 1e-3);
        let (mass, _) = calculate_molar_mass("Ca(NO3)2").unwrap();
        assert!((mass - 164.093).abs() < 1e-2);
    }

    #[test]
    fn test_malformed_formulae() {
        assert!(parse_formula("").is_err());
        assert!(parse_formula("Na(NO3").is_err());
        assert!(parse_formula("NO3)2").is_err());
        assert!(parse_formula("Qq").is_err());
        assert!(parse_formula("CO-O").is_err());
    }
}
