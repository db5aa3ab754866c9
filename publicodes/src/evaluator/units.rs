//! Unit conversion and simplification
//!
//! Only time units convert between each other. Every other factor (`€`,
//! `enfant`, ...) is an opaque dimension that must match exactly.

use crate::semantic::Unit;
use crate::{PublicodesError, PublicodesResult};
use rust_decimal::Decimal;

/// Size of each time unit, in twelfths of a day
///
/// Integers so that `an = 12 mois = 4 trimestres = 365 jours` holds exactly.
fn time_size(factor: &str) -> Option<i64> {
    match factor {
        "jour" | "jours" => Some(12),
        "semaine" | "semaines" => Some(84),
        "mois" => Some(365),
        "trimestre" | "trimestres" => Some(1095),
        "an" | "ans" | "année" | "années" => Some(4380),
        _ => None,
    }
}

const TIME_DIMENSION: &str = "temps";

/// A rational factor applied to a value when its unit is rewritten
///
/// Kept as numerator and denominator so that the division happens last and
/// `12000 €/an` becomes exactly `1000 €/mois`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ratio {
    pub numerator: Decimal,
    pub denominator: Decimal,
}

impl Ratio {
    pub const ONE: Ratio = Ratio {
        numerator: Decimal::ONE,
        denominator: Decimal::ONE,
    };

    pub fn apply(&self, value: Decimal) -> PublicodesResult<Decimal> {
        if self.numerator == self.denominator {
            return Ok(value);
        }
        value
            .checked_mul(self.numerator)
            .and_then(|scaled| scaled.checked_div(self.denominator))
            .ok_or_else(overflow)
    }

    fn scale(&mut self, numerator: i64, denominator: i64) -> PublicodesResult<()> {
        self.numerator = checked_product(self.numerator, numerator)?;
        self.denominator = checked_product(self.denominator, denominator)?;
        Ok(())
    }
}

fn checked_product(acc: Decimal, size: i64) -> PublicodesResult<Decimal> {
    acc.checked_mul(Decimal::from(size)).ok_or_else(overflow)
}

fn overflow() -> PublicodesError {
    PublicodesError::Runtime("Numeric overflow in unit conversion".to_string())
}

/// The unit with every time factor replaced by a common dimension
fn dimension(unit: &Unit) -> Option<Unit> {
    let map = |factors: &[String]| -> Vec<String> {
        factors
            .iter()
            .map(|factor| match time_size(factor) {
                Some(_) => TIME_DIMENSION.to_string(),
                None => factor.clone(),
            })
            .collect()
    };
    Unit::new(map(&unit.numerators), map(&unit.denominators))
}

/// Product of the time sizes of some factors (1 when there are none)
fn time_product(factors: &[String]) -> PublicodesResult<Decimal> {
    factors
        .iter()
        .filter_map(|factor| time_size(factor))
        .try_fold(Decimal::ONE, checked_product)
}

pub fn are_compatible(from: &Unit, to: &Unit) -> bool {
    from == to || dimension(from) == dimension(to)
}

/// Convert a value between units
///
/// A value without unit adopts the target unit, and a target without unit
/// keeps the value unchanged.
pub fn convert(value: Decimal, from: Option<&Unit>, to: Option<&Unit>) -> PublicodesResult<Decimal> {
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) if from != to => (from, to),
        _ => return Ok(value),
    };

    if !are_compatible(from, to) {
        return Err(PublicodesError::Runtime(format!(
            "Cannot convert from '{}' to '{}'",
            from, to
        )));
    }

    let ratio = Ratio {
        numerator: time_product(&from.numerators)?
            .checked_mul(time_product(&to.denominators)?)
            .ok_or_else(overflow)?,
        denominator: time_product(&from.denominators)?
            .checked_mul(time_product(&to.numerators)?)
            .ok_or_else(overflow)?,
    };
    ratio.apply(value)
}

/// Combine units for a product, cancelling time units found on both sides
///
/// `€/an * mois` gives `€` with a ratio of 1/12.
pub fn multiply(
    left: Option<&Unit>,
    right: Option<&Unit>,
) -> PublicodesResult<(Ratio, Option<Unit>)> {
    let mut numerators = Vec::new();
    let mut denominators = Vec::new();
    for unit in [left, right].into_iter().flatten() {
        numerators.extend(unit.numerators.iter().cloned());
        denominators.extend(unit.denominators.iter().cloned());
    }
    simplify(numerators, denominators)
}

/// Combine units for a quotient
pub fn divide(
    left: Option<&Unit>,
    right: Option<&Unit>,
) -> PublicodesResult<(Ratio, Option<Unit>)> {
    let mut numerators = Vec::new();
    let mut denominators = Vec::new();
    if let Some(unit) = left {
        numerators.extend(unit.numerators.iter().cloned());
        denominators.extend(unit.denominators.iter().cloned());
    }
    if let Some(unit) = right {
        numerators.extend(unit.denominators.iter().cloned());
        denominators.extend(unit.numerators.iter().cloned());
    }
    simplify(numerators, denominators)
}

fn simplify(
    mut numerators: Vec<String>,
    mut denominators: Vec<String>,
) -> PublicodesResult<(Ratio, Option<Unit>)> {
    let mut ratio = Ratio::ONE;

    // Identical factors cancel in Unit::new; pair off the remaining time units.
    loop {
        let time_num = numerators
            .iter()
            .position(|n| time_size(n).is_some() && !denominators.contains(n));
        let time_den = denominators
            .iter()
            .position(|d| time_size(d).is_some() && !numerators.contains(d));
        let (Some(n), Some(d)) = (time_num, time_den) else {
            break;
        };
        let num = numerators.remove(n);
        let den = denominators.remove(d);
        if let (Some(num_size), Some(den_size)) = (time_size(&num), time_size(&den)) {
            ratio.scale(num_size, den_size)?;
        }
    }

    Ok((ratio, Unit::new(numerators, denominators)))
}
