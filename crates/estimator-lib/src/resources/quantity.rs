//! Kubernetes quantity parsing
//!
//! Converts resource quantity strings ("250m", "1.5", "64Mi", "64M", "1e3")
//! into integers. Values are computed with exact integer arithmetic and
//! rounded up, the same way the API server reports `Value()` and
//! `MilliValue()`.

use crate::error::QuantityError;
use regex::Regex;
use std::sync::LazyLock;

/// Sign, integer digits, fractional digits, then either a suffix or an exponent
static QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-])?([0-9]*)(?:\.([0-9]*))?(?:(Ki|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E)|[eE]([+-]?[0-9]+))?$")
        .expect("quantity regex is valid")
});

/// Largest decimal exponent accepted
const MAX_EXPONENT: u32 = 30;

/// A parsed, non-negative quantity: `mantissa * numerator / denominator`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    raw: String,
    mantissa: i128,
    numerator: i128,
    denominator: i128,
}

impl Quantity {
    /// Whole units, rounded up (bytes for memory and storage)
    pub fn value(&self) -> Result<i64, QuantityError> {
        self.scaled(1)
    }

    /// Thousandths of a unit, rounded up (millicores for CPU)
    pub fn milli_value(&self) -> Result<i64, QuantityError> {
        self.scaled(1000)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn scaled(&self, factor: i128) -> Result<i64, QuantityError> {
        let overflow = || QuantityError::Overflow(self.raw.clone());
        let numerator = self
            .mantissa
            .checked_mul(factor)
            .and_then(|v| v.checked_mul(self.numerator))
            .ok_or_else(overflow)?;
        let value = numerator
            .checked_add(self.denominator - 1)
            .ok_or_else(overflow)?
            / self.denominator;
        i64::try_from(value).map_err(|_| overflow())
    }
}

/// Parse a quantity string
pub fn parse_quantity(input: &str) -> Result<Quantity, QuantityError> {
    let raw = input.trim();
    let malformed = || QuantityError::Malformed(raw.to_string());
    let overflow = || QuantityError::Overflow(raw.to_string());

    let caps = QUANTITY_REGEX.captures(raw).ok_or_else(malformed)?;
    let integer = caps.get(2).map_or("", |m| m.as_str());
    let fraction = caps.get(3).map_or("", |m| m.as_str());
    if integer.is_empty() && fraction.is_empty() {
        return Err(malformed());
    }

    let digits = format!("{}{}", integer, fraction);
    let mantissa: i128 = digits.parse().map_err(|_| overflow())?;
    if caps.get(1).map(|m| m.as_str()) == Some("-") && mantissa != 0 {
        return Err(QuantityError::Negative(raw.to_string()));
    }

    let mut numerator: i128 = 1;
    let mut denominator: i128 = pow10(fraction.len() as u32).ok_or_else(overflow)?;

    if let Some(suffix) = caps.get(4) {
        let (binary_power, decimal_exponent) = match suffix.as_str() {
            "Ki" => (1, 0),
            "Mi" => (2, 0),
            "Gi" => (3, 0),
            "Ti" => (4, 0),
            "Pi" => (5, 0),
            "Ei" => (6, 0),
            "n" => (0, -9),
            "u" => (0, -6),
            "m" => (0, -3),
            "k" => (0, 3),
            "M" => (0, 6),
            "G" => (0, 9),
            "T" => (0, 12),
            "P" => (0, 15),
            "E" => (0, 18),
            _ => return Err(malformed()),
        };
        numerator = 1024i128.pow(binary_power);
        apply_exponent(decimal_exponent, &mut numerator, &mut denominator).ok_or_else(overflow)?;
    } else if let Some(exponent) = caps.get(5) {
        let exponent: i32 = exponent.as_str().parse().map_err(|_| overflow())?;
        apply_exponent(exponent, &mut numerator, &mut denominator).ok_or_else(overflow)?;
    }

    Ok(Quantity {
        raw: raw.to_string(),
        mantissa,
        numerator,
        denominator,
    })
}

/// Parse a CPU quantity into millicores
pub fn parse_cpu_millicores(input: &str) -> Result<i64, QuantityError> {
    parse_quantity(input)?.milli_value()
}

/// Parse a memory or storage quantity into bytes
pub fn parse_bytes(input: &str) -> Result<i64, QuantityError> {
    parse_quantity(input)?.value()
}

fn apply_exponent(exponent: i32, numerator: &mut i128, denominator: &mut i128) -> Option<()> {
    if exponent.unsigned_abs() > MAX_EXPONENT {
        return None;
    }
    let factor = pow10(exponent.unsigned_abs())?;
    if exponent >= 0 {
        *numerator = numerator.checked_mul(factor)?;
    } else {
        *denominator = denominator.checked_mul(factor)?;
    }
    Some(())
}

fn pow10(exponent: u32) -> Option<i128> {
    10i128.checked_pow(exponent)
}
