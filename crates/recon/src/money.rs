//! Integer cent amounts.
//!
//! Statement payouts and ledger expectations are held as `i64` cents end to
//! end. Floats appear only at the serialization boundary, where report
//! consumers want directly renderable dollar values.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

use serde::{Serialize, Serializer};

/// A money amount in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(pub i64);

impl Money {
    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn abs(self) -> Money {
        Money(self.0.abs())
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|m| m.0).sum())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.dollars())
    }
}

impl fmt::Display for Money {
    /// `$626.00`, `-$12.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// Parse a money string into cents without going through floats.
///
/// Accepts an optional `$` prefix, thousands separators, a leading minus and
/// at most two decimal places: `"1,080.47"` is 108047, `"$10.5"` is 1050.
pub fn parse_money(s: &str) -> Result<Money, String> {
    let cleaned: String = s.chars().filter(|c| *c != '$' && *c != ',').collect();
    let s = cleaned.trim();
    if s.is_empty() {
        return Err("empty amount".to_string());
    }

    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (dollars_str, cents_str) = match s.find('.') {
        Some(pos) => (&s[..pos], &s[pos + 1..]),
        None => (s, ""),
    };

    let dollars: i64 = if dollars_str.is_empty() {
        0
    } else {
        dollars_str
            .parse()
            .map_err(|_| format!("invalid amount: {s}"))?
    };

    let cents: i64 = match cents_str.len() {
        0 => 0,
        1 => {
            let d: i64 = cents_str
                .parse()
                .map_err(|_| format!("invalid amount: {s}"))?;
            d * 10
        }
        2 => cents_str
            .parse()
            .map_err(|_| format!("invalid amount: {s}"))?,
        _ => return Err(format!("too many decimal places: {s}")),
    };

    let total = dollars * 100 + cents;
    Ok(Money(if negative { -total } else { total }))
}
