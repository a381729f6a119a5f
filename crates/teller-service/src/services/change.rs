//! Coin change computation.
//!
//! Amounts are converted to integer cents once, up front. The greedy loop
//! then works on whole cents so that values like `0.1 + 0.2` never leave a
//! stray fraction of a penny behind.

use crate::errors::TellerError;
use crate::models::CoinCount;

/// US coin denominations in cents, largest first.
pub const DENOMINATIONS: [(&str, u64); 4] =
    [("quarters", 25), ("dimes", 10), ("nickels", 5), ("pennies", 1)];

/// Largest accepted amount in cents. f64 represents every integer up to
/// 2^53 exactly, so cents above this would not round-trip.
const MAX_TOTAL_CENTS: u64 = 1_000_000_000_000_000;

/// Parse a decimal dollar amount into cents.
///
/// Rounds half away from zero on the decimal digits as written (`0.005` and
/// `1.005` gain a cent, `0.004` does not).
///
/// # Errors
///
/// Returns `TellerError::BadRequest` naming the raw input if it is not a
/// finite, non-negative decimal within range. `-0` counts as negative.
pub fn parse_total(raw: &str) -> Result<u64, TellerError> {
    let rejected = || {
        TellerError::BadRequest(format!(
            "Problem converting the submitted value to a decimal. Value submitted: {}",
            raw
        ))
    };

    let value: f64 = raw.trim().parse().map_err(|_| rejected())?;

    if !value.is_finite() || value.is_sign_negative() {
        return Err(rejected());
    }

    to_cents(value)
        .filter(|&cents| cents <= MAX_TOTAL_CENTS)
        .ok_or_else(rejected)
}

/// Cents from the shortest decimal form of `value`, which is what the caller
/// typed for any input of up to 17 significant digits. `None` on overflow.
fn to_cents(value: f64) -> Option<u64> {
    // f64 Display never uses exponent notation
    let repr = value.to_string();
    let (whole, fraction) = repr.split_once('.').unwrap_or((repr.as_str(), ""));

    let mut digits = fraction
        .bytes()
        .map(|b| u64::from(b.wrapping_sub(b'0')))
        .chain(std::iter::repeat(0));
    let (tenths, hundredths, thousandths) = (digits.next()?, digits.next()?, digits.next()?);

    let cents = whole
        .parse::<u64>()
        .ok()?
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths)?;

    if thousandths >= 5 {
        cents.checked_add(1)
    } else {
        Some(cents)
    }
}

/// Greedy change for `cents`, one entry per denomination including zeros.
pub fn make_change(cents: u64) -> Vec<CoinCount> {
    let mut remaining = cents;

    DENOMINATIONS
        .iter()
        .map(|&(denomination, value)| {
            let count = remaining / value;
            remaining %= value;
            CoinCount {
                denomination: denomination.to_string(),
                count,
            }
        })
        .collect()
}

/// Human-readable summary, e.g. `We can make change using 1 quarters 1 dimes 1 nickels 1 pennies`.
pub fn describe(change: &[CoinCount]) -> String {
    change.iter().fold(
        String::from("We can make change using"),
        |mut message, coin| {
            message.push_str(&format!(" {} {}", coin.count, coin.denomination));
            message
        },
    )
}
