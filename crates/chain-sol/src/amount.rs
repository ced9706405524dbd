//! Conversions between displayed decimal amounts and base units.

use crate::error::SolError;

/// Native decimals of SOL.
pub const SOL_DECIMALS: u8 = 9;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Parse a decimal string such as `"1.25"` into base units with `decimals`
/// fractional digits. Exact: no floating point is involved.
///
/// Rejects empty input, signs, exponents, more fractional digits than
/// `decimals`, and values that overflow `u64`. Zero is accepted; callers that
/// need a positive amount check that themselves.
pub fn parse_units(text: &str, decimals: u8) -> Result<u64, SolError> {
    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(SolError::InvalidAmount(format!("not a number: {text:?}")));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SolError::InvalidAmount(format!("not a number: {text:?}")));
    }
    if frac.len() > usize::from(decimals) {
        return Err(SolError::InvalidAmount(format!(
            "at most {decimals} decimal places allowed, got {}",
            frac.len()
        )));
    }

    let scale = 10u64
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| SolError::InvalidAmount(format!("unsupported decimals: {decimals}")))?;
    let overflow = || SolError::InvalidAmount(format!("amount too large: {text}"));

    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| overflow())?
    };
    let frac_units = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = usize::from(decimals));
        padded.parse::<u64>().map_err(|_| overflow())?
    };

    whole_units
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(overflow)
}

/// Parse a SOL amount into lamports.
pub fn sol_to_lamports(text: &str) -> Result<u64, SolError> {
    parse_units(text, SOL_DECIMALS)
}

/// Lamports as a display value in SOL.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Base units as a display value with `decimals` fractional digits.
pub fn units_to_ui_amount(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(i32::from(decimals))
}
