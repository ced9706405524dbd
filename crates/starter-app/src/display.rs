//! Formatting helpers for what the page shows.

use chain_sol::Pubkey;

const SHORT_ADDRESS_EDGE: usize = 10;

/// First and last ten characters of the Base58 address.
pub fn short_address(pubkey: &Pubkey) -> String {
    let full = pubkey.to_string();
    if full.len() <= SHORT_ADDRESS_EDGE * 2 {
        return full;
    }
    format!(
        "{}...{}",
        &full[..SHORT_ADDRESS_EDGE],
        &full[full.len() - SHORT_ADDRESS_EDGE..]
    )
}

/// SOL with four decimals, or `Loading...` while unknown.
pub fn format_sol(balance: Option<f64>) -> String {
    match balance {
        Some(sol) => format!("{sol:.4} SOL"),
        None => "Loading...".to_string(),
    }
}

pub fn format_token_amount(amount: Option<f64>) -> String {
    match amount {
        Some(tokens) => format!("{tokens}"),
        None => "-".to_string(),
    }
}
