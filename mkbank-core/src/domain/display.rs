//! Derived display values for the dashboard

use rust_decimal::{Decimal, RoundingStrategy};

/// Length of a well-formed account number
pub const ACCOUNT_NUMBER_LEN: usize = 16;

/// Number of trailing digits left visible by [`mask_account_number`]
pub const VISIBLE_DIGITS: usize = 6;

/// Replaces the hidden leading digits
pub const ACCOUNT_MASK: &str = "XXXXXXXXXX";

/// Shown when no account number is known
pub const ACCOUNT_PLACEHOLDER: &str = "N/A";

/// Mask an account number for display.
///
/// Only a value of exactly 16 characters is masked. Any other non-empty value
/// is returned unchanged; an absent or empty one becomes the placeholder.
pub fn mask_account_number(account_number: Option<&str>) -> String {
    match account_number {
        Some(raw) if raw.chars().count() == ACCOUNT_NUMBER_LEN => {
            let tail: String = raw.chars().skip(ACCOUNT_NUMBER_LEN - VISIBLE_DIGITS).collect();
            format!("{}{}", ACCOUNT_MASK, tail)
        }
        Some(raw) if !raw.is_empty() => raw.to_string(),
        _ => ACCOUNT_PLACEHOLDER.to_string(),
    }
}

/// Format a balance with exactly two decimal places, rounding half away from zero
pub fn format_balance(balance: Decimal) -> String {
    let mut rounded = balance.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}
