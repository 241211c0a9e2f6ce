//! Locale-independent rendering of totals.
//!
//! The integer part is grouped by thousands with a single ASCII space and the
//! fraction always has two digits: `-1 234 567.05`.

use rust_decimal::Decimal;

use crate::currency::{DISPLAY_DECIMAL_PLACES, round_for_display};

const GROUP_SEPARATOR: char = ' ';

/// Renders a value rounded to 2 fraction digits, without grouping.
#[must_use]
pub fn format_plain(value: Decimal) -> String {
    let (negative, digits) = display_digits(value);
    if negative {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Renders a value rounded to 2 fraction digits, grouping thousands with spaces.
#[must_use]
pub fn format_grouped(value: Decimal) -> String {
    let (negative, digits) = display_digits(value);
    let (integer, fraction) = digits
        .split_once('.')
        .unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3 + 4);
    if negative {
        grouped.push('-');
    }
    let len = integer.len();
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped.push('.');
    grouped.push_str(fraction);
    grouped
}

/// Rounds and returns the sign plus the unsigned `digits.dd` text.
fn display_digits(value: Decimal) -> (bool, String) {
    let mut rounded = round_for_display(value);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded.set_sign_positive(true);
    rounded.rescale(DISPLAY_DECIMAL_PLACES);
    (negative, rounded.to_string())
}
