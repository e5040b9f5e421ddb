//! Locale-aware currency formatting.
//!
//! Covers the handful of locales the client is deployed with. Unknown locales
//! fall back to `en-US` conventions and unknown currencies are shown by their
//! ISO code.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "en-KE";
/// Currency used when none is configured.
pub const DEFAULT_CURRENCY: &str = "KES";

const NBSP: char = '\u{a0}';
const NARROW_NBSP: &str = "\u{202f}";

/// A locale and currency pair used to format every amount on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    /// BCP 47 locale tag, e.g. `en-KE`.
    pub locale: String,
    /// ISO 4217 currency code, e.g. `KES`.
    pub currency: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::new(DEFAULT_LOCALE, DEFAULT_CURRENCY)
    }
}

impl CurrencyFormat {
    /// Create a new format.
    #[must_use]
    pub fn new(locale: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            currency: currency.into(),
        }
    }

    /// Format an amount with this locale and currency.
    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        format_currency(amount, &self.locale, &self.currency)
    }
}

/// Separators and symbol placement for a locale.
#[derive(Debug, Clone, Copy)]
struct LocaleRules {
    group: &'static str,
    decimal: &'static str,
    symbol_first: bool,
}

const EN: LocaleRules = LocaleRules {
    group: ",",
    decimal: ".",
    symbol_first: true,
};

fn locale_rules(locale: &str) -> LocaleRules {
    match language(locale).as_str() {
        "de" => LocaleRules {
            group: ".",
            decimal: ",",
            symbol_first: false,
        },
        "fr" => LocaleRules {
            group: NARROW_NBSP,
            decimal: ",",
            symbol_first: false,
        },
        _ => EN,
    }
}

fn language(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

fn normalize_locale(locale: &str) -> String {
    let mut parts = locale.split(['-', '_']);
    let lang = parts.next().unwrap_or_default().to_ascii_lowercase();
    match parts.next() {
        Some(region) => format!("{lang}-{}", region.to_ascii_uppercase()),
        None => lang,
    }
}

fn currency_symbol(locale: &str, currency: &str) -> String {
    let symbol = match (normalize_locale(locale).as_str(), currency) {
        ("en-KE", "KES") => "Ksh",
        ("en-US" | "en" | "de-DE", "USD") => "$",
        ("fr-FR", "USD") => "$US",
        (_, "USD") if language(locale) == "en" => "US$",
        ("fr-FR", "GBP") => "£GB",
        (_, "GBP") => "£",
        (_, "EUR") => "€",
        ("en-US" | "en" | "de-DE", "JPY") => "¥",
        _ => return currency.to_string(),
    };
    symbol.to_string()
}

fn fraction_digits(currency: &str) -> u32 {
    match currency {
        "JPY" | "KRW" | "UGX" | "RWF" => 0,
        _ => 2,
    }
}

fn group_digits(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// Format `amount` as money in `currency` following `locale` conventions.
///
/// # Examples
///
/// ```
/// use loandesk_core::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1500), "en-KE", "KES"), "Ksh\u{a0}1,500.00");
/// assert_eq!(format_currency(dec!(1500), "en-US", "USD"), "$1,500.00");
/// assert_eq!(format_currency(dec!(1500), "de-DE", "EUR"), "1.500,00\u{a0}€");
/// ```
#[must_use]
pub fn format_currency(amount: Decimal, locale: &str, currency: &str) -> String {
    let currency = currency.to_ascii_uppercase();
    let rules = locale_rules(locale);
    let digits = fraction_digits(&currency);

    let rounded = amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let plain = format!("{:.*}", digits as usize, rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), ""));

    let mut number = group_digits(int_part, rules.group);
    if !frac_part.is_empty() {
        number.push_str(rules.decimal);
        number.push_str(frac_part);
    }

    let symbol = currency_symbol(locale, &currency);
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if rules.symbol_first {
        out.push_str(&symbol);
        // Letters next to digits get a separating space, sign-like symbols do not.
        if symbol.chars().last().is_some_and(char::is_alphabetic) {
            out.push(NBSP);
        }
        out.push_str(&number);
    } else {
        out.push_str(&number);
        out.push(NBSP);
        out.push_str(&symbol);
    }
    out
}
