//! Reference currency table and display formatting.

use serde::{Deserialize, Serialize};

/// A currency in the reference table. `rate` is units per 1 USD, the pivot
/// used for all cross conversions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub rate: f64,
}

impl Currency {
    pub fn new(code: &str, name: &str, symbol: &str, rate: f64) -> Self {
        Currency {
            code: code.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            rate,
        }
    }
}

/// Built-in reference table. Configuration may replace it wholesale; the
/// USD entry must stay at 1.0 since it is the pivot.
pub fn reference_currencies() -> Vec<Currency> {
    vec![
        Currency::new("USD", "US Dollar", "$", 1.0),
        Currency::new("EUR", "Euro", "€", 0.85),
        Currency::new("GBP", "British Pound", "£", 0.73),
        Currency::new("JPY", "Japanese Yen", "¥", 110.0),
        Currency::new("CAD", "Canadian Dollar", "C$", 1.25),
        Currency::new("AUD", "Australian Dollar", "A$", 1.35),
        Currency::new("INR", "Indian Rupee", "₹", 83.12),
    ]
}

/// Formats `amount` in the style of `code`: symbol, thousands grouping and
/// two decimals for known codes. Unknown codes fall back to "<amount> <code>".
pub fn format_amount(currencies: &[Currency], amount: f64, code: &str) -> String {
    match currencies.iter().find(|c| c.code == code) {
        Some(currency) => format!("{}{}", currency.symbol, group_thousands(amount)),
        None => format!("{amount:.2} {code}"),
    }
}

fn group_thousands(amount: f64) -> String {
    let negative = amount < 0.0;
    let formatted = format!("{:.2}", amount.abs());
    let (whole, frac) = formatted.split_once('.').unwrap_or((&formatted, "00"));

    let mut grouped = String::new();
    for (i, ch) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let whole: String = grouped.chars().rev().collect();

    if negative {
        format!("-{whole}.{frac}")
    } else {
        format!("{whole}.{frac}")
    }
}
