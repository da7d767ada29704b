//! Currency formatting

/// Display prefix for an ISO currency code
pub fn currency_symbol(currency: &str) -> String {
    let symbol = match currency {
        "GBP" => "£",
        "USD" => "$",
        "EUR" => "€",
        "CAD" => "CA$",
        "AUD" => "A$",
        "JPY" => "¥",
        "CHF" => "CHF ",
        "SEK" | "NOK" | "DKK" => "kr ",
        "INR" => "₹",
        "BRL" => "R$",
        "ZAR" => "R ",
        other => return format!("{other} "),
    };
    symbol.to_string()
}

/// Format an amount with its currency symbol
pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{}{:.2}", currency_symbol(currency), amount)
}

/// Round to two decimal places for structured output
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
