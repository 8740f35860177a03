/// Format a monetary amount with its currency code and thousands
/// separators, e.g. `EUR 500,000`. Whole amounts drop the decimals;
/// fractional ones keep two.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let whole = amount.trunc() as i64;
    let fraction = (amount.fract().abs() * 100.0).round() as u32;

    if fraction == 0 {
        format!("{} {}", currency, group_thousands(whole))
    } else {
        format!("{} {}.{:02}", currency, group_thousands(whole), fraction)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
