//! Display formatting for rates, prices and converted amounts.

use itertools::Itertools;

fn group_thousands(value: f64, decimals: usize, separator: char) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.find('.') {
        Some(dot) => formatted.split_at(dot),
        None => (formatted.as_str(), ""),
    };
    let digits: Vec<char> = int_part.chars().collect();
    let grouped = digits
        .rchunks(3)
        .rev()
        .map(|chunk| chunk.iter().collect::<String>())
        .join(&separator.to_string());
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, grouped, frac_part)
}

/// Precision for "1 X = n BASE" lines in rate tables.
pub fn format_rate(rate: f64) -> String {
    let decimals = if rate < 0.01 {
        6
    } else if rate < 1.0 {
        4
    } else if rate < 10.0 {
        3
    } else if rate < 100.0 {
        2
    } else if rate < 1000.0 {
        1
    } else {
        0
    };
    format!("{:.*}", decimals, rate)
}

/// USD price of a listed asset.
pub fn format_price(price: f64) -> String {
    if price < 0.0001 {
        format!("${:.8}", price)
    } else if price < 0.01 {
        format!("${:.6}", price)
    } else if price < 1.0 {
        format!("${:.4}", price)
    } else if price < 100.0 {
        format!("${:.2}", price)
    } else if price < 10000.0 {
        format!("${}", group_thousands(price, 2, ','))
    } else {
        format!("${}", group_thousands(price, 0, ','))
    }
}

/// Result of a conversion.
pub fn format_amount(amount: f64) -> String {
    if amount < 0.01 {
        format!("{:.8}", amount)
    } else if amount < 1.0 {
        format!("{:.6}", amount)
    } else if amount < 1000.0 {
        format!("{:.2}", amount)
    } else {
        group_thousands(amount, 2, ' ')
    }
}

pub fn format_change(change: f64) -> String {
    format!("{:+.2}%", change)
}
