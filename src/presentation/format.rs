pub const NOT_AVAILABLE: &str = "N/A";

/// `$12,345.68`. Missing or non-finite values render as `N/A`, or `$0.00`
/// when `default_na` is false.
pub fn format_currency(value: Option<f64>, default_na: bool) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{}${}", sign, group_thousands(&format!("{:.2}", v.abs())))
        }
        None if default_na => NOT_AVAILABLE.to_string(),
        None => "$0.00".to_string(),
    }
}

/// `25.50%`, with the same fallback rules as [`format_currency`].
pub fn format_percentage(value: Option<f64>, default_na: bool) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{:.2}%", v),
        None if default_na => NOT_AVAILABLE.to_string(),
        None => "0.00%".to_string(),
    }
}

pub fn format_price(value: Option<f64>) -> String {
    fixed(value, 2)
}

pub fn format_volatility(value: Option<f64>) -> String {
    fixed(value, 4)
}

pub fn format_flag(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn group_thousands(formatted: &str) -> String {
    let (integer, fraction) = formatted.split_once('.').unwrap_or((formatted, ""));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, fraction)
    }
}
