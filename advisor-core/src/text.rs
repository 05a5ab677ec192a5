//! Small string helpers shared by chunk builders and prompts.

/// Lowercase ASCII slug: non-ASCII dropped, other non-alphanumeric runs
/// collapsed to `-`, no leading or trailing `-`.
pub(crate) fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Formats a dollar amount with thousands separators, e.g. `$1,500,000`.
pub(crate) fn format_usd(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{}", rounded.abs() as u64);

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bulleted list, one `- item` per line.
pub(crate) fn bullet_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns `value` unless it is blank, in which case `fallback`.
pub(crate) fn or_default<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("S/4HANA Cloud"), "s-4hana-cloud");
        assert_eq!(slugify("  --Ariba (Procurement)-- "), "ariba-procurement");
        assert_eq!(slugify("Société Générale"), "socit-gnrale");
        assert_eq!(slugify("Q3 report.pdf"), "q3-report-pdf");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.0), "$999");
        assert_eq!(format_usd(1000.0), "$1,000");
        assert_eq!(format_usd(1_500_000.4), "$1,500,000");
        assert_eq!(format_usd(-25_000.0), "-$25,000");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(91.000_002_6), 91.0);
        assert_eq!(round2(66.666_666), 66.67);
    }

    #[test]
    fn test_or_default() {
        assert_eq!(or_default(Some("  "), "fallback"), "fallback");
        assert_eq!(or_default(None, "fallback"), "fallback");
        assert_eq!(or_default(Some(" SAP ECC "), "fallback"), "SAP ECC");
    }
}
