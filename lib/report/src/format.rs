//! Cell formatting shared by the textual reports.

/// Rendered in place of undefined values.
pub const PLACEHOLDER: &str = "--";

/// Formats `value` with `decimals` digits after the decimal point.
pub fn fixed(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        PLACEHOLDER.to_owned()
    }
}

/// Formats a ratio as a percentage with two decimals.
pub fn percent(ratio: f64) -> String {
    fixed(ratio * 100.0, 2)
}

/// Formats a duration in seconds as `HH:MM`, rounded to the nearest minute.
pub fn hours_minutes(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return PLACEHOLDER.to_owned();
    }
    let minutes = (seconds / 60.0).round() as u64;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Escapes characters with a special meaning in LaTeX text.
pub fn escape_latex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            '\\' => escaped.push_str(r"\textbackslash{}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_values_are_placeholders() {
        assert_eq!(fixed(f64::NAN, 2), "--");
        assert_eq!(fixed(f64::INFINITY, 2), "--");
        assert_eq!(percent(f64::NAN), "--");
        assert_eq!(hours_minutes(f64::NAN), "--");
    }

    #[test]
    fn fixed_and_percent() {
        assert_eq!(fixed(1.0 / 3.0, 2), "0.33");
        assert_eq!(percent(0.125), "12.50");
    }

    #[test]
    fn hours_and_minutes() {
        assert_eq!(hours_minutes(0.0), "00:00");
        assert_eq!(hours_minutes(29.0), "00:00");
        assert_eq!(hours_minutes(90.0), "00:02");
        assert_eq!(hours_minutes(3725.0), "01:02");
        assert_eq!(hours_minutes(36_000.0), "10:00");
    }

    #[test]
    fn latex_escaping() {
        assert_eq!(escape_latex("fluid_animate"), r"fluid\_animate");
        assert_eq!(escape_latex("50% & more"), r"50\% \& more");
        assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
    }
}
