use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

static LINE_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

/// The marker that opens the price portion of a product block's text.
const CURRENCY_MARKER: &str = "R$";
/// Unit label that trails product names on both sites.
const UNIT_MARKER: &str = "Unidade";

/// Remove line breaks only; all other whitespace is left as scraped.
pub fn strip_newlines(text: &str) -> String {
    LINE_BREAK_RE.replace_all(text, "").into_owned()
}

/// Cut the raw product text at the first currency marker, else at the first
/// unit label, else return it unchanged. The currency marker wins when both
/// occur. This is a heuristic over how the sites lay their text out, not a
/// guaranteed-correct parse.
pub fn truncate_at_marker(text: &str) -> &str {
    if let Some(i) = text.find(CURRENCY_MARKER) {
        &text[..i]
    } else if let Some(i) = text.find(UNIT_MARKER) {
        &text[..i]
    } else {
        text
    }
}

/// Reduce raw price text like " Por: R$ 12,90 " to a number.
///
/// Strips the currency marker and the "Por"/":" labels, removes remaining
/// whitespace, converts the decimal comma, then parses. Anything that does
/// not reduce to a non-negative number is a hard error; a garbage price must
/// never reach the catalog.
pub fn parse_price(text: &str) -> Result<f64, Error> {
    let cleaned = text
        .trim()
        .replace(CURRENCY_MARKER, "")
        .replace("Por", "")
        .replace(':', "");
    let cleaned = WHITESPACE_RE.replace_all(&cleaned, "").replace(',', ".");

    let value: f64 = cleaned.parse().map_err(|_| Error::PriceParse {
        text: text.to_string(),
    })?;
    if !value.is_finite() || value < 0.0 {
        return Err(Error::PriceParse {
            text: text.to_string(),
        });
    }
    Ok(value)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_all_line_breaks() {
        assert_eq!(strip_newlines("Maçã\nGala\r\nUnidade"), "MaçãGalaUnidade");
        assert_eq!(strip_newlines("sem quebra"), "sem quebra");
    }

    #[test]
    fn truncates_before_unit_label() {
        assert_eq!(truncate_at_marker("Maçã Gala Unidade"), "Maçã Gala ");
        assert_eq!(truncate_at_marker("Banana Prata Unidade"), "Banana Prata ");
    }

    #[test]
    fn currency_marker_wins_over_unit_label() {
        assert_eq!(truncate_at_marker("Tomate Unidade R$ 4,99"), "Tomate Unidade ");
        assert_eq!(truncate_at_marker("Alface R$ 2,50 Unidade"), "Alface ");
    }

    #[test]
    fn unmarked_text_passes_through() {
        assert_eq!(truncate_at_marker("Cebola Roxa kg"), "Cebola Roxa kg");
        assert_eq!(truncate_at_marker(""), "");
    }

    #[test]
    fn parses_labelled_comma_price() {
        assert_eq!(parse_price(" Por: R$ 12,90 ").unwrap(), 12.90);
        assert_eq!(parse_price("Por: R$ 3,50").unwrap(), 3.50);
        assert_eq!(parse_price("R$ 140").unwrap(), 140.0);
    }

    #[test]
    fn parses_price_split_across_lines() {
        assert_eq!(parse_price(&strip_newlines("\n  Por:\n  R$ 2,20\n")).unwrap(), 2.20);
    }

    #[test]
    fn rejects_garbage_price_text() {
        assert!(parse_price("Consulte a loja").is_err());
        assert!(parse_price("").is_err());
        assert!(parse_price("R$ 12,90,00").is_err());
    }

    #[test]
    fn rejects_negative_price() {
        assert!(parse_price("R$ -3,50").is_err());
    }
}
