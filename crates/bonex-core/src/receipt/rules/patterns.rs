//! Fixed line-shape patterns for receipt interpretation.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Date and time as printed on the receipt, e.g. "18.02.25 17:49".
    pub static ref DATE_TIME: Regex = Regex::new(
        r"(\d{2}\.\d{2}\.\d{2})\s+(\d{2}:\d{2})"
    ).unwrap();

    /// Comma-decimal amount, e.g. "3,98" or "12".
    pub static ref AMOUNT: Regex = Regex::new(
        r"\d+(?:,\d{1,2})?"
    ).unwrap();

    /// Trailing total-price token with optional tax-code suffix, anchored
    /// at line end, e.g. "1,95 B", "0,75*B", "19,90".
    pub static ref TRAILING_TOTAL: Regex = Regex::new(
        r"(\d[\d,]*)\s*(?:\*?[A-Z]+)?$"
    ).unwrap();

    /// Quantity-multiplication shape inside an item body, located anywhere,
    /// e.g. "GURKEN 0,49 € x 4" or "Banana 1,99 EUR x 2".
    pub static ref QUANTITY_SHAPE: Regex = Regex::new(
        r"(?i)(.*?)(\d[\d,]*)\s*(?:EUR|€)?\s*x\s*(\d+)(.*)"
    ).unwrap();

    /// A line that is only an orphan multiplier marker, e.g. "4 x".
    pub static ref ORPHAN_MARKER_LINE: Regex = Regex::new(
        r"(?i)^\d+\s*x\s*$"
    ).unwrap();

    /// An item name that is an orphan multiplier marker, e.g. "2 X".
    pub static ref MARKER_NAME: Regex = Regex::new(
        r"(?i)^(\d+)\s*x$"
    ).unwrap();

    /// Weight-based pricing continuation, e.g. "0,480 kg x 2,99 /kg".
    pub static ref KILO_LINE: Regex = Regex::new(
        r"(?i)^(\d[\d,]*)\s*kg\s*x\s*(\d[\d,]*)\s*/kg"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_time_pattern() {
        let caps = DATE_TIME.captures("REWE Markt 18.02.25 17:49 Bon-Nr.").unwrap();
        assert_eq!(&caps[1], "18.02.25");
        assert_eq!(&caps[2], "17:49");
    }

    #[test]
    fn test_trailing_total_variants() {
        for (line, expected) in [
            ("Banana 1,99 B", "1,99"),
            ("Pfand 0,75*B", "0,75"),
            ("Fanta Zero 1l 1,59 AW", "1,59"),
            ("Banana 19,90", "19,90"),
        ] {
            let caps = TRAILING_TOTAL.captures(line).unwrap();
            assert_eq!(&caps[1], expected, "line: {line}");
        }
    }

    #[test]
    fn test_trailing_total_rejects_priceless_lines() {
        assert!(TRAILING_TOTAL.captures("EHL MOEHREN").is_none());
        assert!(TRAILING_TOTAL.captures("2 x").is_none());
    }

    #[test]
    fn test_orphan_marker_line() {
        assert!(ORPHAN_MARKER_LINE.is_match("4 x"));
        assert!(ORPHAN_MARKER_LINE.is_match("19 X"));
        assert!(!ORPHAN_MARKER_LINE.is_match("4 x 0,59"));
    }
}
