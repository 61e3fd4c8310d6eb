//! Weight-based pricing continuation lines.

use tracing::debug;

use crate::models::receipt::LineItem;

use super::amounts::{parse_comma_decimal, round2};
use super::patterns::KILO_LINE;

/// Detects `<weight> kg x <price> /kg` lines and applies the weight
/// pricing to the most recently collected item. Such a line never creates
/// an item of its own; it has no name.
pub struct KiloLineEnricher;

impl KiloLineEnricher {
    pub fn new() -> Self {
        Self
    }

    /// Whether the line is a weight-based pricing continuation.
    pub fn matches(&self, line: &str) -> bool {
        KILO_LINE.is_match(line)
    }

    /// Overwrite the last item's quantity (weight), unit price (per kg)
    /// and total price. The item's name is untouched. Returns `false` when
    /// there is no prior item or a numeric token does not parse; the line
    /// is then dropped as an anomaly.
    pub fn enrich(&self, line: &str, items: &mut [LineItem]) -> bool {
        let Some(caps) = KILO_LINE.captures(line) else {
            return false;
        };
        let (Some(weight), Some(kg_price)) =
            (parse_comma_decimal(&caps[1]), parse_comma_decimal(&caps[2]))
        else {
            return false;
        };
        let Some(last) = items.last_mut() else {
            debug!("Kilo line with no prior item dropped: {:?}", line);
            return false;
        };

        last.quantity = weight;
        last.unit_price = kg_price;
        last.total_price = round2(weight * kg_price);
        true
    }
}

impl Default for KiloLineEnricher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_matches() {
        let enricher = KiloLineEnricher::new();
        for (line, expected) in [
            ("0,480 kg x 2,99 /kg", true),
            ("1,200 kg x 3,49 /kg", true),
            ("500 g x 1,99 /kg", false),
            ("Banana 1,99 x 2", false),
            ("Apple 3,50 €", false),
        ] {
            assert_eq!(enricher.matches(line), expected, "line: {line}");
        }
    }

    #[test]
    fn test_enrich_overwrites_last_item() {
        let enricher = KiloLineEnricher::new();
        let mut items = vec![LineItem {
            name: "Tomato".to_string(),
            quantity: Decimal::ONE,
            unit_price: Decimal::ZERO,
            total_price: Decimal::ZERO,
        }];

        assert!(enricher.enrich("0,480 kg x 2,99 /kg", &mut items));

        let last = items.last().unwrap();
        assert_eq!(last.name, "Tomato");
        assert_eq!(last.quantity, d("0.480"));
        assert_eq!(last.unit_price, d("2.99"));
        assert_eq!(last.total_price, d("1.44"));
    }

    #[test]
    fn test_enrich_without_prior_item_is_noop() {
        let enricher = KiloLineEnricher::new();
        let mut items: Vec<LineItem> = Vec::new();
        assert!(!enricher.enrich("0,480 kg x 2,99 /kg", &mut items));
        assert!(items.is_empty());
    }
}
