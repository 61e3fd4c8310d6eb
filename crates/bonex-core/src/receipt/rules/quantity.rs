//! Orphan quantity continuation markers folded into the following item.
//!
//! Some receipt layouts print the multiplier on its own line ("2 x") with
//! the priced item on the next one. Those marker lines survive item
//! parsing as items whose name is just the marker; this pass merges them.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::receipt::LineItem;

use super::amounts::round2;
use super::patterns::MARKER_NAME;

/// Merges orphan "N x" marker items into their successors.
pub struct QuantityContinuationMerger {
    tolerance: Decimal,
}

impl QuantityContinuationMerger {
    pub fn new(tolerance: Decimal) -> Self {
        Self { tolerance }
    }

    /// Single forward scan with one-item lookahead, run once per receipt
    /// after collection completes.
    ///
    /// A marker merges when the successor's total equals
    /// `marker.quantity * marker.unit_price` within tolerance: the
    /// successor takes the marker's quantity and unit price (its own
    /// total is kept) and the marker is removed. Markers that cannot be
    /// merged stay in the list; their names are returned so the caller
    /// can flag them for review.
    pub fn merge(&self, items: &mut Vec<LineItem>) -> Vec<String> {
        let mut unmerged = Vec::new();
        let mut i = 0;
        while i < items.len() {
            let Some(quantity) = marker_quantity(&items[i].name) else {
                i += 1;
                continue;
            };

            let mut merged = false;
            if i + 1 < items.len() {
                let unit_price = items[i].unit_price;
                let expected = round2(quantity * unit_price);
                let actual = round2(items[i + 1].total_price);
                if (expected - actual).abs() <= self.tolerance {
                    items[i + 1].quantity = quantity;
                    items[i + 1].unit_price = unit_price;
                    merged = true;
                }
            }

            if merged {
                // The merged successor now occupies this slot; re-check it.
                items.remove(i);
            } else {
                debug!("Continuation marker left unmerged: {:?}", items[i].name);
                unmerged.push(items[i].name.clone());
                i += 1;
            }
        }
        unmerged
    }
}

/// Parse an item name that is exactly an integer plus the multiplier
/// token (e.g. "2 X") into its quantity.
fn marker_quantity(name: &str) -> Option<Decimal> {
    MARKER_NAME
        .captures(name.trim())
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .map(Decimal::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(name: &str, quantity: &str, unit_price: &str, total_price: &str) -> LineItem {
        LineItem {
            name: name.to_string(),
            quantity: d(quantity),
            unit_price: d(unit_price),
            total_price: d(total_price),
        }
    }

    fn merger() -> QuantityContinuationMerger {
        QuantityContinuationMerger::new(d("0.01"))
    }

    #[test]
    fn test_merges_marker_into_next_item() {
        let mut items = vec![
            item("2 X", "1", "0.59", "0.59"),
            item("Pizza", "1", "1.18", "1.18"),
        ];

        let unmerged = merger().merge(&mut items);

        assert!(unmerged.is_empty());
        assert_eq!(items, vec![item("Pizza", "2", "0.59", "1.18")]);
    }

    #[test]
    fn test_marker_without_successor_is_kept() {
        let mut items = vec![item("4 X", "1", "0.59", "0.59")];

        let unmerged = merger().merge(&mut items);

        assert_eq!(unmerged, vec!["4 X".to_string()]);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_marker_with_mismatched_total_is_kept() {
        let mut items = vec![
            item("2 X", "1", "0.59", "0.59"),
            item("Pizza", "1", "2.49", "2.49"),
        ];

        let unmerged = merger().merge(&mut items);

        assert_eq!(unmerged, vec!["2 X".to_string()]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].quantity, d("1"));
    }

    #[test]
    fn test_non_marker_names_untouched() {
        let mut items = vec![
            item("Banana", "2", "1.99", "3.98"),
            item("Moehren 2x Bund", "1", "1.58", "1.58"),
        ];

        let unmerged = merger().merge(&mut items);

        assert!(unmerged.is_empty());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_marker_quantity() {
        assert_eq!(marker_quantity("2 X"), Some(d("2")));
        assert_eq!(marker_quantity("19 x"), Some(d("19")));
        assert_eq!(marker_quantity("Pizza"), None);
        assert_eq!(marker_quantity("2 x Pizza"), None);
    }
}
