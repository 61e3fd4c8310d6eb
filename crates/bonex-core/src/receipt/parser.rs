//! Receipt line classifier: region segmentation and per-line dispatch.

use std::time::Instant;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::ParserConfig;
use crate::models::receipt::{LineItem, ParseMetadata, Receipt};

use super::rules::amounts::{parse_comma_decimal, round2};
use super::rules::item::ItemLineParser;
use super::rules::kilo::KiloLineEnricher;
use super::rules::name::NameNormalizer;
use super::rules::noise::NoiseFilter;
use super::rules::patterns::{AMOUNT, DATE_TIME};
use super::rules::quantity::QuantityContinuationMerger;

/// Region of the receipt the classifier is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Header: store name, address, anything before the currency sentinel.
    BeforeItems,
    /// Item block between the currency sentinel and the trailer keyword.
    CollectingItems,
    /// Trailer: totals, payment details, tax table. Terminal.
    AfterItems,
}

/// Result of parsing one document's lines.
#[derive(Debug, Clone)]
pub struct ParsedReceipt {
    /// The finished receipt record.
    pub receipt: Receipt,
    /// Non-fatal warnings raised during the parse.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for receipt parsing.
pub trait ReceiptParser {
    /// Parse one document's ordered lines into a receipt.
    fn parse(&self, source_id: &str, lines: &[String]) -> ParsedReceipt;
}

/// State machine over a document's lines.
///
/// A single forward pass segments the document into header, item, and
/// trailer regions and dispatches each item-region line to the kilo
/// enricher or the item tokenizer. Finalization merges continuation
/// markers, filters noise items, and recomputes the total.
pub struct LineClassifier {
    config: ParserConfig,
    items: ItemLineParser,
    kilo: KiloLineEnricher,
    merger: QuantityContinuationMerger,
    noise: NoiseFilter,
}

impl LineClassifier {
    /// Create a classifier with default configuration.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    /// Create a classifier from immutable engine configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        let normalizer = NameNormalizer::new(&config.diacritic_folds);
        let items = ItemLineParser::new(normalizer);
        let merger = QuantityContinuationMerger::new(config.total_tolerance);
        let noise = NoiseFilter::new(&config.item_deny_list);
        Self {
            config,
            items,
            kilo: KiloLineEnricher::new(),
            merger,
            noise,
        }
    }

    /// Parse an ordered line stream into a receipt. Never fails: missing
    /// date, time, items, or trailer total are legal, not errors.
    pub fn parse_lines<I, S>(&self, source_id: &str, lines: I) -> ParsedReceipt
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = Instant::now();

        let mut region = Region::BeforeItems;
        let mut date: Option<NaiveDate> = None;
        let mut time: Option<NaiveTime> = None;
        let mut declared_total: Option<Decimal> = None;
        let mut items: Vec<LineItem> = Vec::new();
        let mut line_count = 0usize;
        let mut dropped_lines = 0usize;

        for raw in lines {
            let line = raw.as_ref().trim();
            line_count += 1;

            // Date/time capture is independent of region; each match
            // overwrites. A stray date-like substring later in the
            // document wins over the real timestamp (known ambiguity).
            if let Some(caps) = DATE_TIME.captures(line) {
                if let (Ok(d), Ok(t)) = (
                    NaiveDate::parse_from_str(&caps[1], "%d.%m.%y"),
                    NaiveTime::parse_from_str(&caps[2], "%H:%M"),
                ) {
                    date = Some(d);
                    time = Some(t);
                }
            }

            match region {
                Region::BeforeItems => {
                    if line.starts_with(self.config.currency_sentinel.as_str()) {
                        region = Region::CollectingItems;
                    }
                }
                Region::CollectingItems => {
                    if line.contains(self.config.trailer_keyword.as_str()) {
                        declared_total = last_amount(line);
                        region = Region::AfterItems;
                        continue;
                    }
                    if self.is_denied_line(line) {
                        dropped_lines += 1;
                        continue;
                    }
                    if self.kilo.matches(line) {
                        if !self.kilo.enrich(line, &mut items) {
                            dropped_lines += 1;
                        }
                    } else if let Some(item) = self.items.parse(line) {
                        items.push(item);
                    } else {
                        dropped_lines += 1;
                    }
                }
                Region::AfterItems => {}
            }
        }

        let mut warnings = Vec::new();

        for marker in self.merger.merge(&mut items) {
            warnings.push(format!(
                "continuation marker {:?} could not be merged into a following item",
                marker
            ));
        }

        self.noise.retain_purchases(&mut items);

        let computed_total = round2(items.iter().map(|item| item.total_price).sum());
        if let Some(declared) = declared_total {
            if (declared - computed_total).abs() > self.config.total_tolerance {
                warnings.push(format!(
                    "declared total {} differs from computed total {}",
                    declared, computed_total
                ));
            }
        }

        debug!(
            source_id,
            items = items.len(),
            dropped_lines,
            %computed_total,
            "parsed receipt"
        );

        let processing_time_ms = start.elapsed().as_millis() as u64;
        let receipt = Receipt {
            source_id: source_id.to_string(),
            date,
            time,
            items,
            declared_total,
            computed_total,
            metadata: ParseMetadata {
                warnings: warnings.clone(),
                line_count,
                dropped_lines,
                processing_time_ms: Some(processing_time_ms),
            },
        };

        ParsedReceipt {
            receipt,
            warnings,
            processing_time_ms,
        }
    }

    fn is_denied_line(&self, line: &str) -> bool {
        self.config
            .line_deny_list
            .iter()
            .any(|keyword| line.contains(keyword.as_str()))
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser for LineClassifier {
    fn parse(&self, source_id: &str, lines: &[String]) -> ParsedReceipt {
        self.parse_lines(source_id, lines)
    }
}

/// The rightmost comma-decimal amount on a line, e.g. the total on
/// "SUMME € 10,84".
fn last_amount(line: &str) -> Option<Decimal> {
    AMOUNT
        .find_iter(line)
        .last()
        .and_then(|m| parse_comma_decimal(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn parse(lines: &[&str]) -> ParsedReceipt {
        LineClassifier::new().parse_lines("bon.pdf", lines.iter().copied())
    }

    #[test]
    fn test_full_receipt() {
        let parsed = parse(&[
            "10.02.24 14:35",
            "EUR",
            "Banana 1,99 € x 2 3,98 B",
            "SUMME € 3,98",
        ]);
        let receipt = parsed.receipt;

        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(receipt.time, NaiveTime::from_hms_opt(14, 35, 0));
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Banana");
        assert_eq!(receipt.items[0].quantity, d("2"));
        assert_eq!(receipt.items[0].unit_price, d("1.99"));
        assert_eq!(receipt.items[0].total_price, d("3.98"));
        assert_eq!(receipt.declared_total, Some(d("3.98")));
        assert_eq!(receipt.computed_total, d("3.98"));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_empty_receipt_fields_are_legal() {
        let receipt = parse(&["EUR"]).receipt;

        assert_eq!(receipt.date, None);
        assert_eq!(receipt.time, None);
        assert!(receipt.items.is_empty());
        assert_eq!(receipt.declared_total, None);
        assert_eq!(receipt.computed_total, d("0"));
    }

    #[test]
    fn test_lines_outside_item_region_are_ignored() {
        let receipt = parse(&[
            "REWE Markt GmbH",
            "Kassenbon 1,99 B",
            "EUR",
            "Banana 1,99 B",
            "SUMME € 1,99",
            "Apfel 2,49 B",
        ])
        .receipt;

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Banana");
    }

    #[test]
    fn test_trailer_is_terminal() {
        // A second currency sentinel after the trailer must not reopen
        // item collection.
        let receipt = parse(&[
            "EUR",
            "Banana 1,99 B",
            "SUMME € 1,99",
            "EUR",
            "Apfel 2,49 B",
        ])
        .receipt;

        assert_eq!(receipt.items.len(), 1);
    }

    #[test]
    fn test_last_date_time_match_wins() {
        let receipt = parse(&[
            "01.01.24 00:01",
            "EUR",
            "Banana 1,99 B",
            "SUMME € 1,99",
            "18.02.25 17:49",
        ])
        .receipt;

        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2025, 2, 18));
        assert_eq!(receipt.time, NaiveTime::from_hms_opt(17, 49, 0));
    }

    #[test]
    fn test_denied_lines_are_skipped() {
        let receipt = parse(&[
            "EUR",
            "Banana 1,99 B",
            "Posten: 3",
            "Coupon 0,50 B",
            "SUMME € 1,99",
        ])
        .receipt;

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Banana");
    }

    #[test]
    fn test_kilo_line_enriches_previous_item() {
        let receipt = parse(&[
            "EUR",
            "EHL MOEHREN 1,00 B",
            "0,480 kg x 2,99 /kg",
            "SUMME € 1,44",
        ])
        .receipt;

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Ehl Moehren");
        assert_eq!(receipt.items[0].quantity, d("0.480"));
        assert_eq!(receipt.items[0].unit_price, d("2.99"));
        assert_eq!(receipt.items[0].total_price, d("1.44"));
        assert_eq!(receipt.computed_total, d("1.44"));
    }

    #[test]
    fn test_kilo_line_without_prior_item_is_dropped() {
        let receipt = parse(&["EUR", "0,480 kg x 2,99 /kg", "SUMME € 0,00"]).receipt;

        assert!(receipt.items.is_empty());
        assert_eq!(receipt.metadata.dropped_lines, 1);
    }

    #[test]
    fn test_continuation_marker_merged() {
        let parsed = parse(&[
            "EUR",
            "2 x 0,59",
            "Pizza 1,18 B",
            "SUMME € 1,18",
        ]);
        let receipt = parsed.receipt;

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Pizza");
        assert_eq!(receipt.items[0].quantity, d("2"));
        assert_eq!(receipt.items[0].unit_price, d("0.59"));
        assert_eq!(receipt.items[0].total_price, d("1.18"));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_unmerged_marker_is_flagged() {
        let parsed = parse(&["EUR", "2 x 0,59", "SUMME € 0,59"]);

        assert_eq!(parsed.receipt.items.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("continuation marker"));
    }

    #[test]
    fn test_noise_items_are_filtered_from_total() {
        let receipt = parse(&[
            "EUR",
            "Banana 1,99 B",
            "PFAND 0,25 A",
            "Leergut -1,50",
            "SUMME € 0,74",
        ])
        .receipt;

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.computed_total, d("1.99"));
        // The printed trailer reflects the deposit lines; the computed
        // total does not, so the divergence is reported.
        assert_eq!(receipt.declared_total, Some(d("0.74")));
        assert_eq!(receipt.metadata.warnings.len(), 1);
    }

    #[test]
    fn test_computed_total_sums_retained_items() {
        let receipt = parse(&[
            "EUR",
            "Banana 1,99 B",
            "Fanta Zero 1l 1,59 B",
            "Brot 2,49 B",
            "SUMME € 6,07",
        ])
        .receipt;

        assert_eq!(receipt.computed_total, d("6.07"));
        assert!(receipt.metadata.warnings.is_empty());
    }

    #[test]
    fn test_orphan_marker_only_line_is_not_collected() {
        let receipt = parse(&["EUR", "4 x", "Banana 1,99 B", "SUMME € 1,99"]).receipt;

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].name, "Banana");
        assert_eq!(receipt.metadata.dropped_lines, 1);
    }

    #[test]
    fn test_unparseable_lines_inside_region_are_dropped_silently() {
        let parsed = parse(&["EUR", "* * *", "Banana 1,99 B", "SUMME € 1,99"]);

        assert_eq!(parsed.receipt.items.len(), 1);
        assert_eq!(parsed.receipt.metadata.dropped_lines, 1);
        assert!(parsed.warnings.is_empty());
    }
}
