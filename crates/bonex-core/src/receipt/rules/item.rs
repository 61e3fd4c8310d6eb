//! Per-line item tokenizer.
//!
//! Receipt item lines concatenate their fields visually with no reliable
//! delimiter. The tokenizer anchors on the trailing total-price token,
//! then runs the remaining body through an ordered table of shape rules;
//! the first rule that extracts wins.

use rust_decimal::Decimal;
use tracing::trace;

use crate::models::receipt::LineItem;

use super::amounts::{parse_comma_decimal, round2};
use super::name::NameNormalizer;
use super::patterns::{ORPHAN_MARKER_LINE, QUANTITY_SHAPE, TRAILING_TOTAL};

type ShapeExtractor = fn(&ItemLineParser, &str, Decimal) -> Option<LineItem>;

/// One entry of the body-shape rule table.
struct ShapeRule {
    shape: &'static str,
    extract: ShapeExtractor,
}

/// Rules tried in priority order against the price-stripped body. The
/// plain-price rule always extracts, so it stays last.
const BODY_RULES: &[ShapeRule] = &[
    ShapeRule {
        shape: "quantity-multiplication",
        extract: ItemLineParser::extract_quantity_shape,
    },
    ShapeRule {
        shape: "plain-price",
        extract: ItemLineParser::extract_plain,
    },
];

/// Tokenizes one physical text line into a [`LineItem`].
pub struct ItemLineParser {
    normalizer: NameNormalizer,
}

impl ItemLineParser {
    pub fn new(normalizer: NameNormalizer) -> Self {
        Self { normalizer }
    }

    /// Parse a candidate line. Returns `None` for lines that are not
    /// items: orphan multiplier markers (handled later by the
    /// continuation merger) and lines without a trailing price token.
    pub fn parse(&self, line: &str) -> Option<LineItem> {
        let line = line.trim();

        if ORPHAN_MARKER_LINE.is_match(line) {
            return None;
        }

        let caps = TRAILING_TOTAL.captures(line)?;
        let total_price = parse_comma_decimal(&caps[1])?;
        let body = line[..caps.get(0).unwrap().start()].trim();

        for rule in BODY_RULES {
            if let Some(item) = (rule.extract)(self, body, total_price) {
                trace!(shape = rule.shape, name = %item.name, "matched item line");
                return Some(item);
            }
        }
        None
    }

    /// `<pre> <price> [€|EUR] x <qty> <post>`: the multiplication shape
    /// may sit anywhere in the body; the surrounding text becomes the
    /// name. Malformed numeric tokens make this rule pass, so the
    /// plain-price rule takes over with its safe defaults.
    fn extract_quantity_shape(&self, body: &str, total_price: Decimal) -> Option<LineItem> {
        let caps = QUANTITY_SHAPE.captures(body)?;
        let unit_price = parse_comma_decimal(&caps[2])?;
        let quantity: i64 = caps[3].parse().ok()?;
        let name = self
            .normalizer
            .normalize(&format!("{} {}", &caps[1], &caps[4]));

        // A zero multiplier is a tokenizer anomaly; the printed total wins.
        if quantity == 0 {
            return Some(LineItem {
                name,
                quantity: Decimal::ONE,
                unit_price: total_price,
                total_price,
            });
        }

        let quantity = Decimal::from(quantity);
        // The printed total is ground truth; a corrupted digit elsewhere
        // in the line shows up as a product mismatch.
        let unit_price = if (round2(unit_price * quantity) - round2(total_price)).abs()
            > Decimal::new(1, 2)
        {
            round2(total_price / quantity)
        } else {
            unit_price
        };

        Some(LineItem {
            name,
            quantity,
            unit_price,
            total_price,
        })
    }

    /// Fallback for bodies without a multiplication shape: one unit at
    /// the printed total.
    fn extract_plain(&self, body: &str, total_price: Decimal) -> Option<LineItem> {
        Some(LineItem {
            name: self.normalizer.normalize(body),
            quantity: Decimal::ONE,
            unit_price: total_price,
            total_price,
        })
    }
}
