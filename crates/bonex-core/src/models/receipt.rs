//! Receipt data models.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A complete parsed receipt for one purchase transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Identifier of the source document (file name).
    pub source_id: String,

    /// Purchase date as printed on the receipt (dd.mm.yy).
    #[serde(
        default,
        with = "printed_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,

    /// Purchase time as printed on the receipt (HH:MM).
    #[serde(
        default,
        with = "printed_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<NaiveTime>,

    /// Purchased line items, in receipt order.
    pub items: Vec<LineItem>,

    /// Total as printed in the receipt trailer, if captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_total: Option<Decimal>,

    /// Total recomputed from the retained items. Authoritative for
    /// downstream consumers: it reflects post-filter adjustments the
    /// printed trailer does not.
    pub computed_total: Decimal,

    /// Parse metadata and non-fatal warnings.
    #[serde(default)]
    pub metadata: ParseMetadata,
}

impl Receipt {
    /// Gap between declared and computed total, when a trailer total was
    /// captured.
    pub fn reconciliation_gap(&self) -> Option<Decimal> {
        self.declared_total
            .map(|declared| (declared - self.computed_total).abs())
    }
}

/// One purchased product on a receipt.
///
/// `total_price` is the as-printed charged amount for the line and is
/// treated as ground truth; `unit_price` may be derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Canonicalized product name.
    pub name: String,

    /// Quantity; unit count for piece items, weight in kg for
    /// weight-priced items. Always positive.
    pub quantity: Decimal,

    /// Price per unit (or per kg).
    pub unit_price: Decimal,

    /// Charged amount for the whole line.
    pub total_price: Decimal,
}

/// Metadata collected while parsing one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseMetadata {
    /// Non-fatal warnings (total mismatch, unmerged continuation markers).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Number of input lines seen.
    pub line_count: usize,

    /// Lines inside the item region that matched no known shape.
    pub dropped_lines: usize,

    /// Processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

mod printed_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%d.%m.%y";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|s| NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}

mod printed_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => serializer.serialize_str(&time.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        value
            .map(|s| NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}
