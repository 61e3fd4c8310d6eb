//! Deny-list filtering of non-purchase items.

use tracing::debug;

use crate::models::receipt::LineItem;

/// Removes items that are not genuine purchases: deposits, returnable
/// containers, coupons, rebates, and stray total captures.
pub struct NoiseFilter {
    deny: Vec<String>,
}

impl NoiseFilter {
    /// Create a filter from deny keywords; matching is on lower-cased
    /// names, so keywords are lower-cased here.
    pub fn new(deny_list: &[String]) -> Self {
        Self {
            deny: deny_list.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Whether a normalized item name matches the deny-list.
    pub fn is_noise(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.deny.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Drop deny-listed items in place, preserving the relative order of
    /// the survivors. Returns the number of removed items.
    pub fn retain_purchases(&self, items: &mut Vec<LineItem>) -> usize {
        let before = items.len();
        items.retain(|item| !self.is_noise(&item.name));
        let removed = before - items.len();
        if removed > 0 {
            debug!("Filtered {} non-purchase item(s)", removed);
        }
        removed
    }
}
