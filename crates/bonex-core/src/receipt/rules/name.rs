//! Item-name canonicalization.

/// Canonicalizes item names: strips currency/asterisk markers, folds a
/// configured set of accented letters to ASCII digraphs, title-cases, and
/// collapses whitespace. Idempotent.
pub struct NameNormalizer {
    folds: Vec<(String, String)>,
}

impl NameNormalizer {
    /// Create a normalizer with the given diacritic fold table, keyed by
    /// lower-cased letters.
    pub fn new(folds: &[(String, String)]) -> Self {
        Self {
            folds: folds.to_vec(),
        }
    }

    /// Canonicalize a raw item name.
    pub fn normalize(&self, raw: &str) -> String {
        let stripped = raw.replace('€', "").replace('*', " ");
        let mut lowered = stripped.to_lowercase();
        for (from, to) in &self.folds {
            lowered = lowered.replace(from.as_str(), to.as_str());
        }

        // Title case: a letter after any non-letter starts a new word.
        let mut titled = String::with_capacity(lowered.len());
        let mut at_boundary = true;
        for ch in lowered.chars() {
            if ch.is_alphabetic() {
                if at_boundary {
                    titled.extend(ch.to_uppercase());
                } else {
                    titled.push(ch);
                }
                at_boundary = false;
            } else {
                titled.push(ch);
                at_boundary = true;
            }
        }

        titled.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
