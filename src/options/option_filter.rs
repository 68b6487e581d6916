use indexmap::IndexMap;

use crate::options::OptionItem;

/// Search-as-you-type filtering for option lists.
pub struct OptionFilter;

impl OptionFilter {
    /// Keep options whose label or value contains `search_term` (any case).
    ///
    /// A blank term returns the options untouched. Otherwise options whose
    /// value is in `preserve` are kept even when they do not match, listed
    /// first; the result holds each value once.
    pub fn filter(options: &[OptionItem], search_term: &str, preserve: &[String]) -> Vec<OptionItem> {
        let term = search_term.trim().to_lowercase();
        if term.is_empty() {
            return options.to_vec();
        }

        let preserved = options.iter().filter(|opt| preserve.contains(&opt.value));
        let matched = options.iter().filter(|opt| {
            opt.label.to_lowercase().contains(&term) || opt.value.to_lowercase().contains(&term)
        });

        let mut merged: IndexMap<&str, &OptionItem> = IndexMap::new();
        for opt in preserved.chain(matched) {
            merged.entry(opt.value.as_str()).or_insert(opt);
        }
        merged.into_values().cloned().collect()
    }
}
