use std::time::Duration;

/// LIMIT used when a selection does not carry its own.
pub const DEFAULT_LIMIT: u32 = 500;

/// Number of positional child-record slots generated per relationship.
pub const MAX_CHILD_ROWS: usize = 5;

/// Settings shared by the query shell.
///
/// - `default_limit` seeds the LIMIT of every fresh selection.
/// - `preview_debounce` is the quiet period an edit must survive before the
///   preview query is recompiled.
/// - `visible_rows` caps how many flattened rows are shown before the user is
///   pointed at export instead.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    /// LIMIT applied to fresh selections
    pub default_limit: u32,
    /// Delay between the last edit and the preview recompilation
    pub preview_debounce: Duration,
    /// Rows shown in the result preview
    pub visible_rows: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            preview_debounce: Duration::from_millis(300),
            visible_rows: 50,
        }
    }
}

impl BuilderConfig {
    /// Create default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with an explicit default LIMIT.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            default_limit: limit,
            ..Self::default()
        }
    }

    /// Recompile the preview on every edit instead of waiting for a quiet period.
    pub fn without_debounce(mut self) -> Self {
        self.preview_debounce = Duration::ZERO;
        self
    }

    pub fn with_visible_rows(mut self, rows: usize) -> Self {
        self.visible_rows = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BuilderConfig::new();
        assert_eq!(config.default_limit, 500);
        assert_eq!(config.preview_debounce, Duration::from_millis(300));
        assert_eq!(config.visible_rows, 50);
    }

    #[test]
    fn test_without_debounce_keeps_limit() {
        let config = BuilderConfig::with_limit(200).without_debounce();
        assert_eq!(config.default_limit, 200);
        assert!(config.preview_debounce.is_zero());
    }
}
