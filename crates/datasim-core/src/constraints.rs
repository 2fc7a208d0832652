use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Optional rules on a field's generated values.
///
/// The mapping is sparse: an absent key means the constraint is not applied,
/// and every setter treats an empty value as removal, so empty entries are
/// never stored or serialized. Setters take and return the value itself; a
/// field update always carries a freshly constructed `Constraints`, never a
/// shared one mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Constraints {
    /// Regex the generated value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Lower bound for numeric values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound for numeric values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Fixed option set to draw values from, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Constraints {
    /// True when no constraint key is set.
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.min.is_none() && self.max.is_none() && self.options.is_none()
    }

    /// Set `pattern`, or remove the key when `pattern` is blank.
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        let pattern = pattern.trim();
        self.pattern = (!pattern.is_empty()).then(|| pattern.to_string());
        self
    }

    /// Set or clear the `min` bound.
    pub fn with_min(mut self, min: Option<f64>) -> Self {
        self.min = min;
        self
    }

    /// Set or clear the `max` bound.
    pub fn with_max(mut self, max: Option<f64>) -> Self {
        self.max = max;
        self
    }

    /// Set `options`, dropping blank entries; an empty set removes the key.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        let options: Vec<String> = options
            .into_iter()
            .map(|option| option.trim().to_string())
            .filter(|option| !option.is_empty())
            .collect();
        self.options = (!options.is_empty()).then_some(options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_pattern_removes_the_key() {
        let constraints = Constraints::default().with_pattern("^CUST-[0-9]{5}$");
        assert_eq!(constraints.pattern.as_deref(), Some("^CUST-[0-9]{5}$"));

        let constraints = constraints.with_pattern("  ");
        assert!(constraints.pattern.is_none());
        assert!(constraints.is_empty());
    }

    #[test]
    fn setting_one_key_leaves_others_untouched() {
        let constraints = Constraints::default()
            .with_min(Some(1.0))
            .with_max(Some(10.0))
            .with_pattern("^a+$");

        let updated = constraints.with_pattern("^b+$");
        assert_eq!(updated.pattern.as_deref(), Some("^b+$"));
        assert_eq!(updated.min, Some(1.0));
        assert_eq!(updated.max, Some(10.0));
    }

    #[test]
    fn options_drop_blank_entries() {
        let constraints = Constraints::default().with_options(vec![
            " red ".to_string(),
            String::new(),
            "blue".to_string(),
        ]);
        assert_eq!(
            constraints.options,
            Some(vec!["red".to_string(), "blue".to_string()])
        );

        let constraints = constraints.with_options(Vec::new());
        assert!(constraints.options.is_none());
    }

    #[test]
    fn absent_keys_are_not_serialized() {
        let constraints = Constraints::default().with_pattern("^x$");
        let json = serde_json::to_string(&constraints).expect("serialize constraints");
        assert_eq!(json, r#"{"pattern":"^x$"}"#);
    }
}
