//! Controller Configuration

/// Attribute names the controller layer reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Attribute listing controller identifiers
    pub controller_attribute: String,

    /// Attribute listing action descriptors
    pub action_attribute: String,

    /// Attribute naming target elements
    pub target_attribute: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            controller_attribute: "data-controller".to_string(),
            action_attribute: "data-action".to_string(),
            target_attribute: "data-target".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema() {
        let schema = Schema::default();
        assert_eq!(schema.controller_attribute, "data-controller");
        assert_eq!(schema.action_attribute, "data-action");
        assert_eq!(schema.target_attribute, "data-target");
    }
}
