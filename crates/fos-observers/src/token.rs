//! Attribute value tokens

use std::hash::{Hash, Hasher};

use fos_dom::NodeId;

/// One whitespace-delimited entry of an attribute value
///
/// Two tokens are equal when they share `index` and `content`; the element
/// and attribute are context, not identity.
#[derive(Debug, Clone)]
pub struct Token {
    pub element: NodeId,
    pub attribute_name: String,
    pub content: String,
    pub index: usize,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.content == other.content
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.content.hash(state);
    }
}

/// Non-whitespace runs of `value`
pub fn tokenize(value: &str) -> Vec<&str> {
    value.split_whitespace().collect()
}

/// Parse an attribute value into positional tokens
pub fn parse_token_string(value: &str, element: NodeId, attribute_name: &str) -> Vec<Token> {
    tokenize(value)
        .into_iter()
        .enumerate()
        .map(|(index, content)| Token {
            element,
            attribute_name: attribute_name.to_string(),
            content: content.to_string(),
            index,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(tokens: &[Token]) -> Vec<(&str, usize)> {
        tokens.iter().map(|t| (t.content.as_str(), t.index)).collect()
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let tokens = parse_token_string("  hello \n\t world  clipboard ", NodeId::ROOT, "data-controller");
        assert_eq!(contents(&tokens), vec![("hello", 0), ("world", 1), ("clipboard", 2)]);
        assert!(tokens.iter().all(|t| t.attribute_name == "data-controller"));
    }

    #[test]
    fn test_parse_empty_value() {
        assert!(parse_token_string("", NodeId::ROOT, "data-controller").is_empty());
        assert!(parse_token_string(" \t\n", NodeId::ROOT, "data-controller").is_empty());
    }

    #[test]
    fn test_equality_ignores_element() {
        let mut tokens = parse_token_string("a b", NodeId::ROOT, "x");
        let other = parse_token_string("a", NodeId::NONE, "y");
        assert_eq!(tokens[0], other[0]);
        assert_ne!(tokens[1], other[0]);

        tokens[0].index = 1;
        assert_ne!(tokens[0], other[0]);
    }
}
