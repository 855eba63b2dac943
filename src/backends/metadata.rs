//! Resolved backend access metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rewrites the keys of a fetched secret before it becomes a property source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyTransformer {
    /// Keys are used as-is.
    #[default]
    Noop,
    /// Keys found in the map are renamed; all others pass through unchanged.
    Rename(BTreeMap<String, String>),
    /// Every key gets the prefix.
    Prefix(String),
}

impl PropertyTransformer {
    pub fn transform(&self, properties: BTreeMap<String, String>) -> BTreeMap<String, String> {
        match self {
            Self::Noop => properties,
            Self::Rename(names) => properties
                .into_iter()
                .map(|(key, value)| match names.get(&key) {
                    Some(renamed) => (renamed.clone(), value),
                    None => (key, value),
                })
                .collect(),
            Self::Prefix(prefix) => properties
                .into_iter()
                .map(|(key, value)| (format!("{}{}", prefix, key), value))
                .collect(),
        }
    }
}

/// Where and how to read one property source.
///
/// `name` is both the fetch path and the name of the resulting property source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBackendMetadata {
    name: String,
    transformer: PropertyTransformer,
    variables: BTreeMap<String, String>,
    order: i32,
}

impl SecretBackendMetadata {
    pub fn new(
        name: impl Into<String>,
        transformer: PropertyTransformer,
        variables: BTreeMap<String, String>,
    ) -> Self {
        Self { name: name.into(), transformer, variables, order: 0 }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transformer(&self) -> &PropertyTransformer {
        &self.transformer
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn order(&self) -> i32 {
        self.order
    }
}

/// Replaces `{name}` placeholders with values from `variables`.
///
/// Unknown placeholders are kept verbatim.
pub fn expand_template(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match variables.get(name) {
                    Some(value) => expanded.push_str(value),
                    None => {
                        expanded.push('{');
                        expanded.push_str(name);
                        expanded.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                expanded.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    expanded.push_str(rest);
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_rename_keeps_unmapped_keys() {
        let transformer = PropertyTransformer::Rename(map(&[("username", "db.user")]));
        let out = transformer.transform(map(&[("username", "u"), ("ttl", "60")]));
        assert_eq!(out, map(&[("db.user", "u"), ("ttl", "60")]));
    }

    #[test]
    fn test_prefix() {
        let transformer = PropertyTransformer::Prefix("app.".into());
        assert_eq!(transformer.transform(map(&[("a", "1")])), map(&[("app.a", "1")]));
    }

    #[test]
    fn test_expand_template() {
        let vars = map(&[("backend", "mysql"), ("role", "readonly")]);
        assert_eq!(expand_template("{backend}/creds/{role}", &vars), "mysql/creds/readonly");
        assert_eq!(expand_template("{backend}/{missing}", &vars), "mysql/{missing}");
        assert_eq!(expand_template("open{brace", &vars), "open{brace");
    }
}
