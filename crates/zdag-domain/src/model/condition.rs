//! Traversal conditions and entity patterns.

use serde::{Deserialize, Serialize};

use super::types::EntityRef;

/// Sets of namespaces, names and relations. An entity matches when *any*
/// listed value equals the corresponding field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compare {
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub relations: Vec<String>,
}

impl Compare {
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.names.is_empty() && self.relations.is_empty()
    }

    fn any_matches(&self, entity: &EntityRef) -> bool {
        self.namespaces.iter().any(|ns| *ns == entity.namespace)
            || self.names.iter().any(|name| *name == entity.name)
            || self
                .relations
                .iter()
                .any(|rel| rel.as_str() == entity.relation_str())
    }
}

/// Restricts which nodes a traversal may expand through.
///
/// An empty condition never restricts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCondition {
    #[serde(default, rename = "in")]
    pub within: Compare,
}

impl SearchCondition {
    pub fn should_expand(&self, entity: &EntityRef) -> bool {
        self.within.is_empty() || self.within.any_matches(entity)
    }
}

/// Restricts which reached nodes are reported.
///
/// An empty condition reports everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectCondition {
    #[serde(default, rename = "in")]
    pub within: Compare,
}

impl CollectCondition {
    pub fn should_collect(&self, entity: &EntityRef) -> bool {
        self.within.is_empty() || self.within.any_matches(entity)
    }
}

/// Entity pattern for authorization lookups: every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPattern {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
}

impl EntityPattern {
    pub fn matches(&self, entity: &EntityRef) -> bool {
        fn field(pattern: &Option<String>, value: &str) -> bool {
            match pattern.as_deref() {
                None | Some("") => true,
                Some(expected) => expected == value,
            }
        }
        field(&self.namespace, &entity.namespace)
            && field(&self.name, &entity.name)
            && field(&self.relation, entity.relation_str())
    }
}
