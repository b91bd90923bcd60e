//! Core type definitions for the relation graph.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A namespaced entity, optionally qualified by a relation.
///
/// As an edge object the relation is the one being granted. As a subject a
/// relation turns the reference into a userset: "everyone related to
/// `namespace:name` via `relation`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub namespace: String,
    pub name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub relation: Option<String>,
}

impl EntityRef {
    /// Creates a bare entity reference without a relation.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            relation: None,
        }
    }

    /// Creates an entity reference qualified by `relation`.
    pub fn with_relation(
        namespace: impl Into<String>,
        name: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            relation: Some(relation.into()),
        }
    }

    /// Parses `namespace:name` or `namespace:name#relation`.
    pub fn parse(value: &str) -> Result<Self, &'static str> {
        let (entity, relation) = match value.split_once('#') {
            Some((entity, relation)) => (entity, Some(relation)),
            None => (value, None),
        };
        let (namespace, name) = entity
            .split_once(':')
            .ok_or("entity must be in 'namespace:name' format")?;
        if namespace.is_empty() || name.is_empty() {
            return Err("entity namespace and name cannot be empty");
        }
        match relation {
            Some("") => Err("relation cannot be empty after '#'"),
            Some(relation) => Ok(Self::with_relation(namespace, name, relation)),
            None => Ok(Self::new(namespace, name)),
        }
    }

    /// Returns true when this reference denotes a userset.
    pub fn is_userset(&self) -> bool {
        self.relation.is_some()
    }

    /// The relation, or `""` for bare entities.
    pub fn relation_str(&self) -> &str {
        self.relation.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)?;
        if let Some(relation) = &self.relation {
            write!(f, "#{relation}")?;
        }
        Ok(())
    }
}

/// A relationship: `subject` is related to `object` via `object.relation`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub object: EntityRef,
    pub subject: EntityRef,
}

impl Edge {
    pub fn new(object: EntityRef, subject: EntityRef) -> Self {
        Self { object, subject }
    }

    /// The relation this edge grants.
    pub fn relation(&self) -> &str {
        self.object.relation_str()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.object, self.subject)
    }
}

/// Traversal direction for tree building and reverse lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From a subject toward the objects it reaches.
    #[default]
    Forward,
    /// From an object back toward the subjects that reach it.
    Reverse,
}

/// Partial filter over the identity fields of an edge. `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeFilter {
    #[serde(default)]
    pub object_namespace: Option<String>,
    #[serde(default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub subject_namespace: Option<String>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub subject_relation: Option<String>,
}

impl EdgeFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `edge` satisfies every set field. A subject relation of `""`
    /// selects bare subjects only.
    pub fn matches(&self, edge: &Edge) -> bool {
        fn field(filter: &Option<String>, value: &str) -> bool {
            filter.as_deref().map_or(true, |expected| expected == value)
        }
        field(&self.object_namespace, &edge.object.namespace)
            && field(&self.object_name, &edge.object.name)
            && field(&self.relation, edge.relation())
            && field(&self.subject_namespace, &edge.subject.namespace)
            && field(&self.subject_name, &edge.subject.name)
            && field(&self.subject_relation, edge.subject.relation_str())
    }

    /// A filter selecting exactly `edge`.
    pub fn exact(edge: &Edge) -> Self {
        Self {
            object_namespace: Some(edge.object.namespace.clone()),
            object_name: Some(edge.object.name.clone()),
            relation: Some(edge.relation().to_string()),
            subject_namespace: Some(edge.subject.namespace.clone()),
            subject_name: Some(edge.subject.name.clone()),
            subject_relation: Some(edge.subject.relation_str().to_string()),
        }
    }
}

/// Batch mutation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Insert; fails the batch if the edge already exists.
    Create,
    /// Insert unless already present.
    CreateIfNotExist,
    /// Remove; absent edges are ignored.
    Delete,
}

/// One step of an atomic batch mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub action: Action,
    #[serde(rename = "relation")]
    pub edge: Edge,
}

impl Operation {
    pub fn create(edge: Edge) -> Self {
        Self {
            action: Action::Create,
            edge,
        }
    }

    pub fn create_if_not_exist(edge: Edge) -> Self {
        Self {
            action: Action::CreateIfNotExist,
            edge,
        }
    }

    pub fn delete(edge: Edge) -> Self {
        Self {
            action: Action::Delete,
            edge,
        }
    }
}

/// A node of an expansion tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub entity: EntityRef,
    pub children: Vec<TreeNode>,
    /// The node already appears on the path from the root; not expanded.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cycle: bool,
    /// The depth limit stopped expansion although children exist.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl TreeNode {
    pub fn leaf(entity: EntityRef) -> Self {
        Self {
            entity,
            children: Vec::new(),
            cycle: false,
            truncated: false,
        }
    }

    /// Total number of nodes in this subtree.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Renders the tree as indented text, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            for _ in 0..depth {
                out.push_str("  ");
            }
            if depth > 0 {
                out.push_str("- ");
            }
            out.push_str(&node.entity.to_string());
            if node.cycle {
                out.push_str(" (cycle)");
            } else if node.truncated {
                out.push_str(" ...");
            }
            out.push('\n');
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
        out
    }
}

/// Treats `""` the same as a missing relation.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
