//! Request and response bodies of the relation API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use zdag_domain::model::{
    CollectCondition, Edge, EdgeFilter, EntityPattern, EntityRef, SearchCondition, TreeNode,
};
use zdag_domain::resolver::QueryOptions;
use zdag_storage::PaginationOptions;

/// Canonical edge shape: `{object, subject}`.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedEdge {
    pub object: EntityRef,
    pub subject: EntityRef,
}

/// Deprecated flat edge shape.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatEdge {
    pub object_namespace: String,
    pub object_name: String,
    pub relation: String,
    pub subject_namespace: String,
    pub subject_name: String,
    #[serde(default)]
    pub subject_relation: Option<String>,
}

impl From<FlatEdge> for Edge {
    fn from(flat: FlatEdge) -> Self {
        Edge::new(
            EntityRef::with_relation(flat.object_namespace, flat.object_name, flat.relation),
            EntityRef {
                namespace: flat.subject_namespace,
                name: flat.subject_name,
                // Flat clients send "" for bare subjects.
                relation: flat.subject_relation.filter(|rel| !rel.is_empty()),
            },
        )
    }
}

/// Any accepted edge shape. The flat form may also arrive wrapped in a
/// `relation` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EdgeBody {
    Nested(NestedEdge),
    Flat(FlatEdge),
    Wrapped { relation: FlatEdge },
}

impl EdgeBody {
    pub fn into_edge(self) -> Edge {
        match self {
            EdgeBody::Nested(nested) => Edge::new(nested.object, nested.subject),
            EdgeBody::Flat(flat) | EdgeBody::Wrapped { relation: flat } => flat.into(),
        }
    }
}

/// Body of `POST /relation`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEdgeBody {
    #[serde(flatten)]
    pub edge: EdgeBody,
    #[serde(default)]
    pub exist_ok: bool,
}

/// Body of `DELETE /relation`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteEdgeBody {
    #[serde(flatten)]
    pub edge: EdgeBody,
}

/// Query string of `GET /relation`. Empty values count as unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ListEdgesQuery {
    pub obj_ns: Option<String>,
    pub obj_name: Option<String>,
    pub obj_rel: Option<String>,
    pub sbj_ns: Option<String>,
    pub sbj_name: Option<String>,
    pub sbj_rel: Option<String>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

impl ListEdgesQuery {
    pub fn filter(&self) -> EdgeFilter {
        fn set(value: &Option<String>) -> Option<String> {
            value.clone().filter(|v| !v.is_empty())
        }
        EdgeFilter {
            object_namespace: set(&self.obj_ns),
            object_name: set(&self.obj_name),
            relation: set(&self.obj_rel),
            subject_namespace: set(&self.sbj_ns),
            subject_name: set(&self.sbj_name),
            subject_relation: set(&self.sbj_rel),
        }
    }

    pub fn pagination(&self) -> PaginationOptions {
        PaginationOptions {
            page_size: self.page_size,
            continuation_token: self.page_token.clone(),
        }
    }
}

fn query_options(timeout_ms: Option<u64>) -> QueryOptions {
    QueryOptions {
        timeout: timeout_ms.map(Duration::from_millis),
        cancel: None,
    }
}

/// Body of check and path queries.
#[derive(Debug, Clone, Deserialize)]
pub struct PathQueryBody {
    pub subject: EntityRef,
    pub object: EntityRef,
    #[serde(default)]
    pub search_condition: SearchCondition,
    /// Overrides the configured query timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl PathQueryBody {
    pub fn options(&self) -> QueryOptions {
        query_options(self.timeout_ms)
    }
}

/// Body of `get-all-object-relations`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRelationsBody {
    pub subject: EntityRef,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub search_condition: SearchCondition,
    #[serde(default)]
    pub collect_condition: CollectCondition,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Body of `get-all-subject-relations`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRelationsBody {
    pub object: EntityRef,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub search_condition: SearchCondition,
    #[serde(default)]
    pub collect_condition: CollectCondition,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ObjectRelationsBody {
    pub fn options(&self) -> QueryOptions {
        query_options(self.timeout_ms)
    }
}

impl SubjectRelationsBody {
    pub fn options(&self) -> QueryOptions {
        query_options(self.timeout_ms)
    }
}

/// Body of `obj-auths`: objects matching `object` that `subject` reaches.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectAuthsBody {
    pub subject: EntityRef,
    #[serde(default)]
    pub object: EntityPattern,
}

/// Body of `sbj-who-has-auth`: subjects matching `subject` that reach `object`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectAuthsBody {
    pub object: EntityRef,
    #[serde(default)]
    pub subject: EntityPattern,
}

/// Body of `get-tree` and `see-tree`. `subject` roots a forward tree,
/// `object` a reverse one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeBody {
    #[serde(default)]
    pub subject: Option<EntityRef>,
    #[serde(default)]
    pub object: Option<EntityRef>,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl TreeBody {
    pub fn options(&self) -> QueryOptions {
        query_options(self.timeout_ms)
    }
}

/// Body of `delete-by-queries`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteByQueriesBody {
    pub queries: Vec<EdgeFilter>,
}

#[derive(Debug, Serialize)]
pub struct EdgePageResponse {
    pub data: Vec<Edge>,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

/// Generic `{data}` envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct ForestResponse {
    pub data: Vec<TreeNode>,
    /// Indented text form of every tree, concatenated.
    pub rendered: String,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
}
