//! HTTP REST API.
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/relation` | GET | List edges matching a filter, paginated |
//! | `/relation` | POST | Create an edge |
//! | `/relation` | DELETE | Delete an edge |
//! | `/relation/all`, `/relation/clear-all-relations` | POST, DELETE | Remove every edge |
//! | `/relation/get-all-namespaces` | GET | Namespaces in use |
//! | `/relation/delete-by-queries` | POST | Delete edges matching any filter |
//! | `/relation/batch-operation` | POST | Atomic batch of mutations |
//! | `/relation/check` | POST | Reachability check |
//! | `/relation/get-shortest-path` | POST | Minimal-hop path |
//! | `/relation/get-all-paths` | POST | Every simple path |
//! | `/relation/get-all-object-relations` | POST | Objects a subject reaches |
//! | `/relation/get-all-subject-relations` | POST | Subjects reaching an object |
//! | `/relation/obj-auths` | POST | Reached objects matching a pattern |
//! | `/relation/sbj-who-has-auth` | POST | Reaching subjects matching a pattern |
//! | `/relation/get-tree` | POST | Expansion tree |
//! | `/relation/see-tree` | POST | Rendered tree or whole-graph forest |
//! | `/ping`, `/healthy` | GET | Liveness and health |

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{error_codes, ApiError, ApiResult, JsonBadRequest};
pub use routes::{create_app, create_router, create_router_with_body_limit, DEFAULT_BODY_LIMIT};
pub use state::AppState;
