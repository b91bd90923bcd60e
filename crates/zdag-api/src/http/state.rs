//! Application state for HTTP handlers.

use std::sync::Arc;

use zdag_domain::resolver::GraphResolver;
use zdag_server::config::EngineSettings;
use zdag_server::handlers::batch::BatchOperationHandler;
use zdag_server::handlers::RelationWriter;
use zdag_storage::EdgeStore;

use crate::adapters::{StoreEdgeReader, StoreEdgeWriter};

pub type StoreResolver<S> = GraphResolver<StoreEdgeReader<S>>;
pub type StoreRelationWriter<S> = RelationWriter<StoreEdgeWriter<S>, StoreEdgeReader<S>>;
pub type StoreBatchHandler<S> = BatchOperationHandler<StoreEdgeWriter<S>, StoreEdgeReader<S>>;

/// Application state shared across all HTTP handlers.
///
/// # Architecture
///
/// The state uses adapters to bridge the storage layer to the domain layer:
/// - `StoreEdgeReader<S>` implements `EdgeReader` using `EdgeStore`
/// - `StoreEdgeWriter<S>` implements `EdgeWriter` using `EdgeStore`
///
/// Reads go through the resolver; every mutation goes through the writer,
/// which owns validation and the optional cycle guard.
pub struct AppState<S: EdgeStore> {
    /// The storage backend, used directly for listings and health.
    pub storage: Arc<S>,
    pub resolver: Arc<StoreResolver<S>>,
    pub writer: Arc<StoreRelationWriter<S>>,
    pub batch_handler: Arc<StoreBatchHandler<S>>,
}

impl<S: EdgeStore> AppState<S> {
    /// Creates application state with the default engine settings.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_engine_settings(storage, &EngineSettings::default())
    }

    /// Creates application state with the given limits and cycle policy.
    pub fn with_engine_settings(storage: Arc<S>, engine: &EngineSettings) -> Self {
        let reader = Arc::new(StoreEdgeReader::new(Arc::clone(&storage)));
        let edge_writer = Arc::new(StoreEdgeWriter::new(Arc::clone(&storage)));

        let resolver = Arc::new(GraphResolver::with_config(
            reader,
            engine.resolver_config(),
        ));
        let writer = Arc::new(
            RelationWriter::new(edge_writer, Arc::clone(&resolver))
                .with_cycle_guard(engine.deny_cycles),
        );
        let batch_handler = Arc::new(
            BatchOperationHandler::new(Arc::clone(&writer))
                .with_max_batch_size(engine.max_batch_size),
        );

        Self {
            storage,
            resolver,
            writer,
            batch_handler,
        }
    }
}
