//! Mutation handlers sitting between the HTTP layer and storage.

pub mod batch;
pub mod write;

#[cfg(test)]
pub(crate) mod test_support;

pub use write::RelationWriter;
