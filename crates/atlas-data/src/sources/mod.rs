//! Entity sources feeding the data layers

pub mod json_source;

use async_trait::async_trait;

use crate::entities::LayerEntity;
use crate::layer::DataLayer;

pub use json_source::JsonEntitySource;

/// Anything that can produce the entities of one layer
#[async_trait]
pub trait EntitySource<T>: Send + Sync {
    /// Load every entity
    async fn load(&self) -> anyhow::Result<Vec<T>>;

    /// Get the source name/path
    fn source_name(&self) -> &str;
}

/// Fetch from `source` into `layer` under a fresh request ticket.
///
/// Returns `false` when a newer fetch superseded this one while it was loading.
pub async fn fetch_into<T, S>(layer: &DataLayer<T>, source: &S) -> anyhow::Result<bool>
where
    T: LayerEntity,
    S: EntitySource<T> + ?Sized,
{
    let ticket = layer.begin_fetch();
    let entities = source.load().await?;
    Ok(layer.apply_response(ticket, entities))
}
