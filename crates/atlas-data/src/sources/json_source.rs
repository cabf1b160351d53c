//! JSON file source

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::EntitySource;
use crate::entities::LayerEntity;
use crate::DataError;

/// Loads entities from a JSON file.
///
/// The file holds either a bare array of records or an object wrapping the
/// array under an envelope key, the way the backend answers
/// (`{ "humans": [...] }`).
pub struct JsonEntitySource<T> {
    path: PathBuf,
    name: String,
    envelope_key: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: LayerEntity + DeserializeOwned> JsonEntitySource<T> {
    /// Source accepting a bare array or the layer kind's usual envelope
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self {
            path,
            name,
            envelope_key: Some(T::KIND.envelope_key().to_string()),
            _marker: PhantomData,
        }
    }

    /// Read the array from a different envelope key
    pub fn with_envelope_key(mut self, key: impl Into<String>) -> Self {
        self.envelope_key = Some(key.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a document into entities, unwrapping the envelope when present
pub fn parse_entities<T: DeserializeOwned>(
    document: &str,
    envelope_key: Option<&str>,
) -> Result<Vec<T>, DataError> {
    let value: Value = serde_json::from_str(document)?;

    let records = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => {
            let key = envelope_key.ok_or_else(|| {
                DataError::Format("expected a JSON array of records".to_string())
            })?;
            match object.remove(key) {
                Some(Value::Null) => Value::Array(Vec::new()),
                Some(records) => records,
                None => {
                    return Err(DataError::Format(format!("missing \"{key}\" array")));
                }
            }
        }
        other => {
            return Err(DataError::Format(format!(
                "expected an array or object, found {}",
                json_kind(&other)
            )));
        }
    };

    Ok(serde_json::from_value(records)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl<T> EntitySource<T> for JsonEntitySource<T>
where
    T: LayerEntity + DeserializeOwned,
{
    async fn load(&self) -> anyhow::Result<Vec<T>> {
        let path = self.path.clone();
        let envelope_key = self.envelope_key.clone();
        debug!(path = %path.display(), "Reading entities");

        let entities = tokio::task::spawn_blocking(move || -> Result<Vec<T>, DataError> {
            let document = std::fs::read_to_string(&path)?;
            parse_entities(&document, envelope_key.as_deref())
        })
        .await
        .map_err(DataError::from)?
        .with_context(|| format!("Failed to load {} from {}", T::KIND, self.name))?;

        info!(layer = %T::KIND, count = entities.len(), source = %self.name, "Entities loaded");
        Ok(entities)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
