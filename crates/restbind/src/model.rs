//! Capabilities a target object exposes to the binder
//!
//! The binder never knows the concrete model type. It only needs to:
//!
//! - assign named attributes ([`Settable`])
//! - persist or destroy the object ([`Persistable`])
//! - serialize it, natively or through a generic mapping ([`Serializable`])
//!
//! Anything implementing all three is a [`Resource`].

use crate::negotiate::Format;
use async_trait::async_trait;
use serde_json::Value;

/// Generic field mapping used for extracted params and the fallback
/// serialization form.
pub type Mapping = serde_json::Map<String, Value>;

/// Assign an attribute by name.
pub trait Settable {
    /// Set `name` to `value`. Unknown names and ill-typed values are errors.
    fn set(&mut self, name: &str, value: Value) -> anyhow::Result<()>;
}

/// Persistence hooks owned by the caller's model layer.
#[async_trait]
pub trait Persistable {
    /// Persist the current state.
    async fn save(&mut self) -> anyhow::Result<()>;

    /// Remove the object from storage.
    async fn destroy(&mut self) -> anyhow::Result<()>;
}

/// Serialization capabilities, tried in order by the negotiator.
///
/// Every method is optional. An object that provides none of them cannot be
/// rendered and yields [`crate::BindError::Conversion`].
pub trait Serializable {
    /// Native JSON serializer.
    fn to_json(&self) -> Option<anyhow::Result<String>> {
        None
    }

    /// Native XML serializer.
    fn to_xml(&self) -> Option<anyhow::Result<String>> {
        None
    }

    /// Generic structural form, used when no native serializer exists.
    fn to_mapping(&self) -> Option<Mapping> {
        None
    }

    /// Native serializer for `format`, if any.
    fn to_native(&self, format: Format) -> Option<anyhow::Result<String>> {
        match format {
            Format::Json => self.to_json(),
            Format::Xml => self.to_xml(),
        }
    }
}

/// A mapping serializes itself natively in both formats.
impl Serializable for Mapping {
    fn to_json(&self) -> Option<anyhow::Result<String>> {
        Some(Format::Json.encode(self).map_err(anyhow::Error::from))
    }

    fn to_xml(&self) -> Option<anyhow::Result<String>> {
        Some(Format::Xml.encode(self).map_err(anyhow::Error::from))
    }

    fn to_mapping(&self) -> Option<Mapping> {
        Some(self.clone())
    }
}

/// Everything the binder needs from a target object.
pub trait Resource: Settable + Persistable + Serializable + Send + Sync + 'static {}

impl<T> Resource for T where T: Settable + Persistable + Serializable + Send + Sync + 'static {}
