//! restbind: expose arbitrary models as REST resources
//!
//! Register a factory for creation and a locator for lookup; the binder wires
//! POST, GET, PUT and DELETE to the model's lifecycle, extracts attributes
//! from however the client encoded them, and renders responses as JSON or XML
//! depending on the `Accept` header.
//!
//! ```no_run
//! use restbind::Binder;
//! # use restbind::{Mapping, Persistable, Serializable, Settable};
//! # #[derive(Default)]
//! # struct Note;
//! # impl Settable for Note {
//! #     fn set(&mut self, _: &str, _: serde_json::Value) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # #[async_trait::async_trait]
//! # impl Persistable for Note {
//! #     async fn save(&mut self) -> anyhow::Result<()> { Ok(()) }
//! #     async fn destroy(&mut self) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # impl Serializable for Note {
//! #     fn to_mapping(&self) -> Option<Mapping> { Some(Mapping::new()) }
//! # }
//!
//! # fn main() -> restbind::Result<()> {
//! let mut binder = Binder::new();
//! binder
//!     .register_create("/notes", Note::default)?
//!     .register_resource("/notes/:id", |_id: String| async move {
//!         Ok::<_, anyhow::Error>(Some(Note))
//!     })?;
//! let app: axum::Router = binder.into_router();
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod error;
pub mod model;
pub mod negotiate;
pub mod params;

pub use binder::{Binder, BoundRequest, Locator, RouteHandler, RouteResult};
pub use error::{BindError, Result};
pub use model::{Mapping, Persistable, Resource, Serializable, Settable};
pub use negotiate::{convert, negotiate, AcceptPreference, Format, NegotiatedResponse};
pub use params::extract_params;
