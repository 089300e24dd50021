//! Route handlers for the create and resource lifecycles

use super::pattern::PathParams;
use super::request::BoundRequest;
use crate::error::{BindError, Result};
use crate::model::{Mapping, Persistable, Resource};
use crate::negotiate::{render, NegotiatedResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Attribute that update requests may never assign
pub const ID_FIELD: &str = "id";

/// Outcome of a route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResult {
    /// The route produced a response.
    Handled(NegotiatedResponse),
    /// The route declined; the next matching route is tried.
    Deferred,
}

/// A handler bound to one verb and path pattern.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, request: &BoundRequest, params: PathParams) -> Result<RouteResult>;
}

/// Finds the target object for an identifier taken from the path.
///
/// `Ok(None)` means "not found" and turns into a route-miss. Implemented for
/// any `Fn(String) -> impl Future<Output = anyhow::Result<Option<T>>>`.
#[async_trait]
pub trait Locator: Send + Sync {
    type Target: Resource;

    async fn locate(&self, id: String) -> anyhow::Result<Option<Self::Target>>;
}

#[async_trait]
impl<T, F, Fut> Locator for F
where
    T: Resource,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Option<T>>> + Send + 'static,
{
    type Target = T;

    async fn locate(&self, id: String) -> anyhow::Result<Option<T>> {
        (self)(id).await
    }
}

/// Apply every extracted param to `object`.
fn apply<T: Resource>(object: &mut T, params: Mapping) -> Result<()> {
    for (name, value) in params {
        object.set(&name, value)?;
    }
    Ok(())
}

/// Payload answered by a successful delete.
pub fn delete_success() -> Mapping {
    let mut body = Mapping::new();
    body.insert("result".to_string(), Value::String("success".to_string()));
    body
}

/// POST handler: build with the factory, assign params, save, render the
/// mapping form.
pub(crate) struct CreateRoute<T, F> {
    factory: F,
    _model: PhantomData<fn() -> T>,
}

impl<T, F> CreateRoute<T, F> {
    pub(crate) fn new(factory: F) -> Self {
        Self {
            factory,
            _model: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> RouteHandler for CreateRoute<T, F>
where
    T: Resource,
    F: Fn() -> T + Send + Sync,
{
    async fn handle(&self, request: &BoundRequest, _params: PathParams) -> Result<RouteResult> {
        let Some(format) = request.accept().preferred() else {
            debug!("No acceptable format for {}, deferring", request.path());
            return Ok(RouteResult::Deferred);
        };

        let mut object = (self.factory)();
        let params = request.params()?;
        debug!("Creating object with {} params", params.len());
        apply(&mut object, params)?;
        object.save().await?;

        let Some(mapping) = object.to_mapping() else {
            return Err(BindError::Conversion { format });
        };
        info!("Created object at {}", request.path());
        Ok(RouteResult::Handled(render(format, &mapping)?))
    }
}

/// Verbs registered for a resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceVerb {
    Read,
    Update,
    Delete,
}

/// Locator plus the identifier placeholder it is fed from, shared by the
/// read, update and delete routes of one resource path.
pub(crate) struct ResourceBinding<L> {
    placeholder: String,
    locator: L,
}

impl<L: Locator> ResourceBinding<L> {
    pub(crate) fn new(placeholder: String, locator: L) -> Self {
        Self {
            placeholder,
            locator,
        }
    }

    /// Not-found guard run before every verb.
    async fn locate(&self, params: &PathParams) -> Result<Option<L::Target>> {
        let Some(id) = params.get(&self.placeholder) else {
            return Ok(None);
        };
        let object = self.locator.locate(id.clone()).await?;
        if object.is_none() {
            debug!("No object for {} '{}', deferring", self.placeholder, id);
        }
        Ok(object)
    }
}

/// GET/PUT/DELETE handler for one verb of a resource path.
pub(crate) struct ResourceRoute<L> {
    binding: Arc<ResourceBinding<L>>,
    verb: ResourceVerb,
}

impl<L> ResourceRoute<L> {
    pub(crate) fn new(binding: Arc<ResourceBinding<L>>, verb: ResourceVerb) -> Self {
        Self { binding, verb }
    }
}

#[async_trait]
impl<L: Locator + 'static> RouteHandler for ResourceRoute<L> {
    async fn handle(&self, request: &BoundRequest, params: PathParams) -> Result<RouteResult> {
        let Some(mut object) = self.binding.locate(&params).await? else {
            return Ok(RouteResult::Deferred);
        };
        let Some(format) = request.accept().preferred() else {
            debug!("No acceptable format for {}, deferring", request.path());
            return Ok(RouteResult::Deferred);
        };

        let response = match self.verb {
            ResourceVerb::Read => render(format, &object)?,
            ResourceVerb::Update => {
                let mut params = request.params()?;
                if params.remove(ID_FIELD).is_some() {
                    debug!("Ignoring '{}' in update params", ID_FIELD);
                }
                apply(&mut object, params)?;
                object.save().await?;
                info!("Updated object at {}", request.path());
                render(format, &object)?
            }
            ResourceVerb::Delete => {
                object.destroy().await?;
                info!("Destroyed object at {}", request.path());
                render(format, &delete_success())?
            }
        };
        Ok(RouteResult::Handled(response))
    }
}
