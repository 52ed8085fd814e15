//! Typed publish/subscribe for deletion events.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

/// Reacts to events of type `Ev`.
#[async_trait]
pub trait Handle<Ev>: Send + Sync {
    async fn handle(&self, event: &Ev) -> Result<()>;
}

type HandlerHandle<Ev> = Arc<dyn Handle<Ev> + Send + Sync>;

/// Explicit handler registration, keyed by event type.
///
/// [`publish`](Self::publish) awaits every handler subscribed to the event
/// type, in registration order. Handlers are independent: a failing handler
/// is logged and the remaining handlers still run. Failures are then reported
/// to the publisher as a single [`Dispatch`](ErrorKind::Dispatch) error whose
/// source is the first failure.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use sidecar_extras::{EventBus, Handle, MediaItemDeleted, error::Result};
/// use std::sync::Arc;
///
/// struct Audit;
///
/// #[async_trait]
/// impl Handle<MediaItemDeleted> for Audit {
///     async fn handle(&self, event: &MediaItemDeleted) -> Result<()> {
///         println!("media item {} deleted", event.media_item_id);
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut bus = EventBus::new();
/// bus.subscribe::<MediaItemDeleted, _>(Arc::new(Audit));
/// bus.publish(&MediaItemDeleted { media_item_id: 1, delete_files: true }).await.unwrap();
/// # }
/// ```
#[derive(Default)]
pub struct EventBus {
    // Values are always `Vec<HandlerHandle<Ev>>` for the `Ev` of the key.
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<Ev, H>(&mut self, handler: Arc<H>)
    where
        Ev: Send + Sync + 'static,
        H: Handle<Ev> + 'static,
    {
        let handler: HandlerHandle<Ev> = handler;
        let entry = self
            .handlers
            .entry(TypeId::of::<Ev>())
            .or_insert_with(|| Box::new(Vec::<HandlerHandle<Ev>>::new()));
        if let Some(handlers) = entry.downcast_mut::<Vec<HandlerHandle<Ev>>>() {
            handlers.push(handler);
        }
    }

    /// Number of handlers subscribed to events of type `Ev`.
    pub fn subscribers<Ev: 'static>(&self) -> usize {
        self.handlers_for::<Ev>().map_or(0, <[_]>::len)
    }

    fn handlers_for<Ev: 'static>(&self) -> Option<&[HandlerHandle<Ev>]> {
        self.handlers
            .get(&TypeId::of::<Ev>())
            .and_then(|handlers| handlers.downcast_ref::<Vec<HandlerHandle<Ev>>>())
            .map(Vec::as_slice)
    }

    pub async fn publish<Ev: Send + Sync + 'static>(&self, event: &Ev) -> Result<()> {
        let Some(handlers) = self.handlers_for::<Ev>() else {
            tracing::trace!(event = type_name::<Ev>(), "No handlers subscribed");
            return Ok(());
        };
        let mut failures = Vec::new();
        for handler in handlers {
            if let Err(err) = handler.handle(event).await {
                tracing::error!(event = type_name::<Ev>(), error = ?err, "Event handler failed");
                failures.push(err);
            }
        }
        let count = failures.len();
        match failures.into_iter().next() {
            Some(first) => Err(first).or_raise(|| ErrorKind::Dispatch(count)),
            None => Ok(()),
        }
    }
}
