use std::future::Future;

use futures::future::BoxFuture;
use strum::Display;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::BridgeError;

/// Caller-side callback for one event kind.
pub enum Handler<T> {
    /// Runs to completion as soon as it is dispatched.
    Immediate(Box<dyn Fn(T) + Send + Sync>),
    /// Returns a future that is awaited before the next event is dispatched.
    Deferred(Box<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>),
}

impl<T> Handler<T> {
    pub fn immediate(handler: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self::Immediate(Box::new(handler))
    }

    pub fn deferred<Fut>(handler: impl Fn(T) -> Fut + Send + Sync + 'static) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Deferred(Box::new(move |value| Box::pin(handler(value))))
    }

    async fn invoke(&self, value: T) {
        match self {
            Handler::Immediate(handler) => handler(value),
            Handler::Deferred(handler) => handler(value).await,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    ScanStart,
    ScanStop,
    ScanFound,
    ScanUpdated,
    Notification,
}

/// Engine-side half of a callback registration.
///
/// The only thing that ever runs on the engine thread is [`Trampoline::deliver`],
/// which enqueues the payload for the dispatcher task spawned on the runtime
/// that registered the handler.
pub(crate) struct Trampoline<T> {
    kind: EventKind,
    sender: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Trampoline<T> {
    pub(crate) fn spawn(kind: EventKind, handler: Handler<T>) -> Result<Self, BridgeError> {
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let (sender, mut receiver) = mpsc::unbounded_channel::<T>();

        runtime.spawn(async move {
            while let Some(value) = receiver.recv().await {
                handler.invoke(value).await;
            }
            tracing::debug!("{kind} callback unloaded");
        });

        Ok(Self { kind, sender })
    }

    pub(crate) fn deliver(&self, value: T) {
        if let Err(err) = self.sender.send(value) {
            tracing::error!(
                "Failed to deliver {} callback, dispatcher is gone: {err}",
                self.kind
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
