//! Loading notifications for client requests.
//!
//! `RequestNotifier` publishes a `Started` and a `Finished` event around
//! every wrapped request. Any number of subscribers can watch; the transport
//! knows nothing about them.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::http::{AuthApi, ClientError};
use crate::auth::{RegisterRequest, TokenResponse};
use crate::domain::User;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Register,
    Login,
    CurrentUser,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestEvent {
    Started { operation: Operation },
    Finished { operation: Operation, ok: bool },
}

#[derive(Debug, Clone)]
pub struct RequestNotifier {
    sender: broadcast::Sender<RequestEvent>,
    in_flight: Arc<AtomicUsize>,
}

impl Default for RequestNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RequestEvent> {
        self.sender.subscribe()
    }

    /// True while at least one request is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    fn publish(&self, event: RequestEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn started(&self, operation: Operation) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.publish(RequestEvent::Started { operation });
    }

    pub fn finished(&self, operation: Operation, ok: bool) {
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        self.publish(RequestEvent::Finished { operation, ok });
    }

    /// Run `request`, announcing its start and end
    pub async fn track<T>(
        &self,
        operation: Operation,
        request: impl std::future::Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        self.started(operation);
        let result = request.await;
        self.finished(operation, result.is_ok());
        result
    }
}

/// Any `AuthApi` with loading notifications attached
#[derive(Debug, Clone)]
pub struct Notifying<A> {
    inner: A,
    notifier: RequestNotifier,
}

impl<A: AuthApi> Notifying<A> {
    pub fn new(inner: A, notifier: RequestNotifier) -> Self {
        Self { inner, notifier }
    }

    pub fn notifier(&self) -> &RequestNotifier {
        &self.notifier
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: AuthApi> AuthApi for Notifying<A> {
    async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        self.notifier.track(Operation::Register, self.inner.register(request)).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ClientError> {
        self.notifier.track(Operation::Login, self.inner.login(username, password)).await
    }

    async fn current_user(&self, token: &str) -> Result<User, ClientError> {
        self.notifier.track(Operation::CurrentUser, self.inner.current_user(token)).await
    }

    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        self.notifier.track(Operation::Logout, self.inner.logout(token)).await
    }
}
