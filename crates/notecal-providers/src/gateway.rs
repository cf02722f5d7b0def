//! CalendarGateway trait definition.
//!
//! A gateway performs single-event operations against one authenticated
//! provider account. It holds no state between calls; every method sends
//! exactly one request to the provider.

use std::future::Future;
use std::pin::Pin;

use notecal_core::EventResource;

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object safe so the server can hold
/// `dyn CalendarGateway` and `dyn GatewayConnector`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Single-event operations on a remote calendar.
///
/// `insert` and `update` take the complete resource: `update` is a
/// full-resource replace, so fields missing from `event` are cleared on the
/// provider side.
pub trait CalendarGateway: Send + Sync {
    /// Returns the provider name (e.g. "google").
    fn name(&self) -> &str;

    /// Fetches the current state of an event.
    fn get<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<EventResource>>;

    /// Creates an event and returns it as stored by the provider.
    fn insert<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<EventResource>>;

    /// Replaces an event with `event`.
    fn update<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<EventResource>>;

    /// Moves an event to `destination` and returns the relocated event.
    fn move_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        destination: &'a str,
    ) -> BoxFuture<'a, ProviderResult<EventResource>>;

    /// Deletes an event.
    ///
    /// Returns `Ok(false)` when the provider reports the event as missing or
    /// already deleted.
    fn delete<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<bool>>;
}

/// Produces an authenticated gateway for one request.
///
/// Implementations acquire credentials on every call and must not hand out a
/// gateway shared with another request.
pub trait GatewayConnector: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, ProviderResult<Box<dyn CalendarGateway>>>;
}
