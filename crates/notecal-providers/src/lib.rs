//! Calendar Gateway: provider operations on single events.
//!
//! - [`CalendarGateway`] - get, insert, update, move and delete one event
//! - [`GatewayConnector`] - builds a fresh authenticated gateway per request
//! - [`ProviderError`] - error type shared by every gateway operation
//!
//! ```text
//!  request ──► GatewayConnector::connect() ──► Box<dyn CalendarGateway>
//!                     │                                │
//!              OAuth refresh                  Google Calendar API v3
//! ```

pub mod error;
pub mod gateway;
#[cfg(feature = "google")]
pub mod google;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use gateway::{BoxFuture, CalendarGateway, GatewayConnector};
