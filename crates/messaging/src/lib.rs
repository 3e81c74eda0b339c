//! Notification contract between the booking and payment services.
//!
//! Both directions of the saga's webhook traffic are modelled as messages
//! with an event name, a target aggregate id and a small payload. The
//! coordinators hand these to a [`Publisher`], which today delivers them
//! over HTTP and could equally route them through a durable queue.

pub mod error;
pub mod notification;
pub mod publisher;

pub use error::PublishError;
pub use notification::{BookingEvent, BookingNotification, PaymentEvent, PaymentNotification};
pub use publisher::{HttpPublisher, InMemoryPublisher, Publisher};
