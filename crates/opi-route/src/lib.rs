//! Route registration.
//!
//! [`RouteIngress`] turns each desired LRP into router registration messages and queues them;
//! [`RouteEmitter`] drains the queue and publishes every message through a [`Publisher`].

mod error;
pub use error::RouteError;

mod message;
pub use message::RegistryMessage;

mod publisher;
pub use publisher::{HttpPublisher, LogPublisher, Publisher, REGISTER_SUBJECT};

mod emitter;
pub use emitter::RouteEmitter;

mod ingress;
pub use ingress::RouteIngress;
