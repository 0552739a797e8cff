//! Value types shared by the desire pipeline.
//!
//! The `domain` half holds the internal LRP / Task representation, the `cf` half holds
//! the platform-shaped wire types the control plane sends and receives.

mod domain;
pub use domain::*;

mod cf;
pub use cf::*;
