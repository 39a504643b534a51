//! Entity types shipped with the client
//!
//! Any other entity can be used with the service by implementing
//! [`Entity`](crate::Entity) and, for writes, [`Persistable`](crate::Persistable).

pub mod attachable;
pub mod customer;
pub mod vendor;

pub use attachable::{Attachable, AttachableRef};
pub use customer::Customer;
pub use vendor::Vendor;
