//! Typed client for the QuickBooks Online v3 accounting API
//!
//! Requests are sent over an injected [`AuthenticatedTransport`] and the XML
//! responses are translated into typed entities or typed failures:
//!
//! 1. [`request`] builds resource and paginated query URLs for one company.
//! 2. [`adapter`] adds the standard XML headers and hands the call to the transport.
//! 3. [`xml`] parses the body once; [`classify`] decides success or failure,
//!    remembering that an HTTP 200 can still carry a `<Fault>`.
//! 4. Failures carry a normalized record from [`fault`]; successes are
//!    projected into [`Entity`] values.
//!
//! ```rust,ignore
//! use qbo_api::{QboClient, ServiceConfig};
//! use qbo_api::entities::Customer;
//!
//! let mut client = QboClient::from_config(&ServiceConfig::from_env()?)?;
//! match client.fetch_by_id::<Customer>("42")? {
//!     Some(customer) => println!("{:?}", customer.display_name),
//!     None => println!("no such customer"),
//! }
//! ```

pub mod adapter;
pub mod classify;
pub mod client;
pub mod config;
pub mod entities;
pub mod entity;
pub mod error;
pub mod fault;
pub mod logging;
pub mod request;
pub mod xml;

pub use client::QboClient;
pub use config::{Environment, ServiceConfig};
pub use entity::{Entity, EntityError, Persistable};
pub use error::{ApiError, IntuitRequestError, Result};
pub use fault::ErrorRecord;
pub use request::QuerySpec;
pub use xml::{Collection, Document};

pub use qbo_transport::{
    AuthenticatedTransport, BearerTransport, HeaderMap, HeaderValue, Part, RawResponse, TransportError,
};
