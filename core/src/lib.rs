//! Client core for the SchlundTech XML gateway.
//!
//! # Overview
//! Publishes and removes the TXT records of a DNS-01 challenge through the
//! gateway's XML-over-HTTP protocol. Two layers:
//!
//! - `xml` converts untyped `Value` trees to and from XML without knowing
//!   anything about the gateway.
//! - `client` builds gateway tasks as value trees, sends them through a
//!   `Transport`, and turns the responses into typed results or
//!   `GatewayError`s.
//!
//! # Design
//! - `GatewayClient` is immutable after construction and keeps no session.
//! - Every call is one blocking round trip with no retry.
//! - `build_request` / `parse_response` expose the protocol without I/O for
//!   hosts that perform the HTTP exchange themselves.

pub mod client;
pub mod error;
pub mod http;
pub mod types;
pub mod value;
pub mod xml;

pub use client::{strip_domain, GatewayClient, GATEWAY_URL};
pub use error::{GatewayError, UpdateAction};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{Credentials, ResourceRecord, Status, Task, Zone};
pub use value::{Map, Value};
pub use xml::XmlError;
