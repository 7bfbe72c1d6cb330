//! Error types for the gateway client.
//!
//! # Design
//! A broken connection and a response the client cannot make sense of are
//! different failures, so `Transport` and `Protocol` are separate variants.
//! `Conflict` is kept apart from `RecordUpdate` because it needs an operator
//! to remove a stale record rather than a retry. Raw wire content is logged
//! before these errors are returned; only `Protocol` also keeps the raw body.

use std::fmt;

use thiserror::Error;

use crate::xml::XmlError;

/// Which zone update a `RecordUpdate` failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    Add,
    Remove,
}

impl fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateAction::Add => write!(f, "add"),
            UpdateAction::Remove => write!(f, "remove"),
        }
    }
}

/// Errors returned by `GatewayClient` operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request could not be encoded as XML.
    #[error("unable to serialize {field}={value}")]
    Serialization { field: String, value: String },

    /// The gateway could not be reached or answered with a non-2xx status.
    #[error("communication error while calling the gateway: {}", transport_detail(.status, .reason))]
    Transport { status: Option<u16>, reason: String },

    /// The gateway answered without a recognizable `result`.
    #[error("unexpected response received from {endpoint}")]
    Protocol { endpoint: String, response: String },

    /// The gateway could not resolve the domain to a zone.
    #[error("unable to find a zone for {domain}")]
    ZoneNotFound { domain: String },

    /// A record with the target name already holds a different value.
    #[error("TXT record {name} for {domain} already exists with a different value")]
    Conflict {
        domain: String,
        name: String,
        existing: String,
    },

    /// The gateway rejected a zone update.
    #[error("unable to {action} TXT record for {domain}: {name}{}", status_suffix(.status_text))]
    RecordUpdate {
        action: UpdateAction,
        domain: String,
        name: String,
        status_text: Option<String>,
    },
}

impl From<XmlError> for GatewayError {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::Serialization { field, value } => GatewayError::Serialization { field, value },
            // Outbound documents are built by us; a malformed one can only
            // mean a value the writer refused.
            XmlError::Malformed(reason) => GatewayError::Serialization {
                field: "request".to_string(),
                value: reason,
            },
        }
    }
}

fn transport_detail(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(status) => format!("HTTP {status}, {reason}"),
        None => reason.to_string(),
    }
}

fn status_suffix(text: &Option<String>) -> String {
    match text {
        Some(text) => format!("\n{text}"),
        None => String::new(),
    }
}
