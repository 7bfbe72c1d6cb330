//! Domain types read from and written to gateway value trees.
//!
//! # Design
//! These are typed views over the untyped `Value` trees the codec produces.
//! Reading is tolerant where the gateway omits empty fields (an apex record
//! has no `name` element at all) and strict only where the client cannot
//! proceed without the field, such as a zone's `system_ns`.

use std::fmt;

use serde::Deserialize;

use crate::value::{Map, Value};

/// Task code for a zone query.
pub const TASK_ZONE_INFO: &str = "0205";

/// Task code for a zone record update (`rr_add` / `rr_rem`).
pub const TASK_ZONE_UPDATE: &str = "0202001";

/// Gateway account credentials.
///
/// Owned by the caller and moved into each `GatewayClient`; the client never
/// keeps a session.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub context: String,
}

impl Credentials {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            context: context.into(),
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        Value::Map(
            Map::new()
                .with("user", self.user.as_str())
                .with("password", self.password.as_str())
                .with("context", self.context.as_str()),
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("context", &self.context)
            .finish()
    }
}

/// An outbound task: the `task` element of a gateway request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub code: &'static str,
    pub zone: Value,
    pub default: Option<Value>,
}

impl Task {
    pub fn to_value(&self) -> Value {
        Value::Map(
            Map::new()
                .with("code", self.code)
                .with("zone", self.zone.clone())
                .with_opt("default", self.default.clone()),
        )
    }
}

/// The `status` element of a gateway result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub kind: Option<String>,
    pub code: Option<String>,
    pub text: Option<String>,
}

impl Status {
    /// Read `result.status`; a missing status reads as an empty one, which is
    /// not a success.
    pub fn from_result(result: &Value) -> Self {
        let Some(status) = result.get("status") else {
            return Self::default();
        };
        Self {
            kind: status.get("type").and_then(Value::as_scalar).map(str::to_string),
            code: status.get("code").and_then(Value::as_scalar).map(str::to_string),
            text: status.get("text").and_then(joined_text),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind.as_deref() == Some("success")
    }
}

/// A resource record as reported inside a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Name relative to the zone; empty for the zone apex.
    pub name: String,
    pub kind: String,
    pub value: String,
    pub ttl: Option<u32>,
}

impl ResourceRecord {
    fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_scalar)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            name: field("name"),
            kind: field("type"),
            value: field("value"),
            ttl: value
                .get("ttl")
                .and_then(Value::as_scalar)
                .and_then(|ttl| ttl.trim().parse().ok()),
        }
    }
}

/// A zone as returned by a `0205` zone query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    pub name: String,
    pub system_ns: String,
    /// Start-of-authority data, passed back to the gateway untouched.
    pub soa: Option<Value>,
    pub rr: Vec<ResourceRecord>,
}

impl Zone {
    /// Read a zone from `result.data.zone`.
    ///
    /// Returns `None` when the value is not a map or lacks `system_ns`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_map()?;
        let system_ns = map.get("system_ns").and_then(Value::as_scalar)?.to_string();
        Some(Self {
            name: map
                .get("name")
                .and_then(Value::as_scalar)
                .unwrap_or_default()
                .to_string(),
            system_ns,
            soa: map.get("soa").cloned(),
            rr: map
                .get("rr")
                .map(|rr| rr.items().iter().map(ResourceRecord::from_value).collect())
                .unwrap_or_default(),
        })
    }

    /// Records whose relative name equals `name`.
    pub fn records_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ResourceRecord> + 'a {
        self.rr.iter().filter(move |rr| rr.name == name)
    }
}

fn joined_text(value: &Value) -> Option<String> {
    let lines: Vec<&str> = value.items().iter().filter_map(Value::as_scalar).collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}
