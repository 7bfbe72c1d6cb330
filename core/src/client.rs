//! Gateway client: zone lookup and TXT record add/remove.
//!
//! # Design
//! `GatewayClient` holds its credentials, the record TTL, the endpoint and a
//! `Transport`, none of which change after construction. Every gateway call
//! is split the same way the rest of the crate splits I/O: `build_request`
//! turns a `Task` into an `HttpRequest`, the transport performs exactly one
//! round trip, and `parse_response` classifies the `HttpResponse`. The domain
//! operations are sequences of such calls with the decision logic in between.

use tracing::{debug, info};

use crate::error::{GatewayError, UpdateAction};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    Credentials, ResourceRecord, Status, Task, Zone, TASK_ZONE_INFO, TASK_ZONE_UPDATE,
};
use crate::value::{Map, Value};
use crate::xml;

/// The SchlundTech XML gateway endpoint.
pub const GATEWAY_URL: &str = "https://gateway.schlundtech.de";

/// Client for the SchlundTech XML gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient<T = UreqTransport> {
    credentials: Credentials,
    ttl: u32,
    endpoint: String,
    transport: T,
}

impl GatewayClient<UreqTransport> {
    /// Client for the public gateway using a default blocking transport.
    pub fn new(credentials: Credentials, ttl: u32) -> Self {
        Self {
            credentials,
            ttl,
            endpoint: GATEWAY_URL.to_string(),
            transport: UreqTransport::new(),
        }
    }
}

impl<T: Transport> GatewayClient<T> {
    /// Replace the transport, e.g. with one that has a timeout.
    pub fn with_transport<U: Transport>(self, transport: U) -> GatewayClient<U> {
        GatewayClient {
            credentials: self.credentials,
            ttl: self.ttl,
            endpoint: self.endpoint,
            transport,
        }
    }

    /// Point the client at another endpoint (a mock gateway, a proxy).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Wrap `task` with authentication and encode it as a gateway request.
    pub fn build_request(&self, task: &Task) -> Result<HttpRequest, GatewayError> {
        let request = Map::new()
            .with("auth", self.credentials.to_value())
            .with("language", "en")
            .with("task", task.to_value());
        let body = xml::marshal("request", &request)?;
        let body = String::from_utf8(body).map_err(|e| GatewayError::Serialization {
            field: "request".to_string(),
            value: e.to_string(),
        })?;
        Ok(HttpRequest {
            url: self.endpoint.clone(),
            headers: vec![("content-type".to_string(), "text/xml".to_string())],
            body,
        })
    }

    /// Classify a gateway response and extract its `result`.
    pub fn parse_response(&self, task: &Task, response: HttpResponse) -> Result<Value, GatewayError> {
        if !response.is_success() {
            log_call_error(&self.endpoint, task, Some(&response.body), None);
            return Err(GatewayError::Transport {
                status: Some(response.status),
                reason: response
                    .reason
                    .unwrap_or_else(|| "unexpected HTTP status".to_string()),
            });
        }

        let result = match xml::unmarshal(response.body.as_bytes()) {
            Ok(Some(Value::Map(mut document))) => document.remove("result"),
            Ok(_) => None,
            Err(e) => {
                log_call_error(&self.endpoint, task, Some(&response.body), Some(&e));
                return Err(self.unexpected(response.body));
            }
        };
        match result {
            Some(result) => Ok(result),
            None => {
                log_call_error(&self.endpoint, task, Some(&response.body), None);
                Err(self.unexpected(response.body))
            }
        }
    }

    /// Send one task and return the `result` of the response.
    pub fn call(&self, task: &Task) -> Result<Value, GatewayError> {
        let request = self.build_request(task)?;
        let response = self.transport.execute(request).map_err(|e| {
            log_call_error(&self.endpoint, task, None, Some(&e));
            e
        })?;
        self.parse_response(task, response)
    }

    /// Look up the zone serving `domain`.
    pub fn zone_info(&self, domain: &str) -> Result<Zone, GatewayError> {
        let task = Task {
            code: TASK_ZONE_INFO,
            zone: Value::Map(Map::new().with("name", domain)),
            default: None,
        };
        let result = self.call(&task)?;
        if !Status::from_result(&result).is_success() {
            debug!(domain, response = %result, "failed retrieving zone");
            return Err(GatewayError::ZoneNotFound {
                domain: domain.to_string(),
            });
        }
        result
            .path(&["data", "zone"])
            .and_then(Zone::from_value)
            .ok_or_else(|| {
                debug!(domain, response = %result, "zone lookup succeeded without zone data");
                self.unexpected(result.to_string())
            })
    }

    /// Publish a TXT record, succeeding without a change when the record is
    /// already present with the same value.
    pub fn add_txt_record(&self, domain: &str, record_name: &str, value: &str) -> Result<(), GatewayError> {
        let zone = self.zone_info(domain)?;
        let name = strip_domain(domain, record_name);

        let existing: Vec<&ResourceRecord> = zone.records_named(&name).collect();
        if existing.iter().any(|rr| rr.value == value) {
            debug!(record_name, "record already exists with identical value");
            return Ok(());
        }
        if let Some(rr) = existing.first() {
            debug!(record_name, existing = %rr.value, "record already exists with a different value");
            return Err(GatewayError::Conflict {
                domain: domain.to_string(),
                name: record_name.to_string(),
                existing: rr.value.clone(),
            });
        }

        let task = Task {
            code: TASK_ZONE_UPDATE,
            zone: zone_ref(domain, &zone),
            default: Some(Value::Map(
                Map::new()
                    .with("rr_add", self.txt_record(&name, value))
                    .with_opt("soa", zone.soa.clone()),
            )),
        };
        let result = self.call(&task)?;
        check_update(&result, UpdateAction::Add, domain, record_name)?;
        info!(domain, record_name, "TXT record added");
        Ok(())
    }

    /// Remove a TXT record.
    pub fn del_txt_record(&self, domain: &str, record_name: &str, value: &str) -> Result<(), GatewayError> {
        let zone = self.zone_info(domain)?;
        let name = strip_domain(domain, record_name);

        let task = Task {
            code: TASK_ZONE_UPDATE,
            zone: zone_ref(domain, &zone),
            default: Some(Value::Map(
                Map::new().with("rr_rem", self.txt_record(&name, value)),
            )),
        };
        let result = self.call(&task)?;
        check_update(&result, UpdateAction::Remove, domain, record_name)?;
        info!(domain, record_name, "TXT record removed");
        Ok(())
    }

    fn txt_record(&self, name: &str, value: &str) -> Value {
        Value::Map(
            Map::new()
                .with("name", name)
                .with("type", "TXT")
                .with("value", value)
                .with("ttl", self.ttl),
        )
    }

    fn unexpected(&self, response: String) -> GatewayError {
        GatewayError::Protocol {
            endpoint: self.endpoint.clone(),
            response,
        }
    }
}

/// Strip the literal suffix `"." + domain` from `fqdn`.
///
/// This is a plain string operation: `notexample.com` is not inside
/// `example.com`, and `fqdn == domain` is returned unchanged.
pub fn strip_domain(domain: &str, fqdn: &str) -> String {
    fqdn.strip_suffix(domain)
        .and_then(|head| head.strip_suffix('.'))
        .unwrap_or(fqdn)
        .to_string()
}

fn zone_ref(domain: &str, zone: &Zone) -> Value {
    Value::Map(
        Map::new()
            .with("name", domain)
            .with("system_ns", zone.system_ns.as_str()),
    )
}

fn check_update(
    result: &Value,
    action: UpdateAction,
    domain: &str,
    record_name: &str,
) -> Result<(), GatewayError> {
    let status = Status::from_result(result);
    if status.is_success() {
        return Ok(());
    }
    debug!(%action, domain, record_name, response = %result, "zone update rejected");
    Err(GatewayError::RecordUpdate {
        action,
        domain: domain.to_string(),
        name: record_name.to_string(),
        status_text: status.text,
    })
}

/// Record a failed call. Only the task is logged, never the credentials.
fn log_call_error(
    endpoint: &str,
    task: &Task,
    response: Option<&str>,
    error: Option<&dyn std::error::Error>,
) {
    debug!(endpoint, task = %task.to_value(), "error calling gateway");
    if let Some(response) = response {
        debug!(response, "gateway response");
    }
    if let Some(error) = error {
        debug!(error = %error, "gateway error");
    }
}
