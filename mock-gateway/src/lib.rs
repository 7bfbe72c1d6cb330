//! In-memory stand-in for the SchlundTech XML gateway.
//!
//! Speaks the gateway's XML protocol on a single POST endpoint and supports
//! the two tasks the client uses: `0205` (zone query) and `0202001` (zone
//! update with `rr_add` / `rr_rem`).

pub mod wire;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

use wire::{leaf, response, Element};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub kind: String,
    pub value: String,
    pub ttl: String,
}

#[derive(Clone, Debug)]
pub struct Zone {
    pub system_ns: String,
    pub soa: Vec<(String, String)>,
    pub records: Vec<Record>,
}

/// Gateway state: accepted credentials, zones, and failure injection.
#[derive(Clone, Debug)]
pub struct Gateway {
    pub user: String,
    pub password: String,
    pub context: String,
    pub zones: HashMap<String, Zone>,
    /// When set, every zone update fails with this status text.
    pub update_failure: Option<String>,
    /// Number of zone updates that were applied.
    pub updates: usize,
}

impl Gateway {
    pub fn new(user: &str, password: &str, context: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
            context: context.to_string(),
            zones: HashMap::new(),
            update_failure: None,
            updates: 0,
        }
    }

    pub fn with_zone(mut self, name: &str, system_ns: &str) -> Self {
        self.zones.insert(
            name.to_string(),
            Zone {
                system_ns: system_ns.to_string(),
                soa: vec![
                    ("refresh".to_string(), "43200".to_string()),
                    ("retry".to_string(), "7200".to_string()),
                    ("expire".to_string(), "1209600".to_string()),
                    ("ttl".to_string(), "86400".to_string()),
                ],
                records: Vec::new(),
            },
        );
        self
    }

    pub fn with_record(mut self, zone: &str, name: &str, kind: &str, value: &str) -> Self {
        if let Some(z) = self.zones.get_mut(zone) {
            z.records.push(Record {
                name: name.to_string(),
                kind: kind.to_string(),
                value: value.to_string(),
                ttl: "600".to_string(),
            });
        }
        self
    }

    pub fn failing_updates(mut self, text: &str) -> Self {
        self.update_failure = Some(text.to_string());
        self
    }

    pub fn records(&self, zone: &str) -> Vec<Record> {
        self.zones
            .get(zone)
            .map(|z| z.records.clone())
            .unwrap_or_default()
    }

    fn handle(&mut self, request: &Element) -> String {
        let authenticated = request.text_at(&["auth", "user"]) == Some(self.user.as_str())
            && request.text_at(&["auth", "password"]) == Some(self.password.as_str())
            && request.text_at(&["auth", "context"]) == Some(self.context.as_str());
        if !authenticated {
            return response("error", "E0001", "Authentication failed", None);
        }

        let Some(task) = request.child("task") else {
            return response("error", "E0002", "Missing task", None);
        };
        match task.text_at(&["code"]) {
            Some("0205") => self.zone_info(task),
            Some("0202001") => self.zone_update(task),
            _ => response("error", "E0003", "Unknown task", None),
        }
    }

    fn zone_info(&self, task: &Element) -> String {
        let name = task.text_at(&["zone", "name"]).unwrap_or_default();
        let Some(zone) = self.zones.get(name) else {
            return response("error", "E0205", "Zone not found", None);
        };

        let soa: String = zone.soa.iter().map(|(k, v)| leaf(k, v)).collect();
        let records: String = zone
            .records
            .iter()
            .map(|r| {
                format!(
                    "<rr>{}{}{}{}</rr>",
                    leaf("name", &r.name),
                    leaf("type", &r.kind),
                    leaf("value", &r.value),
                    leaf("ttl", &r.ttl)
                )
            })
            .collect();
        let data = format!(
            "<zone>{}{}<soa>{soa}</soa>{records}</zone>",
            leaf("name", name),
            leaf("system_ns", &zone.system_ns),
        );
        response("success", "S0205", "Zone successfully inquired", Some(data))
    }

    fn zone_update(&mut self, task: &Element) -> String {
        let name = task.text_at(&["zone", "name"]).unwrap_or_default();
        let system_ns = task.text_at(&["zone", "system_ns"]).unwrap_or_default();
        let Some(zone) = self.zones.get_mut(name) else {
            return response("error", "E0202", "Zone not found", None);
        };
        if zone.system_ns != system_ns {
            return response("error", "E0202", "Name server mismatch", None);
        }
        if let Some(text) = &self.update_failure {
            return response("error", "E0202", text, None);
        }
        let Some(default) = task.child("default") else {
            return response("error", "E0202", "Missing default", None);
        };

        // A rejected update leaves the zone untouched.
        let mut records = zone.records.clone();
        for added in default.children.iter().filter(|c| c.name == "rr_add") {
            records.push(record_from(added));
        }
        for removed in default.children.iter().filter(|c| c.name == "rr_rem") {
            let target = record_from(removed);
            let before = records.len();
            records.retain(|r| {
                !(r.name == target.name && r.kind == target.kind && r.value == target.value)
            });
            if records.len() == before {
                return response("error", "E0202", "Resource record not found", None);
            }
        }
        zone.records = records;
        self.updates += 1;
        response("success", "S0202", "Zone successfully updated", None)
    }
}

fn record_from(element: &Element) -> Record {
    let field = |name: &str| element.text_at(&[name]).unwrap_or_default().to_string();
    Record {
        name: field("name"),
        kind: field("type"),
        value: field("value"),
        ttl: field("ttl"),
    }
}

pub type Db = Arc<RwLock<Gateway>>;

pub fn app(db: Db) -> Router {
    Router::new().route("/", post(handle)).with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app(db)).await
}

async fn handle(State(db): State<Db>, body: String) -> impl IntoResponse {
    let request = match wire::parse(&body) {
        Ok(request) => request,
        Err(reason) => {
            debug!(%reason, "rejecting unparsable request");
            return (StatusCode::BAD_REQUEST, [(header::CONTENT_TYPE, "text/plain")], reason);
        }
    };
    let reply = db.write().await.handle(&request);
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/xml")], reply)
}
