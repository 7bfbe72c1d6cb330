use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_gateway::{app, wire, Db, Gateway};
use tokio::sync::RwLock;
use tower::ServiceExt;

fn db() -> Db {
    Arc::new(RwLock::new(
        Gateway::new("54321", "PASSWORD", "10").with_zone("example.com", "a.ns.de"),
    ))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn xml_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(http::header::CONTENT_TYPE, "text/xml")
        .body(body.to_string())
        .unwrap()
}

fn task(task: &str) -> String {
    format!(
        "<request><auth><user>54321</user><password>PASSWORD</password><context>10</context></auth>\
         <language>en</language><task>{task}</task></request>"
    )
}

// --- zone query ---

#[tokio::test]
async fn zone_query_returns_zone() {
    let resp = app(db())
        .oneshot(xml_request(&task(
            "<code>0205</code><zone><name>example.com</name></zone>",
        )))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let root = wire::parse(&body_string(resp).await).unwrap();
    assert_eq!(root.name, "response");
    assert_eq!(root.text_at(&["result", "status", "type"]), Some("success"));
    assert_eq!(
        root.text_at(&["result", "data", "zone", "system_ns"]),
        Some("a.ns.de")
    );
    assert!(root
        .child("result")
        .and_then(|r| r.child("data"))
        .and_then(|d| d.child("zone"))
        .and_then(|z| z.child("rr"))
        .is_none());
}

// --- malformed input ---

#[tokio::test]
async fn unparsable_body_returns_400() {
    let resp = app(db()).oneshot(xml_request("<request><auth>")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_is_not_routed() {
    let resp = app(db())
        .oneshot(Request::builder().uri("/").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// --- update lifecycle ---

#[tokio::test]
async fn update_lifecycle() {
    use tower::Service;

    let db = db();
    let mut app = app(db.clone()).into_service();
    let zone = "<zone><name>example.com</name><system_ns>a.ns.de</system_ns></zone>";
    let rr = "<name>_acme-challenge</name><type>TXT</type><value>TOKEN</value><ttl>60</ttl>";

    // add
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(xml_request(&task(&format!(
            "<code>0202001</code>{zone}<default><rr_add>{rr}</rr_add></default>"
        ))))
        .await
        .unwrap();
    let root = wire::parse(&body_string(resp).await).unwrap();
    assert_eq!(root.text_at(&["result", "status", "type"]), Some("success"));
    assert_eq!(db.read().await.records("example.com").len(), 1);

    // query shows the record
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(xml_request(&task(
            "<code>0205</code><zone><name>example.com</name></zone>",
        )))
        .await
        .unwrap();
    let root = wire::parse(&body_string(resp).await).unwrap();
    assert_eq!(
        root.text_at(&["result", "data", "zone", "rr", "value"]),
        Some("TOKEN")
    );

    // remove
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(xml_request(&task(&format!(
            "<code>0202001</code>{zone}<default><rr_rem>{rr}</rr_rem></default>"
        ))))
        .await
        .unwrap();
    let root = wire::parse(&body_string(resp).await).unwrap();
    assert_eq!(root.text_at(&["result", "status", "type"]), Some("success"));
    assert!(db.read().await.records("example.com").is_empty());
    assert_eq!(db.read().await.updates, 2);
}
