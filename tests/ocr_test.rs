mod common;

use std::sync::Arc;
use std::time::Duration;

use conduit::config::OcrSettings;
use conduit::item::WorkItem;
use conduit::manager::EngineManager;
use conduit::outcome::Failure;
use conduit::processor::{OcrProcessor, Processor, ProcessorConfig};
use conduit::registry::EngineRegistry;
use conduit::request::decode_content;
use conduit::routing::Channel;
use serde_json::json;

use common::{Reply, Responder, closed_port};

fn settings(port: u16) -> OcrSettings {
    OcrSettings {
        host: "127.0.0.1".to_string(),
        port,
        timeout_secs: 5,
        ..Default::default()
    }
}

async fn processor(settings: OcrSettings) -> OcrProcessor {
    let registry = Arc::new(EngineRegistry::with_builtins().await);
    OcrProcessor::new(
        Arc::new(EngineManager::new(registry)),
        settings,
        ProcessorConfig::default(),
    )
}

fn image() -> WorkItem {
    WorkItem::new("Hello").with_attribute("filename", "scan.png")
}

#[tokio::test]
async fn success_keeps_original_and_extracts_text() {
    let server = Responder::start(Reply::ok(
        "plain/text; charset=utf-8",
        "Élément extrait".as_bytes(),
    ))
    .await;
    let p = processor(settings(server.port)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].channel, Channel::Success);
    assert_eq!(out[0].item, image());
    assert_eq!(out[1].channel, Channel::Extracted);
    assert_eq!(
        String::from_utf8(out[1].item.content().to_vec()).unwrap(),
        "Élément extrait"
    );
    assert_eq!(out[1].item.attribute("filename"), Some("scan.png"));
    assert_eq!(out[1].item.attribute("charset"), Some("utf-8"));
    assert_eq!(out[1].item.attribute("response.charset"), Some("utf-8"));
}

#[tokio::test]
async fn request_carries_base64_and_default_engine() {
    let server = Responder::start(Reply::ok("text/plain", "ok")).await;
    let p = processor(settings(server.port)).await;

    p.process(image()).await.unwrap();
    let body = server.request_json(0);
    assert_eq!(body, json!({"engine": "tesseract", "img_base64": "SGVsbG8="}));
    assert_eq!(
        decode_content(body["img_base64"].as_str().unwrap()).unwrap(),
        b"Hello"
    );
}

#[tokio::test]
async fn undeclared_charset_uses_default() {
    // "café" in ISO-8859-1
    let server = Responder::start(Reply::ok("text/plain", vec![b'c', b'a', b'f', 0xe9])).await;
    let p = processor(settings(server.port)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(out[1].item.content(), "café".as_bytes());
    assert_eq!(out[1].item.attribute("charset"), Some("utf-8"));
    assert_eq!(out[1].item.attribute("response.charset"), Some("ISO-8859-1"));
}

#[tokio::test]
async fn server_error_routes_original_to_failure() {
    let server = Responder::start(Reply::status("500 Internal Server Error")).await;
    let p = processor(settings(server.port)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].channel, Channel::Failure);
    assert_eq!(out[0].item, image());
    assert_eq!(
        out[0].failure,
        Some(Failure::RemoteStatus {
            code: 500,
            reason: "Internal Server Error".to_string()
        })
    );
}

#[tokio::test]
async fn server_reason_phrase_kept() {
    let server = Responder::start(Reply::status("503 Maintenance")).await;
    let p = processor(settings(server.port)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(
        out[0].failure,
        Some(Failure::RemoteStatus {
            code: 503,
            reason: "Maintenance".to_string()
        })
    );
}

#[tokio::test]
async fn body_invalid_under_charset_is_a_serialization_failure() {
    let server = Responder::start(Reply::ok(
        "text/plain; charset=utf-8",
        vec![b'o', b'k', 0xff, 0xfe],
    ))
    .await;
    let p = processor(settings(server.port)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].channel, Channel::Failure);
    assert_eq!(out[0].item, image());
    assert!(matches!(out[0].failure, Some(Failure::Serialization { .. })));
}

#[tokio::test]
async fn unknown_charset_is_a_serialization_failure() {
    let server = Responder::start(Reply::ok("text/plain; charset=x-made-up", "ok")).await;
    let p = processor(settings(server.port)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(out[0].channel, Channel::Failure);
    assert!(matches!(out[0].failure, Some(Failure::Serialization { .. })));
}

#[tokio::test]
async fn no_server_is_a_transport_failure() {
    let p = processor(settings(closed_port().await)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(out[0].channel, Channel::Failure);
    assert!(matches!(out[0].failure, Some(Failure::Transport { .. })));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = Responder::start(Reply::ok("text/plain", "late").delayed(Duration::from_secs(3))).await;
    let p = processor(OcrSettings {
        timeout_secs: 1,
        ..settings(server.port)
    })
    .await;

    let out = p.process(image()).await.unwrap();
    assert!(matches!(out[0].failure, Some(Failure::Transport { .. })));
}

#[tokio::test]
async fn empty_image_never_sent() {
    let server = Responder::start(Reply::ok("text/plain", "ok")).await;
    let p = processor(settings(server.port)).await;

    let out = p.process(WorkItem::new(Vec::new())).await.unwrap();
    assert_eq!(out[0].failure, Some(Failure::EmptyInput));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn preprocessors_parsed_into_payload() {
    let server = Responder::start(Reply::ok("text/plain", "ok")).await;
    let p = processor(OcrSettings {
        preprocessors: Some("convert-pdf, stroke-width-transform,mock".to_string()),
        ..settings(server.port)
    })
    .await;

    p.process(image()).await.unwrap();
    assert_eq!(
        server.request_json(0)["preprocessors"],
        json!(["convert-pdf", "stroke-width-transform", "mock"])
    );
}

#[tokio::test]
async fn engine_args_from_attributes_merge_over_defaults() {
    let server = Responder::start(Reply::ok("text/plain", "ok")).await;
    let mut s = OcrSettings {
        engine_args: Some(r#"{"lang": "${lang}"}"#.to_string()),
        ..settings(server.port)
    };
    s.default_engine_args.insert("lang".to_string(), json!("eng"));
    s.default_engine_args.insert("psm".to_string(), json!(3));
    let p = processor(s).await;

    p.process(image().with_attribute("lang", "fra")).await.unwrap();
    assert_eq!(
        server.request_json(0)["engine_args"],
        json!({"lang": "fra", "psm": 3})
    );
}

#[tokio::test]
async fn malformed_engine_args_fail_the_item_only() {
    let server = Responder::start(Reply::ok("text/plain", "ok")).await;
    let p = processor(OcrSettings {
        engine_args: Some("{broken".to_string()),
        ..settings(server.port)
    })
    .await;

    let out = p.process(image()).await.unwrap();
    assert!(matches!(out[0].failure, Some(Failure::Serialization { .. })));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn endpoint_change_moves_to_new_server() {
    let first = Responder::start(Reply::ok("text/plain", "first")).await;
    let second = Responder::start(Reply::ok("text/plain", "second")).await;
    let p = processor(settings(first.port)).await;

    let out = p.process(image()).await.unwrap();
    assert_eq!(out[1].item.content(), b"first");

    p.set_settings(settings(second.port)).await;
    let out = p.process(image()).await.unwrap();
    assert_eq!(out[1].item.content(), b"second");
    assert_eq!(first.requests().len(), 1);
    assert_eq!(second.requests().len(), 1);
}
