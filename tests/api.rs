//! HTTP API tests.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; no
//! socket is opened.

#![cfg(feature = "server")]

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pdf_overlay::config::ServerConfig;
use pdf_overlay::pipeline::encoding::encode_win_ansi;
use pdf_overlay::server::{router, AppState};
use pdf_overlay::OverlayConfig;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----pdfoverlaytestboundary";

// ── Test helpers ─────────────────────────────────────────────────────────────

fn app() -> Router {
    app_with_limit(ServerConfig::default().max_upload_bytes)
}

fn app_with_limit(max_upload_bytes: usize) -> Router {
    let server = ServerConfig {
        max_upload_bytes,
        ..ServerConfig::default()
    };
    router(Arc::new(AppState::new(OverlayConfig::default(), &server)))
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/pdf\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "PDF Processor API is running");
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_returns_stamped_attachment() {
    let pdf = common::sample_pdf(3);
    let response = app()
        .oneshot(upload(
            "/process-pdf/",
            &[
                Part::File("pdf_file", "relatorio.pdf", &pdf),
                Part::Text("nome", "Maria Silva"),
                Part::Text("telefone", "+55 11 91234-5678"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=modified_relatorio.pdf"
    );

    let out = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(out.starts_with(b"%PDF-"));
    assert_eq!(common::page_count(&out), 3);

    let cover = common::shown_strings(&out, 1);
    assert!(cover.contains(&b"Page 1".to_vec()), "original text kept");
    assert!(cover.contains(&b"Nome: Maria Silva".to_vec()));
    assert!(cover.contains(&b"Telefone: +55 11 91234-5678".to_vec()));
    assert!(cover.contains(&encode_win_ansi("Diagnóstico Hormonal Personalizado").bytes));
    assert!(cover.iter().any(|s| s.starts_with(b"Data: ")));

    // Later pages pass through untouched.
    assert_eq!(common::shown_strings(&out, 2), vec![b"Page 2".to_vec()]);
    assert_eq!(common::shown_strings(&out, 3), vec![b"Page 3".to_vec()]);
}

#[tokio::test]
async fn route_without_trailing_slash_is_accepted() {
    let pdf = common::sample_pdf(1);
    let response = app()
        .oneshot(upload(
            "/process-pdf",
            &[
                Part::Text("nome", "Ana"),
                Part::Text("telefone", "123"),
                Part::File("pdf_file", "a.pdf", &pdf),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unsafe_upload_names_are_sanitised() {
    let pdf = common::sample_pdf(1);
    let response = app()
        .oneshot(upload(
            "/process-pdf/",
            &[
                Part::File("pdf_file", "../capa;x.pdf", &pdf),
                Part::Text("nome", "Ana"),
                Part::Text("telefone", "123"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=modified_capa_x.pdf"
    );
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_fields_are_listed() {
    let response = app()
        .oneshot(upload("/process-pdf/", &[Part::Text("nome", "Ana")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    let missing: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["loc"][1].as_str().unwrap())
        .collect();
    assert_eq!(missing, vec!["pdf_file", "telefone"]);
}

#[tokio::test]
async fn non_pdf_upload_is_a_client_error() {
    let response = app()
        .oneshot(upload(
            "/process-pdf/",
            &[
                Part::File("pdf_file", "notes.pdf", b"just some text"),
                Part::Text("nome", "Ana"),
                Part::Text("telefone", "123"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn document_without_pages_is_rejected() {
    let pdf = common::empty_pdf();
    let response = app()
        .oneshot(upload(
            "/process-pdf/",
            &[
                Part::File("pdf_file", "vazio.pdf", &pdf),
                Part::Text("nome", "Ana"),
                Part::Text("telefone", "123"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["detail"], "O PDF original não contém páginas.");
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let pdf = common::sample_pdf(1);
    let response = app_with_limit(64)
        .oneshot(upload(
            "/process-pdf/",
            &[
                Part::File("pdf_file", "big.pdf", &pdf),
                Part::Text("nome", "Ana"),
                Part::Text("telefone", "123"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn encrypted_upload_is_a_client_error() {
    let pdf = common::encrypted_pdf();
    let response = app()
        .oneshot(upload(
            "/process-pdf/",
            &[
                Part::File("pdf_file", "protegido.pdf", &pdf),
                Part::Text("nome", "Ana"),
                Part::Text("telefone", "123"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn corrupt_upload_is_a_client_error() {
    let pdf = common::corrupt_pdf();
    let response = app()
        .oneshot(upload(
            "/process-pdf/",
            &[
                Part::File("pdf_file", "quebrado.pdf", &pdf),
                Part::Text("nome", "Ana"),
                Part::Text("telefone", "123"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn non_multipart_body_gets_json_detail() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/process-pdf/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Erro ao ler o arquivo PDF: "));
}
