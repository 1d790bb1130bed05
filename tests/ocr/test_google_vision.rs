// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Cloud Vision client tests: API key and service-account authentication
//! against in-process fakes of the annotate and token endpoints.

use pole_vision_node::ocr::{GoogleVisionClient, OcrConfig, OcrError, TextDetector};
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

use crate::common::{FakeTokenServer, FakeVisionApi};

const KEY_JSON: &str = include_str!("../fixtures/service_account.json");

/// Fixture key rewritten to exchange tokens at `token_uri`
fn key_file(token_uri: &str) -> NamedTempFile {
    let mut key: Value = serde_json::from_str(KEY_JSON).unwrap();
    key["token_uri"] = Value::String(token_uri.to_string());

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(key.to_string().as_bytes()).unwrap();
    file
}

#[cfg(test)]
mod google_vision_tests {
    use super::*;

    #[tokio::test]
    async fn test_api_key_request() {
        let api = FakeVisionApi::start("TRANSFORMADOR\n45 kVA").await;
        let client = GoogleVisionClient::new(&OcrConfig {
            api_key: Some("k-123".to_string()),
            endpoint: api.url.clone(),
            ..OcrConfig::default()
        })
        .unwrap();

        let text = client.detect_text(b"\xff\xd8\xff\xe0jpeg").await.unwrap();
        assert_eq!(text, "TRANSFORMADOR\n45 kVA");

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].key.as_deref(), Some("k-123"));
        assert!(calls[0].authorization.is_none());
        assert_eq!(
            calls[0].body["requests"][0]["image"]["content"],
            "/9j/4GpwZWc="
        );
    }

    #[tokio::test]
    async fn test_service_account_token_exchanged_once() {
        let tokens = FakeTokenServer::start().await;
        let api = FakeVisionApi::start("WEG").await;
        let key = key_file(&tokens.url);

        let client = GoogleVisionClient::new(&OcrConfig {
            credentials_path: Some(key.path().to_path_buf()),
            endpoint: api.url.clone(),
            ..OcrConfig::default()
        })
        .unwrap();

        for _ in 0..2 {
            assert_eq!(client.detect_text(b"jpeg").await.unwrap(), "WEG");
        }

        let grants = tokens.grants();
        assert_eq!(grants.len(), 1);
        assert_eq!(
            grants[0]["grant_type"],
            "urn:ietf:params:oauth:grant-type:jwt-bearer"
        );
        assert_eq!(grants[0]["assertion"].split('.').count(), 3);

        for call in api.calls() {
            assert_eq!(call.authorization.as_deref(), Some("Bearer ya29.test-token"));
            assert!(call.key.is_none());
        }
    }

    #[tokio::test]
    async fn test_token_inside_expiry_margin_is_refreshed() {
        // 30 s of validity is already inside the 60 s refresh margin
        let tokens = FakeTokenServer::start_with_expiry(30).await;
        let api = FakeVisionApi::start("WEG").await;
        let key = key_file(&tokens.url);

        let client = GoogleVisionClient::new(&OcrConfig {
            credentials_path: Some(key.path().to_path_buf()),
            endpoint: api.url.clone(),
            ..OcrConfig::default()
        })
        .unwrap();

        client.detect_text(b"jpeg").await.unwrap();
        client.detect_text(b"jpeg").await.unwrap();

        assert_eq!(tokens.grants().len(), 2);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_file() {
        let err = GoogleVisionClient::new(&OcrConfig {
            credentials_path: Some("/nonexistent/key.json".into()),
            ..OcrConfig::default()
        })
        .err()
        .unwrap();

        assert!(matches!(err, OcrError::Credentials(_)));
    }

    #[tokio::test]
    async fn test_unreachable_api() {
        let client = GoogleVisionClient::new(&OcrConfig {
            api_key: Some("k".to_string()),
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..OcrConfig::default()
        })
        .unwrap();

        let err = client.detect_text(b"jpeg").await.unwrap_err();
        assert!(matches!(err, OcrError::Request(_)));
    }
}
