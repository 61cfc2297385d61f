//! Integration tests for wa-bridge.
//!
//! None of these need a running bridge daemon.
//!
//!   cargo test -p wa-bridge --test integration_tests

use std::time::Duration;

use wa_bridge::{
    BridgeClient, BridgeConfig, BridgeError, ConnectionState, DisconnectReason, OutgoingContent,
    Provider, ProviderEvent, WireMessage,
};

mod config_tests {
    use super::*;

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8090");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bridge_config_trims_trailing_slash() {
        let config = BridgeConfig::new("http://localhost:9000/");
        assert_eq!(config.rpc_url(), "http://localhost:9000/api/v1/rpc");
        assert_eq!(config.check_url(), "http://localhost:9000/api/v1/check");
    }

    #[test]
    fn test_bridge_config_events_url_encodes_auth() {
        let config = BridgeConfig::new("http://localhost:9000");
        assert_eq!(
            config.events_url("data/auth_491511234567"),
            "http://localhost:9000/api/v1/events?auth=data%2Fauth_491511234567"
        );
    }
}

mod event_tests {
    use super::*;

    #[test]
    fn test_parse_connection_close() {
        let data = r#"{"connection":"close","lastDisconnect":{"statusCode":515,"message":"restart required"}}"#;
        let event = ProviderEvent::from_sse("connection.update", data)
            .unwrap()
            .unwrap();

        let ProviderEvent::Connection(update) = event else {
            panic!("expected connection update");
        };
        assert_eq!(update.connection, Some(ConnectionState::Close));
        assert_eq!(update.status_code(), Some(515));
        assert_eq!(update.disconnect_reason(), DisconnectReason::RestartRequired);
    }

    #[test]
    fn test_parse_pairing_challenge() {
        let data = r#"{"qr":"2@abc,def"}"#;
        let event = ProviderEvent::from_sse("connection.update", data)
            .unwrap()
            .unwrap();

        let ProviderEvent::Connection(update) = event else {
            panic!("expected connection update");
        };
        assert_eq!(update.qr.as_deref(), Some("2@abc,def"));
        assert!(update.connection.is_none());
    }

    #[test]
    fn test_disconnect_reasons() {
        assert_eq!(
            DisconnectReason::from_status_code(Some(401)),
            DisconnectReason::Unauthorized
        );
        assert_eq!(
            DisconnectReason::from_status_code(Some(428)),
            DisconnectReason::Other(Some(428))
        );
        assert_eq!(
            DisconnectReason::from_status_code(None),
            DisconnectReason::Other(None)
        );
    }

    #[test]
    fn test_parse_history_batch() {
        let data = r#"{
            "messages": [{
                "key": {"remoteJid": "491511234567@s.whatsapp.net", "fromMe": false, "id": "ABC123"},
                "message": {"conversation": "hello"},
                "messageTimestamp": 1700000000,
                "pushName": "Alice",
                "broadcast": false
            }],
            "isLatest": true
        }"#;
        let event = ProviderEvent::from_sse("messaging-history.set", data)
            .unwrap()
            .unwrap();

        assert_eq!(event.name(), "messaging-history.set");
        let batch = event.batch().unwrap();
        assert_eq!(batch.len(), 1);

        let msg = &batch.messages[0];
        assert_eq!(msg.id(), Some("ABC123"));
        assert_eq!(msg.chat(), Some("491511234567@s.whatsapp.net"));
        assert!(!msg.from_me());
        assert_eq!(msg.timestamp_secs(), Some(1_700_000_000));
        assert_eq!(
            msg.message.as_ref().unwrap().conversation.as_deref(),
            Some("hello")
        );
        // Unknown fields survive for media download round-trips
        assert_eq!(msg.extra.get("broadcast"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn test_parse_nested_document_with_caption() {
        let data = r#"{"messages":[{"key":{"id":"D1"},"message":{"documentWithCaptionMessage":{"message":{"documentMessage":{"fileName":"report.pdf","caption":"Q3","url":"https://mmg.example/d1"}}}}}]}"#;
        let event = ProviderEvent::from_sse("messages.upsert", data)
            .unwrap()
            .unwrap();

        let content = event.batch().unwrap().messages[0].message.clone().unwrap();
        let inner = content
            .document_with_caption_message
            .and_then(|w| w.message)
            .and_then(|m| m.document_message)
            .unwrap();
        assert_eq!(inner.file_name.as_deref(), Some("report.pdf"));
        assert_eq!(inner.caption.as_deref(), Some("Q3"));
    }

    #[test]
    fn test_unknown_event_ignored() {
        assert!(ProviderEvent::from_sse("creds.update", "{}")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_event_is_error() {
        assert!(ProviderEvent::from_sse("messages.upsert", "not json").is_err());
    }
}

mod message_tests {
    use super::*;

    fn with_timestamp(value: serde_json::Value) -> WireMessage {
        WireMessage {
            message_timestamp: Some(value),
            ..Default::default()
        }
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(
            with_timestamp(serde_json::json!("1700000001")).timestamp_secs(),
            Some(1_700_000_001)
        );
        assert_eq!(
            with_timestamp(serde_json::json!({"low": 1700000002, "high": 0, "unsigned": true}))
                .timestamp_secs(),
            Some(1_700_000_002)
        );
        assert_eq!(
            with_timestamp(serde_json::json!(null)).timestamp_secs(),
            None
        );
        assert_eq!(WireMessage::default().timestamp_secs(), None);
    }

    #[test]
    fn test_outgoing_content_serialization() {
        let text = serde_json::to_value(OutgoingContent::text("hi")).unwrap();
        assert_eq!(text, serde_json::json!({"text": "hi"}));

        let doc = serde_json::to_value(OutgoingContent::document(
            b"abc",
            "notes.txt",
            "text/plain",
        ))
        .unwrap();
        assert_eq!(
            doc,
            serde_json::json!({
                "document": {"base64": "YWJj"},
                "fileName": "notes.txt",
                "mimetype": "text/plain"
            })
        );
    }
}

mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_calls_before_connect_fail() {
        let client = BridgeClient::new(BridgeConfig::new("http://127.0.0.1:1")).unwrap();

        let err = client.request_pairing_code("491511234567").await.unwrap_err();
        assert!(matches!(err, BridgeError::NotConnected));

        let err = client
            .send_message("491511234567@s.whatsapp.net", OutgoingContent::text("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotConnected));

        // Ending a session that never started is a no-op
        client.end().await.unwrap();
        assert_eq!(client.name(), "bridge");
    }
}
