//! Builders for provider-native message events.

use wa_bridge::{
    ExtendedTextMessage, MediaMessage, MessageContent, MessageKey, WireMessage, WrappedMessage,
};

fn message(id: &str, chat: &str, from_me: bool, content: MessageContent, ts: i64) -> WireMessage {
    WireMessage {
        key: MessageKey {
            remote_jid: Some(chat.to_string()),
            from_me: Some(from_me),
            id: Some(id.to_string()),
            ..Default::default()
        },
        message: Some(content),
        message_timestamp: Some(serde_json::json!(ts)),
        ..Default::default()
    }
}

fn media(caption: Option<&str>, url: &str) -> MediaMessage {
    MediaMessage {
        url: Some(url.to_string()),
        caption: caption.map(str::to_string),
        ..Default::default()
    }
}

/// Incoming plain text in a direct chat.
pub fn text(id: &str, chat: &str, body: &str, ts: i64) -> WireMessage {
    let content = MessageContent {
        conversation: Some(body.to_string()),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// Plain text sent by this device.
pub fn outgoing_text(id: &str, chat: &str, body: &str, ts: i64) -> WireMessage {
    let mut msg = text(id, chat, body, ts);
    msg.key.from_me = Some(true);
    msg
}

/// Extended text (link preview, quote) in a direct chat.
pub fn extended_text(id: &str, chat: &str, body: &str, ts: i64) -> WireMessage {
    let content = MessageContent {
        extended_text_message: Some(ExtendedTextMessage {
            text: Some(body.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// Text posted to a group by `participant`.
pub fn group_text(id: &str, group: &str, participant: &str, body: &str, ts: i64) -> WireMessage {
    let mut msg = text(id, group, body, ts);
    msg.participant = Some(participant.to_string());
    msg
}

/// Incoming image.
pub fn image(id: &str, chat: &str, caption: Option<&str>, ts: i64) -> WireMessage {
    let content = MessageContent {
        image_message: Some(media(caption, "https://mmg.example/image")),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// Incoming sticker.
pub fn sticker(id: &str, chat: &str, ts: i64) -> WireMessage {
    let content = MessageContent {
        sticker_message: Some(media(None, "https://mmg.example/sticker")),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// Incoming video.
pub fn video(id: &str, chat: &str, caption: Option<&str>, ts: i64) -> WireMessage {
    let content = MessageContent {
        video_message: Some(media(caption, "https://mmg.example/video")),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// Incoming audio note.
pub fn audio(id: &str, chat: &str, ts: i64) -> WireMessage {
    let content = MessageContent {
        audio_message: Some(media(None, "https://mmg.example/audio")),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// Incoming document, optionally with its own filename.
pub fn document(id: &str, chat: &str, file_name: Option<&str>, ts: i64) -> WireMessage {
    let mut doc = media(None, "https://mmg.example/document");
    doc.file_name = file_name.map(str::to_string);
    let content = MessageContent {
        document_message: Some(doc),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// Incoming document wrapped with a caption.
pub fn document_with_caption(
    id: &str,
    chat: &str,
    file_name: &str,
    caption: &str,
    ts: i64,
) -> WireMessage {
    let mut doc = media(Some(caption), "https://mmg.example/document");
    doc.file_name = Some(file_name.to_string());
    let content = MessageContent {
        document_with_caption_message: Some(WrappedMessage {
            message: Some(Box::new(MessageContent {
                document_message: Some(doc),
                ..Default::default()
            })),
        }),
        ..Default::default()
    };
    message(id, chat, false, content, ts)
}

/// A message whose payload kind the engine does not handle.
pub fn unsupported(id: &str, chat: &str, ts: i64) -> WireMessage {
    let mut content = MessageContent::default();
    content
        .extra
        .insert("reactionMessage".to_string(), serde_json::json!({"text": "+1"}));
    message(id, chat, false, content, ts)
}
