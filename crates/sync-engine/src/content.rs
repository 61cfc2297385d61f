//! Message content classification.

use wa_bridge::{MediaMessage, MessageContent, WireMessage};

/// Media kinds the cache stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Sticker,
    Video,
    Document,
    Audio,
}

impl MediaKind {
    /// Extension used when the message carries no filename.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Sticker => "webp",
            Self::Video => "mp4",
            Self::Document => "bin",
            Self::Audio => "ogg",
        }
    }
}

/// Media attached to a message.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef<'a> {
    pub kind: MediaKind,
    pub filename: String,
    pub payload: &'a MediaMessage,
    /// Set for a document nested inside a captioned wrapper.
    pub nested: Option<&'a MessageContent>,
}

impl MediaRef<'_> {
    /// The message to hand to the provider for download. A nested document
    /// is re-rooted so the provider sees it as a top-level payload.
    pub fn download_target(&self, original: &WireMessage) -> WireMessage {
        match self.nested {
            Some(inner) => WireMessage {
                message: Some(inner.clone()),
                ..original.clone()
            },
            None => original.clone(),
        }
    }

    /// Remote location, stored when the download fails.
    pub fn url(&self) -> Option<&str> {
        self.payload.url.as_deref()
    }
}

/// Text and media extracted from a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified<'a> {
    pub content: Option<String>,
    pub media: Option<MediaRef<'a>>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

fn media<'a>(
    id: &str,
    kind: MediaKind,
    payload: &'a MediaMessage,
    nested: Option<&'a MessageContent>,
) -> Classified<'a> {
    let filename = match kind {
        MediaKind::Document => non_empty(payload.file_name.as_ref()),
        _ => None,
    }
    .unwrap_or_else(|| format!("{}.{}", id, kind.extension()));

    Classified {
        content: non_empty(payload.caption.as_ref()),
        media: Some(MediaRef {
            kind,
            filename,
            payload,
            nested,
        }),
    }
}

/// Classify a payload. The first matching kind wins, in this order: plain
/// text, extended text, image, sticker, video, document, captioned document,
/// audio. Returns `None` for anything else.
pub fn classify<'a>(id: &str, content: &'a MessageContent) -> Option<Classified<'a>> {
    if let Some(text) = non_empty(content.conversation.as_ref()) {
        return Some(Classified {
            content: Some(text),
            media: None,
        });
    }

    if let Some(text) = content
        .extended_text_message
        .as_ref()
        .and_then(|m| non_empty(m.text.as_ref()))
    {
        return Some(Classified {
            content: Some(text),
            media: None,
        });
    }

    if let Some(image) = &content.image_message {
        return Some(media(id, MediaKind::Image, image, None));
    }
    if let Some(sticker) = &content.sticker_message {
        return Some(media(id, MediaKind::Sticker, sticker, None));
    }
    if let Some(video) = &content.video_message {
        return Some(media(id, MediaKind::Video, video, None));
    }
    if let Some(document) = &content.document_message {
        return Some(media(id, MediaKind::Document, document, None));
    }
    if let Some(wrapper) = &content.document_with_caption_message {
        let inner = wrapper.message.as_deref()?;
        let document = inner.document_message.as_ref()?;
        return Some(media(id, MediaKind::Document, document, Some(inner)));
    }
    if let Some(audio) = &content.audio_message {
        return Some(media(id, MediaKind::Audio, audio, None));
    }

    None
}
