// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in ADAPT handlers (§4.10/§6): chat-style, responses-style, and
//! Claude-style provider envelopes. All three share the same
//! text-then-images assembly and differ only in the JSON shape of each
//! content part, so the envelope construction is factored into
//! `assemble_parts` and each adapter just renders its own part shapes.

use serde_json::{json, Value};

use attachments_domain::services::{AdaptCollectionFn, AdaptSingleFn, HandlerRegistration, VerbKind};
use attachments_domain::{Attachment, AttachmentCollection};

use crate::application::services::registry::{AdapterEntry, HandlerRegistry};

pub fn register(registry: &mut HandlerRegistry) {
    registry.register_adapter(AdapterEntry {
        registration: HandlerRegistration { is_reducer: true, ..HandlerRegistration::new(VerbKind::Adapt, "chat") },
        single: chat_single,
        collection: chat_collection,
    });
    registry.register_adapter(AdapterEntry {
        registration: HandlerRegistration { is_reducer: true, ..HandlerRegistration::new(VerbKind::Adapt, "responses") },
        single: responses_single,
        collection: responses_collection,
    });
    registry.register_adapter(AdapterEntry {
        registration: HandlerRegistration { is_reducer: true, ..HandlerRegistration::new(VerbKind::Adapt, "claude") },
        single: claude_single,
        collection: claude_collection,
    });
}

/// The `text`/`images`/`audio` content filter (§4.12): DSL wins over the
/// defaults of "include everything", since no call-site override plumbing
/// reaches adapters through the current verb step shape.
struct ContentFilter {
    text: bool,
    images: bool,
}

fn content_filter(att: &Attachment) -> ContentFilter {
    ContentFilter { text: att.commands.get_bool("text").unwrap_or(true), images: att.commands.get_bool("images").unwrap_or(true) }
}

/// Splits a `data:<mime>;base64,<payload>` string into its MIME type and
/// base64 payload. Built by `present.image_passthrough`/`modify.morph`, so
/// this always succeeds on attachments assembled by this crate's own
/// handlers; a malformed string degrades to an empty mime rather than
/// panicking.
fn split_data_url(data_url: &str) -> (&str, &str) {
    let Some(rest) = data_url.strip_prefix("data:") else { return ("", data_url) };
    match rest.split_once(";base64,") {
        Some((mime, payload)) => (mime, payload),
        None => ("", rest),
    }
}

fn assembled_text(prompt: &str, text: &str) -> String {
    if prompt.is_empty() {
        text.to_string()
    } else if text.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}\n\n{text}")
    }
}

fn merge_collection(collection: &AttachmentCollection) -> (String, Vec<attachments_domain::DataUrlImage>, ContentFilter) {
    let filter = collection.iter().next().map(content_filter).unwrap_or(ContentFilter { text: true, images: true });
    (collection.concatenated_text(), collection.flattened_images(), filter)
}

fn chat_single(att: &Attachment, prompt: &str) -> Value {
    let filter = content_filter(att);
    chat_envelope(prompt, &att.text, &att.images, &filter)
}

fn chat_collection(collection: &AttachmentCollection, prompt: &str) -> Value {
    let (text, images, filter) = merge_collection(collection);
    chat_envelope(prompt, &text, &images, &filter)
}

fn chat_envelope(prompt: &str, text: &str, images: &[attachments_domain::DataUrlImage], filter: &ContentFilter) -> Value {
    let mut content = Vec::new();
    if filter.text {
        content.push(json!({"type": "text", "text": assembled_text(prompt, text)}));
    }
    if filter.images {
        for image in images {
            content.push(json!({"type": "image_url", "image_url": {"url": image.as_str()}}));
        }
    }
    json!([{"role": "user", "content": content}])
}

fn responses_single(att: &Attachment, prompt: &str) -> Value {
    let filter = content_filter(att);
    responses_envelope(prompt, &att.text, &att.images, &filter)
}

fn responses_collection(collection: &AttachmentCollection, prompt: &str) -> Value {
    let (text, images, filter) = merge_collection(collection);
    responses_envelope(prompt, &text, &images, &filter)
}

fn responses_envelope(prompt: &str, text: &str, images: &[attachments_domain::DataUrlImage], filter: &ContentFilter) -> Value {
    let mut content = Vec::new();
    if filter.text {
        content.push(json!({"type": "input_text", "text": assembled_text(prompt, text)}));
    }
    if filter.images {
        for image in images {
            content.push(json!({"type": "input_image", "image_url": image.as_str()}));
        }
    }
    json!([{"role": "user", "content": content}])
}

fn claude_single(att: &Attachment, prompt: &str) -> Value {
    let filter = content_filter(att);
    claude_envelope(prompt, &att.text, &att.images, &filter)
}

fn claude_collection(collection: &AttachmentCollection, prompt: &str) -> Value {
    let (text, images, filter) = merge_collection(collection);
    claude_envelope(prompt, &text, &images, &filter)
}

fn claude_envelope(prompt: &str, text: &str, images: &[attachments_domain::DataUrlImage], filter: &ContentFilter) -> Value {
    let mut content = Vec::new();
    if filter.text {
        content.push(json!({"type": "text", "text": assembled_text(prompt, text)}));
    }
    if filter.images {
        for image in images {
            let (mime, payload) = split_data_url(image.as_str());
            content.push(json!({"type": "image", "source": {"type": "base64", "media_type": mime, "data": payload}}));
        }
    }
    json!([{"role": "user", "content": content}])
}

#[allow(dead_code)]
fn assert_signatures(_single: AdaptSingleFn, _collection: AdaptCollectionFn) {}

#[cfg(test)]
mod tests {
    use super::*;
    use attachments_domain::DataUrlImage;

    fn attachment_with(text: &str, image: Option<DataUrlImage>) -> Attachment {
        let mut att = Attachment::new("doc.txt").unwrap();
        att.append_text(text);
        if let Some(image) = image {
            att.push_image(image);
        }
        att
    }

    #[test]
    fn chat_envelope_matches_the_documented_shape() {
        let att = attachment_with("hello", Some(DataUrlImage::new("image/png", "AAAA")));
        let envelope = chat_single(&att, "caption?");
        assert_eq!(
            envelope,
            json!([{
                "role": "user",
                "content": [
                    {"type": "text", "text": "caption?\n\nhello"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]
            }])
        );
    }

    #[test]
    fn responses_envelope_uses_input_text_and_input_image() {
        let att = attachment_with("hello", Some(DataUrlImage::new("image/png", "AAAA")));
        let envelope = responses_single(&att, "");
        assert_eq!(
            envelope,
            json!([{
                "role": "user",
                "content": [
                    {"type": "input_text", "text": "hello"},
                    {"type": "input_image", "image_url": "data:image/png;base64,AAAA"}
                ]
            }])
        );
    }

    #[test]
    fn claude_envelope_splits_the_data_url_into_media_type_and_data() {
        let att = attachment_with("hello", Some(DataUrlImage::new("image/jpeg", "ZZZZ")));
        let envelope = claude_single(&att, "");
        assert_eq!(
            envelope,
            json!([{
                "role": "user",
                "content": [
                    {"type": "text", "text": "hello"},
                    {"type": "image", "source": {"type": "base64", "media_type": "image/jpeg", "data": "ZZZZ"}}
                ]
            }])
        );
    }

    #[test]
    fn content_filter_can_suppress_images() {
        let mut att = attachment_with("hello", Some(DataUrlImage::new("image/png", "AAAA")));
        att.commands.insert("images", "false");
        let envelope = chat_single(&att, "");
        let content = envelope[0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(content[0]["type"], "text");
    }
}
