//! Property-based tests for the SockJS codec and the client WebSocket frames.

use proptest::prelude::*;

use docload::protocol::{ApplicationMessage, MessageType};
use docload::sockjs::escape::needs_escape;
use docload::sockjs::frame::encode;
use docload::sockjs::{FrameKind, MessageHandler, RawFrame, dispatch, quote};
use docload::transport::{Frame, OpCode, apply_mask};

/// Characters that never need escaping: printable ASCII, Cyrillic, CJK.
fn safe_text() -> impl Strategy<Value = String> {
    "[ -~а-яА-Я一-龥]{0,64}"
}

/// Characters from unsafe ranges whose JSON encoding is not a short escape.
fn unsafe_char() -> impl Strategy<Value = char> {
    prop_oneof![
        (0x01u32..=0x1f).prop_filter("short JSON escape", |&c| {
            !matches!(c, 0x08 | 0x09 | 0x0a | 0x0c | 0x0d)
        }),
        0x0300u32..=0x0333,
        0x0591u32..=0x05af,
        0x1dc0u32..=0x1dcf,
        0x1f600u32..=0x1f64f,
    ]
    .prop_map(|c| char::from_u32(c).unwrap())
}

fn utf16_escapes(ch: char) -> String {
    let mut buf = [0u16; 2];
    ch.encode_utf16(&mut buf)
        .iter()
        .map(|unit| format!("\\u{unit:04x}"))
        .collect()
}

fn frame_kind() -> impl Strategy<Value = FrameKind> {
    prop_oneof![
        Just(FrameKind::Open),
        Just(FrameKind::Heartbeat),
        Just(FrameKind::Array),
        Just(FrameKind::Message),
        Just(FrameKind::Close),
    ]
}

fn message_type() -> impl Strategy<Value = MessageType> {
    prop_oneof![
        Just(MessageType::Auth),
        Just(MessageType::Message),
        Just(MessageType::Cursor),
        Just(MessageType::GetLock),
        Just(MessageType::SaveLock),
        Just(MessageType::UnSaveLock),
        Just(MessageType::Drop),
        Just(MessageType::WaitAuth),
        Just(MessageType::DocumentOpen),
        Just(MessageType::Warning),
        Just(MessageType::License),
    ]
}

#[derive(Default)]
struct Recorder {
    kinds: Vec<MessageType>,
}

impl MessageHandler for Recorder {
    fn on_message(&mut self, message: ApplicationMessage) {
        self.kinds.push(message.kind);
    }
}

proptest! {
    #[test]
    fn test_quote_fast_path_is_plain_json(text in safe_text()) {
        prop_assert!(!text.chars().any(needs_escape));
        prop_assert_eq!(quote(&text), serde_json::to_string(&text).unwrap());
    }

    #[test]
    fn test_quote_escapes_unsafe_chars(
        prefix in safe_text(),
        ch in unsafe_char(),
        suffix in safe_text(),
    ) {
        let text = format!("{prefix}{ch}{suffix}");
        let quoted = quote(&text);

        prop_assert!(!quoted.contains(ch));
        prop_assert!(quoted.contains(&utf16_escapes(ch)));
        prop_assert!(!quoted.chars().any(needs_escape));
    }

    #[test]
    fn test_quote_decodes_back(text in any::<String>()) {
        let quoted = quote(&text);
        let decoded: String = serde_json::from_str(&quoted).unwrap();
        prop_assert_eq!(decoded, text);
    }

    #[test]
    fn test_sockjs_frame_roundtrip(kind in frame_kind(), content in ".{0,40}") {
        let wire = encode(kind, Some(&content));
        let frame = RawFrame::decode(&wire).unwrap();
        prop_assert_eq!(frame.kind, kind);
        prop_assert_eq!(frame.content, (!content.is_empty()).then_some(content.as_str()));
    }

    #[test]
    fn test_array_routes_in_wire_order(kinds in prop::collection::vec(message_type(), 0..12)) {
        let elements: Vec<String> = kinds
            .iter()
            .map(|k| serde_json::json!({ "type": k.as_str() }).to_string())
            .collect();
        let wire = format!("a{}", serde_json::to_string(&elements).unwrap());

        let mut recorder = Recorder::default();
        dispatch(&wire, &mut recorder);
        prop_assert_eq!(recorder.kinds, kinds);
    }

    #[test]
    fn test_ws_frame_roundtrip_masked(
        fin in any::<bool>(),
        payload in prop::collection::vec(any::<u8>(), 0..2_000),
        mask in any::<[u8; 4]>(),
    ) {
        let frame = Frame::new(fin, OpCode::Binary, payload.clone());
        let mut buf = Vec::new();
        frame.write_to(&mut buf, Some(mask));
        prop_assert_eq!(buf.len(), frame.wire_size(true));

        let (parsed, consumed) = Frame::parse(&buf).unwrap();
        prop_assert_eq!(consumed, buf.len());
        prop_assert_eq!(parsed.fin, fin);
        prop_assert_eq!(parsed.payload(), payload.as_slice());
    }

    #[test]
    fn test_ws_parse_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = Frame::parse(&data);
    }

    #[test]
    fn test_mask_twice_is_identity(
        data in prop::collection::vec(any::<u8>(), 0..256),
        mask in any::<[u8; 4]>(),
    ) {
        let mut masked = data.clone();
        apply_mask(&mut masked, mask);
        apply_mask(&mut masked, mask);
        prop_assert_eq!(masked, data);
    }
}
