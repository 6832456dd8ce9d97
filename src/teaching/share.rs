//! Share links: a teacher's class packed into a URL parameter so students
//! can open it without an account.
//!
//! Format: URL-safe, unpadded base64 of the percent-encoded JSON payload.
//! The percent-encoding step keeps links compatible with browser clients
//! that build them with `btoa(encodeURIComponent(json))`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// Everything `encodeURIComponent` escapes: all but `A-Za-z0-9-_.!~*'()`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedClassPayload {
    pub class_name: String,
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

pub fn encode(payload: &SharedClassPayload) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(payload)?;
    let escaped = utf8_percent_encode(&json, URI_COMPONENT).to_string();
    Ok(URL_SAFE_NO_PAD.encode(escaped.as_bytes()))
}

/// `None` for anything that is not a valid payload with a class name.
pub fn decode(encoded: &str) -> Option<SharedClassPayload> {
    let normalised: String = encoded
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalised.as_bytes()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let json = percent_decode_str(&text).decode_utf8().ok()?;
    let payload: SharedClassPayload = serde_json::from_str(&json).ok()?;
    (!payload.class_name.trim().is_empty()).then_some(payload)
}

/// Path a student opens to load the class, relative to the app origin.
pub fn learn_path(encoded: &str) -> String {
    format!("/lernen?data={encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SharedClassPayload {
        SharedClassPayload {
            class_name: "8b Grüne Gruppe".into(),
            topics: vec!["Photosynthese".into(), "Zellatmung & ATP".into()],
            tone: Some("einfach".into()),
        }
    }

    #[test]
    fn encoded_form_is_url_safe() {
        let data = encode(&sample()).unwrap();
        assert!(data.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode(&data), Some(sample()));
    }

    #[test]
    fn accepts_padded_standard_alphabet() {
        // btoa(encodeURIComponent('{"className":"7a","topics":["Bruch"]}'))
        let json = r#"{"className":"7a","topics":["Bruch"]}"#;
        let escaped = utf8_percent_encode(json, URI_COMPONENT).to_string();
        let std = base64::engine::general_purpose::STANDARD.encode(escaped.as_bytes());
        let decoded = decode(&std).unwrap();
        assert_eq!(decoded.class_name, "7a");
        assert_eq!(decoded.tone, None);
    }

    #[test]
    fn escapes_like_encode_uri_component() {
        let payload = SharedClassPayload {
            class_name: "7a (Mathe)!".into(),
            topics: vec!["Brüche*".into(), "Kai's ~Quiz".into()],
            tone: None,
        };
        // encodeURIComponent('{"className":"7a (Mathe)!","topics":["Brüche*","Kai\'s ~Quiz"]}')
        let expected = "%7B%22className%22%3A%227a%20(Mathe)!%22%2C%22topics%22%3A%5B%22Br%C3%BCche*%22%2C%22Kai's%20~Quiz%22%5D%7D";
        let data = encode(&payload).unwrap();
        let inner = String::from_utf8(URL_SAFE_NO_PAD.decode(&data).unwrap()).unwrap();
        assert_eq!(inner, expected);
        assert_eq!(decode(&data), Some(payload));
    }

    #[test]
    fn accepts_plain_json_inside() {
        let data = URL_SAFE_NO_PAD.encode(r#"{"className":"5c","topics":[]}"#);
        assert_eq!(decode(&data).unwrap().class_name, "5c");
    }

    #[test]
    fn rejects_garbage_and_missing_fields() {
        assert_eq!(decode("!!!"), None);
        assert_eq!(decode(&URL_SAFE_NO_PAD.encode("kein json")), None);
        assert_eq!(decode(&URL_SAFE_NO_PAD.encode(r#"{"topics":["x"]}"#)), None);
        assert_eq!(decode(&URL_SAFE_NO_PAD.encode(r#"{"className":"","topics":["x"]}"#)), None);
        assert_eq!(decode(&URL_SAFE_NO_PAD.encode(r#"{"className":"7a","topics":"x"}"#)), None);
    }

    #[test]
    fn learn_path_shape() {
        assert_eq!(learn_path("abc"), "/lernen?data=abc");
    }
}
