//! PDF text string encoding.

use lopdf::{Object, StringFormat};

/// Decode a PDF text string (field names, values, option labels).
pub fn decode_text_string(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Encode text as a PDF text string object, verbatim.
///
/// Printable ASCII stays a literal string; anything else becomes UTF-16BE
/// with a byte order mark so no character is lost.
pub fn encode_text_string(text: &str) -> Object {
    let literal_safe = text
        .chars()
        .all(|c| c.is_ascii() && (!c.is_ascii_control() || matches!(c, '\n' | '\r' | '\t')));
    if literal_safe {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = Vec::with_capacity(2 + text.len() * 2);
    bytes.extend_from_slice(&[0xFE, 0xFF]);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Encode text for a content stream shown with a standard Latin font.
///
/// Characters outside Latin-1 are replaced with `?`.
pub fn encode_latin1_lossy(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code < 256 {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

/// Read a string-valued object as text.
pub fn object_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text_string(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_latin1() {
        // 0xE9 = 'é' in Latin-1
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_string(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_string(&bytes), "Hi");
    }

    #[test]
    fn test_encode_ascii_literal() {
        match encode_text_string("Grand Opening (today)") {
            Object::String(bytes, StringFormat::Literal) => {
                assert_eq!(bytes, b"Grand Opening (today)".to_vec())
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_encode_unicode_round_trip() {
        let obj = encode_text_string("Café ☕");
        let text = object_text(&obj).unwrap();
        assert_eq!(text, "Café ☕");
    }

    #[test]
    fn test_latin1_lossy() {
        assert_eq!(encode_latin1_lossy("é☕"), vec![0xE9, b'?']);
    }
}
