//! Reversible encodings of the whole payload.

use crate::technique::{Category, Technique};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use rand_core::RngCore;

/// Bytes never percent-encoded, on top of ASCII alphanumerics.
const ALWAYS_SAFE: &[u8] = b"_.-~";

/// Percent-encodes the UTF-8 bytes of `input`, leaving alphanumerics, `_.-~` and any byte in
/// `safe` untouched. Escapes use uppercase hex digits.
pub(crate) fn percent_encode(input: &str, safe: &[u8]) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for &byte in input.as_bytes() {
        if byte.is_ascii_alphanumeric() || ALWAYS_SAFE.contains(&byte) || safe.contains(&byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Standard base64, plus the URL-safe alphabet when it differs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Encode;

impl Technique for Base64Encode {
    fn name(&self) -> &str {
        "base64"
    }

    fn category(&self) -> Category {
        Category::Encoding
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let standard = STANDARD.encode(payload.as_bytes());
        let url_safe = URL_SAFE.encode(payload.as_bytes());
        let mut variants = vec![standard];
        if url_safe != variants[0] {
            variants.push(url_safe);
        }
        Ok(variants)
    }
}

/// Percent-encoding with no safe characters, then again keeping `/` intact.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlEncode;

impl Technique for UrlEncode {
    fn name(&self) -> &str {
        "url_encode"
    }

    fn category(&self) -> Category {
        Category::Encoding
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let full = percent_encode(payload, b"");
        let partial = percent_encode(payload, b"/");
        let mut variants = vec![full];
        if partial != variants[0] {
            variants.push(partial);
        }
        Ok(variants)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlEntityDecimal;

impl Technique for HtmlEntityDecimal {
    fn name(&self) -> &str {
        "html_entity_decimal"
    }

    fn category(&self) -> Category {
        Category::Encoding
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        Ok(vec![
            payload.chars().map(|c| format!("&#{};", c as u32)).collect(),
        ])
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlEntityHex;

impl Technique for HtmlEntityHex {
    fn name(&self) -> &str {
        "html_entity_hex"
    }

    fn category(&self) -> Category {
        Category::Encoding
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        Ok(vec![
            payload.chars().map(|c| format!("&#x{:x};", c as u32)).collect(),
        ])
    }
}

/// `\uXXXX` per code point. Code points above the BMP keep all of their hex digits.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeEscape;

impl Technique for UnicodeEscape {
    fn name(&self) -> &str {
        "unicode_escape"
    }

    fn category(&self) -> Category {
        Category::Encoding
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        Ok(vec![
            payload.chars().map(|c| format!("\\u{:04x}", c as u32)).collect(),
        ])
    }
}

/// Plain hex of the UTF-8 bytes, and the same bytes as `\xNN` escapes.
#[derive(Debug, Default, Clone, Copy)]
pub struct HexEncode;

impl Technique for HexEncode {
    fn name(&self) -> &str {
        "hex_encode"
    }

    fn category(&self) -> Category {
        Category::Encoding
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let plain = hex::encode(payload.as_bytes());
        let prefixed = payload
            .as_bytes()
            .iter()
            .map(|byte| format!("\\x{byte:02x}"))
            .collect();
        Ok(vec![plain, prefixed])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    const PAYLOAD: &str = "<script>alert('xss')</script>";

    fn decode_entities(encoded: &str, radix: u32) -> String {
        encoded
            .split(';')
            .filter(|entity| !entity.is_empty())
            .map(|entity| {
                let digits = entity.trim_start_matches("&#").trim_start_matches('x');
                char::from_u32(u32::from_str_radix(digits, radix).unwrap()).unwrap()
            })
            .collect()
    }

    #[test]
    fn base64_decodes_back_to_payload() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let variants = Base64Encode.transform(PAYLOAD, &mut rng).unwrap();
        assert!(!variants.is_empty());
        let decoded = STANDARD.decode(&variants[0]).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), PAYLOAD);
    }

    #[test]
    fn base64_adds_url_safe_form_only_when_alphabet_differs() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        assert_eq!(Base64Encode.transform("A", &mut rng).unwrap(), vec!["QQ=="]);

        // U+FBFF is EF AF BF in UTF-8, which is "76+/" in the standard alphabet.
        let variants = Base64Encode.transform("\u{fbff}", &mut rng).unwrap();
        assert_eq!(variants.len(), 2, "expected a distinct url-safe form: {variants:?}");
        assert!(variants[1].chars().all(|c| c != '+' && c != '/'));
    }

    #[test]
    fn url_encode_escapes_markup() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let variants = UrlEncode.transform(PAYLOAD, &mut rng).unwrap();
        assert_eq!(variants.len(), 2, "payload contains '/', so a partial form should exist");
        assert!(variants[0].contains("%3C"));
        assert!(variants[0].contains("%2F"));
        assert!(variants[1].contains("%3C/script%3E"));
    }

    #[test]
    fn url_encode_keeps_unreserved_characters() {
        assert_eq!(percent_encode("a-b_c.d~e f", b""), "a-b_c.d~e%20f");
        assert_eq!(percent_encode("é", b""), "%C3%A9");
    }

    #[test]
    fn html_entities_match_known_values_and_decode() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        assert_eq!(HtmlEntityDecimal.transform("A", &mut rng).unwrap(), vec!["&#65;"]);
        assert_eq!(HtmlEntityHex.transform("A", &mut rng).unwrap(), vec!["&#x41;"]);

        let decimal = HtmlEntityDecimal.transform(PAYLOAD, &mut rng).unwrap();
        assert_eq!(decode_entities(&decimal[0], 10), PAYLOAD);
        let hex = HtmlEntityHex.transform(PAYLOAD, &mut rng).unwrap();
        assert_eq!(decode_entities(&hex[0], 16), PAYLOAD);
    }

    #[test]
    fn unicode_escape_pads_to_four_digits() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        assert_eq!(UnicodeEscape.transform("A", &mut rng).unwrap(), vec!["\\u0041"]);
        assert_eq!(
            UnicodeEscape.transform("\u{1f600}", &mut rng).unwrap(),
            vec!["\\u1f600"]
        );
    }

    #[test]
    fn hex_encode_produces_plain_and_prefixed_forms() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let variants = HexEncode.transform("AB", &mut rng).unwrap();
        assert!(variants.contains(&"4142".to_string()));
        assert!(variants.contains(&"\\x41\\x42".to_string()));
        assert_eq!(hex::decode(&variants[0]).unwrap(), b"AB");
    }
}
