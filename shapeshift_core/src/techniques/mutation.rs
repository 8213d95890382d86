//! Character-level mutations that keep the payload readable to a lenient parser.

use crate::technique::{Category, Technique};
use rand::Rng;
use rand_core::RngCore;

/// Number of independent random casings drawn per call.
const RANDOM_CASE_ATTEMPTS: usize = 3;

const ZERO_WIDTH_SPACE: &str = "\u{200b}";

/// Latin characters and the Cyrillic look-alikes substituted for them.
const HOMOGLYPHS: &[(char, char)] = &[
    ('a', '\u{0430}'),
    ('e', '\u{0435}'),
    ('o', '\u{043e}'),
    ('p', '\u{0440}'),
    ('c', '\u{0441}'),
    ('x', '\u{0445}'),
    ('s', '\u{0455}'),
    ('i', '\u{0456}'),
    ('A', '\u{0410}'),
    ('B', '\u{0412}'),
    ('E', '\u{0415}'),
    ('H', '\u{041d}'),
    ('K', '\u{041a}'),
    ('M', '\u{041c}'),
    ('O', '\u{041e}'),
    ('P', '\u{0420}'),
    ('T', '\u{0422}'),
    ('X', '\u{0425}'),
    ('S', '\u{0405}'),
    ('C', '\u{0421}'),
];

fn push_cased(out: &mut String, c: char, upper: bool) {
    if upper {
        out.extend(c.to_uppercase());
    } else {
        out.extend(c.to_lowercase());
    }
}

/// Flips the case of every character with probability one half.
///
/// Repeated calls keep producing fresh casings, which is what lets the engine's retry phase
/// make progress on payloads most other techniques cannot touch.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCase;

impl Technique for RandomCase {
    fn name(&self) -> &str {
        "random_case"
    }

    fn category(&self) -> Category {
        Category::Mutation
    }

    fn transform(&self, payload: &str, rng: &mut dyn RngCore) -> Result<Vec<String>, anyhow::Error> {
        let mut variants = Vec::with_capacity(RANDOM_CASE_ATTEMPTS);
        for _ in 0..RANDOM_CASE_ATTEMPTS {
            let mut variant = String::with_capacity(payload.len());
            for c in payload.chars() {
                push_cased(&mut variant, c, rng.random_bool(0.5));
            }
            if variant != payload {
                variants.push(variant);
            }
        }
        Ok(variants)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlternatingCase;

impl Technique for AlternatingCase {
    fn name(&self) -> &str {
        "alternating_case"
    }

    fn category(&self) -> Category {
        Category::Mutation
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let mut upper_first = String::with_capacity(payload.len());
        let mut lower_first = String::with_capacity(payload.len());
        for (i, c) in payload.chars().enumerate() {
            push_cased(&mut upper_first, c, i % 2 == 0);
            push_cased(&mut lower_first, c, i % 2 == 1);
        }

        let mut variants = Vec::with_capacity(2);
        if upper_first != payload {
            variants.push(upper_first.clone());
        }
        if lower_first != payload && lower_first != upper_first {
            variants.push(lower_first);
        }
        Ok(variants)
    }
}

/// Swaps every character found in the confusables table for its look-alike.
#[derive(Debug, Default, Clone, Copy)]
pub struct HomoglyphSubstitution;

impl Technique for HomoglyphSubstitution {
    fn name(&self) -> &str {
        "homoglyph"
    }

    fn category(&self) -> Category {
        Category::Mutation
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let substituted: String = payload
            .chars()
            .map(|c| {
                HOMOGLYPHS
                    .iter()
                    .find(|(latin, _)| *latin == c)
                    .map_or(c, |(_, glyph)| *glyph)
            })
            .collect();
        if substituted == payload {
            return Ok(Vec::new());
        }
        Ok(vec![substituted])
    }
}

/// Inserts U+200B between every pair of adjacent characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroWidthInsertion;

impl Technique for ZeroWidthInsertion {
    fn name(&self) -> &str {
        "zero_width"
    }

    fn category(&self) -> Category {
        Category::Mutation
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let chars: Vec<String> = payload.chars().map(String::from).collect();
        Ok(vec![chars.join(ZERO_WIDTH_SPACE)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    const PAYLOAD: &str = "<script>alert(1)</script>";

    #[test]
    fn random_case_only_changes_case() {
        let mut rng = ChaCha8Rng::from_seed([3u8; 32]);
        let variants = RandomCase.transform(PAYLOAD, &mut rng).unwrap();
        assert!(!variants.is_empty(), "three coin-flip casings should not all equal the payload");
        for variant in &variants {
            assert_ne!(variant, PAYLOAD);
            assert_eq!(variant.to_lowercase(), PAYLOAD.to_lowercase());
        }
    }

    #[test]
    fn random_case_is_reproducible_with_same_seed() {
        let first = RandomCase
            .transform(PAYLOAD, &mut ChaCha8Rng::from_seed([9u8; 32]))
            .unwrap();
        let second = RandomCase
            .transform(PAYLOAD, &mut ChaCha8Rng::from_seed([9u8; 32]))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn random_case_yields_nothing_for_caseless_payload() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        assert!(RandomCase.transform("1234 ()", &mut rng).unwrap().is_empty());
    }

    #[test]
    fn alternating_case_produces_both_phases() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let variants = AlternatingCase.transform("script", &mut rng).unwrap();
        assert_eq!(variants, vec!["ScRiPt", "sCrIpT"]);
    }

    #[test]
    fn alternating_case_skips_forms_equal_to_payload() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        assert_eq!(AlternatingCase.transform("Ab", &mut rng).unwrap(), vec!["aB"]);
    }

    #[test]
    fn homoglyph_keeps_length_but_changes_text() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let variants = HomoglyphSubstitution.transform("script", &mut rng).unwrap();
        assert_eq!(variants.len(), 1);
        assert_ne!(variants[0], "script");
        assert_eq!(variants[0].chars().count(), "script".chars().count());
    }

    #[test]
    fn homoglyph_yields_nothing_without_substitutable_chars() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        assert!(HomoglyphSubstitution.transform("1+1", &mut rng).unwrap().is_empty());
    }

    #[test]
    fn zero_width_separates_every_char() {
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let variants = ZeroWidthInsertion.transform("abc", &mut rng).unwrap();
        assert_eq!(variants, vec!["a\u{200b}b\u{200b}c"]);
        assert_eq!(ZeroWidthInsertion.transform("a", &mut rng).unwrap(), vec!["a"]);
    }
}
