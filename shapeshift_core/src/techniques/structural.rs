//! Rewrites that change the shape of the payload rather than its characters.

use super::encoding::percent_encode;
use crate::technique::{Category, Technique};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand_core::RngCore;

const RANDOM_SPLITS: usize = 2;
const CONCAT_CHUNK_LEN: usize = 3;

/// Splits the payload into quoted string literals joined with `+`.
///
/// Two variants use a single random split point; the last one cuts the payload into
/// fixed three-character chunks.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringConcatenation;

impl Technique for StringConcatenation {
    fn name(&self) -> &str {
        "string_concat"
    }

    fn category(&self) -> Category {
        Category::Structural
    }

    fn transform(&self, payload: &str, rng: &mut dyn RngCore) -> Result<Vec<String>, anyhow::Error> {
        let chars: Vec<char> = payload.chars().collect();
        if chars.len() < 2 {
            return Ok(Vec::new());
        }

        let mut variants = Vec::with_capacity(RANDOM_SPLITS + 1);
        for _ in 0..RANDOM_SPLITS {
            let split = rng.random_range(1..chars.len());
            let head: String = chars[..split].iter().collect();
            let tail: String = chars[split..].iter().collect();
            variants.push(format!("\"{head}\" + \"{tail}\""));
        }

        let chunks: Vec<String> = chars
            .chunks(CONCAT_CHUNK_LEN)
            .map(|chunk| format!("\"{}\"", chunk.iter().collect::<String>()))
            .collect();
        variants.push(chunks.join(" + "));
        Ok(variants)
    }
}

/// Inserts an empty C-style and an empty HTML comment at the midpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommentInjection;

impl Technique for CommentInjection {
    fn name(&self) -> &str {
        "comment_inject"
    }

    fn category(&self) -> Category {
        Category::Structural
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let len = payload.chars().count();
        if len < 2 {
            return Ok(Vec::new());
        }
        let mid = payload
            .char_indices()
            .nth(len / 2)
            .map_or(payload.len(), |(offset, _)| offset);
        let (head, tail) = payload.split_at(mid);
        Ok(vec![
            format!("{head}/**/{tail}"),
            format!("{head}<!-- -->{tail}"),
        ])
    }
}

/// Base64 followed by percent-encoding of the base64 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct EncodingChain;

impl Technique for EncodingChain {
    fn name(&self) -> &str {
        "encoding_chain"
    }

    fn category(&self) -> Category {
        Category::Structural
    }

    fn transform(
        &self,
        payload: &str,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<String>, anyhow::Error> {
        let encoded = STANDARD.encode(payload.as_bytes());
        Ok(vec![percent_encode(&encoded, b"")])
    }
}
