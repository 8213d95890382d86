use std::collections::HashSet;

/// Tracks which variant strings have already been accepted for the current payload.
///
/// Variants are remembered by their MD5 digest, so the set stays small even for long
/// encoded variants. One instance is used per `process` call; uniqueness is never carried
/// across payloads.
#[derive(Default, Debug)]
pub struct UniqueVariantFeedback {
    pub known_hashes: HashSet<[u8; 16]>,
}

impl UniqueVariantFeedback {
    pub fn new() -> Self {
        Self {
            known_hashes: HashSet::new(),
        }
    }

    /// Records `variant` as seen. Returns `true` if it had not been seen before.
    pub fn report_interesting(&mut self, variant: &str) -> bool {
        self.known_hashes.insert(md5::compute(variant.as_bytes()).0)
    }
}
