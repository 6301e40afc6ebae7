use clap::ValueEnum;
use uuid::Uuid;

/// Length of a hash-strategy identifier in bytes before hex encoding (160 bits).
const HASH_ID_BYTES: usize = 20;

/// How identifiers are derived from submitted URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IdStrategy {
    /// Content hash of the URL: the same URL always gets the same id.
    #[default]
    Hash,
    /// Random UUID v4: every submission gets a fresh id.
    Random,
}

/// Produces identifiers for new mapping entries.
///
/// No collision check is made against existing entries. With `Hash` a
/// colliding id overwrites whatever was stored under it.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator {
    strategy: IdStrategy,
}

impl IdGenerator {
    pub fn new(strategy: IdStrategy) -> Self {
        Self { strategy }
    }

    pub fn generate(&self, url: &str) -> String {
        match self.strategy {
            IdStrategy::Hash => hash_id(url),
            IdStrategy::Random => Uuid::new_v4().simple().to_string(),
        }
    }
}

/// BLAKE3 in XOF mode truncated to 160 bits, lower-case hex.
fn hash_id(url: &str) -> String {
    let mut out = [0u8; HASH_ID_BYTES];
    let mut hasher = blake3::Hasher::new();
    hasher.update(url.as_bytes());
    hasher.finalize_xof().fill(&mut out);
    hex::encode(out)
}
