use async_trait::async_trait;

use pulse_core::ports::{Embedder, EmbeddingError, EmbeddingOutput};

pub const MOCK_MODEL: &str = "mock-model";
pub const DEFAULT_DIMENSION: usize = 384;

/// Local embedder producing deterministic pseudo-embeddings.
///
/// The vectors carry no meaning beyond "same text, same vector". Used when
/// no embedding service is configured, and as the fallback when it fails.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingOutput, EmbeddingError> {
        Ok(EmbeddingOutput {
            vector: pseudo_embedding(text, self.dimension),
            model: MOCK_MODEL.to_string(),
        })
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }
}

/// `sin(code + i) * 0.1 + noise`, where `code` cycles through the UTF-16
/// units of `text` and `noise` in `[-0.1, 0.1)` is seeded by the text.
pub fn pseudo_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let seed = fnv1a(text.as_bytes());

    (0..dimension)
        .map(|i| {
            let code = if units.is_empty() {
                0.0
            } else {
                f64::from(units[i % units.len()])
            };
            let value = (code + i as f64).sin() * 0.1 + noise(seed, i as u64);
            value as f32
        })
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;

    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// splitmix64 of `seed + index`, scaled into `[-0.1, 0.1)`.
fn noise(seed: u64, index: u64) -> f64 {
    let mut z = seed.wrapping_add(index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^= z >> 31;

    // Top 53 bits give a uniform f64 in [0, 1).
    let unit = (z >> 11) as f64 / (1u64 << 53) as f64;
    (unit - 0.5) * 0.2
}
