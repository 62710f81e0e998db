//! Feature-hashing embedding provider.
//!
//! Tokens are lower-cased alphanumeric runs. Each token is hashed with
//! 64-bit FNV-1a; the low bits pick a dimension and one high bit picks the
//! sign. The result is L2-normalized, so cosine and euclidean distances are
//! both meaningful. Text with no tokens embeds to the zero vector.

use anyhow::Result;

use super::EmbeddingProvider;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub struct HashedEmbeddingProvider {
    dimensions: usize,
}

impl HashedEmbeddingProvider {
    pub fn new(dimensions: usize) -> Result<Self> {
        anyhow::ensure!(dimensions > 0, "similarity dimensions must be positive");
        Ok(Self { dimensions })
    }
}

impl EmbeddingProvider for HashedEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in tokens(text) {
            let h = fnv1a(token.as_bytes());
            let idx = (h % self.dimensions as u64) as usize;
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn deterministic_and_normalized() {
        let p = HashedEmbeddingProvider::new(32).unwrap();
        let a = p.embed("Verify your account at http://phish.example").unwrap();
        let b = p.embed("verify YOUR account at http://phish.example").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shared_tokens_score_higher() {
        let p = HashedEmbeddingProvider::new(256).unwrap();
        let query = p.embed("url bad example login").unwrap();
        let near = p.embed("url bad example login page").unwrap();
        let far = p.embed("password strong").unwrap();
        assert!(dot(&query, &near) > dot(&query, &far));
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let p = HashedEmbeddingProvider::new(8).unwrap();
        assert!(p.embed(" -- ").unwrap().iter().all(|x| *x == 0.0));
        assert!(HashedEmbeddingProvider::new(0).is_err());
    }
}
