/// Small SplitMix64 generator.
///
/// Each particle carries its own instance so per-particle randomness is explicit state rather than
/// a shared global source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    /// Create a generator from a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the system clock.
    pub fn from_entropy() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5EED);
        Self::new(seed)
    }

    /// Derive an independent generator, advancing `self`.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64() ^ 0xD6E8_FEB8_6659_FD93)
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f32_01(&mut self) -> f32 {
        // 24 bits of precision.
        let v = self.next_u64() >> 40;
        (v as f32) * (1.0 / (1u64 << 24) as f32)
    }

    /// Uniform value in `[lo, hi)`.
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32_01()
    }

    /// Uniform value in `[-1, 1)`.
    pub fn signed_f32(&mut self) -> f32 {
        self.next_f32_01() * 2.0 - 1.0
    }
}
