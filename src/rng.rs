// PCG-LCG pseudo-random stream with O(log n) skip-ahead.
//
// Each particle history owns a private stream derived from the master seed,
// so reaction sampling never contends on shared generator state and a
// history can be replayed independently of how histories are scheduled
// across worker threads.

use rand::{RngCore, SeedableRng};

/// LCG multiplier.
const PRN_MULT: u64 = 6364136223846793005;
/// LCG additive constant.
const PRN_ADD: u64 = 1442695040888963407;
/// Stream stride between consecutive particle histories.
const PRN_STRIDE: u64 = 152917;

/// Per-history random number stream.
///
/// A PCG variant using an LCG base generator with an RXS-M-XS output
/// permutation. The state is a single u64, so the generator is `Copy`,
/// trivially reseedable and fully inlineable.
#[derive(Clone, Copy, Debug)]
pub struct HistoryRng {
    state: u64,
}

impl HistoryRng {
    /// Create a stream starting at `seed`.
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Create the independent stream for history `history` of a run seeded
    /// with `master_seed`.
    ///
    /// Uses LCG skip-ahead (square-and-multiply over the affine map) to
    /// jump `history * PRN_STRIDE` draws forward, which gives every history
    /// a disjoint, reproducible substream regardless of thread scheduling.
    pub fn for_history(master_seed: u64, history: u64) -> Self {
        let mut n = history.wrapping_mul(PRN_STRIDE);

        // Compute g = PRN_MULT^n and c = PRN_ADD*(PRN_MULT^n - 1)/(PRN_MULT - 1)
        // without division, accumulating the affine composition.
        let mut g = PRN_MULT;
        let mut c = PRN_ADD;
        let mut g_new: u64 = 1;
        let mut c_new: u64 = 0;

        while n > 0 {
            if n & 1 == 1 {
                g_new = g_new.wrapping_mul(g);
                c_new = c_new.wrapping_mul(g).wrapping_add(c);
            }
            c = c.wrapping_mul(g.wrapping_add(1));
            g = g.wrapping_mul(g);
            n >>= 1;
        }

        Self {
            state: g_new.wrapping_mul(master_seed).wrapping_add(c_new),
        }
    }

    /// Generate a random f64 in [0, 1).
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        // ldexp(next_u64, -64)
        (self.next_u64() as f64) * 5.421010862427522e-20
    }

    /// Reset the stream to `seed`.
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.state = seed;
    }
}

impl SeedableRng for HistoryRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            state: u64::from_le_bytes(seed),
        }
    }
}

impl RngCore for HistoryRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        // Advance the LCG
        self.state = PRN_MULT.wrapping_mul(self.state).wrapping_add(PRN_ADD);

        // RXS-M-XS output permutation
        let word = ((self.state >> ((self.state >> 59) + 5)) ^ self.state)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut left = dest;
        while left.len() >= 8 {
            let bytes = self.next_u64().to_le_bytes();
            left[..8].copy_from_slice(&bytes);
            left = &mut left[8..];
        }
        if !left.is_empty() {
            let bytes = self.next_u64().to_le_bytes();
            left.copy_from_slice(&bytes[..left.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
