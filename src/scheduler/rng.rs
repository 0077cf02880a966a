//! Tiny deterministic RNG for splash-growth decisions.
//!
//! Splash growth shuffles each vertex's in-neighbour list before seeding the
//! BFS frontier. The shuffle only has to break synchronisation between
//! workers growing overlapping subgraphs, so a fast full-period generator is
//! enough — and determinism matters more than quality: the same seed must
//! reproduce the same per-worker emission order for a given task sequence.
//!
//! **Generator**: XorShift64 (Marsaglia shift triple 13/7/17).
//! **Bounded sampling**: Lemire's multiply-high method; power-of-two bounds
//! take a bitmask fast path.
//! **No `Copy`**: copying an RNG duplicates the stream and makes two workers
//! take identical "random" decisions. Clone explicitly when you mean it.

/// Deterministic RNG owned by a single worker.
///
/// Not thread-safe; every worker forks its own instance from the scheduler
/// seed.
#[derive(Clone, Debug)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new RNG with the given seed.
    ///
    /// Seed 0 is remapped to a fixed non-zero constant to avoid the all-zero
    /// lockup state.
    #[inline]
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    /// Next raw value; full period `2^64 - 1`.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform value in `[0, upper)`.
    ///
    /// # Panics
    /// Panics (debug) if `upper` is 0.
    #[inline]
    pub fn next_usize(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0, "upper bound must be > 0");

        if upper.is_power_of_two() {
            return (self.next_u64() as usize) & (upper - 1);
        }

        self.bounded_u64(upper as u64) as usize
    }

    /// Lemire's nearly-divisionless bounded sampling.
    ///
    /// Rejection keeps the mapping uniform; the rejection zone is
    /// `2^64 mod upper` values, negligible for the small bounds used here.
    #[inline]
    fn bounded_u64(&mut self, upper: u64) -> u64 {
        let threshold = upper.wrapping_neg() % upper;
        loop {
            let x = self.next_u64();
            let m = (x as u128) * (upper as u128);
            if (m as u64) >= threshold {
                return (m >> 64) as u64;
            }
        }
    }

    /// In-place Fisher–Yates shuffle.
    ///
    /// Used to locally randomise neighbour order before frontier insertion.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_usize(i + 1);
            items.swap(i, j);
        }
    }
}
