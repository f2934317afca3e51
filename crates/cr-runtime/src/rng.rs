/// Seeded pseudo-random source shared by every reply drawn from one context.
///
/// Mulberry32 stepping with rejection sampling for bounded draws, so a fixed
/// seed replays the same sequence of replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRng {
    state: u32,
}

impl ReplyRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn from_seed(seed: Option<u32>) -> Self {
        seed.map(Self::new).unwrap_or_else(Self::from_entropy)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b79f5);
        let mut next = self.state;
        next = (next ^ (next >> 15)).wrapping_mul(next | 1);
        next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
        next ^ (next >> 14)
    }

    /// Uniform draw in `[0, bound)`. `bound` must be non-zero.
    pub fn below(&mut self, bound: u32) -> u32 {
        self.below_with(bound, Self::next_u32)
    }

    pub fn index(&mut self, len: usize) -> usize {
        let bound = u32::try_from(len).unwrap_or(u32::MAX);
        self.below(bound) as usize
    }

    fn below_with<F>(&mut self, bound: u32, mut draw: F) -> u32
    where
        F: FnMut(&mut Self) -> u32,
    {
        let zone = (u64::from(u32::MAX) + 1) / u64::from(bound) * u64::from(bound);
        loop {
            let raw = draw(self);
            if u64::from(raw) < zone {
                return raw % bound;
            }
        }
    }
}

#[cfg(test)]
mod rng_tests {
    use super::*;

    #[test]
    fn below_with_retries_draws_outside_the_unbiased_zone() {
        let mut rng = ReplyRng::new(0);
        let mut raw = vec![u32::MAX, 42u32].into_iter();
        let result = rng.below_with(10, |_| raw.next().expect("test values should be available"));
        assert_eq!(result, 2);
    }

    #[test]
    fn same_seed_replays_same_draws() {
        let mut left = ReplyRng::new(7);
        let mut right = ReplyRng::new(7);
        let left_draws: Vec<u32> = (0..16).map(|_| left.below(100)).collect();
        let right_draws: Vec<u32> = (0..16).map(|_| right.below(100)).collect();

        assert_eq!(left_draws, right_draws);
        assert_eq!(left.state(), right.state());
        assert!(left_draws.iter().all(|value| *value < 100));
    }

    #[test]
    fn next_u32_advances_state() {
        let mut rng = ReplyRng::new(1);
        let first = rng.next_u32();
        assert_ne!(rng.state(), 1);
        assert_ne!(rng.next_u32(), first);
    }

    #[test]
    fn index_stays_within_length() {
        let mut rng = ReplyRng::from_seed(Some(3));
        for _ in 0..200 {
            assert!(rng.index(3) < 3);
        }
        assert_eq!(rng.index(1), 0);
    }
}
