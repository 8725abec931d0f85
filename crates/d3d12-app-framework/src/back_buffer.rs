pub const SWAP_CHAIN_BUFFER_COUNT: usize = 2;

/// Which swap chain image the next frame renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackBufferRing {
    index: usize,
    count: usize,
}

impl BackBufferRing {
    pub fn new(count: usize) -> Self {
        debug_assert!(count > 0);
        Self { index: 0, count }
    }

    pub fn current(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Moves to the next image after a present and returns its index.
    pub fn advance(&mut self) -> usize {
        self.index = (self.index + 1) % self.count;
        self.index
    }

    /// `ResizeBuffers` starts the chain over at image 0.
    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl Default for BackBufferRing {
    fn default() -> Self {
        Self::new(SWAP_CHAIN_BUFFER_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_in_strict_round_robin() {
        for count in 1..=4 {
            let mut ring = BackBufferRing::new(count);
            let mut seen = vec![ring.current()];
            for _ in 0..(count * 3) {
                seen.push(ring.advance());
            }
            for (i, index) in seen.iter().enumerate() {
                assert_eq!(*index, i % count);
                assert!(*index < count);
            }
        }
    }

    #[test]
    fn reset_returns_to_the_first_image() {
        let mut ring = BackBufferRing::default();
        ring.advance();
        assert_eq!(ring.current(), 1);
        ring.reset();
        assert_eq!(ring.current(), 0);
        assert_eq!(ring.count(), SWAP_CHAIN_BUFFER_COUNT);
    }
}
