/// Monotonic token identifying one "current" context (chapter, narrative).
///
/// Async work captures the token when it starts; the result is only applied
/// while the token is still current.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: u64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        Generation(self.current)
    }

    /// Invalidates every previously issued token.
    pub fn advance(&mut self) -> Generation {
        self.current = self.current.wrapping_add(1);
        Generation(self.current)
    }

    pub fn is_current(&self, token: Generation) -> bool {
        token.0 == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::GenerationCounter;

    #[test]
    fn advance_invalidates_old_tokens() {
        let mut c = GenerationCounter::new();
        let a = c.advance();
        assert!(c.is_current(a));
        let b = c.advance();
        assert!(!c.is_current(a));
        assert!(c.is_current(b));
        assert!(a < b);
    }
}
