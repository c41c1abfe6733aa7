use crate::error::{Error, Result};

/// Ordered pool of API keys with a rotation cursor.
///
/// Keys before the cursor have been rejected or found over quota and are
/// never retried for the lifetime of the pool. Quota exhaustion is a
/// property of the key over a time window, not of a single call, so the
/// cursor only ever moves forward.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<String>,
    current: usize,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::NoKeys);
        }
        Ok(Self { keys, current: 0 })
    }

    /// Key at the cursor, or `None` once every key has been excluded.
    pub fn current(&self) -> Option<&str> {
        self.keys.get(self.current).map(String::as_str)
    }

    /// Permanently exclude the current key and move to the next one.
    pub fn advance(&mut self) {
        if self.current < self.keys.len() {
            self.current += 1;
        }
    }

    /// Number of keys not yet excluded.
    pub fn remaining(&self) -> usize {
        self.keys.len() - self.current
    }

    pub fn is_exhausted(&self) -> bool {
        self.current >= self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(keys: &[&str]) -> KeyPool {
        KeyPool::new(keys.iter().map(|k| k.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_empty_pool_is_rejected() {
        assert!(matches!(KeyPool::new(vec![]), Err(Error::NoKeys)));
    }

    #[test]
    fn test_rotation_excludes_permanently() {
        let mut pool = pool(&["a", "b", "c"]);
        assert_eq!(pool.current(), Some("a"));
        assert_eq!(pool.remaining(), 3);

        pool.advance();
        assert_eq!(pool.current(), Some("b"));

        pool.advance();
        assert_eq!(pool.current(), Some("c"));
        assert_eq!(pool.remaining(), 1);

        // Current key stays selected until it fails too
        assert_eq!(pool.current(), Some("c"));
        assert!(!pool.is_exhausted());
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = pool(&["a"]);
        pool.advance();
        assert_eq!(pool.current(), None);
        assert!(pool.is_exhausted());
        assert_eq!(pool.remaining(), 0);

        // Advancing past the end stays exhausted
        pool.advance();
        assert!(pool.is_exhausted());
    }
}
