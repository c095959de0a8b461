use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of device identifiers for stores that assign their own ids
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Production implementation: random UUID v4, hyphenated lowercase
#[derive(Debug, Clone, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids ("device-1", "device-2", ...) for tests and demos
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("device")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ids_are_uuid_v4() {
        let generator = RandomIdGenerator::new();
        let a = generator.next_id();
        let b = generator.next_id();

        assert_ne!(a, b);
        assert_eq!(Uuid::parse_str(&a).unwrap().get_version_num(), 4);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_sequential_ids() {
        let generator = SequentialIdGenerator::default();
        assert_eq!(generator.next_id(), "device-1");
        assert_eq!(generator.next_id(), "device-2");
        assert_eq!(generator.issued(), 2);
    }

    #[test]
    fn test_sequential_ids_across_threads() {
        use std::collections::HashSet;
        use std::sync::Arc;
        use std::thread;

        let generator = Arc::new(SequentialIdGenerator::new("plant"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&generator);
                thread::spawn(move || gen.next_id())
            })
            .collect();

        let ids: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 8);
        assert!(ids.iter().all(|id| id.starts_with("plant-")));
    }
}
