//! Unique element naming for one export

use std::collections::{HashMap, HashSet};

/// Hands out unique names: `name`, then `name_1`, `name_2`, ...
///
/// Owned by a single export so counters never leak between conversions.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    next_suffix: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve and return a unique name derived from `base`
    pub fn unique(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let suffix = self.next_suffix.entry(base.to_string()).or_insert(1);
        loop {
            let candidate = format!("{base}_{suffix}");
            *suffix += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_names() {
        let mut names = NameRegistry::new();
        assert_eq!(names.unique("arm"), "arm");
        assert_eq!(names.unique("arm"), "arm_1");
        assert_eq!(names.unique("arm_2"), "arm_2");
        assert_eq!(names.unique("arm"), "arm_3");
        assert_eq!(names.unique("leg"), "leg");
    }

    #[test]
    fn test_registries_are_independent() {
        let mut first = NameRegistry::new();
        first.unique("wheel");
        let mut second = NameRegistry::new();
        assert_eq!(second.unique("wheel"), "wheel");
    }
}
