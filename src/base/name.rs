//! Name comparison and unique-name generation.
//!
//! Column and symbol lookup is case-insensitive while display keeps the
//! declared casing, so every map keyed by name goes through
//! [`name_cmp_key`] rather than the raw string.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Case-insensitive equality for symbol names.
pub fn name_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.chars().zip(b.chars()).all(|(x, y)| x.eq_ignore_ascii_case(&y))
}

/// The folded key used for name-indexed maps.
pub fn name_cmp_key(name: &str) -> SmolStr {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        SmolStr::from(name.to_ascii_lowercase())
    } else {
        SmolStr::from(name)
    }
}

/// Generates collision-free names by appending `_1`, `_2`, … suffixes.
///
/// Used by the projection builder and the by-name-and-type unifier; the
/// first taker of a name keeps it unsuffixed.
#[derive(Debug, Default)]
pub struct UniqueNames {
    taken: FxHashSet<SmolStr>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `name` has already been handed out.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(&name_cmp_key(name))
    }

    /// Reserve `name` as-is; returns false if it was already taken.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name_cmp_key(name))
    }

    /// Return `name` or the first free `name_<n>` variant, reserving it.
    pub fn add(&mut self, name: &str) -> SmolStr {
        if self.taken.insert(name_cmp_key(name)) {
            return SmolStr::from(name);
        }
        let mut n = 1u32;
        loop {
            let candidate = SmolStr::from(format!("{name}_{n}"));
            if self.taken.insert(name_cmp_key(&candidate)) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Forget a reservation, so the name can be reused.
    pub fn release(&mut self, name: &str) {
        self.taken.remove(&name_cmp_key(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_eq_ignores_case() {
        assert!(name_eq("Timestamp", "timestamp"));
        assert!(name_eq("x", "X"));
        assert!(!name_eq("x", "y"));
        assert!(!name_eq("x", "xx"));
    }

    #[test]
    fn test_unique_names_suffixing() {
        let mut names = UniqueNames::new();
        assert_eq!(names.add("a"), "a");
        assert_eq!(names.add("a"), "a_1");
        assert_eq!(names.add("a"), "a_2");
        assert_eq!(names.add("b"), "b");
    }

    #[test]
    fn test_unique_names_case_insensitive() {
        let mut names = UniqueNames::new();
        assert_eq!(names.add("Col"), "Col");
        assert_eq!(names.add("col"), "col_1");
    }
}
