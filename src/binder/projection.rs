//! The projection builder: incremental output-schema construction for
//! project/extend/rename/reorder/summarize and friends.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::{UniqueNames, name_cmp_key};
use crate::symbols::{ColumnSymbol, TableSymbol};

/// Outcome of a declare call.
#[derive(Debug, PartialEq, Eq)]
pub enum DeclareOutcome {
    Added,
    Replaced,
    Duplicate,
}

/// Accumulates an ordered output column list, tracking declared names,
/// uniqueness, and source columns marked do-not-add-again.
#[derive(Debug, Default)]
pub struct ProjectionBuilder {
    columns: Vec<Arc<ColumnSymbol>>,
    index_by_name: FxHashMap<SmolStr, usize>,
    names: UniqueNames,
    do_not_add: FxHashSet<usize>,
}

impl ProjectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an existing row scope (extend/parse start like this).
    pub fn from_columns(columns: &[Arc<ColumnSymbol>]) -> Self {
        let mut builder = Self::new();
        for col in columns {
            builder.declare(col.clone(), true);
        }
        builder
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_by_name.contains_key(&name_cmp_key(name))
    }

    /// Declare a column under its own name.
    ///
    /// An existing name is updated in place when `replace` is true and
    /// reported as a duplicate otherwise.
    pub fn declare(&mut self, column: Arc<ColumnSymbol>, replace: bool) -> DeclareOutcome {
        let key = name_cmp_key(&column.name);
        match self.index_by_name.get(&key) {
            Some(&index) if replace => {
                self.columns[index] = column;
                DeclareOutcome::Replaced
            }
            Some(_) => DeclareOutcome::Duplicate,
            None => {
                self.names.reserve(&column.name);
                self.index_by_name.insert(key, self.columns.len());
                self.columns.push(column);
                DeclareOutcome::Added
            }
        }
    }

    /// Add a column, renaming to keep output names unique. A column in
    /// the do-not-add set is skipped; `do_not_repeat` puts it there.
    pub fn add(&mut self, column: Arc<ColumnSymbol>, do_not_repeat: bool, replace: bool) {
        let identity = Arc::as_ptr(&column) as usize;
        if self.do_not_add.contains(&identity) {
            return;
        }
        if do_not_repeat {
            self.do_not_add.insert(identity);
        }
        if replace && self.contains(&column.name) {
            self.declare(column, true);
            return;
        }
        let unique = self.names.add(&column.name);
        let column = if unique == column.name {
            column
        } else {
            column.with_name(unique)
        };
        let key = name_cmp_key(&column.name);
        self.index_by_name.insert(key, self.columns.len());
        self.columns.push(column);
    }

    /// Rename an existing entry. Fails when `from` is absent.
    pub fn rename(&mut self, from: &str, to: impl Into<SmolStr>) -> bool {
        let from_key = name_cmp_key(from);
        let Some(index) = self.index_by_name.remove(&from_key) else {
            return false;
        };
        let to: SmolStr = to.into();
        self.names.release(from);
        self.names.reserve(&to);
        let renamed = self.columns[index].with_name(to.clone());
        self.columns[index] = renamed;
        self.index_by_name.insert(name_cmp_key(&to), index);
        true
    }

    /// Mark a source column consumed without emitting it.
    pub fn do_not_add(&mut self, column: &Arc<ColumnSymbol>) {
        self.do_not_add.insert(Arc::as_ptr(column) as usize);
    }

    /// Remove a declared column by name (project-away).
    pub fn remove(&mut self, name: &str) -> bool {
        let key = name_cmp_key(name);
        let Some(index) = self.index_by_name.remove(&key) else {
            return false;
        };
        self.names.release(name);
        self.columns.remove(index);
        for slot in self.index_by_name.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        true
    }

    /// Move an existing column to the front-most unmoved position
    /// (project-reorder).
    pub fn move_to_front(&mut self, name: &str, front_len: &mut usize) -> bool {
        let key = name_cmp_key(name);
        let Some(&index) = self.index_by_name.get(&key) else {
            return false;
        };
        if index < *front_len {
            return true;
        }
        let column = self.columns.remove(index);
        self.columns.insert(*front_len, column);
        *front_len += 1;
        self.reindex();
        true
    }

    fn reindex(&mut self) {
        self.index_by_name.clear();
        for (i, c) in self.columns.iter().enumerate() {
            self.index_by_name.insert(name_cmp_key(&c.name), i);
        }
    }

    pub fn columns(&self) -> &[Arc<ColumnSymbol>] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Arc<ColumnSymbol>> {
        self.columns
    }

    /// Seal into an anonymous output schema.
    pub fn into_table(self) -> Arc<TableSymbol> {
        TableSymbol::schema(self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{ScalarType, TypeSymbol};

    fn col(name: &str) -> Arc<ColumnSymbol> {
        ColumnSymbol::scalar(name, ScalarType::Long)
    }

    #[test]
    fn test_declare_replace_updates_in_place() {
        let mut b = ProjectionBuilder::new();
        b.declare(col("a"), false);
        b.declare(col("b"), false);
        let replaced = b.declare(
            ColumnSymbol::scalar("a", ScalarType::String),
            true,
        );
        assert_eq!(replaced, DeclareOutcome::Replaced);
        assert_eq!(b.columns()[0].column_type, TypeSymbol::STRING);
        assert_eq!(b.columns().len(), 2);
    }

    #[test]
    fn test_declare_duplicate_reported() {
        let mut b = ProjectionBuilder::new();
        b.declare(col("a"), false);
        assert_eq!(b.declare(col("a"), false), DeclareOutcome::Duplicate);
    }

    #[test]
    fn test_add_uniquifies() {
        let mut b = ProjectionBuilder::new();
        b.declare(col("x"), false);
        b.add(col("x"), false, false);
        assert_eq!(b.columns()[1].name, "x_1");
    }

    #[test]
    fn test_do_not_add_again() {
        let mut b = ProjectionBuilder::new();
        let c = col("x");
        b.add(c.clone(), true, false);
        b.add(c, true, false);
        assert_eq!(b.columns().len(), 1);
    }

    #[test]
    fn test_rename_missing_fails() {
        let mut b = ProjectionBuilder::new();
        b.declare(col("a"), false);
        assert!(b.rename("a", "z"));
        assert!(!b.rename("nope", "w"));
        assert_eq!(b.columns()[0].name, "z");
        assert!(b.contains("z"));
        assert!(!b.contains("a"));
    }

    #[test]
    fn test_remove_reindexes() {
        let mut b = ProjectionBuilder::new();
        b.declare(col("a"), false);
        b.declare(col("b"), false);
        b.declare(col("c"), false);
        assert!(b.remove("b"));
        assert!(b.contains("c"));
        assert!(b.rename("c", "c2"));
        let names: Vec<_> = b.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c2"]);
    }

    #[test]
    fn test_move_to_front_order() {
        let mut b = ProjectionBuilder::new();
        for n in ["a", "b", "c", "d"] {
            b.declare(col(n), false);
        }
        let mut front = 0usize;
        assert!(b.move_to_front("c", &mut front));
        assert!(b.move_to_front("a", &mut front));
        let names: Vec<_> = b.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b", "d"]);
    }
}
