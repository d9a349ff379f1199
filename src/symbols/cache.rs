//! The per-catalog global binding cache.
//!
//! Holds column-unification results and expansions of stored functions
//! whose result depends only on argument types. One coarse
//! `parking_lot::Mutex` guards the whole cache; entry points lock it
//! once and thread the guard through the binding pass.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::semantic::Expansion;
use super::types::TableSymbol;

// ============================================================================
// CACHE KEYS
// ============================================================================

/// The column unification discipline (see the binder's unifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnifyStrategy {
    ByName,
    ByNameAndType,
    CommonColumns,
}

/// Key for a unification result: strategy plus the identity of each
/// input table, in order. Only stable (catalog) tables are keyed, so
/// pointer identity is sound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnifyKey {
    pub strategy: UnifyStrategy,
    pub tables: Vec<usize>,
}

impl UnifyKey {
    pub fn new(strategy: UnifyStrategy, tables: &[Arc<TableSymbol>]) -> Self {
        Self {
            strategy,
            tables: tables.iter().map(|t| Arc::as_ptr(t) as usize).collect(),
        }
    }
}

/// One argument slot of a call-site fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgumentFingerprint {
    pub name: SmolStr,
    /// Structural key of the bound type.
    pub type_key: String,
    pub is_constant: bool,
    /// Canonical rendering of the constant value, when known.
    pub constant: Option<String>,
}

/// Identity of a call site for expansion caching: the signature plus
/// every parameter's (name, type, constness, constant value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSiteFingerprint {
    /// Pointer identity of the signature.
    pub signature: usize,
    pub arguments: Vec<ArgumentFingerprint>,
}

// ============================================================================
// THE CACHE
// ============================================================================

/// Mutable cache payload; only reachable through the lock.
#[derive(Debug, Default)]
pub struct BindingCacheData {
    pub unification: FxHashMap<UnifyKey, Arc<TableSymbol>>,
    /// `None` records "expansion unavailable" so failed probes are not
    /// repeated.
    pub expansions: FxHashMap<CallSiteFingerprint, Option<Arc<Expansion>>>,
}

/// The shared cache, one per catalog snapshot.
#[derive(Debug, Default)]
pub struct GlobalBindingCache {
    inner: Mutex<BindingCacheData>,
}

impl GlobalBindingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Acquire the coarse lock for the duration of a binding pass.
    pub fn lock(&self) -> MutexGuard<'_, BindingCacheData> {
        self.inner.lock()
    }
}
