//! The catalog snapshot the binder resolves against.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;

use super::cache::GlobalBindingCache;
use super::model::{ClusterSymbol, DatabaseSymbol};
use crate::base::name_eq;
use crate::syntax::SyntaxTree;

// ============================================================================
// BODY PARSING HOOK
// ============================================================================

/// Parses stored-function body text with the function-body grammar.
///
/// The grammar itself is an external collaborator. When no parser is
/// registered, or parsing fails, the binder records the expansion as
/// unavailable and falls back to non-computed return typing.
pub trait FunctionBodyParser: Send + Sync {
    fn parse(&self, body: &str) -> Option<SyntaxTree>;
}

impl fmt::Debug for dyn FunctionBodyParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FunctionBodyParser")
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Catalog construction validation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("The catalog has no clusters.")]
    NoClusters,

    #[error("A cluster named '{0}' already exists.")]
    DuplicateCluster(SmolStr),

    #[error("The cluster '{cluster}' already has a database named '{database}'.")]
    DuplicateDatabase { cluster: SmolStr, database: SmolStr },

    #[error("The database '{database}' already has a table named '{table}'.")]
    DuplicateTable { database: SmolStr, table: SmolStr },

    #[error("There is no cluster named '{0}'.")]
    UnknownCluster(SmolStr),

    #[error("There is no database named '{0}' in the current cluster.")]
    UnknownDatabase(SmolStr),
}

// ============================================================================
// THE CATALOG
// ============================================================================

/// A read-only snapshot of clusters, databases, tables and stored
/// functions, plus the binding cache scoped to it.
///
/// Safe to share across bindings; symbols live as long as the snapshot.
#[derive(Debug, Clone)]
pub struct Catalog {
    clusters: Vec<Arc<ClusterSymbol>>,
    current_cluster: Arc<ClusterSymbol>,
    current_database: Arc<DatabaseSymbol>,
    body_parser: Option<Arc<dyn FunctionBodyParser>>,
    cache: Arc<GlobalBindingCache>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn clusters(&self) -> &[Arc<ClusterSymbol>] {
        &self.clusters
    }

    pub fn current_cluster(&self) -> &Arc<ClusterSymbol> {
        &self.current_cluster
    }

    pub fn current_database(&self) -> &Arc<DatabaseSymbol> {
        &self.current_database
    }

    pub fn find_cluster(&self, name: &str) -> Option<&Arc<ClusterSymbol>> {
        self.clusters.iter().find(|c| name_eq(&c.name, name))
    }

    pub fn body_parser(&self) -> Option<&Arc<dyn FunctionBodyParser>> {
        self.body_parser.as_ref()
    }

    pub fn cache(&self) -> &Arc<GlobalBindingCache> {
        &self.cache
    }

    /// True when the table is a declared table of the current database
    /// (identity, not structure) — the condition for global caching of
    /// unification results.
    pub fn is_current_database_table(&self, table: &Arc<super::types::TableSymbol>) -> bool {
        self.current_database
            .tables
            .iter()
            .any(|t| Arc::ptr_eq(t, table))
    }

    /// A derived snapshot with a different current cluster/database,
    /// sharing symbols and the cache. Used when expanding a stored
    /// function in its owning database's context.
    pub fn with_current(
        &self,
        cluster: Arc<ClusterSymbol>,
        database: Arc<DatabaseSymbol>,
    ) -> Catalog {
        Catalog {
            clusters: self.clusters.clone(),
            current_cluster: cluster,
            current_database: database,
            body_parser: self.body_parser.clone(),
            cache: self.cache.clone(),
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Validating [`Catalog`] builder.
#[derive(Default)]
pub struct CatalogBuilder {
    clusters: Vec<Arc<ClusterSymbol>>,
    current_cluster: Option<SmolStr>,
    current_database: Option<SmolStr>,
    body_parser: Option<Arc<dyn FunctionBodyParser>>,
}

impl CatalogBuilder {
    pub fn add_cluster(mut self, cluster: Arc<ClusterSymbol>) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Select the default cluster and database for unqualified lookup.
    pub fn current(mut self, cluster: impl Into<SmolStr>, database: impl Into<SmolStr>) -> Self {
        self.current_cluster = Some(cluster.into());
        self.current_database = Some(database.into());
        self
    }

    pub fn body_parser(mut self, parser: Arc<dyn FunctionBodyParser>) -> Self {
        self.body_parser = Some(parser);
        self
    }

    pub fn build(self) -> Result<Catalog, CatalogError> {
        if self.clusters.is_empty() {
            return Err(CatalogError::NoClusters);
        }

        for (i, c) in self.clusters.iter().enumerate() {
            if self.clusters[..i].iter().any(|o| name_eq(&o.name, &c.name)) {
                return Err(CatalogError::DuplicateCluster(c.name.clone()));
            }
            for (j, d) in c.databases.iter().enumerate() {
                if c.databases[..j].iter().any(|o| name_eq(&o.name, &d.name)) {
                    return Err(CatalogError::DuplicateDatabase {
                        cluster: c.name.clone(),
                        database: d.name.clone(),
                    });
                }
                for (k, t) in d.tables.iter().enumerate() {
                    if d.tables[..k].iter().any(|o| name_eq(&o.name, &t.name)) {
                        return Err(CatalogError::DuplicateTable {
                            database: d.name.clone(),
                            table: t.name.clone(),
                        });
                    }
                }
            }
        }

        let current_cluster = match &self.current_cluster {
            Some(name) => self
                .clusters
                .iter()
                .find(|c| name_eq(&c.name, name))
                .cloned()
                .ok_or_else(|| CatalogError::UnknownCluster(name.clone()))?,
            None => self.clusters[0].clone(),
        };

        let current_database = match &self.current_database {
            Some(name) => current_cluster
                .find_database(name)
                .cloned()
                .ok_or_else(|| CatalogError::UnknownDatabase(name.clone()))?,
            None => current_cluster
                .databases
                .first()
                .cloned()
                .unwrap_or_else(|| DatabaseSymbol::new("", Vec::new(), Vec::new())),
        };

        Ok(Catalog {
            clusters: self.clusters,
            current_cluster,
            current_database,
            body_parser: self.body_parser,
            cache: GlobalBindingCache::new(),
        })
    }
}
