//! Prefix index planning for digest-prefixed columns.
//!
//! A unique constraint over whole stored values would be meaningless: every
//! encryption of the same plaintext differs. Uniqueness and lookups are
//! instead served by an index over the fixed-length digest prefix. This
//! module only describes those indexes; creating them (expression index,
//! generated column, ...) belongs to the schema layer.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::DIGEST_LEN;
use crate::field::{FieldSpec, IndexIntent};

/// Longest index name emitted, matching PostgreSQL's identifier limit.
pub const MAX_INDEX_NAME_LEN: usize = 63;

/// Abstract index over the digest prefix of one column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Index name, deterministic for (table, column, uniqueness).
    pub name: String,
    /// Table the column lives in.
    pub table: String,
    /// Indexed column.
    pub column: String,
    /// Number of leading bytes covered.
    pub prefix_len: usize,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexDefinition {
    /// Whether `self` covers the digest prefix of `table.column`, ignoring
    /// name and uniqueness.
    pub fn covers_prefix_of(&self, table: &str, column: &str) -> bool {
        self.table == table && self.column == column && self.prefix_len == DIGEST_LEN
    }

    fn same_shape(&self, other: &IndexDefinition) -> bool {
        self.covers_prefix_of(&other.table, &other.column) && self.unique == other.unique
    }
}

/// Schema changes needed to move a column between two definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDiff {
    /// Existing index to drop, if any.
    pub drop: Option<IndexDefinition>,
    /// Index to create, if any.
    pub create: Option<IndexDefinition>,
}

impl IndexDiff {
    /// `true` when nothing needs to change.
    pub fn is_noop(&self) -> bool {
        self.drop.is_none() && self.create.is_none()
    }
}

/// Catalog access provided by the schema layer.
#[cfg_attr(test, mockall::automock)]
pub trait IndexCatalog {
    /// Indexes currently present on `table`.
    fn list_indexes(&self, table: &str) -> Vec<IndexDefinition>;
}

/// Decides which prefix index, if any, backs a field.
pub struct IndexPolicy;

impl IndexPolicy {
    /// The index `spec` needs on `table.column`, or `None` for unindexed
    /// fields.
    pub fn plan(spec: &FieldSpec, table: &str, column: &str) -> Option<IndexDefinition> {
        Self::plan_intent(spec.index_intent(), table, column)
    }

    /// Like [`plan`](Self::plan), from a bare intent.
    pub fn plan_intent(intent: IndexIntent, table: &str, column: &str) -> Option<IndexDefinition> {
        let unique = match intent {
            IndexIntent::None => return None,
            IndexIntent::Index => false,
            IndexIntent::Unique => true,
        };
        Some(IndexDefinition {
            name: index_name(table, column, unique),
            table: table.to_owned(),
            column: column.to_owned(),
            prefix_len: DIGEST_LEN,
            unique,
        })
    }

    /// Changes needed when `table.column` moves from `old` to `new`.
    ///
    /// Consults `catalog` so that re-applying the same transition is a
    /// no-op: an old index already gone is not dropped again, and a new
    /// index already present is not created again.
    pub fn diff(
        old: &FieldSpec,
        new: &FieldSpec,
        table: &str,
        column: &str,
        catalog: &dyn IndexCatalog,
    ) -> IndexDiff {
        Self::diff_intents(old.index_intent(), new.index_intent(), table, column, catalog)
    }

    /// Like [`diff`](Self::diff), from bare intents.
    pub fn diff_intents(
        old: IndexIntent,
        new: IndexIntent,
        table: &str,
        column: &str,
        catalog: &dyn IndexCatalog,
    ) -> IndexDiff {
        if old == new {
            return IndexDiff::default();
        }
        let existing = catalog.list_indexes(table);
        let wanted_old = Self::plan_intent(old, table, column);
        let wanted_new = Self::plan_intent(new, table, column);

        // Drop whatever prefix index the catalog holds for the column, under
        // whatever name and uniqueness, unless it already is the new index.
        let drop = wanted_old.and_then(|_| {
            existing
                .iter()
                .find(|e| {
                    e.covers_prefix_of(table, column)
                        && !wanted_new.as_ref().is_some_and(|n| e.same_shape(n))
                })
                .cloned()
        });
        let create = wanted_new.filter(|n| !existing.iter().any(|e| e.same_shape(n)));
        IndexDiff { drop, create }
    }
}

/// `<table>_<column>_<hash>_prehash[_uniq]`, truncated to
/// [`MAX_INDEX_NAME_LEN`] while keeping the hash and suffix.
fn index_name(table: &str, column: &str, unique: bool) -> String {
    let suffix = if unique { "_prehash_uniq" } else { "_prehash" };
    let hash = Sha256::new()
        .chain_update(table.as_bytes())
        .chain_update([0u8])
        .chain_update(column.as_bytes())
        .finalize();
    let hash_hex: String = hash[..4].iter().map(|b| format!("{b:02x}")).collect();

    let tail = format!("_{hash_hex}{suffix}");
    let mut head = format!("{table}_{column}");
    let budget = MAX_INDEX_NAME_LEN - tail.len();
    if head.len() > budget {
        let mut cut = budget;
        while !head.is_char_boundary(cut) {
            cut -= 1;
        }
        head.truncate(cut);
    }
    head + &tail
}
