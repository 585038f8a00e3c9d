use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::db::Database;
use crate::models::{Meal, Recipe, ensure_unique_ids, validate_meal, validate_recipe};

/// The named top-level containers persisted in the key-value area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Meals,
    Recipes,
}

impl Collection {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Collection::Meals => "meals",
            Collection::Recipes => "recipes",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A record type that lives in exactly one collection.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn validate(&self) -> Result<()>;
}

impl Record for Meal {
    const COLLECTION: Collection = Collection::Meals;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        validate_meal(self)
    }
}

impl Record for Recipe {
    const COLLECTION: Collection = Collection::Recipes;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> Result<()> {
        validate_recipe(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Found,
    /// Nothing stored under the key yet.
    Missing,
    /// The stored value is not a valid collection.
    Corrupt { reason: String },
    /// The key-value area itself could not be read.
    Unreadable { reason: String },
}

#[derive(Debug, Clone)]
pub struct Loaded<R> {
    pub records: Vec<R>,
    pub status: LoadStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Failed { reason: String },
}

impl SaveStatus {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved)
    }
}

/// Whole-collection persistence over a [`Database`].
///
/// Reads never fail: a missing, corrupt or unreadable collection loads as
/// empty. Writes never fail either; the outcome is reported as a
/// [`SaveStatus`] and logged.
pub struct Store {
    db: Database,
}

impl Store {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn load<R: Record>(&self) -> Loaded<R> {
        let loaded = read_collection::<R>(&self.db);
        match &loaded.status {
            LoadStatus::Corrupt { reason } | LoadStatus::Unreadable { reason } => {
                tracing::warn!(
                    collection = %R::COLLECTION,
                    %reason,
                    "storage read error, starting with an empty collection"
                );
            }
            LoadStatus::Found | LoadStatus::Missing => {}
        }
        loaded
    }

    /// Replace the stored collection with `records`.
    pub fn save<R: Record>(&self, records: &[R]) -> SaveStatus {
        report_save::<R>(write_collection(&self.db, records))
    }

    /// Apply `mutate` to `current` and persist the result.
    ///
    /// Runs under the storage write lock: if a valid collection is stored it
    /// is merged into `current` before `mutate` runs, so writes made by
    /// another process since `current` was loaded are kept, and so are
    /// in-memory records whose earlier write failed. `mutate` is applied even
    /// when persistence fails; `current` stays authoritative.
    pub fn update<R: Record>(
        &self,
        current: &mut Vec<R>,
        mutate: impl FnOnce(&mut Vec<R>),
    ) -> SaveStatus {
        let mut pending = Some(mutate);
        let result = self.db.with_write_lock(|db| {
            let persisted = read_collection::<R>(db);
            if persisted.status == LoadStatus::Found {
                merge_persisted(current, persisted.records);
            }
            if let Some(mutate) = pending.take() {
                mutate(current);
            }
            write_collection(db, current)
        });
        if let Some(mutate) = pending.take() {
            mutate(current);
        }
        report_save::<R>(result)
    }
}

fn read_collection<R: Record>(db: &Database) -> Loaded<R> {
    let raw = match db.get(R::COLLECTION.key()) {
        Ok(raw) => raw,
        Err(e) => {
            return Loaded {
                records: Vec::new(),
                status: LoadStatus::Unreadable {
                    reason: format!("{e:#}"),
                },
            };
        }
    };

    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Loaded {
            records: Vec::new(),
            status: LoadStatus::Missing,
        };
    };

    match parse_collection::<R>(&raw) {
        Ok(records) => Loaded {
            records,
            status: LoadStatus::Found,
        },
        Err(e) => Loaded {
            records: Vec::new(),
            status: LoadStatus::Corrupt {
                reason: format!("{e:#}"),
            },
        },
    }
}

/// Replace `current` with the stored records, keeping in front any in-memory
/// records the store does not have, such as ones whose write failed.
fn merge_persisted<R: Record>(current: &mut Vec<R>, persisted: Vec<R>) {
    let unsaved: Vec<R> = {
        let stored: HashSet<&str> = persisted.iter().map(|r| r.id()).collect();
        current
            .drain(..)
            .filter(|r| !stored.contains(r.id()))
            .collect()
    };
    *current = unsaved;
    current.extend(persisted);
}

fn parse_collection<R: Record>(raw: &str) -> Result<Vec<R>> {
    let records: Vec<R> = serde_json::from_str(raw)
        .with_context(|| format!("Malformed '{}' collection", R::COLLECTION))?;
    check_collection(&records)?;
    Ok(records)
}

/// The checks a collection must pass to be read back; writes apply them too.
fn check_collection<R: Record>(records: &[R]) -> Result<()> {
    for (i, record) in records.iter().enumerate() {
        record
            .validate()
            .with_context(|| format!("Invalid record at index {i}"))?;
    }
    ensure_unique_ids(records.iter().map(|r| r.id()))
}

fn write_collection<R: Record>(db: &Database, records: &[R]) -> Result<()> {
    check_collection(records)?;
    let json = serde_json::to_string(records)?;
    db.set(R::COLLECTION.key(), &json)
}

fn report_save<R: Record>(result: Result<()>) -> SaveStatus {
    match result {
        Ok(()) => SaveStatus::Saved,
        Err(e) => {
            let reason = format!("{e:#}");
            tracing::warn!(collection = %R::COLLECTION, %reason, "storage write error");
            SaveStatus::Failed { reason }
        }
    }
}
