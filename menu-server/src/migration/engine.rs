//! Menu item migration: nested subcollections → flat `menuItems`
//!
//! One-shot batch job. Each nested item is copied with every field, gets
//! `restaurantId` / `restaurantName` attached and its legacy `id` field
//! dropped, and is inserted into the flat collection.
//!
//! # Guarantees
//!
//! - Not transactional: on the first store failure the run aborts and
//!   everything inserted so far stays (at-least-once).
//! - [`MigrationMode::Append`] inserts under fresh store ids, so a rerun
//!   duplicates every item. [`MigrationMode::Upsert`] keys records as
//!   `{restaurantId}_{legacyItemId}` and overwrites on rerun.
//! - Runs are serialized; restaurants within a run are migrated
//!   concurrently up to the configured limit.

use crate::db::{
    Document, DocumentStore, Fields, MENU_ITEMS, RESTAURANTS, StoreError, nested_menu_items,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared::models::{MenuItem, StoredMenuItem, field};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Shown before a repeat run in append mode
pub const RETRY_WARNING: &str = "Migration has already completed. Running it again inserts a \
second copy of every menu item into the flat collection; it is not idempotent.";

/// Legacy id field dropped from copied documents
const LEGACY_ID_FIELD: &str = "id";

pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_VERIFY_SAMPLE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationMode {
    /// New store-assigned id per record; reruns duplicate
    #[default]
    Append,
    /// Deterministic `{restaurantId}_{legacyItemId}` id; reruns overwrite
    Upsert,
}

impl FromStr for MigrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(MigrationMode::Append),
            "upsert" => Ok(MigrationMode::Upsert),
            other => Err(format!("unknown migration mode '{other}' (expected append or upsert)")),
        }
    }
}

impl fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationMode::Append => f.write_str("append"),
            MigrationMode::Upsert => f.write_str("upsert"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Max restaurants migrated at once (0 is treated as 1)
    pub concurrency: usize,
    pub mode: MigrationMode,
    pub verify_sample_size: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            mode: MigrationMode::Append,
            verify_sample_size: DEFAULT_VERIFY_SAMPLE_SIZE,
        }
    }
}

#[derive(Debug, Error)]
pub enum MigrationError {
    /// Run aborted; counts cover the work committed before the failure
    #[error(
        "Migration aborted after {restaurants_processed} restaurants and {items_migrated} items: {source}"
    )]
    PartialFailure {
        restaurants_processed: usize,
        items_migrated: usize,
        #[source]
        source: StoreError,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    NotStarted,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub migrated_count: usize,
    pub restaurants_processed: usize,
    pub mode: MigrationMode,
    pub duration_ms: u64,
}

/// Migration state as seen by the admin tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub state: MigrationState,
    pub mode: MigrationMode,
    pub completed_runs: u32,
    pub last_report: Option<MigrationReport>,
    /// Present when another run would duplicate data
    pub warning: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    /// Documents in the flat collection
    pub count: usize,
    /// First decodable items, in store order
    pub sample: Vec<MenuItem>,
    /// Ids of flat items whose `restaurantId` names no existing restaurant
    pub orphaned: Vec<String>,
    /// Ids of flat items that fail to decode
    pub invalid: Vec<String>,
}

/// Outcome of a guarded run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(MigrationReport),
    /// Refused: a previous run completed and duplicates were not acknowledged
    Refused { warning: &'static str },
}

#[derive(Debug)]
struct Progress {
    state: MigrationState,
    completed_runs: u32,
    last_report: Option<MigrationReport>,
}

pub struct MigrationEngine {
    store: Arc<dyn DocumentStore>,
    config: MigrationConfig,
    progress: Mutex<Progress>,
    /// Serializes runs
    run_lock: tokio::sync::Mutex<()>,
}

impl MigrationEngine {
    pub fn new(store: Arc<dyn DocumentStore>, config: MigrationConfig) -> Self {
        Self {
            store,
            config,
            progress: Mutex::new(Progress {
                state: MigrationState::NotStarted,
                completed_runs: 0,
                last_report: None,
            }),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn status(&self) -> MigrationStatus {
        let progress = self.progress.lock();
        MigrationStatus {
            state: progress.state,
            mode: self.config.mode,
            completed_runs: progress.completed_runs,
            last_report: progress.last_report.clone(),
            warning: self.duplicate_warning(progress.state),
        }
    }

    fn duplicate_warning(&self, state: MigrationState) -> Option<&'static str> {
        (state == MigrationState::Completed && self.config.mode == MigrationMode::Append)
            .then_some(RETRY_WARNING)
    }

    /// Run unconditionally. In append mode a rerun duplicates every item.
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        let _guard = self.run_lock.lock().await;
        self.run_locked().await
    }

    /// Run unless a completed run would be duplicated without acknowledgement
    pub async fn run_with_guard(
        &self,
        acknowledge_duplicates: bool,
    ) -> Result<RunOutcome, MigrationError> {
        let _guard = self.run_lock.lock().await;
        let state = self.progress.lock().state;
        if let Some(warning) = self.duplicate_warning(state)
            && !acknowledge_duplicates
        {
            tracing::warn!("Migration rerun refused: duplicates not acknowledged");
            return Ok(RunOutcome::Refused { warning });
        }
        self.run_locked().await.map(RunOutcome::Completed)
    }

    async fn run_locked(&self) -> Result<MigrationReport, MigrationError> {
        let started = Instant::now();
        let mode = self.config.mode;
        tracing::info!(mode = %mode, concurrency = self.config.concurrency, "Menu item migration started");

        let restaurants = self.store.query(RESTAURANTS, &[]).await.map_err(|source| {
            tracing::error!(error = %source, "Failed to list restaurants");
            MigrationError::PartialFailure {
                restaurants_processed: 0,
                items_migrated: 0,
                source,
            }
        })?;

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let items_migrated = Arc::new(AtomicUsize::new(0));
        let restaurants_processed = Arc::new(AtomicUsize::new(0));

        let mut tasks = JoinSet::new();
        for restaurant in restaurants {
            let store = self.store.clone();
            let semaphore = semaphore.clone();
            let items_migrated = items_migrated.clone();
            let restaurants_processed = restaurants_processed.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                migrate_restaurant(store.as_ref(), mode, &restaurant, &items_migrated).await?;
                restaurants_processed.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StoreError>(())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => StoreError::Unavailable(format!("migration task failed: {e}")),
            };
            // 首个失败即中止，已写入的数据保留
            tasks.shutdown().await;
            let restaurants_processed = restaurants_processed.load(Ordering::SeqCst);
            let items_migrated = items_migrated.load(Ordering::SeqCst);
            tracing::error!(
                restaurants_processed,
                items_migrated,
                error = %failure,
                "Menu item migration aborted"
            );
            return Err(MigrationError::PartialFailure {
                restaurants_processed,
                items_migrated,
                source: failure,
            });
        }

        let report = MigrationReport {
            migrated_count: items_migrated.load(Ordering::SeqCst),
            restaurants_processed: restaurants_processed.load(Ordering::SeqCst),
            mode,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        {
            let mut progress = self.progress.lock();
            progress.state = MigrationState::Completed;
            progress.completed_runs += 1;
            progress.last_report = Some(report.clone());
        }

        tracing::info!(
            count = report.migrated_count,
            restaurants = report.restaurants_processed,
            duration_ms = report.duration_ms,
            "Menu item migration completed"
        );
        Ok(report)
    }

    /// Read-only check of the flat collection
    pub async fn verify(&self, sample_size: Option<usize>) -> Result<VerifyReport, MigrationError> {
        let sample_size = sample_size.unwrap_or(self.config.verify_sample_size);
        let docs = self.store.query(MENU_ITEMS, &[]).await?;
        let restaurant_ids: HashSet<String> = self
            .store
            .query(RESTAURANTS, &[])
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect();

        let mut report = VerifyReport {
            count: docs.len(),
            sample: Vec::new(),
            orphaned: Vec::new(),
            invalid: Vec::new(),
        };

        for doc in &docs {
            let owned = doc
                .str_field(field::RESTAURANT_ID)
                .is_some_and(|rid| restaurant_ids.contains(rid));
            if !owned {
                report.orphaned.push(doc.id.clone());
            }

            match StoredMenuItem::from_fields(&doc.data)
                .and_then(|stored| stored.into_menu_item(&doc.id, None))
            {
                Ok(item) if report.sample.len() < sample_size => report.sample.push(item),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(item_id = %doc.id, error = %e, "Flat menu item does not decode");
                    report.invalid.push(doc.id.clone());
                }
            }
        }

        tracing::info!(
            count = report.count,
            orphaned = report.orphaned.len(),
            invalid = report.invalid.len(),
            "Migration verification finished"
        );
        Ok(report)
    }
}

async fn migrate_restaurant(
    store: &dyn DocumentStore,
    mode: MigrationMode,
    restaurant: &Document,
    items_migrated: &AtomicUsize,
) -> Result<(), StoreError> {
    let restaurant_id = restaurant.id.as_str();
    let restaurant_name = restaurant.str_field(field::NAME);
    if restaurant_name.is_none() {
        tracing::warn!(restaurant_id = %restaurant_id, "Restaurant has no name, restaurantName is left unset");
    }

    let nested = store.query(&nested_menu_items(restaurant_id), &[]).await?;
    let nested_count = nested.len();

    for doc in nested {
        let legacy_id = doc.id;
        let fields = flatten(doc.data, restaurant_id, restaurant_name);
        match mode {
            MigrationMode::Append => {
                store.add(MENU_ITEMS, fields).await?;
            }
            MigrationMode::Upsert => {
                let id = format!("{restaurant_id}_{legacy_id}");
                store.set(MENU_ITEMS, &id, fields, false).await?;
            }
        }
        items_migrated.fetch_add(1, Ordering::SeqCst);
    }

    tracing::debug!(restaurant_id = %restaurant_id, count = nested_count, "Restaurant menu migrated");
    Ok(())
}

/// Copy of a nested item with the foreign key attached
fn flatten(mut fields: Fields, restaurant_id: &str, restaurant_name: Option<&str>) -> Fields {
    fields.remove(LEGACY_ID_FIELD);
    fields.insert(field::RESTAURANT_ID.into(), restaurant_id.into());
    if let Some(name) = restaurant_name {
        fields.insert(field::RESTAURANT_NAME.into(), name.into());
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_attaches_foreign_key_and_drops_legacy_id() {
        let fields = json!({ "id": "old-1", "name": "Dal", "price": 100 })
            .as_object()
            .cloned()
            .unwrap();
        let flat = flatten(fields, "r1", Some("Spice Hub"));
        assert!(!flat.contains_key("id"));
        assert_eq!(flat["restaurantId"], json!("r1"));
        assert_eq!(flat["restaurantName"], json!("Spice Hub"));
        assert_eq!(flat["price"], json!(100));
    }

    #[test]
    fn flatten_without_name_leaves_name_unset() {
        let flat = flatten(Fields::new(), "r1", None);
        assert!(!flat.contains_key("restaurantName"));
    }

    #[test]
    fn mode_parses() {
        assert_eq!("UPSERT".parse::<MigrationMode>().unwrap(), MigrationMode::Upsert);
        assert_eq!("append".parse::<MigrationMode>().unwrap(), MigrationMode::Append);
        assert!("merge".parse::<MigrationMode>().is_err());
    }
}
