use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::{debug, error, info, warn};

use matchmate_client::ProfileSource;
use matchmate_db::Database;
use matchmate_types::models::{HistoryProfile, Profile};

use crate::convert::{profile_to_row, row_to_history, row_to_profile};

/// What a single fetch did to the active table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// This many new profiles were cached.
    Appended(usize),
    /// The API answered, but every profile was already known.
    AllKnown,
    /// The API answered with no profiles.
    Empty,
    /// Network, decode or store failure. Already logged.
    Failed,
}

/// Coordinates the random-user API and the local store.
pub struct ProfileRepository<S> {
    db: Arc<Database>,
    source: S,
    batch_size: u32,
}

impl<S: ProfileSource> ProfileRepository<S> {
    pub fn new(db: Arc<Database>, source: S, batch_size: u32) -> Self {
        Self {
            db,
            source,
            batch_size,
        }
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch `size` profiles and append the ones the store has never seen.
    ///
    /// Never fails: errors are logged and reported as [`BatchOutcome::Failed`].
    pub async fn fetch_next_batch(&self, size: u32) -> BatchOutcome {
        debug!("Attempting to fetch next batch of {} profiles", size);

        match self.try_fetch_next_batch(size).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Could not fetch profiles: {:#}", e);
                BatchOutcome::Failed
            }
        }
    }

    async fn try_fetch_next_batch(&self, size: u32) -> Result<BatchOutcome> {
        let mut known = self.blocking(|db| db.known_uids()).await?;
        debug!("Found {} known profiles in store", known.len());

        let response = self.source.fetch_profiles(size).await?;
        if let Some(info) = &response.info {
            debug!("API page {:?}, seed {:?}", info.page, info.seed);
        }

        if response.results.is_empty() {
            warn!("API response contained no profiles");
            return Ok(BatchOutcome::Empty);
        }

        let received = response.results.len();
        // `insert` is false for known uids and for repeats inside this batch.
        let fresh: Vec<_> = response
            .results
            .into_iter()
            .map(|user| user.into_profile())
            .filter(|profile| known.insert(profile.uid.clone()))
            .map(|profile| profile_to_row(&profile))
            .collect();

        if fresh.is_empty() {
            warn!("All {} fetched profiles are already known, nothing added", received);
            return Ok(BatchOutcome::AllKnown);
        }

        // The store re-checks both tables, since `known` may be stale by now.
        let appended = self.blocking(move |db| db.insert_profiles(&fresh)).await?;
        if appended == 0 {
            warn!("All {} fetched profiles were stored meanwhile, nothing added", received);
            return Ok(BatchOutcome::AllKnown);
        }
        info!("Appended {} of {} fetched profiles", appended, received);
        Ok(BatchOutcome::Appended(appended))
    }

    /// Active profiles. An empty table triggers one fetch first.
    pub async fn get_all_cached(&self) -> Result<Vec<Profile>> {
        debug!("Retrieving all profiles from local cache");

        let rows = self.blocking(|db| db.get_all_profiles()).await?;
        if !rows.is_empty() {
            return Ok(rows.into_iter().map(row_to_profile).collect());
        }

        self.fetch_next_batch(self.batch_size).await;
        let rows = self.blocking(|db| db.get_all_profiles()).await?;
        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    pub async fn history(&self) -> Result<Vec<HistoryProfile>> {
        debug!("Retrieving history from local cache");

        let rows = self.blocking(|db| db.get_history()).await?;
        Ok(rows.into_iter().map(row_to_history).collect())
    }

    /// Record the user's decision: the profile leaves the active table and
    /// lands in history in one transaction.
    pub async fn move_to_history(&self, profile: &Profile) -> Result<()> {
        if !profile.interaction_status.is_decided() {
            bail!("Profile {} has no decision to record", profile.uid);
        }

        let row = profile_to_row(profile);
        self.blocking(move |db| db.move_to_history(&row)).await?;

        info!("Profile {} moved to history ({})", profile.uid, profile.interaction_status);
        Ok(())
    }

    /// Drop every undecided profile. History is kept.
    pub async fn clear_all_profiles(&self) -> Result<usize> {
        let cleared = self.blocking(|db| db.delete_all_profiles()).await?;
        info!("Cleared {} profiles from the cache", cleared);
        Ok(cleared)
    }

    /// Run a store call off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&*db))
            .await
            .map_err(|e| anyhow!("spawn_blocking join error: {}", e))?
    }
}
