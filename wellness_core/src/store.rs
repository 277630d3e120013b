//! Profile and check-in persistence.
//!
//! [`ProfileStore`] is the seam between the advisory core and wherever records
//! live. [`MemoryStore`] keeps everything in process; see
//! [`crate::file_store::FileStore`] for the on-disk variant.

use crate::checkin::DailyLog;
use crate::digest::{recent_window, upsert_entry, Upsert};
use crate::profile::{Profile, ProfileDraft};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Storage for profiles and their daily check-ins
pub trait ProfileStore: Send + Sync {
    fn create_profile(&self, draft: ProfileDraft) -> Result<Uuid>;

    fn get_profile(&self, id: Uuid) -> Result<Profile>;

    /// Replace a profile's attributes, keeping its id and creation time
    fn update_profile(&self, id: Uuid, draft: ProfileDraft) -> Result<Profile>;

    /// Store `entry`, overwriting any entry already logged for that date
    fn append_or_replace_log(&self, id: Uuid, entry: DailyLog) -> Result<Upsert>;

    /// Up to `limit` most recent entries, newest first
    fn list_recent_logs(&self, id: Uuid, limit: usize) -> Result<Vec<DailyLog>>;

    /// All profiles, oldest first
    fn list_profiles(&self) -> Result<Vec<Profile>>;
}

#[derive(Debug)]
struct Record {
    profile: Profile,
    // Sorted by date ascending
    logs: Vec<DailyLog>,
}

/// In-process store guarded by a single mutex
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Uuid, Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProfileStore for MemoryStore {
    fn create_profile(&self, draft: ProfileDraft) -> Result<Uuid> {
        let profile = Profile::create(draft)?;
        let id = profile.id;
        self.lock().insert(
            id,
            Record {
                profile,
                logs: Vec::new(),
            },
        );
        tracing::debug!("Created profile {}", id);
        Ok(id)
    }

    fn get_profile(&self, id: Uuid) -> Result<Profile> {
        self.lock()
            .get(&id)
            .map(|r| r.profile.clone())
            .ok_or(Error::ProfileNotFound(id))
    }

    fn update_profile(&self, id: Uuid, draft: ProfileDraft) -> Result<Profile> {
        let mut records = self.lock();
        let record = records.get_mut(&id).ok_or(Error::ProfileNotFound(id))?;
        record.profile.apply(draft)?;
        Ok(record.profile.clone())
    }

    fn append_or_replace_log(&self, id: Uuid, entry: DailyLog) -> Result<Upsert> {
        let mut records = self.lock();
        let record = records.get_mut(&id).ok_or(Error::ProfileNotFound(id))?;
        Ok(upsert_entry(&mut record.logs, entry))
    }

    fn list_recent_logs(&self, id: Uuid, limit: usize) -> Result<Vec<DailyLog>> {
        let records = self.lock();
        let record = records.get(&id).ok_or(Error::ProfileNotFound(id))?;
        Ok(recent_window(&record.logs, limit)
            .into_iter()
            .cloned()
            .collect())
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut profiles: Vec<Profile> =
            self.lock().values().map(|r| r.profile.clone()).collect();
        profiles.sort_by_key(|p| p.created_at);
        Ok(profiles)
    }
}
