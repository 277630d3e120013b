//! On-disk profile store.
//!
//! Layout under the data directory:
//!
//! ```text
//! profiles/<id>/profile.json    whole profile, replaced atomically
//! profiles/<id>/checkins.jsonl  append-only journal, one entry per line
//! profiles/<id>/.lock           serializes writers for this profile
//! ```
//!
//! A same-date check-in is appended rather than rewritten in place; readers
//! collapse the journal so the last line for a date wins. [`FileStore::compact`]
//! drops the superseded lines.

use crate::checkin::DailyLog;
use crate::digest::{recent_window, upsert_entry, Upsert};
use crate::profile::{Profile, ProfileDraft};
use crate::store::ProfileStore;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

const PROFILE_FILE: &str = "profile.json";
const JOURNAL_FILE: &str = "checkins.jsonl";
const LOCK_FILE: &str = ".lock";

/// JSON-file store rooted at a data directory
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

/// Held for the duration of a write; released on drop
struct ProfileLock {
    file: File,
}

impl ProfileLock {
    fn exclusive(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }

    fn shared(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.lock_shared()?;
        Ok(Self { file })
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl FileStore {
    /// Open (creating if needed) a store under `data_dir`
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let root = data_dir.into();
        std::fs::create_dir_all(root.join("profiles"))?;
        tracing::debug!("Opened file store at {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_dir(&self, id: Uuid) -> PathBuf {
        self.root.join("profiles").join(id.to_string())
    }

    fn journal_path(&self, id: Uuid) -> PathBuf {
        self.profile_dir(id).join(JOURNAL_FILE)
    }

    fn ensure_exists(&self, id: Uuid) -> Result<PathBuf> {
        let dir = self.profile_dir(id);
        if dir.join(PROFILE_FILE).exists() {
            Ok(dir)
        } else {
            Err(Error::ProfileNotFound(id))
        }
    }

    /// Every check-in for a profile, one per date, oldest first
    pub fn load_logs(&self, id: Uuid) -> Result<Vec<DailyLog>> {
        let dir = self.ensure_exists(id)?;
        let _lock = ProfileLock::shared(&dir.join(LOCK_FILE))?;
        read_journal(&dir.join(JOURNAL_FILE))
    }

    /// Rewrite the journal with one line per date. Returns the lines dropped.
    pub fn compact(&self, id: Uuid) -> Result<usize> {
        let dir = self.ensure_exists(id)?;
        let _lock = ProfileLock::exclusive(&dir.join(LOCK_FILE))?;
        let journal = dir.join(JOURNAL_FILE);

        let before = count_lines(&journal)?;
        let entries = read_journal(&journal)?;

        let mut contents = String::new();
        for entry in &entries {
            contents.push_str(&serde_json::to_string(entry)?);
            contents.push('\n');
        }
        write_atomic(&journal, contents.as_bytes())?;

        let dropped = before.saturating_sub(entries.len());
        tracing::info!(
            "Compacted journal for {}: kept {}, dropped {}",
            id,
            entries.len(),
            dropped
        );
        Ok(dropped)
    }

    fn write_profile(&self, profile: &Profile) -> Result<()> {
        let contents = serde_json::to_string_pretty(profile)?;
        write_atomic(&self.profile_dir(profile.id).join(PROFILE_FILE), contents.as_bytes())
    }
}

impl ProfileStore for FileStore {
    fn create_profile(&self, draft: ProfileDraft) -> Result<Uuid> {
        let profile = Profile::create(draft)?;
        let dir = self.profile_dir(profile.id);
        std::fs::create_dir_all(&dir)?;
        let _lock = ProfileLock::exclusive(&dir.join(LOCK_FILE))?;
        self.write_profile(&profile)?;
        tracing::info!("Created profile {}", profile.id);
        Ok(profile.id)
    }

    fn get_profile(&self, id: Uuid) -> Result<Profile> {
        let dir = self.ensure_exists(id)?;
        let contents = std::fs::read_to_string(dir.join(PROFILE_FILE))?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn update_profile(&self, id: Uuid, draft: ProfileDraft) -> Result<Profile> {
        let dir = self.ensure_exists(id)?;
        let _lock = ProfileLock::exclusive(&dir.join(LOCK_FILE))?;
        let mut profile = self.get_profile(id)?;
        profile.apply(draft)?;
        self.write_profile(&profile)?;
        tracing::info!("Updated profile {}", id);
        Ok(profile)
    }

    fn append_or_replace_log(&self, id: Uuid, entry: DailyLog) -> Result<Upsert> {
        let dir = self.ensure_exists(id)?;
        let _lock = ProfileLock::exclusive(&dir.join(LOCK_FILE))?;
        let journal = dir.join(JOURNAL_FILE);

        let mut existing = read_journal(&journal)?;
        let outcome = upsert_entry(&mut existing, entry.clone());

        let mut line = String::new();
        if !ends_with_newline(&journal)? {
            // Seal a line torn by an earlier crash so it stays isolated
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(&entry)?);
        line.push('\n');

        let file = OpenOptions::new().create(true).append(true).open(&journal)?;
        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        drop(writer);
        file.sync_all()?;

        tracing::debug!("Journaled check-in {} for {} ({:?})", entry.date, id, outcome);
        Ok(outcome)
    }

    fn list_recent_logs(&self, id: Uuid, limit: usize) -> Result<Vec<DailyLog>> {
        let entries = self.load_logs(id)?;
        Ok(recent_window(&entries, limit).into_iter().cloned().collect())
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut profiles = Vec::new();
        for dir_entry in std::fs::read_dir(self.root.join("profiles"))? {
            let path = dir_entry?.path().join(PROFILE_FILE);
            if !path.exists() {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|c| serde_json::from_str::<Profile>(&c).map_err(Error::from));
            match parsed {
                Ok(profile) => profiles.push(profile),
                Err(e) => tracing::warn!("Skipping unreadable profile {:?}: {}", path, e),
            }
        }
        profiles.sort_by_key(|p| p.created_at);
        Ok(profiles)
    }
}

/// Parse the journal, skipping corrupt lines; later lines replace earlier
/// ones for the same date.
fn read_journal(path: &Path) -> Result<Vec<DailyLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<DailyLog>(&line) {
            Ok(entry) => {
                upsert_entry(&mut entries, entry);
            }
            Err(e) => {
                tracing::warn!(
                    "Skipping corrupt check-in at {:?} line {}: {}",
                    path,
                    line_num + 1,
                    e
                );
            }
        }
    }
    Ok(entries)
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    };
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn count_lines(path: &Path) -> Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let reader = BufReader::new(File::open(path)?);
    let mut count = 0;
    for line in reader.lines() {
        if !line?.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

/// Write to a temp file in the same directory, fsync, then rename over `path`
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        writer.write_all(contents)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::tests::sample_checkin;
    use crate::profile::tests::sample_draft;
    use std::sync::Arc;
    use std::thread;

    fn store() -> (tempfile::TempDir, FileStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    fn entry(date: &str, sleep: f32) -> DailyLog {
        sample_checkin(date, sleep).validate().unwrap()
    }

    #[test]
    fn test_profile_persists_across_instances() {
        let (temp_dir, store) = store();
        let id = store.create_profile(sample_draft()).unwrap();

        let reopened = FileStore::open(temp_dir.path()).unwrap();
        let profile = reopened.get_profile(id).unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.height_cm, 170.0);
        assert_eq!(reopened.list_profiles().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_profile_is_not_found() {
        let (_temp_dir, store) = store();
        let id = Uuid::new_v4();
        assert!(matches!(store.get_profile(id), Err(Error::ProfileNotFound(_))));
        assert!(matches!(
            store.list_recent_logs(id, 5),
            Err(Error::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_same_date_last_line_wins() {
        let (_temp_dir, store) = store();
        let id = store.create_profile(sample_draft()).unwrap();

        assert_eq!(
            store.append_or_replace_log(id, entry("2024-01-15", 5.0)).unwrap(),
            Upsert::Inserted
        );
        assert_eq!(
            store.append_or_replace_log(id, entry("2024-01-15", 7.5)).unwrap(),
            Upsert::Replaced
        );

        let logs = store.list_recent_logs(id, 5).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].sleep.hours, 7.5);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let (_temp_dir, store) = store();
        let id = store.create_profile(sample_draft()).unwrap();
        store.append_or_replace_log(id, entry("2024-01-15", 5.0)).unwrap();

        let journal = store.journal_path(id);
        let mut file = OpenOptions::new().append(true).open(&journal).unwrap();
        writeln!(file, "{{\"date\":\"2024-01-16\",\"slee").unwrap();
        drop(file);
        store.append_or_replace_log(id, entry("2024-01-17", 6.0)).unwrap();

        let logs = store.list_recent_logs(id, 5).unwrap();
        let dates: Vec<String> = logs.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-17", "2024-01-15"]);
    }

    #[test]
    fn test_torn_last_line_does_not_swallow_next_append() {
        let (_temp_dir, store) = store();
        let id = store.create_profile(sample_draft()).unwrap();
        store.append_or_replace_log(id, entry("2024-01-15", 5.0)).unwrap();

        let journal = store.journal_path(id);
        let mut file = OpenOptions::new().append(true).open(&journal).unwrap();
        write!(file, "{{\"date\":\"2024-01-1").unwrap();
        drop(file);

        store.append_or_replace_log(id, entry("2024-01-16", 6.0)).unwrap();
        assert_eq!(store.list_recent_logs(id, 5).unwrap().len(), 2);
    }

    #[test]
    fn test_compact_drops_superseded_lines() {
        let (_temp_dir, store) = store();
        let id = store.create_profile(sample_draft()).unwrap();
        for hours in [4.0, 5.0, 6.0] {
            store.append_or_replace_log(id, entry("2024-01-15", hours)).unwrap();
        }
        store.append_or_replace_log(id, entry("2024-01-16", 8.0)).unwrap();

        assert_eq!(store.compact(id).unwrap(), 2);
        assert_eq!(count_lines(&store.journal_path(id)).unwrap(), 2);

        let logs = store.list_recent_logs(id, 5).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].sleep.hours, 6.0);
    }

    #[test]
    fn test_update_profile_rewrites_file() {
        let (_temp_dir, store) = store();
        let id = store.create_profile(sample_draft()).unwrap();
        let mut draft = sample_draft();
        draft.goal = Some("Muscle Gain".into());
        store.update_profile(id, draft).unwrap();

        let profile = store.get_profile(id).unwrap();
        assert_eq!(profile.goal.as_deref(), Some("Muscle Gain"));
        assert_eq!(profile.protein_target(), 130);
    }

    #[test]
    fn test_concurrent_appends_never_interleave() {
        let (_temp_dir, store) = store();
        let store = Arc::new(store);
        let id = store.create_profile(sample_draft()).unwrap();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let date = format!("2024-01-{:02}", 10 + (i % 3));
                    store.append_or_replace_log(id, entry(&date, i as f32)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let journal = std::fs::read_to_string(store.journal_path(id)).unwrap();
        for line in journal.lines() {
            serde_json::from_str::<DailyLog>(line).unwrap();
        }
        assert_eq!(journal.lines().count(), 10);
        assert_eq!(store.list_recent_logs(id, 5).unwrap().len(), 3);
    }
}
