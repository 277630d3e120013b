//! Log aggregation: same-date upserts, the recent window, and the
//! reverse-chronological digest handed to advisory generators.

use crate::checkin::{decode_symptom, DailyLog};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Most entries a digest will ever cover
pub const MAX_DIGEST_DAYS: usize = 5;

/// Minimum logged days before any history-based analysis is attempted
pub const MIN_ENTRIES_FOR_ANALYSIS: usize = 2;

/// Placeholder for any value absent from the source data
pub const NOT_PROVIDED: &str = "Not provided";

/// Outcome of [`upsert_entry`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Insert or overwrite the entry for `entry.date`.
///
/// `entries` must be sorted by date ascending and stays that way.
pub fn upsert_entry(entries: &mut Vec<DailyLog>, entry: DailyLog) -> Upsert {
    match entries.binary_search_by(|e| e.date.cmp(&entry.date)) {
        Ok(idx) => {
            tracing::debug!("Replacing check-in for {}", entry.date);
            entries[idx] = entry;
            Upsert::Replaced
        }
        Err(idx) => {
            tracing::debug!("Inserting check-in for {}", entry.date);
            entries.insert(idx, entry);
            Upsert::Inserted
        }
    }
}

/// Up to `n` most recent entries, newest first
pub fn recent_window(entries: &[DailyLog], n: usize) -> Vec<&DailyLog> {
    let mut window: Vec<&DailyLog> = entries.iter().collect();
    window.sort_by(|a, b| b.date.cmp(&a.date));
    window.truncate(n);
    window
}

/// Fail with `InsufficientData` unless at least two days are logged
pub fn require_history(entries: &[DailyLog]) -> Result<()> {
    if entries.len() < MIN_ENTRIES_FOR_ANALYSIS {
        return Err(Error::InsufficientData {
            have: entries.len(),
            need: MIN_ENTRIES_FOR_ANALYSIS,
        });
    }
    Ok(())
}

/// Rough eating pattern for one day, used for mess-food analysis
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub enum EatingPattern {
    LikelyMessFood,
    Junk(String),
    Irregular,
}

impl EatingPattern {
    pub fn of(entry: &DailyLog) -> Self {
        if entry.ate_junk {
            EatingPattern::Junk(
                entry
                    .junk_details
                    .clone()
                    .unwrap_or_else(|| "unspecified".into()),
            )
        } else if entry.meals.eaten_count() >= 2 {
            EatingPattern::LikelyMessFood
        } else {
            EatingPattern::Irregular
        }
    }
}

impl fmt::Display for EatingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EatingPattern::LikelyMessFood => f.write_str("Likely mess food"),
            EatingPattern::Junk(what) => write!(f, "Junk: {}", what),
            EatingPattern::Irregular => f.write_str("Irregular eating"),
        }
    }
}

/// One day reduced for the digest
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DigestLine {
    pub date: NaiveDate,
    pub sleep_hours: f32,
    pub sleep_quality: u8,
    pub bed_time: Option<String>,
    pub meals_eaten: usize,
    pub ate_junk: bool,
    pub junk_details: Option<String>,
    pub ate_fruits: bool,
    pub water_glasses: u32,
    pub energy: u8,
    pub focus: u8,
    pub symptoms: Vec<String>,
    pub eating_pattern: EatingPattern,
}

impl DigestLine {
    fn from_entry(entry: &DailyLog) -> Self {
        DigestLine {
            date: entry.date,
            sleep_hours: entry.sleep.hours,
            sleep_quality: entry.sleep.quality,
            bed_time: entry.sleep.bed_time.clone(),
            meals_eaten: entry.meals.eaten_count(),
            ate_junk: entry.ate_junk,
            junk_details: entry.junk_details.clone(),
            ate_fruits: entry.ate_fruits,
            water_glasses: entry.water_glasses,
            energy: entry.energy,
            focus: entry.focus,
            symptoms: entry.symptoms.iter().map(|s| decode_symptom(s)).collect(),
            eating_pattern: EatingPattern::of(entry),
        }
    }

    fn bed_time(&self) -> &str {
        self.bed_time.as_deref().unwrap_or(NOT_PROVIDED)
    }

    /// Sleep-focused line: hours, bed time, quality, same-day energy
    pub fn sleep_line(&self) -> String {
        format!(
            "{} ({}): {}h sleep, bed at {}, quality {}/5, energy {}/5",
            self.date,
            self.date.format("%A"),
            self.sleep_hours,
            self.bed_time(),
            self.sleep_quality,
            self.energy
        )
    }
}

impl fmt::Display for DigestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): sleep {}h, quality {}/5, bed at {}; meals {}/3 eaten",
            self.date,
            self.date.format("%A"),
            self.sleep_hours,
            self.sleep_quality,
            self.bed_time(),
            self.meals_eaten
        )?;
        if self.ate_junk {
            match &self.junk_details {
                Some(what) => write!(f, ", junk: {}", what)?,
                None => f.write_str(", junk: yes")?,
            }
        }
        if self.ate_fruits {
            f.write_str(", ate fruits")?;
        }
        write!(
            f,
            ", water: {} glasses; energy {}/5, focus {}/5",
            self.water_glasses, self.energy, self.focus
        )?;
        if !self.symptoms.is_empty() {
            write!(f, "; symptoms: {}", self.symptoms.join(", "))?;
        }
        Ok(())
    }
}

/// Ephemeral reverse-chronological summary of recent entries
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Digest {
    pub lines: Vec<DigestLine>,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Render the sleep lines, newest first
    pub fn sleep_summary(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("- {}", l.sleep_line()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render the per-day eating patterns, newest first
    pub fn eating_patterns(&self) -> String {
        self.lines
            .iter()
            .map(|l| format!("- {} ({}): {}", l.date, l.date.format("%A"), l.eating_pattern))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {}", line)?;
        }
        Ok(())
    }
}

/// Reduce entries to a digest of at most [`MAX_DIGEST_DAYS`] lines, newest
/// first regardless of input order.
pub fn summarize<'a, I>(entries: I) -> Digest
where
    I: IntoIterator<Item = &'a DailyLog>,
{
    let mut lines: Vec<DigestLine> = entries.into_iter().map(DigestLine::from_entry).collect();
    lines.sort_by(|a, b| b.date.cmp(&a.date));
    lines.truncate(MAX_DIGEST_DAYS);
    Digest { lines }
}
