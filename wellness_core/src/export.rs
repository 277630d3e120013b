//! CSV export of logged check-ins.

use crate::checkin::{decode_symptom, DailyLog};
use crate::Result;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    sleep_hours: f32,
    sleep_quality: u8,
    bed_time: Option<String>,
    meals_eaten: usize,
    ate_junk: bool,
    junk_details: Option<String>,
    ate_fruits: bool,
    water_glasses: u32,
    energy: u8,
    focus: u8,
    symptoms: String,
}

impl From<&DailyLog> for CsvRow {
    fn from(entry: &DailyLog) -> Self {
        CsvRow {
            date: entry.date.to_string(),
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
            symptoms: entry
                .symptoms
                .iter()
                .map(|s| decode_symptom(s))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Write `entries` to a fresh CSV file at `path`, in the order given.
///
/// Returns the number of rows written.
pub fn export_csv<'a, I>(entries: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a DailyLog>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(File::create(path)?);
    let mut rows = 0;
    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
        rows += 1;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} check-ins to {:?}", rows, path);
    Ok(rows)
}
