//! Daily check-in types.
//!
//! A [`CheckIn`] is the raw structured input for one day (date still a
//! string). [`CheckIn::validate`] turns it into a [`DailyLog`] in one pass or
//! rejects it before anything is stored.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Accepted check-in date formats, tried in order
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a check-in date (`YYYY-MM-DD` or `DD/MM/YYYY`)
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| Error::InvalidDate(raw.to_string()))
}

// ============================================================================
// Sleep
// ============================================================================

/// One night of sleep
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SleepRecord {
    pub hours: f32,
    /// 1 (worst) to 5 (best)
    pub quality: u8,
    /// Free-form approximate bed time, e.g. "11pm"
    pub bed_time: Option<String>,
}

// ============================================================================
// Meals
// ============================================================================

/// State of a single meal slot
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "description", rename_all = "snake_case")]
pub enum MealSlot {
    Eaten(String),
    Skipped,
    #[default]
    NotReported,
}

impl MealSlot {
    pub fn is_eaten(&self) -> bool {
        matches!(self, MealSlot::Eaten(_))
    }

    /// Parse CLI-style meal input: "skipped"/"skip", "no"/"none"/"" for not
    /// reported, anything else is a description of what was eaten.
    pub fn from_input(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "skipped" | "skip" => MealSlot::Skipped,
            "" | "no" | "none" | "-" => MealSlot::NotReported,
            _ => MealSlot::Eaten(raw.trim().to_string()),
        }
    }
}

/// Breakfast, lunch and dinner
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meals {
    pub breakfast: MealSlot,
    pub lunch: MealSlot,
    pub dinner: MealSlot,
}

impl Meals {
    pub fn eaten_count(&self) -> usize {
        [&self.breakfast, &self.lunch, &self.dinner]
            .iter()
            .filter(|m| m.is_eaten())
            .count()
    }
}

// ============================================================================
// Symptoms
// ============================================================================

/// Fixed symptom vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symptom {
    Fatigue,
    Headache,
    Digestive,
    PoorFocus,
    MoodSwings,
}

impl Symptom {
    pub const ALL: [Symptom; 5] = [
        Symptom::Fatigue,
        Symptom::Headache,
        Symptom::Digestive,
        Symptom::PoorFocus,
        Symptom::MoodSwings,
    ];

    /// Canonical stored code
    pub fn code(&self) -> &'static str {
        match self {
            Symptom::Fatigue => "fatigue",
            Symptom::Headache => "headache",
            Symptom::Digestive => "digestive",
            Symptom::PoorFocus => "poor-focus",
            Symptom::MoodSwings => "mood-swings",
        }
    }

    /// Human-readable name used in digests
    pub fn label(&self) -> &'static str {
        match self {
            Symptom::Fatigue => "Fatigue",
            Symptom::Headache => "Headache",
            Symptom::Digestive => "Digestive",
            Symptom::PoorFocus => "Poor focus",
            Symptom::MoodSwings => "Mood swings",
        }
    }

    /// Look up a symptom by canonical code or legacy menu number ("1"-"5")
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_lowercase().replace('_', "-");
        match code.as_str() {
            "1" | "fatigue" => Some(Symptom::Fatigue),
            "2" | "headache" => Some(Symptom::Headache),
            "3" | "digestive" => Some(Symptom::Digestive),
            "4" | "poor-focus" => Some(Symptom::PoorFocus),
            "5" | "mood-swings" => Some(Symptom::MoodSwings),
            _ => None,
        }
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decode a stored symptom code. Unknown codes pass through verbatim.
pub fn decode_symptom(code: &str) -> String {
    match Symptom::from_code(code) {
        Some(s) => s.label().to_string(),
        None => code.to_string(),
    }
}

// ============================================================================
// Daily log
// ============================================================================

/// One validated day of observations. Unique per (profile, date).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyLog {
    pub date: NaiveDate,
    pub sleep: SleepRecord,
    pub meals: Meals,
    pub ate_junk: bool,
    pub junk_details: Option<String>,
    pub ate_fruits: bool,
    pub water_glasses: u32,
    /// 1 (low) to 5 (high)
    pub energy: u8,
    /// 1 (poor) to 5 (good)
    pub focus: u8,
    /// Canonical codes for known symptoms, verbatim text otherwise
    pub symptoms: BTreeSet<String>,
}

/// Unvalidated check-in input
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckIn {
    pub date: String,
    pub sleep_hours: f32,
    pub sleep_quality: u8,
    #[serde(default)]
    pub bed_time: Option<String>,
    #[serde(default)]
    pub breakfast: MealSlot,
    #[serde(default)]
    pub lunch: MealSlot,
    #[serde(default)]
    pub dinner: MealSlot,
    #[serde(default)]
    pub ate_junk: bool,
    #[serde(default)]
    pub junk_details: Option<String>,
    #[serde(default)]
    pub ate_fruits: bool,
    pub water_glasses: u32,
    pub energy: u8,
    pub focus: u8,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

fn check_scale(name: &str, value: u8) -> Result<()> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} must be between 1 and 5, got {}",
            name, value
        )))
    }
}

impl CheckIn {
    /// Validate every field and produce a [`DailyLog`]
    pub fn validate(self) -> Result<DailyLog> {
        let date = parse_date(&self.date)?;

        if !self.sleep_hours.is_finite() || !(0.0..=24.0).contains(&self.sleep_hours) {
            return Err(Error::InvalidInput(format!(
                "sleep hours must be between 0 and 24, got {}",
                self.sleep_hours
            )));
        }
        check_scale("sleep quality", self.sleep_quality)?;
        check_scale("energy", self.energy)?;
        check_scale("focus", self.focus)?;

        let symptoms = self
            .symptoms
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none") && *s != "6")
            .map(|s| match Symptom::from_code(s) {
                Some(known) => known.code().to_string(),
                None => s.to_string(),
            })
            .collect();

        let non_blank = |s: Option<String>| {
            s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        Ok(DailyLog {
            date,
            sleep: SleepRecord {
                hours: self.sleep_hours,
                quality: self.sleep_quality,
                bed_time: non_blank(self.bed_time),
            },
            meals: Meals {
                breakfast: self.breakfast,
                lunch: self.lunch,
                dinner: self.dinner,
            },
            ate_junk: self.ate_junk,
            junk_details: if self.ate_junk {
                non_blank(self.junk_details)
            } else {
                None
            },
            ate_fruits: self.ate_fruits,
            water_glasses: self.water_glasses,
            energy: self.energy,
            focus: self.focus,
            symptoms,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_checkin(date: &str, sleep_hours: f32) -> CheckIn {
        CheckIn {
            date: date.into(),
            sleep_hours,
            sleep_quality: 3,
            bed_time: Some("1am".into()),
            breakfast: MealSlot::Skipped,
            lunch: MealSlot::Eaten("Rice and dal".into()),
            dinner: MealSlot::Eaten("Roti, sabzi".into()),
            ate_junk: false,
            junk_details: None,
            ate_fruits: true,
            water_glasses: 6,
            energy: 3,
            focus: 3,
            symptoms: vec![],
        }
    }

    #[test]
    fn test_parse_both_date_formats() {
        let iso = parse_date("2024-01-15").unwrap();
        let dmy = parse_date("15/01/2024").unwrap();
        assert_eq!(iso, dmy);
    }

    #[test]
    fn test_impossible_date_is_rejected() {
        assert!(matches!(parse_date("2024-02-30"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_date("yesterday"), Err(Error::InvalidDate(_))));
        assert!(matches!(
            sample_checkin("31/04/2024", 7.0).validate(),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn test_validate_ranges() {
        let mut c = sample_checkin("2024-01-15", 7.0);
        c.energy = 6;
        assert!(matches!(c.validate(), Err(Error::InvalidInput(_))));

        let mut c = sample_checkin("2024-01-15", 7.0);
        c.sleep_quality = 0;
        assert!(matches!(c.validate(), Err(Error::InvalidInput(_))));

        assert!(matches!(
            sample_checkin("2024-01-15", -1.0).validate(),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            sample_checkin("2024-01-15", 25.0).validate(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_symptoms_normalized_to_codes() {
        let mut c = sample_checkin("2024-01-15", 7.0);
        c.symptoms = vec!["1".into(), "Headache".into(), "poor_focus".into(), "itchy eyes".into()];
        let log = c.validate().unwrap();
        let codes: Vec<_> = log.symptoms.iter().map(String::as_str).collect();
        assert_eq!(codes, vec!["fatigue", "headache", "itchy eyes", "poor-focus"]);
    }

    #[test]
    fn test_none_symptom_means_empty_set() {
        let mut c = sample_checkin("2024-01-15", 7.0);
        c.symptoms = vec!["6".into()];
        assert!(c.validate().unwrap().symptoms.is_empty());
    }

    #[test]
    fn test_none_symptom_ignores_case() {
        let mut c = sample_checkin("2024-01-15", 7.0);
        c.symptoms = vec!["None".into(), " NONE ".into(), "none".into()];
        assert!(c.validate().unwrap().symptoms.is_empty());
    }

    #[test]
    fn test_decode_symptom_passes_unknown_through() {
        assert_eq!(decode_symptom("mood-swings"), "Mood swings");
        assert_eq!(decode_symptom("4"), "Poor focus");
        assert_eq!(decode_symptom("itchy eyes"), "itchy eyes");
    }

    #[test]
    fn test_meal_slot_input() {
        assert_eq!(MealSlot::from_input("skipped"), MealSlot::Skipped);
        assert_eq!(MealSlot::from_input(""), MealSlot::NotReported);
        assert_eq!(
            MealSlot::from_input("Poha"),
            MealSlot::Eaten("Poha".into())
        );
    }

    #[test]
    fn test_junk_details_dropped_without_junk() {
        let mut c = sample_checkin("2024-01-15", 7.0);
        c.junk_details = Some("chips".into());
        assert_eq!(c.validate().unwrap().junk_details, None);
    }

    #[test]
    fn test_meals_eaten_count() {
        let log = sample_checkin("2024-01-15", 7.0).validate().unwrap();
        assert_eq!(log.meals.eaten_count(), 2);
    }
}
