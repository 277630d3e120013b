//! User profile: static attributes plus computed metrics.

use crate::metrics::{self, Bmi};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Weekly food budget band (currency-agnostic units), ordered low to high
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BudgetBand {
    #[serde(rename = "<200")]
    Under200,
    #[serde(rename = "200-400")]
    From200To400,
    #[serde(rename = "400-600")]
    From400To600,
    #[serde(rename = ">600")]
    Over600,
}

impl BudgetBand {
    pub const ALL: [BudgetBand; 4] = [
        BudgetBand::Under200,
        BudgetBand::From200To400,
        BudgetBand::From400To600,
        BudgetBand::Over600,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BudgetBand::Under200 => "<200",
            BudgetBand::From200To400 => "200-400",
            BudgetBand::From400To600 => "400-600",
            BudgetBand::Over600 => ">600",
        }
    }
}

impl fmt::Display for BudgetBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BudgetBand {
    type Err = Error;

    /// Accepts the band label or its menu number (1-4)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "<200" | "1" => Ok(BudgetBand::Under200),
            "200-400" | "2" => Ok(BudgetBand::From200To400),
            "400-600" | "3" => Ok(BudgetBand::From400To600),
            ">600" | "4" => Ok(BudgetBand::Over600),
            other => Err(Error::InvalidInput(format!(
                "unknown budget band {:?} (expected <200, 200-400, 400-600 or >600)",
                other
            ))),
        }
    }
}

/// Attributes supplied when creating or updating a profile.
///
/// Validated in one pass by [`ProfileDraft::validate`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileDraft {
    #[serde(default)]
    pub name: Option<String>,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub weekly_budget: BudgetBand,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub has_mess: Option<bool>,
    #[serde(default)]
    pub misses_mess_timing: Option<bool>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub hostel_type: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub diet_type: Option<String>,
}

impl ProfileDraft {
    /// Check every numeric field, reporting the first failure
    pub fn validate(&self) -> Result<()> {
        if self.age == 0 {
            return Err(Error::InvalidInput("age must be greater than 0".into()));
        }
        // BMI computation carries the height/weight rules
        metrics::compute_bmi(self.weight_kg, self.height_cm)?;
        Ok(())
    }

    fn normalized(mut self) -> Self {
        for field in [
            &mut self.name,
            &mut self.academic_year,
            &mut self.college,
            &mut self.hostel_type,
            &mut self.goal,
            &mut self.activity_level,
            &mut self.diet_type,
        ] {
            *field = field
                .take()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
        }
        self
    }
}

/// A stored user profile
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub name: Option<String>,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub weekly_budget: BudgetBand,
    pub academic_year: Option<String>,
    pub has_mess: Option<bool>,
    pub misses_mess_timing: Option<bool>,
    pub college: Option<String>,
    pub hostel_type: Option<String>,
    pub goal: Option<String>,
    pub activity_level: Option<String>,
    pub diet_type: Option<String>,
}

impl Profile {
    /// Validate a draft and mint a new profile with a fresh id
    pub fn create(draft: ProfileDraft) -> Result<Self> {
        Self::create_with_id(Uuid::new_v4(), draft)
    }

    pub fn create_with_id(id: Uuid, draft: ProfileDraft) -> Result<Self> {
        draft.validate()?;
        let d = draft.normalized();
        Ok(Profile {
            id,
            created_at: Utc::now(),
            name: d.name,
            age: d.age,
            height_cm: d.height_cm,
            weight_kg: d.weight_kg,
            weekly_budget: d.weekly_budget,
            academic_year: d.academic_year,
            has_mess: d.has_mess,
            misses_mess_timing: d.misses_mess_timing,
            college: d.college,
            hostel_type: d.hostel_type,
            goal: d.goal,
            activity_level: d.activity_level,
            diet_type: d.diet_type,
        })
    }

    /// Replace all attributes from a draft, keeping identity and creation time
    pub fn apply(&mut self, draft: ProfileDraft) -> Result<()> {
        let updated = Self::create_with_id(self.id, draft)?;
        *self = Profile {
            created_at: self.created_at,
            ..updated
        };
        Ok(())
    }

    /// BMI from the current measurements
    pub fn bmi(&self) -> Result<Bmi> {
        metrics::compute_bmi(self.weight_kg, self.height_cm)
    }

    /// Protein target for the stored goal; a missing goal uses the default
    /// coefficient.
    pub fn protein_target(&self) -> u32 {
        metrics::compute_protein_target(self.weight_kg, self.goal.as_deref().unwrap_or(""))
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Not provided")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::metrics::BmiCategory;

    pub(crate) fn sample_draft() -> ProfileDraft {
        ProfileDraft {
            name: Some("Asha".into()),
            age: 20,
            height_cm: 170.0,
            weight_kg: 65.0,
            weekly_budget: BudgetBand::From200To400,
            academic_year: None,
            has_mess: Some(true),
            misses_mess_timing: None,
            college: None,
            hostel_type: Some("College".into()),
            goal: None,
            activity_level: None,
            diet_type: None,
        }
    }

    #[test]
    fn test_create_computes_metrics_on_demand() {
        let mut profile = Profile::create(sample_draft()).unwrap();
        let bmi = profile.bmi().unwrap();
        assert_eq!(bmi.value, 22.49);
        assert_eq!(bmi.category, BmiCategory::Healthy);

        // Changing weight changes the derived value; nothing stale is stored
        profile.weight_kg = 80.0;
        assert_eq!(profile.bmi().unwrap().category, BmiCategory::Overweight);
    }

    #[test]
    fn test_create_rejects_invalid_measurements() {
        let mut draft = sample_draft();
        draft.height_cm = 0.0;
        assert!(matches!(Profile::create(draft), Err(Error::InvalidInput(_))));

        let mut draft = sample_draft();
        draft.age = 0;
        assert!(matches!(Profile::create(draft), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_blank_strings_become_absent() {
        let mut draft = sample_draft();
        draft.academic_year = Some("   ".into());
        draft.goal = Some(" Muscle Gain ".into());
        let profile = Profile::create(draft).unwrap();
        assert_eq!(profile.academic_year, None);
        assert_eq!(profile.goal.as_deref(), Some("Muscle Gain"));
    }

    #[test]
    fn test_protein_target_uses_goal() {
        let mut draft = sample_draft();
        draft.weight_kg = 70.0;
        draft.goal = Some("Muscle Gain".into());
        assert_eq!(Profile::create(draft.clone()).unwrap().protein_target(), 140);

        draft.goal = None;
        assert_eq!(Profile::create(draft).unwrap().protein_target(), 84);
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut profile = Profile::create(sample_draft()).unwrap();
        let id = profile.id;
        let created = profile.created_at;

        let mut draft = sample_draft();
        draft.weight_kg = 72.0;
        profile.apply(draft).unwrap();

        assert_eq!(profile.id, id);
        assert_eq!(profile.created_at, created);
        assert_eq!(profile.weight_kg, 72.0);
    }

    #[test]
    fn test_budget_band_parsing_and_order() {
        assert_eq!("2".parse::<BudgetBand>().unwrap(), BudgetBand::From200To400);
        assert_eq!(">600".parse::<BudgetBand>().unwrap(), BudgetBand::Over600);
        assert!("cheap".parse::<BudgetBand>().is_err());
        assert!(BudgetBand::Under200 < BudgetBand::Over600);
    }

    #[test]
    fn test_budget_band_serializes_as_label() {
        let json = serde_json::to_string(&BudgetBand::From400To600).unwrap();
        assert_eq!(json, "\"400-600\"");
    }
}
