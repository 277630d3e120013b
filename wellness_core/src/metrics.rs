//! Derived body metrics: BMI with category, and daily protein targets.
//!
//! Everything here is pure. Profiles never store these values; they are
//! recomputed from the current weight/height/goal on every read.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coefficient (g protein per kg body weight) for unrecognised goals
pub const DEFAULT_PROTEIN_COEFFICIENT: f64 = 1.2;

/// BMI classification
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Healthy,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Classify a (rounded) BMI value.
    ///
    /// Healthy covers 18.5 up to and including 24.9; Overweight runs up to
    /// and including 29.9.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi <= 24.9 {
            BmiCategory::Healthy
        } else if bmi <= 29.9 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Healthy => "Healthy",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }

    /// Fixed lifestyle focus points for the category
    pub fn guidance(&self) -> [&'static str; 3] {
        match self {
            BmiCategory::Underweight => [
                "Focus on calorie surplus for healthy weight gain",
                "Include strength training to build muscle",
                "Eat protein-rich foods every 3-4 hours",
            ],
            BmiCategory::Overweight | BmiCategory::Obese => [
                "Create moderate calorie deficit",
                "Combine cardio and strength training",
                "Focus on whole foods and portion control",
            ],
            BmiCategory::Healthy => [
                "Maintain current healthy habits",
                "Focus on specific fitness goals",
                "Ensure balanced nutrition",
            ],
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A computed BMI reading
#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
pub struct Bmi {
    pub value: f64,
    pub category: BmiCategory,
}

/// Compute BMI from weight (kg) and height (cm), rounded to 2 decimal places
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Result<Bmi> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "weight must be greater than 0 kg, got {}",
            weight_kg
        )));
    }
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "height must be greater than 0 cm, got {}",
            height_cm
        )));
    }

    let meters = height_cm / 100.0;
    let raw = weight_kg / (meters * meters);
    let value = (raw * 100.0).round() / 100.0;

    Ok(Bmi {
        value,
        category: BmiCategory::from_bmi(value),
    })
}

/// Recognised fitness goals
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Goal {
    MuscleGain,
    WeightLoss,
    Endurance,
}

impl Goal {
    /// Parse a free-form goal tag. Returns `None` for anything unrecognised.
    ///
    /// Case, surrounding whitespace and `_`/`-` separators are ignored, so
    /// "Muscle Gain", "muscle_gain" and "MUSCLE-GAIN" all match.
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized: String = tag
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        match normalized.as_str() {
            "muscle gain" => Some(Goal::MuscleGain),
            "weight loss" => Some(Goal::WeightLoss),
            "endurance" => Some(Goal::Endurance),
            _ => None,
        }
    }

    pub fn protein_coefficient(&self) -> f64 {
        match self {
            Goal::MuscleGain => 2.0,
            Goal::WeightLoss => 1.6,
            Goal::Endurance => 1.4,
        }
    }
}

/// Daily protein target in whole grams (truncated).
///
/// Unknown goal tags use [`DEFAULT_PROTEIN_COEFFICIENT`] instead of failing.
pub fn compute_protein_target(weight_kg: f64, goal: &str) -> u32 {
    let coefficient = match Goal::parse(goal) {
        Some(g) => g.protein_coefficient(),
        None => {
            tracing::debug!(
                "Unrecognised goal {:?}, using default protein coefficient {}",
                goal,
                DEFAULT_PROTEIN_COEFFICIENT
            );
            DEFAULT_PROTEIN_COEFFICIENT
        }
    };

    let grams = weight_kg * coefficient;
    if grams.is_finite() && grams > 0.0 {
        grams.trunc() as u32
    } else {
        0
    }
}
