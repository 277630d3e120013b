//! Capability registry: request kinds, advisor roles and their descriptors.
//!
//! The descriptor table is static configuration, built once and never
//! mutated. Generators are bound to advisor roles separately (see
//! [`crate::generator::Bindings`]) so tests can substitute mocks.

use crate::digest::Digest;
use crate::profile::Profile;
use crate::templates;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Request kinds
// ============================================================================

/// Closed set of advisory request kinds
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    HealthRisk,
    Sleep,
    NutrientRisk,
    MessFood,
    StudentAdvice,
    BudgetMeal,
    HostelWorkout,
    Diet,
    Workout,
    MentalWellness,
    ProteinPlan,
    WhatIf,
    HealthSummary,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 13] = [
        CapabilityKind::HealthRisk,
        CapabilityKind::Sleep,
        CapabilityKind::NutrientRisk,
        CapabilityKind::MessFood,
        CapabilityKind::StudentAdvice,
        CapabilityKind::BudgetMeal,
        CapabilityKind::HostelWorkout,
        CapabilityKind::Diet,
        CapabilityKind::Workout,
        CapabilityKind::MentalWellness,
        CapabilityKind::ProteinPlan,
        CapabilityKind::WhatIf,
        CapabilityKind::HealthSummary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CapabilityKind::HealthRisk => "health-risk",
            CapabilityKind::Sleep => "sleep",
            CapabilityKind::NutrientRisk => "nutrient-risk",
            CapabilityKind::MessFood => "mess-food",
            CapabilityKind::StudentAdvice => "student-advice",
            CapabilityKind::BudgetMeal => "budget-meal",
            CapabilityKind::HostelWorkout => "hostel-workout",
            CapabilityKind::Diet => "diet",
            CapabilityKind::Workout => "workout",
            CapabilityKind::MentalWellness => "mental-wellness",
            CapabilityKind::ProteinPlan => "protein-plan",
            CapabilityKind::WhatIf => "what-if",
            CapabilityKind::HealthSummary => "health-summary",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CapabilityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        CapabilityKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| Error::UnknownCapability(s.to_string()))
    }
}

// ============================================================================
// Advisor roles
// ============================================================================

/// Persona a generation capability is bound to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Advisor {
    StudentHealth,
    SleepAnalyzer,
    NutrientRisk,
    MessFood,
    StudentAdvisor,
    BudgetMeal,
    Diet,
    Fitness,
    Mental,
    Simulation,
}

impl Advisor {
    pub const ALL: [Advisor; 10] = [
        Advisor::StudentHealth,
        Advisor::SleepAnalyzer,
        Advisor::NutrientRisk,
        Advisor::MessFood,
        Advisor::StudentAdvisor,
        Advisor::BudgetMeal,
        Advisor::Diet,
        Advisor::Fitness,
        Advisor::Mental,
        Advisor::Simulation,
    ];

    /// System persona handed to the generator
    pub fn persona(&self) -> &'static str {
        match self {
            Advisor::StudentHealth => {
                "college student health risk predictor focusing on hostel lifestyle issues"
            }
            Advisor::SleepAnalyzer => {
                "analyzes sleep patterns and provides personalized sleep advice"
            }
            Advisor::NutrientRisk => {
                "analyzes nutrition risks from student lifestyle data and gives risk assessments"
            }
            Advisor::MessFood => {
                "analyzes hostel mess food patterns and provides improvement suggestions"
            }
            Advisor::StudentAdvisor => {
                "provides personalized advice for college students on budget, stress and lifestyle"
            }
            Advisor::BudgetMeal => "creates budget-friendly meal plans for students",
            Advisor::Diet => "nutrition planner who creates highly personalized diet plans",
            Advisor::Fitness => "fitness expert creating customized, safe workout plans",
            Advisor::Mental => "supportive, non-clinical mental wellness coach",
            Advisor::Simulation => "realistic lifestyle outcome simulation engine",
        }
    }
}

impl fmt::Display for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Advisor::StudentHealth => "student-health",
            Advisor::SleepAnalyzer => "sleep-analyzer",
            Advisor::NutrientRisk => "nutrient-risk",
            Advisor::MessFood => "mess-food",
            Advisor::StudentAdvisor => "student-advisor",
            Advisor::BudgetMeal => "budget-meal",
            Advisor::Diet => "diet",
            Advisor::Fitness => "fitness",
            Advisor::Mental => "mental",
            Advisor::Simulation => "simulation",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// How much log history a capability needs
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRequirement {
    /// Profile only; the digest is never consulted
    None,
    /// Digest included when any entries exist
    Optional,
    /// At least two logged days or the request is refused
    Required,
}

/// Everything an instruction template may read
#[derive(Clone, Copy, Debug)]
pub struct TemplateInputs<'a> {
    pub profile: &'a Profile,
    pub digest: Option<&'a Digest>,
    /// Free-text request note (mood, what-if scenario)
    pub note: Option<&'a str>,
}

/// Pure instruction builder
pub type TemplateFn = fn(&TemplateInputs<'_>) -> String;

/// Immutable registration for one request kind
#[derive(Clone, Copy)]
pub struct CapabilityDescriptor {
    pub kind: CapabilityKind,
    pub title: &'static str,
    pub history: HistoryRequirement,
    pub advisor: Advisor,
    pub template: TemplateFn,
}

impl CapabilityDescriptor {
    pub fn build_instruction(&self, inputs: &TemplateInputs<'_>) -> String {
        (self.template)(inputs)
    }
}

impl fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("history", &self.history)
            .field("advisor", &self.advisor)
            .finish()
    }
}

/// Read-only table of descriptors keyed by request kind
#[derive(Clone, Debug)]
pub struct Registry {
    descriptors: HashMap<CapabilityKind, CapabilityDescriptor>,
}

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(build_default_registry);

/// Process-wide default registry
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

impl Registry {
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = CapabilityDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    pub fn get(&self, kind: CapabilityKind) -> Result<&CapabilityDescriptor> {
        self.descriptors
            .get(&kind)
            .ok_or_else(|| Error::UnknownCapability(kind.name().to_string()))
    }

    /// Descriptors in declaration order of [`CapabilityKind::ALL`]
    pub fn iter(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        CapabilityKind::ALL
            .iter()
            .filter_map(move |k| self.descriptors.get(k))
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn build_default_registry() -> Registry {
    use Advisor as A;
    use CapabilityKind as K;
    use HistoryRequirement as H;

    let d = |kind: CapabilityKind,
             title: &'static str,
             history: HistoryRequirement,
             advisor: Advisor,
             template: TemplateFn| CapabilityDescriptor {
        kind,
        title,
        history,
        advisor,
        template,
    };

    Registry::from_descriptors([
        d(K::HealthRisk, "Comprehensive Health Risk Analysis", H::Required, A::StudentHealth, templates::health_risk),
        d(K::Sleep, "Sleep Pattern Analysis", H::Required, A::SleepAnalyzer, templates::sleep),
        d(K::NutrientRisk, "Nutrient Deficiency Risk Assessment", H::Required, A::NutrientRisk, templates::nutrient_risk),
        d(K::MessFood, "Mess Food Optimization", H::Required, A::MessFood, templates::mess_food),
        d(K::StudentAdvice, "Personalized Student Advice", H::Optional, A::StudentAdvisor, templates::student_advice),
        d(K::BudgetMeal, "Budget Meal Plan", H::Optional, A::BudgetMeal, templates::budget_meal),
        d(K::HostelWorkout, "Hostel Room Workouts", H::Optional, A::Fitness, templates::hostel_workout),
        d(K::Diet, "Customized Diet Plan", H::None, A::Diet, templates::diet),
        d(K::Workout, "Customized Workout Plan", H::None, A::Fitness, templates::workout),
        d(K::MentalWellness, "Mental Wellness Support", H::None, A::Mental, templates::mental_wellness),
        d(K::ProteinPlan, "Protein Planning", H::None, A::Diet, templates::protein_plan),
        d(K::WhatIf, "What-If Simulation", H::None, A::Simulation, templates::what_if),
        d(K::HealthSummary, "Health Summary", H::None, A::Diet, templates::health_summary),
    ])
}
