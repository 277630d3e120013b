//! Instruction templates, one pure function per request kind.
//!
//! Templates only ever render values taken from the profile, its derived
//! metrics, the digest, or the request note. Any absent value renders as
//! [`NOT_PROVIDED`]; nothing is defaulted or invented.

use crate::capability::TemplateInputs;
use crate::digest::NOT_PROVIDED;
use crate::profile::Profile;

/// Line-oriented instruction builder
struct Instruction {
    out: String,
}

impl Instruction {
    fn new(title: &str) -> Self {
        let mut out = String::new();
        out.push_str(title);
        out.push('\n');
        out.push_str(&"=".repeat(title.chars().count()));
        out.push('\n');
        Self { out }
    }

    fn heading(mut self, heading: &str) -> Self {
        self.out.push('\n');
        self.out.push_str(heading);
        self.out.push_str(":\n");
        self
    }

    fn field(mut self, label: &str, value: Option<String>) -> Self {
        let value = value.unwrap_or_else(|| NOT_PROVIDED.to_string());
        self.out.push_str(&format!("{}: {}\n", label, value));
        self
    }

    fn text(mut self, text: &str) -> Self {
        self.out.push_str(text);
        if !text.ends_with('\n') {
            self.out.push('\n');
        }
        self
    }

    fn blank(mut self) -> Self {
        self.out.push('\n');
        self
    }

    fn finish(self) -> String {
        self.out
    }
}

// ============================================================================
// Field renderers
// ============================================================================

fn owned(value: &Option<String>) -> Option<String> {
    value.clone()
}

fn yes_no(value: Option<bool>) -> Option<String> {
    value.map(|b| if b { "Yes".to_string() } else { "No".to_string() })
}

fn bmi(p: &Profile) -> Option<String> {
    p.bmi().ok().map(|b| format!("{} ({})", b.value, b.category))
}

fn budget(p: &Profile) -> Option<String> {
    Some(format!("{} per week", p.weekly_budget))
}

fn protein(p: &Profile) -> Option<String> {
    Some(format!("{} g/day", p.protein_target()))
}

/// Identity, body and derived metrics shared by most templates
fn with_body(b: Instruction, p: &Profile) -> Instruction {
    b.field("Name", owned(&p.name))
        .field("Age", Some(p.age.to_string()))
        .field("Height", Some(format!("{} cm", p.height_cm)))
        .field("Weight", Some(format!("{} kg", p.weight_kg)))
        .field("BMI", bmi(p))
}

/// Student context: year, college, hostel, budget, mess
fn with_student(b: Instruction, p: &Profile) -> Instruction {
    b.field("Academic year", owned(&p.academic_year))
        .field("College", owned(&p.college))
        .field("Hostel", owned(&p.hostel_type))
        .field("Weekly food budget", budget(p))
        .field("Mess facility", yes_no(p.has_mess))
}

/// Fitness context: goal, activity, diet, protein target
fn with_fitness(b: Instruction, p: &Profile) -> Instruction {
    b.field("Goal", owned(&p.goal))
        .field("Activity level", owned(&p.activity_level))
        .field("Diet type", owned(&p.diet_type))
        .field("Protein target", protein(p))
}

fn with_digest(b: Instruction, inputs: &TemplateInputs<'_>) -> Instruction {
    match inputs.digest.filter(|d| !d.is_empty()) {
        Some(d) => b
            .heading(&format!("Recent health logs (last {} days, newest first)", d.len()))
            .text(&d.to_string()),
        None => b.heading("Recent health logs").text(NOT_PROVIDED),
    }
}

fn note(inputs: &TemplateInputs<'_>) -> Option<String> {
    inputs
        .note
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Student capabilities
// ============================================================================

pub fn health_risk(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("COMPREHENSIVE STUDENT HEALTH RISK ANALYSIS").heading("Student profile");
    let b = with_student(with_body(b, p), p);
    with_digest(b, inputs)
        .blank()
        .text("Provide a comprehensive health risk analysis covering:")
        .text("1. Nutrient deficiency risks (protein, iron, B12, vitamin D, calcium, vitamin C): risk level Low/Moderate/High, reasons, symptoms to watch")
        .text("2. Lifestyle risk patterns: sleep, meal regularity, junk food frequency")
        .text("3. Academic performance impact: focus, energy, burnout risk")
        .text("4. Personalized, budget-aware recommendations and when to consider a medical checkup")
        .text("Be specific and practical. Use clear sections and bullet points.")
        .finish()
}

pub fn sleep(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("SLEEP PATTERN ANALYSIS")
        .heading("Student profile")
        .field("Name", owned(&p.name))
        .field("Age", Some(p.age.to_string()))
        .field("Academic year", owned(&p.academic_year))
        .field("Hostel", owned(&p.hostel_type));
    let b = match inputs.digest.filter(|d| !d.is_empty()) {
        Some(d) => b.heading("Recent sleep data (newest first)").text(&d.sleep_summary()),
        None => b.heading("Recent sleep data").text(NOT_PROVIDED),
    };
    b.blank()
        .text("Provide a personalized sleep analysis:")
        .text("1. Current patterns: duration, bedtime consistency, quality, accumulated sleep debt")
        .text("2. Academic impact: focus, memory and energy")
        .text("3. Hostel-specific solutions: noise, roommates, study-sleep balance, power naps")
        .text("4. Action plan: immediate improvements, weekend recovery, exam periods")
        .text("Be practical and specific to college life.")
        .finish()
}

pub fn nutrient_risk(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("NUTRIENT DEFICIENCY RISK ASSESSMENT")
        .heading("Student profile")
        .field("Name", owned(&p.name))
        .field("Age", Some(p.age.to_string()))
        .field("Weekly food budget", budget(p))
        .field("Hostel", owned(&p.hostel_type))
        .field("Mess facility", yes_no(p.has_mess));
    with_digest(b, inputs)
        .blank()
        .text("Assess the risk for each of: protein, iron, vitamin B12, vitamin D, calcium, vitamin C.")
        .text("For each nutrient give:")
        .text("- Risk level (None/Low/Moderate/High)")
        .text("- Reasons: the specific logged behaviours behind the risk")
        .text("- Symptoms to watch for")
        .text("- Immediate, affordable actions within the weekly budget")
        .text("- Budget-friendly, hostel-friendly food sources")
        .text("Focus on risk awareness and food-based improvements.")
        .finish()
}

pub fn mess_food(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("MESS FOOD OPTIMIZATION")
        .heading("Student profile")
        .field("Name", owned(&p.name))
        .field("College", owned(&p.college))
        .field("Weekly food budget", budget(p))
        .field("Misses mess due to timing", yes_no(p.misses_mess_timing));
    let b = match inputs.digest.filter(|d| !d.is_empty()) {
        Some(d) => b
            .heading(&format!("Recent eating patterns (last {} days, newest first)", d.len()))
            .text(&d.eating_patterns()),
        None => b.heading("Recent eating patterns").text(NOT_PROVIDED),
    };
    b.blank()
        .text("Provide specific mess food optimization advice:")
        .text("1. Maximizing mess nutrition: items to prioritize, how to supplement, timing")
        .text("2. Budget supplementation: exact weekly items, hostel storage, when to eat them")
        .text("3. Junk food alternatives and quick room snacks")
        .text("4. Weekend and eating-out strategies")
        .finish()
}

pub fn student_advice(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("PERSONALIZED STUDENT ADVICE").heading("Student profile");
    let b = with_student(with_body(b, p), p);
    with_digest(b, inputs)
        .blank()
        .text("Provide advice tailored to the academic year above in these areas:")
        .text("1. Academic success: study schedule, exam preparation, time management")
        .text("2. Budget healthy eating: weekly shopping list with prices, hostel meal prep")
        .text("3. Hostel room fitness: 15-minute routines, study-break exercises")
        .text("4. Stress management: year-specific stressors, relaxation, social balance")
        .text("5. Health monitoring: warning signs, campus resources, when to seek help")
        .text("Be specific and actionable.")
        .finish()
}

pub fn budget_meal(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("BUDGET MEAL PLAN")
        .heading("Student profile")
        .field("Name", owned(&p.name))
        .field("Weekly food budget", budget(p))
        .field("Hostel", owned(&p.hostel_type))
        .field("Mess facility", yes_no(p.has_mess))
        .field("Diet type", owned(&p.diet_type));
    with_digest(b, inputs)
        .blank()
        .text("Create a weekly meal plan that stays within the weekly budget above:")
        .text("1. Weekly shopping list: item, quantity, approximate price")
        .text("2. Daily schedule Monday-Sunday: breakfast, lunch, dinner, two snacks")
        .text("3. Mess integration, only if a mess facility is available")
        .text("4. Weekend plan and dorm-room cooking ideas with limited facilities")
        .text("5. Cheap study snacks and a water intake plan")
        .finish()
}

pub fn hostel_workout(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("HOSTEL ROOM WORKOUTS")
        .heading("Student profile")
        .field("Name", owned(&p.name))
        .field("Age", Some(p.age.to_string()))
        .field("Academic year", owned(&p.academic_year))
        .field("BMI", bmi(p))
        .field("Goal", owned(&p.goal));
    with_digest(b, inputs)
        .blank()
        .text("Space: small shared hostel room. Equipment: bodyweight only. Time: 15-20 minutes.")
        .text("Include:")
        .text("1. Morning wake-up routine (5 min)")
        .text("2. Study break routine (3 min)")
        .text("3. Evening full-body session (15 min)")
        .text("4. Quiet exercises suitable for a shared room")
        .text("5. Safe use of hostel furniture")
        .text("Give specific exercises and reps at student-safe intensity.")
        .finish()
}

// ============================================================================
// General fitness capabilities
// ============================================================================

pub fn diet(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("CUSTOMIZED DIET PLAN").heading("User profile");
    with_fitness(with_body(b, p), p)
        .blank()
        .text("Create a 7-day meal plan with:")
        .text("- Breakfast, lunch, dinner and two snacks daily, with portion sizes")
        .text("- Macronutrient breakdown aligned with the protein target")
        .text("- Grocery list, meal timing and hydration plan")
        .text("Make it practical and sustainable.")
        .finish()
}

pub fn workout(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("CUSTOMIZED WORKOUT PLAN")
        .heading("User profile")
        .field("Name", owned(&p.name))
        .field("Age", Some(p.age.to_string()))
        .field("Weight", Some(format!("{} kg", p.weight_kg)))
        .field("BMI", bmi(p))
        .field("Goal", owned(&p.goal))
        .field("Activity level", owned(&p.activity_level));
    b.blank()
        .text("Create a 4-week program with:")
        .text("- Weekly schedule with strength, cardio and rest days")
        .text("- Sets, reps and rest periods; warm-up and cool-down")
        .text("- Exercise alternatives and required equipment")
        .text("- Progression plan and safety tips")
        .finish()
}

pub fn mental_wellness(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    Instruction::new("MENTAL WELLNESS SUPPORT")
        .heading("User context")
        .field("Name", owned(&p.name))
        .field("Age", Some(p.age.to_string()))
        .field("Academic year", owned(&p.academic_year))
        .field("Current mood / stress", note(inputs))
        .blank()
        .text("Provide supportive guidance:")
        .text("- Coping strategies and relaxation techniques")
        .text("- Lifestyle adjustments and focus practices")
        .text("- Motivation and consistency tips")
        .text("- When to seek professional help")
        .text("Keep the tone supportive and non-clinical.")
        .finish()
}

pub fn protein_plan(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    Instruction::new("PROTEIN PLANNING")
        .heading("User profile")
        .field("Name", owned(&p.name))
        .field("Weight", Some(format!("{} kg", p.weight_kg)))
        .field("Goal", owned(&p.goal))
        .field("Diet type", owned(&p.diet_type))
        .field("Protein target", protein(p))
        .field("Weekly food budget", budget(p))
        .blank()
        .text("Provide three different daily plans that reach the protein target.")
        .text("Include specific foods and quantities, budget-friendly sources and protein timing.")
        .finish()
}

pub fn what_if(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("WHAT-IF HEALTH SIMULATION").heading("User profile");
    let b = with_fitness(with_body(b, p), p);
    let b = match note(inputs) {
        Some(scenario) => b.field("Scenario", Some(scenario)).blank().text(
            "Simulate realistic outcomes for the scenario: health benefits, timeline for \
             results, potential challenges and how to implement it.",
        ),
        None => b
            .field("Scenario", None)
            .blank()
            .text("Simulate outcomes if the user:")
            .text("1. Improves diet consistency")
            .text("2. Exercises 4-5 days per week")
            .text("3. Sleeps 7-8 hours daily")
            .text("For each scenario describe physical, mental, and energy/productivity changes."),
    };
    b.text("Describe expected changes after 2 weeks, 1 month and 3 months.")
        .text("Use realistic expectations.")
        .finish()
}

pub fn health_summary(inputs: &TemplateInputs<'_>) -> String {
    let p = inputs.profile;
    let b = Instruction::new("HEALTH SUMMARY").heading("User profile");
    let b = with_fitness(with_body(b, p), p);
    let b = match p.bmi() {
        Ok(reading) => reading
            .category
            .guidance()
            .iter()
            .fold(b.heading("Category focus points"), |b, g| b.text(&format!("- {}", g))),
        Err(_) => b.heading("Category focus points").text(NOT_PROVIDED),
    };
    b.blank()
        .text("Provide a holistic health overview:")
        .text("1. BMI and body composition interpretation")
        .text("2. Strengths and current health risks")
        .text("3. Diet and workout improvement focus areas, building on the focus points")
        .text("4. A 30-day action plan")
        .finish()
}
