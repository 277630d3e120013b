//! Request dispatch: kind → descriptor → instruction → bound generator.
//!
//! Dispatch logic:
//! 1. Look up the descriptor and the generator bound to its advisor role
//! 2. Enforce the history requirement (at least two logged days where needed)
//! 3. Refuse mess-food advice for profiles without a mess facility
//! 4. Build the instruction block from the profile, the newest
//!    `digest_days` entries and the note
//! 5. Run the safe wrapper once and return its outcome unchanged

use crate::capability::{
    default_registry, CapabilityDescriptor, CapabilityKind, HistoryRequirement, Registry,
    TemplateInputs,
};
use crate::checkin::DailyLog;
use crate::digest::{recent_window, require_history, summarize, Digest, MAX_DIGEST_DAYS};
use crate::generator::Bindings;
use crate::profile::Profile;
use crate::safety;
use crate::{Error, Result};

/// Routes request kinds to their bound generators
#[derive(Debug)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    bindings: Bindings,
    digest_days: usize,
}

impl Dispatcher<'static> {
    /// Dispatcher over the built-in descriptor table
    pub fn new(bindings: Bindings) -> Self {
        Self::with_registry(default_registry(), bindings)
    }
}

impl<'r> Dispatcher<'r> {
    pub fn with_registry(registry: &'r Registry, bindings: Bindings) -> Self {
        Self {
            registry,
            bindings,
            digest_days: MAX_DIGEST_DAYS,
        }
    }

    /// Limit digests to the newest `days` entries (capped at [`MAX_DIGEST_DAYS`]).
    ///
    /// The history requirement still applies to every entry passed in.
    pub fn with_digest_days(mut self, days: usize) -> Self {
        self.digest_days = days.clamp(1, MAX_DIGEST_DAYS);
        self
    }

    /// Produce advisory text for `kind`.
    ///
    /// `entries` may be in any order; only the most recent days reach the
    /// digest. A generator failure comes back as [`Error::Generation`].
    pub fn dispatch(
        &self,
        kind: CapabilityKind,
        profile: &Profile,
        entries: &[DailyLog],
        note: Option<&str>,
    ) -> Result<String> {
        let descriptor = self.registry.get(kind)?;
        let generator = self.bindings.get(descriptor.advisor).ok_or_else(|| {
            tracing::error!("No generator bound for advisor {}", descriptor.advisor);
            Error::UnknownCapability(kind.name().to_string())
        })?;

        let instruction = build_instruction(descriptor, profile, entries, note, self.digest_days)?;

        tracing::info!(
            "Dispatching {} to {} ({} log entries)",
            kind,
            descriptor.advisor,
            entries.len()
        );
        let text = safety::run(generator, &instruction)?;
        Ok(text)
    }

    /// Exact text a dispatch would send, without invoking anything
    pub fn preview(
        &self,
        kind: CapabilityKind,
        profile: &Profile,
        entries: &[DailyLog],
        note: Option<&str>,
    ) -> Result<String> {
        let descriptor = self.registry.get(kind)?;
        let instruction = build_instruction(descriptor, profile, entries, note, self.digest_days)?;
        Ok(safety::guarded_instruction(&instruction))
    }
}

fn build_instruction(
    descriptor: &CapabilityDescriptor,
    profile: &Profile,
    entries: &[DailyLog],
    note: Option<&str>,
    digest_days: usize,
) -> Result<String> {
    let digest: Option<Digest> = match descriptor.history {
        HistoryRequirement::Required => {
            require_history(entries)?;
            Some(summarize(recent_window(entries, digest_days)))
        }
        HistoryRequirement::Optional if !entries.is_empty() => {
            Some(summarize(recent_window(entries, digest_days)))
        }
        HistoryRequirement::Optional | HistoryRequirement::None => None,
    };

    if descriptor.kind == CapabilityKind::MessFood && profile.has_mess == Some(false) {
        return Err(Error::NotApplicable(
            "mess food analysis needs a profile with a mess facility".into(),
        ));
    }

    let note = note.map(str::trim).filter(|n| !n.is_empty());
    let inputs = TemplateInputs {
        profile,
        digest: digest.as_ref(),
        note,
    };
    Ok(descriptor.build_instruction(&inputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::tests::sample_checkin;
    use crate::generator::{Generator, GeneratorFault};
    use crate::profile::tests::sample_draft;
    use crate::safety::tests::Recording;
    use std::sync::Arc;

    fn profile() -> Profile {
        Profile::create(sample_draft()).unwrap()
    }

    fn entry(date: &str, sleep: f32) -> DailyLog {
        sample_checkin(date, sleep).validate().unwrap()
    }

    fn dispatcher_with(generator: Arc<Recording>) -> Dispatcher<'static> {
        Dispatcher::new(Bindings::uniform(generator))
    }

    #[test]
    fn test_log_dependent_kinds_refuse_short_history() {
        let generator = Arc::new(Recording::replying("advice"));
        let dispatcher = dispatcher_with(Arc::clone(&generator));
        let p = profile();
        let none: Vec<DailyLog> = Vec::new();
        let one = vec![entry("2024-01-15", 6.0)];

        for kind in [
            CapabilityKind::HealthRisk,
            CapabilityKind::Sleep,
            CapabilityKind::NutrientRisk,
            CapabilityKind::MessFood,
        ] {
            for entries in [&none[..], &one[..]] {
                let err = dispatcher.dispatch(kind, &p, entries, None).unwrap_err();
                assert!(
                    matches!(err, Error::InsufficientData { need: 2, .. }),
                    "{} with {} entries: {:?}",
                    kind,
                    entries.len(),
                    err
                );
            }
        }
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn test_profile_only_kinds_work_without_logs() {
        let generator = Arc::new(Recording::replying("plan"));
        let dispatcher = dispatcher_with(Arc::clone(&generator));

        let text = dispatcher
            .dispatch(CapabilityKind::Diet, &profile(), &[], None)
            .unwrap();
        assert_eq!(text, "plan");
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_optional_history_without_logs_renders_placeholder() {
        let generator = Arc::new(Recording::replying("ok"));
        let dispatcher = dispatcher_with(Arc::clone(&generator));

        dispatcher
            .dispatch(CapabilityKind::StudentAdvice, &profile(), &[], None)
            .unwrap();
        let sent = generator.last.lock().unwrap().clone().unwrap();
        assert!(sent.contains("Recent health logs:\nNot provided"));
    }

    #[test]
    fn test_mess_food_without_mess_is_not_applicable() {
        let generator = Arc::new(Recording::replying("ok"));
        let dispatcher = dispatcher_with(Arc::clone(&generator));
        let mut draft = sample_draft();
        draft.has_mess = Some(false);
        let p = Profile::create(draft).unwrap();
        let entries = vec![entry("2024-01-15", 6.0), entry("2024-01-16", 7.0)];

        let err = dispatcher
            .dispatch(CapabilityKind::MessFood, &p, &entries, None)
            .unwrap_err();
        assert!(matches!(err, Error::NotApplicable(_)));
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn test_sleep_end_to_end() {
        crate::logging::init_test();
        let generator = Arc::new(Recording::replying("Try a fixed bedtime."));
        let dispatcher = dispatcher_with(Arc::clone(&generator));
        let p = profile();
        let bmi = p.bmi().unwrap();
        assert_eq!(bmi.value, 22.49);
        assert_eq!(bmi.category.label(), "Healthy");

        let entries = vec![entry("2024-01-15", 5.0), entry("2024-01-16", 4.0)];
        let text = dispatcher
            .dispatch(CapabilityKind::Sleep, &p, &entries, None)
            .unwrap();
        assert_eq!(text, "Try a fixed bedtime.");

        let sent = generator.last.lock().unwrap().clone().unwrap();
        let newer = sent.find("2024-01-16").unwrap();
        let older = sent.find("2024-01-15").unwrap();
        assert!(newer < older);
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_generator_fault_surfaces_as_generation_error() {
        let generator = Arc::new(Recording::failing(GeneratorFault::Transport(
            "connection refused".into(),
        )));
        let dispatcher = dispatcher_with(Arc::clone(&generator));

        let err = dispatcher
            .dispatch(CapabilityKind::Workout, &profile(), &[], None)
            .unwrap_err();
        match err {
            Error::Generation(e) => assert!(e.cause.contains("connection refused")),
            other => panic!("expected generation error, got {:?}", other),
        }
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_unbound_advisor_is_unknown_capability() {
        let dispatcher = Dispatcher::new(Bindings::new());
        let err = dispatcher
            .dispatch(CapabilityKind::Diet, &profile(), &[], None)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCapability(_)));
    }

    #[test]
    fn test_preview_does_not_invoke() {
        let generator = Arc::new(Recording::replying("ok"));
        let dispatcher = dispatcher_with(Arc::clone(&generator));

        let text = dispatcher
            .preview(
                CapabilityKind::MentalWellness,
                &profile(),
                &[],
                Some("  stressed about exams "),
            )
            .unwrap();
        assert!(text.starts_with("SAFETY & RELIABILITY RULES:"));
        assert!(text.contains("stressed about exams"));
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn test_short_digest_window_still_counts_full_history() {
        let generator = Arc::new(Recording::replying("ok"));
        let dispatcher = Dispatcher::new(Bindings::uniform(generator.clone())).with_digest_days(1);
        let entries = vec![entry("2024-01-15", 5.0), entry("2024-01-16", 7.0)];

        dispatcher
            .dispatch(CapabilityKind::Sleep, &profile(), &entries, None)
            .unwrap();
        let sent = generator.last.lock().unwrap().clone().unwrap();
        assert!(sent.contains("2024-01-16"));
        assert!(!sent.contains("2024-01-15"));
    }

    #[test]
    fn test_bindings_are_swappable_per_role() {
        struct Echo;
        impl Generator for Echo {
            fn invoke(&self, instruction: &str) -> std::result::Result<String, GeneratorFault> {
                Ok(format!("{} chars", instruction.len()))
            }
        }

        let mut bindings = Bindings::uniform(Arc::new(Recording::replying("ok")));
        bindings.bind(crate::capability::Advisor::Simulation, Arc::new(Echo));
        let dispatcher = Dispatcher::new(bindings);

        let text = dispatcher
            .dispatch(CapabilityKind::WhatIf, &profile(), &[], None)
            .unwrap();
        assert!(text.ends_with(" chars"));
    }
}
