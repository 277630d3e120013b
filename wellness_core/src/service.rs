//! Request surface: profile id + kind in, a serializable response out.

use crate::capability::CapabilityKind;
use crate::config::AnalysisConfig;
use crate::digest::MIN_ENTRIES_FOR_ANALYSIS;
use crate::dispatch::Dispatcher;
use crate::error::ErrorKind;
use crate::store::ProfileStore;
use crate::Result;
use serde::Serialize;
use uuid::Uuid;

/// What the caller of an advisory request gets back
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AdvisoryResponse {
    Success { result_text: String },
    Failure { error: ErrorBody },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl AdvisoryResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, AdvisoryResponse::Success { .. })
    }
}

impl From<Result<String>> for AdvisoryResponse {
    fn from(outcome: Result<String>) -> Self {
        match outcome {
            Ok(result_text) => AdvisoryResponse::Success { result_text },
            Err(e) => AdvisoryResponse::Failure {
                error: ErrorBody {
                    kind: e.kind(),
                    message: e.user_message(),
                },
            },
        }
    }
}

/// Ties a store to a dispatcher
pub struct AdvisoryService<'r, S: ProfileStore> {
    store: S,
    dispatcher: Dispatcher<'r>,
    history_days: usize,
}

impl<'r, S: ProfileStore> AdvisoryService<'r, S> {
    pub fn new(store: S, dispatcher: Dispatcher<'r>, analysis: &AnalysisConfig) -> Self {
        Self {
            store,
            dispatcher: dispatcher.with_digest_days(analysis.digest_days),
            // enough stored days to judge the history requirement
            history_days: analysis.digest_days.max(MIN_ENTRIES_FOR_ANALYSIS),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one advisory request; every failure becomes an error body
    pub fn advise(&self, profile_id: Uuid, kind: &str, note: Option<&str>) -> AdvisoryResponse {
        let outcome = self.try_advise(profile_id, kind, note);
        if let Err(e) = &outcome {
            tracing::info!("Advisory request {} for {} failed: {}", kind, profile_id, e);
        }
        outcome.into()
    }

    /// Like [`advise`](Self::advise) but with the typed error
    pub fn try_advise(&self, profile_id: Uuid, kind: &str, note: Option<&str>) -> Result<String> {
        let kind: CapabilityKind = kind.parse()?;
        let profile = self.store.get_profile(profile_id)?;
        let entries = self.store.list_recent_logs(profile_id, self.history_days)?;
        self.dispatcher.dispatch(kind, &profile, &entries, note)
    }

    /// Instruction text the request would send, without sending it
    pub fn preview(&self, profile_id: Uuid, kind: &str, note: Option<&str>) -> Result<String> {
        let kind: CapabilityKind = kind.parse()?;
        let profile = self.store.get_profile(profile_id)?;
        let entries = self.store.list_recent_logs(profile_id, self.history_days)?;
        self.dispatcher.preview(kind, &profile, &entries, note)
    }
}

impl<S: ProfileStore> std::fmt::Debug for AdvisoryService<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisoryService")
            .field("dispatcher", &self.dispatcher)
            .field("history_days", &self.history_days)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::tests::sample_checkin;
    use crate::generator::{Bindings, GeneratorFault};
    use crate::profile::tests::sample_draft;
    use crate::safety::tests::Recording;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn service(generator: Arc<Recording>) -> (AdvisoryService<'static, MemoryStore>, Uuid) {
        let store = MemoryStore::new();
        let id = store.create_profile(sample_draft()).unwrap();
        let service = AdvisoryService::new(
            store,
            Dispatcher::new(Bindings::uniform(generator)),
            &AnalysisConfig::default(),
        );
        (service, id)
    }

    fn log(service: &AdvisoryService<'static, MemoryStore>, id: Uuid, date: &str, hours: f32) {
        let entry = sample_checkin(date, hours).validate().unwrap();
        service.store().append_or_replace_log(id, entry).unwrap();
    }

    #[test]
    fn test_success_serializes_result_text() {
        let (service, id) = service(Arc::new(Recording::replying("Eat more dal.")));
        let response = service.advise(id, "diet", None);
        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({ "result_text": "Eat more dal." })
        );
    }

    #[test]
    fn test_unknown_kind_serializes_error() {
        let (service, id) = service(Arc::new(Recording::replying("x")));
        let value = serde_json::to_value(service.advise(id, "astrology", None)).unwrap();
        assert_eq!(value["error"]["kind"], "unknown_capability");
    }

    #[test]
    fn test_insufficient_data_message_asks_for_more_logs() {
        let generator = Arc::new(Recording::replying("x"));
        let (service, id) = service(Arc::clone(&generator));
        log(&service, id, "2024-01-15", 5.0);

        let value = serde_json::to_value(service.advise(id, "sleep", None)).unwrap();
        assert_eq!(value["error"]["kind"], "insufficient_data");
        assert!(value["error"]["message"]
            .as_str()
            .unwrap()
            .contains("log more days"));
        assert_eq!(generator.call_count(), 0);
    }

    #[test]
    fn test_generation_failure_is_apology_with_cause() {
        let (service, id) = service(Arc::new(Recording::failing(GeneratorFault::Timeout)));
        let value = serde_json::to_value(service.advise(id, "workout", None)).unwrap();
        assert_eq!(value["error"]["kind"], "generation");
        let message = value["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Sorry"));
        assert!(message.contains("timed out"));
    }

    #[test]
    fn test_unknown_profile_is_not_found() {
        let (service, _id) = service(Arc::new(Recording::replying("x")));
        let value = serde_json::to_value(service.advise(Uuid::new_v4(), "diet", None)).unwrap();
        assert_eq!(value["error"]["kind"], "not_found");
    }

    #[test]
    fn test_digest_limited_to_configured_days() {
        let generator = Arc::new(Recording::replying("ok"));
        let store = MemoryStore::new();
        let id = store.create_profile(sample_draft()).unwrap();
        let service = AdvisoryService::new(
            store,
            Dispatcher::new(Bindings::uniform(generator.clone())),
            &AnalysisConfig { digest_days: 2 },
        );
        for day in 10..15 {
            log(&service, id, &format!("2024-01-{}", day), 6.0);
        }

        assert!(service.advise(id, "health-risk", None).is_success());
        let sent = generator.last.lock().unwrap().clone().unwrap();
        assert!(sent.contains("2024-01-14"));
        assert!(sent.contains("2024-01-13"));
        assert!(!sent.contains("2024-01-12"));
    }

    #[test]
    fn test_one_day_digest_still_sees_stored_history() {
        let generator = Arc::new(Recording::replying("Sleep earlier."));
        let store = MemoryStore::new();
        let id = store.create_profile(sample_draft()).unwrap();
        let service = AdvisoryService::new(
            store,
            Dispatcher::new(Bindings::uniform(generator.clone())),
            &AnalysisConfig { digest_days: 1 },
        );
        for day in 10..20 {
            log(&service, id, &format!("2024-01-{}", day), 6.0);
        }

        assert_eq!(service.try_advise(id, "sleep", None).unwrap(), "Sleep earlier.");
        let sent = generator.last.lock().unwrap().clone().unwrap();
        assert!(sent.contains("2024-01-19"));
        assert!(!sent.contains("2024-01-18"));

        let preview = service.preview(id, "health-risk", None).unwrap();
        assert!(preview.contains("2024-01-19"));
        assert!(!preview.contains("2024-01-18"));
    }

    #[test]
    fn test_one_day_digest_with_single_entry_reports_true_count() {
        let generator = Arc::new(Recording::replying("x"));
        let store = MemoryStore::new();
        let id = store.create_profile(sample_draft()).unwrap();
        let service = AdvisoryService::new(
            store,
            Dispatcher::new(Bindings::uniform(generator.clone())),
            &AnalysisConfig { digest_days: 1 },
        );
        log(&service, id, "2024-01-15", 6.0);

        let err = service.try_advise(id, "sleep", None).unwrap_err();
        assert!(matches!(err, crate::Error::InsufficientData { have: 1, need: 2 }));
        assert_eq!(generator.call_count(), 0);
    }
}
