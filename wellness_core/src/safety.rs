//! Safe execution of a bound generator.
//!
//! Every instruction is prefixed with the same safety rules, the generator is
//! invoked exactly once, and every way it can fail comes back as a
//! [`GenerationError`] value.

use crate::error::GenerationError;
use crate::generator::Generator;
use std::panic::{self, AssertUnwindSafe};

/// Rules prepended to every instruction block
pub const SAFETY_PREAMBLE: &str = "\
SAFETY & RELIABILITY RULES:
- Do NOT invent medical data, vitals or numbers.
- If information is not provided, explicitly say: \"Not provided\".
- NO medical diagnosis. Only lifestyle & preventive guidance.
- Use neutral, safe, supportive tone.
- For health risks, use \"probability/increased risk\" language, not definitive statements.
- Be specific and personalized based on the data provided.
";

/// Full text sent to a generator for `instruction`
pub fn guarded_instruction(instruction: &str) -> String {
    format!("{}\n{}", SAFETY_PREAMBLE, instruction)
}

/// Invoke `generator` once with the guarded instruction.
///
/// Faults, panics and blank output all become `GenerationError`. No retry.
pub fn run(generator: &dyn Generator, instruction: &str) -> Result<String, GenerationError> {
    let prompt = guarded_instruction(instruction);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| generator.invoke(&prompt)));

    match outcome {
        Ok(Ok(text)) if text.trim().is_empty() => {
            tracing::warn!("Generator returned an empty response");
            Err(GenerationError::new("empty response"))
        }
        Ok(Ok(text)) => Ok(text),
        Ok(Err(fault)) => {
            tracing::warn!("Generator failed: {}", fault);
            Err(GenerationError::new(fault.to_string()))
        }
        Err(payload) => {
            let cause = panic_message(payload.as_ref());
            tracing::error!("Generator panicked: {}", cause);
            Err(GenerationError::new(format!("generator panicked: {}", cause)))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::generator::GeneratorFault;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Generator double that records every instruction it sees
    pub(crate) struct Recording {
        pub(crate) calls: AtomicUsize,
        pub(crate) last: Mutex<Option<String>>,
        reply: std::result::Result<String, GeneratorFault>,
    }

    impl Recording {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                reply: Ok(text.to_string()),
            }
        }

        pub(crate) fn failing(fault: GeneratorFault) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                reply: Err(fault),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Generator for Recording {
        fn invoke(&self, instruction: &str) -> std::result::Result<String, GeneratorFault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(instruction.to_string());
            self.reply.clone()
        }
    }

    struct Panicking;

    impl Generator for Panicking {
        fn invoke(&self, _instruction: &str) -> std::result::Result<String, GeneratorFault> {
            panic!("model backend exploded")
        }
    }

    #[test]
    fn test_success_passes_text_through() {
        let generator = Recording::replying("Sleep earlier.");
        assert_eq!(run(&generator, "Analyze sleep").unwrap(), "Sleep earlier.");
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_preamble_prepended() {
        let generator = Recording::replying("ok");
        run(&generator, "Analyze sleep").unwrap();

        let sent = generator.last.lock().unwrap().clone().unwrap();
        assert!(sent.starts_with("SAFETY & RELIABILITY RULES:"));
        assert!(sent.ends_with("Analyze sleep"));
    }

    #[test]
    fn test_fault_becomes_generation_error_without_retry() {
        let generator = Recording::failing(GeneratorFault::Timeout);
        let err = run(&generator, "x").unwrap_err();
        assert!(err.cause.contains("timed out"));
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_blank_output_is_an_error() {
        let generator = Recording::replying("  \n ");
        let err = run(&generator, "x").unwrap_err();
        assert_eq!(err.cause, "empty response");
    }

    #[test]
    fn test_panic_is_contained() {
        let err = run(&Panicking, "x").unwrap_err();
        assert!(err.cause.contains("model backend exploded"));
    }
}
