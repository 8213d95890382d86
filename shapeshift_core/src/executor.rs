use crate::technique::Technique;
use rand_core::RngCore;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Outcome of a single technique invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// The technique returned normally; the list may be empty.
    Ok(Vec<String>),
    /// The technique returned an error.
    Failed(String),
    /// The technique panicked. Carries the panic message when it was a string.
    Crash(String),
}

impl ExecutionStatus {
    /// Candidates produced by the invocation; failures count as producing nothing.
    pub fn into_candidates(self) -> Vec<String> {
        match self {
            ExecutionStatus::Ok(candidates) => candidates,
            ExecutionStatus::Failed(_) | ExecutionStatus::Crash(_) => Vec::new(),
        }
    }
}

/// Runs techniques in the calling thread, shielding the caller from their failures.
///
/// Techniques may come from outside this crate, so a panic in `transform` is caught and
/// reported as `ExecutionStatus::Crash` rather than unwinding through the engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct InProcessExecutor;

impl InProcessExecutor {
    pub fn new() -> Self {
        InProcessExecutor
    }

    pub fn execute_sync(
        &self,
        technique: &dyn Technique,
        payload: &str,
        rng: &mut dyn RngCore,
    ) -> ExecutionStatus {
        let result = catch_unwind(AssertUnwindSafe(|| technique.transform(payload, rng)));

        match result {
            Ok(Ok(candidates)) => ExecutionStatus::Ok(candidates),
            Ok(Err(error)) => ExecutionStatus::Failed(format!("{error:#}")),
            Err(panic_payload) => {
                let msg = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic type".to_string()
                };
                ExecutionStatus::Crash(msg)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::{FailingTechnique, PanickingTechnique};
    use super::*;
    use crate::techniques::HtmlEntityDecimal;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    #[test]
    fn in_process_executor_returns_candidates() {
        let executor = InProcessExecutor::new();
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let status = executor.execute_sync(&HtmlEntityDecimal, "A", &mut rng);
        assert_eq!(status, ExecutionStatus::Ok(vec!["&#65;".to_string()]));
    }

    #[test]
    fn in_process_executor_reports_errors() {
        let executor = InProcessExecutor::new();
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let status = executor.execute_sync(&FailingTechnique, "A", &mut rng);
        match status {
            ExecutionStatus::Failed(msg) => assert!(msg.contains("intentional failure")),
            _ => panic!("Expected Failed, got {status:?}"),
        }
    }

    #[test]
    fn in_process_executor_catches_panic() {
        let executor = InProcessExecutor::new();
        let mut rng = ChaCha8Rng::from_seed([0u8; 32]);
        let status = executor.execute_sync(&PanickingTechnique, "A", &mut rng);
        match status.clone() {
            ExecutionStatus::Crash(msg) => assert!(msg.contains("Boom!")),
            _ => panic!("Expected a crash, got {status:?}"),
        }
        assert!(status.into_candidates().is_empty());
    }
}
