use crate::config::{ConfigError, EngineSettings};
use crate::executor::{ExecutionStatus, InProcessExecutor};
use crate::feedback::UniqueVariantFeedback;
use crate::record::VariantRecord;
use crate::registry::{RegistryError, TechniqueRegistry};
use crate::scheduler::{RandomScheduler, Scheduler};
use crate::technique::Technique;
use rand_chacha::ChaCha8Rng;
use rand_core::RngCore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How many characters of a payload are quoted in diagnostics.
const PAYLOAD_PREVIEW_CHARS: usize = 40;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("No techniques available")]
    NoTechniques,
}

/// Validated, immutable run parameters of a `VariantEngine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub multiplier: usize,
    pub preserve_original: bool,
    pub retry_factor: usize,
}

impl EngineConfig {
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            multiplier: settings.multiplier as usize,
            preserve_original: settings.preserve_original,
            retry_factor: settings.retry_factor as usize,
        })
    }

    /// Upper bound on technique invocations in the retry phase.
    pub fn max_retries(&self) -> usize {
        self.multiplier * self.retry_factor
    }
}

/// The outcome of processing one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Accepted records in acceptance order.
    pub records: Vec<VariantRecord>,
    /// Number of records that was asked for.
    pub target: usize,
    /// Technique invocations spent in the retry phase.
    pub retries: usize,
}

impl Generation {
    /// `true` when fewer unique variants than requested could be produced.
    pub fn is_partial(&self) -> bool {
        self.records.len() < self.target
    }
}

/// Accumulates unique records for a single payload until the target is reached.
struct VariantCollector<'a> {
    payload: &'a str,
    target: usize,
    feedback: UniqueVariantFeedback,
    records: Vec<VariantRecord>,
}

impl<'a> VariantCollector<'a> {
    fn new(payload: &'a str, target: usize) -> Self {
        Self {
            payload,
            target,
            feedback: UniqueVariantFeedback::new(),
            records: Vec::with_capacity(target),
        }
    }

    fn is_full(&self) -> bool {
        self.records.len() >= self.target
    }

    fn accept_original(&mut self) {
        self.feedback.report_interesting(self.payload);
        self.records.push(VariantRecord::original(self.payload));
    }

    /// Accepts unseen candidates in order, stopping as soon as the target is reached.
    fn offer(&mut self, technique: &dyn Technique, candidates: Vec<String>) {
        for candidate in candidates {
            if self.is_full() {
                return;
            }
            if self.feedback.report_interesting(&candidate) {
                debug!(technique = technique.name(), variant = %candidate, "Accepted variant");
                self.records
                    .push(VariantRecord::from_technique(self.payload, candidate, technique));
            }
        }
    }
}

fn preview(payload: &str) -> String {
    payload.chars().take(PAYLOAD_PREVIEW_CHARS).collect()
}

/// Produces unique variants of payloads from a fixed set of techniques.
///
/// Each payload goes through two phases:
/// 1. One pass over every technique in a freshly shuffled order, so every technique gets a
///    chance to contribute before any is repeated.
/// 2. If the target is still not met, up to `retry_factor * multiplier` invocations of
///    techniques picked uniformly with replacement. Only randomized techniques can make
///    progress here, which is exactly what short payloads need.
///
/// Falling short after both phases is not an error: the records found so far are returned
/// and `Generation::is_partial` reports the shortfall.
///
/// All randomness (shuffle, picks, randomized techniques) is drawn from the engine's own
/// `rng`, so an engine built with a seeded generator is fully reproducible.
pub struct VariantEngine<R: RngCore = ChaCha8Rng> {
    techniques: Vec<Arc<dyn Technique>>,
    config: EngineConfig,
    scheduler: Box<dyn Scheduler>,
    executor: InProcessExecutor,
    rng: R,
}

impl<R: RngCore> VariantEngine<R> {
    /// Builds an engine from the techniques selected in `settings` (all registered ones
    /// when no allow-list is given).
    pub fn new(
        registry: &TechniqueRegistry,
        settings: &EngineSettings,
        rng: R,
    ) -> Result<Self, EngineError> {
        let config = EngineConfig::from_settings(settings)?;
        let techniques = match &settings.techniques {
            Some(names) => registry.resolve(names)?,
            None => registry.all(),
        };
        Self::from_techniques(techniques, config, rng)
    }

    pub fn from_techniques(
        techniques: Vec<Arc<dyn Technique>>,
        config: EngineConfig,
        rng: R,
    ) -> Result<Self, EngineError> {
        if techniques.is_empty() {
            return Err(EngineError::NoTechniques);
        }
        info!(
            "Engine initialized: multiplier={}, techniques={} ({})",
            config.multiplier,
            techniques.len(),
            techniques
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            techniques,
            config,
            scheduler: Box::new(RandomScheduler::new()),
            executor: InProcessExecutor::new(),
            rng,
        })
    }

    /// Replaces the default `RandomScheduler`.
    pub fn with_scheduler(mut self, scheduler: Box<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Runs `technique` on `payload`; failures are logged and yield no candidates.
    fn invoke(&mut self, index: usize, payload: &str) -> Vec<String> {
        let technique = self.techniques[index].as_ref();
        let status = self.executor.execute_sync(technique, payload, &mut self.rng);
        match &status {
            ExecutionStatus::Ok(_) => {}
            ExecutionStatus::Failed(error) => warn!(
                "Technique {} failed on payload {:?}: {}",
                technique.name(),
                preview(payload),
                error
            ),
            ExecutionStatus::Crash(msg) => warn!(
                "Technique {} panicked on payload {:?}: {}",
                technique.name(),
                preview(payload),
                msg
            ),
        }
        status.into_candidates()
    }

    /// Generates up to `multiplier` unique variants of `payload`.
    pub fn process(&mut self, payload: &str) -> Generation {
        let mut collector = VariantCollector::new(payload, self.config.multiplier);

        if self.config.preserve_original {
            collector.accept_original();
        }

        let order = self
            .scheduler
            .full_pass(self.techniques.len(), &mut self.rng);
        for index in order {
            if collector.is_full() {
                break;
            }
            let candidates = self.invoke(index, payload);
            collector.offer(self.techniques[index].as_ref(), candidates);
        }

        let max_retries = self.config.max_retries();
        let mut retries = 0;
        while !collector.is_full() && retries < max_retries {
            let index = match self.scheduler.next(self.techniques.len(), &mut self.rng) {
                Ok(index) => index,
                Err(_) => break,
            };
            retries += 1;
            let candidates = self.invoke(index, payload);
            collector.offer(self.techniques[index].as_ref(), candidates);
        }

        let generation = Generation {
            records: collector.records,
            target: collector.target,
            retries,
        };
        if generation.is_partial() {
            warn!(
                "Could only generate {}/{} unique variants for payload: {:?}",
                generation.records.len(),
                generation.target,
                preview(payload)
            );
        }
        generation
    }

    /// Lazily processes `payloads` in order, yielding every record of one payload before
    /// pulling the next payload.
    pub fn process_stream<'a, I>(
        &'a mut self,
        payloads: I,
    ) -> impl Iterator<Item = VariantRecord> + 'a
    where
        I: IntoIterator<Item = String>,
        I::IntoIter: 'a,
    {
        payloads
            .into_iter()
            .flat_map(move |payload| self.process(&payload).records)
    }
}
