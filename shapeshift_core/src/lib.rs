pub mod config;
pub mod engine;
pub mod executor;
pub mod feedback;
pub mod input;
pub mod output;
pub mod record;
pub mod registry;
pub mod scheduler;
pub mod technique;
pub mod techniques;

pub use config::{ConfigError, EngineSettings, OutputSettings, ShapeshiftConfig};
pub use engine::{EngineConfig, EngineError, Generation, VariantEngine};
pub use executor::{ExecutionStatus, InProcessExecutor};
pub use feedback::UniqueVariantFeedback;
pub use input::{InputError, PayloadReader, read_payloads};
pub use output::{OutputError, OutputFormat, open_sink, write_json, write_records, write_text};
pub use record::{VariantRecord, VariantSource};
pub use registry::{RegistryError, TechniqueRegistry};
pub use scheduler::{RandomScheduler, Scheduler, SchedulerError};
pub use technique::{Category, Technique};
