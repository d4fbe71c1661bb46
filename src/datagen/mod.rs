//! Training data generation: work-list construction, bounded-concurrency
//! generation, and postprocessing into a persisted dataset.

mod generate;
mod postprocess;
mod prompts;
mod scenarios;

pub use generate::{build_pairs, Generator};
pub use postprocess::{fingerprint, postprocess_and_save, validate_conversation, PostprocessStats};
pub use prompts::{render_generation_prompt, render_system_prompt};
pub use scenarios::{relevant_scenarios, ScenarioCategory, SCENARIO_CATEGORIES};
