//! Generation orchestrator.
//!
//! Builds the principle-scenario work list, fans attempts out against the
//! generation backend under one shared concurrency gate, and drains the
//! pool exhaustively: a failed attempt is logged and dropped without
//! touching sibling attempts or items.

use crate::client::{ChatBackend, Message};
use crate::datagen::prompts::{render_generation_prompt, render_system_prompt};
use crate::datagen::scenarios::{relevant_scenarios, ScenarioCategory};
use crate::models::{
    Constitution, Conversation, DatagenConfig, PreceptError, Principle, PrincipleCategory,
};
use indicatif::{ProgressBar, ProgressStyle};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Outcome classification for one generation attempt.
///
/// The retry loop is a state machine over these, not exception-driven
/// control flow: structural failures retry immediately, transport
/// failures retry after backoff, fatal failures drop the attempt.
enum AttemptError {
    /// Malformed response payload
    Structural(String),
    /// Transient service or network fault
    Transport(PreceptError),
    /// Not worth retrying
    Fatal(PreceptError),
}

impl From<PreceptError> for AttemptError {
    fn from(err: PreceptError) -> Self {
        match err {
            PreceptError::Parse(msg) => Self::Structural(msg),
            e if e.is_retryable() => Self::Transport(e),
            e => Self::Fatal(e),
        }
    }
}

/// Cross sampled principles with their relevant scenario categories.
///
/// Categories holding more than `max_per_category` principles are sampled
/// uniformly without replacement rather than truncated, to avoid
/// section-order bias. A principle whose category matches no scenario
/// contributes zero pairs.
pub fn build_pairs(
    constitution: &Constitution,
    max_per_category: usize,
) -> Vec<(Principle, &'static ScenarioCategory)> {
    // Group by category in first-seen order.
    let mut grouped: Vec<(PrincipleCategory, Vec<&Principle>)> = Vec::new();
    for principle in constitution.iter() {
        match grouped.iter_mut().find(|(c, _)| *c == principle.category) {
            Some((_, bucket)) => bucket.push(principle),
            None => grouped.push((principle.category, vec![principle])),
        }
    }

    let mut rng = rand::thread_rng();
    let mut sampled: Vec<&Principle> = Vec::new();
    for (_, principles) in &grouped {
        if principles.len() > max_per_category {
            sampled.extend(principles.choose_multiple(&mut rng, max_per_category).copied());
        } else {
            sampled.extend(principles.iter().copied());
        }
    }

    let mut pairs = Vec::new();
    for principle in sampled {
        for scenario in relevant_scenarios(principle.category) {
            pairs.push((principle.clone(), scenario));
        }
    }
    pairs
}

/// Strip optional surrounding code-fence markup from a response.
///
/// Returns `None` for a fence with no body, which is a malformed payload.
fn strip_code_fence(raw: &str) -> Option<&str> {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return Some(text);
    };
    // The opening fence line may carry a language tag; drop the whole line.
    let (_, body) = rest.split_once('\n')?;
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    Some(body.trim())
}

/// Parse a raw response into a conversation candidate.
fn parse_candidate(raw: &str) -> Result<Conversation, AttemptError> {
    let text = strip_code_fence(raw)
        .ok_or_else(|| AttemptError::Structural("code fence with no body".to_string()))?;
    serde_json::from_str(text)
        .map_err(|e| AttemptError::Structural(format!("invalid conversation payload: {e}")))
}

/// Generation orchestrator over a shared backend.
pub struct Generator {
    backend: Arc<dyn ChatBackend>,
    config: DatagenConfig,
}

impl Generator {
    pub fn new(backend: Arc<dyn ChatBackend>, config: DatagenConfig) -> Self {
        Self { backend, config }
    }

    /// Generate conversation candidates for every work item.
    ///
    /// Candidates are returned in completion order across the whole
    /// concurrent pool; callers must not assume any relationship to
    /// work-item order.
    pub async fn generate(&self, constitution: &Constitution) -> Vec<Conversation> {
        let pairs = build_pairs(constitution, self.config.max_principles_per_category);
        let expected = pairs.len() * self.config.examples_per_principle;

        info!(
            pairs = pairs.len(),
            examples_per_principle = self.config.examples_per_principle,
            max_concurrency = self.config.max_concurrency,
            "Generating training data"
        );

        // One gate per run: all attempts across all items share it.
        let gate = Arc::new(Semaphore::new(self.config.max_concurrency));
        let system_prompt = render_system_prompt(&constitution.target_model_name);

        let pb = ProgressBar::new(pairs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
                .expect("progress template")
                .progress_chars("##-"),
        );

        let mut tasks: JoinSet<Vec<Conversation>> = JoinSet::new();
        for (principle, scenario) in pairs {
            let backend = Arc::clone(&self.backend);
            let gate = Arc::clone(&gate);
            let model = self.config.model.clone();
            let system = system_prompt.clone();
            let user = render_generation_prompt(&principle, scenario);
            let examples = self.config.examples_per_principle;
            let max_retries = self.config.max_retries;
            let max_tokens = self.config.max_tokens;
            let scenario_name = scenario.name;
            let principle_index = principle.index;

            tasks.spawn(async move {
                let mut results = Vec::new();
                for _ in 0..examples {
                    let outcome = generate_one(
                        backend.as_ref(),
                        &gate,
                        &model,
                        &system,
                        &user,
                        max_tokens,
                        max_retries,
                        scenario_name,
                        principle_index,
                    )
                    .await;
                    if let Some(conversation) = outcome {
                        results.push(conversation);
                    }
                }
                results
            });
        }

        let mut collected = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(batch) => collected.extend(batch),
                Err(e) => warn!(error = %e, "Work item task panicked"),
            }
            pb.inc(1);
            pb.set_message(format!("collected: {}", collected.len()));
        }
        pb.finish_with_message(format!("collected: {}", collected.len()));

        info!(
            generated = collected.len(),
            dropped = expected - collected.len(),
            "Generation complete"
        );

        collected
    }
}

/// Run one generation attempt to completion through the retry state
/// machine: Attempting(n) -> candidate | Attempting(n+1) | dropped.
///
/// The gate permit is held only across the network call; backoff sleeps
/// and payload parsing never occupy a slot.
#[allow(clippy::too_many_arguments)]
async fn generate_one(
    backend: &dyn ChatBackend,
    gate: &Semaphore,
    model: &str,
    system: &str,
    user: &str,
    max_tokens: u32,
    max_retries: u32,
    scenario_name: &str,
    principle_index: usize,
) -> Option<Conversation> {
    let mut attempt: u32 = 0;
    loop {
        let result = attempt_once(backend, gate, model, system, user, max_tokens).await;

        let err = match result {
            Ok(conversation) => return Some(conversation),
            Err(err) => err,
        };

        attempt += 1;
        let exhausted = attempt >= max_retries;
        match err {
            AttemptError::Fatal(e) => {
                warn!(
                    scenario = scenario_name,
                    principle = principle_index,
                    error = %e,
                    "Dropping attempt"
                );
                return None;
            }
            AttemptError::Structural(msg) => {
                if exhausted {
                    warn!(
                        scenario = scenario_name,
                        principle = principle_index,
                        error = %msg,
                        "Failed to parse response, dropping attempt"
                    );
                    return None;
                }
                // Malformed payload: retry immediately, no backoff.
            }
            AttemptError::Transport(e) => {
                if exhausted {
                    warn!(
                        scenario = scenario_name,
                        principle = principle_index,
                        error = %e,
                        "Retries exhausted, dropping attempt"
                    );
                    return None;
                }
                let backoff = e
                    .retry_after()
                    .map(Duration::from_secs_f64)
                    .unwrap_or_else(|| Duration::from_secs(2u64.pow(attempt - 1)));
                debug!(
                    scenario = scenario_name,
                    principle = principle_index,
                    attempt = attempt,
                    backoff_secs = backoff.as_secs_f64(),
                    "Retrying after transport error"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

/// Issue a single request under the gate and parse the payload.
async fn attempt_once(
    backend: &dyn ChatBackend,
    gate: &Semaphore,
    model: &str,
    system: &str,
    user: &str,
    max_tokens: u32,
) -> Result<Conversation, AttemptError> {
    let permit = gate.acquire().await.map_err(|_| {
        AttemptError::Fatal(PreceptError::Internal("concurrency gate closed".to_string()))
    })?;

    let response = backend
        .complete(
            model,
            vec![Message::system(system), Message::user(user)],
            max_tokens,
        )
        .await;

    drop(permit);

    let response = response.map_err(AttemptError::from)?;
    parse_candidate(&response.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CompletionResponse;
    use crate::models::Result;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    const VALID_CONVERSATION: &str = r#"{"messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]}"#;

    /// Backend that replays a script of responses, tracking concurrency.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<String>>>,
        latency: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String>>, latency: Duration) -> Self {
            Self {
                script: Mutex::new(script.into()),
                latency,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        /// Always succeeds with a valid conversation.
        fn always_valid(latency: Duration) -> Self {
            Self::new(Vec::new(), latency)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn complete(
            &self,
            model: &str,
            _messages: Vec<Message>,
            _max_tokens: u32,
        ) -> Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let next = self.script.lock().unwrap().pop_front();
            let content = match next {
                Some(Ok(content)) => content,
                Some(Err(e)) => return Err(e),
                None => VALID_CONVERSATION.to_string(),
            };
            Ok(CompletionResponse {
                content,
                model: model.to_string(),
                input_tokens: 0,
                output_tokens: 0,
                duration: self.latency,
            })
        }
    }

    fn test_constitution(n: usize, category: PrincipleCategory) -> Constitution {
        let mut constitution = Constitution::new("", "Qwen");
        for i in 0..n {
            constitution.principles.push(Principle {
                text: format!("principle {i}"),
                category,
                section: "Test".to_string(),
                index: i,
            });
        }
        constitution
    }

    fn test_config(max_concurrency: usize, max_retries: u32) -> DatagenConfig {
        DatagenConfig {
            model: "test/model".to_string(),
            examples_per_principle: 1,
            max_principles_per_category: 30,
            max_concurrency,
            max_retries,
            ..DatagenConfig::default()
        }
    }

    #[test]
    fn pairs_cross_principles_with_matching_scenarios() {
        // identity matches exactly one scenario
        let constitution = test_constitution(3, PrincipleCategory::Identity);
        let pairs = build_pairs(&constitution, 30);
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|(_, sc)| sc.name == "identity_nature"));

        // safety matches four
        let constitution = test_constitution(2, PrincipleCategory::Safety);
        let pairs = build_pairs(&constitution, 30);
        assert_eq!(pairs.len(), 8);
    }

    #[test]
    fn oversized_categories_are_sampled_without_replacement() {
        let constitution = test_constitution(10, PrincipleCategory::Identity);
        let pairs = build_pairs(&constitution, 4);
        assert_eq!(pairs.len(), 4);

        let mut indices: Vec<usize> = pairs.iter().map(|(p, _)| p.index).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 4, "sampling must not repeat principles");
    }

    #[test]
    fn small_categories_are_taken_whole() {
        let constitution = test_constitution(3, PrincipleCategory::Identity);
        let pairs = build_pairs(&constitution, 3);
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn fence_stripping() {
        assert_eq!(strip_code_fence("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        // unterminated fence body is still usable
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), Some("{\"a\":1}"));
        // fence with no body is malformed
        assert_eq!(strip_code_fence("```json"), None);
    }

    #[test]
    fn candidate_parsing_requires_messages_list() {
        assert!(parse_candidate(VALID_CONVERSATION).is_ok());
        assert!(parse_candidate("not json at all").is_err());
        assert!(parse_candidate("{\"foo\": 1}").is_err());
        assert!(parse_candidate("{\"messages\": \"not a list\"}").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn gate_of_one_serializes_all_calls() {
        let latency = Duration::from_millis(50);
        let backend = Arc::new(ScriptedBackend::always_valid(latency));
        let generator = Generator::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, test_config(1, 3));
        let constitution = test_constitution(3, PrincipleCategory::Identity);

        let start = Instant::now();
        let conversations = generator.generate(&constitution).await;

        assert_eq!(conversations.len(), 3);
        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
        // No overlap: total time is the sum of individual latencies.
        assert!(start.elapsed() >= latency * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn wide_gate_overlaps_calls() {
        let latency = Duration::from_millis(50);
        let backend = Arc::new(ScriptedBackend::always_valid(latency));
        let generator = Generator::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, test_config(8, 3));
        let constitution = test_constitution(3, PrincipleCategory::Identity);

        let start = Instant::now();
        let conversations = generator.generate(&constitution).await;

        assert_eq!(conversations.len(), 3);
        assert!(backend.max_in_flight.load(Ordering::SeqCst) > 1);
        assert!(start.elapsed() < latency * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_retry_with_backoff_then_succeed() {
        let backend = Arc::new(ScriptedBackend::new(
            vec![
                Err(PreceptError::Api {
                    status: 500,
                    message: "server error".to_string(),
                }),
                Err(PreceptError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                }),
                Ok(VALID_CONVERSATION.to_string()),
            ],
            Duration::ZERO,
        ));
        let generator = Generator::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, test_config(2, 3));
        let constitution = test_constitution(1, PrincipleCategory::Identity);

        let start = Instant::now();
        let conversations = generator.generate(&constitution).await;

        assert_eq!(conversations.len(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
        // Backoff doubles from a one-second base: 1s + 2s.
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn structural_failures_retry_without_backoff() {
        let backend = Arc::new(ScriptedBackend::new(
            vec![Ok("not json".to_string()), Ok("{\"nope\": true}".to_string())],
            Duration::ZERO,
        ));
        let generator = Generator::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, test_config(2, 2));
        let constitution = test_constitution(1, PrincipleCategory::Identity);

        let start = Instant::now();
        let conversations = generator.generate(&constitution).await;

        assert!(conversations.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        // A transport backoff would have advanced the clock by >= 1s.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_drop_without_retry() {
        let backend = Arc::new(ScriptedBackend::new(
            vec![Err(PreceptError::AuthenticationFailed)],
            Duration::ZERO,
        ));
        let generator = Generator::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, test_config(2, 3));
        let constitution = test_constitution(1, PrincipleCategory::Identity);

        let conversations = generator.generate(&constitution).await;

        assert!(conversations.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failing_item_never_aborts_siblings() {
        // First call fails permanently; the rest succeed.
        let backend = Arc::new(ScriptedBackend::new(
            vec![Err(PreceptError::ModelNotFound("test/model".to_string()))],
            Duration::ZERO,
        ));
        let generator = Generator::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, test_config(1, 3));
        let constitution = test_constitution(3, PrincipleCategory::Identity);

        let conversations = generator.generate(&constitution).await;

        assert_eq!(conversations.len(), 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn every_example_per_principle_is_attempted() {
        let backend = Arc::new(ScriptedBackend::always_valid(Duration::ZERO));
        let config = DatagenConfig {
            examples_per_principle: 3,
            ..test_config(4, 3)
        };
        let generator = Generator::new(Arc::clone(&backend) as Arc<dyn ChatBackend>, config);
        let constitution = test_constitution(2, PrincipleCategory::Identity);

        let conversations = generator.generate(&constitution).await;

        assert_eq!(conversations.len(), 6);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
    }
}
