// src/core/workflow.rs — The collaboration loop

use std::sync::Arc;

use super::budget::{BudgetBreach, BudgetTracker};
use super::cost::estimate_cost_for;
use super::prompts;
use super::similarity::ProgressDetector;
use super::types::*;
use crate::infra::config::EngineConfig;
use crate::infra::errors::TandemError;
use crate::provider::{ChatRequest, ChatResponse, Message, ModelProvider, TokenUsage};

/// One role's binding of a provider, model, and sampling temperature.
#[derive(Clone)]
pub struct RoleClient {
    pub provider: Arc<dyn ModelProvider>,
    pub model: String,
    pub temperature: f32,
}

impl RoleClient {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    async fn complete(&self, system: &str, prompt: String) -> Result<ChatResponse, TandemError> {
        self.provider
            .chat(ChatRequest {
                model: self.model.clone(),
                messages: vec![Message::user(prompt)],
                system: Some(system.to_string()),
                max_tokens: None,
                temperature: Some(self.temperature),
            })
            .await
    }
}

/// Drives the Developer → PM → (approve | revise) cycle until a stop
/// condition fires.
///
/// Stop conditions are evaluated once per iteration, in fixed priority
/// order: approval, max_iterations, max_tokens, max_cost, no_progress,
/// then the checkpoint prompt. Provider errors are not retried here; the
/// run aborts and the error propagates to the caller.
pub struct Workflow {
    manager: RoleClient,
    developer: RoleClient,
    kind: WorkflowKind,
    config: EngineConfig,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send>>,
    confirm: Option<Box<dyn Fn(u32) -> bool + Send>>,
}

impl Workflow {
    pub fn new(
        manager: RoleClient,
        developer: RoleClient,
        kind: WorkflowKind,
        config: EngineConfig,
    ) -> Self {
        Self {
            manager,
            developer,
            kind,
            config,
            on_progress: None,
            confirm: None,
        }
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    /// Set the checkpoint confirmation callback. Receives the iteration
    /// number; returning false stops the run with `user_stopped`. Without
    /// a callback, checkpoints auto-continue.
    pub fn with_confirm(mut self, cb: impl Fn(u32) -> bool + Send + 'static) -> Self {
        self.confirm = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    /// Run the full collaboration loop for a request.
    pub async fn run(&mut self, request: &str) -> Result<RunResult, TandemError> {
        let mut budget = BudgetTracker::new(self.config.max_tokens, self.config.max_cost_usd);
        let mut detector = ProgressDetector::new(
            self.config.early_stop_similarity,
            self.config.min_changed_lines,
            self.config.max_no_progress,
        );
        let mut history: Vec<IterationRecord> = Vec::new();
        let mut submission = String::new();
        let mut feedback = String::new();
        let mut iteration: u32 = 0;

        let stop_reason = loop {
            iteration += 1;
            self.emit(ProgressEvent::IterationStart {
                iteration,
                max_iterations: self.config.max_iterations,
            });

            // Developer: produce on the first call, revise afterwards
            let dev_prompt = if iteration == 1 {
                prompts::initial_prompt(self.kind, request)
            } else {
                prompts::revise_prompt(self.kind, request, &submission, &feedback)
            };
            let dev = self
                .developer
                .complete(prompts::DEVELOPER_SYSTEM_PROMPT, dev_prompt)
                .await?;
            let dev_cost = estimate_cost_for(&*self.developer.provider, &self.developer.model, &dev.usage);
            submission = dev.content;

            // PM reviews the submission
            let pm = self
                .manager
                .complete(
                    prompts::MANAGER_SYSTEM_PROMPT,
                    prompts::review_prompt(self.kind, request, &submission),
                )
                .await?;
            let pm_cost = estimate_cost_for(&*self.manager.provider, &self.manager.model, &pm.usage);
            let verdict = Verdict::parse(&pm.content);
            feedback = verdict.feedback.clone();

            let usage = TokenUsage {
                input_tokens: dev.usage.input_tokens + pm.usage.input_tokens,
                output_tokens: dev.usage.output_tokens + pm.usage.output_tokens,
            };
            let cost_usd = dev_cost + pm_cost;
            budget.record(&usage, cost_usd);
            let similarity = detector.observe(&submission);

            history.push(IterationRecord {
                index: iteration,
                submission: submission.clone(),
                verdict: verdict.clone(),
                usage,
                cost_usd,
            });

            self.emit(ProgressEvent::Verdict {
                iteration,
                approved: verdict.approved,
                cost_so_far: budget.cost_usd(),
            });

            // Stop checks, fixed priority order
            if verdict.approved {
                break StopReason::Approved;
            }
            if iteration >= self.config.max_iterations {
                break StopReason::MaxIterations;
            }
            if let Some(breach) = budget.exceeded() {
                break match breach {
                    BudgetBreach::Tokens => StopReason::MaxTokens,
                    BudgetBreach::Cost => StopReason::MaxCost,
                };
            }
            if detector.is_stalled() {
                self.emit(ProgressEvent::Stalled {
                    iteration,
                    similarity: similarity.unwrap_or(1.0),
                    count: detector.stalled_count(),
                });
                break StopReason::NoProgress;
            }
            if self.config.checkpoint_interval > 0
                && iteration % self.config.checkpoint_interval == 0
            {
                self.emit(ProgressEvent::Checkpoint { iteration });
                if let Some(ref confirm) = self.confirm {
                    if !confirm(iteration) {
                        break StopReason::UserStopped;
                    }
                }
            }
        };

        let result = RunResult {
            output: submission,
            success: stop_reason == StopReason::Approved,
            iterations: iteration,
            total_tokens: budget.tokens_used(),
            total_cost_usd: budget.cost_usd(),
            stop_reason,
            history,
        };

        self.emit(ProgressEvent::Complete {
            iterations: result.iterations,
            total_tokens: result.total_tokens,
            cost: result.total_cost_usd,
            stop_reason: result.stop_reason,
        });

        tracing::info!(
            iterations = result.iterations,
            tokens = result.total_tokens,
            cost_usd = result.total_cost_usd,
            stop = %result.stop_reason,
            "run finished"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatRequest, ChatResponse, CompletionStop, ModelInfo};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays a fixed sequence of responses; the last one
    /// repeats once the script runs out.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
        last: String,
        tokens_per_call: u32,
        catalog: Vec<ModelInfo>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&str>) -> Self {
            let last = responses.last().map(|s| s.to_string()).unwrap_or_default();
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                last,
                tokens_per_call: 150,
                catalog: vec![],
            }
        }

        fn with_tokens(mut self, tokens: u32) -> Self {
            self.tokens_per_call = tokens;
            self
        }

        fn with_catalog(mut self, catalog: Vec<ModelInfo>) -> Self {
            self.catalog = catalog;
            self
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn id(&self) -> &str {
            "scripted"
        }

        fn name(&self) -> &str {
            "Scripted"
        }

        fn models(&self) -> Vec<ModelInfo> {
            self.catalog.clone()
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, TandemError> {
            let content = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.last.clone());
            Ok(ChatResponse {
                content,
                usage: TokenUsage {
                    input_tokens: self.tokens_per_call / 3,
                    output_tokens: self.tokens_per_call - self.tokens_per_call / 3,
                },
                stop: CompletionStop::EndTurn,
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ModelProvider for FailingProvider {
        fn id(&self) -> &str {
            "failing"
        }

        fn name(&self) -> &str {
            "Failing"
        }

        fn models(&self) -> Vec<ModelInfo> {
            vec![]
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, TandemError> {
            Err(TandemError::Provider {
                provider: "failing".into(),
                message: "boom".into(),
                retriable: false,
            })
        }
    }

    fn role(provider: Arc<dyn ModelProvider>) -> RoleClient {
        RoleClient::new(provider, "test-model", 0.5)
    }

    fn config(max_iterations: u32) -> EngineConfig {
        EngineConfig {
            max_iterations,
            max_tokens: 0,
            max_cost_usd: 0.0,
            checkpoint_interval: 0,
            max_no_progress: 3,
            early_stop_similarity: 0.95,
            min_changed_lines: 2,
        }
    }

    /// Developer emits distinct submissions so stagnation never triggers.
    fn varied_developer() -> Arc<dyn ModelProvider> {
        Arc::new(ScriptedProvider::new(vec![
            "draft one\nwith alpha content\nand more",
            "draft two\ncompletely reworked\nnew structure\nextra detail",
            "draft three\nanother full rewrite\ndifferent shape entirely",
            "draft four\nyet another approach\nchanged everything again",
            "draft five\nfinal form\nall feedback addressed\nreally",
            "draft six\nstill iterating\nfresh angle once more",
        ]))
    }

    #[tokio::test]
    async fn test_approved_on_first_iteration() {
        let manager = role(Arc::new(ScriptedProvider::new(vec!["[APPROVED] Ship it."])));
        let developer = role(varied_developer());
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(10));

        let result = wf.run("validate email function").await.unwrap();
        assert!(result.success);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.stop_reason, StopReason::Approved);
        assert_eq!(result.history.len(), 1);
    }

    #[tokio::test]
    async fn test_approved_on_fifth_iteration() {
        let manager = role(Arc::new(ScriptedProvider::new(vec![
            "[REVISE] missing tests",
            "[REVISE] edge cases",
            "[REVISE] naming",
            "[REVISE] docs",
            "[APPROVED] good now",
        ])));
        let developer = role(varied_developer());
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(10));

        let result = wf.run("some feature").await.unwrap();
        assert!(result.success);
        assert_eq!(result.iterations, 5);
        assert_eq!(result.stop_reason, StopReason::Approved);
    }

    #[tokio::test]
    async fn test_never_approved_stops_at_max_iterations() {
        let manager = role(Arc::new(ScriptedProvider::new(vec!["[REVISE] not yet"])));
        let developer = role(varied_developer());
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(4));

        let result = wf.run("impossible task").await.unwrap();
        assert!(!result.success);
        assert_eq!(result.iterations, 4);
        assert_eq!(result.stop_reason, StopReason::MaxIterations);
        assert_eq!(result.history.len(), 4);
    }

    #[tokio::test]
    async fn test_token_ceiling_stops_run() {
        let manager = role(Arc::new(
            ScriptedProvider::new(vec!["[REVISE] keep going"]).with_tokens(300),
        ));
        let developer = role(Arc::new(
            ScriptedProvider::new(vec![
                "v1 alpha\nbeta\ngamma",
                "v2 totally\ndifferent\ncontent here",
                "v3 more\nnew things\nagain",
            ])
            .with_tokens(300),
        ));
        let mut cfg = config(10);
        // 600 tokens per iteration; ceiling reached during iteration 2
        cfg.max_tokens = 1_000;
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, cfg);

        let result = wf.run("task").await.unwrap();
        assert_eq!(result.stop_reason, StopReason::MaxTokens);
        assert_eq!(result.iterations, 2);
        assert!(result.total_tokens >= 1_000);
    }

    #[tokio::test]
    async fn test_cost_ceiling_stops_run() {
        let manager = role(Arc::new(
            ScriptedProvider::new(vec!["[REVISE] more"]).with_tokens(600_000),
        ));
        let developer = role(varied_developer());
        let mut cfg = config(10);
        cfg.max_cost_usd = 0.5;
        // unknown model prices at $1/$3 per Mtok, so one PM call alone
        // costs well over the ceiling
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, cfg);

        let result = wf.run("task").await.unwrap();
        assert_eq!(result.stop_reason, StopReason::MaxCost);
        assert_eq!(result.iterations, 1);
    }

    #[tokio::test]
    async fn test_identical_submissions_stop_with_no_progress() {
        let manager = role(Arc::new(ScriptedProvider::new(vec!["[REVISE] unchanged"])));
        let developer = role(Arc::new(ScriptedProvider::new(vec![
            "the exact same answer\nevery single time",
        ])));
        let mut cfg = config(10);
        cfg.max_no_progress = 3;
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, cfg);

        let result = wf.run("task").await.unwrap();
        assert_eq!(result.stop_reason, StopReason::NoProgress);
        // iteration 1 has no predecessor; stalls accumulate on 2, 3, 4
        assert_eq!(result.iterations, 4);
    }

    #[tokio::test]
    async fn test_checkpoint_decline_stops_run() {
        let manager = role(Arc::new(ScriptedProvider::new(vec!["[REVISE] continue"])));
        let developer = role(varied_developer());
        let mut cfg = config(10);
        cfg.checkpoint_interval = 2;
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, cfg)
            .with_confirm(|_iteration| false);

        let result = wf.run("task").await.unwrap();
        assert_eq!(result.stop_reason, StopReason::UserStopped);
        assert_eq!(result.iterations, 2);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_checkpoint_accept_continues() {
        let manager = role(Arc::new(ScriptedProvider::new(vec![
            "[REVISE] a",
            "[REVISE] b",
            "[APPROVED] done",
        ])));
        let developer = role(varied_developer());
        let mut cfg = config(10);
        cfg.checkpoint_interval = 1;
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, cfg)
            .with_confirm(|_| true);

        let result = wf.run("task").await.unwrap();
        assert_eq!(result.stop_reason, StopReason::Approved);
        assert_eq!(result.iterations, 3);
    }

    #[tokio::test]
    async fn test_approval_outranks_max_iterations() {
        // approval and the iteration ceiling coincide; approval wins
        let manager = role(Arc::new(ScriptedProvider::new(vec![
            "[REVISE] nope",
            "[APPROVED] at the wire",
        ])));
        let developer = role(varied_developer());
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(2));

        let result = wf.run("task").await.unwrap();
        assert_eq!(result.stop_reason, StopReason::Approved);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_malformed_verdict_continues_as_rejection() {
        let manager = role(Arc::new(ScriptedProvider::new(vec![
            "hmm, interesting work",
            "[APPROVED] fine",
        ])));
        let developer = role(varied_developer());
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(10));

        let result = wf.run("task").await.unwrap();
        assert_eq!(result.iterations, 2);
        assert!(!result.history[0].verdict.approved);
        assert!(result.history[0].verdict.feedback.is_empty());
        assert_eq!(result.stop_reason, StopReason::Approved);
    }

    #[tokio::test]
    async fn test_provider_error_aborts_run() {
        let manager = role(Arc::new(ScriptedProvider::new(vec!["[APPROVED]"])));
        let developer = role(Arc::new(FailingProvider));
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(10));

        let err = wf.run("task").await.unwrap_err();
        assert!(matches!(err, TandemError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_progress_events_emitted_in_order() {
        let manager = role(Arc::new(ScriptedProvider::new(vec!["[APPROVED] ok"])));
        let developer = role(varied_developer());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(3))
            .with_progress(move |e| sink.lock().unwrap().push(format!("{e:?}")));

        wf.run("task").await.unwrap();
        let events = events.lock().unwrap();
        assert!(events[0].starts_with("IterationStart"));
        assert!(events[1].starts_with("Verdict"));
        assert!(events.last().unwrap().starts_with("Complete"));
    }

    #[tokio::test]
    async fn test_catalog_prices_flow_into_recorded_cost() {
        let catalog = vec![ModelInfo {
            id: "test-model".into(),
            name: "Test Model".into(),
            context_window: 32_000,
            max_output_tokens: 4_096,
            input_price_per_mtok: 10.0,
            output_price_per_mtok: 20.0,
        }];
        let manager = role(Arc::new(
            ScriptedProvider::new(vec!["[APPROVED] ok"]).with_catalog(catalog.clone()),
        ));
        let developer = role(Arc::new(
            ScriptedProvider::new(vec!["draft\nwith content"]).with_catalog(catalog),
        ));
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(3));

        let result = wf.run("task").await.unwrap();
        // 50 in + 100 out per call at $10/$20 per Mtok, two calls
        let per_call = 50.0 / 1e6 * 10.0 + 100.0 / 1e6 * 20.0;
        assert!((result.history[0].cost_usd - 2.0 * per_call).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_history_records_usage_and_cost() {
        let manager = role(Arc::new(ScriptedProvider::new(vec!["[APPROVED] ok"])));
        let developer = role(varied_developer());
        let mut wf = Workflow::new(manager, developer, WorkflowKind::Develop, config(3));

        let result = wf.run("task").await.unwrap();
        let record = &result.history[0];
        assert_eq!(record.index, 1);
        assert_eq!(record.usage.total(), 300); // 150 developer + 150 PM
        assert!(record.cost_usd > 0.0);
        assert_eq!(result.total_tokens, 300);
    }
}
