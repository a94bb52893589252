//! One conversation with the assistant.
//!
//! A [`Session`] owns the conversation history and answers user messages
//! with [`Session::respond`]:
//!
//! 1. the user turn is appended to the [`ContextWindowManager`];
//! 2. the directive is rebuilt (fresh clock) and the history sent to the
//!    model together with the tool definitions;
//! 3. each requested tool runs in order; its result is unwrapped from any
//!    envelope, bounded with [`bound_tool_result`] and appended as a tool
//!    turn, while the same raw result is rendered for the user;
//! 4. steps 2–3 repeat until the model answers without tool calls or
//!    `max_rounds` is reached.
//!
//! Model failures never escape: the user gets a fixed apology and the
//! detail is logged.

use crate::agent::config::AssistantConfig;
use crate::agent::events::{EventHandler, LoggingHandler, SessionEvent};
use crate::agent::prompt::{directive_prompt, now_at};
use crate::api::cost::{CostTracker, ModelPricing, cost_table, generate_trace_id, pricing_for_model};
use crate::api::retry::retry_api_call;
use crate::context::{ContextBudget, ContextWindowManager, bound_tool_result};
use crate::render::{Normalizer, render};
use crate::tools::{ToolSet, is_error_record};
use crate::{ChatCompletion, ChatRequest, Message, ModelBackend, UsageInfo};
use tracing::{error, info, warn};

/// Reply when the model call fails.
pub const MODEL_FAILURE_REPLY: &str =
    "Something went wrong while processing your request. Please try again.";

/// Reply when the round limit is hit before a final answer.
pub const ROUND_LIMIT_REPLY: &str =
    "I couldn't finish this request within the allowed number of steps. Please try a more specific question.";

/// Reply when the model produced neither text nor tool calls.
pub const EMPTY_ANSWER_REPLY: &str =
    "I'm here to help. I can only run your APIs. Let me know how I can make your life E-Z.";

/// One tool call made while answering.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub name: String,
    pub call_id: String,
    /// What entered the history.
    pub bounded: String,
    /// What the user sees.
    pub rendered: String,
    pub is_error: bool,
}

/// Token counts for one `respond` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    /// Some round had no usage report and was estimated.
    pub estimated: bool,
}

/// The answer to one user message.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Text to send to the chat surface.
    pub text: String,
    /// The model's final answer, when it gave one.
    pub answer: Option<String>,
    pub tool_results: Vec<ToolOutcome>,
    pub usage: ExchangeUsage,
    /// Markdown cost table, when shown.
    pub cost_table: Option<String>,
    pub trace_id: String,
    /// Model calls made.
    pub rounds: u32,
    /// The model call failed and the apology was sent.
    pub failed: bool,
}

/// How a `respond` loop ended.
enum Ending {
    Answered(String),
    Failed,
    RoundLimit,
}

pub struct Session {
    config: AssistantConfig,
    window: ContextWindowManager,
    normalizer: Normalizer,
    context_budget: ContextBudget,
    pricing: Option<ModelPricing>,
    costs: CostTracker,
    events: Box<dyn EventHandler>,
}

impl Session {
    pub fn new(config: AssistantConfig) -> Self {
        let directive = directive_prompt(
            config.persona.as_deref(),
            &now_at(config.utc_offset_minutes),
        );
        let pricing = pricing_for_model(&config.model);
        if pricing.is_none() {
            info!("No pricing known for {}; cost footer disabled", config.model);
        }
        Self {
            window: ContextWindowManager::new(directive, config.history_cap),
            normalizer: Normalizer::new().with_envelope_field(config.envelope_field.clone()),
            context_budget: ContextBudget::default().with_max_tokens(config.context_window_tokens),
            pricing,
            costs: CostTracker::new(),
            events: Box::new(LoggingHandler),
            config,
        }
    }

    /// Replace the default [`LoggingHandler`].
    pub fn with_event_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.events = Box::new(handler);
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn history(&self) -> &ContextWindowManager {
        &self.window
    }

    pub fn costs(&self) -> &CostTracker {
        &self.costs
    }

    /// Forget the conversation. The directive survives.
    pub fn reset(&mut self) {
        self.window.clear();
        self.costs = CostTracker::new();
    }

    /// Answer one user message. Never fails; see [`Reply::failed`].
    pub async fn respond(
        &mut self,
        backend: &dyn ModelBackend,
        tools: &ToolSet,
        text: &str,
    ) -> Reply {
        let trace_id = generate_trace_id();
        info!(
            "Respond started: trace_id={trace_id}, model={}",
            self.config.model
        );

        self.append(Message::user(text));

        let tool_defs = tools.definitions();
        let mut outcomes = Vec::new();
        let mut usage = ExchangeUsage::default();
        let mut rounds = 0;
        let mut ending = Ending::RoundLimit;

        for round in 1..=self.config.max_rounds {
            rounds = round;
            self.window.refresh_directive(directive_prompt(
                self.config.persona.as_deref(),
                &now_at(self.config.utc_offset_minutes),
            ));

            let messages = self.window.transmittable();
            let context_usage = self.context_budget.estimate_usage(&messages);
            self.events.on_event(&SessionEvent::RoundStart {
                trace_id: &trace_id,
                round,
                max_rounds: self.config.max_rounds,
                context_usage: &context_usage,
            });

            let request = ChatRequest {
                model: self.config.model.clone(),
                messages,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                tools: (!tool_defs.is_empty()).then(|| tool_defs.clone()),
                tool_choice: (!tool_defs.is_empty()).then(|| "auto".to_string()),
            };

            let completion =
                match retry_api_call(&self.config.retry, || backend.complete(&request)).await {
                    Ok(completion) => completion,
                    Err(e) => {
                        error!("Model call failed: trace_id={trace_id}: {e}");
                        self.events.on_event(&SessionEvent::ModelFailed { error: &e });
                        ending = Ending::Failed;
                        break;
                    }
                };

            self.record_usage(&request, &completion, &mut usage);

            if let Some(text) = completion.content.as_deref()
                && !text.is_empty()
            {
                self.events.on_event(&SessionEvent::Text(text));
            }

            if completion.tool_calls.is_empty() {
                let answer = completion.content.unwrap_or_default();
                ending = Ending::Answered(answer);
                break;
            }

            self.events.on_event(&SessionEvent::ToolCallsReceived {
                round,
                count: completion.tool_calls.len(),
            });
            self.append(Message::assistant_tool_calls(
                completion.content.clone(),
                completion.tool_calls.clone(),
            ));

            for call in &completion.tool_calls {
                let name = call.function.name.as_str();
                self.events.on_event(&SessionEvent::ToolExecuting {
                    name,
                    arguments: &call.function.arguments,
                });

                let raw = tools.execute(name, &call.function.arguments).await;
                let payload = self.normalizer.unwrap_envelope(&raw);
                let is_error = is_error_record(&payload);
                let bounded = bound_tool_result(&payload, &self.config.bound);
                self.events.on_event(&SessionEvent::ToolResult {
                    name,
                    call_id: &call.id,
                    bounded: &bounded,
                    is_error,
                });
                self.append(Message::tool_result(call.id.clone(), bounded.clone()));

                let rendered = render(&self.normalizer.normalize(&raw), &self.config.render);
                outcomes.push(ToolOutcome {
                    name: name.to_string(),
                    call_id: call.id.clone(),
                    bounded,
                    rendered,
                    is_error,
                });
            }
        }

        let (answer, failed) = match ending {
            Ending::Answered(answer) => {
                self.events.on_event(&SessionEvent::Finished {
                    trace_id: &trace_id,
                    rounds,
                });
                (Some(answer), false)
            }
            Ending::Failed => (None, true),
            Ending::RoundLimit => {
                self.events.on_event(&SessionEvent::RoundLimitReached {
                    max_rounds: self.config.max_rounds,
                });
                (None, false)
            }
        };

        let body = match (&answer, failed) {
            (_, true) => MODEL_FAILURE_REPLY.to_string(),
            (Some(text), _) if !text.trim().is_empty() => text.clone(),
            (Some(_), _) if outcomes.is_empty() => EMPTY_ANSWER_REPLY.to_string(),
            (Some(_), _) => String::new(),
            (None, _) => ROUND_LIMIT_REPLY.to_string(),
        };
        if !body.is_empty() {
            self.append(Message::assistant_text(body.clone()));
        }

        let cost_footer = match &self.pricing {
            Some(pricing) if self.config.reply.show_cost && !failed => Some(cost_table(
                usage.input_tokens,
                usage.output_tokens,
                pricing,
                &self.config.currency,
            )),
            _ => None,
        };

        let text = if failed {
            body
        } else {
            let mut parts = Vec::new();
            if !body.is_empty() {
                parts.push(body);
            }
            if self.config.reply.show_tool_results {
                parts.extend(
                    outcomes
                        .iter()
                        .filter(|o| !o.is_error)
                        .map(|o| o.rendered.clone()),
                );
            }
            if let Some(footer) = &cost_footer {
                parts.push(footer.clone());
            }
            parts.join("\n\n")
        };

        info!(
            "Respond completed: trace_id={trace_id}, rounds={rounds}, tools={}, {}",
            outcomes.len(),
            self.costs.summary()
        );

        Reply {
            text,
            answer,
            tool_results: outcomes,
            usage,
            cost_table: cost_footer,
            trace_id,
            rounds,
            failed,
        }
    }

    fn append(&mut self, turn: Message) {
        match self.window.append(turn) {
            Ok(0) => {}
            Ok(count) => self.events.on_event(&SessionEvent::HistoryEvicted {
                count,
                total: self.window.evicted_total(),
            }),
            Err(e) => warn!("Turn not appended: {e}"),
        }
    }

    /// Reported usage when complete, otherwise a character-based estimate.
    fn record_usage(
        &mut self,
        request: &ChatRequest,
        completion: &ChatCompletion,
        usage: &mut ExchangeUsage,
    ) {
        let (input, output, estimated) = match &completion.usage {
            Some(UsageInfo {
                prompt_tokens: Some(p),
                completion_tokens: Some(c),
                ..
            }) => (*p, *c, false),
            _ => {
                let response = if completion.tool_calls.is_empty() {
                    Message::assistant_text(completion.content.clone().unwrap_or_default())
                } else {
                    Message::assistant_tool_calls(
                        completion.content.clone(),
                        completion.tool_calls.clone(),
                    )
                };
                let mut exchange = request.messages.clone();
                exchange.push(response);
                let (i, o) = self.context_budget.estimate_exchange(&exchange);
                (i, o, true)
            }
        };
        usage.input_tokens = usage.input_tokens.saturating_add(input);
        usage.output_tokens = usage.output_tokens.saturating_add(output);
        usage.estimated |= estimated;
        self.costs.record(input, output, self.pricing.as_ref());
        self.events.on_event(&SessionEvent::TokenUsage {
            prompt_tokens: input,
            completion_tokens: output,
            estimated,
        });
    }
}
