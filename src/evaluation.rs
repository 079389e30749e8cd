use crate::client::CompletionClient;
use crate::error::EvaluationError;
use crate::flatten::flatten_response;
use crate::models::{Conversation, DiversityInput, FlatDisplayResult};
use crate::prompt::{CORRECTIVE_PROMPT, build_conversation};
use crate::validation::validate_response;

/// Corrective turns allowed after the first reply
pub const MAX_REPAIRS: u32 = 3;

/// Where a conversation stands in the validate-and-repair cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// Nothing sent yet
    Pending,
    /// Holding a reply that has not been checked
    Validating(String),
    /// Holding a rejected reply that will be sent back with a correction
    Repairing(String),
    /// Holding a reply that matches the schema
    Accepted(String),
    /// Holding the last rejected reply after all repairs were spent
    Exhausted(String),
}

impl RetryState {
    /// Transition out of `Validating` given the verdict on the candidate
    pub fn after_validation(candidate: String, valid: bool, repairs: u32) -> Self {
        if valid {
            RetryState::Accepted(candidate)
        } else if repairs < MAX_REPAIRS {
            RetryState::Repairing(candidate)
        } else {
            RetryState::Exhausted(candidate)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Accepted,
    Exhausted,
}

/// Final state of the cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub termination: Termination,
    /// Last reply received; unvalidated when `termination` is `Exhausted`
    pub candidate: String,
    pub repairs: u32,
    pub calls: u32,
}

/// Drives completion calls until a reply validates or repairs run out.
/// At most `1 + MAX_REPAIRS` calls are made.
pub struct RetryOrchestrator<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: CompletionClient + ?Sized> RetryOrchestrator<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Run the cycle, growing `conversation` by two turns per repair.
    /// Service errors end the cycle immediately.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<RepairOutcome, EvaluationError> {
        let mut state = RetryState::Pending;
        let mut repairs = 0;
        let mut calls = 0;

        loop {
            state = match state {
                RetryState::Pending => {
                    calls += 1;
                    RetryState::Validating(self.client.complete(conversation).await?)
                }
                RetryState::Validating(candidate) => {
                    let valid = validate_response(&candidate).is_valid();
                    RetryState::after_validation(candidate, valid, repairs)
                }
                RetryState::Repairing(candidate) => {
                    repairs += 1;
                    tracing::info!(
                        attempt = repairs,
                        max = MAX_REPAIRS,
                        "response was not properly structured, asking for a corrected one"
                    );
                    conversation.push_repair(candidate, CORRECTIVE_PROMPT);
                    calls += 1;
                    RetryState::Validating(self.client.complete(conversation).await?)
                }
                RetryState::Accepted(candidate) => {
                    return Ok(RepairOutcome {
                        termination: Termination::Accepted,
                        candidate,
                        repairs,
                        calls,
                    });
                }
                RetryState::Exhausted(candidate) => {
                    tracing::warn!(
                        repairs,
                        "response still invalid after all repairs, using last reply"
                    );
                    return Ok(RepairOutcome {
                        termination: Termination::Exhausted,
                        candidate,
                        repairs,
                        calls,
                    });
                }
            };
        }
    }
}

/// Evaluates slates against a completion backend
pub struct Evaluator<C> {
    client: C,
}

impl<C: CompletionClient> Evaluator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Build the prompt, run the repair cycle and flatten the final reply.
    ///
    /// An exhausted cycle still forwards its last reply; if that cannot be
    /// parsed or lacks a key the call fails with `MalformedResult`.
    pub async fn evaluate(&self, input: &DiversityInput) -> Result<FlatDisplayResult, EvaluationError> {
        let outcome = self.run_conversation(input).await?;
        tracing::debug!(
            termination = ?outcome.termination,
            repairs = outcome.repairs,
            calls = outcome.calls,
            "conversation finished"
        );

        let flat = match flatten_response(&outcome.candidate) {
            Ok(flat) => flat,
            Err(err) => {
                tracing::error!(error = %err, termination = ?outcome.termination, "failed to flatten response");
                return Err(err.into());
            }
        };

        tracing::info!(values = ?flat.values(), "evaluation result");
        Ok(flat)
    }

    async fn run_conversation(&self, input: &DiversityInput) -> Result<RepairOutcome, EvaluationError> {
        let mut conversation = build_conversation(input);
        RetryOrchestrator::new(&self.client).run(&mut conversation).await
    }
}
