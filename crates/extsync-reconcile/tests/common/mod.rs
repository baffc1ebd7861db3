//! Shared fixtures for reconciliation integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use extsync_core::{LocalSource, MatchKey, RemoteSource, TypePolicy};
use extsync_reconcile::{
    DeploySummary, ManualMatchGroup, ManualMatchResult, ManualMatcher, MigrationCandidate,
    Resolver, ResolverError,
};
use serde_json::Value;

/// A question the resolver was asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    Match { handle: String, uuid: String },
    Migration { handles: Vec<String> },
    Deploy(DeploySummary),
    Select { handle: String, candidates: Vec<String> },
}

/// Resolver answering from pre-loaded scripts and recording every question.
///
/// Unscripted confirmations are accepted; unscripted selections create.
#[derive(Default)]
pub struct ScriptedResolver {
    match_answers: Mutex<VecDeque<bool>>,
    migration_answers: Mutex<VecDeque<bool>>,
    deploy_answers: Mutex<VecDeque<bool>>,
    selections: Mutex<VecDeque<Option<usize>>>,
    questions: Mutex<Vec<Question>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer_match(self, answer: bool) -> Self {
        self.match_answers.lock().unwrap().push_back(answer);
        self
    }

    pub fn answer_migration(self, answer: bool) -> Self {
        self.migration_answers.lock().unwrap().push_back(answer);
        self
    }

    pub fn answer_deploy(self, answer: bool) -> Self {
        self.deploy_answers.lock().unwrap().push_back(answer);
        self
    }

    pub fn select(self, choice: Option<usize>) -> Self {
        self.selections.lock().unwrap().push_back(choice);
        self
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().unwrap().clone()
    }

    pub fn asked_deploy(&self) -> bool {
        self.questions()
            .iter()
            .any(|question| matches!(question, Question::Deploy(_)))
    }

    fn record(&self, question: Question) {
        self.questions.lock().unwrap().push(question);
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn confirm_match(
        &self,
        local: &LocalSource,
        remote: &RemoteSource,
    ) -> Result<bool, ResolverError> {
        self.record(Question::Match {
            handle: local.handle.clone(),
            uuid: remote.uuid.clone(),
        });
        Ok(self.match_answers.lock().unwrap().pop_front().unwrap_or(true))
    }

    async fn confirm_migration(
        &self,
        candidates: &[MigrationCandidate],
    ) -> Result<bool, ResolverError> {
        self.record(Question::Migration {
            handles: candidates.iter().map(|c| c.handle.clone()).collect(),
        });
        Ok(self
            .migration_answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(true))
    }

    async fn confirm_deploy(&self, summary: &DeploySummary) -> Result<bool, ResolverError> {
        self.record(Question::Deploy(summary.clone()));
        Ok(self.deploy_answers.lock().unwrap().pop_front().unwrap_or(true))
    }

    async fn select_remote(
        &self,
        local: &LocalSource,
        candidates: &[&RemoteSource],
    ) -> Result<Option<usize>, ResolverError> {
        self.record(Question::Select {
            handle: local.handle.clone(),
            candidates: candidates.iter().map(|c| c.uuid.clone()).collect(),
        });
        Ok(self.selections.lock().unwrap().pop_front().flatten())
    }
}

/// Manual matcher returning a fixed answer and counting invocations.
pub struct FixedManualMatcher {
    result: ManualMatchResult,
    calls: Mutex<Vec<(Vec<String>, Vec<String>)>>,
}

impl FixedManualMatcher {
    pub fn new(result: ManualMatchResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Handles and uuids of every group received.
    pub fn calls(&self) -> Vec<(Vec<String>, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ManualMatcher for FixedManualMatcher {
    async fn manual_match(
        &self,
        group: &ManualMatchGroup<'_>,
        _key: MatchKey,
    ) -> Result<ManualMatchResult, ResolverError> {
        self.calls.lock().unwrap().push((
            group.local.iter().map(|l| l.handle.clone()).collect(),
            group.remote.iter().map(|r| r.uuid.clone()).collect(),
        ));
        Ok(self.result.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn extension_a() -> LocalSource {
    LocalSource::new("EXTENSION A", "checkout_post_purchase", "CHECKOUT_POST_PURCHASE")
}

pub fn extension_a_2() -> LocalSource {
    LocalSource::new("EXTENSION A 2", "checkout_post_purchase", "CHECKOUT_POST_PURCHASE")
}

pub fn extension_b() -> LocalSource {
    LocalSource::new("EXTENSION B", "subscription_management", "SUBSCRIPTION_MANAGEMENT")
}

pub fn function_a() -> LocalSource {
    LocalSource::new("FUNCTION A", "function", "FUNCTION")
}

pub fn point_of_sale() -> LocalSource {
    LocalSource::new("Point Of Sale", "point_of_sale", "POINT_OF_SALE")
        .with_policy(TypePolicy::ConfigurationManaged)
        .with_config(r#"{"embedded":true}"#)
}

pub fn webhook(instances: Vec<Value>) -> LocalSource {
    LocalSource::new("Webhook Subscription", "webhook_subscription", "WEBHOOK_SUBSCRIPTION")
        .with_policy(TypePolicy::MultiInstance)
        .with_instances(instances)
}

pub fn webhook_instance(topic: &str) -> Value {
    serde_json::json!({"topic": topic, "uri": "https://my-app.com/webhooks"})
}

pub fn registration_a() -> RemoteSource {
    RemoteSource::new("UUID_A", "A", "EXTENSION A", "CHECKOUT_POST_PURCHASE")
}

pub fn registration_a_2() -> RemoteSource {
    RemoteSource::new("UUID_A_2", "A_2", "EXTENSION A 2", "CHECKOUT_POST_PURCHASE")
}

pub fn registration_b() -> RemoteSource {
    RemoteSource::new("UUID_B", "B", "EXTENSION B", "SUBSCRIPTION_MANAGEMENT")
}

pub fn registration_pos() -> RemoteSource {
    RemoteSource::new("UUID_C_A", "C_A", "C_A", "POINT_OF_SALE")
}
