//! Scripted providers for tests.
//!
//! Each mock records the calls it receives so tests can assert on prompts,
//! lesson ordering and fan-out, and can be told to fail or stall.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex as SyncMutex};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    EventKind, EvidenceSource, FactCheck, Lead, MarketResearch, OutreachDraft, Strategy,
    TechStack, TriggerEvent,
};
use crate::domain::ports::{
    EventSink, EvidenceProvider, GenerationProvider, OutreachDrafter, ResearchProvider,
};
use crate::services::mismatch_policy;

/// Canned reply for a scripted call.
#[derive(Debug, Clone)]
pub struct MockReply {
    /// Reply text
    pub text: String,
    /// Return an error instead of `text`
    pub fail: bool,
    /// Error message when `fail` is set
    pub error_message: Option<String>,
}

impl MockReply {
    /// Reply with `text`.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
            error_message: None,
        }
    }

    /// Fail with `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            fail: true,
            error_message: Some(error.into()),
        }
    }

    fn into_result(self, provider: &str) -> DomainResult<String> {
        if self.fail {
            Err(DomainError::provider(
                provider,
                self.error_message.unwrap_or_else(|| "mock failure".to_string()),
            ))
        } else {
            Ok(self.text)
        }
    }
}

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct GenerationCall {
    /// System prompt sent
    pub system_prompt: String,
    /// User prompt sent
    pub user_prompt: String,
    /// Token budget requested
    pub max_tokens: u32,
}

/// Generation provider answering from rules, then a FIFO queue, then a default.
///
/// A rule matches when its needle occurs in the user prompt; the first
/// matching rule wins.
pub struct ScriptedGenerator {
    rules: Vec<(String, MockReply)>,
    queue: Mutex<VecDeque<MockReply>>,
    default_reply: MockReply,
    delay: Option<Duration>,
    calls: Mutex<Vec<GenerationCall>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGenerator {
    /// Generator that answers every call with `{}`.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            queue: Mutex::new(VecDeque::new()),
            default_reply: MockReply::success("Monitor"),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer prompts containing `needle` with `reply`.
    pub fn with_rule(mut self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Queue a one-shot reply.
    pub fn with_reply(mut self, reply: MockReply) -> Self {
        self.queue.get_mut().push_back(reply);
        self
    }

    /// Reply used once rules and queue are exhausted.
    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Sleep before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls recorded so far, oldest first.
    pub async fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "mock-generation"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> DomainResult<String> {
        self.calls.lock().await.push(GenerationCall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            max_tokens,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = match self
            .rules
            .iter()
            .find(|(needle, _)| user_prompt.contains(needle.as_str()))
        {
            Some((_, reply)) => reply.clone(),
            None => self
                .queue
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| self.default_reply.clone()),
        };

        reply.into_result(self.name())
    }
}

/// Research provider returning a fixed result.
#[derive(Default)]
pub struct StaticResearch {
    research: MarketResearch,
    fail: bool,
    calls: Mutex<usize>,
}

impl StaticResearch {
    /// Always return `research`.
    pub fn new(research: MarketResearch) -> Self {
        Self {
            research,
            fail: false,
            calls: Mutex::new(0),
        }
    }

    /// Research provider whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `research` calls made
    pub async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }
}

#[async_trait]
impl ResearchProvider for StaticResearch {
    fn name(&self) -> &'static str {
        "mock-research"
    }

    async fn research(&self, _description: &str) -> DomainResult<MarketResearch> {
        *self.calls.lock().await += 1;
        if self.fail {
            return Err(DomainError::provider(self.name(), "research unavailable"));
        }
        Ok(self.research.clone())
    }
}

/// Evidence provider keyed by company name.
///
/// Discovered technologies are scripted per company; the mismatch verdict is
/// computed with the real policy, as a live provider would.
#[derive(Default)]
pub struct ScriptedEvidence {
    findings: HashMap<String, (Vec<String>, Vec<EvidenceSource>)>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl ScriptedEvidence {
    /// Evidence provider that finds nothing for any company.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the technologies found for `company`.
    pub fn with_finding<I, S>(mut self, company: &str, discovered: I, sources: Vec<EvidenceSource>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.findings.insert(
            company.to_string(),
            (discovered.into_iter().map(Into::into).collect(), sources),
        );
        self
    }

    /// Make fact checks for `company` fail.
    pub fn with_failure(mut self, company: &str) -> Self {
        self.failing.insert(company.to_string());
        self
    }

    /// Sleep before every fact check.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl EvidenceProvider for ScriptedEvidence {
    fn name(&self) -> &'static str {
        "mock-evidence"
    }

    async fn fact_check(&self, company: &str, claimed_stack: &[String]) -> DomainResult<FactCheck> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(company) {
            return Err(DomainError::provider(self.name(), format!("search failed for {company}")));
        }

        let Some((discovered, sources)) = self.findings.get(company) else {
            return Ok(FactCheck::default());
        };

        let actual_tech = TechStack::from_terms(discovered);
        let verdict = mismatch_policy::evaluate_claims(claimed_stack, &actual_tech);
        Ok(FactCheck {
            actual_tech,
            sources: sources.clone(),
            mismatch: verdict.mismatch,
            mismatch_details: verdict.details,
        })
    }
}

/// Outreach drafter that echoes the event into a canned email.
#[derive(Default)]
pub struct ScriptedDrafter {
    failing: HashSet<String>,
    drafted_for: Mutex<Vec<String>>,
}

impl ScriptedDrafter {
    /// Drafter that succeeds for every lead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail drafts for `domain`.
    pub fn with_failure(mut self, domain: &str) -> Self {
        self.failing.insert(domain.to_string());
        self
    }

    /// Domains drafted for, in call order.
    pub async fn drafted_for(&self) -> Vec<String> {
        self.drafted_for.lock().await.clone()
    }
}

#[async_trait]
impl OutreachDrafter for ScriptedDrafter {
    fn name(&self) -> &'static str {
        "mock-drafter"
    }

    async fn draft(
        &self,
        lead: &Lead,
        event: &TriggerEvent,
        strategy: &Strategy,
    ) -> DomainResult<OutreachDraft> {
        if self.failing.contains(&lead.domain) {
            return Err(DomainError::provider(self.name(), format!("draft failed for {}", lead.domain)));
        }
        self.drafted_for.lock().await.push(lead.domain.clone());
        Ok(OutreachDraft {
            subject: format!("{} {}: a note for {}", event.competitor, event.status, lead.name),
            body: format!("Hi {}, given the {} {}, {}", lead.name, event.competitor, event.status, strategy.icp),
        })
    }
}

/// Event sink that keeps everything it is given.
#[derive(Default, Clone)]
pub struct RecordingEventSink {
    events: Arc<SyncMutex<Vec<EventKind>>>,
}

impl RecordingEventSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Published events in order.
    pub fn events(&self) -> Vec<EventKind> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Wire names of the published events.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(EventKind::event_type).collect()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, kind: EventKind) {
        if let Ok(mut events) = self.events.lock() {
            events.push(kind);
        }
    }
}
