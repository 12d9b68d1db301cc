//! Lead scorer.
//!
//! Validates one lead: fact-check its claimed stack, run the mismatch policy,
//! ask the classifier for a Strike/Monitor/Disregard label and persist the
//! outcome (classification, evidence links and any lesson) as one unit.

use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, info, instrument};

use super::mismatch_policy::{self, MismatchVerdict};
use super::provider_guard::with_timeout;
use super::response_decoder::decode_classification;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Classification, FactCheck, Lead, LeadOutcome, LeadVerdict, Lesson, LessonType,
};
use crate::domain::ports::{EvidenceProvider, GenerationProvider, LeadRepository};

/// Token budget for a single classification label.
pub const CLASSIFY_MAX_TOKENS: u32 = 20;

/// System prompt asking for a single classification label.
pub const CLASSIFY_SYSTEM_PROMPT: &str = "\
You are a lead qualification classifier for B2B sales.

Given a product/service description, recent trigger events, and company context, \
classify the lead into exactly one category:

- Strike: Strong fit with an urgent, time-bound trigger. Pursue immediately.
- Monitor: Potential fit but no urgent trigger. Watch for changes.
- Disregard: Poor fit. Wrong industry, too small, or fundamentally misaligned.

Respond with ONLY the classification label (Strike, Monitor, or Disregard). \
No explanation and no punctuation, just the single word.";

const LOCK_IN_PHRASES: [&str; 4] = [
    "lock-in",
    "locked in",
    "multi-year contract",
    "long-term contract",
];

/// User prompt for classifying one lead.
pub fn build_classification_prompt(
    product_description: &str,
    trigger_summary: &str,
    company_context: &str,
) -> String {
    format!(
        "Product/Service Description: {product_description}\n\
         Trigger Events: {trigger_summary}\n\
         Company Context: {company_context}"
    )
}

/// Summarize fact-check results into the trigger line the classifier reads.
pub fn trigger_summary(verdict: &MismatchVerdict, fact: &FactCheck) -> String {
    if verdict.mismatch {
        return format!(
            "Tech stack mismatch detected: {}",
            verdict.details.as_deref().unwrap_or_default()
        );
    }

    let snippets: Vec<&str> = fact
        .sources
        .iter()
        .take(3)
        .filter(|s| !s.summary.is_empty())
        .map(|s| truncate_chars(&s.summary, 120))
        .collect();

    if snippets.is_empty() {
        "No recent trigger events detected from web research.".to_string()
    } else {
        format!("Recent web evidence: {}", snippets.join("; "))
    }
}

/// One-line description of a lead for prompts.
pub fn company_context(lead: &Lead) -> String {
    let funding = lead.funding_stage.as_deref().unwrap_or("unknown");
    let employees = lead
        .employees
        .map_or_else(|| "unknown".to_string(), |n| n.to_string());
    let stack = if lead.tech_stack.is_empty() {
        "unknown stack".to_string()
    } else {
        lead.tech_stack.join(", ")
    };
    format!("{} ({funding}, ~{employees} employees) using {stack}.", lead.name)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn mentions_lock_in(fact: &FactCheck) -> bool {
    fact.sources.iter().any(|s| {
        let lowered = s.summary.to_lowercase();
        LOCK_IN_PHRASES.iter().any(|p| lowered.contains(p))
    })
}

/// Fact-checks and classifies single leads.
pub struct LeadScorer {
    evidence: Arc<dyn EvidenceProvider>,
    generator: Arc<dyn GenerationProvider>,
    leads: Arc<dyn LeadRepository>,
    timeout: Duration,
    small_company_employees: u32,
}

impl LeadScorer {
    /// Leads with fewer than `small_company_employees` get a size lesson.
    pub fn new(
        evidence: Arc<dyn EvidenceProvider>,
        generator: Arc<dyn GenerationProvider>,
        leads: Arc<dyn LeadRepository>,
        timeout: Duration,
        small_company_employees: u32,
    ) -> Self {
        Self {
            evidence,
            generator,
            leads,
            timeout,
            small_company_employees,
        }
    }

    /// Ask the classifier for a label. Undecodable output resolves per
    /// [`decode_classification`], never to an error.
    pub async fn classify(
        &self,
        product_description: &str,
        trigger_summary: &str,
        company_context: &str,
    ) -> DomainResult<Classification> {
        let prompt = build_classification_prompt(product_description, trigger_summary, company_context);
        let raw = with_timeout(
            self.generator.name(),
            self.timeout,
            self.generator
                .complete(CLASSIFY_SYSTEM_PROMPT, &prompt, CLASSIFY_MAX_TOKENS),
        )
        .await?;

        let label = decode_classification(&raw);
        debug!(raw = %raw.trim(), label = label.as_str(), "classifier output");
        Ok(label)
    }

    /// Pick the lesson type for a negative outcome.
    pub fn lesson_type_for(&self, lead: &Lead, verdict: &MismatchVerdict, fact: &FactCheck) -> LessonType {
        if verdict.mismatch {
            LessonType::TechStackMismatch
        } else if lead
            .employees
            .is_some_and(|n| n < self.small_company_employees)
        {
            LessonType::CompanyTooSmall
        } else if mentions_lock_in(fact) {
            LessonType::ContractLockIn
        } else {
            LessonType::Disregard
        }
    }

    /// Validate one lead end to end. Nothing is written unless every provider
    /// call succeeds.
    #[instrument(skip(self, lead, product_description), fields(domain = %lead.domain))]
    pub async fn score(&self, lead: &Lead, product_description: &str) -> DomainResult<LeadVerdict> {
        let fact = with_timeout(
            self.evidence.name(),
            self.timeout,
            self.evidence.fact_check(&lead.name, &lead.tech_stack),
        )
        .await?;

        let verdict = mismatch_policy::evaluate(&lead.claimed_stack(), &fact.actual_tech);
        let summary = trigger_summary(&verdict, &fact);
        let context = company_context(lead);

        let classification = self.classify(product_description, &summary, &context).await?;

        let lesson = classification.is_failure().then(|| {
            let lesson_type = self.lesson_type_for(lead, &verdict, &fact);
            let details = verdict
                .details
                .clone()
                .unwrap_or_else(|| format!("{} classified as Disregard by the classifier.", lead.name));
            Lesson::for_lead(&lead.domain, lesson_type, details)
        });

        let evidence: Vec<_> = fact.sources.iter().filter(|s| s.has_url()).cloned().collect();
        let outcome = LeadOutcome {
            domain: lead.domain.clone(),
            classification,
            score: None,
            evidence,
            lesson: lesson.clone(),
        };
        self.leads.record_outcome(&outcome).await?;

        info!(
            company = %lead.name,
            classification = classification.as_str(),
            mismatch = verdict.mismatch,
            "lead validated"
        );

        Ok(LeadVerdict {
            company: lead.name.clone(),
            domain: lead.domain.clone(),
            classification,
            previous_classification: lead.classification,
            lesson_type: lesson.as_ref().map(|l| l.lesson_type),
            lesson_details: lesson.as_ref().map(|l| l.details.clone()),
            lesson_id: lesson.map(|l| l.lesson_id),
            evidence_count: fact.sources.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockReply, ScriptedEvidence, ScriptedGenerator};
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteLeadRepository, SqliteLessonRepository};
    use crate::domain::errors::DomainError;
    use crate::domain::models::{EvidenceSource, TechStack};
    use crate::domain::ports::LessonRepository;

    struct Fixture {
        leads: Arc<SqliteLeadRepository>,
        lessons: SqliteLessonRepository,
    }

    async fn fixture(lead: &Lead) -> Fixture {
        let pool = create_migrated_test_pool().await.unwrap();
        let leads = Arc::new(SqliteLeadRepository::new(pool.clone()));
        leads.insert(lead).await.unwrap();
        Fixture {
            leads,
            lessons: SqliteLessonRepository::new(pool),
        }
    }

    fn scorer(f: &Fixture, evidence: ScriptedEvidence, generator: ScriptedGenerator) -> LeadScorer {
        LeadScorer::new(
            Arc::new(evidence),
            Arc::new(generator),
            f.leads.clone(),
            Duration::from_secs(5),
            25,
        )
    }

    fn postgres_lead() -> Lead {
        Lead::new("acme.io", "Acme")
            .with_tech_stack(["PostgreSQL", "AWS"])
            .with_employees(120)
            .with_funding_stage("Series B")
    }

    #[test]
    fn test_company_context_format() {
        assert_eq!(
            company_context(&postgres_lead()),
            "Acme (Series B, ~120 employees) using PostgreSQL, AWS."
        );
        assert_eq!(
            company_context(&Lead::new("x.io", "X")),
            "X (unknown, ~unknown employees) using unknown stack."
        );
    }

    #[test]
    fn test_trigger_summary_variants() {
        let fact = FactCheck {
            sources: vec![
                EvidenceSource::new("https://a", "a".repeat(200)),
                EvidenceSource::new("https://b", ""),
                EvidenceSource::new("https://c", "third"),
                EvidenceSource::new("https://d", "fourth is dropped"),
            ],
            ..FactCheck::default()
        };
        let clean = mismatch_policy::evaluate(&TechStack::new(), &TechStack::new());
        let summary = trigger_summary(&clean, &fact);
        assert_eq!(summary, format!("Recent web evidence: {}; third", "a".repeat(120)));

        assert_eq!(
            trigger_summary(&clean, &FactCheck::default()),
            "No recent trigger events detected from web research."
        );

        let mismatch = mismatch_policy::evaluate(
            &TechStack::from_terms(["postgres"]),
            &TechStack::from_terms(["mongodb"]),
        );
        assert!(trigger_summary(&mismatch, &fact).starts_with("Tech stack mismatch detected: Claimed DB"));
    }

    #[tokio::test]
    async fn test_mismatch_disregard_writes_lesson_and_evidence() {
        let lead = postgres_lead();
        let f = fixture(&lead).await;
        let evidence = ScriptedEvidence::new().with_finding(
            "Acme",
            ["mongodb"],
            vec![EvidenceSource::new("https://acme.io/blog/mongo", "Acme runs MongoDB")],
        );
        let generator = ScriptedGenerator::new()
            .with_rule("Tech stack mismatch detected", MockReply::success("Disregard"));

        let verdict = scorer(&f, evidence, generator).score(&lead, "Managed Postgres").await.unwrap();

        assert_eq!(verdict.classification, Classification::Disregard);
        assert_eq!(verdict.lesson_type, Some(LessonType::TechStackMismatch));
        assert_eq!(verdict.evidence_count, 1);
        assert_eq!(
            verdict.lesson_details.as_deref(),
            Some("Claimed DB: postgres, but web evidence shows: mongodb")
        );

        let stored = f.leads.get("acme.io").await.unwrap().unwrap();
        assert_eq!(stored.classification, Some(Classification::Disregard));
        assert_eq!(f.leads.evidence_for("acme.io").await.unwrap().len(), 1);
        let lessons = f.lessons.for_lead("acme.io").await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(Some(lessons[0].lesson_id.clone()), verdict.lesson_id);
    }

    #[tokio::test]
    async fn test_small_company_lesson_type() {
        let lead = Lead::new("tiny.dev", "Tiny").with_tech_stack(["postgres"]).with_employees(8);
        let f = fixture(&lead).await;
        let generator = ScriptedGenerator::new().with_default(MockReply::success("Disregard"));

        let verdict = scorer(&f, ScriptedEvidence::new(), generator)
            .score(&lead, "p")
            .await
            .unwrap();
        assert_eq!(verdict.lesson_type, Some(LessonType::CompanyTooSmall));
        assert_eq!(
            verdict.lesson_details.as_deref(),
            Some("Tiny classified as Disregard by the classifier.")
        );
    }

    #[tokio::test]
    async fn test_lock_in_lesson_type() {
        let lead = postgres_lead();
        let f = fixture(&lead).await;
        let evidence = ScriptedEvidence::new().with_finding(
            "Acme",
            ["postgres"],
            vec![EvidenceSource::new("https://news", "Acme signed a multi-year contract with Oracle")],
        );
        let generator = ScriptedGenerator::new().with_default(MockReply::success("Disregard"));

        let verdict = scorer(&f, evidence, generator).score(&lead, "p").await.unwrap();
        assert_eq!(verdict.lesson_type, Some(LessonType::ContractLockIn));
    }

    #[tokio::test]
    async fn test_positive_label_writes_no_lesson() {
        let mut lead = postgres_lead();
        lead.classification = Some(Classification::Disregard);
        let f = fixture(&lead).await;
        let generator = ScriptedGenerator::new().with_default(MockReply::success("Strike."));

        let verdict = scorer(&f, ScriptedEvidence::new(), generator)
            .score(&lead, "p")
            .await
            .unwrap();
        assert_eq!(verdict.classification, Classification::Strike);
        assert_eq!(verdict.previous_classification, Some(Classification::Disregard));
        assert!(verdict.lesson_type.is_none());
        assert_eq!(f.lessons.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_label_defaults_to_monitor() {
        let lead = postgres_lead();
        let f = fixture(&lead).await;
        let generator = ScriptedGenerator::new().with_default(MockReply::success("hmm, unclear"));

        let verdict = scorer(&f, ScriptedEvidence::new(), generator)
            .score(&lead, "p")
            .await
            .unwrap();
        assert_eq!(verdict.classification, Classification::Monitor);
    }

    #[tokio::test]
    async fn test_provider_failure_writes_nothing() {
        let lead = postgres_lead();
        let f = fixture(&lead).await;
        let evidence = ScriptedEvidence::new().with_failure("Acme");

        let err = scorer(&f, evidence, ScriptedGenerator::new())
            .score(&lead, "p")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ProviderError { .. }));
        assert!(f.leads.get("acme.io").await.unwrap().unwrap().classification.is_none());
    }

    #[tokio::test]
    async fn test_classification_prompt_shape() {
        let lead = postgres_lead();
        let f = fixture(&lead).await;
        let generator = Arc::new(ScriptedGenerator::new());
        let scorer = LeadScorer::new(
            Arc::new(ScriptedEvidence::new()),
            generator.clone(),
            f.leads.clone(),
            Duration::from_secs(5),
            25,
        );

        scorer.score(&lead, "Managed Postgres").await.unwrap();

        let calls = generator.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].max_tokens, CLASSIFY_MAX_TOKENS);
        assert_eq!(
            calls[0].user_prompt,
            "Product/Service Description: Managed Postgres\n\
             Trigger Events: No recent trigger events detected from web research.\n\
             Company Context: Acme (Series B, ~120 employees) using PostgreSQL, AWS."
        );
    }
}
