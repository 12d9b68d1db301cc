//! End-to-end feedback loop through the Hunter facade: compose, validate,
//! learn, pivot, refine.

mod common;

use common::{import, lead, runtime, strategy_json, test_config, Scripted, PRODUCT};
use recursive_hunter::adapters::mock::{MockReply, ScriptedEvidence, ScriptedGenerator};
use recursive_hunter::domain::models::{
    Classification, ComposeMode, EvidenceSource, LeadValidationResult, LessonSubject, LessonType,
    NewLead,
};
use recursive_hunter::DomainError;

const REFINED_ICP: &str = "Series B+ SaaS teams already running Postgres at scale";

fn generator() -> ScriptedGenerator {
    ScriptedGenerator::new()
        .with_rule("Lessons from previous rounds", MockReply::success(strategy_json(REFINED_ICP)))
        .with_rule("Tech stack mismatch detected", MockReply::success("Disregard"))
        .with_rule("Company Context: Delta", MockReply::success("Disregard."))
        .with_rule("Recent web evidence", MockReply::success("Strike"))
        .with_rule("Product: ", MockReply::success(strategy_json("B2B SaaS running Postgres")))
        .with_default(MockReply::success("Monitor"))
}

/// Alpha, Beta and Gamma contradict their claimed database, Delta is too
/// small, Epsilon has fresh evidence.
fn evidence() -> ScriptedEvidence {
    ScriptedEvidence::new()
        .with_finding("Alpha", ["MongoDB"], vec![])
        .with_finding("Beta", ["MySQL"], vec![])
        .with_finding("Gamma", ["MongoDB", "AWS"], vec![])
        .with_finding(
            "Epsilon",
            ["Postgres", "AWS"],
            vec![EvidenceSource::new(
                "https://epsilon.io/blog/migration",
                "Epsilon is hiring for a Postgres migration",
            )],
        )
}

fn leads() -> Vec<NewLead> {
    vec![
        lead("alpha.io", "Alpha", &["Postgres", "AWS"], 200),
        lead("beta.io", "Beta", &["PostgreSQL"], 300),
        lead("delta.io", "Delta", &["Postgres"], 10),
        lead("epsilon.io", "Epsilon", &["Postgres", "AWS"], 400),
        lead("gamma.io", "Gamma", &["Postgres", "AWS"], 150),
    ]
}

#[tokio::test]
async fn test_compose_validate_pivot_then_refine() {
    let scripted = Scripted::new(generator(), evidence());
    let runtime = runtime(&scripted, &test_config()).await;
    import(&runtime, leads()).await;

    let first = runtime.hunter.submit_product(PRODUCT, None).await.unwrap();
    assert_eq!(first.rounds.len(), 1);
    let round = &first.rounds[0];
    assert_eq!(round.generation.mode, ComposeMode::Compose);
    assert_eq!(round.generation.lessons_used, 0);
    assert_eq!(round.generation.version(), 1);

    let report = round.validation.as_ref().unwrap();
    assert_eq!(report.total_leads, 5);
    assert_eq!((report.strike, report.monitor, report.disregard), (1, 0, 4));
    assert!((report.disregard_rate - 0.8).abs() < f64::EPSILON);
    assert!(report.pivot_triggered);

    // Results keep target order
    let domains: Vec<&str> = report.results.iter().map(LeadValidationResult::domain).collect();
    assert_eq!(domains, ["alpha.io", "beta.io", "delta.io", "epsilon.io", "gamma.io"]);

    let lessons = runtime.hunter.all_lessons().await.unwrap();
    assert_eq!(lessons.len(), 5);
    let pivot = lessons.last().unwrap();
    assert_eq!(pivot.lesson_type, LessonType::SegmentPivot);
    assert_eq!(pivot.subject, LessonSubject::Strategy(1));
    assert_eq!(report.pivot_lesson_id.as_deref(), Some(pivot.lesson_id.as_str()));

    let delta = runtime.hunter.lessons_for_lead("delta.io").await.unwrap();
    assert_eq!(delta.len(), 1);
    assert_eq!(delta[0].lesson_type, LessonType::CompanyTooSmall);
    let alpha = runtime.hunter.lessons_for_lead("alpha.io").await.unwrap();
    assert_eq!(alpha[0].lesson_type, LessonType::TechStackMismatch);

    let epsilon = runtime.hunter.lead_detail("epsilon.io").await.unwrap();
    assert_eq!(epsilon.lead.classification, Some(Classification::Strike));
    assert_eq!(epsilon.evidence.len(), 1);
    assert!(epsilon.lessons.is_empty());

    // Any lesson forces refine on the next submission
    let second = runtime.hunter.submit_product(PRODUCT, None).await.unwrap();
    let generation = &second.rounds[0].generation;
    assert_eq!(generation.mode, ComposeMode::Refine);
    assert_eq!(generation.lessons_used, 5);
    assert_eq!(generation.version(), 2);
    assert_eq!(generation.evolved_from(), Some(1));
    assert_eq!(generation.strategy.icp, REFINED_ICP);

    let calls = scripted.generator.calls().await;
    let refine_prompt = calls
        .iter()
        .map(|c| c.user_prompt.as_str())
        .find(|p| p.contains("Lessons from previous rounds"))
        .unwrap();
    let too_small = refine_prompt.find("[CompanyTooSmall]").unwrap();
    let segment = refine_prompt.find("[SegmentPivot]").unwrap();
    assert!(too_small < segment, "lessons must be fed oldest first");
}

#[tokio::test]
async fn test_refinement_cycles_stop_at_limit() {
    let scripted = Scripted::new(generator(), evidence());
    let runtime = runtime(&scripted, &test_config()).await;
    import(&runtime, leads()).await;

    let submission = runtime.hunter.submit_product(PRODUCT, Some(2)).await.unwrap();
    assert_eq!(submission.rounds.len(), 3);
    assert_eq!(submission.final_version(), Some(3));

    let modes: Vec<ComposeMode> = submission.rounds.iter().map(|r| r.generation.mode).collect();
    assert_eq!(modes, [ComposeMode::Compose, ComposeMode::Refine, ComposeMode::Refine]);

    // Research ran once; refinement reuses it
    assert_eq!(scripted.research.call_count().await, 1);

    let versions: Vec<u32> = runtime
        .hunter
        .strategies()
        .await
        .unwrap()
        .iter()
        .map(|s| s.version)
        .collect();
    // Newest first
    assert_eq!(versions, [3, 2, 1]);
}

#[tokio::test]
async fn test_rate_at_threshold_does_not_pivot() {
    let evidence = ScriptedEvidence::new()
        .with_finding("Alpha", ["MongoDB"], vec![])
        .with_finding("Beta", ["MySQL"], vec![])
        .with_finding("Gamma", ["MongoDB"], vec![]);
    let scripted = Scripted::new(generator(), evidence);
    let runtime = runtime(&scripted, &test_config()).await;
    import(
        &runtime,
        vec![
            lead("alpha.io", "Alpha", &["Postgres"], 200),
            lead("beta.io", "Beta", &["Postgres"], 200),
            lead("gamma.io", "Gamma", &["Postgres"], 200),
            lead("kappa.io", "Kappa", &["Postgres"], 200),
            lead("omega.io", "Omega", &["Postgres"], 200),
        ],
    )
    .await;

    let submission = runtime.hunter.submit_product(PRODUCT, Some(3)).await.unwrap();
    assert_eq!(submission.rounds.len(), 1);
    let report = submission.rounds[0].validation.as_ref().unwrap();
    assert_eq!(report.disregard, 3);
    assert!(!report.pivot_triggered);

    let lessons = runtime.hunter.lessons_for_strategy(1).await.unwrap();
    assert!(lessons.is_empty());
}

#[tokio::test]
async fn test_failed_leads_are_excluded_from_the_rate() {
    let evidence = ScriptedEvidence::new()
        .with_finding("Alpha", ["MongoDB"], vec![])
        .with_finding("Beta", ["MySQL"], vec![])
        .with_failure("Gamma");
    let scripted = Scripted::new(generator(), evidence);
    let runtime = runtime(&scripted, &test_config()).await;
    import(
        &runtime,
        vec![
            lead("alpha.io", "Alpha", &["Postgres"], 200),
            lead("beta.io", "Beta", &["Postgres"], 200),
            lead("gamma.io", "Gamma", &["Postgres"], 200),
        ],
    )
    .await;
    runtime.hunter.generate_strategy(PRODUCT).await.unwrap();

    let mut events = runtime.events.subscribe();
    let report = runtime.hunter.run_validation(None).await.unwrap();
    assert_eq!(report.total_leads, 3);
    assert_eq!(report.errored, 1);
    assert_eq!(report.disregard, 2);
    // 2 of 2 scored leads
    assert!((report.disregard_rate - 1.0).abs() < f64::EPSILON);
    assert!(report.pivot_triggered);
    assert!(report.results[2].is_failed());

    let mut types = Vec::new();
    while let Ok(event) = events.try_recv() {
        types.push(event.kind.event_type());
    }
    assert_eq!(types.first(), Some(&"validation_started"));
    assert_eq!(types.last(), Some(&"validation_completed"));
    assert!(types.contains(&"lead_validation_failed"));
    assert!(types.contains(&"pivot_triggered"));
}

#[tokio::test]
async fn test_all_leads_failing_reports_empty_pass() {
    let evidence = ScriptedEvidence::new().with_failure("Alpha").with_failure("Beta");
    let scripted = Scripted::new(generator(), evidence);
    let runtime = runtime(&scripted, &test_config()).await;
    import(
        &runtime,
        vec![
            lead("alpha.io", "Alpha", &["Postgres"], 200),
            lead("beta.io", "Beta", &["Postgres"], 200),
        ],
    )
    .await;
    runtime.hunter.generate_strategy(PRODUCT).await.unwrap();

    let report = runtime.hunter.run_validation(Some(1)).await.unwrap();
    assert_eq!(report.errored, 2);
    assert!(!report.pivot_triggered);
    assert!(report.pivot_error.is_some());
    assert!(runtime.hunter.all_lessons().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_errors_for_missing_strategies() {
    let scripted = Scripted::new(generator(), ScriptedEvidence::new());
    let runtime = runtime(&scripted, &test_config()).await;

    let err = runtime.hunter.run_validation(None).await.unwrap_err();
    assert!(matches!(err, DomainError::NoStrategy));

    // A strategy created before any lead exists has no targets
    runtime.hunter.generate_strategy(PRODUCT).await.unwrap();
    let err = runtime.hunter.run_validation(Some(1)).await.unwrap_err();
    assert!(matches!(err, DomainError::EmptyValidationPass { version: 1 }));

    let err = runtime.hunter.run_validation(Some(9)).await.unwrap_err();
    assert!(matches!(err, DomainError::UnknownStrategy(9)));
}

#[tokio::test]
async fn test_submission_failure_publishes_agent_error() {
    let generator = ScriptedGenerator::new().with_default(MockReply::success("not json at all"));
    let scripted = Scripted::new(generator, ScriptedEvidence::new());
    let runtime = runtime(&scripted, &test_config()).await;

    let mut events = runtime.events.subscribe();
    let err = runtime.hunter.submit_product(PRODUCT, None).await.unwrap_err();
    assert!(matches!(err, DomainError::MalformedResponse(_)));
    assert!(runtime.hunter.strategies().await.unwrap().is_empty());

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event.kind.event_type());
    }
    assert_eq!(last, Some("agent_error"));
}
