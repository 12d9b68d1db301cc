//! Benchmarks for tech-stack normalization and mismatch evaluation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use recursive_hunter::domain::models::TechStack;
use recursive_hunter::services::mismatch_policy::{evaluate, evaluate_claims};

const SEARCH_SNIPPET: &str = "We moved our analytics pipeline from MySQL to MongoDB last year. \
    The platform runs on Kubernetes in AWS with a Go and Python backend, \
    Redis for caching and Terraform for provisioning.";

fn benchmark_normalization(c: &mut Criterion) {
    let claimed = ["PostgreSQL", "Golang", "Amazon Web Services", "K8s", "React", "Redis"];

    c.bench_function("tech_stack_from_terms", |b| {
        b.iter(|| TechStack::from_terms(black_box(claimed)))
    });

    c.bench_function("tech_stack_extract_from_text", |b| {
        b.iter(|| TechStack::extract_from_text(black_box(SEARCH_SNIPPET)))
    });
}

fn benchmark_evaluation(c: &mut Criterion) {
    let claimed = TechStack::from_terms(["Postgres", "Go", "AWS"]);
    let conflicting = TechStack::extract_from_text(SEARCH_SNIPPET);
    let agreeing = TechStack::from_terms(["postgres", "aws"]);
    let unrelated = TechStack::from_terms(["rails", "heroku"]);

    c.bench_function("evaluate_database_tier", |b| {
        b.iter(|| evaluate(black_box(&claimed), black_box(&conflicting)))
    });

    c.bench_function("evaluate_no_mismatch", |b| {
        b.iter(|| evaluate(black_box(&claimed), black_box(&agreeing)))
    });

    c.bench_function("evaluate_general_tier", |b| {
        b.iter(|| evaluate(black_box(&claimed), black_box(&unrelated)))
    });

    let raw_claims: Vec<String> = ["PostgreSQL", "Golang", "AWS"].iter().map(|s| (*s).to_string()).collect();
    c.bench_function("evaluate_raw_claims", |b| {
        b.iter(|| evaluate_claims(black_box(&raw_claims), black_box(&conflicting)))
    });
}

criterion_group!(benches, benchmark_normalization, benchmark_evaluation);
criterion_main!(benches);
