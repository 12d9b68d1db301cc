//! Property tests for the tech-stack mismatch policy.

use proptest::prelude::*;
use proptest::sample::subsequence;

use recursive_hunter::domain::models::{TechStack, DATABASE_TECHNOLOGIES, TECH_VOCABULARY};
use recursive_hunter::services::mismatch_policy::{evaluate, MismatchTier};

fn any_stack() -> impl Strategy<Value = TechStack> {
    subsequence(TECH_VOCABULARY.to_vec(), 0..8).prop_map(TechStack::from_terms)
}

/// Two non-empty database sets with nothing in common, each padded with
/// arbitrary non-database tokens.
fn disjoint_database_claims() -> impl Strategy<Value = (TechStack, TechStack)> {
    let others: Vec<&str> = TECH_VOCABULARY
        .iter()
        .copied()
        .filter(|t| !DATABASE_TECHNOLOGIES.contains(t))
        .collect();
    (
        Just(DATABASE_TECHNOLOGIES.to_vec()).prop_shuffle(),
        1..DATABASE_TECHNOLOGIES.len(),
        subsequence(others.clone(), 0..4),
        subsequence(others, 0..4),
    )
        .prop_map(|(dbs, split, left_extra, right_extra)| {
            let (left, right) = dbs.split_at(split);
            (
                TechStack::from_terms(left.iter().chain(&left_extra)),
                TechStack::from_terms(right.iter().chain(&right_extra)),
            )
        })
}

proptest! {
    #[test]
    fn empty_evidence_never_mismatches(claimed in any_stack()) {
        let verdict = evaluate(&claimed, &TechStack::new());
        prop_assert!(!verdict.mismatch);
        prop_assert!(verdict.tier.is_none());
    }

    #[test]
    fn identical_stacks_never_mismatch(stack in any_stack()) {
        prop_assert!(!evaluate(&stack, &stack).mismatch);
    }

    #[test]
    fn disjoint_databases_hit_the_database_tier((claimed, found) in disjoint_database_claims()) {
        let verdict = evaluate(&claimed, &found);
        prop_assert!(verdict.mismatch);
        prop_assert_eq!(verdict.tier, Some(MismatchTier::Database));
        let details = verdict.details.unwrap_or_default();
        prop_assert!(details.starts_with("Claimed DB: "));
    }

    #[test]
    fn verdict_is_internally_consistent(claimed in any_stack(), found in any_stack()) {
        let verdict = evaluate(&claimed, &found);
        prop_assert_eq!(verdict.mismatch, verdict.tier.is_some());
        prop_assert_eq!(verdict.mismatch, verdict.details.is_some());

        let expected = {
            let (c, f) = (claimed.databases(), found.databases());
            let database = !c.is_empty() && !f.is_empty() && c.is_disjoint(&f);
            database || (!found.is_empty() && claimed.is_disjoint(&found))
        };
        prop_assert_eq!(verdict.mismatch, expected);
    }

    #[test]
    fn canonical_stacks_are_fixed_points(stack in any_stack()) {
        let again = TechStack::from_terms(stack.iter());
        prop_assert_eq!(again, stack);
    }
}
