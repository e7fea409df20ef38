//! End-to-end scenarios exercised through the public [`Engine`] facade.

use aggregator_search_core::{Engine, FuzzyOptions, MatchOptions, Term};

#[test]
fn near_distance_controls_whether_two_terms_are_considered_close() {
    let engine = Engine::default();
    let content = "the quick brown fox jumps over the lazy dog";
    let term1 = Term::literal("quick");
    let term2 = Term::literal("fox");

    assert!(engine.evaluate_near(content, &term1, &term2, 3, MatchOptions::default(), None));
    assert!(!engine.evaluate_near(content, &term1, &term2, 1, MatchOptions::default(), None));
}

#[test]
fn fuzzy_fallback_recovers_a_misspelled_near_term_only_when_enabled() {
    let engine = Engine::default();
    let content = "alpha beta gamma delta epsilon";
    // "alpa" is not a substring of "alpha", so this only succeeds through the
    // fuzzy matcher's edit-distance scan.
    let term1 = Term::literal("alpa");
    let term2 = Term::literal("gamma");

    assert!(!engine.evaluate_near(content, &term1, &term2, 10, MatchOptions::default(), None));

    let fuzzy_options = MatchOptions {
        fuzzy_enabled: true,
        ..MatchOptions::default()
    };
    assert!(engine.evaluate_near(content, &term1, &term2, 10, fuzzy_options, None));
}

#[test]
fn search_reports_zero_score_and_every_position_for_an_exact_match() {
    let engine = Engine::default();
    let content = "database user database user";
    let term = Term::literal("database");

    let result = engine.search(content, &term, FuzzyOptions::default());
    assert!(result.is_match);
    assert_eq!(result.score, Some(0.0));
    assert_eq!(result.match_positions, Some(vec![0, 14]));
}

#[test]
fn near_evaluation_handles_content_spanning_multiple_chunk_windows() {
    let engine = Engine::default();
    let mut content = "a".repeat(3_000_000);
    content.push_str(" needle ");
    content.push_str(&"b".repeat(3_000_000));

    let term1 = Term::literal("needle");
    let term2 = Term::literal("a");
    assert!(engine.evaluate_near(&content, &term1, &term2, 1, MatchOptions::default(), None));
}

#[test]
fn whole_word_option_restricts_matches_to_boundary_aligned_occurrences() {
    let engine = Engine::default();
    let content = "foobar foo bar";
    let term = Term::literal("foo");

    let options = FuzzyOptions {
        whole_word: true,
        ..FuzzyOptions::default()
    };
    let result = engine.search(content, &term, options);
    assert!(result.is_match);
    assert_eq!(result.match_positions, Some(vec![7]));
}

#[test]
fn a_path_is_flagged_problematic_after_three_recorded_timeouts_and_then_skipped() {
    let engine = Engine::default();
    let path = "docs/huge-file.md";
    assert!(!engine.should_skip(path));

    engine.record_timeout(path);
    assert!(!engine.should_skip(path));
    engine.record_timeout(path);
    assert!(!engine.should_skip(path));
    engine.record_timeout(path);
    assert!(engine.should_skip(path));

    let term1 = Term::literal("quick");
    let term2 = Term::literal("fox");
    assert!(!engine.evaluate_near(
        "the quick brown fox jumps over the lazy dog",
        &term1,
        &term2,
        3,
        MatchOptions::default(),
        Some(path),
    ));

    engine.reset_circuit();
    assert!(!engine.should_skip(path));
}

#[test]
fn regex_term_participates_in_near_evaluation() {
    let engine = Engine::default();
    let content = "the quick brown fox jumps over the lazy dog";
    let term1 = engine.compile_term(r"qu\w+", "").unwrap();
    let term2 = Term::literal("fox");
    assert!(engine.evaluate_near(content, &term1, &term2, 3, MatchOptions::default(), None));
}

#[test]
fn invalid_regex_source_surfaces_a_typed_error() {
    let engine = Engine::default();
    let err = engine.compile_term("(unclosed", "").unwrap_err();
    assert_eq!(err.category(), "invalid_regex");
}

#[test]
fn snapshot_and_clear_operations_round_trip_through_serde_json() {
    let engine = Engine::default();
    let term = Term::literal("fox");
    engine.search("the quick brown fox", &term, FuzzyOptions::default());

    let snapshot = engine.snapshot();
    let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
    assert!(json.contains("fuzzy_results") || json.contains("cache_stats"));

    engine.clear_caches();
    engine.clear_metrics();
    assert_eq!(engine.snapshot().metrics.search_evaluations, 0);
}
