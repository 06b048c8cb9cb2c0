use beatline_core::error::ErrorKind;
use beatline_core::field::NoteId;
use beatline_core::gameplay::judge::Tier;
use beatline_core::gameplay::score::{multiplier_for, ComboScorer, Rgb, ScoreEvent};

fn perfect(id: u64) -> ScoreEvent {
    ScoreEvent::Hit { note: NoteId(id), tier: Tier::Perfect, base_score: 100 }
}

const MISS: ScoreEvent = ScoreEvent::Miss { resolved: None };

#[test]
fn test_multiplier_boundaries() {
    assert_eq!(multiplier_for(0), 1);
    assert_eq!(multiplier_for(99), 1);
    assert_eq!(multiplier_for(100), 2);
    assert_eq!(multiplier_for(199), 2);
    assert_eq!(multiplier_for(200), 3);
    assert_eq!(multiplier_for(299), 3);
    assert_eq!(multiplier_for(300), 4);
}

#[test]
fn test_two_misses_then_perfect() {
    let mut scorer = ComboScorer::new(0.1);

    scorer.apply(MISS, 0.0).unwrap();
    scorer.apply(MISS, 1.0).unwrap();
    let state = scorer.state();
    assert_eq!(state.combo, 0);
    assert_eq!(state.misses, 2);

    scorer.apply(perfect(0), 2.0).unwrap();
    let state = scorer.state();
    assert_eq!(state.combo, 1);
    assert_eq!(state.score, 100);
    assert_eq!(state.tiers.miss, 2);
}

#[test]
fn test_150_consecutive_perfects() {
    let mut scorer = ComboScorer::new(0.1);
    let mut last_score = 0;

    for i in 0..150u64 {
        scorer.apply(perfect(i), i as f64).unwrap();
        let state = scorer.state();
        let gained = state.score - last_score;
        // Combo before this hit was `i`
        let expected = if i >= 100 { 200 } else { 100 };
        assert_eq!(gained, expected, "hit {i}");
        last_score = state.score;
    }

    let state = scorer.state();
    assert_eq!(state.combo, 150);
    assert_eq!(state.max_combo, 150);
    assert_eq!(state.score, 100 * 100 + 50 * 200);
}

#[test]
fn test_miss_resets_combo_but_keeps_max() {
    let mut scorer = ComboScorer::new(0.1);
    for i in 0..5 {
        scorer.apply(perfect(i), i as f64).unwrap();
    }
    let score = scorer.state().score;
    let feedback = scorer.apply(MISS, 10.0).unwrap();

    let state = scorer.state();
    assert_eq!(state.combo, 0);
    assert_eq!(state.max_combo, 5);
    assert_eq!(state.score, score);
    assert_eq!(feedback.label, "Miss");
    assert_eq!(feedback.color, Rgb::GREY);
}

#[test]
fn test_chained_feedback() {
    let mut scorer = ComboScorer::new(0.1);

    let first = scorer.apply(perfect(0), 1.0).unwrap();
    assert_eq!(first.label, "Perfect");
    assert_eq!(first.color, Rgb::GREEN);

    let second = scorer.apply(perfect(1), 1.05).unwrap();
    assert_eq!(second.label, "Perfect x2 +200");

    let third = scorer
        .apply(ScoreEvent::Hit { note: NoteId(2), tier: Tier::Good, base_score: 50 }, 1.1)
        .unwrap();
    assert_eq!(third.label, "Good x3 +250");
    assert_eq!(third.color, Rgb::YELLOW);

    // Outside the window: a new chain starts.
    let fourth = scorer.apply(perfect(3), 2.0).unwrap();
    assert_eq!(fourth.label, "Perfect");
}

#[test]
fn test_miss_breaks_chain() {
    let mut scorer = ComboScorer::new(0.1);

    scorer.apply(perfect(0), 1.0).unwrap();
    scorer.apply(MISS, 1.02).unwrap();
    let feedback = scorer.apply(perfect(1), 1.04).unwrap();
    assert_eq!(feedback.label, "Perfect");
}

#[test]
fn test_feedback_visibility() {
    let mut scorer = ComboScorer::new(0.1);
    let feedback = scorer.apply(perfect(0), 3.0).unwrap();

    assert!(feedback.is_visible(3.4, 0.5));
    assert!(!feedback.is_visible(3.5, 0.5));
}

#[test]
fn test_double_judgment_is_an_invariant_violation() {
    let mut scorer = ComboScorer::new(0.1);
    scorer.apply(perfect(7), 0.0).unwrap();

    let err = scorer.apply(perfect(7), 0.5).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invariant);
    assert!(!err.kind.is_recoverable());

    // State is untouched by the rejected event
    let state = scorer.state();
    assert_eq!(state.score, 100);
    assert_eq!(state.combo, 1);
}

#[test]
fn test_hit_after_line_miss_is_rejected() {
    let mut scorer = ComboScorer::new(0.1);
    scorer.apply(ScoreEvent::Miss { resolved: Some(NoteId(3)) }, 0.0).unwrap();

    let err = scorer.apply(perfect(3), 0.1).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invariant);
    assert_eq!(scorer.state().score, 0);
}

#[test]
fn test_score_never_decreases() {
    let mut scorer = ComboScorer::new(0.1);
    let pattern = [true, true, false, true, false, false, true, true, true];
    let mut last = 0;

    for (i, &hit) in pattern.iter().enumerate() {
        let combo_before = scorer.state().combo;
        if hit {
            scorer.apply(perfect(i as u64), i as f64).unwrap();
            assert_eq!(scorer.state().combo, combo_before + 1);
        } else {
            scorer.apply(MISS, i as f64).unwrap();
            assert_eq!(scorer.state().combo, 0);
        }
        assert!(scorer.state().score >= last);
        last = scorer.state().score;
    }
}
