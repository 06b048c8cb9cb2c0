use std::thread;
use std::time::Duration;

use beatline_core::audio::SilentAudio;
use beatline_core::chart::{Lane, TimedEvent, TimestampStream};
use beatline_core::config::{Difficulty, GameConfig};
use beatline_core::gameplay::judge::{Judgment, Tier};
use beatline_core::gameplay::{run_fixed_rate, GravityCheck, Session, SessionState};
use beatline_core::input::events::InputCommand;
use beatline_core::input::InputQueue;
use beatline_core::time::{ManualTimeSource, SystemTimeSource};

/// 850 px/s moves a note spawned at top -100 onto the line (top 750) in exactly one second.
fn config() -> GameConfig {
    let mut config = GameConfig::default();
    config.speeds.base = 850.0;
    config.difficulty = Difficulty::Easy;
    config
}

/// Hard mode at the same 850 px/s, with a fixed gravity schedule.
fn hard_config() -> GameConfig {
    let mut config = config();
    config.difficulty = Difficulty::Hard;
    config.speeds.hard = 1.0;
    config.gravity.seed = Some(7);
    config
}

fn stream(events: &[(f64, Lane)]) -> TimestampStream {
    TimestampStream::new(events.iter().map(|&(ts, lane)| TimedEvent::new(ts, vec![lane])))
}

fn session(
    config: GameConfig,
    events: &[(f64, Lane)],
) -> (Session<ManualTimeSource, SilentAudio>, ManualTimeSource) {
    let source = ManualTimeSource::new(0.0);
    let session = Session::new(config, stream(events), source.clone(), SilentAudio::new()).unwrap();
    (session, source)
}

#[test]
fn test_single_note_perfect_hit() {
    let (mut session, source) = session(config(), &[(1.0, Lane::Left)]);
    assert!(session.playfield().lock().notes.is_empty());

    let report = session.tick().unwrap();
    assert_eq!(report.spawned.len(), 1);
    {
        let field = session.playfield();
        let field = field.lock();
        let note = field.notes.iter().next().unwrap();
        assert_eq!(note.lane, Lane::Left);
        assert_eq!(note.rect.top(), -100.0);
    }

    source.set(1.0);
    let report = session.tick().unwrap();
    assert!(report.missed.is_empty());
    {
        let field = session.playfield();
        let field = field.lock();
        let note = field.notes.iter().next().unwrap();
        assert_eq!(note.hitbox.center_y(), field.line(Lane::Left).unwrap().rect.center_y());
    }

    let judgment = session.press(Lane::Left).unwrap().expect("inline judgment");
    assert!(matches!(judgment, Judgment::Hit { tier: Tier::Perfect, .. }));
    assert_eq!(session.score().score, 100);
    assert_eq!(session.score().combo, 1);
    assert_eq!(session.visible_feedback().unwrap().label, "Perfect");

    let report = session.tick().unwrap();
    assert!(report.finished);
    assert_eq!(session.state(), SessionState::Finished);

    let summary = session.summary();
    assert_eq!(summary.score, 100);
    assert_eq!(summary.max_combo, 1);
    assert_eq!(summary.tiers.perfect, 1);
}

#[test]
fn test_note_passing_its_line_is_a_miss() {
    let (mut session, source) = session(config(), &[(1.0, Lane::Down)]);

    session.tick().unwrap();
    source.set(1.5);
    let report = session.tick().unwrap();

    assert_eq!(report.missed.len(), 1);
    assert_eq!(report.feedback.unwrap().label, "Miss");
    assert_eq!(session.score().misses, 1);
    assert_eq!(session.score().combo, 0);
    assert!(report.finished);

    // Finished sessions ignore input.
    assert_eq!(session.press(Lane::Down).unwrap(), None);
}

#[test]
fn test_press_on_empty_lane_counts_as_miss() {
    let (mut session, _source) = session(config(), &[(5.0, Lane::Left)]);
    session.tick().unwrap();

    let judgment = session.press(Lane::Right).unwrap().unwrap();
    assert!(!judgment.is_hit());
    assert_eq!(session.score().misses, 1);
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn test_pause_freezes_the_field() {
    let (mut session, source) = session(config(), &[(1.0, Lane::Left)]);
    session.tick().unwrap();

    source.set(0.5);
    session.tick().unwrap();
    session.pause();
    assert_eq!(session.state(), SessionState::Paused);

    source.set(3.0);
    let report = session.tick().unwrap();
    assert!(report.missed.is_empty());
    assert_eq!(session.press(Lane::Left).unwrap(), None);
    assert_eq!(session.elapsed(), 0.5);

    session.resume();
    assert_eq!(session.state(), SessionState::Running);
    source.set(3.5);
    session.tick().unwrap();

    // 0.5s paused-out, 1.0s of travel in total: the note sits on the line.
    let judgment = session.press(Lane::Left).unwrap().unwrap();
    assert!(matches!(judgment, Judgment::Hit { tier: Tier::Perfect, .. }));
}

#[test]
fn test_lane_without_sprite_skips_spawn() {
    let mut config = config();
    config.layout.note_sizes[Lane::Up] = None;
    let (mut session, _source) = session(config, &[(1.0, Lane::Up), (1.0, Lane::Left)]);

    let report = session.tick().unwrap();
    assert_eq!(report.spawned.len(), 1);
    assert_eq!(session.playfield().lock().notes.len(), 1);
}

#[test]
fn test_music_starts_after_delay() {
    let mut config = config();
    config.music_track = Some("song.ogg".into());
    let (mut session, source) = session(config, &[(30.0, Lane::Left)]);

    session.tick().unwrap();
    assert_eq!(session.audio().track(), None);

    source.set(5.0);
    session.tick().unwrap();
    assert_eq!(session.audio().track(), Some("song.ogg"));
    assert_eq!(session.audio().volume(), 0.3);
}

#[test]
fn test_pipeline_mode_judges_through_ticks() {
    let mut config = config();
    config.pipeline.enabled = true;
    config.pipeline.poll_timeout_ms = 5;
    let (mut session, source) = session(config, &[(1.0, Lane::Left)]);

    session.tick().unwrap();
    source.set(1.0);
    session.tick().unwrap();

    assert_eq!(session.press(Lane::Left).unwrap(), None);

    let mut judgments = Vec::new();
    for _ in 0..400 {
        let report = session.tick().unwrap();
        judgments.extend(report.judgments);
        if report.finished {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    assert_eq!(judgments.len(), 1);
    assert!(matches!(judgments[0], Judgment::Hit { tier: Tier::Perfect, .. }));
    assert_eq!(session.score().score, 100);
    assert_eq!(session.state(), SessionState::Finished);
}

#[test]
fn test_flush_waits_for_pipeline_judgments() {
    let mut config = config();
    config.pipeline.enabled = true;
    let (mut session, source) = session(config, &[(1.0, Lane::Left), (1.0, Lane::Down)]);

    session.tick().unwrap();
    source.set(1.0);
    session.tick().unwrap();
    session.press(Lane::Left).unwrap();
    session.press(Lane::Down).unwrap();

    let judgments = session.flush_judgments(Duration::from_secs(2)).unwrap();
    let lanes: Vec<Lane> = judgments.iter().map(Judgment::lane).collect();
    assert_eq!(lanes, vec![Lane::Left, Lane::Down]);
    assert_eq!(session.score().combo, 2);
    assert!(session.playfield().lock().notes.is_empty());
}

#[test]
fn test_flush_without_pipeline_is_noop() {
    let (mut session, _source) = session(config(), &[(1.0, Lane::Left)]);
    assert!(session.flush_judgments(Duration::from_millis(10)).unwrap().is_empty());
}

#[test]
fn test_pattern_mode_is_reproducible() {
    let mut config = config();
    config.pattern_mode = true;
    config.pattern_seed = Some(42);
    let events: Vec<(f64, Lane)> = (0..20).map(|i| (1.0 + i as f64 * 0.01, Lane::Left)).collect();

    let lanes = |config: GameConfig| {
        let (mut session, _source) = session(config, &events);
        session.tick().unwrap();
        let field = session.playfield();
        let field = field.lock();
        let lanes: Vec<Lane> = field.notes.iter().map(|n| n.lane).collect();
        lanes
    };

    let first = lanes(config.clone());
    assert!(!first.is_empty());
    assert_eq!(first, lanes(config));
}

#[test]
fn test_hard_enables_gravity() {
    let mut config = config();
    config.difficulty = Difficulty::Hard;
    config.gravity.seed = Some(1);
    let (session, _source) = session(config, &[]);

    assert!(session.gravity().next_switch_at.is_finite());
}

#[test]
fn test_run_fixed_rate_stops_on_quit() {
    let mut config = config();
    config.tick_rate = 240;
    let mut session = Session::new(
        config,
        stream(&[(60.0, Lane::Left)]),
        SystemTimeSource::new(),
        SilentAudio::new(),
    )
    .unwrap();
    let input = InputQueue::new();
    input.push(InputCommand::Press(Lane::Left));
    input.push(InputCommand::Quit);

    let summary = run_fixed_rate(&mut session, &input).unwrap();
    assert_eq!(summary.misses, 1);
    assert_eq!(session.state(), SessionState::Finished);
}

#[test]
fn test_run_fixed_rate_finishes_empty_stream() {
    let mut session = Session::new(
        config(),
        TimestampStream::default(),
        SystemTimeSource::new(),
        SilentAudio::new(),
    )
    .unwrap();

    let summary = run_fixed_rate(&mut session, &InputQueue::new()).unwrap();
    assert_eq!(summary.score, 0);
    assert_eq!(summary.difficulty, Difficulty::Easy);
}

#[test]
fn test_pipeline_feedback_uses_press_time() {
    let mut config = config();
    config.pipeline.enabled = true;
    let (mut session, source) = session(config, &[(1.0, Lane::Left), (1.0, Lane::Down)]);

    session.tick().unwrap();
    source.set(1.0);
    session.tick().unwrap();

    session.press(Lane::Left).unwrap();
    source.set(1.2);
    session.press(Lane::Down).unwrap();
    session.flush_judgments(Duration::from_secs(2)).unwrap();

    // 200ms apart: outside the chain window however the outcomes are collected.
    let feedback = session.score().last_feedback.clone().unwrap();
    assert_eq!(feedback.label, "Perfect");
    assert_eq!(feedback.at, 1.2);
}

#[test]
fn test_pipeline_presses_chain_even_when_collected_late() {
    let mut config = config();
    config.pipeline.enabled = true;
    let (mut session, source) = session(config, &[(1.0, Lane::Left), (1.0, Lane::Down)]);

    session.tick().unwrap();
    source.set(1.0);
    session.tick().unwrap();

    session.press(Lane::Left).unwrap();
    source.set(1.05);
    session.press(Lane::Down).unwrap();
    source.set(1.5);
    session.flush_judgments(Duration::from_secs(2)).unwrap();

    let feedback = session.score().last_feedback.clone().unwrap();
    assert_eq!(feedback.label, "Perfect x2 +200");
    assert_eq!(feedback.at, 1.05);
}

#[test]
fn test_gravity_waits_for_imminent_spawn() {
    let due = session(hard_config(), &[]).0.gravity().next_switch_at;
    // Not popped at `due` (1.6s ahead), but it enters the spawn window 50ms later.
    let (mut session, source) = session(hard_config(), &[(due + 1.6, Lane::Left)]);

    session.tick().unwrap();
    source.set(due);
    let report = session.tick().unwrap();

    assert!(report.spawned.is_empty());
    assert!(matches!(report.gravity, GravityCheck::Deferred { retry_at } if retry_at == due + 1.0));
    assert!(!session.playfield().lock().is_gravity());
    assert!(!session.gravity().active);
}

#[test]
fn test_gravity_switches_when_next_spawn_is_clear() {
    let due = session(hard_config(), &[]).0.gravity().next_switch_at;
    let (mut session, source) = session(hard_config(), &[(due + 3.0, Lane::Left)]);

    session.tick().unwrap();
    source.set(due);
    let report = session.tick().unwrap();

    assert!(matches!(report.gravity, GravityCheck::Toggled { active: true, .. }));
    assert!(session.playfield().lock().is_gravity());
}

#[test]
fn test_hit_and_miss_after_gravity_switch() {
    let due = session(hard_config(), &[]).0.gravity().next_switch_at;
    let (mut session, source) =
        session(hard_config(), &[(due + 3.0, Lane::Left), (due + 3.0, Lane::Down)]);

    session.tick().unwrap();
    source.set(due);
    session.tick().unwrap();
    assert!(session.playfield().lock().is_gravity());

    source.set(due + 1.4);
    assert!(session.tick().unwrap().spawned.is_empty());

    // Both notes spawn below the field and rise toward the mirrored lines (center y 100).
    source.set(due + 1.5);
    assert_eq!(session.tick().unwrap().spawned.len(), 2);

    source.set(due + 2.4);
    let report = session.tick().unwrap();
    assert!(report.missed.is_empty());

    let judgment = session.press(Lane::Left).unwrap().unwrap();
    assert!(matches!(judgment, Judgment::Hit { tier: Tier::Perfect, .. }));

    // The Down note keeps rising past its line.
    source.set(due + 3.5);
    let report = session.tick().unwrap();
    assert_eq!(report.missed.len(), 1);
    assert_eq!(session.score().score, 100);
    assert_eq!(session.score().misses, 1);
    assert!(report.finished);
}
