use beatline_core::chart::{Lane, TimedEvent, TimestampStream};
use beatline_core::config::{GravityConfig, Layout};
use beatline_core::field::{Playfield, TravelDirection};
use beatline_core::gameplay::gravity::{GravityCheck, GravityController};
use beatline_core::spawn::SpawnScheduler;

fn seeded() -> GravityConfig {
    GravityConfig {
        seed: Some(7),
        ..GravityConfig::default()
    }
}

fn controller() -> GravityController {
    GravityController::new(seeded(), true, 900.0, 0.0)
}

fn playfield() -> Playfield {
    Playfield::new(Layout::default(), 500.0)
}

fn place(field: &mut Playfield, lane: Lane, center_y: f32) {
    let id = field.spawn_note(lane, 0.0).unwrap();
    field.notes.get_mut(id).unwrap().set_center_y(center_y);
}

fn empty_scheduler() -> SpawnScheduler {
    SpawnScheduler::new(TimestampStream::default(), 1.55)
}

#[test]
fn test_first_switch_uses_normal_duration() {
    let state = controller().state();
    assert!(!state.active);
    assert!((15.0..=30.0).contains(&state.next_switch_at));
}

#[test]
fn test_empty_field_is_safe() {
    let gravity = controller();
    let field = playfield();
    assert!(gravity.is_safe_to_switch(10.0, None, &field.notes));
}

#[test]
fn test_pending_spawn_inside_guard_blocks_switch() {
    let gravity = controller();
    let field = playfield();

    assert!(!gravity.is_safe_to_switch(10.0, Some(10.5), &field.notes));
    assert!(!gravity.is_safe_to_switch(10.0, Some(11.0), &field.notes));
    assert!(gravity.is_safe_to_switch(10.0, Some(11.5), &field.notes));
}

#[test]
fn test_notes_must_sit_in_center_band() {
    let gravity = controller();

    let mut field = playfield();
    place(&mut field, Lane::Left, 450.0);
    place(&mut field, Lane::Right, 590.0);
    assert!(gravity.is_safe_to_switch(10.0, None, &field.notes));

    let mut field = playfield();
    place(&mut field, Lane::Left, 450.0);
    place(&mut field, Lane::Down, 650.0);
    assert!(!gravity.is_safe_to_switch(10.0, None, &field.notes));
}

#[test]
fn test_more_than_two_notes_is_unsafe() {
    let gravity = controller();
    let mut field = playfield();
    place(&mut field, Lane::Left, 450.0);
    place(&mut field, Lane::Down, 450.0);
    place(&mut field, Lane::Up, 450.0);

    assert!(!gravity.is_safe_to_switch(10.0, None, &field.notes));
}

#[test]
fn test_unsafe_switch_is_deferred() {
    let mut gravity = controller();
    let mut field = playfield();
    let due = gravity.state().next_switch_at;
    let scheduler = SpawnScheduler::new(
        TimestampStream::new([TimedEvent::new(due + 0.5, vec![Lane::Left])]),
        1.55,
    );

    let check = gravity.check(due, &scheduler, &mut field);
    assert_eq!(check, GravityCheck::Deferred { retry_at: due + 1.0 });
    assert_eq!(field.direction(), TravelDirection::Down);
    assert!(!gravity.state().active);
}

#[test]
fn test_guard_measures_to_spawn_instant_not_timestamp() {
    let due = controller().state().next_switch_at;
    let at = |ts: f64| {
        SpawnScheduler::new(TimestampStream::new([TimedEvent::new(ts, vec![Lane::Left])]), 1.55)
    };

    // Timestamp 1.6s out, but the note appears 50ms after the switch.
    let mut gravity = controller();
    let mut field = playfield();
    let check = gravity.check(due, &at(due + 1.6), &mut field);
    assert_eq!(check, GravityCheck::Deferred { retry_at: due + 1.0 });
    assert!(!field.is_gravity());

    // Spawns 1.45s after the switch.
    let mut gravity = controller();
    let mut field = playfield();
    let check = gravity.check(due, &at(due + 3.0), &mut field);
    assert!(matches!(check, GravityCheck::Toggled { active: true, .. }));
    assert!(field.is_gravity());
}

#[test]
fn test_switch_mirrors_lines_and_reverses_direction() {
    let mut gravity = controller();
    let mut field = playfield();
    let scheduler = empty_scheduler();
    let due = gravity.state().next_switch_at;

    assert_eq!(gravity.check(due - 0.1, &scheduler, &mut field), GravityCheck::Idle);

    match gravity.check(due, &scheduler, &mut field) {
        GravityCheck::Toggled { active, next_switch_at } => {
            assert!(active);
            assert!(next_switch_at >= due + 8.0 && next_switch_at <= due + 15.0);
        }
        other => panic!("expected a toggle, got {other:?}"),
    }
    assert!(field.is_gravity());
    assert_eq!(field.line(Lane::Left).unwrap().rect.top(), 50.0);

    // New notes start from the bottom edge.
    let id = field.spawn_note(Lane::Left, due).unwrap();
    assert_eq!(field.notes.get(id).unwrap().rect.top(), 900.0);

    // Leaving gravity draws a normal-mode duration.
    field.notes.take(id);
    let back = gravity.state().next_switch_at;
    match gravity.check(back, &scheduler, &mut field) {
        GravityCheck::Toggled { active, next_switch_at } => {
            assert!(!active);
            assert!(next_switch_at >= back + 15.0 && next_switch_at <= back + 30.0);
        }
        other => panic!("expected a toggle, got {other:?}"),
    }
    assert_eq!(field.line(Lane::Left).unwrap().rect.top(), 750.0);
}

#[test]
fn test_same_seed_same_schedule() {
    let a = GravityController::new(seeded(), true, 900.0, 0.0);
    let b = GravityController::new(seeded(), true, 900.0, 0.0);
    assert_eq!(a.state(), b.state());
}

#[test]
fn test_disabled_controller_never_toggles() {
    let mut gravity = GravityController::new(seeded(), false, 900.0, 0.0);
    let mut field = playfield();
    let scheduler = empty_scheduler();

    assert!(!gravity.is_enabled());
    assert_eq!(gravity.check(1_000.0, &scheduler, &mut field), GravityCheck::Idle);
    assert!(!field.is_gravity());
}
