//! Integration tests for anims, animsets and anim pointer playback.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test anim_integration
//! ```

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;
use glam::Vec2;

use aberredcore::backend::{GraphicsBackend, RecordingBackend};
use aberredcore::components::linktable::{LinkId, LinkProperty};
use aberredcore::engine;
use aberredcore::error::EngineError;
use aberredcore::events::anim::{AnimEvent, AnimEventKind};
use aberredcore::resources::engineconfig::EngineConfig;
use aberredcore::systems::anim::*;
use aberredcore::systems::animpointer::*;
use aberredcore::systems::animset::*;
use aberredcore::systems::structure::structure_counter_get;
use aberredcore::systems::texture::{texture_create, texture_delete};
use aberredcore::systems::time::{game_time_get, update_world_time};

struct Fixture {
    world: World,
    textures: [Entity; 2],
    set: Entity,
}

/// Animset with anim 0 (180 ms) and anim 1 (120 ms), no links yet.
fn fixture() -> Fixture {
    let mut world = World::new();
    engine::init(&mut world, EngineConfig::new());
    let mut backend = RecordingBackend::new(Vec2::new(320.0, 200.0));
    let bitmaps = [
        backend.bitmap_create(Vec2::new(16.0, 16.0)),
        backend.bitmap_create(Vec2::new(16.0, 16.0)),
    ];
    let textures = bitmaps.map(|b| texture_create(&mut world, &backend, b).unwrap());

    let walk = anim_create(&mut world, 4).unwrap();
    anim_name_set(&mut world, walk, "walk");
    anim_key_add(&mut world, walk, textures[0], 90).unwrap();
    anim_key_add(&mut world, walk, textures[1], 180).unwrap();
    let jump = anim_create(&mut world, 4).unwrap();
    anim_name_set(&mut world, jump, "jump");
    anim_key_add(&mut world, jump, textures[1], 120).unwrap();

    let set = animset_create(&mut world, 4).unwrap();
    assert_eq!(animset_anim_add(&mut world, set, walk), Ok(0));
    assert_eq!(animset_anim_add(&mut world, set, jump), Ok(1));
    Fixture { world, textures, set }
}

/// Ping-pong links at priority 5, the way back limited to two uses.
fn link_ping_pong(world: &mut World, set: Entity) {
    let forth = animset_link_add(world, set, 0, 1).unwrap();
    let back = animset_link_add(world, set, 1, 0).unwrap();
    for link in [forth, back] {
        animset_link_property_set(world, set, link, LinkProperty::Priority, 5).unwrap();
    }
    animset_link_property_set(world, set, back, LinkProperty::LoopCounter, 2).unwrap();
}

fn record_events(world: &mut World) -> Arc<Mutex<Vec<AnimEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    world.add_observer(move |trigger: On<AnimEvent>| {
        events_clone.lock().unwrap().push(*trigger.event());
    });
    world.flush();
    events
}

// =============================================================================
// Anims
// =============================================================================

#[test]
fn anim_keys_count_their_textures() {
    let Fixture { mut world, textures, set } = fixture();
    let walk = animset_anim_get(&world, set, 0).unwrap();
    assert_eq!(anim_duration(&world, walk), 180);
    assert_eq!(anim_key_count(&world, walk), 2);
    assert_eq!(anim_texture_compute(&world, walk, 50), Some(textures[0]));
    assert_eq!(anim_texture_compute(&world, walk, 91), Some(textures[1]));
    assert_eq!(anim_texture_compute(&world, walk, 181), None);

    assert_eq!(structure_counter_get(&world, textures[1]), 2);
    assert!(matches!(
        anim_key_add(&mut world, walk, textures[0], 180),
        Err(EngineError::InvalidTimestamp { .. })
    ));
    assert_eq!(texture_delete(&mut world, textures[1]), Err(EngineError::StillReferenced(2)));

    assert_eq!(anim_key_remove(&mut world, walk), Some(textures[1]));
    assert_eq!(anim_duration(&world, walk), 90);
    assert_eq!(structure_counter_get(&world, textures[1]), 1);
}

#[test]
fn anims_are_found_by_name() {
    let Fixture { world, set, .. } = fixture();
    assert_eq!(animset_anim_find_by_name(&world, set, "jump"), Some(1));
    assert_eq!(animset_anim_find_by_name(&world, set, "run"), None);
    assert_eq!(animset_anim_count(&world, set), 2);
}

// =============================================================================
// Playback
// =============================================================================

#[test]
fn ping_pong_playback_carries_leftover_time() {
    let Fixture { mut world, set, .. } = fixture();
    link_ping_pong(&mut world, set);
    let events = record_events(&mut world);
    let pointer = animpointer_create(&mut world, set).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(0));

    animpointer_compute(&mut world, pointer, 200).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(1));
    assert_eq!(animpointer_time_get(&world, pointer), 20);

    animpointer_compute(&mut world, pointer, 340).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(0));
    assert_eq!(animpointer_time_get(&world, pointer), 40);

    let kinds: Vec<(AnimEventKind, u32)> = events.lock().unwrap().iter().map(|e| (e.kind, e.anim)).collect();
    assert_eq!(
        kinds,
        vec![
            (AnimEventKind::Stop, 0),
            (AnimEventKind::Start, 1),
            (AnimEventKind::Stop, 1),
            (AnimEventKind::Start, 0),
        ]
    );
    assert!(events.lock().unwrap().iter().all(|e| e.pointer == pointer));
}

#[test]
fn exhausted_loop_counter_stops_the_pointer() {
    let Fixture { mut world, set, .. } = fixture();
    link_ping_pong(&mut world, set);
    let pointer = animpointer_create(&mut world, set).unwrap();

    // 0 -> 1 -> 0 -> 1 -> 0 -> 1, the way back is now used up.
    animpointer_compute(&mut world, pointer, 180 + 120 + 180 + 120 + 180 + 50).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(1));
    assert_eq!(animpointer_time_get(&world, pointer), 50);

    animpointer_compute(&mut world, pointer, 980).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), None);
    assert_eq!(animpointer_texture_get(&world, pointer), None);
    assert_eq!(
        animpointer_compute(&mut world, pointer, 1000),
        Err(EngineError::NoCurrentAnim)
    );

    // Counters are consumed on the pointer's own copy of the table.
    let back = LinkId { src: 1, dst: 0 };
    assert!(!animset_is_static(&world, set));
    assert_eq!(
        animset_link_property_get(&world, set, back, LinkProperty::LoopCounter),
        Some(2)
    );
    let other = animpointer_create(&mut world, set).unwrap();
    animpointer_compute(&mut world, other, 180 + 120 + 10).unwrap();
    assert_eq!(animpointer_anim_get(&world, other), Some(0));
}

#[test]
fn unlimited_self_link_loops() {
    let Fixture { mut world, set, .. } = fixture();
    animset_link_add(&mut world, set, 0, 0).unwrap();
    assert!(animset_is_static(&world, set));
    let events = record_events(&mut world);
    let pointer = animpointer_create(&mut world, set).unwrap();

    animpointer_compute(&mut world, pointer, 180 * 3 + 7).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(0));
    assert_eq!(animpointer_time_get(&world, pointer), 7);
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.kind == AnimEventKind::Loop && e.anim == 0));
}

#[test]
fn one_large_step_reports_every_transition() {
    let Fixture { mut world, set, .. } = fixture();
    link_ping_pong(&mut world, set);
    let events = record_events(&mut world);
    let pointer = animpointer_create(&mut world, set).unwrap();

    // 0 -> 1 -> 0 in a single compute is not a loop.
    animpointer_compute(&mut world, pointer, 180 + 120 + 10).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(0));
    assert_eq!(animpointer_time_get(&world, pointer), 10);

    let kinds: Vec<(AnimEventKind, u32)> = events.lock().unwrap().iter().map(|e| (e.kind, e.anim)).collect();
    assert_eq!(
        kinds,
        vec![
            (AnimEventKind::Stop, 0),
            (AnimEventKind::Start, 1),
            (AnimEventKind::Stop, 1),
            (AnimEventKind::Start, 0),
        ]
    );
}

#[test]
fn earlier_timestamp_plays_nothing() {
    let Fixture { mut world, set, .. } = fixture();
    link_ping_pong(&mut world, set);
    let pointer = animpointer_create(&mut world, set).unwrap();
    animpointer_compute(&mut world, pointer, 200).unwrap();
    assert_eq!(animpointer_time_get(&world, pointer), 20);

    animpointer_compute(&mut world, pointer, 150).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(1));
    assert_eq!(animpointer_time_get(&world, pointer), 20);

    animpointer_compute(&mut world, pointer, 230).unwrap();
    assert_eq!(animpointer_time_get(&world, pointer), 50);
}

#[test]
fn destination_mode_follows_best_route() {
    let Fixture { mut world, set, textures } = fixture();
    let land = anim_create(&mut world, 1).unwrap();
    anim_key_add(&mut world, land, textures[0], 100).unwrap();
    assert_eq!(animset_anim_add(&mut world, set, land), Ok(2));
    animset_link_add(&mut world, set, 0, 1).unwrap();
    animset_link_add(&mut world, set, 1, 2).unwrap();
    animset_link_add(&mut world, set, 2, 2).unwrap();
    let jump_loop = animset_link_add(&mut world, set, 1, 1).unwrap();
    animset_link_property_set(&mut world, set, jump_loop, LinkProperty::Priority, 15).unwrap();

    let pointer = animpointer_create(&mut world, set).unwrap();
    animpointer_destination_set(&mut world, pointer, Some(2)).unwrap();
    assert_eq!(animpointer_destination_get(&world, pointer), Some(2));
    animpointer_compute(&mut world, pointer, 180 + 120 + 30).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(2));
    assert_eq!(animpointer_time_get(&world, pointer), 30);
    assert_eq!(animpointer_destination_get(&world, pointer), None);

    // Back in auto mode the high priority self link on 1 wins.
    animpointer_anim_set(&mut world, pointer, 1).unwrap();
    let now = game_time_get(&world);
    animpointer_compute(&mut world, pointer, now + 250).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(1));
    assert_eq!(animpointer_time_get(&world, pointer), 10);

    assert_eq!(
        animpointer_destination_set(&mut world, pointer, Some(3)),
        Err(EngineError::InvalidAnim(3))
    );
}

#[test]
fn anim_set_cuts_and_restarts() {
    let Fixture { mut world, set, .. } = fixture();
    link_ping_pong(&mut world, set);
    let pointer = animpointer_create(&mut world, set).unwrap();
    animpointer_compute(&mut world, pointer, 100).unwrap();
    let events = record_events(&mut world);

    animpointer_anim_set(&mut world, pointer, 1).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(1));
    assert_eq!(animpointer_time_get(&world, pointer), 0);
    let kinds: Vec<AnimEventKind> = events.lock().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![AnimEventKind::Cut, AnimEventKind::Start]);

    assert_eq!(animpointer_anim_set(&mut world, pointer, 3), Err(EngineError::InvalidAnim(3)));

    // Setting the time catches up immediately.
    animpointer_time_set(&mut world, pointer, 130).unwrap();
    assert_eq!(animpointer_anim_get(&world, pointer), Some(0));
    assert_eq!(animpointer_time_get(&world, pointer), 10);
}

#[test]
fn frequency_scales_and_pause_skips_time() {
    let Fixture { mut world, set, .. } = fixture();
    let pointer = animpointer_create(&mut world, set).unwrap();
    animpointer_frequency_set(&mut world, pointer, 2.0).unwrap();
    assert_eq!(animpointer_frequency_get(&world, pointer), 2.0);
    assert!(animpointer_frequency_set(&mut world, pointer, -1.0).is_err());
    assert!(animpointer_frequency_set(&mut world, pointer, f32::NAN).is_err());

    update_world_time(&mut world, 0.05);
    assert_eq!(game_time_get(&world), 50);
    let now = game_time_get(&world);
    animpointer_update_all(&mut world, now);
    assert_eq!(animpointer_time_get(&world, pointer), 100);

    animpointer_pause(&mut world, pointer, true).unwrap();
    assert!(animpointer_is_paused(&world, pointer));
    update_world_time(&mut world, 0.1);
    let now = game_time_get(&world);
    animpointer_update_all(&mut world, now);
    assert_eq!(animpointer_time_get(&world, pointer), 100);

    animpointer_pause(&mut world, pointer, false).unwrap();
    update_world_time(&mut world, 0.02);
    let now = game_time_get(&world);
    animpointer_update_all(&mut world, now);
    assert_eq!(animpointer_time_get(&world, pointer), 140);
}

// =============================================================================
// Reference lock
// =============================================================================

#[test]
fn pointers_lock_structural_edits() {
    let Fixture { mut world, set, textures } = fixture();
    let forth = animset_link_add(&mut world, set, 0, 1).unwrap();
    assert_eq!(animset_link_add(&mut world, set, 0, 1), Err(EngineError::LinkExists { src: 0, dst: 1 }));

    let pointer = animpointer_create(&mut world, set).unwrap();
    assert!(animset_is_locked(&world, set));
    assert_eq!(structure_counter_get(&world, set), 1);

    let extra = anim_create(&mut world, 1).unwrap();
    anim_key_add(&mut world, extra, textures[0], 10).unwrap();
    assert_eq!(animset_anim_add(&mut world, set, extra), Err(EngineError::AnimSetLocked));
    assert_eq!(animset_anim_remove(&mut world, set, 1), Err(EngineError::AnimSetLocked));
    assert_eq!(animset_link_add(&mut world, set, 1, 0), Err(EngineError::AnimSetLocked));
    assert_eq!(animset_link_remove(&mut world, set, forth), Err(EngineError::AnimSetLocked));
    assert_eq!(animset_delete(&mut world, set), Err(EngineError::StillReferenced(1)));

    // Property edits stay allowed.
    animset_link_property_set(&mut world, set, forth, LinkProperty::Priority, 12).unwrap();
    assert_eq!(
        animset_link_property_get(&world, set, forth, LinkProperty::Priority),
        Some(12)
    );

    animpointer_delete(&mut world, pointer).unwrap();
    assert!(!animset_is_locked(&world, set));
    assert_eq!(animset_link_add(&mut world, set, 1, 0).map(|l| l.src), Ok(1));
    assert_eq!(animset_anim_add(&mut world, set, extra), Ok(2));
}

#[test]
fn pointer_needs_anim_zero() {
    let mut world = World::new();
    engine::init(&mut world, EngineConfig::new());
    let set = animset_create(&mut world, 2).unwrap();
    assert_eq!(animpointer_create(&mut world, set), Err(EngineError::InvalidAnim(0)));
    assert!(!animset_is_locked(&world, set));
    assert!(animset_create(&mut world, 0).is_err());
    assert!(anim_create(&mut world, 257).is_err());
}

#[test]
fn exit_releases_everything() {
    let Fixture { mut world, set, .. } = fixture();
    link_ping_pong(&mut world, set);
    let pointer = animpointer_create(&mut world, set).unwrap();
    let walk = animset_anim_get(&world, set, 0).unwrap();
    engine::exit(&mut world);
    for entity in [pointer, set, walk] {
        assert!(world.get_entity(entity).is_err());
    }
    assert_eq!(game_time_get(&world), 0);
}
