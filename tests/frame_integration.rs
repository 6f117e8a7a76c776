//! Integration tests for the structure registry and the frame tree.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test frame_integration
//! ```

use bevy_ecs::prelude::*;
use glam::{IVec3, Vec2};
use proptest::prelude::*;

use aberredcore::components::frame::{FrameSpace, Transform2D};
use aberredcore::components::structure::StructureKind;
use aberredcore::engine;
use aberredcore::error::EngineError;
use aberredcore::resources::engineconfig::EngineConfig;
use aberredcore::systems::frame::*;
use aberredcore::systems::object::{object_create, object_delete, object_frame_set};
use aberredcore::systems::structure::*;

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn setup() -> (World, Entity) {
    let mut world = World::new();
    let root = engine::init(&mut world, EngineConfig::new());
    (world, root)
}

fn new_frame(world: &mut World, position: IVec3) -> Entity {
    let frame = frame_create(world).expect("frame tree initialised");
    frame_position_set(world, frame, position);
    frame
}

// =============================================================================
// Composition
// =============================================================================

#[test]
fn child_scale_does_not_move_child() {
    let (mut world, root) = setup();
    let a = new_frame(&mut world, IVec3::new(10, 0, 0));
    let b = new_frame(&mut world, IVec3::new(0, 5, 0));
    frame_scale_set(&mut world, b, 2.0);
    frame_parent_set(&mut world, b, Some(a));

    assert_eq!(frame_parent_get(&world, a), Some(root));
    assert_eq!(frame_parent_get(&world, b), Some(a));
    // B's offset is scaled by A's global scale (1), not its own.
    assert_eq!(
        frame_position_get(&mut world, b, FrameSpace::Global),
        IVec3::new(10, 5, 0)
    );
    assert!(approx_eq(frame_scale_get(&mut world, b, FrameSpace::Global), 2.0));
    assert_eq!(
        frame_position_get(&mut world, b, FrameSpace::Local),
        IVec3::new(0, 5, 0)
    );

    // A grandchild does feel B's scale.
    let c = new_frame(&mut world, IVec3::new(3, 0, 0));
    frame_parent_set(&mut world, c, Some(b));
    assert_eq!(
        frame_position_get(&mut world, c, FrameSpace::Global),
        IVec3::new(16, 5, 0)
    );
}

#[test]
fn parent_rotation_rotates_offsets() {
    let (mut world, _) = setup();
    let a = new_frame(&mut world, IVec3::new(100, 0, 1));
    frame_rotation_set(&mut world, a, std::f32::consts::FRAC_PI_2);
    let b = new_frame(&mut world, IVec3::new(10, 0, 2));
    frame_parent_set(&mut world, b, Some(a));

    let global = frame_transform_get(&mut world, b, FrameSpace::Global).unwrap();
    assert_eq!(global.position, IVec3::new(100, 10, 3));
    assert!(approx_eq(global.rotation, std::f32::consts::FRAC_PI_2));
}

#[test]
fn root_is_immutable() {
    let (mut world, root) = setup();
    frame_position_set(&mut world, root, IVec3::new(5, 5, 5));
    assert_eq!(frame_position_get(&mut world, root, FrameSpace::Global), IVec3::ZERO);
    assert!(frame_delete(&mut world, root).is_err());
}

// =============================================================================
// Dirty propagation
// =============================================================================

#[test]
fn mutation_flags_whole_subtree_only() {
    let (mut world, root) = setup();
    let a = new_frame(&mut world, IVec3::ZERO);
    let b = new_frame(&mut world, IVec3::ZERO);
    let c = new_frame(&mut world, IVec3::ZERO);
    let other = new_frame(&mut world, IVec3::ZERO);
    frame_parent_set(&mut world, b, Some(a));
    frame_parent_set(&mut world, c, Some(b));
    frame_render_status_clean(&mut world);
    for f in [root, a, b, c, other] {
        assert!(frame_render_status_ok(&world, f));
    }

    frame_position_set(&mut world, a, IVec3::new(1, 2, 3));
    assert!(!frame_render_status_ok(&world, a));
    assert!(!frame_render_status_ok(&world, b));
    assert!(!frame_render_status_ok(&world, c));
    assert!(frame_render_status_ok(&world, other), "sibling untouched");
    assert!(frame_render_status_ok(&world, root), "ancestor untouched");

    // Reading globals does not clear render status, only the sweep does.
    assert_eq!(frame_position_get(&mut world, c, FrameSpace::Global), IVec3::new(1, 2, 3));
    assert!(!frame_render_status_ok(&world, c));
    frame_render_status_clean(&mut world);
    assert!(frame_render_status_ok(&world, c));

    // Re-parenting flags the moved subtree.
    frame_parent_set(&mut world, b, Some(other));
    assert!(!frame_render_status_ok(&world, b));
    assert!(!frame_render_status_ok(&world, c));
    assert!(frame_render_status_ok(&world, a));
}

// =============================================================================
// Tree edits
// =============================================================================

#[test]
fn cycle_is_refused() {
    let (mut world, root) = setup();
    let a = new_frame(&mut world, IVec3::ZERO);
    let b = new_frame(&mut world, IVec3::ZERO);
    frame_parent_set(&mut world, b, Some(a));
    frame_parent_set(&mut world, a, Some(b));
    assert_eq!(frame_parent_get(&world, a), Some(root));
    frame_parent_set(&mut world, a, Some(a));
    assert_eq!(frame_parent_get(&world, a), Some(root));
    assert!(structure_is_ancestor(&world, a, b));
    assert!(!structure_is_ancestor(&world, b, a));
}

#[test]
fn delete_moves_children_up() {
    let (mut world, _) = setup();
    let a = new_frame(&mut world, IVec3::new(10, 0, 0));
    let b = new_frame(&mut world, IVec3::ZERO);
    frame_scale_set(&mut world, b, 2.0);
    let c = new_frame(&mut world, IVec3::new(3, 0, 0));
    frame_parent_set(&mut world, b, Some(a));
    frame_parent_set(&mut world, c, Some(b));
    assert_eq!(frame_position_get(&mut world, c, FrameSpace::Global), IVec3::new(16, 0, 0));

    frame_delete(&mut world, b).unwrap();
    assert_eq!(frame_parent_get(&world, c), Some(a));
    assert_eq!(frame_position_get(&mut world, c, FrameSpace::Global), IVec3::new(13, 0, 0));
    assert!(world.get_entity(b).is_err());
}

#[test]
fn sibling_navigation() {
    let (mut world, root) = setup();
    let a = new_frame(&mut world, IVec3::ZERO);
    let b = new_frame(&mut world, IVec3::ZERO);
    let c = new_frame(&mut world, IVec3::ZERO);
    assert_eq!(structure_child_get(&world, root), Some(a));
    assert_eq!(structure_right_sibling_get(&world, a), Some(b));
    assert_eq!(structure_left_sibling_get(&world, c), Some(b));
    assert_eq!(structure_left_sibling_get(&world, a), None);
    assert_eq!(structure_right_sibling_get(&world, c), None);
}

// =============================================================================
// Registry and reference counting
// =============================================================================

#[test]
fn referenced_frame_cannot_be_deleted() {
    let (mut world, _) = setup();
    let frame = new_frame(&mut world, IVec3::ZERO);
    let object = object_create(&mut world);
    object_frame_set(&mut world, object, Some(frame)).unwrap();
    assert_eq!(structure_counter_get(&world, frame), 1);
    assert_eq!(frame_delete(&mut world, frame), Err(EngineError::StillReferenced(1)));

    object_delete(&mut world, object).unwrap();
    assert_eq!(structure_counter_get(&world, frame), 0);
    assert!(frame_delete(&mut world, frame).is_ok());
}

#[test]
fn registry_iterates_each_kind() {
    let (mut world, root) = setup();
    let a = new_frame(&mut world, IVec3::ZERO);
    let b = new_frame(&mut world, IVec3::ZERO);
    let object = object_create(&mut world);

    let mut frames = Vec::new();
    let mut current = structure_first_get(&world, StructureKind::Frame);
    while let Some(f) = current {
        frames.push(f);
        current = structure_next_get(&world, f);
    }
    assert_eq!(frames, vec![root, a, b]);
    assert_eq!(structure_first_get(&world, StructureKind::Object), Some(object));
    assert_eq!(structure_kind_get(&world, object), Some(StructureKind::Object));

    // Swap-remove: the last frame takes the deleted one's place.
    frame_delete(&mut world, a).unwrap();
    assert_eq!(structure_next_get(&world, root), Some(b));
    assert_eq!(structure_next_get(&world, b), None);
}

#[test]
fn scroll_is_inherited_from_nearest_ancestor() {
    let (mut world, _) = setup();
    let a = new_frame(&mut world, IVec3::ZERO);
    let b = new_frame(&mut world, IVec3::ZERO);
    frame_parent_set(&mut world, b, Some(a));
    assert!(frame_scroll_effective_get(&world, b).is_none());

    frame_scroll_set(&mut world, a, Vec2::new(0.5, 0.0));
    let scroll = frame_scroll_effective_get(&world, b).unwrap();
    assert_eq!(scroll.x, Some(0.5));
    assert_eq!(scroll.y, None);
    assert_eq!(frame_scroll_get(&world, b), Vec2::ZERO);

    frame_scroll_set(&mut world, b, Vec2::new(2.0, 2.0));
    assert_eq!(frame_scroll_effective_get(&world, b).unwrap().x, Some(2.0));
}

// =============================================================================
// Lazy versus eager composition
// =============================================================================

/// Global transform recomputed from scratch along the parent chain.
fn eager_global(world: &mut World, frame: Entity) -> Transform2D {
    let local = frame_transform_get(world, frame, FrameSpace::Local).unwrap();
    match frame_parent_get(world, frame) {
        Some(parent) => local.compose(&eager_global(world, parent)),
        None => local,
    }
}

#[derive(Clone, Debug)]
enum Op {
    Position(usize, i32, i32, i32),
    Rotation(usize, f32),
    Scale(usize, f32),
    Parent(usize, Option<usize>),
    Read(usize),
}

fn op_strategy(n: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..n, -100i32..100, -100i32..100, -10i32..10).prop_map(|(f, x, y, z)| Op::Position(f, x, y, z)),
        (0..n, -3.2f32..3.2).prop_map(|(f, r)| Op::Rotation(f, r)),
        (0..n, 0.25f32..4.0).prop_map(|(f, s)| Op::Scale(f, s)),
        (0..n, prop::option::of(0..n)).prop_map(|(f, p)| Op::Parent(f, p)),
        (0..n).prop_map(Op::Read),
    ]
}

proptest! {
    #[test]
    fn lazy_matches_eager(ops in prop::collection::vec(op_strategy(6), 1..60)) {
        let (mut world, _) = setup();
        let frames: Vec<Entity> = (0..6).map(|_| new_frame(&mut world, IVec3::ZERO)).collect();
        for op in ops {
            match op {
                Op::Position(f, x, y, z) => frame_position_set(&mut world, frames[f], IVec3::new(x, y, z)),
                Op::Rotation(f, r) => frame_rotation_set(&mut world, frames[f], r),
                Op::Scale(f, s) => frame_scale_set(&mut world, frames[f], s),
                Op::Parent(f, p) => frame_parent_set(&mut world, frames[f], p.map(|i| frames[i])),
                Op::Read(f) => {
                    let lazy = frame_transform_get(&mut world, frames[f], FrameSpace::Global).unwrap();
                    let eager = eager_global(&mut world, frames[f]);
                    prop_assert_eq!(lazy, eager);
                }
            }
        }
        for &f in &frames {
            let lazy = frame_transform_get(&mut world, f, FrameSpace::Global).unwrap();
            let eager = eager_global(&mut world, f);
            prop_assert_eq!(lazy, eager);
        }
    }
}
