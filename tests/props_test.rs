use beach_scene::{
    cgmath::{Deg, InnerSpace, Quaternion, Rotation3, Vector3, Vector4},
    config::PropKind,
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, SceneNode},
    },
    scene::props::{PropEvent, PropSlots, SlotState, place, settle},
};
use futures::executor::block_on;

#[test]
fn should_turn_a_successful_load_into_a_loaded_event() {
    let event = block_on(settle(PropKind::Boat, async { anyhow::Ok(7) }));
    match event {
        PropEvent::Loaded { kind, node } => {
            assert_eq!(kind, PropKind::Boat);
            assert_eq!(node, 7);
        }
        PropEvent::Failed { .. } => panic!("load should have succeeded"),
    }
}

#[test]
fn should_turn_a_failed_load_into_a_failed_event() {
    let event: PropEvent<u32> = block_on(settle(PropKind::Container, async {
        Err(anyhow::anyhow!("missing scene.gltf"))
    }));
    assert!(matches!(
        event,
        PropEvent::Failed {
            kind: PropKind::Container
        }
    ));
}

#[test]
fn should_fill_slots_independently() {
    let mut slots = PropSlots::new([PropKind::Boat, PropKind::Container, PropKind::PalmTree]);
    assert!(!slots.is_settled());
    assert_eq!(slots.state(PropKind::Boat), Some(SlotState::Pending));

    // the palm finishes first, the container fails
    assert!(slots.accept(PropEvent::Loaded {
        kind: PropKind::PalmTree,
        node: "palm",
    }));
    assert!(slots.accept(PropEvent::Failed {
        kind: PropKind::Container,
    }));
    assert!(!slots.is_settled());
    assert_eq!(slots.loaded().copied().collect::<Vec<_>>(), vec!["palm"]);

    assert!(slots.accept(PropEvent::Loaded {
        kind: PropKind::Boat,
        node: "boat",
    }));
    assert!(slots.is_settled());
    assert_eq!(slots.state(PropKind::Container), Some(SlotState::Failed));
    assert_eq!(slots.state(PropKind::Boat), Some(SlotState::Loaded));
    assert_eq!(slots.loaded().count(), 2);
}

#[test]
fn should_drop_events_without_a_pending_slot() {
    let mut slots = PropSlots::new([PropKind::Boat]);
    assert!(slots.accept(PropEvent::Loaded {
        kind: PropKind::Boat,
        node: 1,
    }));
    assert!(!slots.accept(PropEvent::Loaded {
        kind: PropKind::Boat,
        node: 2,
    }));
    assert!(!slots.accept(PropEvent::Failed {
        kind: PropKind::PalmTree,
    }));
    assert_eq!(slots.loaded().copied().collect::<Vec<_>>(), vec![1]);
    assert_eq!(slots.state(PropKind::PalmTree), None);
}

fn positions(node: &dyn SceneNode) -> Vec<Vector3<f32>> {
    node.get_world_transforms()
        .into_iter()
        .map(|world| world.w.truncate())
        .collect()
}

#[test]
fn should_place_one_copy_per_placement() {
    let mut model = ContainerNode::new(1);
    model.set_local_transform(0, Instance::from(Vector3::new(1.0, 0.0, 0.0)));

    let placements = [
        Instance {
            position: Vector3::new(10.0, 0.0, 0.0),
            scale: Vector3::new(2.0, 2.0, 2.0),
            ..Default::default()
        },
        Instance::from(Vector3::new(0.0, 0.0, 5.0)),
    ];
    let placed = place(Box::new(model), &placements);

    assert_eq!(placed.instance_count(), 2);
    let child = &placed.get_children()[0];
    assert_eq!(child.instance_count(), 2);
    let expected = [Vector3::new(12.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 5.0)];
    for (actual, expected) in positions(child.as_ref()).into_iter().zip(expected) {
        assert!((actual - expected).magnitude() < 1e-5, "{actual:?}");
    }
    let world = child.get_world_transforms()[0];
    assert!((world.x.truncate().magnitude() - 2.0).abs() < 1e-5);
    assert!((world.y.truncate().magnitude() - 2.0).abs() < 1e-5);
}

#[test]
fn should_compose_rotated_children_under_a_stretched_parent() {
    let mut door = ContainerNode::new(1);
    door.set_local_transform(
        0,
        Instance {
            position: Vector3::new(0.5, 0.0, 0.0),
            rotation: Quaternion::from_angle_y(Deg(90.0)),
            ..Default::default()
        },
    );
    let container = Instance {
        position: Vector3::new(0.0, 230.0, 3500.0),
        scale: Vector3::new(400.0, 200.0, 200.0),
        ..Default::default()
    };
    let placed = place(Box::new(door), &[container.clone()]);
    let door = &placed.get_children()[0];
    let local = door.get_local_transform(0).expect("the door has one instance");

    let world = door.get_world_transforms()[0];
    let expected = container.to_matrix() * local.to_matrix();
    let corner = Vector4::new(1.0, 0.0, 0.0, 1.0);
    let moved = (world * corner).truncate();
    assert!((moved - (expected * corner).truncate()).magnitude() < 1e-2, "{moved:?}");
    // the door's +x turns into -z and is stretched by the container's z scale
    assert!((moved - Vector3::new(200.0, 230.0, 3300.0)).magnitude() < 1e-2, "{moved:?}");
}

#[test]
fn should_keep_a_single_copy_without_placements() {
    let mut model = ContainerNode::new(1);
    model.set_local_transform(0, Instance::from(Vector3::new(0.0, 3.0, 0.0)));
    let placed = place(Box::new(model), &[]);

    assert_eq!(placed.instance_count(), 1);
    assert_eq!(
        positions(placed.get_children()[0].as_ref()),
        vec![Vector3::new(0.0, 3.0, 0.0)]
    );
}
