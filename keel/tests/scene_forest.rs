//! Scene-hierarchy usage of the forest: structure queries, pre-order
//! constraints and transform propagation over payloads holding resource
//! handles.

use keel::base::forest::VecForest;
use keel::base::slab::Handle;
use keel::resources::ResourcePool;

#[test]
fn pre_order_structure() {
    let mut forest = VecForest::new();
    forest.insert_as_root("A".to_string());
    assert!(forest.insert("B".to_string(), &"A".to_string()));
    assert!(forest.insert("C".to_string(), &"A".to_string()));
    assert!(forest.insert("D".to_string(), &"B".to_string()));

    assert_eq!(4, forest.branch_size(&"A".to_string()));
    assert_eq!(2, forest.branch_size(&"B".to_string()));
    assert_eq!(2, forest.children_count(&"A".to_string()));
    assert_eq!(1, forest.parent_offset(&"D".to_string()));

    let mut visited = vec![];
    forest.traverse_depth_first(|payload, _| visited.push(payload.clone()));

    let mut sorted = visited.clone();
    sorted.sort();
    assert_eq!(vec!["A", "B", "C", "D"], sorted);

    let position = |name: &str| visited.iter().position(|p| p == name).unwrap();
    assert!(position("B") < position("D"));
    assert!(position("A") < position("B"));
    assert!(position("A") < position("C"));
}

#[test]
fn transform_propagation_with_resource_handles() {
    struct Mesh {
        triangle_count: u32,
    }

    struct SceneNode {
        name: &'static str,
        local_translation: f32,
        world_translation: f32,
        mesh: Handle<Mesh>,
    }

    impl PartialEq for SceneNode {
        fn eq(
            &self,
            other: &Self,
        ) -> bool {
            self.name == other.name
        }
    }

    let meshes = ResourcePool::<Mesh>::new().unwrap();
    let body_mesh = meshes.add(Mesh { triangle_count: 80 }).unwrap();
    let wheel_mesh = meshes.add(Mesh { triangle_count: 20 }).unwrap();

    let node = |name, local_translation, mesh| SceneNode {
        name,
        local_translation,
        world_translation: 0.0,
        mesh,
    };
    let by_name = |name| node(name, 0.0, Handle::null());

    let mut scene = VecForest::new();
    scene.insert_as_root(node("car", 10.0, body_mesh));
    scene.insert(node("wheel", 2.0, wheel_mesh), &by_name("car"));
    scene.insert(node("hubcap", 0.5, Handle::null()), &by_name("wheel"));

    // Parents are finished before their children are visited
    scene.traverse_progressive_mut(|child, parent, _, _| {
        let base = parent.map_or(0.0, |p| p.world_translation);
        child.world_translation = base + child.local_translation;
    });

    let world_of = |scene: &VecForest<SceneNode>, name| {
        let index = scene.find_node_index(&by_name(name)).unwrap();
        scene.get_payload_at(index).world_translation
    };
    assert_eq!(10.0, world_of(&scene, "car"));
    assert_eq!(12.0, world_of(&scene, "wheel"));
    assert_eq!(12.5, world_of(&scene, "hubcap"));

    // Payloads carry handles the renderer resolves through the pool
    let wheel_index = scene.find_node_index(&by_name("wheel")).unwrap();
    let wheel_handle = scene.get_payload_at(wheel_index).mesh;
    assert_eq!(20, meshes.get(wheel_handle).unwrap().triangle_count);
}

#[test]
fn erase_branch_shrinks_by_subtree_size() {
    let mut forest = VecForest::new();
    forest.insert_as_root(1u32);
    forest.insert(2, &1);
    forest.insert(3, &2);
    forest.insert(4, &2);
    forest.insert(5, &1);

    let subtree = forest.branch_size(&2) as usize;
    let before = forest.size();
    assert!(forest.erase_branch(&2));
    assert_eq!(before - subtree, forest.size());
    assert!(!forest.contains(&3));
    assert!(!forest.contains(&4));
    assert!(forest.contains(&5));
}

#[test]
fn reparent_round_trip_keeps_structure_sound() {
    let mut forest = VecForest::new();
    forest.insert_as_root("root".to_string());
    forest.insert("left".to_string(), &"root".to_string());
    forest.insert("right".to_string(), &"root".to_string());
    forest.insert("leaf".to_string(), &"left".to_string());

    assert!(forest.reparent(&"leaf".to_string(), &"right".to_string()));
    assert_eq!(
        Some(&"right".to_string()),
        forest.get_parent(&"leaf".to_string())
    );

    assert!(forest.reparent(&"leaf".to_string(), &"left".to_string()));
    assert_eq!(
        Some(&"left".to_string()),
        forest.get_parent(&"leaf".to_string())
    );
    assert_eq!(4, forest.branch_size(&"root".to_string()));
    assert_eq!(2, forest.children_count(&"root".to_string()));
    assert_eq!(2, forest.branch_size(&"left".to_string()));
    assert_eq!(1, forest.branch_size(&"right".to_string()));
}
