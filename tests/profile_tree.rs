//! Integration tests for profile structure and persistence.
//!
//! Builds trees through the public editing API, saves them through the JSON
//! store and checks that structure, order values and properties survive.

use keyglow::layer::{AnimationPolicy, LayerCondition, Operator};
use keyglow::{
    BrushSpec, Color, GradientStop, JsonProfileStore, LayerId, LayerType, LoadError,
    ProfileError, ProfileModel, ProfileStore,
};

fn orders(profile: &ProfileModel, group: &[LayerId]) -> Vec<i32> {
    group
        .iter()
        .map(|id| profile.layer(*id).unwrap().order)
        .collect()
}

fn names(profile: &ProfileModel) -> Vec<String> {
    profile
        .walk_pre_order()
        .into_iter()
        .map(|id| profile.layer(id).unwrap().name.clone())
        .collect()
}

/// Roots: "Glow" (key press), "Group" (folder with two children), "Base"
fn sample() -> ProfileModel {
    let mut profile = ProfileModel::new("Sample", "logitech-g810", "racing");
    profile.add_layer_of(None, LayerType::key_press(), "Glow");
    let group = profile.add_layer_of(None, LayerType::Folder, "Group");
    let rpm = profile.add_layer_of(Some(group), LayerType::Generic, "RPM");
    profile.add_layer_of(Some(group), LayerType::Generic, "Gear");
    let base = profile.add_layer_of(None, LayerType::Generic, "Base");

    let layer = profile.layer_mut(rpm).unwrap();
    layer.properties.x = 2;
    layer.properties.width = 10;
    layer.properties.brush = BrushSpec::horizontal(vec![
        GradientStop::new(0.0, Color::rgb(0, 255, 0)),
        GradientStop::new(1.0, Color::rgb(255, 0, 0)),
    ]);
    layer
        .properties
        .conditions
        .push(LayerCondition::new("rpm", Operator::Greater, 1000.0));
    layer.animation = AnimationPolicy::Pulse;

    profile.layer_mut(base).unwrap().properties.opacity = 0.25;
    profile
}

#[test]
fn store_round_trip_preserves_tree() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonProfileStore::new(dir.path());
    let original = sample();
    store.save(&original).unwrap();

    let loaded = store.load("racing", "logitech-g810", "Sample").unwrap();
    assert_eq!(names(&loaded), names(&original));
    assert_eq!(orders(&loaded, loaded.roots()), vec![0, 1, 2]);

    for id in original.walk_pre_order() {
        let (a, b) = (original.layer(id).unwrap(), loaded.layer(id).unwrap());
        assert_eq!(a.parent, b.parent);
        assert_eq!(a.children, b.children);
        assert_eq!(a.order, b.order);
        assert_eq!(a.properties, b.properties);
        assert_eq!(a.animation, b.animation);
        assert_eq!(a.kind.name(), b.kind.name());
    }
    assert_eq!(store.list("racing", "logitech-g810").unwrap(), vec!["Sample"]);
}

#[test]
fn ids_stay_unique_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonProfileStore::new(dir.path());
    store.save(&sample()).unwrap();

    let mut loaded = store.load("racing", "logitech-g810", "Sample").unwrap();
    let existing = loaded.walk_pre_order();
    let fresh = loaded.add_layer(None);
    assert!(!existing.contains(&fresh));
    loaded.validate().unwrap();
}

#[test]
fn clone_and_reorder_keep_groups_dense() {
    let mut profile = sample();
    let group = profile.roots()[1];
    let rpm = profile.layer(group).unwrap().children[0];

    let copy = profile.clone_layer(rpm).unwrap();
    let children = profile.layer(group).unwrap().children.clone();
    assert_eq!(children[0], copy);
    assert_eq!(children[1], rpm);
    assert_eq!(orders(&profile, &children), vec![0, 1, 2]);

    // Moving the first child up or the last child down changes nothing
    profile.reorder(copy, true);
    profile.reorder(*children.last().unwrap(), false);
    assert_eq!(profile.layer(group).unwrap().children, children);

    profile.fix_order();
    profile.fix_order();
    assert_eq!(orders(&profile, &children), vec![0, 1, 2]);
    profile.validate().unwrap();
}

#[test]
fn cloning_a_folder_copies_its_subtree() {
    let mut profile = sample();
    let group = profile.roots()[1];
    let copy = profile.clone_layer(group).unwrap();

    assert_eq!(profile.len(), 8);
    let copied = &profile.layer(copy).unwrap().children;
    assert_eq!(copied.len(), 2);
    for child in copied {
        assert_eq!(profile.layer(*child).unwrap().parent, Some(copy));
    }
    assert_eq!(orders(&profile, profile.roots()), vec![0, 1, 2, 3]);
    profile.validate().unwrap();
}

#[test]
fn removing_unknown_layer_changes_nothing() {
    let mut profile = ProfileModel::new("Three", "logitech-g810", "racing");
    for _ in 0..3 {
        profile.add_layer(None);
    }
    let before = orders(&profile, profile.roots());

    assert!(!profile.remove_layer(LayerId(999)));
    assert_eq!(profile.len(), 3);
    assert_eq!(orders(&profile, profile.roots()), before);
}

#[test]
fn corrupted_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonProfileStore::new(dir.path());
    let profile = sample();
    store.save(&profile).unwrap();

    // Point a root at a parent it is not listed under
    let path = store.path("racing", "logitech-g810", "Sample");
    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let layers = json["layers"].as_array_mut().unwrap();
    let base = layers
        .iter_mut()
        .find(|l| l["name"] == "Base")
        .unwrap();
    base["parent"] = serde_json::json!(2);
    std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

    let err = store.load("racing", "logitech-g810", "Sample").unwrap_err();
    assert!(matches!(err, LoadError::Invalid(ProfileError::RootHasParent(_))));
}
