use bevy::prelude::*;
use bevy_vizij_dance::{DanceCommand, DanceNotice, DanceRoot, VizijDance, VizijDancePlugin};
use vizij_dance_core::{DanceConfig, DanceEvent, ModelLibrary};

const SAMBA_JSON: &str = include_str!("../../vizij-dance-core/tests/fixtures/samba_dancing.json");

fn library() -> ModelLibrary {
    let mut lib = ModelLibrary::new();
    lib.insert_json(SAMBA_JSON).unwrap();
    lib
}

fn config() -> DanceConfig {
    let mut cfg = DanceConfig::default();
    cfg.variation.seed = Some(1);
    cfg
}

#[derive(Resource, Default)]
struct Seen(Vec<DanceEvent>);

fn collect(mut reader: EventReader<DanceNotice>, mut seen: ResMut<Seen>) {
    seen.0.extend(reader.read().map(|n| n.0.clone()));
}

#[test]
fn plugin_inserts_dance_resource() {
    let mut app = App::new();
    // it should insert VizijDance when the plugin is added
    app.add_plugins(MinimalPlugins)
        .add_plugins(VizijDancePlugin::new(config(), library()));

    assert!(app.world().get_resource::<VizijDance>().is_some());
}

#[test]
fn load_command_drives_bound_bones() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(VizijDancePlugin::new(config(), library()))
        .init_resource::<Seen>()
        .add_systems(Last, collect);

    let mut hips = Entity::PLACEHOLDER;
    app.world_mut()
        .spawn((DanceRoot, Name::new("Armature"), Transform::default()))
        .with_children(|p| {
            hips = p
                .spawn((Name::new("mixamorig:Hips"), Transform::default()))
                .id();
        });

    app.world_mut()
        .send_event(DanceCommand::LoadModel("Samba Dancing".into()));
    for _ in 0..5 {
        app.update();
    }

    let dance = app.world().resource::<VizijDance>();
    assert_eq!(dance.viewer.model_name(), Some("Samba Dancing"));
    assert_eq!(dance.viewer.controller().active_style(), Some("Samba Básico"));

    // rest and first key put the hips one unit up
    let tf = app.world().get::<Transform>(hips).unwrap();
    assert!((tf.translation.y - 1.0).abs() < 0.05, "hips at {}", tf.translation);

    let seen = &app.world().resource::<Seen>().0;
    assert!(seen.iter().any(|e| matches!(e, DanceEvent::ModelLoaded { dance: true, .. })));
}

#[test]
fn initial_model_is_loaded_on_build() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(
        VizijDancePlugin::new(config(), library()).with_initial_model("Samba Dancing"),
    );
    app.world_mut()
        .send_event(DanceCommand::SelectStyle("Samba Rock".into()));
    app.update();

    let dance = app.world().resource::<VizijDance>();
    assert!(dance.viewer.is_dance_model());
    assert_eq!(dance.viewer.controller().pending_style(), Some("Samba Rock"));
}

#[test]
fn invalid_config_keeps_events_registered() {
    let mut cfg = config();
    cfg.default_style = "Forró".into();
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(VizijDancePlugin::new(cfg, library()));

    assert!(app.world().get_resource::<VizijDance>().is_none());
    app.world_mut()
        .send_event(DanceCommand::LoadModel("Samba Dancing".into()));
    app.update();
    assert!(app.world().get_resource::<Events<DanceNotice>>().is_some());
}
