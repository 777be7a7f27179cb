use dread_randomiser_core::static_fixes::DOOR_FIX_LEVELS;
use dread_randomiser_core::world::{
    actor_link, Actor, BoundingBox, Component, MapBlockage, Scenario, ScenarioMap, SubareaManager,
    SubareaSetup,
};
use dread_randomiser_core::{path_for_level, ActorLocator, Asset, Pickup, PickupKind, ProjectEditor, Resource, TextTable};

pub const ONE_SIDED_DOOR: &str =
    "actordef:actors/props/doorpowerpower/charclasses/doorpowerpower.bmsad";
pub const SHIELD_CLASS: &str =
    "actordef:actors/props/doorshield/charclasses/doorshield.bmsad";

pub fn level_package(level: &str) -> String {
    format!("packs/maps/{level}/{level}.pkg")
}

/// A tank pickup actor in `default`, as placed by the base game.
pub fn with_tank(scenario: &mut Scenario, name: &str) {
    let mut tank = Actor::new(name);
    tank.components.insert(
        "LIFE".to_string(),
        Component {
            type_name: "CLifeComponent".to_string(),
            ..Component::default()
        },
    );
    scenario.insert_actor("default", tank);
}

/// A power door whose right side has a shield and whose left side has none.
pub fn with_one_sided_door(scenario: &mut Scenario, map: &mut ScenarioMap) {
    let mut life = Component {
        type_name: "CDoorLifeComponent".to_string(),
        ..Component::default()
    };
    life.set("wpLeftDoorShieldEntity", "");
    life.set("wpRightDoorShieldEntity", actor_link("default", "doorshield_000"));
    let mut door = Actor::new("doorpowerpower_000");
    door.actor_def_link = ONE_SIDED_DOOR.to_string();
    door.components.insert("LIFE".to_string(), life);
    scenario.insert_actor("default", door);

    let mut shield = Actor::new("doorshield_000");
    shield.actor_def_link = SHIELD_CLASS.to_string();
    shield.angle = Some([0.0, 90.0, 0.0]);
    scenario.insert_actor("default", shield);
    scenario.add_actor_to_group("eg_collision_camera_001", "doorpowerpower_000", "default");

    map.blockages.insert(
        "doorshield_000".to_string(),
        MapBlockage {
            icon_id: "doorshield_L".to_string(),
            bbox: BoundingBox {
                min: [-100.0, 0.0],
                max: [0.0, 400.0],
            },
            ..MapBlockage::default()
        },
    );
}

/// A project holding every level the world fixes visit. `customize` may edit
/// each level's graph and map before they are registered.
pub fn project(mut customize: impl FnMut(&str, &mut Scenario, &mut ScenarioMap)) -> ProjectEditor {
    let mut editor = ProjectEditor::in_memory();

    for level in DOOR_FIX_LEVELS {
        let mut scenario = Scenario::default();
        let mut map = ScenarioMap::default();
        match level {
            "s010_cave" => {
                scenario.insert_actor("Cutscenes", Actor::new("cutscenetrigger_36"));
            }
            "s030_baselab" => {
                scenario.insert_actor("cutscenes", Actor::new("cutscenetrigger_39"));
            }
            "s020_magma" => {
                let mut player = Actor::new("cutsceneplayer_61");
                player
                    .components
                    .insert("CUTSCENE".to_string(), Component::default());
                scenario.insert_actor("cutscenes", player);
            }
            _ => {}
        }
        customize(level, &mut scenario, &mut map);

        let base = path_for_level(level);
        let package = level_package(level);
        editor.insert_asset(&format!("{base}.brfld"), Asset::Scenario(scenario));
        editor.insert_asset(&format!("{base}.bmmap"), Asset::Map(map));
        editor.insert_asset(
            &format!("{base}.lc"),
            Asset::Script(format!("-- {level}\n")),
        );
        editor.add_to_package(&package, &format!("{base}.brfld"));
        editor.add_to_package(&package, &format!("{base}.lc"));
    }

    for level in ["s010_cave", "s020_magma", "s070_basesanc"] {
        let manager = SubareaManager {
            setups: vec![SubareaSetup {
                id: "PostXRelease".to_string(),
                ..SubareaSetup::default()
            }],
            ..SubareaManager::default()
        };
        editor.insert_asset(
            &format!("{}.brsa", path_for_level(level)),
            Asset::Subareas(manager),
        );
    }

    editor.insert_asset(
        "system/localization/us_english.txt",
        Asset::Text(TextTable::default()),
    );
    editor
}

pub fn actor_pickup(level: &str, actor: &str, resources: &[(&str, f64)]) -> Pickup {
    Pickup {
        kind: PickupKind::Actor {
            pickup_actor: ActorLocator::new(level, "default", actor),
        },
        caption: "Item acquired.".to_string(),
        model: "itemsphere".to_string(),
        resources: resources
            .iter()
            .map(|(item_id, quantity)| Resource::new(item_id, *quantity))
            .collect(),
    }
}
