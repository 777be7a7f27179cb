//! Small in-memory projects shared by the unit tests.

use serde_json::json;

use crate::editor::{path_for_level, Asset, TextTable};
use crate::localization::table_path;
use crate::static_fixes::DOOR_FIX_LEVELS;
use crate::world::{
    Actor, Component, Scenario, ScenarioMap, SubareaConfig, SubareaManager, SubareaSetup,
};
use crate::{ActorDef, ProjectEditor};

pub const CAVE: &str = "s010_cave";
pub const FOREST: &str = "s050_forest";
pub const CAVE_PACKAGE: &str = "packs/maps/s010_cave/s010_cave.pkg";

pub const EMMI_DEF: &str = "actors/characters/emmy_cave/charclasses/emmy_cave.bmsad";
pub const CORPIUS_DEF: &str = "actors/characters/corpius/charclasses/corpius.bmsad";
pub const PLAIN_DEF: &str = "actors/props/crate/charclasses/crate.bmsad";

pub fn level_package(level: &str) -> String {
    format!("packs/maps/{level}/{level}.pkg")
}

pub fn level_script(level: &str) -> String {
    format!("-- {level}\n{level} = {level} or {{}}\nfunction {level}.InitFromBlackboard()\nend\n")
}

fn post_x_release(ids: &[&str]) -> SubareaManager {
    SubareaManager {
        setups: vec![SubareaSetup {
            id: "PostXRelease".to_string(),
            configs: ids
                .iter()
                .map(|id| SubareaConfig {
                    id: id.to_string(),
                    ..SubareaConfig::default()
                })
                .collect(),
            ..SubareaSetup::default()
        }],
        ..SubareaManager::default()
    }
}

/// Registers a level's graph and map and lists the graph in its package.
pub fn insert_level(editor: &mut ProjectEditor, level: &str, scenario: Scenario, map: ScenarioMap) {
    let base = path_for_level(level);
    editor.insert_asset(&format!("{base}.brfld"), Asset::Scenario(scenario));
    editor.insert_asset(&format!("{base}.bmmap"), Asset::Map(map));
    editor.add_to_package(&level_package(level), &format!("{base}.brfld"));
}

fn insert_level_script(editor: &mut ProjectEditor, level: &str) {
    let path = format!("{}.lc", path_for_level(level));
    editor.insert_asset(&path, Asset::Script(level_script(level)));
    editor.add_to_package(&level_package(level), &path);
}

fn boss_def(name: &str, ai_fields: serde_json::Value) -> ActorDef {
    ActorDef::from_value(json!({
        "name": name,
        "type": "CActorDef",
        "property": {
            "components": {
                "AI": {"type": "CBossAIComponent", "fields": {"fields": ai_fields}}
            }
        }
    }))
}

/// Every door-fix level with an empty graph and map, plus the actors,
/// sub-area setups, scripts, actor classes and text the patchers touch.
pub fn editor_with_levels() -> ProjectEditor {
    let mut editor = ProjectEditor::in_memory();

    for level in DOOR_FIX_LEVELS {
        let mut scenario = Scenario::default();
        match level {
            "s010_cave" => {
                let mut tank = Actor::new("item_tank");
                tank.components.insert(
                    "LIFE".to_string(),
                    Component {
                        type_name: "CLifeComponent".to_string(),
                        ..Component::default()
                    },
                );
                scenario.insert_actor("default", tank);
                scenario.insert_actor("Cutscenes", Actor::new("cutscenetrigger_36"));
            }
            "s020_magma" => {
                let mut player = Actor::new("cutsceneplayer_61");
                player.components.insert(
                    "CUTSCENE".to_string(),
                    Component {
                        type_name: "CCutsceneComponent".to_string(),
                        ..Component::default()
                    },
                );
                scenario.insert_actor("cutscenes", player);
            }
            "s030_baselab" => {
                scenario.insert_actor("cutscenes", Actor::new("cutscenetrigger_39"));
            }
            _ => {
                scenario.insert_actor("default", Actor::new("startpoint_000"));
            }
        }
        insert_level(&mut editor, level, scenario, ScenarioMap::default());
    }

    let subareas = [
        (
            CAVE,
            post_x_release(&[
                "collision_camera_026",
                "collision_camera_020",
                "collision_camera_keep",
            ]),
        ),
        ("s020_magma", post_x_release(&["collision_camera_063"])),
        ("s070_basesanc", post_x_release(&[])),
    ];
    for (level, manager) in subareas {
        editor.insert_asset(
            &format!("{}.brsa", path_for_level(level)),
            Asset::Subareas(manager),
        );
    }

    insert_level_script(&mut editor, CAVE);
    insert_level_script(&mut editor, FOREST);

    editor.insert_asset(
        EMMI_DEF,
        Asset::ActorDef(boss_def(
            "emmy_cave",
            json!({"sInventoryItemOnKilled": "ITEM_NONE", "sInventoryItemOnBigXAbsorbed": "ITEM_NONE"}),
        )),
    );
    editor.insert_asset(
        CORPIUS_DEF,
        Asset::ActorDef(boss_def(
            "corpius",
            json!({"sInventoryItemOnKilled": "ITEM_NONE", "bGiveInventoryItemOnDead": false}),
        )),
    );
    editor.insert_asset(
        PLAIN_DEF,
        Asset::ActorDef(ActorDef::from_value(json!({
            "name": "crate",
            "type": "CActorDef",
            "property": {"components": {}}
        }))),
    );

    editor.insert_asset(
        &table_path("us_english.txt"),
        Asset::Text(TextTable::default()),
    );
    editor
}
