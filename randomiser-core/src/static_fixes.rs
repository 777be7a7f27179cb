//! World corrections applied once after every pickup is placed.

use log::debug;
use serde_json::{json, Value};

use crate::editor::{ActorLocator, Editor};
use crate::world::{actor_link, Actor, Scenario};
use crate::{PatcherError, Result};

const DOOR_LIFE_COMPONENT: &str = "CDoorLifeComponent";
const ONE_SIDED_DOOR: &str = "actordef:actors/props/doorpowerpower/charclasses/doorpowerpower.bmsad";
const HALF_DOOR_MARKER: &str = "db_hdoor";
const MIRROR_SUFFIX: &str = "_mirrored";
const LEFT_SHIELD: &str = "wpLeftDoorShieldEntity";
const RIGHT_SHIELD: &str = "wpRightDoorShieldEntity";
const MIRROR_SHIFT: f64 = 450.0;

pub const DOOR_FIX_LEVELS: [&str; 8] = [
    "s010_cave",
    "s020_magma",
    "s030_baselab",
    "s040_aqua",
    "s050_forest",
    "s060_quarantine",
    "s070_basesanc",
    "s080_shipyard",
];

const POST_X_RELEASE: &str = "PostXRelease";

/// X layers that force a room into its post-release state even when it was
/// never entered, which can softlock the room.
pub const PROBLEM_X_LAYERS: &[(&str, &[&str])] = &[
    (
        "s010_cave",
        &[
            "collision_camera_026", // chain reaction
            "collision_camera_020", // corpius arena
            "collision_camera_073", // corpius entrance
        ],
    ),
    ("s020_magma", &["collision_camera_063"]), // kraid arena
    ("s070_basesanc", &["collision_camera_005"]), // quiet robe room
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticFixSummary {
    pub removed_x_layers: usize,
    pub removed_cutscenes: usize,
    pub mirrored_doors: usize,
}

pub fn apply_static_fixes(editor: &mut dyn Editor) -> Result<StaticFixSummary> {
    let removed_x_layers = remove_problematic_x_layers(editor)?;
    let removed_cutscenes = activate_emmi_zones(editor)?;
    let mirrored_doors = apply_one_sided_door_fixes(editor)?;
    add_callback_to_kraid(editor)?;

    Ok(StaticFixSummary {
        removed_x_layers,
        removed_cutscenes,
        mirrored_doors,
    })
}

/// Swaps the trailing `L`/`R` of a minimap icon id.
pub fn flip_icon_id(icon_id: &str) -> Result<String> {
    if let Some(stem) = icon_id.strip_suffix('R') {
        Ok(format!("{stem}L"))
    } else if let Some(stem) = icon_id.strip_suffix('L') {
        Ok(format!("{stem}R"))
    } else {
        Err(PatcherError::UnrecognizedIconId(icon_id.to_string()))
    }
}

pub fn apply_one_sided_door_fixes(editor: &mut dyn Editor) -> Result<usize> {
    let mut mirrored = 0;
    for scenario_name in DOOR_FIX_LEVELS {
        mirrored += mirror_one_sided_doors(editor, scenario_name)?;
    }
    Ok(mirrored)
}

fn is_door(actor: &Actor) -> bool {
    actor
        .components
        .get("LIFE")
        .map_or(false, |life| life.type_name == DOOR_LIFE_COMPONENT)
}

/// Gives every one-sided power door a shield on its empty side by copying the
/// shield it already has and mirroring it.
pub fn mirror_one_sided_doors(editor: &mut dyn Editor, scenario_name: &str) -> Result<usize> {
    let mut map = editor.map_mut(scenario_name)?.clone();
    let scenario = editor.world_graph_mut(scenario_name)?;

    let doors: Vec<(String, String)> = scenario
        .all_actors()
        .filter(|(_, _, actor)| is_door(actor) && actor.actor_def_link == ONE_SIDED_DOOR)
        .map(|(layer, name, _)| (layer.to_string(), name.to_string()))
        .collect();

    let mut mirrored_count = 0;
    for (layer_name, actor_name) in doors {
        let Some(mirror) = mirror_door(scenario, scenario_name, &layer_name, &actor_name)? else {
            continue;
        };

        let mut blockage = map
            .blockages
            .get(&mirror.other)
            .cloned()
            .ok_or_else(|| PatcherError::MissingMapBlockage {
                scenario: scenario_name.to_string(),
                actor: mirror.other.clone(),
            })?;
        blockage.icon_id = flip_icon_id(&blockage.icon_id)?;
        let delta = if blockage.icon_id.ends_with('R') {
            MIRROR_SHIFT
        } else {
            -MIRROR_SHIFT
        };
        blockage.bbox.translate_x(delta);
        map.blockages.insert(mirror.mirrored, blockage);
        mirrored_count += 1;
    }

    *editor.map_mut(scenario_name)? = map;
    Ok(mirrored_count)
}

struct MirroredShield {
    other: String,
    mirrored: String,
}

fn mirror_door(
    scenario: &mut Scenario,
    scenario_name: &str,
    layer_name: &str,
    actor_name: &str,
) -> Result<Option<MirroredShield>> {
    let Some(door) = scenario.actor(layer_name, actor_name) else {
        return Ok(None);
    };
    let Some(life) = door.components.get("LIFE") else {
        return Ok(None);
    };
    let left = life
        .get_str(LEFT_SHIELD)
        .and_then(|link| scenario.follow_link(link))
        .cloned();
    let right = life
        .get_str(RIGHT_SHIELD)
        .and_then(|link| scenario.follow_link(link))
        .cloned();

    let (other, direction) = match (left, right) {
        (None, Some(right)) => (right, LEFT_SHIELD),
        (Some(left), None) => (left, RIGHT_SHIELD),
        _ => return Ok(None),
    };
    if other.actor_def_link.contains(HALF_DOOR_MARKER) {
        return Ok(None);
    }

    debug!(
        "{}/{}/{}: copy {} into {}",
        scenario_name, layer_name, actor_name, other.name, direction
    );

    let mut mirrored = other.clone();
    mirrored.name.push_str(MIRROR_SUFFIX);
    if let Some(angle) = mirrored.angle.as_mut() {
        angle[1] = -angle[1];
    }
    let mirrored_name = mirrored.name.clone();

    let door_not_found = || PatcherError::ActorNotFound {
        scenario: scenario_name.to_string(),
        layer: layer_name.to_string(),
        actor: actor_name.to_string(),
    };
    scenario
        .actors_in_layer_mut(layer_name)
        .ok_or_else(door_not_found)?
        .insert(mirrored_name.clone(), mirrored);

    let life = scenario
        .actor_mut(layer_name, actor_name)
        .and_then(|door| door.components.get_mut("LIFE"))
        .ok_or_else(door_not_found)?;
    life.set(direction, actor_link(layer_name, &mirrored_name));

    for group in scenario.all_actor_groups() {
        let touched = [actor_name, other.name.as_str()]
            .iter()
            .any(|name| scenario.is_actor_in_group(&group, name, layer_name));
        if touched {
            for name in [actor_name, mirrored_name.as_str(), other.name.as_str()] {
                scenario.add_actor_to_group(&group, name, layer_name);
            }
        }
    }

    Ok(Some(MirroredShield {
        other: other.name,
        mirrored: mirrored_name,
    }))
}

pub fn remove_problematic_x_layers(editor: &mut dyn Editor) -> Result<usize> {
    let mut removed = 0;
    for (level, layers) in PROBLEM_X_LAYERS {
        removed += remove_x_layers(editor, level, layers)?;
    }
    Ok(removed)
}

/// Drops the named configs from a level's post-release setup. Ids that are
/// not present are ignored.
pub fn remove_x_layers(editor: &mut dyn Editor, level: &str, layers: &[&str]) -> Result<usize> {
    let setup = editor
        .subarea_manager_mut(level)?
        .get_subarea_setup(POST_X_RELEASE)
        .ok_or_else(|| PatcherError::MissingSubareaSetup {
            scenario: level.to_string(),
            setup: POST_X_RELEASE.to_string(),
        })?;

    let before = setup.configs.len();
    setup
        .configs
        .retain(|config| !layers.contains(&config.id.as_str()));
    let removed = before - setup.configs.len();
    if removed > 0 {
        debug!("{}: removed {} {} layer(s)", level, removed, POST_X_RELEASE);
    }
    Ok(removed)
}

/// Removes the cutscenes played on first entry to an EMMI zone.
pub fn activate_emmi_zones(editor: &mut dyn Editor) -> Result<usize> {
    let triggers = [
        ActorLocator::new("s010_cave", "Cutscenes", "cutscenetrigger_36"),
        ActorLocator::new("s030_baselab", "cutscenes", "cutscenetrigger_39"),
    ];
    for trigger in &triggers {
        editor.remove_entity(trigger)?;
    }
    Ok(triggers.len())
}

const KRAID_CUTSCENE_PLAYER: &str = "cutsceneplayer_61";
const KRAID_DEATH_CALLBACK: &str = "CurrentScenario.OnKraidDeath_CUSTOM";
const AFTER_CUTSCENE_ACTIONS: &str = "vctOnAfterCutsceneEndsLA";

/// Lets the Kraid level script react once the death cutscene ends.
pub fn add_callback_to_kraid(editor: &mut dyn Editor) -> Result<()> {
    let locator = ActorLocator::new("s020_magma", "cutscenes", KRAID_CUTSCENE_PLAYER);
    let magma = editor.world_graph_mut(&locator.scenario)?;
    let player = magma
        .actor_mut(&locator.layer, &locator.actor)
        .ok_or_else(|| locator.not_found())?;
    let malformed = || PatcherError::MalformedAsset {
        asset: KRAID_CUTSCENE_PLAYER.to_string(),
        field: format!("CUTSCENE.{AFTER_CUTSCENE_ACTIONS}"),
    };
    let actions = player
        .components
        .get_mut("CUTSCENE")
        .ok_or_else(malformed)?
        .fields
        .entry(AFTER_CUTSCENE_ACTIONS)
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(actions) = actions else {
        return Err(malformed());
    };

    actions.push(json!({
        "@type": "CLuaCallsLogicAction",
        "sCallbackEntityName": "",
        "sCallback": KRAID_DEATH_CALLBACK,
        "bCallbackEntity": false,
        "bCallbackPersistent": false,
    }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, CAVE};
    use crate::world::{BoundingBox, Component, MapBlockage, ScenarioMap};
    use crate::ProjectEditor;

    #[test]
    fn flip_icon_id_is_an_involution() {
        for icon in ["doorpowerpower_L", "doorpowerpower_R", "R", "L"] {
            let flipped = flip_icon_id(icon).unwrap();
            assert_ne!(flipped, icon);
            assert_eq!(flip_icon_id(&flipped).unwrap(), icon);
        }
    }

    #[test]
    fn flip_icon_id_rejects_other_suffixes() {
        for icon in ["", "doorpowerpower", "door_l", "door_r "] {
            assert!(matches!(
                flip_icon_id(icon),
                Err(PatcherError::UnrecognizedIconId(ref id)) if id == icon
            ));
        }
    }

    fn door_editor(left: Option<&str>, right: Option<&str>, shield_class: &str, icon: &str) -> ProjectEditor {
        let mut scenario = Scenario::default();
        let mut life = Component {
            type_name: DOOR_LIFE_COMPONENT.to_string(),
            ..Component::default()
        };
        life.set(LEFT_SHIELD, left.map(|a| actor_link("default", a)).unwrap_or_default());
        life.set(RIGHT_SHIELD, right.map(|a| actor_link("default", a)).unwrap_or_default());

        let door = Actor {
            name: "door_000".to_string(),
            actor_def_link: ONE_SIDED_DOOR.to_string(),
            components: [("LIFE".to_string(), life)].into_iter().collect(),
            ..Actor::default()
        };
        let shield = Actor {
            name: "shield_000".to_string(),
            actor_def_link: shield_class.to_string(),
            angle: Some([0.0, 90.0, 0.0]),
            ..Actor::default()
        };
        scenario.insert_actor("default", door);
        scenario.insert_actor("default", shield);
        scenario.add_actor_to_group("eg_shield_only", "shield_000", "default");
        scenario.add_actor_to_group("eg_unrelated", "someone_else", "default");

        let mut map = ScenarioMap::default();
        map.blockages.insert(
            "shield_000".to_string(),
            MapBlockage {
                icon_id: icon.to_string(),
                bbox: BoundingBox {
                    min: [1000.0, -200.0],
                    max: [1100.0, 200.0],
                },
                ..MapBlockage::default()
            },
        );

        let mut editor = ProjectEditor::in_memory();
        fixtures::insert_level(&mut editor, CAVE, scenario, map);
        editor
    }

    const SHIELD_CLASS: &str = "actordef:actors/props/doorshield/charclasses/doorshield.bmsad";

    #[test]
    fn mirrors_a_one_sided_door() {
        let mut editor = door_editor(None, Some("shield_000"), SHIELD_CLASS, "doorshield_L");

        assert_eq!(mirror_one_sided_doors(&mut editor, CAVE).unwrap(), 1);

        let scenario = editor.world_graph_mut(CAVE).unwrap().clone();
        let actors = scenario.actors_in_layer("default").unwrap();
        assert_eq!(actors.len(), 3);
        let mirrored = &actors["shield_000_mirrored"];
        assert_eq!(mirrored.angle, Some([0.0, -90.0, 0.0]));
        assert_eq!(mirrored.actor_def_link, SHIELD_CLASS);
        assert_eq!(actors["shield_000"].angle, Some([0.0, 90.0, 0.0]));

        let life = &actors["door_000"].components["LIFE"];
        assert_eq!(
            life.get_str(LEFT_SHIELD),
            Some(actor_link("default", "shield_000_mirrored").as_str())
        );

        for name in ["door_000", "shield_000", "shield_000_mirrored"] {
            assert!(scenario.is_actor_in_group("eg_shield_only", name, "default"));
            assert!(!scenario.is_actor_in_group("eg_unrelated", name, "default"));
        }

        let map = editor.map_mut(CAVE).unwrap();
        assert_eq!(map.blockages.len(), 2);
        let blockage = &map.blockages["shield_000_mirrored"];
        assert_eq!(blockage.icon_id, "doorshield_R");
        assert_eq!(blockage.bbox.min, [1450.0, -200.0]);
        assert_eq!(blockage.bbox.max, [1550.0, 200.0]);
        assert_eq!(map.blockages["shield_000"].icon_id, "doorshield_L");
    }

    #[test]
    fn mirrored_left_icon_shifts_negative() {
        let mut editor = door_editor(Some("shield_000"), None, SHIELD_CLASS, "doorshield_R");
        assert_eq!(mirror_one_sided_doors(&mut editor, CAVE).unwrap(), 1);

        let map = editor.map_mut(CAVE).unwrap();
        let blockage = &map.blockages["shield_000_mirrored"];
        assert_eq!(blockage.icon_id, "doorshield_L");
        assert_eq!(blockage.bbox.min, [550.0, -200.0]);
        assert_eq!(blockage.bbox.max, [650.0, 200.0]);

        let scenario = editor.world_graph_mut(CAVE).unwrap();
        let life = &scenario.actor("default", "door_000").unwrap().components["LIFE"];
        assert_eq!(
            life.get_str(RIGHT_SHIELD),
            Some(actor_link("default", "shield_000_mirrored").as_str())
        );
    }

    #[test]
    fn symmetric_or_bare_doors_are_skipped() {
        for (left, right) in [(None, None), (Some("shield_000"), Some("shield_000"))] {
            let mut editor = door_editor(left, right, SHIELD_CLASS, "doorshield_L");
            assert_eq!(mirror_one_sided_doors(&mut editor, CAVE).unwrap(), 0);
            assert_eq!(
                editor
                    .world_graph_mut(CAVE)
                    .unwrap()
                    .actors_in_layer("default")
                    .unwrap()
                    .len(),
                2
            );
        }
    }

    #[test]
    fn half_doors_are_skipped() {
        let mut editor = door_editor(
            None,
            Some("shield_000"),
            "actordef:actors/props/db_hdoor/charclasses/db_hdoor.bmsad",
            "doorshield_L",
        );
        assert_eq!(mirror_one_sided_doors(&mut editor, CAVE).unwrap(), 0);
    }

    #[test]
    fn bad_icon_suffix_is_fatal() {
        let mut editor = door_editor(None, Some("shield_000"), SHIELD_CLASS, "doorshield");
        assert!(matches!(
            mirror_one_sided_doors(&mut editor, CAVE),
            Err(PatcherError::UnrecognizedIconId(_))
        ));
    }

    #[test]
    fn x_layer_removal_is_idempotent() {
        let mut editor = fixtures::editor_with_levels();
        let removed = remove_x_layers(&mut editor, CAVE, &["collision_camera_026", "absent"]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            remove_x_layers(&mut editor, CAVE, &["collision_camera_026"]).unwrap(),
            0
        );

        let manager = editor.subarea_manager_mut(CAVE).unwrap();
        let ids: Vec<&str> = manager
            .get_subarea_setup(POST_X_RELEASE)
            .unwrap()
            .configs
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["collision_camera_020", "collision_camera_keep"]);
    }

    #[test]
    fn kraid_gets_death_callback() {
        let mut editor = fixtures::editor_with_levels();
        add_callback_to_kraid(&mut editor).unwrap();
        let magma = editor.world_graph_mut("s020_magma").unwrap();
        let player = magma.actor("cutscenes", KRAID_CUTSCENE_PLAYER).unwrap();
        let actions = player.components["CUTSCENE"].fields[AFTER_CUTSCENE_ACTIONS]
            .as_array()
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0]["sCallback"], KRAID_DEATH_CALLBACK);
    }

    #[test]
    fn emmi_zone_cutscenes_are_removed() {
        let mut editor = fixtures::editor_with_levels();
        assert_eq!(activate_emmi_zones(&mut editor).unwrap(), 2);
        assert!(editor
            .world_graph_mut(CAVE)
            .unwrap()
            .actor("Cutscenes", "cutscenetrigger_36")
            .is_none());
        assert!(activate_emmi_zones(&mut editor).is_err());
    }
}
