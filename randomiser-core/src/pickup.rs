use log::debug;
use serde::{Deserialize, Serialize};

use crate::actordef::{MODEL_NAME, MODEL_UPDATER_MODEL, SCRIPT_CLASS};
use crate::boss::{patch_corex_pickup, patch_corpius_pickup, patch_emmi_pickup};
use crate::editor::{path_for_level, ActorLocator, Asset, Editor};
use crate::items::{map_single_item, ITEM_NONE};
use crate::lua::POWERUP_SCRIPT_PATH;
use crate::models::{self, DEFAULT_MODEL};
use crate::progressive::check_progression;
use crate::run::PatchRun;
use crate::{ActorDef, PatcherError, Result};

const POWERUP_CHARCLASSES: &str = "actors/items/randomizer_powerup/charclasses";
const ANIMTREE_DEPENDENCY: &str = "system/animtrees/base.bmsat";
const TIMELINE_DEPENDENCY: &str = "actors/items/itemsphere/charclasses/timeline.bmsas";
const LIFE_COMPONENT: &str = "LIFE";

/// Asset path of the actor class generated for pickup `pickup_id`.
pub fn powerup_asset_path(pickup_id: usize) -> String {
    format!("{POWERUP_CHARCLASSES}/randomizer_powerup_{pickup_id}.bmsad")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub item_id: String,
    pub quantity: f64,
}

impl Resource {
    pub fn new(item_id: &str, quantity: f64) -> Self {
        Self {
            item_id: item_id.to_string(),
            quantity,
        }
    }
}

/// Level script function that fires when a boss reward is granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuaCallback {
    pub scenario: String,
    #[serde(rename = "function")]
    pub function_name: String,
    #[serde(rename = "args")]
    pub arg_count: usize,
}

impl LuaCallback {
    pub fn new(scenario: &str, function_name: &str, arg_count: usize) -> Self {
        Self {
            scenario: scenario.to_string(),
            function_name: function_name.to_string(),
            arg_count,
        }
    }
}

/// An existing actor class whose defeat or absorb trigger grants the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTarget {
    #[serde(rename = "pickup_actordef")]
    pub actordef: String,
    #[serde(rename = "pickup_string_key")]
    pub string_key: String,
    #[serde(rename = "pickup_lua_callback")]
    pub lua_callback: LuaCallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pickup_type", rename_all = "lowercase")]
pub enum PickupKind {
    /// A pickup actor standing in the world.
    Actor { pickup_actor: ActorLocator },
    /// Reward for defeating an EMMI.
    Emmi(RewardTarget),
    /// Reward for absorbing a Core-X.
    #[serde(rename = "corex")]
    CoreX(RewardTarget),
    /// Reward for defeating Corpius.
    Corpius(RewardTarget),
}

impl PickupKind {
    pub fn name(&self) -> &'static str {
        match self {
            PickupKind::Actor { .. } => "actor",
            PickupKind::Emmi(_) => "emmi",
            PickupKind::CoreX(_) => "corex",
            PickupKind::Corpius(_) => "corpius",
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    #[serde(flatten)]
    pub kind: PickupKind,
    pub caption: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Granting order; never empty.
    pub resources: Vec<Resource>,
}

impl Pickup {
    pub fn validate(&self) -> Result<()> {
        if self.resources.is_empty() {
            return Err(PatcherError::Config("pickup has no resources".to_string()));
        }
        if let Some(res) = self.resources.iter().find(|res| !res.quantity.is_finite()) {
            return Err(PatcherError::Config(format!(
                "quantity of {} is not a finite number",
                res.item_id
            )));
        }
        check_progression(&self.resources)
    }
}

/// Applies one pickup, dispatching on its kind.
pub fn patch_pickup(
    editor: &mut dyn Editor,
    run: &mut PatchRun,
    pickup: &Pickup,
    pickup_id: usize,
) -> Result<()> {
    let result = match &pickup.kind {
        PickupKind::Actor { pickup_actor } => {
            patch_actor_pickup(editor, run, pickup, pickup_actor, pickup_id)
        }
        PickupKind::Emmi(target) => patch_emmi_pickup(editor, run, pickup, target),
        PickupKind::CoreX(target) => patch_corex_pickup(editor, run, pickup, target),
        PickupKind::Corpius(target) => patch_corpius_pickup(editor, run, pickup, target),
    };
    result.map_err(|err| err.for_pickup(pickup_id))
}

/// Derives a new actor class from the pickup template and points the placed
/// actor at it.
pub fn patch_actor_pickup(
    editor: &mut dyn Editor,
    run: &mut PatchRun,
    pickup: &Pickup,
    location: &ActorLocator,
    pickup_id: usize,
) -> Result<()> {
    let level_packages =
        editor.find_packages_containing(&format!("{}.brfld", path_for_level(&location.scenario)));

    if editor
        .world_graph_mut(&location.scenario)?
        .actor(&location.layer, &location.actor)
        .is_none()
    {
        return Err(location.not_found());
    }

    let model = models::resolve(&pickup.model);

    let mut bmsad = ActorDef::powerup_template()?;
    bmsad.set_name(&format!("randomizer_powerup_{pickup_id}"))?;
    bmsad.set(MODEL_NAME, model.bcmdl_path)?;
    bmsad.set(MODEL_UPDATER_MODEL, model.bcmdl_path)?;
    bmsad.set_pickable_field("sOnPickCaption", pickup.caption.as_str())?;
    bmsad.set_pickable_field("sOnPickTankUnknownCaption", pickup.caption.as_str())?;

    let script_class = run.classes.get_script_class(&pickup.resources, false)?;
    if let [resource] = pickup.resources.as_slice() {
        map_single_item(resource, &pickup.caption).apply(&mut bmsad)?;
    } else {
        // Progressive grants happen in the script class.
        bmsad.set_custom_param(1, ITEM_NONE)?;
    }
    bmsad.set(SCRIPT_CLASS, script_class.as_str())?;

    let new_path = powerup_asset_path(pickup_id);
    editor.add_asset(&new_path, Asset::ActorDef(bmsad.clone()), &level_packages)?;

    let actor = editor
        .world_graph_mut(&location.scenario)?
        .actor_mut(&location.layer, &location.actor)
        .ok_or_else(|| location.not_found())?;
    actor.actor_def_link = format!("actordef:{new_path}");
    // Pickups cannot be damaged.
    actor.components.remove(LIFE_COMPONENT);

    for package in &level_packages {
        editor.ensure_dependency_present(package, ANIMTREE_DEPENDENCY)?;
        editor.ensure_dependency_present(package, TIMELINE_DEPENDENCY)?;
        for dep in model.dependencies {
            editor.ensure_dependency_present(package, dep)?;
        }
        editor.ensure_dependency_present(package, POWERUP_SCRIPT_PATH)?;
    }

    debug!(
        "{}/{}/{}: now {} ({})",
        location.scenario, location.layer, location.actor, new_path, script_class
    );
    run.record_generated(new_path, bmsad);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, CAVE, CAVE_PACKAGE};
    use crate::items::ITEM_ENERGY_TANKS;
    use crate::progressive::POWERUP_CLASS;
    use serde_json::json;

    fn actor_pickup(actor: &str, resources: Vec<Resource>) -> Pickup {
        Pickup {
            kind: PickupKind::Actor {
                pickup_actor: ActorLocator::new(CAVE, "default", actor),
            },
            caption: "Energy Tank acquired.".to_string(),
            model: "item_energytank".to_string(),
            resources,
        }
    }

    #[test]
    fn deserializes_tagged_pickups() {
        let pickup: Pickup = serde_json::from_value(json!({
            "pickup_type": "corex",
            "caption": "Screw Attack",
            "resources": [{"item_id": "ITEM_SCREW_ATTACK", "quantity": 1}],
            "pickup_actordef": "actors/characters/core_x/charclasses/core_x.bmsad",
            "pickup_string_key": "#GUI_ITEM_ACQUIRED_SCREW_ATTACK",
            "pickup_lua_callback": {"scenario": "s050_forest", "function": "OnCoreXAbsorbed", "args": 1}
        }))
        .unwrap();

        assert_eq!(pickup.model, DEFAULT_MODEL);
        match pickup.kind {
            PickupKind::CoreX(target) => {
                assert_eq!(target.lua_callback.function_name, "OnCoreXAbsorbed");
                assert_eq!(target.lua_callback.arg_count, 1);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn empty_resources_are_invalid() {
        let pickup = actor_pickup("item_tank", Vec::new());
        assert!(matches!(pickup.validate(), Err(PatcherError::Config(_))));
    }

    #[test]
    fn derives_asset_and_relinks_actor() {
        let mut editor = fixtures::editor_with_levels();
        let mut run = PatchRun::default();
        let pickup = actor_pickup("item_tank", vec![Resource::new(ITEM_ENERGY_TANKS, 1.0)]);

        patch_pickup(&mut editor, &mut run, &pickup, 4).unwrap();

        let path = powerup_asset_path(4);
        assert_eq!(
            path,
            "actors/items/randomizer_powerup/charclasses/randomizer_powerup_4.bmsad"
        );
        let def = editor.get_actor_def(&path).unwrap();
        assert_eq!(def.name(), Some("randomizer_powerup_4"));
        assert_eq!(def.custom_param(1), Some(&json!("fMaxLife")));
        assert_eq!(def.custom_param(2), Some(&json!(100.0)));
        assert_eq!(def.script_class(), Some(POWERUP_CLASS));
        assert_eq!(
            def.get_str(MODEL_NAME),
            Some("actors/items/item_energytank/models/item_energytank.bcmdl")
        );
        assert_eq!(
            def.pickable_field("sOnPickTankUnknownCaption"),
            Some(&json!("Energy Tank acquired."))
        );

        let actor = editor
            .world_graph_mut(CAVE)
            .unwrap()
            .actor("default", "item_tank")
            .unwrap()
            .clone();
        assert_eq!(actor.actor_def_link, format!("actordef:{path}"));
        assert!(!actor.components.contains_key("LIFE"));

        let contents = editor.package_contents(CAVE_PACKAGE).unwrap();
        for dep in [
            path.as_str(),
            ANIMTREE_DEPENDENCY,
            TIMELINE_DEPENDENCY,
            POWERUP_SCRIPT_PATH,
            "actors/items/item_energytank/models/item_energytank.bcmdl",
        ] {
            assert!(contents.contains(dep), "missing {dep}");
        }
        assert_eq!(run.generated().len(), 1);
    }

    #[test]
    fn progressive_actor_grants_nothing_directly() {
        let mut editor = fixtures::editor_with_levels();
        let mut run = PatchRun::default();
        let pickup = actor_pickup(
            "item_tank",
            vec![
                Resource::new("ITEM_WEAPON_WIDE_BEAM", 1.0),
                Resource::new("ITEM_WEAPON_PLASMA_BEAM", 1.0),
            ],
        );

        patch_pickup(&mut editor, &mut run, &pickup, 0).unwrap();

        let def = editor.get_actor_def(&powerup_asset_path(0)).unwrap();
        assert_eq!(def.custom_param(1), Some(&json!("ITEM_NONE")));
        assert!(def.script_class().unwrap().starts_with("RandomizerProgressive_"));
    }

    #[test]
    fn missing_actor_is_fatal_and_names_the_pickup() {
        let mut editor = fixtures::editor_with_levels();
        let mut run = PatchRun::default();
        let pickup = actor_pickup("nope", vec![Resource::new("ITEM_VARIA_SUIT", 1.0)]);

        let err = patch_pickup(&mut editor, &mut run, &pickup, 9).unwrap_err();
        match err {
            PatcherError::Pickup { pickup_id, source } => {
                assert_eq!(pickup_id, 9);
                assert!(matches!(*source, PatcherError::ActorNotFound { ref actor, .. } if actor == "nope"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!editor.asset_exists(&powerup_asset_path(9)));
    }

    #[test]
    fn unknown_model_falls_back_silently() {
        let mut editor = fixtures::editor_with_levels();
        let mut run = PatchRun::default();
        let mut pickup = actor_pickup("item_tank", vec![Resource::new("ITEM_VARIA_SUIT", 1.0)]);
        pickup.model = "mystery".to_string();

        patch_pickup(&mut editor, &mut run, &pickup, 1).unwrap();
        let def = editor.get_actor_def(&powerup_asset_path(1)).unwrap();
        assert_eq!(
            def.get_str(MODEL_UPDATER_MODEL),
            Some("actors/items/itemsphere/models/itemsphere.bcmdl")
        );
    }
}
