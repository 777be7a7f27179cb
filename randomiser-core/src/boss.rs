//! Rewards granted by existing actor classes: EMMI kills, Core-X absorbs and
//! the Corpius fight.

use log::debug;

use crate::editor::{path_for_level, Asset, Editor};
use crate::items::{is_expansion, ITEM_NONE};
use crate::localization::propagate_caption;
use crate::lua::ensure_script_copy;
use crate::pickup::{Pickup, Resource, RewardTarget};
use crate::run::PatchRun;
use crate::{ActorDef, Result};

pub const ON_KILLED_FIELD: &str = "sInventoryItemOnKilled";
pub const ON_ABSORBED_FIELD: &str = "sInventoryItemOnBigXAbsorbed";
const GIVE_ITEM_ON_DEAD: &str = "bGiveInventoryItemOnDead";

/// True when the reward fits in the actor's single item field.
pub fn is_direct_grant(resources: &[Resource]) -> bool {
    match resources {
        [only] => only.quantity <= 1.0 && !is_expansion(&only.item_id),
        _ => false,
    }
}

pub fn patch_emmi_pickup(
    editor: &mut dyn Editor,
    run: &mut PatchRun,
    pickup: &Pickup,
    target: &RewardTarget,
) -> Result<()> {
    let actordef = patch_reward_actordef(editor, run, pickup, target, ON_KILLED_FIELD)?;
    editor.replace_asset(&target.actordef, Asset::ActorDef(actordef))
}

pub fn patch_corex_pickup(
    editor: &mut dyn Editor,
    run: &mut PatchRun,
    pickup: &Pickup,
    target: &RewardTarget,
) -> Result<()> {
    let actordef = patch_reward_actordef(editor, run, pickup, target, ON_ABSORBED_FIELD)?;
    editor.replace_asset(&target.actordef, Asset::ActorDef(actordef))
}

pub fn patch_corpius_pickup(
    editor: &mut dyn Editor,
    run: &mut PatchRun,
    pickup: &Pickup,
    target: &RewardTarget,
) -> Result<()> {
    let mut actordef = patch_reward_actordef(editor, run, pickup, target, ON_KILLED_FIELD)?;
    let grants_plain_item = pickup
        .resources
        .first()
        .map_or(false, |res| !is_expansion(&res.item_id));
    if grants_plain_item {
        actordef.set_ai_field(GIVE_ITEM_ON_DEAD, true)?;
    }
    editor.replace_asset(&target.actordef, Asset::ActorDef(actordef))
}

fn patch_reward_actordef(
    editor: &mut dyn Editor,
    run: &mut PatchRun,
    pickup: &Pickup,
    target: &RewardTarget,
    item_field: &str,
) -> Result<ActorDef> {
    let item_id = if is_direct_grant(&pickup.resources) {
        pickup.resources[0].item_id.clone()
    } else {
        install_scripted_grant(editor, run, pickup, target)?;
        ITEM_NONE.to_string()
    };

    let mut actordef = editor.get_actor_def(&target.actordef)?;
    actordef.set_ai_field(item_field, item_id.as_str())?;
    debug!("{}: {} = {}", target.actordef, item_field, item_id);

    let tables = run.localization_tables().to_vec();
    propagate_caption(editor, &tables, &target.string_key, &pickup.caption)?;

    Ok(actordef)
}

fn install_scripted_grant(
    editor: &mut dyn Editor,
    run: &mut PatchRun,
    pickup: &Pickup,
    target: &RewardTarget,
) -> Result<()> {
    let callback = &target.lua_callback;
    ensure_script_copy(editor, &path_for_level(&callback.scenario))?;

    let pickup_class = run.classes.get_script_class(&pickup.resources, true)?;
    run.level_scripts.append_callback(callback, &pickup_class)
}
