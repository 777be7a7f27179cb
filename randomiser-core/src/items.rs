use serde_json::Value;

use crate::pickup::Resource;
use crate::{ActorDef, Result};

pub const ITEM_NONE: &str = "ITEM_NONE";
pub const ITEM_ENERGY_TANKS: &str = "ITEM_ENERGY_TANKS";
pub const ITEM_LIFE_SHARDS: &str = "ITEM_LIFE_SHARDS";
pub const ITEM_WEAPON_MISSILE_MAX: &str = "ITEM_WEAPON_MISSILE_MAX";
pub const ITEM_WEAPON_POWER_BOMB_MAX: &str = "ITEM_WEAPON_POWER_BOMB_MAX";
pub const ITEM_WEAPON_POWER_BOMB: &str = "ITEM_WEAPON_POWER_BOMB";

/// Items whose grant needs numeric or caption handling of its own. None of
/// them may appear in a progressive pickup.
pub const EXPANSIONS: [&str; 5] = [
    ITEM_ENERGY_TANKS,
    ITEM_LIFE_SHARDS,
    ITEM_WEAPON_MISSILE_MAX,
    ITEM_WEAPON_POWER_BOMB_MAX,
    ITEM_WEAPON_POWER_BOMB,
];

pub fn is_expansion(item_id: &str) -> bool {
    EXPANSIONS.contains(&item_id)
}

const MAX_LIFE: &str = "fMaxLife";
const CURRENT_LIFE: &str = "fCurrentLife";
const LIFE_SHARDS: &str = "fLifeShards";
const LIFE_COMPONENT: &str = "LIFE";
const ENERGY_SHARD_CAPTION: &str = "#GUI_ITEM_ACQUIRED_ENERGY_SHARD";
const SECONDARY_GUNS_FIRE: &str = "guicallbacks.OnSecondaryGunsFire";
const ENERGY_TANK_LIFE: f64 = 100.0;

const FRAGMENT_CAPTIONS: [&str; 4] = [
    "sOnPickEnergyFragment1Caption",
    "sOnPickEnergyFragment2Caption",
    "sOnPickEnergyFragment3Caption",
    "sOnPickEnergyFragmentCompleteCaption",
];

/// Field-name rule for capacity items: the "current" counter is the "max"
/// field with `_MAX` replaced by `_CURRENT`; when there is no `_MAX` the
/// suffix `_CURRENT` is appended instead.
pub fn current_field_name(item_id: &str) -> String {
    let current = item_id.replace("_MAX", "_CURRENT");
    if current == item_id {
        format!("{item_id}_CURRENT")
    } else {
        current
    }
}

/// Overrides a single-resource pickup applies to the template's
/// `SetCustomParams` call and caption fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemGrant {
    /// Param1: the inventory field that receives the item.
    pub item_field: String,
    /// Param2: amount granted.
    pub quantity: f64,
    /// Param4.
    pub pickup_mode: Option<&'static str>,
    /// Param5: the "current value" field kept in sync with the grant.
    pub current_field: Option<String>,
    /// Param6.
    pub linked_component: Option<&'static str>,
    /// Param7.
    pub acquired_caption: Option<&'static str>,
    /// Param8.
    pub fire_callback: Option<&'static str>,
    /// Param13, only present for capacity items.
    pub extra_quantity: Option<f64>,
    pub captions: Vec<(&'static str, String)>,
}

impl ItemGrant {
    fn plain(item_field: &str, quantity: f64) -> Self {
        Self {
            item_field: item_field.to_string(),
            quantity,
            pickup_mode: None,
            current_field: None,
            linked_component: None,
            acquired_caption: None,
            fire_callback: None,
            extra_quantity: None,
            captions: Vec::new(),
        }
    }

    pub fn apply(&self, bmsad: &mut ActorDef) -> Result<()> {
        if let Some(mode) = self.pickup_mode {
            bmsad.set_custom_param(4, mode)?;
        }
        if let Some(current) = &self.current_field {
            bmsad.set_custom_param(5, current.as_str())?;
        }
        if let Some(component) = self.linked_component {
            bmsad.set_custom_param(6, component)?;
        }
        if let Some(caption) = self.acquired_caption {
            bmsad.set_custom_param(7, caption)?;
        }
        if let Some(callback) = self.fire_callback {
            bmsad.set_custom_param(8, callback)?;
        }
        if let Some(extra) = self.extra_quantity {
            bmsad.insert_custom_param(13, "f", extra)?;
        }
        for (field, caption) in &self.captions {
            bmsad.set_pickable_field(field, caption.as_str())?;
        }

        bmsad.set_custom_param(1, self.item_field.as_str())?;
        bmsad.set_custom_param(2, Value::from(self.quantity))?;
        Ok(())
    }
}

/// Maps one `{item_id, quantity}` onto the engine fields that grant it.
pub fn map_single_item(resource: &Resource, caption: &str) -> ItemGrant {
    let item_id = resource.item_id.as_str();
    let quantity = resource.quantity;

    match item_id {
        ITEM_ENERGY_TANKS => ItemGrant {
            pickup_mode: Some("Full"),
            current_field: Some(CURRENT_LIFE.to_string()),
            linked_component: Some(LIFE_COMPONENT),
            ..ItemGrant::plain(MAX_LIFE, quantity * ENERGY_TANK_LIFE)
        },
        ITEM_LIFE_SHARDS => ItemGrant {
            pickup_mode: Some("Custom"),
            current_field: Some(String::new()),
            linked_component: Some(LIFE_COMPONENT),
            acquired_caption: Some(ENERGY_SHARD_CAPTION),
            captions: FRAGMENT_CAPTIONS
                .iter()
                .map(|field| (*field, caption.to_string()))
                .collect(),
            ..ItemGrant::plain(LIFE_SHARDS, quantity)
        },
        ITEM_WEAPON_MISSILE_MAX | ITEM_WEAPON_POWER_BOMB_MAX | ITEM_WEAPON_POWER_BOMB => {
            // Holding the weapon is implied by a non-zero capacity.
            let stored = if item_id == ITEM_WEAPON_POWER_BOMB {
                ITEM_WEAPON_POWER_BOMB_MAX
            } else {
                item_id
            };
            ItemGrant {
                pickup_mode: Some("Custom"),
                current_field: Some(current_field_name(item_id)),
                fire_callback: Some(SECONDARY_GUNS_FIRE),
                extra_quantity: Some(quantity),
                ..ItemGrant::plain(stored, quantity)
            }
        }
        _ => ItemGrant::plain(item_id, quantity),
    }
}
