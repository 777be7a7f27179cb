use log::debug;
use std::collections::HashMap;

use crate::items::{is_expansion, ITEM_WEAPON_POWER_BOMB};
use crate::lua::{progression_table, replace_template, ScriptAccumulator, PROGRESSIVE_TEMPLATE};
use crate::pickup::Resource;
use crate::{PatcherError, Result};

pub const POWERUP_CLASS: &str = "RandomizerPowerup";
pub const POWER_BOMB_CLASS: &str = "RandomizerPowerBomb";
const PROGRESSIVE_PREFIX: &str = "RandomizerProgressive_";

/// Base class a pickup's script derives from, picked by its first item.
pub fn base_class(resources: &[Resource]) -> &'static str {
    match resources.first() {
        Some(first) if first.item_id == ITEM_WEAPON_POWER_BOMB => POWER_BOMB_CLASS,
        _ => POWERUP_CLASS,
    }
}

/// A multi-item pickup may not grant expansions, wherever they sit.
pub fn check_progression(resources: &[Resource]) -> Result<()> {
    if resources.len() < 2 {
        return Ok(());
    }
    match resources.iter().find(|res| is_expansion(&res.item_id)) {
        Some(res) => Err(PatcherError::ExpansionInProgression {
            item_id: res.item_id.clone(),
        }),
        None => Ok(()),
    }
}

fn is_script_safe(item_id: &str) -> bool {
    !item_id.is_empty()
        && item_id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn encode_quantity(quantity: f64) -> String {
    quantity
        .to_string()
        .chars()
        .map(|ch| match ch {
            '.' => 'p',
            '-' => 'm',
            other => other,
        })
        .collect()
}

/// Canonical encoding of an ordered resource list.
///
/// Each resource is written as `{len}_{item_id}_{quantity}`; the length
/// prefix keeps the encoding unambiguous even though item ids contain
/// underscores, and the result is a valid identifier tail.
pub fn signature(resources: &[Resource]) -> Result<String> {
    let mut parts = Vec::with_capacity(resources.len());
    for res in resources {
        if !is_script_safe(&res.item_id) {
            return Err(PatcherError::InvalidScriptItemId(res.item_id.clone()));
        }
        parts.push(format!(
            "{}_{}_{}",
            res.item_id.len(),
            res.item_id,
            encode_quantity(res.quantity)
        ));
    }
    Ok(parts.join("_"))
}

pub fn class_name_for(signature: &str) -> String {
    format!("{PROGRESSIVE_PREFIX}{signature}")
}

/// Script classes synthesized during one run, keyed by signature. The first
/// pickup to need a progression defines its class; later ones reuse it.
#[derive(Debug, Default)]
pub struct ProgressiveClasses {
    cache: HashMap<String, String>,
    script: ScriptAccumulator,
}

impl ProgressiveClasses {
    /// Script class for a pickup granting `resources`.
    ///
    /// Plain single-item pickups use one of the two base classes. Anything
    /// else (progressions, or a boss reward that has to be granted through a
    /// script) gets a generated class appended to the shared script.
    pub fn get_script_class(&mut self, resources: &[Resource], boss: bool) -> Result<String> {
        if resources.is_empty() {
            return Err(PatcherError::Config("pickup has no resources".to_string()));
        }
        let parent = base_class(resources);
        if !boss && resources.len() == 1 {
            return Ok(parent.to_string());
        }

        check_progression(resources)?;
        let signature = signature(resources)?;
        if let Some(existing) = self.cache.get(&signature) {
            return Ok(existing.clone());
        }

        let class_name = class_name_for(&signature);
        let fragment = replace_template(
            PROGRESSIVE_TEMPLATE,
            &[
                ("name", class_name.clone()),
                ("parent", parent.to_string()),
                ("progression", progression_table(resources)),
            ],
        )?;
        self.script.append(&fragment);
        debug!("new progressive class {} (parent {})", class_name, parent);

        self.cache.insert(signature, class_name.clone());
        Ok(class_name)
    }

    /// Number of generated classes.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn script(&self) -> &ScriptAccumulator {
        &self.script
    }

    pub fn into_script(self) -> String {
        self.script.into_script()
    }
}
