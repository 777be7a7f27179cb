//! Generated Lua: template filling, the shared pickup script buffer and the
//! per-level wrapper scripts.

use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::editor::{path_for_level, Asset, Editor};
use crate::pickup::{LuaCallback, Resource};
use crate::{PatcherError, Result};

pub const POWERUP_SCRIPT_PATH: &str = "actors/items/randomizer_powerup/scripts/randomizer_powerup.lc";
const POWERUP_SCRIPT_IMPORT: &str = "actors/items/randomizer_powerup/scripts/randomizer_powerup.lua";

const BASE_POWERUP_SCRIPT: &str = include_str!("../assets/randomizer_powerup.lua");
pub(crate) const PROGRESSIVE_TEMPLATE: &str =
    include_str!("../assets/randomizer_progressive_template.lua");
pub(crate) const BOSS_POWERUP_TEMPLATE: &str = include_str!("../assets/boss_powerup_template.lua");

const PLACEHOLDER_OPEN: &str = "TEMPLATE(\"";

/// Quotes `value` as a Lua string literal.
pub fn wrap_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Renders an ordered progression as a Lua table literal.
pub fn progression_table(resources: &[Resource]) -> String {
    let entries: Vec<String> = resources
        .iter()
        .map(|res| {
            format!(
                "{{ item_id = {}, quantity = {} }}",
                wrap_string(&res.item_id),
                res.quantity
            )
        })
        .collect();
    format!("{{ {} }}", entries.join(", "))
}

/// Fills every `TEMPLATE("key")` marker. A marker left without a value is an
/// error rather than broken Lua.
pub fn replace_template(template: &str, replacements: &[(&str, String)]) -> Result<String> {
    let mut out = template.to_string();
    for (key, value) in replacements {
        out = out.replace(&format!("{PLACEHOLDER_OPEN}{key}\")"), value);
    }

    if let Some(start) = out.find(PLACEHOLDER_OPEN) {
        let rest = &out[start + PLACEHOLDER_OPEN.len()..];
        let key = rest.split('"').next().unwrap_or_default();
        return Err(PatcherError::Config(format!(
            "script template placeholder '{key}' has no value"
        )));
    }
    Ok(out)
}

/// The shared pickup script. Seeded from the base script the first time a
/// fragment is appended.
#[derive(Debug, Default)]
pub struct ScriptAccumulator {
    buffer: Option<String>,
    fragments: usize,
}

impl ScriptAccumulator {
    pub fn append(&mut self, fragment: &str) {
        self.buffer
            .get_or_insert_with(|| BASE_POWERUP_SCRIPT.to_string())
            .push_str(fragment);
        self.fragments += 1;
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    pub fn as_str(&self) -> Option<&str> {
        self.buffer.as_deref()
    }

    /// The complete script file to write back.
    pub fn into_script(self) -> String {
        self.buffer
            .unwrap_or_else(|| BASE_POWERUP_SCRIPT.to_string())
    }
}

/// Per-scenario wrapper scripts. The wrapper replaces the level script and
/// must run the original first, so its preamble imports the renamed copy
/// before loading the shared pickup script.
#[derive(Debug, Default)]
pub struct LevelScripts {
    scripts: BTreeMap<String, String>,
}

impl LevelScripts {
    fn wrapper_mut(&mut self, scenario: &str) -> &mut String {
        self.scripts.entry(scenario.to_string()).or_insert_with(|| {
            let scenario_path = path_for_level(scenario);
            [
                format!("Game.LogWarn(0, 'Loading original {scenario}...')"),
                format!("Game.ImportLibrary('{scenario_path}_original.lua')"),
                format!("Game.LogWarn(0, 'Loaded original {scenario}.')"),
                format!("Game.DoFile('{POWERUP_SCRIPT_IMPORT}')\n\n"),
            ]
            .join("\n")
        })
    }

    /// Binds `callback` so it grants `pickup_class` after the original
    /// handler ran.
    pub fn append_callback(&mut self, callback: &LuaCallback, pickup_class: &str) -> Result<()> {
        let args: Vec<String> = (0..callback.arg_count).map(|i| format!("_ARG_{i}_")).collect();
        let body = replace_template(
            BOSS_POWERUP_TEMPLATE,
            &[
                ("scenario", callback.scenario.clone()),
                ("funcname", callback.function_name.clone()),
                ("pickup_class", pickup_class.to_string()),
                ("args", args.join(", ")),
            ],
        )?;
        self.wrapper_mut(&callback.scenario).push_str(&body);
        Ok(())
    }

    pub fn get(&self, scenario: &str) -> Option<&str> {
        self.scripts.get(scenario).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Writes every wrapper over its level script.
    pub fn flush(self, editor: &mut dyn Editor) -> Result<()> {
        for (scenario, script) in self.scripts {
            let path = format!("{}.lc", path_for_level(&scenario));
            debug!("writing level wrapper {}", path);
            editor.replace_asset(&path, Asset::Script(script))?;
        }
        Ok(())
    }
}

/// Keeps the level's original script reachable as `{scenario_path}_original`
/// in the same packages as the original.
pub fn ensure_script_copy(editor: &mut dyn Editor, scenario_path: &str) -> Result<()> {
    let original = format!("{scenario_path}.lc");
    let renamed = format!("{scenario_path}_original.lc");
    if editor.asset_exists(&renamed) {
        return Ok(());
    }

    let script = editor.get_script(&original)?;
    let packages: BTreeSet<String> = editor.find_packages_containing(&original);
    editor.add_asset(&renamed, Asset::Script(script), &packages)
}
