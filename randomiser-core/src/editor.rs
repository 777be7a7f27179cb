//! The asset-container collaborator every patch step goes through.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::world::{Scenario, ScenarioMap, SubareaManager};
use crate::{ActorDef, PatcherError, Result};

pub const LEVEL_ROOT: &str = "maps/levels/c10_samus";

/// Base asset path (no extension) shared by a level's graph, map and script.
pub fn path_for_level(level: &str) -> String {
    format!("{LEVEL_ROOT}/{level}/{level}")
}

/// Direct reference to an actor placed in a level layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorLocator {
    pub scenario: String,
    pub layer: String,
    pub actor: String,
}

impl ActorLocator {
    pub fn new(scenario: &str, layer: &str, actor: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            layer: layer.to_string(),
            actor: actor.to_string(),
        }
    }

    pub(crate) fn not_found(&self) -> PatcherError {
        PatcherError::ActorNotFound {
            scenario: self.scenario.clone(),
            layer: self.layer.clone(),
            actor: self.actor.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    ActorDef,
    Text,
    Script,
    Scenario,
    Map,
    Subareas,
}

impl AssetKind {
    pub fn for_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1;
        match ext.to_ascii_lowercase().as_str() {
            "bmsad" => Some(AssetKind::ActorDef),
            "txt" => Some(AssetKind::Text),
            "lc" | "lua" => Some(AssetKind::Script),
            "brfld" => Some(AssetKind::Scenario),
            "bmmap" => Some(AssetKind::Map),
            "brsa" => Some(AssetKind::Subareas),
            _ => None,
        }
    }

    /// Structured kinds are stored as JSON documents; scripts are raw text.
    pub fn is_structured(self) -> bool {
        !matches!(self, AssetKind::Script)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::ActorDef => "actor definition",
            AssetKind::Text => "localization table",
            AssetKind::Script => "script",
            AssetKind::Scenario => "world graph",
            AssetKind::Map => "level map",
            AssetKind::Subareas => "subarea manager",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextTable {
    pub strings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    ActorDef(ActorDef),
    Text(TextTable),
    Script(String),
    Scenario(Scenario),
    Map(ScenarioMap),
    Subareas(SubareaManager),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::ActorDef(_) => AssetKind::ActorDef,
            Asset::Text(_) => AssetKind::Text,
            Asset::Script(_) => AssetKind::Script,
            Asset::Scenario(_) => AssetKind::Scenario,
            Asset::Map(_) => AssetKind::Map,
            Asset::Subareas(_) => AssetKind::Subareas,
        }
    }

    pub fn decode(kind: AssetKind, data: &[u8]) -> Result<Self> {
        Ok(match kind {
            AssetKind::ActorDef => Asset::ActorDef(serde_json::from_slice(data)?),
            AssetKind::Text => Asset::Text(serde_json::from_slice(data)?),
            AssetKind::Script => Asset::Script(
                String::from_utf8(data.to_vec())
                    .map_err(|e| PatcherError::Config(format!("script is not UTF-8: {e}")))?,
            ),
            AssetKind::Scenario => Asset::Scenario(serde_json::from_slice(data)?),
            AssetKind::Map => Asset::Map(serde_json::from_slice(data)?),
            AssetKind::Subareas => Asset::Subareas(serde_json::from_slice(data)?),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Asset::ActorDef(def) => serde_json::to_vec_pretty(def)?,
            Asset::Text(text) => serde_json::to_vec_pretty(text)?,
            Asset::Script(script) => script.as_bytes().to_vec(),
            Asset::Scenario(scenario) => serde_json::to_vec_pretty(scenario)?,
            Asset::Map(map) => serde_json::to_vec_pretty(map)?,
            Asset::Subareas(manager) => serde_json::to_vec_pretty(manager)?,
        })
    }

    pub fn into_actor_def(self, path: &str) -> Result<ActorDef> {
        match self {
            Asset::ActorDef(def) => Ok(def),
            _ => Err(wrong_kind(path, AssetKind::ActorDef)),
        }
    }

    pub fn into_text(self, path: &str) -> Result<TextTable> {
        match self {
            Asset::Text(text) => Ok(text),
            _ => Err(wrong_kind(path, AssetKind::Text)),
        }
    }

    pub fn into_script(self, path: &str) -> Result<String> {
        match self {
            Asset::Script(script) => Ok(script),
            _ => Err(wrong_kind(path, AssetKind::Script)),
        }
    }
}

pub(crate) fn wrong_kind(path: &str, expected: AssetKind) -> PatcherError {
    PatcherError::WrongAssetKind {
        path: path.to_string(),
        expected,
    }
}

/// Loading, registering and replacing assets, plus the package membership
/// index. Parsed level data is handed out by mutable reference so fixes can
/// edit it in place.
pub trait Editor {
    /// Packages whose membership index lists `path`.
    fn find_packages_containing(&self, path: &str) -> BTreeSet<String>;

    fn asset_exists(&self, path: &str) -> bool;

    /// Returns an owned copy of the asset at `path`.
    fn get_asset(&mut self, path: &str, kind: AssetKind) -> Result<Asset>;

    /// Registers a new asset and lists it in every package of `packages`.
    fn add_asset(&mut self, path: &str, asset: Asset, packages: &BTreeSet<String>) -> Result<()>;

    /// Replaces the content at `path`, creating it if it does not exist yet.
    fn replace_asset(&mut self, path: &str, asset: Asset) -> Result<()>;

    fn ensure_dependency_present(&mut self, package: &str, path: &str) -> Result<()>;

    fn world_graph_mut(&mut self, level: &str) -> Result<&mut Scenario>;

    fn map_mut(&mut self, level: &str) -> Result<&mut ScenarioMap>;

    fn subarea_manager_mut(&mut self, level: &str) -> Result<&mut SubareaManager>;

    fn remove_entity(&mut self, locator: &ActorLocator) -> Result<()> {
        let scenario = self.world_graph_mut(&locator.scenario)?;
        scenario
            .remove_actor(&locator.layer, &locator.actor)
            .map(|_| ())
            .ok_or_else(|| locator.not_found())
    }

    fn get_actor_def(&mut self, path: &str) -> Result<ActorDef> {
        self.get_asset(path, AssetKind::ActorDef)?.into_actor_def(path)
    }

    fn get_text(&mut self, path: &str) -> Result<TextTable> {
        self.get_asset(path, AssetKind::Text)?.into_text(path)
    }

    fn get_script(&mut self, path: &str) -> Result<String> {
        self.get_asset(path, AssetKind::Script)?.into_script(path)
    }
}
