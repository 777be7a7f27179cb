use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod actordef;
pub mod boss;
pub mod editor;
pub mod items;
pub mod localization;
pub mod lua;
pub mod models;
pub mod pickup;
pub mod progressive;
pub mod project;
pub mod run;
pub mod static_fixes;
pub mod world;

#[cfg(test)]
mod fixtures;

pub use actordef::ActorDef;
pub use editor::{path_for_level, ActorLocator, Asset, AssetKind, Editor, TextTable};
pub use pickup::{patch_pickup, LuaCallback, Pickup, PickupKind, Resource, RewardTarget};
pub use project::ProjectEditor;
pub use run::{GeneratedAsset, PatchRun};
pub use static_fixes::{apply_static_fixes, StaticFixSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatcherSettings {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub config_path: PathBuf,
    pub debug: bool,
}

fn default_localization_tables() -> Vec<String> {
    vec!["us_english.txt".to_string()]
}

fn default_static_fixes() -> bool {
    true
}

/// Patch configuration: what to place and where.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatcherConfig {
    pub pickups: Vec<Pickup>,

    /// Localization tables (under `system/localization/`) that receive
    /// reward captions.
    #[serde(default = "default_localization_tables")]
    pub localization_tables: Vec<String>,

    #[serde(default = "default_static_fixes")]
    pub static_fixes: bool,
}

impl PatcherConfig {
    pub fn new(pickups: Vec<Pickup>) -> Self {
        Self {
            pickups,
            localization_tables: default_localization_tables(),
            static_fixes: default_static_fixes(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_slice(&data)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let config: PatcherConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every pickup up front so a bad entry aborts before anything
    /// is mutated.
    pub fn validate(&self) -> Result<()> {
        for (pickup_id, pickup) in self.pickups.iter().enumerate() {
            pickup
                .validate()
                .map_err(|err| err.for_pickup(pickup_id))?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("actor {scenario}/{layer}/{actor} not found")]
    ActorNotFound {
        scenario: String,
        layer: String,
        actor: String,
    },
    #[error("asset not found: {0}")]
    AssetNotFound(String),
    #[error("asset already exists: {0}")]
    DuplicateAsset(String),
    #[error("asset {path} is not a {expected}")]
    WrongAssetKind { path: String, expected: AssetKind },
    #[error("asset {asset} is missing field {field}")]
    MalformedAsset { asset: String, field: String },
    #[error("progressive pickups cannot include expansions (found {item_id})")]
    ExpansionInProgression { item_id: String },
    #[error("item id '{0}' cannot be used in a generated script class")]
    InvalidScriptItemId(String),
    #[error("unable to flip icon {0}")]
    UnrecognizedIconId(String),
    #[error("{scenario}: no map blockage for actor {actor}")]
    MissingMapBlockage { scenario: String, actor: String },
    #[error("{scenario}: no subarea setup named {setup}")]
    MissingSubareaSetup { scenario: String, setup: String },
    #[error("pickup {pickup_id}: {source}")]
    Pickup {
        pickup_id: usize,
        #[source]
        source: Box<PatcherError>,
    },
}

impl PatcherError {
    pub(crate) fn for_pickup(self, pickup_id: usize) -> Self {
        match self {
            PatcherError::Pickup { .. } => self,
            other => PatcherError::Pickup {
                pickup_id,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, PatcherError>;

#[derive(Debug, Clone, Default)]
pub struct PatchSummary {
    pub generated: Vec<GeneratedAsset>,
    pub progressive_classes: usize,
    pub static_fixes: StaticFixSummary,
}

/// Applies every pickup and then the world fixes to `editor`.
///
/// All run-scoped state (class cache, generated script, per-level wrappers)
/// lives in a fresh [`PatchRun`] and is flushed to the editor once at the
/// end.
///
/// The configuration is validated before anything is touched, but a later
/// failure leaves whatever earlier steps already wrote in `editor`. On `Err`
/// the editor is partially patched and must be discarded, not saved.
/// [`ProjectEditor`] only reaches disk on `save`, so dropping it is enough.
pub fn apply_patches(editor: &mut dyn Editor, config: &PatcherConfig) -> Result<PatchSummary> {
    config.validate()?;

    let mut run = PatchRun::new(config.localization_tables.clone());
    for (pickup_id, pickup) in config.pickups.iter().enumerate() {
        debug!(
            "pickup {}: {} ({} resource(s))",
            pickup_id,
            pickup.kind.name(),
            pickup.resources.len()
        );
        patch_pickup(editor, &mut run, pickup, pickup_id)?;
    }

    let static_fixes = if config.static_fixes {
        apply_static_fixes(editor)?
    } else {
        StaticFixSummary::default()
    };

    let flushed = run.flush(editor)?;

    info!(
        "patched {} pickup(s), {} progressive class(es), {} mirrored door(s)",
        config.pickups.len(),
        flushed.progressive_classes,
        static_fixes.mirrored_doors
    );

    Ok(PatchSummary {
        generated: flushed.generated,
        progressive_classes: flushed.progressive_classes,
        static_fixes,
    })
}

pub fn run(settings: PatcherSettings) -> Result<PatchSummary> {
    if !settings.input_path.exists() {
        return Err(PatcherError::Config(format!(
            "Input path does not exist: {}",
            settings.input_path.display()
        )));
    }

    let config = PatcherConfig::load(&settings.config_path)?;
    let mut editor = ProjectEditor::open(&settings.input_path)?;
    let summary = apply_patches(&mut editor, &config)?;

    if !settings.output_path.exists() {
        fs::create_dir_all(&settings.output_path)?;
    }
    let written = editor.save(&settings.output_path)?;
    info!(
        "wrote {} asset(s) to {}",
        written,
        settings.output_path.display()
    );

    if settings.debug {
        let debug_dir = settings.output_path.join("debug");
        fs::create_dir_all(&debug_dir)?;
        for generated in &summary.generated {
            let file_name = format!("{}.json", generated.file_name());
            let text = serde_json::to_string_pretty(generated.actor_def.raw())?;
            fs::write(debug_dir.join(file_name), text)?;
        }
    }

    Ok(summary)
}
