use log::debug;

use crate::editor::{Asset, Editor};
use crate::lua::{LevelScripts, POWERUP_SCRIPT_PATH};
use crate::progressive::ProgressiveClasses;
use crate::{ActorDef, Result};

/// An actor class derived from the pickup template during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAsset {
    pub path: String,
    pub actor_def: ActorDef,
}

impl GeneratedAsset {
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// State owned by exactly one patch run. Build a new one per run; nothing
/// here is shared between runs.
#[derive(Debug, Default)]
pub struct PatchRun {
    pub(crate) classes: ProgressiveClasses,
    pub(crate) level_scripts: LevelScripts,
    localization_tables: Vec<String>,
    generated: Vec<GeneratedAsset>,
}

#[derive(Debug)]
pub struct FlushedRun {
    pub generated: Vec<GeneratedAsset>,
    pub progressive_classes: usize,
}

impl PatchRun {
    pub fn new(localization_tables: Vec<String>) -> Self {
        Self {
            localization_tables,
            ..Self::default()
        }
    }

    pub fn localization_tables(&self) -> &[String] {
        &self.localization_tables
    }

    pub fn generated(&self) -> &[GeneratedAsset] {
        &self.generated
    }

    pub fn classes(&self) -> &ProgressiveClasses {
        &self.classes
    }

    pub fn level_scripts(&self) -> &LevelScripts {
        &self.level_scripts
    }

    pub(crate) fn record_generated(&mut self, path: String, actor_def: ActorDef) {
        self.generated.push(GeneratedAsset { path, actor_def });
    }

    /// Writes the shared pickup script and every level wrapper back to the
    /// editor, consuming the run.
    pub fn flush(self, editor: &mut dyn Editor) -> Result<FlushedRun> {
        let progressive_classes = self.classes.len();
        debug!(
            "flushing {} progressive class(es), {} level wrapper(s)",
            progressive_classes,
            self.level_scripts.len()
        );
        editor.replace_asset(POWERUP_SCRIPT_PATH, Asset::Script(self.classes.into_script()))?;
        self.level_scripts.flush(editor)?;

        Ok(FlushedRun {
            generated: self.generated,
            progressive_classes,
        })
    }
}
