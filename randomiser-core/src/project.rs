//! Directory-backed [`Editor`] over an extracted game project.
//!
//! Layout on disk:
//!
//! ```text
//! <root>/packages.json            package id -> list of asset paths
//! <root>/assets/<path>[.json][.gz]
//! ```
//!
//! Structured assets are JSON documents with a `.json` suffix after their
//! real extension; scripts are stored as plain text. Either form may be
//! gzip-compressed. Assets are decoded on first use and every change stays in
//! memory until [`ProjectEditor::save`] is called.

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::editor::{path_for_level, wrong_kind, Asset, AssetKind, Editor};
use crate::world::{Scenario, ScenarioMap, SubareaManager};
use crate::{PatcherError, Result};

const PACKAGES_FILE: &str = "packages.json";
const ASSETS_DIR: &str = "assets";
const JSON_SUFFIX: &str = ".json";
const GZ_SUFFIX: &str = ".gz";

#[derive(Debug, Clone)]
struct DiskEntry {
    file: PathBuf,
    compressed: bool,
}

#[derive(Debug, Default)]
pub struct ProjectEditor {
    /// Decoded assets, loaded lazily from `on_disk` or inserted directly.
    assets: BTreeMap<String, Asset>,
    on_disk: BTreeMap<String, DiskEntry>,
    packages: BTreeMap<String, BTreeSet<String>>,
    modified: BTreeSet<String>,
    packages_modified: bool,
}

impl ProjectEditor {
    /// An empty project with no backing directory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(root: &Path) -> Result<Self> {
        let mut editor = Self::default();

        let index_path = root.join(PACKAGES_FILE);
        if index_path.exists() {
            let data = fs::read(&index_path)?;
            editor.packages = serde_json::from_slice(&data)?;
        }

        let assets_root = root.join(ASSETS_DIR);
        if assets_root.is_dir() {
            for entry in WalkDir::new(&assets_root)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(rel_path) = entry.path().strip_prefix(&assets_root) else {
                    continue;
                };
                let rel = rel_path.to_string_lossy().replace('\\', "/");
                let (asset_path, compressed) = asset_path_for_file(&rel);
                editor.on_disk.insert(
                    asset_path,
                    DiskEntry {
                        file: entry.path().to_path_buf(),
                        compressed,
                    },
                );
            }
        }

        info!(
            "opened {}: {} asset file(s), {} package(s)",
            root.display(),
            editor.on_disk.len(),
            editor.packages.len()
        );
        Ok(editor)
    }

    /// Seeds an asset without marking it as changed.
    pub fn insert_asset(&mut self, path: &str, asset: Asset) {
        self.assets.insert(path.to_string(), asset);
    }

    pub fn add_to_package(&mut self, package: &str, path: &str) {
        self.packages
            .entry(package.to_string())
            .or_default()
            .insert(path.to_string());
    }

    pub fn package_contents(&self, package: &str) -> Option<&BTreeSet<String>> {
        self.packages.get(package)
    }

    /// Decoded asset, if it was loaded or inserted.
    pub fn asset(&self, path: &str) -> Option<&Asset> {
        self.assets.get(path)
    }

    pub fn modified_assets(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    /// Writes every changed asset, and the package index when it changed,
    /// below `output`. Returns the number of asset files written.
    pub fn save(&self, output: &Path) -> Result<usize> {
        let mut written = 0;
        for path in &self.modified {
            let asset = self
                .assets
                .get(path)
                .ok_or_else(|| PatcherError::AssetNotFound(path.clone()))?;
            let compressed = self.on_disk.get(path).map_or(false, |entry| entry.compressed);

            let mut file_name = path.clone();
            if asset.kind().is_structured() {
                file_name.push_str(JSON_SUFFIX);
            }
            let mut bytes = asset.encode()?;
            if compressed {
                file_name.push_str(GZ_SUFFIX);
                bytes = compress(&bytes)?;
            }

            let target = output.join(ASSETS_DIR).join(&file_name);
            debug!("writing {}", target.display());
            write_bytes_atomic(&target, &bytes)?;
            written += 1;
        }

        if self.packages_modified {
            let index = serde_json::to_vec_pretty(&self.packages)?;
            write_bytes_atomic(&output.join(PACKAGES_FILE), &index)?;
        }
        Ok(written)
    }

    fn load(&mut self, path: &str, kind: AssetKind) -> Result<&mut Asset> {
        if !self.assets.contains_key(path) {
            let entry = self
                .on_disk
                .get(path)
                .ok_or_else(|| PatcherError::AssetNotFound(path.to_string()))?;
            let mut data = fs::read(&entry.file)?;
            if entry.compressed {
                data = decompress(&data)?;
            }
            let asset = Asset::decode(kind, &data)?;
            self.assets.insert(path.to_string(), asset);
        }

        match self.assets.get_mut(path) {
            Some(asset) if asset.kind() == kind => Ok(asset),
            Some(_) => Err(wrong_kind(path, kind)),
            None => Err(PatcherError::AssetNotFound(path.to_string())),
        }
    }

    /// Loads an asset for in-place editing and records it as changed.
    fn load_for_edit(&mut self, path: String, kind: AssetKind) -> Result<&mut Asset> {
        self.load(&path, kind)?;
        self.modified.insert(path.clone());
        self.load(&path, kind)
    }
}

/// Maps a file below `assets/` to its asset path and whether it is
/// compressed.
fn asset_path_for_file(rel: &str) -> (String, bool) {
    let (stem, compressed) = match rel.strip_suffix(GZ_SUFFIX) {
        Some(stem) => (stem, true),
        None => (rel, false),
    };
    let path = match stem.strip_suffix(JSON_SUFFIX) {
        Some(inner) if AssetKind::for_path(inner).map_or(false, AssetKind::is_structured) => inner,
        _ => stem,
    };
    (path.to_string(), compressed)
}

fn decompress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    if let Err(error) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(error);
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("asset");
    path.with_file_name(format!("{file_name}.tmp"))
}

impl Editor for ProjectEditor {
    fn find_packages_containing(&self, path: &str) -> BTreeSet<String> {
        self.packages
            .iter()
            .filter(|(_, contents)| contents.contains(path))
            .map(|(package, _)| package.clone())
            .collect()
    }

    fn asset_exists(&self, path: &str) -> bool {
        self.assets.contains_key(path) || self.on_disk.contains_key(path)
    }

    fn get_asset(&mut self, path: &str, kind: AssetKind) -> Result<Asset> {
        self.load(path, kind).map(|asset| asset.clone())
    }

    fn add_asset(&mut self, path: &str, asset: Asset, packages: &BTreeSet<String>) -> Result<()> {
        if self.asset_exists(path) {
            return Err(PatcherError::DuplicateAsset(path.to_string()));
        }
        self.assets.insert(path.to_string(), asset);
        self.modified.insert(path.to_string());
        for package in packages {
            self.add_to_package(package, path);
        }
        if !packages.is_empty() {
            self.packages_modified = true;
        }
        Ok(())
    }

    fn replace_asset(&mut self, path: &str, asset: Asset) -> Result<()> {
        self.assets.insert(path.to_string(), asset);
        self.modified.insert(path.to_string());
        Ok(())
    }

    fn ensure_dependency_present(&mut self, package: &str, path: &str) -> Result<()> {
        let contents = self
            .packages
            .get_mut(package)
            .ok_or_else(|| PatcherError::AssetNotFound(package.to_string()))?;
        if contents.insert(path.to_string()) {
            self.packages_modified = true;
        }
        Ok(())
    }

    fn world_graph_mut(&mut self, level: &str) -> Result<&mut Scenario> {
        let path = format!("{}.brfld", path_for_level(level));
        match self.load_for_edit(path.clone(), AssetKind::Scenario)? {
            Asset::Scenario(scenario) => Ok(scenario),
            _ => Err(wrong_kind(&path, AssetKind::Scenario)),
        }
    }

    fn map_mut(&mut self, level: &str) -> Result<&mut ScenarioMap> {
        let path = format!("{}.bmmap", path_for_level(level));
        match self.load_for_edit(path.clone(), AssetKind::Map)? {
            Asset::Map(map) => Ok(map),
            _ => Err(wrong_kind(&path, AssetKind::Map)),
        }
    }

    fn subarea_manager_mut(&mut self, level: &str) -> Result<&mut SubareaManager> {
        let path = format!("{}.brsa", path_for_level(level));
        match self.load_for_edit(path.clone(), AssetKind::Subareas)? {
            Asset::Subareas(manager) => Ok(manager),
            _ => Err(wrong_kind(&path, AssetKind::Subareas)),
        }
    }
}
