use log::debug;

use crate::editor::{Asset, Editor};
use crate::Result;

const LOCALIZATION_ROOT: &str = "system/localization";

pub fn table_path(table: &str) -> String {
    format!("{LOCALIZATION_ROOT}/{table}")
}

/// Writes `caption` under `key` in every listed table.
pub fn propagate_caption(
    editor: &mut dyn Editor,
    tables: &[String],
    key: &str,
    caption: &str,
) -> Result<()> {
    for table in tables {
        let path = table_path(table);
        let mut text = editor.get_text(&path)?;
        text.strings.insert(key.to_string(), caption.to_string());
        editor.replace_asset(&path, Asset::Text(text))?;
        debug!("{}: {} = {:?}", path, key, caption);
    }
    Ok(())
}
