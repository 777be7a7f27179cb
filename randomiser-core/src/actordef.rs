use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{PatcherError, Result};

const POWERUP_TEMPLATE: &str = include_str!("../assets/template_powerup_bmsad.json");

pub(crate) const MODEL_NAME: &str = "/property/model_name";
pub(crate) const MODEL_UPDATER_MODEL: &str =
    "/property/components/MODELUPDATER/functions/0/params/Param1/value";
pub(crate) const SCRIPT_CLASS: &str =
    "/property/components/SCRIPT/functions/0/params/Param2/value";
const PICKABLE_FIELDS: &str = "/property/components/PICKABLE/fields/fields";
const PICKABLE_PARAMS: &str = "/property/components/PICKABLE/functions/0/params";
const AI_FIELDS: &str = "/property/components/AI/fields/fields";

/// An actor-class asset. Kept as the parsed document so fields this crate
/// never touches survive untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorDef {
    raw: Value,
}

impl ActorDef {
    pub fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    /// Derives a fresh, independent copy of the pickup template.
    pub fn powerup_template() -> Result<Self> {
        Ok(Self::from_value(serde_json::from_str(POWERUP_TEMPLATE)?))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.set("/name", name)
    }

    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.raw.pointer(pointer)
    }

    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.get(pointer).and_then(Value::as_str)
    }

    /// Writes `value` at a JSON pointer. The parent must exist; the last
    /// segment is created when missing.
    pub fn set(&mut self, pointer: &str, value: impl Into<Value>) -> Result<()> {
        let (parent, key) = pointer
            .rsplit_once('/')
            .ok_or_else(|| self.malformed(pointer))?;
        let asset = self.asset_name();
        let slot = match self.raw.pointer_mut(parent) {
            Some(Value::Object(map)) => map.entry(key.to_string()).or_insert(Value::Null),
            Some(Value::Array(items)) => key
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index))
                .ok_or_else(|| PatcherError::MalformedAsset {
                    asset: asset.clone(),
                    field: pointer.to_string(),
                })?,
            _ => {
                return Err(PatcherError::MalformedAsset {
                    asset,
                    field: parent.to_string(),
                })
            }
        };
        *slot = value.into();
        Ok(())
    }

    pub fn set_pickable_field(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.set(&format!("{PICKABLE_FIELDS}/{field}"), value)
    }

    /// Sets the `value` of `ParamN` in the pickable `SetCustomParams` call.
    pub fn set_custom_param(&mut self, index: u8, value: impl Into<Value>) -> Result<()> {
        self.set(&format!("{PICKABLE_PARAMS}/Param{index}/value"), value)
    }

    /// Adds (or overwrites) a whole typed `ParamN` entry.
    pub fn insert_custom_param(&mut self, index: u8, type_tag: &str, value: impl Into<Value>) -> Result<()> {
        let mut param = Map::new();
        param.insert("type".to_string(), Value::from(type_tag));
        param.insert("value".to_string(), value.into());
        self.set(&format!("{PICKABLE_PARAMS}/Param{index}"), Value::Object(param))
    }

    pub fn custom_param(&self, index: u8) -> Option<&Value> {
        self.get(&format!("{PICKABLE_PARAMS}/Param{index}/value"))
    }

    pub fn pickable_field(&self, field: &str) -> Option<&Value> {
        self.get(&format!("{PICKABLE_FIELDS}/{field}"))
    }

    pub fn set_ai_field(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.set(&format!("{AI_FIELDS}/{field}"), value)
    }

    pub fn ai_field(&self, field: &str) -> Option<&Value> {
        self.get(&format!("{AI_FIELDS}/{field}"))
    }

    pub fn script_class(&self) -> Option<&str> {
        self.get_str(SCRIPT_CLASS)
    }

    fn asset_name(&self) -> String {
        self.name().unwrap_or("<unnamed>").to_string()
    }

    fn malformed(&self, field: &str) -> PatcherError {
        PatcherError::MalformedAsset {
            asset: self.asset_name(),
            field: field.to_string(),
        }
    }
}
