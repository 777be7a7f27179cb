//! Parsed world data: level graphs (layers, actors, groups), level maps and
//! sub-area managers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const LINK_PREFIX: &str = "Root:pScenario:rEntitiesLayer:dctSublayers:";
const LINK_ACTORS: &str = ":dctActors:";

/// Builds the weak-reference string that addresses `actor` in `layer`.
pub fn actor_link(layer: &str, actor: &str) -> String {
    format!("{LINK_PREFIX}{layer}{LINK_ACTORS}{actor}")
}

/// Splits a weak reference into `(layer, actor)`. Empty or foreign links
/// yield `None`.
pub fn parse_actor_link(link: &str) -> Option<(&str, &str)> {
    let rest = link.strip_prefix(LINK_PREFIX)?;
    let (layer, actor) = rest.split_once(LINK_ACTORS)?;
    if layer.is_empty() || actor.is_empty() {
        return None;
    }
    Some((layer, actor))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "@type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Component {
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "sName")]
    pub name: String,
    #[serde(rename = "oActorDefLink", default)]
    pub actor_def_link: String,
    #[serde(rename = "vPos", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    #[serde(rename = "vAng", default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<[f64; 3]>,
    #[serde(rename = "pComponents", default)]
    pub components: BTreeMap<String, Component>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Actor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sublayer {
    #[serde(rename = "dctActors", default)]
    pub actors: BTreeMap<String, Actor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitiesLayer {
    #[serde(rename = "dctSublayers", default)]
    pub sublayers: BTreeMap<String, Sublayer>,
    /// Group name to the weak references of its members.
    #[serde(rename = "dctActorGroups", default)]
    pub actor_groups: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A level's world graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(rename = "rEntitiesLayer", default)]
    pub entities: EntitiesLayer,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scenario {
    pub fn actors_in_layer(&self, layer: &str) -> Option<&BTreeMap<String, Actor>> {
        self.entities.sublayers.get(layer).map(|s| &s.actors)
    }

    pub fn actors_in_layer_mut(&mut self, layer: &str) -> Option<&mut BTreeMap<String, Actor>> {
        self.entities.sublayers.get_mut(layer).map(|s| &mut s.actors)
    }

    pub fn actor(&self, layer: &str, name: &str) -> Option<&Actor> {
        self.actors_in_layer(layer)?.get(name)
    }

    pub fn actor_mut(&mut self, layer: &str, name: &str) -> Option<&mut Actor> {
        self.actors_in_layer_mut(layer)?.get_mut(name)
    }

    /// Places `actor` in `layer` under its own name, creating the layer when
    /// needed. Returns the actor it replaced, if any.
    pub fn insert_actor(&mut self, layer: &str, actor: Actor) -> Option<Actor> {
        self.entities
            .sublayers
            .entry(layer.to_string())
            .or_default()
            .actors
            .insert(actor.name.clone(), actor)
    }

    /// Every actor as `(layer, name, actor)`, in layer then name order.
    pub fn all_actors(&self) -> impl Iterator<Item = (&str, &str, &Actor)> {
        self.entities.sublayers.iter().flat_map(|(layer, sublayer)| {
            sublayer
                .actors
                .iter()
                .map(move |(name, actor)| (layer.as_str(), name.as_str(), actor))
        })
    }

    /// Resolves a weak reference. Unresolvable links are a normal outcome.
    pub fn follow_link(&self, link: &str) -> Option<&Actor> {
        let (layer, actor) = parse_actor_link(link)?;
        self.actor(layer, actor)
    }

    pub fn follow_link_mut(&mut self, link: &str) -> Option<&mut Actor> {
        let (layer, actor) = parse_actor_link(link)?;
        self.actor_mut(layer, actor)
    }

    pub fn all_actor_groups(&self) -> Vec<String> {
        self.entities.actor_groups.keys().cloned().collect()
    }

    pub fn is_actor_in_group(&self, group: &str, actor: &str, layer: &str) -> bool {
        let link = actor_link(layer, actor);
        self.entities
            .actor_groups
            .get(group)
            .map_or(false, |members| members.iter().any(|m| *m == link))
    }

    pub fn add_actor_to_group(&mut self, group: &str, actor: &str, layer: &str) {
        let link = actor_link(layer, actor);
        let members = self
            .entities
            .actor_groups
            .entry(group.to_string())
            .or_default();
        if !members.contains(&link) {
            members.push(link);
        }
    }

    /// Removes an actor and every group membership pointing at it.
    pub fn remove_actor(&mut self, layer: &str, name: &str) -> Option<Actor> {
        let removed = self.actors_in_layer_mut(layer)?.remove(name)?;
        let link = actor_link(layer, name);
        for members in self.entities.actor_groups.values_mut() {
            members.retain(|m| *m != link);
        }
        Some(removed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "Min")]
    pub min: [f64; 2],
    #[serde(rename = "Max")]
    pub max: [f64; 2],
}

impl BoundingBox {
    /// Moves the box along X without resizing it.
    pub fn translate_x(&mut self, delta: f64) {
        self.min[0] += delta;
        self.max[0] += delta;
    }
}

/// Minimap marker for an actor that blocks passage (doors, shields).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapBlockage {
    #[serde(rename = "sIconId")]
    pub icon_id: String,
    #[serde(rename = "oBox")]
    pub bbox: BoundingBox,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMap {
    #[serde(rename = "mapBlockages", default)]
    pub blockages: BTreeMap<String, MapBlockage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubareaConfig {
    #[serde(rename = "sId")]
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubareaSetup {
    #[serde(rename = "sId")]
    pub id: String,
    #[serde(rename = "vSubareaConfigs", default)]
    pub configs: Vec<SubareaConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubareaManager {
    #[serde(rename = "rSubareaSetups", default)]
    pub setups: Vec<SubareaSetup>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubareaManager {
    pub fn get_subarea_setup(&mut self, name: &str) -> Option<&mut SubareaSetup> {
        self.setups.iter_mut().find(|setup| setup.id == name)
    }
}
