use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelData {
    pub bcmdl_path: &'static str,
    pub dependencies: &'static [&'static str],
}

pub const DEFAULT_MODEL: &str = "itemsphere";

const ITEMSPHERE: ModelData = ModelData {
    bcmdl_path: "actors/items/itemsphere/models/itemsphere.bcmdl",
    dependencies: &[
        "actors/items/itemsphere/models/itemsphere.bcmdl",
        "actors/items/itemsphere/models/imats/itemsphere_mp_opaque_01.bsmat",
        "actors/items/itemsphere/fx/itemsphere.bcptl",
    ],
};

macro_rules! powerup_model {
    ($name:literal) => {
        ModelData {
            bcmdl_path: concat!("actors/items/", $name, "/models/", $name, ".bcmdl"),
            dependencies: &[
                concat!("actors/items/", $name, "/models/", $name, ".bcmdl"),
                concat!("actors/items/", $name, "/models/imats/", $name, "_mp_opaque_01.bsmat"),
                concat!("actors/items/", $name, "/charclasses/", $name, ".bmsas"),
            ],
        }
    };
}

static MODELS: &[(&str, ModelData)] = &[
    ("itemsphere", ITEMSPHERE),
    ("item_energytank", powerup_model!("item_energytank")),
    ("item_energyfragment", powerup_model!("item_energyfragment")),
    ("item_missiletank", powerup_model!("item_missiletank")),
    ("item_powerbombtank", powerup_model!("item_powerbombtank")),
    ("powerup_chargebeam", powerup_model!("powerup_chargebeam")),
    ("powerup_widebeam", powerup_model!("powerup_widebeam")),
    ("powerup_plasmabeam", powerup_model!("powerup_plasmabeam")),
    ("powerup_wavebeam", powerup_model!("powerup_wavebeam")),
    ("powerup_variasuit", powerup_model!("powerup_variasuit")),
    ("powerup_gravitysuit", powerup_model!("powerup_gravitysuit")),
    ("powerup_spacejump", powerup_model!("powerup_spacejump")),
    ("powerup_screwattack", powerup_model!("powerup_screwattack")),
    ("powerup_morphball", powerup_model!("powerup_morphball")),
    ("powerup_bomb", powerup_model!("powerup_bomb")),
    ("powerup_powerbomb", powerup_model!("powerup_powerbomb")),
];

pub fn lookup(name: &str) -> Option<&'static ModelData> {
    MODELS
        .iter()
        .find(|(model, _)| *model == name)
        .map(|(_, data)| data)
}

/// Resolves `name`, falling back to the item sphere for unknown models.
pub fn resolve(name: &str) -> &'static ModelData {
    lookup(name).unwrap_or_else(|| {
        warn!("unknown model '{}', using {}", name, DEFAULT_MODEL);
        &MODELS[0].1
    })
}
