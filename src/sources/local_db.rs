//! 本地食品添加剂数据表 - 数据源层
//!
//! 编译期静态表（E 编号数据），启动即可用，查询为内存操作，
//! 无重试、无超时

use async_trait::async_trait;
use phf::phf_map;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::models::{SourceId, SourcePayload, SourceResult};
use crate::sources::SourceAdapter;

/// 单条添加剂记录
struct Additive {
    e_number: &'static str,
    name: &'static str,
    functional_class: &'static str,
    main_use: &'static str,
    diet_note: &'static str,
}

/// 常见食品添加剂静态表，键为小写添加剂名称
static ADDITIVES: phf::Map<&'static str, Additive> = phf_map! {
    "curcumin" => Additive { e_number: "E100", name: "Curcumin", functional_class: "Colour", main_use: "Yellow-orange colouring extracted from turmeric root, used in curry powders, mustards, dairy products and beverages", diet_note: "vegan" },
    "riboflavin" => Additive { e_number: "E101", name: "Riboflavin", functional_class: "Colour", main_use: "Vitamin B2, yellow colouring used in cereals, sauces and processed cheese", diet_note: "vegan" },
    "tartrazine" => Additive { e_number: "E102", name: "Tartrazine", functional_class: "Colour", main_use: "Synthetic lemon-yellow azo dye used in soft drinks, sweets and snacks; linked to hyperactivity in sensitive children", diet_note: "vegan" },
    "carminic acid" => Additive { e_number: "E120", name: "Carminic acid (Cochineal)", functional_class: "Colour", main_use: "Red colouring extracted from cochineal insects, used in yoghurts, sweets and beverages", diet_note: "non-vegetarian" },
    "caramel" => Additive { e_number: "E150a", name: "Plain caramel", functional_class: "Colour", main_use: "Brown colouring produced by heating sugars, used in cola drinks, sauces and baked goods", diet_note: "vegan" },
    "beta-carotene" => Additive { e_number: "E160a", name: "Beta-carotene", functional_class: "Colour", main_use: "Orange colouring and provitamin A, used in margarine, cheese and juices", diet_note: "vegan" },
    "sorbic acid" => Additive { e_number: "E200", name: "Sorbic acid", functional_class: "Preservative", main_use: "Inhibits moulds and yeasts in cheese, wine, baked goods and dried fruit", diet_note: "vegan" },
    "sodium benzoate" => Additive { e_number: "E211", name: "Sodium benzoate", functional_class: "Preservative", main_use: "Preservative effective in acidic foods, widely used in soft drinks, pickles and sauces; may form benzene with vitamin C", diet_note: "vegan" },
    "sulphur dioxide" => Additive { e_number: "E220", name: "Sulphur dioxide", functional_class: "Preservative", main_use: "Preservative and antioxidant for dried fruit, wine and fruit juices; can trigger asthma in sensitive individuals", diet_note: "vegan" },
    "sodium nitrite" => Additive { e_number: "E250", name: "Sodium nitrite", functional_class: "Preservative", main_use: "Curing agent for processed meats, prevents botulism and fixes pink colour; intake should be limited", diet_note: "vegan" },
    "acetic acid" => Additive { e_number: "E260", name: "Acetic acid", functional_class: "Acidity regulator", main_use: "The acid of vinegar, used in pickles, sauces and dressings", diet_note: "vegan" },
    "ascorbic acid" => Additive { e_number: "E300", name: "Ascorbic acid", functional_class: "Antioxidant", main_use: "Vitamin C, prevents oxidation in juices, cured meats and flour; also a nutrient fortifier", diet_note: "vegan" },
    "lecithin" => Additive { e_number: "E322", name: "Lecithin", functional_class: "Emulsifier", main_use: "Emulsifier from soy or egg yolk, used in chocolate, margarine and baked goods", diet_note: "vegetarian" },
    "citric acid" => Additive { e_number: "E330", name: "Citric acid", functional_class: "Acidity regulator", main_use: "Most widely used food acid, adds sourness and stabilises pH in beverages, jams and canned food", diet_note: "vegan" },
    "carrageenan" => Additive { e_number: "E407", name: "Carrageenan", functional_class: "Thickener", main_use: "Gelling and thickening agent from red seaweed, used in dairy desserts and plant milks; degraded form is a concern", diet_note: "vegan" },
    "guar gum" => Additive { e_number: "E412", name: "Guar gum", functional_class: "Thickener", main_use: "Thickener from guar beans, used in ice cream, sauces and gluten-free baking", diet_note: "vegan" },
    "gelatine" => Additive { e_number: "E441", name: "Gelatine", functional_class: "Gelling agent", main_use: "Protein gelling agent from animal collagen, used in gummy sweets, marshmallows and desserts", diet_note: "non-vegetarian" },
    "sodium tripolyphosphate" => Additive { e_number: "E451", name: "Sodium tripolyphosphate", functional_class: "Stabiliser", main_use: "Moisture retainer in processed seafood and meats; high phosphate intake is a renal concern", diet_note: "vegan" },
    "monosodium glutamate" => Additive { e_number: "E621", name: "Monosodium glutamate", functional_class: "Flavour enhancer", main_use: "Umami flavour enhancer used in savoury snacks, soups and Asian cuisine", diet_note: "vegan" },
    "aspartame" => Additive { e_number: "E951", name: "Aspartame", functional_class: "Sweetener", main_use: "Intense sweetener about 200x sweeter than sugar, used in diet drinks and sugar-free products; contains phenylalanine", diet_note: "vegan" },
};

/// 本地数据表适配器
pub struct LocalDbSource;

impl LocalDbSource {
    pub fn new() -> Self {
        Self
    }

    /// 大小写不敏感的子串匹配：表内名称包含查询词即命中
    fn lookup(ingredient: &str) -> Option<&'static Additive> {
        let needle = ingredient.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        ADDITIVES
            .entries()
            .find(|(name, _)| name.contains(&needle))
            .map(|(_, additive)| additive)
    }

    fn to_record(additive: &Additive) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("E No.".to_string(), Value::String(additive.e_number.to_string()));
        record.insert("Name of Additive".to_string(), Value::String(additive.name.to_string()));
        record.insert("Functional Class".to_string(), Value::String(additive.functional_class.to_string()));
        record.insert("Main Use".to_string(), Value::String(additive.main_use.to_string()));
        record.insert("Diet Note".to_string(), Value::String(additive.diet_note.to_string()));
        record
    }
}

impl Default for LocalDbSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceAdapter for LocalDbSource {
    fn id(&self) -> SourceId {
        SourceId::LocalDb
    }

    async fn fetch(&self, ingredient: &str) -> SourceResult {
        info!("搜索本地数据表: {}", ingredient);

        match Self::lookup(ingredient) {
            Some(additive) => {
                debug!("本地数据表命中: {} ({})", additive.name, additive.e_number);
                SourceResult::found(
                    SourceId::LocalDb,
                    SourcePayload::Record(Self::to_record(additive)),
                )
            }
            None => SourceResult::not_found(SourceId::LocalDb),
        }
    }
}
