use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One crafting input: item and required quantity, both positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reagent {
    pub item_id: u32,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_id: String,
    pub profession_id: u32,
    pub name: String,
    pub min_skill: u32,
    pub orange_until: u32,
    pub yellow_until: u32,
    pub green_until: u32,
    pub gray_at: u32,
    pub reagents: Vec<Reagent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u32>,
}

/// One profession's exported recipe list, recipes sorted by (minSkill, name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionPack {
    pub profession_id: u32,
    pub profession_name: String,
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemName {
    item_id: u32,
    name: String,
}

/// Existing item-name table, or empty when the file does not exist yet.
pub fn load_item_names(path: &Path) -> Result<BTreeMap<u32, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let entries: Vec<ItemName> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(entries.into_iter().map(|e| (e.item_id, e.name)).collect())
}

/// Rewrite the item-name table sorted by item id.
pub fn write_item_names(path: &Path, names: &BTreeMap<u32, String>) -> Result<()> {
    let entries: Vec<ItemName> = names
        .iter()
        .map(|(&item_id, name)| ItemName { item_id, name: name.clone() })
        .collect();
    write_json_pretty(path, &entries)
}

pub fn write_pack(path: &Path, pack: &ProfessionPack) -> Result<()> {
    write_json_pretty(path, pack)
}

/// 2-space indentation, trailing newline, non-ASCII left unescaped. Parent
/// directories are created on demand.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let mut text = serde_json::to_string_pretty(value)
        .context("failed to serialize JSON")?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
