use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::BackfillConfig;
use crate::parser::{duration, spell_page};

static SPELL_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:wowhead_)?spell_(\d+)\.html$").unwrap());

/// Cooldown facts recovered from one cached spell page.
#[derive(Debug, Clone)]
pub struct SpellCooldownInfo {
    pub spell_id: u32,
    pub creates_item_id: u32,
    pub cooldown_seconds: u32,
    pub source_path: PathBuf,
}

/// Enumerate cached spell pages across the cache roots, deduplicated by path.
/// Nonexistent roots are skipped.
fn spell_pages(cache_roots: &[PathBuf]) -> Vec<(u32, PathBuf)> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut pages = Vec::new();

    for root in cache_roots {
        let Ok(entries) = fs::read_dir(root) else { continue };
        for entry in entries.flatten() {
            let path = entry.path();
            if !seen.insert(path.clone()) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            let Some(caps) = SPELL_FILE_RE.captures(name) else { continue };
            let Ok(spell_id) = caps[1].parse::<u32>() else { continue };
            pages.push((spell_id, path));
        }
    }
    pages
}

/// Scan the cache roots and pull cooldown info out of every page that has a
/// positive cooldown and a creates-item id. Everything else is skipped.
pub fn load_spell_cooldowns(cache_roots: &[PathBuf]) -> Vec<SpellCooldownInfo> {
    let pages = spell_pages(cache_roots);

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut out = Vec::new();
    for (spell_id, path) in pages {
        pb.inc(1);

        let Ok(bytes) = fs::read(&path) else {
            debug!("Unreadable spell page: {}", path.display());
            continue;
        };
        let html = String::from_utf8_lossy(&bytes);

        let Some(cell) = spell_page::cooldown_cell(&html) else { continue };
        let Some(cooldown_seconds) = duration::parse_duration_seconds(cell) else {
            debug!("Spell {} has no parseable cooldown", spell_id);
            continue;
        };
        let Some(creates_item_id) = spell_page::creates_item_id(&html) else {
            debug!("Spell {} has a cooldown but no created item", spell_id);
            continue;
        };

        out.push(SpellCooldownInfo {
            spell_id,
            creates_item_id,
            cooldown_seconds,
            source_path: path,
        });
    }
    pb.finish_and_clear();
    out
}

/// Map created item → cooldown. First-seen wins: a later spell mapping the
/// same item to a different cooldown is recorded as a collision and ignored.
pub fn cooldown_map(infos: &[SpellCooldownInfo]) -> (BTreeMap<u32, u32>, Vec<u32>) {
    let mut by_item: BTreeMap<u32, u32> = BTreeMap::new();
    let mut collisions: BTreeSet<u32> = BTreeSet::new();

    for info in infos {
        match by_item.get(&info.creates_item_id) {
            Some(&existing) if existing != info.cooldown_seconds => {
                collisions.insert(info.creates_item_id);
            }
            Some(_) => {}
            None => {
                by_item.insert(info.creates_item_id, info.cooldown_seconds);
            }
        }
    }
    (by_item, collisions.into_iter().collect())
}

/// Set cooldownSeconds on every recipe whose createsItemId is in the map.
/// Works on the raw JSON document so unknown fields and key order survive the
/// rewrite. The file is only rewritten when at least one recipe changed.
pub fn backfill_file(
    path: &Path,
    cooldown_by_item: &BTreeMap<u32, u32>,
    overwrite: bool,
) -> Result<(usize, usize)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let Some(recipes) = doc.get_mut("recipes").and_then(Value::as_array_mut) else {
        return Ok((0, 0));
    };

    let mut updated = 0;
    let mut skipped = 0;
    for recipe in recipes.iter_mut() {
        let Some(obj) = recipe.as_object_mut() else { continue };
        let Some(creates) = obj
            .get("createsItemId")
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .filter(|&id| id > 0)
        else {
            continue;
        };
        let Some(&cooldown) = cooldown_by_item.get(&creates) else { continue };

        if !overwrite && obj.contains_key("cooldownSeconds") {
            skipped += 1;
            continue;
        }
        obj.insert("cooldownSeconds".to_string(), Value::from(cooldown));
        updated += 1;
    }

    if updated > 0 {
        let mut out = serde_json::to_string_pretty(&doc)?;
        out.push('\n');
        fs::write(path, out)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok((updated, skipped))
}

/// Full backfill run: scan the cache, build the cooldown map, merge into every
/// profession file, print the summary.
pub fn run(config: &BackfillConfig) -> Result<()> {
    let professions_dir = config.professions_dir();
    if !professions_dir.is_dir() {
        bail!("professions folder not found: {}", professions_dir.display());
    }

    let infos = load_spell_cooldowns(&config.cache_roots());
    let (cooldown_by_item, collisions) = cooldown_map(&infos);

    let mut files: Vec<PathBuf> = fs::read_dir(&professions_dir)
        .with_context(|| format!("failed to list {}", professions_dir.display()))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut updated_total = 0;
    let mut skipped_total = 0;
    for file in &files {
        let (updated, skipped) = backfill_file(file, &cooldown_by_item, config.overwrite)?;
        updated_total += updated;
        skipped_total += skipped;
    }

    println!("Loaded {} cooldown spell pages.", infos.len());
    println!("Cooldown items mapped: {}", cooldown_by_item.len());
    if !collisions.is_empty() {
        let sample: Vec<u32> = collisions.iter().take(10).copied().collect();
        println!(
            "WARNING: {} itemId collisions with differing cooldowns (kept first): {:?}",
            collisions.len(),
            sample
        );
    }
    println!("Updated {} recipes with cooldownSeconds.", updated_total);
    if !config.overwrite {
        println!(
            "Skipped {} recipes that already had cooldownSeconds.",
            skipped_total
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(spell_id: u32, item: u32, cooldown: u32) -> SpellCooldownInfo {
        SpellCooldownInfo {
            spell_id,
            creates_item_id: item,
            cooldown_seconds: cooldown,
            source_path: PathBuf::from(format!("spell_{}.html", spell_id)),
        }
    }

    #[test]
    fn collision_keeps_first_seen() {
        let infos = vec![info(1, 100, 60), info(2, 100, 120), info(3, 200, 30)];
        let (map, collisions) = cooldown_map(&infos);
        assert_eq!(map[&100], 60);
        assert_eq!(map[&200], 30);
        assert_eq!(collisions, vec![100]);
    }

    #[test]
    fn same_value_is_not_a_collision() {
        let infos = vec![info(1, 100, 60), info(2, 100, 60)];
        let (map, collisions) = cooldown_map(&infos);
        assert_eq!(map[&100], 60);
        assert!(collisions.is_empty());
    }

    #[test]
    fn scanner_matches_both_name_patterns_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "spell_100.html",
            "WOWHEAD_SPELL_200.HTML",
            "item_5.html",
            "spell_x.html",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let mut ids: Vec<u32> = spell_pages(&[dir.path().to_path_buf()])
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![100, 200]);
    }

    #[test]
    fn scanner_skips_missing_roots() {
        assert!(spell_pages(&[PathBuf::from("/nonexistent/cache/root")]).is_empty());
    }

    #[test]
    fn load_skips_pages_without_usable_data() {
        let dir = tempfile::tempdir().unwrap();
        let good = "<tr><th>Cooldown</th><td>4 days</td></tr> \"creates\":[2996,1,1]";
        let no_cooldown = "\"creates\":[3000,1,1]";
        let na_cooldown = "<tr><th>Cooldown</th><td>n/a</td></tr> \"creates\":[3001,1,1]";
        let no_item = "<tr><th>Cooldown</th><td>1 min</td></tr>";
        fs::write(dir.path().join("spell_1.html"), good).unwrap();
        fs::write(dir.path().join("spell_2.html"), no_cooldown).unwrap();
        fs::write(dir.path().join("spell_3.html"), na_cooldown).unwrap();
        fs::write(dir.path().join("spell_4.html"), no_item).unwrap();

        let infos = load_spell_cooldowns(&[dir.path().to_path_buf()]);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].spell_id, 1);
        assert_eq!(infos[0].creates_item_id, 2996);
        assert_eq!(infos[0].cooldown_seconds, 345600);
    }

    fn profession_doc() -> &'static str {
        concat!(
            "{\n",
            "  \"professionId\": 197,\n",
            "  \"recipes\": [\n",
            "    {\"recipeId\": \"mooncloth\", \"createsItemId\": 14342, \"extra\": true},\n",
            "    {\"recipeId\": \"bolt\", \"createsItemId\": 2996, \"cooldownSeconds\": 5},\n",
            "    {\"recipeId\": \"no-item\"}\n",
            "  ]\n",
            "}\n"
        )
    }

    #[test]
    fn merge_fills_missing_and_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tailoring.json");
        fs::write(&path, profession_doc()).unwrap();

        let mut map = BTreeMap::new();
        map.insert(14342, 345600);
        map.insert(2996, 60);

        let (updated, skipped) = backfill_file(&path, &map, false).unwrap();
        assert_eq!((updated, skipped), (1, 1));

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let recipes = doc["recipes"].as_array().unwrap();
        assert_eq!(recipes[0]["cooldownSeconds"], 345600);
        // Unknown fields survive the rewrite.
        assert_eq!(recipes[0]["extra"], true);
        // Existing value untouched without --overwrite.
        assert_eq!(recipes[1]["cooldownSeconds"], 5);
    }

    #[test]
    fn overwrite_replaces_existing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tailoring.json");
        fs::write(&path, profession_doc()).unwrap();

        let mut map = BTreeMap::new();
        map.insert(2996, 60);

        let (updated, skipped) = backfill_file(&path, &map, true).unwrap();
        assert_eq!((updated, skipped), (1, 0));

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["recipes"][1]["cooldownSeconds"], 60);
    }

    #[test]
    fn second_run_without_overwrite_leaves_file_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tailoring.json");
        fs::write(&path, profession_doc()).unwrap();

        let mut map = BTreeMap::new();
        map.insert(14342, 345600);
        map.insert(2996, 60);

        backfill_file(&path, &map, false).unwrap();
        let after_first = fs::read(&path).unwrap();

        let (updated, skipped) = backfill_file(&path, &map, false).unwrap();
        assert_eq!((updated, skipped), (0, 2));
        assert_eq!(fs::read(&path).unwrap(), after_first);
    }

    #[test]
    fn document_without_recipes_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.json");
        fs::write(&path, "{\"recipes\": 7}").unwrap();
        let (updated, skipped) = backfill_file(&path, &BTreeMap::new(), false).unwrap();
        assert_eq!((updated, skipped), (0, 0));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"recipes\": 7}");
    }
}
