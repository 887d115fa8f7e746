use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use anyhow::{bail, ensure, Context, Result};
use regex::Regex;
use serde_json::Value;
use tracing::info;

use crate::config::ExportConfig;
use crate::fetch;
use crate::pack::{self, ProfessionPack, Reagent, Recipe};
use crate::parser::listview;
use crate::wago;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercased name with non-alphanumeric runs collapsed to single hyphens.
pub fn slugify(value: &str) -> String {
    let lower = value.to_lowercase();
    let slug = SLUG_RE.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "recipe".to_string()
    } else {
        slug.to_string()
    }
}

/// Skill-color thresholds from the 4-entry floors array
/// [orangeFloor, yellowFloor, greenFloor, grayFloor]. Clamping keeps the
/// tiers non-decreasing even when the floors arrive out of order.
pub fn colors_to_thresholds(colors: &[i64]) -> Result<(u32, u32, u32, u32, u32)> {
    ensure!(colors.len() == 4, "expected 4 colors values, got {}", colors.len());
    let (o, y, g, gr) = (colors[0], colors[1], colors[2], colors[3]);
    ensure!(
        o >= 0 && y >= 0 && g >= 0 && gr >= 0,
        "invalid negative skill threshold in colors {:?}",
        colors
    );

    let min_skill = o;
    let orange_until = min_skill.max(y - 1);
    let yellow_until = orange_until.max(g - 1);
    let green_until = yellow_until.max(gr - 1);
    let gray_at = (green_until + 1).max(gr);

    Ok((
        min_skill as u32,
        orange_until as u32,
        yellow_until as u32,
        green_until as u32,
        gray_at as u32,
    ))
}

/// Recipes built from the page, plus the reagent names the page itself could
/// resolve.
pub struct BuiltPack {
    pub pack: ProfessionPack,
    pub page_reagent_names: HashMap<u32, String>,
}

/// Turn listview rows into a sorted recipe pack. Rows from other skills, rows
/// without reagents, and rows whose reagents all filter out are dropped; zero
/// surviving recipes means the extraction broke and is an error.
pub fn build_pack(
    rows: &[Value],
    profession_id: u32,
    profession_name: &str,
    page_item_names: &HashMap<u32, String>,
) -> Result<BuiltPack> {
    let mut used_ids: BTreeSet<String> = BTreeSet::new();
    let mut recipes = Vec::new();
    let mut page_reagent_names = HashMap::new();

    for row in rows {
        let Some(obj) = row.as_object() else { continue };

        let skill_matches = obj
            .get("skill")
            .and_then(Value::as_array)
            .is_some_and(|a| a.len() == 1 && a[0].as_u64() == Some(profession_id as u64));
        if !skill_matches || !obj.contains_key("reagents") {
            continue;
        }

        let Some(spell_id) = obj.get("id").and_then(Value::as_u64) else { continue };
        let Some(name) = obj.get("name").and_then(Value::as_str) else { continue };

        let colors: Vec<i64> = match obj.get("colors").and_then(Value::as_array) {
            Some(a) if a.len() == 4 => a.iter().map(|v| v.as_i64().unwrap_or(-1)).collect(),
            _ => {
                // No usable colors: synthesize flat tiers from the learn level.
                let learned_at = obj.get("learnedat").and_then(Value::as_i64).unwrap_or(0);
                if learned_at <= 0 {
                    continue;
                }
                vec![learned_at; 4]
            }
        };
        let (min_skill, orange_until, yellow_until, green_until, gray_at) =
            colors_to_thresholds(&colors)
                .with_context(|| format!("spell {} ({})", spell_id, name))?;

        let mut recipe_id = slugify(name);
        if used_ids.contains(&recipe_id) {
            recipe_id = format!("{}-{}", recipe_id, spell_id);
        }
        used_ids.insert(recipe_id.clone());

        let mut reagents = Vec::new();
        for reagent in obj.get("reagents").and_then(Value::as_array).into_iter().flatten() {
            let Some(pair) = reagent.as_array() else { continue };
            if pair.len() < 2 {
                continue;
            }
            let (Some(item_id), Some(qty)) = (pair[0].as_i64(), pair[1].as_i64()) else {
                continue;
            };
            if item_id <= 0 || qty <= 0 {
                continue;
            }
            let item_id = item_id as u32;
            reagents.push(Reagent { item_id, qty: qty as u32 });
            if let Some(n) = page_item_names.get(&item_id) {
                page_reagent_names.insert(item_id, n.clone());
            }
        }
        if reagents.is_empty() {
            continue;
        }

        recipes.push(Recipe {
            recipe_id,
            profession_id,
            name: name.to_string(),
            min_skill,
            orange_until,
            yellow_until,
            green_until,
            gray_at,
            reagents,
            cooldown_seconds: None,
        });
    }

    if recipes.is_empty() {
        bail!("parsed 0 recipes from the skill page listview");
    }
    recipes.sort_by(|a, b| (a.min_skill, a.name.as_str()).cmp(&(b.min_skill, b.name.as_str())));

    Ok(BuiltPack {
        pack: ProfessionPack {
            profession_id,
            profession_name: profession_name.to_string(),
            recipes,
        },
        page_reagent_names,
    })
}

/// Full export run. Every reagent name is resolved before either output file
/// is touched; any id left unresolved aborts the run.
pub fn run(config: &ExportConfig) -> Result<()> {
    ensure!(config.profession_id > 0, "--profession-id must be > 0");
    ensure!(
        !config.profession_name.trim().is_empty(),
        "--profession-name must be non-empty"
    );

    let html = fetch::fetch_cached(
        &config.skill_cache_path(),
        &config.skill_url,
        &config.user_agent,
    )?;

    let page_item_names = listview::embedded_item_names(&html)?;
    let rows = listview::spell_listview_rows(&html)?;
    let built = build_pack(
        &rows,
        config.profession_id,
        &config.profession_name,
        &page_item_names,
    )?;
    info!(
        "Built {} recipes from {} listview rows",
        built.pack.recipes.len(),
        rows.len()
    );

    let mut items = pack::load_item_names(&config.out_items_json)?;

    // First pass: names already in the table, then names embedded in the page.
    let mut missing: BTreeSet<u32> = BTreeSet::new();
    for recipe in &built.pack.recipes {
        for reagent in &recipe.reagents {
            if items.contains_key(&reagent.item_id) {
                continue;
            }
            match built.page_reagent_names.get(&reagent.item_id) {
                Some(name) => {
                    items.insert(reagent.item_id, name.clone());
                }
                None => {
                    missing.insert(reagent.item_id);
                }
            }
        }
    }

    // Second pass: the bulk CSV, fetched only when something is still missing.
    if !missing.is_empty() {
        info!("{} reagent names missing, falling back to the item CSV", missing.len());
        let wago_names = wago::load_item_names(
            &config.item_csv_cache_path(),
            &config.item_csv_url(),
            &config.user_agent,
        )?;
        missing.retain(|id| match wago_names.get(id) {
            Some(name) => {
                items.insert(*id, name.clone());
                false
            }
            None => true,
        });

        if !missing.is_empty() {
            bail!(
                "missing {} reagent item names: {:?}",
                missing.len(),
                missing.iter().collect::<Vec<_>>()
            );
        }
    }

    pack::write_pack(&config.out_profession_json, &built.pack)?;
    pack::write_item_names(&config.out_items_json, &items)?;

    println!(
        "Wrote {} ({}, {} recipes)",
        config.out_profession_json.display(),
        config.profession_name,
        built.pack.recipes.len()
    );
    println!("Wrote {} ({} items)", config.out_items_json.display(), items.len());
    Ok(())
}
