use std::path::PathBuf;

pub const DEFAULT_WAGO_BUILD: &str = "2.5.4.44833";
pub const DEFAULT_ITEM_SEARCH_CSV_BASE: &str = "https://wago.tools/db2/ItemSearchName/csv";

pub const DEFAULT_PROFESSION_ID: u32 = 197;
pub const DEFAULT_PROFESSION_NAME: &str = "Tailoring";
pub const DEFAULT_SKILL_URL: &str = "https://www.wowhead.com/tbc/skill=197/tailoring";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings for one cooldown backfill run.
pub struct BackfillConfig {
    pub data_root: PathBuf,
    pub version: String,
    pub cache_root: PathBuf,
    pub overwrite: bool,
}

impl BackfillConfig {
    pub fn professions_dir(&self) -> PathBuf {
        self.data_root.join(&self.version).join("professions")
    }

    /// Spell pages may sit in a wowhead/ subfolder or directly in the root.
    pub fn cache_roots(&self) -> Vec<PathBuf> {
        vec![self.cache_root.join("wowhead"), self.cache_root.clone()]
    }
}

/// Settings for one profession export run. Endpoint URLs and the pinned build
/// live here rather than in the pipeline so tests can point them at fixtures.
pub struct ExportConfig {
    pub profession_id: u32,
    pub profession_name: String,
    pub out_profession_json: PathBuf,
    pub out_items_json: PathBuf,
    pub cache_dir: PathBuf,
    pub user_agent: String,
    pub skill_url: String,
    pub wago_build: String,
    pub item_search_csv_base: String,
}

impl ExportConfig {
    pub fn skill_cache_path(&self) -> PathBuf {
        self.cache_dir
            .join(format!("wowhead_tbc_skill_{}.html", self.profession_id))
    }

    pub fn item_csv_cache_path(&self) -> PathBuf {
        self.cache_dir
            .join(format!("ItemSearchName.{}.csv", self.wago_build))
    }

    pub fn item_csv_url(&self) -> String {
        format!("{}?build={}", self.item_search_csv_base, self.wago_build)
    }
}
