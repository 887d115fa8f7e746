use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::fetch;

const ID_COLUMNS: &[&str] = &["ID", "Id", "id"];
const NAME_COLUMNS: &[&str] = &["Display_lang", "Display", "Name_lang", "Name"];

/// Bulk item-name table from the wago db2 CSV export, fetched once and cached.
/// Header names have drifted across builds, so a few aliases are accepted.
pub fn load_item_names(
    cache_path: &Path,
    url: &str,
    user_agent: &str,
) -> Result<HashMap<u32, String>> {
    let text = fetch::fetch_cached(cache_path, url, user_agent)?;
    let names = parse_item_csv(&text)?;
    info!("Loaded {} item names from {}", names.len(), cache_path.display());
    Ok(names)
}

fn parse_item_csv(text: &str) -> Result<HashMap<u32, String>> {
    let mut lines = text.lines();
    let header = lines.next().context("item name CSV is empty")?;
    let columns = split_csv_line(header);

    let id_col = find_column(&columns, ID_COLUMNS)
        .context("item name CSV has no recognizable id column")?;
    let name_col = find_column(&columns, NAME_COLUMNS)
        .context("item name CSV has no recognizable display-name column")?;

    let mut names = HashMap::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        let Some(item_id) = fields.get(id_col).and_then(|f| f.parse::<u32>().ok()) else {
            continue;
        };
        let Some(display) = fields.get(name_col) else { continue };
        if item_id > 0 && !display.is_empty() {
            names.insert(item_id, display.clone());
        }
    }
    Ok(names)
}

fn find_column(columns: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| columns.iter().position(|c| c.as_str() == *alias))
}

/// Minimal RFC-4180 splitting: quoted fields may contain commas and doubled
/// quotes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else {
            match ch {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(ch),
            }
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain() {
        assert_eq!(split_csv_line("1,Linen Cloth,x"), vec!["1", "Linen Cloth", "x"]);
    }

    #[test]
    fn split_quoted_comma_and_doubled_quote() {
        assert_eq!(
            split_csv_line(r#"5,"Sword, the ""Big"" One",9"#),
            vec!["5", r#"Sword, the "Big" One"#, "9"]
        );
    }

    #[test]
    fn parse_with_primary_headers() {
        let csv = "ID,Display_lang\n2996,Bolt of Linen Cloth\n0,Ignored\n";
        let names = parse_item_csv(csv).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[&2996], "Bolt of Linen Cloth");
    }

    #[test]
    fn parse_with_alias_headers() {
        let csv = "Other,id,Name\nx,14048,Bolt of Runecloth\n";
        let names = parse_item_csv(csv).unwrap();
        assert_eq!(names[&14048], "Bolt of Runecloth");
    }

    #[test]
    fn unknown_headers_are_an_error() {
        assert!(parse_item_csv("Foo,Bar\n1,2\n").is_err());
    }
}
