use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

use super::repo;

/// Parses one `name,measurement_unit` record. Names containing commas are
/// double-quoted in the reference file, so the unit is whatever follows the
/// last comma outside quotes.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if let Some(rest) = line.strip_prefix('"') {
        let (name, tail) = rest.split_once('"')?;
        let unit = tail.strip_prefix(',')?.trim();
        if name.is_empty() || unit.is_empty() {
            return None;
        }
        return Some((name.to_string(), unit.to_string()));
    }
    let (name, unit) = line.rsplit_once(',')?;
    let (name, unit) = (name.trim(), unit.trim());
    if name.is_empty() || unit.is_empty() {
        return None;
    }
    Some((name.to_string(), unit.to_string()))
}

/// Reads the comma-separated reference file and inserts every record in one
/// batch. The load is append-only: re-running it duplicates rows, so clear
/// the table first when reloading.
pub async fn load_file(db: &PgPool, path: &str) -> anyhow::Result<usize> {
    warn!("ingredient load is append-only; re-running it duplicates rows");

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read ingredient file {path}"))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for line in contents.lines() {
        match parse_line(line) {
            Some(row) => rows.push(row),
            None if line.trim().is_empty() => {}
            None => {
                skipped += 1;
                warn!(line, "skipping malformed ingredient record");
            }
        }
    }

    let inserted = repo::bulk_insert(db, &rows).await?;
    info!(inserted, skipped, "ingredient load finished");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_records() {
        assert_eq!(
            parse_line("flour,g"),
            Some(("flour".to_string(), "g".to_string()))
        );
    }

    #[test]
    fn parses_quoted_names_with_commas() {
        assert_eq!(
            parse_line("\"salt, coarse\",g"),
            Some(("salt, coarse".to_string(), "g".to_string()))
        );
    }

    #[test]
    fn unit_is_everything_after_the_last_comma() {
        assert_eq!(
            parse_line("stock, chicken,ml"),
            Some(("stock, chicken".to_string(), "ml".to_string()))
        );
    }

    #[test]
    fn rejects_incomplete_records() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("flour"), None);
        assert_eq!(parse_line("flour,"), None);
        assert_eq!(parse_line(",g"), None);
        assert_eq!(parse_line("\"unterminated,g"), None);
    }
}
