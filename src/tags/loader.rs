use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

use super::repo;
use crate::error::ApiError;

/// Parses one `name,color,slug` record.
pub fn parse_line(line: &str) -> Option<(String, String, String)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut fields = line.split(',').map(str::trim);
    let (name, color, slug) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() || name.is_empty() || color.is_empty() || slug.is_empty() {
        return None;
    }
    Some((name.to_string(), color.to_string(), slug.to_string()))
}

/// Seeds the tag table from a comma-separated file. Rows that fail field
/// validation or collide with an existing tag are skipped with a warning,
/// so the load can be re-run after adding new tags.
pub async fn load_file(db: &PgPool, path: &str) -> anyhow::Result<usize> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read tag file {path}"))?;

    let mut inserted = 0usize;
    let mut skipped = 0usize;
    for line in contents.lines() {
        let Some((name, color, slug)) = parse_line(line) else {
            if !line.trim().is_empty() {
                skipped += 1;
                warn!(line, "skipping malformed tag record");
            }
            continue;
        };
        match repo::create(db, &name, &color, &slug).await {
            Ok(tag) => {
                inserted += 1;
                info!(tag_id = %tag.id, name = %tag.name, "tag created");
            }
            Err(e @ (ApiError::Duplicate(_) | ApiError::Validation(_))) => {
                skipped += 1;
                warn!(error = %e, name = %name, "skipping tag");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(inserted, skipped, "tag load finished");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_records() {
        assert_eq!(
            parse_line("Breakfast,#E26C2D,breakfast"),
            Some((
                "Breakfast".to_string(),
                "#E26C2D".to_string(),
                "breakfast".to_string()
            ))
        );
    }

    #[test]
    fn trims_whitespace_around_fields() {
        assert_eq!(
            parse_line(" Lunch , #49B64E , lunch "),
            Some((
                "Lunch".to_string(),
                "#49B64E".to_string(),
                "lunch".to_string()
            ))
        );
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("Breakfast,#E26C2D"), None);
        assert_eq!(parse_line("Breakfast,#E26C2D,breakfast,extra"), None);
        assert_eq!(parse_line("Breakfast,,breakfast"), None);
    }
}
