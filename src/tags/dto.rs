use serde::Serialize;

use crate::tags::repo::Tag;

#[derive(Debug, Serialize)]
pub struct TagDto {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagDto {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
            color: t.color,
            slug: t.slug,
        }
    }
}
