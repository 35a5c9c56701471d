use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Allowed length range for post titles, inclusive.
pub const TITLE_LEN: (usize, usize) = (6, 60);
/// Allowed length range for tag names, inclusive.
pub const TAG_NAME_LEN: (usize, usize) = (2, 15);
/// Allowed length range for section names, inclusive.
pub const SECTION_NAME_LEN: (usize, usize) = (5, 80);

/// Validate a post title.
pub fn validate_title(title: &str) -> Result<(), String> {
    let n = title.chars().count();
    if n < TITLE_LEN.0 || n > TITLE_LEN.1 {
        return Err(format!(
            "title must be {}-{} characters, got {n}",
            TITLE_LEN.0, TITLE_LEN.1
        ));
    }
    Ok(())
}

/// Validate a single tag name.
pub fn validate_tag_name(name: &str) -> Result<(), String> {
    let n = name.chars().count();
    if n < TAG_NAME_LEN.0 || n > TAG_NAME_LEN.1 {
        return Err(format!(
            "tag name must be {}-{} characters, got {n} ({name:?})",
            TAG_NAME_LEN.0, TAG_NAME_LEN.1
        ));
    }
    Ok(())
}

/// Validate a section name.
pub fn validate_section_name(name: &str) -> Result<(), String> {
    let n = name.chars().count();
    if n < SECTION_NAME_LEN.0 || n > SECTION_NAME_LEN.1 {
        return Err(format!(
            "section name must be {}-{} characters, got {n}",
            SECTION_NAME_LEN.0, SECTION_NAME_LEN.1
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A post as served to clients: section and tags embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub section: Section,
    pub tags: Vec<Tag>,
}

/// Payload for creating a post. Unknown tag names are created on demand.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub section_id: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Full-update payload (PUT): every field is required and the tag set is
/// replaced wholesale.
#[derive(Debug, Clone, Deserialize)]
pub struct PostUpdate {
    pub title: String,
    pub body: String,
    pub section_id: i64,
    pub tags: Vec<String>,
}

/// Partial-update payload (PATCH): unset fields are left unchanged.
/// `tags: Some(vec![])` clears the tag set; `tags: None` keeps it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub section_id: Option<i64>,
    pub tags: Option<Vec<String>>,
}

/// Query-string filters for listing posts. `tags` is comma-separated;
/// a post must carry every named tag to match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    pub title: Option<String>,
    pub section_id: Option<i64>,
    pub tags: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl PostFilter {
    /// Split the comma-separated `tags` field into trimmed, non-empty names.
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|t| {
                t.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A tag together with the number of posts referencing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    pub id: i64,
    pub name: String,
    pub posts_count: i64,
}
