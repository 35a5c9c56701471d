use std::path::Path;

use super::print_posts;
use quill::db::Database;
use quill::models::PostFilter;

pub fn run(
    db_path: &Path,
    title: Option<String>,
    section: Option<i64>,
    tags: Option<String>,
    json: bool,
) -> Result<(), String> {
    let db = Database::open(db_path)?;
    let filter = PostFilter {
        title,
        section_id: section,
        tags,
        ..Default::default()
    };
    let posts = db.list_posts(&filter)?;
    print_posts(&posts, json)
}
