use std::path::Path;

use quill::db::Database;

pub fn run(db_path: &Path, json: bool) -> Result<(), String> {
    let db = Database::open(db_path)?;
    let tags = db.list_tags_with_post_count()?;

    if json {
        let j = serde_json::to_string_pretty(&tags).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }

    println!("{:<6} {:<20} POSTS", "ID", "NAME");
    println!("{}", "-".repeat(35));
    for t in &tags {
        println!("{:<6} {:<20} {}", t.id, t.name, t.posts_count);
    }
    Ok(())
}
