use std::path::Path;

use colored::Colorize;
use quill::db::Database;

pub fn run(db_path: &Path, id: i64, json: bool) -> Result<(), String> {
    let db = Database::open(db_path)?;
    let post = db
        .get_post(id)?
        .ok_or_else(|| format!("post not found: {id}"))?;

    if json {
        let j = serde_json::to_string_pretty(&post).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    println!(
        "{} {}",
        format!("#{}", post.id).as_str().bold(),
        post.title.as_str().bold()
    );
    println!("Section:  {}", post.section.name.as_str().cyan());
    if !post.tags.is_empty() {
        let tags: Vec<&str> = post.tags.iter().map(|t| t.name.as_str()).collect();
        println!("Tags:     {}", tags.join(", ").as_str().bright_black());
    }
    println!("Created:  {}", post.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(updated) = post.updated_at {
        println!("Updated:  {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }
    println!();
    println!("{}", post.body);
    Ok(())
}
