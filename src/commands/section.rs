use std::path::Path;

use quill::db::Database;
use quill::models::validate_section_name;

pub fn add(db_path: &Path, name: &str, json: bool) -> Result<(), String> {
    validate_section_name(name)?;

    let db = Database::open(db_path)?;
    if db.get_section_by_name(name)?.is_some() {
        return Err(format!("section already exists: {name}"));
    }

    let section = db.insert_section(name)?;
    if json {
        let j =
            serde_json::to_string_pretty(&section).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
    } else {
        println!("Created section {} ({})", section.name, section.id);
    }
    Ok(())
}

pub fn list(db_path: &Path, json: bool) -> Result<(), String> {
    let db = Database::open(db_path)?;
    let sections = db.list_sections()?;

    if json {
        let j =
            serde_json::to_string_pretty(&sections).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if sections.is_empty() {
        println!("No sections found.");
        return Ok(());
    }

    println!("{:<6} {:<40} POSTS", "ID", "NAME");
    println!("{}", "-".repeat(55));
    for s in &sections {
        let count = db.section_post_count(s.id)?;
        println!("{:<6} {:<40} {count}", s.id, s.name);
    }
    Ok(())
}

pub fn remove(db_path: &Path, id: i64) -> Result<(), String> {
    let db = Database::open(db_path)?;

    let section = db
        .get_section(id)?
        .ok_or_else(|| format!("section not found: {id}"))?;

    let in_use = db.section_post_count(id)?;
    if in_use > 0 {
        return Err(format!(
            "section {} still has {in_use} posts; move or delete them first",
            section.name
        ));
    }

    db.delete_section(id)?;
    println!("Deleted section {} ({id})", section.name);
    Ok(())
}
