use std::path::Path;

use quill::db::Database;

pub fn run(db_path: &Path) -> Result<(), String> {
    // Create the .quill directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| format!("failed to create directory: {e}"))?;
    }

    let db = Database::open(db_path)?;
    db.migrate()?;
    db.set_config("version", env!("CARGO_PKG_VERSION"))?;

    println!("Initialized quill database at {}", db_path.display());
    Ok(())
}
