use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;

use crate::models::{
    NewPost, Post, PostFilter, PostPatch, PostUpdate, Section, Tag, TagWithCount,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| format!("failed to open database: {e}"))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| format!("failed to set pragmas: {e}"))?;

        Ok(Database { conn })
    }

    /// Create the schema tables if they don't exist, then run any pending version-gated migrations.
    pub fn migrate(&self) -> Result<(), String> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sections (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS tags (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS posts (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                title      TEXT NOT NULL,
                body       TEXT NOT NULL,
                section_id INTEGER NOT NULL REFERENCES sections(id),
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE TABLE IF NOT EXISTS post_tags (
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                tag_id  INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (post_id, tag_id)
            );

            CREATE INDEX IF NOT EXISTS idx_posts_section ON posts(section_id);
            CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);
            CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag_id);
            ",
            )
            .map_err(|e| format!("migration failed: {e}"))?;

        // Ensure schema_version exists in config (fresh databases get version 0).
        self.conn
            .execute(
                "INSERT OR IGNORE INTO config (key, value) VALUES ('schema_version', '0')",
                [],
            )
            .map_err(|e| format!("failed to seed schema_version: {e}"))?;

        run_migrations(&self.conn)
    }

    // -- Config --

    pub fn set_config(&self, key: &str, value: &str) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| format!("failed to set config: {e}"))?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM config WHERE key = ?1")
            .map_err(|e| format!("query error: {e}"))?;
        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .map_err(|e| format!("query error: {e}"))?;
        match rows.next() {
            Some(Ok(v)) => Ok(Some(v)),
            Some(Err(e)) => Err(format!("query error: {e}")),
            None => Ok(None),
        }
    }

    // -- Sections --

    pub fn insert_section(&self, name: &str) -> Result<Section, String> {
        self.conn
            .execute("INSERT INTO sections (name) VALUES (?1)", params![name])
            .map_err(|e| format!("failed to insert section: {e}"))?;
        Ok(Section {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn get_section(&self, id: i64) -> Result<Option<Section>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM sections WHERE id = ?1")
            .map_err(|e| format!("query error: {e}"))?;

        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(Section {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| format!("query error: {e}"))?;

        match rows.next() {
            Some(Ok(section)) => Ok(Some(section)),
            Some(Err(e)) => Err(format!("query error: {e}")),
            None => Ok(None),
        }
    }

    pub fn get_section_by_name(&self, name: &str) -> Result<Option<Section>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM sections WHERE name = ?1")
            .map_err(|e| format!("query error: {e}"))?;

        let mut rows = stmt
            .query_map(params![name], |row| {
                Ok(Section {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| format!("query error: {e}"))?;

        match rows.next() {
            Some(Ok(section)) => Ok(Some(section)),
            Some(Err(e)) => Err(format!("query error: {e}")),
            None => Ok(None),
        }
    }

    pub fn list_sections(&self) -> Result<Vec<Section>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM sections ORDER BY name ASC")
            .map_err(|e| format!("query error: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Section {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| format!("query error: {e}"))?;

        let mut sections = Vec::new();
        for row in rows {
            sections.push(row.map_err(|e| format!("row error: {e}"))?);
        }
        Ok(sections)
    }

    /// Rename a section. Returns `Ok(None)` when no section has that id.
    pub fn update_section(&self, id: i64, name: &str) -> Result<Option<Section>, String> {
        let rows_changed = self
            .conn
            .execute(
                "UPDATE sections SET name = ?1 WHERE id = ?2",
                params![name, id],
            )
            .map_err(|e| format!("failed to update section: {e}"))?;

        if rows_changed == 0 {
            return Ok(None);
        }
        Ok(Some(Section {
            id,
            name: name.to_string(),
        }))
    }

    /// Delete a section. Returns `false` when no section has that id.
    /// Callers must refuse deletion while posts still reference the section.
    pub fn delete_section(&self, id: i64) -> Result<bool, String> {
        let rows_changed = self
            .conn
            .execute("DELETE FROM sections WHERE id = ?1", params![id])
            .map_err(|e| format!("failed to delete section: {e}"))?;
        Ok(rows_changed > 0)
    }

    /// Number of posts filed under the given section.
    pub fn section_post_count(&self, id: i64) -> Result<i64, String> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM posts WHERE section_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| format!("query error: {e}"))
    }

    // -- Tags --

    /// Resolve tag names to rows, creating any that don't exist yet.
    /// Input is deduplicated; the returned order is existing tags first,
    /// then newly created ones.
    pub fn get_or_create_tags(&self, names: &[String]) -> Result<Vec<Tag>, String> {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            if !unique.contains(name) {
                unique.push(name.clone());
            }
        }
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<String> = (1..=unique.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "SELECT id, name FROM tags WHERE name IN ({})",
            placeholders.join(", ")
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| format!("query error: {e}"))?;

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            unique.iter().map(|n| n as &dyn rusqlite::types::ToSql).collect();

        let rows = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| format!("query error: {e}"))?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(|e| format!("row error: {e}"))?);
        }

        for name in &unique {
            if tags.iter().any(|t| &t.name == name) {
                continue;
            }
            self.conn
                .execute("INSERT INTO tags (name) VALUES (?1)", params![name])
                .map_err(|e| format!("failed to insert tag: {e}"))?;
            tags.push(Tag {
                id: self.conn.last_insert_rowid(),
                name: name.clone(),
            });
        }

        Ok(tags)
    }

    /// All tags with the number of posts referencing each, ordered by name.
    pub fn list_tags_with_post_count(&self) -> Result<Vec<TagWithCount>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT t.id, t.name, COUNT(pt.post_id)
                 FROM tags t
                 LEFT JOIN post_tags pt ON pt.tag_id = t.id
                 GROUP BY t.id, t.name
                 ORDER BY t.name ASC",
            )
            .map_err(|e| format!("query error: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(TagWithCount {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    posts_count: row.get(2)?,
                })
            })
            .map_err(|e| format!("query error: {e}"))?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(|e| format!("row error: {e}"))?);
        }
        Ok(tags)
    }

    /// Delete every candidate tag that no post references anymore.
    /// A tag is orphaned when its post_tags count is exactly zero after
    /// the mutation that put it on the candidate list. Returns the number
    /// of tags deleted.
    pub fn delete_orphan_tags(&self, candidates: &[Tag]) -> Result<usize, String> {
        let mut deleted = 0;
        for tag in candidates {
            let count: i64 = self
                .conn
                .query_row(
                    "SELECT COUNT(*) FROM post_tags WHERE tag_id = ?1",
                    params![tag.id],
                    |row| row.get(0),
                )
                .map_err(|e| format!("query error: {e}"))?;

            if count == 0 {
                self.conn
                    .execute("DELETE FROM tags WHERE id = ?1", params![tag.id])
                    .map_err(|e| format!("failed to delete tag: {e}"))?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Tags attached to a post, ordered by name.
    fn post_tags(&self, post_id: i64) -> Result<Vec<Tag>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT t.id, t.name
                 FROM tags t
                 JOIN post_tags pt ON pt.tag_id = t.id
                 WHERE pt.post_id = ?1
                 ORDER BY t.name ASC",
            )
            .map_err(|e| format!("query error: {e}"))?;

        let rows = stmt
            .query_map(params![post_id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .map_err(|e| format!("query error: {e}"))?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row.map_err(|e| format!("row error: {e}"))?);
        }
        Ok(tags)
    }

    /// Replace the post's tag associations with exactly the given tags.
    fn set_post_tags(&self, post_id: i64, tags: &[Tag]) -> Result<(), String> {
        self.conn
            .execute("DELETE FROM post_tags WHERE post_id = ?1", params![post_id])
            .map_err(|e| format!("failed to clear post tags: {e}"))?;

        for tag in tags {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
                    params![post_id, tag.id],
                )
                .map_err(|e| format!("failed to link tag: {e}"))?;
        }
        Ok(())
    }

    // -- Posts --

    /// Create a post. The section must already exist; tags are created on
    /// demand via [`Database::get_or_create_tags`].
    pub fn create_post(&self, data: &NewPost) -> Result<Post, String> {
        let section = self
            .get_section(data.section_id)?
            .ok_or_else(|| format!("section not found: {}", data.section_id))?;

        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO posts (title, body, section_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, NULL)",
                params![data.title, data.body, section.id, now.to_rfc3339()],
            )
            .map_err(|e| format!("failed to insert post: {e}"))?;

        let post_id = self.conn.last_insert_rowid();
        let tags = self.get_or_create_tags(&data.tags)?;
        self.set_post_tags(post_id, &tags)?;

        self.get_post(post_id)?
            .ok_or_else(|| format!("post vanished after insert: {post_id}"))
    }

    pub fn get_post(&self, id: i64) -> Result<Option<Post>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT p.id, p.title, p.body, p.created_at, p.updated_at, s.id, s.name
                 FROM posts p
                 JOIN sections s ON p.section_id = s.id
                 WHERE p.id = ?1",
            )
            .map_err(|e| format!("query error: {e}"))?;

        let mut rows = stmt
            .query_map(params![id], |row| Ok(row_to_post(row)))
            .map_err(|e| format!("query error: {e}"))?;

        match rows.next() {
            Some(Ok(mut post)) => {
                post.tags = self.post_tags(post.id)?;
                Ok(Some(post))
            }
            Some(Err(e)) => Err(format!("query error: {e}")),
            None => Ok(None),
        }
    }

    /// List posts, newest first, applying any filters that are set.
    /// Every name in the tag filter must be present on a matching post.
    pub fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, String> {
        let mut sql = String::from(
            "SELECT p.id, p.title, p.body, p.created_at, p.updated_at, s.id, s.name
             FROM posts p
             JOIN sections s ON p.section_id = s.id
             WHERE 1=1",
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut param_idx = 1;

        if let Some(title) = filter.title.as_deref() {
            sql.push_str(&format!(" AND p.title LIKE '%' || ?{param_idx} || '%'"));
            param_values.push(Box::new(title.to_string()));
            param_idx += 1;
        }

        if let Some(section_id) = filter.section_id {
            sql.push_str(&format!(" AND p.section_id = ?{param_idx}"));
            param_values.push(Box::new(section_id));
            param_idx += 1;
        }

        for tag in filter.tag_names() {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM post_tags pt
                              JOIN tags t ON t.id = pt.tag_id
                              WHERE pt.post_id = p.id AND t.name = ?{param_idx})"
            ));
            param_values.push(Box::new(tag));
            param_idx += 1;
        }

        if let Some(after) = filter.created_after {
            sql.push_str(&format!(" AND p.created_at >= ?{param_idx}"));
            param_values.push(Box::new(after.to_rfc3339()));
            param_idx += 1;
        }

        if let Some(before) = filter.created_before {
            sql.push_str(&format!(" AND p.created_at <= ?{param_idx}"));
            param_values.push(Box::new(before.to_rfc3339()));
            let _ = param_idx; // suppress unused warning
        }

        sql.push_str(" ORDER BY p.created_at DESC, p.id DESC");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| format!("query error: {e}"))?;

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(params_ref.as_slice(), |row| Ok(row_to_post(row)))
            .map_err(|e| format!("query error: {e}"))?;

        let mut posts = Vec::new();
        for row in rows {
            posts.push(row.map_err(|e| format!("row error: {e}"))?);
        }
        for post in &mut posts {
            post.tags = self.post_tags(post.id)?;
        }
        Ok(posts)
    }

    /// Replace every field of a post and its whole tag set, then delete
    /// tags orphaned by the replacement. Returns `Ok(None)` when no post
    /// has that id.
    pub fn update_post_full(&self, id: i64, data: &PostUpdate) -> Result<Option<Post>, String> {
        if self.get_post(id)?.is_none() {
            return Ok(None);
        }

        let old_tags = self.post_tags(id)?;

        let now = Utc::now();
        self.conn
            .execute(
                "UPDATE posts SET title = ?1, body = ?2, section_id = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![data.title, data.body, data.section_id, now.to_rfc3339(), id],
            )
            .map_err(|e| format!("failed to update post: {e}"))?;

        let new_tags = self.get_or_create_tags(&data.tags)?;
        self.set_post_tags(id, &new_tags)?;

        let removed: Vec<Tag> = old_tags
            .into_iter()
            .filter(|old| !new_tags.iter().any(|new| new.id == old.id))
            .collect();
        self.delete_orphan_tags(&removed)?;

        self.get_post(id)
    }

    /// Apply a partial update: unset fields are left unchanged. A set tag
    /// list replaces the whole association (an empty list clears it) and
    /// triggers orphan cleanup; an unset one leaves tags alone.
    pub fn update_post_partial(&self, id: i64, data: &PostPatch) -> Result<Option<Post>, String> {
        if self.get_post(id)?.is_none() {
            return Ok(None);
        }

        let mut sets = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut idx = 1;

        if let Some(t) = data.title.as_deref() {
            sets.push(format!("title = ?{idx}"));
            param_values.push(Box::new(t.to_string()));
            idx += 1;
        }
        if let Some(b) = data.body.as_deref() {
            sets.push(format!("body = ?{idx}"));
            param_values.push(Box::new(b.to_string()));
            idx += 1;
        }
        if let Some(s) = data.section_id {
            sets.push(format!("section_id = ?{idx}"));
            param_values.push(Box::new(s));
            idx += 1;
        }

        if !sets.is_empty() || data.tags.is_some() {
            let now = Utc::now().to_rfc3339();
            sets.push(format!("updated_at = ?{idx}"));
            param_values.push(Box::new(now));
            idx += 1;

            let sql = format!("UPDATE posts SET {} WHERE id = ?{idx}", sets.join(", "));
            param_values.push(Box::new(id));

            let params_ref: Vec<&dyn rusqlite::types::ToSql> =
                param_values.iter().map(|p| p.as_ref()).collect();

            self.conn
                .execute(&sql, params_ref.as_slice())
                .map_err(|e| format!("failed to update post: {e}"))?;
        }

        if let Some(names) = data.tags.as_deref() {
            let old_tags = self.post_tags(id)?;
            let new_tags = self.get_or_create_tags(names)?;
            self.set_post_tags(id, &new_tags)?;

            let removed: Vec<Tag> = old_tags
                .into_iter()
                .filter(|old| !new_tags.iter().any(|new| new.id == old.id))
                .collect();
            self.delete_orphan_tags(&removed)?;
        }

        self.get_post(id)
    }

    /// Delete a post and any tags the deletion orphaned. Returns `false`
    /// when no post has that id.
    pub fn delete_post(&self, id: i64) -> Result<bool, String> {
        let old_tags = self.post_tags(id)?;

        let rows_changed = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])
            .map_err(|e| format!("failed to delete post: {e}"))?;

        if rows_changed == 0 {
            return Ok(false);
        }

        // Join rows are gone via ON DELETE CASCADE; now reap orphans.
        self.delete_orphan_tags(&old_tags)?;
        Ok(true)
    }
}

/// Read the current schema version from the config table.
fn get_schema_version(conn: &Connection) -> Result<i32, String> {
    let mut stmt = conn
        .prepare("SELECT value FROM config WHERE key = 'schema_version'")
        .map_err(|e| format!("failed to read schema_version: {e}"))?;
    let mut rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| format!("failed to query schema_version: {e}"))?;
    match rows.next() {
        Some(Ok(v)) => v
            .parse::<i32>()
            .map_err(|e| format!("invalid schema_version value: {e}")),
        Some(Err(e)) => Err(format!("failed to read schema_version row: {e}")),
        None => Ok(0),
    }
}

/// Persist the schema version to the config table.
#[allow(dead_code)]
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), String> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES ('schema_version', ?1)",
        params![version.to_string()],
    )
    .map_err(|e| format!("failed to set schema_version: {e}"))?;
    Ok(())
}

/// Run all pending schema migrations in order.
///
/// Version 0 is the baseline created by the `CREATE TABLE IF NOT EXISTS`
/// block in `migrate()`; future migrations (v1, v2, ...) will be added as
/// additional `if version < N` blocks here, each wrapped in a transaction.
fn run_migrations(conn: &Connection) -> Result<(), String> {
    let version = get_schema_version(conn)?;

    // v0 is the baseline -- no ALTER TABLE statements needed yet.
    //
    // if version < 1 {
    //     conn.execute_batch(
    //         "BEGIN;
    //          ALTER TABLE posts ADD COLUMN published INTEGER NOT NULL DEFAULT 1;
    //          COMMIT;",
    //     )
    //     .map_err(|e| format!("migration v1 failed: {e}"))?;
    //     set_schema_version(conn, 1)?;
    // }

    // Suppress unused-variable lint while no active migrations exist.
    let _ = version;

    Ok(())
}

/// Map a joined posts/sections row into a `Post` with an empty tag list;
/// callers fill in tags with a second query.
fn row_to_post(row: &rusqlite::Row) -> Post {
    let created_str: String = row.get(3).unwrap_or_default();
    let updated_str: Option<String> = row.get(4).ok();

    Post {
        id: row.get(0).unwrap_or_default(),
        title: row.get(1).unwrap_or_default(),
        body: row.get(2).unwrap_or_default(),
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        updated_at: updated_str.and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        }),
        section: Section {
            id: row.get(5).unwrap_or_default(),
            name: row.get(6).unwrap_or_default(),
        },
        tags: Vec::new(),
    }
}
