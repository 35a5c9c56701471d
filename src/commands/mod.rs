pub mod init;
pub mod list;
pub mod section;
pub mod serve;
pub mod show;
pub mod tags;

use colored::Colorize;
use quill::models::Post;

/// Shorten a value to `keep` characters plus an ellipsis when it exceeds
/// `max` characters. Counts chars, not bytes, so multibyte titles don't
/// get sliced mid-character.
fn truncate(s: &str, max: usize, keep: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(keep).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}

/// Print a list of posts as a table or JSON.
pub fn print_posts(posts: &[Post], json: bool) -> Result<(), String> {
    if json {
        let j = serde_json::to_string_pretty(posts).map_err(|e| format!("json error: {e}"))?;
        println!("{j}");
        return Ok(());
    }

    if posts.is_empty() {
        println!("No posts found.");
        return Ok(());
    }

    // Simple aligned table output
    println!(
        "{:<6} {:<20} {:<44} {:<20} TAGS",
        "ID", "SECTION", "TITLE", "CREATED"
    );
    println!("{}", "-".repeat(100));
    for p in posts {
        let tags = if p.tags.is_empty() {
            String::new()
        } else {
            p.tags
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let title = truncate(&p.title, 42, 39);
        let section = truncate(&p.section.name, 18, 15);
        println!(
            "{:<6} {:<20} {:<44} {:<20} {}",
            p.id,
            section.as_str().cyan(),
            title,
            p.created_at.format("%Y-%m-%d %H:%M"),
            tags.as_str().bright_black(),
        );
    }
    Ok(())
}
