mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "quill",
    version,
    about = "Small blogging backend: posts, tags, and sections over HTTP"
)]
struct Cli {
    /// Path to the database file (default: .quill/quill.db in current dir)
    #[arg(long, env = "QUILL_DB")]
    db: Option<PathBuf>,

    /// Output as JSON instead of table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the quill database
    Init,
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8460)]
        port: u16,
    },
    /// Manage sections
    Section {
        #[command(subcommand)]
        action: SectionAction,
    },
    /// List posts
    List {
        /// Filter by title substring
        #[arg(long)]
        title: Option<String>,
        /// Filter by section id
        #[arg(short, long)]
        section: Option<i64>,
        /// Filter by tags (comma-separated; a post must carry all of them)
        #[arg(short, long)]
        tags: Option<String>,
    },
    /// Show detailed info for a post
    Show {
        /// Post ID
        id: i64,
    },
    /// Show tags with post counts
    Tags,
}

#[derive(Subcommand)]
enum SectionAction {
    /// Create a section
    Add {
        /// Section name
        name: String,
    },
    /// List sections
    List,
    /// Delete a section (refused while posts still reference it)
    Remove {
        /// Section ID
        id: i64,
    },
}

fn main() {
    let cli = Cli::parse();

    let db_path = cli.db.unwrap_or_else(|| {
        let mut p = std::env::current_dir().expect("cannot determine current directory");
        p.push(".quill");
        p.push("quill.db");
        p
    });

    let result = match cli.command {
        Commands::Init => commands::init::run(&db_path),
        Commands::Serve { port } => commands::serve::run(&db_path, port),
        Commands::Section { action } => match action {
            SectionAction::Add { name } => commands::section::add(&db_path, &name, cli.json),
            SectionAction::List => commands::section::list(&db_path, cli.json),
            SectionAction::Remove { id } => commands::section::remove(&db_path, id),
        },
        Commands::List {
            title,
            section,
            tags,
        } => commands::list::run(&db_path, title, section, tags, cli.json),
        Commands::Show { id } => commands::show::run(&db_path, id, cli.json),
        Commands::Tags => commands::tags::run(&db_path, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
