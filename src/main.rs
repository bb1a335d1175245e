use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entag::{Database, EntityRef, TagArg, TaggingService};

/// entag - generic entity tagging CLI
#[derive(Parser)]
#[command(name = "entag")]
#[command(about = "Tag arbitrary entities with a shared, de-duplicated vocabulary")]
#[command(version)]
struct Cli {
    /// Path to the tag database (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Add tags to an entity (exact names, created if missing)
    Add(EntityTagsCommand),
    /// Replace an entity's tags from comma-separated text
    Set(SetCommand),
    /// Remove tags from an entity
    Remove(EntityTagsCommand),
    /// Remove every tag from an entity
    Clear(EntityCommand),
    /// Show an entity's tags as editable text
    List(EntityCommand),
    /// List entity IDs carrying a tag slug
    Find(FindCommand),
    /// List the tag vocabulary
    Tags(TagsCommand),
}

/// Entity address plus tag names
#[derive(Parser)]
struct EntityTagsCommand {
    /// Entity type discriminator (e.g. "article")
    #[arg(value_name = "TYPE")]
    entity_type: String,

    /// Entity ID within that type
    #[arg(value_name = "ID")]
    entity_id: i64,

    /// Tag names
    #[arg(value_name = "TAGS", required = true)]
    tags: Vec<String>,
}

/// Replace an entity's tag set from raw text
#[derive(Parser)]
struct SetCommand {
    /// Entity type discriminator (e.g. "article")
    #[arg(value_name = "TYPE")]
    entity_type: String,

    /// Entity ID within that type
    #[arg(value_name = "ID")]
    entity_id: i64,

    /// Comma-separated tag text (parsed and validated)
    #[arg(value_name = "TEXT")]
    text: String,
}

/// Entity address only
#[derive(Parser)]
struct EntityCommand {
    /// Entity type discriminator (e.g. "article")
    #[arg(value_name = "TYPE")]
    entity_type: String,

    /// Entity ID within that type
    #[arg(value_name = "ID")]
    entity_id: i64,
}

/// Inverse lookup by tag slug
#[derive(Parser)]
struct FindCommand {
    /// Tag slug to look up
    #[arg(value_name = "SLUG")]
    slug: String,

    /// Entity type to search within
    #[arg(value_name = "TYPE")]
    entity_type: String,
}

/// Vocabulary listing
#[derive(Parser)]
struct TagsCommand {
    /// Show per-tag usage counts for one entity type
    #[arg(long, value_name = "TYPE")]
    counts: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = open_service(cli.db.as_deref()).and_then(|service| match &cli.command {
        Commands::Add(cmd) => execute_add(&service, cmd),
        Commands::Set(cmd) => execute_set(&service, cmd),
        Commands::Remove(cmd) => execute_remove(&service, cmd),
        Commands::Clear(cmd) => execute_clear(&service, cmd),
        Commands::List(cmd) => execute_list(&service, cmd),
        Commands::Find(cmd) => execute_find(&service, cmd),
        Commands::Tags(cmd) => execute_tags(&service, cmd),
    });

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are validation failures on the supplied tag text or names.
/// Internal errors include database failures and I/O errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<entag::TagError>(),
        Some(entag::TagError::Validation(_)) | Some(entag::TagError::InvalidTagName(_))
    )
}

/// Opens the database (default path or override) and wraps it in a service.
fn open_service(db_override: Option<&Path>) -> Result<TaggingService> {
    let db_path = match db_override {
        Some(path) => path.to_path_buf(),
        None => get_database_path()?,
    };
    ensure_database_directory(&db_path)?;

    let db = Database::open(&db_path).context("Failed to open database")?;
    Ok(TaggingService::new(db))
}

fn execute_add(service: &TaggingService, cmd: &EntityTagsCommand) -> Result<()> {
    let entity = EntityRef::new(&cmd.entity_type, cmd.entity_id);
    let args: Vec<TagArg> = cmd.tags.iter().map(|t| TagArg::from(t.clone())).collect();

    service.add_tags(&entity, &args)?;

    println!("Tagged {entity}: {}", service.display_string(&entity)?);
    Ok(())
}

fn execute_set(service: &TaggingService, cmd: &SetCommand) -> Result<()> {
    let entity = EntityRef::new(&cmd.entity_type, cmd.entity_id);

    service.set_tags_from_text(&entity, &cmd.text)?;

    println!("Set {entity}: {}", service.display_string(&entity)?);
    Ok(())
}

fn execute_remove(service: &TaggingService, cmd: &EntityTagsCommand) -> Result<()> {
    let entity = EntityRef::new(&cmd.entity_type, cmd.entity_id);
    let args: Vec<TagArg> = cmd.tags.iter().map(|t| TagArg::from(t.clone())).collect();

    service.remove_tags(&entity, &args)?;

    println!("Removed from {entity}; now: {}", service.display_string(&entity)?);
    Ok(())
}

fn execute_clear(service: &TaggingService, cmd: &EntityCommand) -> Result<()> {
    let entity = EntityRef::new(&cmd.entity_type, cmd.entity_id);

    service.clear_tags(&entity)?;

    println!("Cleared {entity}");
    Ok(())
}

fn execute_list(service: &TaggingService, cmd: &EntityCommand) -> Result<()> {
    let entity = EntityRef::new(&cmd.entity_type, cmd.entity_id);

    let text = service.display_string(&entity)?;
    if text.is_empty() {
        println!("{entity} has no tags");
    } else {
        println!("{text}");
    }
    Ok(())
}

fn execute_find(service: &TaggingService, cmd: &FindCommand) -> Result<()> {
    let ids = service.entities_with_tag(&cmd.slug, &cmd.entity_type)?;

    if ids.is_empty() {
        println!("No {} entities tagged '{}'", cmd.entity_type, cmd.slug);
    } else {
        for id in ids {
            println!("{}/{}", cmd.entity_type, id);
        }
    }
    Ok(())
}

fn execute_tags(service: &TaggingService, cmd: &TagsCommand) -> Result<()> {
    match &cmd.counts {
        Some(entity_type) => {
            for (tag, count) in service.tag_counts(entity_type)? {
                println!("{} ({}): {}", tag.name(), tag.slug(), count);
            }
        }
        None => {
            for tag in service.all_tags()? {
                println!("{} ({})", tag.name(), tag.slug());
            }
        }
    }
    Ok(())
}

/// Gets the cross-platform database path.
///
/// Returns the path as `{data_dir}/entag/tags.db` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
fn get_database_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?;

    Ok(data_dir.join("entag").join("tags.db"))
}

/// Ensures the parent directory of the database file exists.
///
/// Creates the directory structure if it doesn't exist using `create_dir_all`.
fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}
