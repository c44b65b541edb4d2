//! `photonote` - CLI for photonotes
//!
//! This binary stores captured images with captions and lets you list, edit
//! and delete them.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use photonotes::cli::{
    display_time, join_caption, AddCommand, CheckCommand, Cli, Command, ConfigCommand,
    DeleteCommand, EditCommand, ListCommand, OutputFormat, ShowCommand,
};
use photonotes::{init_logging, Config, Note, NoteManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Add(cmd) => handle_add(&open(&config).await?, cmd).await,
        Command::List(cmd) => handle_list(&open(&config).await?, &cmd).await,
        Command::Show(cmd) => handle_show(&open(&config).await?, &cmd).await,
        Command::Edit(cmd) => handle_edit(&open(&config).await?, cmd).await,
        Command::Delete(cmd) => handle_delete(&open(&config).await?, &cmd).await,
        Command::Check(cmd) => handle_check(&open(&config).await?, &cmd).await,
        Command::Status(cmd) => handle_status(&open(&config).await?, &config, cmd.json).await,
    }
}

async fn open(config: &Config) -> anyhow::Result<NoteManager> {
    NoteManager::open(config)
        .await
        .context("opening note storage")
}

async fn handle_add(manager: &NoteManager, cmd: AddCommand) -> anyhow::Result<()> {
    let note = manager
        .create_note(&cmd.image, &join_caption(&cmd.caption))
        .await
        .context("saving note")?;
    println!("Saved note {}", note.path.display());
    Ok(())
}

async fn handle_list(manager: &NoteManager, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut notes = manager.list_notes().await.context("loading notes")?;
    if let Some(limit) = cmd.limit {
        notes.truncate(limit);
    }

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&notes)?),
        OutputFormat::Plain => {
            for note in &notes {
                println!("{}\t{}", note.path.display(), note.caption);
            }
        }
        OutputFormat::Table => {
            if notes.is_empty() {
                println!("No notes yet. Add one with `photonote add <IMAGE> <CAPTION>`.");
                return Ok(());
            }
            println!("{:<19}  {:<40}  CAPTION", "UPDATED", "IMAGE");
            for note in &notes {
                println!(
                    "{:<19}  {:<40}  {}",
                    display_time(note),
                    note.path.display(),
                    note.caption
                );
            }
        }
    }
    Ok(())
}

async fn handle_show(manager: &NoteManager, cmd: &ShowCommand) -> anyhow::Result<()> {
    let Some(note) = manager.get_note(&cmd.path).await.context("loading notes")? else {
        bail!("no note references {}", cmd.path.display());
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        print_note(&note);
    }
    Ok(())
}

async fn handle_edit(manager: &NoteManager, cmd: EditCommand) -> anyhow::Result<()> {
    let note = manager
        .update_caption(&cmd.path, &join_caption(&cmd.caption))
        .await
        .context("updating caption")?;
    print_note(&note);
    Ok(())
}

async fn handle_delete(manager: &NoteManager, cmd: &DeleteCommand) -> anyhow::Result<()> {
    if !cmd.yes {
        println!(
            "This will delete the note and its image {}.",
            cmd.path.display()
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    match manager
        .delete_note(&cmd.path)
        .await
        .context("deleting note")?
    {
        Some(note) => println!("Deleted note {}", note.path.display()),
        None => println!("No note references {}", cmd.path.display()),
    }
    Ok(())
}

async fn handle_check(manager: &NoteManager, cmd: &CheckCommand) -> anyhow::Result<()> {
    let report = manager
        .check_consistency()
        .await
        .context("checking consistency")?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Notes:   {}", report.note_count);
    println!("Images:  {}", report.image_count);
    if report.is_consistent() {
        println!("Index and image directory agree.");
        return Ok(());
    }
    for note in &report.dangling {
        println!("missing image: {} ({})", note.path.display(), note.caption);
    }
    for path in &report.orphaned {
        println!("orphaned image: {}", path.display());
    }
    Ok(())
}

async fn handle_status(manager: &NoteManager, config: &Config, json: bool) -> anyhow::Result<()> {
    let notes = manager.list_notes().await.context("loading notes")?;

    if json {
        let status = serde_json::json!({
            "notes": notes.len(),
            "database_path": config.database_path(),
            "images_dir": config.images_dir(),
            "index_key": manager.index().key(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("photonote status");
        println!("----------------");
        println!("Notes:       {}", notes.len());
        println!("Database:    {}", config.database_path().display());
        println!("Images:      {}", config.images_dir().display());
        println!("Index key:   {}", manager.index().key());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data directory:     {}", config.data_dir().display());
                println!("  Database path:      {}", config.database_path().display());
                println!("  Images directory:   {}", config.images_dir().display());
                println!();
                println!("[Notes]");
                println!("  Index key:          {}", config.notes.index_key);
                println!("  Image extension:    {}", config.notes.image_extension);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            if let Err(e) = Config::load_from(Some(path)) {
                bail!("configuration error: {e}");
            }
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn print_note(note: &Note) {
    println!("Image:    {}", note.path.display());
    println!("Updated:  {}", display_time(note));
    println!("Caption:  {}", note.caption);
}
