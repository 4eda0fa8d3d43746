//! FlashLearn command-line front end.
//!
//! # Responsibility
//! - Resolve the data directory and logging configuration.
//! - Translate subcommands into `StudyService` calls and print results.

mod cli;

use clap::Parser;
use cli::{CardCommand, Cli, CollectionCommand, Command};
use flashlearn_core::db::{open_db, DB_FILE_NAME};
use flashlearn_core::{
    default_log_level, init_logging, CardPatch, CollectionPatch, RecordStore, SqliteRecordStore,
    StudyService,
};
use log::error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DATA_DIR_NAME: &str = "flashlearn";
const LOG_DIR_NAME: &str = "logs";

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let data_dir = resolve_data_dir(cli.data_dir)?;
    std::fs::create_dir_all(&data_dir).map_err(|err| {
        format!(
            "failed to create data directory `{}`: {err}",
            data_dir.display()
        )
    })?;
    // Log directory must be absolute.
    let data_dir = std::fs::canonicalize(&data_dir)
        .map_err(|err| format!("failed to resolve `{}`: {err}", data_dir.display()))?;

    if !cli.no_log {
        let level = cli
            .log_level
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = data_dir.join(LOG_DIR_NAME);
        init_logging(&level, &log_dir)?;
    }

    let conn = open_db(data_dir.join(DB_FILE_NAME)).map_err(|err| err.to_string())?;
    let store = SqliteRecordStore::new(&conn);
    let mut service = StudyService::open(store);

    execute(&mut service, cli.command).map_err(|message| {
        error!("event=cli_command module=cli status=error error={message}");
        message
    })
}

fn execute<S: RecordStore>(service: &mut StudyService<S>, command: Command) -> Result<(), String> {
    match command {
        Command::Collection(command) => collection_command(service, command),
        Command::Card(command) => card_command(service, command),
        Command::Due(args) => {
            let due = service.cards_for_review(args.collection.as_deref());
            if due.is_empty() {
                println!("No cards due.");
            }
            for card in due {
                println!("{}\t{}\t{}", card.id, card.difficulty, card.front);
            }
            Ok(())
        }
        Command::Review(args) => {
            let card = service
                .record_review_text(&args.card_id, &args.outcome)
                .map_err(|err| err.to_string())?;
            match card.next_review_date {
                Some(next) => println!(
                    "{} is now {}; next review at {}",
                    card.id,
                    card.difficulty,
                    next.to_rfc3339()
                ),
                None => println!("{} is now {}", card.id, card.difficulty),
            }
            Ok(())
        }
        Command::Stats => {
            let stats = service.stats();
            println!("today reviewed: {}", stats.today_reviewed);
            println!("today added:    {}", stats.today_added);
            println!("total cards:    {}", stats.total_cards);
            println!("hard cards:     {}", stats.hard_card_count());
            println!("last updated:   {}", stats.last_updated);
            for row in service.collection_breakdown() {
                println!(
                    "{}\t{}\ttotal={} easy={} hard={} due={}",
                    row.collection_id,
                    row.name,
                    row.total_cards,
                    row.easy_count,
                    row.hard_count,
                    row.due_count
                );
            }
            for card in service.hard_card_list() {
                println!("hard\t{}\t{}", card.id, card.front);
            }
            Ok(())
        }
        Command::Export(args) => {
            let json = service.export_snapshot_json().map_err(|err| err.to_string())?;
            let out = args
                .out
                .unwrap_or_else(|| PathBuf::from(service.backup_file_name()));
            if out == Path::new("-") {
                println!("{json}");
                return Ok(());
            }
            std::fs::write(&out, json)
                .map_err(|err| format!("failed to write `{}`: {err}", out.display()))?;
            println!("Exported to {}", out.display());
            Ok(())
        }
        Command::Import(args) => {
            let text = std::fs::read_to_string(&args.file)
                .map_err(|err| format!("failed to read `{}`: {err}", args.file.display()))?;
            let summary = service
                .import_snapshot(&text)
                .map_err(|err| err.to_string())?;
            println!(
                "Imported {} collection(s) and {} card(s).",
                summary.collections, summary.cards
            );
            Ok(())
        }
    }
}

fn collection_command<S: RecordStore>(
    service: &mut StudyService<S>,
    command: CollectionCommand,
) -> Result<(), String> {
    match command {
        CollectionCommand::Add { name, description } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("collection name must not be blank".to_string());
            }
            let collection = service
                .add_collection(name, description.trim())
                .map_err(|err| err.to_string())?;
            println!("{}", collection.id);
        }
        CollectionCommand::List => {
            for collection in service.collections().values() {
                println!(
                    "{}\t{}\t{} card(s)",
                    collection.id, collection.name, collection.card_count
                );
            }
        }
        CollectionCommand::Edit {
            id,
            name,
            description,
        } => {
            if name.as_deref().is_some_and(|value| value.trim().is_empty()) {
                return Err("collection name must not be blank".to_string());
            }
            let patch = CollectionPatch {
                name: name.map(|value| value.trim().to_string()),
                description,
            };
            if patch.is_empty() {
                return Err("nothing to change; pass --name or --description".to_string());
            }
            service
                .update_collection(&id, patch)
                .map_err(|err| err.to_string())?;
        }
        CollectionCommand::Delete { id } => {
            let removal = service
                .delete_collection(&id)
                .map_err(|err| err.to_string())?;
            println!(
                "Deleted {} and {} card(s).",
                removal.collection.name,
                removal.removed_card_ids.len()
            );
        }
    }
    Ok(())
}

fn card_command<S: RecordStore>(
    service: &mut StudyService<S>,
    command: CardCommand,
) -> Result<(), String> {
    match command {
        CardCommand::Add {
            collection_id,
            front,
            back,
        } => {
            if front.trim().is_empty() || back.trim().is_empty() {
                return Err("card front and back must not be blank".to_string());
            }
            let card = service
                .add_card(&collection_id, front.trim(), back.trim())
                .map_err(|err| err.to_string())?;
            println!("{}", card.id);
        }
        CardCommand::List { collection_id } => {
            if service.collection(&collection_id).is_none() {
                return Err(format!("collection not found: {collection_id}"));
            }
            for card in service.cards_in_collection(&collection_id) {
                println!(
                    "{}\t{}\treviews={}\t{}\t{}",
                    card.id, card.difficulty, card.review_count, card.front, card.back
                );
            }
        }
        CardCommand::Edit { id, front, back } => {
            let patch = CardPatch {
                front,
                back,
                ..CardPatch::default()
            };
            service
                .update_card(&id, patch)
                .map_err(|err| err.to_string())?;
        }
        CardCommand::Delete { id } => {
            service.delete_card(&id).map_err(|err| err.to_string())?;
        }
    }
    Ok(())
}

fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf, String> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    dirs::data_local_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or_else(|| "could not resolve a data directory; pass --data-dir".to_string())
}
