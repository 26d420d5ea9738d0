use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, AppConfig};
use crate::llm::OpenAiClient;
use crate::merge::{self, MergeOptions};
use crate::model::board::{find_list, TrelloList};
use crate::plan::{self, ProjectPlan};
use crate::review::{self, ReviewLists, Reviewer};
use crate::triage::prompt::{Priorities, PromptTemplate};
use crate::triage::{self, Destinations, Triage, TriageOptions};
use crate::trello::{self, TrelloApi, TrelloClient};

/// Triage a Trello inbox from the terminal.
#[derive(Debug, Parser)]
#[command(name = "inbox", version)]
pub struct Cli {
    /// Config file (default: ~/.inbox/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sort the deferred list with the language model
    Sort(SortArgs),
    /// Review inbox cards one keypress at a time
    Review,
    /// Merge every card of a list into one card on the consolidation list
    Merge {
        /// Name of the list to merge
        list: String,
        /// Archive the source list after a successful merge
        #[arg(long)]
        archive_source: bool,
    },
    /// Create a project list from a JSON plan
    Plan {
        /// Path to the project plan JSON
        file: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
pub struct SortArgs {
    /// Preview decisions without moving cards
    #[arg(long)]
    pub dry_run: bool,
    /// Cards processed concurrently
    #[arg(long, default_value_t = triage::DEFAULT_MAX_WORKERS, value_parser = parse_workers)]
    pub max_workers: usize,
    /// Seconds before a card move is abandoned
    #[arg(long, default_value_t = triage::DEFAULT_MOVE_TIMEOUT.as_secs())]
    pub move_timeout: u64,
    #[arg(long, default_value = "priorities.json")]
    pub priorities: PathBuf,
    #[arg(long, default_value = "prompt.txt")]
    pub prompt: PathBuf,
}

fn parse_workers(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".into()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Sort(args) => handle_sort(&config, args).await,
        Command::Review => handle_review(&config).await,
        Command::Merge {
            list,
            archive_source,
        } => handle_merge(&config, &list, archive_source).await,
        Command::Plan { file } => handle_plan(&config, &file).await,
    }
}

fn require_list<'a>(lists: &'a [TrelloList], name: &str) -> Result<&'a TrelloList> {
    find_list(lists, name).with_context(|| format!("Could not find list named '{name}'"))
}

async fn handle_sort(config: &AppConfig, args: SortArgs) -> Result<()> {
    println!("Loading priorities and prompt template...");
    let priorities = Priorities::load(&args.priorities)?;
    let template = PromptTemplate::load(&args.prompt)?;

    let client = TrelloClient::new(config.trello()?);
    let model = OpenAiClient::new(config.llm()?);
    let names = &config.names;

    println!("Getting Trello boards...");
    let board = trello::find_board(&client, &names.inbox_board).await?;
    println!("Found inbox board: {}", board.id);

    let lists = client.list_board_lists(&board.id).await?;
    let deferred = require_list(&lists, &names.deferred_list)?;
    let destinations = Destinations {
        inbox: require_list(&lists, &names.inbox_list)?.id.clone(),
        archive: require_list(&lists, &names.archive_list)?.id.clone(),
        uncertain: require_list(&lists, &names.culled_list)?.id.clone(),
    };

    println!("Getting cards from {} list...", deferred.name);
    let cards: Vec<_> = client
        .list_board_cards(&board.id)
        .await?
        .into_iter()
        .filter(|c| c.id_list == deferred.id)
        .collect();
    if cards.is_empty() {
        println!("No cards found in {} list.", deferred.name);
        return Ok(());
    }
    println!("Found {} cards to process...", cards.len());

    let pipeline = Triage {
        trello: &client,
        model: &model,
        template: &template,
        priorities: &priorities,
        destinations: &destinations,
        options: TriageOptions {
            dry_run: args.dry_run,
            max_workers: args.max_workers,
            move_timeout: Duration::from_secs(args.move_timeout),
        },
    };
    let progress = triage::progress_bar(cards.len());
    let summary = pipeline.run(cards, &progress).await;

    println!();
    print!("{}", summary.render());
    Ok(())
}

async fn handle_review(config: &AppConfig) -> Result<()> {
    let client = TrelloClient::new(config.trello()?);
    let names = &config.names;

    println!("Getting Trello boards ...");
    let board = trello::find_board(&client, &names.inbox_board).await?;

    println!("Getting lists ...");
    let lists = client.list_board_lists(&board.id).await?;
    let inbox = require_list(&lists, &names.inbox_list)?;
    let review_lists = ReviewLists {
        culled: require_list(&lists, &names.culled_list)?.id.clone(),
        deferred: require_list(&lists, &names.deferred_list)?.id.clone(),
    };

    let cards: Vec<_> = client
        .list_board_cards(&board.id)
        .await?
        .into_iter()
        .filter(|c| c.id_list == inbox.id)
        .collect();
    if cards.is_empty() {
        println!("Inbox is empty.");
        return Ok(());
    }

    let mut reviewer = Reviewer::new(&client, review_lists, cards);
    let outcome = review::tui::run(&mut reviewer).await;

    print!("{}", reviewer.report.render());
    outcome
}

async fn handle_merge(config: &AppConfig, list_name: &str, archive_source: bool) -> Result<()> {
    let client = TrelloClient::new(config.trello()?);
    let names = &config.names;

    let board = trello::find_board(&client, &names.inbox_board).await?;
    let lists = client.list_board_lists(&board.id).await?;
    let source = find_list(&lists, list_name).with_context(|| {
        format!(
            "Could not find list named '{list_name}' in {} board",
            names.inbox_board
        )
    })?;

    println!("Merging cards from list '{}'...", source.name);
    let options = MergeOptions {
        target_list: names.merged_list.clone(),
        archive_source,
    };
    match merge::merge_list(&client, &board.id, source, &options).await? {
        None => println!("No cards found in source list"),
        Some(report) => {
            println!(
                "Merged {} cards into '{}' on list '{}' ({} checklists copied)",
                report.merged_cards, report.card.name, report.target.name, report.copied_checklists
            );
            if report.archived_source {
                println!("Archived list '{}'", source.name);
            }
            println!("Done!");
        }
    }
    Ok(())
}

async fn handle_plan(config: &AppConfig, file: &std::path::Path) -> Result<()> {
    if !file.exists() {
        bail!("File {} not found", file.display());
    }
    let project = ProjectPlan::load(file)?;

    let client = TrelloClient::new(config.trello()?);
    let board = trello::find_board(&client, &config.names.projects_board).await?;

    let report = plan::build_plan(&client, &board.id, &project).await?;
    println!(
        "Project structure created successfully! List '{}': {} cards, {} checklists, {} items",
        report.list.name, report.cards, report.checklists, report.items
    );
    Ok(())
}
