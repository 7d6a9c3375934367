//! Velodesk CLI
//!
//! Terminal front end for the studio desk:
//! - Show and rearrange the stand grid of a slot
//! - Book clients onto stands, edit slot settings, copy seating
//! - Print race start lists and reassign bikes
//! - List a week of slots

use anyhow::Context;
use chrono::{NaiveDate, Weekday};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use velodesk::api::{HttpStudioApi, StudioApi};
use velodesk::cache::{CachedResponse, QueryCache, QueryKey, SharedCache};
use velodesk::config::{generate_default_config, Config, LoggingConfig};
use velodesk::dnd::{DragSession, DropTarget, TransferSurface};
use velodesk::model::{SessionKind, WeekSchedule};
use velodesk::views::race_summary::write_csv;
use velodesk::views::seating::MIN_SEARCH_LEN;
use velodesk::views::{
    BikeChoice, CopyFilter, MoveOutcome, RaceSummaryView, SeatingView, SettingsForm, ViewError,
};
use velodesk::{Role, Session};

#[derive(Parser)]
#[command(name = "velodesk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Admin desk for a cycling studio")]
#[command(long_about = "Velodesk seats clients at studio stands and prepares race-day start lists.\nAll data lives in the studio backend; the desk reads and patches it.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/velodesk/config.toml or ./velodesk.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Studio backend URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Act as admin or operator (overrides config)
    #[arg(long, global = true)]
    pub role: Option<Role>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stand grid of a slot
    Seating {
        #[command(subcommand)]
        command: SeatingCommand,
    },

    /// Race-day start lists
    Race {
        #[command(subcommand)]
        command: RaceCommand,
    },

    /// Week overview
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SeatingCommand {
    /// Show stands, their reservations and the unassigned bucket
    Show { slot: String },

    /// Drag a reservation onto a stand (swaps when the stand is taken)
    Move {
        slot: String,
        reservation: i64,
        stand: i64,
    },

    /// Drag a reservation into the unassigned bucket
    Unassign { slot: String, reservation: i64 },

    /// Search clients for a stand
    Search {
        slot: String,
        stand: i64,
        /// Name fragment, at least two characters
        query: Vec<String>,
    },

    /// Book a client onto a stand
    Assign {
        slot: String,
        stand: i64,
        client: i64,
    },

    /// Change label, session kind and instructor
    Settings {
        slot: String,
        /// New label (empty string clears it)
        #[arg(long)]
        label: Option<String>,
        /// self_service, instructor or race
        #[arg(long)]
        kind: Option<SessionKind>,
        /// Instructor id (instructor sessions only)
        #[arg(long)]
        instructor: Option<i64>,
    },

    /// List slots this seating can be copied into
    CopyTargets {
        slot: String,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Copy this seating into other slots
    Copy {
        slot: String,
        /// Target slot ids
        targets: Vec<i64>,
        /// Copy into every candidate passing the filter
        #[arg(long)]
        all_visible: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args)]
pub struct FilterArgs {
    /// Weekdays to keep (mon, tue, ...); repeatable
    #[arg(long = "weekday")]
    weekdays: Vec<Weekday>,
    /// Earliest start time (HH:MM)
    #[arg(long)]
    from: Option<String>,
    /// Latest end time (HH:MM)
    #[arg(long)]
    to: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> CopyFilter {
        CopyFilter {
            weekdays: self.weekdays.iter().copied().collect(),
            start: self.from.clone(),
            end: self.to.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum RaceCommand {
    /// Start list grouped by cluster
    Summary {
        race: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reassign the bike of a registration
    Bike {
        race: String,
        registration: i64,
        /// Empty for no bike, "own" for own bike, or a bike id
        #[arg(default_value = "")]
        choice: String,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// Slots of the week containing a date
    Week {
        /// Any date of the week (YYYY-MM-DD)
        date: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, &content)
                    .with_context(|| format!("writing {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(role) = cli.role {
        config.session.role = role;
    }

    init_logging(&config.logging);
    tracing::debug!(base_url = %config.api.base_url, role = %config.session.role, "Velodesk starting");

    let api: Arc<dyn StudioApi> = Arc::new(HttpStudioApi::new(config.api.client_config())?);
    let cache = QueryCache::shared();
    let session = config.session.session();

    let result = match cli.command {
        Commands::Seating { command } => {
            run_seating(command, api, cache, session, &cli.format).await
        }
        Commands::Race { command } => run_race(command, api, cache, &cli.format).await,
        Commands::Schedule { command } => run_schedule(command, api, cache, &cli.format).await,
        Commands::Config { .. } => Ok(()),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ViewError>() {
            Some(ViewError::AdminRequired(_)) => eprintln!("Blocked: {}", e),
            Some(_) => eprintln!("{}", e),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("velodesk={}", config.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_seating(
    command: SeatingCommand,
    api: Arc<dyn StudioApi>,
    cache: SharedCache,
    session: Session,
    format: &str,
) -> anyhow::Result<()> {
    match command {
        SeatingCommand::Show { slot } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;
            print_seating(&view, format).await?;
        }

        SeatingCommand::Move {
            slot,
            reservation,
            stand,
        } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;
            drag(&view, reservation, DropTarget::Stand(stand)).await?;
            print_seating(&view, format).await?;
        }

        SeatingCommand::Unassign { slot, reservation } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;
            drag(&view, reservation, DropTarget::Unassigned).await?;
            print_seating(&view, format).await?;
        }

        SeatingCommand::Search { slot, stand, query } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;
            let query = query.join(" ");
            let results = view.search_clients(stand, &query).await?;

            if query.trim().chars().count() < MIN_SEARCH_LEN {
                println!("Type at least two characters to search.");
            } else if results.is_empty() {
                println!("No clients match {:?}.", query);
            } else {
                println!("{:<8} {:<30} {:<16} {}", "ID", "Name", "Phone", "Height");
                println!("{}", "-".repeat(64));
                for client in results {
                    println!(
                        "{:<8} {:<30} {:<16} {}",
                        client.id,
                        client.full_name,
                        client.phone.as_deref().unwrap_or("-"),
                        client
                            .height_cm
                            .map(|h| format!("{} cm", h))
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        SeatingCommand::Assign {
            slot,
            stand,
            client,
        } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;
            view.assign_client(stand, client).await?;
            println!("Client {} booked onto stand {}.", client, stand);
            print_seating(&view, format).await?;
        }

        SeatingCommand::Settings {
            slot,
            label,
            kind,
            instructor,
        } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;
            let mut form = SettingsForm::from_slot(&view.detail().await?.slot);
            if let Some(label) = label {
                form.label = label;
            }
            if let Some(kind) = kind {
                form.session_kind = kind;
            }
            if instructor.is_some() {
                form.instructor_id = instructor;
            }
            let updated = view.update_settings(&form).await?;
            println!("Saved: {} ({})", updated.heading(), updated.session_kind);
            if let Some(name) = &updated.instructor_name {
                println!("Instructor: {}", name);
            }
        }

        SeatingCommand::CopyTargets { slot, filter } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;
            view.load_copy_targets().await?;
            view.set_copy_filter(filter.to_filter()).await;
            let targets = view.visible_copy_targets().await;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&targets)?);
            } else if targets.is_empty() {
                println!("No candidate slots match the filter.");
            } else {
                println!(
                    "{:<8} {:<12} {:<5} {:<13} {:<14} {}",
                    "ID", "Date", "Day", "Time", "Kind", "Label"
                );
                println!("{}", "-".repeat(70));
                for t in targets {
                    println!(
                        "{:<8} {:<12} {:<5} {:<13} {:<14} {}",
                        t.id,
                        t.session_date.to_string(),
                        t.weekday().to_string(),
                        format!("{}-{}", t.start_time, t.end_time),
                        t.session_kind,
                        t.label.as_deref().unwrap_or("")
                    );
                }
            }
        }

        SeatingCommand::Copy {
            slot,
            targets,
            all_visible,
            filter,
        } => {
            let view = SeatingView::open(api, cache, session, &slot).await?;

            if all_visible {
                view.load_copy_targets().await?;
                view.set_copy_filter(filter.to_filter()).await;
                view.select_visible_copy_targets().await;
            }
            for target in targets {
                if !view.selected_copy_targets().await.contains(&target) {
                    view.toggle_copy_target(target).await;
                }
            }

            let summary = view.copy_to_selected().await?;
            if let Some(banner) = view.banner().await {
                println!("{}", banner.message);
            }
            for result in summary.results.iter().filter(|r| r.message.is_some()) {
                println!(
                    "  slot {}: {:?} {}",
                    result.target_slot_id,
                    result.outcome,
                    result.message.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

/// Run a move through the same drag surface the grid uses
async fn drag(view: &SeatingView, reservation: i64, target: DropTarget) -> anyhow::Result<()> {
    let mut surface = DragSession::new();
    surface.begin_transfer(reservation);
    surface.enter(target);

    let transfer = surface
        .complete_transfer(target)
        .context("drag ended without a transfer")?;

    match view.drop_transfer(transfer).await? {
        MoveOutcome::Unchanged => println!("Reservation {} is already there.", reservation),
        MoveOutcome::Moved(_) => match target {
            DropTarget::Stand(stand) => {
                println!("Reservation {} moved to stand {}.", reservation, stand)
            }
            DropTarget::Unassigned => println!("Reservation {} unassigned.", reservation),
        },
        MoveOutcome::Swapped { with, .. } => {
            println!("Reservation {} swapped stands with {}.", reservation, with)
        }
    }
    Ok(())
}

async fn print_seating(view: &SeatingView, format: &str) -> anyhow::Result<()> {
    let detail = view.detail().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let slot = &detail.slot;
    println!("Slot {}: {}", slot.id, slot.heading());
    print!("Session: {}", slot.session_kind);
    if let Some(name) = &slot.instructor_name {
        print!(", instructor {}", name);
    }
    println!();
    println!();

    println!("{:<8} {:<18} {:<24} {:<10} {}", "Stand", "Name", "Client", "Status", "Bike");
    println!("{}", "-".repeat(80));
    for tile in view.tiles().await? {
        let bike = tile
            .stand
            .bike
            .as_ref()
            .map(|b| match b.height_range() {
                Some(range) => format!("{} ({})", b.title, range),
                None => b.title.clone(),
            })
            .unwrap_or_default();
        let (client, status) = match &tile.occupant {
            Some(r) => (format!("#{} {}", r.id, r.display_name()), r.status.to_string()),
            None => ("- empty -".to_string(), String::new()),
        };
        println!(
            "{:<8} {:<18} {:<24} {:<10} {}",
            tile.stand.code,
            tile.stand.label(),
            client,
            status,
            bike
        );
        for extra in &tile.conflicts {
            println!("{:<8} {:<18} #{} {} (also bound here)", "", "", extra.id, extra.display_name());
        }
    }

    let unassigned = view.unassigned().await?;
    println!();
    println!("Unassigned ({}):", unassigned.len());
    for r in unassigned {
        println!("  #{:<6} {:<24} {}", r.id, r.display_name(), r.status);
    }

    if let Some(banner) = view.banner().await {
        println!();
        println!("{}", banner.message);
    }
    Ok(())
}

async fn run_race(
    command: RaceCommand,
    api: Arc<dyn StudioApi>,
    cache: SharedCache,
    format: &str,
) -> anyhow::Result<()> {
    match command {
        RaceCommand::Summary { race, output } => {
            let view = RaceSummaryView::open(api, cache, &race).await?;
            let summary = view.summary().await?;

            match format {
                "json" => {
                    let rows = view.rows().await?;
                    let text = serde_json::to_string_pretty(&rows)?;
                    write_output(output, text.as_bytes())?;
                }
                "csv" => {
                    let mut buffer = Vec::new();
                    write_csv(&view.rows().await?, &summary.bikes, &mut buffer)?;
                    write_output(output, &buffer)?;
                }
                _ => {
                    println!(
                        "{} - {}{}",
                        summary.race.title,
                        summary.race.race_date,
                        summary
                            .race
                            .location
                            .as_deref()
                            .map(|l| format!(", {}", l))
                            .unwrap_or_default()
                    );
                    for group in view.groups().await? {
                        println!();
                        println!("== {} ({}) ==", group.key, group.registrations.len());
                        println!(
                            "{:<6} {:<6} {:<10} {:<26} {:<22} {}",
                            "Reg", "Start", "Stand", "Client", "Bike", "Status"
                        );
                        for r in &group.registrations {
                            println!(
                                "{:<6} {:<6} {:<10} {:<26} {:<22} {}",
                                r.id,
                                r.cluster_start().unwrap_or("-"),
                                r.stand_label().unwrap_or("-"),
                                r.display_name(),
                                BikeChoice::of(r).describe(&summary.bikes),
                                r.status
                            );
                        }
                    }
                }
            }
        }

        RaceCommand::Bike {
            race,
            registration,
            choice,
        } => {
            let view = RaceSummaryView::open(api, cache, &race).await?;
            let choice = BikeChoice::from_selector(&choice)?;
            let updated = view.set_bike(registration, choice).await?;
            let summary = view.summary().await?;
            println!(
                "{}: {}",
                updated.display_name(),
                BikeChoice::of(&updated).describe(&summary.bikes)
            );
        }
    }

    Ok(())
}

async fn run_schedule(
    command: ScheduleCommand,
    api: Arc<dyn StudioApi>,
    cache: SharedCache,
    format: &str,
) -> anyhow::Result<()> {
    match command {
        ScheduleCommand::Week { date } => {
            let week_start = WeekSchedule::week_start_of(date);
            let week = api
                .week(week_start)
                .await
                .map_err(|e| ViewError::LoadFailed(e.user_message("Could not load the week")))?;
            cache
                .write()
                .await
                .insert(QueryKey::Week(week_start), CachedResponse::Week(week.clone()));

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&week)?);
                return Ok(());
            }

            println!("Week of {}", week.week_start);
            println!(
                "{:<8} {:<16} {:<13} {:<14} {:<8} {}",
                "ID", "Date", "Time", "Kind", "Seated", "Label"
            );
            println!("{}", "-".repeat(72));
            for slot in &week.slots {
                let seated = slot
                    .reservations
                    .iter()
                    .filter(|r| r.stand_id.is_some() && r.client_id.is_some())
                    .count();
                println!(
                    "{:<8} {:<16} {:<13} {:<14} {:<8} {}",
                    slot.id,
                    format!("{} {}", slot.session_date, slot.weekday()),
                    format!("{}-{}", slot.start_time, slot.end_time),
                    slot.session_kind,
                    seated,
                    slot.label.as_deref().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

fn write_output(output: Option<PathBuf>, data: &[u8]) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, data).with_context(|| format!("writing {:?}", path))?;
            println!("Exported to {:?}", path);
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(data)?;
        }
    }
    Ok(())
}
