use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use orderstamp::bridge::{Dialogs, FileBridge, FileFilter};
use orderstamp::sanitize::redact_path;
use orderstamp::store::SessionStore;
use orderstamp::{
    AppSettings, AppState, ColumnMapping, Config, Database, LocalFileBridge, OrderQuery,
    OrderWithTabs, SessionEvent, SessionService, StampPosition,
};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::broadcast::Receiver;
use tracing::{info, warn};

use crate::cli::{
    Commands, MappingCommands, OptionalPositionArgs, PositionCommands, RuleCommands,
    SettingsCommands,
};
use crate::terminal::{StdinPrompt, TerminalDialogs};

type App = SessionService<Database, LocalFileBridge>;

pub async fn run(command: Commands, config: &Config) -> Result<()> {
    let db_path = config
        .database_path()
        .ok_or_else(|| anyhow!("Could not determine the database location"))?;
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let mut app = SessionService::new(db, LocalFileBridge::new(), config);
    let mut events = app.events().subscribe();

    let result = dispatch(&mut app, command, config).await;
    log_events(&mut events);
    result
}

async fn dispatch(app: &mut App, command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Import { csv } => {
            let path = match csv {
                Some(path) => path,
                None => TerminalDialogs
                    .select_file(&[FileFilter::csv()])
                    .await
                    .ok_or_else(|| anyhow!("No CSV file selected"))?,
            };
            let text = read_text(app, &path).await?;
            let session = app.import_csv(&redact_path(&path), &text)?;
            println!(
                "Session {} ({} orders)",
                session.id, session.total_orders
            );
            print_orders(&app.state().filtered(&OrderQuery::default()));
            print_stats(app.state());
        }

        Commands::Headers { csv } => {
            let text = read_text(app, &csv).await?;
            for header in app.preview_headers(&text)? {
                println!("{}", header);
            }
        }

        Commands::Orders {
            session,
            search,
            filter,
            sku_family,
        } => {
            open_session(app, session)?;
            let query = OrderQuery {
                search,
                filter: filter.into(),
                family: sku_family.into(),
            };
            let orders = app.state().filtered(&query);
            if orders.is_empty() {
                println!("No orders match");
            }
            print_orders(&orders);
            print_stats(app.state());
        }

        Commands::Sessions { limit } => {
            for s in app.recent_sessions(limit)? {
                println!(
                    "{}  {}  {}/{}  {}  {}",
                    s.id,
                    s.started_at.format("%Y-%m-%d %H:%M"),
                    s.completed_orders,
                    s.total_orders,
                    s.status,
                    s.csv_filename
                );
            }
        }

        Commands::Rules { command } => rules(app, command)?,
        Commands::Positions { command } => positions(app, command)?,
        Commands::Settings { command } => settings(app, command).await?,
        Commands::Mapping { command } => mapping(app, command)?,

        Commands::Stamp {
            input,
            output,
            text,
            position,
        } => {
            let position = StampPosition::new(position.x, position.y, position.font_size);
            orderstamp::session::validate_position(&position)?;
            let bytes = app.bridge().read_file(&input).await?;
            let stamped = orderstamp::stamp::stamp(&bytes, &text, &position)?;
            app.bridge().write_file(&output, &stamped).await?;
            println!("Wrote {}", output.display());
        }

        Commands::Save {
            session,
            order,
            files,
            position,
            remember,
            yes,
        } => {
            open_session(app, session)?;
            save(app, &order, files, position, remember, yes, config).await?;
        }

        Commands::Premade { session, save, yes } => {
            open_session(app, session)?;
            premade(app, save, yes).await?;
        }
    }
    Ok(())
}

async fn read_text(app: &App, path: &Path) -> Result<String> {
    let bytes = app.bridge().read_file(path).await?;
    String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8 text", redact_path(path)))
}

/// Loads `session`, or the latest unfinished one.
fn open_session(app: &mut App, session: Option<String>) -> Result<()> {
    let id = match session {
        Some(id) => id,
        None => app
            .store()
            .latest_in_progress_session()?
            .map(|s| s.id)
            .ok_or_else(|| anyhow!("No unfinished session. Import a CSV first"))?,
    };
    app.open_session(&id)?;
    Ok(())
}

fn print_orders(orders: &[&OrderWithTabs]) {
    for order in orders {
        let item = &order.item;
        let labels: Vec<&str> = order.tabs.iter().map(|t| t.label.as_str()).collect();
        println!(
            "{:<12} {:<10} {:<16} {:<9} {}tabs: {}",
            item.external_id,
            item.order_number,
            item.sku,
            item.status,
            if item.is_customized { "[custom] " } else { "" },
            labels.join(", ")
        );
        for url in &order.image_urls {
            println!("    {}", url);
        }
    }
}

fn print_stats(state: &AppState) {
    let stats = state.stats();
    println!(
        "{} orders: {} customized, {} ready-made | {} pending, {} uploaded, {} saved",
        stats.total,
        stats.customized,
        stats.ready_made,
        stats.pending,
        stats.uploaded,
        stats.saved
    );
}

fn rules(app: &App, command: RuleCommands) -> Result<()> {
    match command {
        RuleCommands::List => {
            for rule in app.list_rules()? {
                println!(
                    "{}  {:>4}  {} -> {}{}",
                    rule.id,
                    rule.priority,
                    rule.pattern,
                    rule.folder_name,
                    if rule.active { "" } else { "  (inactive)" }
                );
            }
        }
        RuleCommands::Add {
            pattern,
            folder,
            priority,
        } => {
            let rule = app.add_rule(&pattern, &folder, priority)?;
            println!("Added rule {}", rule.id);
        }
        RuleCommands::Update {
            id,
            pattern,
            folder,
            priority,
        } => {
            app.update_rule(&id, pattern.as_deref(), folder.as_deref(), priority)?;
            println!("Updated rule {}", id);
        }
        RuleCommands::Delete { id } => {
            app.delete_rule(&id)?;
            println!("Deleted rule {}", id);
        }
        RuleCommands::Toggle { id } => {
            let active = app.toggle_rule(&id)?;
            println!("Rule {} is now {}", id, if active { "active" } else { "inactive" });
        }
        RuleCommands::Test { sku } => {
            println!("{} -> {}", sku, app.test_routing(&sku)?);
        }
    }
    Ok(())
}

fn positions(app: &App, command: PositionCommands) -> Result<()> {
    match command {
        PositionCommands::List => {
            for p in app.list_positions()? {
                println!(
                    "{:<20} x={} y={} size={}  ({})",
                    p.sku,
                    p.x_position,
                    p.y_position,
                    p.font_size,
                    p.last_updated.format("%Y-%m-%d %H:%M")
                );
            }
        }
        PositionCommands::Set { sku, position } => {
            let position = StampPosition::new(position.x, position.y, position.font_size);
            app.remember_position(&sku, &position)?;
            println!("Remembered position for {}", sku);
        }
        PositionCommands::Delete { sku } => {
            app.forget_position(&sku)?;
            println!("Forgot position for {}", sku);
        }
    }
    Ok(())
}

async fn settings(app: &App, command: SettingsCommands) -> Result<()> {
    match command {
        SettingsCommands::Show => {
            let settings = app.settings()?;
            println!("date folder:    {}", settings.date_folder_path);
            println!("premade folder: {}", settings.premade_folder_path);
        }
        SettingsCommands::Set {
            date_folder,
            premade_folder,
            pick,
        } => {
            let current = app.settings()?;
            let date_folder = if pick {
                let folder = TerminalDialogs
                    .select_folder()
                    .await
                    .ok_or_else(|| anyhow!("No folder selected"))?;
                Some(folder.to_string_lossy().into_owned())
            } else {
                date_folder
            };
            let settings = AppSettings {
                date_folder_path: date_folder.unwrap_or(current.date_folder_path),
                premade_folder_path: premade_folder.unwrap_or(current.premade_folder_path),
            };
            app.save_settings(&settings).await?;
            println!("Settings saved");
        }
    }
    Ok(())
}

fn mapping(app: &App, command: MappingCommands) -> Result<()> {
    match command {
        MappingCommands::Show => match app.column_mapping()? {
            Some(mapping) => println!("{}", serde_json::to_string_pretty(&mapping)?),
            None => println!("No column mapping; default headers are used"),
        },
        MappingCommands::Set {
            id,
            order_number,
            sku,
            title,
            quantity,
            number_of_lines,
            customer_note,
            additional_options,
        } => {
            app.save_column_mapping(&ColumnMapping {
                external_id_column: id,
                order_number_column: order_number,
                sku_column: sku,
                title_column: title,
                quantity_column: quantity,
                number_of_lines_column: number_of_lines,
                customer_note_column: customer_note,
                additional_options_column: additional_options,
            })?;
            println!("Column mapping saved");
        }
        MappingCommands::Clear => {
            app.clear_column_mapping()?;
            println!("Column mapping cleared");
        }
    }
    Ok(())
}

async fn save(
    app: &mut App,
    external_id: &str,
    mut files: Vec<std::path::PathBuf>,
    position: OptionalPositionArgs,
    remember: bool,
    yes: bool,
    config: &Config,
) -> Result<()> {
    let order = app
        .state()
        .orders
        .iter()
        .find(|o| o.item.external_id == external_id)
        .ok_or_else(|| anyhow!("Order {} is not part of the session", external_id))?;
    let order_id = order.item.id.clone();
    let sku = order.item.sku.clone();
    let tabs: Vec<(String, String)> = order
        .tabs
        .iter()
        .map(|t| (t.id.clone(), t.label.clone()))
        .collect();

    if files.is_empty() {
        for (_, label) in &tabs {
            println!("Design for tab {}", label);
            let path = TerminalDialogs
                .select_file(&[FileFilter::pdf()])
                .await
                .ok_or_else(|| anyhow!("No file selected for tab {}", label))?;
            files.push(path);
        }
    }
    if files.len() != tabs.len() {
        let labels: Vec<&str> = tabs.iter().map(|(_, l)| l.as_str()).collect();
        bail!(
            "Order {} needs {} design(s) ({}), got {}",
            external_id,
            tabs.len(),
            labels.join(", "),
            files.len()
        );
    }

    for ((tab_id, _), path) in tabs.iter().zip(&files) {
        app.attach_file_from_path(&order_id, tab_id, path).await?;
    }

    let mut at = match (position.x, position.y) {
        (Some(x), Some(y)) => StampPosition::new(x, y, config.default_font_size),
        _ => app.suggested_position(&order_id)?,
    };
    if let Some(font_size) = position.font_size {
        at.font_size = font_size;
    }
    for (tab_id, _) in &tabs {
        app.place(&order_id, tab_id, at)?;
    }
    if remember {
        app.remember_position(&sku, &at)?;
    }

    let report = app
        .save_order(&order_id, &StdinPrompt { assume_yes: yes })
        .await?;
    for path in &report.saved_paths {
        println!("Saved {}", path.display());
    }
    if let Some(session) = &app.state().session {
        println!(
            "{}/{} orders saved ({})",
            session.completed_orders, session.total_orders, session.status
        );
    }
    Ok(())
}

async fn premade(app: &mut App, save: bool, yes: bool) -> Result<()> {
    let lookup = app.find_premade().await?;
    for error in &lookup.errors {
        warn!("{}", error);
    }
    for candidate in &lookup.candidates {
        println!("Found {}", candidate.file_name);
    }
    let attached = app.attach_premade(lookup);
    println!("Attached {} pre-made design(s)", attached);

    if !save {
        return Ok(());
    }
    let ready: Vec<String> = app
        .state()
        .orders
        .iter()
        .filter(|o| o.is_ready())
        .map(|o| o.item.id.clone())
        .collect();
    let prompt = StdinPrompt { assume_yes: yes };
    for order_id in ready {
        match app.save_order(&order_id, &prompt).await {
            Ok(report) => println!("Saved {} file(s) to {}", report.saved_paths.len(), report.folder_name),
            Err(e) => warn!(error = %e, "Pre-made save failed"),
        }
    }
    Ok(())
}

/// Logs everything still queued and returns how many events were logged.
/// Events dropped by a lagging receiver are reported and skipped.
fn log_events(events: &mut Receiver<SessionEvent>) -> usize {
    let mut logged = 0;
    loop {
        match events.try_recv() {
            Ok(event) => {
                info!(kind = %event.kind, "{}", event.message);
                logged += 1;
            }
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Session events were dropped");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    logged
}
