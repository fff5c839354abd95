//! Dealer Dashboard command line
//!
//! A thin view over the library: every command opens a session context,
//! runs one store or service call and prints the result.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

use dealer_dashboard::api;
use dealer_dashboard::models::{FieldTarget, Record, UploadFile};
use dealer_dashboard::query::{QueryParams, SearchFilter, TableState};
use dealer_dashboard::session::{
    clear_auth_user, load_auth_user, save_auth_user, AuthUser, FileStorage, KeyValueStore,
};
use dealer_dashboard::settings::{TableColumn, TableView};
use dealer_dashboard::{Config, DashboardContext, Outcome};

#[derive(Parser)]
#[command(name = "dealer-dashboard")]
#[command(about = "Browse and edit dealership records from the command line")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the stored session
    #[command(subcommand)]
    Session(SessionCommand),
    /// Inventory items
    #[command(subcommand)]
    Inventory(InventoryCommand),
    /// Contacts
    #[command(subcommand)]
    Contacts(ContactsCommand),
    /// Table preferences kept on the server
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Store the user and token used for API calls
    Set {
        #[arg(long)]
        useruid: String,
        #[arg(long)]
        token: String,
        #[arg(long, default_value = "")]
        username: String,
    },
    Show,
    Clear,
}

#[derive(Args)]
struct ListArgs {
    /// Global search text; overrides --filter
    #[arg(long)]
    search: Option<String>,
    /// Advanced search term as FIELD=VALUE (repeatable)
    #[arg(long = "filter", value_name = "FIELD=VALUE")]
    filters: Vec<String>,
    /// Zero-based page
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    desc: bool,
    /// Print the total count instead of rows
    #[arg(long)]
    total: bool,
}

#[derive(Subcommand)]
enum InventoryCommand {
    List(ListArgs),
    Show {
        itemuid: String,
        /// Also list media
        #[arg(long)]
        media: bool,
    },
    /// Edit fields and save; without an id a new item is created
    Save {
        itemuid: Option<String>,
        /// Entity field as FIELD=VALUE (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
        /// Extension field as FIELD=VALUE (repeatable)
        #[arg(long = "ext", value_name = "FIELD=VALUE")]
        ext: Vec<String>,
        /// Toggle an option (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
        /// Upload a media file after saving (repeatable)
        #[arg(long = "upload")]
        uploads: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ContactsCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Contact category id
        #[arg(long)]
        category: Option<i64>,
    },
    Show {
        contactuid: String,
        /// Also fetch driver licence images
        #[arg(long)]
        dl: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Inventory,
    Contacts,
    Deals,
    Accounts,
}

impl From<ViewArg> for TableView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Inventory => TableView::Inventory,
            ViewArg::Contacts => TableView::Contacts,
            ViewArg::Deals => TableView::Deals,
            ViewArg::Accounts => TableView::Accounts,
        }
    }
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show {
        #[arg(value_enum)]
        view: Option<ViewArg>,
    },
    /// Edit the active columns of a view
    Columns {
        #[arg(value_enum)]
        view: ViewArg,
        /// Show or hide a column
        #[arg(long)]
        toggle: Option<String>,
        /// New column order, comma separated
        #[arg(long, value_delimiter = ',')]
        order: Vec<String>,
        /// Column width as FIELD=PIXELS
        #[arg(long)]
        width: Option<String>,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(cli)) {
        let _ = rolling_logger::error(&format!("Command failed: {}", e));
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    if cli.verbose && std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "debug");
    }
    if let Err(e) = rolling_logger::init_logger(&config.log_dir, "DealerDashboard") {
        eprintln!("Logging disabled: {}", e);
    }

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStorage::new(&config.storage_path));
    match cli.command {
        Command::Session(cmd) => session(cmd, storage.as_ref()),
        Command::Inventory(cmd) => {
            let ctx = DashboardContext::from_session(config, storage)?;
            inventory(cmd, &ctx).await
        }
        Command::Contacts(cmd) => {
            let ctx = DashboardContext::from_session(config, storage)?;
            contacts(cmd, &ctx).await
        }
        Command::Settings(cmd) => {
            let ctx = DashboardContext::from_session(config, storage)?;
            settings(cmd, &ctx).await
        }
    }
}

// ========================
// Commands
// ========================

fn session(cmd: SessionCommand, storage: &dyn KeyValueStore) -> Result<(), Box<dyn Error>> {
    match cmd {
        SessionCommand::Set {
            useruid,
            token,
            username,
        } => {
            let user = AuthUser {
                useruid,
                token,
                username,
                loginname: String::new(),
                companyname: String::new(),
            };
            save_auth_user(storage, &user)?;
            log::info!("Session stored for {}", user.useruid);
            println!("Session stored for {}", user.useruid);
        }
        SessionCommand::Show => match load_auth_user(storage) {
            Some(user) => println!("{} ({})", user.useruid, user.username),
            None => println!("No session"),
        },
        SessionCommand::Clear => {
            clear_auth_user(storage)?;
            println!("Session cleared");
        }
    }
    Ok(())
}

async fn inventory(cmd: InventoryCommand, ctx: &DashboardContext) -> Result<(), Box<dyn Error>> {
    match cmd {
        InventoryCommand::List(args) => {
            let params = list_params(&args, ctx.config().rows_per_page)?;
            if args.total {
                let total = api::get_inventory_total(ctx.api(), ctx.useruid(), &params).await?;
                println!("{}", total);
            } else {
                let rows = api::get_inventory_list(ctx.api(), ctx.useruid(), &params).await?;
                print_rows(&rows);
            }
        }
        InventoryCommand::Show { itemuid, media } => {
            let scope = ctx.edit_inventory();
            check(scope.load(&itemuid).await)?;
            print_record(&scope.record());
            println!("extdata: {}", scope.extdata().into_value());
            println!("options: {}", scope.options().join(", "));
            if media {
                check(scope.fetch_media().await)?;
                let buckets = scope.buckets();
                for photo in &buckets.photos {
                    println!("photo {} ({})", photo.mediauid, photo.itemuid);
                }
                println!(
                    "videos: {}, audio: {}, documents: {}",
                    buckets.videos.len(),
                    buckets.audio.len(),
                    buckets.documents.len()
                );
            }
        }
        InventoryCommand::Save {
            itemuid,
            fields,
            ext,
            options,
            uploads,
        } => {
            let scope = ctx.edit_inventory();
            match &itemuid {
                Some(id) => check(scope.load(id).await)?,
                None => scope.begin_new(),
            }
            for (key, value) in parse_pairs(&fields)? {
                if !scope.mutate_field(FieldTarget::Entity, &key, value) {
                    eprintln!("Skipped read-only field {}", key);
                }
            }
            for (key, value) in parse_pairs(&ext)? {
                scope.mutate_field(FieldTarget::Extension, &key, value);
            }
            for option in &options {
                scope.toggle_option(option);
            }
            check(scope.save().await)?;
            let saved = scope.id().unwrap_or_default();
            println!("Saved {}", saved);

            if !uploads.is_empty() {
                let mut files = Vec::new();
                for path in &uploads {
                    files.push(UploadFile::from_path(path).await?);
                }
                let report = scope.upload_media(files).await;
                for failure in &report.failed {
                    eprintln!("Upload of {} failed: {}", failure.file_name, failure.error);
                }
                println!("Uploaded {} file(s)", report.uploaded.len());
                check(report.outcome)?;
            }
        }
    }
    Ok(())
}

async fn contacts(cmd: ContactsCommand, ctx: &DashboardContext) -> Result<(), Box<dyn Error>> {
    match cmd {
        ContactsCommand::List { list, category } => {
            let mut params = list_params(&list, ctx.config().rows_per_page)?;
            if let Some(category) = category {
                params = params.with_param(category.to_string());
            }
            if list.total {
                let total = api::get_contacts_total(ctx.api(), ctx.useruid(), &params).await?;
                println!("{}", total);
            } else {
                let rows = api::get_contacts(ctx.api(), ctx.useruid(), &params).await?;
                print_rows(&rows);
            }
        }
        ContactsCommand::Show { contactuid, dl } => {
            let scope = ctx.edit_contact();
            check(scope.load(&contactuid).await)?;
            print_record(&scope.record());
            println!("prospects: {}", scope.prospects().len());
            if dl {
                check(scope.fetch_dl_images().await)?;
                let images = scope.dl_images();
                println!("licence front: {}", if images.front.is_some() { "yes" } else { "no" });
                println!("licence back: {}", if images.back.is_some() { "yes" } else { "no" });
            }
        }
    }
    Ok(())
}

async fn settings(cmd: SettingsCommand, ctx: &DashboardContext) -> Result<(), Box<dyn Error>> {
    check(ctx.settings.load().await)?;
    match cmd {
        SettingsCommand::Show { view: None } => {
            println!("{}", serde_json::to_string_pretty(&ctx.settings.snapshot())?);
        }
        SettingsCommand::Show { view: Some(view) } => {
            let view = ctx.settings.view(view.into());
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        SettingsCommand::Columns {
            view,
            toggle,
            order,
            width,
        } => {
            let view: TableView = view.into();
            let current = ctx.settings.view(view);
            let available: Vec<TableColumn> = current.active_columns_or(&[]);
            let width = match width {
                Some(raw) => {
                    let (field, px) = split_pair(&raw)?;
                    Some((field, px.parse::<u32>()?))
                }
                None => None,
            };
            let outcome = ctx
                .settings
                .update(view, |settings| {
                    if let Some(field) = &toggle {
                        let column = TableColumn::new(field.as_str(), field.as_str());
                        let mut known = available.clone();
                        if !known.iter().any(|c| c.field == *field) {
                            known.push(column);
                        }
                        settings.toggle_column(&known, field);
                    }
                    if !order.is_empty() {
                        let order: Vec<&str> = order.iter().map(String::as_str).collect();
                        settings.reorder_columns(&available, &order);
                    }
                    if let Some((field, px)) = &width {
                        settings.set_column_width(field, *px);
                    }
                })
                .await;
            check(outcome)?;
            println!("Settings saved");
        }
    }
    Ok(())
}

// ========================
// Helpers
// ========================

fn check(outcome: Outcome) -> Result<(), Box<dyn Error>> {
    match outcome.message() {
        None => Ok(()),
        Some(msg) => Err(msg.into()),
    }
}

fn split_pair(raw: &str) -> Result<(String, String), Box<dyn Error>> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got {}", raw).into()),
    }
}

/// FIELD=VALUE pairs; values that parse as JSON numbers or booleans keep
/// their type
fn parse_pairs(raw: &[String]) -> Result<Vec<(String, Value)>, Box<dyn Error>> {
    raw.iter()
        .map(|pair| -> Result<(String, Value), Box<dyn Error>> {
            let (key, value) = split_pair(pair)?;
            let value = match serde_json::from_str::<Value>(&value) {
                Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
                _ => Value::String(value),
            };
            Ok((key, value))
        })
        .collect()
}

fn list_params(args: &ListArgs, rows_per_page: u32) -> Result<QueryParams, Box<dyn Error>> {
    let table = TableState {
        first: args.page * rows_per_page,
        page: args.page,
        sort_field: args.sort.clone(),
        sort_order: args.sort.as_ref().map(|_| if args.desc { -1 } else { 1 }),
        ..TableState::initial(rows_per_page)
    };
    let mut filter = SearchFilter::new();
    for raw in &args.filters {
        let (field, value) = split_pair(raw)?;
        filter = filter.with(field, value);
    }
    let search = args.search.clone().unwrap_or_default();
    Ok(table.to_query_params().with_filter(&filter).with_search(&search))
}

fn print_rows(rows: &[Record]) {
    if rows.is_empty() {
        println!("No records");
    }
    for row in rows {
        println!("{}", row.clone().into_value());
    }
}

fn print_record(record: &Record) {
    for (key, value) in record.iter() {
        println!("{}: {}", key, value);
    }
}
