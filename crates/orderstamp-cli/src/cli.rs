use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use orderstamp::{OrderFilter, SkuFamily};

#[derive(Parser)]
#[command(
    name = "orderstamp",
    about = "Import order CSVs, stamp order numbers onto designs and file them by SKU",
    version
)]
pub struct Cli {
    /// Config file (defaults to ~/.orderstamp/config.json)
    #[arg(long, global = true, env = "ORDERSTAMP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import an order CSV as a new session
    Import {
        /// CSV file (asked for when omitted)
        csv: Option<PathBuf>,
    },

    /// Show the header row of a CSV, for building a column mapping
    Headers {
        csv: PathBuf,
    },

    /// List the orders of a session and their upload tabs
    Orders {
        /// Session id (defaults to the latest unfinished session)
        #[arg(long)]
        session: Option<String>,

        /// Match order number, SKU or external id, ignoring case
        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,

        #[arg(long, value_enum, default_value = "all")]
        sku_family: FamilyArg,
    },

    /// List recent sessions
    Sessions {
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Manage SKU routing rules
    Rules {
        #[command(subcommand)]
        command: RuleCommands,
    },

    /// Manage remembered stamp positions
    Positions {
        #[command(subcommand)]
        command: PositionCommands,
    },

    /// Show or change folder settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Manage the CSV column mapping
    Mapping {
        #[command(subcommand)]
        command: MappingCommands,
    },

    /// Stamp text onto the first page of a single PDF
    Stamp {
        input: PathBuf,
        output: PathBuf,

        /// Text to stamp, usually the order number
        #[arg(long)]
        text: String,

        #[command(flatten)]
        position: PositionArgs,
    },

    /// Attach designs to an order, stamp them and save into the routed folder
    Save {
        /// Session id (defaults to the latest unfinished session)
        #[arg(long)]
        session: Option<String>,

        /// External order id from the CSV
        #[arg(long)]
        order: String,

        /// Design PDFs in tab order; asked for when omitted
        #[arg(long = "file", num_args = 1..)]
        files: Vec<PathBuf>,

        /// Stamp position; defaults to the remembered SKU position
        #[command(flatten)]
        position: OptionalPositionArgs,

        /// Remember the position for this SKU
        #[arg(long)]
        remember: bool,

        /// Overwrite existing files without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Look up pre-made designs for the orders of a session
    Premade {
        #[arg(long)]
        session: Option<String>,

        /// Save every order that ends up ready (remembered position present)
        #[arg(long)]
        save: bool,

        /// Overwrite existing files without asking
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Customized,
    ReadyMade,
    Pending,
    Uploaded,
    Saved,
}

impl From<FilterArg> for OrderFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => OrderFilter::All,
            FilterArg::Customized => OrderFilter::Customized,
            FilterArg::ReadyMade => OrderFilter::ReadyMade,
            FilterArg::Pending => OrderFilter::Pending,
            FilterArg::Uploaded => OrderFilter::Uploaded,
            FilterArg::Saved => OrderFilter::Saved,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FamilyArg {
    All,
    Ch,
    Cd,
    Bl,
    Other,
}

impl From<FamilyArg> for SkuFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::All => SkuFamily::All,
            FamilyArg::Ch => SkuFamily::Ch,
            FamilyArg::Cd => SkuFamily::Cd,
            FamilyArg::Bl => SkuFamily::Bl,
            FamilyArg::Other => SkuFamily::Other,
        }
    }
}

#[derive(Args, Clone, Copy)]
pub struct PositionArgs {
    /// Distance from the left edge, in points
    #[arg(long)]
    pub x: f64,

    /// Distance from the top edge, in points
    #[arg(long)]
    pub y: f64,

    #[arg(long, default_value = "12")]
    pub font_size: f64,
}

#[derive(Args, Clone, Copy)]
pub struct OptionalPositionArgs {
    #[arg(long, requires = "y")]
    pub x: Option<f64>,

    #[arg(long, requires = "x")]
    pub y: Option<f64>,

    #[arg(long)]
    pub font_size: Option<f64>,
}

#[derive(Subcommand)]
pub enum RuleCommands {
    List,

    Add {
        /// Substring matched against the SKU, ignoring case
        pattern: String,
        /// Folder under the date folder
        folder: String,
        /// Lower wins
        #[arg(long, default_value = "0")]
        priority: i32,
    },

    Update {
        id: String,
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        priority: Option<i32>,
    },

    Delete {
        id: String,
    },

    /// Enable or disable a rule
    Toggle {
        id: String,
    },

    /// Show where a SKU would be routed
    Test {
        sku: String,
    },
}

#[derive(Subcommand)]
pub enum PositionCommands {
    List,

    Set {
        sku: String,
        #[command(flatten)]
        position: PositionArgs,
    },

    Delete {
        sku: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    Show,

    /// Set folder paths; omitted values keep their current setting
    Set {
        #[arg(long)]
        date_folder: Option<String>,
        #[arg(long)]
        premade_folder: Option<String>,
        /// Pick the date folder interactively
        #[arg(long, conflicts_with = "date_folder")]
        pick: bool,
    },
}

#[derive(Subcommand)]
pub enum MappingCommands {
    Show,

    /// Store header names; blank or omitted fields use the defaults
    Set {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        order_number: Option<String>,
        #[arg(long)]
        sku: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        number_of_lines: Option<String>,
        #[arg(long)]
        customer_note: Option<String>,
        #[arg(long)]
        additional_options: Option<String>,
    },

    Clear,
}
