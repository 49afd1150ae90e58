//! Command-line interface for docpager
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - Filter and cursor arguments
//! - Shell completion generation

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::{Config, OutputFormat};
use crate::error::{ExecutionError, Result};
use crate::query::Filter;
use crate::record::Cursor;

/// Extract database name from MongoDB connection URI
///
/// # Arguments
/// * `uri` - MongoDB connection URI
///
/// # Returns
/// * `Option<String>` - Database name if found in URI
fn extract_database_from_uri(uri: &str) -> Option<String> {
    // mongodb://[username:password@]host[:port][/database][?options]
    let after_scheme = uri.split("://").nth(1)?;
    let path_part = after_scheme.split('/').nth(1)?;
    let db_name = path_part.split('?').next().unwrap_or("");
    (!db_name.is_empty()).then(|| db_name.to_string())
}

/// Page through MongoDB collections
#[derive(Parser, Debug)]
#[command(
    name = "docpager",
    version,
    about = "Cursor-paginated reads over MongoDB collections",
    long_about = "Reads a MongoDB collection page by page, either following cursors one page
at a time or accumulating pages into a single result."
)]
pub struct CliArgs {
    /// MongoDB connection URI
    ///
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    #[arg(value_name = "URI")]
    pub uri: Option<String>,

    /// Database name to read from
    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    /// Collection to read
    #[arg(short = 'C', long, value_name = "NAME")]
    pub collection: Option<String>,

    /// Filter as "FIELD OP VALUE", repeatable (combined with AND)
    ///
    /// Operators: ==, !=, <, <=, >, >=, in, not-in, array-contains, array-contains-any.
    /// VALUE is JSON when it parses as JSON, a plain string otherwise.
    #[arg(short = 'f', long = "filter", value_name = "EXPR", value_parser = parse_filter)]
    pub filters: Vec<Filter>,

    /// Records per page
    #[arg(short = 'n', long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Number of pages to fetch
    #[arg(long, value_name = "N")]
    pub pages: Option<u32>,

    /// Resume after the record with this id (per-page mode only)
    ///
    /// A 24 character hex id is read as an ObjectId; pass --after-string
    /// when the collection uses string ids of that shape.
    #[arg(long, value_name = "ID")]
    pub after: Option<String>,

    /// Read --after as a string id, never as an ObjectId
    #[arg(long, requires = "after")]
    pub after_string: bool,

    /// Accumulate pages into one result instead of printing each page
    #[arg(long)]
    pub accumulate: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Output format (json, json-pretty, compact)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for docpager
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration
        #[arg(long)]
        validate: bool,
    },
}

impl CliArgs {
    /// Cursor built from `--after` and `--after-string`
    pub fn start_cursor(&self) -> Option<Cursor> {
        let id = self.after.as_deref()?;
        Some(if self.after_string {
            Cursor::from_string_id(id)
        } else {
            Cursor::from_id_str(id)
        })
    }
}

fn parse_filter(expr: &str) -> std::result::Result<Filter, String> {
    Filter::parse(expr).map_err(|e| e.to_string())
}

/// CLI interface handler
#[derive(Debug)]
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse process arguments and load configuration
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, &args);
        Ok(Self { args, config })
    }

    /// Apply command-line overrides to a loaded configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(uri) = &args.uri {
            config.connection.default_uri = uri.clone();
            if let Some(db) = extract_database_from_uri(uri) {
                config.connection.database = db;
            }
        }
        if let Some(db) = &args.database {
            config.connection.database = db.clone();
        }
        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }
        if let Some(size) = args.page_size {
            config.reader.page_size = size;
        }
        if let Some(pages) = args.pages {
            config.reader.max_pages = pages;
        }
        if let Some(format) = args.format {
            config.display.format = format;
        }
        if args.no_color {
            config.display.color_output = false;
        }
    }

    /// Handle subcommands that do not need a connection
    ///
    /// # Returns
    /// * `Result<bool>` - True if a subcommand ran and the program should exit
    pub fn handle_subcommand(&self) -> Result<bool> {
        let Some(command) = &self.args.command else {
            return Ok(false);
        };

        match command {
            Commands::Version => {
                println!("docpager {}", crate::version());
            }
            Commands::Completion { shell } => {
                let mut cmd = CliArgs::command();
                clap_complete::generate(*shell, &mut cmd, "docpager", &mut std::io::stdout());
            }
            Commands::Config { show, validate } => {
                if *validate {
                    self.config.validate()?;
                    println!("Configuration is valid");
                }
                if *show || !*validate {
                    println!("{}", self.config.to_toml_string()?);
                }
            }
        }
        Ok(true)
    }

    /// Collection to read, required outside of subcommands
    pub fn collection(&self) -> Result<&str> {
        self.args.collection.as_deref().ok_or_else(|| {
            ExecutionError::InvalidParameters("--collection is required".to_string()).into()
        })
    }

    /// Cursor to start after, from `--after`
    pub fn start_cursor(&self) -> Option<Cursor> {
        self.args.start_cursor()
    }

    /// Parsed command-line arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Effective configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
