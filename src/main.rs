//! docpager command-line entry point
//!
//! Reads a MongoDB collection page by page and prints the records.
//!
//! # Usage
//!
//! ```bash
//! # Three pages of five active users, following cursors
//! docpager mongodb://localhost:27017/shop -C users -f 'status == active' -n 5 --pages 3
//!
//! # Accumulate pages into one result
//! docpager mongodb://localhost:27017/shop -C users -n 5 --pages 3 --accumulate
//! ```

use bson::Document;
use tracing::{Level, debug};

use docpager::cli::CliInterface;
use docpager::connection::ConnectionManager;
use docpager::error::Result;
use docpager::formatter::Formatter;
use docpager::reader::{PageRequest, PagedReader};
use docpager::store::MongoStore;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or read the requested collection
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand()? {
        return Ok(());
    }

    cli.config().validate()?;
    let collection = cli.collection()?.to_string();

    let config = cli.config();
    let mut manager = ConnectionManager::new(
        config.connection.default_uri.clone(),
        config.connection.clone(),
    );
    manager.connect().await?;

    let store = MongoStore::new(manager.database(&config.connection.database)?);
    let reader: PagedReader<Document, _> = PagedReader::new(store);
    let formatter = Formatter::from_config(&config.display);

    let result = if cli.args().accumulate {
        read_accumulating(&cli, &reader, &formatter, &collection).await
    } else {
        read_pages(&cli, &reader, &formatter, &collection).await
    };

    manager.disconnect().await?;
    result
}

/// Fetch up to `max_pages` pages statelessly, following `next_cursor`.
async fn read_pages(
    cli: &CliInterface,
    reader: &PagedReader<Document, MongoStore>,
    formatter: &Formatter,
    collection: &str,
) -> Result<()> {
    let reader_config = &cli.config().reader;
    let mut cursor = cli.start_cursor();

    for page_number in 1..=reader_config.max_pages {
        let request = PageRequest::new(collection)
            .filters(cli.args().filters.iter().cloned())
            .page_size(reader_config.page_size)
            .after(cursor.take());

        let page = reader.fetch_page::<Document>(request).await?;
        debug!("Page {} has {} record(s)", page_number, page.len());

        if !page.is_empty() {
            println!("{}", formatter.format_page(&page)?);
        }

        let short = page.len() < reader_config.page_size as usize;
        cursor = page.next_cursor;
        if short || cursor.is_none() {
            break;
        }
    }

    if let Some(cursor) = cursor {
        eprintln!("next cursor: {cursor}");
    }
    Ok(())
}

/// Drive the accumulating reader for up to `max_pages` calls.
async fn read_accumulating(
    cli: &CliInterface,
    reader: &PagedReader<Document, MongoStore>,
    formatter: &Formatter,
    collection: &str,
) -> Result<()> {
    let reader_config = &cli.config().reader;
    let filters = &cli.args().filters;

    for _ in 0..reader_config.max_pages {
        if !reader.has_more() {
            break;
        }
        reader
            .fetch_accumulating(collection, reader_config.page_size, filters)
            .await;
        if reader.error().is_some() {
            break;
        }
    }

    let output = reader.state().with(|state| formatter.format_state(state))?;
    println!("{output}");

    match reader.error() {
        Some(err) => Err(docpager::PagerError::Generic(err.to_string())),
        None => Ok(()),
    }
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
