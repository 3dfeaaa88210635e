pub mod config;
pub mod routine;
pub mod session;
pub mod stats;

use pacer_core::{Committed, Config, Ledger, SqliteStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Open the ledger in the data directory with the configured options.
pub fn open_ledger() -> Result<Ledger<SqliteStore>, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = SqliteStore::open_default()?;
    tracing::debug!("ledger store opened");
    Ok(Ledger::open(store, config.ledger_options())?)
}

/// Print a save warning, if any, and hand back the value.
pub fn report<T>(committed: Committed<T>) -> T {
    if let Some(warning) = &committed.warning {
        eprintln!("warning: changes not saved: {warning}");
    }
    committed.into_value()
}

/// Flush anything left unsaved, such as a rollover applied on open.
pub fn close_ledger(ledger: Ledger<SqliteStore>) {
    if let Err(e) = ledger.close() {
        eprintln!("warning: changes not saved: {e}");
    }
}
