//! Routine management commands for CLI.

use clap::Subcommand;
use pacer_core::{CalendarDate, Routine, RoutineDraft};

use super::{close_ledger, open_ledger, report, CliResult};

#[derive(Subcommand)]
pub enum RoutineAction {
    /// List routines, pinned first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a routine
    Add {
        /// Routine title
        title: String,
        /// Duration in seconds (default from config)
        #[arg(long)]
        duration: Option<u32>,
        /// Emoji shown next to the title (random when omitted)
        #[arg(long)]
        emoji: Option<String>,
    },
    /// Edit a routine
    Edit {
        /// Routine ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New duration in seconds
        #[arg(long)]
        duration: Option<u32>,
        /// New emoji
        #[arg(long)]
        emoji: Option<String>,
    },
    /// Delete a routine
    Delete {
        /// Routine ID
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Pin or unpin a routine
    Pin {
        /// Routine ID
        id: String,
    },
    /// Record a completion and award XP
    Complete {
        /// Routine ID
        id: String,
    },
    /// Add the starter routines
    Seed,
}

pub fn run(action: RoutineAction) -> CliResult {
    let mut ledger = open_ledger()?;

    match action {
        RoutineAction::List { json } => {
            let routines = ledger.list_routines();
            if json {
                println!("{}", serde_json::to_string_pretty(&routines)?);
            } else if routines.is_empty() {
                println!("No routines yet. Try `pacer routine seed`.");
            } else {
                let today = CalendarDate::today();
                for routine in &routines {
                    print_routine(routine, today);
                }
            }
        }
        RoutineAction::Add { title, duration, emoji } => {
            let duration = duration.unwrap_or(ledger.options().default_duration_secs);
            let mut draft = RoutineDraft::new(title, duration);
            if let Some(emoji) = emoji {
                draft = draft.with_emoji(emoji);
            }
            let routine = report(ledger.add_routine(draft)?);
            println!("Routine created: {}", routine.id);
        }
        RoutineAction::Edit { id, title, duration, emoji } => {
            let current = ledger
                .routine(&id)
                .cloned()
                .ok_or_else(|| pacer_core::CoreError::not_found(&id))?;
            let draft = RoutineDraft {
                title: title.unwrap_or(current.title),
                duration_secs: duration.unwrap_or(current.duration_secs),
                emoji,
            };
            let routine = report(ledger.edit_routine(&id, draft)?);
            println!("Routine updated: {} {} ({}s)", routine.emoji, routine.title, routine.duration_secs);
        }
        RoutineAction::Delete { id, yes } => {
            if !yes {
                return Err(format!("refusing to delete {id} without --yes").into());
            }
            let routine = report(ledger.delete_routine(&id)?);
            println!("Routine deleted: {}", routine.title);
        }
        RoutineAction::Pin { id } => {
            let routine = report(ledger.toggle_pin(&id)?);
            let state = if routine.pinned { "pinned" } else { "unpinned" };
            println!("{} {state}", routine.title);
        }
        RoutineAction::Complete { id } => {
            let completion = report(ledger.complete_routine(&id)?);
            println!("{}", completion.summary());
            if completion.leveled_up() {
                println!("Level up! Now level {}", completion.stats.level);
            }
            println!(
                "XP {}  Level {}  Streak {}",
                completion.stats.xp, completion.stats.level, completion.stats.streak
            );
        }
        RoutineAction::Seed => {
            let added = report(ledger.seed()?);
            println!("Seeded {} routines.", added.len());
        }
    }

    close_ledger(ledger);
    Ok(())
}

fn print_routine(routine: &Routine, today: CalendarDate) {
    let pin = if routine.pinned { "*" } else { " " };
    let done = if routine.done_today(today) { "done" } else { "" };
    println!(
        "{pin} {}  {} {}  {}s  today {}  total {}  {done}",
        routine.id,
        routine.emoji,
        routine.title,
        routine.duration_secs,
        routine.completions_on(today),
        routine.counts.total
    );
}
