use clap::Subcommand;
use pacer_core::CalendarDate;

use super::{close_ledger, open_ledger, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// XP, level, streak and today's completions
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let mut ledger = open_ledger()?;

    match action {
        StatsAction::Show { json } => {
            let stats = ledger.stats();
            let progress = stats.level_progress();
            let streak = stats.current_streak(CalendarDate::today());
            if json {
                let mut value = serde_json::to_value(&stats)?;
                value["currentStreak"] = streak.into();
                value["levelProgress"] = serde_json::to_value(progress)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Level {}  ({} XP total)", stats.level, stats.xp);
                println!(
                    "Progress {}/100 ({:.0}%), {} XP to next level",
                    progress.xp_in_level,
                    progress.percent(),
                    progress.xp_to_next
                );
                println!("Streak {streak} day(s)");
                println!("Today {} completion(s)", stats.today_total);
            }
        }
    }

    close_ledger(ledger);
    Ok(())
}
