use std::path::PathBuf;
use std::process::ExitCode;

use masterplan::config::MasterPlanConfig;
use masterplan::project::Project;

fn main() -> ExitCode {
    match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => {
            if journal
                .with_syslog_identifier("masterplan-plan-check".to_string())
                .install()
                .is_ok()
            {
                log::set_max_level(log::LevelFilter::Info);
            }
        }
        Err(e) => eprintln!("journal unavailable: {}", e),
    }

    // Plans named on the command line, else every recent plan
    let mut plans: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if plans.is_empty() {
        plans = MasterPlanConfig::load(&MasterPlanConfig::default_path()).recent_plans;
    }
    if plans.is_empty() {
        println!("No plans to check.");
        return ExitCode::SUCCESS;
    }

    let mut failed = false;
    for path in &plans {
        println!("=== {} ===", path.display());
        let project = match Project::load(path) {
            Ok(p) => p,
            Err(e) => {
                println!("  Could not load: {}", e);
                failed = true;
                continue;
            }
        };

        for board in &project.boards {
            let problems = board.audit();
            let broken: Vec<String> = board
                .cards
                .iter()
                .filter_map(|c| {
                    let res = c.contents.resource()?;
                    res.broken.then(|| format!("card {} ({})", c.id, res.path))
                })
                .collect();
            println!(
                "  {}: {} cards over {} grid cells, {} problems, {} broken resources",
                board.name,
                board.len(),
                board.grid().occupied(),
                problems.len(),
                broken.len()
            );
            for p in &problems {
                println!("    ! {}", p);
            }
            for b in &broken {
                println!("    ? {}", b);
            }
            failed |= !problems.is_empty();
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
