use std::path::PathBuf;
use std::process::ExitCode;

use log::Log as _;

use masterplan::config::MasterPlanConfig;
use masterplan::input::InputFrame;
use masterplan::plan;
use masterplan::project::{self, Project};

fn init_logging(debug: bool) {
    // Logs go to the systemd user journal (`journalctl --user -t masterplan -f`).
    // Wrapper filters: masterplan crate at info/debug, everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("masterplan") {
                let max = if masterplan::debug_logging() { log::LevelFilter::Debug } else { log::LevelFilter::Info };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    masterplan::set_debug_logging(debug);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("masterplan".to_string()),
        Err(e) => {
            eprintln!("masterplan: journal unavailable, logging disabled ({})", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = MasterPlanConfig::default_path();
    let mut config = MasterPlanConfig::load(&config_path);

    let debug = config.debug_logging
        || args.iter().any(|a| a == "--debug")
        || std::env::var_os("MASTERPLAN_DEBUG").is_some();
    init_logging(debug);

    let plan_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .or_else(|| config.autoload_plan().map(PathBuf::from));

    let mut project = match &plan_path {
        Some(path) => {
            let mut plan = match plan::read_plan(path) {
                Ok(plan) => plan,
                Err(e) => {
                    log::error!("Could not open {}: {}", path.display(), e);
                    eprintln!("masterplan: could not open {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            // Plans without their own bindings use the program-wide ones.
            if plan.keybindings.is_none() {
                plan.keybindings = Some(config.keybindings());
            }
            Project::from_plan(plan, Some(path.clone()))
        }
        None => {
            let mut project = Project::new();
            project.keybindings = config.keybindings();
            project
        }
    };

    project.update(&InputFrame::default());

    for board in &project.boards {
        print!("{}", project::outline(&project, board));
    }
    for entry in project.log.entries() {
        eprintln!("{}", entry.render());
    }

    if let Some(path) = &plan_path {
        config.push_recent(path);
        config.save(&config_path);
    }
    ExitCode::SUCCESS
}
