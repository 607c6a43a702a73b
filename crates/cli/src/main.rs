#![forbid(unsafe_code)]

use jd_core::day::{calendar_day, now_ms};
use jd_core::entities::Task;
use jd_core::{BranchTag, EntityKind};
use jd_storage::{DocumentStore, SqliteStore};
use jd_sync::bulk::read_catalog;
use jd_sync::{
    AppState, BulkOperator, CollectionView, LocalIdentityProvider, Preferences, SessionDriver,
    SubscriptionManager, SyncConfig, ViewSink,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn usage() -> &'static str {
    "jd — jardin dashboard data tools\n\n\
USAGE:\n\
  jd [--storage-dir DIR] [--namespace NS] [--branch NAME] [--utc-offset-min M]\n\
     [--batch-size N] [--token TOKEN] [--filter-shared] COMMAND\n\n\
COMMANDS:\n\
  tasks               list tasks of the active branch\n\
  branch [NAME]       show or switch the active branch (no NAME toggles)\n\
  user NAME           set the display name stamped on new tasks\n\
  backup [DIR]        export every collection to backup_jardin_<date>.json\n\
  stock-import FILE   add one stock item per line of FILE\n\
  stock-reset         delete every stock item\n\n\
ENV:\n\
  JD_STORAGE_DIR, JD_NAMESPACE, JD_BRANCH, JD_UTC_OFFSET_MIN, JD_BATCH_SIZE,\n\
  JD_EXTRA_COLLECTIONS, JD_FILTER_SHARED, JD_TOKEN, JD_LOG (default: info)\n"
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("JD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[derive(Debug)]
enum Command {
    Tasks,
    Branch(Option<String>),
    User(String),
    Backup(Option<PathBuf>),
    StockImport(PathBuf),
    StockReset,
}

fn parse_command(rest: &[String]) -> Result<Command, String> {
    let Some((name, args)) = rest.split_first() else {
        return Err("missing COMMAND (see --help)".to_string());
    };
    let single = |what: &str| -> Result<Option<String>, String> {
        match args {
            [] => Ok(None),
            [value] => Ok(Some(value.clone())),
            _ => Err(format!("{name} takes at most one {what}")),
        }
    };
    match name.as_str() {
        "tasks" if args.is_empty() => Ok(Command::Tasks),
        "branch" => Ok(Command::Branch(single("NAME")?)),
        "user" => single("NAME")?
            .map(Command::User)
            .ok_or_else(|| "user requires NAME".to_string()),
        "backup" => Ok(Command::Backup(single("DIR")?.map(PathBuf::from))),
        "stock-import" => single("FILE")?
            .map(|file| Command::StockImport(PathBuf::from(file)))
            .ok_or_else(|| "stock-import requires FILE".to_string()),
        "stock-reset" if args.is_empty() => Ok(Command::StockReset),
        other => Err(format!("unknown command: {other}")),
    }
}

struct TaskPrinter {
    now_ms: i64,
    state: AppState,
}

impl ViewSink for TaskPrinter {
    fn render(&mut self, view: &CollectionView) {
        if view.kind != EntityKind::Task {
            return;
        }
        println!("branch {}: {} task(s)", view.branch, view.documents.len());
        for doc in &view.documents {
            let task = Task::from_document(doc);
            let mark = if task.is_done_at(self.now_ms, self.state.utc_offset) {
                "x"
            } else if task.is_partial() {
                "~"
            } else {
                " "
            };
            let priority = task.priority.map(|p| p.as_str()).unwrap_or("?");
            let cycle = if task.cycle.is_recurring() {
                format!(" ({})", task.cycle.as_str())
            } else {
                String::new()
            };
            println!("[{mark}] {priority:<8} {}{cycle} · {}", task.text, task.assignee);
        }
    }

    fn subscription_failed(&mut self, kind: EntityKind, message: &str) {
        eprintln!("{} unavailable: {message}", kind.collection());
    }
}

fn run(cfg: SyncConfig, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let mut prefs = Preferences::load(&cfg.storage_dir)?;
    if let Some(branch) = &cfg.branch {
        prefs.branch = Some(branch.as_str().to_string());
    }
    let mut state = AppState::from_preferences(&prefs, cfg.utc_offset);

    match &command {
        Command::Branch(name) => {
            match name {
                Some(name) => {
                    state.set_branch(BranchTag::try_new(name.as_str())?);
                }
                None => {
                    state.toggle_branch();
                }
            }
            state.preferences().save(&cfg.storage_dir)?;
            println!("active branch: {}", state.branch);
            return Ok(());
        }
        Command::User(name) => {
            if !state.set_username(name) {
                return Err("display name must not be blank".into());
            }
            state.preferences().save(&cfg.storage_dir)?;
            println!("display name: {}", state.username);
            return Ok(());
        }
        _ => {}
    }

    let store = Arc::new(SqliteStore::open(&cfg.storage_dir, cfg.namespace.clone())?);
    let store_dyn: Arc<dyn DocumentStore> = store.clone();
    let bulk = BulkOperator::new(Arc::clone(&store_dyn))
        .with_batch_size(cfg.batch_size)
        .with_extra_collections(cfg.extra_collections.clone());

    match command {
        Command::Tasks => {
            let manager = SubscriptionManager::new(store_dyn, cfg.filter_shared);
            let mut driver =
                SessionDriver::new(LocalIdentityProvider::new(), manager, bulk, cfg.token.clone());
            if !driver.start(&mut state) {
                return Err("could not establish a session".into());
            }
            let mut printer = TaskPrinter {
                now_ms: now_ms(),
                state: state.clone(),
            };
            driver.pump(&mut printer);
        }
        Command::Backup(dir) => {
            let dir = dir.unwrap_or_else(|| cfg.storage_dir.clone());
            let today = calendar_day(now_ms(), cfg.utc_offset).ok_or("clock out of range")?;
            let path = bulk.write_backup(&dir, today)?;
            println!("{}", path.display());
        }
        Command::StockImport(file) => {
            let names = read_catalog(&file)?;
            if names.is_empty() {
                info!(file = %file.display(), "catalog empty, nothing imported");
                return Ok(());
            }
            let report = bulk.batch_insert_stock(&names)?;
            println!(
                "imported {} item(s) in {} batch(es)",
                report.ops_committed, report.chunks_committed
            );
        }
        Command::StockReset => {
            let report = bulk.batch_delete_all_stock()?;
            println!(
                "deleted {} item(s) in {} batch(es)",
                report.ops_committed, report.chunks_committed
            );
        }
        Command::Branch(_) | Command::User(_) => {}
    }
    Ok(())
}

fn main() {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print!("{}", usage());
        return;
    }
    init_tracing();

    let (cfg, rest) = match SyncConfig::from_env_and_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let command = match parse_command(&rest) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(cfg, command) {
        error!(error = %err, "command failed");
        eprintln!("{err}");
        std::process::exit(1);
    }
}
