use chrono::Local;
use sftp_backup::config::load_config;
use sftp_backup::{backup, cleanup, sort, RetentionThreshold, Settings};
use std::path::PathBuf;
use std::process;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "sftp-backup", about = "Pull remote backups over SFTP and prune local copies")]
struct Cli {
    #[structopt(subcommand)]
    command: Command,

    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config_path: Option<PathBuf>,
}

#[derive(StructOpt)]
enum Command {
    /// Download this month's backups, then prune the local destination
    Backup {
        #[structopt(short, long)]
        threshold: Option<usize>,
    },
    /// Download this month's backups without pruning
    Download,
    /// Delete the oldest local backups beyond the threshold
    Prune {
        #[structopt(short, long)]
        threshold: Option<usize>,
    },
    /// List this month's remote backups
    List,
    /// Move timestamped local backups into year/month/day directories
    Sort {
        #[structopt(long = "ext")]
        extensions: Vec<String>,
        #[structopt(long)]
        dry_run: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::from_args();
    let config_path = args.config_path.unwrap_or_else(|| PathBuf::from("config.toml"));

    if let Err(e) = run(args.command, config_path) {
        log::error!("{}", e);
        process::exit(1);
    }
}

fn run(command: Command, config_path: PathBuf) -> sftp_backup::Result<()> {
    let settings = load_config(&config_path)?;
    log::debug!("Settings: {:?}", settings);

    match command {
        Command::Backup { threshold } => {
            let threshold = threshold_or_default(threshold, &settings)?;
            download(&settings)?;
            prune(&settings, threshold)?;
        }
        Command::Download => {
            download(&settings)?;
        }
        Command::Prune { threshold } => {
            let threshold = threshold_or_default(threshold, &settings)?;
            prune(&settings, threshold)?;
        }
        Command::List => {
            let files = backup::list_period(
                &settings.profile,
                &settings.remote_backup_dir(),
                Local::now().date_naive(),
            )?;
            for file in files {
                println!("{}", file);
            }
        }
        Command::Sort { extensions, dry_run } => {
            let extensions: Vec<&str> = if extensions.is_empty() {
                sort::DEFAULT_EXTENSIONS.to_vec()
            } else {
                extensions.iter().map(String::as_str).collect()
            };
            let sorted = sort::sort_into_date_dirs(&settings.local_backup_dir(), &extensions, dry_run)?;
            log::info!("Sorted {} file(s)", sorted.len());
        }
    }
    Ok(())
}

fn threshold_or_default(threshold: Option<usize>, settings: &Settings) -> sftp_backup::Result<RetentionThreshold> {
    match threshold {
        Some(limit) => RetentionThreshold::new(limit),
        None => Ok(settings.local_backup_limit),
    }
}

fn download(settings: &Settings) -> sftp_backup::Result<()> {
    log::info!(
        ">> Start backup from {} (remote cwd {}, suffix '{}')",
        settings.profile.target(),
        settings.remote_cwd,
        settings.extra_path_suffix
    );
    let summary = backup::run_backup(
        &settings.profile,
        &settings.remote_backup_dir(),
        &settings.local_backup_dir(),
    )?;
    log::info!(
        "<< End backup: {} remote file(s), {} downloaded, {} skipped",
        summary.files_found,
        summary.download.downloaded,
        summary.download.skipped
    );
    Ok(())
}

fn prune(settings: &Settings, threshold: RetentionThreshold) -> sftp_backup::Result<()> {
    let local_dir = settings.local_backup_dir();
    log::info!(">> Start cleanup of {} (keep {})", local_dir.display(), threshold.get());
    let deleted = cleanup::prune(&local_dir, threshold)?;
    for record in &deleted {
        println!("{}", record.name);
    }
    log::info!("<< End cleanup: {} file(s) deleted", deleted.len());
    Ok(())
}
