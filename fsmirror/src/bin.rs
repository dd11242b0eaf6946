use std::{
    path::PathBuf,
    process,
    sync::{atomic::AtomicBool, Arc},
    time::Duration,
};

use env_logger::Env;
use fsmirror::{context::Context, error::Error, run};
use fsmirror_core::config::MirrorConfig;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "fsmirror")]
struct Opt {
    /// Folder to mirror
    #[structopt(parse(from_os_str))]
    primary: PathBuf,

    /// Folder receiving the mirror. Its content is replaced at startup.
    #[structopt(parse(from_os_str))]
    secondary: PathBuf,

    #[structopt(name = "--poll-interval-ms", long = "poll-interval-ms")]
    poll_interval_ms: Option<u64>,

    /// Config file to use instead of the default one
    #[structopt(name = "--config", long = "config", parse(from_os_str))]
    config: Option<PathBuf>,

    #[structopt(name = "--exit-after-sync", long = "exit-after-sync")]
    exit_after_sync: bool,

    /// Mirror secondary changes back into primary too
    #[structopt(name = "--watch-secondary", long = "watch-secondary")]
    watch_secondary: bool,

    #[structopt(name = "--scan-threads", long = "scan-threads")]
    scan_threads: Option<usize>,

    /// Create and remove folders on the other side when they appear or vanish
    #[structopt(name = "--propagate-directories", long = "propagate-directories")]
    propagate_directories: bool,
}

impl Opt {
    fn config(&self) -> Result<MirrorConfig, Error> {
        let mut config = match &self.config {
            Some(config_file_path) => MirrorConfig::from_file(config_file_path)?,
            None => MirrorConfig::from_env()?,
        };

        if let Some(poll_interval_ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(poll_interval_ms);
        }
        if let Some(scan_threads) = self.scan_threads {
            config.scan_threads = scan_threads.max(1);
        }
        config.exit_after_sync |= self.exit_after_sync;
        config.watch_secondary |= self.watch_secondary;
        config.propagate_directories |= self.propagate_directories;

        Ok(config)
    }

    fn to_context(&self) -> Result<Context, Error> {
        let config = self.config()?;
        log::debug!("Use config {:?}", config);
        Context::new(&self.primary, &self.secondary, &config)
    }
}

fn main_() -> Result<(), Error> {
    let opt = Opt::from_args();
    let context = opt.to_context()?;
    log::debug!("{:?}", context);

    let stop_signal = Arc::new(AtomicBool::new(false));
    run::run(context, stop_signal, None)?;
    log::info!("Exit application");
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(error) = main_() {
        log::error!("{}: {}", error, error_message(&error));
        process::exit(1);
    }
}

fn error_message(error: &Error) -> &str {
    match error {
        Error::StartupError(message)
        | Error::RunError(message)
        | Error::UnexpectedError(message) => message,
    }
}
