use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tabprobe::controller::Controller;
use tabprobe::domain::{AppConfig, AppError, Message, Slot};
use tabprobe::model::{Model, Status};
use tabprobe::ui;

/// Profile CSV files and compare column values between two of them.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Primary CSV file to analyse
    primary: Option<PathBuf>,

    /// Secondary CSV file, used for the comparison
    #[arg(short, long)]
    secondary: Option<PathBuf>,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Maximum rendered width of a table column
    #[arg(long, default_value_t = 32)]
    max_column_width: usize,

    /// Log file, the terminal is used by the UI
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = run(args);
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(config: &AppConfig) -> Result<(), AppError> {
    let file = File::create(&config.log_file)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    let mut config = AppConfig::default()
        .event_poll_time(args.poll_ms)
        .max_column_width(args.max_column_width);
    if let Some(log_file) = args.log_file {
        config = config.log_file(log_file);
    }
    init_logging(&config)?;
    info!("Starting tabprobe with {config:?}");

    let mut model = Model::init(&config);
    if let Some(path) = &args.primary {
        model.load_file(Slot::Primary, path);
    }
    if let Some(path) = &args.secondary {
        model.load_file(Slot::Secondary, path);
    }

    let controller = Controller::new(&config);
    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    model.update(Message::Resize(size.width as usize, size.height as usize))?;

    while model.status != Status::Quitting {
        terminal.draw(|f| ui::draw(f, &model.get_uidata()))?;

        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        };
    }

    info!("Quitting tabprobe");
    Ok(())
}
