use clap::Parser;
use pitch_booker::utils::error::ErrorCategory;
use pitch_booker::utils::logger;
use pitch_booker::{
    BookingConfig, BookingError, BookingFlow, CancelToken, ChromiumLauncher, CliConfig,
    HttpPageSource, LogCountdown, MonitorLoop, PollOutcome,
};
use std::io::{BufRead, Write};
use std::sync::Arc;

const EXIT_CONFIG: i32 = 1;
const EXIT_CANCELLED: i32 = 2;
const EXIT_FATAL: i32 = 3;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting pitch-booker");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => fail(&e, EXIT_CONFIG),
    };

    let outcome = if cli.dry_run {
        dry_run(&config).await
    } else {
        watch_and_book(&cli, &config).await
    };

    if let Err(e) = outcome {
        let exit_code = match (&e, e.category()) {
            (BookingError::Cancelled, _) => EXIT_CANCELLED,
            (_, ErrorCategory::Configuration) => EXIT_CONFIG,
            _ => EXIT_FATAL,
        };
        fail(&e, exit_code);
    }
}

fn load_config(cli: &CliConfig) -> Result<BookingConfig, BookingError> {
    tracing::info!("📄 Loading booking profile from {}", cli.config);
    let mut config = BookingConfig::from_file(&cli.config)?;
    if cli.headless {
        config.browser.headless = true;
    }

    let problems = config.collect_problems();
    if !problems.is_empty() {
        for problem in &problems {
            tracing::warn!("⚠️ {}", problem);
            eprintln!("⚠️ {}", problem);
        }
        if !cli.yes && !confirm("Continue anyway? (y/n) ")? {
            return Err(BookingError::ValidationError { errors: problems });
        }
        tracing::warn!("Continuing with {} profile problem(s)", problems.len());
    }

    Ok(config)
}

fn confirm(prompt: &str) -> Result<bool, BookingError> {
    print!("{}", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// One poll through the monitor; a slot that is not open yet is not an error.
async fn dry_run(config: &BookingConfig) -> Result<(), BookingError> {
    let monitor = build_monitor(config)?;
    let outcome = monitor.poll_once().await?;
    match &outcome {
        PollOutcome::Found(_) => println!("✅ {}", outcome),
        PollOutcome::NotYet(_) => println!("⏸️ {}", outcome),
    }
    Ok(())
}

fn build_monitor(
    config: &BookingConfig,
) -> Result<MonitorLoop<HttpPageSource, ChromiumLauncher>, BookingError> {
    let observer = Arc::new(LogCountdown);
    let source = HttpPageSource::new(config.http_timeout())?;
    let launcher = ChromiumLauncher::new(config.browser_options()?);
    let flow = BookingFlow::new(
        launcher,
        config.booking_profile(),
        config.booking_settings()?,
        observer.clone(),
    );
    Ok(MonitorLoop::new(source, flow, config.monitor_settings()?, observer))
}

async fn watch_and_book(cli: &CliConfig, config: &BookingConfig) -> Result<(), BookingError> {
    let monitor = build_monitor(config)?;

    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, stopping");
            signal_token.cancel();
        }
    });

    if cli.verbose {
        tracing::debug!("Monitor settings: {:?}", monitor.settings());
    }

    let receipt = monitor.run(&cancel).await?;
    tracing::info!("✅ Booked {} at {}", receipt.target, receipt.booked_at);
    println!("✅ Booked {} at {}", receipt.target, receipt.booked_at.format("%H:%M:%S"));
    Ok(())
}

fn fail(e: &BookingError, exit_code: i32) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(exit_code);
}
