use clap::Parser;
use pitch_booker::adapters::http::DEFAULT_TIMEOUT;
use pitch_booker::core::parser::fetch_availability;
use pitch_booker::utils::logger;
use pitch_booker::{BookingConfig, HttpPageSource};

#[derive(Parser)]
#[command(name = "list-slots")]
#[command(about = "Print the bookable slots of an overview page")]
struct Args {
    /// Overview page URL; taken from the profile when omitted
    #[arg(short, long)]
    url: Option<String>,

    /// Booking profile to read the URL from
    #[arg(short, long, default_value = "booking.toml")]
    config: String,

    /// Print the availability map as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let (url, timeout) = match args.url {
        Some(url) => (url, DEFAULT_TIMEOUT),
        None => {
            let config = match BookingConfig::from_file(&args.config) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
                    eprintln!("💡 Pass --url or point --config at a booking profile");
                    std::process::exit(1);
                }
            };
            let timeout = config.http_timeout();
            (config.slots_overview_url, timeout)
        }
    };

    tracing::info!("📡 Fetching {}", url);
    let source = HttpPageSource::new(timeout)?;
    let map = fetch_availability(&source, &url).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if map.is_empty() {
        println!("No bookable slots listed.");
    }
    for day in map.days() {
        println!("{}:", day.day);
        for line in day.summary_lines() {
            println!("  {}", line);
        }
    }
    println!("{} slot(s) in total", map.slot_count());

    Ok(())
}
