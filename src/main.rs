use clap::Parser;
use gigboard::app::{build_router, init_db};
use gigboard::router::AppState;
use gigboard::settings::{Settings, TemplateSettings};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Venue, artist and show booking directory.
#[derive(Parser, Debug)]
#[command(name = "gigboard", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, env = "GIGBOARD_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "GIGBOARD_PORT", default_value_t = 5000)]
    port: u16,

    /// SQLite connection URI
    #[arg(long, env = "GIGBOARD_DATABASE_URL", default_value = "sqlite://gigboard.db")]
    database_url: String,

    /// Directory holding the HTML templates
    #[arg(long, env = "GIGBOARD_TEMPLATES", default_value = "templates")]
    templates: String,

    /// Warnings and errors are appended here unless --debug is set
    #[arg(long, env = "GIGBOARD_ERROR_LOG", default_value = "error.log")]
    error_log: String,

    /// Directory of *.sql files applied after the model migrations
    #[arg(long, env = "GIGBOARD_MIGRATIONS")]
    migrations: Option<String>,

    #[arg(long, env = "GIGBOARD_DEBUG")]
    debug: bool,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            debug: args.debug,
            host: args.host,
            port: args.port,
            database_url: args.database_url,
            error_log: args.error_log,
            migrations_dir: args.migrations,
            template: TemplateSettings {
                dir: args.templates,
                debug: args.debug,
            },
        }
    }
}

fn init_logging(settings: &Settings) -> gigboard::Result<()> {
    let stdout = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    let error_file = if settings.debug {
        None
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.error_log)?;
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::WARN),
        )
    };
    tracing_subscriber::registry()
        .with(stdout)
        .with(error_file)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> gigboard::Result<()> {
    let settings = Settings::from(Args::parse());
    init_logging(&settings)?;
    log::info!(
        "Starting gigboard v{} (debug: {})",
        env!("CARGO_PKG_VERSION"),
        settings.debug
    );

    let db = match init_db(&settings).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("Database setup failed: {}", e);
            return Err(e);
        }
    };

    let router = build_router(AppState {
        db,
        settings: settings.clone(),
    });
    router.run(&settings).await
}
