mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use advisor_core::{
    assistant, AnalyticsClient, AnalyticsEndpoint, AdvisorTransport, HttpTransport, JsonFileStore,
    KeyValueStore, RequestSequencer, ResultCache, SequencerOptions, SystemClock,
    ViewStateController, ANALYTICS_NAMESPACE,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use shared::domain::{FilterCriteria, RawProfileInput};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(name = "advisor", about = "University admission advisor client")]
struct Cli {
    /// Overrides `api_url` from the settings file and environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validates a profile, then fetches the admission chance and recommendations.
    Submit {
        #[arg(long)]
        gpa: String,
        #[arg(long)]
        ielts: String,
        #[arg(long)]
        budget: String,
        #[arg(long)]
        preferred_country: Option<String>,
        #[arg(long)]
        field: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
        /// Also prints the analytics summary of the returned list.
        #[arg(long)]
        summary: bool,
    },
    Ask {
        question: String,
    },
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommand,
    },
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AnalyticsCommand {
    Performance,
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    Clear {
        #[arg(long, value_enum)]
        endpoint: Option<EndpointArg>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EndpointArg {
    Summary,
    Recommendations,
    Compare,
    Performance,
}

impl From<EndpointArg> for AnalyticsEndpoint {
    fn from(value: EndpointArg) -> Self {
        match value {
            EndpointArg::Summary => Self::Summary,
            EndpointArg::Recommendations => Self::Recommendations,
            EndpointArg::Compare => Self::Compare,
            EndpointArg::Performance => Self::Performance,
        }
    }
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    min_ranking: Option<u32>,
    #[arg(long)]
    max_ranking: Option<u32>,
    #[arg(long)]
    min_tuition: Option<f64>,
    #[arg(long)]
    max_tuition: Option<f64>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    program: Option<String>,
    #[arg(long)]
    scholarship_only: bool,
    #[arg(long)]
    min_chance: Option<f64>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        let defaults = FilterCriteria::default();
        FilterCriteria {
            min_ranking: self.min_ranking.unwrap_or(defaults.min_ranking),
            max_ranking: self.max_ranking.unwrap_or(defaults.max_ranking),
            min_tuition: self.min_tuition.unwrap_or(defaults.min_tuition),
            max_tuition: self.max_tuition.unwrap_or(defaults.max_tuition),
            country: self.country.clone(),
            program_type: self.program.clone(),
            scholarship_only: self.scholarship_only,
            min_admission_chance: self.min_chance.unwrap_or(defaults.min_admission_chance),
        }
    }
}

struct Services {
    transport: Arc<dyn AdvisorTransport>,
    analytics: AnalyticsClient,
    settings: Settings,
}

fn build_services(settings: Settings) -> Result<Services> {
    let transport: Arc<dyn AdvisorTransport> = Arc::new(
        HttpTransport::new(&settings.api_url, settings.request_timeout())
            .with_context(|| format!("invalid api url '{}'", settings.api_url))?,
    );

    let cache_path = settings
        .cache_path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("advisor-cache.json"));
    let store: Arc<dyn KeyValueStore> = Arc::new(
        JsonFileStore::open(&cache_path)
            .with_context(|| format!("failed to open cache '{}'", cache_path.display()))?,
    );
    let cache = ResultCache::new(store, Arc::new(SystemClock), ANALYTICS_NAMESPACE);
    let analytics = AnalyticsClient::new(Arc::clone(&transport), cache)
        .with_max_age(settings.cache_max_age_ms);

    Ok(Services {
        transport,
        analytics,
        settings,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    let services = build_services(settings)?;
    info!(api_url = %services.settings.api_url, "advisor: starting");

    match cli.command {
        Command::Submit {
            gpa,
            ielts,
            budget,
            preferred_country,
            field,
            filters,
            summary,
        } => {
            let mut raw = RawProfileInput::new(gpa, ielts, budget);
            raw.country = preferred_country;
            raw.field = field;

            let sequencer = RequestSequencer::new(
                Arc::clone(&services.transport),
                SequencerOptions {
                    timeout: services.settings.request_timeout(),
                },
            );
            let mut controller = ViewStateController::new(sequencer, services.analytics)
                .with_criteria(filters.criteria());
            let state = controller.submit(&raw).await;
            print!("{}", render::render_state(state));

            if summary {
                match controller.analytics_summary().await {
                    Ok(Some(value)) => println!("{}", serde_json::to_string_pretty(&value)?),
                    Ok(None) => println!("no recommendations to summarise"),
                    Err(failure) => println!("analytics unavailable: {}", failure.message),
                }
            }
        }
        Command::Ask { question } => {
            match assistant::ask(services.transport.as_ref(), &question).await {
                Ok(Some(answer)) => println!("{answer}"),
                Ok(None) => println!("nothing to ask"),
                Err(failure) => println!("request failed: {}", failure.message),
            }
        }
        Command::Analytics {
            command: AnalyticsCommand::Performance,
        } => {
            let value = services.analytics.performance().await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Cache {
            command: CacheCommand::Clear { endpoint },
        } => {
            services.analytics.clear(endpoint.map(AnalyticsEndpoint::from));
            println!("cleared cached analytics");
        }
    }

    Ok(())
}
