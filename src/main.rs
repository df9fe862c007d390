//! Perfmatters config generator CLI - serve the API or collect from a site

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use perfmatters_gen::{
    ApiClient, AppState, CollectReport, GenerateRequest, OutputFormat, WpCli, collect_profile,
    output_report, server,
};

/// Rule-based Perfmatters configuration generator for WordPress sites
#[derive(Parser, Debug)]
#[command(name = "perfmatters-gen")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the config generator HTTP API
    Serve {
        /// Path to the JSON rule file
        #[arg(long, default_value = "config/rules.json")]
        rules: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
    /// Inspect a WordPress site via WP-CLI and fetch its config from the API
    Collect {
        /// Base URL of the generator API
        #[arg(long)]
        api_url: String,

        /// File to write the generated config to
        #[arg(short = 'o', long = "output", default_value = "perfmatters-config.json")]
        output: PathBuf,

        /// WordPress installation root (defaults to the current directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Ask the API to scan the site for ad providers
        #[arg(long)]
        analyze_domain: bool,

        /// Report format
        #[arg(short = 'f', long = "format", default_value = "human", value_enum)]
        format: OutputFormatArg,
    },
}

/// Output format argument
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormatArg {
    Human,
    Json,
    None,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::None => OutputFormat::None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.command);

    let result = match args.command {
        Command::Serve { rules, bind } => run_serve(rules, bind).await,
        Command::Collect {
            api_url,
            output,
            path,
            analyze_domain,
            format,
        } => run_collect(api_url, output, path, analyze_domain, format.into()).await,
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(command: &Command) {
    // Keep the collect report clean unless the user opts into more logging
    let default = match command {
        Command::Serve { .. } => "info",
        Command::Collect { .. } => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_serve(rules: PathBuf, bind: SocketAddr) -> perfmatters_gen::Result<()> {
    let state = AppState::new(rules).await?;
    server::serve(bind, state).await
}

async fn run_collect(
    api_url: String,
    output: PathBuf,
    path: Option<PathBuf>,
    analyze_domain: bool,
    format: OutputFormat,
) -> perfmatters_gen::Result<()> {
    let client = ApiClient::new(&api_url)?;

    // Fail fast before touching the site if the API is down
    client.health().await?;

    let inspector = match path {
        Some(root) => WpCli::with_root(root),
        None => WpCli::new(),
    };
    let profile = collect_profile(&inspector).await?;

    let request = GenerateRequest {
        plugins: profile.plugins.clone(),
        theme: profile.theme.clone(),
        domain: Some(profile.site_url.clone()),
        analyze_domain,
    };
    let response = client.generate(&request).await?;

    // Serialize fully before writing so a failure never leaves a partial file
    let config_json = serde_json::to_string_pretty(&response.config)?;
    tokio::fs::write(&output, config_json)
        .await
        .map_err(perfmatters_gen::Error::OutputFailed)?;

    let report = CollectReport {
        site_url: profile.site_url,
        theme: profile.theme,
        child_theme: profile.child_theme,
        plugins: profile.plugins,
        processing_info: response.processing_info,
        detected_ad_providers: response.detected_ad_providers,
        analysis_warning: response.analysis_warning,
        generated_at: response.generated_at,
        output_file: output.display().to_string(),
    };

    let stdout = std::io::stdout();
    let mut writer = stdout.lock();
    output_report(&report, format, &mut writer)?;

    Ok(())
}
