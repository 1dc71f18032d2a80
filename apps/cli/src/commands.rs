//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use clarifymd_core::{MedicalAnalysis, Narrator, Orchestrator, gather_text};
use clarifymd_gateway::GeminiGateway;
use clarifymd_shared::{
    AnalysisRequest, AppConfig, GatewaySettings, OutputFormat, PipelineRunState, RunPhase,
    init_config, load_config,
};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapters::{CommandNarrator, FileTextExtractor};
use crate::render;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ClarifyMD — plain-language explanations for medical reports.
#[derive(Parser)]
#[command(
    name = "clarifymd",
    version,
    about = "Identify medical terms in a report and explain them in plain language.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Result output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Analyze a medical text and explain its terms.
    Analyze {
        /// Text to analyze.
        text: Option<String>,

        /// Read additional text from a file (text or PDF). Repeatable.
        #[arg(short, long = "file")]
        files: Vec<PathBuf>,

        /// Read additional text from standard input.
        #[arg(long)]
        stdin: bool,

        /// Output format (defaults to the configured one).
        #[arg(long)]
        format: Option<FormatArg>,

        /// Read the explanations aloud when done.
        #[arg(long)]
        speak: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "clarifymd=info",
        1 => "clarifymd=debug",
        _ => "clarifymd=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            text,
            files,
            stdin,
            format,
            speak,
        } => cmd_analyze(text.as_deref(), &files, stdin, format, speak).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_analyze(
    text: Option<&str>,
    files: &[PathBuf],
    stdin: bool,
    format: Option<FormatArg>,
    speak: bool,
) -> Result<()> {
    let config = load_config()?;
    let format = format.map(OutputFormat::from).unwrap_or(config.output.format);
    let speak = speak || config.output.speak;

    let mut parts = gather_text(&FileTextExtractor, text, files.iter().map(PathBuf::as_path));
    if stdin {
        let mut piped = String::new();
        std::io::stdin()
            .read_to_string(&mut piped)
            .map_err(|e| eyre!("failed to read standard input: {e}"))?;
        parts.push(piped);
    }

    let mut request = AnalysisRequest::compose(parts);
    if request.is_blank() {
        return Err(eyre!(
            "nothing to analyze: pass TEXT, --file, or --stdin with a medical report"
        ));
    }
    if let [only] = files {
        request = request.with_preview(only.display().to_string());
    }

    let gateway = GeminiGateway::new(GatewaySettings::from_env(&config))?;
    let orchestrator = Orchestrator::spawn(MedicalAnalysis::new(Arc::new(gateway)));

    let progress = CliProgress::new();
    let observer = tokio::spawn(progress.follow(orchestrator.subscribe()));

    let run_id = orchestrator.submit(request).await?;
    info!(%run_id, "analysis submitted");
    let state = orchestrator.wait_settled(run_id).await?;
    observer.await?;

    match format {
        OutputFormat::Text => print!("{}", render::render_text(&state)),
        OutputFormat::Json => println!("{}", render::render_json(&state)?),
    }

    if render::is_fatal(&state) {
        let message = state.error_message.unwrap_or_default();
        return Err(eyre!(message));
    }

    if speak {
        speak_results(&state).await?;
    }

    Ok(())
}

async fn speak_results(state: &PipelineRunState) -> Result<()> {
    let lines = render::narration(state);
    if lines.is_empty() {
        warn!("nothing to read aloud");
        return Ok(());
    }

    tokio::task::spawn_blocking(move || {
        let narrator = CommandNarrator::system();
        lines.iter().try_for_each(|line| narrator.narrate(line))
    })
    .await??;
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner that mirrors the orchestrator's published state.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    /// Update the spinner on every state change until the run settles.
    async fn follow(self, mut state: watch::Receiver<PipelineRunState>) {
        loop {
            let settled = {
                let current = state.borrow_and_update();
                self.spinner.set_message(render::progress_message(&current));
                current.phase == RunPhase::Settled
            };
            if settled || state.changed().await.is_err() {
                break;
            }
        }
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");

    for name in [&config.gemini.base_url_env, &config.gemini.api_key_env] {
        let state = match std::env::var(name) {
            Ok(value) if !value.is_empty() => "set",
            _ => "not set",
        };
        println!("# {name}: {state}");
    }
    Ok(())
}
