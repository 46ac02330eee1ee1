mod display;
mod logging;
mod tui_app;
mod tui_events;
mod tui_ui;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ollamate_core::catalog;
use ollamate_core::config::SystemConfig;
use ollamate_core::conversation::Conversation;
use ollamate_core::defaults::{self, GenerationDefaults};
use ollamate_core::hardware::{self, HardwareProfile, SystemSpecs};
use ollamate_core::ollama::{GenerateRequest, ModelProvider, OllamaClient, PullEvent};
use ollamate_core::recommend::{self, Recommendation};
use ollamate_core::resources::ResourceSnapshot;
use ollamate_core::settings::Settings;
use tracing::{debug, info, warn};

use crate::logging::LogOptions;

#[derive(Parser)]
#[command(name = "ollamate")]
#[command(about = "Pick, configure and chat with the Ollama model your hardware can run", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output results as JSON (for scripts)
    #[arg(long, global = true)]
    json: bool,

    /// Override GPU VRAM size (e.g. "8G", "8192M").
    /// Useful when GPU memory autodetection fails.
    #[arg(long, value_name = "SIZE", global = true)]
    memory: Option<String>,

    /// Path of the saved configuration (default: OLLAMATE_CONFIG or ./system_config.json)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Ollama base URL (default: OLLAMA_HOST or http://localhost:11434)
    #[arg(long, value_name = "URL", global = true)]
    host: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show system hardware and the derived profile
    System,

    /// Recommend models for this machine (or for given RAM/VRAM)
    Recommend {
        /// Pretend the machine has this much RAM (GB)
        #[arg(long, value_name = "GB")]
        ram: Option<u64>,

        /// Pretend the GPU has this much VRAM (GB)
        #[arg(long, value_name = "GB")]
        vram: Option<u64>,
    },

    /// List catalog models, optionally filtered by search terms
    Catalog {
        /// Terms that must all match the tag, name, size tier or tags
        query: Vec<String>,
    },

    /// Show generation defaults for a model tag
    Defaults {
        /// Model tag, e.g. "llama3.1:8b"
        model: String,
    },

    /// Detect hardware, pick a model and save the configuration
    Init {
        /// Use this model instead of asking
        #[arg(long, conflicts_with = "choice")]
        model: Option<String>,

        /// Pick the Nth recommendation (1-based)
        #[arg(long, value_name = "N")]
        choice: Option<usize>,

        /// Pull the chosen model through Ollama afterwards
        #[arg(long)]
        pull: bool,
    },

    /// Show the saved configuration
    Config,

    /// Check whether Ollama is running and list installed models
    Status,

    /// Download a model through Ollama
    Pull {
        /// Model tag, e.g. "mistral:7b"
        model: String,
    },

    /// Show current CPU, memory and GPU usage
    Resources,

    /// Send a single prompt and stream the answer
    Ask {
        /// Prompt text
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,

        /// Model to use instead of the saved one
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        temperature: Option<f64>,

        #[arg(long, value_name = "N")]
        max_tokens: Option<u32>,
    },

    /// Chat on the terminal (/clear, /model ID, /quit)
    Chat {
        /// Model to use instead of the saved one
        #[arg(long)]
        model: Option<String>,
    },
}

/// Detect system specs with optional GPU memory override.
fn detect_specs(memory_override: Option<&str>) -> SystemSpecs {
    let specs = SystemSpecs::detect();
    let Some(mem_str) = memory_override else {
        return specs;
    };
    match hardware::parse_memory_size(mem_str) {
        Some(gb) => specs.with_gpu_memory_override(gb),
        None => {
            warn!("could not parse --memory value '{mem_str}'. Expected format: 8G, 8192M, 1.5T");
            specs
        }
    }
}

fn build_settings(cli: &Cli) -> Settings {
    let mut settings = Settings::from_env();
    if let Some(host) = &cli.host {
        settings.ollama_host = host.clone();
    }
    if let Some(path) = &cli.config {
        settings.config_path = path.clone();
    }
    settings
}

fn client(settings: &Settings) -> OllamaClient {
    OllamaClient::with_timeout(&settings.ollama_host, settings.request_timeout)
}

fn run_system(cli: &Cli) {
    let specs = detect_specs(cli.memory.as_deref());
    let profile = HardwareProfile::from_specs(&specs);
    let tier = recommend::recommend(&profile).tier;
    if cli.json {
        display::display_json_system(&specs, &profile, tier.label());
    } else {
        display::display_system(&specs, &profile, tier.label());
    }
}

fn run_recommend(cli: &Cli, settings: &Settings, ram: Option<u64>, vram: Option<u64>) {
    let detected = HardwareProfile::from_specs(&detect_specs(cli.memory.as_deref()));
    let profile = HardwareProfile::new(
        ram.unwrap_or(detected.ram_gb),
        detected.cpu_cores,
        vram.unwrap_or(detected.gpu_vram_gb),
        detected.gpu_kind,
    );
    let rec = recommend::recommend(&profile);

    if cli.json {
        display::display_json_recommendation(&profile, &rec);
        return;
    }
    let client = client(settings);
    let installed = client.is_available().then(|| client.installed_models());
    display::display_recommendation(&profile, &rec, installed.as_ref());
}

fn run_catalog(cli: &Cli, settings: &Settings, query: &str) {
    let entries = catalog::search(query);
    if cli.json {
        display::display_json_catalog(&entries);
        return;
    }
    if entries.is_empty() {
        println!("No catalog models match '{query}'.");
        return;
    }
    let client = client(settings);
    let installed = client.is_available().then(|| client.installed_models());
    display::display_catalog(&entries, installed.as_ref());
}

fn run_defaults(cli: &Cli, model: &str) {
    let params = defaults::defaults_for(model);
    if cli.json {
        display::display_json_defaults(model, params);
    } else {
        display::display_defaults(model, &defaults::size_class(model), params);
    }
}

/// Ask on the terminal for a 1-based pick; Enter takes the first.
fn prompt_choice(rec: &Recommendation) -> Result<usize> {
    let count = rec.models.len();
    let stdin = io::stdin();
    loop {
        print!("Select a model [1-{count}] (Enter for 1): ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(1);
        }
        let line = line.trim();
        if line.is_empty() {
            return Ok(1);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => return Ok(n),
            _ => println!("Please enter a number between 1 and {count}."),
        }
    }
}

fn run_init(
    cli: &Cli,
    settings: &Settings,
    model: Option<&str>,
    choice: Option<usize>,
    pull: bool,
) -> Result<()> {
    let profile = HardwareProfile::from_specs(&detect_specs(cli.memory.as_deref()));
    let rec = recommend::recommend(&profile);

    let model = match (model, choice) {
        (Some(model), _) => {
            if catalog::find(model).is_none() {
                warn!("'{model}' is not in the catalog; using size-based defaults");
            }
            model.trim().to_string()
        }
        (None, Some(n)) => rec
            .choice(n)
            .map(|m| m.entry.identifier.to_string())
            .with_context(|| {
                format!(
                    "choice {n} is out of range; the {} tier has {} picks",
                    rec.tier,
                    rec.models.len()
                )
            })?,
        (None, None) if !cli.json && io::stdin().is_terminal() => {
            display::display_recommendation(&profile, &rec, None);
            let n = prompt_choice(&rec)?;
            rec.models[n - 1].entry.identifier.to_string()
        }
        (None, None) => rec
            .top_pick()
            .map(|m| m.entry.identifier.to_string())
            .context("no recommendation for this hardware")?,
    };

    let config = SystemConfig::from_selection(profile, &model);
    config
        .save(&settings.config_path)
        .with_context(|| format!("could not save {}", settings.config_path.display()))?;

    if cli.json {
        display::display_json_config(&config);
    } else {
        display::display_config(&settings.config_path, &config, true);
    }

    if pull {
        run_pull(settings, &model)?;
    }
    Ok(())
}

fn load_config(settings: &Settings) -> Result<SystemConfig> {
    SystemConfig::load_or_default(&settings.config_path)
        .with_context(|| format!("could not load {}", settings.config_path.display()))
}

fn run_config(cli: &Cli, settings: &Settings) -> Result<()> {
    let config = load_config(settings)?;
    if cli.json {
        display::display_json_config(&config);
    } else {
        let exists = settings.config_path.exists();
        display::display_config(&settings.config_path, &config, exists);
    }
    Ok(())
}

fn run_status(cli: &Cli, settings: &Settings) {
    let client = client(settings);
    let available = client.is_available();
    let models = if available {
        client.list_models()
    } else {
        Vec::new()
    };
    if cli.json {
        display::display_json_status(client.base_url(), available, &models);
    } else {
        display::display_status(client.base_url(), available, &models);
    }
}

fn run_pull(settings: &Settings, model: &str) -> Result<()> {
    let client = client(settings);
    if !client.is_available() {
        bail!(
            "Ollama is not reachable at {}; start it with `ollama serve`",
            client.base_url()
        );
    }

    let handle = client.start_pull(model)?;
    info!(model, "pulling model");
    let mut last_status = String::new();
    for event in handle.receiver.iter() {
        match event {
            PullEvent::Progress { status, percent } => match percent {
                Some(pct) => eprint!("\r{status} {pct:>3.0}%   "),
                None if status != last_status => {
                    eprint!("\r{status}{:width$}", "", width = 12);
                    last_status = status;
                }
                None => {}
            },
            PullEvent::Done => {
                eprintln!("\rDownloaded {model}{:width$}", "", width = 24);
                return Ok(());
            }
            PullEvent::Error(e) => {
                eprintln!();
                bail!("pull of {model} failed: {e}");
            }
        }
    }
    eprintln!();
    bail!("pull of {model} ended unexpectedly")
}

fn run_resources(cli: &Cli) {
    let specs = detect_specs(cli.memory.as_deref());
    let snapshot = ResourceSnapshot::sample(&specs);
    if cli.json {
        display::display_json_resources(&snapshot);
    } else {
        display::display_resources(&snapshot);
    }
}

/// Saved model and parameters, or the defaults of an explicitly chosen
/// model when it differs from the saved one.
fn resolve_generation(config: &SystemConfig, model: Option<&str>) -> (String, GenerationDefaults) {
    let saved = &config.recommended_settings;
    match model.map(str::trim) {
        Some(model) if model != saved.model => (model.to_string(), defaults::defaults_for(model)),
        _ => (saved.model.clone(), saved.generation_defaults()),
    }
}

/// Streamed text goes here; the first write failure is kept and ends
/// the stream.
struct ChunkSink<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ChunkSink<W> {
    fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn write(&mut self, chunk: &str) -> bool {
        match write!(self.out, "{chunk}").and_then(|_| self.out.flush()) {
            Ok(()) => true,
            Err(e) => {
                self.error = Some(e);
                false
            }
        }
    }
}

fn stream_to_stdout(client: &OllamaClient, request: &GenerateRequest) -> Result<String> {
    let mut sink = ChunkSink::new(io::stdout());
    let reply = client.generate(request, |chunk| sink.write(chunk))?;
    match sink.error {
        // Reader went away (`| head`); nothing left to show.
        Some(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(reply),
        Some(e) => Err(e).context("could not write the reply to stdout"),
        None => {
            println!();
            Ok(reply)
        }
    }
}

/// `/model` with an optional id. `None` when the line is some other input.
fn model_command(line: &str) -> Option<Option<&str>> {
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    if command != "/model" {
        return None;
    }
    let rest = rest.trim();
    Some((!rest.is_empty()).then_some(rest))
}

fn run_ask(
    settings: &Settings,
    prompt: &[String],
    model: Option<&str>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
) -> Result<()> {
    let config = load_config(settings)?;
    let (model, mut params) = resolve_generation(&config, model);
    if let Some(t) = temperature {
        params.temperature = t;
    }
    if let Some(n) = max_tokens {
        params.max_tokens = n;
    }

    let message = prompt.join(" ");
    let request = GenerateRequest::new(&model, Conversation::new().prompt_for(&message), params);
    stream_to_stdout(&client(settings), &request)
        .with_context(|| format!("generation with {model} failed"))?;
    Ok(())
}

fn run_chat(settings: &Settings, model: Option<&str>) -> Result<()> {
    let config = load_config(settings)?;
    let (mut model, mut params) = resolve_generation(&config, model);
    let client = client(settings);
    let mut conversation = Conversation::new();

    println!(
        "Chatting with {model} via {}. /clear resets, /model ID switches, /quit exits.",
        client.base_url()
    );

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => return Ok(()),
            "/clear" => {
                conversation.clear();
                println!("Conversation cleared.");
                continue;
            }
            _ => {}
        }
        if let Some(next) = model_command(line) {
            if let Some(next) = next {
                model = next.to_string();
                params = defaults::defaults_for(&model);
                debug!(model = %model, ?params, "switched model");
                println!(
                    "Switched to {model} (max tokens {}, temperature {:.1}).",
                    params.max_tokens, params.temperature
                );
            } else {
                println!("Current model: {model}");
            }
            continue;
        }

        let request = GenerateRequest::new(&model, conversation.prompt_for(line), params);
        match stream_to_stdout(&client, &request) {
            Ok(reply) => conversation.record(line, reply.trim()),
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }
}

fn run_tui(cli: &Cli, settings: &Settings) -> io::Result<()> {
    let specs = detect_specs(cli.memory.as_deref());
    let provider = Box::new(client(settings));

    // Setup terminal
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;

    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = tui_app::App::new(specs, provider, settings.config_path.clone());

    // Main loop
    let result = loop {
        if let Err(e) = terminal.draw(|frame| tui_ui::draw(frame, &mut app)) {
            break Err(e);
        }
        if let Err(e) = tui_events::handle_events(&mut app) {
            break Err(e);
        }
        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = build_settings(&cli);
    logging::init_logging(
        &LogOptions {
            log_level: cli.log_level.clone(),
            verbose: cli.verbose,
            quiet: cli.quiet,
        },
        &settings.log_level,
        cli.command.is_none(),
    );
    debug!(?settings, "starting ollamate v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = &cli.command else {
        return run_tui(&cli, &settings).context("error running the interactive selector");
    };

    match command {
        Commands::System => run_system(&cli),
        Commands::Recommend { ram, vram } => run_recommend(&cli, &settings, *ram, *vram),
        Commands::Catalog { query } => run_catalog(&cli, &settings, &query.join(" ")),
        Commands::Defaults { model } => run_defaults(&cli, model),
        Commands::Init {
            model,
            choice,
            pull,
        } => run_init(&cli, &settings, model.as_deref(), *choice, *pull)?,
        Commands::Config => run_config(&cli, &settings)?,
        Commands::Status => run_status(&cli, &settings),
        Commands::Pull { model } => run_pull(&settings, model)?,
        Commands::Resources => run_resources(&cli),
        Commands::Ask {
            prompt,
            model,
            temperature,
            max_tokens,
        } => run_ask(
            &settings,
            prompt,
            model.as_deref(),
            *temperature,
            *max_tokens,
        )?,
        Commands::Chat { model } => run_chat(&settings, model.as_deref())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ollamate_core::config::RecommendedSettings;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ollamate",
            "recommend",
            "--ram",
            "16",
            "--json",
            "--host",
            "gpu-box:11434",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.host.as_deref(), Some("gpu-box:11434"));
        assert!(matches!(
            cli.command,
            Some(Commands::Recommend {
                ram: Some(16),
                vram: None
            })
        ));
    }

    #[test]
    fn test_init_model_conflicts_with_choice() {
        let parsed =
            Cli::try_parse_from(["ollamate", "init", "--model", "phi3:mini", "--choice", "2"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["ollamate", "ask"]).is_err());
        let cli = Cli::try_parse_from(["ollamate", "ask", "why", "is", "the", "sky", "blue"])
            .unwrap();
        match cli.command {
            Some(Commands::Ask { prompt, .. }) => assert_eq!(prompt.join(" "), "why is the sky blue"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_catalog_query_is_optional() {
        let cli = Cli::try_parse_from(["ollamate", "catalog"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Catalog { query }) if query.is_empty()));

        let cli = Cli::try_parse_from(["ollamate", "catalog", "code", "llama"]).unwrap();
        match cli.command {
            Some(Commands::Catalog { query }) => assert_eq!(query, vec!["code", "llama"]),
            _ => panic!("expected catalog"),
        }
    }

    #[test]
    fn test_resolve_generation_prefers_saved_settings() {
        let config = SystemConfig {
            system_analysis: HardwareProfile::default(),
            recommended_settings: RecommendedSettings {
                model: "mistral:7b".to_string(),
                max_tokens: 1000,
                temperature: 0.5,
            },
        };
        let (model, params) = resolve_generation(&config, None);
        assert_eq!(model, "mistral:7b");
        assert_eq!(params.max_tokens, 1000);

        let (model, params) = resolve_generation(&config, Some("mistral:7b"));
        assert_eq!(model, "mistral:7b");
        assert_eq!(params.temperature, 0.5);

        let (model, params) = resolve_generation(&config, Some("qwen2.5:14b"));
        assert_eq!(model, "qwen2.5:14b");
        assert_eq!(params.max_tokens, 4096);
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::try_parse_from([
            "ollamate",
            "--config",
            "/tmp/ollamate-test.json",
            "--host",
            "http://10.0.0.2:11434",
            "status",
        ])
        .unwrap();
        let settings = build_settings(&cli);
        assert_eq!(settings.config_path, PathBuf::from("/tmp/ollamate-test.json"));
        assert_eq!(settings.ollama_host, "http://10.0.0.2:11434");
    }

    #[test]
    fn test_model_command_matches_whole_word() {
        assert_eq!(model_command("/model"), Some(None));
        assert_eq!(model_command("/model   "), Some(None));
        assert_eq!(model_command("/model mistral:7b"), Some(Some("mistral:7b")));
        assert_eq!(model_command("/models"), None);
        assert_eq!(model_command("/modelfoo bar"), None);
        assert_eq!(model_command("tell me about /model"), None);
    }

    struct ClosedPipe {
        writes: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_chunk_sink_stops_on_write_failure() {
        let mut sink = ChunkSink::new(Vec::new());
        assert!(sink.write("Hel"));
        assert!(sink.write("lo"));
        assert_eq!(sink.out, b"Hello");
        assert!(sink.error.is_none());

        let mut closed = ChunkSink::new(ClosedPipe { writes: 0 });
        assert!(!closed.write("Hel"));
        assert_eq!(closed.out.writes, 1);
        assert_eq!(
            closed.error.map(|e| e.kind()),
            Some(io::ErrorKind::BrokenPipe)
        );
    }
}
