//! Ollama HTTP client.
//!
//! Covers the handful of endpoints the installer and chat surfaces need:
//! `/api/tags` for reachability and installed models, `/api/pull` for
//! downloads and `/api/generate` for streamed completions.

use std::collections::HashSet;
use std::io::{self, BufRead, BufReader, ErrorKind};
use std::sync::mpsc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::defaults::GenerationDefaults;
use crate::settings::{DEFAULT_TIMEOUT_SECS, normalize_host};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);
const PULL_TIMEOUT: Duration = Duration::from_secs(3600);

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A local runtime that can serve and download models.
pub trait ModelProvider {
    /// Human-readable name shown in the UI.
    fn name(&self) -> &str;

    /// Whether the service is reachable right now.
    fn is_available(&self) -> bool;

    /// Installed model tags, lowercased, plus their family stems
    /// (`llama3.1:8b` also inserts `llama3.1`).
    fn installed_models(&self) -> HashSet<String>;

    /// Start pulling a model. Returns immediately; progress arrives on the
    /// handle's channel.
    fn start_pull(&self, model_tag: &str) -> Result<PullHandle, OllamaError>;
}

/// Handle returned by `start_pull`.
pub struct PullHandle {
    pub model_tag: String,
    pub receiver: mpsc::Receiver<PullEvent>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullEvent {
    Progress {
        status: String,
        percent: Option<f64>,
    },
    Done,
    Error(String),
}

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("Ollama is not reachable at {0}; is `ollama serve` running?")]
    Unavailable(String),

    #[error("Ollama returned HTTP {status}")]
    Http { status: u16 },

    #[error("request to Ollama timed out")]
    Timeout,

    #[error("Ollama reported an error: {0}")]
    Api(String),

    #[error("transport error talking to Ollama: {0}")]
    Transport(String),
}

impl From<ureq::Error> for OllamaError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(status) => OllamaError::Http { status },
            ureq::Error::Timeout(_) => OllamaError::Timeout,
            ureq::Error::Io(io) if io.kind() == ErrorKind::TimedOut => OllamaError::Timeout,
            other => OllamaError::Transport(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagsModel>,
}

#[derive(Deserialize)]
struct TagsModel {
    /// e.g. "llama3.1:8b-instruct-q4_K_M"
    name: String,
}

#[derive(Deserialize)]
struct PullStreamLine {
    #[serde(default)]
    status: String,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f64,
    /// Ollama's name for the max-tokens limit.
    pub num_predict: u32,
}

impl From<GenerationDefaults> for GenerateOptions {
    fn from(d: GenerationDefaults) -> Self {
        Self {
            temperature: d.temperature,
            num_predict: d.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

impl GenerateRequest {
    pub fn new(model: &str, prompt: String, params: GenerationDefaults) -> Self {
        Self {
            model: model.to_string(),
            prompt,
            stream: true,
            options: params.into(),
        }
    }
}

/// One line of the `/api/generate` stream.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Parse a stream line; blank or malformed lines yield `None`.
pub fn parse_generate_line(line: &str) -> Option<GenerateChunk> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            debug!("skipping malformed generate line: {e}");
            None
        }
    }
}

/// Turn a pull stream line into a progress event. `None` for blank or
/// malformed lines.
fn parse_pull_line(line: &str) -> Option<PullEvent> {
    let parsed: PullStreamLine = serde_json::from_str(line.trim()).ok()?;
    if let Some(err) = parsed.error {
        return Some(PullEvent::Error(err));
    }
    if parsed.status == "success" {
        return Some(PullEvent::Done);
    }
    let percent = match (parsed.completed, parsed.total) {
        (Some(c), Some(t)) if t > 0 => Some(c as f64 / t as f64 * 100.0),
        _ => None,
    };
    Some(PullEvent::Progress {
        status: parsed.status,
        percent,
    })
}

fn installed_set<I: IntoIterator<Item = String>>(names: I) -> HashSet<String> {
    let mut set = HashSet::new();
    for name in names {
        let lower = name.to_lowercase();
        if let Some((family, _)) = lower.split_once(':') {
            set.insert(family.to_string());
        }
        set.insert(lower);
    }
    set
}

/// Whether `model` appears in an installed set. `latest` tags match the
/// bare family name too.
pub fn is_installed(model: &str, installed: &HashSet<String>) -> bool {
    let lower = model.trim().to_lowercase();
    installed.contains(&lower)
        || lower
            .strip_suffix(":latest")
            .is_some_and(|family| installed.contains(family))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    generate_timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, generate_timeout: Duration) -> Self {
        Self {
            base_url: normalize_host(base_url),
            generate_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full API URL for an endpoint path.
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn fetch_tags(&self, timeout: Duration) -> Result<TagsResponse, OllamaError> {
        let resp = ureq::get(&self.api_url("tags"))
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call()?;
        resp.into_body()
            .read_json::<TagsResponse>()
            .map_err(OllamaError::from)
    }

    /// Installed model names as reported, sorted. Empty when unreachable.
    pub fn list_models(&self) -> Vec<String> {
        match self.fetch_tags(TAGS_TIMEOUT) {
            Ok(tags) => {
                let mut names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
                names.sort();
                names
            }
            Err(e) => {
                warn!("could not list Ollama models: {e}");
                Vec::new()
            }
        }
    }

    /// Stream a completion. `on_chunk` sees each text fragment as it
    /// arrives and returns false to stop reading early; the text received
    /// so far is returned at the end.
    ///
    /// The timeout bounds connecting and the wait for the first response
    /// byte. Once tokens flow, a long generation runs to completion.
    pub fn generate<F>(&self, request: &GenerateRequest, mut on_chunk: F) -> Result<String, OllamaError>
    where
        F: FnMut(&str) -> bool,
    {
        debug!(
            model = %request.model,
            temperature = request.options.temperature,
            num_predict = request.options.num_predict,
            "sending generate request"
        );

        let resp = ureq::post(&self.api_url("generate"))
            .config()
            .timeout_connect(Some(self.generate_timeout))
            .timeout_recv_response(Some(self.generate_timeout))
            .build()
            .send_json(request)
            .map_err(|e| match e {
                ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
                    OllamaError::Unavailable(self.base_url.clone())
                }
                ureq::Error::Io(io) if io.kind() == ErrorKind::ConnectionRefused => {
                    OllamaError::Unavailable(self.base_url.clone())
                }
                other => other.into(),
            })?;

        let reader = BufReader::new(resp.into_body().into_reader());
        let mut full = String::new();
        for line in reader.lines() {
            let line = line.map_err(stream_error)?;
            let Some(chunk) = parse_generate_line(&line) else {
                continue;
            };
            if let Some(err) = chunk.error {
                return Err(OllamaError::Api(err));
            }
            if let Some(text) = chunk.response.as_deref().filter(|t| !t.is_empty()) {
                full.push_str(text);
                if !on_chunk(text) {
                    debug!("generate stream abandoned by caller");
                    break;
                }
            }
            if chunk.done {
                break;
            }
        }
        Ok(full)
    }
}

/// Body reads wrap ureq errors in `io::Error`; unwrap them so a stalled
/// stream reports `Timeout` rather than a transport failure.
fn stream_error(e: io::Error) -> OllamaError {
    ureq::Error::from(e).into()
}

impl ModelProvider for OllamaClient {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn is_available(&self) -> bool {
        self.fetch_tags(PROBE_TIMEOUT).is_ok()
    }

    fn installed_models(&self) -> HashSet<String> {
        installed_set(self.list_models())
    }

    fn start_pull(&self, model_tag: &str) -> Result<PullHandle, OllamaError> {
        let url = self.api_url("pull");
        let (tx, rx) = mpsc::channel();
        let body = serde_json::json!({
            "model": model_tag,
            "stream": true,
        });

        std::thread::spawn(move || {
            let resp = ureq::post(&url)
                .config()
                .timeout_global(Some(PULL_TIMEOUT))
                .build()
                .send_json(&body);

            let resp = match resp {
                Ok(resp) => resp,
                Err(e) => {
                    let _ = tx.send(PullEvent::Error(OllamaError::from(e).to_string()));
                    return;
                }
            };

            let reader = BufReader::new(resp.into_body().into_reader());
            for line in reader.lines() {
                let Ok(line) = line else { break };
                match parse_pull_line(&line) {
                    Some(event @ (PullEvent::Done | PullEvent::Error(_))) => {
                        let _ = tx.send(event);
                        return;
                    }
                    Some(progress) => {
                        let _ = tx.send(progress);
                    }
                    None => {}
                }
            }
            let _ = tx.send(PullEvent::Error(
                "pull ended without success (is the tag in the Ollama registry?)".to_string(),
            ));
        });

        Ok(PullHandle {
            model_tag: model_tag.to_string(),
            receiver: rx,
        })
    }
}
