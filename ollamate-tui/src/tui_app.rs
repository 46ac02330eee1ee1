use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc;

use ollamate_core::catalog::{self, ModelCatalogEntry};
use ollamate_core::config::SystemConfig;
use ollamate_core::defaults::{self, GenerationDefaults};
use ollamate_core::hardware::{HardwareProfile, SystemSpecs};
use ollamate_core::ollama::{ModelProvider, PullEvent, PullHandle, is_installed};
use ollamate_core::recommend::{self, Recommendation, Standing};

const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFilter {
    Recommended,
    All,
}

impl ViewFilter {
    pub fn label(&self) -> &str {
        match self {
            ViewFilter::Recommended => "Recommended",
            ViewFilter::All => "All models",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ViewFilter::Recommended => ViewFilter::All,
            ViewFilter::All => ViewFilter::Recommended,
        }
    }
}

/// One selectable catalog entry.
#[derive(Debug, Clone)]
pub struct ModelRow {
    pub entry: &'static ModelCatalogEntry,
    /// `None` for models outside the current tier's picks.
    pub standing: Option<Standing>,
    pub defaults: GenerationDefaults,
    pub installed: bool,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub search_query: String,

    // Data
    pub specs: SystemSpecs,
    pub profile: HardwareProfile,
    pub recommendation: Recommendation,
    pub rows: Vec<ModelRow>,
    pub filtered_rows: Vec<usize>, // indices into rows

    pub view_filter: ViewFilter,
    pub selected_row: usize,
    pub show_detail: bool,

    // Persisted selection
    config_path: PathBuf,
    pub saved_model: Option<String>,
    pub message: Option<String>,

    // Provider state
    pub ollama_available: bool,
    pub installed: HashSet<String>,
    provider: Box<dyn ModelProvider>,

    // Download state
    pub pull_active: Option<PullHandle>,
    pub pull_status: Option<String>,
    pub pull_percent: Option<f64>,
    pub pull_model_name: Option<String>,
    /// Animation frame counter, incremented every tick while pulling.
    pub tick_count: u64,
    /// When true, the next 'd' press will confirm and start the download.
    pub confirm_download: bool,
}

impl App {
    pub fn new(specs: SystemSpecs, provider: Box<dyn ModelProvider>, config_path: PathBuf) -> Self {
        let profile = HardwareProfile::from_specs(&specs);
        let recommendation = recommend::recommend(&profile);

        let ollama_available = provider.is_available();
        let installed = if ollama_available {
            provider.installed_models()
        } else {
            HashSet::new()
        };

        // Tier picks first, in rule order, then the rest of the catalog.
        let mut rows: Vec<ModelRow> = recommendation
            .models
            .iter()
            .map(|m| ModelRow {
                entry: m.entry,
                standing: Some(m.standing),
                defaults: m.defaults,
                installed: is_installed(m.entry.identifier, &installed),
            })
            .collect();
        rows.extend(
            catalog::CATALOG
                .iter()
                .filter(|e| recommendation.standing_of(e.identifier).is_none())
                .map(|entry| ModelRow {
                    entry,
                    standing: None,
                    defaults: defaults::defaults_for(entry.identifier),
                    installed: is_installed(entry.identifier, &installed),
                }),
        );

        let saved_model = SystemConfig::load(&config_path)
            .ok()
            .map(|c| c.recommended_settings.model);

        let mut app = App {
            should_quit: false,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            specs,
            profile,
            recommendation,
            rows,
            filtered_rows: Vec::new(),
            view_filter: ViewFilter::Recommended,
            selected_row: 0,
            show_detail: false,
            config_path,
            saved_model,
            message: None,
            ollama_available,
            installed,
            provider,
            pull_active: None,
            pull_status: None,
            pull_percent: None,
            pull_model_name: None,
            tick_count: 0,
            confirm_download: false,
        };

        app.apply_filters();
        app
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn apply_filters(&mut self) {
        self.filtered_rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let matches_filter = match self.view_filter {
                    ViewFilter::Recommended => row.standing.is_some(),
                    ViewFilter::All => true,
                };

                matches_filter && row.entry.matches(&self.search_query)
            })
            .map(|(i, _)| i)
            .collect();

        // Clamp selection
        if self.filtered_rows.is_empty() {
            self.selected_row = 0;
        } else if self.selected_row >= self.filtered_rows.len() {
            self.selected_row = self.filtered_rows.len() - 1;
        }
    }

    pub fn selected(&self) -> Option<&ModelRow> {
        self.filtered_rows
            .get(self.selected_row)
            .map(|&idx| &self.rows[idx])
    }

    pub fn move_up(&mut self) {
        self.confirm_download = false;
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.confirm_download = false;
        if self.selected_row + 1 < self.filtered_rows.len() {
            self.selected_row += 1;
        }
    }

    pub fn page_up(&mut self) {
        self.confirm_download = false;
        self.selected_row = self.selected_row.saturating_sub(PAGE_SIZE);
    }

    pub fn page_down(&mut self) {
        self.confirm_download = false;
        if !self.filtered_rows.is_empty() {
            self.selected_row = (self.selected_row + PAGE_SIZE).min(self.filtered_rows.len() - 1);
        }
    }

    pub fn home(&mut self) {
        self.confirm_download = false;
        self.selected_row = 0;
    }

    pub fn end(&mut self) {
        self.confirm_download = false;
        self.selected_row = self.filtered_rows.len().saturating_sub(1);
    }

    pub fn toggle_filter(&mut self) {
        self.view_filter = self.view_filter.toggle();
        self.apply_filters();
    }

    pub fn enter_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    pub fn exit_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn search_input(&mut self, c: char) {
        self.search_query.push(c);
        self.selected_row = 0;
        self.apply_filters();
    }

    pub fn search_backspace(&mut self) {
        if self.search_query.pop().is_some() {
            self.selected_row = 0;
            self.apply_filters();
        }
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.selected_row = 0;
        self.apply_filters();
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    /// Persist the highlighted model together with the detected profile.
    pub fn save_selection(&mut self) {
        let Some(row) = self.selected() else {
            return;
        };
        let model = row.entry.identifier;
        let config = SystemConfig::from_selection(self.profile, model);
        match config.save(&self.config_path) {
            Ok(()) => {
                self.saved_model = Some(model.to_string());
                self.message = Some(format!(
                    "Saved {} to {}",
                    model,
                    self.config_path.display()
                ));
            }
            Err(e) => self.message = Some(format!("Error: {}", e)),
        }
    }

    /// First press asks for confirmation; the second starts the pull.
    pub fn start_download(&mut self) {
        if self.pull_active.is_some() {
            return;
        }
        let Some(row) = self.selected() else {
            return;
        };
        let (installed, model, size_gb) = (row.installed, row.entry.identifier, row.entry.size_gb);
        if installed {
            self.confirm_download = false;
            self.pull_status = Some(format!("{} is already installed", model));
            return;
        }

        if !self.confirm_download {
            self.confirm_download = true;
            self.pull_status = Some(format!(
                "Download {} ({:.1} GB)? Press d again to confirm",
                model, size_gb
            ));
            return;
        }
        self.confirm_download = false;

        match self.provider.start_pull(model) {
            Ok(handle) => {
                self.pull_model_name = Some(model.to_string());
                self.pull_status = Some(format!("Pulling {}...", model));
                self.pull_percent = Some(0.0);
                self.pull_active = Some(handle);
            }
            Err(e) => {
                self.pull_status = Some(format!("Error: {}", e));
                self.pull_percent = None;
            }
        }
    }

    pub fn tick_pull(&mut self) {
        if self.pull_active.is_some() {
            self.tick_count = self.tick_count.wrapping_add(1);
        }
        let Some(handle) = &self.pull_active else {
            return;
        };
        // Drain all available events
        loop {
            match handle.receiver.try_recv() {
                Ok(PullEvent::Progress { status, percent }) => {
                    if let Some(p) = percent {
                        self.pull_percent = Some(p);
                    }
                    self.pull_status = Some(status);
                }
                Ok(PullEvent::Done) => {
                    self.pull_status = Some(format!("Downloaded {}", handle.model_tag));
                    self.finish_pull();
                    self.refresh_installed();
                    return;
                }
                Ok(PullEvent::Error(e)) => {
                    self.pull_status = Some(format!("Error: {}", e));
                    self.finish_pull();
                    return;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.pull_status = Some("Pull ended".to_string());
                    self.finish_pull();
                    self.refresh_installed();
                    return;
                }
            }
        }
    }

    fn finish_pull(&mut self) {
        self.pull_percent = None;
        self.pull_active = None;
    }

    pub fn refresh_installed(&mut self) {
        self.ollama_available = self.provider.is_available();
        self.installed = if self.ollama_available {
            self.provider.installed_models()
        } else {
            HashSet::new()
        };
        for row in &mut self.rows {
            row.installed = is_installed(row.entry.identifier, &self.installed);
        }
    }

    /// Distinct installed tags (the set also carries family stems).
    pub fn installed_count(&self) -> usize {
        self.installed.iter().filter(|name| name.contains(':')).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ollamate_core::ollama::OllamaError;
    use ollamate_core::recommend::HardwareTier;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeProvider {
        available: bool,
        installed: Rc<RefCell<HashSet<String>>>,
        pull_events: Vec<PullEvent>,
    }

    impl ModelProvider for FakeProvider {
        fn name(&self) -> &str {
            "Fake"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn installed_models(&self) -> HashSet<String> {
            self.installed.borrow().clone()
        }

        fn start_pull(&self, model_tag: &str) -> Result<PullHandle, OllamaError> {
            if !self.available {
                return Err(OllamaError::Unavailable("fake".to_string()));
            }
            let (tx, rx) = mpsc::channel();
            for event in &self.pull_events {
                tx.send(event.clone()).unwrap();
            }
            if self.pull_events.contains(&PullEvent::Done) {
                self.installed.borrow_mut().insert(model_tag.to_string());
            }
            Ok(PullHandle {
                model_tag: model_tag.to_string(),
                receiver: rx,
            })
        }
    }

    fn specs(ram_gb: f64) -> SystemSpecs {
        SystemSpecs::assemble(ram_gb, ram_gb / 2.0, 8, "Test CPU".to_string(), vec![])
    }

    fn app_with(
        ram_gb: f64,
        available: bool,
        installed: &[&str],
        pull_events: Vec<PullEvent>,
    ) -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let provider = FakeProvider {
            available,
            installed: Rc::new(RefCell::new(
                installed.iter().map(|s| s.to_string()).collect(),
            )),
            pull_events,
        };
        let app = App::new(
            specs(ram_gb),
            Box::new(provider),
            dir.path().join("system_config.json"),
        );
        (app, dir)
    }

    fn selected_id(app: &App) -> &'static str {
        app.selected().unwrap().entry.identifier
    }

    #[test]
    fn test_rows_list_picks_first() {
        let (app, _dir) = app_with(16.0, false, &[], vec![]);
        assert_eq!(app.recommendation.tier, HardwareTier::MidRange);
        assert_eq!(app.rows.len(), catalog::CATALOG.len());
        assert_eq!(app.filtered_rows.len(), app.recommendation.models.len());
        assert_eq!(selected_id(&app), "llama3.1:8b");
        let picks = app.recommendation.models.len();
        assert!(app.rows[..picks].iter().all(|r| r.standing.is_some()));
        assert!(app.rows[picks..].iter().all(|r| r.standing.is_none()));
    }

    #[test]
    fn test_toggle_filter_shows_all() {
        let (mut app, _dir) = app_with(4.0, false, &[], vec![]);
        assert_eq!(app.recommendation.tier, HardwareTier::Basic);
        assert_eq!(app.filtered_rows.len(), 2);
        app.toggle_filter();
        assert_eq!(app.view_filter, ViewFilter::All);
        assert_eq!(app.filtered_rows.len(), catalog::CATALOG.len());
    }

    #[test]
    fn test_navigation_is_clamped() {
        let (mut app, _dir) = app_with(16.0, false, &[], vec![]);
        app.move_up();
        assert_eq!(app.selected_row, 0);
        app.end();
        assert_eq!(app.selected_row, app.filtered_rows.len() - 1);
        app.move_down();
        assert_eq!(app.selected_row, app.filtered_rows.len() - 1);
        app.page_up();
        assert_eq!(app.selected_row, 0);
        app.page_down();
        assert_eq!(app.selected_row, app.filtered_rows.len() - 1);
        app.home();
        assert_eq!(app.selected_row, 0);
    }

    #[test]
    fn test_search_filters_and_clamps() {
        let (mut app, _dir) = app_with(16.0, false, &[], vec![]);
        app.toggle_filter();
        app.end();
        for c in "code llama".chars() {
            app.search_input(c);
        }
        assert_eq!(app.filtered_rows.len(), 1);
        assert_eq!(selected_id(&app), "codellama:7b");

        app.clear_search();
        for c in "zzz".chars() {
            app.search_input(c);
        }
        assert!(app.selected().is_none());
        assert_eq!(app.selected_row, 0);
    }

    #[test]
    fn test_save_selection_writes_config() {
        let (mut app, dir) = app_with(16.0, false, &[], vec![]);
        assert!(app.saved_model.is_none());
        app.move_down();
        app.save_selection();
        assert_eq!(app.saved_model.as_deref(), Some("mistral:7b"));

        let saved = SystemConfig::load(&dir.path().join("system_config.json")).unwrap();
        assert_eq!(saved.recommended_settings.model, "mistral:7b");
        assert_eq!(saved.recommended_settings.max_tokens, 3072);
        assert_eq!(saved.system_analysis.ram_gb, 16);
    }

    #[test]
    fn test_saved_model_is_loaded_on_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_config.json");
        SystemConfig::from_selection(HardwareProfile::default(), "phi3:mini")
            .save(&path)
            .unwrap();
        let provider = FakeProvider {
            available: false,
            installed: Rc::default(),
            pull_events: vec![],
        };
        let app = App::new(specs(8.0), Box::new(provider), path);
        assert_eq!(app.saved_model.as_deref(), Some("phi3:mini"));
    }

    #[test]
    fn test_installed_marks_rows() {
        let (app, _dir) = app_with(16.0, true, &["mistral:7b", "mistral"], vec![]);
        assert!(app.ollama_available);
        assert_eq!(app.installed_count(), 1);
        let mistral = app
            .rows
            .iter()
            .find(|r| r.entry.identifier == "mistral:7b")
            .unwrap();
        assert!(mistral.installed);
        assert!(!app.rows[0].installed);
    }

    #[test]
    fn test_download_needs_confirmation_then_completes() {
        let events = vec![
            PullEvent::Progress {
                status: "pulling manifest".to_string(),
                percent: Some(40.0),
            },
            PullEvent::Done,
        ];
        let (mut app, _dir) = app_with(16.0, true, &[], events);

        app.start_download();
        assert!(app.confirm_download);
        assert!(app.pull_active.is_none());

        app.start_download();
        assert!(!app.confirm_download);
        assert!(app.pull_active.is_some());
        assert_eq!(app.pull_model_name.as_deref(), Some("llama3.1:8b"));

        app.tick_pull();
        assert!(app.pull_active.is_none());
        assert_eq!(app.pull_status.as_deref(), Some("Downloaded llama3.1:8b"));
        assert!(app.rows[0].installed);
    }

    #[test]
    fn test_moving_cancels_confirmation() {
        let (mut app, _dir) = app_with(16.0, true, &[], vec![]);
        app.start_download();
        assert!(app.confirm_download);
        app.move_down();
        assert!(!app.confirm_download);
    }

    #[test]
    fn test_pull_error_is_reported() {
        let events = vec![PullEvent::Error("file does not exist".to_string())];
        let (mut app, _dir) = app_with(16.0, true, &[], events);
        app.start_download();
        app.start_download();
        app.tick_pull();
        assert!(app.pull_active.is_none());
        assert_eq!(app.pull_status.as_deref(), Some("Error: file does not exist"));
    }

    #[test]
    fn test_installed_model_is_not_pulled() {
        let (mut app, _dir) = app_with(16.0, true, &["llama3.1:8b"], vec![PullEvent::Done]);
        app.start_download();
        assert!(!app.confirm_download);
        assert!(app.pull_active.is_none());
        assert_eq!(
            app.pull_status.as_deref(),
            Some("llama3.1:8b is already installed")
        );
    }
}
