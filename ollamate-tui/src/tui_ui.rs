use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState, Wrap,
    },
};

use crate::tui_app::{App, InputMode, ModelRow, ViewFilter};
use ollamate_core::recommend::{HardwareTier, Standing};

const HEADERS: [&str; 10] = [
    "", "Inst", "Model", "Name", "Size", "Class", "Standing", "Tokens", "Temp", "Tags",
];

pub fn draw(frame: &mut Frame, app: &mut App) {
    let [system, filters, body, status] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    draw_system_bar(frame, app, system);
    draw_filters(frame, app, filters);
    if app.show_detail {
        draw_detail(frame, app, body);
    } else {
        draw_table(frame, app, body);
    }
    draw_status_bar(frame, app, status);
}

fn fg(color: Color) -> Style {
    Style::default().fg(color)
}

fn panel<'a>(title: impl Into<Line<'a>>, title_color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(fg(Color::DarkGray))
        .title(title)
        .title_style(fg(title_color))
}

fn tier_color(tier: HardwareTier) -> Color {
    match tier {
        HardwareTier::HighEnd => Color::Green,
        HardwareTier::MidRange => Color::Cyan,
        HardwareTier::LowerEnd => Color::Yellow,
        HardwareTier::Basic => Color::Magenta,
    }
}

fn standing_color(standing: Option<Standing>) -> Color {
    match standing {
        Some(Standing::Primary) => Color::Green,
        Some(Standing::Alternate) => Color::White,
        Some(Standing::Specialized) => Color::Cyan,
        Some(Standing::Experimental) => Color::Yellow,
        Some(Standing::NotRecommended) => Color::Red,
        None => Color::DarkGray,
    }
}

fn gpu_summary(app: &App) -> String {
    let Some(gpu) = app.specs.gpus.first() else {
        return format!("none ({})", app.specs.backend.label());
    };
    match gpu.vram_gb {
        Some(vram) if gpu.unified_memory => format!("{} ({:.1} GB shared)", gpu.name, vram),
        Some(vram) => format!("{} ({:.1} GB)", gpu.name, vram),
        None => gpu.name.clone(),
    }
}

fn draw_system_bar(frame: &mut Frame, app: &App, area: Rect) {
    let tier = app.recommendation.tier;
    let ollama = if app.ollama_available {
        (format!("✓ ({} installed)", app.installed_count()), Color::Green)
    } else {
        ("✗".to_string(), Color::DarkGray)
    };

    let segments = [
        (
            "CPU",
            format!("{} ({} cores)", app.specs.cpu_name, app.specs.total_cpu_cores),
            Color::White,
        ),
        (
            "RAM",
            format!(
                "{:.1} GB avail / {:.1} GB total",
                app.specs.available_ram_gb, app.specs.total_ram_gb
            ),
            Color::Cyan,
        ),
        ("GPU", gpu_summary(app), Color::Yellow),
        ("Tier", tier.label().to_string(), tier_color(tier)),
        (app.provider_name(), ollama.0, ollama.1),
    ];

    let mut spans = Vec::with_capacity(segments.len() * 3);
    for (i, (label, value, color)) in segments.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  │  ", fg(Color::DarkGray)));
        }
        spans.push(Span::styled(format!(" {label}: "), fg(Color::DarkGray)));
        spans.push(Span::styled(value, fg(color)));
    }

    let block = panel(" ollamate ", Color::Green).title_style(
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_filters(frame: &mut Frame, app: &App, area: Rect) {
    let [search_area, filter_area, saved_area] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(30),
            Constraint::Length(18),
            Constraint::Length(24),
        ])
        .areas(area);

    let searching = app.input_mode == InputMode::Search;
    let search_color = if searching {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let query = if app.search_query.is_empty() && !searching {
        Span::styled("Press / to search...", fg(Color::DarkGray))
    } else {
        Span::styled(app.search_query.as_str(), fg(Color::White))
    };
    frame.render_widget(
        Paragraph::new(Line::from(query))
            .block(panel(" Search ", search_color).border_style(fg(search_color))),
        search_area,
    );
    if searching {
        frame.set_cursor_position((
            search_area.x + app.search_query.chars().count() as u16 + 1,
            search_area.y + 1,
        ));
    }

    let filter_color = match app.view_filter {
        ViewFilter::Recommended => Color::Green,
        ViewFilter::All => Color::White,
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!(" {}", app.view_filter.label()),
            fg(filter_color),
        ))
        .block(panel(" Show [a] ", Color::DarkGray)),
        filter_area,
    );

    let saved = match &app.saved_model {
        Some(model) => Span::styled(format!(" {}", model), fg(Color::Cyan)),
        None => Span::styled(" none", fg(Color::DarkGray)),
    };
    frame.render_widget(
        Paragraph::new(saved).block(panel(" Saved [s] ", Color::DarkGray)),
        saved_area,
    );
}

/// Spinner plus a three-cell bar for the "Inst" column of a pulling row.
fn pull_indicator(percent: Option<f64>, tick: u64) -> String {
    const SPINNER: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
    const SHADES: &[char] = &[' ', '░', '▒', '▓', '█'];

    let spin = SPINNER[(tick as usize / 3) % SPINNER.len()];
    let Some(pct) = percent else {
        return format!(" {spin}");
    };
    let thirds = pct.clamp(0.0, 100.0) / 100.0 * 3.0;
    std::iter::once(spin)
        .chain((0..3).map(|cell| {
            let level = (thirds - cell as f64).clamp(0.0, 1.0);
            SHADES[(level * 4.0).round() as usize]
        }))
        .collect()
}

fn model_row<'a>(app: &App, row: &'a ModelRow) -> Row<'a> {
    let id = row.entry.identifier;
    let color = standing_color(row.standing);
    let pulling =
        app.pull_active.is_some() && app.pull_model_name.as_deref() == Some(id);

    let (inst, inst_color) = match (row.installed, pulling) {
        (true, _) => (" ✓".to_string(), Color::Green),
        (false, true) => (pull_indicator(app.pull_percent, app.tick_count), Color::Yellow),
        (false, false) => (String::new(), Color::DarkGray),
    };
    let marker = if app.saved_model.as_deref() == Some(id) {
        "★"
    } else {
        "●"
    };

    let cells = vec![
        Cell::from(marker).style(fg(color)),
        Cell::from(inst).style(fg(inst_color)),
        Cell::from(id).style(fg(Color::White)),
        Cell::from(row.entry.display_name).style(fg(Color::DarkGray)),
        Cell::from(format!("{:.1} GB", row.entry.size_gb)).style(fg(Color::White)),
        Cell::from(row.entry.tier.label()).style(fg(Color::DarkGray)),
        Cell::from(row.standing.map(|s| s.label()).unwrap_or("\u{2014}")).style(fg(color)),
        Cell::from(row.defaults.max_tokens.to_string()).style(fg(Color::White)),
        Cell::from(format!("{:.1}", row.defaults.temperature)).style(fg(Color::White)),
        Cell::from(row.entry.tags.join(", ")).style(fg(Color::DarkGray)),
    ];

    let row_style = if pulling {
        Style::default().bg(Color::Rgb(50, 50, 0))
    } else {
        Style::default()
    };
    Row::new(cells).style(row_style)
}

fn draw_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let header = Row::new(HEADERS.map(|h| {
        Cell::from(h).style(fg(Color::Cyan).add_modifier(Modifier::BOLD))
    }));
    let rows: Vec<Row> = app
        .filtered_rows
        .iter()
        .map(|&idx| model_row(app, &app.rows[idx]))
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(5),
        Constraint::Min(14),
        Constraint::Min(18),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(12),
        Constraint::Length(7),
        Constraint::Length(5),
        Constraint::Min(10),
    ];

    let title = format!(" Models ({}/{}) ", app.filtered_rows.len(), app.rows.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(panel(title, Color::White))
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(40, 40, 70))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let visible = app.filtered_rows.len();
    let mut state = TableState::default().with_selected((visible > 0).then_some(app.selected_row));
    frame.render_stateful_widget(table, area, &mut state);

    // Borders plus header take three lines
    if visible > (area.height as usize).saturating_sub(3) {
        let mut scroll = ScrollbarState::new(visible).position(app.selected_row);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓")),
            area,
            &mut scroll,
        );
    }
}

fn field(label: &str, value: impl Into<String>, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<13}"), fg(Color::DarkGray)),
        Span::styled(value.into(), fg(color)),
    ])
}

fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(row) = app.selected() else {
        frame.render_widget(panel(" No model selected ", Color::White), area);
        return;
    };

    let entry = row.entry;
    let tier = app.recommendation.tier;
    let standing = match row.standing {
        Some(s) => format!("{} for the {} tier", s.label(), tier),
        None => format!("not one of the {} tier picks", tier),
    };
    let installed = match (row.installed, app.ollama_available) {
        (true, _) => "yes".to_string(),
        (false, true) => "no (press d to pull)".to_string(),
        (false, false) => format!("unknown ({} not reachable)", app.provider_name()),
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  {:<13}", "Model:"), fg(Color::DarkGray)),
            Span::styled(entry.identifier, fg(Color::White).add_modifier(Modifier::BOLD)),
        ]),
        field("Name:", entry.display_name, Color::White),
        field("Family:", entry.family(), Color::White),
        field(
            "Download:",
            format!("{:.1} GB ({})", entry.size_gb, entry.tier),
            Color::White,
        ),
        field("Tags:", entry.tags.join(", "), Color::Cyan),
        field("Standing:", standing, standing_color(row.standing)),
        field("Installed:", installed, Color::White),
        Line::from(""),
        Line::from(Span::styled(
            "  Generation defaults",
            fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        field("Max tokens:", row.defaults.max_tokens.to_string(), Color::White),
        field(
            "Temperature:",
            format!("{:.1}", row.defaults.temperature),
            Color::White,
        ),
        Line::from(""),
        Line::from(Span::styled(format!("  {}", entry.summary), fg(Color::White))),
    ];

    if app.saved_model.as_deref() == Some(entry.identifier) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "  ★ Saved as the active model",
            fg(Color::Green),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(panel(format!(" {} ", entry.display_name), Color::White))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn key_hints(app: &App) -> (&'static str, String) {
    match app.input_mode {
        InputMode::Search => ("SEARCH", "  Type to search  Esc:done  Ctrl-U:clear".to_string()),
        InputMode::Normal => {
            let enter = if app.show_detail {
                "Enter:table"
            } else {
                "Enter:detail"
            };
            let pull = if app.ollama_available { "  d:pull" } else { "" };
            (
                "NORMAL",
                format!(
                    " ↑↓/jk:nav  {enter}  /:search  a:all/picks  s:save{pull}  r:refresh  q:quit"
                ),
            )
        }
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (mode, keys) = key_hints(app);
    let hints = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {mode} "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys, fg(Color::DarkGray)),
    ]));

    // Pull progress wins over one-shot messages
    let side = if let Some(status) = &app.pull_status {
        let text = match app.pull_percent {
            Some(pct) => format!(" {status} [{pct:.0}%] "),
            None => format!(" {status} "),
        };
        let color = if app.pull_active.is_some() {
            Color::Yellow
        } else {
            Color::Green
        };
        Some((text, color))
    } else {
        app.message
            .as_ref()
            .map(|message| (format!(" {message} "), Color::Cyan))
    };

    let Some((text, color)) = side else {
        frame.render_widget(hints, area);
        return;
    };

    let [left, right] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(20),
            Constraint::Length(text.chars().count() as u16 + 2),
        ])
        .areas(area);
    frame.render_widget(hints, left);
    frame.render_widget(Paragraph::new(Span::styled(text, fg(color))), right);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_indicator_fills() {
        assert_eq!(pull_indicator(Some(0.0), 0), "⠋   ");
        assert_eq!(pull_indicator(Some(50.0), 0), "⠋█▒ ");
        assert_eq!(pull_indicator(Some(100.0), 0), "⠋███");
        assert_eq!(pull_indicator(None, 3), " ⠙");
    }

    #[test]
    fn test_field_pads_label() {
        let line = field("Name:", "Mistral 7B", Color::White);
        assert_eq!(line.spans[0].content, "  Name:        ");
        assert_eq!(line.spans[1].content, "Mistral 7B");
    }
}
