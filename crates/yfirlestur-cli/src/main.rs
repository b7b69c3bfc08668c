mod app;

use anyhow::{Context, Result};
use app::{App, Flow};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use std::{
    env,
    fs::OpenOptions,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::Instant,
};
use yfirlestur_config::Config;
use yfirlestur_engine::{
    CorrectionList, CorrectionManager, Document, HostDocument, HttpProofreader, Overlay,
    ProofreadWorker, Proofreader, RangeRole, SessionOptions, io,
};

struct Args {
    path: PathBuf,
    check: bool,
    json: bool,
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} [--check [--json]] <file>");
    process::exit(1);
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("yfirlestur-cli");

    let mut path = None;
    let mut check = false;
    let mut json = false;
    for arg in &args[1..] {
        match arg.as_str() {
            "--check" => check = true,
            "--json" => json = true,
            flag if flag.starts_with("--") => usage(program),
            file if path.is_none() => path = Some(PathBuf::from(file)),
            _ => usage(program),
        }
    }

    match path {
        Some(path) if check || !json => Args { path, check, json },
        _ => usage(program),
    }
}

fn main() -> Result<()> {
    let args = parse_args();

    let config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            eprintln!("Fix or remove {}", Config::config_path().display());
            process::exit(1);
        }
    };

    let proofreader = HttpProofreader::new(config.endpoint.clone(), config.request_timeout())
        .context("Failed to build HTTP client")?;

    if args.check {
        init_logging(LogTarget::Stderr)?;
        return check(&args.path, &proofreader, args.json);
    }

    if let Some(log_file) = config.log_file.as_deref() {
        init_logging(LogTarget::File(log_file))?;
    }
    log::info!("Proofreading against {}", proofreader.endpoint());

    let document = if args.path.exists() {
        io::read_document(&args.path)
            .with_context(|| format!("Failed to open {}", args.path.display()))?
    } else {
        Document::from_text("")
    };
    let options = SessionOptions {
        debounce: config.debounce(),
        suppression: config.suppression(),
    };
    let worker =
        ProofreadWorker::spawn(proofreader).context("Failed to start proofreading worker")?;
    let mut app = App::new(document, args.path, worker, options);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

enum LogTarget<'a> {
    Stderr,
    /// Keeps log lines off the terminal UI
    File(&'a Path),
}

fn init_logging(target: LogTarget) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match target {
        LogTarget::Stderr => {
            builder.target(env_logger::Target::Stderr);
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }
    builder.init();
    Ok(())
}

/// One-shot proofreading of a whole file
fn check(path: &Path, proofreader: &dyn Proofreader, json: bool) -> Result<()> {
    let document = io::read_document(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut manager = CorrectionManager::new(&document);
    let mut list = CorrectionList::new();

    let report = manager
        .proofread_changed_paragraphs(&document, proofreader, &mut list)
        .context("Proofreading failed")?;
    log::info!(
        "{} corrections in {} paragraphs",
        report.added,
        report.submitted
    );

    let records = list.in_document_order(|id| manager.find_range(id).map(|range| range.start));
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let paragraphs = document.paragraphs();
    for record in records {
        let line = paragraphs
            .iter()
            .position(|p| p.id == record.id.paragraph)
            .map(|i| i + 1)
            .unwrap_or_default();
        let column = paragraphs
            .get(line.saturating_sub(1))
            .map(|p| record.from - p.pos)
            .unwrap_or_default();
        println!(
            "{}:{line}:{column}: {}  ({} [{}] {})",
            path.display(),
            record.summary(),
            record.context_before,
            record.before_text,
            record.context_after
        );
    }
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(app.poll_timeout(Instant::now()))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && app.handle_key(key, Instant::now()) == Flow::Quit
        {
            return Ok(());
        }
        app.tick(Instant::now());
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[0]);

    // Document panel
    let title = format!(
        "{}{}",
        app.path.display(),
        if app.dirty { " *" } else { "" }
    );
    let lines = document_lines(app);
    let cursor_line = app
        .session
        .document()
        .paragraph_at(app.cursor().saturating_sub(1))
        .and_then(|current| {
            app.session
                .document()
                .paragraphs()
                .iter()
                .position(|p| p.id == current.id)
        })
        .unwrap_or_default();
    let visible = columns[0].height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(visible.saturating_sub(1));
    let document = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));
    f.render_widget(document, columns[0]);

    // Correction list panel
    let items: Vec<ListItem> = app
        .session
        .corrections()
        .iter()
        .map(|record| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(record.before_text.clone(), Style::default().fg(Color::Red)),
                    Span::raw(" → "),
                    Span::styled(record.after_text.clone(), Style::default().fg(Color::Green)),
                ]),
                Line::from(Span::styled(
                    format!(
                        "  {} [{}] {}",
                        record.context_before, record.before_text, record.context_after
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();
    let corrections = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Corrections ({})", app.session.sink().len())),
        )
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    let selected = app.selected_index();
    app.list_state.select(selected);
    f.render_stateful_widget(corrections, columns[1], &mut app.list_state);

    let status = Paragraph::new(Line::from(app.status.clone()));
    f.render_widget(status, rows[1]);

    let help_text = Line::from(vec![
        Span::raw("Esc/^Q: Quit | "),
        Span::raw("Enter: Split + proofread | "),
        Span::raw("Tab/⇧Tab: Next/Prev | "),
        Span::raw("^A: Accept | ^L: Select at cursor | ^R: Proofread | ^S: Save"),
    ]);
    f.render_widget(
        Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );
}

/// One line per paragraph, with corrections underlined, the focused one
/// highlighted and the cursor shown reversed
fn document_lines(app: &App) -> Vec<Line<'static>> {
    let overlay = app.session.decorations();
    let cursor = app.cursor();

    app.session
        .document()
        .paragraphs()
        .iter()
        .map(|paragraph| {
            let content = paragraph.content_range();
            let mut spans = Vec::new();
            let mut run = String::new();
            let mut run_style = Style::default();

            for (offset, ch) in paragraph.text.char_indices() {
                let pos = content.start + offset;
                let style = char_style(overlay, pos, pos == cursor);
                if style != run_style && !run.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style));
                }
                run_style = style;
                run.push(ch);
            }
            if !run.is_empty() {
                spans.push(Span::styled(run, run_style));
            }
            if cursor == content.end {
                spans.push(Span::styled(
                    " ",
                    Style::default().add_modifier(Modifier::REVERSED),
                ));
            }
            Line::from(spans)
        })
        .collect()
}

fn char_style(overlay: &Overlay, pos: usize, at_cursor: bool) -> Style {
    let mut style = Style::default();
    for range in overlay.find(Some(pos), Some(pos)) {
        style = match range.meta.role {
            RangeRole::Correction => style.fg(Color::Red).add_modifier(Modifier::UNDERLINED),
            RangeRole::Highlight => style.bg(Color::Yellow),
        };
    }
    if at_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}
