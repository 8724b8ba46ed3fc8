//! Interactive review viewer state and drawing.

use anyhow::Result;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use relative_path::RelativePathBuf;
use scorewise_engine::{
    CorrectionSet, DiffGranularity, DiffSegment, EssayReview, SegmentKind, io,
};
use std::path::PathBuf;

/// What the content pane shows for the selected review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Diff,
    Corrections,
    Original,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Diff => ViewMode::Corrections,
            ViewMode::Corrections => ViewMode::Original,
            ViewMode::Original => ViewMode::Diff,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ViewMode::Diff => "Student view (diff)",
            ViewMode::Corrections => "Corrections",
            ViewMode::Original => "Original submission",
        }
    }
}

pub struct App {
    reviews_path: PathBuf,
    files: Vec<RelativePathBuf>,
    file_list_state: ListState,
    granularity: DiffGranularity,
    mode: ViewMode,
    selected_review: Option<EssayReview>,
    current_content: Vec<Line<'static>>,
}

impl App {
    pub fn new(reviews_path: PathBuf, granularity: DiffGranularity) -> Result<Self> {
        let files = io::scan_review_files(&reviews_path)?
            .iter()
            .filter_map(|path| path.strip_prefix(&reviews_path).ok())
            .filter_map(|path| RelativePathBuf::from_path(path).ok())
            .collect::<Vec<_>>();
        log::info!("found {} review files", files.len());

        let mut app = Self {
            reviews_path,
            files,
            file_list_state: ListState::default(),
            granularity,
            mode: ViewMode::Diff,
            selected_review: None,
            current_content: Vec::new(),
        };

        // Select first item if available
        if !app.files.is_empty() {
            app.file_list_state.select(Some(0));
            app.load_selected_review();
        }

        Ok(app)
    }

    pub fn next_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(i) => (i + 1) % self.files.len(),
            None => 0,
        };
        self.file_list_state.select(Some(i));
        self.load_selected_review();
    }

    pub fn previous_file(&mut self) {
        if self.files.is_empty() {
            return;
        }
        let i = match self.file_list_state.selected() {
            Some(0) | None => self.files.len() - 1,
            Some(i) => i - 1,
        };
        self.file_list_state.select(Some(i));
        self.load_selected_review();
    }

    pub fn cycle_mode(&mut self) {
        self.mode = self.mode.next();
        self.refresh_content();
    }

    fn load_selected_review(&mut self) {
        let Some(file) = self
            .file_list_state
            .selected()
            .and_then(|index| self.files.get(index))
        else {
            return;
        };

        match io::read_review(file, &self.reviews_path) {
            Ok(review) => self.selected_review = Some(review),
            Err(e) => {
                log::warn!("could not load {file}: {e}");
                self.selected_review = None;
                self.current_content = vec![Line::from(format!("Error reading review: {e}"))];
                return;
            }
        }
        self.refresh_content();
    }

    fn refresh_content(&mut self) {
        let Some(review) = &self.selected_review else {
            return;
        };
        self.current_content = match self.mode {
            ViewMode::Diff => diff_lines(&review.diff_with(self.granularity)),
            ViewMode::Corrections => correction_lines(review.corrections()),
            ViewMode::Original => review
                .original_text()
                .lines()
                .map(|line| Line::from(line.to_string()))
                .collect(),
        };
    }
}

/// Split diff segments into terminal lines: additions green, removals red
/// and struck through.
pub fn diff_lines(segments: &[DiffSegment]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for segment in segments {
        let style = match segment.kind {
            SegmentKind::Unchanged => Style::default(),
            SegmentKind::Added => Style::default().fg(Color::Green),
            SegmentKind::Removed => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::CROSSED_OUT),
        };
        for (i, part) in segment.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Line::from(std::mem::take(&mut current)));
            }
            if !part.is_empty() {
                current.push(Span::styled(part.to_string(), style));
            }
        }
    }
    lines.push(Line::from(current));
    lines
}

pub fn correction_lines(corrections: &CorrectionSet) -> Vec<Line<'static>> {
    if corrections.is_empty() {
        return vec![Line::from("No corrections yet")];
    }

    let mut lines = Vec::new();
    for correction in corrections {
        lines.push(Line::from(vec![
            Span::raw(format!("{}  ", correction.span())),
            Span::styled(
                correction.original_text.clone(),
                Style::default().fg(Color::Red),
            ),
            Span::raw(" → "),
            Span::styled(
                correction.corrected_text.clone(),
                Style::default().fg(Color::Green),
            ),
        ]));
        if let Some(note) = &correction.teacher_note {
            lines.push(Line::from(Span::styled(
                format!("    {note}"),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
    }
    lines
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(f.area());

    // Review list panel
    let file_items: Vec<ListItem> = app
        .files
        .iter()
        .map(|file| ListItem::new(Line::from(format!("📄 {file}"))))
        .collect();

    let files_list = List::new(file_items)
        .block(Block::default().borders(Borders::ALL).title("Reviews"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(files_list, chunks[0], &mut app.file_list_state);

    // Content panel
    let content_text = if app.current_content.is_empty() {
        vec![Line::from("Select a review to view it")]
    } else {
        app.current_content.clone()
    };

    let title = match &app.selected_review {
        Some(review) => format!("{} · {}", app.mode.title(), review.essay_id()),
        None => app.mode.title().to_string(),
    };
    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });

    f.render_widget(content, chunks[1]);

    let help = Paragraph::new(Line::from(
        "q: Quit | ↑/k: Previous | ↓/j: Next | Tab: Diff / Corrections / Original",
    ))
    .block(Block::default());

    // Place help at bottom
    let bottom_chunk = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    f.render_widget(help, bottom_chunk[1]);
}
