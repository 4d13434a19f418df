//! Pure rendering: map App state to ratatui widgets.
//!
//! Four components each own a fixed region: header (top row), sidebar
//! (left column), content area (the rest) and footer (bottom row). They
//! read the `App` snapshot and keep no state of their own. Ratatui diffs
//! each frame against the last, so a partial redraw only flushes the
//! cells that changed.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::types::{Content, MenuItem, Tone};

use super::state::{App, Connectivity, OptionMenu, Phase, SubView, Viewport, quick_key};
use super::theme;

/// Sidebar width in columns, capped at half the screen.
pub const SIDEBAR_WIDTH: u16 = 34;

/// A screen region that repaints itself from the current state.
pub trait Component {
    fn draw(&self, app: &App, frame: &mut Frame, area: Rect);
}

pub struct Header;
pub struct Sidebar;
pub struct ContentArea;
pub struct Footer;

// ============================================================================
// DISPATCH
// ============================================================================

/// Render every component into the frame.
pub fn render(app: &App, frame: &mut Frame) {
    let [header, sidebar, content, footer] = regions(frame.area());

    Header.draw(app, frame, header);
    Sidebar.draw(app, frame, sidebar);
    ContentArea.draw(app, frame, content);
    Footer.draw(app, frame, footer);
}

/// Header, sidebar, content and footer regions of a screen.
fn regions(area: Rect) -> [Rect; 4] {
    let rows = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Min(0),    // body
        Constraint::Length(1), // footer
    ])
    .split(area);

    let columns = Layout::horizontal([
        Constraint::Length(SIDEBAR_WIDTH.min(area.width / 2)),
        Constraint::Min(0),
    ])
    .split(rows[1]);

    [rows[0], columns[0], columns[1], rows[2]]
}

/// Text region of the content pane for a screen of this size.
pub fn content_viewport(screen: Rect) -> Viewport {
    let [_, _, content, _] = regions(screen);
    text_viewport(ContentArea::inner(content))
}

fn text_viewport(inner: Rect) -> Viewport {
    Viewport {
        width: inner.width as usize,
        // title and blank line
        rows: (inner.height as usize).saturating_sub(2),
    }
}

/// Largest useful scroll offset for `lines`.
///
/// With a known viewport this is the wrapped row count less one screenful,
/// the same bound the content pane draws with. Without one (line mode) it
/// is the last logical line.
pub fn scroll_limit(lines: &[String], viewport: Option<Viewport>) -> usize {
    match viewport {
        Some(viewport) => wrap_lines(lines, viewport.width)
            .len()
            .saturating_sub(viewport.rows),
        None => lines.len().saturating_sub(1),
    }
}

// ============================================================================
// HEADER
// ============================================================================

impl Component for Header {
    fn draw(&self, app: &App, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(" UNIBOS ", theme::STYLE_TITLE),
            Span::styled(format!("· {} · v{}   ", app.profile, app.version), theme::STYLE_DIM),
            Span::styled(breadcrumb(app), theme::STYLE_INTERACTIVE),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// `Section › Item [› sub-view › ...]`
pub fn breadcrumb(app: &App) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(section) = app.current_section() {
        parts.push(&section.label);
    }
    if let Some(item) = app.current_item() {
        parts.push(&item.label);
    }
    parts.extend(app.views.iter().map(SubView::title));
    parts.join(" › ")
}

// ============================================================================
// SIDEBAR
// ============================================================================

impl Component for Sidebar {
    fn draw(&self, app: &App, frame: &mut Frame, area: Rect) {
        let dimmed = app.viewing_subview();
        let current = app.nav.position();
        let mut lines: Vec<Line> = Vec::new();
        let mut cursor_line = 0;

        for (s, section) in app.menu.sections().iter().enumerate() {
            if s > 0 {
                lines.push(Line::from(""));
            }
            let header_style = if dimmed { theme::STYLE_DIM } else { theme::STYLE_SECTION };
            lines.push(Line::from(Span::styled(
                with_icon(&section.icon, &section.label),
                header_style,
            )));

            for (i, item) in section.items.iter().enumerate() {
                let is_current = (s, i) == current;
                if is_current {
                    cursor_line = lines.len();
                }
                lines.push(sidebar_row(i, item, is_current, dimmed));
            }
        }

        let height = area.height as usize;
        let offset = cursor_line.saturating_sub(height.saturating_sub(1));

        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(theme::STYLE_DIM);
        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((offset as u16, 0));
        frame.render_widget(paragraph, area);
    }
}

fn sidebar_row(index: usize, item: &MenuItem, is_current: bool, dimmed: bool) -> Line<'static> {
    let digit = quick_key(index);
    let label = with_icon(&item.icon, &item.label);

    let whole_line = match (is_current, dimmed, item.enabled) {
        (true, true, _) => Some(theme::STYLE_CURSOR_DIM),
        (true, false, _) => Some(theme::STYLE_SELECTED),
        (false, true, _) | (false, false, false) => Some(theme::STYLE_DIM),
        (false, false, true) => None,
    };

    match whole_line {
        Some(style) => Line::from(Span::styled(format!(" {} {}", digit, label), style)),
        None => Line::from(vec![
            Span::styled(format!(" {}", digit), theme::STYLE_INTERACTIVE),
            Span::raw(format!(" {}", label)),
        ]),
    }
}

fn with_icon(icon: &str, label: &str) -> String {
    if icon.is_empty() {
        label.to_string()
    } else {
        format!("{} {}", icon, label)
    }
}

// ============================================================================
// CONTENT AREA
// ============================================================================

impl ContentArea {
    /// Normalize content of either representation and wrap it to `width`.
    pub fn layout(content: impl Into<Content>, width: usize) -> Vec<String> {
        wrap_lines(&content.into().into_lines(), width)
    }

    /// One column of padding on each side.
    fn inner(area: Rect) -> Rect {
        Rect {
            x: area.x.saturating_add(1),
            y: area.y,
            width: area.width.saturating_sub(2),
            height: area.height,
        }
    }
}

impl Component for ContentArea {
    fn draw(&self, app: &App, frame: &mut Frame, area: Rect) {
        let inner = ContentArea::inner(area);

        match app.views.top() {
            Some(SubView::Output(view)) => {
                draw_text(frame, inner, &view.title, &view.lines, view.tone, view.scroll);
            }
            Some(SubView::Options(menu)) => draw_options(frame, inner, menu),
            None if app.content.title.is_empty() && app.content.lines.is_empty() => {
                draw_preview(frame, inner, app.current_item());
            }
            None => draw_text(
                frame,
                inner,
                &app.content.title,
                &app.content.lines,
                app.content.tone,
                app.nav.scroll,
            ),
        }
    }
}

fn draw_text(frame: &mut Frame, area: Rect, title: &str, lines: &[String], tone: Tone, scroll: usize) {
    let viewport = text_viewport(area);
    let scroll = scroll.min(scroll_limit(lines, Some(viewport)));
    let rows = wrap_lines(lines, viewport.width);

    let title = match tone {
        Tone::Error => format!("✗ {}", title),
        _ => title.to_string(),
    };
    let title_style = match tone {
        Tone::Error => theme::STYLE_DANGER.patch(theme::STYLE_IMPORTANT),
        _ => theme::STYLE_IMPORTANT,
    };

    let body_style = theme::tone_style(tone);
    let mut text = vec![Line::from(Span::styled(title, title_style)), Line::from("")];
    text.extend(
        rows.into_iter()
            .skip(scroll)
            .take(viewport.rows)
            .map(|row| Line::from(Span::styled(row, body_style))),
    );

    frame.render_widget(Paragraph::new(text), area);
}

fn draw_options(frame: &mut Frame, area: Rect, menu: &OptionMenu) {
    let mut text = vec![
        Line::from(Span::styled(menu.title.clone(), theme::STYLE_IMPORTANT)),
        Line::from(""),
    ];

    for (i, item) in menu.items.iter().enumerate() {
        let label = format!(" {} {}", quick_key(i), with_icon(&item.icon, &item.label));
        let style = if i == menu.cursor {
            theme::STYLE_SELECTED
        } else if !item.enabled {
            theme::STYLE_DIM
        } else {
            Style::new()
        };
        text.push(Line::from(Span::styled(label, style)));
    }

    if let Some(item) = menu.selected() {
        if !item.description.is_empty() {
            text.push(Line::from(""));
            for row in wrap_line(&item.description, area.width as usize) {
                text.push(Line::from(Span::styled(row, theme::STYLE_DIM)));
            }
        }
    }

    frame.render_widget(Paragraph::new(text), area);
}

fn draw_preview(frame: &mut Frame, area: Rect, item: Option<&MenuItem>) {
    let Some(item) = item else {
        return;
    };
    let width = area.width as usize;

    let mut text = vec![
        Line::from(Span::styled(with_icon(&item.icon, &item.label), theme::STYLE_IMPORTANT)),
        Line::from(""),
    ];
    for row in wrap_line(&item.description, width) {
        text.push(Line::from(row));
    }
    if let Some(command) = item.command() {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(format!("$ {}", command), theme::STYLE_DIM)));
    }
    text.push(Line::from(""));
    let hint = if item.enabled { "Press Enter to run." } else { "Disabled." };
    text.push(Line::from(Span::styled(hint, theme::STYLE_INTERACTIVE)));

    frame.render_widget(Paragraph::new(text), area);
}

/// Word-wrap every logical line to `width` columns.
pub fn wrap_lines(lines: &[String], width: usize) -> Vec<String> {
    lines.iter().flat_map(|line| wrap_line(line, width)).collect()
}

/// Greedy word wrap by display width; words wider than `width` are
/// split hard.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width == 0 || line.width() <= width {
        return vec![line.to_string()];
    }

    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut after_wrap = false;

    for (i, word) in line.split(' ').enumerate() {
        let word_width = word.width();
        let sep = if i == 0 || (after_wrap && current.is_empty()) { 0 } else { 1 };

        if current_width + sep + word_width <= width {
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_width += sep + word_width;
            continue;
        }

        if !current.is_empty() {
            rows.push(std::mem::take(&mut current));
            current_width = 0;
        }
        after_wrap = true;

        for ch in word.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if current_width + ch_width > width && !current.is_empty() {
                rows.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += ch_width;
        }
    }

    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

// ============================================================================
// FOOTER
// ============================================================================

impl Component for Footer {
    fn draw(&self, app: &App, frame: &mut Frame, area: Rect) {
        let right = match &app.status {
            Some(status) => Line::from(Span::styled(format!("⏳ {} ", status), theme::STYLE_WARNING)),
            None => {
                let (indicator, style) = connectivity_label(app.connectivity);
                Line::from(vec![
                    Span::styled(format!("{}  ", app.clock), theme::STYLE_DIM),
                    Span::styled(format!("{} ", indicator), style),
                ])
            }
        };

        let right_width = (right.width() as u16).min(area.width);
        let columns = Layout::horizontal([Constraint::Min(0), Constraint::Length(right_width)]).split(area);

        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", hints(app)), theme::STYLE_HELP)),
            columns[0],
        );
        frame.render_widget(Paragraph::new(right), columns[1]);
    }
}

/// Key hints for the current phase.
pub fn hints(app: &App) -> &'static str {
    match (app.phase, app.views.top()) {
        (_, Some(SubView::Output(_))) => "[↑↓ PgUp PgDn] scroll  [Esc] back",
        (_, Some(SubView::Options(_))) => "[↑↓] move  [0-9] select  [Enter] run  [Esc] back",
        (Phase::Terminating, None) => "bye",
        _ => "[↑↓] move  [←→ Tab] section  [0-9] select  [Enter] run  [q] quit",
    }
}

pub fn connectivity_label(connectivity: Connectivity) -> (&'static str, Style) {
    match connectivity {
        Connectivity::Online => ("● online", theme::STYLE_SAFE),
        Connectivity::Offline => ("○ offline", theme::STYLE_DANGER),
        Connectivity::Unknown => ("◌ unknown", theme::STYLE_DIM),
    }
}

// ============================================================================
// PLAIN TEXT
// ============================================================================

/// Render the state as plain lines for degraded (non-terminal) mode.
pub fn render_plain(app: &App) -> Vec<String> {
    let mut out = vec![format!(
        "UNIBOS · {} · v{} · {}",
        app.profile,
        app.version,
        breadcrumb(app)
    )];

    let current = app.nav.position();
    for (s, section) in app.menu.sections().iter().enumerate() {
        out.push(format!("[{}]", with_icon(&section.icon, &section.label)));
        for (i, item) in section.items.iter().enumerate() {
            let marker = if (s, i) == current { '>' } else { ' ' };
            let disabled = if item.enabled { "" } else { " (disabled)" };
            out.push(format!(
                "{} {} {}{}",
                marker,
                quick_key(i),
                with_icon(&item.icon, &item.label),
                disabled
            ));
        }
    }

    let (title, lines, tone) = app.visible_text();
    if !title.is_empty() || !lines.is_empty() {
        out.push(String::new());
        let marker = if tone == Tone::Error { "✗ " } else { "" };
        out.push(format!("== {}{} ==", marker, title));
        if let Some(SubView::Options(menu)) = app.views.top() {
            for (i, line) in lines.into_iter().enumerate() {
                let cursor = if i == menu.cursor { '>' } else { ' ' };
                out.push(format!("{} {}", cursor, line));
            }
        } else {
            out.extend(lines);
        }
    }

    out.push(format!("-- {}", hints(app)));
    out
}

// ============================================================================
// TESTS
// ============================================================================
