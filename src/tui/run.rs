//! TUI effects boundary: controller, main loop, terminal and key sources.
//!
//! This is the only TUI module with side effects. It wires the pure layers
//! (state, update, view) to a drawing surface and a key source. Interactive
//! sessions use crossterm and ratatui; when stdin or stdout is not a
//! terminal the same loop runs over plain lines.
//!
//! The loop is single-threaded. Handlers run synchronously; a busy status
//! is painted before each one so the user sees something while it blocks.

use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Stdout, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use crate::command::CommandRunner;
use crate::error::{ConsoleError, HandlerError};
use crate::net::Probe;
use crate::types::{MenuItem, Tone};

use super::input::{Key, decode_line, key_from_event};
use super::registry::{ActionRegistry, Control, Dispatch, Session};
use super::state::{App, OutputView, Phase, Redraw, SubView, Transition};
use super::terminal::{CrosstermMode, ModeGuard, install_panic_hook};
use super::update::{map_key, resize, update};
use super::view::{content_viewport, render, render_plain};

const CLOCK_FORMAT: &str = "%H:%M:%S";

// ============================================================================
// SURFACES AND KEY SOURCES
// ============================================================================

/// Where frames go.
pub trait Surface {
    fn draw(&mut self, app: &App) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;

    /// Screen size for surfaces with a fixed grid; `None` for line output.
    fn area(&self) -> Option<Rect> {
        None
    }

    /// Show the busy status before a blocking handler runs.
    fn paint_busy(&mut self, app: &App) -> io::Result<()> {
        self.draw(app)
    }
}

/// One unit of input for the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Key(Key),
    /// Timeout elapsed with nothing to read.
    Tick,
    Resize,
    /// The input stream ended.
    Closed,
}

pub trait KeySource {
    /// Wait up to `timeout` for input.
    fn next_input(&mut self, timeout: Duration) -> io::Result<Input>;

    /// True if more input is already buffered. The loop skips drawing
    /// until the burst is consumed.
    fn pending(&mut self) -> bool {
        false
    }
}

/// Full-screen ratatui surface on stdout.
pub struct CrosstermSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl CrosstermSurface {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        Ok(CrosstermSurface {
            terminal: Terminal::new(backend)?,
        })
    }
}

impl Surface for CrosstermSurface {
    fn draw(&mut self, app: &App) -> io::Result<()> {
        self.terminal.draw(|frame| render(app, frame))?;
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.terminal.clear()
    }

    fn area(&self) -> Option<Rect> {
        let size = self.terminal.size().ok()?;
        Some(Rect::new(0, 0, size.width, size.height))
    }
}

/// Line-oriented surface for pipes and dumb terminals.
///
/// Prints the whole plain rendering when it changes; identical frames
/// (clock ticks, no-op keys) are suppressed.
pub struct PlainSurface<W: Write> {
    out: W,
    last: Vec<String>,
}

impl<W: Write> PlainSurface<W> {
    pub fn new(out: W) -> Self {
        PlainSurface { out, last: Vec::new() }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface for PlainSurface<W> {
    fn draw(&mut self, app: &App) -> io::Result<()> {
        let lines = render_plain(app);
        if lines == self.last {
            return Ok(());
        }
        for line in &lines {
            writeln!(self.out, "{}", line)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        self.last = lines;
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn paint_busy(&mut self, app: &App) -> io::Result<()> {
        if let Some(status) = &app.status {
            writeln!(self.out, "⏳ {}", status)?;
            self.out.flush()?;
        }
        Ok(())
    }
}

/// Crossterm event reader.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_input(&mut self, timeout: Duration) -> io::Result<Input> {
        if !event::poll(timeout)? {
            return Ok(Input::Tick);
        }
        Ok(match event::read()? {
            Event::Key(key) => key_from_event(key).map_or(Input::Tick, Input::Key),
            Event::Resize(_, _) => Input::Resize,
            _ => Input::Tick,
        })
    }

    fn pending(&mut self) -> bool {
        event::poll(Duration::ZERO).unwrap_or(false)
    }
}

/// Keys decoded from lines of a reader. An empty line is Enter.
pub struct LineKeys<R: BufRead> {
    reader: R,
    queue: VecDeque<Key>,
}

impl<R: BufRead> LineKeys<R> {
    pub fn new(reader: R) -> Self {
        LineKeys {
            reader,
            queue: VecDeque::new(),
        }
    }
}

impl<R: BufRead> KeySource for LineKeys<R> {
    fn next_input(&mut self, _timeout: Duration) -> io::Result<Input> {
        if let Some(key) = self.queue.pop_front() {
            return Ok(Input::Key(key));
        }

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Input::Closed);
        }
        if line.trim().is_empty() {
            return Ok(Input::Key(Key::Enter));
        }

        self.queue.extend(decode_line(&line));
        Ok(self.queue.pop_front().map_or(Input::Tick, Input::Key))
    }

    fn pending(&mut self) -> bool {
        !self.queue.is_empty()
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

/// The console: state, handlers and the effects they may use.
pub struct Tui {
    pub app: App,
    registry: ActionRegistry,
    runner: Box<dyn CommandRunner>,
    working_dir: PathBuf,
    probe: Option<Probe>,
}

impl Tui {
    pub fn new(
        app: App,
        registry: ActionRegistry,
        runner: Box<dyn CommandRunner>,
        working_dir: PathBuf,
    ) -> Self {
        Tui {
            app,
            registry,
            runner,
            working_dir,
            probe: None,
        }
    }

    pub fn with_probe(mut self, probe: Option<Probe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Apply one key. Activations run here, painting the busy status
    /// first; everything else returns the redraw the loop owes.
    pub fn handle_key<S: Surface + ?Sized>(&mut self, key: Key, surface: &mut S) -> io::Result<Redraw> {
        let Some(action) = map_key(key) else {
            return Ok(Redraw::None);
        };

        match update(&mut self.app, action) {
            Transition::Redraw(redraw) => Ok(redraw),
            Transition::Quit => {
                tracing::info!("quit requested");
                self.app.phase = Phase::Terminating;
                Ok(Redraw::None)
            }
            Transition::Activate(item) => {
                self.app.status = Some(format!("Running {}...", item.label));
                surface.paint_busy(&self.app)?;
                self.activate(&item);
                self.app.status = None;
                Ok(Redraw::Full)
            }
        }
    }

    /// Dispatch the handler for `item` and fold its outcome into the state.
    ///
    /// Handler errors and panics become error-toned text; they never end
    /// the session.
    pub fn activate(&mut self, item: &MenuItem) -> Control {
        tracing::info!(item = %item.id, "activate");
        if self.app.views.is_empty() {
            self.app.nav.scroll = 0;
        }

        let mut session = Session::new(
            &mut self.app.content,
            &mut self.app.views,
            self.runner.as_ref(),
            &self.working_dir,
        );
        let outcome = self.registry.dispatch(item, &mut session);
        self.registry.absorb(session.into_pending());

        let control = match outcome {
            Dispatch::Unknown => {
                tracing::debug!(item = %item.id, "no handler registered");
                Control::Continue
            }
            Dispatch::Handled(Ok(control)) => control,
            Dispatch::Handled(Err(err)) => {
                tracing::warn!(item = %item.id, error = %err, "handler failed");
                self.show_failure(item, err.to_string());
                Control::Continue
            }
            Dispatch::Panicked(message) => {
                tracing::warn!(item = %item.id, panic = %message, "handler panicked");
                self.show_failure(item, format!("handler panicked: {}", message));
                Control::Continue
            }
        };

        if control == Control::Quit {
            self.app.phase = Phase::Terminating;
        }
        self.app.sync_phase();
        control
    }

    fn show_failure(&mut self, item: &MenuItem, message: String) {
        if self.app.views.is_empty() {
            self.app.content.set(item.label.clone(), message, Tone::Error);
        } else {
            self.app.views.push(SubView::Output(OutputView {
                title: item.label.clone(),
                lines: vec![message],
                tone: Tone::Error,
                scroll: 0,
            }));
        }
    }

    /// Activate one item by id outside the loop and return what the
    /// content pane would show.
    ///
    /// # Errors
    /// Unknown or disabled items are errors.
    pub fn activate_id(&mut self, id: &str) -> Result<(String, Vec<String>, Tone), ConsoleError> {
        let item = self
            .app
            .menu
            .find(id)
            .cloned()
            .ok_or_else(|| ConsoleError::UnknownItem(id.to_string()))?;
        if !item.enabled {
            return Err(HandlerError::Failed {
                item: item.id,
                reason: "item is disabled".to_string(),
            }
            .into());
        }

        self.app.phase = Phase::Running;
        self.activate(&item);
        Ok(self.app.visible_text())
    }

    /// Refresh the clock and, when due, connectivity. True if anything
    /// visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let clock = chrono::Local::now().format(CLOCK_FORMAT).to_string();
        let mut changed = clock != self.app.clock;
        self.app.clock = clock;

        if let Some(probe) = self.probe.as_mut() {
            if probe.due(now) {
                let state = probe.check(now);
                changed |= state != self.app.connectivity;
                self.app.connectivity = state;
            }
        }
        changed
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

fn stronger(a: Redraw, b: Redraw) -> Redraw {
    match (a, b) {
        (Redraw::Full, _) | (_, Redraw::Full) => Redraw::Full,
        (Redraw::Partial, _) | (_, Redraw::Partial) => Redraw::Partial,
        _ => Redraw::None,
    }
}

fn paint<S: Surface + ?Sized>(surface: &mut S, app: &App, redraw: Redraw) -> io::Result<()> {
    match redraw {
        Redraw::None => Ok(()),
        Redraw::Partial => surface.draw(app),
        Redraw::Full => {
            surface.clear()?;
            surface.draw(app)
        }
    }
}

/// Match the content pane size to the surface.
fn fit<S: Surface + ?Sized>(tui: &mut Tui, surface: &S) {
    resize(&mut tui.app, surface.area().map(content_viewport));
}

/// Drive the console until quit or end of input.
pub fn run_loop<S, K>(tui: &mut Tui, surface: &mut S, keys: &mut K, tick: Duration) -> io::Result<()>
where
    S: Surface + ?Sized,
    K: KeySource + ?Sized,
{
    tui.app.phase = Phase::Running;
    tui.app.sync_phase();
    tui.tick(Instant::now());
    fit(tui, surface);
    paint(surface, &tui.app, Redraw::Full)?;

    let mut owed = Redraw::None;
    while !tui.app.should_quit() {
        let redraw = match keys.next_input(tick)? {
            Input::Key(key) => tui.handle_key(key, surface)?,
            Input::Tick if tui.tick(Instant::now()) => Redraw::Partial,
            Input::Tick => Redraw::None,
            Input::Resize => {
                fit(tui, surface);
                Redraw::Full
            }
            Input::Closed => {
                tracing::info!("input closed");
                break;
            }
        };
        owed = stronger(owed, redraw);

        if tui.app.should_quit() || keys.pending() {
            continue;
        }
        paint(surface, &tui.app, owed)?;
        owed = Redraw::None;
    }

    tui.app.phase = Phase::Terminating;
    Ok(())
}

/// Full-screen session. The terminal is restored exactly once, whether
/// the loop returns, fails or unwinds.
pub fn run_interactive(tui: &mut Tui, tick: Duration) -> Result<(), ConsoleError> {
    install_panic_hook();
    let mut guard = ModeGuard::enter(CrosstermMode)?;

    let result = CrosstermSurface::new()
        .and_then(|mut surface| run_loop(tui, &mut surface, &mut CrosstermKeys, tick));

    let restored = guard.restore();
    result?;
    restored?;
    Ok(())
}

/// Degraded session over stdin/stdout lines.
pub fn run_line_mode(tui: &mut Tui, tick: Duration) -> Result<(), ConsoleError> {
    let stdin = io::stdin();
    let mut keys = LineKeys::new(stdin.lock());
    let mut surface = PlainSurface::new(io::stdout());
    run_loop(tui, &mut surface, &mut keys, tick)?;
    Ok(())
}

/// Run interactively when attached to a terminal, else in line mode.
pub fn run(tui: &mut Tui, tick: Duration) -> Result<(), ConsoleError> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        run_interactive(tui, tick)
    } else {
        tracing::info!("not attached to a terminal; using line mode");
        run_line_mode(tui, tick)
    }
}

// ============================================================================
// TESTS
// ============================================================================
