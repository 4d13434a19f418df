//! Action dispatch: item id → handler.
//!
//! Handlers receive an explicit [`Session`] (the only way to touch the
//! content pane, the view stack and the subprocess runner) plus the item
//! that was activated. They run synchronously on the main loop.

use std::collections::HashMap;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::HandlerError;
use crate::types::{Content, ContentBuffer, MenuItem, Tone};

use super::state::{OptionMenu, OutputView, SubView, ViewStack};

/// What a handler asks the controller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

pub type Handler = Box<dyn FnMut(&mut Session<'_>, &MenuItem) -> Result<Control, HandlerError>>;

/// Outcome of a dispatch attempt.
#[derive(Debug)]
pub enum Dispatch {
    /// Nothing registered under the item id.
    Unknown,
    Handled(Result<Control, HandlerError>),
    /// The handler panicked; carries the panic message.
    Panicked(String),
}

// ============================================================================
// SESSION
// ============================================================================

/// Everything a handler may act on during one dispatch.
pub struct Session<'a> {
    content: &'a mut ContentBuffer,
    views: &'a mut ViewStack,
    runner: &'a dyn CommandRunner,
    working_dir: &'a Path,
    pending: Vec<(String, Handler)>,
}

impl<'a> Session<'a> {
    pub fn new(
        content: &'a mut ContentBuffer,
        views: &'a mut ViewStack,
        runner: &'a dyn CommandRunner,
        working_dir: &'a Path,
    ) -> Self {
        Session {
            content,
            views,
            runner,
            working_dir,
            pending: Vec::new(),
        }
    }

    /// Directory external commands run in.
    pub fn working_dir(&self) -> &Path {
        self.working_dir
    }

    /// Replace the content pane.
    pub fn set_content(&mut self, title: impl Into<String>, content: impl Into<Content>) {
        self.content.set(title, content, Tone::Normal);
    }

    pub fn set_success(&mut self, title: impl Into<String>, content: impl Into<Content>) {
        self.content.set(title, content, Tone::Success);
    }

    pub fn set_error(&mut self, title: impl Into<String>, content: impl Into<Content>) {
        self.content.set(title, content, Tone::Error);
    }

    pub fn content(&self) -> &ContentBuffer {
        self.content
    }

    /// Push an output sub-view; ESC returns to whatever was below.
    pub fn show_output(&mut self, title: impl Into<String>, content: impl Into<Content>, tone: Tone) {
        self.views.push(SubView::Output(OutputView {
            title: title.into(),
            lines: content.into().into_lines(),
            tone,
            scroll: 0,
        }));
    }

    /// Push a nested option menu.
    pub fn push_menu(&mut self, menu: OptionMenu) {
        self.views.push(SubView::Options(menu));
    }

    pub fn views(&self) -> &ViewStack {
        self.views
    }

    /// Register a handler, effective once the current dispatch returns.
    pub fn register<F>(&mut self, id: impl Into<String>, handler: F)
    where
        F: FnMut(&mut Session<'_>, &MenuItem) -> Result<Control, HandlerError> + 'static,
    {
        self.pending.push((id.into(), Box::new(handler)));
    }

    pub fn run_command(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.runner.run(spec, self.working_dir)
    }

    /// Run a command and put its output in the content pane.
    ///
    /// Spawn failures and non-zero exits become error-toned text.
    pub fn show_command(&mut self, title: impl Into<String>, spec: &CommandSpec) {
        let title = title.into();
        let (lines, tone) = self.command_display(spec);
        self.content.set(title, lines, tone);
    }

    /// Like [`Session::show_command`], but as an output sub-view.
    pub fn show_command_view(&mut self, title: impl Into<String>, spec: &CommandSpec) {
        let (lines, tone) = self.command_display(spec);
        self.show_output(title, lines, tone);
    }

    fn command_display(&self, spec: &CommandSpec) -> (Vec<String>, Tone) {
        match self.run_command(spec) {
            Ok(output) => {
                let (mut lines, tone) = output.into_display();
                lines.insert(0, format!("$ {}", spec.display()));
                lines.insert(1, String::new());
                (lines, tone)
            }
            Err(err) => {
                tracing::warn!(command = %spec.display(), error = %err, "command failed to start");
                (
                    vec![
                        format!("$ {}", spec.display()),
                        String::new(),
                        format!("✗ failed to start: {}", err),
                    ],
                    Tone::Error,
                )
            }
        }
    }

    /// Handlers registered during this dispatch.
    pub fn into_pending(self) -> Vec<(String, Handler)> {
        self.pending
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Flat mapping from item id to handler.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Handler>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a handler, replacing any previous one for the id.
    pub fn register<F>(&mut self, id: impl Into<String>, handler: F)
    where
        F: FnMut(&mut Session<'_>, &MenuItem) -> Result<Control, HandlerError> + 'static,
    {
        self.handlers.insert(id.into(), Box::new(handler));
    }

    pub fn register_boxed(&mut self, id: impl Into<String>, handler: Handler) {
        self.handlers.insert(id.into(), handler);
    }

    /// Merge registrations queued by a handler.
    pub fn absorb(&mut self, pending: Vec<(String, Handler)>) {
        for (id, handler) in pending {
            self.handlers.insert(id, handler);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Invoke the handler for `item`.
    ///
    /// A panicking handler is contained here so it survives for the next
    /// activation; the panic is reported as [`Dispatch::Panicked`].
    pub fn dispatch(&mut self, item: &MenuItem, session: &mut Session<'_>) -> Dispatch {
        let Some(mut handler) = self.handlers.remove(&item.id) else {
            return Dispatch::Unknown;
        };

        let outcome = call_contained(&mut handler, session, item);
        self.handlers.entry(item.id.clone()).or_insert(handler);

        match outcome {
            Ok(result) => Dispatch::Handled(result),
            Err(message) => Dispatch::Panicked(message),
        }
    }
}

/// Run a handler with panics caught and the default panic report muted.
fn call_contained(
    handler: &mut Handler,
    session: &mut Session<'_>,
    item: &MenuItem,
) -> Result<Result<Control, HandlerError>, String> {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(session, item)));
    panic::set_hook(previous);
    outcome.map_err(|payload| {
        payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string())
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct NoRunner;

    impl CommandRunner for NoRunner {
        fn run(&self, _spec: &CommandSpec, _dir: &Path) -> io::Result<CommandOutput> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such program"))
        }
    }

    struct Canned(CommandOutput);

    impl CommandRunner for Canned {
        fn run(&self, _spec: &CommandSpec, _dir: &Path) -> io::Result<CommandOutput> {
            Ok(self.0.clone())
        }
    }

    struct Fixture {
        content: ContentBuffer,
        views: ViewStack,
        dir: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                content: ContentBuffer::default(),
                views: ViewStack::default(),
                dir: PathBuf::from("."),
            }
        }

        fn session<'a>(&'a mut self, runner: &'a dyn CommandRunner) -> Session<'a> {
            Session::new(&mut self.content, &mut self.views, runner, &self.dir)
        }
    }

    #[test]
    fn dispatch_unknown_is_noop() {
        let mut registry = ActionRegistry::new();
        let mut fx = Fixture::new();
        let mut session = fx.session(&NoRunner);
        let outcome = registry.dispatch(&MenuItem::new("nope", "Nope"), &mut session);
        assert!(matches!(outcome, Dispatch::Unknown));
        drop(session);
        assert_eq!(fx.content, ContentBuffer::default());
    }

    #[test]
    fn dispatch_passes_item_and_returns_control() {
        let mut registry = ActionRegistry::new();
        registry.register("about", |session: &mut Session<'_>, item: &MenuItem| {
            session.set_content(item.label.clone(), "UNIBOS console");
            Ok(Control::Continue)
        });
        registry.register("quit", |_: &mut Session<'_>, _: &MenuItem| Ok(Control::Quit));

        let mut fx = Fixture::new();
        let mut session = fx.session(&NoRunner);
        let first = registry.dispatch(&MenuItem::new("about", "About"), &mut session);
        assert!(matches!(first, Dispatch::Handled(Ok(Control::Continue))));
        let second = registry.dispatch(&MenuItem::new("quit", "Quit"), &mut session);
        assert!(matches!(second, Dispatch::Handled(Ok(Control::Quit))));
        drop(session);
        assert_eq!(fx.content.title, "About");
    }

    #[test]
    fn panicking_handler_is_contained_and_kept() {
        let mut registry = ActionRegistry::new();
        registry.register("boom", |_: &mut Session<'_>, _: &MenuItem| -> Result<Control, HandlerError> {
            panic!("handler exploded")
        });

        let mut fx = Fixture::new();
        let mut session = fx.session(&NoRunner);
        let item = MenuItem::new("boom", "Boom");
        match registry.dispatch(&item, &mut session) {
            Dispatch::Panicked(msg) => assert_eq!(msg, "handler exploded"),
            other => panic!("Expected Panicked, got {:?}", other),
        }
        assert!(registry.contains("boom"));
    }

    #[test]
    fn registrations_from_handlers_apply_after_dispatch() {
        let mut registry = ActionRegistry::new();
        registry.register("menu", |session: &mut Session<'_>, _: &MenuItem| {
            session.register("menu:child", |s: &mut Session<'_>, _: &MenuItem| {
                s.set_content("child", "ran");
                Ok(Control::Continue)
            });
            session.push_menu(OptionMenu::new("Menu", vec![MenuItem::new("menu:child", "Child")]));
            Ok(Control::Continue)
        });

        let mut fx = Fixture::new();
        let mut session = fx.session(&NoRunner);
        registry.dispatch(&MenuItem::new("menu", "Menu"), &mut session);
        assert!(!registry.contains("menu:child"));
        registry.absorb(session.into_pending());
        assert!(registry.contains("menu:child"));
        assert_eq!(fx.views.len(), 1);
        assert_eq!(registry.ids(), vec!["menu", "menu:child"]);
    }

    #[test]
    fn spawn_failure_becomes_error_text() {
        let mut fx = Fixture::new();
        let mut session = fx.session(&NoRunner);
        session.show_command("Git status", &CommandSpec::shell("git status"));
        drop(session);
        assert_eq!(fx.content.tone, Tone::Error);
        assert_eq!(fx.content.lines[0], "$ git status");
        assert!(fx.content.lines[2].contains("failed to start"));
    }

    #[test]
    fn mocked_stdout_list_or_text_gives_two_display_lines() {
        let variants = [
            Content::Lines(vec!["M src/lib.rs".into(), "?? notes.txt".into()]),
            Content::Text("M src/lib.rs\n?? notes.txt".into()),
        ];
        for stdout in variants {
            let runner = Canned(CommandOutput {
                status: Some(0),
                stdout,
                stderr: Content::Text(String::new()),
            });
            let mut fx = Fixture::new();
            let mut session = fx.session(&runner);
            let output = session.run_command(&CommandSpec::shell("git status --short")).unwrap();
            let (lines, tone) = output.into_display();
            session.set_content("Git status", lines);
            drop(session);
            assert_eq!(tone, Tone::Normal);
            assert_eq!(fx.content.lines, vec!["M src/lib.rs", "?? notes.txt"]);
        }
    }

    #[test]
    fn show_command_view_pushes_output() {
        let runner = Canned(CommandOutput {
            status: Some(1),
            stdout: Content::Text(String::new()),
            stderr: Content::Text("Unit nginx.service not found.".into()),
        });
        let mut fx = Fixture::new();
        let mut session = fx.session(&runner);
        session.show_command_view("nginx status", &CommandSpec::new("systemctl", ["status", "nginx"]));
        drop(session);
        match fx.views.top() {
            Some(SubView::Output(view)) => {
                assert_eq!(view.tone, Tone::Error);
                assert!(view.lines.iter().any(|l| l.contains("not found")));
            }
            other => panic!("Expected output view, got {:?}", other),
        }
    }
}
