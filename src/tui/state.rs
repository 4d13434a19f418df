//! TUI state algebra: pure types, zero effects.
//!
//! The menu is fixed for the session; `NavigationState` says where the
//! cursor is; the `ViewStack` holds nested sub-views (command output,
//! option menus) entered from a top-level item. Shared data lives in
//! [`App`], which is what every render component reads.

use crate::types::{ContentBuffer, MenuItem, MenuSection, Profile, Tone};

// ============================================================================
// MENU
// ============================================================================

/// The ordered, non-empty sections of a session.
///
/// Sections without items are dropped on construction, so every section
/// index in a `Menu` has at least one valid item index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Menu {
    sections: Vec<MenuSection>,
}

impl Menu {
    pub fn new(sections: Vec<MenuSection>) -> Self {
        Menu {
            sections: sections.into_iter().filter(|s| !s.items.is_empty()).collect(),
        }
    }

    pub fn sections(&self) -> &[MenuSection] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Item counts per section, the shape navigation works against.
    pub fn sizes(&self) -> Vec<usize> {
        self.sections.iter().map(|s| s.items.len()).collect()
    }

    pub fn section(&self, index: usize) -> Option<&MenuSection> {
        self.sections.get(index)
    }

    pub fn item(&self, section: usize, item: usize) -> Option<&MenuItem> {
        self.sections.get(section)?.items.get(item)
    }

    /// Look up an item anywhere in the menu by id.
    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .find(|item| item.id == id)
    }

    pub fn items(&self) -> impl Iterator<Item = &MenuItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }
}

// ============================================================================
// NAVIGATION
// ============================================================================

/// Cursor position in the menu plus the content pane's scroll offset.
///
/// Mutated only by the controller through the transition functions in
/// `update`, which clamp on every step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigationState {
    pub section: usize,
    pub item: usize,
    /// Last item index used in each section, restored on section switch.
    pub remembered: Vec<Option<usize>>,
    pub scroll: usize,
}

impl NavigationState {
    pub fn new(section_count: usize) -> Self {
        NavigationState {
            section: 0,
            item: 0,
            remembered: vec![None; section_count],
            scroll: 0,
        }
    }

    pub fn position(&self) -> (usize, usize) {
        (self.section, self.item)
    }
}

/// Movement direction for item and section transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Text region of the content pane, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub rows: usize,
}

// ============================================================================
// SUB-VIEWS
// ============================================================================

/// Captured command output (or any long text) shown over the content pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputView {
    pub title: String,
    pub lines: Vec<String>,
    pub tone: Tone,
    pub scroll: usize,
}

/// A transient list of options with its own cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMenu {
    pub title: String,
    pub items: Vec<MenuItem>,
    pub cursor: usize,
}

impl OptionMenu {
    pub fn new(title: impl Into<String>, items: Vec<MenuItem>) -> Self {
        OptionMenu {
            title: title.into(),
            items,
            cursor: 0,
        }
    }

    pub fn selected(&self) -> Option<&MenuItem> {
        self.items.get(self.cursor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubView {
    Output(OutputView),
    Options(OptionMenu),
}

impl SubView {
    pub fn title(&self) -> &str {
        match self {
            SubView::Output(view) => &view.title,
            SubView::Options(menu) => &menu.title,
        }
    }
}

/// Nested interactive flows. Entering pushes, ESC pops; the controller
/// only ever looks at the top.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewStack {
    views: Vec<SubView>,
}

impl ViewStack {
    pub fn push(&mut self, view: SubView) {
        self.views.push(view);
    }

    pub fn pop(&mut self) -> Option<SubView> {
        self.views.pop()
    }

    pub fn top(&self) -> Option<&SubView> {
        self.views.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut SubView> {
        self.views.last_mut()
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubView> {
        self.views.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SubView> {
        self.views.iter_mut()
    }

    pub fn clear(&mut self) {
        self.views.clear();
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Lifecycle of a console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Init,
    Running,
    SubView,
    Terminating,
}

/// Footer connectivity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Unknown,
    Online,
    Offline,
}

/// Top-level TUI model read by the render components.
#[derive(Debug)]
pub struct App {
    pub profile: Profile,
    pub version: String,
    pub menu: Menu,
    pub nav: NavigationState,
    pub content: ContentBuffer,
    pub views: ViewStack,
    pub phase: Phase,
    /// Busy message painted while a blocking handler runs.
    pub status: Option<String>,
    /// Pre-formatted wall clock for the footer.
    pub clock: String,
    pub connectivity: Connectivity,
    /// Content pane size of the last full-screen layout; `None` in line mode.
    pub viewport: Option<Viewport>,
}

impl App {
    pub fn new(profile: Profile, version: impl Into<String>, menu: Menu) -> Self {
        let nav = NavigationState::new(menu.sections().len());
        App {
            profile,
            version: version.into(),
            menu,
            nav,
            content: ContentBuffer::default(),
            views: ViewStack::default(),
            phase: Phase::Init,
            status: None,
            clock: String::new(),
            connectivity: Connectivity::Unknown,
            viewport: None,
        }
    }

    /// Item under the sidebar cursor.
    pub fn current_item(&self) -> Option<&MenuItem> {
        self.menu.item(self.nav.section, self.nav.item)
    }

    pub fn current_section(&self) -> Option<&MenuSection> {
        self.menu.section(self.nav.section)
    }

    /// True while a sub-view (output or option menu) is on screen.
    pub fn viewing_subview(&self) -> bool {
        !self.views.is_empty()
    }

    pub fn should_quit(&self) -> bool {
        self.phase == Phase::Terminating
    }

    /// Re-derive Running/SubView from the view stack.
    pub fn sync_phase(&mut self) {
        if matches!(self.phase, Phase::Running | Phase::SubView) {
            self.phase = if self.views.is_empty() {
                Phase::Running
            } else {
                Phase::SubView
            };
        }
    }

    /// Title, lines and tone of whatever the content pane shows now.
    pub fn visible_text(&self) -> (String, Vec<String>, Tone) {
        match self.views.top() {
            Some(SubView::Output(view)) => (view.title.clone(), view.lines.clone(), view.tone),
            Some(SubView::Options(menu)) => {
                let lines = menu
                    .items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{} {}", quick_key(i), item.label))
                    .collect();
                (menu.title.clone(), lines, Tone::Normal)
            }
            None => (
                self.content.title.clone(),
                self.content.lines.clone(),
                self.content.tone,
            ),
        }
    }
}

/// Quick-select label for a list position: `0`..`9`, blank beyond.
pub fn quick_key(index: usize) -> String {
    if index < 10 {
        index.to_string()
    } else {
        " ".to_string()
    }
}

// ============================================================================
// ACTIONS
// ============================================================================

/// Semantic user action, decoupled from raw keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    PrevSection,
    NextSection,
    CycleSection,
    QuickSelect(u8),
    Activate,
    Back,
    ScrollUp,
    ScrollDown,
    /// `q`: leaves the console from the top level only.
    Quit,
    /// Ctrl+C: leaves from anywhere.
    ForceQuit,
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// How much of the screen a transition invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    None,
    /// Repaint; the terminal backend diffs against the previous frame.
    Partial,
    /// Clear the terminal first to erase dimming and output bleed.
    Full,
}

/// Result of a pure state transition, interpreted by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Redraw(Redraw),
    /// Dispatch the handler registered for this item.
    Activate(MenuItem),
    Quit,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, n: usize) -> MenuSection {
        MenuSection::new(id, id, "")
            .items((0..n).map(|i| MenuItem::new(format!("{id}:{i}"), format!("Item {i}"))))
    }

    #[test]
    fn menu_drops_empty_sections() {
        let menu = Menu::new(vec![section("a", 2), section("b", 0), section("c", 1)]);
        assert_eq!(menu.sizes(), vec![2, 1]);
        assert_eq!(menu.section(1).map(|s| s.id.as_str()), Some("c"));
    }

    #[test]
    fn menu_find_searches_all_sections() {
        let menu = Menu::new(vec![section("a", 2), section("c", 3)]);
        assert_eq!(menu.find("c:2").map(|i| i.label.as_str()), Some("Item 2"));
        assert!(menu.find("z:0").is_none());
    }

    #[test]
    fn app_starts_in_init_at_origin() {
        let app = App::new(Profile::Dev, "1.0", Menu::new(vec![section("a", 2)]));
        assert_eq!(app.phase, Phase::Init);
        assert_eq!(app.nav.position(), (0, 0));
        assert_eq!(app.nav.remembered, vec![None]);
        assert!(!app.viewing_subview());
        assert_eq!(app.current_item().map(|i| i.id.as_str()), Some("a:0"));
    }

    #[test]
    fn sync_phase_follows_view_stack() {
        let mut app = App::new(Profile::Dev, "1.0", Menu::new(vec![section("a", 1)]));
        app.sync_phase();
        assert_eq!(app.phase, Phase::Init, "Init is left only by the controller");

        app.phase = Phase::Running;
        app.views.push(SubView::Options(OptionMenu::new("svc", vec![])));
        app.sync_phase();
        assert_eq!(app.phase, Phase::SubView);

        app.views.pop();
        app.sync_phase();
        assert_eq!(app.phase, Phase::Running);
    }

    #[test]
    fn visible_text_prefers_top_view() {
        let mut app = App::new(Profile::Dev, "1.0", Menu::new(vec![section("a", 1)]));
        app.content.set("Base", "base line", Tone::Normal);
        assert_eq!(app.visible_text().0, "Base");

        app.views.push(SubView::Output(OutputView {
            title: "git log".into(),
            lines: vec!["abc123 init".into()],
            tone: Tone::Normal,
            scroll: 0,
        }));
        let (title, lines, _) = app.visible_text();
        assert_eq!(title, "git log");
        assert_eq!(lines, vec!["abc123 init"]);
    }

    #[test]
    fn quick_key_covers_first_ten() {
        assert_eq!(quick_key(0), "0");
        assert_eq!(quick_key(9), "9");
        assert_eq!(quick_key(10), " ");
    }
}
