//! Pure state transitions: (App, Action) → Transition.
//!
//! The core logic of the TUI, testable without a terminal. Navigation
//! functions clamp on every step, so no sequence of actions can leave the
//! cursor outside the current section.
//!
//! Boundary policy: item and section movement both wrap. DOWN on the last
//! item of the last section lands on the first item of the first section;
//! LEFT on the first section lands on the last.

use crate::types::Tone;

use super::input::Key;
use super::state::{Action, App, Direction, NavigationState, Redraw, SubView, Transition, Viewport};
use super::view::scroll_limit;

/// Lines moved by PageUp / PageDown.
pub const PAGE: usize = 10;

// ============================================================================
// KEY MAPPING
// ============================================================================

/// Map a logical key to a semantic action. `None` for unbound keys.
pub fn map_key(key: Key) -> Option<Action> {
    match key {
        Key::Up | Key::Char('k') => Some(Action::MoveUp),
        Key::Down | Key::Char('j') => Some(Action::MoveDown),
        Key::Left | Key::Char('h') => Some(Action::PrevSection),
        Key::Right | Key::Char('l') => Some(Action::NextSection),
        Key::Tab => Some(Action::CycleSection),
        Key::Enter => Some(Action::Activate),
        Key::Esc => Some(Action::Back),
        Key::PageUp => Some(Action::ScrollUp),
        Key::PageDown => Some(Action::ScrollDown),
        Key::CtrlC => Some(Action::ForceQuit),
        Key::Char('q') | Key::Char('Q') => Some(Action::Quit),
        Key::Char(c @ '0'..='9') => Some(Action::QuickSelect(c as u8 - b'0')),
        Key::Char(_) => None,
    }
}

// ============================================================================
// NAVIGATION
// ============================================================================

/// Move the cursor one item, crossing into the adjacent section at a
/// boundary (first item when moving forward, last item when moving back).
pub fn move_item(nav: &mut NavigationState, sizes: &[usize], direction: Direction) {
    if sizes.is_empty() {
        *nav = NavigationState::default();
        return;
    }
    clamp(nav, sizes);

    let len = sizes[nav.section];
    match direction {
        Direction::Forward if nav.item + 1 < len => nav.item += 1,
        Direction::Backward if nav.item > 0 => nav.item -= 1,
        Direction::Forward => {
            remember(nav, sizes.len());
            nav.section = wrap(nav.section, sizes.len(), direction);
            nav.item = 0;
        }
        Direction::Backward => {
            remember(nav, sizes.len());
            nav.section = wrap(nav.section, sizes.len(), direction);
            nav.item = sizes[nav.section].saturating_sub(1);
        }
    }
    clamp(nav, sizes);
}

/// Switch to the adjacent section, wrapping at the ends. The target's
/// remembered position is restored if it has one, else item 0.
pub fn switch_section(nav: &mut NavigationState, sizes: &[usize], direction: Direction) {
    if sizes.is_empty() {
        *nav = NavigationState::default();
        return;
    }
    clamp(nav, sizes);
    remember(nav, sizes.len());

    nav.section = wrap(nav.section, sizes.len(), direction);
    nav.item = nav
        .remembered
        .get(nav.section)
        .copied()
        .flatten()
        .unwrap_or(0);
    clamp(nav, sizes);
}

/// TAB: next section, wrapping to the first.
pub fn cycle_section(nav: &mut NavigationState, sizes: &[usize]) {
    switch_section(nav, sizes, Direction::Forward);
}

/// Jump to item `digit` of the current section. Out of range is a no-op.
pub fn quick_select(nav: &mut NavigationState, sizes: &[usize], digit: u8) {
    let Some(&len) = sizes.get(nav.section) else {
        return;
    };
    let target = digit as usize;
    if target < len {
        nav.item = target;
    }
}

/// Force the cursor back inside the menu.
pub fn clamp(nav: &mut NavigationState, sizes: &[usize]) {
    if sizes.is_empty() {
        nav.section = 0;
        nav.item = 0;
        return;
    }
    if nav.remembered.len() != sizes.len() {
        nav.remembered.resize(sizes.len(), None);
    }
    nav.section = nav.section.min(sizes.len() - 1);
    nav.item = nav.item.min(sizes[nav.section].saturating_sub(1));
}

fn remember(nav: &mut NavigationState, section_count: usize) {
    if nav.remembered.len() != section_count {
        nav.remembered.resize(section_count, None);
    }
    nav.remembered[nav.section] = Some(nav.item);
}

fn wrap(index: usize, count: usize, direction: Direction) -> usize {
    match direction {
        Direction::Forward => (index + 1) % count,
        Direction::Backward => (index + count - 1) % count,
    }
}

// ============================================================================
// UPDATE
// ============================================================================

/// Apply an action to the app. Sub-views capture input while present.
pub fn update(app: &mut App, action: Action) -> Transition {
    if action == Action::ForceQuit {
        return Transition::Quit;
    }

    if app.viewing_subview() {
        return update_subview(app, action);
    }

    let sizes = app.menu.sizes();
    match action {
        Action::MoveUp => {
            move_item(&mut app.nav, &sizes, Direction::Backward);
            Transition::Redraw(Redraw::Partial)
        }
        Action::MoveDown => {
            move_item(&mut app.nav, &sizes, Direction::Forward);
            Transition::Redraw(Redraw::Partial)
        }
        Action::PrevSection => {
            switch_section(&mut app.nav, &sizes, Direction::Backward);
            Transition::Redraw(Redraw::Partial)
        }
        Action::NextSection => {
            switch_section(&mut app.nav, &sizes, Direction::Forward);
            Transition::Redraw(Redraw::Partial)
        }
        Action::CycleSection => {
            cycle_section(&mut app.nav, &sizes);
            Transition::Redraw(Redraw::Partial)
        }
        Action::QuickSelect(digit) => {
            quick_select(&mut app.nav, &sizes, digit);
            Transition::Redraw(Redraw::Partial)
        }
        Action::ScrollUp => {
            app.nav.scroll = app.nav.scroll.saturating_sub(PAGE);
            Transition::Redraw(Redraw::Partial)
        }
        Action::ScrollDown => {
            let limit = scroll_limit(&app.content.lines, app.viewport);
            app.nav.scroll = scroll_by(app.nav.scroll, PAGE, limit);
            Transition::Redraw(Redraw::Partial)
        }
        Action::Activate => activate_current(app),
        Action::Back => Transition::Redraw(Redraw::None),
        Action::Quit | Action::ForceQuit => Transition::Quit,
    }
}

fn activate_current(app: &mut App) -> Transition {
    let Some(item) = app.current_item().cloned() else {
        return Transition::Redraw(Redraw::None);
    };
    if !item.enabled {
        app.content.set(
            item.label.clone(),
            format!("{} is disabled.", item.label),
            Tone::Normal,
        );
        app.nav.scroll = 0;
        return Transition::Redraw(Redraw::Partial);
    }
    Transition::Activate(item)
}

/// Input captured by the top sub-view.
fn update_subview(app: &mut App, action: Action) -> Transition {
    if action == Action::Back {
        app.views.pop();
        app.sync_phase();
        return if app.views.is_empty() {
            Transition::Redraw(Redraw::Full)
        } else {
            Transition::Redraw(Redraw::Partial)
        };
    }

    let viewport = app.viewport;
    match app.views.top_mut() {
        Some(SubView::Output(view)) => {
            let limit = scroll_limit(&view.lines, viewport);
            match action {
                Action::MoveUp => view.scroll = view.scroll.saturating_sub(1),
                Action::MoveDown => view.scroll = scroll_by(view.scroll, 1, limit),
                Action::ScrollUp => view.scroll = view.scroll.saturating_sub(PAGE),
                Action::ScrollDown => view.scroll = scroll_by(view.scroll, PAGE, limit),
                _ => return Transition::Redraw(Redraw::None),
            }
            Transition::Redraw(Redraw::Partial)
        }
        Some(SubView::Options(menu)) => {
            let len = menu.items.len();
            match action {
                Action::MoveUp => menu.cursor = menu.cursor.saturating_sub(1),
                Action::MoveDown => {
                    menu.cursor = (menu.cursor + 1).min(len.saturating_sub(1));
                }
                Action::QuickSelect(digit) if (digit as usize) < len => {
                    menu.cursor = digit as usize;
                }
                Action::Activate => {
                    return match menu.selected() {
                        Some(item) if item.enabled => Transition::Activate(item.clone()),
                        _ => Transition::Redraw(Redraw::None),
                    };
                }
                _ => return Transition::Redraw(Redraw::None),
            }
            Transition::Redraw(Redraw::Partial)
        }
        None => Transition::Redraw(Redraw::None),
    }
}

/// Advance a scroll offset, never past `limit`.
fn scroll_by(scroll: usize, delta: usize, limit: usize) -> usize {
    (scroll + delta).min(limit)
}

/// Record a new content pane size and pull every scroll offset back
/// within what that size can show.
pub fn resize(app: &mut App, viewport: Option<Viewport>) {
    app.viewport = viewport;
    app.nav.scroll = app.nav.scroll.min(scroll_limit(&app.content.lines, viewport));
    for view in app.views.iter_mut() {
        if let SubView::Output(output) = view {
            output.scroll = output.scroll.min(scroll_limit(&output.lines, viewport));
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::state::{Menu, OptionMenu, OutputView, Phase};
    use crate::types::{MenuItem, MenuSection, Profile};

    fn app_with_sizes(sizes: &[usize]) -> App {
        let sections = sizes
            .iter()
            .enumerate()
            .map(|(s, &n)| {
                MenuSection::new(format!("s{s}"), format!("Section {s}"), "")
                    .items((0..n).map(|i| MenuItem::new(format!("s{s}:{i}"), format!("Item {i}"))))
            })
            .collect();
        let mut app = App::new(Profile::Dev, "test", Menu::new(sections));
        app.phase = Phase::Running;
        app
    }

    fn press(app: &mut App, keys: &[Key]) {
        for &key in keys {
            if let Some(action) = map_key(key) {
                update(app, action);
            }
        }
    }

    /// Small deterministic generator so the property tests stay
    /// reproducible without extra dependencies.
    fn lcg(seed: &mut u64) -> u64 {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        *seed >> 33
    }

    // -- key mapping --

    #[test]
    fn digits_map_to_quick_select() {
        for d in 0..=9u8 {
            assert_eq!(
                map_key(Key::Char((b'0' + d) as char)),
                Some(Action::QuickSelect(d))
            );
        }
    }

    #[test]
    fn arrows_and_specials_map() {
        assert_eq!(map_key(Key::Up), Some(Action::MoveUp));
        assert_eq!(map_key(Key::Left), Some(Action::PrevSection));
        assert_eq!(map_key(Key::Tab), Some(Action::CycleSection));
        assert_eq!(map_key(Key::Esc), Some(Action::Back));
        assert_eq!(map_key(Key::Char('q')), Some(Action::Quit));
        assert_eq!(map_key(Key::CtrlC), Some(Action::ForceQuit));
        assert_eq!(map_key(Key::Char('z')), None);
    }

    // -- navigation properties --

    #[test]
    fn up_down_sequences_stay_in_bounds() {
        let sizes = [2, 3, 1, 4];
        let mut seed = 7;
        for _ in 0..200 {
            let mut app = app_with_sizes(&sizes);
            for _ in 0..50 {
                let key = if lcg(&mut seed) % 2 == 0 { Key::Up } else { Key::Down };
                press(&mut app, &[key]);
                let (section, item) = app.nav.position();
                assert!(section < sizes.len());
                assert!(item < sizes[section], "item {item} out of section {section}");
            }
        }
    }

    #[test]
    fn section_switch_sequences_stay_in_bounds() {
        let sizes = [2, 3, 1];
        let keys = [Key::Left, Key::Right, Key::Tab, Key::Down, Key::Up];
        let mut seed = 42;
        for _ in 0..200 {
            let mut app = app_with_sizes(&sizes);
            for _ in 0..50 {
                let key = keys[(lcg(&mut seed) % keys.len() as u64) as usize];
                press(&mut app, &[key]);
                let (section, item) = app.nav.position();
                assert!(section < sizes.len());
                assert!(item < sizes[section]);
            }
        }
    }

    #[test]
    fn sections_wrap_in_both_directions() {
        let mut app = app_with_sizes(&[2, 3, 1]);
        press(&mut app, &[Key::Left]);
        assert_eq!(app.nav.section, 2);
        press(&mut app, &[Key::Right]);
        assert_eq!(app.nav.section, 0);
        press(&mut app, &[Key::Tab, Key::Tab, Key::Tab]);
        assert_eq!(app.nav.section, 0);
    }

    #[test]
    fn down_at_very_last_item_wraps_to_first() {
        let mut app = app_with_sizes(&[2, 3, 1]);
        app.nav.section = 2;
        app.nav.item = 0;
        press(&mut app, &[Key::Down]);
        assert_eq!(app.nav.position(), (0, 0));
    }

    #[test]
    fn up_at_very_first_item_wraps_to_last() {
        let mut app = app_with_sizes(&[2, 3, 4]);
        press(&mut app, &[Key::Up]);
        assert_eq!(app.nav.position(), (2, 3));
    }

    #[test]
    fn section_boundary_scenario() {
        // sizes [2, 3, 1]: DOWN, DOWN, RIGHT, UP ends at section 1, item 2
        let mut app = app_with_sizes(&[2, 3, 1]);
        press(&mut app, &[Key::Down, Key::Down, Key::Right, Key::Up]);
        assert_eq!(app.nav.position(), (1, 2));
    }

    #[test]
    fn switch_restores_remembered_position() {
        let mut app = app_with_sizes(&[3, 3]);
        press(&mut app, &[Key::Char('2'), Key::Right, Key::Char('1'), Key::Left]);
        assert_eq!(app.nav.position(), (0, 2));
        press(&mut app, &[Key::Right]);
        assert_eq!(app.nav.position(), (1, 1));
    }

    #[test]
    fn quick_select_in_range_jumps() {
        let mut app = app_with_sizes(&[4]);
        press(&mut app, &[Key::Char('3')]);
        assert_eq!(app.nav.item, 3);
        press(&mut app, &[Key::Char('0')]);
        assert_eq!(app.nav.item, 0);
    }

    #[test]
    fn quick_select_out_of_range_is_noop() {
        let mut app = app_with_sizes(&[3]);
        press(&mut app, &[Key::Char('1')]);
        let before = app.nav.clone();
        press(&mut app, &[Key::Char('5')]);
        assert_eq!(app.nav, before);
    }

    #[test]
    fn clamp_repairs_out_of_range_cursor() {
        let mut nav = NavigationState {
            section: 9,
            item: 9,
            remembered: vec![],
            scroll: 0,
        };
        clamp(&mut nav, &[2, 3]);
        assert_eq!(nav.position(), (1, 2));
        assert_eq!(nav.remembered.len(), 2);
    }

    #[test]
    fn remembered_index_is_clamped_on_restore() {
        let mut nav = NavigationState::new(2);
        nav.remembered[1] = Some(10);
        switch_section(&mut nav, &[2, 3], Direction::Forward);
        assert_eq!(nav.position(), (1, 2));
    }

    #[test]
    fn empty_menu_navigation_is_harmless() {
        let mut nav = NavigationState::default();
        move_item(&mut nav, &[], Direction::Forward);
        switch_section(&mut nav, &[], Direction::Backward);
        quick_select(&mut nav, &[], 3);
        assert_eq!(nav.position(), (0, 0));
    }

    // -- update --

    #[test]
    fn enter_activates_current_item() {
        let mut app = app_with_sizes(&[2]);
        press(&mut app, &[Key::Down]);
        match update(&mut app, Action::Activate) {
            Transition::Activate(item) => assert_eq!(item.id, "s0:1"),
            other => panic!("Expected Activate, got {:?}", other),
        }
    }

    #[test]
    fn disabled_item_reports_instead_of_activating() {
        let sections = vec![MenuSection::new("s", "S", "")
            .item(MenuItem::new("off", "Offline module").enabled(false))];
        let mut app = App::new(Profile::Dev, "t", Menu::new(sections));
        let t = update(&mut app, Action::Activate);
        assert_eq!(t, Transition::Redraw(Redraw::Partial));
        assert!(app.content.lines[0].contains("disabled"));
    }

    #[test]
    fn esc_at_top_level_is_noop() {
        let mut app = app_with_sizes(&[2]);
        let before = app.nav.clone();
        assert_eq!(update(&mut app, Action::Back), Transition::Redraw(Redraw::None));
        assert_eq!(app.nav, before);
    }

    #[test]
    fn q_quits_at_top_level_only() {
        let mut app = app_with_sizes(&[2]);
        assert_eq!(update(&mut app, Action::Quit), Transition::Quit);

        app.views.push(SubView::Options(OptionMenu::new("svc", vec![MenuItem::new("a", "A")])));
        assert_eq!(update(&mut app, Action::Quit), Transition::Redraw(Redraw::None));
        assert_eq!(update(&mut app, Action::ForceQuit), Transition::Quit);
    }

    #[test]
    fn subview_captures_navigation() {
        let mut app = app_with_sizes(&[3]);
        app.views.push(SubView::Options(OptionMenu::new(
            "Service",
            vec![
                MenuItem::new("svc:start", "Start"),
                MenuItem::new("svc:stop", "Stop"),
            ],
        )));
        app.sync_phase();

        press(&mut app, &[Key::Down, Key::Down, Key::Down]);
        assert_eq!(app.nav.position(), (0, 0), "sidebar cursor untouched");
        match app.views.top() {
            Some(SubView::Options(menu)) => assert_eq!(menu.cursor, 1),
            other => panic!("Expected options, got {:?}", other),
        }

        match update(&mut app, Action::Activate) {
            Transition::Activate(item) => assert_eq!(item.id, "svc:stop"),
            other => panic!("Expected Activate, got {:?}", other),
        }
    }

    #[test]
    fn esc_pops_one_level_and_full_redraws_at_the_bottom() {
        let mut app = app_with_sizes(&[1]);
        app.views.push(SubView::Options(OptionMenu::new("menu", vec![])));
        app.views.push(SubView::Output(OutputView {
            title: "out".into(),
            lines: vec![],
            tone: Tone::Normal,
            scroll: 0,
        }));
        app.sync_phase();
        assert_eq!(app.phase, Phase::SubView);

        assert_eq!(update(&mut app, Action::Back), Transition::Redraw(Redraw::Partial));
        assert_eq!(app.views.len(), 1);
        assert_eq!(update(&mut app, Action::Back), Transition::Redraw(Redraw::Full));
        assert!(app.views.is_empty());
        assert_eq!(app.phase, Phase::Running);
    }

    #[test]
    fn output_scroll_is_bounded() {
        let mut app = app_with_sizes(&[1]);
        app.views.push(SubView::Output(OutputView {
            title: "log".into(),
            lines: (0..15).map(|i| i.to_string()).collect(),
            tone: Tone::Normal,
            scroll: 0,
        }));
        press(&mut app, &[Key::PageDown, Key::PageDown, Key::Down]);
        match app.views.top() {
            Some(SubView::Output(view)) => assert_eq!(view.scroll, 14),
            other => panic!("Expected output, got {:?}", other),
        }
        press(&mut app, &[Key::PageUp, Key::PageUp]);
        match app.views.top() {
            Some(SubView::Output(view)) => assert_eq!(view.scroll, 0),
            other => panic!("Expected output, got {:?}", other),
        }
    }

    #[test]
    fn scroll_reaches_every_wrapped_row_of_a_long_line() {
        let mut app = app_with_sizes(&[1]);
        app.viewport = Some(Viewport { width: 40, rows: 5 });
        app.content.set("log", "x".repeat(2000), Tone::Normal);

        press(&mut app, &[Key::PageDown; 10]);
        assert_eq!(app.nav.scroll, 45);

        press(&mut app, &[Key::PageUp]);
        assert_eq!(app.nav.scroll, 35);
    }

    #[test]
    fn output_view_scrolls_over_wrapped_rows() {
        let mut app = app_with_sizes(&[1]);
        app.viewport = Some(Viewport { width: 40, rows: 5 });
        app.views.push(SubView::Output(OutputView {
            title: "journal".into(),
            lines: vec!["y".repeat(400)],
            tone: Tone::Normal,
            scroll: 0,
        }));
        press(&mut app, &[Key::PageDown, Key::Down]);
        match app.views.top() {
            Some(SubView::Output(view)) => assert_eq!(view.scroll, 5),
            other => panic!("Expected output, got {:?}", other),
        }
    }

    #[test]
    fn resize_pulls_scroll_back_into_range() {
        let mut app = app_with_sizes(&[1]);
        app.viewport = Some(Viewport { width: 40, rows: 5 });
        app.content.set("log", "x".repeat(2000), Tone::Normal);
        press(&mut app, &[Key::PageDown; 10]);

        resize(&mut app, Some(Viewport { width: 100, rows: 10 }));
        assert_eq!(app.nav.scroll, 10);

        press(&mut app, &[Key::PageUp]);
        assert_eq!(app.nav.scroll, 0);
    }
}
