//! Terminal lifecycle: raw mode in, guaranteed restoration out.
//!
//! [`ModeGuard`] enters the mode on construction and restores it exactly
//! once, on explicit `restore()` or on drop, whichever comes first. A
//! panic hook covers panics that escape the controller.

use std::io::{self, Write};

use crossterm::cursor;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};

/// Something that can switch the terminal into TUI mode and back.
pub trait TerminalMode {
    fn enter(&mut self) -> io::Result<()>;
    fn restore(&mut self) -> io::Result<()>;
}

/// Raw mode, alternate screen and hidden cursor via crossterm.
#[derive(Debug, Default)]
pub struct CrosstermMode;

impl TerminalMode for CrosstermMode {
    fn enter(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(err) = execute!(out, EnterAlternateScreen, cursor::Hide) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        restore_terminal()
    }
}

/// Undo everything [`CrosstermMode::enter`] did.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    let mut out = io::stdout();
    execute!(out, cursor::Show, LeaveAlternateScreen)?;
    out.flush()
}

/// Scoped acquisition of a terminal mode.
pub struct ModeGuard<M: TerminalMode> {
    mode: M,
    active: bool,
}

impl<M: TerminalMode> ModeGuard<M> {
    pub fn enter(mut mode: M) -> io::Result<Self> {
        mode.enter()?;
        Ok(ModeGuard { mode, active: true })
    }

    /// Restore now. Later calls, including the one from drop, do nothing.
    pub fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.mode.restore()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn mode(&self) -> &M {
        &self.mode
    }
}

impl<M: TerminalMode> Drop for ModeGuard<M> {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(error = %err, "failed to restore terminal mode");
        }
    }
}

/// Install a panic hook that restores the terminal before the panic report.
///
/// Handler panics never reach this hook: dispatch swaps in a silent hook
/// while a handler runs.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Counting {
        entered: Rc<Cell<usize>>,
        restored: Rc<Cell<usize>>,
    }

    impl TerminalMode for Counting {
        fn enter(&mut self) -> io::Result<()> {
            self.entered.set(self.entered.get() + 1);
            Ok(())
        }

        fn restore(&mut self) -> io::Result<()> {
            self.restored.set(self.restored.get() + 1);
            Ok(())
        }
    }

    struct Refusing;

    impl TerminalMode for Refusing {
        fn enter(&mut self) -> io::Result<()> {
            Err(io::Error::other("not a tty"))
        }

        fn restore(&mut self) -> io::Result<()> {
            panic!("restore must not run when enter failed")
        }
    }

    #[test]
    fn drop_restores_once() {
        let mode = Counting::default();
        {
            let guard = ModeGuard::enter(mode.clone()).unwrap();
            assert!(guard.is_active());
        }
        assert_eq!(mode.entered.get(), 1);
        assert_eq!(mode.restored.get(), 1);
    }

    #[test]
    fn explicit_restore_then_drop_restores_once() {
        let mode = Counting::default();
        let mut guard = ModeGuard::enter(mode.clone()).unwrap();
        guard.restore().unwrap();
        guard.restore().unwrap();
        assert!(!guard.is_active());
        drop(guard);
        assert_eq!(mode.restored.get(), 1);
    }

    #[test]
    fn failed_enter_yields_no_guard() {
        assert!(ModeGuard::enter(Refusing).is_err());
    }
}
