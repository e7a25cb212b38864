use std::io;

use tracing::warn;

/// Switches a terminal between its normal mode and raw single-key input.
pub trait TerminalMode {
    fn enable_raw(&mut self) -> io::Result<()>;
    /// Put back whatever mode was active before `enable_raw`.
    fn restore(&mut self) -> io::Result<()>;
}

/// The process' controlling terminal.
#[derive(Debug, Default)]
pub struct Crossterm(());

impl TerminalMode for Crossterm {
    fn enable_raw(&mut self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn restore(&mut self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }
}

/// Keeps the terminal in raw mode for as long as it lives.
///
/// Restores on drop, including during unwinding.
#[derive(Debug)]
pub struct RawModeGuard<T: TerminalMode> {
    terminal: T,
}

impl<T: TerminalMode> RawModeGuard<T> {
    pub fn enter(mut terminal: T) -> io::Result<Self> {
        terminal.enable_raw()?;
        Ok(Self { terminal })
    }
}

impl<T: TerminalMode> Drop for RawModeGuard<T> {
    fn drop(&mut self) {
        if let Err(err) = self.terminal.restore() {
            warn!(%err, "failed to restore terminal mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        panic::{catch_unwind, AssertUnwindSafe},
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Cooked,
        Raw,
    }

    #[derive(Clone)]
    struct FakeTerminal {
        mode: Arc<Mutex<Mode>>,
        restores: Arc<Mutex<usize>>,
        refuse_raw: bool,
    }

    impl FakeTerminal {
        fn new() -> Self {
            Self {
                mode: Arc::new(Mutex::new(Mode::Cooked)),
                restores: Arc::new(Mutex::new(0)),
                refuse_raw: false,
            }
        }

        fn mode(&self) -> Mode {
            *self.mode.lock().unwrap()
        }
    }

    impl TerminalMode for FakeTerminal {
        fn enable_raw(&mut self) -> io::Result<()> {
            if self.refuse_raw {
                return Err(io::Error::new(io::ErrorKind::Unsupported, "not a tty"));
            }
            *self.mode.lock().unwrap() = Mode::Raw;
            Ok(())
        }

        fn restore(&mut self) -> io::Result<()> {
            *self.mode.lock().unwrap() = Mode::Cooked;
            *self.restores.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_raw_while_guard_lives() {
        let terminal = FakeTerminal::new();
        let before = terminal.mode();

        let guard = RawModeGuard::enter(terminal.clone()).unwrap();
        assert_eq!(terminal.mode(), Mode::Raw);
        drop(guard);

        assert_eq!(terminal.mode(), before);
        assert_eq!(*terminal.restores.lock().unwrap(), 1);
    }

    #[test]
    fn test_restored_on_panic() {
        let terminal = FakeTerminal::new();

        let res = catch_unwind(AssertUnwindSafe(|| {
            let _guard = RawModeGuard::enter(terminal.clone()).unwrap();
            panic!("boom");
        }));

        assert!(res.is_err());
        assert_eq!(terminal.mode(), Mode::Cooked);
    }

    #[test]
    fn test_failed_enable_does_not_restore() {
        let mut terminal = FakeTerminal::new();
        terminal.refuse_raw = true;

        assert!(RawModeGuard::enter(terminal.clone()).is_err());
        assert_eq!(terminal.mode(), Mode::Cooked);
        assert_eq!(*terminal.restores.lock().unwrap(), 0);
    }
}
