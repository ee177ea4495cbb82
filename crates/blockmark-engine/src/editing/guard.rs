use std::cell::Cell;
use std::rc::Rc;

/// Shared flag marking a conversion in flight.
///
/// Clones observe the same flag. While it is set, [`Document::repair`]
/// does nothing, because a conversion transiently empties a block and that
/// must not be mistaken for the user clearing the document.
///
/// [`Document::repair`]: crate::models::Document::repair
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    active: Rc<Cell<bool>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Set the flag, returning a token that clears it when dropped.
    /// Returns `None` if the flag is already set.
    pub fn enter(&self) -> Option<GuardToken> {
        if self.active.replace(true) {
            return None;
        }
        Some(GuardToken {
            active: Rc::clone(&self.active),
        })
    }
}

/// Clears its guard on drop, whichever way the guarded scope exits.
#[derive(Debug)]
pub struct GuardToken {
    active: Rc<Cell<bool>>,
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_clears_flag_on_drop() {
        let guard = ReentrancyGuard::new();
        let observer = guard.clone();

        let token = guard.enter();
        assert!(token.is_some());
        assert!(observer.is_active());

        drop(token);
        assert!(!observer.is_active());
    }

    #[test]
    fn nested_enter_is_refused() {
        let guard = ReentrancyGuard::new();
        let _outer = guard.enter().unwrap();

        assert!(guard.enter().is_none());
        assert!(guard.is_active());
    }

    #[test]
    fn flag_clears_when_scope_fails() {
        let guard = ReentrancyGuard::new();

        let attempt = |g: &ReentrancyGuard| -> Result<(), &'static str> {
            let _token = g.enter().ok_or("busy")?;
            Err("transformation failed")
        };

        assert_eq!(attempt(&guard), Err("transformation failed"));
        assert!(!guard.is_active());
        assert_eq!(attempt(&guard), Err("transformation failed"));
    }
}
