//! In-flight indicators, one per action kind.
//!
//! A flag is raised by [`InFlight::acquire`] and lowered when the returned
//! guard drops, whichever way the attempt ends.

use super::OperationKind;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    counts: Rc<RefCell<HashMap<OperationKind, usize>>>,
}

impl InFlight {
    pub fn new() -> Self { Self::default() }

    pub fn acquire(&self, kind: OperationKind) -> BusyGuard {
        *self.counts.borrow_mut().entry(kind).or_insert(0) += 1;
        BusyGuard { flags: self.clone(), kind }
    }

    pub fn is_busy(&self, kind: OperationKind) -> bool {
        self.counts.borrow().get(&kind).copied().unwrap_or(0) > 0
    }

    pub fn any(&self) -> bool {
        self.counts.borrow().values().any(|n| *n > 0)
    }
}

#[must_use = "the flag is lowered as soon as the guard is dropped"]
pub struct BusyGuard {
    flags: InFlight,
    kind: OperationKind,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut counts = self.flags.counts.borrow_mut();
        if let Some(n) = counts.get_mut(&self.kind) {
            *n = n.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_on_every_exit() {
        let flags = InFlight::new();
        let attempt = |fail: bool| -> Result<(), ()> {
            let _busy = flags.acquire(OperationKind::Deposit);
            assert!(flags.is_busy(OperationKind::Deposit));
            if fail {
                return Err(());
            }
            Ok(())
        };
        assert!(attempt(true).is_err());
        assert!(!flags.is_busy(OperationKind::Deposit));
        assert!(attempt(false).is_ok());
        assert!(!flags.any());
    }

    #[test]
    fn overlapping_attempts_count() {
        let flags = InFlight::new();
        let a = flags.acquire(OperationKind::Transfer);
        let b = flags.acquire(OperationKind::Transfer);
        drop(a);
        assert!(flags.is_busy(OperationKind::Transfer));
        assert!(!flags.is_busy(OperationKind::Withdraw));
        drop(b);
        assert!(!flags.is_busy(OperationKind::Transfer));
    }
}
