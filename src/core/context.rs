//! The active-target context: the instruction stream emission writes to by
//! default.
//!
//! Operator methods everywhere read this slot implicitly rather than
//! receiving a stream argument, so any routine that needs a different target
//! for a sub-scope must save the previous value and restore it on every exit
//! path. [`ActiveStreamGuard`] packages that discipline: it installs a stream
//! and restores the previous one when dropped, including during unwinding.
//! Code generation is single-threaded by design; the slot is thread-local.

use std::cell::RefCell;

use super::error::{CodegenError, CodegenResult};
use super::stream::StreamHandle;

thread_local! {
    static ACTIVE_STREAM: RefCell<Option<StreamHandle>> = const { RefCell::new(None) };
}

/// Install `stream` as the active target, returning the previous one.
pub fn set_active_stream(stream: Option<StreamHandle>) -> Option<StreamHandle> {
    log::debug!(
        "active stream {}",
        if stream.is_some() { "installed" } else { "cleared" }
    );
    ACTIVE_STREAM.with(|slot| slot.replace(stream))
}

/// The currently active instruction stream.
///
/// Errors with `ConfigurationMissing` when no stream has been installed.
pub fn active_stream() -> CodegenResult<StreamHandle> {
    ACTIVE_STREAM
        .with(|slot| slot.borrow().clone())
        .ok_or(CodegenError::ConfigurationMissing {
            what: "active instruction stream",
        })
}

/// RAII guard that makes a stream active for a scope.
///
/// The previous active stream is restored on drop, whichever way the scope
/// exits.
pub struct ActiveStreamGuard {
    previous: Option<StreamHandle>,
}

impl ActiveStreamGuard {
    pub fn install(stream: StreamHandle) -> Self {
        ActiveStreamGuard {
            previous: set_active_stream(Some(stream)),
        }
    }
}

impl Drop for ActiveStreamGuard {
    fn drop(&mut self) {
        set_active_stream(self.previous.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::InstructionStream;
    use std::rc::Rc;

    #[test]
    fn unset_slot_is_a_configuration_error() {
        set_active_stream(None);
        assert!(matches!(
            active_stream(),
            Err(CodegenError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn guard_restores_previous_stream() {
        set_active_stream(None);
        let outer = InstructionStream::new_handle();
        let inner = InstructionStream::new_handle();
        {
            let _outer_guard = ActiveStreamGuard::install(outer.clone());
            assert!(Rc::ptr_eq(&active_stream().unwrap(), &outer));
            {
                let _inner_guard = ActiveStreamGuard::install(inner.clone());
                assert!(Rc::ptr_eq(&active_stream().unwrap(), &inner));
            }
            assert!(Rc::ptr_eq(&active_stream().unwrap(), &outer));
        }
        assert!(active_stream().is_err());
    }

    #[test]
    fn set_returns_previous() {
        set_active_stream(None);
        let first = InstructionStream::new_handle();
        assert!(set_active_stream(Some(first.clone())).is_none());
        let prev = set_active_stream(None).unwrap();
        assert!(Rc::ptr_eq(&prev, &first));
    }
}
