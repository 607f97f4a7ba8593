//! Panic isolation for scenario and discovery boundaries
//!
//! A panic hook records the backtrace of panics raised inside [`catch`] so the
//! failure can be reported with the stack of the panic site rather than of
//! the recovery point. Panics outside [`catch`] go to the previous hook.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// A recovered panic
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CapturedPanic {
    pub(crate) message: String,
    pub(crate) backtrace: String,
}

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let trace = Backtrace::force_capture().to_string();
                LAST_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(trace));
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `f`, converting a panic into a [`CapturedPanic`]
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R, CapturedPanic> {
    install_hook();

    let was_capturing = CAPTURING.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|flag| flag.set(was_capturing));

    result.map_err(|payload| CapturedPanic {
        message: payload_message(payload.as_ref()),
        backtrace: LAST_BACKTRACE
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_default(),
    })
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
