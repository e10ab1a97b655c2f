//! Failure isolation for plugin-supplied code.

use std::any::Any;
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Whether the current thread is running plugin code under isolation.
///
/// A panic hook can use this to stay quiet about panics that will be caught
/// and reported as failures.
pub fn in_isolated_call() -> bool {
    DEPTH.with(|depth| depth.get() > 0)
}

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Self {
        DEPTH.with(|depth| depth.set(depth.get() + 1));
        DepthGuard
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `f`, turning both an `Err` and a panic into an error message.
pub(crate) fn isolate<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<T, String>
where
    E: std::fmt::Display,
{
    let guard = DepthGuard::enter();
    let result = catch_unwind(AssertUnwindSafe(f));
    drop(guard);

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_ok_err_and_panic() {
        assert_eq!(isolate(|| Ok::<_, String>(3)), Ok(3));
        assert_eq!(isolate(|| Err::<(), _>("nope")), Err("nope".to_string()));

        let caught = isolate(|| -> Result<(), String> { panic!("kaboom") });
        assert_eq!(caught, Err("panicked: kaboom".to_string()));
    }

    #[test]
    fn test_isolation_depth_tracks_nesting() {
        assert!(!in_isolated_call());
        let inner = isolate(|| {
            let nested = isolate(|| Ok::<_, String>(in_isolated_call()));
            Ok::<_, String>((in_isolated_call(), nested))
        });
        assert_eq!(inner, Ok((true, Ok(true))));

        let _ = isolate(|| -> Result<(), String> { panic!("unwinds through the guard") });
        assert!(!in_isolated_call());
    }
}
