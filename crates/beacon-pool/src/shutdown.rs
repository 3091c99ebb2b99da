//! Ordered shutdown hooks.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use parking_lot::Mutex;
use tracing::{error, info};

type Hook = Box<dyn FnOnce() + Send>;

/// A list of named cleanup callbacks run once at process exit.
///
/// Hooks run in reverse registration order, so whatever was opened last is
/// closed first. A hook that panics is logged and skipped; the remaining
/// hooks still run.
#[derive(Default)]
pub struct ShutdownHooks {
    hooks: Mutex<Vec<(String, Hook)>>,
}

impl ShutdownHooks {
    /// Creates an empty hook list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hook.
    pub fn register<F>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        info!(hook = %name, "registered shutdown hook");
        self.hooks.lock().push((name, Box::new(hook)));
    }

    /// Returns the number of pending hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.lock().len()
    }

    /// Returns true if no hooks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.lock().is_empty()
    }

    /// Runs and drains every pending hook, newest first.
    ///
    /// Returns the number of hooks that completed without panicking. Calling
    /// `run` again only runs hooks registered since the previous call.
    pub fn run(&self) -> usize {
        let hooks = std::mem::take(&mut *self.hooks.lock());
        let total = hooks.len();
        let mut completed = 0;

        for (name, hook) in hooks.into_iter().rev() {
            info!(hook = %name, "running shutdown hook");
            match panic::catch_unwind(AssertUnwindSafe(hook)) {
                Ok(()) => completed += 1,
                Err(payload) => {
                    error!(hook = %name, reason = %panic_message(&*payload), "shutdown hook panicked");
                }
            }
        }

        info!(completed, total, "shutdown hooks finished");
        completed
    }
}

impl fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.hooks.lock().iter().map(|(n, _)| n.clone()).collect();
        f.debug_struct("ShutdownHooks").field("hooks", &names).finish()
    }
}

/// Extracts a readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn runs_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let hooks = ShutdownHooks::new();
        for name in ["pool", "router", "worker"] {
            let order = Arc::clone(&order);
            hooks.register(name, move || order.lock().push(name));
        }

        assert_eq!(hooks.len(), 3);
        assert_eq!(hooks.run(), 3);
        assert_eq!(*order.lock(), vec!["worker", "router", "pool"]);
        assert!(hooks.is_empty());
    }

    #[test]
    #[allow(clippy::panic)]
    fn panicking_hook_does_not_stop_the_rest() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let hooks = ShutdownHooks::new();

        let first = Arc::clone(&ran);
        hooks.register("first", move || first.lock().push("first"));
        hooks.register("broken", || panic!("close failed"));
        let last = Arc::clone(&ran);
        hooks.register("last", move || last.lock().push("last"));

        assert_eq!(hooks.run(), 2);
        assert_eq!(*ran.lock(), vec!["last", "first"]);
    }

    #[test]
    fn run_twice_only_runs_new_hooks() {
        let count = Arc::new(Mutex::new(0));
        let hooks = ShutdownHooks::new();
        let c = Arc::clone(&count);
        hooks.register("once", move || *c.lock() += 1);

        assert_eq!(hooks.run(), 1);
        assert_eq!(hooks.run(), 0);
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn panic_message_variants() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*s), "static");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*s), "owned");
        let s: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*s), "unknown panic");
    }

    #[test]
    fn debug_lists_pending_hooks() {
        let hooks = ShutdownHooks::new();
        hooks.register("robots", || {});
        assert!(format!("{hooks:?}").contains("robots"));
    }
}
