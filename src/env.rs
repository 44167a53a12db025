use std::{cell::RefCell, ffi::OsStr};

/// Flags read once from the process environment.
#[derive(Clone, Copy)]
struct Env {
    /// `YUL_TRACE=1`: print per-line address and bank snapshots.
    trace_enabled: bool,
    /// `YUL_PASSES=n`: pass cap when none is given on the command line.
    max_passes: Option<usize>,
}

thread_local! {
    /// Written once by `init`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        trace_enabled: var_is("YUL_TRACE", "1"),
        max_passes: var_parse("YUL_PASSES"),
    };
    set_env(value);
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

pub fn max_passes() -> Option<usize> {
    with_env(|env| env.max_passes)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}

fn var_parse(name: impl AsRef<OsStr>) -> Option<usize> {
    std::env::var(name.as_ref())
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_read_once_per_thread() {
        std::thread::spawn(|| {
            set_env(Env {
                trace_enabled: true,
                max_passes: Some(3),
            });
            assert!(is_trace_enabled());
            assert_eq!(max_passes(), Some(3));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn unset_numbers_are_none() {
        assert_eq!(var_parse("YUL_TEST_SURELY_UNSET_VARIABLE"), None);
        assert!(!var_is("YUL_TEST_SURELY_UNSET_VARIABLE", "1"));
    }
}
