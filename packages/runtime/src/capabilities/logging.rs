//! Timing and logging capability.
//!
//! Records a monotonic start time when a run begins and writes one line per
//! lifecycle event to the configured [`LogSink`]. Params are always logged in
//! their redacted form.

use std::sync::Arc;
use std::time::Instant;

use opkit_core::{Capability, HookContext};
use tracing::Level;

use crate::sink::LogSink;

/// Start time of the current run, private to this capability.
struct Started(Instant);

/// Brackets every run with start/finish lines and logs each error.
pub struct LoggingCapability {
    sink: Arc<dyn LogSink>,
}

impl LoggingCapability {
    pub const NAME: &'static str = "logging";

    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    fn log_errors(&self, ctx: &HookContext<'_>, label: &str) {
        let errors: Vec<String> = ctx.errors().to_list().collect();
        self.sink.write_line(
            Level::ERROR,
            &format!(
                "{label} in {}: {errors:?} with params {}",
                ctx.operation(),
                ctx.redacted_params()
            ),
        );
    }
}

impl std::fmt::Debug for LoggingCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingCapability").finish_non_exhaustive()
    }
}

impl Capability for LoggingCapability {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn on_start(&self, ctx: &mut HookContext<'_>) {
        ctx.extensions_mut().insert(Started(Instant::now()));
        self.sink.write_line(
            Level::INFO,
            &format!(
                "Started {} with params {}",
                ctx.operation(),
                ctx.redacted_params()
            ),
        );
    }

    fn on_end(&self, ctx: &mut HookContext<'_>) {
        let elapsed_ms = ctx
            .extensions_mut()
            .remove::<Started>()
            .map_or(0.0, |started| started.0.elapsed().as_secs_f64() * 1000.0);
        self.sink.write_line(
            Level::INFO,
            &format!(
                "Finished {} in {elapsed_ms:.2}ms ({}) with params {}",
                ctx.operation(),
                ctx.state(),
                ctx.redacted_params()
            ),
        );
    }

    fn on_error(&self, ctx: &mut HookContext<'_>, _code: &str, _description: &str) {
        self.log_errors(ctx, "Error");
    }

    fn on_critical_error(&self, ctx: &mut HookContext<'_>, _code: &str, _description: &str) {
        self.log_errors(ctx, "Critical error");
    }
}

#[cfg(test)]
mod tests {
    use opkit_core::{Capabilities, Flow, Operation, Scope};
    use serde::Serialize;

    use super::*;
    use crate::capabilities::RedactionCapability;
    use crate::sink::MemorySink;

    #[derive(Serialize)]
    struct Login {
        email: String,
        password: String,
    }

    struct SignIn;

    impl Operation for SignIn {
        type Params = Login;
        type Output = ();

        fn perform(scope: &mut Scope<'_, Self>) -> Flow {
            if scope.params().password.len() < 8 {
                scope.error("short_password", "Password too short");
            }
            if scope.params().email.is_empty() {
                return scope.critical_error("no_email", "Email missing");
            }
            Ok(())
        }

        fn name() -> &'static str {
            "SignIn"
        }
    }

    fn login(email: &str, password: &str) -> Login {
        Login {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn logging_only(sink: &Arc<MemorySink>) -> Arc<Capabilities> {
        Arc::new(
            Capabilities::builder()
                .with(LoggingCapability::new(sink.clone()))
                .build(),
        )
    }

    #[test]
    fn successful_run_logs_start_and_finish() {
        let sink = Arc::new(MemorySink::new());
        let run = SignIn::call_with(&logging_only(&sink), login("a@b.com", "longenough"));
        assert!(run.is_success());

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, Level::INFO);
        assert_eq!(
            lines[0].1,
            r#"Started SignIn with params {"email":"a@b.com","password":"longenough"}"#
        );
        assert!(lines[1].1.starts_with("Finished SignIn in "));
        assert!(lines[1].1.contains("ms (succeeded)"));
    }

    #[test]
    fn errors_log_current_error_list() {
        let sink = Arc::new(MemorySink::new());
        let run = SignIn::call_with(&logging_only(&sink), login("", "short"));
        assert!(run.is_failure());

        let lines = sink.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].0, Level::ERROR);
        assert!(lines[1]
            .1
            .starts_with(r#"Error in SignIn: ["short_password: Password too short"]"#));
        assert!(lines[2].1.starts_with(
            r#"Critical error in SignIn: ["short_password: Password too short", "no_email: Email missing"]"#
        ));
        assert!(lines[3].1.contains("(aborted)"));
    }

    #[test]
    fn logged_params_are_redacted() {
        let sink = Arc::new(MemorySink::new());
        let caps = Arc::new(
            Capabilities::builder()
                .with(LoggingCapability::new(sink.clone()))
                .with(RedactionCapability::new(["password"]).unwrap())
                .build(),
        );
        let _run = SignIn::call_with(&caps, login("a@b.com", "secret123"));

        for (_, line) in sink.lines() {
            assert!(!line.contains("secret123"), "leaked: {line}");
            assert!(line.contains(r#"password":"[FILTERED]""#));
        }
    }

    #[test]
    fn start_time_is_private_bookkeeping() {
        struct Peek(Arc<parking_lot::Mutex<Option<bool>>>);

        impl Capability for Peek {
            fn name(&self) -> &'static str {
                "peek"
            }

            fn on_end(&self, ctx: &mut HookContext<'_>) {
                *self.0.lock() = Some(ctx.extensions().is_empty());
            }
        }

        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = Arc::new(MemorySink::new());
        let caps = Arc::new(
            Capabilities::builder()
                .with(LoggingCapability::new(sink))
                .with(Peek(seen.clone()))
                .build(),
        );
        let _run = SignIn::call_with(&caps, login("a@b.com", "longenough"));

        // Logging consumed its start time in its own on_end, which runs first.
        assert_eq!(*seen.lock(), Some(true));
    }
}
