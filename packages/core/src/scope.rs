//! The mutable view of a run handed to business logic.

use crate::capability::catalog_key;
use crate::error_set::ErrorSet;
use crate::operation::{Flow, Halt, Operation, DEFAULT_ERROR_DESCRIPTION};
use crate::run::{Run, State};

/// Business-logic access to a running operation.
///
/// Holds the error and result mutators, the early-exit primitives and the
/// composition operators. A `Scope` exists only inside `perform`, so a
/// finished [`Run`] can no longer change.
pub struct Scope<'a, O: Operation> {
    run: &'a mut Run<O>,
}

impl<'a, O: Operation> Scope<'a, O> {
    pub(crate) fn new(run: &'a mut Run<O>) -> Self {
        Self { run }
    }

    #[must_use]
    pub fn params(&self) -> &O::Params {
        &self.run.params
    }

    /// Errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &ErrorSet {
        &self.run.errors
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.run.state
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.run.errors.is_empty()
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    #[must_use]
    pub fn result(&self) -> &O::Output {
        &self.run.result
    }

    pub fn set_result(&mut self, value: O::Output) {
        if self.run.frozen("set_result") {
            return;
        }
        self.run.result = value;
    }

    /// Mutable access to the result, or `None` once the run was aborted.
    pub fn result_mut(&mut self) -> Option<&mut O::Output> {
        if self.run.frozen("result_mut") {
            return None;
        }
        Some(&mut self.run.result)
    }

    /// Records a non-critical error and continues.
    ///
    /// A code that was already recorded keeps its first description; the
    /// `on_error` hook fires either way.
    pub fn error(&mut self, code: impl Into<String>, description: impl Into<String>) {
        if self.run.frozen("error") {
            return;
        }
        let code = code.into();
        let description = description.into();
        self.run.errors.add(code.clone(), description.clone());
        self.run
            .fire(|cap, ctx| cap.on_error(ctx, &code, &description));
    }

    /// [`error`](Self::error) with [`DEFAULT_ERROR_DESCRIPTION`].
    pub fn error_code(&mut self, code: impl Into<String>) {
        self.error(code, DEFAULT_ERROR_DESCRIPTION);
    }

    /// Records an error and aborts the run.
    ///
    /// Always returns `Err(Halt)`; propagate it with `?` (or return it) so
    /// nothing after this call executes. The run keeps exactly the state it
    /// has at this point.
    pub fn critical_error(
        &mut self,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Flow {
        if self.run.frozen("critical_error") {
            return Err(Halt::new());
        }
        let code = code.into();
        let description = description.into();
        self.run.errors.add(code.clone(), description.clone());
        self.run
            .fire(|cap, ctx| cap.on_critical_error(ctx, &code, &description));
        self.run.state = State::Aborted;
        Err(Halt::new())
    }

    /// [`critical_error`](Self::critical_error) with
    /// [`DEFAULT_ERROR_DESCRIPTION`].
    pub fn critical_error_code(&mut self, code: impl Into<String>) -> Flow {
        self.critical_error(code, DEFAULT_ERROR_DESCRIPTION)
    }

    /// Copies every error of `other` into this run as non-critical errors, in
    /// `other`'s order, and hands `other` back.
    pub fn join<P: Operation>(&mut self, other: Run<P>) -> Run<P> {
        for (code, description) in other.errors() {
            self.error(code, description);
        }
        other
    }

    /// Aborts this run on the first error of `other`.
    ///
    /// Only that first error (in `other`'s insertion order) is transferred;
    /// the rest are never copied. When `other` has no errors it is handed
    /// back and execution continues.
    ///
    /// # Errors
    ///
    /// Returns `Err(Halt)` if `other` failed.
    pub fn strict_join<P: Operation>(&mut self, other: Run<P>) -> Result<Run<P>, Halt> {
        if let Some((code, description)) = other.errors().iter().next() {
            self.critical_error(code, description)?;
        }
        Ok(other)
    }

    /// Localized description for `code`.
    ///
    /// The catalog key is derived from this operation's type path, e.g.
    /// `app::users::CreateUser` + `empty_name` is
    /// `app.users.create_user.empty_name`. Falls back to
    /// `"translation missing: <key>"`.
    #[must_use]
    pub fn describe(&self, code: &str) -> String {
        let key = catalog_key(std::any::type_name::<O>(), code);
        self.run
            .capabilities
            .translate(&key)
            .unwrap_or_else(|| format!("translation missing: {key}"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Serialize;

    use super::*;
    use crate::capability::{Capabilities, Capability};

    #[derive(Serialize, Default)]
    struct Nothing;

    /// Fails with a fixed, ordered list of errors.
    struct Failing;

    impl Operation for Failing {
        type Params = Vec<(String, String)>;
        type Output = &'static str;

        fn perform(scope: &mut Scope<'_, Self>) -> Flow {
            let errors = scope.params().clone();
            for (code, description) in errors {
                scope.error(code, description);
            }
            scope.set_result("inner");
            Ok(())
        }
    }

    fn failing(pairs: &[(&str, &str)]) -> Run<Failing> {
        Failing::call_with(
            &none(),
            pairs
                .iter()
                .map(|(c, d)| ((*c).to_string(), (*d).to_string()))
                .collect(),
        )
    }

    fn none() -> Arc<Capabilities> {
        Arc::new(Capabilities::none())
    }

    #[derive(Debug, Default, PartialEq)]
    struct Outcome {
        inner: &'static str,
        continued: bool,
    }

    struct Joining;

    impl Operation for Joining {
        type Params = Vec<(String, String)>;
        type Output = Outcome;

        fn perform(scope: &mut Scope<'_, Self>) -> Flow {
            let other = Failing::call_with(&none(), scope.params().clone());
            let other = scope.join(other);
            scope.set_result(Outcome {
                inner: *other.result(),
                continued: true,
            });
            Ok(())
        }
    }

    struct StrictJoining;

    impl Operation for StrictJoining {
        type Params = Vec<(String, String)>;
        type Output = Outcome;

        fn perform(scope: &mut Scope<'_, Self>) -> Flow {
            let other = Failing::call_with(&none(), scope.params().clone());
            let other = scope.strict_join(other)?;
            scope.set_result(Outcome {
                inner: *other.result(),
                continued: true,
            });
            Ok(())
        }
    }

    fn ab() -> Vec<(String, String)> {
        vec![
            ("A".to_string(), "a".to_string()),
            ("B".to_string(), "b".to_string()),
        ]
    }

    #[test]
    fn join_merges_all_errors_and_continues() {
        let run = Joining::call_with(&none(), ab());
        let pairs: Vec<(&str, &str)> = run.errors().iter().collect();
        assert_eq!(pairs, vec![("A", "a"), ("B", "b")]);
        assert_eq!(
            run.result(),
            &Outcome {
                inner: "inner",
                continued: true
            }
        );
        assert_eq!(run.state(), State::Failed);
    }

    #[test]
    fn join_of_successful_run_keeps_success() {
        let run = Joining::call_with(&none(), Vec::new());
        assert!(run.is_success());
        assert!(run.result().continued);
    }

    #[test]
    fn strict_join_transfers_only_first_error_and_aborts() {
        let run = StrictJoining::call_with(&none(), ab());
        let pairs: Vec<(&str, &str)> = run.errors().iter().collect();
        assert_eq!(pairs, vec![("A", "a")]);
        assert!(!run.errors().contains("B"));
        assert_eq!(run.state(), State::Aborted);
        assert_eq!(run.result(), &Outcome::default());
    }

    #[test]
    fn strict_join_of_successful_run_continues() {
        let run = StrictJoining::call_with(&none(), Vec::new());
        assert!(run.is_success());
        assert_eq!(run.result().inner, "inner");
    }

    #[test]
    fn join_respects_first_write_wins() {
        struct Prefilled;

        impl Operation for Prefilled {
            type Params = ();
            type Output = ();

            fn perform(scope: &mut Scope<'_, Self>) -> Flow {
                scope.error("A", "mine");
                scope.join(failing(&[("A", "theirs"), ("C", "c")]));
                Ok(())
            }
        }

        let run = Prefilled::call_with(&none(), ());
        assert_eq!(run.errors().get("A"), Some("mine"));
        assert_eq!(run.errors().get("C"), Some("c"));
    }

    #[test]
    fn default_descriptions() {
        struct Defaults;

        impl Operation for Defaults {
            type Params = ();
            type Output = ();

            fn perform(scope: &mut Scope<'_, Self>) -> Flow {
                scope.error_code("soft");
                scope.critical_error_code("hard")
            }
        }

        let run = Defaults::call_with(&none(), ());
        assert_eq!(run.errors().get("soft"), Some(DEFAULT_ERROR_DESCRIPTION));
        assert_eq!(run.errors().get("hard"), Some(DEFAULT_ERROR_DESCRIPTION));
        assert_eq!(run.state(), State::Aborted);
    }

    #[test]
    fn swallowed_halt_freezes_the_run() {
        struct Swallow;

        impl Operation for Swallow {
            type Params = ();
            type Output = u32;

            fn perform(scope: &mut Scope<'_, Self>) -> Flow {
                let _ = scope.critical_error("stop", "stop here");
                scope.error("after", "must not be recorded");
                scope.set_result(7);
                Ok(())
            }
        }

        let run = Swallow::call_with(&none(), ());
        assert_eq!(run.state(), State::Aborted);
        assert_eq!(run.errors().len(), 1);
        assert!(!run.errors().contains("after"));
        assert_eq!(run.result(), &0);
    }

    struct Tally;

    impl Operation for Tally {
        type Params = bool;
        type Output = Vec<u32>;

        fn perform(scope: &mut Scope<'_, Self>) -> Flow {
            if let Some(items) = scope.result_mut() {
                items.push(1);
                items.push(2);
            }
            if *scope.params() {
                let _ = scope.critical_error("stop", "stop here");
                if let Some(items) = scope.result_mut() {
                    items.push(3);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn result_mut_edits_result_in_place() {
        let run = Tally::call_with(&none(), false);
        assert!(run.is_success());
        assert_eq!(run.result(), &vec![1, 2]);
    }

    #[test]
    fn result_mut_is_unavailable_after_swallowed_halt() {
        let run = Tally::call_with(&none(), true);
        assert_eq!(run.state(), State::Aborted);
        assert_eq!(run.result(), &vec![1, 2]);
    }

    #[test]
    fn scope_reports_live_status() {
        struct Probe;

        impl Operation for Probe {
            type Params = Nothing;
            type Output = Vec<bool>;

            fn perform(scope: &mut Scope<'_, Self>) -> Flow {
                let before = scope.is_success();
                scope.error("x", "y");
                let after = scope.is_failure();
                let running = scope.state() == State::Running;
                scope.set_result(vec![before, after, running]);
                Ok(())
            }
        }

        let run = Probe::call_with(&none(), Nothing);
        assert_eq!(run.result(), &vec![true, true, true]);
    }

    struct Catalog;

    impl Capability for Catalog {
        fn name(&self) -> &'static str {
            "catalog"
        }

        fn translate(&self, key: &str) -> Option<String> {
            key.ends_with("describing.empty_name")
                .then(|| "Name is required".to_string())
        }
    }

    struct Describing;

    impl Operation for Describing {
        type Params = ();
        type Output = ();

        fn perform(scope: &mut Scope<'_, Self>) -> Flow {
            let found = scope.describe("empty_name");
            let missing = scope.describe("unknown");
            scope.error("empty_name", found);
            scope.error("unknown", missing);
            Ok(())
        }
    }

    #[test]
    fn describe_uses_catalog_key_and_falls_back() {
        let caps = Arc::new(Capabilities::builder().with(Catalog).build());
        let run = Describing::call_with(&caps, ());
        assert_eq!(run.errors().get("empty_name"), Some("Name is required"));
        assert_eq!(
            run.errors().get("unknown"),
            Some("translation missing: opkit_core.scope.tests.describing.unknown")
        );
    }
}
