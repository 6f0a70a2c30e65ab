//! Tower adapters for running operations inside a service pipeline.
//!
//! - [`OperationService`]: `Service<O::Params>` that always answers with the
//!   finished [`Run`]
//! - [`StrictLayer`]: unwraps the run, turning failures into
//!   [`ProcessError`] at the service boundary
//! - [`build_operation_pipeline`]: composes both

use std::convert::Infallible;
use std::future::{ready, Future, Ready};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use opkit_core::{Capabilities, Operation, ProcessError, Run};
use tower::{Layer, Service, ServiceBuilder};

// ---------------------------------------------------------------------------
// OperationService
// ---------------------------------------------------------------------------

/// Runs `O` for every request. Never fails: failures live in the returned
/// run's errors.
pub struct OperationService<O> {
    capabilities: Arc<Capabilities>,
    _operation: PhantomData<fn() -> O>,
}

impl<O: Operation> OperationService<O> {
    #[must_use]
    pub fn new(capabilities: Arc<Capabilities>) -> Self {
        Self {
            capabilities,
            _operation: PhantomData,
        }
    }

    /// Uses the process-wide capability set.
    #[must_use]
    pub fn installed() -> Self {
        Self::new(opkit_core::installed())
    }
}

impl<O> Clone for OperationService<O> {
    fn clone(&self) -> Self {
        Self {
            capabilities: Arc::clone(&self.capabilities),
            _operation: PhantomData,
        }
    }
}

impl<O> std::fmt::Debug for OperationService<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationService")
            .field("operation", &std::any::type_name::<O>())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl<O: Operation> Service<O::Params> for OperationService<O> {
    type Response = Run<O>;
    type Error = Infallible;
    type Future = Ready<Result<Run<O>, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, params: O::Params) -> Self::Future {
        ready(Ok(O::call_with(&self.capabilities, params)))
    }
}

// ---------------------------------------------------------------------------
// StrictLayer
// ---------------------------------------------------------------------------

/// Tower layer that unwraps runs into their output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictLayer;

impl<S> Layer<S> for StrictLayer {
    type Service = StrictService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        StrictService { inner }
    }
}

/// Service wrapper that answers with `O::Output` or fails with
/// [`ProcessError`].
#[derive(Debug, Clone)]
pub struct StrictService<S> {
    inner: S,
}

impl<S, O, P> Service<P> for StrictService<S>
where
    S: Service<P, Response = Run<O>, Error = Infallible>,
    S::Future: Send + 'static,
    O: Operation + 'static,
{
    type Response = O::Output;
    type Error = ProcessError<O>;
    type Future = Pin<Box<dyn Future<Output = Result<O::Output, ProcessError<O>>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self.inner.poll_ready(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
            Poll::Ready(Err(never)) => match never {},
            Poll::Pending => Poll::Pending,
        }
    }

    fn call(&mut self, params: P) -> Self::Future {
        let fut = self.inner.call(params);
        Box::pin(async move {
            let run = match fut.await {
                Ok(run) => run,
                Err(never) => match never {},
            };
            run.into_result()
        })
    }
}

/// Build a pipeline that runs `O` and unwraps its result.
///
/// Layer order (outermost to innermost):
/// 1. `StrictLayer` -- a failed run becomes `ProcessError<O>`
/// 2. `OperationService` -- executes the operation
#[must_use]
pub fn build_operation_pipeline<O: Operation>(
    capabilities: Arc<Capabilities>,
) -> StrictService<OperationService<O>> {
    ServiceBuilder::new()
        .layer(StrictLayer)
        .service(OperationService::new(capabilities))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use opkit_core::{Flow, Scope, State};
    use tower::ServiceExt;

    use super::*;

    struct Double;

    impl Operation for Double {
        type Params = i64;
        type Output = i64;

        fn perform(scope: &mut Scope<'_, Self>) -> Flow {
            let n = *scope.params();
            if n < 0 {
                return scope.critical_error("negative", "n must not be negative");
            }
            scope.set_result(n * 2);
            Ok(())
        }
    }

    fn none() -> Arc<Capabilities> {
        Arc::new(Capabilities::none())
    }

    #[tokio::test]
    async fn operation_service_returns_run() {
        let svc = OperationService::<Double>::new(none());
        let run = svc.oneshot(21).await.unwrap();
        assert!(run.is_success());
        assert_eq!(run.result(), &42);
    }

    #[tokio::test]
    async fn operation_service_returns_failed_run_without_error() {
        let svc = OperationService::<Double>::new(none());
        let run = svc.oneshot(-1).await.unwrap();
        assert_eq!(run.state(), State::Aborted);
        assert_eq!(run.errors().get("negative"), Some("n must not be negative"));
    }

    #[tokio::test]
    async fn pipeline_unwraps_success() {
        let svc = build_operation_pipeline::<Double>(none());
        assert_eq!(svc.oneshot(5).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn pipeline_surfaces_process_error() {
        let svc = build_operation_pipeline::<Double>(none());
        let err = svc.oneshot(-3).await.unwrap_err();
        assert!(err.to_string().ends_with("Double failed"));
        assert_eq!(err.run().params(), &-3);
    }

    #[tokio::test]
    async fn service_is_reusable_after_clone() {
        let mut svc = OperationService::<Double>::new(none());
        let first = svc.clone().oneshot(1).await.unwrap();
        let second = svc.ready().await.unwrap().call(2).await.unwrap();
        assert_eq!((first.result(), second.result()), (&2, &4));
    }
}
