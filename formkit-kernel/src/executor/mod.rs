//! Action executor.
//!
//! Two sequencing rules live here:
//! - [`ActionExecutor::execute_action`] runs the types of one definition in
//!   order and stops at the first failure.
//! - [`ActionExecutor::execute_actions`] runs a list of actions, recording
//!   every result, and stops only when a critical action fails.
//!
//! Handler errors and panics become failure results and never escape.

mod pool;

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use formkit_api::{IdentityRef, PlaceholderExpanderRef, SchedulerRef, ThreadScheduler};
use tokio::sync::oneshot;

use crate::action::{Action, ActionContext, ActionDefinition, ActionResult, ActionValue};
use crate::error::ExecutorError;
use crate::handlers::{ActionHandler, ActionRegistry, HandlerContext};
use pool::WorkerPool;

pub use pool::DEFAULT_KEEP_ALIVE;

struct Inner {
    registry: Arc<ActionRegistry>,
    scheduler: SchedulerRef,
    expander: Option<PlaceholderExpanderRef>,
    pool: WorkerPool,
    shutdown: AtomicBool,
}

/// Runs action definitions against a registry. Cheap to clone.
#[derive(Clone)]
pub struct ActionExecutor {
    inner: Arc<Inner>,
}

impl ActionExecutor {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self::builder(registry).build()
    }

    pub fn builder(registry: Arc<ActionRegistry>) -> ActionExecutorBuilder {
        ActionExecutorBuilder {
            registry,
            scheduler: None,
            expander: None,
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.inner.registry
    }

    pub(crate) fn expander(&self) -> Option<&PlaceholderExpanderRef> {
        self.inner.expander.as_ref()
    }

    /// Run every type of `definition` in insertion order, returning the
    /// first failure or the last result.
    ///
    /// A type that suspends (a bare `delay`) defers the remaining types
    /// through the scheduler.
    pub fn execute_action(
        &self,
        identity: &IdentityRef,
        definition: &ActionDefinition,
        context: &ActionContext,
    ) -> ActionResult {
        let (result, rest) = self.run_definition(identity, definition, context);
        if let (Some(delay), Some(rest)) = (result.resume_after, rest) {
            self.defer(delay, identity, vec![Action::new(rest)], context);
        }
        result
    }

    /// Shared body of the execute paths. The second value holds the types
    /// left unrun after a suspending result.
    fn run_definition(
        &self,
        identity: &IdentityRef,
        definition: &ActionDefinition,
        context: &ActionContext,
    ) -> (ActionResult, Option<ActionDefinition>) {
        if definition.is_empty() {
            return (ActionResult::failure("No actions to execute"), None);
        }

        let mut last = None;
        for (i, (action_type, value)) in definition.iter().enumerate() {
            let Some(handler) = self.inner.registry.get(action_type) else {
                tracing::warn!("No handler registered for action type '{}'", action_type);
                return (
                    ActionResult::failure(format!("Unknown action type: {action_type}")),
                    None,
                );
            };
            if !handler.validate(value) {
                tracing::warn!("Invalid value for action '{}': {}", action_type, value);
                return (
                    ActionResult::failure(format!("Invalid action value for '{action_type}'")),
                    None,
                );
            }

            let result = self.invoke(handler.as_ref(), identity, value, context);
            if result.is_failure() {
                return (result, None);
            }
            if result.resume_after.is_some() {
                let mut rest = ActionDefinition::new();
                for (later_type, later_value) in definition.iter().skip(i + 1) {
                    rest.add(later_type, later_value.clone());
                }
                return (result, (!rest.is_empty()).then_some(rest));
            }
            last = Some(result);
        }
        (last.unwrap_or_else(ActionResult::success), None)
    }

    fn defer(
        &self,
        delay: Duration,
        identity: &IdentityRef,
        actions: Vec<Action>,
        context: &ActionContext,
    ) {
        let count = actions.len();
        if self.schedule_continuation(delay, identity.clone(), actions, context.clone()) {
            tracing::debug!(
                "Suspended {} action(s) for {}ms for {}",
                count,
                delay.as_millis(),
                identity.name()
            );
        } else {
            tracing::debug!("Executor shut down, {} suspended action(s) dropped", count);
        }
    }

    fn invoke(
        &self,
        handler: &dyn ActionHandler,
        identity: &IdentityRef,
        value: &ActionValue,
        context: &ActionContext,
    ) -> ActionResult {
        let cx = HandlerContext {
            context,
            executor: self,
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.execute(identity, value, &cx)
        }));
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::error!(
                    "Error executing '{}' for {}: {:#}",
                    handler.action_type(),
                    identity.name(),
                    e
                );
                ActionResult::failure_from(e)
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    "Handler '{}' panicked for {}: {}",
                    handler.action_type(),
                    identity.name(),
                    message
                );
                ActionResult::failure_from(anyhow::anyhow!(
                    "handler '{}' panicked: {message}",
                    handler.action_type()
                ))
            }
        }
    }

    /// Run `actions` in order. Non-critical failures are recorded and
    /// skipped over; a critical failure ends the sequence.
    ///
    /// A suspending result hands everything after it to the scheduler, so
    /// the returned list ends at the suspension point.
    pub fn execute_actions(
        &self,
        identity: &IdentityRef,
        actions: &[Action],
        context: &ActionContext,
    ) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            let (result, rest) = self.run_definition(identity, &action.definition, context);
            let abort = action.critical && result.is_failure();
            let resume_after = result.resume_after;
            results.push(result);
            if abort {
                tracing::debug!("Critical action failed, stopping sequence");
                break;
            }
            if let Some(delay) = resume_after {
                let mut later: Vec<Action> = rest
                    .map(|definition| Action {
                        definition,
                        critical: action.critical,
                    })
                    .into_iter()
                    .collect();
                later.extend(actions[i + 1..].iter().cloned());
                if !later.is_empty() {
                    self.defer(delay, identity, later, context);
                }
                break;
            }
        }
        results
    }

    /// [`execute_action`](Self::execute_action) on the worker pool.
    pub fn execute_action_async(
        &self,
        identity: IdentityRef,
        definition: ActionDefinition,
        context: ActionContext,
    ) -> Pending<ActionResult> {
        let executor = self.clone();
        self.spawn(move || executor.execute_action(&identity, &definition, &context))
    }

    /// [`execute_actions`](Self::execute_actions) on the worker pool.
    pub fn execute_actions_async(
        &self,
        identity: IdentityRef,
        actions: Vec<Action>,
        context: ActionContext,
    ) -> Pending<Vec<ActionResult>> {
        let executor = self.clone();
        self.spawn(move || executor.execute_actions(&identity, &actions, &context))
    }

    fn spawn<T, F>(&self, work: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self.is_shutdown() {
            return Pending::rejected();
        }
        let (tx, rx) = oneshot::channel();
        let submitted = self.inner.pool.submit(Box::new(move || {
            // The caller may have dropped its handle.
            let _ = tx.send(work());
        }));
        match submitted {
            Ok(()) => Pending::waiting(rx),
            Err(e) => {
                tracing::warn!("Async action rejected: {}", e);
                Pending::rejected()
            }
        }
    }

    /// Run `actions` after `delay` through the scheduler.
    ///
    /// Returns `false` if the executor is shut down. A continuation that
    /// fires after shutdown is dropped.
    pub fn schedule_continuation(
        &self,
        delay: Duration,
        identity: IdentityRef,
        actions: Vec<Action>,
        context: ActionContext,
    ) -> bool {
        if self.is_shutdown() {
            return false;
        }
        let weak = Arc::downgrade(&self.inner);
        self.inner.scheduler.run_later(
            delay,
            Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    tracing::debug!("Executor dropped, continuation abandoned");
                    return;
                };
                let executor = ActionExecutor { inner };
                if executor.is_shutdown() {
                    tracing::debug!("Executor shut down, continuation abandoned");
                    return;
                }
                for result in executor.execute_actions(&identity, &actions, &context) {
                    if result.is_failure() {
                        tracing::warn!(
                            "Delayed action failed for {}: {}",
                            identity.name(),
                            result.message()
                        );
                    }
                }
            }),
        );
        true
    }

    /// Stop accepting async work and release idle workers.
    pub fn shutdown(&self) {
        if !self.inner.shutdown.swap(true, Ordering::SeqCst) {
            self.inner.pool.shutdown();
            tracing::info!("Action executor shut down");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }
}

pub struct ActionExecutorBuilder {
    registry: Arc<ActionRegistry>,
    scheduler: Option<SchedulerRef>,
    expander: Option<PlaceholderExpanderRef>,
    keep_alive: Duration,
}

impl ActionExecutorBuilder {
    pub fn scheduler(mut self, scheduler: SchedulerRef) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn expander(mut self, expander: Option<PlaceholderExpanderRef>) -> Self {
        self.expander = expander;
        self
    }

    /// How long an idle worker waits for work before exiting.
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn build(self) -> ActionExecutor {
        ActionExecutor {
            inner: Arc::new(Inner {
                registry: self.registry,
                scheduler: self.scheduler.unwrap_or_else(|| Arc::new(ThreadScheduler)),
                expander: self.expander,
                pool: WorkerPool::new(self.keep_alive),
                shutdown: AtomicBool::new(false),
            }),
        }
    }
}

/// Handle to an async execution.
///
/// Await it from async code, or call [`Pending::wait`] from a plain thread.
pub struct Pending<T> {
    rx: Option<oneshot::Receiver<T>>,
}

impl<T> Pending<T> {
    fn waiting(rx: oneshot::Receiver<T>) -> Self {
        Self { rx: Some(rx) }
    }

    fn rejected() -> Self {
        Self { rx: None }
    }

    /// Block the current thread until the result is ready.
    ///
    /// Must not be called from inside an async runtime.
    pub fn wait(self) -> Result<T, ExecutorError> {
        let rx = self.rx.ok_or(ExecutorError::Shutdown)?;
        rx.blocking_recv().map_err(|_| ExecutorError::Dropped)
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, ExecutorError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut().rx.as_mut() {
            Some(rx) => Pin::new(rx).poll(cx).map_err(|_| ExecutorError::Dropped),
            None => Poll::Ready(Err(ExecutorError::Shutdown)),
        }
    }
}
