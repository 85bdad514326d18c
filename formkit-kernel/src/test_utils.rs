//! Test utilities for handler and engine testing.
//!
//! Mock identities and collaborators that record what the engine asked of
//! them, plus a TestExecutor that wires a registry, an executor and a
//! manually driven scheduler together.

#[cfg(test)]
pub mod test_helpers {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::anyhow;
    use formkit_api::{
        ClientPlatform, CommandDispatcher, Economy, ExtensionPresence, Identity,
        IdentityDirectory, IdentityRef, Responder, Scheduler, SoundPlayer, Surface,
        SurfaceResponse, SurfaceSender, Task,
    };
    use uuid::Uuid;

    use crate::action::{ActionContext, ActionResult, ActionValue};
    use crate::condition::ConditionEvaluator;
    use crate::executor::ActionExecutor;
    use crate::handlers::{
        ActionHandler, ActionRegistry, CommandHandler, ConditionalHandler, DelayHandler,
        HandlerContext, MessageHandler, RandomHandler,
    };

    // ---------------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------------

    struct IdentityState {
        id: Uuid,
        name: String,
        permissions: Mutex<HashSet<String>>,
        platform: Mutex<ClientPlatform>,
        accept_commands: AtomicBool,
        commands: Mutex<Vec<String>>,
        messages: Mutex<Vec<String>>,
    }

    /// An identity that records commands and chat lines. Clones share state.
    #[derive(Clone)]
    pub struct MockIdentity {
        state: Arc<IdentityState>,
    }

    impl MockIdentity {
        pub fn new(name: &str) -> Self {
            Self {
                state: Arc::new(IdentityState {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    permissions: Mutex::new(HashSet::new()),
                    platform: Mutex::new(ClientPlatform::Unknown),
                    accept_commands: AtomicBool::new(true),
                    commands: Mutex::new(Vec::new()),
                    messages: Mutex::new(Vec::new()),
                }),
            }
        }

        pub fn into_ref(self) -> IdentityRef {
            Arc::new(self)
        }

        pub fn id(&self) -> Uuid {
            self.state.id
        }

        pub fn with_permission(self, permission: &str) -> Self {
            self.state
                .permissions
                .lock()
                .unwrap()
                .insert(permission.to_string());
            self
        }

        pub fn with_platform(self, platform: ClientPlatform) -> Self {
            *self.state.platform.lock().unwrap() = platform;
            self
        }

        /// Every `execute_command` call returns false.
        pub fn rejecting_commands(self) -> Self {
            self.state.accept_commands.store(false, Ordering::SeqCst);
            self
        }

        pub fn commands(&self) -> Vec<String> {
            self.state.commands.lock().unwrap().clone()
        }

        pub fn messages(&self) -> Vec<String> {
            self.state.messages.lock().unwrap().clone()
        }
    }

    impl Identity for MockIdentity {
        fn id(&self) -> Uuid {
            self.state.id
        }

        fn name(&self) -> &str {
            &self.state.name
        }

        fn send_message(&self, text: &str) {
            self.state.messages.lock().unwrap().push(text.to_string());
        }

        fn execute_command(&self, command: &str) -> bool {
            self.state.commands.lock().unwrap().push(command.to_string());
            self.state.accept_commands.load(Ordering::SeqCst)
        }

        fn has_permission(&self, permission: &str) -> bool {
            self.state.permissions.lock().unwrap().contains(permission)
        }

        fn platform(&self) -> ClientPlatform {
            *self.state.platform.lock().unwrap()
        }
    }

    // ---------------------------------------------------------------------
    // Scheduler
    // ---------------------------------------------------------------------

    /// Holds tasks until `run_pending` is called.
    #[derive(Default)]
    pub struct ManualScheduler {
        pending: Mutex<Vec<Task>>,
        delays: Mutex<Vec<Duration>>,
    }

    impl ManualScheduler {
        pub fn run_pending(&self) {
            let tasks: Vec<Task> = std::mem::take(&mut *self.pending.lock().unwrap());
            for task in tasks {
                task();
            }
        }

        /// Every delay ever requested, in order.
        pub fn delays(&self) -> Vec<Duration> {
            self.delays.lock().unwrap().clone()
        }
    }

    impl Scheduler for ManualScheduler {
        fn run_later(&self, delay: Duration, task: Task) {
            self.delays.lock().unwrap().push(delay);
            self.pending.lock().unwrap().push(task);
        }
    }

    // ---------------------------------------------------------------------
    // Executor harness
    // ---------------------------------------------------------------------

    /// A registry with the collaborator-free handlers and an executor over it.
    pub struct TestExecutor {
        pub registry: Arc<ActionRegistry>,
        pub executor: ActionExecutor,
        pub scheduler: Arc<ManualScheduler>,
    }

    impl TestExecutor {
        pub fn new() -> Self {
            let registry = Arc::new(ActionRegistry::new());
            let handlers: Vec<Arc<dyn ActionHandler>> = vec![
                Arc::new(CommandHandler),
                Arc::new(MessageHandler),
                Arc::new(RandomHandler),
                Arc::new(DelayHandler::default()),
                Arc::new(ConditionalHandler::new(Arc::new(ConditionEvaluator::default()))),
            ];
            for handler in handlers {
                registry.register(handler).unwrap();
            }
            let scheduler = Arc::new(ManualScheduler::default());
            let executor = ActionExecutor::builder(Arc::clone(&registry))
                .scheduler(scheduler.clone())
                .build();
            Self {
                registry,
                executor,
                scheduler,
            }
        }

        pub fn context_with(&self, placeholders: &[(&str, &str)]) -> ActionContext {
            ActionContext::builder()
                .placeholders(placeholders.iter().copied())
                .build()
        }

        pub fn handler_context<'a>(&'a self, context: &'a ActionContext) -> HandlerContext<'a> {
            HandlerContext {
                context,
                executor: &self.executor,
            }
        }
    }

    // ---------------------------------------------------------------------
    // Handlers
    // ---------------------------------------------------------------------

    enum Behaviour {
        Ok,
        Fail,
        Message(String),
        Error,
        Panic,
    }

    /// Handler with a scripted outcome that counts its invocations.
    pub struct RecordingHandler {
        action_type: String,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl RecordingHandler {
        fn build(action_type: &str, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                action_type: action_type.to_string(),
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn ok(action_type: &str) -> Arc<Self> {
            Self::build(action_type, Behaviour::Ok)
        }

        pub fn failing(action_type: &str) -> Arc<Self> {
            Self::build(action_type, Behaviour::Fail)
        }

        pub fn with_message(action_type: &str, message: &str) -> Arc<Self> {
            Self::build(action_type, Behaviour::Message(message.to_string()))
        }

        pub fn erroring(action_type: &str) -> Arc<Self> {
            Self::build(action_type, Behaviour::Error)
        }

        pub fn panicking(action_type: &str) -> Arc<Self> {
            Self::build(action_type, Behaviour::Panic)
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ActionHandler for RecordingHandler {
        fn action_type(&self) -> &str {
            &self.action_type
        }

        fn execute(
            &self,
            _identity: &IdentityRef,
            _value: &ActionValue,
            _cx: &HandlerContext<'_>,
        ) -> anyhow::Result<ActionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Ok => Ok(ActionResult::success()),
                Behaviour::Fail => Ok(ActionResult::failure(format!(
                    "{} failed",
                    self.action_type
                ))),
                Behaviour::Message(message) => Ok(ActionResult::success_with(message.clone())),
                Behaviour::Error => Err(anyhow!("{} exploded", self.action_type)),
                Behaviour::Panic => panic!("{} panicked", self.action_type),
            }
        }

        fn describe(&self) -> &str {
            "Recording test handler"
        }
    }

    // ---------------------------------------------------------------------
    // Collaborators
    // ---------------------------------------------------------------------

    #[derive(Default)]
    pub struct MockDispatcher {
        fail: bool,
        rejected_prefix: Option<String>,
        console: Mutex<Vec<String>>,
    }

    impl MockDispatcher {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Fails console commands starting with `prefix`, accepts the rest.
        pub fn rejecting(prefix: &str) -> Self {
            Self {
                rejected_prefix: Some(prefix.to_string()),
                ..Self::default()
            }
        }

        pub fn console(&self) -> Vec<String> {
            self.console.lock().unwrap().clone()
        }
    }

    impl CommandDispatcher for MockDispatcher {
        fn run_as_console(&self, command: &str) -> anyhow::Result<()> {
            let rejected = self
                .rejected_prefix
                .as_deref()
                .is_some_and(|prefix| command.starts_with(prefix));
            if self.fail || rejected {
                return Err(anyhow!("console rejected '{command}'"));
            }
            self.console.lock().unwrap().push(command.to_string());
            Ok(())
        }

        fn run_as_identity(&self, identity: &IdentityRef, command: &str) -> anyhow::Result<()> {
            if identity.execute_command(command) {
                Ok(())
            } else {
                Err(anyhow!("command rejected"))
            }
        }

        fn exists(&self, _command: &str) -> bool {
            true
        }
    }

    #[derive(Default)]
    pub struct MockSounds {
        played: Mutex<Vec<(String, f32, f32)>>,
    }

    impl MockSounds {
        pub fn played(&self) -> Vec<(String, f32, f32)> {
            self.played.lock().unwrap().clone()
        }
    }

    impl SoundPlayer for MockSounds {
        fn play(
            &self,
            _identity: &IdentityRef,
            name: &str,
            volume: f32,
            pitch: f32,
        ) -> anyhow::Result<()> {
            self.played
                .lock()
                .unwrap()
                .push((name.to_string(), volume, pitch));
            Ok(())
        }

        fn stop_all(&self, _identity: &IdentityRef) -> anyhow::Result<()> {
            self.played.lock().unwrap().clear();
            Ok(())
        }

        fn exists(&self, _name: &str) -> bool {
            true
        }
    }

    /// Every identity starts with the same balance.
    pub struct MockEconomy {
        start: f64,
        balances: Mutex<HashMap<Uuid, f64>>,
        refused: Option<Uuid>,
    }

    impl MockEconomy {
        pub fn with_balance(start: f64) -> Self {
            Self {
                start,
                balances: Mutex::new(HashMap::new()),
                refused: None,
            }
        }

        /// Make every deposit to `id` fail.
        pub fn refusing_deposits_to(mut self, id: Uuid) -> Self {
            self.refused = Some(id);
            self
        }

        pub fn balance_of(&self, id: &Uuid) -> f64 {
            self.balances
                .lock()
                .unwrap()
                .get(id)
                .copied()
                .unwrap_or(self.start)
        }

        fn update(&self, identity: &IdentityRef, f: impl FnOnce(f64) -> f64) {
            let mut balances = self.balances.lock().unwrap();
            let entry = balances.entry(identity.id()).or_insert(self.start);
            *entry = f(*entry);
        }
    }

    impl Economy for MockEconomy {
        fn balance(&self, identity: &IdentityRef) -> f64 {
            self.balance_of(&identity.id())
        }

        fn add(&self, identity: &IdentityRef, amount: f64) -> anyhow::Result<()> {
            if self.refused == Some(identity.id()) {
                anyhow::bail!("account of {} is frozen", identity.name());
            }
            self.update(identity, |b| b + amount);
            Ok(())
        }

        fn remove(&self, identity: &IdentityRef, amount: f64) -> anyhow::Result<()> {
            self.update(identity, |b| b - amount);
            Ok(())
        }

        fn set(&self, identity: &IdentityRef, amount: f64) -> anyhow::Result<()> {
            self.update(identity, |_| amount);
            Ok(())
        }
    }

    pub struct MockDirectory {
        online: Vec<MockIdentity>,
    }

    impl MockDirectory {
        pub fn with(online: Vec<MockIdentity>) -> Self {
            Self { online }
        }
    }

    impl IdentityDirectory for MockDirectory {
        fn resolve(&self, name: &str) -> Option<IdentityRef> {
            self.online
                .iter()
                .find(|i| i.name().eq_ignore_ascii_case(name))
                .map(|i| i.clone().into_ref())
        }

        fn is_online(&self, name: &str) -> bool {
            self.resolve(name).is_some()
        }

        fn send_message(&self, identity: &IdentityRef, text: &str) {
            identity.send_message(text);
        }
    }

    pub struct MockExtensions {
        enabled: Vec<String>,
    }

    impl MockExtensions {
        pub fn with(enabled: &[&str]) -> Self {
            Self {
                enabled: enabled.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl ExtensionPresence for MockExtensions {
        fn is_enabled(&self, name: &str) -> bool {
            self.enabled.iter().any(|e| e.eq_ignore_ascii_case(name))
        }
    }

    /// Records delivered surfaces and keeps their responders for replay.
    #[derive(Default)]
    pub struct MockSurfaces {
        sent: Mutex<Vec<(Surface, Responder)>>,
        failures_left: AtomicUsize,
        unavailable: AtomicBool,
    }

    impl MockSurfaces {
        /// Fail the next `n` sends.
        pub fn failing_first(n: usize) -> Self {
            let surfaces = Self::default();
            surfaces.failures_left.store(n, Ordering::SeqCst);
            surfaces
        }

        pub fn unavailable() -> Self {
            let surfaces = Self::default();
            surfaces.unavailable.store(true, Ordering::SeqCst);
            surfaces
        }

        pub fn surfaces(&self) -> Vec<Surface> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(s, _)| s.clone())
                .collect()
        }

        pub fn last(&self) -> Option<Surface> {
            self.surfaces().pop()
        }

        /// Answer the most recently sent surface.
        pub fn respond(&self, response: SurfaceResponse) {
            let responder = self
                .sent
                .lock()
                .unwrap()
                .last()
                .map(|(_, r)| Arc::clone(r))
                .expect("no surface was sent");
            responder(response);
        }
    }

    impl SurfaceSender for MockSurfaces {
        fn send(
            &self,
            _identity: &IdentityRef,
            surface: Surface,
            responder: Responder,
        ) -> anyhow::Result<()> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(anyhow!("client did not accept the surface"));
            }
            self.sent.lock().unwrap().push((surface, responder));
            Ok(())
        }

        fn is_available(&self) -> bool {
            !self.unavailable.load(Ordering::SeqCst)
        }

        fn is_target_of_required_kind(&self, identity: &IdentityRef) -> bool {
            identity.platform() != ClientPlatform::Java
        }
    }
}
