//! The choreographer — the single owner of ants, timers, and the global delay.
//!
//! RULES:
//!   - Everything runs on the caller's thread, one logical step at a time.
//!     There are no locks because nothing is shared.
//!   - Timers only fire inside `advance_by`, `run_until`, and `run_until_idle`,
//!     in fire-time order.
//!   - Only the registry creates or destroys ants.
//!   - All randomness flows through the injected random sources.
//!   - Every event is journalled as it is emitted.

use crate::{
    clock::ChoreoClock,
    command::ChoreoCommand,
    config::ChoreoConfig,
    error::{ChoreoError, ChoreoResult},
    event::{ChoreoEvent, EventLogEntry, UpdateSource},
    position::PositionStrategy,
    registry::AntRegistry,
    rng::{RandomSource, RngBank, StreamSlot},
    scheduler::{ScheduledUpdate, StaggerScheduler, TimerAction},
    snapshot::{AntView, ChoreoSnapshot},
    state::AntPatch,
    store::ChoreoStore,
    substrate::{LoopbackSubstrate, SetMode, StateHandle, Substrate},
    types::{AntId, Millis, RunId},
};
use serde_json::Value;

pub struct Choreographer<S: Substrate> {
    pub run_id: RunId,
    pub clock:  ChoreoClock,
    seed:         u64,
    config:       ChoreoConfig,
    registry:     AntRegistry,
    scheduler:    StaggerScheduler,
    spawn_rng:    Box<dyn RandomSource>,
    motion_rng:   Box<dyn RandomSource>,
    delay:        Value,
    delay_handle: Option<StateHandle>,
    substrate:    S,
    store:        ChoreoStore,
    outbox:       Vec<ChoreoEvent>,
    capturing:    usize,
    ready:        bool,
}

impl<S: Substrate> Choreographer<S> {
    /// A controller with nothing published yet. Call `start()` before use,
    /// or use `build()` which does both.
    pub fn new(
        run_id: RunId,
        seed: u64,
        config: ChoreoConfig,
        substrate: S,
        store: ChoreoStore,
    ) -> Self {
        let bank = RngBank::new(seed);
        Self {
            clock:        ChoreoClock::new(),
            seed,
            registry:     AntRegistry::new(config.namespace.clone()),
            scheduler:    StaggerScheduler::new(),
            spawn_rng:    Box::new(bank.stream(StreamSlot::Spawn)),
            motion_rng:   Box::new(bank.stream(StreamSlot::Motion)),
            delay:        Value::from(config.default_delay),
            delay_handle: None,
            substrate,
            store,
            outbox:       Vec::new(),
            capturing:    0,
            ready:        false,
            config,
            run_id,
        }
    }

    /// Build a controller and run its startup registrations.
    pub fn build(
        run_id: RunId,
        seed: u64,
        config: ChoreoConfig,
        substrate: S,
        store: ChoreoStore,
    ) -> ChoreoResult<Self> {
        let mut choreo = Self::new(run_id, seed, config, substrate, store);
        choreo.start()?;
        Ok(choreo)
    }

    /// Replace the random sources. Must be called before `start()` to
    /// affect the initial placement.
    pub fn with_rngs(
        mut self,
        spawn: Box<dyn RandomSource>,
        motion: Box<dyn RandomSource>,
    ) -> Self {
        self.spawn_rng = spawn;
        self.motion_rng = motion;
        self
    }

    /// Create the initial ants, publish the delay, register every method,
    /// then declare the controller ready. Any failure here is fatal: the
    /// controller stays not-ready and the error is returned as `Startup`.
    pub fn start(&mut self) -> ChoreoResult<Vec<ChoreoEvent>> {
        self.step(Self::register_all).map(|((), events)| events)
    }

    fn register_all(&mut self) -> ChoreoResult<()> {
        self.emit(ChoreoEvent::RunInitialized {
            run_id: self.run_id.clone(),
            seed:   self.seed,
        })?;

        for _ in 0..self.config.initial_count {
            self.create_ant().map_err(into_startup)?;
        }

        let delay_path = self.delay_path();
        let handle = self
            .substrate
            .publish_state(&delay_path, self.delay.clone(), SetMode::AcceptAny)
            .map_err(into_startup)?;
        self.delay_handle = Some(handle);

        for method in ChoreoCommand::METHODS {
            let path = self.method_path(method);
            self.substrate.register_method(&path).map_err(into_startup)?;
        }

        self.ready = true;
        log::info!(
            "t={:.1} engine: ready with {} ants under '{}'",
            self.clock.now,
            self.registry.len(),
            self.config.namespace
        );
        self.emit(ChoreoEvent::ControllerReady {
            at:   self.clock.now,
            ants: self.registry.len(),
        })
    }

    // ── Commands ───────────────────────────────────────────────

    /// Run a command. Recoverable failures (nothing to remove, a refused
    /// publish) are journalled and logged, not returned.
    pub fn invoke(&mut self, command: ChoreoCommand) -> ChoreoResult<Vec<ChoreoEvent>> {
        self.step(|c| c.run_command(command)).map(|((), events)| events)
    }

    fn run_command(&mut self, command: ChoreoCommand) -> ChoreoResult<()> {
        self.emit(ChoreoEvent::CommandInvoked {
            at:      self.clock.now,
            command: command.name().to_string(),
        })?;

        let outcome = match command {
            ChoreoCommand::Shake              => self.shake().map(drop),
            ChoreoCommand::Edge               => self.edge_scatter().map(drop),
            ChoreoCommand::Boom               => self.boom(),
            ChoreoCommand::Add                => self.add_one().map(drop),
            ChoreoCommand::Remove             => self.remove_last().map(drop),
            ChoreoCommand::SetDelay { delay } => self.set_global_delay(Value::from(delay)),
        };
        match outcome {
            Err(e) if e.is_recoverable() => Ok(()),
            other => other,
        }
    }

    /// Route a remote method call (`<namespace>/<method>`). Arguments are
    /// accepted and ignored.
    pub fn handle_call(&mut self, path: &str, _args: &Value) -> ChoreoResult<Vec<ChoreoEvent>> {
        let command = path
            .strip_prefix(self.config.namespace.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(ChoreoCommand::from_method);
        match command {
            Some(cmd) => self.invoke(cmd),
            None => {
                log::warn!("t={:.1} engine: unknown method {path}", self.clock.now);
                Err(ChoreoError::UnknownMethod { name: path.to_string() })
            }
        }
    }

    /// Resolve a remote set on a published path. Returns the
    /// authoritative value and the events the set produced.
    pub fn handle_set(
        &mut self,
        path: &str,
        value: &Value,
    ) -> ChoreoResult<(Value, Vec<ChoreoEvent>)> {
        self.step(|c| c.apply_set(path, value))
    }

    fn apply_set(&mut self, path: &str, value: &Value) -> ChoreoResult<Value> {
        if path == self.delay_path() {
            self.set_global_delay(value.clone())?;
            return Ok(self.delay.clone());
        }

        let id = self
            .registry
            .find_by_path(path)
            .map(|a| a.id)
            .ok_or_else(|| ChoreoError::UnknownState { name: path.to_string() })?;

        let patch = AntPatch::from_value(value);
        let merged = self
            .registry
            .apply(&mut self.substrate, id, &patch)?
            .ok_or_else(|| ChoreoError::UnknownState { name: path.to_string() })?;

        self.emit(ChoreoEvent::AntUpdated {
            at:     self.clock.now,
            ant_id: id,
            source: UpdateSource::Peer,
            state:  merged.clone(),
        })?;
        Ok(merged.to_value()?)
    }

    /// Outer ring and inner cluster, staggered by the global delay.
    pub fn shake(&mut self) -> ChoreoResult<Vec<ScheduledUpdate>> {
        let delay = self.global_delay();
        self.stagger(PositionStrategy::Ring, delay, None)
    }

    /// Bands along the four sides, staggered by the global delay.
    pub fn edge_scatter(&mut self) -> ChoreoResult<Vec<ScheduledUpdate>> {
        let delay = self.global_delay();
        self.stagger(PositionStrategy::Edge, delay, None)
    }

    /// Implode every ant to the centre now, then after a fixed pause
    /// scatter whatever is registered at that moment. The scatter does
    /// not wait on the implode.
    pub fn boom(&mut self) -> ChoreoResult<()> {
        let step = self.config.boom_step_delay;
        let implode = self.config.implode_size;
        self.stagger(PositionStrategy::Center, step, Some(implode))?;

        let fire_at = self.scheduler.defer(
            self.clock.now,
            self.config.boom_pause,
            TimerAction::Stagger {
                strategy:      PositionStrategy::Uniform,
                delay:         step,
                size_override: Some(self.config.scatter_size),
            },
        );
        log::debug!("t={:.1} engine: boom scatter due at t={fire_at:.1}", self.clock.now);
        Ok(())
    }

    pub fn add_one(&mut self) -> ChoreoResult<AntId> {
        match self.create_ant() {
            Ok(id) => Ok(id),
            Err(ChoreoError::Publish { name, reason }) => {
                log::warn!("t={:.1} registry: publish of {name} failed: {reason}", self.clock.now);
                self.emit(ChoreoEvent::PublishFailed {
                    at:     self.clock.now,
                    path:   name.clone(),
                    reason: reason.clone(),
                })?;
                Err(ChoreoError::Publish { name, reason })
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_last(&mut self) -> ChoreoResult<AntId> {
        match self.registry.remove_last(&mut self.substrate) {
            Ok(ant) => {
                log::info!("t={:.1} registry: removed {}", self.clock.now, ant.name());
                self.emit(ChoreoEvent::AntRemoved {
                    at:     self.clock.now,
                    ant_id: ant.id,
                    path:   ant.name().to_string(),
                })?;
                Ok(ant.id)
            }
            Err(ChoreoError::EmptyRegistry) => {
                log::warn!("t={:.1} registry: nothing to remove", self.clock.now);
                self.emit(ChoreoEvent::RemoveOnEmpty { at: self.clock.now })?;
                Err(ChoreoError::EmptyRegistry)
            }
            Err(e) => Err(e),
        }
    }

    /// Store a new global delay verbatim. No range check: zero, negative,
    /// and non-numeric values are all kept as submitted. A NaN passed in
    /// from Rust becomes JSON null, since JSON has no NaN.
    pub fn set_global_delay(&mut self, value: Value) -> ChoreoResult<()> {
        if let Some(handle) = &self.delay_handle {
            self.substrate.post_value(handle, value.clone())?;
        }
        self.delay = value.clone();
        log::info!("t={:.1} engine: global delay set to {value}", self.clock.now);
        self.emit(ChoreoEvent::DelayChanged { at: self.clock.now, value })
    }

    /// Schedule one reposition per live ant, `index * delay` from now.
    pub fn stagger(
        &mut self,
        strategy: PositionStrategy,
        delay: Millis,
        size_override: Option<f64>,
    ) -> ChoreoResult<Vec<ScheduledUpdate>> {
        let roster = self.registry.all();
        let updates = self
            .scheduler
            .stagger(self.clock.now, &roster, strategy, delay, size_override);

        log::debug!(
            "t={:.1} scheduler: {strategy:?} x{} step={delay}",
            self.clock.now,
            updates.len()
        );
        self.emit(ChoreoEvent::StaggerScheduled {
            at: self.clock.now,
            strategy,
            delay,
            size_override,
            count: updates.len(),
        })?;
        Ok(updates)
    }

    // ── Time ───────────────────────────────────────────────────

    /// Let `ms` units of virtual time pass, firing every timer due.
    pub fn advance_by(&mut self, ms: Millis) -> ChoreoResult<Vec<ChoreoEvent>> {
        let target = self.clock.now + ms;
        self.run_until(target)
    }

    /// Fire every timer due at or before `t`, then move the clock to `t`.
    pub fn run_until(&mut self, t: Millis) -> ChoreoResult<Vec<ChoreoEvent>> {
        self.step(|c| {
            c.fire_due(t)?;
            c.clock.advance_to(t);
            Ok(())
        })
        .map(|((), events)| events)
    }

    /// Fire timers until none are left, including ones queued while firing.
    pub fn run_until_idle(&mut self) -> ChoreoResult<Vec<ChoreoEvent>> {
        self.step(|c| c.fire_due(f64::INFINITY))
            .map(|((), events)| events)
    }

    fn fire_due(&mut self, until: Millis) -> ChoreoResult<()> {
        while let Some(timer) = self.scheduler.pop_due(until) {
            self.clock.advance_to(timer.fire_at);
            self.fire(timer.action)?;
        }
        Ok(())
    }

    fn fire(&mut self, action: TimerAction) -> ChoreoResult<()> {
        match action {
            TimerAction::Reposition { ant_id, strategy, size_override } => {
                if self.registry.get(ant_id).is_none() {
                    return self.skip_stale(ant_id);
                }
                // Colour and (without override) size are read now, at fire time.
                let patch = AntPatch {
                    pos:   Some(strategy.sample(self.config.canvas_size, self.motion_rng.as_mut())),
                    color: None,
                    size:  size_override,
                };
                match self.registry.apply(&mut self.substrate, ant_id, &patch) {
                    Ok(Some(state)) => self.emit(ChoreoEvent::AntUpdated {
                        at: self.clock.now,
                        ant_id,
                        source: UpdateSource::Stagger,
                        state,
                    }),
                    Ok(None) => self.skip_stale(ant_id),
                    Err(e) if e.is_recoverable() => {
                        log::warn!("t={:.1} scheduler: update of ant {ant_id} dropped: {e}", self.clock.now);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            TimerAction::Stagger { strategy, delay, size_override } => {
                self.stagger(strategy, delay, size_override).map(drop)
            }
        }
    }

    fn skip_stale(&mut self, ant_id: AntId) -> ChoreoResult<()> {
        log::debug!("t={:.1} scheduler: ant {ant_id} gone, update skipped", self.clock.now);
        self.emit(ChoreoEvent::StaleUpdateSkipped { at: self.clock.now, ant_id })
    }

    // ── Internals ──────────────────────────────────────────────

    fn create_ant(&mut self) -> ChoreoResult<AntId> {
        let id = self.registry.create(
            &mut self.substrate,
            self.spawn_rng.as_mut(),
            self.config.canvas_size,
            self.config.default_size,
        )?;
        let ant = self
            .registry
            .get(id)
            .ok_or_else(|| ChoreoError::UnknownState { name: self.registry.path_for(id) })?;
        let event = ChoreoEvent::AntCreated {
            at:     self.clock.now,
            ant_id: id,
            path:   ant.name().to_string(),
            state:  ant.state.clone(),
        };
        log::info!("t={:.1} registry: created {}", self.clock.now, ant.name());
        self.emit(event)?;
        Ok(id)
    }

    fn emit(&mut self, event: ChoreoEvent) -> ChoreoResult<()> {
        let entry = EventLogEntry {
            id:          None,
            run_id:      self.run_id.clone(),
            at:          event.at(),
            event_type:  event.type_name().to_string(),
            payload:     serde_json::to_string(&event)?,
            recorded_at: chrono::Utc::now().to_rfc3339(),
        };
        self.store.append_event(&entry)?;
        if self.capturing > 0 {
            self.outbox.push(event);
        }
        Ok(())
    }

    /// Run one public step and hand back exactly the events it emitted.
    /// Outside a step, events only go to the journal.
    fn step<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ChoreoResult<T>,
    ) -> ChoreoResult<(T, Vec<ChoreoEvent>)> {
        let mark = self.outbox.len();
        self.capturing += 1;
        let result = f(self);
        self.capturing -= 1;
        let events = self.outbox.split_off(mark);
        result.map(|value| (value, events))
    }

    fn delay_path(&self) -> String {
        format!("{}/delay", self.config.namespace)
    }

    fn method_path(&self, method: &str) -> String {
        format!("{}/{method}", self.config.namespace)
    }

    // ── Queries ────────────────────────────────────────────────

    /// The delay as a number. Numeric strings are parsed; anything else
    /// counts as 0, which makes a stagger fire all at once.
    pub fn global_delay(&self) -> f64 {
        self.delay
            .as_f64()
            .or_else(|| self.delay.as_str().and_then(|s| s.trim().parse().ok()))
            .unwrap_or(0.0)
    }

    /// The delay exactly as it was last set.
    pub fn delay_value(&self) -> &Value {
        &self.delay
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn registry(&self) -> &AntRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ChoreoConfig {
        &self.config
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    pub fn store(&self) -> &ChoreoStore {
        &self.store
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn snapshot(&self) -> ChoreoSnapshot {
        ChoreoSnapshot {
            at:             self.clock.now,
            delay:          self.delay.clone(),
            pending_timers: self.scheduler.pending(),
            ants: self
                .registry
                .iter()
                .map(|a| AntView {
                    id:    a.id,
                    path:  a.name().to_string(),
                    state: a.state.clone(),
                })
                .collect(),
        }
    }
}

impl Choreographer<LoopbackSubstrate> {
    /// In-memory journal, loopback substrate, `ChoreoConfig::default_test()`.
    pub fn build_test(run_id: RunId, seed: u64) -> ChoreoResult<Self> {
        Self::build_test_with(run_id, seed, ChoreoConfig::default_test())
    }

    pub fn build_test_with(run_id: RunId, seed: u64, config: ChoreoConfig) -> ChoreoResult<Self> {
        let store = test_store(&run_id, seed)?;
        Self::build(run_id, seed, config, LoopbackSubstrate::new(), store)
    }

    /// Same as `build_test_with`, but not started, so a test can tune the
    /// substrate or random sources first.
    pub fn unstarted_test(run_id: RunId, seed: u64, config: ChoreoConfig) -> ChoreoResult<Self> {
        let store = test_store(&run_id, seed)?;
        Ok(Self::new(run_id, seed, config, LoopbackSubstrate::new(), store))
    }
}

fn test_store(run_id: &str, seed: u64) -> ChoreoResult<ChoreoStore> {
    let store = ChoreoStore::in_memory()?;
    store.migrate()?;
    store.insert_run(run_id, seed, "0.1.0-test")?;
    Ok(store)
}

/// Any failure during startup registration becomes a `Startup` error.
fn into_startup(e: ChoreoError) -> ChoreoError {
    match e {
        ChoreoError::Publish { name, reason } => ChoreoError::Startup { name, reason },
        other => other,
    }
}
