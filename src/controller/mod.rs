pub mod alarm;
pub mod frequency;
pub mod history;
pub mod pid;
pub mod safety;
pub mod scheduler;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, InputProvider};
use crate::domain::{ManualInput, OperatingMode, PumpLoop, Readings, Snapshot, SystemState};
use crate::error::CoolingResult;
use crate::physics::{flow, HeatExchanger, HeatExchangerConfig, InletConditions, Outlets};
use crate::simulation::{PerturbationConfig, SensorWalk, TickPerturbation};
use crate::telemetry::CONTROL_LOOP_TARGET;

pub use alarm::{AlarmCondition, AlarmEvent, AlarmMonitor, AlarmThresholds};
pub use frequency::{
    ControllerMemory, FreshWaterController, FreshWaterLaw, SeaWaterLaw, SeaWaterLawConfig, Trend,
};
pub use history::HistoryBuffer;
pub use pid::{Action, FreshWaterPid, PidController, PidGains, RapidChangeGuard};
pub use safety::{FailSafeConfig, SensorFailSafe, SensorFault};
pub use scheduler::{PumpCountScheduler, StagingConfig};

/// Every Nth cycle is summarized at info level
const SUMMARY_EVERY: u64 = 10;

/// Construction parameters for [`CoolingController`].
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub tick_period: Duration,
    pub history_capacity: usize,
    pub mode: OperatingMode,
    pub fresh_water_law: FreshWaterLaw,
    pub sea_water: SeaWaterLawConfig,
    pub staging: StagingConfig,
    pub alarms: AlarmThresholds,
    pub fail_safe: FailSafeConfig,
    pub heat_exchanger: HeatExchangerConfig,
    pub perturbation: PerturbationConfig,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(500),
            history_capacity: history::DEFAULT_CAPACITY,
            mode: OperatingMode::Simulation,
            fresh_water_law: FreshWaterLaw::Proportional,
            sea_water: SeaWaterLawConfig::default(),
            staging: StagingConfig::default(),
            alarms: AlarmThresholds::default(),
            fail_safe: FailSafeConfig::default(),
            heat_exchanger: HeatExchangerConfig::default(),
            perturbation: PerturbationConfig::default(),
        }
    }
}

impl ControllerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            tick_period: cfg.controller.tick_period(),
            history_capacity: cfg.controller.history_capacity,
            mode: cfg.controller.mode,
            fresh_water_law: cfg.controller.fresh_water_law,
            fail_safe: cfg.controller.fail_safe(),
            perturbation: cfg.simulation.perturbation(),
            ..Default::default()
        }
    }
}

/// What started a control cycle
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Tick,
    Manual(ManualInput),
}

/// Everything one cycle mutates. Guarded as a unit so a tick and a manual
/// update never interleave.
struct PlantCore {
    state: SystemState,
    mode: OperatingMode,
    heat_exchanger: HeatExchanger,
    fresh_water: FreshWaterController,
    sea_water: SeaWaterLaw,
    scheduler: PumpCountScheduler,
    alarms: AlarmMonitor,
    fail_safe: SensorFailSafe,
    perturbation: TickPerturbation,
    last_cycle: Instant,
    cycle: u64,
}

impl PlantCore {
    fn new(settings: &ControllerSettings) -> Self {
        Self {
            state: SystemState::default(),
            sea_water: SeaWaterLaw::new(settings.sea_water.clone()),
            mode: settings.mode,
            heat_exchanger: HeatExchanger::new(settings.heat_exchanger.clone()),
            fresh_water: FreshWaterController::new(settings.fresh_water_law),
            scheduler: PumpCountScheduler::new(settings.staging.clone()),
            alarms: AlarmMonitor::new(settings.alarms.clone()),
            fail_safe: SensorFailSafe::new(settings.fail_safe.clone()),
            perturbation: TickPerturbation::new(settings.perturbation.clone()),
            last_cycle: Instant::now(),
            cycle: 0,
        }
    }

    /// One full control cycle.
    ///
    /// Flows are derived from the actuator settings left by the previous
    /// cycle, after the thermal refinement and before the frequency laws run,
    /// so a frequency command reaches the thermal model one cycle later.
    fn run_cycle(&mut self, trigger: Trigger) -> Snapshot {
        let now = Instant::now();
        let dt_s = now.duration_since(self.last_cycle).as_secs_f64();
        self.last_cycle = now;

        match trigger {
            Trigger::Tick if self.mode == OperatingMode::Simulation => {
                self.perturbation.apply(&mut self.state);
            }
            Trigger::Tick => {}
            Trigger::Manual(input) => {
                self.state.t4_c = input.t4_c;
                self.state.t1_c = input.t1_c;
                self.state.dp1_bar = input.dp1_bar;
                self.state.engine_load_percent = input.engine_load_percent;
            }
        }

        let state = &mut self.state;

        let inlet = InletConditions {
            t1_c: state.t1_c,
            t4_c: state.t4_c,
            fw_flow_m3h: state.fw_flow_m3h,
            sw_flow_m3h: state.sw_flow_m3h,
        };
        let previous = Outlets {
            t5_c: state.t5_c,
            t2_c: state.t2_c,
        };
        let refinement = self.heat_exchanger.refine(&inlet, previous);
        if !refinement.converged {
            debug!(
                target: CONTROL_LOOP_TARGET,
                passes = refinement.passes,
                t5_c = refinement.outlets.t5_c,
                t2_c = refinement.outlets.t2_c,
                "thermal refinement hit pass cap"
            );
        }
        state.t5_c = refinement.outlets.t5_c;
        state.t2_c = refinement.outlets.t2_c;
        state.heat_exchanger_efficiency = self.heat_exchanger.effectiveness();

        state.fw_flow_m3h =
            flow::loop_flow(PumpLoop::FreshWater, state.fw_freq_hz, state.fw_count);
        state.sw_flow_m3h =
            flow::loop_flow(PumpLoop::SeaWater, state.sw_freq_hz, state.sw_count);

        state.fw_freq_hz = self.fresh_water.update(state.t4_c, state.fw_freq_hz, dt_s);
        let sea_water = self.sea_water.update(state.t5_c, state.sw_freq_hz);
        state.sw_freq_hz = sea_water.freq_hz;

        self.scheduler.apply(state);
        self.alarms.evaluate(state);
        self.fail_safe.apply(state);

        state.operating_hours += dt_s / 3600.0;
        self.cycle += 1;

        debug!(
            target: CONTROL_LOOP_TARGET,
            cycle = self.cycle,
            t1_c = state.t1_c,
            t2_c = state.t2_c,
            t4_c = state.t4_c,
            t5_c = state.t5_c,
            fw_freq_hz = state.fw_freq_hz,
            sw_freq_hz = state.sw_freq_hz,
            sw_action = ?sea_water.action,
            passes = refinement.passes,
            "control cycle"
        );
        if self.cycle % SUMMARY_EVERY == 0 {
            info!(
                target: CONTROL_LOOP_TARGET,
                cycle = self.cycle,
                t5_c = state.t5_c,
                t2_c = state.t2_c,
                fw_freq_hz = state.fw_freq_hz,
                sw_freq_hz = state.sw_freq_hz,
                fw_count = state.fw_count.get(),
                sw_count = state.sw_count.get(),
                engine_load_percent = state.engine_load_percent,
                operating_hours = state.operating_hours,
                alarm_active = state.alarm_active,
                "cooling plant summary"
            );
        }

        Snapshot::new(self.cycle, state.clone(), Utc::now())
    }
}

/// Central cooling plant controller.
///
/// Shared between the periodic loop and any number of manual callers via
/// `Arc`. The plant core is locked for a whole cycle; history is appended
/// while that lock is held (core, then history) and read as owned copies.
pub struct CoolingController {
    core: Mutex<PlantCore>,
    history: RwLock<HistoryBuffer<Snapshot>>,
    snapshot_tx: watch::Sender<Snapshot>,
    tick_period: Duration,
}

impl Default for CoolingController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}

impl CoolingController {
    pub fn new(settings: ControllerSettings) -> Self {
        let core = PlantCore::new(&settings);
        let (snapshot_tx, _) = watch::channel(Snapshot::new(0, core.state.clone(), Utc::now()));

        Self {
            core: Mutex::new(core),
            history: RwLock::new(HistoryBuffer::with_capacity(settings.history_capacity)),
            snapshot_tx,
            tick_period: settings.tick_period,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(ControllerSettings::from_config(cfg))
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Autonomous cycle. In simulation mode the inlet temperatures drift
    /// first; in manual mode the last entered inputs are held.
    pub fn tick(&self) -> Readings {
        self.cycle(Trigger::Tick)
    }

    /// Cycle with operator inputs. Values are taken as given; use
    /// [`apply_input`](Self::apply_input) for untrusted input.
    pub fn manual_update(
        &self,
        t4_c: f64,
        t1_c: f64,
        dp1_bar: f64,
        engine_load_percent: f64,
    ) -> Readings {
        self.cycle(Trigger::Manual(ManualInput::new(
            t4_c,
            t1_c,
            dp1_bar,
            engine_load_percent,
        )))
    }

    /// Validate operator input and run a manual cycle with it.
    pub fn apply_input(&self, input: ManualInput) -> CoolingResult<Readings> {
        input.check()?;
        Ok(self.cycle(Trigger::Manual(input)))
    }

    fn cycle(&self, trigger: Trigger) -> Readings {
        let snapshot = {
            let mut core = self.core.lock();
            let snapshot = core.run_cycle(trigger);
            self.history.write().push(snapshot.clone());
            snapshot
        };
        let readings = snapshot.state.readings();
        self.snapshot_tx.send_replace(snapshot);
        readings
    }

    pub fn mode(&self) -> OperatingMode {
        self.core.lock().mode
    }

    pub fn set_mode(&self, mode: OperatingMode) {
        let mut core = self.core.lock();
        if core.mode != mode {
            info!(from = %core.mode, to = %mode, "operating mode changed");
            core.mode = mode;
        }
    }

    /// Copy of the current plant state
    pub fn state(&self) -> SystemState {
        self.core.lock().state.clone()
    }

    pub fn controller_memory(&self) -> ControllerMemory {
        *self.core.lock().sea_water.memory()
    }

    /// Number of completed control cycles
    pub fn cycles(&self) -> u64 {
        self.core.lock().cycle
    }

    /// All retained snapshots, oldest first
    pub fn history(&self) -> Vec<Snapshot> {
        self.history.read().snapshot()
    }

    /// Up to `n` most recent snapshots, oldest first
    pub fn latest_history(&self, n: usize) -> Vec<Snapshot> {
        self.history.read().latest(n)
    }

    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Receiver that always holds the latest snapshot
    pub fn watch_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_alarms(&self) -> broadcast::Receiver<AlarmEvent> {
        self.core.lock().alarms.subscribe()
    }

    /// Periodic loop: tick, then sleep whatever is left of the period.
    /// A cycle that overruns the period is logged and the next one starts
    /// immediately; missed ticks are not made up.
    pub async fn run(&self, token: CancellationToken) {
        let period = self.tick_period;
        info!(
            target: CONTROL_LOOP_TARGET,
            tick_millis = period.as_millis() as u64,
            "cooling control loop started"
        );

        while !token.is_cancelled() {
            let started = Instant::now();
            self.tick();
            let elapsed = started.elapsed();

            let remaining = match period.checked_sub(elapsed) {
                Some(remaining) => remaining,
                None => {
                    warn!(
                        target: CONTROL_LOOP_TARGET,
                        elapsed_ms = elapsed.as_millis() as u64,
                        tick_millis = period.as_millis() as u64,
                        "control cycle overran tick period"
                    );
                    Duration::ZERO
                }
            };

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(remaining) => {}
            }
        }

        info!(target: CONTROL_LOOP_TARGET, cycles = self.cycles(), "cooling control loop stopped");
    }

    /// Feed random-walk inputs through the validated manual path until cancelled.
    pub async fn feed_inputs(
        &self,
        mut walk: SensorWalk,
        interval: Duration,
        token: CancellationToken,
    ) {
        info!(
            region = %walk.region(),
            interval_millis = interval.as_millis() as u64,
            "random-walk input provider started"
        );
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.apply_input(walk.next_input()) {
                        warn!(error = %e, "generated input rejected");
                    }
                }
            }
        }
    }
}

/// Start the control loop and, when configured, the random-walk input feeder.
pub fn spawn_controller_tasks(
    controller: Arc<CoolingController>,
    cfg: &Config,
    token: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    let loop_controller = controller.clone();
    let loop_token = token.clone();
    handles.push(tokio::spawn(async move {
        loop_controller.run(loop_token).await;
    }));

    if cfg.simulation.input_provider == InputProvider::RandomWalk {
        let walk = SensorWalk::new(cfg.simulation.sensor_walk());
        let interval = cfg.simulation.input_interval();
        handles.push(tokio::spawn(async move {
            controller.feed_inputs(walk, interval, token).await;
        }));
    }

    handles
}
