//! CTE driver instance: setup orchestration and the run-state machine.

use log::{debug, error, info, warn};

use crate::clock::{self, ClockPlan};
use crate::compile::{compile_table, CompiledTable};
use crate::config::CteConfig;
use crate::diag::{DiagCounters, ErrorHook};
use crate::error::CteError;
use crate::irq::{self, IrqRegistrar};
use crate::output::program_output_types;
use crate::regs::{
    Register, RegisterBus, CKSM_MSB_MASK, CNTRL1_CHKSM_MD, CNTRL1_CKSM_RST, CNTRL1_CTECK_DV,
    CNTRL1_CTE_EN, CNTRL1_TIMEMODE, CNTRL_CTE_RST, CNTRL_MA_SL_ST, CNTRL_OPMOD_SL, CNTRL_RCS_DLY,
    CNTRL_REP_CNT, CNTRL_RFS_DLY, CNTRL_RFS_PGEN, DBG_REG_FSM_ST, SRC_CTE_CTRL_IN_CTE,
    SRC_CTE_CTRL_MIPICSI2_ID, SRC_CTE_CTRL_VC_ID,
};
use crate::timing::{self, ns_to_ticks};
use crate::types::{IrqCallback, IrqEvents, SetupParams, SignalDefinition, TimeTable, WorkingMode};
use crate::validate;

/// `OPMOD_SL` value running table 0 alone.
const RUN_MODE_SINGLE: u32 = 2;
/// `OPMOD_SL` value alternating both LUT pages.
const RUN_MODE_TOGGLE: u32 = 3;
/// `LUT_DUR1` value meaning no duration limit.
const UNLIMITED_DURATION: u32 = u32::MAX;

/// Driver lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DriverStatus {
    /// No successful setup yet, or the last setup failed.
    #[default]
    NotInit,
    /// Programmed and stopped.
    Initialized,
    /// Table execution enabled.
    Running,
}

/// Successful outcome of [`Cte::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StartOutcome {
    /// Execution enabled from the initialized state.
    Started,
    /// Execution had finished; the enable bit was toggled to run again.
    Rearmed,
    /// Warning: the hardware is still executing, nothing was changed.
    AlreadyRunning,
}

impl StartOutcome {
    /// Warning status carried by the outcome, if any.
    #[must_use]
    pub const fn warning(self) -> Option<CteError> {
        match self {
            Self::AlreadyRunning => Some(CteError::Running),
            Self::Started | Self::Rearmed => None,
        }
    }
}

/// Everything remembered from the last successful setup.
#[derive(Default)]
struct DriverState {
    status: DriverStatus,
    mode: WorkingMode,
    main_divider: u8,
    working_freq_hz: u32,
    clock_plan: ClockPlan,
    requested_events: IrqEvents,
    callback: Option<IrqCallback>,
    signal_def0: Vec<SignalDefinition>,
    signal_def1: Option<Vec<SignalDefinition>>,
}

/// One CTE peripheral instance driven through a [`RegisterBus`].
///
/// The instance owns all driver state; callers sharing it between threads
/// must serialise access themselves.
pub struct Cte<B> {
    bus: Option<B>,
    config: CteConfig,
    state: DriverState,
    diag: DiagCounters,
    error_hook: Option<ErrorHook>,
    registrar: Option<Box<dyn IrqRegistrar + Send>>,
}

impl<B: RegisterBus> Cte<B> {
    /// Creates a driver whose register block is not resolved yet.
    ///
    /// [`Self::setup`] fails with [`CteError::NotInitialized`] until a bus is
    /// attached with [`Self::attach_bus`].
    #[must_use]
    pub fn new(config: CteConfig) -> Self {
        Self {
            bus: None,
            config,
            state: DriverState::default(),
            diag: DiagCounters::new(),
            error_hook: None,
            registrar: None,
        }
    }

    /// Creates a driver bound to `bus`.
    #[must_use]
    pub fn with_bus(bus: B, config: CteConfig) -> Self {
        let mut cte = Self::new(config);
        cte.bus = Some(bus);
        cte
    }

    /// Attaches the interrupt registration glue used by [`Self::setup`].
    #[must_use]
    pub fn with_irq_registrar(mut self, registrar: impl IrqRegistrar + Send + 'static) -> Self {
        self.registrar = Some(Box::new(registrar));
        self
    }

    /// Resolves the register block.
    pub fn attach_bus(&mut self, bus: B) {
        self.bus = Some(bus);
    }

    /// Installs a hook called with every reported error.
    pub fn set_error_hook(&mut self, hook: impl FnMut(CteError) + Send + 'static) {
        self.error_hook = Some(Box::new(hook));
    }

    /// Removes the error hook.
    pub fn clear_error_hook(&mut self) {
        self.error_hook = None;
    }

    /// Register bus, if attached.
    #[must_use]
    pub const fn bus(&self) -> Option<&B> {
        self.bus.as_ref()
    }

    /// Mutable register bus, if attached.
    pub fn bus_mut(&mut self) -> Option<&mut B> {
        self.bus.as_mut()
    }

    /// Releases the register bus.
    #[must_use]
    pub fn into_bus(self) -> Option<B> {
        self.bus
    }

    /// Instance configuration.
    #[must_use]
    pub const fn config(&self) -> &CteConfig {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> DriverStatus {
        self.state.status
    }

    /// Programmed main clock divider, 0 before the first setup.
    #[must_use]
    pub const fn main_divider(&self) -> u8 {
        self.state.main_divider
    }

    /// Input clock given to the last successful setup.
    #[must_use]
    pub const fn working_frequency(&self) -> u32 {
        self.state.working_freq_hz
    }

    /// Output clock dividers of the last successful setup.
    #[must_use]
    pub const fn clock_plan(&self) -> &ClockPlan {
        &self.state.clock_plan
    }

    /// Interrupt events delivered to the callback.
    #[must_use]
    pub const fn requested_events(&self) -> IrqEvents {
        self.state.requested_events
    }

    /// Signal definitions programmed for table 0 and table 1.
    #[must_use]
    pub fn signal_definitions(&self) -> (&[SignalDefinition], Option<&[SignalDefinition]>) {
        (&self.state.signal_def0, self.state.signal_def1.as_deref())
    }

    /// Error counters.
    #[must_use]
    pub const fn diagnostics(&self) -> &DiagCounters {
        &self.diag
    }

    /// Clears the error counters.
    pub fn reset_diagnostics(&mut self) {
        self.diag.reset();
    }

    fn report<T>(&mut self, result: Result<T, CteError>) -> Result<T, CteError> {
        if let Err(err) = &result {
            error!("cte error 0x{:02X}: {err}", err.as_u8());
            self.diag.record_error(*err);
            if let Some(hook) = self.error_hook.as_mut() {
                hook(*err);
            }
        }
        result
    }

    /// Validates `params` and programs the peripheral, leaving it stopped.
    ///
    /// Returns the LUT checksum read back after the tables were written.
    ///
    /// # Errors
    ///
    /// The first validation, clocking, mapping or interrupt registration
    /// error. The driver is left in [`DriverStatus::NotInit`].
    pub fn setup(&mut self, params: &SetupParams) -> Result<u64, CteError> {
        let result = self.setup_inner(params);
        self.report(result)
    }

    fn setup_inner(&mut self, params: &SetupParams) -> Result<u64, CteError> {
        self.state.status = DriverStatus::NotInit;
        validate::check_setup(params, self.config.platform)?;
        let bus = self.bus.as_mut().ok_or(CteError::NotInitialized)?;

        let table0 = params.table0.as_ref().ok_or(CteError::NullPtrTable0)?;
        let defs0 = params
            .signal_def0
            .as_deref()
            .ok_or(CteError::NullPtrSignalDef)?;
        let table1 = params.table1.as_ref();
        let defs1 = params.signal_def1.as_deref();
        let clock_hz = params.clock_hz;

        let main_divider = timing::main_divider(table0, table1, clock_hz)?;
        debug!("main clock divider {main_divider} for {clock_hz} Hz");
        let compiled0 = compile_table(table0, defs0, clock_hz, main_divider)?;
        let compiled1 = match (table1, defs1) {
            (Some(table1), Some(defs1)) => {
                Some(compile_table(table1, defs1, clock_hz, main_divider)?)
            }
            _ => None,
        };
        let plan = clock::solve(defs0, defs1, clock_hz)?;
        debug!("output clock periods {:?} ns", plan.periods_ns());

        bus.pulse_field(CNTRL_CTE_RST);
        bus.write_field(CNTRL1_CHKSM_MD, 1);
        let checksum = write_tables(bus, &compiled0, compiled1.as_ref());

        program_output_types(bus, defs0, 0);
        if let Some(defs1) = defs1 {
            program_output_types(bus, defs1, 1);
        }
        if compiled0.spans_two_pages() {
            program_output_types(bus, defs0, 1);
        }

        program_mode(bus, params.mode);
        bus.write_field(CNTRL_REP_CNT, u32::from(params.repeat_count));
        bus.write_field(CNTRL_OPMOD_SL, run_mode(table0, table1));
        program_time_limits(bus, table0, table1, clock_hz, main_divider);
        bus.write_field(CNTRL1_TIMEMODE, 0);
        bus.write_field(CNTRL1_CTECK_DV, u32::from(main_divider));
        plan.program(bus);
        clock::program_clock_select(bus, &plan, defs0, defs1);

        irq::configure_interrupts(
            bus,
            self.registrar.as_deref_mut(),
            self.config.irq_number,
            &params.irq,
        )?;

        self.state = DriverState {
            status: DriverStatus::Initialized,
            mode: params.mode,
            main_divider,
            working_freq_hz: clock_hz,
            clock_plan: plan,
            requested_events: params.irq.events,
            callback: params.irq.callback.clone(),
            signal_def0: defs0.to_vec(),
            signal_def1: defs1.map(<[SignalDefinition]>::to_vec),
        };
        info!("cte setup complete, lut checksum 0x{checksum:010X}");
        Ok(checksum)
    }

    /// Enables table execution.
    ///
    /// # Errors
    ///
    /// [`CteError::NotInitialized`] before a successful setup.
    pub fn start(&mut self) -> Result<StartOutcome, CteError> {
        let result = self.start_inner();
        if result == Ok(StartOutcome::AlreadyRunning) {
            warn!("cte start ignored, tables still executing");
            self.diag.record_warning();
        }
        self.report(result)
    }

    fn start_inner(&mut self) -> Result<StartOutcome, CteError> {
        if self.state.status == DriverStatus::NotInit {
            return Err(CteError::NotInitialized);
        }
        let bus = self.bus.as_mut().ok_or(CteError::NotInitialized)?;
        match self.state.status {
            DriverStatus::Running if bus.read_field(DBG_REG_FSM_ST) != 0 => {
                Ok(StartOutcome::AlreadyRunning)
            }
            DriverStatus::Running => {
                bus.write_field(CNTRL1_CTE_EN, 0);
                bus.write_field(CNTRL1_CTE_EN, 1);
                debug!("cte re-armed");
                Ok(StartOutcome::Rearmed)
            }
            _ => {
                self.state.status = DriverStatus::Running;
                bus.write_field(CNTRL1_CTE_EN, 1);
                debug!("cte started");
                Ok(StartOutcome::Started)
            }
        }
    }

    /// Disables table execution.
    ///
    /// # Errors
    ///
    /// [`CteError::NotInitialized`] before setup, [`CteError::NotRunning`]
    /// when already stopped.
    pub fn stop(&mut self) -> Result<(), CteError> {
        let result = self.stop_inner();
        self.report(result)
    }

    fn stop_inner(&mut self) -> Result<(), CteError> {
        match self.state.status {
            DriverStatus::NotInit => Err(CteError::NotInitialized),
            DriverStatus::Initialized => Err(CteError::NotRunning),
            DriverStatus::Running => {
                let bus = self.bus.as_mut().ok_or(CteError::NotInitialized)?;
                bus.write_field(CNTRL1_CTE_EN, 0);
                self.state.status = DriverStatus::Initialized;
                debug!("cte stopped");
                Ok(())
            }
        }
    }

    /// Stops execution if running, then starts it again.
    ///
    /// # Errors
    ///
    /// [`CteError::NotInitialized`] before a successful setup.
    pub fn restart(&mut self) -> Result<StartOutcome, CteError> {
        if self.state.status == DriverStatus::NotInit {
            return self.report(Err(CteError::NotInitialized));
        }
        // Stopping an already stopped instance is expected here.
        let _ = self.stop_inner();
        self.start()
    }

    /// Pulses a software RFS, restarting table execution in slave mode.
    ///
    /// # Errors
    ///
    /// [`CteError::NotInitialized`], [`CteError::NotRunning`] (also when the
    /// hardware halted, which stops the driver) or [`CteError::WrongMode`]
    /// in master mode.
    pub fn rfs_generate(&mut self) -> Result<(), CteError> {
        let result = self.rfs_generate_inner();
        self.report(result)
    }

    fn rfs_generate_inner(&mut self) -> Result<(), CteError> {
        match self.state.status {
            DriverStatus::NotInit => return Err(CteError::NotInitialized),
            DriverStatus::Initialized => return Err(CteError::NotRunning),
            DriverStatus::Running => {}
        }
        if !self.state.mode.is_slave() {
            return Err(CteError::WrongMode);
        }
        let bus = self.bus.as_mut().ok_or(CteError::NotInitialized)?;
        if bus.read_field(DBG_REG_FSM_ST) == 0 {
            bus.write_field(CNTRL1_CTE_EN, 0);
            self.state.status = DriverStatus::Initialized;
            debug!("cte halted before rfs, driver stopped");
            return Err(CteError::NotRunning);
        }
        bus.pulse_field(CNTRL_RFS_PGEN);
        Ok(())
    }

    /// Replaces the time tables, keeping the signal definitions, clocks and
    /// main divider of the last setup.
    ///
    /// A running instance is stopped first and stays stopped. Returns the
    /// new LUT checksum.
    ///
    /// # Errors
    ///
    /// [`CteError::NotInitialized`], [`CteError::WrongPtrTable1`] when the
    /// table count differs from setup, the table check errors, mapping
    /// errors, or [`CteError::ClockDividerError`] when the tables need a
    /// larger main divider than programmed. Nothing is changed on error.
    pub fn update_tables(
        &mut self,
        table0: &TimeTable,
        table1: Option<&TimeTable>,
    ) -> Result<u64, CteError> {
        let result = self.update_tables_inner(table0, table1);
        self.report(result)
    }

    fn update_tables_inner(
        &mut self,
        table0: &TimeTable,
        table1: Option<&TimeTable>,
    ) -> Result<u64, CteError> {
        if self.state.status == DriverStatus::NotInit {
            return Err(CteError::NotInitialized);
        }
        let state = &self.state;
        if table1.is_some() != state.signal_def1.is_some() {
            return Err(CteError::WrongPtrTable1);
        }
        validate::check_table(table0)?;
        if let Some(table1) = table1 {
            validate::check_pair_lengths(table0, table1)?;
            validate::check_table(table1)?;
        }
        let clock_hz = state.working_freq_hz;
        let required = timing::required_main_divider(table0, table1, clock_hz);
        if required > state.main_divider {
            return Err(CteError::ClockDividerError);
        }

        let compiled0 = compile_table(table0, &state.signal_def0, clock_hz, state.main_divider)?;
        let compiled1 = match (table1, state.signal_def1.as_deref()) {
            (Some(table1), Some(defs1)) => {
                Some(compile_table(table1, defs1, clock_hz, state.main_divider)?)
            }
            _ => None,
        };

        let bus = self.bus.as_mut().ok_or(CteError::NotInitialized)?;
        if self.state.status == DriverStatus::Running {
            bus.write_field(CNTRL1_CTE_EN, 0);
            self.state.status = DriverStatus::Initialized;
            debug!("cte stopped for table update");
        }
        bus.pulse_field(CNTRL1_CKSM_RST);
        let checksum = write_tables(bus, &compiled0, compiled1.as_ref());

        if table1.is_none() {
            if compiled0.spans_two_pages() {
                program_output_types(bus, &self.state.signal_def0, 1);
            }
            bus.write_field(CNTRL_OPMOD_SL, run_mode(table0, None));
        }
        program_time_limits(bus, table0, table1, clock_hz, self.state.main_divider);
        info!("cte tables updated, lut checksum 0x{checksum:010X}");
        Ok(checksum)
    }

    /// LUT checksum currently reported by the hardware (40 bits).
    ///
    /// # Errors
    ///
    /// [`CteError::NotInitialized`] when no register bus is attached.
    pub fn lut_checksum(&mut self) -> Result<u64, CteError> {
        let result = self
            .bus
            .as_mut()
            .map(read_checksum)
            .ok_or(CteError::NotInitialized);
        self.report(result)
    }

    /// Services a CTE interrupt: acknowledges every pending source and
    /// hands the requested ones to the callback.
    ///
    /// Returns the events delivered.
    pub fn handle_interrupt(&mut self) -> IrqEvents {
        let Some(bus) = self.bus.as_mut() else {
            return IrqEvents::empty();
        };
        let delivered = irq::service_interrupt(bus, self.state.requested_events);
        if !delivered.is_empty() {
            if let Some(callback) = &self.state.callback {
                callback(delivered);
            }
        }
        delivered
    }
}

fn read_checksum<B: RegisterBus + ?Sized>(bus: &mut B) -> u64 {
    let msb = u64::from(bus.read32(Register::CksmMsb) & CKSM_MSB_MASK);
    (msb << 32) | u64::from(bus.read32(Register::CksmLsb))
}

fn write_tables<B: RegisterBus + ?Sized>(
    bus: &mut B,
    compiled0: &CompiledTable,
    compiled1: Option<&CompiledTable>,
) -> u64 {
    compiled0.write_to(bus, 0);
    if let Some(compiled1) = compiled1 {
        compiled1.write_to(bus, 1);
    }
    read_checksum(bus)
}

fn program_mode<B: RegisterBus + ?Sized>(bus: &mut B, mode: WorkingMode) {
    match mode {
        WorkingMode::Master => bus.write_field(CNTRL_MA_SL_ST, 0),
        WorkingMode::SlaveExternal {
            rfs_delay,
            rcs_delay,
        } => {
            bus.write_field(CNTRL_MA_SL_ST, 1);
            bus.write_field(SRC_CTE_CTRL_IN_CTE, 0);
            bus.write_field(CNTRL_RFS_DLY, u32::from(rfs_delay));
            bus.write_field(CNTRL_RCS_DLY, u32::from(rcs_delay));
        }
        WorkingMode::SlaveCsi2 {
            unit,
            virtual_channel,
        } => {
            bus.write_field(CNTRL_MA_SL_ST, 1);
            bus.write_field(SRC_CTE_CTRL_IN_CTE, 1);
            bus.write_field(SRC_CTE_CTRL_MIPICSI2_ID, u32::from(unit));
            bus.write_field(SRC_CTE_CTRL_VC_ID, u32::from(virtual_channel));
        }
    }
}

fn run_mode(table0: &TimeTable, table1: Option<&TimeTable>) -> u32 {
    if table1.is_some() || table0.spans_two_pages() {
        RUN_MODE_TOGGLE
    } else {
        RUN_MODE_SINGLE
    }
}

fn program_time_limits<B: RegisterBus + ?Sized>(
    bus: &mut B,
    table0: &TimeTable,
    table1: Option<&TimeTable>,
    clock_hz: u32,
    main_divider: u8,
) {
    let duration0 = ns_to_ticks(table0.exec_time_limit_ns, clock_hz, main_divider);
    match table1 {
        Some(table1) => {
            bus.write32(Register::LutDur, duration0);
            bus.write32(
                Register::LutDur1,
                ns_to_ticks(table1.exec_time_limit_ns, clock_hz, main_divider),
            );
        }
        None if table0.spans_two_pages() => {
            bus.write32(Register::LutDur, 0);
            let duration1 = if duration0 == 0 {
                UNLIMITED_DURATION
            } else {
                duration0
            };
            bus.write32(Register::LutDur1, duration1);
        }
        None => bus.write32(Register::LutDur, duration0),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{run_mode, Cte, DriverStatus, StartOutcome};
    use crate::config::CteConfig;
    use crate::error::CteError;
    use crate::regs::{
        Register, CNTRL1_CTECK_DV, CNTRL_MA_SL_ST, CNTRL_OPMOD_SL, CNTRL_RCS_DLY, CNTRL_REP_CNT,
        CNTRL_RFS_DLY, SRC_CTE_CTRL_IN_CTE, SRC_CTE_CTRL_MIPICSI2_ID, SRC_CTE_CTRL_VC_ID,
    };
    use crate::sim::SimulatedCte;
    use crate::types::{
        Action, IrqEvents, LogicState, OutputSignal, SetupParams, SignalDefinition, SignalType,
        TimeTable, TimingEvent, WorkingMode,
    };

    fn table(times: &[u32]) -> TimeTable {
        TimeTable::new(
            times
                .iter()
                .map(|time| {
                    TimingEvent::new(
                        *time,
                        vec![Action::logic(OutputSignal::Ctep1, LogicState::High)],
                    )
                })
                .collect(),
        )
    }

    fn defs() -> Vec<SignalDefinition> {
        vec![SignalDefinition::new(OutputSignal::Ctep1, SignalType::Logic)]
    }

    fn driver() -> Cte<SimulatedCte> {
        Cte::with_bus(SimulatedCte::new(), CteConfig::default())
    }

    fn bus(cte: &Cte<SimulatedCte>) -> &SimulatedCte {
        cte.bus().expect("bus attached")
    }

    #[test]
    fn setup_without_bus_reports_not_initialized() {
        let mut cte: Cte<SimulatedCte> = Cte::new(CteConfig::default());
        let params = SetupParams::single_table(80_000_000, defs(), table(&[0, 100]));
        assert_eq!(cte.setup(&params), Err(CteError::NotInitialized));

        cte.attach_bus(SimulatedCte::new());
        assert!(cte.setup(&params).is_ok());
        assert_eq!(cte.status(), DriverStatus::Initialized);
    }

    #[test]
    fn csi2_slave_programs_input_selection() {
        let mut cte = driver();
        let params = SetupParams::single_table(80_000_000, defs(), table(&[0, 100])).with_mode(
            WorkingMode::SlaveCsi2 {
                unit: 2,
                virtual_channel: 3,
            },
        );
        cte.setup(&params).expect("setup");

        let ctrl = bus(&cte).peek(Register::SrcCteCtrl);
        assert_eq!(SRC_CTE_CTRL_IN_CTE.decode(ctrl), 1);
        assert_eq!(SRC_CTE_CTRL_MIPICSI2_ID.decode(ctrl), 2);
        assert_eq!(SRC_CTE_CTRL_VC_ID.decode(ctrl), 3);
        assert_eq!(CNTRL_MA_SL_ST.decode(bus(&cte).peek(Register::Cntrl)), 1);
    }

    #[test]
    fn external_slave_programs_input_delays() {
        let mut cte = driver();
        let params = SetupParams::single_table(80_000_000, defs(), table(&[0, 100]))
            .with_mode(WorkingMode::SlaveExternal {
                rfs_delay: 7,
                rcs_delay: 12,
            })
            .with_repeat_count(4);
        cte.setup(&params).expect("setup");

        let cntrl = bus(&cte).peek(Register::Cntrl);
        assert_eq!(CNTRL_RFS_DLY.decode(cntrl), 7);
        assert_eq!(CNTRL_RCS_DLY.decode(cntrl), 12);
        assert_eq!(CNTRL_REP_CNT.decode(cntrl), 4);
        assert_eq!(SRC_CTE_CTRL_IN_CTE.decode(bus(&cte).peek(Register::SrcCteCtrl)), 0);
    }

    #[test]
    fn long_single_table_uses_toggle_mode_and_second_duration() {
        let times: Vec<u32> = (0..40).map(|index| index * 1000).collect();
        let mut cte = driver();
        let params = SetupParams::single_table(
            80_000_000,
            defs(),
            table(&times).with_exec_time_limit(0),
        );
        cte.setup(&params).expect("setup");

        let sim = bus(&cte);
        assert_eq!(CNTRL_OPMOD_SL.decode(sim.peek(Register::Cntrl)), 3);
        assert_eq!(sim.peek(Register::LutDur), 0);
        assert_eq!(sim.peek(Register::LutDur1), u32::MAX);
        assert_eq!(
            sim.peek(Register::SigType0(1)),
            sim.peek(Register::SigType0(0))
        );
        assert_ne!(sim.peek(Register::SigType0(1)), 0);
    }

    #[test]
    fn short_table_limit_is_converted_to_ticks() {
        let mut cte = driver();
        let params = SetupParams::single_table(
            80_000_000,
            defs(),
            table(&[0, 100]).with_exec_time_limit(2_000),
        );
        cte.setup(&params).expect("setup");
        assert_eq!(bus(&cte).peek(Register::LutDur), 160);
        assert_eq!(run_mode(&table(&[0]), None), 2);
        assert_eq!(
            CNTRL1_CTECK_DV.decode(bus(&cte).peek(Register::Cntrl1)),
            u32::from(cte.main_divider())
        );
    }

    #[test]
    fn failed_setup_leaves_driver_uninitialized() {
        let mut cte = driver();
        cte.setup(&SetupParams::single_table(80_000_000, defs(), table(&[0])))
            .expect("setup");
        let broken = SetupParams::single_table(
            80_000_000,
            vec![SignalDefinition::new(OutputSignal::Ctep0, SignalType::Logic)],
            table(&[0]),
        );
        assert_eq!(cte.setup(&broken), Err(CteError::SigNotDefined));
        assert_eq!(cte.status(), DriverStatus::NotInit);
        assert_eq!(cte.start(), Err(CteError::NotInitialized));
    }

    #[test]
    fn rfs_generation_requires_slave_mode() {
        let mut cte = driver();
        cte.setup(&SetupParams::single_table(80_000_000, defs(), table(&[0])))
            .expect("setup");
        assert_eq!(cte.rfs_generate(), Err(CteError::NotRunning));
        assert_eq!(cte.start(), Ok(StartOutcome::Started));
        assert_eq!(cte.rfs_generate(), Err(CteError::WrongMode));
    }

    #[test]
    fn error_hook_and_counters_see_every_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut cte = driver();
        cte.set_error_hook(move |err| sink.lock().expect("hook lock").push(err));

        assert_eq!(cte.stop(), Err(CteError::NotInitialized));
        assert_eq!(cte.restart(), Err(CteError::NotInitialized));

        assert_eq!(
            *seen.lock().expect("hook lock"),
            vec![CteError::NotInitialized, CteError::NotInitialized]
        );
        assert_eq!(cte.diagnostics().state_errors, 2);

        cte.clear_error_hook();
        cte.reset_diagnostics();
        assert_eq!(cte.diagnostics().total_errors(), 0);
    }

    #[test]
    fn interrupt_reaches_callback_with_requested_events_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut cte = driver();
        let params = SetupParams::single_table(80_000_000, defs(), table(&[0])).with_irq(
            IrqEvents::TT0_END,
            Arc::new(move |events: IrqEvents| sink.lock().expect("callback lock").push(events)),
        );
        cte.setup(&params).expect("setup");
        assert_eq!(bus(&cte).peek(Register::IntEn), IrqEvents::TT0_END.bits());

        cte.bus_mut()
            .expect("bus attached")
            .raise_interrupt(IrqEvents::TT0_END | IrqEvents::RCS);
        assert_eq!(cte.handle_interrupt(), IrqEvents::TT0_END);
        assert_eq!(cte.handle_interrupt(), IrqEvents::empty());
        assert_eq!(*seen.lock().expect("callback lock"), vec![IrqEvents::TT0_END]);
    }
}
