//! Lifecycle transitions of the driver instance.

use std::sync::{Arc, Mutex};

use bitflags as _;
use cte_driver::{
    Action, Cte, CteConfig, CteError, DriverStatus, IrqEvents, IrqRegistrar, IrqRequest,
    LogicState, OutputSignal, Register, RegistrationRejected, SetupParams, SignalDefinition,
    SignalType, SimulatedCte, StartOutcome, TimeTable, TimingEvent, WorkingMode, CNTRL1_CTE_EN,
    CNTRL_RFS_PGEN,
};
use log as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;

fn table(times: &[u32]) -> TimeTable {
    TimeTable::new(
        times
            .iter()
            .map(|time| {
                TimingEvent::new(
                    *time,
                    vec![Action::logic(OutputSignal::Ctep4, LogicState::High)],
                )
            })
            .collect(),
    )
}

fn params() -> SetupParams {
    SetupParams::single_table(
        80_000_000,
        vec![SignalDefinition::new(OutputSignal::Ctep4, SignalType::Logic)],
        table(&[0, 250, 500]),
    )
}

fn initialized(params: &SetupParams) -> Cte<SimulatedCte> {
    let mut cte = Cte::with_bus(SimulatedCte::new(), CteConfig::default());
    cte.setup(params).expect("setup succeeds");
    cte
}

fn running(params: &SetupParams) -> Cte<SimulatedCte> {
    let mut cte = initialized(params);
    assert_eq!(cte.start(), Ok(StartOutcome::Started));
    cte
}

fn sim(cte: &Cte<SimulatedCte>) -> &SimulatedCte {
    cte.bus().expect("simulated bus attached")
}

fn sim_mut(cte: &mut Cte<SimulatedCte>) -> &mut SimulatedCte {
    cte.bus_mut().expect("simulated bus attached")
}

fn enabled(cte: &Cte<SimulatedCte>) -> bool {
    CNTRL1_CTE_EN.decode(sim(cte).peek(Register::Cntrl1)) != 0
}

#[test]
fn start_before_setup_touches_no_register() {
    let mut cte = Cte::with_bus(SimulatedCte::new(), CteConfig::default());

    assert_eq!(cte.start(), Err(CteError::NotInitialized));
    assert!(sim(&cte).writes().is_empty());
    assert_eq!(cte.diagnostics().last_error, Some(CteError::NotInitialized));
}

#[rstest]
#[case::stop(|cte: &mut Cte<SimulatedCte>| cte.stop())]
#[case::restart(|cte: &mut Cte<SimulatedCte>| cte.restart().map(|_| ()))]
#[case::rfs(|cte: &mut Cte<SimulatedCte>| cte.rfs_generate())]
fn operations_before_setup_are_state_errors(
    #[case] operation: fn(&mut Cte<SimulatedCte>) -> Result<(), CteError>,
) {
    let mut cte = Cte::with_bus(SimulatedCte::new(), CteConfig::default());
    assert_eq!(operation(&mut cte), Err(CteError::NotInitialized));
    assert!(sim(&cte).writes().is_empty());
}

#[test]
fn start_while_executing_is_a_warning() {
    let mut cte = running(&params());

    let outcome = cte.start().expect("warning is not an error");

    assert_eq!(outcome, StartOutcome::AlreadyRunning);
    assert_eq!(outcome.warning(), Some(CteError::Running));
    assert_eq!(cte.status(), DriverStatus::Running);
    assert_eq!(cte.diagnostics().warnings, 1);
    assert_eq!(cte.diagnostics().total_errors(), 0);
}

#[test]
fn start_after_execution_finished_rearms() {
    let mut cte = running(&params());
    sim_mut(&mut cte).finish_execution();

    assert_eq!(cte.start(), Ok(StartOutcome::Rearmed));
    assert_eq!(StartOutcome::Rearmed.warning(), None);
    assert!(sim(&cte).is_executing());
}

#[test]
fn stop_requires_a_running_instance() {
    let mut cte = initialized(&params());
    assert_eq!(cte.stop(), Err(CteError::NotRunning));

    cte.start().expect("start succeeds");
    assert_eq!(cte.stop(), Ok(()));
    assert_eq!(cte.status(), DriverStatus::Initialized);
    assert!(!enabled(&cte));
    assert!(!sim(&cte).is_executing());
}

#[test]
fn restart_runs_from_either_state() {
    let mut cte = initialized(&params());
    assert_eq!(cte.restart(), Ok(StartOutcome::Started));
    assert_eq!(cte.restart(), Ok(StartOutcome::Started));
    assert_eq!(cte.status(), DriverStatus::Running);
    assert_eq!(cte.diagnostics().total_errors(), 0);
}

#[test]
fn update_while_running_stops_the_hardware() {
    let mut cte = running(&params());
    let before = cte.lut_checksum().expect("bus attached");

    let after = cte
        .update_tables(&table(&[0, 100]), None)
        .expect("update succeeds");

    assert_ne!(before, after);
    assert_eq!(cte.status(), DriverStatus::Initialized);
    assert!(!sim(&cte).is_executing());
    assert_eq!(cte.start(), Ok(StartOutcome::Started));
}

#[test]
fn rfs_pulse_in_slave_mode() {
    let params = params().with_mode(WorkingMode::SlaveExternal {
        rfs_delay: 2,
        rcs_delay: 3,
    });
    let mut cte = running(&params);
    sim_mut(&mut cte).clear_writes();

    assert_eq!(cte.rfs_generate(), Ok(()));
    let pulses: Vec<u32> = sim(&cte)
        .writes()
        .iter()
        .filter(|(reg, _)| *reg == Register::Cntrl)
        .map(|(_, value)| CNTRL_RFS_PGEN.decode(*value))
        .collect();
    assert_eq!(pulses, vec![1, 0]);
}

#[test]
fn rfs_after_hardware_halt_falls_back_to_initialized() {
    let params = params().with_mode(WorkingMode::SlaveCsi2 {
        unit: 1,
        virtual_channel: 0,
    });
    let mut cte = running(&params);
    sim_mut(&mut cte).finish_execution();

    assert_eq!(cte.rfs_generate(), Err(CteError::NotRunning));
    assert_eq!(cte.status(), DriverStatus::Initialized);
    assert!(!enabled(&cte));
}

struct Registrar {
    accept: bool,
    requests: Arc<Mutex<Vec<IrqRequest>>>,
}

impl IrqRegistrar for Registrar {
    fn register(&mut self, request: IrqRequest) -> Result<(), RegistrationRejected> {
        self.requests
            .lock()
            .expect("request log lock")
            .push(request);
        if self.accept {
            Ok(())
        } else {
            Err(RegistrationRejected {
                irq_number: request.irq_number,
            })
        }
    }
}

#[test]
fn handler_registration_uses_the_configured_line() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let config = CteConfig {
        irq_number: 300,
        ..CteConfig::default()
    };
    let mut cte = Cte::with_bus(SimulatedCte::new(), config).with_irq_registrar(Registrar {
        accept: true,
        requests: Arc::clone(&requests),
    });
    let mut params = params().with_irq(IrqEvents::RFS, Arc::new(|_: IrqEvents| {}));
    params.irq.exec_core = 2;
    params.irq.priority = 5;

    cte.setup(&params).expect("setup succeeds");

    assert_eq!(
        *requests.lock().expect("request log lock"),
        vec![IrqRequest {
            irq_number: 300,
            exec_core: 2,
            priority: 5,
        }]
    );
    assert_eq!(cte.requested_events(), IrqEvents::RFS);
}

#[test]
fn refused_registration_fails_setup() {
    let mut cte =
        Cte::with_bus(SimulatedCte::new(), CteConfig::default()).with_irq_registrar(Registrar {
            accept: false,
            requests: Arc::new(Mutex::new(Vec::new())),
        });

    assert_eq!(cte.setup(&params()), Err(CteError::IrqRegisterFailed));
    assert_eq!(cte.status(), DriverStatus::NotInit);
    assert_eq!(cte.diagnostics().hardware_errors, 1);
    assert_eq!(sim(&cte).peek(Register::IntEn), 0);
}

#[test]
fn events_without_callback_are_rejected() {
    let mut cte = Cte::with_bus(SimulatedCte::new(), CteConfig::default());
    let mut params = params();
    params.irq.events = IrqEvents::TT0_START;

    assert_eq!(cte.setup(&params), Err(CteError::NullCallback));
}
