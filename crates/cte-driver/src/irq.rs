//! Interrupt enable programming and interrupt status servicing.

use thiserror::Error;

use crate::error::CteError;
use crate::regs::{Register, RegisterBus};
use crate::types::{IrqEvents, IrqSetup};

/// Handler registration request passed to an [`IrqRegistrar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqRequest {
    /// Interrupt line of the CTE.
    pub irq_number: u32,
    /// Core executing the handler.
    pub exec_core: i8,
    /// Handler priority.
    pub priority: u8,
}

/// Refusal reported by an [`IrqRegistrar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("interrupt line {irq_number} refused the handler")]
pub struct RegistrationRejected {
    /// Line that refused the registration.
    pub irq_number: u32,
}

/// Platform glue attaching the CTE handler to the interrupt controller.
///
/// The registered handler is expected to call [`crate::Cte::handle_interrupt`].
pub trait IrqRegistrar {
    /// Attaches the handler described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationRejected`] when the platform refuses the handler.
    fn register(&mut self, request: IrqRequest) -> Result<(), RegistrationRejected>;
}

/// Masks every source, registers the handler if a registrar is attached,
/// then enables the requested events.
///
/// # Errors
///
/// [`CteError::IrqRegisterFailed`] when the registrar refuses the handler;
/// the sources stay masked.
pub fn configure_interrupts<B, R>(
    bus: &mut B,
    registrar: Option<&mut R>,
    irq_number: u32,
    setup: &IrqSetup,
) -> Result<(), CteError>
where
    B: RegisterBus + ?Sized,
    R: IrqRegistrar + ?Sized,
{
    bus.write32(Register::IntEn, 0);
    if let Some(registrar) = registrar {
        registrar
            .register(IrqRequest {
                irq_number,
                exec_core: setup.exec_core,
                priority: setup.priority,
            })
            .map_err(|_| CteError::IrqRegisterFailed)?;
    }
    if !setup.events.is_empty() {
        bus.write32(Register::IntEn, setup.events.bits());
    }
    Ok(())
}

/// Reads and clears the interrupt status, returning the requested subset.
pub fn service_interrupt<B: RegisterBus + ?Sized>(bus: &mut B, requested: IrqEvents) -> IrqEvents {
    let status = bus.read32(Register::IntStat);
    bus.write32(Register::IntStat, status);
    IrqEvents::from_bits_truncate(status) & requested
}
