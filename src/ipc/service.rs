/*!
 * Services
 * Fixed service endpoints and the handler slots behind them
 *
 * Each system service is reachable through a reserved handle just past the
 * pseudo-handles. Requests on those handles are routed to a registered
 * [`ServiceHandler`], which receives the whole kernel for the duration of the
 * call.
 */

use crate::core::data_structures::InlineString;
use crate::core::errors::KernelError;
use crate::core::types::{GuestAddr, Handle, KernelResult};
use crate::kernel::Kernel;
use crate::objects::handles::MIN_SERVICE_HANDLE;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service endpoint; the discriminant is the offset from the first service handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum ServiceId {
    Ac = 0,
    Act,
    Am,
    Apt,
    Boss,
    Cam,
    Cecd,
    Cfg,
    Hid,
    Frd,
    Fs,
    Gpu,
    Dsp,
    Lcd,
    LdrRo,
    Mic,
    Nfc,
    Nim,
    Ndm,
    Ptm,
    Y2r,
}

pub const SERVICE_COUNT: usize = 21;

impl ServiceId {
    pub const ALL: [ServiceId; SERVICE_COUNT] = [
        Self::Ac,
        Self::Act,
        Self::Am,
        Self::Apt,
        Self::Boss,
        Self::Cam,
        Self::Cecd,
        Self::Cfg,
        Self::Hid,
        Self::Frd,
        Self::Fs,
        Self::Gpu,
        Self::Dsp,
        Self::Lcd,
        Self::LdrRo,
        Self::Mic,
        Self::Nfc,
        Self::Nim,
        Self::Ndm,
        Self::Ptm,
        Self::Y2r,
    ];

    #[inline]
    pub const fn handle(self) -> Handle {
        MIN_SERVICE_HANDLE + self as u32
    }

    pub fn from_handle(handle: Handle) -> Option<Self> {
        let offset = handle.checked_sub(MIN_SERVICE_HANDLE)? as usize;
        Self::ALL.get(offset).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ac => "AC",
            Self::Act => "ACT",
            Self::Am => "AM",
            Self::Apt => "APT",
            Self::Boss => "BOSS",
            Self::Cam => "CAM",
            Self::Cecd => "CECD",
            Self::Cfg => "CFG",
            Self::Hid => "HID",
            Self::Frd => "FRD",
            Self::Fs => "FS",
            Self::Gpu => "GSP::GPU",
            Self::Dsp => "DSP",
            Self::Lcd => "GSP::LCD",
            Self::LdrRo => "LDR:RO",
            Self::Mic => "MIC",
            Self::Nfc => "NFC",
            Self::Nim => "NIM",
            Self::Ndm => "NDM",
            Self::Ptm => "PTM",
            Self::Y2r => "Y2R",
        }
    }

    /// Service reached through a `srv:GetServiceHandle` port name
    pub fn from_port_name(name: &str) -> Option<Self> {
        let id = match name {
            "ac:u" | "ac:i" => Self::Ac,
            "act:u" | "act:a" => Self::Act,
            "am:app" | "am:sys" => Self::Am,
            "APT:S" | "APT:A" | "APT:U" => Self::Apt,
            "boss:U" | "boss:P" => Self::Boss,
            "cam:u" => Self::Cam,
            "cecd:u" => Self::Cecd,
            "cfg:u" | "cfg:i" | "cfg:s" => Self::Cfg,
            "dsp::DSP" => Self::Dsp,
            "hid:USER" | "hid:SPVR" => Self::Hid,
            "frd:u" | "frd:a" => Self::Frd,
            "fs:USER" => Self::Fs,
            "gsp::Gpu" => Self::Gpu,
            "gsp::Lcd" => Self::Lcd,
            "ldr:ro" => Self::LdrRo,
            "mic:u" => Self::Mic,
            "ndm:u" => Self::Ndm,
            "nfc:u" => Self::Nfc,
            "nim:aoc" => Self::Nim,
            "ptm:u" | "ptm:sysm" | "ptm:play" => Self::Ptm,
            "y2r:u" => Self::Y2r,
            _ => return None,
        };
        Some(id)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// System service implementation
///
/// `handle_request` reads the command at `message` (the caller's command
/// buffer) and writes the reply in place. Results the guest should see go in
/// the reply; an `Err` is fatal to emulation.
pub trait ServiceHandler {
    fn name(&self) -> &str;

    fn handle_request(&mut self, kernel: &mut Kernel, message: GuestAddr) -> KernelResult<()>;

    /// An event created with this service's callback was signalled
    fn on_event_signalled(&mut self, _kernel: &mut Kernel, _tag: u32) -> KernelResult<()> {
        Ok(())
    }

    /// Drop all per-boot state
    fn reset(&mut self) {}
}

enum Slot {
    Vacant,
    Idle(Box<dyn ServiceHandler>),
    /// Handler is on loan to an in-flight request
    Busy,
}

/// Handler slots indexed by [`ServiceId`]
///
/// A handler is taken out of its slot while it runs so it can borrow the
/// kernel mutably, then restored. Re-entering a busy service is an error.
pub struct ServiceManager {
    slots: Vec<Slot>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self {
            slots: (0..SERVICE_COUNT).map(|_| Slot::Vacant).collect(),
        }
    }

    /// Install a handler, returning the one it replaces
    pub fn register(
        &mut self,
        id: ServiceId,
        handler: Box<dyn ServiceHandler>,
    ) -> Option<Box<dyn ServiceHandler>> {
        match std::mem::replace(&mut self.slots[id as usize], Slot::Idle(handler)) {
            Slot::Idle(previous) => Some(previous),
            Slot::Vacant => None,
            Slot::Busy => {
                warn!("Service {} replaced while handling a request", id);
                None
            }
        }
    }

    pub fn is_registered(&self, id: ServiceId) -> bool {
        !matches!(self.slots[id as usize], Slot::Vacant)
    }

    pub fn take(&mut self, id: ServiceId) -> KernelResult<Box<dyn ServiceHandler>> {
        let slot = &mut self.slots[id as usize];
        match std::mem::replace(slot, Slot::Busy) {
            Slot::Idle(handler) => Ok(handler),
            Slot::Busy => Err(KernelError::ServiceBusy(InlineString::from(id.name()))),
            Slot::Vacant => {
                *slot = Slot::Vacant;
                Err(KernelError::UnknownService(InlineString::from(id.name())))
            }
        }
    }

    pub fn restore(&mut self, id: ServiceId, handler: Box<dyn ServiceHandler>) {
        self.slots[id as usize] = Slot::Idle(handler);
    }

    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            if let Slot::Idle(handler) = slot {
                handler.reset();
            }
        }
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<_> = ServiceId::ALL
            .iter()
            .filter(|&&id| self.is_registered(id))
            .map(|id| id.name())
            .collect();
        f.debug_struct("ServiceManager")
            .field("registered", &registered)
            .finish()
    }
}
