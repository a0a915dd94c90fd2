/*!
 * Execution Engine Boundary
 * Register access used by the kernel for system calls and context switches
 *
 * The instruction engine itself lives outside this crate. It exposes the live
 * register file through [`ExecutionEngine`]; the kernel snapshots it into
 * [`ThreadContext`] on every context switch.
 */

use std::fmt;

/// Stack pointer register index
pub const SP: usize = 13;
/// Link register index
pub const LR: usize = 14;
/// Program counter register index
pub const PC: usize = 15;

pub const GPR_COUNT: usize = 16;
pub const FPR_COUNT: usize = 32;

/// CPSR bit patterns
pub mod cpsr {
    /// User mode, IRQ/FIQ enabled
    pub const USER_MODE: u32 = 0x10;
    /// Thumb execution state
    pub const THUMB: u32 = 1 << 5;
}

/// FPSCR value every new thread starts with (flush-to-zero, default NaN)
pub const FPSCR_THREAD_DEFAULT: u32 = 0x03C0_0000;

/// Saved register state of a guest thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadContext {
    pub gprs: [u32; GPR_COUNT],
    pub fprs: [u32; FPR_COUNT],
    pub cpsr: u32,
    pub fpscr: u32,
    pub tls_base: u32,
}

impl Default for ThreadContext {
    fn default() -> Self {
        Self {
            gprs: [0; GPR_COUNT],
            fprs: [0; FPR_COUNT],
            cpsr: 0,
            fpscr: 0,
            tls_base: 0,
        }
    }
}

/// Live register file of the instruction engine
///
/// Register indices passed to `reg`/`set_reg` are always below 16 and FPR
/// indices below 32; implementations may panic on anything else.
pub trait ExecutionEngine {
    fn reg(&self, index: usize) -> u32;
    fn set_reg(&mut self, index: usize, value: u32);
    fn fpr(&self, index: usize) -> u32;
    fn set_fpr(&mut self, index: usize, value: u32);
    fn cpsr(&self) -> u32;
    fn set_cpsr(&mut self, value: u32);
    fn fpscr(&self) -> u32;
    fn set_fpscr(&mut self, value: u32);
    fn tls_base(&self) -> u32;
    fn set_tls_base(&mut self, value: u32);

    /// Copy the live registers into `ctx`
    fn save_context(&self, ctx: &mut ThreadContext) {
        for (i, r) in ctx.gprs.iter_mut().enumerate() {
            *r = self.reg(i);
        }
        for (i, r) in ctx.fprs.iter_mut().enumerate() {
            *r = self.fpr(i);
        }
        ctx.cpsr = self.cpsr();
        ctx.fpscr = self.fpscr();
        ctx.tls_base = self.tls_base();
    }

    /// Replace the live registers with `ctx`
    fn load_context(&mut self, ctx: &ThreadContext) {
        for (i, &r) in ctx.gprs.iter().enumerate() {
            self.set_reg(i, r);
        }
        for (i, &r) in ctx.fprs.iter().enumerate() {
            self.set_fpr(i, r);
        }
        self.set_cpsr(ctx.cpsr);
        self.set_fpscr(ctx.fpscr);
        self.set_tls_base(ctx.tls_base);
    }
}

/// Plain register file, used when no instruction engine is attached and by tests
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    ctx: ThreadContext,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionEngine for RegisterFile {
    #[inline]
    fn reg(&self, index: usize) -> u32 {
        self.ctx.gprs[index]
    }

    #[inline]
    fn set_reg(&mut self, index: usize, value: u32) {
        self.ctx.gprs[index] = value;
    }

    #[inline]
    fn fpr(&self, index: usize) -> u32 {
        self.ctx.fprs[index]
    }

    #[inline]
    fn set_fpr(&mut self, index: usize, value: u32) {
        self.ctx.fprs[index] = value;
    }

    fn cpsr(&self) -> u32 {
        self.ctx.cpsr
    }

    fn set_cpsr(&mut self, value: u32) {
        self.ctx.cpsr = value;
    }

    fn fpscr(&self) -> u32 {
        self.ctx.fpscr
    }

    fn set_fpscr(&mut self, value: u32) {
        self.ctx.fpscr = value;
    }

    fn tls_base(&self) -> u32 {
        self.ctx.tls_base
    }

    fn set_tls_base(&mut self, value: u32) {
        self.ctx.tls_base = value;
    }

    fn save_context(&self, ctx: &mut ThreadContext) {
        ctx.clone_from(&self.ctx);
    }

    fn load_context(&mut self, ctx: &ThreadContext) {
        self.ctx.clone_from(ctx);
    }
}

/// Exception classes the execution engine reports back to the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    UndefinedInstruction,
    UnpredictableInstruction,
    PrefetchAbort,
    DataAbort,
    Breakpoint,
    /// The engine hit an instruction it can only interpret
    InterpreterFallback,
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UndefinedInstruction => "undefined instruction",
            Self::UnpredictableInstruction => "unpredictable instruction",
            Self::PrefetchAbort => "prefetch abort",
            Self::DataAbort => "data abort",
            Self::Breakpoint => "breakpoint",
            Self::InterpreterFallback => "interpreter fallback",
        };
        f.write_str(name)
    }
}
