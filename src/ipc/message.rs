/*!
 * IPC Message Format
 * Command headers, translate descriptors and the per-thread command buffer
 *
 * A request lives in the caller's TLS command buffer: one header word, the
 * normal parameters, then the translate parameters. Translate parameters are
 * a sequence of descriptors, each followed by its payload words.
 */

use crate::core::data_structures::InlineString;
use crate::core::errors::KernelError;
use crate::core::limits::{COMMAND_BUFFER_OFFSET, COMMAND_BUFFER_SIZE};
use crate::core::result::ResultCode;
use crate::core::types::{GuestAddr, KernelResult};
use crate::memory::traits::{GuestRead, GuestWrite};

/// Command buffer capacity in words
pub const COMMAND_BUFFER_WORDS: u32 = COMMAND_BUFFER_SIZE / 4;

/// Decoded IPC header word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpcHeader {
    pub command: u16,
    pub normal_params: u8,
    pub translate_params: u8,
}

impl IpcHeader {
    pub const fn new(command: u16, normal_params: u8, translate_params: u8) -> Self {
        Self {
            command,
            normal_params: normal_params & 0x3F,
            translate_params: translate_params & 0x3F,
        }
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self {
            command: (raw >> 16) as u16,
            normal_params: ((raw >> 6) & 0x3F) as u8,
            translate_params: (raw & 0x3F) as u8,
        }
    }

    pub const fn raw(self) -> u32 {
        ((self.command as u32) << 16)
            | ((self.normal_params as u32 & 0x3F) << 6)
            | (self.translate_params as u32 & 0x3F)
    }

    /// Header plus parameters, in words
    #[inline]
    pub const fn total_words(self) -> u32 {
        1 + self.normal_params as u32 + self.translate_params as u32
    }

    /// Reject headers whose parameters overflow the command buffer
    pub fn validate(self) -> KernelResult<()> {
        if self.total_words() > COMMAND_BUFFER_WORDS {
            return Err(KernelError::MalformedIpcHeader(self.raw()));
        }
        Ok(())
    }
}

/// Reply header word for `command`
#[inline]
pub const fn response_header(command: u32, normal_params: u32, translate_params: u32) -> u32 {
    (command << 16) | ((normal_params & 0x3F) << 6) | (translate_params & 0x3F)
}

/// One translate-parameter descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateDescriptor {
    /// Handles copied into the receiver
    CopyHandles { count: u32 },
    /// Handles moved into the receiver
    MoveHandles { count: u32 },
    /// Placeholder the kernel fills with the sender's process id
    CallingPid,
    StaticBuffer { id: u8, size: u32 },
    PxiBuffer { id: u8, size: u32, read_only: bool },
    MappedBuffer { size: u32, permission: u8 },
}

impl TranslateDescriptor {
    const MAPPED_BUFFER_FLAG: u32 = 0x8;
    const MOVE_HANDLES_FLAG: u32 = 0x10;
    const CALLING_PID_FLAG: u32 = 0x20;

    /// Decode a descriptor word
    ///
    /// Bit 3 selects a mapped buffer; otherwise bits 1..3 give the type.
    pub const fn parse(word: u32) -> Self {
        if word & Self::MAPPED_BUFFER_FLAG != 0 {
            return Self::MappedBuffer {
                size: word >> 4,
                permission: ((word >> 1) & 0x3) as u8,
            };
        }
        match (word >> 1) & 0x3 {
            0 if word & Self::CALLING_PID_FLAG != 0 => Self::CallingPid,
            0 => {
                let count = (word >> 26) + 1;
                if word & Self::MOVE_HANDLES_FLAG != 0 {
                    Self::MoveHandles { count }
                } else {
                    Self::CopyHandles { count }
                }
            }
            1 => Self::StaticBuffer {
                id: ((word >> 10) & 0xF) as u8,
                size: word >> 14,
            },
            _ => Self::PxiBuffer {
                id: ((word >> 4) & 0xF) as u8,
                size: word >> 8,
                read_only: word & 0x2 != 0,
            },
        }
    }

    /// Words occupied by the descriptor and its payload
    pub const fn words(self) -> u32 {
        match self {
            Self::CopyHandles { count } | Self::MoveHandles { count } => 1 + count,
            Self::CallingPid
            | Self::StaticBuffer { .. }
            | Self::PxiBuffer { .. }
            | Self::MappedBuffer { .. } => 2,
        }
    }

    pub const fn copy_handles(count: u32) -> u32 {
        (count - 1) << 26
    }

    pub const fn move_handles(count: u32) -> u32 {
        ((count - 1) << 26) | Self::MOVE_HANDLES_FLAG
    }

    pub const fn calling_pid() -> u32 {
        Self::CALLING_PID_FLAG
    }

    pub const fn static_buffer(size: u32, id: u32) -> u32 {
        (size << 14) | ((id & 0xF) << 10) | 0x2
    }

    pub const fn mapped_buffer(size: u32, permission: u32) -> u32 {
        (size << 4) | Self::MAPPED_BUFFER_FLAG | ((permission & 0x3) << 1)
    }
}

/// Command buffer of one thread, addressed in words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBuffer {
    base: GuestAddr,
}

impl CommandBuffer {
    #[inline]
    pub const fn at(base: GuestAddr) -> Self {
        Self { base }
    }

    /// Command buffer inside the TLS block at `tls_base`
    #[inline]
    pub const fn for_tls(tls_base: GuestAddr) -> Self {
        Self::at(tls_base + COMMAND_BUFFER_OFFSET)
    }

    #[inline]
    pub const fn base(self) -> GuestAddr {
        self.base
    }

    #[inline]
    pub fn read<M: GuestRead + ?Sized>(self, mem: &M, word: u32) -> u32 {
        mem.read32(self.base.wrapping_add(word * 4))
    }

    #[inline]
    pub fn write<M: GuestWrite + ?Sized>(self, mem: &mut M, word: u32, value: u32) {
        mem.write32(self.base.wrapping_add(word * 4), value);
    }

    pub fn header<M: GuestRead + ?Sized>(self, mem: &M) -> IpcHeader {
        IpcHeader::from_raw(self.read(mem, 0))
    }

    /// Write the reply header and result word
    pub fn write_response<M: GuestWrite + ?Sized>(
        self,
        mem: &mut M,
        command: u32,
        normal_params: u32,
        translate_params: u32,
        result: ResultCode,
    ) {
        self.write(mem, 0, response_header(command, normal_params, translate_params));
        self.write(mem, 1, result.raw());
    }

    /// NUL-terminated string of at most `max_len` bytes starting at `word`
    pub fn read_string<M: GuestRead + ?Sized>(self, mem: &M, word: u32, max_len: usize) -> InlineString {
        let mut bytes = vec![0u8; max_len];
        mem.read_bytes(self.base.wrapping_add(word * 4), &mut bytes);
        InlineString::from_guest_bytes(&bytes)
    }

    /// Decode the translate parameters of the pending request
    ///
    /// Returns each descriptor with the word index it starts at. A descriptor
    /// running past the declared parameter count is malformed.
    pub fn translate_descriptors<M: GuestRead + ?Sized>(
        self,
        mem: &M,
    ) -> KernelResult<Vec<(u32, TranslateDescriptor)>> {
        let header = self.header(mem);
        header.validate()?;

        let mut word = 1 + header.normal_params as u32;
        let end = header.total_words();
        let mut descriptors = Vec::new();
        while word < end {
            let descriptor = TranslateDescriptor::parse(self.read(mem, word));
            if word + descriptor.words() > end {
                return Err(KernelError::MalformedIpcHeader(header.raw()));
            }
            descriptors.push((word, descriptor));
            word += descriptor.words();
        }
        Ok(descriptors)
    }
}
