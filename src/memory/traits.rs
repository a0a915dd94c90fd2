/*!
 * Guest Memory Traits
 * Guest address-space access used by the kernel
 */

use crate::core::types::GuestAddr;

/// Little-endian reads from guest virtual memory
pub trait GuestRead {
    fn read8(&self, addr: GuestAddr) -> u8;

    fn read16(&self, addr: GuestAddr) -> u16 {
        u16::from_le_bytes([self.read8(addr), self.read8(addr.wrapping_add(1))])
    }

    fn read32(&self, addr: GuestAddr) -> u32 {
        let mut bytes = [0u8; 4];
        self.read_bytes(addr, &mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn read64(&self, addr: GuestAddr) -> u64 {
        let lo = self.read32(addr) as u64;
        let hi = self.read32(addr.wrapping_add(4)) as u64;
        hi << 32 | lo
    }

    /// Fill `buf` starting at `addr`
    fn read_bytes(&self, addr: GuestAddr, buf: &mut [u8]) {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read8(addr.wrapping_add(i as u32));
        }
    }
}

/// Little-endian writes to guest virtual memory
pub trait GuestWrite {
    fn write8(&mut self, addr: GuestAddr, value: u8);

    fn write16(&mut self, addr: GuestAddr, value: u16) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    fn write32(&mut self, addr: GuestAddr, value: u32) {
        self.write_bytes(addr, &value.to_le_bytes());
    }

    fn write64(&mut self, addr: GuestAddr, value: u64) {
        self.write32(addr, value as u32);
        self.write32(addr.wrapping_add(4), (value >> 32) as u32);
    }

    fn write_bytes(&mut self, addr: GuestAddr, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            self.write8(addr.wrapping_add(i as u32), b);
        }
    }

    /// Zero `len` bytes starting at `addr`
    fn fill_zero(&mut self, addr: GuestAddr, len: u32) {
        for i in 0..len {
            self.write8(addr.wrapping_add(i), 0);
        }
    }
}

/// Guest memory combining read and write access
pub trait GuestMemory: GuestRead + GuestWrite {}

impl<T> GuestMemory for T where T: GuestRead + GuestWrite {}
