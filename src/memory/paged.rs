/*!
 * Paged Guest Memory
 * Sparse 4 KiB page store backing the guest address space
 */

use super::traits::{GuestRead, GuestWrite};
use crate::core::limits::PAGE_SIZE;
use crate::core::types::GuestAddr;
use ahash::RandomState;
use std::collections::HashMap;

type Page = Box<[u8; PAGE_SIZE as usize]>;

/// Sparse guest memory
///
/// Pages materialise on first write. Reads from pages never written return
/// zero, which matches freshly mapped guest memory.
///
/// # Performance
/// - Page lookup is a single ahash map probe
/// - Multi-byte accesses within one page copy directly out of the page
#[derive(Default)]
pub struct PagedMemory {
    pages: HashMap<u32, Page, RandomState>,
}

impl PagedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages that have been touched
    pub fn resident_pages(&self) -> usize {
        self.pages.len()
    }

    #[inline(always)]
    fn split(addr: GuestAddr) -> (u32, usize) {
        (addr / PAGE_SIZE, (addr % PAGE_SIZE) as usize)
    }

    fn page_mut(&mut self, page: u32) -> &mut Page {
        self.pages
            .entry(page)
            .or_insert_with(|| Box::new([0u8; PAGE_SIZE as usize]))
    }
}

impl GuestRead for PagedMemory {
    #[inline]
    fn read8(&self, addr: GuestAddr) -> u8 {
        let (page, offset) = Self::split(addr);
        self.pages.get(&page).map_or(0, |p| p[offset])
    }

    fn read_bytes(&self, addr: GuestAddr, buf: &mut [u8]) {
        let (page, offset) = Self::split(addr);
        if offset + buf.len() <= PAGE_SIZE as usize {
            match self.pages.get(&page) {
                Some(p) => buf.copy_from_slice(&p[offset..offset + buf.len()]),
                None => buf.fill(0),
            }
            return;
        }
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read8(addr.wrapping_add(i as u32));
        }
    }
}

impl GuestWrite for PagedMemory {
    #[inline]
    fn write8(&mut self, addr: GuestAddr, value: u8) {
        let (page, offset) = Self::split(addr);
        self.page_mut(page)[offset] = value;
    }

    fn write_bytes(&mut self, addr: GuestAddr, data: &[u8]) {
        let (page, offset) = Self::split(addr);
        if offset + data.len() <= PAGE_SIZE as usize {
            self.page_mut(page)[offset..offset + data.len()].copy_from_slice(data);
            return;
        }
        for (i, &b) in data.iter().enumerate() {
            self.write8(addr.wrapping_add(i as u32), b);
        }
    }
}
