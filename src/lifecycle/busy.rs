//! In-flight request guard.

use std::sync::atomic::{AtomicBool, Ordering};

/// Marks an operation as in flight until dropped.
///
/// Claiming fails while another guard on the same flag is alive, so a second
/// prompt is rejected instead of queued behind the first.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    pub fn try_claim(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
