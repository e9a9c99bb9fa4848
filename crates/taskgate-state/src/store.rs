//! SettingsStore — fixed-capacity, torn-read-free settings table.
//!
//! Layout is a linear-probing hash table of `AtomicU64` slots. One slot
//! holds one whole record:
//!
//! ```text
//! 63            32 31           0
//! ┌───────────────┬──────────────┐
//! │ id (i32 bits) │ setting word │   setting word: bit 31 = stop,
//! └───────────────┴──────────────┘                 bits 0..31 = priority
//! ```
//!
//! A zero setting word marks an empty slot; priority 0 is unrepresentable
//! by [`TaskSetting`] construction, so occupied and empty slots can never
//! be confused. Readers issue a single `Acquire` load per probed slot and
//! therefore never observe a half-written record. Writers serialize on a
//! mutex; a `Release` store publishes the full record at once.
//!
//! There is no removal: settings are only ever upserted, which keeps the
//! probe sequence valid without tombstones and keeps `get` bounded by the
//! table capacity.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{StateError, StateResult};
use crate::types::TaskSetting;

/// Default entry bound, matching the kernel-side map size.
pub const DEFAULT_CAPACITY: usize = 10_000;

const STOP_BIT: u32 = 1 << 31;

fn encode(id: i32, setting: TaskSetting) -> u64 {
    let mut word = setting.priority();
    if setting.stop() {
        word |= STOP_BIT;
    }
    ((id as u32 as u64) << 32) | word as u64
}

fn decode_setting(word: u32) -> TaskSetting {
    let stop = word & STOP_BIT != 0;
    let priority = word & !STOP_BIT;
    // Stored words always came from a validated TaskSetting.
    TaskSetting::new(stop, priority).unwrap_or_default()
}

fn slot_id(slot: u64) -> i32 {
    (slot >> 32) as u32 as i32
}

fn slot_word(slot: u64) -> u32 {
    slot as u32
}

/// Shared settings map: id → [`TaskSetting`].
///
/// `get` is lock-free and safe to call from the dispatch context; `put`
/// belongs to the control plane. Capacity is fixed at construction and
/// insertion beyond it fails with [`StateError::CapacityExceeded`].
pub struct SettingsStore {
    slots: Box<[AtomicU64]>,
    len: AtomicUsize,
    /// Serializes writers; readers never touch it.
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// Create a store bounded to `capacity` entries.
    ///
    /// One spare slot beyond the bound stays permanently empty so probes
    /// for absent ids always terminate.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "settings store capacity must be positive");
        let slots = (0..=capacity).map(|_| AtomicU64::new(0)).collect();
        Self {
            slots,
            len: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store with the default (kernel map sized) bound.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    fn probe_start(&self, id: i32) -> usize {
        // Fibonacci hashing spreads the low entropy of sequential pids.
        let h = (id as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        (h >> 32) as usize % self.slots.len()
    }

    /// Look up the setting for `id`.
    ///
    /// Lock-free: one atomic load per probed slot, at most `capacity`
    /// probes. Absence means the caller should assume
    /// `TaskSetting::default()`.
    pub fn get(&self, id: i32) -> Option<TaskSetting> {
        let cap = self.slots.len();
        let mut idx = self.probe_start(id);
        for _ in 0..cap {
            let slot = self.slots[idx].load(Ordering::Acquire);
            if slot_word(slot) == 0 {
                return None;
            }
            if slot_id(slot) == id {
                return Some(decode_setting(slot_word(slot)));
            }
            idx = (idx + 1) % cap;
        }
        None
    }

    /// Insert or replace the setting for `id` (last writer wins).
    pub fn put(&self, id: i32, setting: TaskSetting) -> StateResult<()> {
        let _guard = self.write_lock.lock().expect("settings writer poisoned");
        let cap = self.slots.len();
        let mut idx = self.probe_start(id);
        for _ in 0..cap {
            let slot = self.slots[idx].load(Ordering::Relaxed);
            if slot_word(slot) == 0 {
                if self.len.load(Ordering::Relaxed) >= self.capacity() {
                    return Err(StateError::CapacityExceeded {
                        capacity: self.capacity(),
                    });
                }
                self.slots[idx].store(encode(id, setting), Ordering::Release);
                self.len.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
            if slot_id(slot) == id {
                self.slots[idx].store(encode(id, setting), Ordering::Release);
                return Ok(());
            }
            idx = (idx + 1) % cap;
        }
        Err(StateError::CapacityExceeded {
            capacity: self.capacity(),
        })
    }

    /// Number of ids currently stored.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of ids this store can hold.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
