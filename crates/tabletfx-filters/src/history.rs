//! Per-stage memory of previous reports.
//!
//! # Update Rules
//!
//! [`HistoryState::update`] runs once per consumed report, after every
//! channel for that report has been evaluated. Only capabilities present in
//! the report overwrite their history; the rest keep the last value seen.
//!
//! The sample ring stores raw positions most recent first. Slots that have
//! not been written yet read as zero.

use crate::report::{DeviceReport, Vec2};

/// Raw values from the last report that carried each capability.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawSample {
    /// Last raw position
    pub position: Vec2,
    /// Last raw pressure
    pub pressure: u32,
    /// Last raw tilt
    pub tilt: Vec2,
    /// Last raw hover distance
    pub hover_distance: u32,
}

/// Values computed for the previous report, before write-back narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ComputedSample {
    /// Computed X
    pub x: f64,
    /// Computed Y
    pub y: f64,
    /// Computed pressure
    pub pressure: f64,
}

impl ComputedSample {
    /// Create a computed sample.
    #[must_use]
    pub const fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self { x, y, pressure }
    }
}

/// Fixed-capacity ring of positions, newest first.
///
/// Pushing never allocates. A ring of capacity zero ignores pushes.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRing {
    slots: Box<[Vec2]>,
    head: usize,
    len: usize,
}

impl SampleRing {
    /// Create a zero-filled ring.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Vec2::ZERO; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of samples held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of samples pushed so far, saturating at capacity.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been pushed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether every slot holds a real sample.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Push a sample to the front, evicting the oldest once full.
    pub fn push_front(&mut self, sample: Vec2) {
        let capacity = self.capacity();
        if capacity == 0 {
            return;
        }
        self.head = (self.head + capacity - 1) % capacity;
        if let Some(slot) = self.slots.get_mut(self.head) {
            *slot = sample;
        }
        self.len = (self.len + 1).min(capacity);
    }

    /// The sample `index` pushes ago; `0` is the most recent.
    ///
    /// Returns `None` only past capacity. Unwritten slots are zero.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Vec2> {
        let capacity = self.capacity();
        if index >= capacity {
            return None;
        }
        self.slots.get((self.head + index) % capacity).copied()
    }

    /// Iterate all slots, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        (0..self.capacity()).filter_map(|i| self.get(i))
    }

    /// Zero every slot.
    pub fn clear(&mut self) {
        self.slots.fill(Vec2::ZERO);
        self.head = 0;
        self.len = 0;
    }
}

/// Everything a stage remembers between reports.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    last_raw: RawSample,
    last_computed: ComputedSample,
    samples: SampleRing,
}

impl HistoryState {
    /// Fresh, zeroed history with a ring of `sample_capacity` positions.
    #[must_use]
    pub fn new(sample_capacity: usize) -> Self {
        Self {
            last_raw: RawSample::default(),
            last_computed: ComputedSample::default(),
            samples: SampleRing::new(sample_capacity),
        }
    }

    /// Raw values of the previous report.
    #[must_use]
    pub fn last_raw(&self) -> &RawSample {
        &self.last_raw
    }

    /// Values computed for the previous report.
    #[must_use]
    pub fn last_computed(&self) -> &ComputedSample {
        &self.last_computed
    }

    /// Prior raw positions.
    #[must_use]
    pub fn samples(&self) -> &SampleRing {
        &self.samples
    }

    /// Record `raw` as the previous report and `computed` as its outputs.
    pub fn update(&mut self, raw: &DeviceReport, computed: &ComputedSample) {
        if let Some(position) = raw.position {
            self.last_raw.position = position;
            self.samples.push_front(position);
        }
        if let Some(pressure) = raw.pressure {
            self.last_raw.pressure = pressure;
        }
        if let Some(tilt) = raw.tilt {
            self.last_raw.tilt = tilt;
        }
        if let Some(distance) = raw.hover_distance {
            self.last_raw.hover_distance = distance;
        }
        self.last_computed = *computed;
    }

    /// Forget everything, keeping the ring capacity.
    pub fn reset(&mut self) {
        self.last_raw = RawSample::default();
        self.last_computed = ComputedSample::default();
        self.samples.clear();
    }
}

impl Default for HistoryState {
    fn default() -> Self {
        Self::new(0)
    }
}
