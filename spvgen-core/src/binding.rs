//! Occupancy tracking for descriptor bindings and stage I/O locations.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Number of locations available per direction.
pub const MAX_LOCATIONS: u32 = 4096;

/// Resource category used for binding conflict detection.
///
/// Resources of different categories may share a (set, binding) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Image,
    Sampler,
    Other,
}

impl ResourceCategory {
    pub fn bit(self) -> u8 {
        match self {
            ResourceCategory::Image => 1,
            ResourceCategory::Sampler => 2,
            ResourceCategory::Other => 4,
        }
    }
}

/// Allocates descriptor bindings per descriptor set.
///
/// Each claimed (set, binding) slot remembers the union of the categories
/// that claimed it.
#[derive(Debug, Default)]
pub struct BindingSet {
    used: HashMap<u32, BTreeMap<u32, u8>>,
    next_binding: HashMap<u32, u32>,
}

impl BindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `binding` in `set` for `category`.
    ///
    /// Returns `false` if the slot was already claimed by the same category;
    /// the claim is recorded either way.
    pub fn use_binding(&mut self, binding: u32, set: u32, category: ResourceCategory) -> bool {
        let mask = self.used.entry(set).or_default().entry(binding).or_insert(0);
        let free = *mask & category.bit() == 0;
        *mask |= category.bit();
        free
    }

    pub fn is_used(&self, binding: u32, set: u32, category: ResourceCategory) -> bool {
        self.used
            .get(&set)
            .and_then(|bindings| bindings.get(&binding))
            .is_some_and(|mask| mask & category.bit() != 0)
    }

    /// Claim the next `count` consecutive bindings in `set` that are free for
    /// `category`, returning the first. `None` once the binding numbers run
    /// out.
    pub fn use_next_binding(&mut self, set: u32, count: u32, category: ResourceCategory) -> Option<u32> {
        let count = count.max(1);
        let mut binding = self.next_binding(set);
        let mut end = binding.checked_add(count)?;
        while self.any_used(set, binding, end, category) {
            binding = binding.checked_add(1)?;
            end = binding.checked_add(count)?;
        }
        for b in binding..end {
            self.use_binding(b, set, category);
        }
        self.next_binding.insert(set, end);
        Some(binding)
    }

    /// First binding `use_next_binding` would try in `set`.
    pub fn next_binding(&self, set: u32) -> u32 {
        self.next_binding.get(&set).copied().unwrap_or(0)
    }

    fn any_used(&self, set: u32, start: u32, end: u32, category: ResourceCategory) -> bool {
        self.used
            .get(&set)
            .is_some_and(|bindings| bindings.range(start..end).any(|(_, mask)| mask & category.bit() != 0))
    }
}

/// Allocates interface locations for one direction of a stage.
///
/// Locations are tracked separately for dual-source index 0 and 1.
#[derive(Debug)]
pub struct LocationSet {
    used: [Vec<bool>; 2],
    next_location: u32,
}

impl LocationSet {
    pub fn new() -> Self {
        LocationSet {
            used: [vec![false; MAX_LOCATIONS as usize], vec![false; MAX_LOCATIONS as usize]],
            next_location: 0,
        }
    }

    pub fn is_valid(location: u32) -> bool {
        location < MAX_LOCATIONS
    }

    pub fn is_used(&self, location: u32, index: u32) -> bool {
        self.used[index.min(1) as usize]
            .get(location as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Claim `location` under `index`. Returns `false` if it was taken.
    pub fn use_location(&mut self, location: u32, index: u32) -> bool {
        let Some(slot) = self.used[index.min(1) as usize].get_mut(location as usize) else {
            return false;
        };
        let free = !*slot;
        *slot = true;
        free
    }

    /// Claim `count` consecutive free locations and return the first.
    pub fn use_next_locs(&mut self, count: u32) -> u32 {
        let count = count.max(1);
        let mut location = self.next_location;
        // Nothing past MAX_LOCATIONS is ever used.
        let claimed = |location: u32| location..location.saturating_add(count).min(MAX_LOCATIONS);
        while claimed(location).any(|l| self.is_used(l, 0)) {
            location += 1;
        }
        for l in claimed(location) {
            self.use_location(l, 0);
        }
        self.next_location = location.saturating_add(count);
        location
    }
}

impl Default for LocationSet {
    fn default() -> Self {
        Self::new()
    }
}
