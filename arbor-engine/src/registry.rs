use std::fmt;

/// Opaque, generation-checked handle to an engine surface.
///
/// Engine callbacks carry this id instead of a pointer. A callback that
/// arrives after the surface was freed finds a bumped generation in the
/// registry and is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId {
    index: u32,
    generation: u32,
}

impl SurfaceId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    live: bool,
}

/// Arena of live surface ids.
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id, reusing a vacant slot when possible.
    pub fn insert(&mut self) -> SurfaceId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.live = true;
            return SurfaceId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            live: true,
        });
        SurfaceId {
            index,
            generation: 0,
        }
    }

    /// Invalidate `id`. Returns `false` when it was already stale.
    pub fn remove(&mut self, id: SurfaceId) -> bool {
        if !self.contains(id) {
            return false;
        }

        let slot = &mut self.slots[id.index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        true
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.live && slot.generation == id.generation)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live ids in slot order.
    pub fn ids(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.live.then_some(SurfaceId {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }
}
