use bitflags::bitflags;

use crate::{
    ActivationRecord, FrameRef, Object, ObjectRef, RootProvider, Visitable, Visitor,
    internal_error,
};

/// Stable index into the heap arena.
///
/// The generation changes every time the slot is reclaimed, so a handle that
/// outlives its entity is detected instead of aliasing a newer one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

#[derive(Debug, Default)]
pub struct HeapCreateInfo {
    // entities allocated past the last live count before a collection runs
    pub gc_threshold: Option<usize>,
    pub initial_capacity: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct HeapSettings {
    pub gc_threshold: usize,
    pub initial_capacity: usize,
}

impl Default for HeapSettings {
    fn default() -> Self {
        Self {
            gc_threshold: 1000,
            initial_capacity: 1024,
        }
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
    pub struct EntityFlags: u8 {
        const MARK = 1 << 0;
    }
}

#[derive(Debug)]
pub enum Entity {
    Object(Object),
    Frame(ActivationRecord),
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    flags: EntityFlags,
    entity: Option<Entity>,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct GarbageCollectionStats {
    pub collections: usize,
    pub freed: usize,
    pub live_after_last: usize,
}

/// Arena holding every object and activation record: the collector's managed set.
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    // live count after the last sweep
    baseline: usize,
    settings: HeapSettings,
    stats: GarbageCollectionStats,
}

#[derive(Debug, Default)]
struct Marker {
    gray: Vec<Handle>,
}

impl Visitor for Marker {
    fn visit_object(&mut self, object: ObjectRef) {
        self.gray.push(object.0);
    }

    fn visit_frame(&mut self, frame: FrameRef) {
        self.gray.push(frame.0);
    }
}

impl Heap {
    pub fn new(info: HeapCreateInfo) -> Self {
        let mut settings = HeapSettings::default();
        info.gc_threshold
            .inspect(|&val| settings.gc_threshold = val);
        info.initial_capacity
            .inspect(|&val| settings.initial_capacity = val);

        Self {
            slots: Vec::with_capacity(settings.initial_capacity),
            free: Vec::new(),
            live: 0,
            baseline: 0,
            settings,
            stats: GarbageCollectionStats::default(),
        }
    }

    pub fn allocate_object(&mut self, object: Object) -> ObjectRef {
        ObjectRef(self.insert(Entity::Object(object)))
    }

    pub fn allocate_frame(&mut self, record: ActivationRecord) -> FrameRef {
        FrameRef(self.insert(Entity::Frame(record)))
    }

    fn insert(&mut self, entity: Entity) -> Handle {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.flags = EntityFlags::empty();
                slot.entity = Some(entity);
                Handle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| internal_error("heap arena exhausted"));
                self.slots.push(Slot {
                    generation: 0,
                    flags: EntityFlags::empty(),
                    entity: Some(entity),
                });
                Handle {
                    index,
                    generation: 0,
                }
            }
        }
    }

    fn lookup(&self, handle: Handle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.entity.is_some())
    }

    #[track_caller]
    fn slot(&self, handle: Handle) -> &Slot {
        match self.lookup(handle) {
            Some(slot) => slot,
            None => internal_error(format_args!("stale heap handle {handle:?}")),
        }
    }

    #[track_caller]
    fn slot_mut(&mut self, handle: Handle) -> &mut Slot {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation && slot.entity.is_some() => slot,
            _ => internal_error(format_args!("stale heap handle {handle:?}")),
        }
    }

    #[track_caller]
    pub fn object(&self, object: ObjectRef) -> &Object {
        match &self.slot(object.0).entity {
            Some(Entity::Object(object)) => object,
            _ => internal_error(format_args!("{object:?} does not name an object")),
        }
    }

    #[track_caller]
    pub fn object_mut(&mut self, object: ObjectRef) -> &mut Object {
        match &mut self.slot_mut(object.0).entity {
            Some(Entity::Object(object)) => object,
            _ => internal_error(format_args!("{object:?} does not name an object")),
        }
    }

    #[track_caller]
    pub fn frame(&self, frame: FrameRef) -> &ActivationRecord {
        match &self.slot(frame.0).entity {
            Some(Entity::Frame(record)) => record,
            _ => internal_error(format_args!("{frame:?} does not name an activation record")),
        }
    }

    #[track_caller]
    pub fn frame_mut(&mut self, frame: FrameRef) -> &mut ActivationRecord {
        match &mut self.slot_mut(frame.0).entity {
            Some(Entity::Frame(record)) => record,
            _ => internal_error(format_args!("{frame:?} does not name an activation record")),
        }
    }

    pub fn contains_object(&self, object: ObjectRef) -> bool {
        matches!(
            self.lookup(object.0).and_then(|slot| slot.entity.as_ref()),
            Some(Entity::Object(_))
        )
    }

    pub fn contains_frame(&self, frame: FrameRef) -> bool {
        matches!(
            self.lookup(frame.0).and_then(|slot| slot.entity.as_ref()),
            Some(Entity::Frame(_))
        )
    }

    /// Number of entities currently in the managed set.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn settings(&self) -> &HeapSettings {
        &self.settings
    }

    pub fn stats(&self) -> GarbageCollectionStats {
        self.stats
    }

    pub fn should_collect(&self) -> bool {
        self.live > self.baseline + self.settings.gc_threshold
    }

    /// Full mark and sweep. Returns the number of entities freed.
    pub fn collect(&mut self, roots: &impl RootProvider) -> usize {
        let before = self.live;
        self.mark(roots);
        let freed = self.sweep();
        self.baseline = self.live;

        self.stats.collections += 1;
        self.stats.freed += freed;
        self.stats.live_after_last = self.live;
        log::debug!(
            "gc #{}: {} -> {} entities ({} freed)",
            self.stats.collections,
            before,
            self.live,
            freed
        );
        freed
    }

    fn mark(&mut self, roots: &impl RootProvider) {
        let mut marker = Marker::default();
        roots.visit_roots(&mut marker);

        while let Some(handle) = marker.gray.pop() {
            let slot = self.slot_mut(handle);
            if slot.flags.contains(EntityFlags::MARK) {
                continue;
            }
            slot.flags.insert(EntityFlags::MARK);
            match &slot.entity {
                Some(Entity::Object(object)) => object.visit_edges(&mut marker),
                Some(Entity::Frame(record)) => record.visit_edges(&mut marker),
                None => unreachable!("slot_mut only yields occupied slots"),
            }
        }
    }

    fn sweep(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entity.is_none() {
                continue;
            }
            if slot.flags.contains(EntityFlags::MARK) {
                slot.flags.remove(EntityFlags::MARK);
            } else {
                slot.entity = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        freed
    }

    #[cfg(test)]
    fn is_marked(&self, handle: Handle) -> bool {
        self.slot(handle).flags.contains(EntityFlags::MARK)
    }
}
