use crate::{Handle, ObjectRef, StackUnderflow, Visitable, Visitor, internal_error};

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameRef(pub(crate) Handle);

/// One call or block invocation.
///
/// Slot 0 is the receiver (the block itself for block invocations), then
/// parameters, locals and evaluation temporaries.
#[derive(Debug)]
pub struct ActivationRecord {
    slots: Box<[ObjectRef]>,
}

impl ActivationRecord {
    pub fn new(size: usize, receiver: ObjectRef, fill: ObjectRef) -> Self {
        let mut slots = vec![fill; size.max(1)].into_boxed_slice();
        slots[0] = receiver;
        Self { slots }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn receiver(&self) -> ObjectRef {
        self.slots[0]
    }

    pub fn slots(&self) -> &[ObjectRef] {
        &self.slots
    }

    #[track_caller]
    pub fn get(&self, index: usize) -> ObjectRef {
        match self.slots.get(index) {
            Some(value) => *value,
            None => internal_error(format_args!(
                "slot {index} out of range for activation record of size {}",
                self.slots.len()
            )),
        }
    }

    #[track_caller]
    pub fn set(&mut self, index: usize, value: ObjectRef) {
        let size = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) => *slot = value,
            None => internal_error(format_args!(
                "slot {index} out of range for activation record of size {size}"
            )),
        }
    }
}

impl Visitable for ActivationRecord {
    fn visit_edges(&self, visitor: &mut impl Visitor) {
        for &slot in self.slots.iter() {
            visitor.visit_object(slot);
        }
    }
}

/// The dynamic chain. Records themselves live in the heap.
#[derive(Debug, Default)]
pub struct ActivationStack(Vec<FrameRef>);

impl ActivationStack {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, frame: FrameRef) {
        self.0.push(frame);
    }

    pub fn pop(&mut self) -> Result<FrameRef, StackUnderflow> {
        self.0.pop().ok_or(StackUnderflow)
    }

    pub fn top(&self) -> Result<FrameRef, StackUnderflow> {
        self.0.last().copied().ok_or(StackUnderflow)
    }

    /// Record reserved for program-wide globals.
    pub fn bottom(&self) -> Result<FrameRef, StackUnderflow> {
        self.0.first().copied().ok_or(StackUnderflow)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn truncate(&mut self, depth: usize) {
        self.0.truncate(depth);
    }

    pub fn iter(&self) -> impl Iterator<Item = FrameRef> + '_ {
        self.0.iter().copied()
    }
}
