use crate::{FrameRef, ObjectRef};

/// Entities that hold references into the heap.
pub trait Visitable {
    fn visit_edges(&self, visitor: &mut impl Visitor);
}

pub trait Visitor: Sized {
    fn visit_object(&mut self, object: ObjectRef) {
        let _ = object;
    }
    fn visit_frame(&mut self, frame: FrameRef) {
        let _ = frame;
    }
}

/// Anything that can enumerate the roots of a collection.
pub trait RootProvider {
    fn visit_roots(&self, visitor: &mut impl Visitor);
}
