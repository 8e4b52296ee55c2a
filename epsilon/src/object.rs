use std::rc::Rc;

use crate::{BlockLiteral, ClassId, FrameRef, Handle, Visitable, Visitor, internal_error};

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub(crate) Handle);

/// Closure: a block literal plus the record that was on top when it evaluated.
#[derive(Debug, Clone)]
pub struct Block {
    // non-owning, kept alive only by marking
    pub static_chain: FrameRef,
    pub literal: Rc<BlockLiteral>,
}

/// Native state carried by instances of the built-in classes.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Integer(i64),
    Float(f64),
    Char(char),
    String(String),
    Block(Block),
    /// The object is the first-class representative of this class.
    Class(ClassId),
    OutStream,
}

/// Which payload a class allocates when instantiation stops at it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadKind {
    Integer,
    Float,
    Char,
    String,
    OutStream,
}

impl PayloadKind {
    pub fn initial(self) -> Payload {
        match self {
            PayloadKind::Integer => Payload::Integer(0),
            PayloadKind::Float => Payload::Float(0.0),
            PayloadKind::Char => Payload::Char('\0'),
            PayloadKind::String => Payload::String(String::new()),
            PayloadKind::OutStream => Payload::OutStream,
        }
    }
}

#[derive(Debug)]
pub struct Object {
    class: ClassId,
    attributes: Box<[ObjectRef]>,
    pub payload: Payload,
}

impl Object {
    pub fn new(class: ClassId, slots: usize, fill: ObjectRef, payload: Payload) -> Self {
        Self {
            class,
            attributes: vec![fill; slots].into_boxed_slice(),
            payload,
        }
    }

    /// Object without attribute slots; used for singletons created before nil exists.
    pub fn empty(class: ClassId, payload: Payload) -> Self {
        Self {
            class,
            attributes: Box::default(),
            payload,
        }
    }

    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn set_class(&mut self, class: ClassId) {
        self.class = class;
    }

    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attributes(&self) -> &[ObjectRef] {
        &self.attributes
    }

    #[track_caller]
    pub fn attribute(&self, index: usize) -> ObjectRef {
        match self.attributes.get(index) {
            Some(value) => *value,
            None => internal_error(format_args!(
                "attribute index {index} out of range for object with {} slots",
                self.attributes.len()
            )),
        }
    }

    #[track_caller]
    pub fn set_attribute(&mut self, index: usize, value: ObjectRef) {
        let count = self.attributes.len();
        match self.attributes.get_mut(index) {
            Some(slot) => *slot = value,
            None => internal_error(format_args!(
                "attribute index {index} out of range for object with {count} slots"
            )),
        }
    }

    /// Reallocates the slot array, keeping the prefix that still fits.
    /// Only variable-length objects (arrays) grow or shrink after construction.
    pub fn resize(&mut self, slots: usize, fill: ObjectRef) {
        let mut attributes = vec![fill; slots];
        let keep = slots.min(self.attributes.len());
        attributes[..keep].copy_from_slice(&self.attributes[..keep]);
        self.attributes = attributes.into_boxed_slice();
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.payload {
            Payload::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.payload {
            Payload::Float(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self.payload {
            Payload::Char(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.payload {
            Payload::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn represented_class(&self) -> Option<ClassId> {
        match self.payload {
            Payload::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl Visitable for Object {
    fn visit_edges(&self, visitor: &mut impl Visitor) {
        for &attribute in self.attributes.iter() {
            visitor.visit_object(attribute);
        }
        if let Payload::Block(block) = &self.payload {
            visitor.visit_frame(block.static_chain);
        }
    }
}
