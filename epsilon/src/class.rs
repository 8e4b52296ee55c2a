use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use crate::{
    InterpretedMethod, Method, MethodBody, NativeMethod, Object, ObjectRef, Payload, PayloadKind,
    internal_error,
};

pub(crate) type NameMap<V> = HashMap<String, V, ahash::RandomState>;

#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    #[track_caller]
    fn from_index(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => Self(index),
            Err(_) => internal_error(format_args!("class index {index} out of range")),
        }
    }
}

#[derive(Debug)]
pub struct Class {
    name: String,
    superclass: Option<ClassId>,
    subclasses: Vec<ClassId>,
    own_attributes: usize,
    attributes: NameMap<usize>,
    methods: NameMap<Method>,
    metaclass: Option<ClassId>,
    representative: Option<ObjectRef>,
    // set on built-in classes that carry native state
    payload: Option<PayloadKind>,
}

impl Class {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<ClassId> {
        self.superclass
    }

    pub fn subclasses(&self) -> &[ClassId] {
        &self.subclasses
    }

    pub fn own_attributes(&self) -> usize {
        self.own_attributes
    }

    pub fn metaclass(&self) -> Option<ClassId> {
        self.metaclass
    }

    pub fn representative(&self) -> Option<ObjectRef> {
        self.representative
    }

    pub fn payload(&self) -> Option<PayloadKind> {
        self.payload
    }
}

/// Every class of a running program. Classes are never removed.
#[derive(Debug, Default)]
pub struct ClassTable {
    classes: Vec<Class>,
    by_name: NameMap<ClassId>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, superclass: Option<ClassId>) -> ClassId {
        self.define_with_payload(name, superclass, None)
    }

    pub fn define_with_payload(
        &mut self,
        name: &str,
        superclass: Option<ClassId>,
        payload: Option<PayloadKind>,
    ) -> ClassId {
        let id = ClassId::from_index(self.classes.len());
        self.classes.push(Class {
            name: name.to_string(),
            superclass,
            subclasses: Vec::new(),
            own_attributes: 0,
            attributes: NameMap::default(),
            methods: NameMap::default(),
            metaclass: None,
            representative: None,
            payload,
        });
        if let Some(superclass) = superclass {
            self[superclass].subclasses.push(id);
        }
        self.by_name.insert(name.to_string(), id);
        log::trace!("defined class {name} as {id:?}");
        id
    }

    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &Class)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(index, class)| (ClassId::from_index(index), class))
    }

    pub fn set_metaclass(&mut self, class: ClassId, metaclass: ClassId) {
        self[class].metaclass = Some(metaclass);
    }

    pub fn set_representative(&mut self, class: ClassId, representative: ObjectRef) {
        self[class].representative = Some(representative);
    }

    /// Inherited attributes occupy the lowest positions, so the new attribute
    /// lands right after everything the class already has.
    pub fn add_attribute(&mut self, class: ClassId, name: &str) -> usize {
        let position = self.total_attributes(class);
        let entry = &mut self[class];
        entry.own_attributes += 1;
        entry.attributes.insert(name.to_string(), position);
        position
    }

    pub fn total_attributes(&self, class: ClassId) -> usize {
        let entry = &self[class];
        entry.own_attributes
            + entry
                .superclass
                .map_or(0, |superclass| self.total_attributes(superclass))
    }

    pub fn find_attribute(&self, class: ClassId, name: &str) -> Option<usize> {
        let entry = &self[class];
        match entry.attributes.get(name) {
            Some(&position) => Some(position),
            None => entry
                .superclass
                .and_then(|superclass| self.find_attribute(superclass, name)),
        }
    }

    pub fn add_method(&mut self, class: ClassId, method: Method) {
        self[class]
            .methods
            .insert(method.selector().to_string(), method);
    }

    pub fn add_native_method(&mut self, class: ClassId, selector: &str, native: NativeMethod) {
        self.add_method(
            class,
            Method::new(selector, Some(MethodBody::Native(native))),
        );
    }

    pub fn add_interpreted_method(
        &mut self,
        class: ClassId,
        selector: &str,
        method: InterpretedMethod,
    ) {
        self.add_method(
            class,
            Method::new(selector, Some(MethodBody::Interpreted(method.into()))),
        );
    }

    /// Declares a selector without a body; sending it is a run-time error.
    pub fn declare_method(&mut self, class: ClassId, selector: &str) {
        self.add_method(class, Method::new(selector, None));
    }

    /// Looks `selector` up starting at `class`, returning the holder and the method.
    pub fn find_method(&self, class: ClassId, selector: &str) -> Option<(ClassId, &Method)> {
        let mut current = Some(class);
        while let Some(id) = current {
            let entry = &self[id];
            if let Some(method) = entry.methods.get(selector) {
                return Some((id, method));
            }
            current = entry.superclass;
        }
        None
    }

    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self[id].superclass;
        }
        false
    }

    pub fn instantiate(&self, class: ClassId, nil: ObjectRef) -> Object {
        self.instantiate_with(class, 0, nil)
    }

    /// Walks towards the root until a class that carries native state (or the
    /// root itself) allocates; each level on the way adds its own slots.
    pub fn instantiate_with(
        &self,
        class: ClassId,
        subclass_attributes: usize,
        nil: ObjectRef,
    ) -> Object {
        let entry = &self[class];
        let needed = entry.own_attributes + subclass_attributes;
        let mut object = match (entry.payload, entry.superclass) {
            (Some(kind), superclass) => {
                let inherited = superclass.map_or(0, |superclass| self.total_attributes(superclass));
                Object::new(class, inherited + needed, nil, kind.initial())
            }
            (None, Some(superclass)) => self.instantiate_with(superclass, needed, nil),
            (None, None) => Object::new(class, needed, nil, Payload::None),
        };
        object.set_class(class);
        object
    }
}

impl Index<ClassId> for ClassTable {
    type Output = Class;

    fn index(&self, id: ClassId) -> &Self::Output {
        &self.classes[id.0 as usize]
    }
}

impl IndexMut<ClassId> for ClassTable {
    fn index_mut(&mut self, id: ClassId) -> &mut Self::Output {
        &mut self.classes[id.0 as usize]
    }
}
