use std::hash::BuildHasher;
use std::io::Write;
use std::rc::Rc;

use crate::{
    ActivationRecord, ActivationStack, Block, BlockLiteral, ClassId, ClassTable, FrameRef,
    GarbageCollectionStats, Heap, HeapCreateInfo, LexicalAddress, MethodBody, ObjectRef,
    Payload, RootProvider, RuntimeError, StorageClass, Visitor, bootstrap, internal_error,
};

/// Objects that exist for the whole run and that natives hand out directly.
#[derive(Debug, Copy, Clone)]
pub struct SpecialObjects {
    pub nil: ObjectRef,
    pub true_object: ObjectRef,
    pub false_object: ObjectRef,
    pub cout: ObjectRef,
    pub endl: ObjectRef,
}

#[derive(Debug, Copy, Clone)]
pub struct BuiltinClasses {
    pub root: ClassId,
    pub meta: ClassId,
    pub integer: ClassId,
    pub float: ClassId,
    pub string: ClassId,
    pub char: ClassId,
    pub array: ClassId,
    pub true_class: ClassId,
    pub false_class: ClassId,
    pub nil: ClassId,
    pub block: ClassId,
    pub ostream: ClassId,
}

/// Pending non-local return: unwind until `target` has been popped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ReturnSignal {
    pub target: FrameRef,
    pub value: ObjectRef,
}

#[derive(Debug)]
pub enum Console {
    Stdout,
    Captured(String),
}

#[derive(Debug, Default)]
pub struct VMCreateInfo {
    pub heap: HeapCreateInfo,
    // collect `cout` output in memory instead of writing to stdout
    pub capture_output: bool,
}

/// Method found by dispatch, detached from the class table.
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub holder: ClassId,
    pub body: MethodBody,
    pub ar_size: usize,
}

/// The run-time environment: stack, heap, classes and the return signal.
#[derive(Debug)]
pub struct VM {
    pub heap: Heap,
    pub classes: ClassTable,
    pub specials: SpecialObjects,
    pub builtins: BuiltinClasses,
    stack: ActivationStack,
    // built but not yet pushed; their slots already hold live values
    pending: Vec<FrameRef>,
    returning: Option<ReturnSignal>,
    console: Console,
    random: ahash::RandomState,
    random_counter: u64,
}

struct VMRoots<'a> {
    stack: &'a ActivationStack,
    pending: &'a [FrameRef],
    specials: &'a SpecialObjects,
    classes: &'a ClassTable,
}

impl RootProvider for VMRoots<'_> {
    fn visit_roots(&self, visitor: &mut impl Visitor) {
        for frame in self.stack.iter() {
            visitor.visit_frame(frame);
        }
        for &frame in self.pending {
            visitor.visit_frame(frame);
        }
        visitor.visit_object(self.specials.nil);
        visitor.visit_object(self.specials.true_object);
        visitor.visit_object(self.specials.false_object);
        visitor.visit_object(self.specials.cout);
        visitor.visit_object(self.specials.endl);
        for (_, class) in self.classes.iter() {
            if let Some(representative) = class.representative() {
                visitor.visit_object(representative);
            }
        }
    }
}

impl VM {
    pub fn new(info: VMCreateInfo) -> Self {
        let mut heap = Heap::new(info.heap);
        let mut classes = ClassTable::new();
        let (builtins, specials) = bootstrap::create_builtins(&mut classes, &mut heap);

        let console = match info.capture_output {
            true => Console::Captured(String::new()),
            false => Console::Stdout,
        };

        let mut vm = Self {
            heap,
            classes,
            specials,
            builtins,
            stack: ActivationStack::new(),
            pending: Vec::new(),
            returning: None,
            console,
            random: ahash::RandomState::new(),
            random_counter: 0,
        };
        bootstrap::install_methods(&mut vm);
        vm
    }

    /// Registers a user class with its own metaclass `meta~Name` and representative.
    pub fn register_class(&mut self, name: &str, superclass: Option<ClassId>) -> ClassId {
        let superclass = superclass.or(Some(self.builtins.root));
        let class = self.classes.define(name, superclass);
        let metaclass = self
            .classes
            .define(&format!("meta~{name}"), Some(self.builtins.meta));
        self.classes.set_metaclass(metaclass, self.builtins.meta);
        self.classes.set_metaclass(class, metaclass);
        self.create_representative(class);
        class
    }

    pub(crate) fn create_representative(&mut self, class: ClassId) -> ObjectRef {
        let metaclass = self.classes[class]
            .metaclass()
            .unwrap_or_else(|| internal_error(format_args!("{class:?} has no metaclass")));
        let mut object = self.classes.instantiate(metaclass, self.specials.nil);
        object.payload = Payload::Class(class);
        let representative = self.heap.allocate_object(object);
        self.classes.set_representative(class, representative);
        representative
    }

    #[inline]
    pub fn nil(&self) -> ObjectRef {
        self.specials.nil
    }

    #[inline]
    pub fn boolean(&self, value: bool) -> ObjectRef {
        match value {
            true => self.specials.true_object,
            false => self.specials.false_object,
        }
    }

    pub fn representative(&self, class: ClassId) -> ObjectRef {
        self.classes[class]
            .representative()
            .unwrap_or_else(|| internal_error(format_args!("{class:?} has no representative")))
    }

    pub fn class_of(&self, object: ObjectRef) -> ClassId {
        self.heap.object(object).class()
    }

    pub fn class_name_of(&self, object: ObjectRef) -> &str {
        self.classes[self.class_of(object)].name()
    }

    pub fn instantiate(&mut self, class: ClassId) -> ObjectRef {
        let object = self.classes.instantiate(class, self.specials.nil);
        self.heap.allocate_object(object)
    }

    fn allocate_with(&mut self, class: ClassId, payload: Payload) -> ObjectRef {
        let mut object = self.classes.instantiate(class, self.specials.nil);
        object.payload = payload;
        self.heap.allocate_object(object)
    }

    pub fn new_integer(&mut self, value: i64) -> ObjectRef {
        self.allocate_with(self.builtins.integer, Payload::Integer(value))
    }

    pub fn new_float(&mut self, value: f64) -> ObjectRef {
        self.allocate_with(self.builtins.float, Payload::Float(value))
    }

    pub fn new_char(&mut self, value: char) -> ObjectRef {
        self.allocate_with(self.builtins.char, Payload::Char(value))
    }

    pub fn new_string(&mut self, value: impl Into<String>) -> ObjectRef {
        self.allocate_with(self.builtins.string, Payload::String(value.into()))
    }

    /// Closure over the record currently on top of the stack.
    pub fn new_block(&mut self, literal: Rc<BlockLiteral>) -> ObjectRef {
        let static_chain = self.top_frame();
        self.allocate_with(
            self.builtins.block,
            Payload::Block(Block {
                static_chain,
                literal,
            }),
        )
    }

    pub fn new_array(&mut self, elements: &[ObjectRef]) -> ObjectRef {
        let array = self.instantiate(self.builtins.array);
        let base = self.classes.total_attributes(self.builtins.array);
        let nil = self.nil();
        let object = self.heap.object_mut(array);
        object.resize(base + elements.len(), nil);
        for (index, &element) in elements.iter().enumerate() {
            object.set_attribute(base + index, element);
        }
        array
    }

    pub fn collect_garbage(&mut self) -> usize {
        let roots = VMRoots {
            stack: &self.stack,
            pending: &self.pending,
            specials: &self.specials,
            classes: &self.classes,
        };
        self.heap.collect(&roots)
    }

    pub fn collect_if_needed(&mut self) {
        if self.heap.should_collect() {
            self.collect_garbage();
        }
    }

    pub fn gc_stats(&self) -> GarbageCollectionStats {
        self.heap.stats()
    }

    /// Allocates a record for a call that is still collecting its arguments.
    /// It stays a root until `push_pending` or `discard_pending`.
    pub fn new_frame(&mut self, size: usize, receiver: ObjectRef) -> FrameRef {
        let frame = self
            .heap
            .allocate_frame(ActivationRecord::new(size, receiver, self.specials.nil));
        self.pending.push(frame);
        frame
    }

    pub fn push_pending(&mut self, frame: FrameRef) {
        self.discard_pending(frame);
        self.stack.push(frame);
    }

    /// The record becomes garbage unless a block captured it.
    pub fn discard_pending(&mut self, frame: FrameRef) {
        if let Some(index) = self.pending.iter().rposition(|&pending| pending == frame) {
            self.pending.remove(index);
        }
    }

    /// Popped records are left for the collector: a block may still point at them.
    #[track_caller]
    pub fn pop_frame(&mut self) -> FrameRef {
        self.stack
            .pop()
            .unwrap_or_else(|err| internal_error(format_args!("{err} while popping a record")))
    }

    #[track_caller]
    pub fn top_frame(&self) -> FrameRef {
        self.stack
            .top()
            .unwrap_or_else(|err| internal_error(format_args!("{err}: no current record")))
    }

    #[track_caller]
    pub fn bottom_frame(&self) -> FrameRef {
        self.stack
            .bottom()
            .unwrap_or_else(|err| internal_error(format_args!("{err}: no global record")))
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Drops all execution state after an aborted run.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.pending.clear();
        self.returning = None;
    }

    pub(crate) fn execution_mark(&self) -> (usize, usize) {
        (self.stack.depth(), self.pending.len())
    }

    /// Drops the records an aborted send left behind, down to `mark`.
    pub(crate) fn unwind_to(&mut self, mark: (usize, usize)) {
        let (depth, pending) = mark;
        self.stack.truncate(depth);
        self.pending.truncate(pending);
        self.returning = None;
    }

    /// Follows `depth` static-chain hops from the top record.
    #[track_caller]
    pub fn resolve_frame(&self, depth: usize) -> FrameRef {
        let mut frame = self.top_frame();
        for _ in 0..depth {
            let receiver = self.heap.frame(frame).receiver();
            frame = match self.heap.object(receiver).as_block() {
                Some(block) => block.static_chain,
                None => internal_error("static chain hop through a record that is not a block's"),
            };
        }
        frame
    }

    #[track_caller]
    pub fn get(&self, address: LexicalAddress) -> ObjectRef {
        match address.storage() {
            StorageClass::Local => {
                let frame = self.resolve_frame(address.depth());
                self.heap.frame(frame).get(address.position())
            }
            StorageClass::Attribute => {
                let frame = self.resolve_frame(address.depth());
                let receiver = self.heap.frame(frame).receiver();
                self.heap.object(receiver).attribute(address.position())
            }
            StorageClass::Global => self.heap.frame(self.bottom_frame()).get(address.position()),
        }
    }

    #[track_caller]
    pub fn store(&mut self, address: LexicalAddress, value: ObjectRef) {
        match address.storage() {
            StorageClass::Local => {
                let frame = self.resolve_frame(address.depth());
                self.heap.frame_mut(frame).set(address.position(), value);
            }
            StorageClass::Attribute => {
                let frame = self.resolve_frame(address.depth());
                let receiver = self.heap.frame(frame).receiver();
                self.heap
                    .object_mut(receiver)
                    .set_attribute(address.position(), value);
            }
            StorageClass::Global => {
                let frame = self.bottom_frame();
                self.heap.frame_mut(frame).set(address.position(), value);
            }
        }
    }

    /// Receiver of the current record (the block itself inside block bodies).
    pub fn receiver(&self) -> ObjectRef {
        self.heap.frame(self.top_frame()).receiver()
    }

    #[inline]
    pub fn is_returning(&self) -> bool {
        self.returning.is_some()
    }

    pub fn return_signal(&self) -> Option<ReturnSignal> {
        self.returning
    }

    pub fn return_from(&mut self, target: FrameRef, value: ObjectRef) {
        self.returning = Some(ReturnSignal { target, value });
    }

    /// Clears the signal if it was aimed at `frame`, yielding its value.
    pub fn take_return_for(&mut self, frame: FrameRef) -> Option<ObjectRef> {
        match self.returning {
            Some(signal) if signal.target == frame => {
                self.returning = None;
                Some(signal.value)
            }
            _ => None,
        }
    }

    pub(crate) fn clear_return(&mut self) -> Option<ReturnSignal> {
        self.returning.take()
    }

    /// Dispatch. Ordinary sends start at the receiver's class; `super` sends
    /// start above the class that contains the sending code.
    pub fn lookup(
        &self,
        receiver: ObjectRef,
        selector: &str,
        super_of: Option<ClassId>,
    ) -> Result<ResolvedMethod, RuntimeError> {
        let start = match super_of {
            Some(enclosing) => self.classes[enclosing].superclass(),
            None => Some(self.class_of(receiver)),
        };
        let found = start.and_then(|class| self.classes.find_method(class, selector));
        let Some((holder, method)) = found else {
            let (description, class) = self.describe_receiver(receiver);
            return Err(RuntimeError::MessageNotUnderstood {
                receiver: description,
                class,
                selector: selector.to_string(),
            });
        };
        let Some(body) = method.body() else {
            return Err(RuntimeError::MissingBody {
                class: self.classes[self.class_of(receiver)].name().to_string(),
                selector: selector.to_string(),
            });
        };
        Ok(ResolvedMethod {
            holder,
            body: body.clone(),
            ar_size: method.ar_size(),
        })
    }

    fn describe_receiver(&self, receiver: ObjectRef) -> (String, String) {
        let object = self.heap.object(receiver);
        match object.represented_class() {
            Some(class) => {
                let name = self.classes[class].name();
                (format!("class \"{name}\""), name.to_string())
            }
            None => {
                let name = self.classes[object.class()].name();
                (format!("{name} object"), name.to_string())
            }
        }
    }

    pub fn write_output(&mut self, text: &str) {
        match &mut self.console {
            Console::Stdout => {
                let mut stdout = std::io::stdout().lock();
                if let Err(err) = stdout.write_all(text.as_bytes()) {
                    log::warn!("could not write to stdout: {err}");
                }
            }
            Console::Captured(buffer) => buffer.push_str(text),
        }
    }

    pub fn flush_output(&mut self) {
        if let Console::Stdout = self.console {
            if let Err(err) = std::io::stdout().flush() {
                log::warn!("could not flush stdout: {err}");
            }
        }
    }

    /// Everything written to `cout` so far, when output is captured.
    pub fn captured_output(&self) -> Option<&str> {
        match &self.console {
            Console::Captured(buffer) => Some(buffer),
            Console::Stdout => None,
        }
    }

    /// Uniform-ish value in `0..bound`; `bound` must be positive.
    pub fn random_below(&mut self, bound: i64) -> i64 {
        self.random_counter = self.random_counter.wrapping_add(1);
        let bits = BuildHasher::hash_one(&self.random, self.random_counter);
        (bits % bound as u64) as i64
    }
}
