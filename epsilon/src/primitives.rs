use crate::{ClassId, FrameRef, NativeMethod, ObjectRef, Payload, RuntimeError, VM};

pub mod array;
pub mod block;
pub mod boolean;
pub mod character;
pub mod float;
pub mod integer;
pub mod meta;
pub mod nil;
pub mod root;
pub mod stream;
pub mod string;

/// A native method as installed into a built-in class.
#[derive(Debug, Copy, Clone)]
pub struct PrimitiveMessage<'a> {
    pub selector: &'a str,
    pub ptr: NativeMethod,
}

impl<'a> PrimitiveMessage<'a> {
    pub const fn new(selector: &'a str, ptr: NativeMethod) -> Self {
        Self { selector, ptr }
    }
}

pub struct PrimitiveContext<'vm, 'sel> {
    pub vm: &'vm mut VM,
    pub receiver: ObjectRef,
    // the native's own record; arguments sit in slots 1.. and stay rooted
    // while the native calls back into the engine
    pub frame: FrameRef,
    // class the method was found in, named in error messages
    pub holder: ClassId,
    pub selector: &'sel str,
}

impl<'vm, 'sel> PrimitiveContext<'vm, 'sel> {
    pub fn new(
        vm: &'vm mut VM,
        receiver: ObjectRef,
        frame: FrameRef,
        holder: ClassId,
        selector: &'sel str,
    ) -> Self {
        Self {
            vm,
            receiver,
            frame,
            holder,
            selector,
        }
    }

    #[inline]
    pub fn argument(&self, index: usize) -> ObjectRef {
        self.vm.heap.frame(self.frame).get(index + 1)
    }

    #[inline]
    pub fn nil(&self) -> ObjectRef {
        self.vm.nil()
    }

    #[inline]
    pub fn boolean(&self, value: bool) -> ObjectRef {
        self.vm.boolean(value)
    }

    pub fn holder_name(&self) -> String {
        self.vm.classes[self.holder].name().to_string()
    }

    pub fn type_mismatch(&self) -> RuntimeError {
        RuntimeError::TypeMismatch {
            class: self.holder_name(),
            selector: self.selector.to_string(),
        }
    }

    pub fn division_by_zero(&self) -> RuntimeError {
        RuntimeError::DivisionByZero {
            class: self.holder_name(),
            selector: self.selector.to_string(),
        }
    }

    pub fn index_out_of_range(&self) -> RuntimeError {
        RuntimeError::IndexOutOfRange {
            class: self.holder_name(),
            selector: self.selector.to_string(),
        }
    }

    pub fn domain(&self) -> RuntimeError {
        RuntimeError::Domain {
            class: self.holder_name(),
            selector: self.selector.to_string(),
        }
    }

    pub fn failed(&self, reason: &'static str) -> RuntimeError {
        RuntimeError::Failed {
            class: self.holder_name(),
            selector: self.selector.to_string(),
            reason,
        }
    }

    pub fn receiver_integer(&self) -> Result<i64, RuntimeError> {
        self.integer_of(self.receiver)
    }

    pub fn integer_argument(&self, index: usize) -> Result<i64, RuntimeError> {
        self.integer_of(self.argument(index))
    }

    fn integer_of(&self, object: ObjectRef) -> Result<i64, RuntimeError> {
        self.vm
            .heap
            .object(object)
            .as_integer()
            .ok_or_else(|| self.type_mismatch())
    }

    pub fn receiver_float(&self) -> Result<f64, RuntimeError> {
        self.float_of(self.receiver)
    }

    pub fn float_argument(&self, index: usize) -> Result<f64, RuntimeError> {
        self.float_of(self.argument(index))
    }

    fn float_of(&self, object: ObjectRef) -> Result<f64, RuntimeError> {
        self.vm
            .heap
            .object(object)
            .as_float()
            .ok_or_else(|| self.type_mismatch())
    }

    pub fn receiver_char(&self) -> Result<char, RuntimeError> {
        self.char_of(self.receiver)
    }

    pub fn char_argument(&self, index: usize) -> Result<char, RuntimeError> {
        self.char_of(self.argument(index))
    }

    fn char_of(&self, object: ObjectRef) -> Result<char, RuntimeError> {
        self.vm
            .heap
            .object(object)
            .as_char()
            .ok_or_else(|| self.type_mismatch())
    }

    pub fn receiver_str(&self) -> Result<&str, RuntimeError> {
        self.str_of(self.receiver)
    }

    pub fn str_argument(&self, index: usize) -> Result<&str, RuntimeError> {
        self.str_of(self.argument(index))
    }

    fn str_of(&self, object: ObjectRef) -> Result<&str, RuntimeError> {
        match self.vm.heap.object(object).as_str() {
            Some(value) => Ok(value),
            None => Err(self.type_mismatch()),
        }
    }

    pub fn receiver_block(&self) -> Result<ObjectRef, RuntimeError> {
        self.block_of(self.receiver)
    }

    pub fn block_argument(&self, index: usize) -> Result<ObjectRef, RuntimeError> {
        self.block_of(self.argument(index))
    }

    fn block_of(&self, object: ObjectRef) -> Result<ObjectRef, RuntimeError> {
        match self.vm.heap.object(object).as_block() {
            Some(_) => Ok(object),
            None => Err(self.type_mismatch()),
        }
    }

    /// The stream a `displayOn:` argument must be.
    pub fn stream_argument(&self, index: usize) -> Result<ObjectRef, RuntimeError> {
        let stream = self.argument(index);
        match self.vm.heap.object(stream).payload {
            Payload::OutStream => Ok(stream),
            _ => Err(self.type_mismatch()),
        }
    }

    pub fn boolean_argument(&self, index: usize) -> Result<bool, RuntimeError> {
        let object = self.argument(index);
        if object == self.vm.specials.true_object {
            Ok(true)
        } else if object == self.vm.specials.false_object {
            Ok(false)
        } else {
            Err(self.type_mismatch())
        }
    }

    pub fn invoke_block(
        &mut self,
        block: ObjectRef,
        arguments: &[ObjectRef],
    ) -> Result<ObjectRef, RuntimeError> {
        self.vm.invoke_block(block, arguments)
    }

    /// Writes `text` to the console and answers the stream.
    pub fn display(&mut self, text: &str) -> Result<ObjectRef, RuntimeError> {
        let stream = self.stream_argument(0)?;
        self.vm.write_output(text);
        Ok(stream)
    }
}
