use std::rc::Rc;

use crate::{ObjectRef, PrimitiveContext, RuntimeError, SyntaxForest, TemporaryAllocator};

pub type NativeMethod = fn(&mut PrimitiveContext) -> Result<ObjectRef, RuntimeError>;

#[derive(Debug, Clone)]
pub enum MethodBody {
    Native(NativeMethod),
    Interpreted(Rc<InterpretedMethod>),
}

/// Method body in AST form plus the record size it runs in.
#[derive(Debug)]
pub struct InterpretedMethod {
    pub parameters: usize,
    pub locals: usize,
    pub body: SyntaxForest,
    pub ar_size: usize,
}

impl InterpretedMethod {
    /// Assigns temporaries for `body`, which must not have been allocated yet.
    /// Slots are laid out as self, parameters, locals, temporaries.
    pub fn new(parameters: usize, locals: usize, mut body: SyntaxForest) -> Self {
        let first_temporary = 1 + parameters + locals;
        let temporaries = TemporaryAllocator::new(first_temporary).allocate(&mut body);
        Self {
            parameters,
            locals,
            body,
            ar_size: first_temporary + temporaries,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Method {
    selector: String,
    arity: usize,
    body: Option<MethodBody>,
}

impl Method {
    pub fn new(selector: &str, body: Option<MethodBody>) -> Self {
        Self {
            selector: selector.to_string(),
            arity: selector_arity(selector),
            body,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Parameters, not counting the receiver.
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn body(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }

    pub fn ar_size(&self) -> usize {
        let minimum = self.arity + 1;
        match &self.body {
            Some(MethodBody::Interpreted(method)) => method.ar_size.max(minimum),
            _ => minimum,
        }
    }
}

/// Operators (`+`, `<<`, `==`...) take one parameter, keyword selectors one per colon.
pub fn selector_arity(selector: &str) -> usize {
    match selector.chars().next() {
        Some(first) if !first.is_alphabetic() => 1,
        _ => selector.matches(':').count(),
    }
}
