use std::rc::Rc;

use crate::{ClassId, LexicalAddress, TemporaryAllocator};

/// Selector plus, for `super` sends, the class whose method contains the send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodName {
    pub selector: String,
    pub super_of: Option<ClassId>,
}

impl MethodName {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            super_of: None,
        }
    }

    /// Lookup starts at the superclass of `enclosing`, not at the receiver's class.
    pub fn super_send(selector: &str, enclosing: ClassId) -> Self {
        Self {
            selector: selector.to_string(),
            super_of: Some(enclosing),
        }
    }
}

#[derive(Debug)]
pub struct MessageSend {
    pub recipient: Box<Expr>,
    pub method: MethodName,
    pub params: Vec<Expr>,
}

/// A cascaded message: goes to the recipient of the first send in the chain
/// without evaluating it again.
#[derive(Debug)]
pub struct CoalescedSend {
    pub previous: Box<Expr>,
    pub method: MethodName,
    pub params: Vec<Expr>,
}

impl CoalescedSend {
    pub fn recipient(&self) -> &Expr {
        let mut previous = &*self.previous;
        loop {
            match &previous.kind {
                ExprKind::Send(send) => return &send.recipient,
                ExprKind::CoalescedSend(send) => previous = &send.previous,
                // a malformed cascade degenerates to its head expression
                _ => return previous,
            }
        }
    }
}

#[derive(Debug)]
pub enum ExprKind {
    Identifier(LexicalAddress),
    Send(MessageSend),
    CoalescedSend(CoalescedSend),
    /// Identity comparison, not overridable.
    Equals(Box<Expr>, Box<Expr>),
    New(ClassId),
    ClassName(ClassId),
    Integer(i64),
    Float(f64),
    Char(char),
    String(String),
    Block(Rc<BlockLiteral>),
}

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    // assigned by the temporary allocator
    pub temporary: LexicalAddress,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            temporary: LexicalAddress::NO_TEMPORARY,
        }
    }
}

#[derive(Debug)]
pub enum Stmt {
    Expr(Expr),
    /// `nesting_level` counts the block scopes between the return and its method.
    Return {
        expr: Expr,
        nesting_level: usize,
    },
    Bind {
        target: LexicalAddress,
        value: Expr,
    },
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn ret(expr: Expr, nesting_level: usize) -> Self {
        Stmt::Return {
            expr,
            nesting_level,
        }
    }

    pub fn bind(target: LexicalAddress, value: Expr) -> Self {
        Stmt::Bind { target, value }
    }
}

/// Statement list: method bodies, block bodies and `main`.
#[derive(Debug, Default)]
pub struct SyntaxForest {
    statements: Vec<Stmt>,
}

impl SyntaxForest {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[Stmt] {
        &self.statements
    }

    pub fn statements_mut(&mut self) -> &mut [Stmt] {
        &mut self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug)]
pub struct BlockLiteral {
    pub parameters: usize,
    pub locals: usize,
    pub body: SyntaxForest,
    pub ar_size: usize,
}

impl BlockLiteral {
    /// Blocks run in their own record: self (the block), parameters, locals,
    /// then temporaries allocated here independently of the enclosing code.
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

/// Program handed over by the front end: `main` and the size of the global record.
#[derive(Debug)]
pub struct Program {
    pub globals: usize,
    pub main: SyntaxForest,
    pub main_ar_size: usize,
}

impl Program {
    pub fn new(globals: usize, locals: usize, mut main: SyntaxForest) -> Self {
        let first_temporary = 1 + locals;
        let temporaries = TemporaryAllocator::new(first_temporary).allocate(&mut main);
        Self {
            globals,
            main,
            main_ar_size: first_temporary + temporaries,
        }
    }
}

pub fn local(depth: usize, position: usize) -> Expr {
    Expr::new(ExprKind::Identifier(LexicalAddress::local(depth, position)))
}

pub fn attribute(depth: usize, position: usize) -> Expr {
    Expr::new(ExprKind::Identifier(LexicalAddress::attribute(depth, position)))
}

pub fn global(position: usize) -> Expr {
    Expr::new(ExprKind::Identifier(LexicalAddress::global(position)))
}

pub fn send(recipient: Expr, selector: &str, params: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Send(MessageSend {
        recipient: Box::new(recipient),
        method: MethodName::new(selector),
        params,
    }))
}

pub fn super_send(recipient: Expr, enclosing: ClassId, selector: &str, params: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Send(MessageSend {
        recipient: Box::new(recipient),
        method: MethodName::super_send(selector, enclosing),
        params,
    }))
}

pub fn cascade(previous: Expr, selector: &str, params: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::CoalescedSend(CoalescedSend {
        previous: Box::new(previous),
        method: MethodName::new(selector),
        params,
    }))
}

pub fn equals(lhs: Expr, rhs: Expr) -> Expr {
    Expr::new(ExprKind::Equals(Box::new(lhs), Box::new(rhs)))
}

pub fn new_instance(class: ClassId) -> Expr {
    Expr::new(ExprKind::New(class))
}

pub fn class_name(class: ClassId) -> Expr {
    Expr::new(ExprKind::ClassName(class))
}

pub fn int(value: i64) -> Expr {
    Expr::new(ExprKind::Integer(value))
}

pub fn float(value: f64) -> Expr {
    Expr::new(ExprKind::Float(value))
}

pub fn character(value: char) -> Expr {
    Expr::new(ExprKind::Char(value))
}

pub fn string(value: &str) -> Expr {
    Expr::new(ExprKind::String(value.to_string()))
}

pub fn block(parameters: usize, locals: usize, statements: Vec<Stmt>) -> Expr {
    Expr::new(ExprKind::Block(Rc::new(BlockLiteral::new(
        parameters,
        locals,
        SyntaxForest::new(statements),
    ))))
}
