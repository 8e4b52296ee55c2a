mod activation;
mod address;
pub mod ast;
pub mod bootstrap;
mod class;
mod error;
mod heap;
mod interpreter;
mod method;
mod object;
pub mod primitives;
mod temporaries;
mod visitor;
mod vm;

pub use activation::*;
pub use address::*;
pub use ast::{
    BlockLiteral, CoalescedSend, Expr, ExprKind, MessageSend, MethodName, Program, Stmt,
    SyntaxForest,
};
pub use class::*;
pub use error::*;
pub use heap::*;
pub use method::*;
pub use object::*;
pub use primitives::{PrimitiveContext, PrimitiveMessage};
pub use temporaries::*;
pub use visitor::{RootProvider, Visitable, Visitor};
pub use vm::*;
