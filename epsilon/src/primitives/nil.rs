use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("isNil", is_nil),
    PrimitiveMessage::new("hashValue", hash_value),
    PrimitiveMessage::new("displayOn:", display_on),
];

pub fn is_nil(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    Ok(ctx.boolean(true))
}

pub fn hash_value(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    Ok(ctx.vm.new_integer(0))
}

pub fn display_on(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    ctx.display("nil")
}
