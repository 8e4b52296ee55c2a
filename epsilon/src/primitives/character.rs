use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("<", lt),
    PrimitiveMessage::new(">", gt),
    PrimitiveMessage::new("equal:", eq),
    PrimitiveMessage::new("asString", as_string),
    PrimitiveMessage::new("ascii", ascii),
    PrimitiveMessage::new("hashValue", ascii),
    PrimitiveMessage::new("displayOn:", display_on),
];

fn char_compare(
    ctx: &mut PrimitiveContext,
    op: fn(&char, &char) -> bool,
) -> Result<ObjectRef, RuntimeError> {
    let a = ctx.receiver_char()?;
    let b = ctx.char_argument(0)?;
    Ok(ctx.boolean(op(&a, &b)))
}

pub fn lt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    char_compare(ctx, char::lt)
}

pub fn gt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    char_compare(ctx, char::gt)
}

pub fn eq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    char_compare(ctx, char::eq)
}

pub fn as_string(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_char()?;
    Ok(ctx.vm.new_string(value.to_string()))
}

// code point, which is the ASCII code for ASCII characters
pub fn ascii(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_char()?;
    Ok(ctx.vm.new_integer(i64::from(u32::from(value))))
}

pub fn display_on(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_char()?;
    ctx.display(value.encode_utf8(&mut [0; 4]))
}
