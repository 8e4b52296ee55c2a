use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const TRUE_MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("ifTrue:", run_first),
    PrimitiveMessage::new("ifFalse:", skip),
    PrimitiveMessage::new("ifTrue:else:", run_first),
    PrimitiveMessage::new("ifFalse:else:", run_second),
    PrimitiveMessage::new("&&", true_and),
    PrimitiveMessage::new("||", true_or),
    PrimitiveMessage::new("not", true_not),
    PrimitiveMessage::new("displayOn:", true_display_on),
];

pub const FALSE_MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("ifTrue:", skip),
    PrimitiveMessage::new("ifFalse:", run_first),
    PrimitiveMessage::new("ifTrue:else:", run_second),
    PrimitiveMessage::new("ifFalse:else:", run_first),
    PrimitiveMessage::new("&&", false_and),
    PrimitiveMessage::new("||", false_or),
    PrimitiveMessage::new("not", false_not),
    PrimitiveMessage::new("displayOn:", false_display_on),
];

// The conditionals answer nil whichever branch ran.

fn run_branch(ctx: &mut PrimitiveContext, index: usize) -> Result<ObjectRef, RuntimeError> {
    let block = ctx.block_argument(index)?;
    ctx.invoke_block(block, &[])?;
    Ok(ctx.nil())
}

pub fn run_first(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    run_branch(ctx, 0)
}

pub fn run_second(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    run_branch(ctx, 1)
}

pub fn skip(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    Ok(ctx.nil())
}

pub fn true_and(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let other = ctx.boolean_argument(0)?;
    Ok(ctx.boolean(other))
}

pub fn true_or(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    ctx.boolean_argument(0)?;
    Ok(ctx.boolean(true))
}

pub fn true_not(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    Ok(ctx.boolean(false))
}

pub fn true_display_on(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    ctx.display("true")
}

pub fn false_and(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    ctx.boolean_argument(0)?;
    Ok(ctx.boolean(false))
}

pub fn false_or(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let other = ctx.boolean_argument(0)?;
    Ok(ctx.boolean(other))
}

pub fn false_not(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    Ok(ctx.boolean(true))
}

pub fn false_display_on(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    ctx.display("false")
}
