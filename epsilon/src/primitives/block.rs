use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("evaluate", evaluate),
    PrimitiveMessage::new("evaluateOn:", evaluate),
    PrimitiveMessage::new("evaluateOn:and:", evaluate),
    PrimitiveMessage::new("evaluateOn:and:and:", evaluate),
    PrimitiveMessage::new("whileTrue:", while_true),
    PrimitiveMessage::new("whileFalse:", while_false),
    PrimitiveMessage::new("until:", until),
];

/// Runs the receiver with this message's arguments, answering the block's value.
pub fn evaluate(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let block = ctx.receiver_block()?;
    let arguments: Vec<ObjectRef> = ctx.vm.heap.frame(ctx.frame).slots()[1..]
        .iter()
        .take(crate::selector_arity(ctx.selector))
        .copied()
        .collect();
    ctx.invoke_block(block, &arguments)
}

// Runs the body until the condition answers `stop`; any other value keeps looping.
fn conditional_loop(ctx: &mut PrimitiveContext, stop: bool) -> Result<ObjectRef, RuntimeError> {
    let condition = ctx.receiver_block()?;
    let body = ctx.block_argument(0)?;
    let stop = ctx.boolean(stop);
    loop {
        let value = ctx.invoke_block(condition, &[])?;
        if ctx.vm.is_returning() || value == stop {
            break;
        }
        ctx.invoke_block(body, &[])?;
        if ctx.vm.is_returning() {
            break;
        }
    }
    Ok(ctx.nil())
}

// [x < y] whileTrue: [x := x + 1]
pub fn while_true(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    conditional_loop(ctx, false)
}

pub fn while_false(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    conditional_loop(ctx, true)
}

// [x := x + 1] until: [x > 10]; the body runs at least once
pub fn until(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let body = ctx.receiver_block()?;
    let condition = ctx.block_argument(0)?;
    let done = ctx.boolean(true);
    loop {
        ctx.invoke_block(body, &[])?;
        if ctx.vm.is_returning() {
            break;
        }
        let value = ctx.invoke_block(condition, &[])?;
        if ctx.vm.is_returning() || value == done {
            break;
        }
    }
    Ok(ctx.nil())
}
