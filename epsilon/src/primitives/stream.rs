use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[PrimitiveMessage::new("nl", nl)];

pub fn nl(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    ctx.vm.write_output("\n");
    Ok(ctx.receiver)
}
