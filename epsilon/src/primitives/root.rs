use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("isNil", is_nil),
    PrimitiveMessage::new("classOf", class_of),
    PrimitiveMessage::new("error:", error),
];

pub fn is_nil(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    Ok(ctx.boolean(false))
}

/// Answers the class as an object, or nil for classes that have none
/// (metaclasses are not first-class).
pub fn class_of(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let class = ctx.vm.class_of(ctx.receiver);
    Ok(ctx.vm.classes[class]
        .representative()
        .unwrap_or_else(|| ctx.nil()))
}

// self error: "message"
pub fn error(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let message = match ctx.vm.heap.object(ctx.argument(0)).as_str() {
        Some(message) => message.to_string(),
        None => return Err(ctx.failed("argument to error: must be a string")),
    };
    Err(RuntimeError::Signaled {
        class: ctx.vm.class_name_of(ctx.receiver).to_string(),
        selector: ctx.selector.to_string(),
        message,
    })
}
