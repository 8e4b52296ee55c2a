use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("setSize:", set_size),
    PrimitiveMessage::new("getSize", get_size),
    PrimitiveMessage::new("at:", at),
    PrimitiveMessage::new("at:put:", at_put),
    PrimitiveMessage::new("copyFrom:", copy_from),
];

// Elements follow the attributes of the object's own class, so subclasses
// of Array keep their attributes in front.
fn layout(ctx: &PrimitiveContext, array: ObjectRef) -> (usize, usize) {
    let base = ctx.vm.classes.total_attributes(ctx.vm.class_of(array));
    let count = ctx.vm.heap.object(array).attribute_count();
    (base, count.saturating_sub(base))
}

fn element_index(ctx: &PrimitiveContext, index: i64) -> Result<usize, RuntimeError> {
    let (base, length) = layout(ctx, ctx.receiver);
    usize::try_from(index)
        .ok()
        .filter(|&index| index < length)
        .map(|index| base + index)
        .ok_or_else(|| ctx.index_out_of_range())
}

// anArray setSize: n; keeps the elements that still fit, answers self
pub fn set_size(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let size = ctx.integer_argument(0)?;
    let Ok(size) = usize::try_from(size) else {
        return Err(ctx.domain());
    };
    let (base, _) = layout(ctx, ctx.receiver);
    let nil = ctx.nil();
    ctx.vm.heap.object_mut(ctx.receiver).resize(base + size, nil);
    Ok(ctx.receiver)
}

pub fn get_size(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let (_, length) = layout(ctx, ctx.receiver);
    Ok(ctx.vm.new_integer(length as i64))
}

pub fn at(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let index = ctx.integer_argument(0)?;
    let slot = element_index(ctx, index)?;
    Ok(ctx.vm.heap.object(ctx.receiver).attribute(slot))
}

pub fn at_put(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let index = ctx.integer_argument(0)?;
    let value = ctx.argument(1);
    let slot = element_index(ctx, index)?;
    ctx.vm.heap.object_mut(ctx.receiver).set_attribute(slot, value);
    Ok(ctx.receiver)
}

// copies as many leading elements as both arrays hold
pub fn copy_from(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let source = ctx.argument(0);
    if !ctx
        .vm
        .classes
        .is_subclass_of(ctx.vm.class_of(source), ctx.vm.builtins.array)
    {
        return Err(ctx.type_mismatch());
    }
    let (base, length) = layout(ctx, ctx.receiver);
    let (source_base, source_length) = layout(ctx, source);
    let count = length.min(source_length);
    let elements = ctx.vm.heap.object(source).attributes()[source_base..source_base + count].to_vec();
    let target = ctx.vm.heap.object_mut(ctx.receiver);
    for (offset, element) in elements.into_iter().enumerate() {
        target.set_attribute(base + offset, element);
    }
    Ok(ctx.receiver)
}
