use crate::{ClassId, ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

use super::root;

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("new", new),
    PrimitiveMessage::new("superClass", super_class),
    PrimitiveMessage::new("subClasses", sub_classes),
    PrimitiveMessage::new("name", name),
    PrimitiveMessage::new("isNil", root::is_nil),
    PrimitiveMessage::new("classOf", root::class_of),
    PrimitiveMessage::new("error:", root::error),
];

fn represented(ctx: &PrimitiveContext) -> Result<ClassId, RuntimeError> {
    ctx.vm
        .heap
        .object(ctx.receiver)
        .represented_class()
        .ok_or_else(|| ctx.type_mismatch())
}

// SomeClass new
pub fn new(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let class = represented(ctx)?;
    ctx.vm.collect_if_needed();
    Ok(ctx.vm.instantiate(class))
}

pub fn super_class(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let class = represented(ctx)?;
    Ok(ctx.vm.classes[class]
        .superclass()
        .and_then(|superclass| ctx.vm.classes[superclass].representative())
        .unwrap_or_else(|| ctx.nil()))
}

pub fn sub_classes(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let class = represented(ctx)?;
    let subclasses: Vec<ObjectRef> = ctx.vm.classes[class]
        .subclasses()
        .iter()
        .filter_map(|&subclass| ctx.vm.classes[subclass].representative())
        .collect();
    Ok(ctx.vm.new_array(&subclasses))
}

pub fn name(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let class = represented(ctx)?;
    let name = ctx.vm.classes[class].name().to_string();
    Ok(ctx.vm.new_string(name))
}
