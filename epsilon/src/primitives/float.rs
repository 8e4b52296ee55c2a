use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("+", add),
    PrimitiveMessage::new("-", sub),
    PrimitiveMessage::new("*", mul),
    PrimitiveMessage::new("/", div),
    PrimitiveMessage::new(">", gt),
    PrimitiveMessage::new("<", lt),
    PrimitiveMessage::new(">=", geq),
    PrimitiveMessage::new("<=", leq),
    PrimitiveMessage::new("equal:", eq),
    PrimitiveMessage::new("notEqual:", neq),
    PrimitiveMessage::new("asInt", as_int),
    PrimitiveMessage::new("asString", as_string),
    PrimitiveMessage::new("hashValue", as_int),
    PrimitiveMessage::new("sin", sin),
    PrimitiveMessage::new("cos", cos),
    PrimitiveMessage::new("tan", tan),
    PrimitiveMessage::new("asin", asin),
    PrimitiveMessage::new("acos", acos),
    PrimitiveMessage::new("atan", atan),
    PrimitiveMessage::new("sqrt", sqrt),
    PrimitiveMessage::new("displayOn:", display_on),
];

fn float_binop(
    ctx: &mut PrimitiveContext,
    op: fn(f64, f64) -> f64,
) -> Result<ObjectRef, RuntimeError> {
    let a = ctx.receiver_float()?;
    let b = ctx.float_argument(0)?;
    Ok(ctx.vm.new_float(op(a, b)))
}

fn float_compare(
    ctx: &mut PrimitiveContext,
    op: fn(&f64, &f64) -> bool,
) -> Result<ObjectRef, RuntimeError> {
    let a = ctx.receiver_float()?;
    let b = ctx.float_argument(0)?;
    Ok(ctx.boolean(op(&a, &b)))
}

// `domain` limits the receiver; values outside it raise instead of producing NaN
fn float_unary(
    ctx: &mut PrimitiveContext,
    op: fn(f64) -> f64,
    domain: fn(f64) -> bool,
) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_float()?;
    if !domain(value) {
        return Err(ctx.domain());
    }
    Ok(ctx.vm.new_float(op(value)))
}

pub fn add(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_binop(ctx, |a, b| a + b)
}

pub fn sub(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_binop(ctx, |a, b| a - b)
}

pub fn mul(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_binop(ctx, |a, b| a * b)
}

pub fn div(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    if ctx.float_argument(0)? == 0.0 {
        return Err(ctx.division_by_zero());
    }
    float_binop(ctx, |a, b| a / b)
}

pub fn gt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_compare(ctx, f64::gt)
}

pub fn lt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_compare(ctx, f64::lt)
}

pub fn geq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_compare(ctx, f64::ge)
}

pub fn leq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_compare(ctx, f64::le)
}

pub fn eq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_compare(ctx, f64::eq)
}

pub fn neq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_compare(ctx, f64::ne)
}

// truncates; out-of-range values saturate
pub fn as_int(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_float()?;
    Ok(ctx.vm.new_integer(value as i64))
}

pub fn as_string(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_float()?;
    Ok(ctx.vm.new_string(value.to_string()))
}

pub fn sin(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_unary(ctx, f64::sin, f64::is_finite)
}

pub fn cos(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_unary(ctx, f64::cos, f64::is_finite)
}

pub fn tan(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_unary(ctx, f64::tan, f64::is_finite)
}

pub fn asin(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_unary(ctx, f64::asin, |x| (-1.0..=1.0).contains(&x))
}

pub fn acos(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_unary(ctx, f64::acos, |x| (-1.0..=1.0).contains(&x))
}

pub fn atan(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_unary(ctx, f64::atan, |x| !x.is_nan())
}

pub fn sqrt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    float_unary(ctx, f64::sqrt, |x| x >= 0.0)
}

pub fn display_on(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_float()?;
    ctx.display(&value.to_string())
}
