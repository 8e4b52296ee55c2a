use crate::{ObjectRef, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("+", add),
    PrimitiveMessage::new("-", sub),
    PrimitiveMessage::new("*", mul),
    PrimitiveMessage::new("/", div),
    PrimitiveMessage::new("%", rem),
    PrimitiveMessage::new(">", gt),
    PrimitiveMessage::new("<", lt),
    PrimitiveMessage::new(">=", geq),
    PrimitiveMessage::new("<=", leq),
    PrimitiveMessage::new("equal:", eq),
    PrimitiveMessage::new("notEqual:", neq),
    PrimitiveMessage::new("<<", shift_left),
    PrimitiveMessage::new(">>", shift_right),
    PrimitiveMessage::new("&&", bit_and),
    PrimitiveMessage::new("||", bit_or),
    PrimitiveMessage::new("bitNot", bit_not),
    PrimitiveMessage::new("asFloat", as_float),
    PrimitiveMessage::new("asString", as_string),
    PrimitiveMessage::new("asChar", as_char),
    PrimitiveMessage::new("hashValue", hash_value),
    PrimitiveMessage::new("random", random),
    PrimitiveMessage::new("upTo:do:", up_to_do),
    PrimitiveMessage::new("downTo:do:", down_to_do),
    PrimitiveMessage::new("timesDo:", times_do),
    PrimitiveMessage::new("displayOn:", display_on),
];

type Integer2Op = fn(a: i64, b: i64) -> Option<i64>;

// `None` from the operation means the right operand was out of its domain.
fn integer_binop(
    ctx: &mut PrimitiveContext,
    op: Integer2Op,
    on_none: fn(&PrimitiveContext) -> RuntimeError,
) -> Result<ObjectRef, RuntimeError> {
    let a = ctx.receiver_integer()?;
    let b = ctx.integer_argument(0)?;
    match op(a, b) {
        Some(value) => Ok(ctx.vm.new_integer(value)),
        None => Err(on_none(ctx)),
    }
}

fn integer_compare(
    ctx: &mut PrimitiveContext,
    op: fn(&i64, &i64) -> bool,
) -> Result<ObjectRef, RuntimeError> {
    let a = ctx.receiver_integer()?;
    let b = ctx.integer_argument(0)?;
    Ok(ctx.boolean(op(&a, &b)))
}

pub fn add(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(ctx, |a, b| Some(a.wrapping_add(b)), |ctx| ctx.domain())
}

pub fn sub(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(ctx, |a, b| Some(a.wrapping_sub(b)), |ctx| ctx.domain())
}

pub fn mul(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(ctx, |a, b| Some(a.wrapping_mul(b)), |ctx| ctx.domain())
}

// truncates towards zero
pub fn div(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(
        ctx,
        |a, b| (b != 0).then(|| a.wrapping_div(b)),
        |ctx| ctx.division_by_zero(),
    )
}

pub fn rem(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(
        ctx,
        |a, b| (b != 0).then(|| a.wrapping_rem(b)),
        |ctx| ctx.division_by_zero(),
    )
}

pub fn gt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_compare(ctx, i64::gt)
}

pub fn lt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_compare(ctx, i64::lt)
}

pub fn geq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_compare(ctx, i64::ge)
}

pub fn leq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_compare(ctx, i64::le)
}

pub fn eq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_compare(ctx, i64::eq)
}

pub fn neq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_compare(ctx, i64::ne)
}

pub fn shift_left(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(
        ctx,
        |a, b| u32::try_from(b).ok().and_then(|b| a.checked_shl(b)),
        |ctx| ctx.domain(),
    )
}

pub fn shift_right(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(
        ctx,
        |a, b| u32::try_from(b).ok().and_then(|b| a.checked_shr(b)),
        |ctx| ctx.domain(),
    )
}

pub fn bit_and(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(ctx, |a, b| Some(a & b), |ctx| ctx.domain())
}

pub fn bit_or(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    integer_binop(ctx, |a, b| Some(a | b), |ctx| ctx.domain())
}

pub fn bit_not(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_integer()?;
    Ok(ctx.vm.new_integer(!value))
}

pub fn as_float(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_integer()?;
    Ok(ctx.vm.new_float(value as f64))
}

pub fn as_string(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_integer()?;
    Ok(ctx.vm.new_string(value.to_string()))
}

pub fn as_char(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_integer()?;
    let Some(value) = u32::try_from(value).ok().and_then(char::from_u32) else {
        return Err(ctx.domain());
    };
    Ok(ctx.vm.new_char(value))
}

pub fn hash_value(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    ctx.receiver_integer()?;
    Ok(ctx.receiver)
}

// 6 random => 0..=5
pub fn random(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let bound = ctx.receiver_integer()?;
    if bound <= 0 {
        return Err(ctx.domain());
    }
    let value = ctx.vm.random_below(bound);
    Ok(ctx.vm.new_integer(value))
}

// 1 upTo: 10 do: [:i | ...]
pub fn up_to_do(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let from = ctx.receiver_integer()?;
    let to = ctx.integer_argument(0)?;
    let block = ctx.block_argument(1)?;
    for i in from..=to {
        let index = ctx.vm.new_integer(i);
        ctx.invoke_block(block, &[index])?;
        if ctx.vm.is_returning() {
            break;
        }
    }
    Ok(ctx.nil())
}

// 10 downTo: 1 do: [:i | ...]
pub fn down_to_do(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let from = ctx.receiver_integer()?;
    let to = ctx.integer_argument(0)?;
    let block = ctx.block_argument(1)?;
    for i in (to..=from).rev() {
        let index = ctx.vm.new_integer(i);
        ctx.invoke_block(block, &[index])?;
        if ctx.vm.is_returning() {
            break;
        }
    }
    Ok(ctx.nil())
}

pub fn times_do(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let count = ctx.receiver_integer()?;
    let block = ctx.block_argument(0)?;
    for _ in 0..count {
        ctx.invoke_block(block, &[])?;
        if ctx.vm.is_returning() {
            break;
        }
    }
    Ok(ctx.nil())
}

pub fn display_on(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = ctx.receiver_integer()?;
    ctx.display(&value.to_string())
}

#[cfg(test)]
mod tests {
    use crate::{VM, VMCreateInfo};

    use super::*;

    fn test_vm() -> VM {
        VM::new(VMCreateInfo {
            capture_output: true,
            ..Default::default()
        })
    }

    fn binary(vm: &mut VM, a: i64, selector: &str, b: i64) -> Result<ObjectRef, RuntimeError> {
        let a = vm.new_integer(a);
        let b = vm.new_integer(b);
        let result = vm.send(a, selector, &[b]);
        if result.is_err() {
            vm.reset();
        }
        result
    }

    fn integer(vm: &VM, object: ObjectRef) -> i64 {
        vm.heap.object(object).as_integer().expect("integer")
    }

    #[test]
    fn arithmetic() {
        let mut vm = test_vm();
        let cases = [
            (6, "+", 4, 10),
            (6, "-", 4, 2),
            (6, "*", 4, 24),
            (6, "/", 4, 1),
            (-7, "/", 2, -3),
            (6, "%", 4, 2),
            (6, "<<", 2, 24),
            (6, ">>", 1, 3),
            (6, "&&", 3, 2),
            (6, "||", 3, 7),
        ];
        for (a, selector, b, expected) in cases {
            let result = binary(&mut vm, a, selector, b).expect(selector);
            assert_eq!(integer(&vm, result), expected, "{a} {selector} {b}");
        }
    }

    #[test]
    fn division_by_zero() {
        let mut vm = test_vm();
        let err = binary(&mut vm, 6, "/", 0).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero in Integer::/");
        let err = binary(&mut vm, 6, "%", 0).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero in Integer::%");
    }

    #[test]
    fn comparisons_answer_singletons() {
        let mut vm = test_vm();
        assert_eq!(binary(&mut vm, 6, ">", 4), Ok(vm.specials.true_object));
        assert_eq!(binary(&mut vm, 6, "<", 4), Ok(vm.specials.false_object));
        assert_eq!(binary(&mut vm, 4, "<=", 4), Ok(vm.specials.true_object));
        assert_eq!(binary(&mut vm, 4, "equal:", 4), Ok(vm.specials.true_object));
        assert_eq!(binary(&mut vm, 4, "notEqual:", 4), Ok(vm.specials.false_object));
    }

    #[test]
    fn operand_must_be_an_integer() {
        let mut vm = test_vm();
        let six = vm.new_integer(6);
        let text = vm.new_string("4");
        let err = vm.send(six, "+", &[text]).unwrap_err();
        assert_eq!(err.to_string(), "Integer::+ applied to illegal object");
    }

    #[test]
    fn conversions() {
        let mut vm = test_vm();
        let value = vm.new_integer(65);
        let text = vm.send(value, "asString", &[]).expect("asString");
        assert_eq!(vm.heap.object(text).as_str(), Some("65"));
        let letter = vm.send(value, "asChar", &[]).expect("asChar");
        assert_eq!(vm.heap.object(letter).as_char(), Some('A'));
        let float = vm.send(value, "asFloat", &[]).expect("asFloat");
        assert_eq!(vm.heap.object(float).as_float(), Some(65.0));
        assert_eq!(vm.send(value, "hashValue", &[]), Ok(value));
    }

    #[test]
    fn display_writes_to_the_stream() {
        let mut vm = test_vm();
        let value = vm.new_integer(-12);
        let cout = vm.specials.cout;
        assert_eq!(vm.send(value, "displayOn:", &[cout]), Ok(cout));
        assert_eq!(vm.captured_output(), Some("-12"));
    }
}
