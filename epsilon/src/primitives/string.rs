use crate::{ObjectRef, Payload, PrimitiveContext, RuntimeError, primitives::PrimitiveMessage};

pub const MESSAGES: &[PrimitiveMessage] = &[
    PrimitiveMessage::new("+", concat),
    PrimitiveMessage::new("<", lt),
    PrimitiveMessage::new(">", gt),
    PrimitiveMessage::new("equal:", eq),
    PrimitiveMessage::new("length", length),
    PrimitiveMessage::new("at:", at),
    PrimitiveMessage::new("at:put:", at_put),
    PrimitiveMessage::new("asInt", as_int),
    PrimitiveMessage::new("asFloat", as_float),
    PrimitiveMessage::new("begin:end:", begin_end),
    PrimitiveMessage::new("hashValue", hash_value),
    PrimitiveMessage::new("displayOn:", display_on),
];

fn string_compare(
    ctx: &mut PrimitiveContext,
    op: fn(&str, &str) -> bool,
) -> Result<ObjectRef, RuntimeError> {
    let result = op(ctx.receiver_str()?, ctx.str_argument(0)?);
    Ok(ctx.boolean(result))
}

fn index(ctx: &PrimitiveContext, value: i64, length: usize) -> Result<usize, RuntimeError> {
    usize::try_from(value)
        .ok()
        .filter(|&index| index < length)
        .ok_or_else(|| ctx.index_out_of_range())
}

pub fn concat(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let joined = [ctx.receiver_str()?, ctx.str_argument(0)?].concat();
    Ok(ctx.vm.new_string(joined))
}

pub fn lt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    string_compare(ctx, |a, b| a < b)
}

pub fn gt(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    string_compare(ctx, |a, b| a > b)
}

pub fn eq(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    string_compare(ctx, |a, b| a == b)
}

pub fn length(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let length = ctx.receiver_str()?.chars().count();
    Ok(ctx.vm.new_integer(length as i64))
}

// "hello" at: 1 => 'e'
pub fn at(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let position = ctx.integer_argument(0)?;
    let value = ctx.receiver_str()?;
    let position = index(ctx, position, value.chars().count())?;
    let Some(found) = value.chars().nth(position) else {
        return Err(ctx.index_out_of_range());
    };
    Ok(ctx.vm.new_char(found))
}

// "hello, Bill" at: 7 put: 'J'; answers the receiver
pub fn at_put(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let position = ctx.integer_argument(0)?;
    let replacement = ctx.char_argument(1)?;
    let value = ctx.receiver_str()?;
    let position = index(ctx, position, value.chars().count())?;
    let updated: String = value
        .chars()
        .enumerate()
        .map(|(i, c)| if i == position { replacement } else { c })
        .collect();
    ctx.vm.heap.object_mut(ctx.receiver).payload = Payload::String(updated);
    Ok(ctx.receiver)
}

/// Leading integer, like C's `atoi`: 0 when nothing parses.
fn leading_integer(text: &str) -> i64 {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['+', '-']));
    let digits = text[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |end| digits_start + end);
    text[..digits].parse().unwrap_or(0)
}

/// Longest prefix that reads as a float, like C's `atof`.
fn leading_float(text: &str) -> f64 {
    let text = text.trim_start();
    let candidate = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .map_or(text, |end| &text[..end]);
    (0..=candidate.len())
        .rev()
        .find_map(|end| candidate[..end].parse().ok())
        .unwrap_or(0.0)
}

pub fn as_int(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = leading_integer(ctx.receiver_str()?);
    Ok(ctx.vm.new_integer(value))
}

pub fn as_float(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let value = leading_float(ctx.receiver_str()?);
    Ok(ctx.vm.new_float(value))
}

// "Bobcat" begin: 3 end: 5 => "cat"
pub fn begin_end(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let from = ctx.integer_argument(0)?;
    let to = ctx.integer_argument(1)?;
    let value = ctx.receiver_str()?;
    let length = value.chars().count();
    let from = index(ctx, from, length)?;
    let to = index(ctx, to, length)?;
    if to < from {
        return Err(ctx.index_out_of_range());
    }
    let substring: String = value.chars().skip(from).take(to - from + 1).collect();
    Ok(ctx.vm.new_string(substring))
}

/// P. J. Weinberger's string hash.
fn hashpjw(text: &str) -> u32 {
    text.bytes().fold(0u32, |hash, byte| {
        let hash = (hash << 4).wrapping_add(u32::from(byte));
        match hash & 0xf000_0000 {
            0 => hash,
            high => (hash ^ (high >> 24)) & !high,
        }
    })
}

pub fn hash_value(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let hash = hashpjw(ctx.receiver_str()?);
    Ok(ctx.vm.new_integer(i64::from(hash)))
}

pub fn display_on(ctx: &mut PrimitiveContext) -> Result<ObjectRef, RuntimeError> {
    let text = ctx.receiver_str()?.to_string();
    ctx.display(&text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{VM, VMCreateInfo};

    use super::*;

    fn test_vm() -> VM {
        VM::new(VMCreateInfo {
            capture_output: true,
            ..Default::default()
        })
    }

    fn text(vm: &VM, object: ObjectRef) -> String {
        vm.heap.object(object).as_str().expect("string").to_string()
    }

    #[test]
    fn substrings_are_inclusive() {
        let mut vm = test_vm();
        let bobcat = vm.new_string("Bobcat");
        let three = vm.new_integer(3);
        let five = vm.new_integer(5);
        let cat = vm.send(bobcat, "begin:end:", &[three, five]).expect("begin:end:");
        assert_eq!(text(&vm, cat), "cat");

        let err = vm.send(bobcat, "begin:end:", &[five, three]).unwrap_err();
        assert!(matches!(err, RuntimeError::IndexOutOfRange { .. }));
    }

    #[test]
    fn indexing_and_mutation() {
        let mut vm = test_vm();
        let greeting = vm.new_string("hello, Bill");
        let seven = vm.new_integer(7);
        let j = vm.new_char('J');
        assert_eq!(vm.send(greeting, "at:put:", &[seven, j]), Ok(greeting));
        assert_eq!(text(&vm, greeting), "hello, Jill");

        let letter = vm.send(greeting, "at:", &[seven]).expect("at:");
        assert_eq!(vm.heap.object(letter).as_char(), Some('J'));

        let too_far = vm.new_integer(11);
        let err = vm.send(greeting, "at:", &[too_far]).unwrap_err();
        assert_eq!(err.to_string(), "Index out of range in String::at:");
    }

    #[test]
    fn concatenation_and_comparison() {
        let mut vm = test_vm();
        let a = vm.new_string("ab");
        let b = vm.new_string("cd");
        let joined = vm.send(a, "+", &[b]).expect("+");
        assert_eq!(text(&vm, joined), "abcd");
        assert_eq!(vm.send(a, "<", &[b]), Ok(vm.specials.true_object));
        assert_eq!(vm.send(a, "equal:", &[b]), Ok(vm.specials.false_object));
        let length = vm.send(joined, "length", &[]).expect("length");
        assert_eq!(vm.heap.object(length).as_integer(), Some(4));
    }

    #[test]
    fn numeric_parsing_reads_a_prefix() {
        assert_eq!(leading_integer("  42abc"), 42);
        assert_eq!(leading_integer("-17"), -17);
        assert_eq!(leading_integer("abc"), 0);
        assert_eq!(leading_float("3.25xyz"), 3.25);
        assert_eq!(leading_float("1e3"), 1000.0);
        assert_eq!(leading_float("."), 0.0);
    }

    #[test]
    fn hash_is_stable() {
        assert_eq!(hashpjw(""), 0);
        assert_eq!(hashpjw("a"), 97);
        assert_eq!(hashpjw("ab"), 97 * 16 + 98);
    }
}
