use crate::{
    BuiltinClasses, ClassId, ClassTable, FrameRef, Heap, InterpretedMethod, Object, ObjectRef,
    Payload, PayloadKind, SpecialObjects, Stmt, SyntaxForest, VM,
    ast::{block, character, int, local, send, string},
    primitives::{self, PrimitiveMessage},
};

/// Positions of the built-in globals in the bottom record.
pub mod globals {
    pub const COUT: usize = 0;
    pub const TRUE: usize = 1;
    pub const FALSE: usize = 2;
    pub const NIL: usize = 3;
    pub const ENDL: usize = 4;
    pub const FIRST_USER: usize = 5;
}

/// Defines the built-in classes and allocates the permanent objects.
/// `Meta` is its own metaclass and every built-in class shares it.
pub fn create_builtins(classes: &mut ClassTable, heap: &mut Heap) -> (BuiltinClasses, SpecialObjects) {
    let meta = classes.define("Meta", None);
    let root = classes.define("Root", None);
    let root_class = Some(root);

    let builtins = BuiltinClasses {
        root,
        meta,
        integer: classes.define_with_payload("Integer", root_class, Some(PayloadKind::Integer)),
        float: classes.define_with_payload("Float", root_class, Some(PayloadKind::Float)),
        string: classes.define_with_payload("String", root_class, Some(PayloadKind::String)),
        char: classes.define_with_payload("Char", root_class, Some(PayloadKind::Char)),
        array: classes.define("Array", root_class),
        true_class: classes.define("True", root_class),
        false_class: classes.define("False", root_class),
        nil: classes.define("Nil", root_class),
        block: classes.define("Block", root_class),
        ostream: classes.define_with_payload("ostream", root_class, Some(PayloadKind::OutStream)),
    };
    let ids: Vec<ClassId> = classes.iter().map(|(id, _)| id).collect();
    for &class in &ids {
        classes.set_metaclass(class, meta);
    }

    // nil has to exist before anything with attribute slots can be filled
    let nil = heap.allocate_object(Object::empty(builtins.nil, Payload::None));
    let true_object = heap.allocate_object(classes.instantiate(builtins.true_class, nil));
    let false_object = heap.allocate_object(classes.instantiate(builtins.false_class, nil));
    let cout = heap.allocate_object(classes.instantiate(builtins.ostream, nil));
    let mut newline = classes.instantiate(builtins.char, nil);
    newline.payload = Payload::Char('\n');
    let endl = heap.allocate_object(newline);

    for class in ids {
        let mut representative = classes.instantiate(meta, nil);
        representative.payload = Payload::Class(class);
        let representative = heap.allocate_object(representative);
        classes.set_representative(class, representative);
    }
    log::debug!("bootstrapped {} built-in classes", classes.len());

    let specials = SpecialObjects {
        nil,
        true_object,
        false_object,
        cout,
        endl,
    };
    (builtins, specials)
}

/// Installs the native tables and the methods written in Epsilon itself.
pub fn install_methods(vm: &mut VM) {
    let builtins = vm.builtins;
    let tables: [(ClassId, &[PrimitiveMessage]); 12] = [
        (builtins.root, primitives::root::MESSAGES),
        (builtins.meta, primitives::meta::MESSAGES),
        (builtins.integer, primitives::integer::MESSAGES),
        (builtins.float, primitives::float::MESSAGES),
        (builtins.true_class, primitives::boolean::TRUE_MESSAGES),
        (builtins.false_class, primitives::boolean::FALSE_MESSAGES),
        (builtins.nil, primitives::nil::MESSAGES),
        (builtins.string, primitives::string::MESSAGES),
        (builtins.char, primitives::character::MESSAGES),
        (builtins.array, primitives::array::MESSAGES),
        (builtins.block, primitives::block::MESSAGES),
        (builtins.ostream, primitives::stream::MESSAGES),
    ];
    for (class, messages) in tables {
        for message in messages {
            vm.classes.add_native_method(class, message.selector, message.ptr);
        }
    }

    vm.classes.add_interpreted_method(builtins.array, "do:", array_do());
    vm.classes
        .add_interpreted_method(builtins.array, "displayOn:", array_display_on());
    vm.classes
        .add_interpreted_method(builtins.ostream, "<<", ostream_insert());
}

// method Array::do: b { 0 upTo: self getSize - 1 do: [:i | b evaluateOn: (self at: i)] }
fn array_do() -> InterpretedMethod {
    let last = send(send(local(0, 0), "getSize", vec![]), "-", vec![int(1)]);
    let visit = block(
        1,
        0,
        vec![Stmt::expr(send(
            local(1, 1),
            "evaluateOn:",
            vec![send(local(1, 0), "at:", vec![local(0, 1)])],
        ))],
    );
    InterpretedMethod::new(
        1,
        0,
        SyntaxForest::new(vec![Stmt::expr(send(
            int(0),
            "upTo:do:",
            vec![last, visit],
        ))]),
    )
}

// method Array::displayOn: s { s << "Array [ ". self do: [:e | s << e << ' ']. ^s << ']' }
fn array_display_on() -> InterpretedMethod {
    let element = block(
        1,
        0,
        vec![Stmt::expr(send(
            send(local(1, 1), "<<", vec![local(0, 1)]),
            "<<",
            vec![character(' ')],
        ))],
    );
    InterpretedMethod::new(
        1,
        0,
        SyntaxForest::new(vec![
            Stmt::expr(send(local(0, 1), "<<", vec![string("Array [ ")])),
            Stmt::expr(send(local(0, 0), "do:", vec![element])),
            Stmt::ret(send(local(0, 1), "<<", vec![character(']')]), 0),
        ]),
    )
}

// method ostream::<< x { x displayOn: self }
fn ostream_insert() -> InterpretedMethod {
    InterpretedMethod::new(
        1,
        0,
        SyntaxForest::new(vec![Stmt::expr(send(
            local(0, 1),
            "displayOn:",
            vec![local(0, 0)],
        ))]),
    )
}

/// Fills the built-in globals of a fresh bottom record.
pub fn store_globals(vm: &mut VM, frame: FrameRef) {
    let specials = vm.specials;
    let record = vm.heap.frame_mut(frame);
    let entries: [(usize, ObjectRef); 5] = [
        (globals::COUT, specials.cout),
        (globals::TRUE, specials.true_object),
        (globals::FALSE, specials.false_object),
        (globals::NIL, specials.nil),
        (globals::ENDL, specials.endl),
    ];
    for (position, object) in entries {
        record.set(position, object);
    }
}
