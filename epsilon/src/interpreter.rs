use crate::{
    ExprKind, Expr, FrameRef, MethodBody, MethodName, ObjectRef, PrimitiveContext, Program,
    ResolvedMethod, RuntimeError, Stmt, SyntaxForest, VM, bootstrap, internal_error,
};

// Every step checks `vm.is_returning()` after a sub-evaluation and bails out
// with `Ok(())`; the signal travels up until the call that pushed its target.

impl Expr {
    /// Computes the node's value into its temporary slot.
    pub fn evaluate(&self, vm: &mut VM) -> Result<(), RuntimeError> {
        match &self.kind {
            ExprKind::Identifier(_) => Ok(()),
            ExprKind::Send(send) => {
                send.recipient.evaluate(vm)?;
                if vm.is_returning() {
                    return Ok(());
                }
                let receiver = send.recipient.value(vm);
                self.dispatch(vm, receiver, &send.method, &send.params)
            }
            ExprKind::CoalescedSend(send) => {
                send.previous.evaluate(vm)?;
                if vm.is_returning() {
                    return Ok(());
                }
                let receiver = send.recipient().value(vm);
                self.dispatch(vm, receiver, &send.method, &send.params)
            }
            ExprKind::Equals(lhs, rhs) => {
                lhs.evaluate(vm)?;
                if vm.is_returning() {
                    return Ok(());
                }
                rhs.evaluate(vm)?;
                if vm.is_returning() {
                    return Ok(());
                }
                let same = lhs.value(vm) == rhs.value(vm);
                vm.store(self.temporary, vm.boolean(same));
                Ok(())
            }
            ExprKind::New(class) => {
                vm.collect_if_needed();
                let object = vm.instantiate(*class);
                vm.store(self.temporary, object);
                Ok(())
            }
            ExprKind::ClassName(class) => {
                let representative = vm.representative(*class);
                vm.store(self.temporary, representative);
                Ok(())
            }
            ExprKind::Integer(value) => {
                let object = vm.new_integer(*value);
                vm.store(self.temporary, object);
                Ok(())
            }
            ExprKind::Float(value) => {
                let object = vm.new_float(*value);
                vm.store(self.temporary, object);
                Ok(())
            }
            ExprKind::Char(value) => {
                let object = vm.new_char(*value);
                vm.store(self.temporary, object);
                Ok(())
            }
            ExprKind::String(value) => {
                let object = vm.new_string(value.as_str());
                vm.store(self.temporary, object);
                Ok(())
            }
            ExprKind::Block(literal) => {
                let object = vm.new_block(literal.clone());
                vm.store(self.temporary, object);
                Ok(())
            }
        }
    }

    /// Reads the value computed by the last `evaluate`.
    pub fn value(&self, vm: &VM) -> ObjectRef {
        match &self.kind {
            ExprKind::Identifier(address) => vm.get(*address),
            _ => {
                if !self.temporary.is_temporary() {
                    internal_error("expression read before temporaries were allocated");
                }
                vm.get(self.temporary)
            }
        }
    }

    fn dispatch(
        &self,
        vm: &mut VM,
        receiver: ObjectRef,
        method: &MethodName,
        params: &[Expr],
    ) -> Result<(), RuntimeError> {
        let resolved = vm.lookup(receiver, &method.selector, method.super_of)?;
        log::trace!(
            "send {} to {} (depth {})",
            method.selector,
            vm.class_name_of(receiver),
            vm.stack_depth()
        );

        let frame = vm.new_frame(resolved.ar_size, receiver);
        for (index, param) in params.iter().enumerate() {
            if let Err(err) = param.evaluate(vm) {
                vm.discard_pending(frame);
                return Err(err);
            }
            if vm.is_returning() {
                vm.discard_pending(frame);
                return Ok(());
            }
            let value = param.value(vm);
            vm.heap.frame_mut(frame).set(index + 1, value);
        }
        vm.push_pending(frame);

        let result = vm.invoke(&resolved, &method.selector, receiver, frame)?;
        if vm.is_returning() {
            return Ok(());
        }
        vm.store(self.temporary, result);
        Ok(())
    }
}

impl Stmt {
    pub fn execute(&self, vm: &mut VM) -> Result<(), RuntimeError> {
        match self {
            Stmt::Expr(expr) => expr.evaluate(vm),
            Stmt::Return {
                expr,
                nesting_level,
            } => {
                expr.evaluate(vm)?;
                if vm.is_returning() {
                    return Ok(());
                }
                let value = expr.value(vm);
                let target = vm.resolve_frame(*nesting_level);
                vm.return_from(target, value);
                Ok(())
            }
            Stmt::Bind { target, value } => {
                value.evaluate(vm)?;
                if vm.is_returning() {
                    return Ok(());
                }
                let object = value.value(vm);
                vm.store(*target, object);
                Ok(())
            }
        }
    }
}

impl SyntaxForest {
    pub fn execute(&self, vm: &mut VM) -> Result<(), RuntimeError> {
        for statement in self.statements() {
            statement.execute(vm)?;
            if vm.is_returning() {
                break;
            }
        }
        Ok(())
    }

    /// Value of a trailing expression statement, nil otherwise.
    pub fn value(&self, vm: &VM) -> ObjectRef {
        match self.statements().last() {
            Some(Stmt::Expr(expr)) => expr.value(vm),
            _ => vm.nil(),
        }
    }
}

impl VM {
    /// Runs `program`: pushes the global record with the built-in globals,
    /// then main's record, and executes main. Answers main's value.
    pub fn start(&mut self, program: &Program) -> Result<ObjectRef, RuntimeError> {
        let result = self.run_main(program);
        if result.is_err() {
            self.reset();
        }
        self.flush_output();
        result
    }

    fn run_main(&mut self, program: &Program) -> Result<ObjectRef, RuntimeError> {
        if self.execution_mark() != (0, 0) || self.is_returning() {
            log::warn!(
                "discarding {} leftover records before starting a program",
                self.stack_depth()
            );
            self.reset();
        }
        let nil = self.nil();
        let globals = self.new_frame(program.globals.max(bootstrap::globals::FIRST_USER), nil);
        bootstrap::store_globals(self, globals);
        self.push_pending(globals);

        let main = self.new_frame(program.main_ar_size, nil);
        self.push_pending(main);
        log::debug!(
            "starting main ({} globals, record size {})",
            program.globals,
            program.main_ar_size
        );

        program.main.execute(self)?;
        let mut value = program.main.value(self);
        if let Some(signal) = self.clear_return() {
            if signal.target == main {
                value = signal.value;
            } else {
                log::warn!("return to an activation that already exited reached the top level");
            }
        }

        self.pop_frame();
        self.pop_frame();
        Ok(value)
    }

    /// Sends `selector` from host code, e.g. a bootstrap test or an embedder.
    /// A failed send leaves the stack as it found it.
    pub fn send(
        &mut self,
        receiver: ObjectRef,
        selector: &str,
        arguments: &[ObjectRef],
    ) -> Result<ObjectRef, RuntimeError> {
        let mark = self.execution_mark();
        let result = self.send_unchecked(receiver, selector, arguments);
        if result.is_err() {
            self.unwind_to(mark);
        }
        result
    }

    fn send_unchecked(
        &mut self,
        receiver: ObjectRef,
        selector: &str,
        arguments: &[ObjectRef],
    ) -> Result<ObjectRef, RuntimeError> {
        let resolved = self.lookup(receiver, selector, None)?;
        let frame = self.new_frame(resolved.ar_size, receiver);
        for (index, &argument) in arguments.iter().enumerate() {
            self.heap.frame_mut(frame).set(index + 1, argument);
        }
        self.push_pending(frame);
        self.invoke(&resolved, selector, receiver, frame)
    }

    /// Runs a method whose record is already on top of the stack, then pops it.
    /// The result is the receiver unless a return aimed at this record arrived.
    pub(crate) fn invoke(
        &mut self,
        resolved: &ResolvedMethod,
        selector: &str,
        receiver: ObjectRef,
        frame: FrameRef,
    ) -> Result<ObjectRef, RuntimeError> {
        let mut result = match &resolved.body {
            MethodBody::Native(native) => {
                let mut ctx = PrimitiveContext::new(self, receiver, frame, resolved.holder, selector);
                native(&mut ctx)?
            }
            MethodBody::Interpreted(method) => {
                let method = method.clone();
                method.body.execute(self)?;
                receiver
            }
        };

        let popped = self.pop_frame();
        debug_assert_eq!(popped, frame, "call popped a record it did not push");
        if let Some(value) = self.take_return_for(popped) {
            result = value;
        }
        Ok(result)
    }

    /// Evaluates a block with `arguments` bound to its parameters.
    /// Slot 0 of the new record is the block itself, which is what lets
    /// nested code hop along the static chain.
    pub fn invoke_block(
        &mut self,
        block: ObjectRef,
        arguments: &[ObjectRef],
    ) -> Result<ObjectRef, RuntimeError> {
        let literal = match self.heap.object(block).as_block() {
            Some(closure) => closure.literal.clone(),
            None => internal_error("invoke_block on an object that is not a block"),
        };
        if arguments.len() > literal.parameters {
            return Err(RuntimeError::BlockArity {
                class: self.classes[self.builtins.block].name().to_string(),
                selector: block_selector(arguments.len()).to_string(),
                expected: literal.parameters,
                given: arguments.len(),
            });
        }

        let frame = self.new_frame(literal.ar_size, block);
        for (index, &argument) in arguments.iter().enumerate() {
            self.heap.frame_mut(frame).set(index + 1, argument);
        }
        self.push_pending(frame);

        literal.body.execute(self)?;
        let mut value = literal.body.value(self);
        let popped = self.pop_frame();
        if let Some(returned) = self.take_return_for(popped) {
            value = returned;
        }
        Ok(value)
    }
}

fn block_selector(arguments: usize) -> &'static str {
    match arguments {
        0 => "evaluate",
        1 => "evaluateOn:",
        2 => "evaluateOn:and:",
        _ => "evaluateOn:and:and:",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        ClassId, InterpretedMethod, LexicalAddress, Payload, VMCreateInfo,
        ast::{
            attribute, block, cascade, class_name, equals, float, global, int, local,
            new_instance, send, string, super_send,
        },
        bootstrap::globals,
    };

    fn test_vm() -> VM {
        VM::new(VMCreateInfo {
            capture_output: true,
            ..Default::default()
        })
    }

    fn run(vm: &mut VM, locals: usize, statements: Vec<Stmt>) -> Result<ObjectRef, RuntimeError> {
        let program = Program::new(globals::FIRST_USER + 4, locals, SyntaxForest::new(statements));
        vm.start(&program)
    }

    fn integer(vm: &VM, object: ObjectRef) -> i64 {
        vm.heap
            .object(object)
            .as_integer()
            .expect("integer result")
    }

    fn class_of_result(vm: &VM, object: ObjectRef) -> ClassId {
        vm.heap
            .object(object)
            .represented_class()
            .expect("class object")
    }

    #[test]
    fn interpret_integer_division() {
        let mut vm = test_vm();
        let value = run(&mut vm, 0, vec![Stmt::expr(send(int(6), "/", vec![int(2)]))])
            .expect("6 / 2");
        assert_eq!(integer(&vm, value), 3);
        assert_eq!(vm.class_of(value), vm.builtins.integer);
    }

    #[test]
    fn interpret_division_by_zero_is_an_error() {
        let mut vm = test_vm();
        let err = run(&mut vm, 0, vec![Stmt::expr(send(int(6), "/", vec![int(0)]))]).unwrap_err();
        assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
        assert_eq!(err.to_string(), "Division by zero in Integer::/");
        assert_eq!(vm.stack_depth(), 0);
    }

    #[test]
    fn interpret_sqrt_of_negative_is_an_error() {
        let mut vm = test_vm();
        let err = run(&mut vm, 0, vec![Stmt::expr(send(float(-4.0), "sqrt", vec![]))]).unwrap_err();
        assert!(matches!(err, RuntimeError::Domain { .. }));
        assert_eq!(err.selector(), "sqrt");

        let value = run(&mut vm, 0, vec![Stmt::expr(send(float(9.0), "sqrt", vec![]))])
            .expect("sqrt");
        assert_eq!(vm.heap.object(value).as_float(), Some(3.0));
    }

    #[test]
    fn interpret_message_not_understood() {
        let mut vm = test_vm();
        let point = vm.register_class("Point", None);
        let err = run(
            &mut vm,
            0,
            vec![Stmt::expr(send(new_instance(point), "frobnicate:", vec![int(1)]))],
        )
        .unwrap_err();
        assert!(matches!(err, RuntimeError::MessageNotUnderstood { .. }));
        assert_eq!(err.class(), "Point");
        assert_eq!(err.selector(), "frobnicate:");

        let err = run(&mut vm, 0, vec![Stmt::expr(send(int(3), "frobnicate", vec![]))]).unwrap_err();
        assert_eq!(err.to_string(), "Integer object did not understand frobnicate");
    }

    #[test]
    fn interpret_forest_value_rules() {
        let mut vm = test_vm();
        // x := 4. x
        let value = run(
            &mut vm,
            1,
            vec![Stmt::bind(LexicalAddress::local(0, 1), int(4)), Stmt::expr(local(0, 1))],
        )
        .expect("trailing expression");
        assert_eq!(integer(&vm, value), 4);

        let value = run(&mut vm, 1, vec![Stmt::bind(LexicalAddress::local(0, 1), int(4))])
            .expect("trailing bind");
        assert_eq!(value, vm.nil());

        let value = run(&mut vm, 0, vec![]).expect("empty");
        assert_eq!(value, vm.nil());
    }

    #[test]
    fn interpret_equality_is_identity() {
        let mut vm = test_vm();
        // a := 1. b := 2. (a + b) == (a + b)
        let value = run(
            &mut vm,
            2,
            vec![
                Stmt::bind(LexicalAddress::local(0, 1), int(1)),
                Stmt::bind(LexicalAddress::local(0, 2), int(2)),
                Stmt::expr(equals(
                    send(local(0, 1), "+", vec![local(0, 2)]),
                    send(local(0, 1), "+", vec![local(0, 2)]),
                )),
            ],
        )
        .expect("equals");
        assert_eq!(value, vm.specials.false_object);

        let value = run(
            &mut vm,
            1,
            vec![
                Stmt::bind(LexicalAddress::local(0, 1), int(1)),
                Stmt::expr(equals(local(0, 1), local(0, 1))),
            ],
        )
        .expect("equals");
        assert_eq!(value, vm.specials.true_object);
    }

    #[test]
    fn interpret_shared_subexpressions_keep_both_values() {
        let mut vm = test_vm();
        // a := 1. b := 2. (a + b) * (a + b + a)
        let value = run(
            &mut vm,
            2,
            vec![
                Stmt::bind(LexicalAddress::local(0, 1), int(1)),
                Stmt::bind(LexicalAddress::local(0, 2), int(2)),
                Stmt::expr(send(
                    send(local(0, 1), "+", vec![local(0, 2)]),
                    "*",
                    vec![send(
                        send(local(0, 1), "+", vec![local(0, 2)]),
                        "+",
                        vec![local(0, 1)],
                    )],
                )),
            ],
        )
        .expect("arithmetic");
        assert_eq!(integer(&vm, value), 12);

        let value = run(
            &mut vm,
            0,
            vec![Stmt::expr(send(
                send(int(1), "+", vec![int(2)]),
                "+",
                vec![send(int(3), "+", vec![int(4)])],
            ))],
        )
        .expect("arithmetic");
        assert_eq!(integer(&vm, value), 10);
    }

    fn three_level_hierarchy(vm: &mut VM) -> (ClassId, ClassId, ClassId) {
        let top = vm.register_class("Top", None);
        let middle = vm.register_class("Middle", Some(top));
        let bottom = vm.register_class("Bottom", Some(middle));

        // method Top::m { ^self classOf }
        vm.classes.add_interpreted_method(
            top,
            "m",
            InterpretedMethod::new(
                0,
                0,
                SyntaxForest::new(vec![Stmt::ret(send(local(0, 0), "classOf", vec![]), 0)]),
            ),
        );
        // method Middle::m { ^super m }
        vm.classes.add_interpreted_method(
            middle,
            "m",
            InterpretedMethod::new(
                0,
                0,
                SyntaxForest::new(vec![Stmt::ret(super_send(local(0, 0), middle, "m", vec![]), 0)]),
            ),
        );
        // method Bottom::m { ^super m }
        vm.classes.add_interpreted_method(
            bottom,
            "m",
            InterpretedMethod::new(
                0,
                0,
                SyntaxForest::new(vec![Stmt::ret(super_send(local(0, 0), bottom, "m", vec![]), 0)]),
            ),
        );
        (top, middle, bottom)
    }

    #[test]
    fn interpret_super_keeps_self() {
        let mut vm = test_vm();
        let (_, middle, bottom) = three_level_hierarchy(&mut vm);

        let value = run(&mut vm, 0, vec![Stmt::expr(send(new_instance(bottom), "m", vec![]))])
            .expect("super chain");
        assert_eq!(class_of_result(&vm, value), bottom);

        let value = run(&mut vm, 0, vec![Stmt::expr(send(new_instance(middle), "m", vec![]))])
            .expect("super from middle");
        assert_eq!(class_of_result(&vm, value), middle);
    }

    #[test]
    fn interpret_super_past_root_is_not_understood() {
        let mut vm = test_vm();
        let lonely = vm.register_class("Lonely", None);
        vm.classes.add_interpreted_method(
            lonely,
            "m",
            InterpretedMethod::new(
                0,
                0,
                SyntaxForest::new(vec![Stmt::ret(super_send(local(0, 0), lonely, "m", vec![]), 0)]),
            ),
        );
        let err = run(&mut vm, 0, vec![Stmt::expr(send(new_instance(lonely), "m", vec![]))])
            .unwrap_err();
        assert_eq!(err.to_string(), "Lonely object did not understand m");
    }

    #[test]
    fn interpret_default_result_is_receiver() {
        let mut vm = test_vm();
        let point = vm.register_class("Point", None);
        // method Point::touch { 42 }
        vm.classes.add_interpreted_method(
            point,
            "touch",
            InterpretedMethod::new(0, 0, SyntaxForest::new(vec![Stmt::expr(int(42))])),
        );
        // p := Point new. p touch == p
        let value = run(
            &mut vm,
            1,
            vec![
                Stmt::bind(LexicalAddress::local(0, 1), new_instance(point)),
                Stmt::expr(equals(send(local(0, 1), "touch", vec![]), local(0, 1))),
            ],
        )
        .expect("touch");
        assert_eq!(value, vm.specials.true_object);
    }

    fn nested_return(statements_around: usize) -> Vec<Stmt> {
        // k = 0: ^7. k = 1: [^7] evaluate. k = 2: [[^7] evaluate] evaluate.
        let mut statement = Stmt::ret(int(7), statements_around);
        for _ in 0..statements_around {
            statement = Stmt::expr(send(block(0, 0, vec![statement]), "evaluate", vec![]));
        }
        vec![statement, Stmt::expr(int(99))]
    }

    #[test]
    fn interpret_nested_return_unwinds_to_method() {
        for k in 0..3 {
            let mut vm = test_vm();
            let probe = vm.register_class("Probe", None);
            vm.classes.add_interpreted_method(
                probe,
                "run",
                InterpretedMethod::new(0, 0, SyntaxForest::new(nested_return(k))),
            );
            // r := Probe new run. r + 1
            let value = run(
                &mut vm,
                1,
                vec![
                    Stmt::bind(LexicalAddress::local(0, 1), send(new_instance(probe), "run", vec![])),
                    Stmt::expr(send(local(0, 1), "+", vec![int(1)])),
                ],
            )
            .expect("nested return");
            assert_eq!(integer(&vm, value), 8, "nesting level {k}");
            assert!(!vm.is_returning());
            assert_eq!(vm.stack_depth(), 0);
        }
    }

    #[test]
    fn interpret_return_inside_loop_stops_it() {
        let mut vm = test_vm();
        let probe = vm.register_class("Probe", None);
        // method Probe::find { 1 upTo: 10 do: [:i | i == i ifTrue: [^i]]. ^0 }
        // The identity test is always true, so the first index wins.
        vm.classes.add_interpreted_method(
            probe,
            "find",
            InterpretedMethod::new(
                0,
                0,
                SyntaxForest::new(vec![
                    Stmt::expr(send(
                        int(1),
                        "upTo:do:",
                        vec![
                            int(10),
                            block(
                                1,
                                0,
                                vec![Stmt::expr(send(
                                    equals(local(0, 1), local(0, 1)),
                                    "ifTrue:",
                                    vec![block(0, 0, vec![Stmt::ret(local(1, 1), 2)])],
                                ))],
                            ),
                        ],
                    )),
                    Stmt::ret(int(0), 0),
                ]),
            ),
        );
        let value = run(&mut vm, 0, vec![Stmt::expr(send(new_instance(probe), "find", vec![]))])
            .expect("loop return");
        assert_eq!(integer(&vm, value), 1);
    }

    #[test]
    fn interpret_closure_survives_its_method() {
        let mut vm = test_vm();
        let counter = vm.register_class("Counter", None);
        let holder = vm.register_class("Holder", None);
        vm.classes.add_attribute(holder, "block");

        // method Holder::block: b { block := b }
        vm.classes.add_interpreted_method(
            holder,
            "block:",
            InterpretedMethod::new(
                1,
                0,
                SyntaxForest::new(vec![Stmt::bind(LexicalAddress::attribute(0, 0), local(0, 1))]),
            ),
        );
        // method Holder::block { ^block }
        vm.classes.add_interpreted_method(
            holder,
            "block",
            InterpretedMethod::new(0, 0, SyntaxForest::new(vec![Stmt::ret(attribute(0, 0), 0)])),
        );
        // method Counter::makeOn: h { | count | count := 0. h block: [count := count + 1. count] }
        vm.classes.add_interpreted_method(
            counter,
            "makeOn:",
            InterpretedMethod::new(
                1,
                1,
                SyntaxForest::new(vec![
                    Stmt::bind(LexicalAddress::local(0, 2), int(0)),
                    Stmt::expr(send(
                        local(0, 1),
                        "block:",
                        vec![block(
                            0,
                            0,
                            vec![
                                Stmt::bind(
                                    LexicalAddress::local(1, 2),
                                    send(local(1, 2), "+", vec![int(1)]),
                                ),
                                Stmt::expr(local(1, 2)),
                            ],
                        )],
                    )),
                ]),
            ),
        );

        // h := Holder new. Counter new makeOn: h. h block evaluate. h block evaluate
        let value = run(
            &mut vm,
            1,
            vec![
                Stmt::bind(LexicalAddress::local(0, 1), new_instance(holder)),
                Stmt::expr(send(new_instance(counter), "makeOn:", vec![local(0, 1)])),
                Stmt::expr(send(send(local(0, 1), "block", vec![]), "evaluate", vec![])),
                Stmt::expr(send(send(local(0, 1), "block", vec![]), "evaluate", vec![])),
            ],
        )
        .expect("closure");
        assert_eq!(integer(&vm, value), 2);
    }

    #[test]
    fn interpret_closure_survives_collection() {
        let mut vm = VM::new(VMCreateInfo {
            capture_output: true,
            heap: crate::HeapCreateInfo {
                gc_threshold: Some(16),
                ..Default::default()
            },
        });
        let maker = vm.register_class("Maker", None);
        let junk = vm.register_class("Junk", None);
        // method Maker::make { | n | n := 41. ^[n + 1] }
        vm.classes.add_interpreted_method(
            maker,
            "make",
            InterpretedMethod::new(
                0,
                1,
                SyntaxForest::new(vec![
                    Stmt::bind(LexicalAddress::local(0, 1), int(41)),
                    Stmt::ret(block(0, 0, vec![Stmt::expr(send(local(1, 1), "+", vec![int(1)]))]), 0),
                ]),
            ),
        );
        // b := Maker new make. 100 timesDo: [new Junk]. b evaluate
        let value = run(
            &mut vm,
            1,
            vec![
                Stmt::bind(LexicalAddress::local(0, 1), send(new_instance(maker), "make", vec![])),
                Stmt::expr(send(int(100), "timesDo:", vec![block(0, 0, vec![Stmt::expr(new_instance(junk))])])),
                Stmt::expr(send(local(0, 1), "evaluate", vec![])),
            ],
        )
        .expect("closure after gc");
        assert!(vm.gc_stats().collections > 0);
        assert_eq!(integer(&vm, value), 42);
    }

    #[test]
    fn interpret_cycle_is_reclaimed() {
        let mut vm = VM::new(VMCreateInfo {
            capture_output: true,
            heap: crate::HeapCreateInfo {
                gc_threshold: Some(8),
                ..Default::default()
            },
        });
        let node = vm.register_class("Node", None);
        vm.classes.add_attribute(node, "next");
        // method Node::next: n { next := n }
        vm.classes.add_interpreted_method(
            node,
            "next:",
            InterpretedMethod::new(
                1,
                0,
                SyntaxForest::new(vec![Stmt::bind(LexicalAddress::attribute(0, 0), local(0, 1))]),
            ),
        );
        let a = globals::FIRST_USER;
        let b = globals::FIRST_USER + 1;
        // a := new Node. b := new Node. a next: b. b next: a. a
        let program = Program::new(
            globals::FIRST_USER + 2,
            0,
            SyntaxForest::new(vec![
                Stmt::bind(LexicalAddress::global(a), new_instance(node)),
                Stmt::bind(LexicalAddress::global(b), new_instance(node)),
                Stmt::expr(send(global(a), "next:", vec![global(b)])),
                Stmt::expr(send(global(b), "next:", vec![global(a)])),
                Stmt::expr(global(a)),
            ]),
        );
        let first = vm.start(&program).expect("build cycle");
        let second = vm.heap.object(first).attribute(0);
        assert_eq!(vm.heap.object(second).attribute(0), first);

        // The globals record was popped, so only the cycle refers to the nodes.
        // 50 timesDo: [new Node]
        run(
            &mut vm,
            0,
            vec![Stmt::expr(send(
                int(50),
                "timesDo:",
                vec![block(0, 0, vec![Stmt::expr(new_instance(node))])],
            ))],
        )
        .expect("churn");
        assert!(vm.gc_stats().collections > 0);
        assert!(!vm.heap.contains_object(first));
        assert!(!vm.heap.contains_object(second));
    }

    #[test]
    fn interpret_cascade_reuses_recipient() {
        let mut vm = test_vm();
        // cout << 1; << "a"; nl
        run(
            &mut vm,
            0,
            vec![Stmt::expr(cascade(
                cascade(
                    send(global(globals::COUT), "<<", vec![int(1)]),
                    "<<",
                    vec![string("a")],
                ),
                "nl",
                vec![],
            ))],
        )
        .expect("cascade");
        assert_eq!(vm.captured_output(), Some("1a\n"));
    }

    #[test]
    fn interpret_block_arity_is_checked() {
        let mut vm = test_vm();
        let err = run(
            &mut vm,
            0,
            vec![Stmt::expr(send(block(0, 0, vec![]), "evaluateOn:", vec![int(1)]))],
        )
        .unwrap_err();
        assert!(matches!(err, RuntimeError::BlockArity { expected: 0, given: 1, .. }));
        assert_eq!(err.to_string(), "Too many parameters to block");
    }

    #[test]
    fn interpret_class_name_and_reflection() {
        let mut vm = test_vm();
        let point = vm.register_class("Point", None);
        let value = run(&mut vm, 0, vec![Stmt::expr(send(class_name(point), "name", vec![]))])
            .expect("name");
        assert_eq!(vm.heap.object(value).as_str(), Some("Point"));

        let value = run(&mut vm, 0, vec![Stmt::expr(send(class_name(point), "superClass", vec![]))])
            .expect("superClass");
        assert_eq!(vm.heap.object(value).represented_class(), Some(vm.builtins.root));

        let value = run(&mut vm, 0, vec![Stmt::expr(send(class_name(point), "new", vec![]))])
            .expect("new");
        assert_eq!(vm.class_of(value), point);
        assert!(matches!(vm.heap.object(value).payload, Payload::None));
    }

    #[test]
    fn interpret_while_true_loop() {
        let mut vm = test_vm();
        // i := 0. sum := 0. [i < 5] whileTrue: [i := i + 1. sum := sum + i]. sum
        let i = LexicalAddress::local(0, 1);
        let sum = LexicalAddress::local(0, 2);
        let value = run(
            &mut vm,
            2,
            vec![
                Stmt::bind(i, int(0)),
                Stmt::bind(sum, int(0)),
                Stmt::expr(send(
                    block(0, 0, vec![Stmt::expr(send(local(1, 1), "<", vec![int(5)]))]),
                    "whileTrue:",
                    vec![block(
                        0,
                        0,
                        vec![
                            Stmt::bind(LexicalAddress::local(1, 1), send(local(1, 1), "+", vec![int(1)])),
                            Stmt::bind(
                                LexicalAddress::local(1, 2),
                                send(local(1, 2), "+", vec![local(1, 1)]),
                            ),
                        ],
                    )],
                )),
                Stmt::expr(local(0, 2)),
            ],
        )
        .expect("loop");
        assert_eq!(integer(&vm, value), 15);
    }

    #[test]
    fn interpret_send_from_host() {
        let mut vm = test_vm();
        let six = vm.new_integer(6);
        let seven = vm.new_integer(7);
        let value = vm.send(six, "*", &[seven]).expect("host send");
        assert_eq!(integer(&vm, value), 42);
        assert_eq!(vm.stack_depth(), 0);
    }

    #[test]
    fn failed_host_send_leaves_no_records_behind() {
        let mut vm = test_vm();
        let array = vm.new_array(&[]);
        let three = vm.new_integer(3);
        let err = vm.send(array, "at:", &[three]).unwrap_err();
        assert_eq!(err.to_string(), "Index out of range in Array::at:");
        assert_eq!(vm.stack_depth(), 0);

        // cout << 1
        let program = Program::new(
            globals::FIRST_USER,
            0,
            SyntaxForest::new(vec![Stmt::expr(send(global(globals::COUT), "<<", vec![int(1)]))]),
        );
        vm.start(&program).expect("program after a failed send");
        assert_eq!(vm.captured_output(), Some("1"));
    }

    #[test]
    fn failed_argument_discards_the_pending_record() {
        let mut vm = test_vm();
        // 1 + (2 / 0)
        let mut forest = SyntaxForest::new(vec![Stmt::expr(send(
            int(1),
            "+",
            vec![send(int(2), "/", vec![int(0)])],
        ))]);
        let temporaries = crate::TemporaryAllocator::new(1).allocate(&mut forest);
        let nil = vm.nil();
        let frame = vm.new_frame(1 + temporaries, nil);
        vm.push_pending(frame);

        let err = forest.execute(&mut vm).unwrap_err();
        assert_eq!(err.to_string(), "Division by zero in Integer::/");
        let (_, pending) = vm.execution_mark();
        assert_eq!(pending, 0);
    }
}
