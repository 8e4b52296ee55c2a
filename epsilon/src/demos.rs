//! Programs the driver can run, built the way a front end would hand them over.

use clap::ValueEnum;
use epsilon::{
    InterpretedMethod, LexicalAddress, Program, Stmt, SyntaxForest, VM,
    ast::{
        attribute, block, cascade, class_name, float, global, int, local, new_instance, send,
        string,
    },
    bootstrap::globals,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Recursive factorial with non-local return from a block
    Factorial,
    /// Closures that outlive the method that created them
    Closures,
    /// Allocation churn that keeps the collector busy
    Collect,
    /// Cascaded messages and array display
    Cascade,
}

impl Demo {
    pub fn all() -> &'static [Demo] {
        &[Demo::Factorial, Demo::Closures, Demo::Collect, Demo::Cascade]
    }

    pub fn build(self, vm: &mut VM) -> Program {
        match self {
            Demo::Factorial => factorial(vm),
            Demo::Closures => closures(vm),
            Demo::Collect => collect(vm),
            Demo::Cascade => cascades(vm),
        }
    }
}

fn cout() -> epsilon::Expr {
    global(globals::COUT)
}

// method Math::fact: n { n <= 1 ifTrue: [^1]. ^n * (self fact: n - 1) }
// 1 upTo: 10 do: [:i | cout << i << "! = " << (Math new fact: i); nl]
fn factorial(vm: &mut VM) -> Program {
    let math = vm.register_class("Math", None);
    vm.classes.add_interpreted_method(
        math,
        "fact:",
        InterpretedMethod::new(
            1,
            0,
            SyntaxForest::new(vec![
                Stmt::expr(send(
                    send(local(0, 1), "<=", vec![int(1)]),
                    "ifTrue:",
                    vec![block(0, 0, vec![Stmt::ret(int(1), 1)])],
                )),
                Stmt::ret(
                    send(
                        local(0, 1),
                        "*",
                        vec![send(local(0, 0), "fact:", vec![send(local(0, 1), "-", vec![int(1)])])],
                    ),
                    0,
                ),
            ]),
        ),
    );

    let line = cascade(
        send(
            send(send(cout(), "<<", vec![local(0, 1)]), "<<", vec![string("! = ")]),
            "<<",
            vec![send(new_instance(math), "fact:", vec![local(0, 1)])],
        ),
        "nl",
        vec![],
    );
    Program::new(
        globals::FIRST_USER,
        0,
        SyntaxForest::new(vec![Stmt::expr(send(
            int(1),
            "upTo:do:",
            vec![int(10), block(1, 0, vec![Stmt::expr(line)])],
        ))]),
    )
}

// method Counter::make { | count | count := 0. ^[count := count + 1. count] }
// method Search::firstSquareOver: n { 1 upTo: n do: [:i | i * i > n ifTrue: [^i]]. ^nil }
fn closures(vm: &mut VM) -> Program {
    let counter = vm.register_class("Counter", None);
    vm.classes.add_interpreted_method(
        counter,
        "make",
        InterpretedMethod::new(
            0,
            1,
            SyntaxForest::new(vec![
                Stmt::bind(LexicalAddress::local(0, 1), int(0)),
                Stmt::ret(
                    block(
                        0,
                        0,
                        vec![
                            Stmt::bind(
                                LexicalAddress::local(1, 1),
                                send(local(1, 1), "+", vec![int(1)]),
                            ),
                            Stmt::expr(local(1, 1)),
                        ],
                    ),
                    0,
                ),
            ]),
        ),
    );

    let search = vm.register_class("Search", None);
    vm.classes.add_interpreted_method(
        search,
        "firstSquareOver:",
        InterpretedMethod::new(
            1,
            0,
            SyntaxForest::new(vec![
                Stmt::expr(send(
                    int(1),
                    "upTo:do:",
                    vec![
                        local(0, 1),
                        block(
                            1,
                            0,
                            vec![Stmt::expr(send(
                                send(send(local(0, 1), "*", vec![local(0, 1)]), ">", vec![local(1, 1)]),
                                "ifTrue:",
                                vec![block(0, 0, vec![Stmt::ret(local(1, 1), 2)])],
                            ))],
                        ),
                    ],
                )),
                Stmt::ret(global(globals::NIL), 0),
            ]),
        ),
    );

    // a := Counter new make. b := Counter new make. a evaluate. a evaluate. b evaluate.
    // cout << "a: " << a evaluate << ", b: " << b evaluate; nl.
    // cout << "first square over 50: " << (Search new firstSquareOver: 50); nl
    let a = LexicalAddress::local(0, 1);
    let b = LexicalAddress::local(0, 2);
    Program::new(
        globals::FIRST_USER,
        2,
        SyntaxForest::new(vec![
            Stmt::bind(a, send(new_instance(counter), "make", vec![])),
            Stmt::bind(b, send(new_instance(counter), "make", vec![])),
            Stmt::expr(send(local(0, 1), "evaluate", vec![])),
            Stmt::expr(send(local(0, 1), "evaluate", vec![])),
            Stmt::expr(send(local(0, 2), "evaluate", vec![])),
            Stmt::expr(cascade(
                send(
                    send(
                        send(
                            send(cout(), "<<", vec![string("a: ")]),
                            "<<",
                            vec![send(local(0, 1), "evaluate", vec![])],
                        ),
                        "<<",
                        vec![string(", b: ")],
                    ),
                    "<<",
                    vec![send(local(0, 2), "evaluate", vec![])],
                ),
                "nl",
                vec![],
            )),
            Stmt::expr(cascade(
                send(
                    send(cout(), "<<", vec![string("first square over 50: ")]),
                    "<<",
                    vec![send(new_instance(search), "firstSquareOver:", vec![int(50)])],
                ),
                "nl",
                vec![],
            )),
        ]),
    )
}

// class Link { value next }
// method Link::value: v next: n { value := v. next := n }
// method Link::sum { next isNil ifTrue: [^value]. ^value + next sum }
fn collect(vm: &mut VM) -> Program {
    let link = vm.register_class("Link", None);
    vm.classes.add_attribute(link, "value");
    vm.classes.add_attribute(link, "next");
    vm.classes.add_interpreted_method(
        link,
        "value:next:",
        InterpretedMethod::new(
            2,
            0,
            SyntaxForest::new(vec![
                Stmt::bind(LexicalAddress::attribute(0, 0), local(0, 1)),
                Stmt::bind(LexicalAddress::attribute(0, 1), local(0, 2)),
            ]),
        ),
    );
    vm.classes.add_interpreted_method(
        link,
        "sum",
        InterpretedMethod::new(
            0,
            0,
            SyntaxForest::new(vec![
                Stmt::expr(send(
                    send(attribute(0, 1), "isNil", vec![]),
                    "ifTrue:",
                    vec![block(0, 0, vec![Stmt::ret(attribute(1, 0), 1)])],
                )),
                Stmt::ret(
                    send(attribute(0, 0), "+", vec![send(attribute(0, 1), "sum", vec![])]),
                    0,
                ),
            ]),
        ),
    );

    // 1 upTo: 200 do: [:i | | list |
    //     1 upTo: 50 do: [:j | list := Link new value: j next: list].
    //     last := list].
    // cout << "sum of the last list: " << last sum; nl
    let build = block(
        1,
        0,
        vec![Stmt::bind(
            LexicalAddress::local(1, 2),
            send(
                new_instance(link),
                "value:next:",
                vec![local(0, 1), local(1, 2)],
            ),
        )],
    );
    let round = block(
        1,
        1,
        vec![
            Stmt::expr(send(int(1), "upTo:do:", vec![int(50), build])),
            Stmt::bind(LexicalAddress::local(1, 1), local(0, 2)),
        ],
    );
    Program::new(
        globals::FIRST_USER,
        1,
        SyntaxForest::new(vec![
            Stmt::expr(send(int(1), "upTo:do:", vec![int(200), round])),
            Stmt::expr(cascade(
                send(
                    send(cout(), "<<", vec![string("sum of the last list: ")]),
                    "<<",
                    vec![send(local(0, 1), "sum", vec![])],
                ),
                "nl",
                vec![],
            )),
        ]),
    )
}

// cout << "Hello"; << ", "; << "world"; nl.
// a := Array new. a setSize: 3. a at: 0 put: 1; at: 1 put: 2.5; at: 2 put: "three".
// cout << a; nl
fn cascades(vm: &mut VM) -> Program {
    let array = vm.builtins.array;
    let greeting = cascade(
        cascade(
            cascade(send(cout(), "<<", vec![string("Hello")]), "<<", vec![string(", ")]),
            "<<",
            vec![string("world")],
        ),
        "nl",
        vec![],
    );
    let fill = cascade(
        cascade(
            send(local(0, 1), "at:put:", vec![int(0), int(1)]),
            "at:put:",
            vec![int(1), float(2.5)],
        ),
        "at:put:",
        vec![int(2), string("three")],
    );
    Program::new(
        globals::FIRST_USER,
        1,
        SyntaxForest::new(vec![
            Stmt::expr(greeting),
            Stmt::bind(LexicalAddress::local(0, 1), send(class_name(array), "new", vec![])),
            Stmt::expr(send(local(0, 1), "setSize:", vec![int(3)])),
            Stmt::expr(fill),
            Stmt::expr(cascade(send(cout(), "<<", vec![local(0, 1)]), "nl", vec![])),
        ]),
    )
}
