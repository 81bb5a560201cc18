//! Code-emission tests: the exact word sequences, pool contents and
//! patched jump targets for the constructs the compiler lowers.

use marten_bytecode::{FuncId, Function, Module, Opcode, dump};

use crate::codegen;
use crate::parser::Parser;
use crate::Error;

fn compile_src(source: &str) -> Module {
    let ast = Parser::new("test.js", source).parse().unwrap();
    codegen::compile(&ast).unwrap()
}

fn compile_err(source: &str) -> Error {
    let ast = Parser::new("test.js", source).parse().unwrap();
    codegen::compile(&ast).unwrap_err()
}

fn o(op: Opcode) -> u32 {
    op as u32
}

/// Pool index of an interned string.
fn s(f: &Function, name: &str) -> u32 {
    f.strs.get_index_of(name).expect("string pooled") as u32
}

/// Pool index of an interned number.
#[allow(clippy::float_cmp)]
fn n(f: &Function, value: f64) -> u32 {
    f.nums.iter().position(|&x| x == value).expect("number pooled") as u32
}

#[test]
fn empty_program_returns_undefined() {
    let m = compile_src("");
    assert_eq!(m.functions.len(), 1);
    assert_eq!(m.entry, FuncId::new(0));
    let f = m.entry_function();
    assert_eq!(f.name, "<anonymous>");
    assert_eq!(f.num_params, 0);
    assert_eq!(f.code, vec![o(Opcode::Undef), o(Opcode::Return)]);
}

#[test]
fn folded_initializer_emits_one_number() {
    let m = compile_src("var x = 1 + 2 * 3;");
    let f = m.entry_function();
    assert_eq!(f.nums, vec![7.0]);
    assert_eq!(
        f.code,
        vec![
            o(Opcode::VarDec),
            s(f, "x"),
            o(Opcode::Number),
            n(f, 7.0),
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
    assert!(!f.code.contains(&o(Opcode::Add)));
    assert!(!f.code.contains(&o(Opcode::Mul)));
}

#[test]
fn short_circuit_or() {
    let m = compile_src("a || b;");
    let f = m.entry_function();
    // The JTRUE target is the address right after the right operand.
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::Dup),
            o(Opcode::JTrue),
            8,
            o(Opcode::Pop),
            o(Opcode::LoadVar),
            s(f, "b"),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn short_circuit_and() {
    let m = compile_src("a && b;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::Dup),
            o(Opcode::JFalse),
            8,
            o(Opcode::Pop),
            o(Opcode::LoadVar),
            s(f, "b"),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn declarations_hoist_before_body_code() {
    let m = compile_src(indoc::indoc! {"
        function f() {}
        var x;
        x = 1;
    "});
    assert_eq!(m.functions.len(), 2);
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::Closure),
            0,
            o(Opcode::FunDec),
            s(f, "f"),
            o(Opcode::VarDec),
            s(f, "x"),
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
    assert_eq!(f.funs, vec![FuncId::new(1)]);
}

#[test]
fn named_functions_bind_themselves() {
    let m = compile_src("function f(){}");
    let f = m.function(FuncId::new(1));
    assert_eq!(f.name, "f");
    // Inside its own body the function closes over itself.
    assert_eq!(f.funs, vec![FuncId::new(1)]);
    assert_eq!(
        f.code,
        vec![
            o(Opcode::Closure),
            0,
            o(Opcode::FunDec),
            s(f, "f"),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn method_call_duplicates_the_receiver() {
    let m = compile_src("o.m(1);");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "o"),
            o(Opcode::Dup),
            o(Opcode::LoadMember),
            s(f, "m"),
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::Call),
            1,
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn plain_call_passes_global_this() {
    let m = compile_src("f(1);");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "f"),
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::Call),
            1,
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn index_call_duplicates_the_receiver() {
    let m = compile_src("o[k]();");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "o"),
            o(Opcode::Dup),
            o(Opcode::LoadVar),
            s(f, "k"),
            o(Opcode::LoadIndex),
            o(Opcode::Call),
            0,
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn conditional_emits_the_else_branch_first() {
    let m = compile_src("x = a ? b : c;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::JTrue),
            10,
            o(Opcode::LoadVar),
            s(f, "c"),
            o(Opcode::Jump),
            12,
            o(Opcode::LoadVar),
            s(f, "b"),
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
    // Emission order shows in the string pool: the else operand interns
    // before the then operand.
    let names: Vec<&str> = f.strs.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["x", "a", "c", "b"]);
}

#[test]
fn while_loop_shape() {
    let m = compile_src("while (a) f();");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::JFalse),
            12,
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "f"),
            o(Opcode::Call),
            0,
            o(Opcode::Pop),
            o(Opcode::Jump),
            0,
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn do_while_jumps_back_while_true() {
    let m = compile_src("do f(); while (a);");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "f"),
            o(Opcode::Call),
            0,
            o(Opcode::Pop),
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::JTrue),
            0,
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn if_else_shape() {
    let m = compile_src("if (a) f(); else g();");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::JTrue),
            12,
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "g"),
            o(Opcode::Call),
            0,
            o(Opcode::Pop),
            o(Opcode::Jump),
            18,
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "f"),
            o(Opcode::Call),
            0,
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn if_without_else_falls_through() {
    let m = compile_src("if (a) { var b; }");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::VarDec),
            s(f, "b"),
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::JFalse),
            6,
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn compound_assignment_loads_then_stores() {
    let m = compile_src("x += 2;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::Load),
            o(Opcode::Number),
            n(f, 2.0),
            o(Opcode::Add),
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn increment_forms_compile_addresses() {
    let m = compile_src("++x; y--;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::PreInc),
            o(Opcode::Pop),
            o(Opcode::AVar),
            s(f, "y"),
            o(Opcode::PostDec),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn delete_and_typeof_and_void() {
    let m = compile_src("delete o.p;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "o"),
            o(Opcode::AMember),
            s(f, "p"),
            o(Opcode::Delete),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );

    let m = compile_src("typeof x;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "x"),
            o(Opcode::Typeof),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );

    let m = compile_src("void f();");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "f"),
            o(Opcode::Call),
            0,
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn comma_pops_the_left_value() {
    let m = compile_src("a, b;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::Pop),
            o(Opcode::LoadVar),
            s(f, "b"),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn with_statement_brackets_its_body() {
    let m = compile_src("with (o) f();");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "o"),
            o(Opcode::With),
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "f"),
            o(Opcode::Call),
            0,
            o(Opcode::Pop),
            o(Opcode::EndWith),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn throw_and_debugger() {
    let m = compile_src("throw e;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::LoadVar),
            s(f, "e"),
            o(Opcode::Throw),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );

    let m = compile_src("debugger;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![o(Opcode::Debugger), o(Opcode::Undef), o(Opcode::Return)]
    );
}

#[test]
fn explicit_return_suppresses_the_epilogue() {
    let m = compile_src("function f() { return 1; }");
    let f = m.function(FuncId::new(1));
    assert_eq!(
        f.code,
        vec![
            o(Opcode::Closure),
            0,
            o(Opcode::FunDec),
            s(f, "f"),
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn bare_return_yields_undefined() {
    let m = compile_src("function f() { return; }");
    let f = m.function(FuncId::new(1));
    assert_eq!(
        f.code,
        vec![
            o(Opcode::Closure),
            0,
            o(Opcode::FunDec),
            s(f, "f"),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn parameters_are_counted() {
    let m = compile_src("function add(a, b) { return a + b; }");
    let f = m.function(FuncId::new(1));
    assert_eq!(f.num_params, 2);
    assert_eq!(
        f.code,
        vec![
            o(Opcode::Closure),
            0,
            o(Opcode::FunDec),
            s(f, "add"),
            o(Opcode::LoadVar),
            s(f, "a"),
            o(Opcode::LoadVar),
            s(f, "b"),
            o(Opcode::Add),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn object_literal_keys_choose_their_pool() {
    let m = compile_src("x = {a: 1, 2: 'b'};");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::NewObject),
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::ObjectPut),
            s(f, "a"),
            o(Opcode::String),
            s(f, "b"),
            o(Opcode::ObjectPut),
            n(f, 2.0),
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn accessor_properties_are_not_emitted() {
    let m = compile_src("x = {get p() {}};");
    // The accessor body never becomes a function.
    assert_eq!(m.functions.len(), 1);
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::NewObject),
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn array_literal_uses_dense_indices() {
    let m = compile_src("x = [1, , 2];");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::NewArray),
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::ArrayPut),
            0,
            o(Opcode::Undef),
            o(Opcode::ArrayPut),
            1,
            o(Opcode::Number),
            n(f, 2.0),
            o(Opcode::ArrayPut),
            2,
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn new_emits_argument_count() {
    let m = compile_src("x = new F(1, 2); y = new F;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::AVar),
            s(f, "x"),
            o(Opcode::LoadVar),
            s(f, "F"),
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::Number),
            n(f, 2.0),
            o(Opcode::New),
            2,
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::AVar),
            s(f, "y"),
            o(Opcode::LoadVar),
            s(f, "F"),
            o(Opcode::New),
            0,
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn named_function_expressions_reference_themselves() {
    let m = compile_src("x = function g() {};");
    assert_eq!(m.functions.len(), 2);
    let entry = m.entry_function();
    assert_eq!(
        entry.code,
        vec![
            o(Opcode::AVar),
            s(entry, "x"),
            o(Opcode::Closure),
            0,
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
    assert_eq!(entry.funs, vec![FuncId::new(1)]);
    let g = m.function(FuncId::new(1));
    assert_eq!(g.funs, vec![FuncId::new(1)]);
}

#[test]
fn calls_are_legal_assignment_targets() {
    // Host functions may return an assignable reference.
    let m = compile_src("f() = 1;");
    let f = m.entry_function();
    assert_eq!(
        f.code,
        vec![
            o(Opcode::This),
            o(Opcode::LoadVar),
            s(f, "f"),
            o(Opcode::Call),
            0,
            o(Opcode::Number),
            n(f, 1.0),
            o(Opcode::Store),
            o(Opcode::Pop),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
}

#[test]
fn nested_declarations_hoist_within_their_function() {
    let m = compile_src("function outer() { var a; function inner() {} }");
    assert_eq!(m.functions.len(), 3);
    let outer = m.function(FuncId::new(1));
    assert_eq!(outer.funs, vec![FuncId::new(1), FuncId::new(2)]);
    assert_eq!(
        outer.code,
        vec![
            o(Opcode::Closure),
            0,
            o(Opcode::FunDec),
            s(outer, "outer"),
            o(Opcode::Closure),
            1,
            o(Opcode::FunDec),
            s(outer, "inner"),
            o(Opcode::VarDec),
            s(outer, "a"),
            o(Opcode::Undef),
            o(Opcode::Return),
        ]
    );
    // The entry function never saw `a` or `inner`.
    let entry = m.entry_function();
    assert!(entry.strs.get_index_of("a").is_none());
    assert!(entry.strs.get_index_of("inner").is_none());
}

#[test]
fn string_pool_dedup() {
    let m = compile_src("x = 'aa'; y = 'aa'; z = 'aa';");
    let f = m.entry_function();
    let names: Vec<&str> = f.strs.iter().map(String::as_str).collect();
    assert_eq!(names, vec!["x", "aa", "y", "z"]);
}

#[test]
fn number_pool_quirks_survive_compilation() {
    // Signed zero collapses.
    let m = compile_src("x = 0; y = -0;");
    assert_eq!(m.entry_function().nums.len(), 1);

    // NaN never matches an equality probe.
    let m = compile_src("x = 0 / 0; y = 0 / 0;");
    let nums = &m.entry_function().nums;
    assert_eq!(nums.len(), 2);
    assert!(nums.iter().all(|v| v.is_nan()));
}

#[test]
fn unlowered_statements_are_compile_errors() {
    for source in [
        "for (;;) ;",
        "for (var i = 0; i < 3; i++) ;",
        "for (p in o) ;",
        "for (var p in o) ;",
        "switch (x) { default: }",
        "lab: f();",
        "break;",
        "continue;",
        "try { } finally { }",
    ] {
        let err = compile_err(source);
        assert_eq!(err.message(), "unimplemented statement", "{}", source);
        assert!(matches!(err, Error::Compile { .. }));
    }
}

#[test]
fn regexp_literals_are_not_lowered() {
    let err = compile_err("x = /a/;");
    assert_eq!(err.message(), "unknown expression");
}

#[test]
fn invalid_assignment_targets() {
    for source in ["1 = 2;", "x + y = 2;", "'s' = 1;", "delete 1;"] {
        let err = compile_err(source);
        assert_eq!(err.message(), "invalid l-value in assignment", "{}", source);
    }
}

#[test]
fn compile_errors_carry_position() {
    let err = compile_err("x = 1;\nbreak;");
    assert_eq!(err.to_string(), "test.js:2: error: unimplemented statement");
}

/// Walk every function, checking instruction-stream integrity: words
/// decode, operand counts line up, pool indices are in range, jump
/// targets stay inside the code, and the stream ends with RETURN.
fn check_module(m: &Module) {
    for f in &m.functions {
        let mut addr = 0;
        let mut last = None;
        while addr < f.code.len() {
            let op = Opcode::from_u32(f.code[addr]).expect("word decodes");
            last = Some(op);
            addr += 1;
            if !op.has_operand() {
                continue;
            }
            assert!(addr < f.code.len(), "operand missing");
            let w = f.code[addr] as usize;
            addr += 1;
            match op.operand_kind() {
                marten_bytecode::OperandKind::Number => assert!(w < f.nums.len()),
                marten_bytecode::OperandKind::Str => assert!(w < f.strs.len()),
                marten_bytecode::OperandKind::Func => {
                    assert!(w < f.funs.len());
                    assert!(f.funs[w].index() < m.functions.len());
                }
                marten_bytecode::OperandKind::Raw => {
                    if matches!(op, Opcode::Jump | Opcode::JTrue | Opcode::JFalse) {
                        assert!(w <= f.code.len(), "jump target out of range");
                    }
                }
                marten_bytecode::OperandKind::None => unreachable!(),
            }
        }
        assert_eq!(last, Some(Opcode::Return), "code must end in RETURN");
    }
}

#[test]
fn emitted_modules_are_well_formed() {
    let sources = [
        "",
        "var x = 1 + 2 * 3;",
        "a || b && c;",
        "x = a ? b : c;",
        "function f(a, b) { if (a) return b; while (b) b = f(a, b - 1); return f; }",
        "x = {a: 1, 2: 'b', get p() {}}; y = [1, , 2]; z = new F(x, y);",
        "with (o) { m.n[0](1); delete m.n; }",
        "do x = x + 1; while (x < 10);",
        "x = function g(n) { return n ? n * g(n - 1) : 1; };",
    ];
    for source in sources {
        check_module(&compile_src(source));
    }
}

#[test]
fn bytecode_listing_snapshot() {
    let m = compile_src("function f() { return 1; }");
    insta::assert_snapshot!(dump(&m), @r#"
    function f#0 "<anonymous>" (params: 0)
      0: CLOSURE f#1
      2: FUNDEC "f"
      4: UNDEF
      5: RETURN

    function f#1 "f" (params: 0)
      0: CLOSURE f#1
      2: FUNDEC "f"
      4: NUMBER 1
      6: RETURN
    "#);
}

#[test]
fn listing_snapshot_for_short_circuit() {
    let m = compile_src("a || b;");
    insta::assert_snapshot!(dump(&m), @r#"
    function f#0 "<anonymous>" (params: 0)
      0: LOADVAR "a"
      2: DUP
      3: JTRUE 8
      5: POP
      6: LOADVAR "b"
      8: POP
      9: UNDEF
      10: RETURN
    "#);
}
