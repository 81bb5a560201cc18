//! Human-readable bytecode listing for debugging and tests.

use std::fmt::Write as _;

use crate::function::{FuncId, Function, Module};
use crate::opcode::{Opcode, OperandKind};

/// List every function in the module, in table order.
///
/// Each function prints a header followed by one line per instruction,
/// `<addr>: <MNEMONIC> [operand]`, where `addr` is the word index of the
/// opcode. Operands resolve through the owning pool where the pool is
/// known; counts, dense indices and jump targets print raw. The listing is
/// total: words that do not decode print as `?? <word>`.
pub fn dump(module: &Module) -> String {
    let mut out = String::new();
    for (i, f) in module.functions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        dump_function(&mut out, f, FuncId::new(i));
    }
    out
}

fn dump_function(out: &mut String, f: &Function, id: FuncId) {
    writeln!(
        out,
        "function f#{} {:?} (params: {})",
        id.index(),
        f.name,
        f.num_params
    )
    .unwrap();

    let mut addr = 0;
    while addr < f.code.len() {
        let word = f.code[addr];
        let Some(op) = Opcode::from_u32(word) else {
            writeln!(out, "  {}: ?? {}", addr, word).unwrap();
            addr += 1;
            continue;
        };
        if !op.has_operand() {
            writeln!(out, "  {}: {}", addr, op.mnemonic()).unwrap();
            addr += 1;
            continue;
        }
        let operand = f.code.get(addr + 1).copied();
        match operand {
            Some(w) => {
                writeln!(out, "  {}: {} {}", addr, op.mnemonic(), operand_str(f, op, w)).unwrap()
            }
            None => writeln!(out, "  {}: {} ??", addr, op.mnemonic()).unwrap(),
        }
        addr += 2;
    }
}

fn operand_str(f: &Function, op: Opcode, w: u32) -> String {
    match op.operand_kind() {
        OperandKind::Number => match f.nums.get(w as usize) {
            Some(&v) => format_number(v),
            None => w.to_string(),
        },
        OperandKind::Str => match f.strs.get_index(w as usize) {
            Some(s) => format!("{:?}", s),
            None => w.to_string(),
        },
        OperandKind::Func => match f.funs.get(w as usize) {
            Some(id) => format!("f#{}", id.index()),
            None => w.to_string(),
        },
        OperandKind::Raw | OperandKind::None => w.to_string(),
    }
}

/// Format a numeric constant the way scripts read them: integral values
/// without a fractional part, everything else with Rust's shortest `f64`
/// rendering.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
