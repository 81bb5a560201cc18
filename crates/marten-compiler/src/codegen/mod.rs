//! Bytecode generation.
//!
//! Walks a folded syntax tree and emits stack-machine code into
//! per-function builders. Expressions leave exactly one value on the
//! operand stack unless explicitly popped; statements leave none.
//!
//! Every function compiles in a fixed order: self-binding for named
//! functions, hoisted function declarations, hoisted variable
//! declarations, body statements, and a `RETURN` epilogue if the body did
//! not end with one. Forward jumps are emitted with a placeholder operand
//! and patched once the target address is known.

mod expr;
mod stmt;

#[cfg(test)]
mod codegen_tests;

use marten_bytecode::{ANONYMOUS, FuncId, Function, Module, Opcode};

use crate::ast::{Arena, Ast, NodeId};
use crate::{Error, Result};

/// Compile a parsed program into a module. On failure every function
/// produced so far is dropped; no partial module escapes.
pub fn compile(ast: &Ast) -> Result<Module> {
    let mut cg = Codegen {
        ast,
        funcs: Vec::new(),
    };
    let entry = cg.function(None, None, ast.root)?;
    Ok(Module {
        functions: cg.funcs.into_iter().map(|s| s.f).collect(),
        entry,
    })
}

/// A function being emitted, plus the tag of the last opcode (operand
/// words do not count) so the epilogue check cannot be fooled by an
/// operand that happens to equal the `RETURN` word.
struct FuncState {
    f: Function,
    last_op: Option<Opcode>,
}

struct Codegen<'a> {
    ast: &'a Ast,
    /// Every function created during this compilation, in creation order;
    /// becomes the module's function table.
    funcs: Vec<FuncState>,
}

impl<'a> Codegen<'a> {
    /// Compile one function (recursively compiling any nested ones) and
    /// return its id in the function table.
    fn function(
        &mut self,
        name: Option<NodeId>,
        params: Option<NodeId>,
        body: Option<NodeId>,
    ) -> Result<FuncId> {
        let fname = match name {
            Some(n) => self.ast.arena[n].text().to_owned(),
            None => ANONYMOUS.to_owned(),
        };
        let id = FuncId::new(self.funcs.len());
        self.funcs.push(FuncState {
            f: Function::new(fname, list_len(&self.ast.arena, params)),
            last_op: None,
        });
        self.fun_body(id, name, body)?;
        Ok(id)
    }

    fn fun_body(&mut self, f: FuncId, name: Option<NodeId>, body: Option<NodeId>) -> Result<()> {
        // A named function binds its own name inside its body.
        if let Some(name) = name {
            self.emit_closure(f, f);
            let s = self.name_of(name);
            self.emit_string(f, Opcode::FunDec, &s);
        }

        if let Some(body) = body {
            self.fun_decs(f, body)?;
            self.var_decs(f, body)?;
            self.stm_list(f, body)?;
        }

        if self.funcs[f.index()].last_op != Some(Opcode::Return) {
            self.emit(f, Opcode::Undef);
            self.emit(f, Opcode::Return);
        }
        Ok(())
    }

    // Emission.

    fn emit(&mut self, f: FuncId, op: Opcode) {
        let state = &mut self.funcs[f.index()];
        state.f.code.push(op as u32);
        state.last_op = Some(op);
    }

    fn operand(&mut self, f: FuncId, word: u32) {
        self.funcs[f.index()].f.code.push(word);
    }

    fn emit_number(&mut self, f: FuncId, op: Opcode, value: f64) {
        let ix = self.funcs[f.index()].f.add_number(value);
        self.emit(f, op);
        self.operand(f, ix);
    }

    fn emit_string(&mut self, f: FuncId, op: Opcode, value: &str) {
        let ix = self.funcs[f.index()].f.add_string(value);
        self.emit(f, op);
        self.operand(f, ix);
    }

    fn emit_closure(&mut self, f: FuncId, target: FuncId) {
        let ix = self.funcs[f.index()].f.add_fun(target);
        self.emit(f, Opcode::Closure);
        self.operand(f, ix);
    }

    // Jump patching.

    fn here(&self, f: FuncId) -> u32 {
        self.funcs[f.index()].f.code.len() as u32
    }

    /// Emit a jump with a placeholder target; returns the index of the
    /// operand word for a later `label` call.
    fn jump(&mut self, f: FuncId, op: Opcode) -> usize {
        self.emit(f, op);
        self.operand(f, 0);
        self.funcs[f.index()].f.code.len() - 1
    }

    /// Patch a placeholder operand with the current address.
    fn label(&mut self, f: FuncId, at: usize) {
        let state = &mut self.funcs[f.index()];
        let here = state.f.code.len() as u32;
        state.f.code[at] = here;
    }

    fn jump_to(&mut self, f: FuncId, op: Opcode, dest: u32) {
        self.emit(f, op);
        self.operand(f, dest);
    }

    // Shared lookups.

    fn name_of(&self, id: NodeId) -> String {
        self.ast.arena[id].text().to_owned()
    }

    /// Required child slot; a hole here means the parser handed over a
    /// malformed tree.
    fn req(&self, at: NodeId, slot: Option<NodeId>) -> Result<NodeId> {
        match slot {
            Some(id) => Ok(id),
            None => self.error(at, "malformed syntax tree"),
        }
    }

    fn error<T>(&self, node: NodeId, message: &str) -> Result<T> {
        Err(Error::Compile {
            filename: self.ast.filename.clone(),
            line: self.ast.arena[node].line,
            message: message.to_owned(),
        })
    }
}

fn list_len(arena: &Arena, list: Option<NodeId>) -> u32 {
    let mut n = 0;
    let mut cell = list;
    while let Some(c) = cell {
        n += 1;
        cell = arena[c].b;
    }
    n
}
