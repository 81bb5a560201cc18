//! Statement lowering and the hoisting passes.

use marten_bytecode::{FuncId, Opcode};

use crate::ast::{Kind, NodeId};
use crate::codegen::Codegen;
use crate::Result;

impl Codegen<'_> {
    /// Hoisting pass one: compile and bind every function declaration in
    /// the body's top-level statement list.
    pub(super) fn fun_decs(&mut self, f: FuncId, list: NodeId) -> Result<()> {
        let mut cell = Some(list);
        while let Some(c) = cell {
            let (elem, next) = {
                let node = &self.ast.arena[c];
                (node.a, node.b)
            };
            if let Some(stm) = elem {
                let (kind, name, params, body) = {
                    let node = &self.ast.arena[stm];
                    (node.kind, node.a, node.b, node.c)
                };
                if kind == Kind::Fundec {
                    let name = self.req(stm, name)?;
                    let target = self.function(Some(name), params, body)?;
                    self.emit_closure(f, target);
                    let s = self.name_of(name);
                    self.emit_string(f, Opcode::FunDec, &s);
                }
            }
            cell = next;
        }
        Ok(())
    }

    /// Hoisting pass two: declare every `var` name in the body, without
    /// descending into nested functions. Initialisers run later, in
    /// statement order.
    pub(super) fn var_decs(&mut self, f: FuncId, node: NodeId) -> Result<()> {
        let (kind, a, b, c, d) = {
            let n = &self.ast.arena[node];
            (n.kind, n.a, n.b, n.c, n.d)
        };
        if kind == Kind::VarDecl {
            let name = self.req(node, a)?;
            let s = self.name_of(name);
            self.emit_string(f, Opcode::VarDec, &s);
            return Ok(());
        }
        if kind != Kind::Fun && kind != Kind::Fundec {
            for child in [a, b, c, d].into_iter().flatten() {
                self.var_decs(f, child)?;
            }
        }
        Ok(())
    }

    pub(super) fn stm_list(&mut self, f: FuncId, list: NodeId) -> Result<()> {
        let mut cell = Some(list);
        while let Some(c) = cell {
            let (elem, next) = {
                let node = &self.ast.arena[c];
                (node.a, node.b)
            };
            if let Some(stm) = elem {
                self.stm(f, stm)?;
            }
            cell = next;
        }
        Ok(())
    }

    fn stm(&mut self, f: FuncId, stm: NodeId) -> Result<()> {
        let (kind, a, b, c) = {
            let n = &self.ast.arena[stm];
            (n.kind, n.a, n.b, n.c)
        };

        match kind {
            // Already emitted by the hoisting pass.
            Kind::Fundec => {}

            Kind::Block => {
                if let Some(list) = a {
                    self.stm_list(f, list)?;
                }
            }

            Kind::Nop => {}

            Kind::VarStmt => {
                if let Some(list) = a {
                    self.var_init(f, list)?;
                }
            }

            Kind::If => {
                if let Some(alt) = c {
                    self.exp(f, self.req(stm, a)?)?;
                    let then = self.jump(f, Opcode::JTrue);
                    self.stm(f, alt)?;
                    let end = self.jump(f, Opcode::Jump);
                    self.label(f, then);
                    self.stm(f, self.req(stm, b)?)?;
                    self.label(f, end);
                } else {
                    self.exp(f, self.req(stm, a)?)?;
                    let end = self.jump(f, Opcode::JFalse);
                    self.stm(f, self.req(stm, b)?)?;
                    self.label(f, end);
                }
            }

            Kind::While => {
                let top = self.here(f);
                self.exp(f, self.req(stm, a)?)?;
                let end = self.jump(f, Opcode::JFalse);
                self.stm(f, self.req(stm, b)?)?;
                self.jump_to(f, Opcode::Jump, top);
                self.label(f, end);
            }

            Kind::DoWhile => {
                let top = self.here(f);
                self.stm(f, self.req(stm, a)?)?;
                self.exp(f, self.req(stm, b)?)?;
                self.jump_to(f, Opcode::JTrue, top);
            }

            Kind::Return => {
                match a {
                    Some(value) => self.exp(f, value)?,
                    None => self.emit(f, Opcode::Undef),
                }
                self.emit(f, Opcode::Return);
            }

            Kind::With => {
                self.exp(f, self.req(stm, a)?)?;
                self.emit(f, Opcode::With);
                self.stm(f, self.req(stm, b)?)?;
                self.emit(f, Opcode::EndWith);
            }

            Kind::Throw => {
                self.exp(f, self.req(stm, a)?)?;
                self.emit(f, Opcode::Throw);
            }

            Kind::Debugger => self.emit(f, Opcode::Debugger),

            Kind::For
            | Kind::ForVar
            | Kind::ForIn
            | Kind::ForInVar
            | Kind::Switch
            | Kind::Case
            | Kind::Default
            | Kind::Label
            | Kind::Continue
            | Kind::Break
            | Kind::Try => return self.error(stm, "unimplemented statement"),

            // Anything else is an expression statement.
            _ => {
                self.exp(f, stm)?;
                self.emit(f, Opcode::Pop);
            }
        }
        Ok(())
    }

    /// Run the initialisers of a `var` statement; the declarations
    /// themselves were hoisted.
    fn var_init(&mut self, f: FuncId, list: NodeId) -> Result<()> {
        let mut cell = Some(list);
        while let Some(c) = cell {
            let (elem, next) = {
                let node = &self.ast.arena[c];
                (node.a, node.b)
            };
            if let Some(dec) = elem {
                let (name, init) = {
                    let node = &self.ast.arena[dec];
                    (node.a, node.b)
                };
                if let Some(init) = init {
                    let name = self.req(dec, name)?;
                    self.exp(f, init)?;
                    let s = self.name_of(name);
                    self.emit_string(f, Opcode::AVar, &s);
                    self.emit(f, Opcode::Store);
                    self.emit(f, Opcode::Pop);
                }
            }
            cell = next;
        }
        Ok(())
    }
}
