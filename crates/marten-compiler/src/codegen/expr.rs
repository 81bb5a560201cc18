//! Expression lowering.

use marten_bytecode::{FuncId, Opcode};

use crate::ast::{Kind, NodeId};
use crate::codegen::Codegen;
use crate::Result;

/// Binary operator kinds that lower as: evaluate `a`, evaluate `b`, opcode.
fn binary_opcode(kind: Kind) -> Option<Opcode> {
    Some(match kind {
        Kind::BitOr => Opcode::BitOr,
        Kind::BitXor => Opcode::BitXor,
        Kind::BitAnd => Opcode::BitAnd,
        Kind::Eq => Opcode::Eq,
        Kind::Ne => Opcode::Ne,
        Kind::StrictEq => Opcode::StrictEq,
        Kind::StrictNe => Opcode::StrictNe,
        Kind::Lt => Opcode::Lt,
        Kind::Gt => Opcode::Gt,
        Kind::Le => Opcode::Le,
        Kind::Ge => Opcode::Ge,
        Kind::InstanceOf => Opcode::InstanceOf,
        Kind::In => Opcode::In,
        Kind::Shl => Opcode::Shl,
        Kind::Shr => Opcode::Shr,
        Kind::Ushr => Opcode::Ushr,
        Kind::Add => Opcode::Add,
        Kind::Sub => Opcode::Sub,
        Kind::Mul => Opcode::Mul,
        Kind::Div => Opcode::Div,
        Kind::Mod => Opcode::Mod,
        _ => return None,
    })
}

/// Compound assignment kinds and the operator they apply before storing.
fn compound_opcode(kind: Kind) -> Option<Opcode> {
    Some(match kind {
        Kind::AssignMul => Opcode::Mul,
        Kind::AssignDiv => Opcode::Div,
        Kind::AssignMod => Opcode::Mod,
        Kind::AssignAdd => Opcode::Add,
        Kind::AssignSub => Opcode::Sub,
        Kind::AssignShl => Opcode::Shl,
        Kind::AssignShr => Opcode::Shr,
        Kind::AssignUshr => Opcode::Ushr,
        Kind::AssignBitAnd => Opcode::BitAnd,
        Kind::AssignBitXor => Opcode::BitXor,
        Kind::AssignBitOr => Opcode::BitOr,
        _ => return None,
    })
}

fn unary_opcode(kind: Kind) -> Option<Opcode> {
    Some(match kind {
        Kind::Typeof => Opcode::Typeof,
        Kind::Pos => Opcode::Pos,
        Kind::Neg => Opcode::Neg,
        Kind::BitNot => Opcode::BitNot,
        Kind::LogNot => Opcode::LogNot,
        _ => return None,
    })
}

fn incdec_opcode(kind: Kind) -> Option<Opcode> {
    Some(match kind {
        Kind::PreInc => Opcode::PreInc,
        Kind::PreDec => Opcode::PreDec,
        Kind::PostInc => Opcode::PostInc,
        Kind::PostDec => Opcode::PostDec,
        _ => return None,
    })
}

impl Codegen<'_> {
    pub(super) fn exp(&mut self, f: FuncId, e: NodeId) -> Result<()> {
        let (kind, a, b, c, number) = {
            let n = &self.ast.arena[e];
            (n.kind, n.a, n.b, n.c, n.number)
        };

        match kind {
            Kind::Identifier => {
                let s = self.name_of(e);
                self.emit_string(f, Opcode::LoadVar, &s);
            }
            Kind::Number => self.emit_number(f, Opcode::Number, number),
            Kind::String => {
                let s = self.name_of(e);
                self.emit_string(f, Opcode::String, &s);
            }
            Kind::Undef => self.emit(f, Opcode::Undef),
            Kind::Null => self.emit(f, Opcode::Null),
            Kind::True => self.emit(f, Opcode::True),
            Kind::False => self.emit(f, Opcode::False),
            Kind::This => self.emit(f, Opcode::This),

            Kind::Object => {
                self.emit(f, Opcode::NewObject);
                if let Some(list) = a {
                    self.object(f, list)?;
                }
            }

            Kind::Array => {
                self.emit(f, Opcode::NewArray);
                if let Some(list) = a {
                    self.array(f, list)?;
                }
            }

            Kind::Index => {
                self.exp(f, self.req(e, a)?)?;
                self.exp(f, self.req(e, b)?)?;
                self.emit(f, Opcode::LoadIndex);
            }

            Kind::Member => {
                self.exp(f, self.req(e, a)?)?;
                let s = self.name_of(self.req(e, b)?);
                self.emit_string(f, Opcode::LoadMember, &s);
            }

            Kind::Call => self.call(f, self.req(e, a)?, b)?,

            Kind::New => {
                self.exp(f, self.req(e, a)?)?;
                let n = self.args(f, b)?;
                self.emit(f, Opcode::New);
                self.operand(f, n);
            }

            Kind::Fun => {
                let target = self.function(a, b, c)?;
                self.emit_closure(f, target);
            }

            Kind::Delete => {
                self.lval(f, self.req(e, a)?)?;
                self.emit(f, Opcode::Delete);
            }

            Kind::Void => {
                self.exp(f, self.req(e, a)?)?;
                self.emit(f, Opcode::Pop);
                self.emit(f, Opcode::Undef);
            }

            Kind::Typeof | Kind::Pos | Kind::Neg | Kind::BitNot | Kind::LogNot => {
                let op = unary_opcode(kind).expect("guarded by match arm");
                self.exp(f, self.req(e, a)?)?;
                self.emit(f, op);
            }

            Kind::PreInc | Kind::PreDec | Kind::PostInc | Kind::PostDec => {
                let op = incdec_opcode(kind).expect("guarded by match arm");
                self.lval(f, self.req(e, a)?)?;
                self.emit(f, op);
            }

            Kind::BitOr
            | Kind::BitXor
            | Kind::BitAnd
            | Kind::Eq
            | Kind::Ne
            | Kind::StrictEq
            | Kind::StrictNe
            | Kind::Lt
            | Kind::Gt
            | Kind::Le
            | Kind::Ge
            | Kind::InstanceOf
            | Kind::In
            | Kind::Shl
            | Kind::Shr
            | Kind::Ushr
            | Kind::Add
            | Kind::Sub
            | Kind::Mul
            | Kind::Div
            | Kind::Mod => {
                let op = binary_opcode(kind).expect("guarded by match arm");
                self.exp(f, self.req(e, a)?)?;
                self.exp(f, self.req(e, b)?)?;
                self.emit(f, op);
            }

            Kind::Assign => {
                self.lval(f, self.req(e, a)?)?;
                self.exp(f, self.req(e, b)?)?;
                self.emit(f, Opcode::Store);
            }

            Kind::AssignMul
            | Kind::AssignDiv
            | Kind::AssignMod
            | Kind::AssignAdd
            | Kind::AssignSub
            | Kind::AssignShl
            | Kind::AssignShr
            | Kind::AssignUshr
            | Kind::AssignBitAnd
            | Kind::AssignBitXor
            | Kind::AssignBitOr => {
                let op = compound_opcode(kind).expect("guarded by match arm");
                self.lval(f, self.req(e, a)?)?;
                self.emit(f, Opcode::Load);
                self.exp(f, self.req(e, b)?)?;
                self.emit(f, op);
                self.emit(f, Opcode::Store);
            }

            Kind::Comma => {
                self.exp(f, self.req(e, a)?)?;
                self.emit(f, Opcode::Pop);
                self.exp(f, self.req(e, b)?)?;
            }

            Kind::LogOr => {
                // if a is truthy then a else b
                self.exp(f, self.req(e, a)?)?;
                self.emit(f, Opcode::Dup);
                let end = self.jump(f, Opcode::JTrue);
                self.emit(f, Opcode::Pop);
                self.exp(f, self.req(e, b)?)?;
                self.label(f, end);
            }

            Kind::LogAnd => {
                // if a is falsy then a else b
                self.exp(f, self.req(e, a)?)?;
                self.emit(f, Opcode::Dup);
                let end = self.jump(f, Opcode::JFalse);
                self.emit(f, Opcode::Pop);
                self.exp(f, self.req(e, b)?)?;
                self.label(f, end);
            }

            Kind::Cond => {
                // The else branch sits on the fall-through path.
                self.exp(f, self.req(e, a)?)?;
                let then = self.jump(f, Opcode::JTrue);
                self.exp(f, self.req(e, c)?)?;
                let end = self.jump(f, Opcode::Jump);
                self.label(f, then);
                self.exp(f, self.req(e, b)?)?;
                self.label(f, end);
            }

            _ => return self.error(e, "unknown expression"),
        }
        Ok(())
    }

    /// Compile an expression as an assignable reference.
    pub(super) fn lval(&mut self, f: FuncId, e: NodeId) -> Result<()> {
        let (kind, a, b) = {
            let n = &self.ast.arena[e];
            (n.kind, n.a, n.b)
        };
        match kind {
            Kind::Identifier => {
                let s = self.name_of(e);
                self.emit_string(f, Opcode::AVar, &s);
            }
            Kind::Index => {
                self.exp(f, self.req(e, a)?)?;
                self.exp(f, self.req(e, b)?)?;
                self.emit(f, Opcode::AIndex);
            }
            Kind::Member => {
                self.exp(f, self.req(e, a)?)?;
                let s = self.name_of(self.req(e, b)?);
                self.emit_string(f, Opcode::AMember, &s);
            }
            // Host functions may return an assignable reference.
            Kind::Call => self.exp(f, e)?,
            _ => return self.error(e, "invalid l-value in assignment"),
        }
        Ok(())
    }

    /// Calls push a receiver below the callee: the duplicated object for
    /// method and index calls, the global `this` otherwise.
    fn call(&mut self, f: FuncId, fun: NodeId, args: Option<NodeId>) -> Result<()> {
        let (kind, fa, fb) = {
            let n = &self.ast.arena[fun];
            (n.kind, n.a, n.b)
        };
        match kind {
            Kind::Index => {
                self.exp(f, self.req(fun, fa)?)?;
                self.emit(f, Opcode::Dup);
                self.exp(f, self.req(fun, fb)?)?;
                self.emit(f, Opcode::LoadIndex);
            }
            Kind::Member => {
                self.exp(f, self.req(fun, fa)?)?;
                self.emit(f, Opcode::Dup);
                let s = self.name_of(self.req(fun, fb)?);
                self.emit_string(f, Opcode::LoadMember, &s);
            }
            _ => {
                self.emit(f, Opcode::This);
                self.exp(f, fun)?;
            }
        }
        let n = self.args(f, args)?;
        self.emit(f, Opcode::Call);
        self.operand(f, n);
        Ok(())
    }

    fn args(&mut self, f: FuncId, list: Option<NodeId>) -> Result<u32> {
        let mut n = 0;
        let mut cell = list;
        while let Some(c) = cell {
            let (elem, next) = {
                let node = &self.ast.arena[c];
                (node.a, node.b)
            };
            self.exp(f, self.req(c, elem)?)?;
            n += 1;
            cell = next;
        }
        Ok(n)
    }

    fn array(&mut self, f: FuncId, list: NodeId) -> Result<()> {
        let mut index = 0;
        let mut cell = Some(list);
        while let Some(c) = cell {
            let (elem, next) = {
                let node = &self.ast.arena[c];
                (node.a, node.b)
            };
            self.exp(f, self.req(c, elem)?)?;
            self.emit(f, Opcode::ArrayPut);
            self.operand(f, index);
            index += 1;
            cell = next;
        }
        Ok(())
    }

    fn object(&mut self, f: FuncId, list: NodeId) -> Result<()> {
        let mut cell = Some(list);
        while let Some(c) = cell {
            let (kv, next) = {
                let node = &self.ast.arena[c];
                (node.a, node.b)
            };
            let kv = self.req(c, kv)?;
            let (kv_kind, prop, value) = {
                let node = &self.ast.arena[kv];
                (node.kind, node.a, node.b)
            };
            match kv_kind {
                Kind::PropVal => {
                    let prop = self.req(kv, prop)?;
                    self.exp(f, self.req(kv, value)?)?;
                    let (prop_kind, prop_number) = {
                        let node = &self.ast.arena[prop];
                        (node.kind, node.number)
                    };
                    match prop_kind {
                        Kind::Identifier | Kind::String => {
                            let s = self.name_of(prop);
                            self.emit_string(f, Opcode::ObjectPut, &s);
                        }
                        Kind::Number => self.emit_number(f, Opcode::ObjectPut, prop_number),
                        _ => {
                            return self
                                .error(prop, "illegal property name in object initializer");
                        }
                    }
                }
                // TODO: emit accessor definitions once the object runtime
                // can bind getters and setters.
                Kind::PropGet | Kind::PropSet => {}
                _ => {}
            }
            cell = next;
        }
        Ok(())
    }
}
