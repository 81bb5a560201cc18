//! Expression grammar: the precedence ladder from primaries up to the
//! comma operator.
//!
//! The `notin` flag disables the `in` operator inside `for (...)` headers.

use crate::ast::{Kind, NodeId};
use crate::lexer::Tok;
use crate::parser::Parser;
use crate::Result;

impl Parser<'_> {
    fn primary(&mut self) -> Result<NodeId> {
        match self.lex.lookahead {
            Tok::Identifier => {
                let text = self.lex.text.clone();
                let a = self.str_node(Kind::Identifier, &text);
                self.next()?;
                Ok(a)
            }
            Tok::String => {
                let text = self.lex.text.clone();
                let a = self.str_node(Kind::String, &text);
                self.next()?;
                Ok(a)
            }
            Tok::Regexp => {
                let text = self.lex.text.clone();
                let flags = self.lex.number;
                let a = self.str_node(Kind::Regexp, &text);
                self.arena.node_mut(a).number = flags;
                self.next()?;
                Ok(a)
            }
            Tok::Number => {
                let value = self.lex.number;
                let a = self.num_node(Kind::Number, value);
                self.next()?;
                Ok(a)
            }
            _ => {
                if self.accept(Tok::This)? {
                    return Ok(self.leaf(Kind::This));
                }
                if self.accept(Tok::Null)? {
                    return Ok(self.leaf(Kind::Null));
                }
                if self.accept(Tok::True)? {
                    return Ok(self.leaf(Kind::True));
                }
                if self.accept(Tok::False)? {
                    return Ok(self.leaf(Kind::False));
                }
                if self.accept(Tok::LBrace)? {
                    let list = self.object_literal()?;
                    let a = self.node(Kind::Object, list, None, None, None);
                    self.expect(Tok::RBrace)?;
                    return Ok(a);
                }
                if self.accept(Tok::LBracket)? {
                    let list = self.array_literal()?;
                    let a = self.node(Kind::Array, list, None, None, None);
                    self.expect(Tok::RBracket)?;
                    return Ok(a);
                }
                if self.accept(Tok::LParen)? {
                    let a = self.expression(false)?;
                    self.expect(Tok::RParen)?;
                    return Ok(a);
                }
                self.error(format!(
                    "unexpected token in expression: {}",
                    self.lex.lookahead
                ))
            }
        }
    }

    fn array_element(&mut self) -> Result<NodeId> {
        // An elision hole reads as `undefined` without consuming the comma.
        if self.lex.lookahead == Tok::Comma {
            return Ok(self.leaf(Kind::Undef));
        }
        self.assignment(false)
    }

    fn array_literal(&mut self) -> Result<Option<NodeId>> {
        if self.lex.lookahead == Tok::RBracket {
            return Ok(None);
        }
        let first = self.array_element()?;
        let head = self.list(first);
        let mut tail = head;
        while self.accept(Tok::Comma)? {
            if self.lex.lookahead != Tok::RBracket {
                let elem = self.array_element()?;
                let cell = self.list(elem);
                self.arena.set_b(tail, Some(cell));
                tail = cell;
            }
        }
        Ok(Some(self.finish_list(head)))
    }

    fn prop_name(&mut self) -> Result<NodeId> {
        if self.lex.lookahead == Tok::Number {
            let value = self.lex.number;
            let name = self.num_node(Kind::Number, value);
            self.next()?;
            return Ok(name);
        }
        if self.lex.lookahead == Tok::String {
            let text = self.lex.text.clone();
            let name = self.str_node(Kind::String, &text);
            self.next()?;
            return Ok(name);
        }
        self.identifier_name()
    }

    fn prop_assign(&mut self) -> Result<NodeId> {
        let name = self.prop_name()?;

        // `get`/`set` only introduce an accessor when the next token is
        // not `:`; `{ get: 1 }` stays a plain value property.
        if self.lex.lookahead != Tok::Colon && self.arena[name].kind == Kind::Identifier {
            if self.arena[name].text() == "get" {
                let name = self.prop_name()?;
                self.expect(Tok::LParen)?;
                self.expect(Tok::RParen)?;
                let body = self.fun_body()?;
                return Ok(self.node(Kind::PropGet, Some(name), body, None, None));
            }
            if self.arena[name].text() == "set" {
                let name = self.prop_name()?;
                self.expect(Tok::LParen)?;
                let arg = self.identifier()?;
                self.expect(Tok::RParen)?;
                let body = self.fun_body()?;
                return Ok(self.node(Kind::PropSet, Some(name), Some(arg), body, None));
            }
        }

        self.expect(Tok::Colon)?;
        let value = self.assignment(false)?;
        Ok(self.node(Kind::PropVal, Some(name), Some(value), None, None))
    }

    fn object_literal(&mut self) -> Result<Option<NodeId>> {
        if self.lex.lookahead == Tok::RBrace {
            return Ok(None);
        }
        let first = self.prop_assign()?;
        let head = self.list(first);
        let mut tail = head;
        while self.accept(Tok::Comma)? {
            if self.lex.lookahead == Tok::RBrace {
                break;
            }
            let prop = self.prop_assign()?;
            let cell = self.list(prop);
            self.arena.set_b(tail, Some(cell));
            tail = cell;
        }
        Ok(Some(self.finish_list(head)))
    }

    pub(super) fn arguments(&mut self) -> Result<Option<NodeId>> {
        if self.lex.lookahead == Tok::RParen {
            return Ok(None);
        }
        let first = self.assignment(false)?;
        let head = self.list(first);
        let mut tail = head;
        while self.accept(Tok::Comma)? {
            let arg = self.assignment(false)?;
            let cell = self.list(arg);
            self.arena.set_b(tail, Some(cell));
            tail = cell;
        }
        Ok(Some(self.finish_list(head)))
    }

    fn new_exp(&mut self) -> Result<NodeId> {
        if self.accept(Tok::New)? {
            let a = self.member_exp()?;
            if self.accept(Tok::LParen)? {
                let b = self.arguments()?;
                self.expect(Tok::RParen)?;
                return Ok(self.node(Kind::New, Some(a), b, None, None));
            }
            return Ok(self.node(Kind::New, Some(a), None, None, None));
        }

        if self.accept(Tok::Function)? {
            return self.fun_exp();
        }

        self.primary()
    }

    pub(super) fn member_exp(&mut self) -> Result<NodeId> {
        let mut a = self.new_exp()?;
        loop {
            if self.accept(Tok::Dot)? {
                let name = self.identifier_name()?;
                a = self.node(Kind::Member, Some(a), Some(name), None, None);
                continue;
            }
            if self.accept(Tok::LBracket)? {
                let index = self.expression(false)?;
                self.expect(Tok::RBracket)?;
                a = self.node(Kind::Index, Some(a), Some(index), None, None);
                continue;
            }
            return Ok(a);
        }
    }

    fn call_exp(&mut self) -> Result<NodeId> {
        let mut a = self.new_exp()?;
        loop {
            if self.accept(Tok::Dot)? {
                let name = self.identifier_name()?;
                a = self.node(Kind::Member, Some(a), Some(name), None, None);
                continue;
            }
            if self.accept(Tok::LBracket)? {
                let index = self.expression(false)?;
                self.expect(Tok::RBracket)?;
                a = self.node(Kind::Index, Some(a), Some(index), None, None);
                continue;
            }
            if self.accept(Tok::LParen)? {
                let args = self.arguments()?;
                a = self.node(Kind::Call, Some(a), args, None, None);
                self.expect(Tok::RParen)?;
                continue;
            }
            return Ok(a);
        }
    }

    fn postfix(&mut self) -> Result<NodeId> {
        let a = self.call_exp()?;
        // Postfix ++/-- never applies across a line terminator.
        if !self.lex.newline && self.accept(Tok::PlusPlus)? {
            return Ok(self.node(Kind::PostInc, Some(a), None, None, None));
        }
        if !self.lex.newline && self.accept(Tok::MinusMinus)? {
            return Ok(self.node(Kind::PostDec, Some(a), None, None, None));
        }
        Ok(a)
    }

    fn unary(&mut self) -> Result<NodeId> {
        let kind = match self.lex.lookahead {
            Tok::Delete => Kind::Delete,
            Tok::Void => Kind::Void,
            Tok::Typeof => Kind::Typeof,
            Tok::PlusPlus => Kind::PreInc,
            Tok::MinusMinus => Kind::PreDec,
            Tok::Plus => Kind::Pos,
            Tok::Minus => Kind::Neg,
            Tok::Tilde => Kind::BitNot,
            Tok::Bang => Kind::LogNot,
            _ => return self.postfix(),
        };
        self.next()?;
        let a = self.unary()?;
        Ok(self.node(kind, Some(a), None, None, None))
    }

    fn multiplicative(&mut self) -> Result<NodeId> {
        let mut a = self.unary()?;
        loop {
            let kind = match self.lex.lookahead {
                Tok::Star => Kind::Mul,
                Tok::Slash => Kind::Div,
                Tok::Percent => Kind::Mod,
                _ => return Ok(a),
            };
            self.next()?;
            let b = self.unary()?;
            a = self.node(kind, Some(a), Some(b), None, None);
        }
    }

    fn additive(&mut self) -> Result<NodeId> {
        let mut a = self.multiplicative()?;
        loop {
            let kind = match self.lex.lookahead {
                Tok::Plus => Kind::Add,
                Tok::Minus => Kind::Sub,
                _ => return Ok(a),
            };
            self.next()?;
            let b = self.multiplicative()?;
            a = self.node(kind, Some(a), Some(b), None, None);
        }
    }

    fn shift(&mut self) -> Result<NodeId> {
        let mut a = self.additive()?;
        loop {
            let kind = match self.lex.lookahead {
                Tok::Shl => Kind::Shl,
                Tok::Shr => Kind::Shr,
                Tok::UShr => Kind::Ushr,
                _ => return Ok(a),
            };
            self.next()?;
            let b = self.additive()?;
            a = self.node(kind, Some(a), Some(b), None, None);
        }
    }

    fn relational(&mut self, notin: bool) -> Result<NodeId> {
        let mut a = self.shift()?;
        loop {
            let kind = match self.lex.lookahead {
                Tok::Lt => Kind::Lt,
                Tok::Gt => Kind::Gt,
                Tok::LtEq => Kind::Le,
                Tok::GtEq => Kind::Ge,
                Tok::InstanceOf => Kind::InstanceOf,
                Tok::In if !notin => Kind::In,
                _ => return Ok(a),
            };
            self.next()?;
            let b = self.shift()?;
            a = self.node(kind, Some(a), Some(b), None, None);
        }
    }

    fn equality(&mut self, notin: bool) -> Result<NodeId> {
        let mut a = self.relational(notin)?;
        loop {
            let kind = match self.lex.lookahead {
                Tok::EqEq => Kind::Eq,
                Tok::BangEq => Kind::Ne,
                Tok::EqEqEq => Kind::StrictEq,
                Tok::BangEqEq => Kind::StrictNe,
                _ => return Ok(a),
            };
            self.next()?;
            let b = self.relational(notin)?;
            a = self.node(kind, Some(a), Some(b), None, None);
        }
    }

    fn bit_and(&mut self, notin: bool) -> Result<NodeId> {
        let mut a = self.equality(notin)?;
        while self.accept(Tok::Amp)? {
            let b = self.equality(notin)?;
            a = self.node(Kind::BitAnd, Some(a), Some(b), None, None);
        }
        Ok(a)
    }

    fn bit_xor(&mut self, notin: bool) -> Result<NodeId> {
        let mut a = self.bit_and(notin)?;
        while self.accept(Tok::Caret)? {
            let b = self.bit_and(notin)?;
            a = self.node(Kind::BitXor, Some(a), Some(b), None, None);
        }
        Ok(a)
    }

    fn bit_or(&mut self, notin: bool) -> Result<NodeId> {
        let mut a = self.bit_xor(notin)?;
        while self.accept(Tok::Pipe)? {
            let b = self.bit_xor(notin)?;
            a = self.node(Kind::BitOr, Some(a), Some(b), None, None);
        }
        Ok(a)
    }

    // `&&` and `||` recurse to the right, so chains associate rightward in
    // the tree. Short-circuit evaluation is identical either way.

    fn log_and(&mut self, notin: bool) -> Result<NodeId> {
        let a = self.bit_or(notin)?;
        if self.accept(Tok::AmpAmp)? {
            let b = self.log_and(notin)?;
            return Ok(self.node(Kind::LogAnd, Some(a), Some(b), None, None));
        }
        Ok(a)
    }

    fn log_or(&mut self, notin: bool) -> Result<NodeId> {
        let a = self.log_and(notin)?;
        if self.accept(Tok::PipePipe)? {
            let b = self.log_or(notin)?;
            return Ok(self.node(Kind::LogOr, Some(a), Some(b), None, None));
        }
        Ok(a)
    }

    fn conditional(&mut self, notin: bool) -> Result<NodeId> {
        let a = self.log_or(notin)?;
        if self.accept(Tok::Question)? {
            let b = self.assignment(false)?;
            self.expect(Tok::Colon)?;
            let c = self.assignment(notin)?;
            return Ok(self.node(Kind::Cond, Some(a), Some(b), Some(c), None));
        }
        Ok(a)
    }

    pub(super) fn assignment(&mut self, notin: bool) -> Result<NodeId> {
        let a = self.conditional(notin)?;
        let kind = match self.lex.lookahead {
            Tok::Assign => Kind::Assign,
            Tok::StarAssign => Kind::AssignMul,
            Tok::SlashAssign => Kind::AssignDiv,
            Tok::PercentAssign => Kind::AssignMod,
            Tok::PlusAssign => Kind::AssignAdd,
            Tok::MinusAssign => Kind::AssignSub,
            Tok::ShlAssign => Kind::AssignShl,
            Tok::ShrAssign => Kind::AssignShr,
            Tok::UShrAssign => Kind::AssignUshr,
            Tok::AmpAssign => Kind::AssignBitAnd,
            Tok::CaretAssign => Kind::AssignBitXor,
            Tok::PipeAssign => Kind::AssignBitOr,
            _ => return Ok(a),
        };
        self.next()?;
        let b = self.assignment(notin)?;
        Ok(self.node(kind, Some(a), Some(b), None, None))
    }

    pub(super) fn expression(&mut self, notin: bool) -> Result<NodeId> {
        let mut a = self.assignment(notin)?;
        while self.accept(Tok::Comma)? {
            let b = self.assignment(notin)?;
            a = self.node(Kind::Comma, Some(a), Some(b), None, None);
        }
        Ok(a)
    }
}
