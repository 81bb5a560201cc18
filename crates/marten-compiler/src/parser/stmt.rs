//! Statement and function grammar.

use crate::ast::{Kind, NodeId};
use crate::lexer::Tok;
use crate::parser::Parser;
use crate::Result;

impl Parser<'_> {
    // Functions.

    /// Hoistable declaration form, only legal as a direct program or
    /// function-body element.
    fn fun_dec(&mut self) -> Result<NodeId> {
        let a = self.identifier()?;
        self.expect(Tok::LParen)?;
        let b = self.parameters()?;
        self.expect(Tok::RParen)?;
        let c = self.fun_body()?;
        Ok(self.node(Kind::Fundec, Some(a), b, c, None))
    }

    /// Function statement, rewritten as `var X = function X() {}`.
    fn fun_stm(&mut self) -> Result<NodeId> {
        let a = self.identifier()?;
        self.expect(Tok::LParen)?;
        let b = self.parameters()?;
        self.expect(Tok::RParen)?;
        let c = self.fun_body()?;
        let fun = self.node(Kind::Fun, Some(a), b, c, None);
        let dec = self.node(Kind::VarDecl, Some(a), Some(fun), None, None);
        let cell = self.list(dec);
        Ok(self.node(Kind::VarStmt, Some(cell), None, None, None))
    }

    pub(super) fn fun_exp(&mut self) -> Result<NodeId> {
        let a = self.identifier_opt()?;
        self.expect(Tok::LParen)?;
        let b = self.parameters()?;
        self.expect(Tok::RParen)?;
        let c = self.fun_body()?;
        Ok(self.node(Kind::Fun, a, b, c, None))
    }

    fn parameters(&mut self) -> Result<Option<NodeId>> {
        if self.lex.lookahead == Tok::RParen {
            return Ok(None);
        }
        let first = self.identifier()?;
        let head = self.list(first);
        let mut tail = head;
        while self.accept(Tok::Comma)? {
            let param = self.identifier()?;
            let cell = self.list(param);
            self.arena.set_b(tail, Some(cell));
            tail = cell;
        }
        Ok(Some(self.finish_list(head)))
    }

    pub(super) fn fun_body(&mut self) -> Result<Option<NodeId>> {
        self.expect(Tok::LBrace)?;
        let a = self.script(Tok::RBrace)?;
        self.expect(Tok::RBrace)?;
        Ok(a)
    }

    // Variable declarations.

    fn var_dec(&mut self, notin: bool) -> Result<NodeId> {
        let a = self.identifier()?;
        if self.accept(Tok::Assign)? {
            let b = self.assignment(notin)?;
            return Ok(self.node(Kind::VarDecl, Some(a), Some(b), None, None));
        }
        Ok(self.node(Kind::VarDecl, Some(a), None, None, None))
    }

    fn var_dec_list(&mut self, notin: bool) -> Result<NodeId> {
        let first = self.var_dec(notin)?;
        let head = self.list(first);
        let mut tail = head;
        while self.accept(Tok::Comma)? {
            let dec = self.var_dec(notin)?;
            let cell = self.list(dec);
            self.arena.set_b(tail, Some(cell));
            tail = cell;
        }
        Ok(self.finish_list(head))
    }

    // Statements.

    fn statement_list(&mut self) -> Result<Option<NodeId>> {
        if matches!(
            self.lex.lookahead,
            Tok::RBrace | Tok::Case | Tok::Default
        ) {
            return Ok(None);
        }
        let first = self.statement()?;
        let head = self.list(first);
        let mut tail = head;
        while !matches!(
            self.lex.lookahead,
            Tok::RBrace | Tok::Case | Tok::Default
        ) {
            let stm = self.statement()?;
            let cell = self.list(stm);
            self.arena.set_b(tail, Some(cell));
            tail = cell;
        }
        Ok(Some(self.finish_list(head)))
    }

    fn case_clause(&mut self) -> Result<NodeId> {
        if self.accept(Tok::Case)? {
            let a = self.expression(false)?;
            self.expect(Tok::Colon)?;
            let b = self.statement_list()?;
            return Ok(self.node(Kind::Case, Some(a), b, None, None));
        }
        if self.accept(Tok::Default)? {
            self.expect(Tok::Colon)?;
            let a = self.statement_list()?;
            return Ok(self.node(Kind::Default, a, None, None, None));
        }
        self.error(format!(
            "unexpected token in switch: {} (expected 'case' or 'default')",
            self.lex.lookahead
        ))
    }

    fn case_list(&mut self) -> Result<Option<NodeId>> {
        if self.lex.lookahead == Tok::RBrace {
            return Ok(None);
        }
        let first = self.case_clause()?;
        let head = self.list(first);
        let mut tail = head;
        while self.lex.lookahead != Tok::RBrace {
            let clause = self.case_clause()?;
            let cell = self.list(clause);
            self.arena.set_b(tail, Some(cell));
            tail = cell;
        }
        Ok(Some(self.finish_list(head)))
    }

    fn block(&mut self) -> Result<NodeId> {
        self.expect(Tok::LBrace)?;
        let a = self.statement_list()?;
        self.expect(Tok::RBrace)?;
        Ok(self.node(Kind::Block, a, None, None, None))
    }

    fn for_expression(&mut self, end: Tok) -> Result<Option<NodeId>> {
        let a = if self.lex.lookahead != end {
            Some(self.expression(false)?)
        } else {
            None
        };
        self.expect(end)?;
        Ok(a)
    }

    fn for_statement(&mut self) -> Result<NodeId> {
        self.expect(Tok::LParen)?;
        if self.accept(Tok::Var)? {
            let a = self.var_dec_list(true)?;
            if self.accept(Tok::Semi)? {
                let b = self.for_expression(Tok::Semi)?;
                let c = self.for_expression(Tok::RParen)?;
                let d = self.statement()?;
                return Ok(self.node(Kind::ForVar, Some(a), b, c, Some(d)));
            }
            if self.accept(Tok::In)? {
                let b = self.expression(false)?;
                self.expect(Tok::RParen)?;
                let c = self.statement()?;
                return Ok(self.node(Kind::ForInVar, Some(a), Some(b), Some(c), None));
            }
            return self.error(format!(
                "unexpected token in for-var-statement: {}",
                self.lex.lookahead
            ));
        }

        let a = if self.lex.lookahead != Tok::Semi {
            Some(self.expression(true)?)
        } else {
            None
        };
        if self.accept(Tok::Semi)? {
            let b = self.for_expression(Tok::Semi)?;
            let c = self.for_expression(Tok::RParen)?;
            let d = self.statement()?;
            return Ok(self.node(Kind::For, a, b, c, Some(d)));
        }
        if self.accept(Tok::In)? {
            let b = self.expression(false)?;
            self.expect(Tok::RParen)?;
            let c = self.statement()?;
            return Ok(self.node(Kind::ForIn, a, Some(b), Some(c), None));
        }
        self.error(format!(
            "unexpected token in for-statement: {}",
            self.lex.lookahead
        ))
    }

    pub(super) fn statement(&mut self) -> Result<NodeId> {
        if self.lex.lookahead == Tok::LBrace {
            return self.block();
        }

        if self.accept(Tok::Var)? {
            let a = self.var_dec_list(false)?;
            self.semicolon()?;
            return Ok(self.node(Kind::VarStmt, Some(a), None, None, None));
        }

        // empty statement
        if self.accept(Tok::Semi)? {
            return Ok(self.leaf(Kind::Nop));
        }

        if self.accept(Tok::If)? {
            self.expect(Tok::LParen)?;
            let a = self.expression(false)?;
            self.expect(Tok::RParen)?;
            let b = self.statement()?;
            let c = if self.accept(Tok::Else)? {
                Some(self.statement()?)
            } else {
                None
            };
            return Ok(self.node(Kind::If, Some(a), Some(b), c, None));
        }

        if self.accept(Tok::Do)? {
            let a = self.statement()?;
            self.expect(Tok::While)?;
            self.expect(Tok::LParen)?;
            let b = self.expression(false)?;
            self.expect(Tok::RParen)?;
            self.semicolon()?;
            return Ok(self.node(Kind::DoWhile, Some(a), Some(b), None, None));
        }

        if self.accept(Tok::While)? {
            self.expect(Tok::LParen)?;
            let a = self.expression(false)?;
            self.expect(Tok::RParen)?;
            let b = self.statement()?;
            return Ok(self.node(Kind::While, Some(a), Some(b), None, None));
        }

        if self.accept(Tok::For)? {
            return self.for_statement();
        }

        if self.accept(Tok::Continue)? {
            let a = self.identifier_opt()?;
            self.semicolon()?;
            return Ok(self.node(Kind::Continue, a, None, None, None));
        }

        if self.accept(Tok::Break)? {
            let a = self.identifier_opt()?;
            self.semicolon()?;
            return Ok(self.node(Kind::Break, a, None, None, None));
        }

        if self.accept(Tok::Return)? {
            // The return value must start on the same line as `return`.
            let a = if self.lex.lookahead != Tok::Semi
                && self.lex.lookahead != Tok::RBrace
                && self.lex.lookahead != Tok::Eof
                && !self.lex.newline
            {
                Some(self.expression(false)?)
            } else {
                None
            };
            self.semicolon()?;
            return Ok(self.node(Kind::Return, a, None, None, None));
        }

        if self.accept(Tok::With)? {
            self.expect(Tok::LParen)?;
            let a = self.expression(false)?;
            self.expect(Tok::RParen)?;
            let b = self.statement()?;
            return Ok(self.node(Kind::With, Some(a), Some(b), None, None));
        }

        if self.accept(Tok::Switch)? {
            self.expect(Tok::LParen)?;
            let a = self.expression(false)?;
            self.expect(Tok::RParen)?;
            self.expect(Tok::LBrace)?;
            let b = self.case_list()?;
            self.expect(Tok::RBrace)?;
            return Ok(self.node(Kind::Switch, Some(a), b, None, None));
        }

        if self.accept(Tok::Throw)? {
            let a = self.expression(false)?;
            self.semicolon()?;
            return Ok(self.node(Kind::Throw, Some(a), None, None, None));
        }

        if self.accept(Tok::Try)? {
            let a = self.block()?;
            let mut b = None;
            let mut c = None;
            let mut d = None;
            if self.accept(Tok::Catch)? {
                self.expect(Tok::LParen)?;
                b = Some(self.identifier()?);
                self.expect(Tok::RParen)?;
                c = Some(self.block()?);
            }
            if self.accept(Tok::Finally)? {
                d = Some(self.block()?);
            }
            if b.is_none() && d.is_none() {
                return self.error(format!(
                    "unexpected token in try: {} (expected 'catch' or 'finally')",
                    self.lex.lookahead
                ));
            }
            return Ok(self.node(Kind::Try, Some(a), b, c, d));
        }

        if self.accept(Tok::Debugger)? {
            self.semicolon()?;
            return Ok(self.leaf(Kind::Debugger));
        }

        if self.accept(Tok::Function)? {
            self.diagnostics
                .warning(self.lex.line, "function statements are not standard");
            return self.fun_stm();
        }

        // labelled statement or expression statement
        if self.lex.lookahead == Tok::Identifier {
            let a = self.expression(false)?;
            if self.arena[a].kind == Kind::Identifier && self.accept(Tok::Colon)? {
                let b = self.statement()?;
                return Ok(self.node(Kind::Label, Some(a), Some(b), None, None));
            }
            self.semicolon()?;
            return Ok(a);
        }

        // expression statement
        let a = self.expression(false)?;
        self.semicolon()?;
        Ok(a)
    }

    // Programs.

    fn script_element(&mut self) -> Result<NodeId> {
        if self.accept(Tok::Function)? {
            return self.fun_dec();
        }
        self.statement()
    }

    pub(super) fn script(&mut self, terminator: Tok) -> Result<Option<NodeId>> {
        if self.lex.lookahead == terminator {
            return Ok(None);
        }
        let first = self.script_element()?;
        let head = self.list(first);
        let mut tail = head;
        while self.lex.lookahead != terminator {
            let elem = self.script_element()?;
            let cell = self.list(elem);
            self.arena.set_b(tail, Some(cell));
            tail = cell;
        }
        Ok(Some(self.finish_list(head)))
    }
}
