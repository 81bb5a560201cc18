//! Recursive-descent parser.
//!
//! One-token look-ahead over the [`Lexer`], building arena nodes bottom-up.
//! Every grammar function returns `Result`; nothing recovers locally, so
//! the first unexpected token unwinds straight out of [`Parser::parse`].
//!
//! Grammar functions are split across files: expressions (the precedence
//! ladder) in `expr.rs`, statements and functions in `stmt.rs`.

mod expr;
mod stmt;


use crate::ast::{Arena, Ast, Kind, NodeId};
use crate::diagnostics::Diagnostics;
use crate::lexer::{self, Lexer, Tok};
use crate::{Error, Result, fold};

const FUTURE_WORDS: &[&str] = &[
    "class", "const", "enum", "export", "extends", "import", "super",
];

const STRICT_FUTURE_WORDS: &[&str] = &[
    "implements",
    "interface",
    "let",
    "package",
    "private",
    "protected",
    "public",
    "static",
    "yield",
];

pub struct Parser<'src> {
    lex: Lexer<'src>,
    arena: Arena,
    strict: bool,
    diagnostics: Diagnostics,
}

impl<'src> Parser<'src> {
    pub fn new(filename: &str, source: &'src str) -> Self {
        Parser {
            lex: Lexer::new(filename, source),
            arena: Arena::new(),
            strict: false,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Tighten reserved-word rules (see `STRICT_FUTURE_WORDS`).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse the whole program and fold numeric constants.
    pub fn parse(self) -> Result<Ast> {
        let mut ast = self.parse_raw()?;
        fold::fold(&mut ast);
        Ok(ast)
    }

    /// Parse without the folding pass. Test hook.
    pub(crate) fn parse_raw(mut self) -> Result<Ast> {
        self.next()?;
        let root = self.script(Tok::Eof)?;
        Ok(Ast {
            arena: self.arena,
            root,
            filename: self.lex.filename().to_owned(),
            diagnostics: self.diagnostics,
        })
    }

    // Look-ahead plumbing.

    pub(super) fn next(&mut self) -> Result<()> {
        self.lex.next()
    }

    pub(super) fn accept(&mut self, t: Tok) -> Result<bool> {
        if self.lex.lookahead == t {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(super) fn expect(&mut self, t: Tok) -> Result<()> {
        if self.accept(t)? {
            return Ok(());
        }
        self.error(format!(
            "unexpected token: {} (expected {})",
            self.lex.lookahead, t
        ))
    }

    /// Consume a statement terminator, or infer one at `}`, end of input,
    /// or after a line terminator.
    pub(super) fn semicolon(&mut self) -> Result<()> {
        if self.lex.lookahead == Tok::Semi {
            return self.next();
        }
        if self.lex.newline || self.lex.lookahead == Tok::RBrace || self.lex.lookahead == Tok::Eof {
            return Ok(());
        }
        self.error(format!(
            "unexpected token: {} (expected ';')",
            self.lex.lookahead
        ))
    }

    pub(super) fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(Error::Syntax {
            filename: self.lex.filename().to_owned(),
            line: self.lex.line,
            message: message.into(),
        })
    }

    // Node construction.

    pub(super) fn node(
        &mut self,
        kind: Kind,
        a: Option<NodeId>,
        b: Option<NodeId>,
        c: Option<NodeId>,
        d: Option<NodeId>,
    ) -> NodeId {
        self.arena.add(kind, self.lex.line, a, b, c, d)
    }

    pub(super) fn leaf(&mut self, kind: Kind) -> NodeId {
        self.node(kind, None, None, None, None)
    }

    pub(super) fn str_node(&mut self, kind: Kind, text: &str) -> NodeId {
        let id = self.leaf(kind);
        self.arena.node_mut(id).string = Some(text.into());
        id
    }

    pub(super) fn num_node(&mut self, kind: Kind, value: f64) -> NodeId {
        let id = self.leaf(kind);
        self.arena.node_mut(id).number = value;
        id
    }

    /// New list cell holding `elem`.
    pub(super) fn list(&mut self, elem: NodeId) -> NodeId {
        self.node(Kind::List, Some(elem), None, None, None)
    }

    /// Fix up parent links along a freshly built list chain: each cell's
    /// parent is the cell before it.
    pub(super) fn finish_list(&mut self, head: NodeId) -> NodeId {
        let mut prev = head;
        let mut cell = self.arena[head].b;
        while let Some(c) = cell {
            self.arena.set_parent(c, Some(prev));
            prev = c;
            cell = self.arena[c].b;
        }
        head
    }

    // Identifiers.

    pub(super) fn check_future_word(&self, s: &str) -> Result<()> {
        if lexer::find_word(s, FUTURE_WORDS).is_some() {
            return self.error(format!("'{}' is a future reserved word", s));
        }
        if self.strict && lexer::find_word(s, STRICT_FUTURE_WORDS).is_some() {
            return self.error(format!("'{}' is a strict mode future reserved word", s));
        }
        Ok(())
    }

    pub(super) fn identifier(&mut self) -> Result<NodeId> {
        if self.lex.lookahead == Tok::Identifier {
            self.check_future_word(&self.lex.text)?;
            let text = self.lex.text.clone();
            let id = self.str_node(Kind::Identifier, &text);
            self.next()?;
            return Ok(id);
        }
        self.error(format!(
            "unexpected token: {} (expected identifier)",
            self.lex.lookahead
        ))
    }

    pub(super) fn identifier_opt(&mut self) -> Result<Option<NodeId>> {
        if self.lex.lookahead == Tok::Identifier {
            return Ok(Some(self.identifier()?));
        }
        Ok(None)
    }

    /// Identifier or keyword, used where the grammar allows property and
    /// member names to shadow reserved words.
    pub(super) fn identifier_name(&mut self) -> Result<NodeId> {
        if self.lex.lookahead == Tok::Identifier || self.lex.lookahead.is_keyword() {
            let text = self.lex.text.clone();
            let id = self.str_node(Kind::Identifier, &text);
            self.next()?;
            return Ok(id);
        }
        self.error(format!(
            "unexpected token: {} (expected identifier or keyword)",
            self.lex.lookahead
        ))
    }
}
