//! Lexer for Marten source text.
//!
//! `logos` derives the raw token recognizer; the [`Lexer`] wrapper owns the
//! one-token look-ahead state the parser observes (current token, line,
//! newline-before-token flag, identifier/string text, numeric value) and
//! handles what a context-free recognizer cannot: line accounting across
//! trivia, string unescaping, and the division-vs-regexp ambiguity.

use std::fmt;

use logos::Logos;

use crate::{Error, Result};

/// Regexp literal flag bits, stored in the lexeme `number` slot.
pub const REGEXP_GLOBAL: u32 = 1;
pub const REGEXP_IGNORECASE: u32 = 2;
pub const REGEXP_MULTILINE: u32 = 4;

/// Binary search in a sorted word table.
pub fn find_word(s: &str, table: &[&str]) -> Option<usize> {
    table.binary_search(&s).ok()
}

fn lex_block_comment(lex: &mut logos::Lexer<'_, Tok>) -> bool {
    // The span so far covers "/*"; extend it over the body and terminator.
    match lex.remainder().find("*/") {
        Some(i) => {
            lex.bump(i + 2);
            true
        }
        None => false,
    }
}

/// Token tags. Trivia variants (`Newline`, comments) never reach the
/// parser; `Regexp` and `Eof` are produced by the wrapper, not by logos.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\u{000B}\u{000C}\u{00A0}\u{FEFF}]+")]
pub enum Tok {
    #[token("\r\n")]
    #[token("\n")]
    #[token("\r")]
    Newline,
    #[regex(r"//[^\n\r]*", allow_greedy = true)]
    LineComment,
    #[token("/*", lex_block_comment)]
    BlockComment,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Identifier,
    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")]
    Number,
    #[regex(r#""(?:[^"\\\n\r]|\\\r\n|\\(?s:.))*""#)]
    #[regex(r#"'(?:[^'\\\n\r]|\\\r\n|\\(?s:.))*'"#)]
    String,
    Regexp,

    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("continue")]
    Continue,
    #[token("debugger")]
    Debugger,
    #[token("default")]
    Default,
    #[token("delete")]
    Delete,
    #[token("do")]
    Do,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("finally")]
    Finally,
    #[token("for")]
    For,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("in")]
    In,
    #[token("instanceof")]
    InstanceOf,
    #[token("new")]
    New,
    #[token("null")]
    Null,
    #[token("return")]
    Return,
    #[token("switch")]
    Switch,
    #[token("this")]
    This,
    #[token("throw")]
    Throw,
    #[token("true")]
    True,
    #[token("try")]
    Try,
    #[token("typeof")]
    Typeof,
    #[token("var")]
    Var,
    #[token("void")]
    Void,
    #[token("while")]
    While,
    #[token("with")]
    With,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    BangEqEq,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token(">>>")]
    UShr,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    #[token("<<=")]
    ShlAssign,
    #[token(">>=")]
    ShrAssign,
    #[token(">>>=")]
    UShrAssign,
    #[token("&=")]
    AmpAssign,
    #[token("|=")]
    PipeAssign,
    #[token("^=")]
    CaretAssign,

    Eof,
}

impl Tok {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            Tok::Break
                | Tok::Case
                | Tok::Catch
                | Tok::Continue
                | Tok::Debugger
                | Tok::Default
                | Tok::Delete
                | Tok::Do
                | Tok::Else
                | Tok::False
                | Tok::Finally
                | Tok::For
                | Tok::Function
                | Tok::If
                | Tok::In
                | Tok::InstanceOf
                | Tok::New
                | Tok::Null
                | Tok::Return
                | Tok::Switch
                | Tok::This
                | Tok::Throw
                | Tok::True
                | Tok::Try
                | Tok::Typeof
                | Tok::Var
                | Tok::Void
                | Tok::While
                | Tok::With
        )
    }
}

/// Human-readable token names for diagnostics.
impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tok::Newline => "line terminator",
            Tok::LineComment | Tok::BlockComment => "comment",
            Tok::Identifier => "identifier",
            Tok::Number => "number",
            Tok::String => "string",
            Tok::Regexp => "regexp",
            Tok::Eof => "end of file",
            Tok::Break => "'break'",
            Tok::Case => "'case'",
            Tok::Catch => "'catch'",
            Tok::Continue => "'continue'",
            Tok::Debugger => "'debugger'",
            Tok::Default => "'default'",
            Tok::Delete => "'delete'",
            Tok::Do => "'do'",
            Tok::Else => "'else'",
            Tok::False => "'false'",
            Tok::Finally => "'finally'",
            Tok::For => "'for'",
            Tok::Function => "'function'",
            Tok::If => "'if'",
            Tok::In => "'in'",
            Tok::InstanceOf => "'instanceof'",
            Tok::New => "'new'",
            Tok::Null => "'null'",
            Tok::Return => "'return'",
            Tok::Switch => "'switch'",
            Tok::This => "'this'",
            Tok::Throw => "'throw'",
            Tok::True => "'true'",
            Tok::Try => "'try'",
            Tok::Typeof => "'typeof'",
            Tok::Var => "'var'",
            Tok::Void => "'void'",
            Tok::While => "'while'",
            Tok::With => "'with'",
            Tok::LBrace => "'{'",
            Tok::RBrace => "'}'",
            Tok::LParen => "'('",
            Tok::RParen => "')'",
            Tok::LBracket => "'['",
            Tok::RBracket => "']'",
            Tok::Semi => "';'",
            Tok::Comma => "','",
            Tok::Dot => "'.'",
            Tok::Colon => "':'",
            Tok::Question => "'?'",
            Tok::Lt => "'<'",
            Tok::Gt => "'>'",
            Tok::LtEq => "'<='",
            Tok::GtEq => "'>='",
            Tok::EqEq => "'=='",
            Tok::BangEq => "'!='",
            Tok::EqEqEq => "'==='",
            Tok::BangEqEq => "'!=='",
            Tok::Plus => "'+'",
            Tok::Minus => "'-'",
            Tok::Star => "'*'",
            Tok::Slash => "'/'",
            Tok::Percent => "'%'",
            Tok::PlusPlus => "'++'",
            Tok::MinusMinus => "'--'",
            Tok::Shl => "'<<'",
            Tok::Shr => "'>>'",
            Tok::UShr => "'>>>'",
            Tok::Amp => "'&'",
            Tok::Pipe => "'|'",
            Tok::Caret => "'^'",
            Tok::Bang => "'!'",
            Tok::Tilde => "'~'",
            Tok::AmpAmp => "'&&'",
            Tok::PipePipe => "'||'",
            Tok::Assign => "'='",
            Tok::PlusAssign => "'+='",
            Tok::MinusAssign => "'-='",
            Tok::StarAssign => "'*='",
            Tok::SlashAssign => "'/='",
            Tok::PercentAssign => "'%='",
            Tok::ShlAssign => "'<<='",
            Tok::ShrAssign => "'>>='",
            Tok::UShrAssign => "'>>>='",
            Tok::AmpAssign => "'&='",
            Tok::PipeAssign => "'|='",
            Tok::CaretAssign => "'^='",
        };
        f.write_str(s)
    }
}

/// One-token look-ahead over a source string.
///
/// The parser reads `lookahead`, `line`, `newline` and the lexeme scratch
/// (`text`, `number`) directly and advances with [`Lexer::next`].
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, Tok>,
    filename: String,
    pub(crate) lookahead: Tok,
    /// Lexeme text of the current identifier, keyword, string or regexp.
    pub(crate) text: String,
    /// Numeric value of the current number token, or regexp flag bits.
    pub(crate) number: f64,
    /// 1-based line the current token starts on.
    pub(crate) line: u32,
    /// A line terminator occurred between the previous token and this one.
    pub(crate) newline: bool,
    /// Previously produced token, for regexp-context decisions.
    last: Option<Tok>,
    /// Running line counter, one ahead of `line` while scanning trivia.
    next_line: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(filename: &str, source: &'src str) -> Self {
        Lexer {
            inner: Tok::lexer(source),
            filename: filename.to_owned(),
            lookahead: Tok::Eof,
            text: String::new(),
            number: 0.0,
            line: 1,
            newline: false,
            last: None,
            next_line: 1,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn lookahead(&self) -> Tok {
        self.lookahead
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            filename: self.filename.clone(),
            line: self.line,
            message: message.into(),
        }
    }

    /// Advance to the next significant token.
    pub(crate) fn next(&mut self) -> Result<()> {
        self.newline = false;
        loop {
            let Some(raw) = self.inner.next() else {
                self.line = self.next_line;
                self.set(Tok::Eof);
                return Ok(());
            };
            let raw = match raw {
                Ok(t) => t,
                Err(()) => {
                    self.line = self.next_line;
                    return Err(self.lex_error());
                }
            };
            match raw {
                Tok::Newline => {
                    self.next_line += 1;
                    self.newline = true;
                }
                Tok::LineComment => {}
                Tok::BlockComment => {
                    let lines = count_newlines(self.inner.slice());
                    if lines > 0 {
                        self.next_line += lines;
                        self.newline = true;
                    }
                }
                Tok::Slash | Tok::SlashAssign if self.regexp_context() => {
                    self.line = self.next_line;
                    self.lex_regexp(raw == Tok::SlashAssign)?;
                    return Ok(());
                }
                tok => {
                    self.line = self.next_line;
                    self.read_payload(tok)?;
                    self.set(tok);
                    return Ok(());
                }
            }
        }
    }

    fn set(&mut self, tok: Tok) {
        self.lookahead = tok;
        self.last = Some(tok);
    }

    /// A `/` starts a regexp unless the previous token could end an
    /// expression, in which case it is division.
    fn regexp_context(&self) -> bool {
        !matches!(
            self.last,
            Some(
                Tok::Identifier
                    | Tok::Number
                    | Tok::String
                    | Tok::Regexp
                    | Tok::This
                    | Tok::Null
                    | Tok::True
                    | Tok::False
                    | Tok::RParen
                    | Tok::RBracket
                    | Tok::RBrace
                    | Tok::PlusPlus
                    | Tok::MinusMinus
            )
        )
    }

    fn lex_error(&self) -> Error {
        let slice = self.inner.slice();
        if slice.starts_with("/*") {
            self.error("unterminated comment")
        } else if slice.starts_with('"') || slice.starts_with('\'') {
            self.error("unterminated string")
        } else {
            self.error(format!("unexpected character {:?}", slice))
        }
    }

    fn read_payload(&mut self, tok: Tok) -> Result<()> {
        match tok {
            Tok::Identifier => self.text = self.inner.slice().to_owned(),
            Tok::Number => self.number = parse_number(self.inner.slice()),
            Tok::String => {
                let slice = self.inner.slice();
                let (text, lines) = self.unescape_string(slice)?;
                self.text = text;
                self.next_line += lines;
            }
            t if t.is_keyword() => self.text = self.inner.slice().to_owned(),
            _ => {}
        }
        Ok(())
    }

    fn unescape_string(&self, slice: &str) -> Result<(String, u32)> {
        let inner = &slice[1..slice.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut lines = 0;
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            let Some(e) = chars.next() else { break };
            match e {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'v' => out.push('\u{b}'),
                '0' => out.push('\0'),
                'x' => out.push(self.hex_escape(&mut chars, 2)?),
                'u' => out.push(self.hex_escape(&mut chars, 4)?),
                // Escaped line terminators continue the string.
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    lines += 1;
                }
                '\n' => lines += 1,
                other => out.push(other),
            }
        }
        Ok((out, lines))
    }

    fn hex_escape(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        digits: u32,
    ) -> Result<char> {
        let mut value = 0;
        for _ in 0..digits {
            let d = chars
                .next()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("malformed escape sequence"))?;
            value = value * 16 + d;
        }
        char::from_u32(value).ok_or_else(|| self.error("malformed escape sequence"))
    }

    /// Scan a regexp literal. The leading `/` (or `/=`, whose `=` belongs
    /// to the pattern) has already been consumed by logos; the body and
    /// flags are taken from the remainder by hand.
    fn lex_regexp(&mut self, leading_eq: bool) -> Result<()> {
        let mut body = String::new();
        if leading_eq {
            body.push('=');
        }
        let rest = self.inner.remainder();
        let mut iter = rest.char_indices();
        let mut in_class = false;
        let body_end;
        loop {
            let Some((i, c)) = iter.next() else {
                return Err(self.error("unterminated regular expression"));
            };
            match c {
                '\n' | '\r' => return Err(self.error("unterminated regular expression")),
                '\\' => {
                    let Some((_, e)) = iter.next() else {
                        return Err(self.error("unterminated regular expression"));
                    };
                    if e == '\n' || e == '\r' {
                        return Err(self.error("unterminated regular expression"));
                    }
                    body.push('\\');
                    body.push(e);
                }
                '[' => {
                    in_class = true;
                    body.push(c);
                }
                ']' => {
                    in_class = false;
                    body.push(c);
                }
                '/' if !in_class => {
                    body_end = i + 1;
                    break;
                }
                _ => body.push(c),
            }
        }

        let mut flags = 0;
        let mut flags_len = 0;
        for c in rest[body_end..].chars() {
            let bit = match c {
                'g' => REGEXP_GLOBAL,
                'i' => REGEXP_IGNORECASE,
                'm' => REGEXP_MULTILINE,
                _ => break,
            };
            if flags & bit != 0 {
                return Err(self.error("duplicated flag in regular expression"));
            }
            flags |= bit;
            flags_len += c.len_utf8();
        }

        self.inner.bump(body_end + flags_len);
        self.text = body;
        self.number = flags as f64;
        self.set(Tok::Regexp);
        Ok(())
    }
}

fn count_newlines(s: &str) -> u32 {
    // \r\n pairs count once; lone \r and \n count once each.
    let mut n = 0;
    let mut prev_cr = false;
    for b in s.bytes() {
        match b {
            b'\r' => {
                n += 1;
                prev_cr = true;
            }
            b'\n' => {
                if !prev_cr {
                    n += 1;
                }
                prev_cr = false;
            }
            _ => prev_cr = false,
        }
    }
    n
}

fn parse_number(slice: &str) -> f64 {
    if let Some(hex) = slice.strip_prefix("0x").or_else(|| slice.strip_prefix("0X")) {
        // Accumulate in floating point so long literals saturate instead
        // of overflowing.
        let mut value = 0.0;
        for c in hex.chars() {
            value = value * 16.0 + c.to_digit(16).unwrap_or(0) as f64;
        }
        return value;
    }
    slice.parse().expect("number token matches f64 grammar")
}
