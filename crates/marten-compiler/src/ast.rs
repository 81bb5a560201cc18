//! Syntax tree arena and node model.
//!
//! Nodes are a uniform record: a kind tag, up to four ordered child slots
//! whose meaning depends on the kind, a source line, literal payloads, and
//! a weak parent link. Lists (arguments, parameters, statements, variable
//! declarations, initialiser elements) are right-leaning cons cells of
//! kind [`Kind::List`]: the element in slot `a`, the tail in slot `b`.
//!
//! All nodes of one parse live in a single [`Arena`] vector; [`NodeId`]s
//! index into it and stay stable until the owning [`Ast`] is dropped,
//! which releases every node at once. Parent links are informational only;
//! the arena is the sole owner.

use std::fmt::Write as _;
use std::ops::Index;

use marten_bytecode::format_number;

use crate::diagnostics::Diagnostics;
use crate::lexer::{REGEXP_GLOBAL, REGEXP_IGNORECASE, REGEXP_MULTILINE};

/// Node kinds. Slot meaning per kind follows the grammar: for a binary
/// operator `a`/`b` are the operands, for `If` they are condition, then
/// branch and else branch, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Cons cell: element in `a`, tail cell in `b`.
    List,
    /// Hoistable function declaration: name, parameters, body.
    Fundec,

    Identifier,
    Number,
    String,
    Regexp,

    Undef,
    Null,
    True,
    False,
    This,

    /// Array literal: element list in `a`.
    Array,
    /// Object literal: property list in `a`.
    Object,
    /// `name: value` property.
    PropVal,
    /// `get name() body` property.
    PropGet,
    /// `set name(arg) body` property.
    PropSet,

    /// `a[b]`.
    Index,
    /// `a.b`.
    Member,
    /// Call: callee in `a`, argument list in `b`.
    Call,
    /// `new`: constructor in `a`, argument list in `b`.
    New,
    /// Function expression: optional name, parameters, body.
    Fun,

    Delete,
    Void,
    Typeof,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Pos,
    Neg,
    BitNot,
    LogNot,

    LogOr,
    LogAnd,
    BitOr,
    BitXor,
    BitAnd,

    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Gt,
    Le,
    Ge,
    InstanceOf,
    In,

    Shl,
    Shr,
    Ushr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    /// Ternary: condition, then value, else value.
    Cond,
    Comma,

    Assign,
    AssignMul,
    AssignDiv,
    AssignMod,
    AssignAdd,
    AssignSub,
    AssignShl,
    AssignShr,
    AssignUshr,
    AssignBitAnd,
    AssignBitXor,
    AssignBitOr,

    /// One declarator of a `var` list: name in `a`, initialiser in `b`.
    VarDecl,

    Block,
    Nop,
    /// `var` statement: declarator list in `a`.
    VarStmt,
    If,
    DoWhile,
    While,
    For,
    ForVar,
    ForIn,
    ForInVar,
    Continue,
    Break,
    Return,
    With,
    Switch,
    Case,
    Default,
    Throw,
    Try,
    Label,
    Debugger,
}

/// Index of a node in its [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Uniform syntax-tree node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Kind,
    pub line: u32,
    pub a: Option<NodeId>,
    pub b: Option<NodeId>,
    pub c: Option<NodeId>,
    pub d: Option<NodeId>,
    /// Weak back-reference, maintained by the builder.
    pub parent: Option<NodeId>,
    /// Literal payload of `Number` nodes; regexp flag bits for `Regexp`.
    pub number: f64,
    /// Literal payload of `Identifier`/`String`/`Regexp` nodes.
    pub string: Option<Box<str>>,
}

impl Node {
    /// String payload, empty for nodes without one.
    #[inline]
    pub fn text(&self) -> &str {
        self.string.as_deref().unwrap_or("")
    }
}

/// Flat owner of every node allocated during one parse.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Arena::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Allocate a node, wiring the parent links of its children.
    pub(crate) fn add(
        &mut self,
        kind: Kind,
        line: u32,
        a: Option<NodeId>,
        b: Option<NodeId>,
        c: Option<NodeId>,
        d: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            kind,
            line,
            a,
            b,
            c,
            d,
            parent: None,
            number: 0.0,
            string: None,
        });
        for child in [a, b, c, d].into_iter().flatten() {
            self.nodes[child.index()].parent = Some(id);
        }
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Raw tail link assignment used while growing a list; parent links
    /// are fixed up afterwards in one pass.
    pub(crate) fn set_b(&mut self, id: NodeId, b: Option<NodeId>) {
        self.nodes[id.index()].b = b;
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id.index()].parent = parent;
    }
}

impl Index<NodeId> for Arena {
    type Output = Node;

    #[inline]
    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

/// A parsed program: the arena, the root statement list (`None` for an
/// empty program), and any warnings produced while parsing.
#[derive(Debug)]
pub struct Ast {
    pub(crate) arena: Arena,
    pub(crate) root: Option<NodeId>,
    pub(crate) filename: String,
    pub diagnostics: Diagnostics,
}

impl Ast {
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Render the tree, one node per line, children indented two spaces.
    /// List chains print as a single `List` header over their elements.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if let Some(root) = self.root {
            dump_node(&self.arena, root, 0, &mut out);
        }
        out
    }
}

fn dump_node(arena: &Arena, id: NodeId, depth: usize, out: &mut String) {
    let node = &arena[id];
    for _ in 0..depth {
        out.push_str("  ");
    }
    match node.kind {
        Kind::List => {
            out.push_str("List\n");
            let mut cell = Some(id);
            while let Some(c) = cell {
                if let Some(elem) = arena[c].a {
                    dump_node(arena, elem, depth + 1, out);
                }
                cell = arena[c].b;
            }
        }
        Kind::Identifier => {
            writeln!(out, "Identifier {:?}", node.text()).unwrap();
        }
        Kind::String => {
            writeln!(out, "String {:?}", node.text()).unwrap();
        }
        Kind::Number => {
            writeln!(out, "Number {}", format_number(node.number)).unwrap();
        }
        Kind::Regexp => {
            writeln!(out, "Regexp /{}/{}", node.text(), flags_str(node.number as u32)).unwrap();
        }
        kind => {
            writeln!(out, "{:?}", kind).unwrap();
            for child in [node.a, node.b, node.c, node.d].into_iter().flatten() {
                dump_node(arena, child, depth + 1, out);
            }
        }
    }
}

fn flags_str(flags: u32) -> String {
    let mut s = String::new();
    if flags & REGEXP_GLOBAL != 0 {
        s.push('g');
    }
    if flags & REGEXP_IGNORECASE != 0 {
        s.push('i');
    }
    if flags & REGEXP_MULTILINE != 0 {
        s.push('m');
    }
    s
}
