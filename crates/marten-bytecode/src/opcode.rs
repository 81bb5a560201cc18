//! Stack-machine instruction set.
//!
//! Code is a linear sequence of unsigned words. Each opcode occupies one
//! word; an opcode that takes an operand is followed by exactly one inline
//! operand word. Operand interpretation is per-opcode (see [`OperandKind`]).

use serde::Serialize;

/// What the inline operand word of an opcode refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand word follows.
    None,
    /// Index into the owning function's number pool.
    Number,
    /// Index into the owning function's string pool.
    Str,
    /// Index into the owning function's nested-function pool.
    Func,
    /// A plain integer: argument count, dense array index, jump target,
    /// or (for `ObjectPut`) an index whose pool depends on the emitted key.
    Raw,
}

/// One instruction tag. The `u32` value of a variant is its code word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u32)]
pub enum Opcode {
    Pop,
    Dup,

    Undef,
    Null,
    True,
    False,
    This,

    Number,
    String,
    Closure,

    NewArray,
    NewObject,
    ArrayPut,
    ObjectPut,

    FunDec,
    VarDec,

    LoadVar,
    AVar,
    LoadIndex,
    AIndex,
    LoadMember,
    AMember,
    Load,
    Store,
    Delete,

    PreInc,
    PreDec,
    PostInc,
    PostDec,

    Call,
    New,

    Typeof,
    Pos,
    Neg,
    BitNot,
    LogNot,

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

    Jump,
    JTrue,
    JFalse,

    With,
    EndWith,

    Throw,
    Debugger,
    Return,
}

/// Every opcode in declaration (and therefore numeric) order.
const ALL: &[Opcode] = &[
    Opcode::Pop,
    Opcode::Dup,
    Opcode::Undef,
    Opcode::Null,
    Opcode::True,
    Opcode::False,
    Opcode::This,
    Opcode::Number,
    Opcode::String,
    Opcode::Closure,
    Opcode::NewArray,
    Opcode::NewObject,
    Opcode::ArrayPut,
    Opcode::ObjectPut,
    Opcode::FunDec,
    Opcode::VarDec,
    Opcode::LoadVar,
    Opcode::AVar,
    Opcode::LoadIndex,
    Opcode::AIndex,
    Opcode::LoadMember,
    Opcode::AMember,
    Opcode::Load,
    Opcode::Store,
    Opcode::Delete,
    Opcode::PreInc,
    Opcode::PreDec,
    Opcode::PostInc,
    Opcode::PostDec,
    Opcode::Call,
    Opcode::New,
    Opcode::Typeof,
    Opcode::Pos,
    Opcode::Neg,
    Opcode::BitNot,
    Opcode::LogNot,
    Opcode::BitOr,
    Opcode::BitXor,
    Opcode::BitAnd,
    Opcode::Eq,
    Opcode::Ne,
    Opcode::StrictEq,
    Opcode::StrictNe,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Le,
    Opcode::Ge,
    Opcode::InstanceOf,
    Opcode::In,
    Opcode::Shl,
    Opcode::Shr,
    Opcode::Ushr,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Jump,
    Opcode::JTrue,
    Opcode::JFalse,
    Opcode::With,
    Opcode::EndWith,
    Opcode::Throw,
    Opcode::Debugger,
    Opcode::Return,
];

impl Opcode {
    /// Decode a code word back into an opcode tag.
    #[inline]
    pub fn from_u32(word: u32) -> Option<Opcode> {
        ALL.get(word as usize).copied()
    }

    /// Uppercase mnemonic used in listings.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Pop => "POP",
            Opcode::Dup => "DUP",
            Opcode::Undef => "UNDEF",
            Opcode::Null => "NULL",
            Opcode::True => "TRUE",
            Opcode::False => "FALSE",
            Opcode::This => "THIS",
            Opcode::Number => "NUMBER",
            Opcode::String => "STRING",
            Opcode::Closure => "CLOSURE",
            Opcode::NewArray => "NEWARRAY",
            Opcode::NewObject => "NEWOBJECT",
            Opcode::ArrayPut => "ARRAYPUT",
            Opcode::ObjectPut => "OBJECTPUT",
            Opcode::FunDec => "FUNDEC",
            Opcode::VarDec => "VARDEC",
            Opcode::LoadVar => "LOADVAR",
            Opcode::AVar => "AVAR",
            Opcode::LoadIndex => "LOADINDEX",
            Opcode::AIndex => "AINDEX",
            Opcode::LoadMember => "LOADMEMBER",
            Opcode::AMember => "AMEMBER",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Delete => "DELETE",
            Opcode::PreInc => "PREINC",
            Opcode::PreDec => "PREDEC",
            Opcode::PostInc => "POSTINC",
            Opcode::PostDec => "POSTDEC",
            Opcode::Call => "CALL",
            Opcode::New => "NEW",
            Opcode::Typeof => "TYPEOF",
            Opcode::Pos => "POS",
            Opcode::Neg => "NEG",
            Opcode::BitNot => "BITNOT",
            Opcode::LogNot => "LOGNOT",
            Opcode::BitOr => "BITOR",
            Opcode::BitXor => "BITXOR",
            Opcode::BitAnd => "BITAND",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::StrictEq => "STRICTEQ",
            Opcode::StrictNe => "STRICTNE",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Le => "LE",
            Opcode::Ge => "GE",
            Opcode::InstanceOf => "INSTANCEOF",
            Opcode::In => "IN",
            Opcode::Shl => "SHL",
            Opcode::Shr => "SHR",
            Opcode::Ushr => "USHR",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Jump => "JUMP",
            Opcode::JTrue => "JTRUE",
            Opcode::JFalse => "JFALSE",
            Opcode::With => "WITH",
            Opcode::EndWith => "ENDWITH",
            Opcode::Throw => "THROW",
            Opcode::Debugger => "DEBUGGER",
            Opcode::Return => "RETURN",
        }
    }

    /// How to interpret the operand word, if any.
    pub fn operand_kind(self) -> OperandKind {
        match self {
            Opcode::Number => OperandKind::Number,
            Opcode::String
            | Opcode::FunDec
            | Opcode::VarDec
            | Opcode::LoadVar
            | Opcode::AVar
            | Opcode::LoadMember
            | Opcode::AMember => OperandKind::Str,
            Opcode::Closure => OperandKind::Func,
            Opcode::ArrayPut
            | Opcode::ObjectPut
            | Opcode::Call
            | Opcode::New
            | Opcode::Jump
            | Opcode::JTrue
            | Opcode::JFalse => OperandKind::Raw,
            _ => OperandKind::None,
        }
    }

    /// Whether an operand word follows this opcode.
    #[inline]
    pub fn has_operand(self) -> bool {
        self.operand_kind() != OperandKind::None
    }
}
