//! Compiled functions and modules.

use indexmap::IndexSet;
use serde::Serialize;

/// Name given to functions compiled without one (function expressions and
/// the top-level script).
pub const ANONYMOUS: &str = "<anonymous>";

/// Index of a function within its [`Module`]'s function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FuncId(u32);

impl FuncId {
    #[inline]
    pub fn new(index: usize) -> Self {
        FuncId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One compiled function: its code words and the pools its operands index.
///
/// Pool indices embedded in `code` are valid for the pools at the moment of
/// emission; pools only grow, so they stay valid for the function's lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub name: String,
    pub num_params: u32,
    /// Opcode and operand words, in emission order. Always ends in `RETURN`.
    pub code: Vec<u32>,
    /// Nested functions, as ids into the owning module's function table.
    /// Not deduplicated; a named function references itself here.
    pub funs: Vec<FuncId>,
    /// Distinct numeric constants.
    pub nums: Vec<f64>,
    /// Distinct string constants, deduplicated by byte equality.
    pub strs: IndexSet<String>,
}

impl Function {
    pub fn new(name: impl Into<String>, num_params: u32) -> Self {
        Function {
            name: name.into(),
            num_params,
            code: Vec::with_capacity(256),
            funs: Vec::new(),
            nums: Vec::new(),
            strs: IndexSet::new(),
        }
    }

    /// Append a nested-function reference and return its pool index.
    pub fn add_fun(&mut self, id: FuncId) -> u32 {
        self.funs.push(id);
        (self.funs.len() - 1) as u32
    }

    /// Intern a numeric constant and return its pool index.
    ///
    /// Dedup is by raw `f64` equality: `0.0` and `-0.0` share one entry,
    /// and `NaN` never matches an existing entry, so repeated `NaN`
    /// constants accumulate.
    #[allow(clippy::float_cmp)]
    pub fn add_number(&mut self, value: f64) -> u32 {
        if let Some(i) = self.nums.iter().position(|&n| n == value) {
            return i as u32;
        }
        self.nums.push(value);
        (self.nums.len() - 1) as u32
    }

    /// Intern a string constant and return its pool index.
    pub fn add_string(&mut self, value: &str) -> u32 {
        if let Some(i) = self.strs.get_index_of(value) {
            return i as u32;
        }
        self.strs.insert_full(value.to_owned()).0 as u32
    }
}

/// A whole compilation: every function it produced, flat, plus the entry.
///
/// Nested functions reference each other by [`FuncId`] into this table
/// (including a named function referencing itself), so dropping the module
/// releases the entire compilation at once.
#[derive(Debug, Clone, Serialize)]
pub struct Module {
    pub functions: Vec<Function>,
    pub entry: FuncId,
}

impl Module {
    #[inline]
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn entry_function(&self) -> &Function {
        self.function(self.entry)
    }
}
