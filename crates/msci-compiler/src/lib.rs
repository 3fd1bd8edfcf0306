mod expression;
mod format;
mod indentation;
mod macro_expand;
mod objects;
mod passes;
mod pipeline;
mod symbols;
mod traversal;
mod tree;

pub use expression::{to_postfix, ExpressionError};
pub use format::{format_script, render_compiled};
pub use indentation::IndentationStack;
pub use macro_expand::expand_macros;
pub use objects::ObjectLibrary;
pub use passes::{run_all, run_visitor, Pass, PassContext, Visitor};
pub use pipeline::{compile, CompileOptions, CompileOutput, CompiledScript, DEFAULT_INDENT_WIDTH};
pub use symbols::{Symbol, SymbolTable};
pub use traversal::{preorder, walk, BreadthFirst, DepthFirst, Traversal, TreeIterator};
pub use tree::{build_tree, CommandNode, CommandTree, JumpTarget, NodeId};

/// Variable names starting with this prefix belong to the compiler.
pub const INTERNAL_RESERVED_NAME_PREFIX: &str = "__";
