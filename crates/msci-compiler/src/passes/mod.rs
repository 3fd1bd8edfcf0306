mod constants;
mod finalize;
mod generate;
mod indexer;
mod linker;
mod variables;
mod verify_commands;
mod verify_logic;
mod verify_termination;

use std::collections::{BTreeMap, BTreeSet};

use msci_core::{CompilerFault, ErrorArray, GameVersion, ScriptCommand};
use msci_parser::SyntaxTable;

use crate::objects::ObjectLibrary;
use crate::symbols::SymbolTable;
use crate::traversal::preorder;
use crate::tree::{CommandTree, NodeId};

/// Per-compile state shared by every pass.
pub struct PassContext<'a> {
    pub table: &'a SyntaxTable,
    pub version: GameVersion,
    pub arguments: &'a [String],
    pub object_library: Option<&'a ObjectLibrary>,
    pub errors: ErrorArray,
    pub symbols: SymbolTable,
    /// Label name to its definition node.
    pub labels: BTreeMap<String, NodeId>,
    pub standard_count: usize,
    pub commands: Vec<ScriptCommand>,
    pub(crate) iterator_counter: usize,
    pub(crate) used_names: BTreeSet<String>,
}

impl<'a> PassContext<'a> {
    pub fn new(
        table: &'a SyntaxTable,
        version: GameVersion,
        arguments: &'a [String],
        object_library: Option<&'a ObjectLibrary>,
    ) -> Self {
        Self {
            table,
            version,
            arguments,
            object_library,
            errors: ErrorArray::new(),
            symbols: SymbolTable::default(),
            labels: BTreeMap::new(),
            standard_count: 0,
            commands: Vec::new(),
            iterator_counter: 0,
            used_names: BTreeSet::new(),
        }
    }

    /// Records a diagnostic against `id` and flags the node.
    pub fn report(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        code: &str,
        message: impl Into<String>,
    ) {
        let node = tree.node_mut(id);
        node.has_error = true;
        self.errors
            .report(code, node.line(), message, node.command.display_text());
    }
}

/// One analysis or rewriting step over the command tree.
pub trait Visitor {
    fn visit_root(
        &mut self,
        _tree: &mut CommandTree,
        _context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        Ok(())
    }

    fn visit(
        &mut self,
        tree: &mut CommandTree,
        id: NodeId,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault>;

    fn finish(
        &mut self,
        _tree: &mut CommandTree,
        _context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        Ok(())
    }
}

/// Root visit, then every node in execution order, then `finish`.
pub fn run_visitor(
    visitor: &mut impl Visitor,
    tree: &mut CommandTree,
    context: &mut PassContext<'_>,
) -> Result<(), CompilerFault> {
    visitor.visit_root(tree, context)?;
    for id in preorder(tree) {
        visitor.visit(tree, id, context)?;
    }
    visitor.finish(tree, context)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    VariableIdentifier,
    ConstantIdentifier,
    CommandVerifier,
    LogicVerifier,
    TerminationVerifier,
    NodeIndexer,
    NodeLinker,
    LinkageFinalizer,
    CommandGenerator,
}

impl Pass {
    pub const ORDER: [Pass; 9] = [
        Self::VariableIdentifier,
        Self::ConstantIdentifier,
        Self::CommandVerifier,
        Self::LogicVerifier,
        Self::TerminationVerifier,
        Self::NodeIndexer,
        Self::NodeLinker,
        Self::LinkageFinalizer,
        Self::CommandGenerator,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::VariableIdentifier => "variable-identifier",
            Self::ConstantIdentifier => "constant-identifier",
            Self::CommandVerifier => "command-verifier",
            Self::LogicVerifier => "logic-verifier",
            Self::TerminationVerifier => "termination-verifier",
            Self::NodeIndexer => "node-indexer",
            Self::NodeLinker => "node-linker",
            Self::LinkageFinalizer => "linkage-finalizer",
            Self::CommandGenerator => "command-generator",
        }
    }

    pub fn run(
        self,
        tree: &mut CommandTree,
        context: &mut PassContext<'_>,
    ) -> Result<(), CompilerFault> {
        match self {
            Self::VariableIdentifier => {
                run_visitor(&mut variables::VariableIdentifier::default(), tree, context)
            }
            Self::ConstantIdentifier => {
                run_visitor(&mut constants::ConstantIdentifier, tree, context)
            }
            Self::CommandVerifier => {
                run_visitor(&mut verify_commands::CommandVerifier, tree, context)
            }
            Self::LogicVerifier => run_visitor(&mut verify_logic::LogicVerifier, tree, context),
            Self::TerminationVerifier => run_visitor(
                &mut verify_termination::TerminationVerifier,
                tree,
                context,
            ),
            Self::NodeIndexer => run_visitor(&mut indexer::NodeIndexer::default(), tree, context),
            Self::NodeLinker => run_visitor(&mut linker::NodeLinker::default(), tree, context),
            Self::LinkageFinalizer => {
                run_visitor(&mut finalize::LinkageFinalizer, tree, context)
            }
            Self::CommandGenerator => {
                run_visitor(&mut generate::CommandGenerator::default(), tree, context)
            }
        }
    }
}

/// Runs every pass in order. Script errors never stop the sequence.
pub fn run_all(tree: &mut CommandTree, context: &mut PassContext<'_>) -> Result<(), CompilerFault> {
    for pass in Pass::ORDER {
        let before = context.errors.len();
        pass.run(tree, context)?;
        tracing::debug!(
            pass = pass.name(),
            diagnostics = context.errors.len() - before,
            "pass finished"
        );
    }
    Ok(())
}
