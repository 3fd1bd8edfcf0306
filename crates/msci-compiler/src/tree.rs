use std::fmt::Write as _;

use msci_core::{
    BranchLogic, CommandOrigin, CommandType, Conditional, ErrorToken, Extent, ReturnValue,
};
use msci_parser::{command_ids, ParsedCommand, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Structural jump target resolved by the linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    Node(NodeId),
    EndOfScript,
}

#[derive(Debug, Clone)]
pub struct CommandNode {
    pub command: ParsedCommand,
    pub origin: CommandOrigin,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub has_error: bool,
    /// Diagnostic produced while matching the source line.
    pub parse_error: Option<ErrorToken>,
    /// Header of the macro this node was generated from.
    pub macro_header: Option<NodeId>,
    pub postfix: Vec<Token>,
    pub target: Option<JumpTarget>,
    pub index: Option<u16>,
    pub return_value: Option<ReturnValue>,
    pub jump_destination: Option<u16>,
}

impl CommandNode {
    fn new(command: ParsedCommand, origin: CommandOrigin) -> Self {
        Self {
            command,
            origin,
            parent: None,
            children: Vec::new(),
            has_error: false,
            parse_error: None,
            macro_header: None,
            postfix: Vec::new(),
            target: None,
            index: None,
            return_value: None,
            jump_destination: None,
        }
    }

    pub fn line(&self) -> usize {
        self.command.line_number
    }

    pub fn syntax_id(&self) -> u32 {
        self.command.syntax_id
    }

    /// Branch role used for nesting and linking. Macro headers only keep
    /// theirs for display.
    pub fn logic(&self) -> BranchLogic {
        if self.origin == CommandOrigin::MacroHeader {
            return BranchLogic::Nop;
        }
        self.command.branch_logic
    }

    pub fn is_standard(&self) -> bool {
        self.command.command_type == CommandType::Standard
    }

    /// Executed code: standard and not commented out.
    pub fn is_live(&self) -> bool {
        self.is_standard() && !self.command.commented
    }

    pub fn is(&self, syntax_id: u32) -> bool {
        !self.command.commented && self.command.syntax_id == syntax_id
    }
}

/// Arena of command nodes under a synthetic root.
#[derive(Debug, Clone)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl Default for CommandTree {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![CommandNode::new(
                ParsedCommand::nop(0),
                CommandOrigin::Source,
            )],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CommandNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Allocates a node without attaching it.
    pub fn create(&mut self, command: ParsedCommand, origin: CommandOrigin) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode::new(command, origin));
        id
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert(&mut self, parent: NodeId, position: usize, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let position = position.min(children.len());
        children.insert(position, child);
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        command: ParsedCommand,
        origin: CommandOrigin,
    ) -> NodeId {
        let id = self.create(command, origin);
        self.append(parent, id);
        id
    }

    /// Detaches and returns all children of `id`.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.nodes[child.0].parent = None;
        }
        children
    }

    pub fn position_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|child| *child == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let position = self.position_in_parent(id)?;
        position
            .checked_sub(1)
            .map(|previous| self.children(parent)[previous])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let position = self.position_in_parent(id)?;
        self.children(parent).get(position + 1).copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    /// Whether the block ends with its own `end`.
    pub fn is_closed_by_end(&self, id: NodeId) -> bool {
        self.last_child(id)
            .is_some_and(|last| self.node(last).logic() == BranchLogic::End)
    }

    /// Indented outline of the tree for trace logging.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(self.root(), 0, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, depth: usize, out: &mut String) {
        for child in self.children(id) {
            let node = self.node(*child);
            let _ = writeln!(
                out,
                "{}[{}] {:?} {:?} {}",
                "  ".repeat(depth),
                node.line(),
                node.origin,
                node.logic(),
                node.command.display_text()
            );
            self.dump_into(*child, depth + 1, out);
        }
    }
}

fn hidden_jump(line_number: usize) -> ParsedCommand {
    ParsedCommand {
        line_number,
        syntax_id: command_ids::HIDDEN_JUMP,
        conditional: Conditional::Discard,
        branch_logic: BranchLogic::None,
        command_type: CommandType::Standard,
        commented: false,
        parameters: Vec::new(),
        text: String::new(),
        extent: Extent::default(),
    }
}

/// Nests a flat command list under its branch parents.
///
/// Mismatched `else`/`end` commands are kept as plain children so that the
/// tree stays traversable; logic verification reports them.
pub fn build_tree(commands: Vec<(ParsedCommand, Option<ErrorToken>)>) -> CommandTree {
    let mut tree = CommandTree::new();
    let mut stack = vec![tree.root()];

    for (command, parse_error) in commands {
        let logic = command.branch_logic;
        let line = command.line_number;
        let id = tree.create(command, CommandOrigin::Source);
        tree.node_mut(id).parse_error = parse_error;

        match logic {
            BranchLogic::Else | BranchLogic::ElseIf => {
                close_pending_skip(&tree, &mut stack);
                let top = top_of(&stack, &tree);
                if stack.len() > 1 && tree.node(top).logic().is_conditional_branch() {
                    let jump = tree.create(hidden_jump(line), CommandOrigin::HiddenJump);
                    tree.append(top, jump);
                    stack.pop();
                    let parent = top_of(&stack, &tree);
                    tree.append(parent, id);
                    stack.push(id);
                } else {
                    tree.append(top, id);
                }
            }
            BranchLogic::End => {
                close_pending_skip(&tree, &mut stack);
                let top = top_of(&stack, &tree);
                if stack.len() > 1 {
                    if tree.node(top).logic() == BranchLogic::While {
                        let jump = tree.create(hidden_jump(line), CommandOrigin::HiddenJump);
                        tree.append(top, jump);
                    }
                    tree.append(top, id);
                    stack.pop();
                } else {
                    tree.append(top, id);
                }
            }
            _ => {
                let parent = top_of(&stack, &tree);
                tree.append(parent, id);
                let consumes_skip = tree.node(id).is_standard();
                if consumes_skip && tree.node(parent).logic() == BranchLogic::SkipIf {
                    stack.pop();
                }
                if logic.opens_block() || logic == BranchLogic::SkipIf {
                    stack.push(id);
                }
            }
        }
    }

    tree
}

fn top_of(stack: &[NodeId], tree: &CommandTree) -> NodeId {
    stack.last().copied().unwrap_or_else(|| tree.root())
}

fn close_pending_skip(tree: &CommandTree, stack: &mut Vec<NodeId>) {
    while stack.len() > 1 {
        let top = top_of(stack, tree);
        if tree.node(top).logic() != BranchLogic::SkipIf {
            break;
        }
        stack.pop();
    }
}

#[cfg(test)]
mod tree_tests {
    use super::*;
    use msci_core::GameVersion;
    use msci_parser::{parse_line, SyntaxTable};

    fn tree_from(lines: &[&str]) -> CommandTree {
        let table = SyntaxTable::builtin();
        let commands = lines
            .iter()
            .enumerate()
            .map(|(offset, line)| parse_line(line, offset + 1, &table, GameVersion::default()))
            .collect();
        build_tree(commands)
    }

    fn texts(tree: &CommandTree, id: NodeId) -> Vec<String> {
        tree.children(id)
            .iter()
            .map(|child| {
                let node = tree.node(*child);
                if node.origin == CommandOrigin::HiddenJump {
                    "<jump>".to_string()
                } else {
                    node.command.text.clone()
                }
            })
            .collect()
    }

    #[test]
    fn if_body_nests_under_if_and_end_closes_it() {
        let tree = tree_from(&["if $a == 1", "  $b = 2", "end"]);
        assert_eq!(texts(&tree, tree.root()), vec!["if $a == 1"]);
        let branch = tree.children(tree.root())[0];
        assert_eq!(texts(&tree, branch), vec!["$b = 2", "end"]);
        assert!(tree.is_closed_by_end(branch));
    }

    #[test]
    fn else_closes_branch_with_hidden_jump() {
        let tree = tree_from(&["if $a", "$b = 1", "else if $c", "$b = 2", "else", "$b = 3", "end"]);
        assert_eq!(texts(&tree, tree.root()), vec!["if $a", "else if $c", "else"]);
        let [first, second, last] = tree.children(tree.root()) else {
            panic!("expected three chain nodes");
        };
        assert_eq!(texts(&tree, *first), vec!["$b = 1", "<jump>"]);
        assert_eq!(texts(&tree, *second), vec!["$b = 2", "<jump>"]);
        assert_eq!(texts(&tree, *last), vec!["$b = 3", "end"]);
    }

    #[test]
    fn while_end_gets_backward_jump_before_end() {
        let tree = tree_from(&["while $a", "dec $a =", "end"]);
        let loop_head = tree.children(tree.root())[0];
        assert_eq!(texts(&tree, loop_head), vec!["dec $a =", "<jump>", "end"]);
    }

    #[test]
    fn skip_if_owns_exactly_one_standard_command() {
        let tree = tree_from(&["skip if $a", "* note", "$b = 1", "$c = 2"]);
        assert_eq!(texts(&tree, tree.root()), vec!["skip if $a", "$c = 2"]);
        let skip = tree.children(tree.root())[0];
        assert_eq!(texts(&tree, skip), vec!["note", "$b = 1"]);
    }

    #[test]
    fn skip_if_yields_to_end() {
        let tree = tree_from(&["if $a", "skip if $b", "end", "$c = 1"]);
        let branch = tree.children(tree.root())[0];
        assert_eq!(texts(&tree, branch), vec!["skip if $b", "end"]);
        assert_eq!(texts(&tree, tree.root()), vec!["if $a", "$c = 1"]);
    }

    #[test]
    fn stray_else_and_end_stay_in_tree() {
        let tree = tree_from(&["else", "end", "$a = 1"]);
        assert_eq!(texts(&tree, tree.root()), vec!["else", "end", "$a = 1"]);
    }

    #[test]
    fn dump_lists_every_node() {
        let tree = tree_from(&["if $a", "$b = 1", "end"]);
        let dump = tree.dump();
        assert_eq!(dump.lines().count(), 3);
        assert!(dump.contains("$b = 1"));
    }
}
