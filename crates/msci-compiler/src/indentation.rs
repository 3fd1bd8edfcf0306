use msci_core::{BranchLogic, CommandType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// Opened by `if`, `while`, `else` or `else if`; closed by a keyword.
    Block,
    /// Opened by `skip if`; closed by the next executed command.
    Skip,
}

/// Display depth of a command sequence, rebuilt one command at a time.
///
/// Call [`IndentationStack::pre_display`] before rendering a command and
/// [`IndentationStack::post_display`] after it.
#[derive(Debug, Clone)]
pub struct IndentationStack {
    levels: Vec<(usize, Level)>,
    within_subroutine: bool,
    width: usize,
}

impl IndentationStack {
    pub fn new(width: usize) -> Self {
        Self {
            levels: Vec::new(),
            within_subroutine: false,
            width,
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn within_subroutine(&self) -> bool {
        self.within_subroutine
    }

    /// Leading spaces for the command about to be displayed.
    pub fn indentation(&self) -> usize {
        (self.depth() + usize::from(self.within_subroutine)) * self.width
    }

    pub fn pre_display(&mut self, id: usize, logic: BranchLogic, ends_subroutine: bool) {
        if matches!(logic, BranchLogic::Else | BranchLogic::ElseIf | BranchLogic::End) {
            while matches!(self.levels.last(), Some((_, Level::Skip))) {
                self.levels.pop();
            }
            if self.levels.pop().is_none() {
                tracing::trace!(command = id, "closing keyword with nothing open");
            }
        }
        if ends_subroutine && self.levels.is_empty() {
            self.within_subroutine = false;
        }
    }

    pub fn post_display(
        &mut self,
        id: usize,
        logic: BranchLogic,
        command_type: CommandType,
        commented: bool,
        is_subroutine_header: bool,
    ) {
        let consumes_skip = (command_type == CommandType::Standard && !commented)
            || matches!(logic, BranchLogic::Break | BranchLogic::Continue);
        if consumes_skip && matches!(self.levels.last(), Some((_, Level::Skip))) {
            self.levels.pop();
        }
        match logic {
            BranchLogic::If | BranchLogic::While | BranchLogic::Else | BranchLogic::ElseIf => {
                self.levels.push((id, Level::Block));
            }
            BranchLogic::SkipIf => self.levels.push((id, Level::Skip)),
            _ => {}
        }
        if is_subroutine_header {
            self.within_subroutine = true;
        }
    }
}
