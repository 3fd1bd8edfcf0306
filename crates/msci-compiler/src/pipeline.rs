use msci_core::{CompilerFault, ErrorArray, GameVersion, ScriptCommand};
use msci_parser::{parse_line, SyntaxTable};
use serde::Serialize;

use crate::format::render_compiled;
use crate::macro_expand::expand_macros;
use crate::objects::ObjectLibrary;
use crate::passes::{run_all, PassContext};
use crate::symbols::Symbol;
use crate::tree::build_tree;

pub const DEFAULT_INDENT_WIDTH: usize = 2;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub game_version: GameVersion,
    /// Argument names, given IDs ahead of every other variable.
    pub arguments: Vec<String>,
    pub indent_width: usize,
    pub object_library: Option<ObjectLibrary>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            game_version: GameVersion::default(),
            arguments: Vec::new(),
            indent_width: DEFAULT_INDENT_WIDTH,
            object_library: None,
        }
    }
}

/// Everything a compile produced, diagnostics included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub commands: Vec<ScriptCommand>,
    pub errors: ErrorArray,
    pub symbols: Vec<Symbol>,
    pub standard_count: usize,
    #[serde(skip)]
    indent_width: usize,
}

/// A compile without diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledScript {
    pub commands: Vec<ScriptCommand>,
    pub symbols: Vec<Symbol>,
    pub standard_count: usize,
}

impl CompileOutput {
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Commands the engine executes, in index order.
    pub fn standard_commands(&self) -> impl Iterator<Item = &ScriptCommand> {
        self.commands.iter().filter(|command| command.index.is_some())
    }

    /// Source text of the compiled script with canonical indentation.
    pub fn render(&self) -> Vec<String> {
        render_compiled(&self.commands, self.indent_width)
    }

    pub fn into_result(self) -> Result<CompiledScript, ErrorArray> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }
        Ok(CompiledScript {
            commands: self.commands,
            symbols: self.symbols,
            standard_count: self.standard_count,
        })
    }
}

/// Compiles script lines. Script problems are reported in
/// [`CompileOutput::errors`]; `Err` means the compiler itself failed.
pub fn compile<S: AsRef<str>>(
    lines: &[S],
    table: &SyntaxTable,
    options: &CompileOptions,
) -> Result<CompileOutput, CompilerFault> {
    let span = tracing::debug_span!("compile", lines = lines.len(), version = %options.game_version);
    let _guard = span.enter();

    let parsed = lines
        .iter()
        .enumerate()
        .map(|(offset, line)| parse_line(line.as_ref(), offset + 1, table, options.game_version))
        .collect::<Vec<_>>();
    let mut tree = build_tree(parsed);

    let mut context = PassContext::new(
        table,
        options.game_version,
        &options.arguments,
        options.object_library.as_ref(),
    );
    expand_macros(&mut tree, &mut context)?;
    tracing::trace!(tree = %tree.dump(), "command tree");

    run_all(&mut tree, &mut context)?;

    let PassContext {
        errors,
        symbols,
        standard_count,
        commands,
        ..
    } = context;
    tracing::debug!(
        commands = commands.len(),
        standard = standard_count,
        errors = errors.len(),
        "compile finished"
    );
    Ok(CompileOutput {
        commands,
        errors,
        symbols: symbols.into_vec(),
        standard_count,
        indent_width: options.indent_width,
    })
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn default_options_use_two_space_indent() {
        let options = CompileOptions::default();
        assert_eq!(options.indent_width, 2);
        assert_eq!(options.game_version, GameVersion::AlbionPrelude);
        assert!(options.object_library.is_none());
    }

    #[test]
    fn into_result_splits_on_errors() {
        let table = SyntaxTable::builtin();
        let ok = compile(&["$a = 1"], &table, &CompileOptions::default()).expect("compile");
        let script = ok.into_result().expect("no errors");
        assert_eq!(script.standard_count, 1);

        let failed = compile(&["flibble"], &table, &CompileOptions::default()).expect("compile");
        let errors = failed.into_result().expect_err("errors");
        assert!(errors.has_code("SYNTAX_UNRECOGNISED"));
    }

    #[test]
    fn output_serializes_for_tooling() {
        let table = SyntaxTable::builtin();
        let output = compile(&["$a = 1"], &table, &CompileOptions::default()).expect("compile");
        let json = serde_json::to_value(&output).expect("json");
        assert_eq!(json["standardCount"], 1);
        assert_eq!(json["symbols"][0]["name"], "a");
        assert!(json.get("indentWidth").is_none());
    }
}
