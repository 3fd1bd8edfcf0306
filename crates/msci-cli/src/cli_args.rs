use clap::{Args, Parser, Subcommand};
use msci_api::DEFAULT_INDENT_WIDTH;
use msci_core::GameVersion;

#[derive(Debug, Parser)]
#[command(name = "msci")]
#[command(about = "MSCI script compiler and formatter")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Compile(CompileArgs),
    Format(FormatArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CompileArgs {
    #[arg(long = "script", required_unless_present = "scripts_dir", conflicts_with = "scripts_dir")]
    pub(crate) script: Option<String>,
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: Option<String>,
    #[arg(long = "game-version", default_value_t = GameVersion::AlbionPrelude)]
    pub(crate) game_version: GameVersion,
    #[arg(long = "syntax")]
    pub(crate) syntax: Option<String>,
    #[arg(long = "objects")]
    pub(crate) objects: Option<String>,
    #[arg(long = "argument")]
    pub(crate) arguments: Vec<String>,
    #[arg(long = "json")]
    pub(crate) json: bool,
}

#[derive(Debug, Args)]
pub(crate) struct FormatArgs {
    #[arg(long = "script")]
    pub(crate) script: String,
    #[arg(long = "indent", default_value_t = DEFAULT_INDENT_WIDTH)]
    pub(crate) indent: usize,
    #[arg(long = "write")]
    pub(crate) write: bool,
    #[arg(long = "game-version", default_value_t = GameVersion::AlbionPrelude)]
    pub(crate) game_version: GameVersion,
    #[arg(long = "syntax")]
    pub(crate) syntax: Option<String>,
}
