use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vn-cli")]
#[command(about = "Visual novel script runner")]
pub(crate) struct Cli {
    /// Tracing filter, e.g. `vn_runtime=debug`. Falls back to RUST_LOG.
    #[arg(long = "log", global = true)]
    pub(crate) log: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Play(PlayArgs),
    Lint(LintArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct SessionArgs {
    /// JSON file with session settings.
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    #[arg(long = "language")]
    pub(crate) language: Option<String>,
    #[arg(long = "developer")]
    pub(crate) developer: bool,
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry-label")]
    pub(crate) entry_label: Option<String>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
    #[command(flatten)]
    pub(crate) session: SessionArgs,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry-label")]
    pub(crate) entry_label: Option<String>,
    #[command(flatten)]
    pub(crate) session: SessionArgs,
}

#[derive(Debug, Args)]
pub(crate) struct LintArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    /// Exit with a failure code when anything is reported.
    #[arg(long = "strict")]
    pub(crate) strict: bool,
}
