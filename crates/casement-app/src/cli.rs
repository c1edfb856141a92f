use clap::Parser;

/// Casement: a multi-window web content host.
///
/// Runs a scripted session against the headless content engine and prints
/// the resulting window states.
#[derive(Parser, Debug)]
#[command(name = "casement", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Number of windows the session opens.
    #[arg(short = 'n', long, default_value_t = 3)]
    pub windows: u32,

    /// Print window states as JSON.
    #[arg(long)]
    pub json: bool,

    /// Use the system clipboard instead of an in-memory one.
    #[arg(long)]
    pub system_clipboard: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
