//! Headless shell driven by JSONL commands on stdin.
//!
//! ```bash
//! cargo run -- --list
//! echo '{"type": "invoke", "channel": "diagnostics:ping"}' | cargo run
//! ```

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use usecase_shell::builtins::DiagnosticsUseCase;
use usecase_shell::config;
use usecase_shell::headless::{HeadlessIpc, HeadlessSurfaceFactory};
use usecase_shell::logging;
use usecase_shell::shell::Shell;
use usecase_shell::stdin_commands::{self, execute, parse_command, parse_error_response};
use usecase_shell::window::WindowOverrides;

#[derive(Debug, Parser)]
#[command(name = "usecase-shell", version, about = "Headless use-case shell")]
struct Cli {
    /// Config file (default: ~/.usecase-shell/config.json)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Print registered use-cases as JSON and exit
    #[arg(long)]
    list: bool,

    /// Open a window for this use-case before reading commands
    #[arg(long, value_name = "USE_CASE_ID")]
    open: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref());
    let _guard = logging::init(Some(&config.get_log_dir()));

    let ipc = Rc::new(HeadlessIpc::new());
    let factory = Rc::new(HeadlessSurfaceFactory::new());
    let shell = Shell::new(ipc.clone(), factory.clone(), config);
    shell.register(Rc::new(DiagnosticsUseCase::new()));

    if cli.list {
        let descriptors = serde_json::to_string_pretty(&shell.registry().descriptors())
            .context("failed to serialize use-case list")?;
        println!("{}", descriptors);
        return Ok(());
    }

    shell.start();

    if let Some(use_case_id) = cli.open.as_deref() {
        let created = shell
            .open_window(use_case_id, &WindowOverrides::default())
            .with_context(|| format!("failed to open window for '{}'", use_case_id))?;
        info!(window_id = created.id.0, use_case_id, "Opened initial window");
    }

    let lines = stdin_commands::start_stdin_listener();
    while let Ok(line) = lines.recv_blocking() {
        let Some(parsed) = parse_command(&line) else {
            continue;
        };
        let outcome = match parsed {
            Ok(command) => execute(&shell, &ipc, command),
            Err(e) => {
                warn!(error = %e, "Failed to parse command");
                println!("{}", parse_error_response(&e));
                continue;
            }
        };
        println!("{}", outcome.response);
        factory.prune_closed();
        if outcome.exit {
            break;
        }
    }

    // EOF without an explicit shutdown still cleans up
    shell.shutdown();
    Ok(())
}
