use anyhow::Context;
use clap::{Parser, Subcommand};
use prompt_mirror::{
    CancelFlag, JsonFileStore, OpenAiClient, SelectionRequest, TerminalUi, TreeRequest,
    WalkOutcome,
};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "prompt-mirror",
    version,
    author,
    about = "Run a directory tree through an LLM system prompt",
    long_about = "Run every file of a directory tree through a chat-completion model and \
    mirror the replies into an output tree.\n\n\
    USAGE EXAMPLES:\n  \
      # Pick directories and prompt interactively\n  \
      prompt-mirror process\n\n  \
      # Translate a docs tree (writes to ./docs-fr_processed)\n  \
      prompt-mirror process --input ./docs --output ./docs-fr --prompt \"Translate to French\"\n\n  \
      # Rewrite a selection piped from an editor\n  \
      echo 'teh quick fox' | prompt-mirror selection --prompt \"Fix typos\"\n\n  \
      # Grow the prompt library\n  \
      prompt-mirror add-prompt \"Summarize in three bullet points\""
)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// API key, overriding the stored one
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a directory tree into a mirrored `_processed` tree
    Process {
        /// Input directory
        #[arg(short, long, value_name = "DIR")]
        input: Option<PathBuf>,

        /// Output directory (`_processed` is appended)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// System prompt, skipping the library picker
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Process a text selection read from stdin or a file
    Selection {
        /// Read the selection from this file instead of stdin
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Replace the file's contents with the reply
        #[arg(long, requires = "file")]
        in_place: bool,

        /// System prompt, skipping the library picker
        #[arg(short, long)]
        prompt: Option<String>,
    },

    /// Append a system prompt to the library
    AddPrompt {
        /// Prompt text (asked for when omitted)
        text: Option<String>,
    },

    /// List the prompt library
    Prompts,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let store = match cli.settings {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::default_location().context("Failed to locate settings file")?,
    };
    tracing::debug!("Using settings at {}", store.path().display());

    let mut ui = TerminalUi::new();

    // Failures inside a command were already shown by the UI.
    let succeeded = match cli.command {
        Command::Process {
            input,
            output,
            prompt,
        } => {
            let cancel = CancelFlag::new();
            let handler_flag = cancel.clone();
            ctrlc::set_handler(move || handler_flag.cancel())
                .context("Error setting Ctrl-C handler")?;

            let request = TreeRequest {
                input_dir: input,
                output_dir: output,
                system_prompt: prompt,
                api_key: cli.api_key,
            };
            let result =
                prompt_mirror::process_tree(&store, &mut ui, OpenAiClient::new, cancel, request);
            ui.finish();

            if let Ok(Some(outcome)) = &result {
                print_stats(outcome);
            }
            result.is_ok()
        }
        Command::Selection {
            file,
            in_place,
            prompt,
        } => {
            let text = read_selection(file.as_ref())?;
            let request = SelectionRequest {
                text,
                system_prompt: prompt,
                api_key: cli.api_key,
            };
            let result = prompt_mirror::process_selection(&store, &mut ui, OpenAiClient::new, request);
            ui.finish();

            match result {
                Ok(Some(reply)) => {
                    match file.filter(|_| in_place) {
                        Some(path) => std::fs::write(&path, reply)
                            .with_context(|| format!("Failed to write {}", path.display()))?,
                        None => print!("{}", reply),
                    }
                    true
                }
                Ok(None) => true,
                Err(_) => false,
            }
        }
        Command::AddPrompt { text } => prompt_mirror::add_prompt(&store, &mut ui, text).is_ok(),
        Command::Prompts => {
            let prompts = prompt_mirror::list_prompts(&store).context("Failed to read settings")?;
            for (index, prompt) in prompts.iter().enumerate() {
                println!("{:>3}  {}", index + 1, prompt);
            }
            true
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_selection(file: Option<&PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read selection from {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read selection from stdin")?;
            Ok(text)
        }
    }
}

fn print_stats(outcome: &WalkOutcome) {
    let stats = outcome.stats();
    eprintln!(
        "{} processed, {} copied, {} kept, {} failed{}",
        stats.processed,
        stats.copied,
        stats.skipped_existing,
        stats.failed,
        if outcome.is_cancelled() { " (cancelled)" } else { "" }
    );
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("prompt_mirror=error"),
        1 => EnvFilter::new("prompt_mirror=info"),
        2 => EnvFilter::new("prompt_mirror=debug"),
        _ => EnvFilter::new("prompt_mirror=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();

    Ok(())
}
