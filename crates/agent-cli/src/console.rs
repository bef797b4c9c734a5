//! Console Driver
//!
//! Line-oriented REPL over an [`AgentSession`]. Rendering is kept in pure
//! functions so it can be checked without a terminal.

use std::io::Write;

use agent_core::{AgentError, AgentSession, ConversationOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const PROMPT: &str = "\nWhat would you like to know? ";
const BANNER_WIDTH: usize = 80;
const RULE_WIDTH: usize = 40;
const RESULT_PREVIEW_CHARS: usize = 500;

/// What a line of input asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Exit,
    Blank,
    Question(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        Input::Exit
    } else if trimmed.is_empty() {
        Input::Blank
    } else {
        Input::Question(trimmed)
    }
}

pub fn banner() -> String {
    "Welcome to the MCP Agent\n\
     Available tools: Web Search, Weather, Research Papers\n\
     Type 'exit' to quit.\n"
        .to_string()
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(RESULT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Render a finished turn: calls, results, answer, token usage
pub fn render_outcome(outcome: &ConversationOutcome) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut out = format!("\n{banner}\n");

    let calls: Vec<String> = outcome
        .conversation
        .tool_calls()
        .enumerate()
        .map(|(i, call)| {
            let args = serde_json::Value::Object(call.arguments.clone());
            format!("  {}. {}({args})", i + 1, call.name)
        })
        .collect();
    if !calls.is_empty() {
        out.push_str("\nTools called:\n");
        for line in calls {
            out.push_str(&line);
            out.push('\n');
        }
    }

    let rule = "-".repeat(RULE_WIDTH);
    let results: Vec<String> = outcome
        .conversation
        .tool_results()
        .enumerate()
        .map(|(i, (name, content))| {
            format!("\n  Tool {}: {name}\n  {rule}\n  {}\n", i + 1, preview(content))
        })
        .collect();
    if !results.is_empty() {
        out.push_str("\nTool results:\n");
        for block in results {
            out.push_str(&block);
        }
    }

    if !outcome.answer.is_empty() {
        out.push_str("\nResponse:\n");
        out.push_str(&outcome.answer);
        out.push('\n');
    }

    if let Some(usage) = &outcome.usage {
        out.push_str(&format!(
            "\nTokens used: {} (Input: {}, Output: {})\n",
            usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
        ));
    }

    out.push_str(&banner);
    out.push('\n');
    out
}

pub fn render_error(err: &AgentError) -> String {
    format!(
        "\nAn error occurred: {err}\n{}\nPlease try again or type 'exit' to quit.\n",
        err.user_message()
    )
}

/// Ctrl-C presses for the whole session, from a single OS listener.
///
/// Presses that land while nothing is waiting stay queued for the next
/// prompt or turn.
pub fn interrupts() -> std::io::Result<mpsc::UnboundedReceiver<()>> {
    let (tx, rx) = mpsc::unbounded_channel();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut stream = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            while stream.recv().await.is_some() {
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
    }

    #[cfg(not(unix))]
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });

    Ok(rx)
}

/// Run the REPL on the process's stdin and stdout
pub async fn run(session: &AgentSession) -> anyhow::Result<()> {
    let mut interrupts = interrupts()?;
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_with(session, stdin, &mut stdout, &mut interrupts).await
}

/// Run the REPL over any line source
///
/// Returns when the user types `exit`, interrupts at the prompt, or the
/// input ends. An interrupt while a turn is running drops that turn.
pub async fn run_with<R, W>(
    session: &AgentSession,
    input: R,
    out: &mut W,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            Some(()) = interrupts.recv() => {
                writeln!(out, "\nGoodbye!")?;
                return Ok(());
            }
        };
        let Some(line) = line else {
            writeln!(out, "\nGoodbye!")?;
            return Ok(());
        };

        let question = match parse_input(&line) {
            Input::Exit => {
                writeln!(out, "Goodbye!")?;
                return Ok(());
            }
            Input::Blank => continue,
            Input::Question(question) => question,
        };

        writeln!(out, "\nProcessing your request...")?;
        out.flush()?;

        tokio::select! {
            result = session.process_turn(question) => match result {
                Ok(outcome) => {
                    tracing::debug!(
                        session = %session.id().as_str(),
                        rounds = outcome.rounds,
                        "Turn finished"
                    );
                    write!(out, "{}", render_outcome(&outcome))?;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::warn!(session = %session.id().as_str(), error = %e, "Turn failed, may succeed on retry");
                    } else {
                        tracing::error!(session = %session.id().as_str(), error = %e, "Turn failed");
                    }
                    write!(out, "{}", render_error(&e))?;
                }
            },
            Some(()) = interrupts.recv() => {
                tracing::info!("Turn cancelled");
                writeln!(out, "\nRequest cancelled.")?;
            }
        }
        out.flush()?;
    }
}
