/*!
 * waitpid-demo - supervise one command through a wait context
 *
 * Usage: waitpid-demo <command> [args...]
 *
 * Spawns the command, awaits its state change on the tokio reactor while a
 * heartbeat keeps ticking, prints the decoded record as JSON and exits with
 * the child's exit code.
 */

use std::error::Error;
use std::process::{Command, ExitCode};
use std::time::Duration;
use tracing::{info, warn};

use waitpid_context::{init_tracing, stats, WaitContext, WaitOptions, WaitOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(program) = args.next() else {
        eprintln!("usage: waitpid-demo <command> [args...]");
        return Ok(ExitCode::from(2));
    };

    let child = Command::new(&program).args(args).spawn()?;
    let pid = i32::try_from(child.id())?;
    info!(pid, program = %program, "spawned child");

    let options = WaitOptions::new().report_stopped().report_continued();
    let mut ctx = match WaitContext::create(pid, options)? {
        Some(ctx) => ctx,
        None => {
            warn!(pid, "thread limit reached");
            return Ok(ExitCode::from(75));
        }
    };

    let mut heartbeat = tokio::time::interval(Duration::from_secs(1));
    let code = loop {
        tokio::select! {
            outcome = ctx.wait() => match outcome? {
                WaitOutcome::Ready(status) => {
                    println!("{}", serde_json::to_string(&status.to_record())?);
                    if !status.is_terminal() {
                        // Stopped or continued: keep supervising
                        ctx = match WaitContext::create(pid, options)? {
                            Some(next) => next,
                            None => break 75,
                        };
                        continue;
                    }
                    break status.exit_code().unwrap_or(1);
                }
                other => {
                    warn!(pid, outcome = ?other, "wait ended without a result");
                    break 1;
                }
            },
            _ = heartbeat.tick() => info!(pid, "child still running"),
        }
    };

    info!(stats = ?stats().snapshot(), "done");
    Ok(ExitCode::from(u8::try_from(code & 0xff).unwrap_or(1)))
}
