//! Example: stop a program at `main` and print where it stopped
//!
//! ```text
//! cargo run -p gdbmi --example run_to_main -- /path/to/program
//! ```
//!
//! Set RUST_LOG=gdbmi_core=trace to see every MI line.

use std::process::Stdio;

use gdbmi_core::{ClientConfig, Gdb, GdbEvent, Scope, Transport};
use gdbmi_utils::init_logging;
use tokio::process::Command;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>>
{
    init_logging()?;

    let program = std::env::args().nth(1).ok_or("usage: run_to_main <program>")?;
    let mut child = Command::new("gdb")
        .args(["--interpreter=mi2", "--quiet", "--nx", &program])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;
    let stdout = child.stdout.take().ok_or("gdb stdout is not piped")?;
    let stdin = child.stdin.take().ok_or("gdb stdin is not piped")?;

    let gdb = Gdb::new(Transport::new(stdout, stdin), ClientConfig::default());
    gdb.init().await?;

    let mut events = gdb.subscribe();
    let bp = gdb.add_breakpoint("main", None).await?;
    tracing::info!(id = %bp.id, file = ?bp.file, "breakpoint set");
    gdb.run(Scope::None).await?;

    while let Some(event) = events.next().await {
        if let GdbEvent::Stopped { thread, .. } = &event {
            println!("{}", event.describe());
            let scope = Scope::from(thread.as_ref());
            for frame in gdb.callstack(scope).await? {
                println!("  #{} {} at {}:{}", frame.level.unwrap_or_default(), frame.func.as_deref().unwrap_or("??"), frame.file, frame.line);
            }
            for var in gdb.context(scope).await? {
                println!("  {} {} = {}", var.ty, var.name, var.value);
            }
            break;
        }
    }

    gdb.exit().await?;
    child.wait().await?;
    Ok(())
}
