use std::io::Write;
use std::path::PathBuf;
use std::process::{self, Stdio};
use std::sync::Arc;

use clap::Parser;
use gdbmi_core::{ClientConfig, Gdb, GdbEvent, Result as GdbResult, Scope, SignalTarget, Transport};
use gdbmi_utils::{init_logging_file_only, LogLevel};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde_json::Value as Json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{error, info, warn};

mod repl;

use repl::{Request, StepKind, HELP};

/// Drive gdb through its Machine Interface from an interactive prompt.
#[derive(Parser, Debug)]
#[command(name = "gdbmi")]
#[command(version)]
#[command(about = "Drive gdb through its Machine Interface from an interactive prompt", long_about = None)]
struct Cli
{
    /// Program to debug
    program: Option<PathBuf>,

    /// Extra arguments passed to gdb
    #[arg(last = true)]
    gdb_args: Vec<String>,

    /// Path of the gdb binary
    #[arg(long, default_value = "gdb")]
    gdb: PathBuf,

    /// Enable async non-stop mode at start
    #[arg(long = "async", default_value_t = false)]
    async_mode: bool,

    /// Do not upload the extension scripts
    #[arg(long, default_value_t = false)]
    no_scripts: bool,

    /// Log level (error, warn, info, debug, trace); defaults to RUST_LOG or info
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Log file; defaults to ~/.gdbmi/<date>-gdbmi.log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Interrupts gdb by sending it `SIGINT`.
struct SigintTarget
{
    pid: Pid,
}

impl SignalTarget for SigintTarget
{
    fn interrupt(&self) -> std::io::Result<()>
    {
        kill(self.pid, Signal::SIGINT).map_err(std::io::Error::from)
    }
}

#[tokio::main]
async fn main()
{
    let cli = Cli::parse();

    // The prompt owns the terminal, so logs go to a file.
    match init_logging_file_only(cli.log_file.clone(), cli.log_level) {
        Ok(path) => eprintln!("logging to {}", path.display()),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    }

    if let Err(e) = run(cli).await {
        error!(error = %e, "session failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>>
{
    let mut command = Command::new(&cli.gdb);
    command
        .args(["--interpreter=mi2", "--quiet", "--nx"])
        .args(&cli.gdb_args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        // keep terminal Ctrl-C away from gdb; it is forwarded as an interrupt
        .process_group(0)
        .kill_on_drop(true);
    if let Some(program) = &cli.program {
        command.arg(program);
    }

    info!(gdb = %cli.gdb.display(), program = ?cli.program, "spawning gdb");
    let mut child = command
        .spawn()
        .map_err(|e| format!("failed to start {}: {e}", cli.gdb.display()))?;
    let stdout = child.stdout.take().ok_or("gdb stdout is not piped")?;
    let stdin = child.stdin.take().ok_or("gdb stdin is not piped")?;
    let pid = child.id().ok_or("gdb exited during startup")?;

    let mut transport = Transport::new(stdout, stdin);
    transport = transport.with_signal(Arc::new(SigintTarget {
        pid: Pid::from_raw(i32::try_from(pid)?),
    }));

    let config = ClientConfig::default().with_load_scripts(!cli.no_scripts);
    let gdb = Gdb::new(transport, config);
    spawn_printers(&gdb);

    gdb.init().await?;
    if cli.async_mode {
        gdb.enable_async().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match repl::parse(&line) {
                    Ok(Some(Request::Quit)) => break,
                    Ok(Some(request)) => {
                        if let Err(e) = execute(&gdb, request).await {
                            println!("error: {e}");
                        }
                    }
                    Ok(None) => {}
                    Err(message) => println!("{message}"),
                }
                prompt();
            }
            _ = tokio::signal::ctrl_c() => {
                if let Err(e) = gdb.interrupt(Scope::None).await {
                    warn!(error = %e, "interrupt failed");
                    println!("error: {e}");
                }
            }
            reason = gdb.closed() => {
                println!("gdb terminated: {reason}");
                return Ok(());
            }
        }
    }

    if !gdb.is_closed() {
        gdb.exit().await?;
    }
    let status = child.wait().await?;
    info!(%status, "gdb exited");
    Ok(())
}

fn prompt()
{
    print!("(gdbmi) ");
    if let Err(e) = std::io::stdout().flush() {
        warn!(error = %e, "failed to flush prompt");
    }
}

fn spawn_printers(gdb: &Gdb)
{
    let mut events = gdb.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match &event {
                GdbEvent::Custom { .. } => info!(event = %event.describe(), "custom event"),
                _ => println!("[{}] {}", event.name(), event.describe()),
            }
        }
    });

    let mut target = gdb.target_output();
    tokio::spawn(async move {
        while let Some(text) = target.next().await {
            print!("{text}");
        }
    });

    // Extension command results also travel on the console; hide them.
    let mut console = gdb.console();
    tokio::spawn(async move {
        while let Some(text) = console.next().await {
            if !text.starts_with("<gdbjs:") {
                print!("{text}");
            }
        }
    });
}

async fn execute(gdb: &Gdb, request: Request) -> GdbResult<()>
{
    match request {
        Request::Break { location, thread } => {
            let bp = gdb.add_breakpoint(&location, thread).await?;
            let place = match (&bp.file, bp.line) {
                (Some(file), Some(line)) => format!(" at {file}:{line}"),
                _ => String::new(),
            };
            println!("Breakpoint {}{place}", bp.id);
        }
        Request::Delete(id) => gdb.remove_breakpoint(id).await?,
        Request::Run(scope) => gdb.run(scope).await?,
        Request::Continue { reverse: false, scope } => gdb.proceed(scope).await?,
        Request::Continue { reverse: true, scope } => gdb.reverse_proceed(scope).await?,
        Request::Step { kind, reverse, scope } => match (kind, reverse) {
            (StepKind::In, false) => gdb.step_in(scope).await?,
            (StepKind::Over, false) => gdb.step_over(scope).await?,
            (StepKind::Out, false) => gdb.step_out(scope).await?,
            (StepKind::In, true) => gdb.reverse_step_in(scope).await?,
            (StepKind::Over, true) => gdb.reverse_step_over(scope).await?,
            (StepKind::Out, true) => gdb.reverse_step_out(scope).await?,
        },
        Request::Interrupt(scope) => gdb.interrupt(scope).await?,
        Request::Threads(scope) => {
            for thread in gdb.threads(scope).await? {
                let group = thread.group.map(|g| format!(" (inferior {g})")).unwrap_or_default();
                let place = thread
                    .frame
                    .map(|f| format!(" {}:{}", f.file, f.line))
                    .unwrap_or_default();
                println!("Thread {}{group} {:?}{place}", thread.id, thread.status);
            }
        }
        Request::Thread(Some(id)) => gdb.select_thread(id).await?,
        Request::Thread(None) => match gdb.current_thread().await? {
            Some(thread) => println!("Thread {} {:?}", thread.id, thread.status),
            None => println!("No thread selected"),
        },
        Request::Groups => {
            for group in gdb.thread_groups().await? {
                print_group(&group);
            }
        }
        Request::Group(Some(id)) => gdb.select_thread_group(id).await?,
        Request::Group(None) => print_group(&gdb.current_thread_group().await?),
        Request::Backtrace(scope) => {
            for frame in gdb.callstack(scope).await? {
                let func = frame.func.as_deref().unwrap_or("??");
                println!("#{} {func} at {}:{}", frame.level.unwrap_or_default(), frame.file, frame.line);
            }
        }
        Request::Locals(scope) => {
            for var in gdb.context(scope).await? {
                println!("{:?} {} {} = {}", var.scope, var.ty, var.name, var.value);
            }
        }
        Request::Sources { pattern, group } => {
            for file in gdb.source_files(group, pattern.as_deref()).await? {
                println!("{file}");
            }
        }
        Request::Print { expression, scope } => println!("{}", gdb.evaluate(&expression, scope).await?),
        Request::Python { source, scope } => print!("{}", gdb.exec_py(&source, scope).await?),
        Request::Cli { command, scope } => print!("{}", gdb.exec_cli(&command, scope).await?),
        Request::Mi { command, scope } => print_json(&gdb.exec_mi(&command, scope).await?),
        Request::Attach(pid) => gdb.attach(pid).await?,
        Request::Detach(group) => gdb.detach(group).await?,
        Request::Set { name, value } => gdb.set_var(&name, &value).await?,
        Request::Async => gdb.enable_async().await?,
        Request::ForkFollow { child } => gdb.set_fork_follow(child).await?,
        Request::Help => println!("{HELP}"),
        Request::Quit => {}
    }
    Ok(())
}

fn print_group(group: &gdbmi_core::ThreadGroup)
{
    let pid = group.pid.map(|p| format!(" pid {p}")).unwrap_or_default();
    let exe = group.executable.as_deref().unwrap_or("<no executable>");
    println!("Inferior {}{pid} {exe}", group.id);
}

fn print_json(value: &Json)
{
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => println!("{value} ({e})"),
    }
}
