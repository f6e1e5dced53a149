//! End-to-end tests of the client against a scripted fake gdb.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{command_output, connect, connect_with, console, event_output};
use gdbmi_core::scripts::{python_command, SCRIPTS};
use gdbmi_core::{
    BreakpointId, ClientConfig, FunctionName, GdbError, GdbEvent, GroupId, Scope, SignalTarget, ThreadId, ThreadStatus,
    VariableScope,
};
use serde_json::json;

#[tokio::test]
async fn test_results_correlate_in_order_and_errors_reject_only_their_command()
{
    let (gdb, mut fake) = connect();
    let (first, second, ()) = tokio::join!(
        gdb.exec_mi("-list-features", Scope::None),
        gdb.evaluate("x", Scope::None),
        async {
            fake.reply("-list-features", &[r#"^done,features=["frozen-varobjs","pending-breakpoints"]"#])
                .await;
            fake.reply(
                r#"-data-evaluate-expression "x""#,
                &[r#"^error,msg="No symbol \"x\" in current context.",code="undefined-command""#],
            )
            .await;
        }
    );

    assert_eq!(first.unwrap(), json!({"features": ["frozen-varobjs", "pending-breakpoints"]}));
    let err = second.unwrap_err();
    let command = err.as_command().expect("command error");
    assert_eq!(command.code.as_deref(), Some("undefined-command"));
    assert_eq!(command.message, "No symbol \"x\" in current context.");
}

#[tokio::test]
async fn test_operations_start_in_call_order_not_poll_order()
{
    let (gdb, mut fake) = connect();
    let first = gdb.exec_mi("-first", Scope::None);
    let second = gdb.exec_mi("-second", Scope::None);
    let (second, first, ()) = tokio::join!(second, first, async {
        fake.reply("-first", &["^done,n=\"1\""]).await;
        fake.reply("-second", &["^done,n=\"2\""]).await;
    });
    assert_eq!(first.unwrap(), json!({"n": "1"}));
    assert_eq!(second.unwrap(), json!({"n": "2"}));
}

#[tokio::test]
async fn test_async_records_interleave_with_results()
{
    let (gdb, mut fake) = connect();
    let mut events = gdb.subscribe();
    let (outcome, ()) = tokio::join!(gdb.proceed(Scope::None), async {
        fake.reply("-exec-continue", &[r#"*running,thread-id="all""#, "^running"])
            .await;
    });
    outcome.unwrap();
    assert_eq!(events.next().await, Some(GdbEvent::Running { thread: None }));
}

#[tokio::test]
async fn test_textual_command_resolves_from_console_output()
{
    let (gdb, mut fake) = connect();
    let (text, ()) = tokio::join!(gdb.exec_cli("info frame", Scope::None), async {
        let output = command_output("exec", &json!("Stack level 0, frame at 0x7ffe\n"));
        fake.reply(&console("gdbjs-exec info frame"), &[&output, "^done"]).await;
    });
    assert_eq!(text.unwrap(), "Stack level 0, frame at 0x7ffe\n");
}

#[tokio::test]
async fn test_thread_scope_is_inline_for_structured_commands()
{
    let (gdb, mut fake) = connect();
    let (outcome, ()) = tokio::join!(gdb.step_in(Scope::Thread(ThreadId(7))), async {
        fake.reply("-exec-step --thread 7", &["^running"]).await;
    });
    outcome.unwrap();
}

#[tokio::test]
async fn test_group_scope_switches_runs_and_restores_thread()
{
    let (gdb, mut fake) = connect();
    let (vars, ()) = tokio::join!(gdb.context(Scope::Group(GroupId(3))), async {
        fake.reply_current_thread(&json!({"id": 1, "group": 1})).await;
        fake.reply(&console("inferior 3"), &[r#"~"[Switching to inferior 3 [process 99] (/bin/app)]\n""#, "^done"])
            .await;
        let output = command_output(
            "context",
            &json!([
                {"name": "argc", "type": "int", "scope": "argument", "value": "1"},
                {"name": "total", "type": "long", "scope": "local", "value": "0"}
            ]),
        );
        fake.reply(&console("gdbjs-context"), &[&output, "^done"]).await;
        fake.reply("-thread-select 1", &[r#"^done,new-thread-id="1""#]).await;
    });

    let vars = vars.unwrap();
    assert_eq!(vars.len(), 2);
    assert_eq!(vars[0].scope, VariableScope::Argument);
    assert_eq!(vars[1].name, "total");
}

#[tokio::test]
async fn test_group_scope_switches_inferior_for_structured_commands()
{
    let (gdb, mut fake) = connect();
    let (outcome, ()) = tokio::join!(gdb.step_in(Scope::Group(GroupId(3))), async {
        fake.reply_current_thread(&json!({"id": 1, "group": 1})).await;
        fake.reply(&console("inferior 3"), &["^done"]).await;
        fake.reply("-exec-step", &["^running"]).await;
        fake.reply("-thread-select 1", &[r#"^done,new-thread-id="1""#]).await;
    });
    outcome.unwrap();
}

#[tokio::test]
async fn test_restore_is_skipped_without_selected_thread()
{
    let (gdb, mut fake) = connect();
    let (outcome, ()) = tokio::join!(gdb.run(Scope::Group(GroupId(2))), async {
        fake.reply_current_thread(&json!(null)).await;
        fake.reply(&console("inferior 2"), &["^done"]).await;
        fake.reply("-exec-run", &["^running"]).await;
    });
    outcome.unwrap();

    // nothing else was written: the next command is the one we send now
    let (outcome, ()) = tokio::join!(gdb.exec_mi("-gdb-version", Scope::None), async {
        fake.reply("-gdb-version", &["^done"]).await;
    });
    outcome.unwrap();
}

#[tokio::test]
async fn test_restore_runs_even_when_command_fails()
{
    let (gdb, mut fake) = connect();
    let (outcome, ()) = tokio::join!(gdb.exec_cli("bogus", Scope::Thread(ThreadId(2))), async {
        fake.reply_current_thread(&json!({"id": 1, "group": 1})).await;
        fake.reply("-thread-select 2", &["^done"]).await;
        fake.reply(&console("gdbjs-exec bogus"), &[r#"^error,msg="Undefined command: \"bogus\".""#])
            .await;
        fake.reply("-thread-select 1", &["^done"]).await;
    });
    assert!(matches!(outcome, Err(GdbError::Command(_))));
}

#[tokio::test]
async fn test_threads_are_gathered_per_group()
{
    let (gdb, mut fake) = connect();
    let (threads, ()) = tokio::join!(gdb.threads(Scope::None), async {
        fake.reply(
            "-list-thread-groups",
            &[r#"^done,groups=[{id="i1",type="process",pid="42",executable="/bin/app"},{id="i2",type="process"}]"#],
        )
        .await;
        fake.reply(
            "-list-thread-groups i1",
            &[concat!(
                r#"^done,threads=[{id="1",target-id="process 42",frame={level="0",addr="0x1139",func="main","#,
                r#"args=[],file="a.c",fullname="/src/a.c",line="3",arch="i386:x86-64"},state="stopped",core="0"},"#,
                r#"{id="2",target-id="Thread 0x7f (LWP 43)",state="running"}]"#
            )],
        )
        .await;
        fake.reply("-list-thread-groups i2", &["^done,threads=[]"]).await;
    });

    let threads = threads.unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0].id, ThreadId(1));
    assert_eq!(threads[0].group, Some(GroupId(1)));
    assert_eq!(threads[0].status, ThreadStatus::Stopped);
    assert_eq!(threads[0].frame.as_ref().unwrap().file, "/src/a.c");
    assert_eq!(threads[1].status, ThreadStatus::Running);
}

#[tokio::test]
async fn test_current_thread_uses_extension_then_thread_info()
{
    let (gdb, mut fake) = connect();
    let (thread, ()) = tokio::join!(gdb.current_thread(), async {
        fake.reply_current_thread(&json!({"id": 2, "group": 1})).await;
        fake.reply(
            "-thread-info 2",
            &[r#"^done,threads=[{id="2",target-id="Thread 0x7f (LWP 43)",state="stopped"}],current-thread-id="2""#],
        )
        .await;
    });
    let thread = thread.unwrap().unwrap();
    assert_eq!(thread.id, ThreadId(2));
    assert_eq!(thread.group, Some(GroupId(1)));
    assert_eq!(thread.status, ThreadStatus::Stopped);
}

#[tokio::test]
async fn test_breakpoint_with_multiple_locations()
{
    let (gdb, mut fake) = connect();
    let (bp, ()) = tokio::join!(gdb.add_breakpoint("add", Some(ThreadId(2))), async {
        fake.reply(
            "-break-insert -p 2 add",
            &[concat!(
                r#"^done,bkpt={number="1",type="breakpoint",disp="keep",enabled="y",addr="<MULTIPLE>",thread="2","#,
                r#"times="0",original-location="add"},{number="1.1",enabled="y",addr="0x1149",func="add<int>","#,
                r#"file="t.hpp",fullname="/src/t.hpp",line="4"},{number="1.2",enabled="y",addr="0x1161","#,
                r#"func="add<double>",file="t.hpp",fullname="/src/t.hpp",line="4"}"#
            )],
        )
        .await;
    });
    let bp = bp.unwrap();
    assert_eq!(bp.id, BreakpointId(1));
    assert_eq!(bp.thread, Some(ThreadId(2)));
    assert_eq!(bp.file.as_deref(), Some("/src/t.hpp"));
    assert_eq!(
        bp.func,
        Some(FunctionName::Multiple(vec!["add<int>".into(), "add<double>".into()]))
    );
}

#[tokio::test]
async fn test_source_files_are_deduplicated_across_groups()
{
    let (gdb, mut fake) = connect();
    let (files, ()) = tokio::join!(gdb.source_files(None, Some(r"\.c$")), async {
        fake.reply("-list-thread-groups", &[r#"^done,groups=[{id="i1"},{id="i2"}]"#]).await;
        for (group, files) in [(1, json!(["/src/a.c", "/src/b.c"])), (2, json!(["/src/b.c", "/src/c.c"]))] {
            fake.reply_current_thread(&json!(null)).await;
            fake.reply(&console(&format!("inferior {group}")), &["^done"]).await;
            let output = command_output("sources", &files);
            fake.reply(&console(r"gdbjs-sources \.c$"), &[&output, "^done"]).await;
        }
    });
    assert_eq!(files.unwrap(), vec!["/src/a.c", "/src/b.c", "/src/c.c"]);
}

#[tokio::test]
async fn test_callstack_skips_frames_without_source()
{
    let (gdb, mut fake) = connect();
    let (frames, ()) = tokio::join!(gdb.callstack(Scope::Thread(ThreadId(1))), async {
        fake.reply(
            "-stack-list-frames --thread 1",
            &[concat!(
                r#"^done,stack=[frame={level="0",addr="0x1139",func="leaf",file="a.c",fullname="/src/a.c",line="3"},"#,
                r#"frame={level="1",addr="0x1150",func="main",file="a.c",fullname="/src/a.c",line="9"},"#,
                r#"frame={level="2",addr="0x7ffff7c29d90",func="__libc_start_call_main",from="/lib/libc.so.6"}]"#
            )],
        )
        .await;
    });
    let frames = frames.unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].func.as_deref(), Some("main"));
    assert_eq!(frames[1].level, Some(1));
}

#[tokio::test]
async fn test_stopped_event_carries_thread_and_breakpoint()
{
    let (gdb, mut fake) = connect();
    let mut events = gdb.subscribe();
    fake.send(&[
        r#"=thread-group-started,id="i1",pid="4242""#,
        r#"=thread-created,id="3",group-id="i1""#,
        concat!(
            r#"*stopped,reason="breakpoint-hit",disp="keep",bkptno="2",frame={addr="0x1151",func="main",args=[],"#,
            r#"file="a.c",fullname="/src/a.c",line="7"},thread-id="3",stopped-threads="all",core="1""#
        ),
        "(gdb)",
    ])
    .await;

    assert!(matches!(events.next().await, Some(GdbEvent::ThreadGroupStarted(g)) if g.pid == Some(4242)));
    assert!(matches!(events.next().await, Some(GdbEvent::ThreadCreated(t)) if t.group == Some(GroupId(1))));
    let Some(GdbEvent::Stopped {
        thread: Some(thread),
        breakpoint: Some(bp),
        ..
    }) = events.next().await
    else {
        panic!("expected a breakpoint stop");
    };
    assert_eq!(thread.id, ThreadId(3));
    assert_eq!(bp.id, BreakpointId(2));
}

#[tokio::test]
async fn test_custom_events_and_raw_streams()
{
    let (gdb, mut fake) = connect();
    let mut events = gdb.subscribe();
    let mut target = gdb.target_output();
    let mut log = gdb.log_output();
    let custom = event_output("new-objfile", &json!("/lib/libm.so.6"));
    fake.send(&[&custom, r#"@"hello from the program\n""#, r#"&"warning: no debug info\n""#])
        .await;

    assert_eq!(
        events.next().await,
        Some(GdbEvent::Custom {
            name: "new-objfile".into(),
            payload: json!("/lib/libm.so.6")
        })
    );
    assert_eq!(target.next().await.as_deref(), Some("hello from the program\n"));
    assert_eq!(log.next().await.as_deref(), Some("warning: no debug info\n"));
}

#[tokio::test]
async fn test_malformed_lines_are_dropped()
{
    let (gdb, mut fake) = connect();
    let (outcome, ()) = tokio::join!(gdb.exec_mi("-gdb-version", Scope::None), async {
        fake.expect("-gdb-version").await;
        fake.send(&["^done,broken={", r#"~"GNU gdb (GDB) 14.2\n""#, "^done"]).await;
    });
    assert_eq!(outcome.unwrap(), json!({}));
}

#[tokio::test]
async fn test_channel_close_rejects_pending_and_later_commands()
{
    let (gdb, mut fake) = connect();
    let (outcome, ()) = tokio::join!(gdb.proceed(Scope::None), async {
        fake.expect("-exec-continue").await;
        fake.hang_up();
    });
    assert!(matches!(outcome, Err(GdbError::Process(_))));

    let reason = tokio::time::timeout(Duration::from_secs(5), gdb.closed()).await.unwrap();
    assert!(matches!(reason, GdbError::Process(text) if text.contains("closed")));
    assert!(gdb.is_closed());
    assert!(matches!(gdb.step_over(Scope::None).await, Err(GdbError::Process(_))));

    let mut events = gdb.subscribe();
    assert_eq!(events.next().await, None);
}

#[tokio::test]
async fn test_enable_async_falls_back_to_target_async()
{
    let (gdb, mut fake) = connect();
    let (outcome, ()) = tokio::join!(gdb.enable_async(), async {
        fake.reply("-gdb-set mi-async on", &[r#"^error,msg="No symbol \"mi-async\" in current context.""#])
            .await;
        fake.reply("-gdb-set target-async on", &["^done"]).await;
        fake.reply("-gdb-set non-stop on", &["^done"]).await;
    });
    outcome.unwrap();
    assert!(gdb.is_async());

    let (outcome, ()) = tokio::join!(gdb.interrupt(Scope::Thread(ThreadId(2))), async {
        fake.reply("-exec-interrupt --thread 2", &["^done"]).await;
    });
    outcome.unwrap();
}

struct CountingSignal(AtomicUsize);

impl SignalTarget for CountingSignal
{
    fn interrupt(&self) -> std::io::Result<()>
    {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_sync_interrupt_uses_signal_target()
{
    let signal = Arc::new(CountingSignal(AtomicUsize::new(0)));
    let target: Arc<dyn SignalTarget> = signal.clone();
    let (gdb, _fake) = connect_with(ClientConfig::default().with_load_scripts(false), |t| t.with_signal(target));
    gdb.interrupt(Scope::None).await.unwrap();
    assert_eq!(signal.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_sync_interrupt_ignores_scope()
{
    let signal = Arc::new(CountingSignal(AtomicUsize::new(0)));
    let target: Arc<dyn SignalTarget> = signal.clone();
    let (gdb, mut fake) = connect_with(ClientConfig::default().with_load_scripts(false), |t| t.with_signal(target));
    gdb.interrupt(Scope::Thread(ThreadId(3))).await.unwrap();
    assert_eq!(signal.0.load(Ordering::SeqCst), 1);

    // nothing was written for the scope
    let (outcome, ()) = tokio::join!(gdb.exec_mi("-gdb-version", Scope::None), async {
        fake.reply("-gdb-version", &["^done"]).await;
    });
    outcome.unwrap();
}

#[tokio::test]
async fn test_sync_interrupt_without_signal_target_fails()
{
    let (gdb, _fake) = connect();
    assert!(matches!(gdb.interrupt(Scope::None).await, Err(GdbError::NoInterruptTarget)));
}

#[tokio::test]
async fn test_init_uploads_scripts_in_order()
{
    let (gdb, mut fake) = connect_with(ClientConfig::default(), |t| t);
    let (outcome, ()) = tokio::join!(gdb.init(), async {
        for (i, script) in SCRIPTS.iter().enumerate() {
            let line = fake.next_command().await;
            assert_eq!(line, console(&python_command(script.source)), "script {}", script.name);
            if i == 0 {
                assert!(line.starts_with(r#"-interpreter-exec console "python exec(\""#), "{line}");
                assert!(line.contains("class BaseCommand"));
            }
            fake.send(&["^done", "(gdb)"]).await;
        }
    });
    outcome.unwrap();
    assert_eq!(SCRIPTS[0].name, "base");
}

#[tokio::test]
async fn test_init_stops_at_first_refused_script()
{
    let (gdb, mut fake) = connect_with(ClientConfig::default(), |t| t);
    let (outcome, ()) = tokio::join!(gdb.init(), async {
        fake.expect(&console(&python_command(SCRIPTS[0].source))).await;
        fake.send(&["^done", "(gdb)"]).await;
        fake.expect(&console(&python_command(SCRIPTS[1].source))).await;
        fake.send(&[r#"^error,msg="Error while executing Python code.""#, "(gdb)"])
            .await;
    });

    let err = outcome.unwrap_err();
    assert!(matches!(&err, GdbError::ScriptLoad { script: "exec", source } if matches!(**source, GdbError::Command(_))));

    // no later script went out: the next line is the command sent now
    let (outcome, ()) = tokio::join!(gdb.exec_mi("-gdb-version", Scope::None), async {
        fake.reply("-gdb-version", &["^done"]).await;
    });
    outcome.unwrap();
}
