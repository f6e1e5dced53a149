//! Scripted stand-in for a gdb process, talking MI over an in-memory pipe.

#![allow(dead_code)]

use std::time::Duration;

use gdbmi_core::{ClientConfig, Gdb, Interpreter, Transport};
use gdbmi_protocol::quote;
use gdbmi_protocol::sentinel::{encode_command_output, encode_event};
use serde_json::Value as Json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};

const TIMEOUT: Duration = Duration::from_secs(5);

/// The gdb side of the pipe.
pub struct FakeGdb
{
    commands: Lines<BufReader<ReadHalf<DuplexStream>>>,
    output: WriteHalf<DuplexStream>,
}

/// A client wired to a fake gdb, scripts disabled.
pub fn connect() -> (Gdb, FakeGdb)
{
    connect_with(ClientConfig::default().with_load_scripts(false), |t| t)
}

/// A client wired to a fake gdb with custom config and transport tweaks.
pub fn connect_with(config: ClientConfig, adjust: impl FnOnce(Transport) -> Transport) -> (Gdb, FakeGdb)
{
    let (client_side, gdb_side) = tokio::io::duplex(64 * 1024);
    let (client_read, client_write) = tokio::io::split(client_side);
    let (gdb_read, gdb_write) = tokio::io::split(gdb_side);
    let gdb = Gdb::new(adjust(Transport::new(client_read, client_write)), config);
    let fake = FakeGdb {
        commands: BufReader::new(gdb_read).lines(),
        output: gdb_write,
    };
    (gdb, fake)
}

/// Wire text of a console command.
pub fn console(text: &str) -> String
{
    Interpreter::Console.wire_text(text)
}

/// Console record carrying an extension command result.
pub fn command_output(name: &str, payload: &Json) -> String
{
    format!("~{}", quote(&format!("{}\n", encode_command_output(name, payload))))
}

/// Console record carrying a custom event.
pub fn event_output(name: &str, payload: &Json) -> String
{
    format!("~{}", quote(&format!("{}\n", encode_event(name, payload))))
}

impl FakeGdb
{
    /// Next command line the client wrote.
    pub async fn next_command(&mut self) -> String
    {
        tokio::time::timeout(TIMEOUT, self.commands.next_line())
            .await
            .expect("client wrote nothing")
            .expect("pipe failed")
            .expect("client closed its side")
    }

    /// Assert the next command equals `expected`.
    pub async fn expect(&mut self, expected: &str)
    {
        assert_eq!(self.next_command().await, expected);
    }

    /// Write output lines, each followed by a newline.
    pub async fn send(&mut self, lines: &[&str])
    {
        for line in lines {
            self.output.write_all(line.as_bytes()).await.expect("write");
            self.output.write_all(b"\n").await.expect("write");
        }
        self.output.flush().await.expect("flush");
    }

    /// Expect `command`, then answer with `lines` and a prompt.
    pub async fn reply(&mut self, command: &str, lines: &[&str])
    {
        self.expect(command).await;
        self.send(lines).await;
        self.send(&["(gdb)"]).await;
    }

    /// Answer the current-thread query.
    pub async fn reply_current_thread(&mut self, payload: &Json)
    {
        let output = command_output("thread", payload);
        self.reply(&console("gdbjs-thread"), &[&output, "^done"]).await;
    }

    /// Close gdb's side, as if the process exited.
    pub fn hang_up(self) {}
}
