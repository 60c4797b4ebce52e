//! Line-oriented transports over the gate.
//!
//! One command per line, one rendered reply per command. The TCP
//! listener spawns a plain OS thread per connection — the engine's
//! locking is built for exactly that model. EXIT closes the session.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use crate::gate::{Gate, GateOutcome};

/// Binds `addr` and serves connections until the process exits.
pub fn serve(gate: Arc<Gate>, addr: &str) -> io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    info!(%addr, "listening");
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let gate = Arc::clone(&gate);
                thread::spawn(move || {
                    if let Err(e) = handle_client(&gate, stream) {
                        warn!("client error: {e}");
                    }
                });
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }
    Ok(())
}

fn handle_client(gate: &Gate, stream: TcpStream) -> io::Result<()> {
    let peer = stream.peer_addr()?;
    debug!(%peer, "client connected");
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match gate.execute(&line) {
            GateOutcome::Terminate => break,
            GateOutcome::Reply(reply) => {
                writer.write_all(reply.to_string().as_bytes())?;
                writer.write_all(b"\n")?;
            }
        }
    }
    debug!(%peer, "client disconnected");
    Ok(())
}

/// Interactive loop over stdin/stdout.
pub fn repl(gate: &Gate) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match gate.execute(&line) {
            GateOutcome::Terminate => break,
            GateOutcome::Reply(reply) => {
                writeln!(stdout, "{reply}")?;
                stdout.flush()?;
            }
        }
    }
    Ok(())
}
