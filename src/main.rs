mod calc;
mod ipc;
mod legacy;
mod logging;
mod ops;
mod store;

use std::io::{self, BufRead, Write};

fn main() {
    let store = match store::Store::open_default() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("notasd: {e:?}");
            std::process::exit(1);
        }
    };

    // Logging is best-effort; the sidecar still runs without it.
    let _logger = store
        .path()
        .parent()
        .and_then(|dir| logging::init(&dir.join("logs")).ok());
    log::info!(
        "notasd {} starting, data file {}",
        env!("CARGO_PKG_VERSION"),
        store.path().display()
    );

    let mut state = ipc::AppState { store };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; ignore.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    log::info!("stdin closed, shutting down");
}
