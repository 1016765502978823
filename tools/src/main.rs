//! ants-runner: headless host for the ant choreography controller.
//!
//! Usage:
//!   ants-runner --seed 12345 --count 150 --db run.db
//!   ants-runner --config ants.json --peer-mode
//!
//! In peer mode, stdin carries one JSON request per line and stdout gets
//! one JSON reply per line, together with the state changes the request
//! produced. This stands in for the remote peers of the sync layer.

use anyhow::Result;
use ants_core::{
    command::ChoreoCommand,
    config::ChoreoConfig,
    engine::Choreographer,
    store::ChoreoStore,
    substrate::{Change, LoopbackSubstrate},
    types::Millis,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PeerRequest {
    Fetch,
    Set {
        path:  String,
        value: serde_json::Value,
    },
    Call {
        path: String,
        #[serde(default)]
        args: serde_json::Value,
    },
    Advance {
        ms: Millis,
    },
    Settle,
    Quit,
}

#[derive(serde::Serialize)]
struct PeerReply {
    ok:      bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result:  Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error:   Option<String>,
    changes: Vec<Change>,
}

type Controller = Choreographer<LoopbackSubstrate>;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let peer_mode = args.iter().any(|a| a == "--peer-mode");
    let db = string_arg(&args, "--db").unwrap_or(":memory:");

    let mut config = match string_arg(&args, "--config") {
        Some(path) => ChoreoConfig::load(path)?,
        None => ChoreoConfig::default(),
    };
    config.initial_count = parse_arg(&args, "--count", config.initial_count);

    if !peer_mode {
        println!("ants-runner");
        println!("  seed:      {seed}");
        println!("  ants:      {}", config.initial_count);
        println!("  canvas:    {}", config.canvas_size);
        println!("  db:        {db}");
        println!();
    }

    let store = ChoreoStore::open(db)?;
    store.migrate()?;

    let run_id = format!("ants-{}", uuid::Uuid::new_v4());
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

    let mut choreo = Choreographer::build(
        run_id.clone(),
        seed,
        config,
        LoopbackSubstrate::new(),
        store,
    )?;
    log::info!("ants-runner ready (run {run_id})");

    if peer_mode {
        // Initial publishes are part of the first fetch, not a change feed.
        choreo.substrate_mut().drain_changes();
        run_peer_loop(&mut choreo)?;
    } else {
        run_demo(&mut choreo)?;
        print_summary(&choreo, &run_id)?;
    }

    Ok(())
}

fn run_peer_loop(choreo: &mut Controller) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let request: PeerRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                let err_json = serde_json::json!({ "ok": false, "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(request, PeerRequest::Quit) {
            break;
        }

        let reply = match handle_request(choreo, request) {
            Ok(result) => PeerReply {
                ok: true,
                result,
                error: None,
                changes: choreo.substrate_mut().drain_changes(),
            },
            Err(e) => PeerReply {
                ok: false,
                result: None,
                error: Some(e.to_string()),
                changes: choreo.substrate_mut().drain_changes(),
            },
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_request(
    choreo: &mut Controller,
    request: PeerRequest,
) -> Result<Option<serde_json::Value>> {
    let result = match request {
        PeerRequest::Fetch => Some(serde_json::to_value(choreo.snapshot())?),
        PeerRequest::Set { path, value } => {
            let (authoritative, _events) = choreo.handle_set(&path, &value)?;
            Some(authoritative)
        }
        PeerRequest::Call { path, args } => {
            let events = choreo.handle_call(&path, &args)?;
            Some(serde_json::json!({ "events": events.len() }))
        }
        PeerRequest::Advance { ms } => {
            let events = choreo.advance_by(ms)?;
            Some(serde_json::json!({ "now": choreo.clock.now, "events": events.len() }))
        }
        PeerRequest::Settle => {
            let events = choreo.run_until_idle()?;
            Some(serde_json::json!({ "now": choreo.clock.now, "events": events.len() }))
        }
        PeerRequest::Quit => None,
    };
    Ok(result)
}

/// Shake, scatter to the edges, then boom, letting each settle.
fn run_demo(choreo: &mut Controller) -> Result<()> {
    for command in [ChoreoCommand::Shake, ChoreoCommand::Edge, ChoreoCommand::Boom] {
        choreo.invoke(command)?;
        let events = choreo.run_until_idle()?;
        log::info!(
            "t={:.1} demo: {} settled after {} events",
            choreo.clock.now,
            command.name(),
            events.len()
        );
    }
    Ok(())
}

fn print_summary(choreo: &Controller, run_id: &str) -> Result<()> {
    let store = choreo.store();
    let created = store.event_count(run_id, "ant_created")?;
    let updated = store.event_count(run_id, "ant_updated")?;
    let staggers = store.event_count(run_id, "stagger_scheduled")?;
    let skipped = store.event_count(run_id, "stale_update_skipped")?;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");
    println!("  final t (ms):   {:.1}", choreo.clock.now);
    println!("  live ants:      {}", choreo.registry().len());
    println!("  ants created:   {created}");
    println!("  staggers:       {staggers}");
    println!("  ant updates:    {updated}");
    println!("  stale skipped:  {skipped}");
    println!("  global delay:   {}", choreo.delay_value());
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    string_arg(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
