use anyhow::{anyhow, Context};
use clap::Parser;
use fluidpendant::{
    describe_alarm, describe_error, engine_config, init_logging, list_ports, Config,
    EngineEvent, MachineSnapshot, PendantEngine, RealtimeCommand, SendOptions, SerialTransport,
    BUILD_DATE, VERSION,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

const TICK: Duration = Duration::from_millis(10);

/// Headless FluidNC pendant: watches controller state over a serial port
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port; overrides the config file. "Auto" picks the first CNC port.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate; overrides the config file
    #[arg(short, long)]
    baud: Option<u32>,

    /// Config file (.toml or .json). Defaults to the user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List candidate serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Line command to send once the controller is heard (repeatable)
    #[arg(short, long = "send")]
    send: Vec<String>,

    /// Print state changes as JSON snapshots
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            Err(e) => {
                tracing::debug!("No default config location: {}", e);
                Config::default()
            }
        },
    };
    if let Some(port) = &args.port {
        config.connection.port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.connection.baud_rate = baud;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_port(config: &Config) -> anyhow::Result<String> {
    if !config.connection.is_auto_port() {
        return Ok(config.connection.port.clone());
    }
    let ports = list_ports()?;
    let port = ports
        .first()
        .ok_or_else(|| anyhow!("No CNC serial port found; use --port"))?;
    tracing::info!("Using {} ({})", port.port_name, port.description);
    Ok(port.port_name.clone())
}

fn log_event(event: &EngineEvent) {
    match event {
        EngineEvent::LinkLost => tracing::warn!("{}", event),
        EngineEvent::Alarm(code) => tracing::warn!("ALARM:{} {}", code, describe_alarm(*code)),
        EngineEvent::ProtocolError(code) => {
            tracing::warn!("error:{} {}", code, describe_error(*code))
        }
        EngineEvent::LineDropped { .. } => tracing::warn!("{}", event),
        EngineEvent::Unrecognized(_) => tracing::debug!("{}", event),
        _ => tracing::info!("{}", event),
    }
}

fn print_state(snapshot: &MachineSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        println!("{}", snapshot.summary());
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();

    if args.list_ports {
        for port in list_ports()? {
            println!("{}\t{}", port.port_name, port.description);
        }
        return Ok(());
    }

    tracing::info!("fluidpendant {} (built {})", VERSION, BUILD_DATE);
    let config = load_config(&args)?;
    let port = resolve_port(&config)?;
    let transport = SerialTransport::open(&port, config.connection.baud_rate).map_err(|e| {
        tracing::error!("Cannot open {}: {}", port, e);
        anyhow!(e)
    })?;

    let mut engine = PendantEngine::new(transport, engine_config(&config));
    let mut pending: VecDeque<String> = args.send.iter().cloned().collect();
    let mut last_summary = String::new();

    let mut ticker = tokio::time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Interrupted, resetting controller");
                if let Err(e) = engine.send_realtime(RealtimeCommand::Reset, Instant::now()) {
                    tracing::warn!("Reset not sent: {}", e);
                }
                break;
            }
            _ = ticker.tick() => {
                let now = Instant::now();
                engine.poll(now);

                for event in engine.drain_events() {
                    log_event(&event);
                    if matches!(event, EngineEvent::Banner(_)) {
                        let modes = fluidpendant::command_creator::modes_query();
                        if let Err(e) = engine.send_line_with(&modes, SendOptions::queued(), now) {
                            tracing::warn!("Modes query not sent: {}", e);
                        }
                    }
                }

                if engine.is_connected() && engine.recognized_lines() > 0 && !engine.is_busy() {
                    if let Some(line) = pending.pop_front() {
                        match engine.send_line(&line, now) {
                            Ok(ticket) => tracing::info!("Sent {} '{}'", ticket, line),
                            Err(e) if e.is_busy() => pending.push_front(line),
                            Err(e) => tracing::warn!("Not sending '{}': {}", line, e),
                        }
                    }
                }

                let snapshot = engine.snapshot(now);
                let summary = snapshot.summary();
                if summary != last_summary {
                    print_state(&snapshot, args.json)?;
                    last_summary = summary;
                }
            }
        }
    }

    Ok(())
}
