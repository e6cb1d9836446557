//! Points auction engine - console driver.
//!
//! Runs the session coordinator against a JSON-file ledger, with a console
//! notification surface and a stdin command loop standing in for the chat
//! platform:
//!
//! ```text
//! ┌────────────────┐    Command     ┌──────────────────────┐
//! │  stdin reader  │ ─────────────► │  engine loop          │
//! │  (Thread A)    │   (channel)    │  tick + command pump  │
//! └────────────────┘                └──────────────────────┘
//! ```
//!
//! Commands:
//!   bid <member> <amount>   propose a bid as <member>
//!   confirm <member>        confirm that member's pending bid
//!   cancel <member>         cancel that member's pending bid
//!   start                   start the session
//!   pause / resume          suspend or resume the active countdown
//!   close                   force-close the current lot
//!   extend <secs>           push the current deadline out
//!   status                  print queue/lot/lock state
//!   quit                    exit

mod config;

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{error, warn};

use session::{AuctionEvent, SessionCoordinator, SessionConfig, SessionHook};
use storage::SqliteStore;
use types::{ConfirmationId, MemberId, Points, Timestamp};

use config::{JsonLedger, load_lots};

/// Points auction engine - sequential lots, two-phase bids, anti-snipe.
#[derive(Parser, Debug)]
#[command(name = "points-auction")]
#[command(about = "Points-based sequential auction engine with a console driver")]
#[command(version)]
struct Args {
    /// SQLite state database path
    #[arg(long, env = "AUCTION_DB", default_value = "auction.db")]
    db: PathBuf,

    /// Lots file (JSON array of {label, start_price, duration_secs, ...})
    #[arg(long, env = "AUCTION_LOTS", default_value = "lots.json")]
    lots: PathBuf,

    /// Balance file (JSON object of member -> points)
    #[arg(long, env = "AUCTION_BALANCES", default_value = "balances.json")]
    balances: PathBuf,

    /// Directory for session result files
    #[arg(long, env = "AUCTION_RESULTS_DIR", default_value = ".")]
    results_dir: PathBuf,

    /// Start the session immediately instead of waiting for `start`
    #[arg(long, env = "AUCTION_AUTO_START")]
    auto_start: bool,

    /// Engine loop cadence in milliseconds
    #[arg(long, env = "AUCTION_TICK_MS", default_value_t = 250)]
    tick_ms: u64,
}

/// Inbound console commands.
#[derive(Debug)]
enum Command {
    Bid { member: String, amount: i64 },
    Confirm { member: String },
    Cancel { member: String },
    Start,
    Pause,
    Resume,
    Close,
    Extend { secs: u64 },
    Status,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_lowercase();
    match verb.as_str() {
        "bid" | "b" => Some(Command::Bid {
            member: parts.next()?.to_string(),
            amount: parts.next()?.parse().ok()?,
        }),
        "confirm" | "c" => Some(Command::Confirm {
            member: parts.next()?.to_string(),
        }),
        "cancel" | "x" => Some(Command::Cancel {
            member: parts.next()?.to_string(),
        }),
        "start" => Some(Command::Start),
        "pause" => Some(Command::Pause),
        "resume" => Some(Command::Resume),
        "close" => Some(Command::Close),
        "extend" => Some(Command::Extend {
            secs: parts.next()?.parse().ok()?,
        }),
        "status" => Some(Command::Status),
        "quit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as Timestamp
}

/// Session label in the ledger's `MM/DD/YY HH:MM` convention.
fn session_label(now: Timestamp) -> String {
    let secs = now / 1_000;
    let days = secs / 86_400;
    let (year, month, day) = civil_from_days(days as i64);
    let hh = (secs % 86_400) / 3_600;
    let mm = (secs % 3_600) / 60;
    format!("{:02}/{:02}/{:02} {:02}:{:02}", month, day, year % 100, hh, mm)
}

/// Days-since-epoch to (year, month, day), Gregorian.
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    (if m <= 2 { y + 1 } else { y }, m as u32, d)
}

/// Console notification surface.
struct ConsoleHook;

impl SessionHook for ConsoleHook {
    fn name(&self) -> &str {
        "ConsoleHook"
    }

    fn on_event(&self, event: &AuctionEvent) {
        match event {
            AuctionEvent::SessionStarted { lots, label } => {
                println!(">> Session started ({}) - {} lot(s) queued", label, lots);
            }
            AuctionEvent::LotPreview {
                lot,
                position,
                total,
                opens_in_ms,
            } => {
                println!(
                    ">> UP NEXT [{}/{}]: {} - starting at {}pts, bidding opens in {}s",
                    position,
                    total,
                    lot,
                    lot.start_price,
                    opens_in_ms / 1_000
                );
            }
            AuctionEvent::LotActive {
                label, current_bid, ..
            } => {
                println!(
                    ">> BIDDING NOW: {} - current {}pts (bid <member> <amount>)",
                    label, current_bid
                );
            }
            AuctionEvent::Milestone {
                kind,
                current_bid,
                leader,
                remaining_ms,
                ..
            } => {
                let current = match leader {
                    Some(name) => format!("{} - {}pts", name, current_bid),
                    None => format!("{}pts (no bids)", current_bid),
                };
                println!(
                    ">> {}! {}s left - {}",
                    kind.label(),
                    remaining_ms / 1_000,
                    current
                );
            }
            AuctionEvent::ConfirmRequired {
                name,
                amount,
                needed,
                is_self,
                ..
            } => {
                let note = if *is_self {
                    format!(" (self-overbid, +{}pts needed)", needed)
                } else {
                    String::new()
                };
                println!(
                    ">> {} proposed {}pts{} - confirm or cancel within 10s",
                    name, amount, note
                );
            }
            AuctionEvent::HighBid { name, amount, .. } => {
                println!(">> NEW HIGH BID: {} - {}pts", name, amount);
            }
            AuctionEvent::Outbid {
                name, new_amount, label, ..
            } => {
                println!(">> {} outbid on {} (now {}pts)", name, label, new_amount);
            }
            AuctionEvent::ConfirmationExpired { name, .. } => {
                println!(">> {}'s bid timed out - not placed", name);
            }
            AuctionEvent::ConfirmationCanceled { name, .. } => {
                println!(">> {}'s bid canceled", name);
            }
            AuctionEvent::DeadlineExtended {
                extension_count, ..
            } => {
                println!(">> Deadline extended (extension #{})", extension_count);
            }
            AuctionEvent::LotSold { result } => {
                println!(">> SOLD: {}", result.lot);
                for winner in &result.winners {
                    println!("     {} - {}pts", winner.name, winner.amount);
                }
            }
            AuctionEvent::LotUnsold { lot, will_requeue } => {
                let note = if *will_requeue {
                    "re-queued for next session"
                } else {
                    "logged, not re-queued"
                };
                println!(">> NO BIDS: {} ({})", lot, note);
            }
            AuctionEvent::NextLot {
                label,
                start_price,
                starts_in_ms,
            } => {
                println!(
                    ">> Next in {}s: {} - {}pts",
                    starts_in_ms / 1_000,
                    label,
                    start_price
                );
            }
            AuctionEvent::SessionPaused { remaining_ms } => {
                println!(">> Paused with {}s remaining", remaining_ms / 1_000);
            }
            AuctionEvent::SessionResumed { .. } => {
                println!(">> Resumed");
            }
            AuctionEvent::CacheRefreshed { members } => {
                println!(">> Balances refreshed ({} members)", members);
            }
            AuctionEvent::SessionFinalized { stats, .. } => {
                println!(
                    ">> Session complete: {} lot(s), {} sold, {} unsold, {}pts total",
                    stats.lots_run, stats.lots_sold, stats.lots_unsold, stats.total_revenue
                );
            }
            AuctionEvent::SubmissionFailed { results, error } => {
                println!(">> RESULT SUBMISSION FAILED: {}", error);
                println!(">> Enter these manually:");
                for row in results {
                    if row.total_spent.is_positive() {
                        println!("     {} spent {}pts", row.member, row.total_spent);
                    }
                }
            }
            AuctionEvent::StateRestored {
                queued,
                holds,
                active_lot,
            } => {
                println!(
                    ">> State recovered: {} queued lot(s), {} hold(s), active: {}",
                    queued,
                    holds,
                    active_lot.as_deref().unwrap_or("none")
                );
            }
        }
    }
}

/// Maps console member names to stable ids and tracks open confirmation
/// handles per member.
struct MemberDirectory {
    ids: HashMap<String, MemberId>,
    handles: HashMap<MemberId, ConfirmationId>,
    next_id: u64,
}

impl MemberDirectory {
    fn new() -> Self {
        Self {
            ids: HashMap::new(),
            handles: HashMap::new(),
            next_id: 1,
        }
    }

    fn id_of(&mut self, name: &str) -> MemberId {
        let key = name.to_lowercase();
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = MemberId(self.next_id);
        self.next_id += 1;
        self.ids.insert(key, id);
        id
    }
}

fn run_engine(mut coordinator: SessionCoordinator, rx: Receiver<Command>, args: &Args) {
    let mut directory = MemberDirectory::new();
    let tick = Duration::from_millis(args.tick_ms.max(50));

    loop {
        let now = now_ms();
        coordinator.tick(now);

        while let Ok(command) = rx.try_recv() {
            let now = now_ms();
            match command {
                Command::Bid { member, amount } => {
                    let id = directory.id_of(&member);
                    match coordinator.propose_bid(now, id, &member, Points(amount)) {
                        Ok(receipt) => {
                            directory.handles.insert(id, receipt.id);
                        }
                        Err(err) => println!("!! bid rejected: {}", err),
                    }
                }
                Command::Confirm { member } => {
                    let id = directory.id_of(&member);
                    match directory.handles.remove(&id) {
                        Some(handle) => {
                            if let Err(err) = coordinator.confirm_bid(now, handle, id, false) {
                                println!("!! confirm rejected: {}", err);
                            }
                        }
                        None => println!("!! {} has no pending bid", member),
                    }
                }
                Command::Cancel { member } => {
                    let id = directory.id_of(&member);
                    match directory.handles.remove(&id) {
                        Some(handle) => {
                            if let Err(err) = coordinator.cancel_bid(handle, id, false) {
                                println!("!! cancel rejected: {}", err);
                            }
                        }
                        None => println!("!! {} has no pending bid", member),
                    }
                }
                Command::Start => {
                    if let Err(err) = coordinator.start_session(now, &session_label(now)) {
                        println!("!! start rejected: {}", err);
                    }
                }
                Command::Pause => {
                    if let Err(err) = coordinator.pause(now) {
                        println!("!! pause rejected: {}", err);
                    }
                }
                Command::Resume => {
                    if let Err(err) = coordinator.resume(now) {
                        println!("!! resume rejected: {}", err);
                    }
                }
                Command::Close => {
                    if let Err(err) = coordinator.close_current(now) {
                        println!("!! close rejected: {}", err);
                    }
                }
                Command::Extend { secs } => {
                    if let Err(err) = coordinator.extend_current(now, secs * 1_000) {
                        println!("!! extend rejected: {}", err);
                    }
                }
                Command::Status => print_status(&coordinator, now),
                Command::Quit => {
                    println!(">> bye");
                    return;
                }
            }
        }

        thread::sleep(tick);
    }
}

fn print_status(coordinator: &SessionCoordinator, now: Timestamp) {
    println!(
        "-- session: {} | queued lots: {}",
        if coordinator.session_active() {
            "active"
        } else {
            "idle"
        },
        coordinator.queue_len()
    );
    if let Some(runtime) = coordinator.engine().active() {
        let leader = runtime
            .leader_name()
            .map(String::as_str)
            .unwrap_or("none");
        println!(
            "-- lot: {} [{:?}] current {}pts, leader {}, {}s left, {} extension(s)",
            runtime.lot,
            runtime.status,
            runtime.current_bid,
            leader,
            runtime.remaining(now) / 1_000,
            runtime.extension_count
        );
    }
    for (name, held) in coordinator.engine().locks().iter() {
        println!("-- hold: {} {}pts", name, held);
    }
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = match SqliteStore::from_path(&args.db) {
        Ok(store) => store,
        Err(err) => {
            error!(%err, db = %args.db.display(), "could not open state database");
            std::process::exit(1);
        }
    };

    let ledger = JsonLedger::new(args.balances.clone(), args.results_dir.clone());
    let mut coordinator = SessionCoordinator::new(SessionConfig::default(), Box::new(ledger))
        .with_store(Box::new(store));
    coordinator.add_hook(Arc::new(ConsoleHook));

    let now = now_ms();
    coordinator.restore(now);

    // Seed the queue from the lots file unless recovery brought one back.
    if coordinator.queue_len() == 0 && !coordinator.session_active() {
        match load_lots(&args.lots) {
            Ok(specs) => {
                for spec in &specs {
                    coordinator.enqueue(
                        &spec.label,
                        Points(spec.start_price),
                        spec.duration_ms(),
                        spec.quantity,
                        spec.provenance(),
                    );
                }
                println!(">> {} lot(s) queued from {}", specs.len(), args.lots.display());
            }
            Err(err) => warn!(%err, "no lots loaded"),
        }
    }

    if args.auto_start && !coordinator.session_active() {
        if let Err(err) = coordinator.start_session(now, &session_label(now)) {
            error!(%err, "auto-start failed");
        }
    }

    // stdin reader thread; the engine loop owns the coordinator.
    let (tx, rx): (Sender<Command>, Receiver<Command>) = bounded(64);
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None => println!("!! unrecognized command: {}", line.trim()),
            }
        }
        let _ = tx.send(Command::Quit);
    });

    run_engine(coordinator, rx, &args);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert!(matches!(
            parse_command("bid Ayla 150"),
            Some(Command::Bid { ref member, amount: 150 }) if member == "Ayla"
        ));
        assert!(matches!(parse_command("b Ayla 150"), Some(Command::Bid { .. })));
        assert!(matches!(
            parse_command("confirm ayla"),
            Some(Command::Confirm { .. })
        ));
        assert!(matches!(parse_command("extend 90"), Some(Command::Extend { secs: 90 })));
        assert!(matches!(parse_command("quit"), Some(Command::Quit)));
        assert!(parse_command("bid Ayla").is_none());
        assert!(parse_command("frobnicate").is_none());
    }

    #[test]
    fn test_session_label_format() {
        // 2026-07-15 20:30:00 UTC
        let label = session_label(1_784_320_200_000);
        assert_eq!(label.len(), 14);
        assert_eq!(&label[2..3], "/");
        assert_eq!(&label[8..9], " ");
    }

    #[test]
    fn test_civil_from_days_epoch() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
    }

    #[test]
    fn test_member_directory_is_case_insensitive() {
        let mut directory = MemberDirectory::new();
        let a = directory.id_of("Ayla");
        let b = directory.id_of("ayla");
        assert_eq!(a, b);
        assert_ne!(a, directory.id_of("Bren"));
    }
}
