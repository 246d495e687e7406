use std::env;
use std::net::SocketAddr;

use roster_api::{serve, EngineApi};
use roster_core::gacha::DrawKind;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!("roster-cli <command>");
    println!("commands:");
    println!("  snapshot");
    println!("  draw <normal|advanced>");
    println!("  pickup <name>");
    println!("  grant <amount>");
    println!("  import <csv_url>");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080");
    println!("sqlite path comes from ROSTER_SQLITE_PATH (default partner_roster.sqlite)");
}

fn default_sqlite_path() -> String {
    env::var("ROSTER_SQLITE_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "partner_roster.sqlite".to_string())
}

fn default_draw_seed() -> u64 {
    env::var("ROSTER_DRAW_SEED")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or(0)
        })
}

fn open_api() -> Result<EngineApi, String> {
    EngineApi::open(default_sqlite_path(), default_draw_seed())
        .map_err(|err| format!("failed to open roster database: {err}"))
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let raw = value.map(String::as_str).unwrap_or("127.0.0.1:8080");
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn parse_draw_kind(value: Option<&String>) -> Result<DrawKind, String> {
    match value.map(String::as_str) {
        Some("normal") => Ok(DrawKind::Normal),
        Some("advanced") => Ok(DrawKind::Advanced),
        Some(other) => Err(format!("invalid draw kind: {other}")),
        None => Err("missing draw kind".to_string()),
    }
}

fn parse_amount(value: Option<&String>) -> Result<i64, String> {
    let raw = value.ok_or_else(|| "missing amount".to_string())?;
    raw.parse::<i64>()
        .map_err(|_| format!("invalid amount: {raw}"))
}

fn show_snapshot() -> Result<(), String> {
    let mut api = open_api()?;
    let snapshot = api.snapshot().map_err(|err| err.to_string())?;
    println!(
        "sdp={} owned={} in_party={} pool={}",
        snapshot.sdp, snapshot.owned_count, snapshot.in_party_count, snapshot.pool_count
    );
    for (slot, id) in &snapshot.party_slots {
        let label = if id.is_empty() { "-" } else { id.as_str() };
        println!("  {}: {}", slot.as_str(), label);
    }
    for partner in &snapshot.owned_partners {
        println!(
            "  {} [{}] {} {} lvl={}{}",
            partner.name,
            partner.grade.as_str(),
            partner.class.as_str(),
            partner.job,
            partner.level,
            if partner.in_party { " (party)" } else { "" },
        );
    }
    Ok(())
}

fn run_draw(kind: DrawKind) -> Result<(), String> {
    let mut api = open_api()?;
    let result = api.draw_gacha(kind).map_err(|err| err.to_string())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&result).map_err(|err| err.to_string())?
    );
    Ok(())
}

fn run_pickup(name: &str) -> Result<(), String> {
    let mut api = open_api()?;
    let result = api.pickup_by_name(name).map_err(|err| err.to_string())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&result).map_err(|err| err.to_string())?
    );
    Ok(())
}

fn run_grant(amount: i64) -> Result<(), String> {
    let mut api = open_api()?;
    let balance = api.grant_sdp(amount).map_err(|err| err.to_string())?;
    println!("balance={balance}");
    Ok(())
}

async fn run_import(url: &str) -> Result<(), String> {
    let mut api = open_api()?;
    api.set_pool_csv_url(url).map_err(|err| err.to_string())?;
    let result = api
        .refresh_pool_from_csv()
        .await
        .map_err(|err| err.to_string())?;
    println!("ok={} count={} {}", result.ok, result.count, result.message);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    let outcome = match command {
        Some("snapshot") => show_snapshot(),
        Some("draw") => parse_draw_kind(args.get(2)).and_then(run_draw),
        Some("pickup") => match args.get(2) {
            Some(name) => run_pickup(name),
            None => Err("missing name".to_string()),
        },
        Some("grant") => parse_amount(args.get(2)).and_then(run_grant),
        Some("import") => match args.get(2) {
            Some(url) => run_import(url).await,
            None => Err("missing csv_url".to_string()),
        },
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                println!("serving roster api on http://{addr}");
                serve(addr).await.map_err(|err| format!("server error: {err}"))
            }
            Err(err) => Err(err),
        },
        _ => {
            print_usage();
            return;
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        print_usage();
        std::process::exit(2);
    }
}
