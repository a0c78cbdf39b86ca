//! Civind Headless Simulation Harness
//!
//! Builds a seeded sandbox galaxy, runs the civilian industry for a number
//! of simulated seconds and validates economy invariants along the way.
//! Runs entirely in-process, with no game host attached.
//!
//! Usage:
//!   cargo run -p civind-simtest
//!   cargo run -p civind-simtest -- --verbose --seconds 600 --seed 7
//!   cargo run -p civind-simtest -- --config industry.json --json

use civind_core::host::{EntityClass, HostView};
use civind_core::prelude::*;
use civind_core::sandbox::SandboxWorld;

const PLAYER: FactionId = FactionId(1);

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Options {
    verbose: bool,
    json: bool,
    seconds: u32,
    seed: u64,
    planets: usize,
    config: Option<String>,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options {
        verbose: false,
        json: false,
        seconds: 300,
        seed: 42,
        planets: 12,
        config: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" => options.verbose = true,
            "--json" => options.json = true,
            "--seconds" => options.seconds = parse_value(&arg, args.next())?,
            "--seed" => options.seed = parse_value(&arg, args.next())?,
            "--planets" => options.planets = parse_value(&arg, args.next())?,
            "--config" => options.config = Some(args.next().ok_or("--config needs a path")?),
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(options)
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| format!("{} needs a numeric value", flag))
}

fn main() {
    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    let verbose = options.verbose;
    println!("=== Civind Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Configuration
    let config = load_config(&options, &mut results).unwrap_or_default();

    // 2. Bootstrap
    let mut host = SandboxWorld::generate(options.seed, options.planets, PLAYER);
    let mut engine = IndustryEngine::new(config);
    results.extend(validate_bootstrap(&mut engine, &mut host, verbose));

    // 3. Long run with invariant sweeps
    results.extend(validate_long_run(&mut engine, &mut host, options.seconds, verbose));

    // 4. Cargo fleet
    results.extend(validate_cargo_fleet(&engine, &host, verbose));

    // 5. Threat & militia
    results.extend(validate_militia(&engine, &host, verbose));

    // 6. Save/load
    results.extend(validate_persistence(&engine, &host, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if options.json {
        println!("{}", report(&options, &engine, &results));
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn report(options: &Options, engine: &IndustryEngine, results: &[TestResult]) -> String {
    let economy = engine.economy(PLAYER);
    let summary = serde_json::json!({
        "seed": options.seed,
        "planets": options.planets,
        "seconds": options.seconds,
        "ticks": engine.tick_count(),
        "economy": economy.map(|e| serde_json::json!({
            "trade_stations": e.trade_stations.len(),
            "cargo_ships": e.cargo_ships.len(),
            "militia_leaders": e.militia_leaders.len(),
            "build_counter": e.build_counter,
            "militia_counter": e.militia_counter,
        })),
        "results": results
            .iter()
            .map(|r| serde_json::json!({ "name": r.name, "passed": r.passed, "detail": r.detail }))
            .collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&summary).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn load_config(options: &Options, results: &mut Vec<TestResult>) -> Option<IndustryConfig> {
    println!("--- Configuration ---");

    results.push(TestResult {
        name: "config_default_valid".into(),
        passed: IndustryConfig::default().validate().is_ok(),
        detail: "built-in defaults pass validation".into(),
    });

    let path = options.config.as_ref()?;
    match IndustryConfig::from_path(path) {
        Ok(config) => {
            results.push(TestResult {
                name: "config_file_loaded".into(),
                passed: true,
                detail: format!("loaded {}", path),
            });
            Some(config)
        }
        Err(e) => {
            results.push(TestResult {
                name: "config_file_loaded".into(),
                passed: false,
                detail: format!("{}: {}", path, e),
            });
            None
        }
    }
}

// ── 2. Bootstrap ────────────────────────────────────────────────────────

fn validate_bootstrap(engine: &mut IndustryEngine, host: &mut SandboxWorld, verbose: bool) -> Vec<TestResult> {
    println!("--- Bootstrap ---");
    let mut results = Vec::new();

    engine.update(host, 1.0);
    host.apply_intents();

    let Some(economy) = engine.economy(PLAYER) else {
        results.push(TestResult {
            name: "faction_registered".into(),
            passed: false,
            detail: "player faction was not picked up".into(),
        });
        return results;
    };

    results.push(TestResult {
        name: "grand_station_built".into(),
        passed: economy.grand_station.is_some(),
        detail: format!("grand station {:?}", economy.grand_station),
    });

    let command_planets: std::collections::BTreeSet<PlanetId> = host
        .entities_of(PLAYER, EntityClass::CommandCenter)
        .into_iter()
        .filter_map(|id| host.entity(id).map(|e| e.planet))
        .collect();
    results.push(TestResult {
        name: "trade_station_per_command_planet".into(),
        passed: economy.trade_stations.len() == command_planets.len(),
        detail: format!(
            "{} trade stations for {} command planets",
            economy.trade_stations.len(),
            command_planets.len()
        ),
    });

    results.push(TestResult {
        name: "first_cargo_ship".into(),
        passed: economy.cargo_ships.len() == 1,
        detail: format!("{} cargo ships after one tick", economy.cargo_ships.len()),
    });

    if verbose {
        println!(
            "  {} planets, {} resource points",
            host.planet_count(),
            economy.resource_points.len()
        );
    }
    results
}

// ── 3. Long run ─────────────────────────────────────────────────────────

fn validate_long_run(
    engine: &mut IndustryEngine,
    host: &mut SandboxWorld,
    seconds: u32,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Long run ({} s) ---", seconds);
    let mut results = Vec::new();

    let mut ledger_violations = Vec::new();
    let mut counter_violations = 0;
    let mut intents_applied = 0;
    for second in 0..seconds {
        engine.update(host, 1.0);
        intents_applied += host.apply_intents();

        for id in engine.components.ids_with::<ResourceLedger>() {
            let Some(ledger) = engine.components.get::<ResourceLedger>(id) else {
                continue;
            };
            for kind in ResourceKind::ALL {
                let amount = ledger.amount(kind);
                if amount < 0 || amount > ledger.capacity(kind) {
                    ledger_violations.push(format!("t={} {} {}={}", second, id, kind.name(), amount));
                }
            }
        }
        if let Some(economy) = engine.economy(PLAYER) {
            if economy.build_counter < 0 || economy.militia_counter < 0 {
                counter_violations += 1;
            }
        }
        if verbose && second > 0 && second % 60 == 0 {
            if let Some(economy) = engine.economy(PLAYER) {
                println!(
                    "  t={}s ships={} militia={} build={} threat-planets={}",
                    second,
                    economy.cargo_ships.len(),
                    economy.militia_leaders.len(),
                    economy.build_counter,
                    economy.threat.len()
                );
            }
        }
    }

    results.push(TestResult {
        name: "ledger_bounds".into(),
        passed: ledger_violations.is_empty(),
        detail: if ledger_violations.is_empty() {
            "every amount stayed within 0..=capacity".into()
        } else {
            format!(
                "{} violations, first: {}",
                ledger_violations.len(),
                ledger_violations[0]
            )
        },
    });

    results.push(TestResult {
        name: "counters_non_negative".into(),
        passed: counter_violations == 0,
        detail: format!("{} ticks with a negative counter", counter_violations),
    });

    results.push(TestResult {
        name: "movement_planned".into(),
        passed: intents_applied > 0,
        detail: format!("{} movement intents applied", intents_applied),
    });

    results
}

// ── 4. Cargo fleet ──────────────────────────────────────────────────────

fn validate_cargo_fleet(engine: &IndustryEngine, host: &SandboxWorld, verbose: bool) -> Vec<TestResult> {
    println!("--- Cargo fleet ---");
    let mut results = Vec::new();
    let Some(economy) = engine.economy(PLAYER) else {
        return results;
    };

    let minimum = engine.config().min_cargo_ships;
    results.push(TestResult {
        name: "cargo_minimum_fleet".into(),
        passed: economy.cargo_ships.len() >= minimum,
        detail: format!("{} ships (minimum {})", economy.cargo_ships.len(), minimum),
    });

    let mut by_state = std::collections::BTreeMap::new();
    let mut broken = Vec::new();
    for &ship in &economy.cargo_ships {
        match engine.components.get::<ShipStatus>(ship) {
            Some(status) => {
                *by_state.entry(format!("{:?}", status.state)).or_insert(0) += 1;
                let routed = match status.state {
                    ShipState::Idle => true,
                    ShipState::Pathing | ShipState::Loading => status.origin.is_some() && status.destination.is_some(),
                    ShipState::Enroute | ShipState::Unloading => status.destination.is_some(),
                };
                if !routed || host.entity(ship).is_none() {
                    broken.push(ship);
                }
            }
            None => broken.push(ship),
        }
    }
    results.push(TestResult {
        name: "cargo_status_consistent".into(),
        passed: broken.is_empty(),
        detail: if broken.is_empty() {
            format!("states: {:?}", by_state)
        } else {
            format!("{} ships with a missing or inconsistent route", broken.len())
        },
    });

    let goods_held = |ids: &[EntityId]| -> i32 {
        ids.iter()
            .filter_map(|id| engine.components.get::<ResourceLedger>(*id))
            .map(|ledger| ledger.amount(ResourceKind::Goods))
            .sum()
    };
    let aboard = goods_held(&economy.cargo_ships);
    let delivered = goods_held(&economy.trade_stations);
    results.push(TestResult {
        name: "goods_in_circulation".into(),
        passed: economy.trade_stations.is_empty() || aboard + delivered > 0,
        detail: format!("{} goods aboard ships, {} on trade stations", aboard, delivered),
    });

    if verbose {
        println!("  ship states: {:?}", by_state);
    }
    results
}

// ── 5. Threat & militia ─────────────────────────────────────────────────

fn validate_militia(engine: &IndustryEngine, host: &SandboxWorld, verbose: bool) -> Vec<TestResult> {
    println!("--- Threat & militia ---");
    let mut results = Vec::new();
    let Some(economy) = engine.economy(PLAYER) else {
        return results;
    };

    let foreign: Vec<PlanetId> = economy
        .threat
        .entries()
        .map(|(planet, _)| planet)
        .filter(|planet| !host.planet(*planet).is_some_and(|p| p.is_controlled_by(PLAYER)))
        .collect();
    results.push(TestResult {
        name: "threat_only_on_controlled_planets".into(),
        passed: foreign.is_empty(),
        detail: format!("{} planets scored, {} not ours", economy.threat.len(), foreign.len()),
    });

    let mut unfocused = 0;
    let mut states = std::collections::BTreeMap::new();
    for &leader in &economy.militia_leaders {
        let Some(unit) = engine.components.get::<MilitiaUnit>(leader) else {
            unfocused += 1;
            continue;
        };
        *states.entry(format!("{:?}", unit.state)).or_insert(0) += 1;
        if unit.state != MilitiaState::Idle && unit.planet_focus.is_none() {
            unfocused += 1;
        }
    }
    results.push(TestResult {
        name: "militia_focus_valid".into(),
        passed: unfocused == 0,
        detail: format!(
            "{} fleets, {} without a focus, states {:?}",
            economy.militia_leaders.len(),
            unfocused,
            states
        ),
    });

    let outposts = host.count_kind(PLAYER, UnitKind::MilitiaOutpost);
    let deployed = states.get("Defending").copied().unwrap_or(0);
    results.push(TestResult {
        name: "outposts_match_defending".into(),
        passed: outposts >= deployed,
        detail: format!("{} outposts, {} defending fleets", outposts, deployed),
    });

    if verbose {
        let mut threats: Vec<(PlanetId, i32)> = economy.threat.entries().collect();
        threats.sort_by(|a, b| b.1.cmp(&a.1));
        for (planet, threat) in threats.iter().take(5) {
            println!("  {} threat {}", planet, threat);
        }
    }
    results
}

// ── 6. Save/load ────────────────────────────────────────────────────────

fn validate_persistence(engine: &IndustryEngine, host: &SandboxWorld, verbose: bool) -> Vec<TestResult> {
    println!("--- Save/load ---");
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        results.push(TestResult {
            name: "save".into(),
            passed: false,
            detail: e.to_string(),
        });
        return results;
    }

    let mut loaded = IndustryEngine::new(engine.config().clone());
    match loaded.load(&buffer[..]) {
        Ok(()) => {
            let same = loaded.economies == engine.economies
                && loaded.registry == engine.registry
                && loaded.components.ids() == engine.components.ids();
            results.push(TestResult {
                name: "save_load_roundtrip".into(),
                passed: same,
                detail: format!("{} bytes", buffer.len()),
            });
        }
        Err(e) => {
            results.push(TestResult {
                name: "save_load_roundtrip".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    }

    // both copies must keep evolving identically
    let mut original = IndustryEngine::new(engine.config().clone());
    if original.load(&buffer[..]).is_ok() {
        let mut host_a = host.clone();
        let mut host_b = host.clone();
        for _ in 0..30 {
            original.update(&mut host_a, 1.0);
            host_a.apply_intents();
            loaded.update(&mut host_b, 1.0);
            host_b.apply_intents();
        }
        results.push(TestResult {
            name: "resumed_runs_agree".into(),
            passed: original.economies == loaded.economies,
            detail: "two loads of one save advance in lockstep for 30 s".into(),
        });
    }

    if verbose {
        println!("  save size: {} bytes", buffer.len());
    }
    results
}
