//! smalltown — smallest runnable world for the tiletown kernel.
//!
//! Two human players and six bots share a 32×24 town for a couple of
//! simulated minutes: bots wander, pick zone activities, chat, and — in the
//! right districts — rob and brawl.  Everything runs on a synthetic wall
//! clock, so two runs with the same seed produce identical worlds.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use tt_core::{WallTime, WorldConfig};
use tt_engine::Supervisor;
use tt_map::{Tile, WorldMap, Zone, ZoneRect};
use tt_ops::ScriptedMind;
use tt_store::{export_store, CsvWriter, SqliteWriter, TownStore};
use tt_world::{Input, Personality, ReturnValue};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:        u64 = 42;
const HUMAN_COUNT: usize = 2;
const BOT_COUNT:   usize = 6;
const STEPS:       u64 = 120; // 1 wall second per step ≈ 2 simulated minutes

// ── Map ───────────────────────────────────────────────────────────────────────

/// A 32×24 town: districts in the corners, commons in the middle, a small
/// blocked block for the pathfinder to route around.
fn build_map() -> Result<WorldMap> {
    let mut map = WorldMap::new(32, 24)?;
    map.add_zone(ZoneRect::new(Zone::DarkAlley, 0, 0, 6, 6))?;
    map.add_zone(ZoneRect::new(Zone::Casino, 25, 0, 31, 6))?;
    map.add_zone(ZoneRect::new(Zone::Market, 12, 0, 19, 4))?;
    map.add_zone(ZoneRect::new(Zone::Underground, 0, 17, 6, 23))?;
    map.add_zone(ZoneRect::new(Zone::Suburb, 25, 17, 31, 23))?;
    map.add_zone(ZoneRect::new(Zone::Park, 12, 19, 19, 23))?;
    for x in 14..18 {
        for y in 10..13 {
            map.set_blocked(Tile::new(x, y));
        }
    }
    Ok(map)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("=== smalltown — tiletown kernel demo ===");
    println!("Humans: {HUMAN_COUNT}  |  Bots: {BOT_COUNT}  |  Steps: {STEPS}  |  Seed: {SEED}");
    println!();

    // 1. World and supervisor.
    let map = build_map()?;
    let mut supervisor = Supervisor::new();
    let world_id = supervisor.get_or_create_default(
        WorldConfig::with_seed(SEED),
        map,
        Box::new(ScriptedMind),
        WallTime(0),
    );
    supervisor.start(world_id, WallTime(0))?;

    // 2. Seed the journal: two humans, six bots across personalities.
    let personalities = [
        Personality::Criminal,
        Personality::Criminal,
        Personality::Gambler,
        Personality::Gambler,
        Personality::Worker,
        Personality::Worker,
    ];
    {
        let journal = &mut supervisor.slot_mut(world_id)?.journal;
        for i in 0..HUMAN_COUNT {
            journal.append(Input::Join {
                name:             format!("human-{i}"),
                character:        format!("f{}", i + 1),
                identity:         "a visitor from outside".to_string(),
                token_identifier: Some(format!("token-{i}")),
            }, WallTime(0))?;
        }
        for (i, personality) in personalities.iter().take(BOT_COUNT).enumerate() {
            journal.append(Input::CreateAgent {
                name:            format!("bot-{i}"),
                character:       format!("m{}", i + 1),
                identity:        format!("townsfolk #{i}"),
                plan:            "make a living".to_string(),
                personality:     *personality,
                ai_arena_bot_id: format!("arena-{i}"),
                initial_zone:    None,
            }, WallTime(0))?;
        }
    }

    // 3. Run the scheduler on a synthetic wall clock.
    let t0 = Instant::now();
    let mut wall = 0u64;
    let mut human_ids = Vec::new();
    for step in 0..STEPS {
        wall += 1_000;
        supervisor.record_view(world_id, WallTime(wall))?;
        supervisor.step_due(WallTime(wall));
        if step % 30 == 29 {
            supervisor.heartbeat(WallTime(wall));
        }

        // After the first step, send the freshly joined humans for a stroll.
        if step == 0 {
            let slot = supervisor.slot_mut(world_id)?;
            for n in 1..=(HUMAN_COUNT as u64) {
                if let Some(Ok(ReturnValue::PlayerJoined { player_id })) =
                    slot.journal.return_value(tt_core::InputNumber(n))
                {
                    human_ids.push(*player_id);
                }
            }
            for (i, player_id) in human_ids.iter().enumerate() {
                let corner = if i % 2 == 0 { Tile::new(2, 20) } else { Tile::new(28, 3) };
                slot.journal.append(Input::MoveTo {
                    player_id:   *player_id,
                    destination: Some(corner),
                }, WallTime(wall))?;
            }
        }
    }
    supervisor.vacuum_sweep(WallTime(wall));
    let elapsed = t0.elapsed();

    // 4. Export the archives.
    std::fs::create_dir_all("output/smalltown")?;
    {
        let slot = supervisor.slot(world_id)?;
        let mut csv = CsvWriter::new(Path::new("output/smalltown"))?;
        export_store(&slot.store, &mut csv)?;
        let mut db = SqliteWriter::new(Path::new("output/smalltown"))?;
        export_store(&slot.store, &mut db)?;
    }

    // 5. Summary.
    let slot = supervisor.slot(world_id)?;
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!(
        "  sim time      : {}  |  journal rows: {}  |  ops completed: {}",
        slot.engine.current_time,
        slot.journal.len(),
        slot.runtime.completed_count(),
    );
    println!(
        "  messages: {}  |  activity logs: {}  |  lootboxes: {}  |  archived conversations: {}",
        slot.store.messages().len(),
        slot.store.activity_logs().len(),
        slot.store.lootboxes().len(),
        slot.store.archived_conversations().len(),
    );
    println!();

    println!("{:<12} {:<10} {:<12} {:<14} {:<8}", "Player", "Kind", "Position", "Zone", "XP");
    println!("{}", "-".repeat(60));
    for (id, player) in &slot.world.players {
        let description = slot.world.player_descriptions.get(id);
        let name = description.map(|d| d.name.as_str()).unwrap_or("?");
        println!(
            "{:<12} {:<10} {:<12} {:<14} {:<8}",
            name,
            if player.is_human() { "human" } else { "bot" },
            player.position.to_string(),
            player.current_zone.to_string(),
            slot.store.experience(*id),
        );
    }
    println!();
    println!("Archives written to output/smalltown/ (CSV + SQLite)");

    Ok(())
}
