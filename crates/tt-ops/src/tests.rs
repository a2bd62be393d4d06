//! Unit tests for tt-ops.

use tt_core::{AgentId, ConversationId, GameTime, OperationId, PlayerId, WorldConfig, WorldId};
use tt_map::{WorldMap, Zone};
use tt_store::{ArchivedConversationRow, InventoryItem, LogKind, MemStore, MessageKind, TownStore};
use tt_world::{Decision, Input, OperationKind, ScheduledOp, World};

use crate::{cascade_store_purge, OperationRuntime, ScriptedMind};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_world() -> World {
    World::new(WorldId(0), WorldConfig::with_seed(11), WorldMap::new(10, 10).unwrap())
}

fn runtime() -> OperationRuntime<ScriptedMind> {
    OperationRuntime::new(ScriptedMind)
}

fn op(id: u64, agent: Option<u32>, player: u32, kind: OperationKind) -> ScheduledOp {
    ScheduledOp {
        id:        OperationId(id),
        agent_id:  agent.map(AgentId),
        player_id: PlayerId(player),
        started:   GameTime::ZERO,
        kind,
    }
}

// ── Idempotency ───────────────────────────────────────────────────────────────

mod idempotency_tests {
    use super::*;

    #[test]
    fn duplicate_dispatch_runs_once() {
        let world = test_world();
        let mut store = MemStore::new();
        let mut runtime = runtime();
        let operation = op(1, None, 5, OperationKind::GrantMovementXp { steps: 10 });

        assert!(runtime.run(&world, &operation, &mut store, GameTime(0)).is_none());
        assert_eq!(store.experience(PlayerId(5)), 10);

        // Second dispatch of the same operation id is a no-op.
        assert!(runtime.run(&world, &operation, &mut store, GameTime(0)).is_none());
        assert_eq!(store.experience(PlayerId(5)), 10);
        assert_eq!(runtime.completed_count(), 1);
    }
}

// ── Robbery resolution ────────────────────────────────────────────────────────

mod robbery_tests {
    use super::*;

    fn resolve(seed_op: u64, store: &mut MemStore) -> Input {
        let world = test_world();
        let mut runtime = runtime();
        let operation = op(
            seed_op,
            Some(1),
            0,
            OperationKind::ResolveRobbery {
                target:       PlayerId(9),
                attack_power: 60.0,
                defense:      10.0,
                zone:         Zone::DarkAlley,
            },
        );
        runtime.run(&world, &operation, store, GameTime(100)).expect("follow-up input")
    }

    #[test]
    fn successful_robbery_conserves_value() {
        // p = 0.85; search a few operation ids for a success draw — the
        // outcome per id is fixed, so this stays deterministic.
        let mut seen_success = false;
        for op_id in 0..8 {
            let mut trial = MemStore::new();
            trial.add_item(InventoryItem {
                player_id: PlayerId(9),
                name:      "heirloom".to_string(),
                value:     1_000,
            });
            if let Input::FinishRobbery { success: true, loot_value, .. } = resolve(op_id, &mut trial)
            {
                seen_success = true;
                assert!((10..=210).contains(&loot_value), "loot {loot_value} out of range");
                assert_eq!(trial.inventory_value(PlayerId(9)), 1_000 - loot_value);
                assert_eq!(trial.inventory_value(PlayerId(0)), loot_value);
                // The victim now resents the thief.
                let rel = trial.relationship(PlayerId(9), PlayerId(0));
                assert!(rel.revenge > 0 && rel.fear > 0 && rel.trust < 0);
                break;
            }
        }
        assert!(seen_success, "at p = 0.85, eight independent draws should succeed at least once");
    }

    #[test]
    fn robbery_always_logs() {
        let mut store = MemStore::new();
        let _ = resolve(3, &mut store);
        assert!(store.activity_logs().iter().any(|l| l.kind == LogKind::Robbery));
    }
}

// ── Combat resolution ─────────────────────────────────────────────────────────

mod combat_tests {
    use super::*;

    #[test]
    fn combat_reports_a_loser_relationship() {
        let world = test_world();
        let mut store = MemStore::new();
        let mut runtime = runtime();
        let operation = op(
            2,
            Some(1),
            0,
            OperationKind::ResolveCombat {
                opponent:       PlayerId(9),
                attacker_power: 80.0,
                opponent_power: 20.0,
            },
        );
        let follow_up = runtime.run(&world, &operation, &mut store, GameTime(0)).unwrap();
        let Input::FinishCombat { attacker_won, .. } = follow_up else {
            panic!("expected FinishCombat");
        };
        let (winner, loser) = if attacker_won {
            (PlayerId(0), PlayerId(9))
        } else {
            (PlayerId(9), PlayerId(0))
        };
        let rel = store.relationship(loser, winner);
        assert_eq!(rel.revenge, 20);
        assert_eq!(rel.fear, 10);
        assert!(store.activity_logs().iter().any(|l| l.kind == LogKind::Combat));
    }
}

// ── Remember / message ────────────────────────────────────────────────────────

mod memory_tests {
    use super::*;

    #[test]
    fn remember_records_participation_edges() {
        let world = test_world();
        let mut store = MemStore::new();
        store.archive_conversation(ArchivedConversationRow {
            id:           ConversationId(4),
            creator:      PlayerId(0),
            participants: vec![PlayerId(0), PlayerId(1)],
            num_messages: 5,
            started:      Some(GameTime(0)),
            ended:        GameTime(9_000),
        });
        let mut runtime = runtime();
        let operation = op(
            5,
            Some(2),
            0,
            OperationKind::RememberConversation { conversation_id: ConversationId(4) },
        );
        let follow_up = runtime.run(&world, &operation, &mut store, GameTime(10_000)).unwrap();
        assert!(matches!(follow_up, Input::FinishRememberConversation { .. }));
        assert_eq!(store.participated_count(), 1);
        assert_eq!(store.relationship(PlayerId(0), PlayerId(1)).trust, 1);
        assert!(store.activity_logs().iter().any(|l| l.kind == LogKind::Conversation));
    }

    #[test]
    fn message_generation_writes_and_releases() {
        let world = test_world();
        let mut store = MemStore::new();
        let mut runtime = runtime();
        let uuid = uuid::Uuid::from_u128(42);
        let operation = op(
            6,
            Some(2),
            0,
            OperationKind::GenerateMessage {
                conversation_id: ConversationId(3),
                other:           PlayerId(1),
                kind:            MessageKind::Start,
                message_uuid:    uuid,
            },
        );
        let follow_up = runtime.run(&world, &operation, &mut store, GameTime(50)).unwrap();
        match follow_up {
            Input::FinishSendingMessage { message_uuid, kind, .. } => {
                assert_eq!(message_uuid, uuid);
                assert_eq!(kind, MessageKind::Start);
            }
            other => panic!("expected FinishSendingMessage, got {other:?}"),
        }
        assert_eq!(store.messages().len(), 1);
        assert!(!store.messages()[0].text.is_empty());
    }
}

// ── Activity selection ────────────────────────────────────────────────────────

mod activity_tests {
    use super::*;
    use tt_world::Personality;

    #[test]
    fn selection_produces_bounded_activity() {
        let world = test_world();
        let mut store = MemStore::new();
        let mut runtime = runtime();
        let operation = op(
            7,
            Some(2),
            0,
            OperationKind::SelectActivity {
                zone:        Zone::Casino,
                personality: Personality::Gambler,
            },
        );
        let follow_up = runtime.run(&world, &operation, &mut store, GameTime(0)).unwrap();
        let Input::FinishDoSomething { decision: Decision::Activity { duration, description, .. }, .. } =
            follow_up
        else {
            panic!("expected an activity decision");
        };
        assert!(!description.is_empty());
        let secs = duration.as_millis() / 1_000;
        assert!((20..=60).contains(&secs), "duration {secs}s outside the catalog range");
    }
}

// ── Cleanup cascade ───────────────────────────────────────────────────────────

mod cleanup_tests {
    use super::*;

    #[test]
    fn cascade_purge_is_idempotent() {
        let mut store = MemStore::new();
        let player = PlayerId(3);
        store.add_item(InventoryItem { player_id: player, name: "x".into(), value: 5 });
        store.add_xp(player, 50);
        store.adjust_relationship(player, PlayerId(4), Default::default());
        store.adjust_relationship(PlayerId(4), player, Default::default());

        let first = cascade_store_purge(&mut store, player);
        assert!(first > 0);
        assert_eq!(cascade_store_purge(&mut store, player), 0, "second run removes nothing");
        assert_eq!(store.inventory_value(player), 0);
        assert_eq!(store.experience(player), 0);
    }
}
