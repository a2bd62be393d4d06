//! Unit tests for tt-journal.

use tt_core::{InputNumber, PlayerId, WallTime};
use tt_world::{Input, InputError, ReturnValue};

use crate::{Journal, JournalError};

fn move_to(player: u32) -> Input {
    Input::MoveTo {
        player_id:   PlayerId(player),
        destination: None,
    }
}

mod numbering_tests {
    use super::*;

    #[test]
    fn numbers_are_dense_from_one() {
        let mut journal = Journal::new(100);
        let a = journal.append(move_to(1), WallTime(0)).unwrap();
        let b = journal.append(move_to(1), WallTime(0)).unwrap();
        let c = journal.append(move_to(1), WallTime(0)).unwrap();
        assert_eq!((a, b, c), (InputNumber(1), InputNumber(2), InputNumber(3)));
        assert_eq!(journal.last_appended(), InputNumber(3));
    }

    #[test]
    fn pending_range_respects_watermark() {
        let mut journal = Journal::new(100);
        for _ in 0..5 {
            journal.append(move_to(1), WallTime(0)).unwrap();
        }
        // Watermark at 3: rows 1..=3 visible, 4..=5 not.
        let batch = journal.pending_in_range(InputNumber::ZERO, InputNumber(3));
        assert_eq!(batch.len(), 3);
        let batch = journal.pending_in_range(InputNumber(3), InputNumber(5));
        assert_eq!(batch.len(), 2);
    }
}

mod return_value_tests {
    use super::*;

    #[test]
    fn return_value_set_exactly_once() {
        let mut journal = Journal::new(100);
        let n = journal.append(move_to(1), WallTime(0)).unwrap();
        journal.record_return(n, Ok(ReturnValue::Null)).unwrap();
        let err = journal.record_return(n, Ok(ReturnValue::Null)).unwrap_err();
        assert!(matches!(err, JournalError::ReturnAlreadyRecorded(_)));
        assert!(matches!(journal.return_value(n), Some(Ok(ReturnValue::Null))));
    }

    #[test]
    fn processed_rows_leave_pending_range() {
        let mut journal = Journal::new(100);
        let n = journal.append(move_to(1), WallTime(0)).unwrap();
        journal.append(move_to(1), WallTime(0)).unwrap();
        journal.record_return(n, Ok(ReturnValue::Null)).unwrap();
        let batch = journal.pending_in_range(InputNumber::ZERO, journal.last_appended());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].0, InputNumber(2));
    }
}

mod rate_limit_tests {
    use super::*;

    #[test]
    fn cap_rejects_then_recovers() {
        let mut journal = Journal::new(3);
        let first = journal.append(move_to(1), WallTime(0)).unwrap();
        journal.append(move_to(1), WallTime(0)).unwrap();
        journal.append(move_to(1), WallTime(0)).unwrap();

        let err = journal.append(move_to(1), WallTime(0)).unwrap_err();
        assert!(matches!(err, JournalError::RateLimited));

        // Processing one row frees a slot.
        journal.record_return(first, Ok(ReturnValue::Null)).unwrap();
        assert!(journal.append(move_to(1), WallTime(1)).is_ok());
    }

    #[test]
    fn internal_appends_bypass_the_cap() {
        let mut journal = Journal::new(1);
        journal.append(move_to(1), WallTime(0)).unwrap();
        // A completion input must land even with the journal full.
        let n = journal.append_internal(move_to(1), WallTime(0));
        assert_eq!(n, InputNumber(2));
    }
}

mod vacuum_tests {
    use super::*;

    #[test]
    fn vacuum_removes_only_old_processed_rows() {
        let mut journal = Journal::new(100);
        let old = journal.append(move_to(1), WallTime(0)).unwrap();
        let fresh = journal.append(move_to(1), WallTime(10_000)).unwrap();
        journal.record_return(old, Ok(ReturnValue::Null)).unwrap();
        journal.record_return(fresh, Ok(ReturnValue::Null)).unwrap();

        let removed = journal.vacuum(WallTime(10_500), 1_000, 64);
        assert_eq!(removed, 1);
        assert!(journal.row(old).is_none());
        assert!(journal.row(fresh).is_some());
    }

    #[test]
    fn vacuum_never_touches_unprocessed_rows() {
        let mut journal = Journal::new(100);
        journal.append(move_to(1), WallTime(0)).unwrap();
        assert_eq!(journal.vacuum(WallTime(1_000_000), 1, 64), 0);
    }

    #[test]
    fn vacuum_batches_are_capped() {
        let mut journal = Journal::new(100);
        for _ in 0..10 {
            let n = journal.append(move_to(1), WallTime(0)).unwrap();
            journal.record_return(n, Ok(ReturnValue::Null)).unwrap();
        }
        assert_eq!(journal.vacuum(WallTime(10_000), 1, 4), 4);
        assert_eq!(journal.vacuum(WallTime(10_000), 1, 100), 6);
        assert_eq!(journal.vacuum(WallTime(10_000), 1, 100), 0);
    }

    #[test]
    fn emergency_flush_fails_stale_unprocessed() {
        let mut journal = Journal::new(100);
        let stale = journal.append(move_to(1), WallTime(0)).unwrap();
        let fresh = journal.append(move_to(1), WallTime(60_000)).unwrap();

        let flushed = journal.emergency_flush(WallTime(61_000), 30_000);
        assert_eq!(flushed, 1);
        assert!(matches!(
            journal.return_value(stale),
            Some(Err(InputError::Internal(_)))
        ));
        assert!(journal.return_value(fresh).is_none());
        // Flushed rows no longer count toward the rate limit.
        assert_eq!(journal.pending_count(), 1);
    }
}

mod purge_tests {
    use super::*;

    #[test]
    fn purge_removes_rows_referencing_player() {
        let mut journal = Journal::new(100);
        journal.append(move_to(7), WallTime(0)).unwrap();
        journal.append(move_to(8), WallTime(0)).unwrap();
        journal.append(move_to(7), WallTime(0)).unwrap();

        assert_eq!(journal.purge_referencing(PlayerId(7), None, 100), 2);
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.purge_referencing(PlayerId(7), None, 100), 0, "idempotent");
    }

    #[test]
    fn purge_respects_cap() {
        let mut journal = Journal::new(100);
        for _ in 0..5 {
            journal.append(move_to(9), WallTime(0)).unwrap();
        }
        assert_eq!(journal.purge_referencing(PlayerId(9), None, 2), 2);
        assert_eq!(journal.pending_count(), 3);
    }
}
