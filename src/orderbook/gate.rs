//! Consistency checks run around every apply.

use crate::checksum::Checksum;
use crate::types::messages::{DesyncReason, Update};

use super::BookState;

/// Reject updates whose id does not advance past the book's last applied id
pub(crate) fn check_progression(book: &BookState, update: &Update) -> Result<(), DesyncReason> {
    let last = book.last_update_id();
    if update.update_id <= last {
        return Err(DesyncReason::StaleUpdate {
            last,
            got: update.update_id,
        });
    }
    Ok(())
}

/// Compare the local book's digest with the one carried by the feed
pub(crate) fn verify_checksum(
    checksum: &dyn Checksum,
    book: &BookState,
    expected: u32,
) -> Result<(), DesyncReason> {
    let computed = checksum.compute(book);
    if computed != expected {
        return Err(DesyncReason::ChecksumMismatch { expected, computed });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileMode;
    use crate::types::{AssetClass, InstrumentKey, PriceLevel, Snapshot};
    use rust_decimal_macros::dec;

    fn key() -> InstrumentKey {
        InstrumentKey::new("test", "SOL-USD", AssetClass::Spot)
    }

    fn book(last_update_id: u64) -> BookState {
        let snapshot = Snapshot::new(
            key(),
            vec![PriceLevel::new(dec!(10), dec!(1))],
            vec![PriceLevel::new(dec!(11), dec!(1))],
        )
        .with_update_id(last_update_id);
        BookState::from_snapshot(snapshot, ReconcileMode::ByPrice).unwrap()
    }

    fn update(id: u64) -> Update {
        Update::new(key(), vec![PriceLevel::new(dec!(10), dec!(2))], vec![]).with_update_id(id)
    }

    #[test]
    fn test_progression() {
        let book = book(10);
        assert!(check_progression(&book, &update(11)).is_ok());
        assert_eq!(
            check_progression(&book, &update(10)),
            Err(DesyncReason::StaleUpdate { last: 10, got: 10 })
        );
        assert!(check_progression(&book, &update(3)).is_err());
    }

    #[test]
    fn test_checksum() {
        let book = book(0);
        let fixed = |_: &BookState| 7u32;
        assert!(verify_checksum(&fixed, &book, 7).is_ok());
        assert_eq!(
            verify_checksum(&fixed, &book, 8),
            Err(DesyncReason::ChecksumMismatch {
                expected: 8,
                computed: 7
            })
        );
    }
}
