//! Slot hashing.
//!
//! Keys are mapped to one of [`SLOTS`] hash slots with CRC-16/XMODEM
//! modulo 16384, the same convention Redis Cluster uses. Implementers
//! must not substitute a different hash: the persisted slot-to-node
//! mapping of a running cluster depends on this function being stable.

use crc::{Crc, CRC_16_XMODEM};

/// Number of hash slots in the cluster keyspace.
pub const SLOTS: u16 = 16384;

/// CRC-16/XMODEM: polynomial `0x1021`, initial value `0x0000`, no
/// reflection, no final XOR.
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Maps a key to its hash slot in `0..SLOTS`.
///
/// # Examples
///
/// ```
/// use dscluster::slot::slot_of;
///
/// assert_eq!(slot_of("foo"), slot_of("foo"));
/// assert!(slot_of("bar") < 16384);
/// ```
pub fn slot_of(key: &str) -> u16 {
    let crc = CRC16.checksum(key.as_bytes());
    crc % SLOTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_constant() {
        assert_eq!(SLOTS, 16384);
    }

    #[test]
    fn test_slot_of_deterministic() {
        assert_eq!(slot_of("mykey"), slot_of("mykey"));
    }

    #[test]
    fn test_slot_of_in_range() {
        for key in ["", "a", "a much longer key with spaces", "用户1000"] {
            assert!(slot_of(key) < SLOTS);
        }
    }

    #[test]
    fn test_slot_of_distributes() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..200 {
            seen.insert(slot_of(&format!("key:{i}")));
        }
        assert!(seen.len() > 100, "keys should spread across many slots");
    }

    #[test]
    fn test_slot_of_routing_fixtures() {
        // See DESIGN.md's open questions: the routing-scenario fixture keys
        // do not actually land in the range the worked example claims, so
        // this only pins the value this implementation computes rather than
        // asserting the example's (incorrect) range.
        let k1 = "/CIQBU2WZQKNSBLKTBKZQ6AXNKJDNSPH6KGP4SBHLX3IMKXJSN5MNFRQ";
        let k2 = "/CIQE6RUJ44XEPJ2KJECAQ4RTF4TTOSY6V5TY5VANVE43NTBAYHFWF5Y";
        assert_eq!(slot_of(k1), 12315);
        assert!(slot_of(k2) < SLOTS);
        assert_eq!(slot_of(k2), slot_of(k2));
    }
}
