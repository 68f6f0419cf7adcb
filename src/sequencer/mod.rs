//! Year-scoped public order identifiers of the form `<YEAR>-<NNN>`.
//!
//! The sequencer keeps a high-water mark per year on top of whatever the
//! backing store reports, so a number handed out once is never handed out
//! again, even if the order carrying it is later deactivated or never
//! persisted. Callers must serialize [`IdentifierSequencer::claim`]; the
//! order store does so by owning the sequencer inside its actor loop.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

pub const DEFAULT_WIDTH: usize = 3;

/// The storage lookup behind a claim failed. The sequencer never guesses.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("sequence lookup failed for {year}: {reason}")]
pub struct LookupFailure {
    pub year: i32,
    pub reason: String,
}

/// Parsed form of a public identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicId {
    pub year: i32,
    pub sequence: u32,
}

impl PublicId {
    pub fn render(&self, width: usize) -> String {
        format!("{:04}-{:0>width$}", self.year, self.sequence, width = width)
    }

    /// Parses `YYYY-N…`. Any sequence width is accepted on the way in.
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, sequence) = raw.split_once('-')?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            year: year.parse().ok()?,
            sequence: sequence.parse().ok()?,
        })
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_WIDTH))
    }
}

/// Natural order of rendered identifiers: `2024-999` before `2024-1000`.
/// Unparseable identifiers sort after every valid one, by text.
pub fn compare_public_ids(a: &str, b: &str) -> Ordering {
    match (PublicId::parse(a), PublicId::parse(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Result of a claim or a peek.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedId {
    pub public_id: String,
    pub sequence: u32,
}

/// Where the sequencer learns the highest sequence already stored for a year.
pub trait SequenceSource {
    /// Highest sequence stored for `year`, or 0 when there is none.
    fn max_sequence(&self, year: i32) -> Result<u32, LookupFailure>;
}

/// Scans existing identifiers for the highest sequence of `year`.
///
/// An identifier that claims the year but cannot be parsed is a lookup
/// failure: skipping it could hand out a number that is already taken.
pub fn max_sequence_in<'a>(
    year: i32,
    public_ids: impl IntoIterator<Item = &'a str>,
) -> Result<u32, LookupFailure> {
    let prefix = format!("{year:04}-");
    let mut max = 0;
    for raw in public_ids {
        if !raw.starts_with(&prefix) {
            continue;
        }
        let parsed = PublicId::parse(raw).ok_or_else(|| LookupFailure {
            year,
            reason: format!("unparseable public id {raw:?}"),
        })?;
        max = max.max(parsed.sequence);
    }
    Ok(max)
}

#[derive(Debug, Clone)]
pub struct IdentifierSequencer {
    width: usize,
    issued: HashMap<i32, u32>,
}

impl IdentifierSequencer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            issued: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Claims the next sequence for `year`. The claimed number is burned
    /// whether or not the caller goes on to persist it.
    pub fn claim(
        &mut self,
        year: i32,
        source: &dyn SequenceSource,
    ) -> Result<MintedId, LookupFailure> {
        let minted = self.peek(year, source)?;
        self.issued.insert(year, minted.sequence);
        Ok(minted)
    }

    /// The identifier the next claim for `year` would return.
    pub fn peek(&self, year: i32, source: &dyn SequenceSource) -> Result<MintedId, LookupFailure> {
        let stored = source.max_sequence(year)?;
        let issued = self.issued.get(&year).copied().unwrap_or(0);
        let sequence = stored.max(issued).checked_add(1).ok_or_else(|| LookupFailure {
            year,
            reason: "sequence space exhausted".to_string(),
        })?;
        Ok(MintedId {
            public_id: PublicId { year, sequence }.render(self.width),
            sequence,
        })
    }
}

impl Default for IdentifierSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn public_ids_compare_numerically() {
        let mut ids = vec!["2024-1000", "bogus", "2025-001", "2024-999", "2024-0999"];
        ids.sort_by(|a, b| compare_public_ids(a, b));
        assert_eq!(ids, ["2024-0999", "2024-999", "2024-1000", "2025-001", "bogus"]);
    }

    struct Stored(HashMap<i32, u32>);

    impl SequenceSource for Stored {
        fn max_sequence(&self, year: i32) -> Result<u32, LookupFailure> {
            Ok(self.0.get(&year).copied().unwrap_or(0))
        }
    }

    struct Unreachable;

    impl SequenceSource for Unreachable {
        fn max_sequence(&self, year: i32) -> Result<u32, LookupFailure> {
            Err(LookupFailure { year, reason: "storage offline".into() })
        }
    }

    #[test]
    fn continues_from_stored_max() {
        let source = Stored(HashMap::from([(2024, 57)]));
        let mut sequencer = IdentifierSequencer::default();

        let minted = sequencer.claim(2024, &source).unwrap();
        assert_eq!(minted.public_id, "2024-058");
        assert_eq!(minted.sequence, 58);
    }

    #[test]
    fn new_year_restarts_at_one() {
        let source = Stored(HashMap::from([(2024, 57)]));
        let mut sequencer = IdentifierSequencer::default();
        sequencer.claim(2024, &source).unwrap();

        assert_eq!(sequencer.claim(2025, &source).unwrap().public_id, "2025-001");
    }

    #[test]
    fn burned_numbers_are_not_reissued() {
        // Nothing is ever persisted, yet claims keep advancing.
        let source = Stored(HashMap::new());
        let mut sequencer = IdentifierSequencer::new(4);
        assert_eq!(sequencer.claim(2026, &source).unwrap().public_id, "2026-0001");
        assert_eq!(sequencer.claim(2026, &source).unwrap().public_id, "2026-0002");
    }

    #[test]
    fn peek_does_not_claim() {
        let source = Stored(HashMap::from([(2024, 9)]));
        let mut sequencer = IdentifierSequencer::default();
        assert_eq!(sequencer.peek(2024, &source).unwrap().sequence, 10);
        assert_eq!(sequencer.claim(2024, &source).unwrap().sequence, 10);
    }

    #[test]
    fn lookup_failure_surfaces() {
        let mut sequencer = IdentifierSequencer::default();
        let err = sequencer.claim(2024, &Unreachable).unwrap_err();
        assert_eq!(err.year, 2024);
        // a failed claim burns nothing
        let source = Stored(HashMap::new());
        assert_eq!(sequencer.claim(2024, &source).unwrap().sequence, 1);
    }

    #[test]
    fn sequence_outgrows_width() {
        let source = Stored(HashMap::from([(2024, 999)]));
        let mut sequencer = IdentifierSequencer::default();
        assert_eq!(sequencer.claim(2024, &source).unwrap().public_id, "2024-1000");
    }

    #[test]
    fn scan_rejects_malformed_ids_for_the_year() {
        assert_eq!(max_sequence_in(2024, ["2024-003", "2024-011", "2023-090"]), Ok(11));
        assert_eq!(max_sequence_in(2025, ["2024-003"]), Ok(0));
        assert!(max_sequence_in(2024, ["2024-0x1"]).is_err());
    }

    #[test]
    fn parse_round_trips_display() {
        let id = PublicId::parse("2024-058").unwrap();
        assert_eq!(id, PublicId { year: 2024, sequence: 58 });
        assert_eq!(id.to_string(), "2024-058");
        assert_eq!(PublicId::parse("KGF-2024-0001"), None);
        assert_eq!(PublicId::parse("24-001"), None);
    }

    proptest! {
        #[test]
        fn claims_are_consecutive_and_unique(stored in 0u32..5000, claims in 1usize..200) {
            let source = Stored(HashMap::from([(2030, stored)]));
            let mut sequencer = IdentifierSequencer::default();
            let mut seen = std::collections::HashSet::new();
            for n in 1..=claims {
                let minted = sequencer.claim(2030, &source).unwrap();
                prop_assert_eq!(minted.sequence, stored + n as u32);
                prop_assert!(seen.insert(minted.public_id));
            }
            prop_assert_eq!(sequencer.claim(2031, &source).unwrap().sequence, 1);
        }
    }
}
