//! Selection strategy over a set of candidate elements

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Policy for picking among several matching elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    First,
    Last,
    Random,
    /// Every candidate; only valid where a set result is accepted
    All,
}

impl Strategy {
    /// Pick exactly one candidate.
    ///
    /// `All` is rejected with an illegal-argument error; an empty candidate
    /// set is a lookup failure.
    pub fn pick<'a, T>(&self, candidates: &'a [T]) -> Result<&'a T> {
        let index = self.pick_index(candidates.len())?;
        Ok(&candidates[index])
    }

    /// Pick one index out of `len` candidates
    pub fn pick_index(&self, len: usize) -> Result<usize> {
        if *self == Strategy::All {
            return Err(Error::IllegalArgument(
                "Strategy ALL cannot be used where a single element is required".to_string(),
            ));
        }
        if len == 0 {
            return Err(Error::not_found(format!(
                "no candidates for strategy {}",
                self
            )));
        }
        Ok(match self {
            Strategy::First => 0,
            Strategy::Last => len - 1,
            Strategy::Random => rand::thread_rng().gen_range(0..len),
            Strategy::All => unreachable!(),
        })
    }

    /// Pick candidates for an operation that accepts a set result
    pub fn pick_many<'a, T>(&self, candidates: &'a [T]) -> Result<Vec<&'a T>> {
        match self {
            Strategy::All if candidates.is_empty() => {
                Err(Error::not_found("no candidates for strategy ALL"))
            }
            Strategy::All => Ok(candidates.iter().collect()),
            _ => self.pick(candidates).map(|c| vec![c]),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::First => write!(f, "FIRST"),
            Strategy::Last => write!(f, "LAST"),
            Strategy::Random => write!(f, "RANDOM"),
            Strategy::All => write!(f, "ALL"),
        }
    }
}

impl std::str::FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "FIRST" => Ok(Strategy::First),
            "LAST" => Ok(Strategy::Last),
            "RANDOM" => Ok(Strategy::Random),
            "ALL" => Ok(Strategy::All),
            other => Err(Error::IllegalArgument(format!("Unknown strategy: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use test_case::test_case;

    const CANDIDATES: [&str; 3] = ["a", "b", "c"];

    #[test_case(Strategy::First, "a" ; "first")]
    #[test_case(Strategy::Last, "c" ; "last")]
    fn test_positional_strategies_are_stable(strategy: Strategy, expected: &str) {
        for _ in 0..5 {
            assert_eq!(*strategy.pick(&CANDIDATES).unwrap(), expected);
        }
    }

    #[test]
    fn test_random_stays_in_candidate_set() {
        for _ in 0..50 {
            let picked = Strategy::Random.pick(&CANDIDATES).unwrap();
            assert!(CANDIDATES.contains(picked));
        }
    }

    #[test]
    fn test_all_rejected_for_single_pick() {
        let err = Strategy::All.pick(&CANDIDATES).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
    }

    #[test]
    fn test_all_accepted_for_set_pick() {
        assert_eq!(Strategy::All.pick_many(&CANDIDATES).unwrap().len(), 3);
        assert_eq!(Strategy::Last.pick_many(&CANDIDATES).unwrap(), vec![&"c"]);
    }

    #[test]
    fn test_empty_candidates_not_found() {
        let empty: [&str; 0] = [];
        assert_eq!(
            Strategy::First.pick(&empty).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test_case("first", Strategy::First)]
    #[test_case(" Random ", Strategy::Random)]
    #[test_case("ALL", Strategy::All)]
    fn test_parse(input: &str, expected: Strategy) {
        assert_eq!(input.parse::<Strategy>().unwrap(), expected);
    }
}
