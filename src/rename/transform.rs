//! Index transforms: which 1-based position each sorted entry ends up at.

use clap::ValueEnum;
use std::fmt;
use std::str::FromStr;

/// Maps a 1-based position in numeric order to a 1-based target index.
/// Implementations must be a permutation of `1..=total`; the planner checks.
pub trait IndexTransform {
    fn name(&self) -> &str;
    fn target_index(&self, position: usize, total: usize) -> usize;
}

/// Full reversal: position i -> total - i + 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reverse;

impl IndexTransform for Reverse {
    fn name(&self) -> &str {
        "reverse"
    }

    fn target_index(&self, position: usize, total: usize) -> usize {
        total - position + 1
    }
}

/// Keep order, close gaps: position i -> i.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl IndexTransform for Sequential {
    fn name(&self) -> &str {
        "sequential"
    }

    fn target_index(&self, position: usize, _total: usize) -> usize {
        position
    }
}

/// User-selectable transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Order {
    #[default]
    Reverse,
    Sequential,
}

impl Order {
    pub fn transform(self) -> Box<dyn IndexTransform> {
        match self {
            Order::Reverse => Box::new(Reverse),
            Order::Sequential => Box::new(Sequential),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Order::Reverse => "reverse",
            Order::Sequential => "sequential",
        })
    }
}

impl FromStr for Order {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reverse" | "reversed" => Ok(Order::Reverse),
            "sequential" | "renumber" => Ok(Order::Sequential),
            other => Err(format!("invalid order: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_twice_is_identity() {
        for total in 1..=40 {
            for i in 1..=total {
                let once = Reverse.target_index(i, total);
                assert_eq!(Reverse.target_index(once, total), i);
            }
        }
    }

    #[test]
    fn order_parses_names() {
        assert_eq!("Reverse".parse::<Order>().unwrap(), Order::Reverse);
        assert_eq!("renumber".parse::<Order>().unwrap(), Order::Sequential);
        assert!("shuffle".parse::<Order>().is_err());
        assert_eq!(Order::Sequential.to_string(), "sequential");
        assert_eq!(Order::Reverse.transform().name(), "reverse");
    }
}
