use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the user is spending a focus session on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    #[default]
    Study,
    Nap,
    Workout,
    Work,
}

impl Genre {
    pub const ALL: [Genre; 4] = [Genre::Study, Genre::Nap, Genre::Workout, Genre::Work];

    /// Stable key used in storage and config.
    pub fn key(self) -> &'static str {
        match self {
            Genre::Study => "study",
            Genre::Nap => "nap",
            Genre::Workout => "workout",
            Genre::Work => "work",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.key() == s)
            .ok_or_else(|| format!("unknown genre: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for g in Genre::ALL {
            assert_eq!(g.key().parse::<Genre>().unwrap(), g);
            assert_eq!(serde_json::to_value(g).unwrap(), g.key());
        }
        assert!("gaming".parse::<Genre>().is_err());
    }
}
