/// CLI argument helper - pixel format selection
// (c) 2024 Ross Younger
use serde::{
    de::{self, Error, Unexpected},
    Serialize,
};
use std::{fmt::Display, str::FromStr};

/// Which of a camera's pixel formats to calibrate.
///
/// In a configuration file or on the command line, this is either the word
/// `all` (case-insensitive) or the index of a single format as shown by the
/// interactive prompt. For example:
/// ```text
/// --format all      # calibrate every supported format
/// --format 2        # calibrate the format listed at index 2
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Selection {
    /// Calibrate every supported pixel format in enumeration order
    #[default]
    All,
    /// Calibrate a single format, by its position in the enumeration
    Index(usize),
}

impl Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Index(i) => f.write_fmt(format_args!("{i}")),
        }
    }
}

impl From<Selection> for String {
    fn from(value: Selection) -> Self {
        value.to_string()
    }
}

impl FromStr for Selection {
    type Err = figment::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use figment::error::Error as FigmentError;
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if let Ok(n) = s.parse::<usize>() {
            return Ok(Self::Index(n));
        }
        if s.parse::<i64>().is_ok() {
            // a number, but not a valid index
            return Err(FigmentError::invalid_value(
                Unexpected::Str(s),
                &"a non-negative format index",
            ));
        }
        Err(FigmentError::custom(format!(
            "invalid format selection \"{s}\" (expected `all` or a format index)"
        )))
    }
}

impl<'de> serde::Deserialize<'de> for Selection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    type Uut = super::Selection;

    #[test]
    fn output_all() {
        assert_eq!(format!("{}", Uut::All), "all");
    }
    #[test]
    fn output_index() {
        assert_eq!(format!("{}", Uut::Index(3)), "3");
    }
    #[test]
    fn parse_all_any_case() {
        assert_eq!(Uut::from_str("all").unwrap(), Uut::All);
        assert_eq!(Uut::from_str("All").unwrap(), Uut::All);
        assert_eq!(Uut::from_str("ALL").unwrap(), Uut::All);
    }
    #[test]
    fn parse_index() {
        assert_eq!(Uut::from_str("0").unwrap(), Uut::Index(0));
        assert_eq!(Uut::from_str("17").unwrap(), Uut::Index(17));
    }
    #[test]
    fn invalid_negative() {
        let _ = Uut::from_str("-2").expect_err("should have failed");
    }
    #[test]
    fn invalid_word() {
        let e = Uut::from_str("banana").expect_err("should have failed");
        assert!(e.to_string().contains("invalid format selection"));
    }
}
