//! Operator console grammar
//!
//! Commands are single lines. Keywords match case-insensitively; free-text
//! arguments (SSID, password, URL) keep their case.
//!
//! | Command                         | Effect                              |
//! |---------------------------------|-------------------------------------|
//! | `HELP`                          | List commands                       |
//! | `SHOW`                          | Print mapping, calibration, config  |
//! | `CALIBRATE`                     | Run the calibration routine         |
//! | `RESET CAL`                     | Clear calibration only              |
//! | `RESET`                         | Clear mapping and calibration       |
//! | `SET WIFI <ssid> [<password>]`  | Store network credentials           |
//! | `SET SERVER <url>`              | Store telemetry endpoint            |
//! | `SET INTERVAL <seconds>`        | Store reporting period (>= 10 s)    |

use core::fmt;

use crate::MIN_INTERVAL_S;

/// A parsed operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    Help,
    Show,
    Calibrate,
    ResetCalibration,
    Reset,
    SetWifi { ssid: &'a str, password: &'a str },
    SetServer { url: &'a str },
    SetInterval { seconds: u32 },
}

/// Errors parsing an operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Blank line
    Empty,
    /// Keyword not recognised
    Unknown,
    /// Required argument missing
    MissingArgument(&'static str),
    /// Argument is not a number
    InvalidNumber,
    /// Interval below the allowed floor
    IntervalTooShort { requested: u32 },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("empty command"),
            CommandError::Unknown => f.write_str("unknown command, type HELP"),
            CommandError::MissingArgument(name) => write!(f, "missing argument <{}>", name),
            CommandError::InvalidNumber => f.write_str("invalid number"),
            CommandError::IntervalTooShort { requested } => write!(
                f,
                "interval {} s rejected, minimum is {} s",
                requested, MIN_INTERVAL_S
            ),
        }
    }
}

/// Split off the first whitespace-delimited token
///
/// Returns the token and the remainder with leading whitespace removed.
fn next_token(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], input[end..].trim_start()),
        None => (input, ""),
    }
}

impl<'a> Command<'a> {
    /// Parse one console line
    pub fn parse(line: &'a str) -> Result<Self, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        let (keyword, rest) = next_token(line);

        if keyword.eq_ignore_ascii_case("HELP") && rest.is_empty() {
            Ok(Command::Help)
        } else if keyword.eq_ignore_ascii_case("SHOW") && rest.is_empty() {
            Ok(Command::Show)
        } else if keyword.eq_ignore_ascii_case("CALIBRATE") && rest.is_empty() {
            Ok(Command::Calibrate)
        } else if keyword.eq_ignore_ascii_case("RESET") {
            Self::parse_reset(rest)
        } else if keyword.eq_ignore_ascii_case("SET") {
            Self::parse_set(rest)
        } else {
            Err(CommandError::Unknown)
        }
    }

    fn parse_reset(rest: &str) -> Result<Self, CommandError> {
        if rest.is_empty() {
            Ok(Command::Reset)
        } else if rest.eq_ignore_ascii_case("CAL") {
            Ok(Command::ResetCalibration)
        } else {
            Err(CommandError::Unknown)
        }
    }

    fn parse_set(rest: &'a str) -> Result<Self, CommandError> {
        let (target, args) = next_token(rest);

        if target.eq_ignore_ascii_case("WIFI") {
            let (ssid, password) = next_token(args);
            if ssid.is_empty() {
                return Err(CommandError::MissingArgument("ssid"));
            }
            Ok(Command::SetWifi { ssid, password })
        } else if target.eq_ignore_ascii_case("SERVER") {
            if args.is_empty() {
                return Err(CommandError::MissingArgument("url"));
            }
            Ok(Command::SetServer { url: args })
        } else if target.eq_ignore_ascii_case("INTERVAL") {
            if args.is_empty() {
                return Err(CommandError::MissingArgument("seconds"));
            }
            let seconds: u32 = args.parse().map_err(|_| CommandError::InvalidNumber)?;
            if seconds < MIN_INTERVAL_S {
                return Err(CommandError::IntervalTooShort { requested: seconds });
            }
            Ok(Command::SetInterval { seconds })
        } else {
            Err(CommandError::Unknown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simple_keywords() {
        assert_eq!(Command::parse("HELP"), Ok(Command::Help));
        assert_eq!(Command::parse("show"), Ok(Command::Show));
        assert_eq!(Command::parse("  Calibrate \r\n"), Ok(Command::Calibrate));
    }

    #[test]
    fn test_reset_variants() {
        assert_eq!(Command::parse("RESET"), Ok(Command::Reset));
        assert_eq!(Command::parse("reset cal"), Ok(Command::ResetCalibration));
        assert_eq!(Command::parse("RESET   Cal"), Ok(Command::ResetCalibration));
        assert_eq!(Command::parse("RESET ALL"), Err(CommandError::Unknown));
    }

    #[test]
    fn test_set_wifi_keeps_argument_case() {
        assert_eq!(
            Command::parse("set wifi MyNet S3cret Pass"),
            Ok(Command::SetWifi {
                ssid: "MyNet",
                password: "S3cret Pass"
            })
        );
        assert_eq!(
            Command::parse("SET WIFI OpenNet"),
            Ok(Command::SetWifi {
                ssid: "OpenNet",
                password: ""
            })
        );
        assert_eq!(
            Command::parse("SET WIFI"),
            Err(CommandError::MissingArgument("ssid"))
        );
    }

    #[test]
    fn test_set_server() {
        assert_eq!(
            Command::parse("SET SERVER http://Example.org/Ingest"),
            Ok(Command::SetServer {
                url: "http://Example.org/Ingest"
            })
        );
        assert_eq!(
            Command::parse("SET SERVER"),
            Err(CommandError::MissingArgument("url"))
        );
    }

    #[test]
    fn test_set_interval() {
        assert_eq!(
            Command::parse("SET INTERVAL 60"),
            Ok(Command::SetInterval { seconds: 60 })
        );
        assert_eq!(
            Command::parse("SET INTERVAL 10"),
            Ok(Command::SetInterval { seconds: 10 })
        );
        assert_eq!(
            Command::parse("SET INTERVAL 9"),
            Err(CommandError::IntervalTooShort { requested: 9 })
        );
        assert_eq!(
            Command::parse("SET INTERVAL soon"),
            Err(CommandError::InvalidNumber)
        );
        assert_eq!(
            Command::parse("SET INTERVAL -5"),
            Err(CommandError::InvalidNumber)
        );
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(Command::parse(""), Err(CommandError::Empty));
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(Command::parse("REBOOT"), Err(CommandError::Unknown));
        assert_eq!(Command::parse("SET COLOR red"), Err(CommandError::Unknown));
        assert_eq!(Command::parse("HELP me"), Err(CommandError::Unknown));
    }

    fn mixed_case(word: &'static str) -> impl Strategy<Value = String> {
        proptest::collection::vec(any::<bool>(), word.len()).prop_map(move |upper| {
            word.chars()
                .zip(upper)
                .map(|(c, up)| {
                    if up {
                        c.to_ascii_uppercase()
                    } else {
                        c.to_ascii_lowercase()
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn test_keywords_ignore_case(
            set in mixed_case("set"),
            server in mixed_case("server"),
        ) {
            let line = format!("{} {} http://Host/Path", set, server);
            prop_assert_eq!(
                Command::parse(&line),
                Ok(Command::SetServer { url: "http://Host/Path" })
            );
        }
    }
}
