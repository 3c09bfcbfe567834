//! Interactive commands typed at the dashboard prompt

use crate::filter::SortSpec;
use crate::state::Event;
use modstats_core::{Error, ModeratorId, Result};

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  r | refresh          reload now (also retries after an error)
  open <id>            show one moderator
  close                back to the overview
  export [id]          save one moderator's CSV, or everyone's
  search <text>        filter by name or rank (empty clears)
  rank <rank|any>      filter by rank
  status <status|any>  filter by status
  clear                reset all filters
  sort <key[:dir]>     id, name, rank, status, total or an action type
  theme                toggle light/dark
  pause | resume       stop or restart polling
  help                 show this text
  q | quit             exit";

/// A parsed prompt line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Feed an event to the state machine
    Dispatch(Event),
    /// Save a CSV export to the working directory, everyone when `None`
    Export(Option<ModeratorId>),
    /// Dashboard hidden (`false`) or shown again (`true`)
    Visibility(bool),
    /// Print [`HELP`]
    Help,
    /// Leave the dashboard
    Quit,
    /// Blank line
    Nothing,
}

/// Parse one prompt line
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] for unknown commands or bad arguments.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, arg) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, arg)| (verb, arg.trim()));

    let command = match verb.to_ascii_lowercase().as_str() {
        "" => Command::Nothing,
        "r" | "refresh" | "retry" => Command::Dispatch(Event::Retry),
        "open" => Command::Dispatch(Event::OpenDetail(arg.parse::<ModeratorId>()?)),
        "close" | "back" => Command::Dispatch(Event::CloseDetail),
        "export" if arg.is_empty() => Command::Export(None),
        "export" => Command::Export(Some(arg.parse::<ModeratorId>()?)),
        "search" | "/" => Command::Dispatch(Event::SearchChanged(arg.to_string())),
        "rank" => Command::Dispatch(Event::RankFilterChanged(optional(arg))),
        "status" => Command::Dispatch(Event::StatusFilterChanged(optional(arg))),
        "clear" => Command::Dispatch(Event::ClearFilters),
        "sort" => Command::Dispatch(Event::SortChanged(arg.parse::<SortSpec>()?)),
        "theme" => Command::Dispatch(Event::ToggleTheme),
        "pause" | "hide" => Command::Visibility(false),
        "resume" | "show" => Command::Visibility(true),
        "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => {
            return Err(Error::malformed(
                "command",
                format!("unknown command '{other}', type 'help'"),
            ));
        }
    };

    Ok(command)
}

fn optional(arg: &str) -> Option<String> {
    match arg {
        "" | "any" | "all" => None,
        value => Some(value.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::filter::{SortDirection, SortKey};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_dispatch_commands() {
        assert_eq!(parse_command("r").unwrap(), Command::Dispatch(Event::Retry));
        assert_eq!(
            parse_command("open 2").unwrap(),
            Command::Dispatch(Event::OpenDetail(ModeratorId::new(2).unwrap()))
        );
        assert_eq!(
            parse_command("  search Ali ce ").unwrap(),
            Command::Dispatch(Event::SearchChanged("Ali ce".to_string()))
        );
        assert_eq!(
            parse_command("rank any").unwrap(),
            Command::Dispatch(Event::RankFilterChanged(None))
        );
        assert_eq!(
            parse_command("status inactive").unwrap(),
            Command::Dispatch(Event::StatusFilterChanged(Some("inactive".to_string())))
        );
        assert_eq!(
            parse_command("sort total:desc").unwrap(),
            Command::Dispatch(Event::SortChanged(SortSpec::new(
                SortKey::Total,
                SortDirection::Descending
            )))
        );
    }

    #[test]
    fn test_parse_control_commands() {
        assert_eq!(parse_command("").unwrap(), Command::Nothing);
        assert_eq!(parse_command("HELP").unwrap(), Command::Help);
        assert_eq!(parse_command("pause").unwrap(), Command::Visibility(false));
        assert_eq!(parse_command("resume").unwrap(), Command::Visibility(true));
        assert_eq!(parse_command("quit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_export() {
        assert_eq!(
            parse_command("export 3").unwrap(),
            Command::Export(Some(ModeratorId::new(3).unwrap()))
        );
        assert_eq!(parse_command("EXPORT").unwrap(), Command::Export(None));
        assert!(parse_command("export bob").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("open").is_err());
        assert!(parse_command("open -1").is_err());
        assert!(parse_command("sort nonsense key").is_err());
        assert!(parse_command("dance").is_err());
    }
}
