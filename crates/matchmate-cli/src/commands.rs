use matchmate_types::models::Decision;

pub const HELP: &str = "\
commands:
  list                 show the current page of profiles
  next                 scroll one page down (loads more at the end)
  more                 fetch the next batch now
  accept <uid|#>       accept a profile by uid or list number
  decline <uid|#>      decline a profile by uid or list number
  history              show decided profiles
  refresh              drop the cache and fetch a fresh batch
  help                 this text
  quit                 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Next,
    More,
    Decide(Decision, String),
    History,
    Refresh,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Err("empty command".into());
    };
    let arg = parts.next();

    let cmd = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("list" | "ls", None) => Command::List,
        ("next" | "n", None) => Command::Next,
        ("more", None) => Command::More,
        ("accept" | "a", Some(target)) => Command::Decide(Decision::Accept, target.to_string()),
        ("decline" | "d", Some(target)) => Command::Decide(Decision::Decline, target.to_string()),
        ("accept" | "a" | "decline" | "d", None) => {
            return Err(format!("usage: {} <uid|#>", verb));
        }
        ("history" | "h", None) => Command::History,
        ("refresh", None) => Command::Refresh,
        ("help" | "?", None) => Command::Help,
        ("quit" | "exit" | "q", None) => Command::Quit,
        _ => return Err(format!("unknown command '{}', try 'help'", line.trim())),
    };

    if parts.next().is_some() {
        return Err(format!("too many arguments for '{}'", verb));
    }
    Ok(cmd)
}

/// A 1-based list number picks from `uids`; anything else is taken as a uid.
pub fn resolve_target(target: &str, uids: &[String]) -> String {
    match target.parse::<usize>() {
        Ok(n) if n >= 1 && n <= uids.len() => uids[n - 1].clone(),
        _ => target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse("list"), Ok(Command::List));
        assert_eq!(parse("  NEXT "), Ok(Command::Next));
        assert_eq!(
            parse("accept abc@example.com"),
            Ok(Command::Decide(Decision::Accept, "abc@example.com".into()))
        );
        assert_eq!(parse("d 3"), Ok(Command::Decide(Decision::Decline, "3".into())));
        assert_eq!(parse("q"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse("").is_err());
        assert!(parse("accept").is_err());
        assert!(parse("list everything").is_err());
        assert!(parse("swipe left").is_err());
    }

    #[test]
    fn resolves_list_numbers() {
        let uids = vec!["x".to_string(), "y".to_string()];
        assert_eq!(resolve_target("2", &uids), "y");
        assert_eq!(resolve_target("3", &uids), "3");
        assert_eq!(resolve_target("0", &uids), "0");
        assert_eq!(resolve_target("x", &uids), "x");
    }
}
