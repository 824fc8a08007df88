use castlefall_shared::ClientMsg;

/// One line of stdin, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Send(ClientMsg),
    Quit,
}

/// Parse a stdin command. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Input>, String> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(None);
    };
    let rest: Vec<String> = parts.map(str::to_string).collect();

    let msg = match cmd.to_ascii_lowercase().as_str() {
        "start" | "next" => ClientMsg::StartRound {
            words: (!rest.is_empty()).then_some(rest),
        },
        "declare" => ClientMsg::StartDeclaration,
        "win" => ClientMsg::DeclareWin {
            name: rest.into_iter().next(),
        },
        "kick" => match rest.into_iter().next() {
            Some(name) => ClientMsg::Kick { name },
            None => return Err("usage: kick <name>".into()),
        },
        "new" => ClientMsg::NewGame,
        "leave" => ClientMsg::Leave,
        "ping" => ClientMsg::Ping,
        "quit" | "exit" => return Ok(Some(Input::Quit)),
        other => {
            return Err(format!(
                "unknown command '{other}' (start [words] | declare | win [name] | kick <name> | new | leave | quit)"
            ))
        }
    };
    Ok(Some(Input::Send(msg)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_with_and_without_words() {
        assert_eq!(
            parse_command("start"),
            Ok(Some(Input::Send(ClientMsg::StartRound { words: None })))
        );
        assert_eq!(
            parse_command("start kiwi fig"),
            Ok(Some(Input::Send(ClientMsg::StartRound {
                words: Some(vec!["kiwi".into(), "fig".into()])
            })))
        );
    }

    #[test]
    fn win_defaults_to_self() {
        assert_eq!(
            parse_command("win"),
            Ok(Some(Input::Send(ClientMsg::DeclareWin { name: None })))
        );
        assert_eq!(
            parse_command("WIN Bob"),
            Ok(Some(Input::Send(ClientMsg::DeclareWin {
                name: Some("Bob".into())
            })))
        );
    }

    #[test]
    fn kick_needs_a_name() {
        assert!(parse_command("kick").is_err());
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("quit"), Ok(Some(Input::Quit)));
        assert!(parse_command("dance").is_err());
    }
}
