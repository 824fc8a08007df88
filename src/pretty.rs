use castlefall_shared::{EventEnvelope, EventKind, LeaveReason, Phase, RoomSnapshot};
use owo_colors::OwoColorize;

fn player_name(name: &str, you: Option<&str>, color: bool) -> String {
    if you == Some(name) && color {
        name.bold().to_string()
    } else {
        name.to_string()
    }
}

fn word_text(word: &str, color: bool) -> String {
    if color {
        word.yellow().bold().to_string()
    } else {
        word.to_string()
    }
}

fn leave_reason(reason: LeaveReason) -> &'static str {
    match reason {
        LeaveReason::Left => "left",
        LeaveReason::TimedOut => "timed out",
        LeaveReason::Kicked => "was kicked",
    }
}

fn tag(label: &str, color: bool, paint: fn(&str) -> String) -> String {
    if color {
        paint(label)
    } else {
        label.to_string()
    }
}

/// One line per event, e.g. `#4 == Round 2 == [Alice, Bob]`.
pub fn format_event_human(env: &EventEnvelope, you: Option<&str>, color: bool) -> String {
    let body = match &env.kind {
        EventKind::PlayerJoined { name, word } => {
            let mut line = format!(
                "{} {}",
                tag("+", color, |s| s.green().to_string()),
                player_name(name, you, color)
            );
            if let Some(w) = word {
                line.push_str(&format!(" (your word: {})", word_text(w, color)));
            }
            line
        }
        EventKind::PlayerLeft { name, reason } => format!(
            "{} {} {}",
            tag("-", color, |s| s.red().to_string()),
            player_name(name, you, color),
            leave_reason(*reason)
        ),
        EventKind::RoundStarted {
            round,
            players,
            words,
            word,
        } => {
            let title = format!("== Round {round} ==");
            let mut line = format!(
                "{} [{}] words: {}",
                tag(&title, color, |s| s.bold().blue().to_string()),
                players.join(", "),
                words.join(", ")
            );
            if let Some(w) = word {
                line.push_str(&format!(" | your word: {}", word_text(w, color)));
            }
            line
        }
        EventKind::DeclarationStarted { round } => tag(
            &format!("== Declarations open (round {round}) =="),
            color,
            |s| s.bold().purple().to_string(),
        ),
        EventKind::PlayerWon { name, word } => {
            let who = player_name(name, you, color);
            match word {
                Some(w) => format!(
                    "{} {} wins with {}",
                    tag("*", color, |s| s.yellow().to_string()),
                    who,
                    word_text(w, color)
                ),
                None => format!("{} {} wins", tag("*", color, |s| s.yellow().to_string()), who),
            }
        }
        EventKind::GameReset => tag("== New game ==", color, |s| s.bold().cyan().to_string()),
    };
    format!("#{} {}", env.seq, body)
}

pub fn format_snapshot_human(snap: &RoomSnapshot, color: bool) -> String {
    let mut out = String::new();
    let header = format!("Room {}  |  round {}  |  {:?}", snap.room, snap.round, snap.phase);
    out.push_str(&tag(&header, color, |s| s.bold().blue().to_string()));
    out.push('\n');
    if snap.phase != Phase::Lobby && !snap.words.is_empty() {
        out.push_str(&format!("Words: {}\n", snap.words.join(", ")));
    }
    if let Some(w) = &snap.your_word {
        out.push_str(&format!("Your word: {}\n", word_text(w, color)));
    }
    if let Some(winner) = &snap.winner {
        out.push_str(&format!("Winner: {winner}\n"));
    }
    out.push_str("Players:\n");
    for p in &snap.players {
        out.push_str(&format!("  {p}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_round_line_shows_own_word() {
        let env = EventEnvelope {
            seq: 4,
            timestamp_ms: 0,
            kind: EventKind::RoundStarted {
                round: 2,
                players: vec!["Alice".into(), "Bob".into()],
                words: vec!["apple".into(), "banana".into()],
                word: Some("apple".into()),
            },
        };
        assert_eq!(
            format_event_human(&env, Some("Alice"), false),
            "#4 == Round 2 == [Alice, Bob] words: apple, banana | your word: apple"
        );
    }

    #[test]
    fn plain_leave_line() {
        let env = EventEnvelope {
            seq: 7,
            timestamp_ms: 0,
            kind: EventKind::PlayerLeft {
                name: "Bob".into(),
                reason: LeaveReason::TimedOut,
            },
        };
        assert_eq!(format_event_human(&env, None, false), "#7 - Bob timed out");
    }
}
