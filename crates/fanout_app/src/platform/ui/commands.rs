//! Console input: one command per line.

use fanout_core::Msg;

pub const HELP: &str = "commands: start | stop | break | cancel | clear | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Core(Msg),
    Help,
    Quit,
}

/// Parses one input line. Blank lines yield `None`; unknown words are
/// reported back as `Err` with the offending word.
pub fn parse_command(line: &str) -> Option<Result<ConsoleCommand, String>> {
    let word = line.trim();
    if word.is_empty() {
        return None;
    }
    let command = match word.to_ascii_lowercase().as_str() {
        "start" | "s" => ConsoleCommand::Core(Msg::StartClicked),
        "stop" => ConsoleCommand::Core(Msg::StopClicked),
        "break" | "b" => ConsoleCommand::Core(Msg::BreakClicked),
        "cancel" | "c" => ConsoleCommand::Core(Msg::CancelClicked),
        "clear" => ConsoleCommand::Core(Msg::ClearClicked),
        "help" | "h" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        _ => return Some(Err(word.to_string())),
    };
    Some(Ok(command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn words_map_to_messages() {
        assert_eq!(
            parse_command("start\n"),
            Some(Ok(ConsoleCommand::Core(Msg::StartClicked)))
        );
        assert_eq!(
            parse_command("  BREAK "),
            Some(Ok(ConsoleCommand::Core(Msg::BreakClicked)))
        );
        assert_eq!(
            parse_command("c"),
            Some(Ok(ConsoleCommand::Core(Msg::CancelClicked)))
        );
        assert_eq!(parse_command("exit"), Some(Ok(ConsoleCommand::Quit)));
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command("restart"), Some(Err("restart".to_string())));
    }
}
