use magicrank::{Model, SortCriterion};

pub const HELP_TEXT: &str = "\
Commands:
  model a|b         switch model and reload its rankings
  sort <criterion>  resort the loaded table (magic_formula, roic, ev_ebit, preco, score, papel)
  show              print the current table again
  help              show this help
  quit | exit       leave the session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Model(Model),
    Sort(SortCriterion),
    Show,
    Help,
    Quit,
    Empty,
}

/// Parses one input line. Unknown sort names select the default criterion,
/// like the selector they replace.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Empty);
    };
    let argument = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }

    match (verb.to_ascii_lowercase().as_str(), argument) {
        ("model", Some(name)) => name.parse().map(Command::Model),
        ("model", None) => Err("usage: model a|b".to_string()),
        ("sort", Some(name)) => Ok(Command::Sort(SortCriterion::parse_lenient(name))),
        ("sort", None) => Err("usage: sort <criterion>".to_string()),
        ("show", None) => Ok(Command::Show),
        ("help" | "?", None) => Ok(Command::Help),
        ("quit" | "exit" | "q", None) => Ok(Command::Quit),
        (other, _) => Err(format!("unknown command '{other}' (type help)")),
    }
}
