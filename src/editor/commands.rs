use color_eyre::{eyre::eyre, Report};
use std::{path::PathBuf, str::FromStr};

pub const HELP: &str = "\
i <pos> <text>   insert text at pos
a <text>         append text
d <pos> <len>    erase len characters at pos
p [<pos> <len>]  print the buffer, or a range of it
c <pos>          print the character at pos
s                size, height and leaf count
b                rebalance
e <file>         load file
w [file]         write buffer
wq [file]        write and quit
q                quit
h                this help

text arguments understand \\n, \\t and \\\\";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Insert { pos: usize, text: String },
    Append(String),
    Erase { pos: usize, len: usize },
    Print(Option<(usize, usize)>),
    Char(usize),
    Stats,
    Rebalance,
    Edit(PathBuf),
    Write(Option<PathBuf>),
    WriteQuit(Option<PathBuf>),
    Quit,
    Help,
}

impl FromStr for Command {
    type Err = Report;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start();
        let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
        let mut args = rest.split_whitespace();

        let command = match name {
            "i" => {
                let (pos, text) = rest.trim_start().split_once(' ').ok_or_else(|| eyre!("Usage: i <pos> <text>"))?;
                Command::Insert { pos: number(pos, "position")?, text: unescape(text) }
            }
            "a" if !rest.is_empty() => Command::Append(unescape(rest)),
            "a" => return Err(eyre!("Usage: a <text>")),
            "d" => match (args.next(), args.next()) {
                (Some(pos), Some(len)) => Command::Erase { pos: number(pos, "position")?, len: number(len, "length")? },
                _ => return Err(eyre!("Usage: d <pos> <len>")),
            },
            "p" => match (args.next(), args.next()) {
                (None, _) => Command::Print(None),
                (Some(pos), Some(len)) => Command::Print(Some((number(pos, "position")?, number(len, "length")?))),
                _ => return Err(eyre!("Usage: p [<pos> <len>]")),
            },
            "c" => match args.next() {
                Some(pos) => Command::Char(number(pos, "position")?),
                None => return Err(eyre!("Usage: c <pos>")),
            },
            "s" => Command::Stats,
            "b" => Command::Rebalance,
            "e" => match args.next() {
                Some(filename) => Command::Edit(PathBuf::from(filename)),
                None => return Err(eyre!("No filename specified")),
            },
            "w" => Command::Write(args.next().map(PathBuf::from)),
            "wq" => Command::WriteQuit(args.next().map(PathBuf::from)),
            "q" => Command::Quit,
            "h" | "help" => Command::Help,
            _ => return Err(eyre!("Unknown command: '{}' (h for help)", name)),
        };

        Ok(command)
    }
}

fn number(arg: &str, what: &str) -> Result<usize, Report> {
    arg.parse::<usize>().map_err(|_| eyre!("Invalid {}: '{}'", what, arg))
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        line.parse().unwrap()
    }

    #[test]
    fn insert_keeps_text_verbatim() {
        assert_eq!(parse("i 3 two  words "), Command::Insert { pos: 3, text: "two  words ".into() });
        assert_eq!(parse("i 0 a\\nb\\\\c\\q"), Command::Insert { pos: 0, text: "a\nb\\c\\q".into() });
        assert_eq!(parse("a  world"), Command::Append(" world".into()));
    }

    #[test]
    fn ranges_and_positions() {
        assert_eq!(parse("d 1 4"), Command::Erase { pos: 1, len: 4 });
        assert_eq!(parse("p"), Command::Print(None));
        assert_eq!(parse("p 2 3"), Command::Print(Some((2, 3))));
        assert_eq!(parse("c 7"), Command::Char(7));
    }

    #[test]
    fn files() {
        assert_eq!(parse("e notes.txt"), Command::Edit("notes.txt".into()));
        assert_eq!(parse("w"), Command::Write(None));
        assert_eq!(parse("wq out.txt"), Command::WriteQuit(Some("out.txt".into())));
    }

    #[test]
    fn rejects_bad_input() {
        assert!("i 3".parse::<Command>().is_err());
        assert!("i -1 x".parse::<Command>().is_err());
        assert!("d 1".parse::<Command>().is_err());
        assert!("p 1".parse::<Command>().is_err());
        assert!("e".parse::<Command>().is_err());
        assert!("a".parse::<Command>().is_err());

        let err = "x".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: 'x' (h for help)");
    }
}
