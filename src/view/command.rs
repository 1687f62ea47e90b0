use crate::paginator::Navigation;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Navigate(Navigation),
    Help,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("empty command".to_string());
        }
        let lower = trimmed.to_lowercase();
        let mut parts = lower.split_whitespace();
        let head = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("unexpected input '{trimmed}'"));
        }

        let command = match (head, arg) {
            ("n" | "next", None) => Command::Navigate(Navigation::Next),
            ("p" | "prev" | "previous", None) => Command::Navigate(Navigation::Previous),
            ("f" | "first", None) => Command::Navigate(Navigation::First),
            ("l" | "last", None) => Command::Navigate(Navigation::Last),
            ("h" | "help" | "?", None) => Command::Help,
            ("q" | "quit" | "exit", None) => Command::Quit,
            ("g" | "goto", Some(page)) => Command::Navigate(Navigation::Goto(parse_page(page)?)),
            (page, None) if page.chars().all(|c| c.is_ascii_digit()) => {
                Command::Navigate(Navigation::Goto(parse_page(page)?))
            }
            _ => return Err(format!("unknown command '{trimmed}'")),
        };
        Ok(command)
    }
}

fn parse_page(raw: &str) -> Result<usize, String> {
    let page: usize = raw
        .parse()
        .map_err(|_| format!("invalid page number '{raw}'"))?;
    if page == 0 {
        return Err("page numbers start at 1".to_string());
    }
    Ok(page)
}

pub const HELP: &str = "\
Commands:
  n, next            next page
  p, prev            previous page
  f, first           first page
  l, last            last page
  <N>, g <N>         jump to page N
  h, help, ?         show this help
  q, quit            leave";
