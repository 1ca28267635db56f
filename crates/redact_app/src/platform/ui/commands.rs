use redact_core::{Msg, PiiType};

pub const HELP: &str = "\
commands:
  toggle <n>                 select or deselect span #n
  add <offset> <type> <text> mark <text> starting at character <offset>
  reset                      select every span again
  save                       send the selected spans to the server
  encrypt                    encrypt the saved spans and download the tokenized text
  decrypt <key>              decrypt with a key
  export                     write a JSON report of the selected spans
  retry                      poll detection again after a failure
  types                      list PII types
  show                       redraw the document
  help                       this text
  quit                       leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle(usize),
    Add {
        offset: usize,
        pii_type: PiiType,
        text: String,
    },
    Reset,
    Save,
    Encrypt,
    Decrypt(String),
    Export,
    Retry,
    Types,
    Show,
    Help,
    Quit,
}

impl Command {
    /// Messages for the core; `None` for commands the terminal handles itself.
    pub fn into_msg(self) -> Option<Msg> {
        let msg = match self {
            Command::Toggle(index) => Msg::SpanToggled(index),
            Command::Add {
                offset,
                pii_type,
                text,
            } => Msg::ManualSpanRequested {
                text,
                pii_type,
                offset,
            },
            Command::Reset => Msg::ResetClicked,
            Command::Save => Msg::SaveClicked,
            Command::Encrypt => Msg::EncryptClicked,
            Command::Decrypt(key) => Msg::DecryptRequested { key },
            Command::Export => Msg::ExportClicked,
            Command::Retry => Msg::RetryDetectionClicked,
            Command::Show => Msg::Tick,
            Command::Types | Command::Help | Command::Quit => return None,
        };
        Some(msg)
    }
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let trimmed = line.trim_start();
    let (word, rest) = split_word(trimmed);

    match word {
        "" | "show" => Ok(Command::Show),
        "toggle" | "t" => {
            let index = rest.trim();
            index
                .parse()
                .map(Command::Toggle)
                .map_err(|_| format!("expected a span number, got `{index}`"))
        }
        "add" | "a" => parse_add(rest),
        "reset" => Ok(Command::Reset),
        "save" => Ok(Command::Save),
        "encrypt" => Ok(Command::Encrypt),
        "decrypt" => Ok(Command::Decrypt(rest.trim().to_string())),
        "export" => Ok(Command::Export),
        "retry" => Ok(Command::Retry),
        "types" => Ok(Command::Types),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command `{other}`; type `help`")),
    }
}

// The text is everything after the type and one separator, so leading and
// inner whitespace in the marked text survive.
fn parse_add(rest: &str) -> Result<Command, String> {
    let (offset, rest) = split_word(rest.trim_start());
    let offset = offset
        .parse()
        .map_err(|_| format!("expected a character offset, got `{offset}`"))?;
    let (pii_type, text) = split_word(rest.trim_start());
    let pii_type: PiiType = pii_type.parse().map_err(|err| format!("{err}"))?;
    if text.is_empty() {
        return Err("add needs the text to mark".to_string());
    }
    Ok(Command::Add {
        offset,
        pii_type,
        text: text.to_string(),
    })
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest),
        None => (input, ""),
    }
}
