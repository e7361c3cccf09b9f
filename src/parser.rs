//! The expense/command grammar (§4.6), reproduced from the host-level
//! specification for test determinism. Recognizes the literal commands
//! `BALANCE`/`HISTORY`/`CREATE`/`ADD`/`DELETE` plus the expense form
//! `AMOUNT|PARTICIPANT(,PARTICIPANT)*( "DESCRIPTION")?`. Anything else
//! parses to `Command::Unrecognized`, which the engine silently ignores
//! (§7, Open Question (a) — resolved as "silence is the contract").

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedParticipant {
    pub handle: String,
    pub plus_mod: Option<Decimal>,
    pub star_mod: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpense {
    pub amount: Decimal,
    pub payer_handle: String,
    pub participants: Vec<ParsedParticipant>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Balance,
    History,
    Create { group: String },
    Add { user: String, group: String },
    Delete { user: String, group: String },
    Expense(ParsedExpense),
    Unrecognized,
}

fn user_handle() -> &'static str {
    "[A-Z]{2}"
}

fn group_handle() -> &'static str {
    "[A-Z]{3,12}"
}

fn command_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^(?:CREATE (?P<create>{g})|ADD (?P<add_user>{u}) (?P<add_group>{g})|DELETE (?P<del_user>{u}) (?P<del_group>{g}))$",
            g = group_handle(),
            u = user_handle(),
        ))
        .expect("command regex is a fixed, known-valid pattern")
    })
}

fn participant_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^(?P<handle>(?:{u}|{g}))(?:(?P<plus1>\+[0-9]+(?:\.[0-9]{{1,2}})?)(?P<star1>\*[0-9]+(?:\.[0-9])?)?|(?P<star2>\*[0-9]+(?:\.[0-9])?)?(?P<plus2>\+[0-9]+(?:\.[0-9]{{1,2}})?)?)$",
            u = user_handle(),
            g = group_handle(),
        ))
        .expect("participant regex is a fixed, known-valid pattern")
    })
}

fn expense_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(?P<amount>[0-9]+(?:\.[0-9]{1,2})?)\|(?P<participants>[^"]+?)(?: "(?P<description>(?:[^"\\]|\\.)*)")?$"#)
            .expect("expense regex is a fixed, known-valid pattern")
    })
}

/// Parses one line of input into a `Command`. Never returns an `Err`:
/// anything that doesn't match a known production is `Command::Unrecognized`
/// (§7's silent-failure contract for malformed commands).
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    match line {
        "BALANCE" => return Command::Balance,
        "HISTORY" => return Command::History,
        _ => {}
    }

    if let Some(caps) = command_regex().captures(line) {
        if let Some(group) = caps.name("create") {
            return Command::Create {
                group: group.as_str().to_string(),
            };
        }
        if let (Some(user), Some(group)) = (caps.name("add_user"), caps.name("add_group")) {
            return Command::Add {
                user: user.as_str().to_string(),
                group: group.as_str().to_string(),
            };
        }
        if let (Some(user), Some(group)) = (caps.name("del_user"), caps.name("del_group")) {
            return Command::Delete {
                user: user.as_str().to_string(),
                group: group.as_str().to_string(),
            };
        }
    }

    if let Some(expense) = parse_expense(line) {
        return Command::Expense(expense);
    }

    Command::Unrecognized
}

fn parse_expense(line: &str) -> Option<ParsedExpense> {
    let caps = expense_regex().captures(line)?;
    let amount = Decimal::from_str(caps.name("amount")?.as_str()).ok()?;
    let description = caps.name("description").map(|m| m.as_str().replace("\\\"", "\""));

    let mut participants = Vec::new();
    for token in caps.name("participants")?.as_str().split(',') {
        participants.push(parse_participant(token)?);
    }
    if participants.is_empty() {
        return None;
    }

    Some(ParsedExpense {
        amount,
        payer_handle: participants[0].handle.clone(),
        participants,
        description,
    })
}

fn parse_participant(token: &str) -> Option<ParsedParticipant> {
    let caps = participant_regex().captures(token)?;
    let handle = caps.name("handle")?.as_str().to_string();
    let plus = caps
        .name("plus1")
        .or_else(|| caps.name("plus2"))
        .map(|m| Decimal::from_str(&m.as_str()[1..]).ok())
        .flatten();
    let star = caps
        .name("star1")
        .or_else(|| caps.name("star2"))
        .map(|m| Decimal::from_str(&m.as_str()[1..]).ok())
        .flatten();
    Some(ParsedParticipant {
        handle,
        plus_mod: plus,
        star_mod: star,
    })
}
