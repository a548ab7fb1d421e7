use std::io::{self, BufRead, Write};

use clap::ValueEnum;
use novellog_adapters::present_conflict;
use novellog_application::{Decisions, PendingImport, Resolution};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    /// Ask about each conflict on stdin.
    #[default]
    Ask,
    Skip,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    One(Resolution),
    All(Resolution),
}

fn parse_answer(line: &str) -> Option<Answer> {
    match line.trim().to_ascii_lowercase().as_str() {
        "sa" | "skip-all" => Some(Answer::All(Resolution::Skip)),
        "oa" | "overwrite-all" => Some(Answer::All(Resolution::Overwrite)),
        other => other.parse::<Resolution>().ok().map(Answer::One),
    }
}

/// Collects a decision for every conflict of `pending`. End of input skips
/// whatever is left undecided.
pub fn resolve_conflicts<R, W>(
    pending: &PendingImport,
    policy: ConflictPolicy,
    input: &mut R,
    output: &mut W,
) -> io::Result<Decisions>
where
    R: BufRead,
    W: Write,
{
    let mut session = pending.session();
    match policy {
        ConflictPolicy::Skip => session.decide_remaining(Resolution::Skip),
        ConflictPolicy::Overwrite => session.decide_remaining(Resolution::Overwrite),
        ConflictPolicy::Ask => {
            while let Some(conflict) = session.current() {
                writeln!(output, "{}", present_conflict(conflict, session.position()))?;
                write!(output, "[s]kip, [o]verwrite, skip all [sa], overwrite all [oa]: ")?;
                output.flush()?;

                let mut line = String::new();
                if input.read_line(&mut line)? == 0 {
                    session.decide_remaining(Resolution::Skip);
                    break;
                }
                match parse_answer(&line) {
                    Some(Answer::One(resolution)) => {
                        session.decide(resolution);
                    }
                    Some(Answer::All(resolution)) => session.decide_remaining(resolution),
                    None => writeln!(output, "unrecognized answer: {}", line.trim())?,
                }
            }
        }
    }
    Ok(session.into_decisions())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_accept_short_and_long_forms() {
        assert_eq!(parse_answer("o\n"), Some(Answer::One(Resolution::Overwrite)));
        assert_eq!(parse_answer(" skip "), Some(Answer::One(Resolution::Skip)));
        assert_eq!(parse_answer("OA"), Some(Answer::All(Resolution::Overwrite)));
        assert_eq!(parse_answer("maybe"), None);
    }
}
