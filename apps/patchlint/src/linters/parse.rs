//! Record parsers shared by the external-tool linters.
//!
//! Lines that do not have the expected shape are skipped and logged; they
//! never abort parsing of the remaining output.

use crate::models::Message;
use tracing::debug;

/// Parse a strictly positive line or column number.
pub fn position(field: &str) -> Option<u32> {
    field.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Parse `file:line:col: text` records, as printed by flake8 and by
/// `yamllint -f parsable`.
pub fn colon_records(linter: &str, output: &str) -> Vec<Message> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = colon_record(line);
            if parsed.is_none() {
                debug!(linter, line, "skipping unrecognized output line");
            }
            parsed
        })
        .collect()
}

fn colon_record(line: &str) -> Option<Message> {
    let mut parts = line.splitn(4, ':');
    let filename = parts.next()?.trim();
    let row = position(parts.next()?)?;
    let col = position(parts.next()?)?;
    let text = parts.next()?.trim();
    if filename.is_empty() || text.is_empty() {
        return None;
    }
    Some(Message::new(filename, Some(row), Some(col), text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_well_formed_record() {
        let out = "a.py:1:1: F401 'os' imported but unused\n\
                   pkg/b.py:20:80: E501 line too long (90 > 79 characters)\n\
                   c.yml:3:5: [error] syntax error: mapping values are not allowed here (syntax)\n";
        let msgs = colon_records("t", out);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1], Message::new("pkg/b.py", Some(20), Some(80), "E501 line too long (90 > 79 characters)"));
        // Colons inside the text are kept.
        assert_eq!(
            msgs[2].text,
            "[error] syntax error: mapping values are not allowed here (syntax)"
        );
    }

    #[test]
    fn malformed_lines_drop_exactly_themselves() {
        let out = "a.py:1:2: ok one\n\
                   garbage without colons\n\
                   a.py:x:2: bad line number\n\
                   a.py:0:2: zero is not a line\n\
                   a.py:3:4: ok two\n\
                   a.py:5:6:\n\
                   \n\
                   b.py:7:8: ok three\n";
        let msgs = colon_records("t", out);
        let texts: Vec<_> = msgs.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["ok one", "ok two", "ok three"]);
    }

    #[test]
    fn position_rejects_zero_and_negatives() {
        assert_eq!(position(" 12 "), Some(12));
        assert_eq!(position("0"), None);
        assert_eq!(position("-1"), None);
        assert_eq!(position(""), None);
    }
}
