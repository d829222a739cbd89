//! Turns a token list into a [`ParsedCommand`] by pulling out redirection
//! clauses.

use std::fmt;

/// Which standard stream a redirection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// A redirection operator, recognized only as a standalone token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOperator {
    /// `>` or `1>`: truncate and write standard output.
    Stdout,
    /// `2>`: truncate and write standard error.
    Stderr,
    /// `>>` or `1>>`: append standard output.
    AppendStdout,
    /// `2>>`: append standard error.
    AppendStderr,
}

impl RedirectOperator {
    /// Recognizes an operator token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            ">" | "1>" => Some(RedirectOperator::Stdout),
            "2>" => Some(RedirectOperator::Stderr),
            ">>" | "1>>" => Some(RedirectOperator::AppendStdout),
            "2>>" => Some(RedirectOperator::AppendStderr),
            _ => None,
        }
    }

    pub fn stream(self) -> Stream {
        match self {
            RedirectOperator::Stdout | RedirectOperator::AppendStdout => Stream::Stdout,
            RedirectOperator::Stderr | RedirectOperator::AppendStderr => Stream::Stderr,
        }
    }

    /// Whether the target is opened for appending rather than truncated.
    pub fn appends(self) -> bool {
        matches!(
            self,
            RedirectOperator::AppendStdout | RedirectOperator::AppendStderr
        )
    }
}

impl fmt::Display for RedirectOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RedirectOperator::Stdout => ">",
            RedirectOperator::Stderr => "2>",
            RedirectOperator::AppendStdout => ">>",
            RedirectOperator::AppendStderr => "2>>",
        };
        f.write_str(s)
    }
}

/// One operator/target pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionClause {
    pub operator: RedirectOperator,
    pub target: String,
}

/// A command line after redirection extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    /// `args[0]` before extraction; empty when the line had no command word.
    pub name: String,
    /// Positional arguments, including the command name in position 0.
    pub args: Vec<String>,
    /// Clauses in the order they appeared.
    pub redirections: Vec<RedirectionClause>,
}

impl ParsedCommand {
    /// Arguments after the command name.
    pub fn params(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }
}

/// Splits `tokens` into positional arguments and redirection clauses.
///
/// The first operator that has a following token ends the positional
/// arguments; everything after it is either a target or another operator. An
/// operator in last position has no target and is left alone.
pub fn extract_redirection(tokens: Vec<String>) -> ParsedCommand {
    let name = tokens.first().cloned().unwrap_or_default();

    let first_clause = tokens.iter().enumerate().position(|(i, token)| {
        i + 1 < tokens.len() && RedirectOperator::from_token(token).is_some()
    });

    let Some(start) = first_clause else {
        return ParsedCommand {
            name,
            args: tokens,
            redirections: Vec::new(),
        };
    };

    let mut redirections = Vec::new();
    let mut pos = start;
    while pos < tokens.len() {
        match RedirectOperator::from_token(&tokens[pos]) {
            Some(operator) if pos + 1 < tokens.len() => {
                redirections.push(RedirectionClause {
                    operator,
                    target: tokens[pos + 1].clone(),
                });
                pos += 2;
            }
            _ => {
                log::debug!("ignoring stray token after redirection: {:?}", tokens[pos]);
                pos += 1;
            }
        }
    }

    let mut args = tokens;
    args.truncate(start);

    ParsedCommand {
        name,
        args,
        redirections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn clause(operator: RedirectOperator, target: &str) -> RedirectionClause {
        RedirectionClause {
            operator,
            target: target.to_string(),
        }
    }

    #[test]
    fn test_no_redirection_keeps_all_args() {
        let parsed = extract_redirection(words(&["echo", "a", "b"]));
        assert_eq!(parsed.name, "echo");
        assert_eq!(parsed.args, words(&["echo", "a", "b"]));
        assert!(parsed.redirections.is_empty());
        assert_eq!(parsed.params(), &words(&["a", "b"])[..]);
    }

    #[test]
    fn test_stdout_redirection_removed_from_args() {
        let parsed = extract_redirection(words(&["echo", "hi", ">", "out.txt"]));
        assert_eq!(parsed.args, words(&["echo", "hi"]));
        assert_eq!(
            parsed.redirections,
            vec![clause(RedirectOperator::Stdout, "out.txt")]
        );
    }

    #[test]
    fn test_all_operator_spellings() {
        for (token, op) in [
            (">", RedirectOperator::Stdout),
            ("1>", RedirectOperator::Stdout),
            ("2>", RedirectOperator::Stderr),
            (">>", RedirectOperator::AppendStdout),
            ("1>>", RedirectOperator::AppendStdout),
            ("2>>", RedirectOperator::AppendStderr),
        ] {
            let parsed = extract_redirection(words(&["ls", token, "f"]));
            assert_eq!(parsed.args, words(&["ls"]), "operator {token}");
            assert_eq!(parsed.redirections, vec![clause(op, "f")]);
        }
    }

    #[test]
    fn test_trailing_operator_is_inert() {
        let parsed = extract_redirection(words(&["echo", "a", ">"]));
        assert_eq!(parsed.args, words(&["echo", "a", ">"]));
        assert!(parsed.redirections.is_empty());
    }

    #[test]
    fn test_tokens_after_first_clause_are_not_arguments() {
        let parsed = extract_redirection(words(&["echo", "a", ">", "f", "b", "2>", "e"]));
        assert_eq!(parsed.args, words(&["echo", "a"]));
        assert_eq!(
            parsed.redirections,
            vec![
                clause(RedirectOperator::Stdout, "f"),
                clause(RedirectOperator::Stderr, "e"),
            ]
        );
    }

    #[test]
    fn test_repeated_stream_clauses_keep_source_order() {
        let parsed = extract_redirection(words(&["ls", ">", "a", "2>", "e", ">>", "b"]));
        assert_eq!(
            parsed.redirections,
            vec![
                clause(RedirectOperator::Stdout, "a"),
                clause(RedirectOperator::Stderr, "e"),
                clause(RedirectOperator::AppendStdout, "b"),
            ]
        );
    }

    #[test]
    fn test_operator_as_first_token_leaves_empty_args() {
        let parsed = extract_redirection(words(&[">", "out.txt"]));
        assert_eq!(parsed.name, ">");
        assert!(parsed.args.is_empty());
        assert_eq!(
            parsed.redirections,
            vec![clause(RedirectOperator::Stdout, "out.txt")]
        );
    }

    #[test]
    fn test_operator_glued_to_word_is_not_recognized() {
        let parsed = extract_redirection(words(&["echo", "a>b"]));
        assert_eq!(parsed.args, words(&["echo", "a>b"]));
        assert!(parsed.redirections.is_empty());
    }
}
