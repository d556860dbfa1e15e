//! Input helpers shared by the subcommands.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Opens `path` for buffered reading; `-` means stdin.
pub fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file =
        File::open(path).with_context(|| format!("failed to open input: {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Parses integer symbols separated by whitespace or commas.
///
/// Text after `#` on a line is ignored.
pub fn parse_symbols(reader: impl BufRead) -> Result<Vec<i64>> {
    let mut symbols = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("failed to read symbol input")?;
        let content = line.split('#').next().unwrap_or_default();
        for token in content
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            match token.parse::<i64>() {
                Ok(s) => symbols.push(s),
                Err(_) => bail!("line {}: '{token}' is not an integer symbol", line_no + 1),
            }
        }
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_separators_and_comments() {
        let text = "1, 2 3\n# header only\n-4,5 # trailing\n\n";
        let symbols = parse_symbols(text.as_bytes()).unwrap();
        assert_eq!(symbols, vec![1, 2, 3, -4, 5]);
    }

    #[test]
    fn non_integer_rejected() {
        let err = parse_symbols("1 2\n3 x".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn float_symbol_rejected() {
        assert!(parse_symbols("1.5".as_bytes()).is_err());
    }
}
