//! Output formatting for query results and trie dumps

use crate::query::QueryResult;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Print matched document keys, one per line, followed by a summary
pub fn print_results(result: &QueryResult, color: bool) -> io::Result<()> {
    let mut out = stdout(color);
    write_results(&mut out, result)
}

pub fn write_results<W: WriteColor>(out: &mut W, result: &QueryResult) -> io::Result<()> {
    for key in &result.keys {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(out, "{}", key)?;
        out.reset()?;
        writeln!(out)?;
    }

    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(
        out,
        "{} documents, {} terms matched",
        result.keys.len(),
        result.matched_terms
    )?;
    out.reset()?;
    if result.timed_out {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        write!(out, " (timed out, partial)")?;
        out.reset()?;
    }
    writeln!(out)
}

/// Print stored suffixes, highlighting occurrences of `needle`
pub fn print_suffixes(suffixes: &[String], needle: Option<&str>, color: bool) -> io::Result<()> {
    let mut out = stdout(color);
    write_suffixes(&mut out, suffixes, needle)
}

pub fn write_suffixes<W: WriteColor>(
    out: &mut W,
    suffixes: &[String],
    needle: Option<&str>,
) -> io::Result<()> {
    for suffix in suffixes {
        match needle.filter(|n| !n.is_empty()).and_then(|n| suffix.find(n).map(|at| (n, at))) {
            Some((n, at)) => {
                write!(out, "{}", &suffix[..at])?;
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
                write!(out, "{}", n)?;
                out.reset()?;
                writeln!(out, "{}", &suffix[at + n.len()..])?;
            }
            None => writeln!(out, "{}", suffix)?,
        }
    }
    Ok(())
}
