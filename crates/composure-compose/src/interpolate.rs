//! Shell-like variable interpolation using `nom`.
//!
//! Supported forms:
//!
//! | Form              | Result                                                 |
//! |-------------------|--------------------------------------------------------|
//! | `$$`              | a literal `$`                                          |
//! | `$NAME`           | value of `NAME`, empty if undefined                    |
//! | `${NAME}`         | value of `NAME`, empty if undefined                    |
//! | `${NAME-word}`    | value if defined (even empty), else `word`             |
//! | `${NAME:-word}`   | value if defined and non-empty, else `word`            |
//! | `${NAME?word}`    | value if defined, else an expansion error `word`       |
//! | `${NAME:?word}`   | value if defined and non-empty, else an error `word`   |
//!
//! The scan is a single left-to-right pass. Default and error words are
//! inserted as written; they are never expanded again.

use composure_common::error::{ComposeError, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, satisfy},
    combinator::{all_consuming, opt, recognize, rest, value},
};

/// Modifier of a braced reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    /// `-`: default when undefined.
    Default,
    /// `:-`: default when undefined or empty.
    DefaultIfEmpty,
    /// `?`: error when undefined.
    Required,
    /// `:?`: error when undefined or empty.
    RequiredNonEmpty,
}

/// A parsed braced reference: `NAME`, optionally followed by a modifier and
/// its word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reference<'a> {
    name: &'a str,
    modifier: Option<(Modifier, &'a str)>,
}

/// Expands every variable reference in `template`.
///
/// `lookup` returns the value of a variable, or `None` when it is undefined.
///
/// # Errors
///
/// Returns [`ComposeError::Expansion`] when a `?` or `:?` reference fails.
pub fn expand<F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(template.len());
    let mut input = template;

    while !input.is_empty() {
        if let Ok((remaining, text)) = literal_text(input) {
            output.push_str(text);
            input = remaining;
            continue;
        }

        let (after_dollars, dollars) = dollar_run(input);
        output.extend(std::iter::repeat_n('$', dollars / 2));
        input = after_dollars;
        if dollars % 2 == 0 {
            continue;
        }

        if let Ok((remaining, body)) = braced(input) {
            if let Some(reference) = parse_reference(body) {
                output.push_str(&resolve(&reference, &lookup)?);
            } else {
                output.push_str("${");
                output.push_str(body);
                output.push('}');
            }
            input = remaining;
        } else if let Ok((remaining, name)) = variable_name(input) {
            if let Some(found) = lookup(name) {
                output.push_str(&found);
            }
            input = remaining;
        } else {
            output.push('$');
        }
    }

    Ok(output)
}

fn resolve<F>(reference: &Reference<'_>, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let found = lookup(reference.name);
    let Some((modifier, word)) = reference.modifier else {
        return Ok(found.unwrap_or_default());
    };

    let usable = match modifier {
        Modifier::Default | Modifier::Required => found.is_some(),
        Modifier::DefaultIfEmpty | Modifier::RequiredNonEmpty => {
            found.as_deref().is_some_and(|v| !v.is_empty())
        }
    };
    if usable {
        return Ok(found.unwrap_or_default());
    }

    match modifier {
        Modifier::Default | Modifier::DefaultIfEmpty => Ok(word.to_string()),
        Modifier::Required | Modifier::RequiredNonEmpty => {
            tracing::debug!(variable = reference.name, "required variable is missing");
            let message = if word.is_empty() {
                format!("required variable '{}' is missing a value", reference.name)
            } else {
                word.to_string()
            };
            Err(ComposeError::Expansion { message })
        }
    }
}

/// Text up to the next `$`.
fn literal_text(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != '$').parse(input)
}

/// A run of `$` characters, returned as its length.
fn dollar_run(input: &str) -> (&str, usize) {
    let remaining = input.trim_start_matches('$');
    (remaining, input.len() - remaining.len())
}

/// `NAME`: a letter or underscore followed by letters, digits or underscores.
fn variable_name(input: &str) -> IResult<&str, &str> {
    recognize((
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// `{...}` up to the matching close brace, returning the inner text.
///
/// Nested `${` openings must be closed before the outer reference ends.
fn braced(input: &str) -> IResult<&str, &str> {
    let (body_start, _) = char('{').parse(input)?;
    // Only a `{` preceded by `$` opens a level, which a plain `take_until("}")` cannot see.
    let mut depth = 0_usize;
    let mut previous = '\0';
    for (idx, c) in body_start.char_indices() {
        match c {
            '{' if previous == '$' => depth += 1,
            '}' if depth == 0 => return Ok((&body_start[idx + 1..], &body_start[..idx])),
            '}' => depth -= 1,
            _ => {}
        }
        previous = c;
    }
    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn modifier(input: &str) -> IResult<&str, Modifier> {
    alt((
        value(Modifier::DefaultIfEmpty, tag(":-")),
        value(Modifier::RequiredNonEmpty, tag(":?")),
        value(Modifier::Default, tag("-")),
        value(Modifier::Required, tag("?")),
    ))
    .parse(input)
}

/// Parses the inside of `${...}`; `None` if it is not a valid reference.
fn parse_reference(body: &str) -> Option<Reference<'_>> {
    let word = rest::<&str, nom::error::Error<&str>>;
    let (_, (name, modifier)) = all_consuming((variable_name, opt((modifier, word))))
        .parse(body)
        .ok()?;
    Some(Reference { name, modifier })
}
