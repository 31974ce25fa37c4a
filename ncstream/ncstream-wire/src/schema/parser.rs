//! nom grammar for the metadata text.
//!
//! ```text
//! schema     := item*
//! item       := attribute | variable
//! attribute  := ':' name '=' value ';'
//! value      := string | number (',' number)* | opaque
//! variable   := ['unsigned'] type name ['(' dim (',' dim)* ')'] ['{' item* '}'] ';'
//! dim        := [name '='] (integer | '*')
//! name       := identifier | string
//! ```
//!
//! Whitespace and `//` line comments may appear between tokens. Once an
//! attribute's `:` or a variable's type keyword has been read the parser
//! commits, so syntax errors point at the offending token rather than at the
//! start of the enclosing declaration.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till1},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace1, not_line_ending, one_of},
    combinator::{consumed, cut, map, map_res, opt, peek, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use super::ast::{AttributeAst, AttributeValueAst, DimAst, Item, VariableAst};
use crate::error::SchemaDecodeError;

pub(crate) fn parse_schema(text: &str) -> Result<Vec<Item>, SchemaDecodeError> {
    let result: IResult<&str, Vec<Item>> = terminated(many0(preceded(ws, item)), ws)(text);
    match result {
        Ok(("", items)) => Ok(items),
        Ok((rest, _)) => Err(syntax_error(
            text,
            rest,
            "expected an attribute or variable declaration",
        )),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(syntax_error(
            text,
            e.input,
            &format!("unexpected input ({})", e.code.description()),
        )),
        Err(nom::Err::Incomplete(_)) => Err(SchemaDecodeError::Syntax {
            offset: text.len(),
            detail: "incomplete input".to_string(),
        }),
    }
}

fn syntax_error(text: &str, rest: &str, detail: &str) -> SchemaDecodeError {
    let snippet: String = rest.chars().take(24).collect();
    SchemaDecodeError::Syntax {
        offset: text.len() - rest.len(),
        detail: format!("{detail} near '{snippet}'"),
    }
}

fn item(input: &str) -> IResult<&str, Item> {
    alt((
        map(attribute, Item::Attribute),
        map(variable, Item::Variable),
    ))(input)
}

/// Parse `:name = value;`
fn attribute(input: &str) -> IResult<&str, AttributeAst> {
    preceded(
        char(':'),
        cut(map(
            tuple((
                ws,
                name,
                ws,
                char('='),
                ws,
                attribute_value,
                ws,
                char(';'),
            )),
            |(_, name, _, _, _, value, _, _)| AttributeAst { name, value },
        )),
    )(input)
}

/// Quoted text, a number list, or anything else up to `;` kept verbatim.
fn attribute_value(input: &str) -> IResult<&str, AttributeValueAst> {
    alt((
        map(terminated(quoted, end_of_value), AttributeValueAst::Text),
        map(
            terminated(
                consumed(separated_list1(list_separator, number_token)),
                end_of_value,
            ),
            |(raw, tokens)| AttributeValueAst::Numbers {
                tokens: tokens.into_iter().map(String::from).collect(),
                raw: raw.to_string(),
            },
        ),
        map(take_till1(|c: char| c == ';'), |raw: &str| {
            AttributeValueAst::Opaque(raw.trim().to_string())
        }),
    ))(input)
}

fn end_of_value(input: &str) -> IResult<&str, char> {
    peek(preceded(ws, char(';')))(input)
}

/// Integer, float, `nan` or `inf`, optionally signed.
fn number_token(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(one_of("+-")),
        alt((
            tag_no_case("nan"),
            tag_no_case("infinity"),
            tag_no_case("inf"),
            recognize_float,
        )),
    ))(input)
}

/// Parse `['unsigned'] type name [dims] [block];`
fn variable(input: &str) -> IResult<&str, VariableAst> {
    let (input, unsigned) = opt(terminated(
        verify(identifier, |s: &str| s == "unsigned"),
        ws,
    ))(input)?;
    let (input, type_tag) = identifier(input)?;
    let (input, (_, name, _, dims, _, items, _, _)) = cut(tuple((
        ws,
        name,
        ws,
        opt(dimensions),
        ws,
        opt(block),
        ws,
        char(';'),
    )))(input)?;

    Ok((
        input,
        VariableAst {
            unsigned: unsigned.is_some(),
            type_tag: type_tag.to_string(),
            name,
            dims: dims.unwrap_or_default(),
            items: items.unwrap_or_default(),
        },
    ))
}

fn dimensions(input: &str) -> IResult<&str, Vec<DimAst>> {
    preceded(
        char('('),
        cut(delimited(
            ws,
            separated_list1(list_separator, dimension),
            pair(ws, char(')')),
        )),
    )(input)
}

/// Parse `[name =] (integer | *)`
fn dimension(input: &str) -> IResult<&str, DimAst> {
    map(
        pair(
            opt(terminated(name, tuple((ws, char('='), ws)))),
            alt((
                value(None, char('*')),
                map(map_res(digit1, |s: &str| s.parse::<u64>()), Some),
            )),
        ),
        |(name, length)| DimAst { name, length },
    )(input)
}

fn block(input: &str) -> IResult<&str, Vec<Item>> {
    preceded(
        char('{'),
        cut(terminated(many0(preceded(ws, item)), pair(ws, char('}')))),
    )(input)
}

fn list_separator(input: &str) -> IResult<&str, ()> {
    value((), tuple((ws, char(','), ws)))(input)
}

fn name(input: &str) -> IResult<&str, String> {
    alt((map(identifier, String::from), quoted))(input)
}

/// Parse an identifier (alphanumeric + underscore, must start with alpha or _)
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

/// Double-quoted string with `\"`, `\\`, `\n`, `\t` and `\r` escapes.
fn quoted(input: &str) -> IResult<&str, String> {
    let (mut rest, _) = char('"')(input)?;
    let mut out = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            Some('"') => return Ok((chars.as_str(), out)),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(c) => out.push(c),
                None => return Err(nom::Err::Failure(Error::new(rest, ErrorKind::Escaped))),
            },
            Some(c) => out.push(c),
            None => return Err(nom::Err::Failure(Error::new(input, ErrorKind::Char))),
        }
        rest = chars.as_str();
    }
}

/// Whitespace and `//` comments.
fn ws(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, line_comment))))(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), not_line_ending))(input)
}
