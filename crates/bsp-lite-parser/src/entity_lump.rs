// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity text lump parser using nom combinators
//!
//! Parses `{ "key" "value" ... }` blocks into entities. Source entity I/O
//! values on `On*`/`Out*` keys become connections.

use bsp_lite_model::{Entity, EntityConnection};
use memchr::memchr;
use nom::{
    bytes::complete::take_while,
    character::complete::{char, multispace0},
    multi::many0,
    sequence::delimited,
    IResult, Parser,
};

/// Separator used by newer Source compilers
const ESC: char = '\u{1b}';

// ============================================================================
// Parsing Primitives
// ============================================================================

fn ws(input: &str) -> IResult<&str, ()> {
    let (input, _) = multispace0(input)?;
    Ok((input, ()))
}

/// Parse a double-quoted string (no escapes)
fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c: char| c != '"'), char('"')).parse(input)
}

fn key_value(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = ws(input)?;
    let (input, key) = quoted(input)?;
    let (input, _) = ws(input)?;
    let (input, value) = quoted(input)?;
    Ok((input, (key, value)))
}

/// Parse one `{ ... }` block
fn entity_block(input: &str) -> IResult<&str, Vec<(&str, &str)>> {
    let (input, _) = ws(input)?;
    let (input, _) = char('{')(input)?;
    let (input, pairs) = many0(key_value).parse(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = char('}')(input)?;
    Ok((input, pairs))
}

// ============================================================================
// Public API
// ============================================================================

/// Parse an entity lump
///
/// Malformed blocks are skipped with a warning; parsing resumes at the next
/// `{`. Text after the first NUL byte is ignored.
pub fn parse_entities(data: &[u8]) -> Vec<Entity> {
    let end = memchr(0, data).unwrap_or(data.len());
    let text = String::from_utf8_lossy(&data[..end]);
    let mut input: &str = &text;
    let mut entities = Vec::new();

    loop {
        let (rest, _) = match ws(input) {
            Ok(r) => r,
            Err(_) => break,
        };
        if rest.is_empty() {
            break;
        }
        match entity_block(rest) {
            Ok((remaining, pairs)) => {
                entities.push(build_entity(&pairs));
                input = remaining;
            }
            Err(_) => {
                let offset = text.len() - rest.len();
                log::warn!(
                    "malformed entity block {} at byte {}, skipping",
                    entities.len(),
                    offset
                );
                match memchr(b'{', &rest.as_bytes()[1..]) {
                    Some(next) => input = &rest[next + 1..],
                    None => break,
                }
            }
        }
    }
    entities
}

fn build_entity(pairs: &[(&str, &str)]) -> Entity {
    let mut entity = Entity::new();
    for &(key, value) in pairs {
        let connection = is_output_key(key)
            .then(|| parse_connection(key, value))
            .flatten();
        match connection {
            Some(c) => entity.connections.push(c),
            None => entity.set(key, value),
        }
    }
    entity
}

fn is_output_key(key: &str) -> bool {
    key.starts_with("On") || key.starts_with("Out")
}

/// Parse `target,input,parameter,delay,times` (comma or ESC separated)
pub fn parse_connection(output: &str, value: &str) -> Option<EntityConnection> {
    let separator = if value.contains(ESC) { ESC } else { ',' };
    let mut parts = value.split(separator);
    let target = parts.next()?;
    let input = parts.next()?;
    let parameter = parts.next()?;
    let delay: f64 = lexical_core::parse(parts.next()?.trim().as_bytes()).ok()?;
    let times: i32 = lexical_core::parse(parts.next()?.trim().as_bytes()).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(EntityConnection {
        output: output.to_string(),
        target: target.to_string(),
        input: input.to_string(),
        parameter: parameter.to_string(),
        delay,
        times,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks() {
        let lump = b"{\n\"classname\" \"worldspawn\"\n\"wad\" \"base.wad\"\n}\n{\n\"classname\" \"func_door\"\n\"model\" \"*1\"\n}\n\0";
        let entities = parse_entities(lump);
        assert_eq!(entities.len(), 2);
        assert!(entities[0].is_world());
        assert_eq!(entities[0].get("wad"), Some("base.wad"));
        assert_eq!(entities[1].model_index(), Some(1));
    }

    #[test]
    fn test_connections() {
        let lump = "{ \"classname\" \"func_button\" \"OnPressed\" \"door1,Open,,0.5,-1\" \
                    \"OnPressed\" \"lamp\u{1b}Toggle\u{1b}\u{1b}0\u{1b}1\" \"OnlyOnce\" \"1\" }";
        let entities = parse_entities(lump.as_bytes());
        let button = &entities[0];
        assert_eq!(button.connections.len(), 2);
        assert_eq!(button.connections[0].target, "door1");
        assert_eq!(button.connections[0].delay, 0.5);
        assert_eq!(button.connections[0].times, -1);
        assert_eq!(button.connections[1].input, "Toggle");
        assert_eq!(button.get("OnlyOnce"), Some("1"));
    }

    #[test]
    fn test_connection_rejects_wrong_arity() {
        assert!(parse_connection("OnTrigger", "a,b,c").is_none());
        assert!(parse_connection("OnTrigger", "a,b,c,x,1").is_none());
        assert!(parse_connection("OnTrigger", "a,b,c,0,1,2").is_none());
    }

    #[test]
    fn test_malformed_block_skipped() {
        let lump = b"{ \"classname\" \"light\" \"broken }\n{ \"classname\" \"info_null\" }";
        let entities = parse_entities(lump);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].classname(), "info_null");
    }
}
