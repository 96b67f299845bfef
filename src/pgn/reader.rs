use tracing::{debug, trace};

use super::tags::Tags;
use super::RESULTS;
use crate::error::ParseError;
use crate::position::Position;
use crate::san;
use crate::tree::{Game, NodeId};

/// Comment prefixes of board graphics that are dropped on import.
const DISCARDED_COMMENTS: [&str; 2] = ["[%cal ", "[%csl "];

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Comment(&'a str),
    Open,
    Close,
}

/// Parse the first game in `bytes`.
pub fn read(bytes: &[u8]) -> Result<Game, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    debug!(bytes = bytes.len(), "parsing PGN");

    let (tags, movetext_start) = read_tags(text)?;
    let root_position = match tags.get("FEN") {
        Some(fen) => Position::from_fen(fen)?,
        None => Position::new(),
    };
    let mut game = Game::with_root(root_position, tags);

    let tokens = tokenize(&text[movetext_start..], movetext_start)?;
    build_tree(&mut game, &tokens)?;

    debug!(
        tags = game.tags().len(),
        nodes = game.len(),
        "parsed PGN"
    );
    Ok(game)
}

/// Read the tag section. Returns the tags and the byte offset where the
/// movetext begins.
fn read_tags(text: &str) -> Result<(Tags, usize), ParseError> {
    let mut tags = Tags::new();
    let mut offset = 0;
    for (index, line) in text.split_inclusive('\n').enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            let (key, value) = parse_tag(trimmed).ok_or_else(|| ParseError::BadTag {
                line: index + 1,
                text: trimmed.to_string(),
            })?;
            tags.set(key, value);
        } else if !trimmed.is_empty() {
            break;
        }
        offset += line.len();
    }
    Ok((tags, offset))
}

/// `[Key "Value"]` with `\"` and `\\` escapes inside the value.
fn parse_tag(line: &str) -> Option<(&str, String)> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    let (key, rest) = inner.split_once(char::is_whitespace)?;
    if !super::is_valid_key(key) {
        return None;
    }

    let mut chars = rest.trim_start().strip_prefix('"')?.chars();
    let mut value = String::new();
    loop {
        match chars.next()? {
            '"' => break,
            '\\' => match chars.next()? {
                c @ ('"' | '\\') => value.push(c),
                c => {
                    value.push('\\');
                    value.push(c);
                }
            },
            c => value.push(c),
        }
    }
    if !chars.as_str().trim().is_empty() {
        return None;
    }
    Some((key, value))
}

/// Split movetext into words, comments and parentheses. `base` is the byte
/// offset of `text` within the whole input, for error reporting.
fn tokenize(text: &str, base: usize) -> Result<Vec<Token<'_>>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = text;
    let mut offset = base;

    loop {
        let trimmed = rest.trim_start();
        offset += rest.len() - trimmed.len();
        rest = trimmed;
        let Some(c) = rest.chars().next() else {
            break;
        };

        let consumed = match c {
            '{' => {
                let end = rest
                    .find('}')
                    .ok_or(ParseError::UnterminatedComment { offset })?;
                tokens.push(Token::Comment(&rest[1..end]));
                end + 1
            }
            ';' => {
                let end = rest.find('\n').unwrap_or(rest.len());
                tokens.push(Token::Comment(&rest[1..end]));
                end
            }
            '(' => {
                tokens.push(Token::Open);
                1
            }
            ')' => {
                tokens.push(Token::Close);
                1
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '{' | '(' | ')' | ';'))
                    .unwrap_or(rest.len());
                tokens.push(Token::Word(&rest[..end]));
                end
            }
        };
        rest = &rest[consumed..];
        offset += consumed;
    }
    Ok(tokens)
}

fn build_tree(game: &mut Game, tokens: &[Token<'_>]) -> Result<(), ParseError> {
    let root = game.root();
    let mut current = root;
    let mut last: Option<NodeId> = None;
    let mut stack: Vec<NodeId> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match *token {
            Token::Comment(text) => {
                let text = text.trim();
                if DISCARDED_COMMENTS.iter().any(|p| text.starts_with(p)) {
                    trace!(comment = text, "discarding board graphics comment");
                    continue;
                }
                game.append_comment(last.unwrap_or(root), text);
            }
            Token::Open => {
                let parent = game
                    .parent(current)
                    .ok_or(ParseError::UnbalancedParens { index })?;
                stack.push(current);
                current = parent;
                debug!(depth = stack.len(), "variation opened");
            }
            Token::Close => {
                current = stack.pop().ok_or(ParseError::UnbalancedParens { index })?;
                debug!(depth = stack.len(), "variation closed");
            }
            Token::Word(word) => {
                if RESULTS.contains(&word) {
                    if stack.is_empty() {
                        debug!(result = word, "end of movetext");
                        return Ok(());
                    }
                    continue;
                }
                let Some(san) = strip_move_number(word) else {
                    continue;
                };
                if san.starts_with('$') || san.chars().all(|c| matches!(c, '!' | '?')) {
                    trace!(token = san, "skipping annotation glyph");
                    continue;
                }

                let position = game.node(current).position();
                let mv = san::parse(san, position).map_err(|reason| ParseError::BadMove {
                    token: word.to_string(),
                    index,
                    reason,
                })?;
                current = game.push_child(current, mv);
                last = Some(current);
            }
        }
    }

    if !stack.is_empty() {
        return Err(ParseError::UnbalancedParens {
            index: tokens.len(),
        });
    }
    Ok(())
}

/// Drop a leading move number such as `12.` or `12...`. Returns `None` when
/// nothing but the number (or a lone `...`) is left.
fn strip_move_number(word: &str) -> Option<&str> {
    let digits = word.len() - word.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let after_digits = &word[digits..];
    let rest = after_digits.trim_start_matches('.');
    if rest.len() == after_digits.len() {
        // No dots: a bare number is not a move number
        return Some(word);
    }
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}
