//! A JSON grammar built from the combinators of this crate.
//!
//! Values are an open dispatch over `true`, `false`, `null`, numbers, strings, arrays and
//! objects, declared in that order. Numbers are themselves a dispatch, trying integers before
//! floats. Because a dispatch commits to the first variant that succeeds, an input such as `1.5`
//! is taken as the integer `1` and then fails for not being fully consumed. Only number text that
//! the integer variant rejects outright, such as `+1.5` or `-.5`, reaches the float variant.

use std::collections::HashMap;
use std::rc::Rc;

use crate::combinators::{elements, Choice, Sequence, SeparatedList};
use crate::config::Config;
use crate::dispatch::{Dispatch, WeakDispatch};
use crate::parser::{GrammarError, Node, ParseError, ParseResult, Parser, Rule};
use crate::primitives::{Literal, Pattern, RegexMatch};
use crate::state::ParseState;

const WHITESPACE: &str = r"[ \n\r\t]*";
const INTEGER: &str = r"[0-9-]+";
const FLOAT: &str = r"[0-9.eE+-]+";
const CHAR_ESCAPE: &str = r#"\\(["\\/bfnrt])"#;
const CHAR_HEX_PAIR: &str = r"\\u([dD][89abAB][0-9a-fA-F]{2})\\u([dD][c-fC-F][0-9a-fA-F]{2})";
const CHAR_HEX: &str = r"\\u([0-9a-fA-F]{4})";
const CHAR_LITERAL: &str = r#"[^\x00-\x1F"\\]"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Json {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Json>),
    Object(HashMap<String, Json>),
}

fn integer(m: RegexMatch) -> ParseResult<Json> {
    m.text()
        .parse::<i64>()
        .map(Json::Integer)
        .map_err(|_| ParseError)
}

fn float(m: RegexMatch) -> ParseResult<Json> {
    m.text()
        .parse::<f64>()
        .map(Json::Float)
        .map_err(|_| ParseError)
}

fn escape(m: RegexMatch) -> ParseResult<String> {
    let c = match m.get(1).ok_or(ParseError)? {
        "\"" => '"',
        "\\" => '\\',
        "/" => '/',
        "b" => '\u{8}',
        "f" => '\u{c}',
        "n" => '\n',
        "r" => '\r',
        "t" => '\t',
        _ => return Err(ParseError),
    };
    Ok(c.to_string())
}

fn code_unit(m: &RegexMatch, group: usize) -> ParseResult<u32> {
    u32::from_str_radix(m.get(group).ok_or(ParseError)?, 16).map_err(|_| ParseError)
}

/// hex_pair joins a high and a low surrogate escape into one character.
fn hex_pair(m: RegexMatch) -> ParseResult<String> {
    let (high, low) = (code_unit(&m, 1)?, code_unit(&m, 2)?);
    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
    std::char::from_u32(code)
        .map(|c| c.to_string())
        .ok_or(ParseError)
}

/// hex decodes a single `\u` escape. An unpaired surrogate becomes U+FFFD.
fn hex(m: RegexMatch) -> ParseResult<String> {
    let code = code_unit(&m, 1)?;
    Ok(std::char::from_u32(code)
        .unwrap_or(std::char::REPLACEMENT_CHARACTER)
        .to_string())
}

/// JsonString is a quoted string. It reads characters until none matches, then requires the
/// closing quote.
#[derive(Debug, Clone)]
pub struct JsonString {
    quote: Literal,
    chars: Dispatch<String>,
}

impl JsonString {
    pub fn new() -> Result<JsonString, GrammarError> {
        let chars = Dispatch::new();
        chars.declare(Pattern::new(CHAR_ESCAPE)?.apply(escape))?;
        chars.declare(Pattern::new(CHAR_HEX_PAIR)?.apply(hex_pair))?;
        chars.declare(Pattern::new(CHAR_HEX)?.apply(hex))?;
        chars.declare(Pattern::capture(CHAR_LITERAL, 0)?)?;
        Ok(JsonString {
            quote: Literal::new("\""),
            chars,
        })
    }
}

impl Parser for JsonString {
    /// One node per character or escape between the quotes.
    type Match = Vec<Node<String>>;
    type Value = String;

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        let (_, mut end) = self.quote.attempt(st, pos)?;
        let mut chars = vec![];
        loop {
            match self.chars.attempt(st, end) {
                Ok((c, next)) => {
                    chars.push(c);
                    end = next;
                }
                Err(_) => {
                    let (_, end) = self.quote.attempt(st, end)?;
                    return Ok((chars, end));
                }
            }
        }
    }

    fn compute(&self, m: Self::Match) -> ParseResult<Self::Value> {
        Ok(m.into_iter().map(Node::into_value).collect())
    }
}

/// element is a value surrounded by optional whitespace.
fn element(ws: &Pattern, value: &WeakDispatch<Json>) -> impl Parser<Value = Json> {
    Sequence::new((ws.clone(), value.clone(), ws.clone())).apply(|(_, v, _)| Ok(v.into_value()))
}

/// JsonGrammar owns the JSON value dispatcher and parses complete documents.
pub struct JsonGrammar {
    value: Dispatch<Json>,
    element: Rc<dyn Rule<Json>>,
}

impl JsonGrammar {
    pub fn new() -> Result<JsonGrammar, GrammarError> {
        let value = Dispatch::new();
        let ws = Pattern::new(WHITESPACE)?;

        value.declare(Literal::new("true").to(Json::Bool(true)))?;
        value.declare(Literal::new("false").to(Json::Bool(false)))?;
        value.declare(Literal::new("null").to(Json::Null))?;

        let number = Dispatch::new();
        number.declare(Pattern::new(INTEGER)?.apply(integer))?;
        number.declare(Pattern::new(FLOAT)?.apply(float))?;
        value.declare(number)?;

        let string = JsonString::new()?;
        value.declare(
            string
                .clone()
                .apply(|chars| Ok(Json::String(chars.into_iter().map(Node::into_value).collect()))),
        )?;

        let items = SeparatedList::new(element(&ws, &value.downgrade()), Literal::new(","))
            .apply(|items| Ok(elements(items)));
        let array = Sequence::new((
            Literal::new("["),
            Choice::new((items, ws.clone().to(vec![]))),
            Literal::new("]"),
        ))
        .apply(|(_, body, _)| Ok(Json::Array(body.into_value())));
        value.declare(array)?;

        let member = Sequence::new((
            ws.clone(),
            string,
            ws.clone(),
            Literal::new(":"),
            element(&ws, &value.downgrade()),
        ))
        .apply(|(_, key, _, _, v)| Ok((key.into_value(), v.into_value())));
        // Later duplicates overwrite earlier keys.
        let members = SeparatedList::new(member, Literal::new(","))
            .apply(|items| Ok(elements(items).into_iter().collect::<HashMap<_, _>>()));
        let object = Sequence::new((
            Literal::new("{"),
            Choice::new((members, ws.clone().to(HashMap::new()))),
            Literal::new("}"),
        ))
        .apply(|(_, body, _)| Ok(Json::Object(body.into_value())));
        value.declare(object)?;

        let element: Rc<dyn Rule<Json>> = Rc::new(element(&ws, &value.downgrade()));
        Ok(JsonGrammar { value, element })
    }

    /// The value dispatcher. Declaring further variants on it extends the grammar.
    pub fn value(&self) -> &Dispatch<Json> {
        &self.value
    }

    /// parse parses a complete JSON document, which may be surrounded by whitespace.
    pub fn parse(&self, input: &str) -> ParseResult<Json> {
        self.element.parse(input)
    }

    pub fn parse_with(&self, input: &str, config: &Config) -> ParseResult<Json> {
        self.element.parse_with(input, config)
    }

    pub fn parse_state(&self, st: &ParseState) -> ParseResult<Json> {
        self.element.parse_state(st)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::iter;

    fn parsed(s: &str) -> ParseResult<Json> {
        JsonGrammar::new().unwrap().parse(s)
    }

    fn string(s: &str) -> Json {
        Json::String(s.to_string())
    }

    #[test]
    fn test_literals() {
        assert_eq!(Ok(Json::Bool(true)), parsed("true"));
        assert_eq!(Ok(Json::Bool(false)), parsed("false"));
        assert_eq!(Ok(Json::Null), parsed("null"));
        assert_eq!(Err(ParseError), parsed("truffle"));
    }

    #[test]
    fn test_number() {
        assert_eq!(Ok(Json::Integer(2345)), parsed("2345"));
        assert_eq!(Ok(Json::Integer(-49)), parsed("-49"));
        assert_eq!(Ok(Json::Float(23.45e9)), parsed("+23.45e9"));
        assert_eq!(Ok(Json::Float(0.5)), parsed(".5"));
        assert_eq!(Ok(Json::Float(-0.5)), parsed("-.5"));
        for bad in &["23.45.6", "23-7", "e9", "3e4e5", "-"] {
            assert_eq!(Err(ParseError), parsed(bad), "{}", bad);
        }
    }

    #[test]
    fn test_integer_commits_before_float() {
        // The integer variant matches "1" and the dispatch does not come back to try the float.
        assert_eq!(Err(ParseError), parsed("1.5"));
        assert_eq!(Err(ParseError), parsed("[1.5]"));
        assert_eq!(Err(ParseError), parsed("1e5"));
        assert_eq!(Ok(Json::Float(1.5)), parsed("+1.5"));
    }

    #[test]
    fn test_integer_out_of_range_is_float() {
        assert_eq!(Ok(Json::Float(1e20)), parsed("100000000000000000000"));
    }

    #[test]
    fn test_string() {
        assert_eq!(
            Ok(string("1\\2/3\"4\u{8}5\u{c}6\n7\r8\t9")),
            parsed(r#""1\\2\/3\"4\b5\f6\n7\r8\t9""#)
        );
        assert_eq!(Ok(string("alpha\u{1a2b}73")), parsed(r#""alpha\u1a2b73""#));
        assert_eq!(Ok(string("")), parsed(r#""""#));
        assert_eq!(Ok(string("hüð")), parsed("\"hüð\""));
        for bad in &[r#"""#, r#""\""#, r#"'hello'"#, r#""\uqz23""#, "\"a\nb\""] {
            assert_eq!(Err(ParseError), parsed(bad), "{}", bad);
        }
    }

    #[test]
    fn test_surrogate_escape() {
        assert_eq!(Ok(string("\u{1f600}")), parsed(r#""\ud83d\ude00""#));
        assert_eq!(Ok(string("a\u{10ffff}b")), parsed(r#""a\uDBFF\uDFFFb""#));
        assert_eq!(Ok(string("\u{fffd}")), parsed(r#""\ud83d""#));
        assert_eq!(Ok(string("\u{fffd}x")), parsed(r#""\ude00x""#));
        // Two high halves in a row are not a pair.
        assert_eq!(
            Ok(string("\u{fffd}\u{fffd}")),
            parsed(r#""\ud83d\ud83d""#)
        );
    }

    #[test]
    fn test_json_string_payload() {
        let s = JsonString::new().unwrap();
        let st = ParseState::new(r#""a\nb" tail"#);
        let (chars, end) = s.match_at(&st, 0).unwrap();
        assert_eq!(6, end);
        let spans: Vec<_> = chars.iter().map(Node::span).collect();
        assert_eq!(vec![1..2, 2..4, 4..5], spans);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(Ok(Json::Array(vec![])), parsed("[]"));
        assert_eq!(Ok(Json::Array(vec![])), parsed(" [ ] "));
        assert_eq!(Err(ParseError), parsed("["));
        assert_eq!(Err(ParseError), parsed("]"));
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(Ok(Json::Object(HashMap::new())), parsed("{}"));
        assert_eq!(Ok(Json::Object(HashMap::new())), parsed(" { } "));
        assert_eq!(Err(ParseError), parsed("{"));
        assert_eq!(Err(ParseError), parsed("}"));
    }

    #[test]
    fn test_list() {
        assert_eq!(
            Ok(Json::Array(vec![
                Json::Array(vec![Json::Bool(true)]),
                Json::Bool(false)
            ])),
            parsed("[[true], false]")
        );
        assert_eq!(
            Ok(Json::Array(vec![
                Json::Integer(7),
                Json::Array(vec![Json::Null]),
                Json::Integer(-456)
            ])),
            parsed("[7, [null], -456]")
        );
        assert_eq!(Err(ParseError), parsed("[1,]"));
        assert_eq!(Err(ParseError), parsed("[,1]"));
    }

    #[test]
    fn test_object() {
        let mut want = HashMap::new();
        want.insert("hello".to_string(), string("there"));
        assert_eq!(Ok(Json::Object(want)), parsed(r#"{"hello":"there"}"#));

        let mut want = HashMap::new();
        want.insert(
            "stuff".to_string(),
            Json::Array(vec![Json::Array(vec![Json::Integer(7)])]),
        );
        want.insert("foo".to_string(), string("\"bar\""));
        assert_eq!(
            Ok(Json::Object(want)),
            parsed(r#"{"stuff": [[7]], "foo": "\"bar\""}"#)
        );

        for bad in &["{true: 7}", "{:9}", r#"{"foo":}"#, r#"{"a":3,}"#] {
            assert_eq!(Err(ParseError), parsed(bad), "{}", bad);
        }
    }

    #[test]
    fn test_duplicate_keys() {
        let mut want = HashMap::new();
        want.insert("a".to_string(), Json::Integer(2));
        assert_eq!(Ok(Json::Object(want)), parsed(r#"{"a": 1, "a": 2}"#));
    }

    #[test]
    fn test_extend_value() {
        let g = JsonGrammar::new().unwrap();
        assert_eq!(Err(ParseError), g.parse("[NaN]"));
        g.value()
            .declare(Literal::new("NaN").to(Json::Float(std::f64::NAN)))
            .unwrap();
        match g.parse("[NaN, 1]") {
            Ok(Json::Array(v)) => {
                assert_eq!(2, v.len());
                assert!(matches!(v[0], Json::Float(f) if f.is_nan()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_depth_limit() {
        let g = JsonGrammar::new().unwrap();
        let deep = |n: usize| format!("{}{}", "[".repeat(n), "]".repeat(n));
        assert!(g.parse(&deep(40)).is_ok());
        let config = Config::default().max_depth(10);
        assert!(g.parse_with(&deep(9), &config).is_ok());
        assert_eq!(Err(ParseError), g.parse_with(&deep(40), &config));
    }

    #[test]
    fn test_from_reader() {
        let g = JsonGrammar::new().unwrap();
        let st = ParseState::from_reader(&b"{\"k\": [1, \"v\"]}"[..]);
        let mut want = HashMap::new();
        want.insert(
            "k".to_string(),
            Json::Array(vec![Json::Integer(1), string("v")]),
        );
        assert_eq!(Ok(Json::Object(want)), g.parse_state(&st));
    }

    #[test]
    fn bench_value() {
        let repeats = 500;
        let piece = r#"{"hello": 122, "world": [1, +2.5e3, 4, "five"], "test": "key", "lol": "ey"}"#;
        let s = format!(
            "[{}]",
            iter::repeat(piece).take(repeats).collect::<Vec<_>>().join(",")
        );
        let g = JsonGrammar::new().unwrap();
        {
            time_test!();
            match g.parse(&s) {
                Ok(Json::Array(v)) => assert_eq!(repeats, v.len()),
                other => panic!("unexpected {:?}", other.map(|_| ())),
            }
        }
    }
}
