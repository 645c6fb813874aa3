use super::ast::*;
use pest::error::{InputLocation, LineColLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "selector.pest"]
pub struct SelectorParser;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("syntax error at offset {position} (line {line}, column {column}): {message}")]
    Syntax {
        /// Byte offset of the first token that could not be parsed.
        position: usize,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("Unknown rule: {0:?}")]
    UnknownRule(Rule),
    #[error("invalid integer {text:?} at offset {position}")]
    InvalidInteger { text: String, position: usize },
}

impl ParseError {
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseError::Syntax { position, .. } | ParseError::InvalidInteger { position, .. } => {
                Some(*position)
            }
            ParseError::UnknownRule(_) => None,
        }
    }
}

pub fn parse(input: &str) -> Result<SelectorList, ParseError> {
    let mut pairs = SelectorParser::parse(Rule::selector_list, input)
        .map_err(|e| syntax_error(input, e))?;
    let mut list = SelectorList {
        selectors: Vec::new(),
    };

    if let Some(pair) = pairs.next() {
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::selector => list.selectors.push(parse_selector(inner)?),
                Rule::EOI => {}
                rule => return Err(ParseError::UnknownRule(rule)),
            }
        }
    }

    Ok(list)
}

fn syntax_error(input: &str, err: pest::error::Error<Rule>) -> ParseError {
    let position = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let (line, column) = match err.line_col {
        LineColLocation::Pos(lc) => lc,
        LineColLocation::Span(lc, _) => lc,
    };
    let found = match input.get(position..).and_then(|rest| rest.chars().next()) {
        Some(c) => format!("found {:?}", c),
        None => "found end of input".to_string(),
    };
    ParseError::Syntax {
        position,
        line,
        column,
        message: format!("{}, {}", err.variant.message(), found),
    }
}

fn parse_selector(pair: Pair<Rule>) -> Result<Selector, ParseError> {
    let mut steps = Vec::new();
    let mut combinator = Combinator::Descendant;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::combinator => combinator = parse_combinator(inner)?,
            Rule::compound => steps.push(SelectorStep {
                combinator,
                compound: parse_compound(inner)?,
            }),
            rule => return Err(ParseError::UnknownRule(rule)),
        }
    }

    Ok(Selector { steps })
}

fn parse_combinator(pair: Pair<Rule>) -> Result<Combinator, ParseError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::child => Ok(Combinator::Child),
        Rule::adjacent => Ok(Combinator::Adjacent),
        Rule::sibling => Ok(Combinator::Sibling),
        Rule::descendant => Ok(Combinator::Descendant),
        rule => Err(ParseError::UnknownRule(rule)),
    }
}

fn parse_compound(pair: Pair<Rule>) -> Result<Compound, ParseError> {
    let mut compound = Compound {
        element: ElementTest::Any,
        filters: Vec::new(),
    };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::element => compound.element = parse_element(inner)?,
            Rule::id => compound.filters.push(Filter::Id(inner_text(inner)?)),
            Rule::class => compound.filters.push(Filter::Class(inner_text(inner)?)),
            Rule::attribute => compound
                .filters
                .push(Filter::Attribute(parse_attribute(inner)?)),
            Rule::pseudo => compound.filters.push(Filter::Pseudo(parse_pseudo(inner)?)),
            rule => return Err(ParseError::UnknownRule(rule)),
        }
    }

    Ok(compound)
}

fn parse_element(pair: Pair<Rule>) -> Result<ElementTest, ParseError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::universal => Ok(ElementTest::Any),
        Rule::type_name => Ok(ElementTest::Named(inner.as_str().to_string())),
        rule => Err(ParseError::UnknownRule(rule)),
    }
}

fn parse_attribute(pair: Pair<Rule>) -> Result<AttributeSelector, ParseError> {
    let mut name = String::new();
    let mut op = None;
    let mut value = None;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::attr_name => name = inner.as_str().to_string(),
            Rule::attr_op => op = Some(parse_attr_op(inner)?),
            Rule::single_quoted | Rule::double_quoted | Rule::bare_value => {
                value = Some(inner.as_str().to_string())
            }
            rule => return Err(ParseError::UnknownRule(rule)),
        }
    }

    let matcher = match (op, value) {
        (Some(op), Some(value)) => Some(AttributeMatcher { op, value }),
        _ => None,
    };
    Ok(AttributeSelector { name, matcher })
}

fn parse_attr_op(pair: Pair<Rule>) -> Result<AttributeOp, ParseError> {
    match pair.as_str() {
        "=" => Ok(AttributeOp::Equals),
        "!=" => Ok(AttributeOp::NotEquals),
        "~=" => Ok(AttributeOp::Includes),
        "^=" => Ok(AttributeOp::Prefix),
        "$=" => Ok(AttributeOp::Suffix),
        "*=" => Ok(AttributeOp::Substring),
        "|=" => Ok(AttributeOp::DashMatch),
        _ => Err(ParseError::UnknownRule(pair.as_rule())),
    }
}

// --- Pseudo selectors ---

fn parse_pseudo(pair: Pair<Rule>) -> Result<PseudoSelector, ParseError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::negation => {
            let compound = parse_compound(first_inner(inner)?)?;
            Ok(PseudoSelector::Not(Box::new(compound)))
        }
        Rule::nth => parse_nth(inner),
        Rule::function => parse_function(inner),
        Rule::pseudo_class => Ok(PseudoSelector::Class(inner.as_str().to_string())),
        rule => Err(ParseError::UnknownRule(rule)),
    }
}

fn parse_nth(pair: Pair<Rule>) -> Result<PseudoSelector, ParseError> {
    let mut kind = NthKind::Child;
    let mut formula = NthFormula { a: 0, b: 0 };

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::nth_name => {
                kind = match inner.as_str() {
                    "nth-last-child" => NthKind::LastChild,
                    "nth-of-type" => NthKind::OfType,
                    "nth-last-of-type" => NthKind::LastOfType,
                    _ => NthKind::Child,
                }
            }
            Rule::nth_expr => formula = parse_nth_expr(inner)?,
            rule => return Err(ParseError::UnknownRule(rule)),
        }
    }

    Ok(PseudoSelector::Nth { kind, formula })
}

fn parse_nth_expr(pair: Pair<Rule>) -> Result<NthFormula, ParseError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::odd => Ok(NthFormula { a: 2, b: 1 }),
        Rule::even => Ok(NthFormula { a: 2, b: 0 }),
        Rule::an_plus_b => parse_an_plus_b(inner),
        rule => Err(ParseError::UnknownRule(rule)),
    }
}

fn parse_an_plus_b(pair: Pair<Rule>) -> Result<NthFormula, ParseError> {
    let mut formula = NthFormula { a: 0, b: 0 };
    let mut negative = false;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::a_n => formula.a = parse_coefficient(inner)?,
            Rule::sign => negative = inner.as_str() == "-",
            Rule::integer => {
                let value = parse_integer(&inner)?;
                formula.b = if negative { -value } else { value };
            }
            Rule::signed_integer => formula.b = parse_integer(&inner)?,
            rule => return Err(ParseError::UnknownRule(rule)),
        }
    }

    Ok(formula)
}

fn parse_coefficient(pair: Pair<Rule>) -> Result<i64, ParseError> {
    let mut negative = false;
    let mut value = 1;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::sign => negative = inner.as_str() == "-",
            Rule::integer => value = parse_integer(&inner)?,
            rule => return Err(ParseError::UnknownRule(rule)),
        }
    }

    Ok(if negative { -value } else { value })
}

fn parse_function(pair: Pair<Rule>) -> Result<PseudoSelector, ParseError> {
    let mut name = String::new();
    let mut args = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::argument => args.push(parse_argument(inner)?),
            rule => return Err(ParseError::UnknownRule(rule)),
        }
    }

    Ok(PseudoSelector::Function { name, args })
}

fn parse_argument(pair: Pair<Rule>) -> Result<Argument, ParseError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::single_quoted | Rule::double_quoted => Ok(Argument::Str(inner.as_str().to_string())),
        Rule::number => inner
            .as_str()
            .parse::<f64>()
            .map(Argument::Number)
            .map_err(|_| invalid_integer(&inner)),
        Rule::ident => Ok(Argument::Ident(inner.as_str().to_string())),
        rule => Err(ParseError::UnknownRule(rule)),
    }
}

// --- Helpers ---

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, ParseError> {
    let rule = pair.as_rule();
    pair.into_inner().next().ok_or(ParseError::UnknownRule(rule))
}

fn inner_text(pair: Pair<Rule>) -> Result<String, ParseError> {
    Ok(first_inner(pair)?.as_str().to_string())
}

fn parse_integer(pair: &Pair<Rule>) -> Result<i64, ParseError> {
    pair.as_str()
        .parse::<i64>()
        .map_err(|_| invalid_integer(pair))
}

fn invalid_integer(pair: &Pair<Rule>) -> ParseError {
    ParseError::InvalidInteger {
        text: pair.as_str().to_string(),
        position: pair.as_span().start(),
    }
}
