//! Typed path queries.
//!
//! A [`PathQuery`] is the compiled form of a selector. It is evaluated directly
//! by tree walkers and renders to an equivalent XPath 1.0 expression for
//! external engines.

use crate::ast::{Argument, NthFormula};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Prefix of the first step when rendering a document-wide query.
pub const DEFAULT_PREFIX: &str = "//";

/// Prefix of the first step when rendering a query relative to a context node.
pub const RELATIVE_PREFIX: &str = ".//";

/// Namespace prefix used for caller-evaluated functions in rendered XPath.
pub const CUSTOM_FUNCTION_NAMESPACE: &str = "csspath";

/// Union of location paths (`a | b`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathQuery {
    pub paths: Vec<LocationPath>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPath {
    pub steps: Vec<PathStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    pub axis: Axis,
    pub test: NodeTest,
    /// Applied in order; each predicate sees the survivors of the previous one.
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// `/name`
    Child,
    /// `//name`: children of the context node or of any of its descendants.
    Descendant,
    /// `/following-sibling::name`
    FollowingSibling,
    /// `/following-sibling::*[1]/self::name`
    NextSibling,
}

impl Axis {
    fn separator(&self) -> &'static str {
        match self {
            Axis::Child => "/",
            Axis::Descendant => "//",
            Axis::FollowingSibling => "/following-sibling::",
            Axis::NextSibling => "/following-sibling::*[1]/self::",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeTest {
    AnyElement,
    Named(String),
}

impl NodeTest {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NodeTest::AnyElement => true,
            NodeTest::Named(expected) => expected == name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Attribute { name: String, test: AttributeTest },
    /// Whitespace-separated word of `@class`.
    Class(String),
    Position(PositionTest),
    /// No child nodes at all, text included.
    Empty,
    HasChildren,
    /// String value of the node contains the text.
    ContainsText(String),
    Not {
        test: NodeTest,
        predicates: Vec<Predicate>,
    },
    /// Deferred to a caller-supplied evaluator.
    Custom { name: String, args: Vec<Argument> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeTest {
    Exists,
    Equals(String),
    NotEquals(String),
    Includes(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
    DashMatch(String),
}

impl AttributeTest {
    /// Test an attribute value; `None` means the attribute is absent.
    pub fn matches(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return false;
        };
        match self {
            AttributeTest::Exists => true,
            AttributeTest::Equals(v) => value == v,
            AttributeTest::NotEquals(v) => value != v,
            AttributeTest::Includes(v) => value.split_whitespace().any(|word| word == v),
            AttributeTest::Prefix(v) => value.starts_with(v.as_str()),
            AttributeTest::Suffix(v) => value.ends_with(v.as_str()),
            AttributeTest::Substring(v) => value.contains(v.as_str()),
            AttributeTest::DashMatch(v) => {
                value == v
                    || value
                        .strip_prefix(v.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }
        }
    }
}

/// Position tests. `position()` and `last()` are relative to the candidate
/// group a step produces for one context node. Sibling counts are relative to
/// all element siblings, or for the of-type tests to the siblings sharing the
/// element's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionTest {
    FirstChild,
    LastChild,
    OnlyChild,
    /// `position() = n`
    Index(usize),
    /// `position() = last()`
    Last,
    /// No sibling with the same name on either side.
    OnlyOfType,
    GreaterThan(usize),
    LessThan(usize),
    /// `:nth-child` family; `:first-of-type` is `nth-of-type(1)`.
    Nth {
        formula: NthFormula,
        from_end: bool,
        of_type: bool,
    },
}

impl PathQuery {
    pub fn to_xpath(&self) -> String {
        self.to_xpath_with_prefix(DEFAULT_PREFIX)
    }

    pub fn to_xpath_with_prefix(&self, prefix: &str) -> String {
        self.paths
            .iter()
            .map(|path| path.to_xpath_with_prefix(prefix))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xpath())
    }
}

impl LocationPath {
    pub fn to_xpath_with_prefix(&self, prefix: &str) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            match (i, step.axis) {
                (0, Axis::Descendant) => out.push_str(prefix),
                (0, axis) => {
                    out.push('.');
                    out.push_str(axis.separator());
                }
                (_, axis) => out.push_str(axis.separator()),
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{}", step);
        }
        out
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.test)?;
        let element = match &self.test {
            NodeTest::AnyElement => "*",
            NodeTest::Named(name) => name.as_str(),
        };
        for predicate in &self.predicates {
            write!(f, "[{}]", Scoped(predicate, element))?;
        }
        Ok(())
    }
}

/// A predicate rendered inside a step whose elements are named `.1`.
struct Scoped<'a>(&'a Predicate, &'a str);

impl fmt::Display for Scoped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_xpath(f, self.1)
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::AnyElement => f.write_str("*"),
            NodeTest::Named(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_xpath(f, "*")
    }
}

impl Predicate {
    /// `element` names the siblings counted by of-type tests.
    fn write_xpath(&self, f: &mut fmt::Formatter<'_>, element: &str) -> fmt::Result {
        match self {
            Predicate::Attribute { name, test } => write_attribute_test(f, name, test),
            Predicate::Class(class) => write!(
                f,
                "contains(concat(' ', normalize-space(@class), ' '), {})",
                literal(&format!(" {} ", class))
            ),
            Predicate::Position(position) => position.write_xpath(f, element),
            Predicate::Empty => f.write_str("not(node())"),
            Predicate::HasChildren => f.write_str("node()"),
            Predicate::ContainsText(text) => write!(f, "contains(., {})", literal(text)),
            Predicate::Not { test, predicates } => {
                let mut terms = Vec::new();
                if let NodeTest::Named(name) = test {
                    terms.push(format!("self::{}", name));
                }
                terms.extend(predicates.iter().map(|p| Scoped(p, element).to_string()));
                if terms.is_empty() {
                    terms.push("self::*".to_string());
                }
                write!(f, "not({})", terms.join(" and "))
            }
            Predicate::Custom { name, args } => {
                write!(f, "{}:{}(.", CUSTOM_FUNCTION_NAMESPACE, name)?;
                for arg in args {
                    match arg {
                        Argument::Number(n) => write!(f, ", {}", n)?,
                        other => write!(f, ", {}", literal(&other.as_text()))?,
                    }
                }
                f.write_str(")")
            }
        }
    }
}

fn write_attribute_test(f: &mut fmt::Formatter<'_>, name: &str, test: &AttributeTest) -> fmt::Result {
    match test {
        AttributeTest::Exists => write!(f, "@{}", name),
        AttributeTest::Equals(v) => write!(f, "@{} = {}", name, literal(v)),
        AttributeTest::NotEquals(v) => write!(f, "@{} != {}", name, literal(v)),
        AttributeTest::Includes(v) => write!(
            f,
            "contains(concat(' ', normalize-space(@{}), ' '), {})",
            name,
            literal(&format!(" {} ", v))
        ),
        AttributeTest::Prefix(v) => write!(f, "starts-with(@{}, {})", name, literal(v)),
        AttributeTest::Suffix(v) => write!(
            f,
            "substring(@{name}, string-length(@{name}) - string-length({v}) + 1) = {v}",
            name = name,
            v = literal(v)
        ),
        AttributeTest::Substring(v) => write!(f, "contains(@{}, {})", name, literal(v)),
        AttributeTest::DashMatch(v) => write!(
            f,
            "(@{name} = {v} or starts-with(@{name}, {dash}))",
            name = name,
            v = literal(v),
            dash = literal(&format!("{}-", v))
        ),
    }
}

impl fmt::Display for PositionTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_xpath(f, "*")
    }
}

impl PositionTest {
    fn write_xpath(&self, f: &mut fmt::Formatter<'_>, element: &str) -> fmt::Result {
        match self {
            PositionTest::FirstChild => f.write_str("count(preceding-sibling::*) = 0"),
            PositionTest::LastChild => f.write_str("count(following-sibling::*) = 0"),
            PositionTest::OnlyChild => f.write_str(
                "count(preceding-sibling::*) = 0 and count(following-sibling::*) = 0",
            ),
            PositionTest::Index(n) => write!(f, "position() = {}", n),
            PositionTest::Last => f.write_str("position() = last()"),
            PositionTest::OnlyOfType => write!(
                f,
                "count(preceding-sibling::{e}) = 0 and count(following-sibling::{e}) = 0",
                e = element
            ),
            PositionTest::GreaterThan(n) => write!(f, "position() > {}", n),
            PositionTest::LessThan(n) => write!(f, "position() < {}", n),
            PositionTest::Nth {
                formula,
                from_end,
                of_type,
            } => {
                let siblings = if *of_type { element } else { "*" };
                let axis = if *from_end { "following" } else { "preceding" };
                let index = format!("(count({}-sibling::{}) + 1)", axis, siblings);
                write_nth(f, &index, formula)
            }
        }
    }
}

fn write_nth(f: &mut fmt::Formatter<'_>, index: &str, formula: &NthFormula) -> fmt::Result {
    let NthFormula { a, b } = *formula;
    match a {
        0 => write!(f, "{} = {}", index, b),
        a if a > 0 => write!(f, "{index} >= {b} and ({index} - {b}) mod {a} = 0"),
        a => write!(
            f,
            "{index} <= {b} and ({b} - {index}) mod {m} = 0",
            m = a.unsigned_abs()
        ),
    }
}

/// Quote a string as an XPath literal.
pub fn literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_quoting() {
        assert_eq!(literal("red"), "'red'");
        assert_eq!(literal("it's"), "\"it's\"");
        assert_eq!(literal(r#"say "it's""#), r#"concat('say "it', "'", 's"')"#);
    }

    #[test]
    fn test_attribute_tests() {
        assert!(AttributeTest::Includes("red".into()).matches(Some("awesome red")));
        assert!(!AttributeTest::Includes("red".into()).matches(Some("notred")));
        assert!(AttributeTest::DashMatch("en".into()).matches(Some("en-US")));
        assert!(!AttributeTest::DashMatch("en".into()).matches(Some("english")));
        assert!(!AttributeTest::NotEquals("x".into()).matches(None));
        assert!(AttributeTest::Exists.matches(Some("")));
    }

    #[test]
    fn test_relative_prefix() {
        let query = PathQuery {
            paths: vec![LocationPath {
                steps: vec![PathStep {
                    axis: Axis::Descendant,
                    test: NodeTest::Named("p".into()),
                    predicates: vec![],
                }],
            }],
        };
        assert_eq!(query.to_xpath(), "//p");
        assert_eq!(query.to_xpath_with_prefix(RELATIVE_PREFIX), ".//p");
    }
}
