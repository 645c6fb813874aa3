use serde::{Deserialize, Serialize};

/// Comma-separated list of selectors. Matches are the union of every branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorList {
    pub selectors: Vec<Selector>,
}

/// A single selector: compounds joined by combinators.
///
/// The first step always carries [`Combinator::Descendant`]: it is anchored on
/// any descendant of the scope the query runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub steps: Vec<SelectorStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorStep {
    pub combinator: Combinator,
    pub compound: Compound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    /// Whitespace
    Descendant,
    /// `>`
    Child,
    /// `+`
    Adjacent,
    /// `~`
    Sibling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    pub element: ElementTest,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementTest {
    Any,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Id(String),
    Class(String),
    Attribute(AttributeSelector),
    Pseudo(PseudoSelector),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMatcher {
    pub op: AttributeOp,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeOp {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `~=`, whitespace-separated word
    Includes,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
    /// `|=`, exact value or value followed by `-`
    DashMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PseudoSelector {
    /// Argument-less pseudo-class such as `:first-child`.
    Class(String),
    Nth { kind: NthKind, formula: NthFormula },
    Not(Box<Compound>),
    /// Any other `:name(args)`. Built-ins are recognised by the translator,
    /// everything else is left to a caller-supplied evaluator.
    Function { name: String, args: Vec<Argument> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NthKind {
    Child,
    LastChild,
    OfType,
    LastOfType,
}

impl NthKind {
    pub fn name(self) -> &'static str {
        match self {
            NthKind::Child => "nth-child",
            NthKind::LastChild => "nth-last-child",
            NthKind::OfType => "nth-of-type",
            NthKind::LastOfType => "nth-last-of-type",
        }
    }
}

/// `an+b`, matching every 1-based index `i` for which `i = a*n + b` with `n >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NthFormula {
    pub a: i64,
    pub b: i64,
}

impl NthFormula {
    pub fn matches(&self, index: i64) -> bool {
        // Widened so extreme coefficients cannot overflow.
        let a = i128::from(self.a);
        let diff = i128::from(index) - i128::from(self.b);
        if a == 0 {
            return diff == 0;
        }
        diff % a == 0 && diff / a >= 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Str(String),
    Number(f64),
    Ident(String),
}

impl Argument {
    /// Textual value, with numbers in their shortest form.
    pub fn as_text(&self) -> String {
        match self {
            Argument::Str(s) | Argument::Ident(s) => s.clone(),
            Argument::Number(n) => n.to_string(),
        }
    }

    /// Integral value of a numeric argument.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Argument::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_formula() {
        let odd = NthFormula { a: 2, b: 1 };
        assert!(odd.matches(1));
        assert!(!odd.matches(2));
        assert!(odd.matches(3));

        let first_three = NthFormula { a: -1, b: 3 };
        assert!(first_three.matches(1));
        assert!(first_three.matches(3));
        assert!(!first_three.matches(4));

        let exact = NthFormula { a: 0, b: 2 };
        assert!(exact.matches(2));
        assert!(!exact.matches(4));
    }

    #[test]
    fn test_nth_formula_extremes() {
        assert!(!NthFormula { a: 0, b: i64::MIN }.matches(1));
        assert!(!NthFormula { a: i64::MIN, b: i64::MAX }.matches(1));
        assert!(NthFormula { a: i64::MAX, b: 1 }.matches(1));
        assert!(!NthFormula { a: -1, b: i64::MIN }.matches(i64::MAX));
    }

    #[test]
    fn test_argument_integer() {
        assert_eq!(Argument::Number(3.0).as_integer(), Some(3));
        assert_eq!(Argument::Number(1.5).as_integer(), None);
        assert_eq!(Argument::Str("3".into()).as_integer(), None);
    }
}
