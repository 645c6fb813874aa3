use crate::ast::{
    Argument, AttributeOp, AttributeSelector, Combinator, ElementTest, Filter, NthFormula,
    NthKind, PseudoSelector, Selector, SelectorList, SelectorStep,
};
use crate::path::{
    AttributeTest, Axis, LocationPath, NodeTest, PathQuery, PathStep, PositionTest, Predicate,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    #[error("Unsupported pseudo-class: :{0}")]
    UnsupportedPseudoClass(String),
    #[error("Invalid argument to :{function}(): {reason}")]
    InvalidArgument { function: String, reason: String },
    #[error(":{0} needs an element name, as in p:{0}")]
    OfTypeWithoutElement(String),
    #[error("Empty selector")]
    EmptySelector,
}

pub fn translate(list: &SelectorList) -> Result<PathQuery, TranslationError> {
    let paths = list
        .selectors
        .iter()
        .map(translate_selector)
        .collect::<Result<Vec<_>, _>>()?;
    if paths.is_empty() {
        return Err(TranslationError::EmptySelector);
    }
    Ok(PathQuery { paths })
}

fn translate_selector(selector: &Selector) -> Result<LocationPath, TranslationError> {
    if selector.steps.is_empty() {
        return Err(TranslationError::EmptySelector);
    }
    let steps = selector
        .steps
        .iter()
        .map(translate_step)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LocationPath { steps })
}

fn translate_step(step: &SelectorStep) -> Result<PathStep, TranslationError> {
    let axis = match step.combinator {
        Combinator::Descendant => Axis::Descendant,
        Combinator::Child => Axis::Child,
        Combinator::Adjacent => Axis::NextSibling,
        Combinator::Sibling => Axis::FollowingSibling,
    };
    let test = node_test(&step.compound.element);
    let predicates = translate_filters(&step.compound.filters, &test)?;
    Ok(PathStep {
        axis,
        test,
        predicates,
    })
}

fn node_test(element: &ElementTest) -> NodeTest {
    match element {
        ElementTest::Any => NodeTest::AnyElement,
        ElementTest::Named(name) => NodeTest::Named(name.clone()),
    }
}

/// `step` is the node test of the enclosing step, which of-type tests count
/// siblings by, including inside `:not()`.
fn translate_filters(filters: &[Filter], step: &NodeTest) -> Result<Vec<Predicate>, TranslationError> {
    filters
        .iter()
        .map(|filter| translate_filter(filter, step))
        .collect()
}

fn translate_filter(filter: &Filter, step: &NodeTest) -> Result<Predicate, TranslationError> {
    match filter {
        Filter::Id(id) => Ok(Predicate::Attribute {
            name: "id".to_string(),
            test: AttributeTest::Equals(id.clone()),
        }),
        Filter::Class(class) => Ok(Predicate::Class(class.clone())),
        Filter::Attribute(attribute) => Ok(translate_attribute(attribute)),
        Filter::Pseudo(pseudo) => translate_pseudo(pseudo, step),
    }
}

fn translate_attribute(attribute: &AttributeSelector) -> Predicate {
    let test = match &attribute.matcher {
        None => AttributeTest::Exists,
        Some(matcher) => {
            let value = matcher.value.clone();
            match matcher.op {
                AttributeOp::Equals => AttributeTest::Equals(value),
                AttributeOp::NotEquals => AttributeTest::NotEquals(value),
                AttributeOp::Includes => AttributeTest::Includes(value),
                AttributeOp::Prefix => AttributeTest::Prefix(value),
                AttributeOp::Suffix => AttributeTest::Suffix(value),
                AttributeOp::Substring => AttributeTest::Substring(value),
                AttributeOp::DashMatch => AttributeTest::DashMatch(value),
            }
        }
    };
    Predicate::Attribute {
        name: attribute.name.clone(),
        test,
    }
}

fn translate_pseudo(pseudo: &PseudoSelector, step: &NodeTest) -> Result<Predicate, TranslationError> {
    match pseudo {
        PseudoSelector::Class(name) => translate_pseudo_class(name, step),
        PseudoSelector::Nth { kind, formula } => {
            let (from_end, of_type) = match kind {
                NthKind::Child => (false, false),
                NthKind::LastChild => (true, false),
                NthKind::OfType => (false, true),
                NthKind::LastOfType => (true, true),
            };
            if of_type {
                require_element(kind.name(), step)?;
            }
            Ok(Predicate::Position(PositionTest::Nth {
                formula: *formula,
                from_end,
                of_type,
            }))
        }
        PseudoSelector::Not(compound) => Ok(Predicate::Not {
            test: node_test(&compound.element),
            predicates: translate_filters(&compound.filters, step)?,
        }),
        PseudoSelector::Function { name, args } => translate_function(name, args),
    }
}

fn translate_pseudo_class(name: &str, step: &NodeTest) -> Result<Predicate, TranslationError> {
    let lowered = name.to_ascii_lowercase();
    if lowered.ends_with("-of-type") {
        require_element(&lowered, step)?;
    }
    let predicate = match lowered.as_str() {
        "first-child" => Predicate::Position(PositionTest::FirstChild),
        "last-child" => Predicate::Position(PositionTest::LastChild),
        "only-child" => Predicate::Position(PositionTest::OnlyChild),
        "first" => Predicate::Position(PositionTest::Index(1)),
        "last" => Predicate::Position(PositionTest::Last),
        "first-of-type" => Predicate::Position(nth_of_type(false)),
        "last-of-type" => Predicate::Position(nth_of_type(true)),
        "only-of-type" => Predicate::Position(PositionTest::OnlyOfType),
        "empty" => Predicate::Empty,
        "parent" => Predicate::HasChildren,
        _ => return Err(TranslationError::UnsupportedPseudoClass(name.to_string())),
    };
    Ok(predicate)
}

fn nth_of_type(from_end: bool) -> PositionTest {
    PositionTest::Nth {
        formula: NthFormula { a: 0, b: 1 },
        from_end,
        of_type: true,
    }
}

fn require_element(pseudo: &str, step: &NodeTest) -> Result<(), TranslationError> {
    match step {
        NodeTest::Named(_) => Ok(()),
        NodeTest::AnyElement => Err(TranslationError::OfTypeWithoutElement(pseudo.to_string())),
    }
}

fn translate_function(name: &str, args: &[Argument]) -> Result<Predicate, TranslationError> {
    match name.to_ascii_lowercase().as_str() {
        "contains" => match args {
            [Argument::Str(text)] | [Argument::Ident(text)] => {
                Ok(Predicate::ContainsText(text.clone()))
            }
            _ => Err(invalid(name, "expected a single string")),
        },
        "eq" | "nth" => Ok(Predicate::Position(PositionTest::Index(index_arg(name, args, 1)?))),
        "gt" => Ok(Predicate::Position(PositionTest::GreaterThan(index_arg(name, args, 0)?))),
        "lt" => Ok(Predicate::Position(PositionTest::LessThan(index_arg(name, args, 1)?))),
        _ => Ok(Predicate::Custom {
            name: name.to_string(),
            args: args.to_vec(),
        }),
    }
}

fn index_arg(function: &str, args: &[Argument], min: i64) -> Result<usize, TranslationError> {
    let [arg] = args else {
        return Err(invalid(function, "expected a single integer"));
    };
    match arg.as_integer() {
        Some(n) if n >= min => Ok(n as usize),
        Some(n) => Err(invalid(function, &format!("{} is below {}", n, min))),
        None => Err(invalid(function, "expected an integer")),
    }
}

fn invalid(function: &str, reason: &str) -> TranslationError {
    TranslationError::InvalidArgument {
        function: function.to_string(),
        reason: reason.to_string(),
    }
}
