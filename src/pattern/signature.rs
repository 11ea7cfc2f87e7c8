//! Qualified method signature patterns
//!
//! `org.apache.camel.CamelContext stopRoute(java.lang.String)` matches calls
//! of `stopRoute` whose receiver is declared as `CamelContext` (or a type it
//! was relocated from/to) and whose single argument is declared `String`.
//! `*` stands for any one argument and a trailing `..` for any remaining
//! arguments.

use super::{Bindings, MatchOutcome, PatternError, TypeAliases};
use crate::tree::Invocation;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

static SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s+([A-Za-z_$][\w$]*)\s*\((.*)\)\s*$")
        .expect("valid signature regex")
});

/// Expected argument in a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamPattern {
    /// Argument declared with exactly this type
    Type(String),
    /// Any single argument
    Any,
    /// Any number of remaining arguments
    Rest,
}

impl fmt::Display for ParamPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamPattern::Type(t) => write!(f, "{}", t),
            ParamPattern::Any => write!(f, "*"),
            ParamPattern::Rest => write!(f, ".."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodPattern {
    pub owner: String,
    pub name: String,
    pub params: Vec<ParamPattern>,
    /// Argument index to the fully-qualified constant it must refer to
    pub constants: BTreeMap<usize, String>,
}

impl MethodPattern {
    /// Require argument `index` to be a reference to `constant`
    pub fn with_constant(mut self, index: usize, constant: &str) -> Self {
        self.constants.insert(index, constant.to_string());
        self
    }

    pub fn accepts_arity(&self, count: usize) -> bool {
        match self.params.last() {
            Some(ParamPattern::Rest) => count + 1 >= self.params.len(),
            _ => count == self.params.len(),
        }
    }

    /// Match an invocation, consulting declared types.
    ///
    /// Name and arity are checked first and never report ambiguity; after
    /// that, any type the resolver could not determine makes the outcome
    /// ambiguous rather than a guess.
    pub fn matches(&self, call: &Invocation, aliases: &TypeAliases) -> MatchOutcome {
        if call.name.text() != self.name || !self.accepts_arity(call.args.items.len()) {
            return MatchOutcome::NoMatch;
        }
        let Some(receiver) = call.receiver() else {
            return MatchOutcome::Ambiguous(format!(
                "receiver of `{}` is implicit",
                self.name
            ));
        };
        let Some(owner) = receiver.declared_type().or_else(|| receiver.symbol()) else {
            return MatchOutcome::Ambiguous(format!(
                "type of `{}` is unknown",
                receiver.text()
            ));
        };
        if !aliases.equivalent(owner, &self.owner) {
            return MatchOutcome::NoMatch;
        }

        for (param, arg) in self.params.iter().zip(&call.args.items) {
            match param {
                ParamPattern::Rest => break,
                ParamPattern::Any => {}
                ParamPattern::Type(expected) => match arg.declared_type() {
                    Some(actual) if aliases.equivalent(actual, expected) => {}
                    Some(_) => return MatchOutcome::NoMatch,
                    None => {
                        return MatchOutcome::Ambiguous(format!(
                            "type of argument `{}` is unknown",
                            arg.text()
                        ))
                    }
                },
            }
        }

        for (index, constant) in &self.constants {
            let refers = call.args.items.get(*index).and_then(|arg| arg.symbol());
            match refers {
                Some(symbol) if aliases.equivalent_member(symbol, constant) => {}
                _ => return MatchOutcome::NoMatch,
            }
        }

        MatchOutcome::Matched(Bindings {
            receiver: Some(Arc::clone(receiver)),
            args: call.args.items.clone(),
            matched_type: Some(owner.to_string()),
        })
    }
}

impl FromStr for MethodPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = SIGNATURE
            .captures(s)
            .ok_or_else(|| PatternError::InvalidSignature(s.to_string()))?;
        let params_text = caps[3].trim();
        let mut params = Vec::new();
        if !params_text.is_empty() {
            for part in params_text.split(',') {
                let part = part.trim();
                let param = match part {
                    "*" => ParamPattern::Any,
                    ".." => ParamPattern::Rest,
                    "" => return Err(PatternError::InvalidSignature(s.to_string())),
                    t => ParamPattern::Type(t.to_string()),
                };
                params.push(param);
            }
        }
        let rest_before_end = params
            .iter()
            .rev()
            .skip(1)
            .any(|p| *p == ParamPattern::Rest);
        if rest_before_end {
            return Err(PatternError::InvalidSignature(format!(
                "{} (`..` must be the last parameter)",
                s
            )));
        }
        Ok(Self {
            owner: caps[1].to_string(),
            name: caps[2].to_string(),
            params,
            constants: BTreeMap::new(),
        })
    }
}

impl fmt::Display for MethodPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        write!(f, "{} {}({})", self.owner, self.name, params.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::{JavaLanguage, Language};
    use crate::tree::Node;

    fn outcome(pattern: &str, source: &str, aliases: &TypeAliases) -> MatchOutcome {
        let tree = JavaLanguage::new().parse(source).unwrap();
        let pattern: MethodPattern = pattern.parse().unwrap();
        let calls = tree.find_all(|n| matches!(n, Node::Invocation(_)));
        let Node::Invocation(call) = calls.last().unwrap().as_ref() else {
            unreachable!()
        };
        pattern.matches(call, aliases)
    }

    const HEADER: &str = "import org.apache.camel.spi.Registry;\nimport java.util.Map;\n";

    #[test]
    fn test_parse() {
        let p: MethodPattern = "org.apache.camel.spi.Registry put(java.lang.String, *)"
            .parse()
            .unwrap();
        assert_eq!(p.owner, "org.apache.camel.spi.Registry");
        assert_eq!(p.name, "put");
        assert_eq!(
            p.params,
            vec![ParamPattern::Type("java.lang.String".into()), ParamPattern::Any]
        );
        assert_eq!(p.to_string(), "org.apache.camel.spi.Registry put(java.lang.String, *)");

        assert!("put(String)".parse::<MethodPattern>().is_err());
        assert!("a.B put(.., String)".parse::<MethodPattern>().is_err());
        assert!("a.B put(String,)".parse::<MethodPattern>().is_err());
    }

    #[test]
    fn test_type_gated_match() {
        let aliases = TypeAliases::new();
        let source = format!(
            "{}class A {{ void f(Registry registry, Map map) {{ registry.put(\"k\", this); }} }}",
            HEADER
        );
        let pattern = "org.apache.camel.spi.Registry put(java.lang.String, *)";
        assert!(outcome(pattern, &source, &aliases).is_match());

        let source = format!(
            "{}class A {{ void f(Registry registry, Map map) {{ map.put(\"k\", this); }} }}",
            HEADER
        );
        assert_eq!(outcome(pattern, &source, &aliases), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_unknown_types_fail_closed() {
        let aliases = TypeAliases::new();
        let pattern = "org.apache.camel.spi.Registry put(*, *)";
        let source = "class A { void f() { registry.put(\"k\", v); } }";
        assert!(matches!(
            outcome(pattern, source, &aliases),
            MatchOutcome::Ambiguous(_)
        ));

        let source = "class A { void f() { put(\"k\", v); } }";
        assert!(matches!(
            outcome(pattern, source, &aliases),
            MatchOutcome::Ambiguous(_)
        ));

        let typed = format!(
            "{}class A {{ void f(Registry r) {{ r.put(key, v); }} }}",
            HEADER
        );
        assert!(matches!(
            outcome("org.apache.camel.spi.Registry put(java.lang.String, *)", &typed, &aliases),
            MatchOutcome::Ambiguous(_)
        ));
    }

    #[test]
    fn test_arity_and_rest() {
        let aliases = TypeAliases::new();
        let source = format!("{}class A {{ void f(Registry r) {{ r.put(1, 2, 3); }} }}", HEADER);
        assert!(outcome("org.apache.camel.spi.Registry put(..)", &source, &aliases).is_match());
        assert!(outcome("org.apache.camel.spi.Registry put(*, ..)", &source, &aliases).is_match());
        assert_eq!(
            outcome("org.apache.camel.spi.Registry put(*, *)", &source, &aliases),
            MatchOutcome::NoMatch
        );
    }

    #[test]
    fn test_relocated_owner_matches_through_aliases() {
        let mut aliases = TypeAliases::new();
        aliases.add_package("org.apache.camel.impl", "org.apache.camel.support");
        let source = "import org.apache.camel.support.DefaultComponent;\nclass A { void f(DefaultComponent c) { c.setCamelContext(ctx); } }";
        assert!(outcome(
            "org.apache.camel.impl.DefaultComponent setCamelContext(*)",
            source,
            &aliases
        )
        .is_match());
    }

    #[test]
    fn test_constant_argument_by_symbol() {
        let aliases = TypeAliases::new();
        let pattern: MethodPattern = "org.apache.camel.Exchange setProperty(*, *)".parse().unwrap();
        let pattern = pattern.with_constant(0, "org.apache.camel.Exchange.ROUTE_STOP");
        let source = "import org.apache.camel.Exchange;\nclass A { void f(Exchange e) { e.setProperty(Exchange.ROUTE_STOP, true); e.setProperty(\"Exchange.ROUTE_STOP\", true); } }";
        let tree = JavaLanguage::new().parse(source).unwrap();
        let calls = tree.find_all(|n| matches!(n, Node::Invocation(_)));
        let results: Vec<bool> = calls
            .iter()
            .map(|c| match c.as_ref() {
                Node::Invocation(call) => pattern.matches(call, &aliases).is_match(),
                _ => false,
            })
            .collect();
        assert_eq!(results, vec![true, false]);
    }
}
