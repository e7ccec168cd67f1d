//! Declarative element queries handed to a [`UiDriver`](super::ports::UiDriver).
//!
//! A locator is a chain of steps evaluated left to right against the document: `Find`
//! descends into every current match, the other steps narrow the current set.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Button,
    Heading,
    Link,
    Checkbox,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatch {
    Exists,
    Equals(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Tag(String),
    Class(String),
    Attribute { name: String, matcher: AttrMatch },
    /// Element whose own text contains (or, when `exact`, equals) the given text.
    Text { text: String, exact: bool },
    /// Element with the role whose full trimmed text equals `name`, when given.
    Role { role: Role, name: Option<String> },
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Selector::Tag(tag.to_string())
    }

    pub fn class(class: &str) -> Self {
        Selector::Class(class.to_string())
    }

    pub fn attr_equals(name: &str, value: &str) -> Self {
        Selector::Attribute {
            name: name.to_string(),
            matcher: AttrMatch::Equals(value.to_string()),
        }
    }

    pub fn attr_contains(name: &str, value: &str) -> Self {
        Selector::Attribute {
            name: name.to_string(),
            matcher: AttrMatch::Contains(value.to_string()),
        }
    }

    pub fn text(text: &str) -> Self {
        Selector::Text {
            text: text.to_string(),
            exact: false,
        }
    }

    pub fn exact_text(text: &str) -> Self {
        Selector::Text {
            text: text.to_string(),
            exact: true,
        }
    }

    pub fn role(role: Role) -> Self {
        Selector::Role { role, name: None }
    }

    pub fn button(name: &str) -> Self {
        Selector::Role {
            role: Role::Button,
            name: Some(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Find(Selector),
    /// Keep matches whose full text contains the value.
    HasText(String),
    /// Keep matches whose full trimmed text equals the value.
    TextIs(String),
    /// Keep matches inside which the relative locator finds at least one element.
    Has(Locator),
    Nth(usize),
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    /// The document itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(selector: Selector) -> Self {
        Self::root().find(selector)
    }

    pub fn find(mut self, selector: Selector) -> Self {
        self.steps.push(Step::Find(selector));
        self
    }

    pub fn has_text(mut self, text: &str) -> Self {
        self.steps.push(Step::HasText(text.to_string()));
        self
    }

    pub fn text_is(mut self, text: &str) -> Self {
        self.steps.push(Step::TextIs(text.to_string()));
        self
    }

    pub fn has(mut self, inner: Locator) -> Self {
        self.steps.push(Step::Has(inner));
        self
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.steps.push(Step::Nth(index));
        self
    }

    pub fn first(mut self) -> Self {
        self.steps.push(Step::First);
        self
    }

    pub fn last(mut self) -> Self {
        self.steps.push(Step::Last);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("document");
        }
        let parts: Vec<String> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Find(Selector::Tag(t)) => t.clone(),
                Step::Find(Selector::Class(c)) => format!(".{}", c),
                Step::Find(Selector::Attribute { name, matcher }) => match matcher {
                    AttrMatch::Exists => format!("[{}]", name),
                    AttrMatch::Equals(v) => format!("[{}=\"{}\"]", name, v),
                    AttrMatch::Contains(v) => format!("[{}*=\"{}\"]", name, v),
                },
                Step::Find(Selector::Text { text, exact: true }) => format!("text=\"{}\"", text),
                Step::Find(Selector::Text { text, .. }) => format!("text={}", text),
                Step::Find(Selector::Role { role, name }) => match name {
                    Some(name) => format!("role={:?}[name=\"{}\"]", role, name),
                    None => format!("role={:?}", role),
                },
                Step::HasText(t) => format!(":has-text(\"{}\")", t),
                Step::TextIs(t) => format!(":text-is(\"{}\")", t),
                Step::Has(inner) => format!(":has({})", inner),
                Step::Nth(i) => format!(":nth({})", i),
                Step::First => ":first".to_string(),
                Step::Last => ":last".to_string(),
            })
            .collect();
        f.write_str(&parts.join(" >> "))
    }
}
