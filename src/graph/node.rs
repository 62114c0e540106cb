use super::catalog::Operation;
use super::handle::Handle;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A literal input value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Literal::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Literal::Integer(n) => serializer.serialize_u64(*n),
            Literal::Float(n) => serializer.serialize_f64(*n),
            Literal::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One named input of a node: either a literal or a link to another node's output.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Literal(Literal),
    Link(Handle),
}

impl Input {
    pub fn text(value: impl Into<String>) -> Self {
        Input::Literal(Literal::Text(value.into()))
    }

    pub fn integer(value: impl Into<u64>) -> Self {
        Input::Literal(Literal::Integer(value.into()))
    }

    pub fn float(value: f64) -> Self {
        Input::Literal(Literal::Float(value))
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Input::Link(handle) => Some(handle),
            Input::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Input::Literal(literal) => Some(literal),
            Input::Link(_) => None,
        }
    }

    /// Short description used in schema mismatch messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Input::Literal(Literal::Integer(_)) => "integer".to_string(),
            Input::Literal(Literal::Float(_)) => "float".to_string(),
            Input::Literal(Literal::Text(_)) => "text".to_string(),
            Input::Link(handle) => format!("{} handle", handle.kind),
        }
    }
}

impl From<Handle> for Input {
    fn from(handle: Handle) -> Self {
        Input::Link(handle)
    }
}

impl Serialize for Input {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Input::Literal(literal) => literal.serialize(serializer),
            Input::Link(handle) => handle.serialize(serializer),
        }
    }
}

/// A single operation instance in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub operation: Operation,
    pub inputs: Vec<(&'static str, Input)>,
}

impl Node {
    pub fn new(operation: Operation, inputs: Vec<(&'static str, Input)>) -> Self {
        Self { operation, inputs }
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs
            .iter()
            .find(|(input_name, _)| *input_name == name)
            .map(|(_, input)| input)
    }

    /// All handles this node consumes, in input order.
    pub fn links(&self) -> impl Iterator<Item = &Handle> {
        self.inputs.iter().filter_map(|(_, input)| input.as_handle())
    }
}

struct WireInputs<'a>(&'a [(&'static str, Input)]);

impl Serialize for WireInputs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, input) in self.0 {
            map.serialize_entry(name, input)?;
        }
        map.end()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("class_type", self.operation.wire_name())?;
        map.serialize_entry("inputs", &WireInputs(&self.inputs))?;
        map.end()
    }
}
