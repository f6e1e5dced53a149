//! Variable type.

use serde_json::Value as Json;

use super::str_field;

/// Where a variable lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope
{
    /// File or program wide.
    Global,
    /// Function or file `static`.
    Static,
    /// Parameter of the selected frame's function.
    Argument,
    /// Local of the selected frame.
    Local,
}

impl VariableScope
{
    fn parse(text: &str) -> Option<Self>
    {
        match text {
            "global" => Some(Self::Global),
            "static" => Some(Self::Static),
            "argument" => Some(Self::Argument),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

/// A variable visible from the selected frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable
{
    /// Symbol name.
    pub name: String,
    /// Type as gdb prints it.
    pub ty: String,
    /// Storage class.
    pub scope: VariableScope,
    /// Value as gdb prints it.
    pub value: String,
}

impl Variable
{
    /// Build from one entry written by the context extension command:
    /// `{"name", "type", "scope", "value"}`.
    pub(crate) fn from_json(value: &Json) -> Option<Self>
    {
        Some(Self {
            name: str_field(value, "name")?.to_string(),
            ty: str_field(value, "type")?.to_string(),
            scope: VariableScope::parse(str_field(value, "scope")?)?,
            value: str_field(value, "value").unwrap_or_default().to_string(),
        })
    }
}
