//! Stack frame type.

use serde_json::Value as Json;

use super::{num_field, str_field};

/// One frame of a call stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame
{
    /// Source file, absolute when gdb knows the full path.
    pub file: String,
    /// Line number in `file`.
    pub line: u32,
    /// Function name.
    pub func: Option<String>,
    /// Depth in the stack, 0 being the innermost frame.
    pub level: Option<u32>,
}

impl Frame
{
    /// Build from an MI frame tuple.
    ///
    /// Frames without source information (system libraries, code without
    /// debug info) have no file or line and yield `None`.
    pub(crate) fn from_json(value: &Json) -> Option<Self>
    {
        let file = str_field(value, "fullname").or_else(|| str_field(value, "file"))?;
        Some(Self {
            file: file.to_string(),
            line: num_field(value, "line")?,
            func: str_field(value, "func").map(str::to_string),
            level: num_field(value, "level"),
        })
    }
}
