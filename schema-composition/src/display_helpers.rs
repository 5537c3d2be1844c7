use std::fmt;
use std::fmt::Display;

use apollo_compiler::Name;
use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;

use crate::source::definition::AppliedDirective;

pub(crate) struct State<'fmt, 'fmt2> {
    indent_level: usize,
    output: &'fmt mut fmt::Formatter<'fmt2>,
}

impl<'a, 'b> State<'a, 'b> {
    pub(crate) fn new(output: &'a mut fmt::Formatter<'b>) -> State<'a, 'b> {
        Self {
            indent_level: 0,
            output,
        }
    }

    pub(crate) fn write<T: Display>(&mut self, value: T) -> fmt::Result {
        write!(self.output, "{}", value)
    }

    pub(crate) fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        self.output.write_fmt(args)
    }

    pub(crate) fn new_line(&mut self) -> fmt::Result {
        self.write("\n")?;
        for _ in 0..self.indent_level {
            self.write("  ")?
        }
        Ok(())
    }

    pub(crate) fn indent_no_new_line(&mut self) {
        self.indent_level += 1;
    }

    pub(crate) fn dedent(&mut self) -> fmt::Result {
        self.indent_level = self.indent_level.saturating_sub(1);
        self.new_line()
    }
}

/// Writes `{`, one indented line per value, then `}`. Nothing is written for no values.
pub(crate) fn write_block<T>(
    state: &mut State<'_, '_>,
    values: impl IntoIterator<Item = T>,
    mut write_line: impl FnMut(&mut State<'_, '_>, T) -> fmt::Result,
) -> fmt::Result {
    let mut values = values.into_iter().peekable();
    if values.peek().is_none() {
        return Ok(());
    }
    state.write(" {")?;
    state.indent_no_new_line();
    for value in values {
        state.new_line()?;
        write_line(state, value)?;
    }
    state.dedent()?;
    state.write("}")
}

pub(crate) struct DisplaySlice<'a, T>(pub(crate) &'a [T]);

impl<T: Display> Display for DisplaySlice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        let mut iter = self.0.iter();
        if let Some(item) = iter.next() {
            write!(f, "{item}")?;
        }
        iter.try_for_each(|item| write!(f, ", {item}"))?;
        write!(f, "]")
    }
}

/// A GraphQL string literal on a single line.
pub(crate) struct DisplayStringLiteral<'a>(pub(crate) &'a str);

impl Display for DisplayStringLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.0.chars() {
            match c {
                '"' => f.write_str("\\\"")?,
                '\\' => f.write_str("\\\\")?,
                '\n' => f.write_str("\\n")?,
                '\r' => f.write_str("\\r")?,
                '\t' => f.write_str("\\t")?,
                c if c.is_control() => write!(f, "\\u{:04X}", c as u32)?,
                c => write!(f, "{c}")?,
            }
        }
        f.write_str("\"")
    }
}

/// Writes a description on its own line(s) at the current indentation, followed by a new line.
/// Multi-line descriptions become block strings.
pub(crate) fn write_description(
    state: &mut State<'_, '_>,
    description: Option<&str>,
) -> fmt::Result {
    let Some(description) = description else {
        return Ok(());
    };
    if description.contains('\n') {
        state.write("\"\"\"")?;
        for line in description.lines() {
            state.new_line()?;
            state.write(line.replace("\"\"\"", "\\\"\"\""))?;
        }
        state.new_line()?;
        state.write("\"\"\"")?;
    } else {
        state.write(DisplayStringLiteral(description))?;
    }
    state.new_line()
}

/// Directive applications, each preceded by a space.
pub(crate) struct DisplayDirectives<'a>(pub(crate) &'a [AppliedDirective]);

impl Display for DisplayDirectives<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in self.0 {
            write!(f, " {directive}")?;
        }
        Ok(())
    }
}

impl Display for AppliedDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.arguments.is_empty() {
            f.write_str("(")?;
            for (index, (name, value)) in self.arguments.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                let value: &Value = value;
                write!(f, "{name}: {value}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// An argument or input field definition: `"description" name: Type = default @directive`.
pub(crate) struct DisplayInputValue<'a> {
    pub(crate) description: Option<&'a str>,
    pub(crate) name: &'a Name,
    pub(crate) ty: &'a Type,
    pub(crate) default_value: Option<&'a Value>,
    pub(crate) directives: &'a [AppliedDirective],
}

impl Display for DisplayInputValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(description) = self.description {
            write!(f, "{} ", DisplayStringLiteral(description))?;
        }
        write!(f, "{}: {}", self.name, self.ty)?;
        if let Some(default_value) = self.default_value {
            write!(f, " = {default_value}")?;
        }
        write!(f, "{}", DisplayDirectives(self.directives))
    }
}

/// A parenthesized argument list, or nothing when there are no arguments.
pub(crate) struct DisplayArguments<'a>(pub(crate) Vec<DisplayInputValue<'a>>);

impl Display for DisplayArguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (index, argument) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{argument}")?;
        }
        f.write_str(")")
    }
}
