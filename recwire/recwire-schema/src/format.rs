use std::fmt::{Error, Result, Write as _};

use crate::descriptor::FieldInfo;

/// Render compiled fields one per line; nested records are listed below
/// their composite field with extra indentation.
pub fn format_fields(fields: &[FieldInfo], indent: usize) -> std::result::Result<String, Error> {
    let mut out = String::new();
    for field in fields {
        format_field(field, indent, &mut out)?;
    }
    Ok(out)
}

fn format_field(field: &FieldInfo, indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    let length = match field.length {
        Some(n) => n.to_string(),
        None => "*".to_string(),
    };
    let label = if field.label.is_empty() {
        "-"
    } else {
        field.label.as_str()
    };
    writeln!(
        out,
        "{pad}{:>3}  {:<8} len={:<3} {label}",
        field.index,
        field.data_type.type_name(),
        length
    )?;

    if let Some(nested) = &field.nested {
        writeln!(out, "{pad}     {}:", nested.type_name)?;
        if nested.fields.is_empty() {
            writeln!(out, "{pad}         (no fields)")?;
        }
        for child in &nested.fields {
            format_field(child, indent + 8, out)?;
        }
    }
    Ok(())
}
