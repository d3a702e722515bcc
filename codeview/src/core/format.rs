//! Brace-driven re-indentation of source text.

/// Re-indent `code` by brace depth, `indent_width` spaces per level.
///
/// Every line is trimmed first. A line opening a block (`{` at either end) is
/// written at the current depth and increases it; a line starting with `}`
/// decreases the depth (never below zero) before being written.
pub fn format_code(code: &str, indent_width: usize) -> String {
    let mut out = String::with_capacity(code.len());
    let mut depth = 0usize;

    for raw in code.lines() {
        let line = raw.trim();
        if line.starts_with('{') || line.ends_with('{') {
            push_line(&mut out, depth * indent_width, line);
            depth += 1;
        } else if line.starts_with('}') {
            depth = depth.saturating_sub(1);
            push_line(&mut out, depth * indent_width, line);
        } else {
            push_line(&mut out, depth * indent_width, line);
        }
    }
    out
}

fn push_line(out: &mut String, spaces: usize, line: &str) {
    if !line.is_empty() {
        out.extend(std::iter::repeat_n(' ', spaces));
    }
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_nested_blocks() {
        let code = "int main() {\nif (x) {\nreturn 1;\n}\nreturn 0;\n}\n";
        let expected =
            "int main() {\n    if (x) {\n        return 1;\n    }\n    return 0;\n}\n";
        assert_eq!(format_code(code, 4), expected);
    }

    #[test]
    fn stray_close_does_not_go_negative() {
        assert_eq!(format_code("}\n  x;\n", 2), "}\nx;\n");
    }

    #[test]
    fn blank_lines_carry_no_trailing_spaces() {
        assert_eq!(format_code("{\n\n}", 4), "{\n\n}\n");
    }
}
