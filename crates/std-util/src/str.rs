use heck::ToSnakeCase;

/// `OrderLine.Id` becomes `order_line_id`.
pub fn snake_case(src: &str) -> String {
    src.to_snake_case()
}

/// Splits `src` on `sep`, ignoring separators nested inside `<...>`.
pub fn split_top_level<'a>(src: &'a str, sep: char) -> Vec<&'a str> {
    let mut parts = vec![];
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in src.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&src[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }

    parts.push(&src[start..]);
    parts
}
