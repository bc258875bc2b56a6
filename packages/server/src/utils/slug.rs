/// Derive a URL-safe slug from a display name: `"Mi Nuevo Rol"` → `"mi-nuevo-rol"`.
///
/// Non-ASCII letters are transliterated to ASCII first; letters with no ASCII
/// spelling are kept lower-cased. Whitespace, `-` and `_` become a single `-`,
/// `@` becomes `-at-`, and any other character is dropped.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        if c.is_ascii() {
            push_ascii(&mut out, c);
            continue;
        }
        match deunicode::deunicode_char(c) {
            Some(ascii) => ascii.chars().for_each(|a| push_ascii(&mut out, a)),
            None if c.is_alphanumeric() => out.extend(c.to_lowercase()),
            None => {}
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn push_ascii(out: &mut String, c: char) {
    let c = c.to_ascii_lowercase();
    if c.is_ascii_alphanumeric() {
        out.push(c);
    } else if c.is_ascii_whitespace() || c == '-' || c == '_' {
        push_separator(out);
    } else if c == '@' {
        push_separator(out);
        out.push_str("at");
        push_separator(out);
    }
}

fn push_separator(out: &mut String) {
    if !out.is_empty() && !out.ends_with('-') {
        out.push('-');
    }
}
