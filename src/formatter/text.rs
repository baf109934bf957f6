use std::fmt::{Display, Write};

/// Выводит записи одной строкой `[a, b, c]`, каждый элемент в форме `Display`.
pub fn render_record_list<T: Display>(records: impl IntoIterator<Item = T>) -> String {
    let mut out = String::from("[");
    for (i, record) in records.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", record);
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_empty_list() {
        assert_eq!(render_record_list(Vec::<u32>::new()), "[]");
    }

    #[test]
    fn separates_elements_with_comma_space() {
        assert_eq!(render_record_list(["a", "b", "c"]), "[a, b, c]");
    }
}
