// Byte cursor over JSON-shaped text. String literals are skipped as a unit
// so brackets inside them never count towards depth.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RawValue<'a> {
    /// Includes the surrounding quotes.
    String(&'a str),
    Literal(&'a str),
    /// Includes the braces.
    Object(&'a str),
    /// Includes the brackets.
    Array(&'a str),
}

impl<'a> RawValue<'a> {
    pub(super) fn as_str(&self) -> &'a str {
        match self {
            RawValue::String(raw)
            | RawValue::Literal(raw)
            | RawValue::Object(raw)
            | RawValue::Array(raw) => raw,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Cursor<'a> {
    pub(super) fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            done: false,
        }
    }

    pub(super) fn enter_object(&mut self) -> bool {
        self.enter(b'{')
    }

    pub(super) fn enter_array(&mut self) -> bool {
        self.enter(b'[')
    }

    fn enter(&mut self, open: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(open) {
            self.pos += 1;
            true
        } else {
            self.done = true;
            false
        }
    }

    /// Positions the cursor on the value of the first member named `key`.
    /// Must be called right after [`Cursor::enter_object`].
    pub(super) fn seek_member(&mut self, key: &str) -> bool {
        while let Some(member_key) = self.next_key() {
            if key_matches(member_key, key) {
                return true;
            }
            if self.read_value().is_none() {
                self.done = true;
                return false;
            }
        }
        false
    }

    pub(super) fn next_member(&mut self) -> Option<(&'a str, RawValue<'a>)> {
        let key = self.next_key()?;
        match self.read_value() {
            Some(value) => Some((key, value)),
            None => {
                self.done = true;
                None
            }
        }
    }

    pub(super) fn next_element(&mut self) -> Option<RawValue<'a>> {
        if self.done {
            return None;
        }
        self.skip_ws();
        match self.peek() {
            Some(b',') => {
                self.pos += 1;
                self.skip_ws();
            }
            Some(b']') | None => {
                self.done = true;
                return None;
            }
            _ => {}
        }
        if self.peek() == Some(b']') {
            self.done = true;
            return None;
        }
        let value = self.read_value();
        if value.is_none() {
            self.done = true;
        }
        value
    }

    /// Reads `"key":` and returns the key without quotes (still escaped).
    fn next_key(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        self.skip_ws();
        if self.peek() == Some(b',') {
            self.pos += 1;
            self.skip_ws();
        }
        if self.peek() != Some(b'"') {
            self.done = true;
            return None;
        }
        let Some(raw) = self.read_string() else {
            self.done = true;
            return None;
        };
        self.skip_ws();
        if self.peek() != Some(b':') {
            self.done = true;
            return None;
        }
        self.pos += 1;
        Some(&raw[1..raw.len() - 1])
    }

    pub(super) fn read_value(&mut self) -> Option<RawValue<'a>> {
        self.skip_ws();
        match self.peek()? {
            b'"' => self.read_string().map(RawValue::String),
            b'{' => self.read_balanced().map(RawValue::Object),
            b'[' => self.read_balanced().map(RawValue::Array),
            b'}' | b']' | b',' | b':' => None,
            _ => self.read_literal().map(RawValue::Literal),
        }
    }

    fn read_string(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    self.pos = i + 1;
                    return Some(&self.text[start..self.pos]);
                }
                _ => i += 1,
            }
        }
        None
    }

    fn read_balanced(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut depth = 0usize;
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'"' => {
                    self.read_string()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        self.pos += 1;
                        return Some(&self.text[start..self.pos]);
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        None
    }

    fn read_literal(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b',' | b'}' | b']' => break,
                b if b.is_ascii_whitespace() => break,
                _ => self.pos += 1,
            }
        }
        (self.pos > start).then(|| &self.text[start..self.pos])
    }

    fn skip_ws(&mut self) {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }
}

fn key_matches(raw_key: &str, wanted: &str) -> bool {
    if raw_key == wanted {
        return true;
    }
    raw_key.contains('\\') && super::unescape(raw_key) == wanted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_are_read_in_order_with_raw_values() {
        let mut cursor = Cursor::new(r#" { "a" : "x\"y" , "b": [1, {"c": "]"}], "d": -1.5e3 } "#);
        assert!(cursor.enter_object());
        assert_eq!(
            cursor.next_member(),
            Some(("a", RawValue::String(r#""x\"y""#)))
        );
        assert_eq!(
            cursor.next_member(),
            Some(("b", RawValue::Array(r#"[1, {"c": "]"}]"#)))
        );
        assert_eq!(cursor.next_member(), Some(("d", RawValue::Literal("-1.5e3"))));
        assert_eq!(cursor.next_member(), None);
        assert_eq!(cursor.next_member(), None);
    }

    #[test]
    fn unbalanced_values_stop_the_scan() {
        let mut cursor = Cursor::new(r#"{"a": {"b": 1, "c": 2"#);
        assert!(cursor.enter_object());
        assert_eq!(cursor.next_member(), None);
    }

    #[test]
    fn array_elements_include_scalars() {
        let mut cursor = Cursor::new(r#"[ "s", 2, {"k":1} ]"#);
        assert!(cursor.enter_array());
        assert_eq!(cursor.next_element(), Some(RawValue::String("\"s\"")));
        assert_eq!(cursor.next_element(), Some(RawValue::Literal("2")));
        assert_eq!(cursor.next_element(), Some(RawValue::Object(r#"{"k":1}"#)));
        assert_eq!(cursor.next_element(), None);
    }

    #[test]
    fn empty_containers_end_immediately() {
        let mut cursor = Cursor::new("{}");
        assert!(cursor.enter_object());
        assert_eq!(cursor.next_member(), None);

        let mut cursor = Cursor::new("[ ]");
        assert!(cursor.enter_array());
        assert_eq!(cursor.next_element(), None);
    }
}
