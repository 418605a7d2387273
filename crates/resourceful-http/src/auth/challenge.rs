//! `WWW-Authenticate` challenge parsing.

use super::AuthScheme;

/// One authentication challenge from a `WWW-Authenticate` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    scheme: String,
    params: Vec<(String, String)>,
}

impl Challenge {
    /// Parse every challenge in one header value.
    ///
    /// A single value may carry several comma separated challenges, e.g.
    /// `Digest realm="a", nonce="n", Basic realm="a"`. Scheme and parameter
    /// names are matched case-insensitively; malformed trailing input is
    /// dropped rather than rejected.
    pub fn parse_all(header: &str) -> Vec<Challenge> {
        let mut cursor = Cursor::new(header);
        let mut challenges = Vec::new();

        loop {
            cursor.skip_separators();
            let scheme = cursor.token();
            if scheme.is_empty() {
                break;
            }

            let mut challenge = Challenge {
                scheme: scheme.to_string(),
                params: Vec::new(),
            };

            loop {
                let saw_comma = cursor.skip_separators();
                let mark = cursor.pos;
                let name = cursor.token();

                if name.is_empty() {
                    match cursor.peek() {
                        Some(b'=') => {
                            while cursor.peek() == Some(b'=') {
                                cursor.pos += 1;
                            }
                            continue;
                        }
                        Some(b'"') => {
                            cursor.quoted();
                            continue;
                        }
                        _ => break,
                    }
                }

                cursor.skip_whitespace();
                if cursor.peek() == Some(b'=') {
                    cursor.pos += 1;
                    cursor.skip_whitespace();
                    let value = if cursor.peek() == Some(b'"') {
                        cursor.quoted()
                    } else {
                        cursor.token().to_string()
                    };
                    challenge.params.push((name.to_ascii_lowercase(), value));
                } else if challenge.params.is_empty() && !saw_comma {
                    // token68 credentials directly after the scheme
                    challenge.params.push(("token68".to_string(), name.to_string()));
                } else {
                    // start of the next challenge
                    cursor.pos = mark;
                    break;
                }
            }

            challenges.push(challenge);
        }

        challenges
    }

    /// Scheme name as sent by the server.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Whether this challenge is for `scheme`.
    pub fn is(&self, scheme: AuthScheme) -> bool {
        self.scheme.eq_ignore_ascii_case(scheme.name())
    }

    /// Parameter value by case-insensitive name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn realm(&self) -> Option<&str> {
        self.param("realm")
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Skip whitespace and commas, reporting whether a comma was crossed.
    fn skip_separators(&mut self) -> bool {
        let mut saw_comma = false;
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' => {}
                b',' => saw_comma = true,
                _ => break,
            }
            self.pos += 1;
        }
        saw_comma
    }

    // Delimiters are all ASCII, so every slice boundary is a char boundary.
    fn token(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b',' | b'=' | b'"') {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn quoted(&mut self) -> String {
        let bytes = self.input.as_bytes();
        let mut value = String::new();

        self.pos += 1;
        let mut start = self.pos;
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\\' if self.pos + 1 < bytes.len() => {
                    value.push_str(&self.input[start..self.pos]);
                    self.pos += 1;
                    start = self.pos;
                    self.pos += 1;
                }
                b'"' => {
                    value.push_str(&self.input[start..self.pos]);
                    self.pos += 1;
                    return value;
                }
                _ => self.pos += 1,
            }
        }

        // unterminated
        value.push_str(&self.input[start..]);
        value
    }
}
