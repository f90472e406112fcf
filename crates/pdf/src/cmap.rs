//! `ToUnicode` CMap parsing (`bfchar` and `bfrange` sections only).

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(String),
}

struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.pos < self.data.len() && pred(self.data[self.pos]) {
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            self.take_while(|b| b.is_ascii_whitespace());
            let byte = *self.data.get(self.pos)?;
            match byte {
                b'%' => {
                    self.take_while(|b| b != b'\n' && b != b'\r');
                }
                b'<' if self.data.get(self.pos + 1) == Some(&b'<') => {
                    self.pos += 2;
                    return Some(Token::Word("<<".to_string()));
                }
                b'<' => {
                    self.pos += 1;
                    let digits: Vec<u8> = self
                        .take_while(|b| b != b'>')
                        .iter()
                        .copied()
                        .filter(|b| b.is_ascii_hexdigit())
                        .collect();
                    self.pos += 1;
                    return Some(Token::Hex(hex_bytes(&digits)));
                }
                b'[' => {
                    self.pos += 1;
                    return Some(Token::Open);
                }
                b']' => {
                    self.pos += 1;
                    return Some(Token::Close);
                }
                b'(' => {
                    self.take_while(|b| b != b')');
                    self.pos += 1;
                }
                _ => {
                    let word = self.take_while(|b| {
                        !b.is_ascii_whitespace() && !matches!(b, b'<' | b'>' | b'[' | b']' | b'(' | b'%')
                    });
                    if word.is_empty() {
                        self.pos += 1;
                        continue;
                    }
                    return Some(Token::Word(String::from_utf8_lossy(word).into_owned()));
                }
            }
        }
    }
}

fn hex_bytes(digits: &[u8]) -> Vec<u8> {
    let nibble = |b: u8| (b as char).to_digit(16).unwrap_or(0) as u8;
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => nibble(*hi) << 4 | nibble(*lo),
            [hi] => nibble(*hi) << 4,
            _ => 0,
        })
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16be(bytes: &[u8]) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [lo] => *lo as u16,
            _ => 0,
        })
        .collect();
    String::from_utf16(&units).ok()
}

/// Character code to Unicode text, as declared by a font's `ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub(crate) struct ToUnicode {
    map: HashMap<u32, String>,
}

impl ToUnicode {
    pub fn parse(data: &[u8]) -> Self {
        let mut tokens = Tokenizer::new(data);
        let mut map = HashMap::new();

        while let Some(token) = tokens.next() {
            match token {
                Token::Word(w) if w == "beginbfchar" => {
                    while let Some(Token::Hex(src)) = tokens.next() {
                        let Some(Token::Hex(dst)) = tokens.next() else {
                            break;
                        };
                        if let Some(text) = utf16be(&dst) {
                            map.insert(code_of(&src), text);
                        }
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    while let Some(Token::Hex(lo)) = tokens.next() {
                        let Some(Token::Hex(hi)) = tokens.next() else {
                            break;
                        };
                        let (lo, hi) = (code_of(&lo), code_of(&hi));
                        match tokens.next() {
                            Some(Token::Hex(dst)) => {
                                let Some(first) = utf16be(&dst).and_then(|s| s.chars().next()) else {
                                    continue;
                                };
                                for (offset, code) in (lo..=hi).enumerate() {
                                    if let Some(ch) = char::from_u32(first as u32 + offset as u32) {
                                        map.insert(code, ch.to_string());
                                    }
                                }
                            }
                            Some(Token::Open) => {
                                let mut code = lo;
                                while let Some(Token::Hex(dst)) = tokens.next() {
                                    if let Some(text) = utf16be(&dst) {
                                        map.insert(code, text);
                                    }
                                    code += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => {}
            }
        }

        Self { map }
    }

    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
