//! **PhoneticDecoder** — turns a raw transcript into spelled letters.
//!
//! Tokens that name a letter (NATO words, short forms, homophones such as "bee" or
//! "sea") map to that letter; bare single letters pass through uppercased. "double"
//! followed by "you" or "u" is W, and hyphen-joined letters ("c-a-t") split apart. Any other
//! multi-letter token is dropped unless whole-word expansion is switched on, in which
//! case its letters are emitted in order.

use tracing::trace;

/// Map one normalized (lowercase) token to its letter.
pub fn phonetic_letter(token: &str) -> Option<char> {
    let letter = match token {
        "alpha" | "alfa" | "ay" | "aye" => 'A',
        "bravo" | "bee" | "be" => 'B',
        "charlie" | "sea" | "see" | "cee" => 'C',
        "delta" | "dee" => 'D',
        "echo" | "ee" => 'E',
        "foxtrot" | "fox" | "ef" | "eff" => 'F',
        "golf" | "gee" => 'G',
        "hotel" | "aitch" | "haitch" => 'H',
        "india" | "eye" => 'I',
        "juliet" | "juliett" | "jay" => 'J',
        "kilo" | "kay" => 'K',
        "lima" | "el" | "ell" => 'L',
        "mike" | "em" => 'M',
        "november" | "en" => 'N',
        "oscar" | "oh" | "owe" => 'O',
        "papa" | "pee" | "pea" => 'P',
        "quebec" | "queue" | "cue" | "kew" => 'Q',
        "romeo" | "are" | "ar" => 'R',
        "sierra" | "es" | "ess" => 'S',
        "tango" | "tee" | "tea" => 'T',
        "uniform" | "you" | "yu" => 'U',
        "victor" | "vee" => 'V',
        "whiskey" | "whisky" | "double-u" | "doubleu" | "doubleyou" => 'W',
        "x-ray" | "xray" | "ex" => 'X',
        "yankee" | "why" | "wye" => 'Y',
        "zulu" | "zee" | "zed" => 'Z',
        _ => return None,
    };
    Some(letter)
}

/// Lowercase, keep only ASCII letters, whitespace and hyphens, split on whitespace.
fn normalize(raw: &str) -> Vec<String> {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// Decoder for spoken spellings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhoneticDecoder {
    expand_whole_words: bool,
}

impl PhoneticDecoder {
    /// Strict decoder: unmapped words contribute nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that spells out unmapped words letter by letter.
    pub fn with_word_expansion(expand_whole_words: bool) -> Self {
        Self { expand_whole_words }
    }

    pub fn expands_whole_words(&self) -> bool {
        self.expand_whole_words
    }

    /// Decode a transcript into uppercase letters. Pure: same input, same output.
    pub fn decode(&self, raw_transcript: &str) -> String {
        let mut letters = String::new();
        let mut tokens = normalize(raw_transcript).into_iter().peekable();
        while let Some(token) = tokens.next() {
            // "double you" arrives as two tokens.
            if token == "double" {
                if let Some(next) = tokens.next_if(|t| is_u_sound(t)) {
                    trace!(second = %next, "folding double-u");
                    letters.push('W');
                    continue;
                }
            }

            if let Some(letter) = phonetic_letter(&token) {
                letters.push(letter);
                continue;
            }

            if let Some(run) = hyphenated_letters(&token) {
                letters.push_str(&run);
                continue;
            }

            let mut chars = token.chars().filter(|c| c.is_ascii_alphabetic());
            match (chars.next(), chars.next()) {
                (Some(only), None) if token.len() == 1 => letters.push(only.to_ascii_uppercase()),
                (Some(_), _) if self.expand_whole_words => {
                    letters.extend(
                        token
                            .chars()
                            .filter(|c| c.is_ascii_alphabetic())
                            .map(|c| c.to_ascii_uppercase()),
                    );
                }
                _ => trace!(token = %token, "dropping unmapped token"),
            }
        }
        letters
    }
}

fn is_u_sound(token: &str) -> bool {
    matches!(token, "u" | "you" | "yu")
}

/// "a-p-p-l-e": every hyphen-separated piece is one letter.
fn hyphenated_letters(token: &str) -> Option<String> {
    if !token.contains('-') {
        return None;
    }
    let pieces: Vec<&str> = token.split('-').filter(|p| !p.is_empty()).collect();
    if pieces.is_empty() || pieces.iter().any(|p| p.len() != 1) {
        return None;
    }
    Some(pieces.iter().map(|p| p.to_ascii_uppercase()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nato_words_map_to_letters() {
        let d = PhoneticDecoder::new();
        assert_eq!(d.decode("Alpha Papa papa Lima Echo"), "APPLE");
        assert_eq!(d.decode("x-ray yankee zulu"), "XYZ");
    }

    #[test]
    fn double_you_spoken_as_two_words_is_w() {
        let d = PhoneticDecoder::new();
        assert_eq!(d.decode("double you"), "W");
        assert_eq!(d.decode("Double U"), "W");
        assert_eq!(d.decode("double u i n d o double u"), "WINDOW");
        // A trailing "double" with nothing to pair is dropped.
        assert_eq!(d.decode("bee double"), "B");
        assert_eq!(d.decode("double bee"), "B");
    }

    #[test]
    fn hyphen_joined_letters_split_apart() {
        let d = PhoneticDecoder::new();
        assert_eq!(d.decode("A-P-P-L-E"), "APPLE");
        assert_eq!(d.decode("x-ray c-a-t"), "XCAT");
        assert_eq!(d.decode("well-known"), "");
    }

    #[test]
    fn single_letters_and_homophones() {
        let d = PhoneticDecoder::new();
        assert_eq!(d.decode("a p p l e"), "APPLE");
        assert_eq!(d.decode("bee sea dee"), "BCD");
        assert_eq!(d.decode("C. A, T!"), "CAT");
    }

    #[test]
    fn strict_mode_drops_unmapped_words() {
        let d = PhoneticDecoder::new();
        assert_eq!(d.decode("the letter b"), "B");
        assert_eq!(d.decode("apple"), "");
        assert_eq!(d.decode(""), "");
        assert_eq!(d.decode("42 -- ?"), "");
    }

    #[test]
    fn expansion_spells_out_unmapped_words() {
        let d = PhoneticDecoder::with_word_expansion(true);
        assert!(d.expands_whole_words());
        assert_eq!(d.decode("apple"), "APPLE");
        assert_eq!(d.decode("alpha pp"), "APP");
        // Mapped words still win over expansion.
        assert_eq!(d.decode("bravo"), "B");
    }

    #[test]
    fn decode_is_deterministic() {
        let d = PhoneticDecoder::new();
        let input = "Sierra   tango oh pea";
        assert_eq!(d.decode(input), d.decode(input));
        assert_eq!(d.decode(input), "STOP");
    }
}
