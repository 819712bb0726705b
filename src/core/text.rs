//! Text transforms used by the utility commands: Morse code, vaporwave
//! fullwidth text, dice rolls and Discord-safe escaping.

use rand::Rng;

const MORSE: [(char, &str); 54] = [
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    ('.', ".-.-.-"),
    (',', "--..--"),
    ('?', "..--.."),
    ('\'', ".----."),
    ('!', "-.-.--"),
    ('/', "-..-."),
    ('(', "-.--."),
    (')', "-.--.-"),
    ('&', ".-..."),
    (':', "---..."),
    (';', "-.-.-."),
    ('=', "-...-"),
    ('+', ".-.-."),
    ('-', "-....-"),
    ('_', "..--.-"),
    ('"', ".-..-."),
    ('$', "...-..-"),
    ('@', ".--.-."),
];

/// Encodes text as International Morse code.
///
/// Letters are separated by a space and words by ` / `. Characters without a
/// Morse representation are dropped.
#[must_use]
pub fn morse_encode(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter_map(|ch| {
                    let upper = ch.to_ascii_uppercase();
                    MORSE.iter().find(|(c, _)| *c == upper).map(|(_, code)| *code)
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Decodes Morse code produced by [`morse_encode`].
///
/// Unknown sequences decode to `?`.
#[must_use]
pub fn morse_decode(code: &str) -> String {
    code.split('/')
        .map(|word| {
            word.split_whitespace()
                .map(|symbol| {
                    MORSE
                        .iter()
                        .find(|(_, c)| *c == symbol)
                        .map_or('?', |(ch, _)| *ch)
                })
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Converts printable ASCII to its fullwidth form and spaces to ideographic spaces.
#[must_use]
pub fn vaporwave(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(u32::from(ch) + 0xFEE0).unwrap_or(ch),
            other => other,
        })
        .collect()
}

/// Rolls a die with `sides` faces, returning a value in `1..=sides`.
///
/// Returns None for dice with fewer than two sides.
#[must_use]
pub fn roll_die(sides: u64) -> Option<u64> {
    (sides >= 2).then(|| rand::rng().random_range(1..=sides))
}

/// Escapes Discord markdown and neutralises mass/user mentions.
#[must_use]
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '_' | '`' | '~' | '|' | '>' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
        if ch == '@' {
            escaped.push('\u{200B}');
        }
    }
    escaped
}

/// Removes a surrounding Discord code block (```lang ... ``` or `...`).
#[must_use]
pub fn strip_code_block(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        // A language tag sits on the opening line
        return match inner.split_once('\n') {
            Some((tag, body)) if !tag.contains(char::is_whitespace) => body.trim(),
            _ => inner.trim(),
        };
    }
    trimmed
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
        .unwrap_or(trimmed)
}

/// Splits command arguments into a program and its input.
///
/// A fenced or inline code block is the program and what follows is the
/// input. Bare code ends at the first whitespace.
#[must_use]
pub fn split_program(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    let fence = if text.starts_with("```") {
        "```"
    } else if text.starts_with('`') {
        "`"
    } else {
        ""
    };
    if !fence.is_empty() {
        if let Some(end) = text[fence.len()..].find(fence) {
            let split = end + fence.len() * 2;
            return (strip_code_block(&text[..split]), text[split..].trim());
        }
    }
    match text.split_once(char::is_whitespace) {
        Some((code, input)) => (code, input.trim()),
        None => (text, ""),
    }
}

/// Wraps text in a code block that its own backticks cannot close.
#[must_use]
pub fn code_block(text: &str) -> String {
    format!("```\n{}\n```", text.replace("```", "`\u{200B}``"))
}

/// Cuts `text` to at most `max` characters, appending `...` when cut.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// Formats a byte count with decimal units ("12.3 MB").
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["kB", "MB", "GB", "TB", "PB"];
    if bytes < 1000 {
        return format!("{bytes} Bytes");
    }

    let mut value = bytes as f64;
    let mut unit = UNITS[0];
    for candidate in UNITS {
        value /= 1000.0;
        unit = candidate;
        if value < 1000.0 {
            break;
        }
    }
    format!("{value:.1} {unit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morse_encode() {
        assert_eq!(morse_encode("SOS"), "... --- ...");
        assert_eq!(morse_encode("hi  there"), ".... .. / - .... . .-. .");
        assert_eq!(morse_encode("a ☃ b"), ".- / -...");
    }

    #[test]
    fn test_morse_decode() {
        assert_eq!(morse_decode("... --- ..."), "SOS");
        assert_eq!(morse_decode(".... .. / - .... . .-. ."), "HI THERE");
        assert_eq!(morse_decode("...... .-"), "?A");
    }

    #[test]
    fn test_vaporwave() {
        assert_eq!(vaporwave("Aesthetic 1!"), "Ａｅｓｔｈｅｔｉｃ\u{3000}１！");
        assert_eq!(vaporwave("ç"), "ç");
    }

    #[test]
    fn test_roll_die_range() {
        assert_eq!(roll_die(1), None);
        assert_eq!(roll_die(0), None);
        for _ in 0..200 {
            let value = roll_die(6).unwrap_or(0);
            assert!((1..=6).contains(&value));
        }
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("**bold** @everyone"), "\\*\\*bold\\*\\* @\u{200B}everyone");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijk", 8), "abcde...");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(999), "999 Bytes");
        assert_eq!(format_bytes(1_000), "1.0 kB");
        assert_eq!(format_bytes(12_345_678), "12.3 MB");
        assert_eq!(format_bytes(3_000_000_000), "3.0 GB");
    }

    #[test]
    fn test_strip_code_block() {
        assert_eq!(strip_code_block("```bf\n+++.\n```"), "+++.");
        assert_eq!(strip_code_block("```+[-]```"), "+[-]");
        assert_eq!(strip_code_block("`++`"), "++");
        assert_eq!(strip_code_block("  ++.  "), "++.");
    }

    #[test]
    fn test_split_program_keeps_code_blocks_whole() {
        assert_eq!(
            split_program("```bf\n++++++++[>+++++++++<-]>.\n```"),
            ("++++++++[>+++++++++<-]>.", "")
        );
        assert_eq!(split_program("```\n,[.,]\n``` hello there"), (",[.,]", "hello there"));
        assert_eq!(split_program("`+ + .` x"), ("+ + .", "x"));
        assert_eq!(split_program(",[.,] abc def"), (",[.,]", "abc def"));
        assert_eq!(split_program("+++."), ("+++.", ""));
    }

    #[test]
    fn test_code_block_escapes_fences() {
        assert_eq!(code_block("a```b"), "```\na`\u{200B}``b\n```");
    }
}
