/// Greedy word wrap. `measure` returns the rendered width of a string.
///
/// Words wider than `max_width` on their own are split between characters;
/// every line holds at least one character, so this always terminates.
pub fn wrap_text(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if measure(word) <= max_width {
            current = word.to_string();
        } else {
            let mut pieces = split_word(word, max_width, &measure);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

fn split_word(word: &str, max_width: u32, measure: &impl Fn(&str) -> u32) -> Vec<String> {
    let mut pieces = vec![];
    let mut piece = String::new();

    for ch in word.chars() {
        piece.push(ch);
        if piece.chars().count() > 1 && measure(&piece) > max_width {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }

    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    /// every char is 10px wide
    fn width(s: &str) -> u32 {
        s.chars().count() as u32 * 10
    }

    #[test]
    fn fits_on_one_line() {
        assert_eq!(wrap_text("Fresh bread", 200, width), ["Fresh bread"]);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        assert_eq!(
            wrap_text("Precision antibodies for faster cures", 150, width),
            ["Precision", "antibodies for", "faster cures"]
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(wrap_text("  a \n\n b\tc  ", 100, width), ["a b c"]);
    }

    #[test]
    fn splits_words_that_never_fit() {
        assert_eq!(
            wrap_text("ab supercalifragilistic cd", 50, width),
            ["ab", "super", "calif", "ragil", "istic", "cd"]
        );
    }

    #[test]
    fn narrower_than_a_single_char() {
        assert_eq!(wrap_text("abc", 5, width), ["a", "b", "c"]);
    }

    #[test]
    fn empty_text_gives_no_lines() {
        assert!(wrap_text("   ", 100, width).is_empty());
    }
}
