/// Greedily wraps `text` into lines no wider than `max_width`.
///
/// Words are never split: a single word wider than `max_width` gets a line of
/// its own and overflows. Empty or whitespace-only input yields one empty line.
pub fn wrap_text<F>(text: &str, measure: F, max_width: f32) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut words = text.split_whitespace();
    let mut current = match words.next() {
        Some(word) => word.to_string(),
        None => return vec![String::new()],
    };

    let mut lines = Vec::new();
    for word in words {
        let candidate = format!("{} {}", current, word);
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    lines.push(current);

    lines
}

/// Vertical placement of a caption block anchored to the bottom of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBlock {
    pub x: i32,
    pub top: i32,
    pub line_height: i32,
}

impl TextBlock {
    pub fn anchored(
        canvas_height: u32,
        left_padding: u32,
        bottom_padding: u32,
        line_height: i32,
        line_count: usize,
    ) -> Self {
        let total = line_height * line_count as i32;
        Self {
            x: left_padding as i32,
            top: canvas_height as i32 - bottom_padding as i32 - total,
            line_height,
        }
    }

    /// Top y coordinate of each line, in drawing order.
    pub fn line_tops(&self, line_count: usize) -> impl Iterator<Item = i32> + '_ {
        (0..line_count as i32).map(move |i| self.top + i * self.line_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_px_per_char(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn wraps_greedily() {
        let lines = wrap_text("HELLO WORLD FOO", ten_px_per_char, 139.0);
        assert_eq!(lines, vec!["HELLO WORLD", "FOO"]);
    }

    #[test]
    fn fits_on_one_line_when_wide_enough() {
        let lines = wrap_text("HELLO WORLD FOO", ten_px_per_char, 150.0);
        assert_eq!(lines, vec!["HELLO WORLD FOO"]);
    }

    #[test]
    fn empty_input_gives_one_empty_line() {
        assert_eq!(wrap_text("", ten_px_per_char, 100.0), vec![""]);
        assert_eq!(wrap_text("  \t\n ", ten_px_per_char, 100.0), vec![""]);
    }

    #[test]
    fn long_word_overflows_on_its_own_line() {
        let lines = wrap_text("A SUPERCALIFRAGILISTIC B", ten_px_per_char, 50.0);
        assert_eq!(lines, vec!["A", "SUPERCALIFRAGILISTIC", "B"]);
    }

    #[test]
    fn collapses_irregular_whitespace() {
        let lines = wrap_text("  ONE\tTWO \n THREE  ", ten_px_per_char, 1000.0);
        assert_eq!(lines, vec!["ONE TWO THREE"]);
    }

    #[test]
    fn preserves_tokens_and_respects_width() {
        let samples = [
            "THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG",
            "A BB CCC DDDD EEEEE FFFFFF GGGGGGG HHHHHHHH",
            "SINGLE",
            "X Y Z X Y Z X Y Z X Y Z",
            "NEW ARRIVALS THIS WEEK ONLY IN STORE AND ONLINE",
        ];
        for max_width in [30.0, 55.0, 80.0, 139.0, 400.0] {
            for text in samples {
                let lines = wrap_text(text, ten_px_per_char, max_width);

                let rejoined = lines.join(" ");
                let tokens: Vec<&str> = rejoined.split_whitespace().collect();
                let expected: Vec<&str> = text.split_whitespace().collect();
                assert_eq!(tokens, expected, "tokens changed for {:?} at {}", text, max_width);

                for line in &lines {
                    let single_word = !line.contains(' ');
                    assert!(
                        ten_px_per_char(line) <= max_width || single_word,
                        "{:?} exceeds {}",
                        line,
                        max_width
                    );
                }
            }
        }
    }

    #[test]
    fn is_repeatable() {
        let a = wrap_text("SAME INPUT SAME OUTPUT", ten_px_per_char, 120.0);
        let b = wrap_text("SAME INPUT SAME OUTPUT", ten_px_per_char, 120.0);
        assert_eq!(a, b);
    }

    #[test]
    fn block_bottom_sits_on_padding() {
        let block = TextBlock::anchored(1350, 50, 120, 97, 2);
        assert_eq!(block.x, 50);
        assert_eq!(block.top, 1350 - 120 - 194);

        let tops: Vec<i32> = block.line_tops(2).collect();
        assert_eq!(tops, vec![1036, 1133]);
        assert_eq!(tops[1] + block.line_height, 1350 - 120);
    }
}
