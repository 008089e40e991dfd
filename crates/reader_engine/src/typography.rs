//! Text-node normalization for mixed CJK/Latin content.

/// Closing CJK punctuation that is followed by a space.
const CLOSING_PUNCTUATION: [char; 9] = ['，', '。', '！', '？', '；', '：', '）', '】', '》'];
/// Opening CJK punctuation that is preceded by a space.
const OPENING_PUNCTUATION: [char; 3] = ['（', '【', '《'];

/// ASCII and Unicode whitespace, full-width space and the byte-order mark.
pub fn is_space(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

pub fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

fn is_latin(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

fn is_script_boundary(prev: char, next: char) -> bool {
    (is_cjk(prev) && is_latin(next)) || (is_latin(prev) && is_cjk(next))
}

fn needs_gap(prev: char, next: char) -> bool {
    is_script_boundary(prev, next)
        || CLOSING_PUNCTUATION.contains(&prev)
        || OPENING_PUNCTUATION.contains(&next)
}

/// Trims the text and applies the mixed-script spacing rules.
///
/// Whitespace between two ideographs is dropped, a CJK/Latin boundary gets
/// exactly one space, and CJK punctuation gets a space on its open side.
/// Applying it twice gives the same result as applying it once.
pub fn normalize_text(text: &str) -> String {
    let chars: Vec<char> = text.trim_matches(is_space).chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if is_space(c) {
            let mut end = i;
            while end < chars.len() && is_space(chars[end]) {
                end += 1;
            }
            let prev = out.chars().next_back();
            let next = chars.get(end).copied();
            match (prev, next) {
                (Some(p), Some(n)) if is_cjk(p) && is_cjk(n) => {}
                (Some(p), Some(n)) if is_script_boundary(p, n) => out.push(' '),
                _ => out.extend(&chars[i..end]),
            }
            i = end;
            continue;
        }
        if let Some(prev) = out.chars().next_back() {
            if !is_space(prev) && needs_gap(prev, c) {
                out.push(' ');
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Collapses every whitespace run (non-breaking spaces included) to one space.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if is_space(c) {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_full_width_padding_and_spaces_script_boundary() {
        assert_eq!(normalize_text("\u{3000}你好  world\u{3000}"), "你好 world");
    }

    #[test]
    fn drops_space_between_ideographs() {
        assert_eq!(normalize_text("中 \t 文"), "中文");
    }

    #[test]
    fn inserts_space_at_boundaries_without_whitespace() {
        assert_eq!(normalize_text("使用Rust编写"), "使用 Rust 编写");
        assert_eq!(normalize_text("版本2发布"), "版本 2 发布");
    }

    #[test]
    fn punctuation_gets_a_single_gap() {
        assert_eq!(normalize_text("你好，世界"), "你好， 世界");
        assert_eq!(normalize_text("见《论语》"), "见 《论语》");
        assert_eq!(normalize_text("结束。"), "结束。");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = ["你好，世界（注）abc", "a 中 b", "\u{feff}x\u{2003}y", "【注】Rust1.0版本"];
        for sample in samples {
            let once = normalize_text(sample);
            assert_eq!(normalize_text(&once), once, "sample {sample:?}");
        }
    }

    #[test]
    fn collapse_covers_non_breaking_space() {
        assert_eq!(collapse_whitespace("a\u{a0}\u{a0} \n b"), "a b");
    }
}
