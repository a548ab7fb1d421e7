/// Counts words in mixed CJK and alphabetic text.
///
/// Each CJK character is one word. Any other run of non-whitespace characters
/// containing at least one letter or digit is one word.
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;
    let mut word_has_alnum = false;

    for ch in text.chars() {
        if is_cjk(ch) || ch.is_whitespace() {
            if in_word && word_has_alnum {
                count += 1;
            }
            in_word = false;
            word_has_alnum = false;
            if is_cjk(ch) {
                count += 1;
            }
            continue;
        }
        in_word = true;
        word_has_alnum |= ch.is_alphanumeric();
    }

    if in_word && word_has_alnum {
        count += 1;
    }
    count
}

fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{3040}'..='\u{30FF}'      // hiragana, katakana
        | '\u{3400}'..='\u{4DBF}'    // extension A
        | '\u{4E00}'..='\u{9FFF}'    // unified ideographs
        | '\u{AC00}'..='\u{D7AF}'    // hangul syllables
        | '\u{F900}'..='\u{FAFF}'    // compatibility ideographs
        | '\u{20000}'..='\u{2A6DF}'  // extension B
    )
}
