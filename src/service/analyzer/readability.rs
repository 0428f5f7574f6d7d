use regex::Regex;
use std::sync::OnceLock;

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-zA-Z']+").unwrap())
}

/// Lowercased words made of ASCII letters and apostrophes.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    word_regex()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .filter(|w| w.chars().any(|c| c.is_ascii_alphabetic()))
        .collect()
}

/// Every `.`, `!` and `?` counts as a sentence end; at least 1.
pub fn count_sentences(text: &str) -> usize {
    text.chars()
        .filter(|c| matches!(c, '.' | '!' | '?'))
        .count()
        .max(1)
}

/// Vowel-group heuristic: a trailing silent `e` is dropped, every word has at least one.
pub fn count_syllables(word: &str) -> usize {
    let mut count = 0;
    let mut prev_vowel = false;
    for c in word.chars().map(|c| c.to_ascii_lowercase()) {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    if word.to_ascii_lowercase().ends_with('e') && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Flesch Reading Ease, rounded to two decimals. Zero words scores 0.
pub fn flesch_reading_ease(words: &[String], sentences: usize) -> f64 {
    if words.is_empty() {
        return 0.0;
    }
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let word_count = words.len() as f64;
    let score = 206.835
        - 1.015 * (word_count / sentences.max(1) as f64)
        - 84.6 * (syllables as f64 / word_count);
    (score * 100.0).round() / 100.0
}

pub fn reading_level(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "Very Easy",
        s if s >= 80.0 => "Easy",
        s if s >= 70.0 => "Fairly Easy",
        s if s >= 60.0 => "Standard",
        s if s >= 50.0 => "Fairly Difficult",
        s if s >= 30.0 => "Difficult",
        _ => "Very Difficult",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syllable_heuristic() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("reading"), 2);
        assert_eq!(count_syllables("beautiful"), 3);
        assert_eq!(count_syllables("rhythm"), 1);
    }

    #[test]
    fn test_tokenize_lowercases_and_keeps_apostrophes() {
        assert_eq!(
            tokenize("Don't STOP 2 believing!"),
            vec!["don't", "stop", "believing"]
        );
    }

    #[test]
    fn test_sentence_count_has_floor_of_one() {
        assert_eq!(count_sentences("no terminator here"), 1);
        assert_eq!(count_sentences("One. Two! Three?"), 3);
        assert_eq!(count_sentences("Wait... what?!"), 5);
        assert_eq!(count_sentences(""), 1);
    }

    #[test]
    fn test_flesch_simple_sentence() {
        // 6 words, 1 sentence, 6 syllables: 206.835 - 6.09 - 84.6
        let words = tokenize("The cat sat on the mat.");
        assert_eq!(flesch_reading_ease(&words, 1), 116.15);
        assert_eq!(reading_level(116.15), "Very Easy");
    }

    #[test]
    fn test_flesch_empty_text() {
        assert_eq!(flesch_reading_ease(&[], 1), 0.0);
    }

    #[test]
    fn test_reading_level_bands() {
        assert_eq!(reading_level(65.0), "Standard");
        assert_eq!(reading_level(29.9), "Very Difficult");
        assert_eq!(reading_level(-12.0), "Very Difficult");
    }
}
