//! Rewrites dictated math ("x squared plus one") into expression syntax
//! ("x^2+1") by plain substring substitution.
//!
//! This does not validate anything. Whatever comes out goes to the tokenizer,
//! and malformed text surfaces there as a lexical or syntax error.

use log::debug;

/// Spoken operator phrases, applied in this order. Multi-word phrases come
/// before any single word they contain.
const OPERATOR_WORDS: &[(&str, &str)] = &[
    ("plus", "+"),
    ("minus", "-"),
    ("times", "*"),
    ("multiplied by", "*"),
    ("divided by", "/"),
    ("over", "/"),
    ("squared", "^2"),
    ("cubed", "^3"),
    ("pi", "π"),
];

/// Spoken numbers from zero to twenty-nine, applied after the operator
/// phrases. Compounds precede `twenty`, and teens precede the units they start
/// with (`seventeen` before `seven`). Larger numbers must be dictated as
/// digits.
const NUMBER_WORDS: &[(&str, &str)] = &[
    ("twenty one", "21"),
    ("twenty two", "22"),
    ("twenty three", "23"),
    ("twenty four", "24"),
    ("twenty five", "25"),
    ("twenty six", "26"),
    ("twenty seven", "27"),
    ("twenty eight", "28"),
    ("twenty nine", "29"),
    ("twenty", "20"),
    ("nineteen", "19"),
    ("eighteen", "18"),
    ("seventeen", "17"),
    ("sixteen", "16"),
    ("fifteen", "15"),
    ("fourteen", "14"),
    ("thirteen", "13"),
    ("twelve", "12"),
    ("eleven", "11"),
    ("ten", "10"),
    ("nine", "9"),
    ("eight", "8"),
    ("seven", "7"),
    ("six", "6"),
    ("five", "5"),
    ("four", "4"),
    ("three", "3"),
    ("two", "2"),
    ("one", "1"),
    ("zero", "0"),
    ("point", "."),
];

/// Lower-cases `spoken_text`, applies the substitution tables left to right
/// and strips all whitespace.
pub fn normalize(spoken_text: &str) -> String {
    let mut text = spoken_text.to_lowercase();
    for (phrase, replacement) in OPERATOR_WORDS.iter().chain(NUMBER_WORDS) {
        if text.contains(phrase) {
            text = text.replace(phrase, replacement);
        }
    }
    text.retain(|c| !c.is_whitespace());
    debug!("Normalized '{}' to '{}'", spoken_text, text);
    text
}
