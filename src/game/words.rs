/// Word pool used when a round is started without one.
pub const DEFAULT_WORDS: [&str; 18] = [
    "apple",
    "banana",
    "cherry",
    "date",
    "elderberry",
    "fig",
    "grape",
    "honeydew",
    "kiwi",
    "lemon",
    "mango",
    "nectarine",
    "orange",
    "papaya",
    "quince",
    "raspberry",
    "strawberry",
    "tangerine",
];

pub fn default_words() -> Vec<String> {
    DEFAULT_WORDS.iter().map(|w| w.to_string()).collect()
}
