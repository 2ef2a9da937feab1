//! Prompt templates sent to the text-generation provider

/// Ask for learnable single words from a passage
pub fn extraction(passage: &str, gloss_language: &str) -> String {
    format!(
        r#"You are an English vocabulary expert. Extract the frequently used, practical English words from the passage below.

Requirements:
1. Single words only, no phrases or collocations
2. Pick words that are worth learning for an English learner
3. Skip trivial words such as the, is, a, an, of
4. Reply with a bare JSON array only, no other text and no markdown code fences

Passage:
{passage}

Reply strictly in this JSON format, with translations in {gloss_language}:
[{{"text": "english word", "translation": "meaning"}}]"#
    )
}

/// Ask for etymology, a memory tip and related words
pub fn association(word: &str, gloss_language: &str) -> String {
    format!(
        r#"You are an expert in etymology and English vocabulary. Provide memory aids for the word "{word}".

Reply strictly in this JSON format, with no other text and no markdown:
{{
  "etymology": "short note on the root or origin (one sentence)",
  "tip": "memory tip (one sentence)",
  "synonyms": [
    {{"text": "synonym", "translation": "meaning"}}
  ],
  "derivatives": [
    {{"text": "word sharing the same root", "translation": "meaning"}}
  ],
  "similar": [
    {{"text": "look-alike word", "translation": "meaning"}}
  ]
}}

Give several common related words for each category. Every translation is in {gloss_language}.
Translations contain only the meaning, never parenthetical remarks such as "look-alike" or "easily confused". A translation may list more than one meaning."#
    )
}

/// Ask for one natural example sentence per word
pub fn example_sentences(words: &[String]) -> String {
    format!(
        r#"You are an English teacher. Write one authentic English example sentence for each of the following words.

Words: {}

Requirements:
1. One sentence per word
2. Sentences are natural, idiomatic and practical
3. Do not translate, English sentences only
4. No fill-in-the-blank format
5. Format: word: sentence

Begin:"#,
        words.join(", ")
    )
}
