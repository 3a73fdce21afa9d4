use llmrelay::chunker::chunk;
use proptest::prelude::*;

proptest! {
    // Concatenating the chunks in order reproduces the input exactly, every
    // chunk respects the limit, and the count is ceil(len / max) for
    // non-empty input.
    #[test]
    fn splitting_preserves_content_and_bounds(
        text in ".{0,400}",
        max_chars in 1_usize..64,
    ) {
        let chunks = chunk(&text, max_chars);

        let rejoined: String =
            chunks.iter().map(|c| c.text.as_str()).collect();
        prop_assert_eq!(&rejoined, &text);

        for chunk in &chunks {
            prop_assert!(chunk.text.chars().count() <= max_chars);
        }

        let char_count = text.chars().count();
        let expected = if char_count == 0 {
            1
        } else {
            char_count.div_ceil(max_chars)
        };
        prop_assert_eq!(chunks.len(), expected);
    }

    #[test]
    fn indices_are_contiguous_and_totals_consistent(
        text in ".{0,400}",
        max_chars in 1_usize..64,
    ) {
        let chunks = chunk(&text, max_chars);

        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.index, i);
            prop_assert_eq!(chunk.total, chunks.len());
        }
    }

    // Input already within the limit comes back as a single identical chunk.
    #[test]
    fn short_input_round_trips_unchanged(text in ".{0,32}") {
        let chunks = chunk(&text, 32);

        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(&chunks[0].text, &text);
        prop_assert_eq!(chunks[0].total, 1);
    }
}
