//! Reading-time estimate

use super::post::ContentSection;

/// Default reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Count words by splitting on single spaces.
///
/// Deliberately naive: runs of spaces produce empty words and an empty
/// string still counts as one. Blocks without text (images, embeds) count 0.
pub fn count_words(sections: &[ContentSection]) -> usize {
    sections
        .iter()
        .map(|section| {
            let heading = section.heading.split(' ').count();
            let body: usize = section
                .body
                .iter()
                .filter_map(|block| block.text())
                .map(|text| text.split(' ').count())
                .sum();
            heading + body
        })
        .sum()
}

/// Estimated minutes, rounded up
pub fn reading_time(sections: &[ContentSection], words_per_minute: usize) -> usize {
    count_words(sections).div_ceil(words_per_minute.max(1))
}
