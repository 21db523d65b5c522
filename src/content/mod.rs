//! Content module - post models and derived values

mod post;
pub mod reading_time;

pub use post::{
    Banner, ContentSection, PostDetail, PostDetailData, PostSummary, PostSummaryData,
    PostsPagination,
};
pub use reading_time::{count_words, reading_time, WORDS_PER_MINUTE};
