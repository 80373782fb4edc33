//! Fuzz target for response body decoding
//!
//! Feeds arbitrary bytes through every decoder a response body can reach:
//! envelopes, page normalization in all three shapes, error messages and
//! like outcomes.
//!
//! # Invariants
//!
//! - NEVER panic on malformed JSON or unexpected shapes
//! - A decoded page always displays at least one page

#![no_main]

use libfuzzer_sys::fuzz_target;
use petboard_proto::{
    Comment, Envelope, ForumPost, LikeOutcome, error_message, like_status, normalize_page,
};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let _ = error_message(&body);
    let _ = like_status(&body);

    if let Ok(envelope) = Envelope::<Value>::from_body(body.clone()) {
        let _ = LikeOutcome::from_response(&envelope.message, &envelope.data);
    }

    if let Ok(page) = normalize_page::<ForumPost>(body.clone()) {
        for size in [0, 1, 5, 10, u32::MAX] {
            assert!(page.total_pages_for(size) >= 1);
        }
    }
    let _ = normalize_page::<Comment>(body);
});
