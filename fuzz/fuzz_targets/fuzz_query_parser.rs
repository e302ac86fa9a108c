#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz the wildcard parser with arbitrary strings
    // This should not panic, and a pattern that parses always has a literal
    if let Ok(query) = sfxi::query::parse_query(data) {
        assert!(!query.pattern.literal.is_empty());
    }
});
