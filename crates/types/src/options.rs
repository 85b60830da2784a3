// crates/types/src/options.rs
//! Closed option vocabularies shared by posting forms and filters.
//!
//! The server stores these as plain strings; keeping the canonical lists
//! here means the create/edit payloads and the client-side salary bucket
//! filter agree on the exact values.

pub const SALARY_RANGES: &[&str] = &[
    "Under $50,000",
    "$50,000 - $75,000",
    "$75,000 - $100,000",
    "$100,000 - $150,000",
    "$150,000 - $200,000",
    "Over $200,000",
];

pub const EXPERIENCE_LEVELS: &[&str] = &[
    "Entry Level",
    "Associate",
    "Mid-Level",
    "Senior",
    "Lead",
    "Principal",
    "Executive",
];

pub const COMPANY_SIZES: &[&str] = &["1-10", "11-50", "51-200", "201-1000", "1000+"];
