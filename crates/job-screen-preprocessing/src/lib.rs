//! Text normalization and TF-IDF vectorization for job postings.
//!
//! The [`pre_processor`] module turns raw posting text into cleaned text and
//! then into L2-normalized TF-IDF vectors over a fixed unigram/bigram
//! vocabulary.

pub mod pre_processor;
