//! Bucket-key derivation for the chained table.

use std::borrow::Cow;

/// Derives the bucket a key is chained under. Distinct keys may share a
/// bucket; the table resolves them by comparing key strings along the
/// chain.
pub trait Bucketing {
    fn bucket_key<'k>(&self, key: &'k str) -> Cow<'k, str>;
}

/// Every key gets its own bucket.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExactBucket;

impl Bucketing for ExactBucket {
    #[inline]
    fn bucket_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        Cow::Borrowed(key)
    }
}

/// Keys sharing their first `chars` characters share a bucket.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PrefixBucket {
    pub chars: usize,
}

impl PrefixBucket {
    pub const fn new(chars: usize) -> Self {
        Self { chars }
    }
}

impl Bucketing for PrefixBucket {
    fn bucket_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        match key.char_indices().nth(self.chars) {
            Some((end, _)) => Cow::Borrowed(&key[..end]),
            None => Cow::Borrowed(key),
        }
    }
}

impl<F> Bucketing for F
where
    F: Fn(&str) -> String,
{
    fn bucket_key<'k>(&self, key: &'k str) -> Cow<'k, str> {
        Cow::Owned(self(key))
    }
}
