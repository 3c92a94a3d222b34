//! Venue checksums over the top of the book.
//!
//! Several venues attach a CRC-32 of their top levels to each update so a
//! client can prove its local book still matches. The digest layouts differ
//! per venue; [`ConcatCrc32`] and [`InterleavedCrc32`] cover the two common
//! families, and any `Fn(&BookState) -> u32` can be used for the rest.
//!
//! [`ConcatCrc32`] renders decimals in their shortest form, trailing zeros
//! dropped, unless told to keep the arrival scale. [`InterleavedCrc32`] always
//! renders the scale the feed sent, so books must be fed the venue's own
//! price/amount strings for that digest to match.

use std::fmt::Write;

use rust_decimal::Decimal;

use crate::orderbook::BookState;
use crate::types::PriceLevel;

/// Digest over a book, compared with the checksum carried by the feed
pub trait Checksum: Send + Sync {
    /// Compute the digest of `book`
    fn compute(&self, book: &BookState) -> u32;
}

impl<F> Checksum for F
where
    F: Fn(&BookState) -> u32 + Send + Sync,
{
    fn compute(&self, book: &BookState) -> u32 {
        self(book)
    }
}

/// Which side is rendered first by [`ConcatCrc32`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SideOrder {
    /// Bids then asks
    #[default]
    BidsFirst,
    /// Asks then bids
    AsksFirst,
}

/// CRC-32 over the top `depth` levels of each side, concatenated
///
/// Each level contributes its price then its amount, both with the decimal
/// point and leading zeros removed (`0.05005` becomes `5005`). Trailing zeros
/// are dropped first (`1250.0` becomes `1250`, `1.50` becomes `15`) unless
/// [`keep_scale`](Self::keep_scale) is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatCrc32 {
    /// Levels per side
    pub depth: usize,
    /// Side rendered first
    pub order: SideOrder,
    /// Render decimals in shortest form
    pub normalize: bool,
}

impl ConcatCrc32 {
    /// Bids-first, normalised digest over `depth` levels
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            order: SideOrder::BidsFirst,
            normalize: true,
        }
    }

    /// Render the asks before the bids
    #[must_use]
    pub fn asks_first(mut self) -> Self {
        self.order = SideOrder::AsksFirst;
        self
    }

    /// Render decimals with the scale they arrived with
    #[must_use]
    pub fn keep_scale(mut self) -> Self {
        self.normalize = false;
        self
    }

    fn digits(&self, value: Decimal) -> String {
        let value = if self.normalize { value.normalize() } else { value };
        trim(&value.to_string())
    }

    fn render(&self, levels: &[PriceLevel], out: &mut String) {
        for level in levels.iter().take(self.depth) {
            out.push_str(&self.digits(level.price));
            out.push_str(&self.digits(level.amount));
        }
    }
}

impl Default for ConcatCrc32 {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Checksum for ConcatCrc32 {
    fn compute(&self, book: &BookState) -> u32 {
        let mut payload = String::new();
        let (first, second) = match self.order {
            SideOrder::BidsFirst => (book.bids(), book.asks()),
            SideOrder::AsksFirst => (book.asks(), book.bids()),
        };
        self.render(first, &mut payload);
        self.render(second, &mut payload);
        crc32fast::hash(payload.as_bytes())
    }
}

/// CRC-32 over alternating bid/ask levels, `price:amount` joined by colons
///
/// Level `i` contributes `bid_i` then `ask_i`; when one side runs out the
/// other continues alone (`bid:ask:bid:ask:ask:ask`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedCrc32 {
    /// Levels per side
    pub depth: usize,
}

impl InterleavedCrc32 {
    /// Interleaved digest over `depth` levels
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }
}

impl Default for InterleavedCrc32 {
    fn default() -> Self {
        Self::new(25)
    }
}

impl Checksum for InterleavedCrc32 {
    fn compute(&self, book: &BookState) -> u32 {
        let mut payload = String::new();
        for i in 0..self.depth {
            for level in [book.bids().get(i), book.asks().get(i)].into_iter().flatten() {
                // Writing to a String cannot fail
                let _ = write!(payload, "{}:{}:", level.price, level.amount);
            }
        }
        let payload = payload.strip_suffix(':').unwrap_or(&payload);
        crc32fast::hash(payload.as_bytes())
    }
}

/// Drop the decimal point and any leading zeros
pub fn trim(value: &str) -> String {
    value
        .replace('.', "")
        .trim_start_matches('0')
        .to_string()
}
