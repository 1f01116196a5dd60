//! Word n-gram tokenization of plain-text files.
//!
//! Words are maximal runs of non-whitespace. N-grams span line breaks: the
//! trailing `n - 1` words of a line are carried into the next non-blank
//! line, so a file's n-gram set does not depend on where it was wrapped.
//! Blank lines are skipped without resetting the carry.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use lsh::TokenSet;

/// Collect the distinct word n-grams of `reader`, joined by single spaces.
///
/// A width of `0` is treated as `1`. Invalid UTF-8 is replaced lossily.
/// Documents with fewer than `n` words produce an empty set.
pub fn ngrams_from_reader<R: BufRead>(mut reader: R, n: usize) -> io::Result<TokenSet> {
    let n = n.max(1);
    let mut ngrams = TokenSet::new();
    let mut carry: Vec<String> = Vec::with_capacity(n);
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        let mut words: Vec<String> = std::mem::take(&mut carry);
        let before = words.len();
        words.extend(text.split_whitespace().map(str::to_owned));
        if words.len() == before {
            carry = words;
            continue;
        }

        if words.len() >= n {
            for window in words.windows(n) {
                ngrams.insert(window.join(" "));
            }
            words.drain(..words.len() - (n - 1));
        }
        carry = words;
    }

    Ok(ngrams)
}

/// Load the word n-grams of the file at `path`.
pub fn load_ngrams(path: impl AsRef<Path>, n: usize) -> io::Result<TokenSet> {
    let file = File::open(path)?;
    ngrams_from_reader(BufReader::new(file), n)
}
