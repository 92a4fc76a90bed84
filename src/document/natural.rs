use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Text(&'a str),
    Number(&'a str),
}

impl Chunk<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Number(a), Chunk::Number(b)) => cmp_digits(a, b),
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
            // Kinds alternate from a leading text chunk, so equal positions
            // always hold equal kinds.
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
        }
    }
}

/// Numeric comparison of two digit runs of any length.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Alternating text/digit runs. The first chunk is always text, possibly empty.
fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = false;

    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        if digit != in_digits {
            let run = &s[start..i];
            out.push(if in_digits {
                Chunk::Number(run)
            } else {
                Chunk::Text(run)
            });
            start = i;
            in_digits = digit;
        }
    }
    let run = &s[start..];
    out.push(if in_digits {
        Chunk::Number(run)
    } else {
        Chunk::Text(run)
    });
    out
}

/// Orders digit runs by value and everything else lexically, so
/// `images2.jpg` comes before `images10.jpg`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (left, right) = (chunks(a), chunks(b));
    left.iter()
        .zip(&right)
        .map(|(x, y)| x.compare(y))
        .find(|ord| ord.is_ne())
        .unwrap_or_else(|| left.len().cmp(&right.len()))
        .then_with(|| a.cmp(b))
}

pub fn sort_naturally<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}
