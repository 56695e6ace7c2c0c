/// Complement of a single (uppercase) nucleotide
///
/// Anything that is not `A`, `C`, `G`, or `T` complements to `N`.
#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        _ => b'N',
    }
}

/// Returns the reverse complement of a nucleotide sequence
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Writes the uppercase form of `seq` into `buf`
///
/// The buffer is cleared first so it can be reused across reads.
#[inline]
pub fn uppercase_into(seq: &[u8], buf: &mut Vec<u8>) {
    buf.clear();
    buf.extend(seq.iter().map(u8::to_ascii_uppercase));
}

/// Checks that a sequence only contains `A`, `C`, `G`, `T`, or `N`
///
/// Returns the first offending byte if there is one.
pub fn first_invalid_nucleotide(seq: &[u8]) -> Option<u8> {
    seq.iter()
        .copied()
        .find(|b| !matches!(b, b'A' | b'C' | b'G' | b'T' | b'N'))
}
