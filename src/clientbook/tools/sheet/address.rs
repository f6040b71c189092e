use std::fmt;

/// Zero-based (row, column) coordinates derived from an address like `"M7"`.
///
/// Malformed addresses resolve to [`CellAddress::INVALID`], which readers
/// treat as "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: i64,
    pub col: i64,
}

impl CellAddress {
    /// Sentinel returned for unparsable addresses.
    pub const INVALID: CellAddress = CellAddress { row: -1, col: -1 };

    pub fn is_valid(&self) -> bool {
        self.row >= 0 && self.col >= 0
    }

    /// Returns the coordinates as indexes, or `None` for the sentinel.
    pub fn position(&self) -> Option<(usize, usize)> {
        let row = usize::try_from(self.row).ok()?;
        let col = usize::try_from(self.col).ok()?;
        Some((row, col))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position() {
            Some((row, col)) => write!(f, "{}{}", column_letters(col), row + 1),
            None => write!(f, "<invalid>"),
        }
    }
}

/// Resolves a column-letter/row-number address into zero-based coordinates.
///
/// Letters are base-26 with `A = 1`, rows are 1-based. Anything other than a
/// run of uppercase ASCII letters followed by a run of ASCII digits yields
/// [`CellAddress::INVALID`].
pub fn resolve(addr: &str) -> CellAddress {
    let letters_end = addr
        .find(|ch: char| !ch.is_ascii_uppercase())
        .unwrap_or(addr.len());
    let (letters, digits) = addr.split_at(letters_end);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return CellAddress::INVALID;
    }

    let mut column: i64 = 0;
    for byte in letters.bytes() {
        let value = i64::from(byte - b'A' + 1);
        column = match column.checked_mul(26).and_then(|c| c.checked_add(value)) {
            Some(next) => next,
            None => return CellAddress::INVALID,
        };
    }

    let row: i64 = match digits.parse() {
        Ok(row) if row > 0 => row,
        _ => return CellAddress::INVALID,
    };

    CellAddress {
        row: row - 1,
        col: column - 1,
    }
}

/// Column index (0-based) to spreadsheet letters (0 → A, 25 → Z, 26 → AA).
pub fn column_letters(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
