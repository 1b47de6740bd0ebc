use std::fmt;

use crate::error::Result;
use crate::shape::Shape;

/// Read access shared by both storage layouts.
///
/// Everything the oracle and the layout conversions need is expressed as
/// bounds-checked row access; element access is derived from it.
pub trait DenseMatrix {
    /// The matrix dimensions.
    fn shape(&self) -> Shape;

    /// Row `i` as a contiguous slice of `cols` values.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if `i >= rows`.
    fn row(&self, i: usize) -> Result<&[f64]>;

    /// Number of rows.
    fn rows(&self) -> usize {
        self.shape().rows
    }

    /// Number of columns.
    fn cols(&self) -> usize {
        self.shape().cols
    }

    /// Element `(i, j)`.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` if either index is outside the matrix.
    fn get(&self, i: usize, j: usize) -> Result<f64> {
        self.shape().check_index(i, j)?;
        Ok(self.row(i)?[j])
    }
}

/// Formats `v` with six significant digits, dropping trailing zeros.
///
/// Values with a decimal exponent below -4 or at least 6 use scientific
/// notation with a signed two-digit exponent, e.g. `1.23457e+06`.
pub(crate) fn format_general(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    // Rounding to six digits first settles the exponent: 9999999 is 1e+07.
    let sci = format!("{:.5e}", v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (5 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Writes each row on its own line, every value right-aligned in a
/// 10-character field followed by a space.
pub(crate) fn write_rows<M: DenseMatrix + ?Sized>(m: &M, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for i in 0..m.rows() {
        let row = m.row(i).map_err(|_| fmt::Error)?;
        for &v in row {
            write!(f, "{:>10} ", format_general(v))?;
        }
        writeln!(f)?;
    }
    Ok(())
}
