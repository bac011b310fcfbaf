//! Axis letters of a series and how they map onto TCZYX.
//!
//! Native axes come from the page grouping and may contain letters with no
//! canonical meaning (`I` for a plain page stack, `Q` for anything else).
//! Those are replaced by guesses derived from the number of dims, unless the
//! caller configured an explicit order.

use crate::scene::Dimension;

/// Axis letters that carry no canonical meaning.
pub const UNKNOWN_DIM_CHARS: [char; 2] = ['Q', 'I'];

/// Axis letter for interleaved samples within a page.
pub const SAMPLES_DIM_CHAR: char = 'S';

/// Order guessed for shapes with more than five dims.
const GUESS_ORDER_WITH_SAMPLES: &str = "TCZYXS";

pub fn is_unknown(c: char) -> bool {
    UNKNOWN_DIM_CHARS.contains(&c)
}

/// Guess axis letters from the number of dims: the trailing `ndim` letters
/// of `TCZYX`, or of `TCZYXS` for six dims.
///
/// Shapes with more than six dims get the full six-letter order.
pub fn guess_dim_order(ndim: usize) -> String {
    let order = if ndim > Dimension::ORDER.len() {
        GUESS_ORDER_WITH_SAMPLES
    } else {
        Dimension::ORDER
    };
    let skip = order.len().saturating_sub(ndim);
    order[skip..].to_string()
}

/// Replace each unknown letter in `dims_from_meta` with the first guessed
/// letter not yet used and not already present in `dims_from_meta`.
///
/// Unknown letters with no remaining guess are kept as-is.
pub fn merge_dim_guesses(dims_from_meta: &str, guessed_dims: &str) -> String {
    let mut best_guess = String::with_capacity(dims_from_meta.len());

    for dim in dims_from_meta.chars() {
        if !is_unknown(dim) {
            best_guess.push(dim);
            continue;
        }

        let replacement = guessed_dims
            .chars()
            .find(|g| !best_guess.contains(*g) && !dims_from_meta.contains(*g));
        best_guess.push(replacement.unwrap_or(dim));
    }

    best_guess
}

/// Native axes with unknown letters resolved by guessing.
pub fn guess_axes(native: &str) -> String {
    if native.chars().any(is_unknown) {
        merge_dim_guesses(native, &guess_dim_order(native.len()))
    } else {
        native.to_string()
    }
}

/// Pick the axes for a series, honoring an explicit order when given.
///
/// An explicit order must name every native dim, use each letter once, and
/// keep the page plane in place: the native `YX` positions must be `YX`, and
/// a native samples axis may only be called `S` or `C`.
pub fn resolve_axes(native: &str, explicit: Option<&str>) -> Result<String, String> {
    let Some(explicit) = explicit else {
        return Ok(guess_axes(native));
    };

    let explicit = explicit.to_ascii_uppercase();
    if explicit.len() != native.len() {
        return Err(format!(
            "dimension order {explicit:?} has {} dims but the image has {} ({native})",
            explicit.len(),
            native.len()
        ));
    }

    let mut seen = String::with_capacity(explicit.len());
    for c in explicit.chars() {
        if seen.contains(c) {
            return Err(format!("dimension order {explicit:?} repeats {c:?}"));
        }
        seen.push(c);
    }

    for (n, e) in native.chars().zip(explicit.chars()) {
        let ok = match n {
            'Y' | 'X' => n == e,
            SAMPLES_DIM_CHAR => e == SAMPLES_DIM_CHAR || e == 'C',
            _ => !matches!(e, 'Y' | 'X' | SAMPLES_DIM_CHAR),
        };
        if !ok {
            return Err(format!(
                "dimension order {explicit:?} cannot place {e:?} where the image stores {n:?} ({native})"
            ));
        }
    }

    Ok(explicit)
}
