//! Reference matcher: containment and suffix-prefix matches by direct comparison.

use super::{check_inputs, exact_containment, Containment, Overlap, OverlapError, OverlapMode};

/// `true` if `a` occurs in `b`; `a` must be strictly shorter
fn contained(a: &[u8], b: &[u8]) -> bool {
    debug_assert!(a.len() < b.len());
    b.windows(a.len()).any(|window| window == a)
}

/// Report suffixes of `a` equal to prefixes of `b`, longest first
fn find_spms<F>(
    a: &[u8],
    b: &[u8],
    min_length: usize,
    find_nonmaximal: bool,
    self_comparison: bool,
    u_suffix: bool,
    on_match: &mut F,
) where
    F: FnMut(Overlap),
{
    let mut from = a.len().min(b.len());
    if self_comparison {
        from -= 1;
    }
    for len in (min_length.max(1)..=from).rev() {
        if a[a.len() - len..] == b[..len] {
            on_match(Overlap::exact(len, u_suffix));
            if !find_nonmaximal {
                break;
            }
        }
    }
}

/// Compare `u` with `v` (or with itself when `v` is `None`).
///
/// Overlaps are reported through `on_match`; with `find_nonmaximal` every
/// shorter match down to `min_length` is reported as well.
pub fn find<F>(
    u: &[u8],
    v: Option<&[u8]>,
    mode: OverlapMode,
    min_length: usize,
    find_nonmaximal: bool,
    mut on_match: F,
) -> Result<Containment, OverlapError>
where
    F: FnMut(Overlap),
{
    check_inputs(u, v, mode)?;
    let mut verdict = Containment::initial(v.is_none(), mode);

    match v {
        None => {
            if mode.finds_overlaps() {
                find_spms(u, u, min_length, find_nonmaximal, true, true, &mut on_match);
            }
        }
        Some(v) => {
            if mode.finds_containments() {
                verdict = exact_containment(u, v, |shorter, longer, _| contained(shorter, longer));
                if mode == OverlapMode::ProperSpm && verdict != Containment::Neither {
                    return Ok(verdict);
                }
            }
            if mode.finds_overlaps() {
                find_spms(u, v, min_length, find_nonmaximal, false, true, &mut on_match);
                find_spms(v, u, min_length, find_nonmaximal, false, false, &mut on_match);
            }
        }
    }
    Ok(verdict)
}
