use super::model::PaginationState;
use thiserror::Error;

/// A relative page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    First,
    Previous,
    Next,
    Last,
}

/// Why a move has no target page. Reported as `loadPageFail`, never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("already on the first page")]
    NoPreviousPage,

    #[error("already on the last page")]
    NoNextPage,

    #[error("the total is unknown, so there is no last page yet")]
    UnknownTotal,

    #[error("there are no pages")]
    NoPages,

    #[error("page {0} is out of range")]
    OutOfRange(usize),
}

/// Resolves a move to the page index it lands on.
pub fn resolve_navigation(
    pagination: &PaginationState,
    target: NavigationTarget,
) -> Result<usize, NavigationError> {
    let info = pagination.page_info();
    match target {
        NavigationTarget::First => Ok(0),
        NavigationTarget::Previous if info.has_previous => Ok(pagination.current_page - 1),
        NavigationTarget::Previous => Err(NavigationError::NoPreviousPage),
        NavigationTarget::Next if info.has_next => pagination
            .current_page
            .checked_add(1)
            .ok_or(NavigationError::OutOfRange(pagination.current_page)),
        NavigationTarget::Next => Err(NavigationError::NoNextPage),
        NavigationTarget::Last => match info.pages_count {
            Some(0) => Err(NavigationError::NoPages),
            Some(count) => Ok(count - 1),
            None => Err(NavigationError::UnknownTotal),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{CacheType, PaginationConfig};

    fn at(page: usize, total: Option<usize>) -> PaginationState {
        let mut state = PaginationState::from_config(&PaginationConfig::new(CacheType::Full, 20));
        state.current_page = page;
        state.total = total;
        state
    }

    #[test]
    fn previous_at_first_page_fails() {
        assert_eq!(
            resolve_navigation(&at(0, Some(100)), NavigationTarget::Previous),
            Err(NavigationError::NoPreviousPage)
        );
    }

    #[test]
    fn next_at_last_page_fails() {
        assert_eq!(
            resolve_navigation(&at(4, Some(100)), NavigationTarget::Next),
            Err(NavigationError::NoNextPage)
        );
        assert_eq!(resolve_navigation(&at(3, Some(100)), NavigationTarget::Next), Ok(4));
    }

    #[test]
    fn next_with_unknown_total_is_allowed() {
        assert_eq!(resolve_navigation(&at(7, None), NavigationTarget::Next), Ok(8));
    }

    #[test]
    fn next_past_the_largest_index_fails() {
        assert_eq!(
            resolve_navigation(&at(usize::MAX, None), NavigationTarget::Next),
            Err(NavigationError::OutOfRange(usize::MAX))
        );
    }

    #[test]
    fn last_page_needs_a_total() {
        assert_eq!(resolve_navigation(&at(0, Some(135)), NavigationTarget::Last), Ok(6));
        assert_eq!(
            resolve_navigation(&at(0, None), NavigationTarget::Last),
            Err(NavigationError::UnknownTotal)
        );
        assert_eq!(
            resolve_navigation(&at(0, Some(0)), NavigationTarget::Last),
            Err(NavigationError::NoPages)
        );
    }
}
