use crate::routes::{
    Location, NavigationTarget, Page, RouteDescriptor, LANDING_PATH, REDIRECT_QUERY,
};

/// Decision taken by [evaluate] for a pending navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(NavigationTarget),
}

/// Decide whether the navigation to `location` (matched by `route`) may proceed given the cached
/// session flag. Never touches the network; the caller is responsible for having verified the
/// session beforehand.
pub fn evaluate(route: &RouteDescriptor, location: &Location, is_logged_in: bool) -> GuardOutcome {
    log::debug!(
        "Guard: to={}, requires_auth={}, logged_in={is_logged_in}",
        location.path,
        route.requires_auth
    );
    if route.requires_auth && !is_logged_in {
        log::info!("Access denied to {}, redirecting to login", location.path);
        return GuardOutcome::Redirect(
            NavigationTarget::named(Page::Login).with_query(REDIRECT_QUERY, location.full_path()),
        );
    }
    if route.page == Page::Login && is_logged_in {
        log::info!("Already logged in, redirecting from login to {LANDING_PATH}");
        return GuardOutcome::Redirect(NavigationTarget::from(LANDING_PATH));
    }
    GuardOutcome::Allow
}
