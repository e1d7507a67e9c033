//! URL → page mapping behind the sign-in guard.

use platform_authn::Role;
use products_crm::User;

pub const LOGIN: &str = "/login";
pub const HOME: &str = "/";
pub const BASE_HOME: &str = "/base/dashboard";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Page {
    Login,
    Home,
    AdminUsers,
    Dashboard,
    /// Consultoria call tracker.
    Consultoria,
    /// Opportunity table.
    Policies,
    Kanban,
    Analytics,
}

impl Page {
    pub fn admin_only(self) -> bool {
        matches!(self, Page::AdminUsers | Page::Analytics)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Render(Page),
    Redirect(&'static str),
}

/// Resolves `path` for the signed-in `viewer`, if any. Query strings and
/// trailing slashes are ignored.
pub fn resolve(path: &str, viewer: Option<&User>) -> Resolution {
    let path = normalize(path);
    if path == LOGIN {
        return Resolution::Render(Page::Login);
    }
    let Some(viewer) = viewer else {
        return Resolution::Redirect(LOGIN);
    };
    let page = match path {
        HOME => Page::Home,
        "/admin/users" => Page::AdminUsers,
        "/base" => return Resolution::Redirect(BASE_HOME),
        "/base/dashboard" => Page::Dashboard,
        "/base/table" => Page::Consultoria,
        "/base/policies" => Page::Policies,
        "/base/kanban" => Page::Kanban,
        "/base/analytics" => Page::Analytics,
        _ => return Resolution::Redirect(HOME),
    };
    if page.admin_only() && viewer.role != Role::Admin {
        return Resolution::Redirect(HOME);
    }
    Resolution::Render(page)
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => HOME,
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ana@nexo.test".into(),
            name: "Ana".into(),
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn anonymous_visits_are_sent_to_login() {
        for path in ["/", "/base/dashboard", "/base/kanban", "/base", "/admin/users", "/nada"] {
            assert_eq!(resolve(path, None), Resolution::Redirect(LOGIN), "{path}");
        }
        assert_eq!(resolve("/login", None), Resolution::Render(Page::Login));
    }

    #[test]
    fn base_redirects_to_dashboard() {
        let ana = user(Role::Employee);
        assert_eq!(resolve("/base", Some(&ana)), Resolution::Redirect(BASE_HOME));
        assert_eq!(resolve("/base/", Some(&ana)), Resolution::Redirect(BASE_HOME));
    }

    #[test]
    fn workspace_pages_render() {
        let ana = user(Role::Employee);
        assert_eq!(resolve("/", Some(&ana)), Resolution::Render(Page::Home));
        assert_eq!(resolve("/base/table", Some(&ana)), Resolution::Render(Page::Consultoria));
        assert_eq!(resolve("/base/policies?x=1", Some(&ana)), Resolution::Render(Page::Policies));
        assert_eq!(resolve("/base/kanban", Some(&ana)), Resolution::Render(Page::Kanban));
    }

    #[test]
    fn admin_pages_need_admin_role() {
        let ana = user(Role::Employee);
        let boss = user(Role::Admin);
        assert_eq!(resolve("/base/analytics", Some(&ana)), Resolution::Redirect(HOME));
        assert_eq!(resolve("/admin/users", Some(&ana)), Resolution::Redirect(HOME));
        assert_eq!(resolve("/base/analytics", Some(&boss)), Resolution::Render(Page::Analytics));
        assert_eq!(resolve("/admin/users", Some(&boss)), Resolution::Render(Page::AdminUsers));
    }

    #[test]
    fn unknown_paths_go_home() {
        let ana = user(Role::Employee);
        assert_eq!(resolve("/base/siniestros", Some(&ana)), Resolution::Redirect(HOME));
    }
}
