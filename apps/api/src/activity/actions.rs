//! Closed action vocabulary and the route classifier that feeds it.

/// Every value an activity log row may carry in its `action` column.
pub const ACTION_VOCABULARY: &[&str] = &[
    "LOGIN",
    "LOGOUT",
    "SIGNUP",
    "PASSWORD_RESET",
    "PASSWORD_CHANGE",
    "EMAIL_VERIFICATION",
    "RESUME_UPLOAD",
    "RESUME_ANALYZE",
    "RESUME_DELETE",
    "PROFILE_UPDATE",
    "SKILLS_UPDATE",
    "PREFERENCES_UPDATE",
    "TIMELINE_CREATE",
    "TIMELINE_UPDATE",
    "TIMELINE_DELETE",
    "TIMELINE_VIEW",
    "JOB_RECOMMENDATION_VIEW",
    "YOUTUBE_RECOMMENDATION_VIEW",
    "SETTINGS_UPDATE",
    "ACCOUNT_DELETE",
    "EMAIL_CHANGE",
    "API_ERROR",
    "UNAUTHORIZED_ACCESS",
    "OTHER",
];

pub fn is_known_action(action: &str) -> bool {
    ACTION_VOCABULARY.contains(&action)
}

/// Requests whose paths touch credentials are never logged.
pub fn should_skip(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    path.contains("/login") || path.contains("/password")
}

/// Maps a finished request onto the action vocabulary.
///
/// Failure statuses win over the route: a rejected request is an
/// UNAUTHORIZED_ACCESS or API_ERROR no matter what it was trying to do.
pub fn classify(method: &str, path: &str, status_code: u16) -> &'static str {
    if status_code == 401 || status_code == 403 {
        return "UNAUTHORIZED_ACCESS";
    }
    if status_code >= 400 {
        return "API_ERROR";
    }

    let path = path.to_ascii_lowercase();
    let method = method.to_ascii_uppercase();

    if path.contains("/login") {
        return "LOGIN";
    }
    if path.contains("/logout") {
        return "LOGOUT";
    }
    if path.contains("/signup") || path.contains("/register") {
        return "SIGNUP";
    }
    if path.contains("/password/reset") {
        return "PASSWORD_RESET";
    }
    if path.contains("/password") {
        return "PASSWORD_CHANGE";
    }
    if path.contains("/verify") {
        return "EMAIL_VERIFICATION";
    }

    if path.contains("/resume") {
        if method == "POST" && path.contains("/upload") {
            return "RESUME_UPLOAD";
        }
        if path.contains("/analyze") {
            return "RESUME_ANALYZE";
        }
        if method == "DELETE" {
            return "RESUME_DELETE";
        }
    }

    if path.contains("/timeline")
        || path.contains("/generate-timeline")
        || path.contains("/generate-plan")
        || path.contains("/complete-phase")
    {
        if method == "POST" && path.contains("generate") {
            return "TIMELINE_CREATE";
        }
        if path.contains("/complete-phase") || path.contains("/regenerate") {
            return "TIMELINE_UPDATE";
        }
        if method == "DELETE" {
            return "TIMELINE_DELETE";
        }
        if method == "GET" {
            return "TIMELINE_VIEW";
        }
        return "OTHER";
    }

    if path.contains("/ai") || path.contains("/extract") {
        return "RESUME_ANALYZE";
    }
    if path.contains("/jobs") {
        return "JOB_RECOMMENDATION_VIEW";
    }
    if path.contains("/youtube") || path.contains("/recommendations") {
        return "YOUTUBE_RECOMMENDATION_VIEW";
    }
    if path.contains("/profile") {
        return "PROFILE_UPDATE";
    }
    if path.contains("/skills") {
        return "SKILLS_UPDATE";
    }
    if path.contains("/settings") {
        return "SETTINGS_UPDATE";
    }
    if path.contains("/preferences") {
        return "PREFERENCES_UPDATE";
    }
    if method == "DELETE" && path.contains("/account") {
        return "ACCOUNT_DELETE";
    }
    if path.contains("/email") {
        return "EMAIL_CHANGE";
    }

    "OTHER"
}
