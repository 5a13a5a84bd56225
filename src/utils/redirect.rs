/// Local path to send the user to after login. Anything that could leave the
/// site (absolute URLs, `//host`, backslashes, dot segments) falls back to `/`.
/// Routes that change backups are never followed directly: a delete lands on
/// the server's backup list and a launch on its confirmation page.
pub fn safe_next_path(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control)
                && !path.split(['/', '?']).any(|seg| seg == "." || seg == "..") =>
        {
            defuse_destructive(path)
        }
        _ => "/".to_string(),
    }
}

fn defuse_destructive(path: &str) -> String {
    let route = path.split(['?', '#']).next().unwrap_or(path);
    let server = |rest: &str| rest.split('/').next().unwrap_or("").to_string();
    if let Some(rest) = route.strip_prefix("/deletebackup/") {
        return format!("/listbackupsserver/{}", server(rest));
    }
    if let Some(rest) = route.strip_prefix("/launchbackup/") {
        return format!("/prelaunchbackup/{}", server(rest));
    }
    path.to_string()
}

/// `/login?next=...` for the given original request path.
pub fn login_url_for(path_and_query: &str) -> String {
    if path_and_query.is_empty() || path_and_query == "/" {
        return "/login".to_string();
    }
    format!("/login?next={}", urlencoding::encode(path_and_query))
}
